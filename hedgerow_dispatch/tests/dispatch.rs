// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tests for the `hedgerow_dispatch` crate.
//!
//! These exercise the dispatcher contract end to end: ordering, once
//! semantics, cancellation, bubbling through chains of dispatchers, native
//! forwarding, and the consumers built on top.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::Rc;

use hedgerow_dispatch::scroller::{SCROLL_AFTER, SCROLL_BEFORE, ScrollHost, Scroller, ScrollerConfig};
use hedgerow_dispatch::{
    Bindable, BindableRef, CallbackEvents, CallbackScope, Capabilities, ConfigurationError,
    DebugSink, Detail, Event, EventDispatcher, Listener, ListenerError, ListenerOptions,
};

type Log = Rc<RefCell<Vec<String>>>;

fn log() -> Log {
    Rc::new(RefCell::new(Vec::new()))
}

fn push(log: &Log, entry: &str) -> Listener {
    let log = log.clone();
    let entry = entry.to_string();
    Listener::new(move |_| {
        log.borrow_mut().push(entry.clone());
        Ok(())
    })
}

fn stopper(log: &Log, entry: &str) -> Listener {
    let log = log.clone();
    let entry = entry.to_string();
    Listener::new(move |event| {
        log.borrow_mut().push(entry.clone());
        event.stop_immediate_propagation();
        Ok(())
    })
}

/// A stand-in for a real platform target that records what it is asked to do.
#[derive(Default)]
struct HostTarget {
    caps: Option<Capabilities>,
    calls: RefCell<Vec<String>>,
    listeners: RefCell<Vec<(String, Listener, ListenerOptions)>>,
}

impl Bindable for HostTarget {
    fn capabilities(&self) -> Capabilities {
        self.caps.unwrap_or_else(Capabilities::all)
    }

    fn add_listener(&self, name: &str, listener: Listener, options: ListenerOptions) {
        self.calls.borrow_mut().push(format!("add {name} {}", options.capture));
        self.listeners
            .borrow_mut()
            .push((name.to_string(), listener, options));
    }

    fn remove_listener(&self, name: &str, listener: &Listener, _options: ListenerOptions) {
        self.calls.borrow_mut().push(format!("remove {name}"));
        self.listeners
            .borrow_mut()
            .retain(|(n, l, _)| !(n == name && l.ptr_eq(listener)));
    }

    fn dispatch(&self, event: &mut Event) -> Result<bool, ListenerError> {
        self.calls.borrow_mut().push(format!("dispatch {}", event.name()));
        let matching: Vec<Listener> = self
            .listeners
            .borrow()
            .iter()
            .filter(|(n, _, _)| n == event.name())
            .map(|(_, l, _)| l.clone())
            .collect();
        for l in matching {
            l.call(event)?;
        }
        Ok(!event.is_default_prevented())
    }
}

#[derive(Default)]
struct RecordingSink {
    lines: RefCell<Vec<String>>,
}

impl DebugSink for RecordingSink {
    fn log(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(format!("log {args}"));
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(format!("warn {args}"));
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        self.lines.borrow_mut().push(format!("error {args}"));
    }
}

#[test]
fn listeners_fire_in_registration_order() {
    let d = EventDispatcher::simulated();
    let seen = log();
    for tag in ["f1", "f2", "f3", "f4", "f5"] {
        d.add_event_listener("tick", push(&seen, tag), ListenerOptions::default());
    }
    d.emit("tick", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["f1", "f2", "f3", "f4", "f5"]);
}

#[test]
fn order_survives_removal() {
    let d = EventDispatcher::simulated();
    let seen = log();
    let f2 = push(&seen, "f2");
    d.add_event_listener("tick", push(&seen, "f1"), false);
    d.add_event_listener("tick", f2.clone(), false);
    d.add_event_listener("tick", push(&seen, "f3"), false);
    d.remove_event_listener("tick", &f2, false);
    d.emit("tick", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["f1", "f3"]);
}

#[test]
fn once_listener_fires_exactly_once() {
    let d = EventDispatcher::simulated();
    let seen = log();
    d.add_event_listener("load", push(&seen, "a"), false);
    d.add_event_listener("load", push(&seen, "once"), ListenerOptions::once());
    d.add_event_listener("load", push(&seen, "b"), false);

    for _ in 0..3 {
        d.emit("load", Detail::new()).unwrap();
    }
    assert_eq!(*seen.borrow(), ["a", "once", "b", "a", "b", "a", "b"]);
}

#[test]
fn consecutive_once_listeners_are_not_skipped() {
    let d = EventDispatcher::simulated();
    let seen = log();
    for tag in ["o1", "o2", "o3"] {
        d.add_event_listener("go", push(&seen, tag), ListenerOptions::once());
    }
    d.emit("go", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["o1", "o2", "o3"]);
    assert!(!d.has_listeners("go"));
}

#[test]
fn stop_immediate_skips_rest_of_hop_and_bubbling() {
    let root = EventDispatcher::simulated();
    let child = EventDispatcher::with_parent(&root);
    let seen = log();
    root.add_event_listener("e", push(&seen, "root"), false);
    child.add_event_listener("e", push(&seen, "c1"), false);
    child.add_event_listener("e", stopper(&seen, "c2"), false);
    child.add_event_listener("e", push(&seen, "c3"), false);

    // Not cancelable: propagation stops but the default action is not vetoed.
    assert!(child.dispatch_event("e", None, true, false).unwrap());
    assert_eq!(*seen.borrow(), ["c1", "c2"]);

    seen.borrow_mut().clear();
    assert!(!child.dispatch_event("e", None, true, true).unwrap());
    assert_eq!(*seen.borrow(), ["c1", "c2"]);
}

#[test]
fn cancellation_in_ancestor_stops_higher_ancestors() {
    let a = EventDispatcher::simulated();
    let b = EventDispatcher::with_parent(&a);
    let c = EventDispatcher::with_parent(&b);
    let seen = log();
    a.add_event_listener("e", push(&seen, "a"), false);
    b.add_event_listener("e", stopper(&seen, "b"), false);
    c.add_event_listener("e", push(&seen, "c"), false);

    assert!(!c.dispatch_event("e", None, true, true).unwrap());
    assert_eq!(*seen.borrow(), ["c", "b"]);
}

#[test]
fn bubble_chain_sets_target_and_current() {
    let a = EventDispatcher::simulated();
    let b = EventDispatcher::with_parent(&a);
    let c = EventDispatcher::with_parent(&b);

    let hits = Rc::new(Cell::new(0));
    let h = hits.clone();
    let (a_probe, c_probe) = (Rc::downgrade(&a), Rc::downgrade(&c));
    a.add_event_listener(
        "changed",
        Listener::new(move |event| {
            let a = a_probe.upgrade().unwrap();
            let c = c_probe.upgrade().unwrap();
            assert!(a.is(event.detail().current().unwrap().as_ref()));
            assert!(c.is(event.detail().target().unwrap().as_ref()));
            h.set(h.get() + 1);
            Ok(())
        }),
        false,
    );

    assert!(c.emit("changed", Detail::new()).unwrap());
    assert_eq!(hits.get(), 1);
}

#[test]
fn non_bubbling_event_stays_local() {
    let root = EventDispatcher::simulated();
    let child = EventDispatcher::with_parent(&root);
    let seen = log();
    root.add_event_listener("e", push(&seen, "root"), false);
    child.add_event_listener("e", push(&seen, "child"), false);
    child.dispatch_event("e", None, false, false).unwrap();
    assert_eq!(*seen.borrow(), ["child"]);
}

#[test]
fn bubbling_clones_detail_shallowly() {
    let root = EventDispatcher::simulated();
    let child = EventDispatcher::with_parent(&root);
    let shared = Rc::new(RefCell::new(Vec::<&'static str>::new()));

    child.add_event_listener(
        "e",
        Listener::new(|event| {
            event
                .detail()
                .get::<Rc<RefCell<Vec<&'static str>>>>("trail")
                .unwrap()
                .borrow_mut()
                .push("child");
            event.detail_mut().insert("local", true);
            Ok(())
        }),
        false,
    );
    root.add_event_listener(
        "e",
        Listener::new(|event| {
            event
                .detail()
                .get::<Rc<RefCell<Vec<&'static str>>>>("trail")
                .unwrap()
                .borrow_mut()
                .push("root");
            // Top-level fields written by the child hop travel with the clone.
            assert_eq!(event.detail().get::<bool>("local"), Some(&true));
            Ok(())
        }),
        false,
    );

    child
        .emit("e", Detail::new().with("trail", shared.clone()))
        .unwrap();
    assert_eq!(*shared.borrow(), ["child", "root"]);
}

#[test]
fn incompatible_target_or_parent_is_rejected() {
    let partial: BindableRef = Rc::new(HostTarget {
        caps: Some(Capabilities::ADD_LISTENER | Capabilities::REMOVE_LISTENER),
        ..HostTarget::default()
    });

    let err = EventDispatcher::new(Some(partial.clone()), None, None).unwrap_err();
    assert_eq!(
        err,
        ConfigurationError::IncompatibleTarget {
            missing: Capabilities::DISPATCH
        }
    );

    let err = EventDispatcher::new(None, Some(partial), None).unwrap_err();
    assert!(matches!(err, ConfigurationError::IncompatibleParent { .. }));
}

#[test]
fn simulated_mode_with_any_parent() {
    let host = Rc::new(HostTarget::default());
    let parent: BindableRef = host.clone();
    let d = EventDispatcher::new(None, Some(parent), None).unwrap();
    assert!(d.is_simulated());

    // A bubbling event reaches the host parent; a local one does not.
    d.emit("ping", Detail::new()).unwrap();
    d.dispatch_event("local", None, false, false).unwrap();
    assert_eq!(*host.calls.borrow(), ["dispatch ping"]);
}

#[test]
fn native_mode_forwards_everything() {
    let host = Rc::new(HostTarget::default());
    let target: BindableRef = host.clone();
    let parent = EventDispatcher::simulated();
    let parent_seen = log();
    parent.add_event_listener("click", push(&parent_seen, "parent"), false);

    let parent_ref: BindableRef = parent.clone();
    let d = EventDispatcher::new(Some(target), Some(parent_ref), None).unwrap();
    assert!(!d.is_simulated());

    let seen = log();
    let l = push(&seen, "native");
    d.add_event_listener("click", l.clone(), true);
    assert!(!d.has_listeners("click"));

    assert!(d.emit("click", Detail::new()).unwrap());
    d.remove_event_listener("click", &l, true);
    d.emit("click", Detail::new()).unwrap();

    assert_eq!(*seen.borrow(), ["native"]);
    assert_eq!(
        *host.calls.borrow(),
        ["add click true", "dispatch click", "remove click", "dispatch click"]
    );
    // Native targets bubble on their own; the parent link is not used.
    assert!(parent_seen.borrow().is_empty());
}

#[test]
fn native_result_is_passed_through() {
    let host = Rc::new(HostTarget::default());
    let target: BindableRef = host;
    let d = EventDispatcher::new(Some(target), None, None).unwrap();
    d.add_event_listener(
        "submit",
        Listener::new(|event| {
            event.prevent_default();
            Ok(())
        }),
        false,
    );
    assert!(!d.dispatch_event("submit", None, true, true).unwrap());
}

#[test]
fn dispatcher_as_native_target_of_another() {
    let inner = EventDispatcher::simulated();
    let seen = log();
    let target: BindableRef = inner.clone();
    let outer = EventDispatcher::new(Some(target), None, None).unwrap();
    outer.add_event_listener("x", push(&seen, "via-outer"), false);
    assert!(inner.has_listeners("x"));
    inner.emit("x", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["via-outer"]);
}

#[test]
fn listener_error_propagates_to_caller() {
    let d = EventDispatcher::simulated();
    d.add_event_listener(
        "save",
        Listener::new(|_| Err(ListenerError::new("disk full"))),
        false,
    );
    let err = d.emit("save", Detail::new()).unwrap_err();
    assert_eq!(err.to_string(), "disk full");
}

#[test]
fn add_event_list_registers_in_order() {
    let d = EventDispatcher::simulated();
    let seen = log();
    d.add_event_list([
        ("a", push(&seen, "a1"), ListenerOptions::default()),
        ("a", push(&seen, "a2"), ListenerOptions::once()),
        ("b", push(&seen, "b1"), ListenerOptions::default()),
    ]);
    d.emit("a", Detail::new()).unwrap();
    d.emit("a", Detail::new()).unwrap();
    d.emit("b", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["a1", "a2", "a1", "b1"]);
}

#[test]
fn debug_sink_receives_diagnostics() {
    let sink = Rc::new(RecordingSink::default());
    let debug: Rc<dyn DebugSink> = sink.clone();
    let d = EventDispatcher::new(None, None, Some(debug)).unwrap();
    let seen = log();
    d.add_event_listener("e", stopper(&seen, "s"), false);
    d.emit("e", Detail::new()).unwrap();

    let lines = sink.lines.borrow();
    assert!(lines.iter().any(|l| l.contains("constructed")));
    assert!(lines.iter().any(|l| l.contains("addEventListener [ e ]")));
    assert!(lines.iter().any(|l| l.contains("dispatchEvent [ e ]")));
    assert!(lines.iter().any(|l| l.contains("broke after 1")));
}

struct Page {
    y: Rc<Cell<f64>>,
}

impl ScrollHost for Page {
    fn position(&self) -> f64 {
        self.y.get()
    }

    fn scroll_to(&mut self, position: f64) {
        self.y.set(position);
    }
}

#[test]
fn vetoed_scroll_never_scrolls_or_reports_after() {
    let y = Rc::new(Cell::new(0.0));
    let dispatcher = EventDispatcher::simulated();
    let seen = log();
    dispatcher.add_event_listener(SCROLL_BEFORE, stopper(&seen, "before"), false);
    dispatcher.add_event_listener(SCROLL_AFTER, push(&seen, "after"), false);

    let mut scroller = Scroller::new(Page { y: y.clone() }, ScrollerConfig::default(), dispatcher);
    assert!(!scroller.scroll_to(500.0).unwrap());
    assert_eq!(y.get(), 0.0);
    assert_eq!(*seen.borrow(), ["before"]);
}

#[test]
fn accepted_scroll_reports_before_and_after() {
    let y = Rc::new(Cell::new(10.0));
    let root = EventDispatcher::simulated();
    let dispatcher = EventDispatcher::with_parent(&root);
    let seen = log();
    let s = seen.clone();
    root.add_event_listener(
        SCROLL_AFTER,
        Listener::new(move |event| {
            let from = event.detail().get::<f64>("from").copied().unwrap();
            let to = event.detail().get::<f64>("to").copied().unwrap();
            s.borrow_mut().push(format!("after {from} -> {to}"));
            Ok(())
        }),
        false,
    );

    let mut scroller = Scroller::new(Page { y: y.clone() }, ScrollerConfig::default(), dispatcher);
    assert!(scroller.scroll_to(300.0).unwrap());
    assert_eq!(y.get(), 300.0);
    assert_eq!(*seen.borrow(), ["after 10 -> 300"]);
}

#[test]
fn callback_registration_is_idempotent() {
    let scope = CallbackScope::new();
    let mut callbacks = CallbackEvents::new(None, scope.clone(), "callback.", None).unwrap();
    let seen = log();

    callbacks
        .add_event_listener("onReady", push(&seen, "first"), false)
        .unwrap();
    callbacks
        .add_event_listener("onReady", push(&seen, "second"), false)
        .unwrap();
    assert!(callbacks.is_registered("onReady"));

    scope.call("onReady", Vec::new()).unwrap().unwrap();
    assert_eq!(*seen.borrow(), ["first", "second"]);
}

#[test]
fn callback_name_taken_in_scope_is_rejected() {
    let scope = CallbackScope::new();
    scope.define("onReady", "host function");
    let mut callbacks = CallbackEvents::new(None, scope.clone(), "callback.", None).unwrap();

    let err = callbacks
        .add_event_listener("onReady", Listener::new(|_| Ok(())), false)
        .unwrap_err();
    assert_eq!(err, ConfigurationError::CallbackNameTaken("onReady".into()));
    assert!(!callbacks.is_registered("onReady"));
    assert_eq!(scope.value::<&str>("onReady"), Some("host function"));
}

#[test]
fn callback_events_are_prefixed() {
    let scope = CallbackScope::new();
    let mut callbacks = CallbackEvents::new(None, scope, "legacy:", None).unwrap();
    let seen = log();
    let l = push(&seen, "hit");
    callbacks.add_event_listener("onLoad", l.clone(), false).unwrap();

    assert!(callbacks.has_listeners("onLoad"));
    assert!(callbacks.dispatcher().has_listeners("legacy:onLoad"));
    callbacks.dispatch_event("onLoad", None, true, false).unwrap();
    // An unprefixed dispatch on the same dispatcher is a different event.
    callbacks.dispatcher().emit("onLoad", Detail::new()).unwrap();
    assert_eq!(*seen.borrow(), ["hit"]);

    callbacks.remove_event_listener("onLoad", &l, false);
    assert!(!callbacks.has_listeners("onLoad"));
}
