// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The event dispatcher: a native-or-simulated event hub.
//!
//! An [`EventDispatcher`] either forwards every operation to a real
//! [`Bindable`] target (*native* mode) or keeps its own ordered listener table
//! (*simulated* mode). Simulated dispatchers may bubble events to a parent,
//! which can itself be native or simulated.
//!
//! ## Simulated dispatch rules
//!
//! - Listeners for a name run in registration order.
//! - A `once` listener is removed before it runs, so it fires at most once even
//!   if it re-enters the dispatcher.
//! - The table is re-read after every invocation. Listeners added or removed by
//!   a running listener (or by a nested dispatch) are honored without skipping
//!   or repeating anyone: iteration resumes at the first registration newer
//!   than the one that just ran.
//! - [`Event::stop_immediate_propagation`] skips the remaining listeners of the
//!   hop and suppresses bubbling.
//! - A listener error aborts the hop and is returned unchanged.
//! - If the event bubbles and was not stopped, the detail is shallow-cloned,
//!   `current` is set to the parent, and the parent dispatches it.
//!
//! ## Minimal example
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use hedgerow_dispatch::{Detail, EventDispatcher, Listener, ListenerOptions};
//!
//! let root = EventDispatcher::simulated();
//! let child = EventDispatcher::with_parent(&root);
//!
//! let seen = Rc::new(RefCell::new(Vec::new()));
//! let log = seen.clone();
//! root.add_event_listener(
//!     "saved",
//!     Listener::new(move |event| {
//!         log.borrow_mut().push(*event.detail().get::<u32>("id").unwrap());
//!         Ok(())
//!     }),
//!     ListenerOptions::default(),
//! );
//!
//! let accepted = child
//!     .dispatch_event("saved", Some(Detail::new().with("id", 7_u32)), true, false)
//!     .unwrap();
//! assert!(accepted);
//! assert_eq!(*seen.borrow(), vec![7]);
//! ```

use alloc::format;
use alloc::rc::{Rc, Weak};
use alloc::string::String;
use core::cell::{Cell, RefCell};
use core::fmt;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::bindable::{
    Bindable, BindableRef, Capabilities, Listener, ListenerOptions, same_bindable,
};
use crate::debug::DebugSink;
use crate::error::{ConfigurationError, ListenerError};
use crate::event::{Detail, Event};

/// Inline capacity of a per-name listener sequence.
///
/// Most event names carry one or two listeners.
const INLINE_LISTENERS: usize = 4;

#[derive(Clone)]
struct Entry {
    /// Monotonic registration number; sequences stay sorted by it.
    id: u64,
    listener: Listener,
    options: ListenerOptions,
}

type Sequence = SmallVec<[Entry; INLINE_LISTENERS]>;

/// Returns the capabilities `obj` lacks.
fn missing_capabilities(obj: &dyn Bindable) -> Capabilities {
    Capabilities::all() - obj.capabilities()
}

/// A native-or-simulated event hub with optional parent bubbling.
///
/// Dispatchers are always handled through `Rc`, so they can appear as the
/// `target`/`current` of an [`Event`] and as each other's parent.
pub struct EventDispatcher {
    this: Weak<Self>,
    target: Option<BindableRef>,
    parent: Option<BindableRef>,
    debug: Option<Rc<dyn DebugSink>>,
    listeners: RefCell<HashMap<String, Sequence>>,
    next_id: Cell<u64>,
}

impl EventDispatcher {
    /// Creates a dispatcher.
    ///
    /// With a `target` the dispatcher runs in native mode and forwards all
    /// operations to it; `parent` is then kept but never used, because the
    /// target bubbles through its own environment. Without a target it runs in
    /// simulated mode.
    ///
    /// Fails if `target` or `parent` do not report the full [`Capabilities`] set.
    pub fn new(
        target: Option<BindableRef>,
        parent: Option<BindableRef>,
        debug: Option<Rc<dyn DebugSink>>,
    ) -> Result<Rc<Self>, ConfigurationError> {
        if let Some(target) = &target {
            let missing = missing_capabilities(target.as_ref());
            if !missing.is_empty() {
                return Err(ConfigurationError::IncompatibleTarget { missing });
            }
        }
        if let Some(parent) = &parent {
            let missing = missing_capabilities(parent.as_ref());
            if !missing.is_empty() {
                return Err(ConfigurationError::IncompatibleParent { missing });
            }
        }
        Ok(Self::build(target, parent, debug))
    }

    /// Creates a simulated dispatcher without a parent.
    #[must_use]
    pub fn simulated() -> Rc<Self> {
        Self::build(None, None, None)
    }

    /// Creates a simulated dispatcher without a parent, reporting to `debug`.
    #[must_use]
    pub fn with_debug(debug: Rc<dyn DebugSink>) -> Rc<Self> {
        Self::build(None, None, Some(debug))
    }

    /// Creates a simulated dispatcher that bubbles to `parent`.
    #[must_use]
    pub fn with_parent(parent: &Rc<Self>) -> Rc<Self> {
        let parent: BindableRef = parent.clone();
        Self::build(None, Some(parent), None)
    }

    fn build(
        target: Option<BindableRef>,
        parent: Option<BindableRef>,
        debug: Option<Rc<dyn DebugSink>>,
    ) -> Rc<Self> {
        let dispatcher = Rc::new_cyclic(|this| Self {
            this: this.clone(),
            target,
            parent,
            debug,
            listeners: RefCell::default(),
            next_id: Cell::new(0),
        });
        tracing::trace!(
            simulated = dispatcher.is_simulated(),
            has_parent = dispatcher.parent.is_some(),
            "dispatcher constructed"
        );
        if let Some(debug) = &dispatcher.debug {
            debug.log(format_args!(
                "EventDispatcher::constructed (simulated: {})",
                dispatcher.is_simulated()
            ));
        }
        dispatcher
    }

    /// The native target, if any.
    #[must_use]
    pub fn target(&self) -> Option<&BindableRef> {
        self.target.as_ref()
    }

    /// The parent used for simulated bubbling, if any.
    #[must_use]
    pub fn parent(&self) -> Option<&BindableRef> {
        self.parent.as_ref()
    }

    /// The installed debug sink, if any.
    #[must_use]
    pub fn debug(&self) -> Option<&Rc<dyn DebugSink>> {
        self.debug.as_ref()
    }

    /// Returns `true` if no native target is set.
    #[must_use]
    pub fn is_simulated(&self) -> bool {
        self.target.is_none()
    }

    /// Returns `true` if `other` is this dispatcher.
    #[must_use]
    pub fn is(&self, other: &dyn Bindable) -> bool {
        same_bindable(self, other)
    }

    /// Returns a shared handle to this dispatcher.
    fn handle(&self) -> Option<BindableRef> {
        self.this.upgrade().map(|this| this as BindableRef)
    }

    /// Returns `true` if the simulated table holds listeners for `name`.
    ///
    /// Always `false` in native mode.
    #[must_use]
    pub fn has_listeners(&self, name: &str) -> bool {
        self.listeners
            .borrow()
            .get(name)
            .is_some_and(|seq| !seq.is_empty())
    }

    /// Registers `listener` for events named `name`.
    ///
    /// `options` accepts [`ListenerOptions`] or a bare `bool` as the legacy
    /// capture shorthand.
    pub fn add_event_listener(
        &self,
        name: &str,
        listener: Listener,
        options: impl Into<ListenerOptions>,
    ) {
        let options = options.into();
        match &self.target {
            Some(target) => target.add_listener(name, listener, options),
            None => {
                let id = self.next_id.get();
                self.next_id.set(id + 1);
                self.listeners
                    .borrow_mut()
                    .entry(name.into())
                    .or_default()
                    .push(Entry {
                        id,
                        listener,
                        options,
                    });
            }
        }
        tracing::trace!(
            event = name,
            once = options.once,
            simulated = self.is_simulated(),
            "listener added"
        );
        if let Some(debug) = &self.debug {
            debug.group_collapsed(format_args!("EventDispatcher::addEventListener [ {name} ]"));
            debug.log(format_args!("options > {options:?}"));
            debug.group_end();
        }
    }

    /// Registers several listeners in order.
    pub fn add_event_list<'a>(
        &self,
        events: impl IntoIterator<Item = (&'a str, Listener, ListenerOptions)>,
    ) {
        for (name, listener, options) in events {
            self.add_event_listener(name, listener, options);
        }
    }

    /// Removes the first registration of `listener` for `name`.
    ///
    /// Missing registrations are silently ignored.
    pub fn remove_event_listener(
        &self,
        name: &str,
        listener: &Listener,
        options: impl Into<ListenerOptions>,
    ) {
        match &self.target {
            Some(target) => target.remove_listener(name, listener, options.into()),
            None => {
                let mut table = self.listeners.borrow_mut();
                if let Some(seq) = table.get_mut(name) {
                    if let Some(pos) = seq.iter().position(|e| e.listener.ptr_eq(listener)) {
                        seq.remove(pos);
                        tracing::trace!(event = name, "listener removed");
                    }
                    if seq.is_empty() {
                        table.remove(name);
                    }
                }
            }
        }
    }

    /// Dispatches an event named `name`.
    ///
    /// `target` and `current` are filled into `detail` when absent. Returns
    /// `Ok(false)` if the event was cancelable and a listener (here or in an
    /// ancestor) vetoed it, `Ok(true)` otherwise. In native mode the result is
    /// whatever the target reports.
    pub fn dispatch_event(
        &self,
        name: &str,
        detail: Option<Detail>,
        bubbles: bool,
        cancelable: bool,
    ) -> Result<bool, ListenerError> {
        let mut event = Event::new(name, detail.unwrap_or_default(), bubbles, cancelable);
        self.dispatch_prepared(&mut event)
    }

    /// Dispatches a bubbling, non-cancelable event.
    pub fn emit(&self, name: &str, detail: Detail) -> Result<bool, ListenerError> {
        self.dispatch_event(name, Some(detail), true, false)
    }

    fn dispatch_prepared(&self, event: &mut Event) -> Result<bool, ListenerError> {
        if let Some(this) = self.handle() {
            event.detail_mut().populate(&this);
        }
        tracing::debug!(
            event = event.name(),
            simulated = self.is_simulated(),
            bubbles = event.bubbles(),
            cancelable = event.cancelable(),
            "dispatching"
        );
        if let Some(debug) = &self.debug {
            debug.group_collapsed(format_args!(
                "EventDispatcher::dispatchEvent [ {} ]",
                event.name()
            ));
            debug.log(format_args!("simulated > {}", self.is_simulated()));
            debug.log(format_args!("detail > {:?}", event.detail()));
            debug.group_end();
        }
        match &self.target {
            Some(target) => target.dispatch(event),
            None => self.run_simulated(event),
        }
    }

    /// Returns the first registration for `name` newer than `after`.
    fn next_entry(&self, name: &str, after: Option<u64>) -> Option<Entry> {
        let table = self.listeners.borrow();
        let seq = table.get(name)?;
        let idx = match after {
            None => 0,
            Some(id) => seq.partition_point(|e| e.id <= id),
        };
        seq.get(idx).cloned()
    }

    fn remove_entry(&self, name: &str, id: u64) {
        let mut table = self.listeners.borrow_mut();
        if let Some(seq) = table.get_mut(name) {
            if let Ok(pos) = seq.binary_search_by_key(&id, |e| e.id) {
                seq.remove(pos);
            }
            if seq.is_empty() {
                table.remove(name);
            }
        }
    }

    fn run_simulated(&self, event: &mut Event) -> Result<bool, ListenerError> {
        let name = String::from(event.name());
        let mut last = None;
        let mut invoked = 0_usize;

        while let Some(entry) = self.next_entry(&name, last) {
            last = Some(entry.id);
            if entry.options.once {
                self.remove_entry(&name, entry.id);
                tracing::trace!(event = %name, "once listener consumed");
            }
            entry.listener.call(event)?;
            invoked += 1;

            if event.is_cancelled() {
                tracing::debug!(event = %name, after = invoked, "propagation stopped");
                if let Some(debug) = &self.debug {
                    debug.log(format_args!(
                        "EventDispatcher::dispatchEvent simulated [ {name} ] broke after {invoked}"
                    ));
                }
                break;
            }
        }

        let vetoed = event.is_vetoed();
        if !event.bubbles() || event.is_cancelled() {
            return Ok(!vetoed);
        }
        let Some(parent) = &self.parent else {
            return Ok(!vetoed);
        };

        tracing::trace!(event = %name, "bubbling to parent");
        if let Some(debug) = &self.debug {
            debug.log(format_args!(
                "EventDispatcher::dispatchEvent bubble [ {name} ] to parent"
            ));
        }
        let mut detail = event.detail().clone();
        detail.set_current(parent.clone());
        let mut bubbled = Event::new(name, detail, event.bubbles(), event.cancelable());
        let accepted = parent.dispatch(&mut bubbled)?;
        Ok(!vetoed && accepted)
    }
}

impl Bindable for EventDispatcher {
    fn add_listener(&self, name: &str, listener: Listener, options: ListenerOptions) {
        self.add_event_listener(name, listener, options);
    }

    fn remove_listener(&self, name: &str, listener: &Listener, options: ListenerOptions) {
        self.remove_event_listener(name, listener, options);
    }

    fn dispatch(&self, event: &mut Event) -> Result<bool, ListenerError> {
        self.dispatch_prepared(event)
    }
}

impl fmt::Debug for EventDispatcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self
            .listeners
            .try_borrow()
            .map(|table| format!("{:?}", table.keys().collect::<alloc::vec::Vec<_>>()))
            .unwrap_or_else(|_| String::from("<borrowed>"));
        f.debug_struct("EventDispatcher")
            .field("simulated", &self.is_simulated())
            .field("has_parent", &self.parent.is_some())
            .field("has_debug", &self.debug.is_some())
            .field("listening", &names)
            .finish_non_exhaustive()
    }
}
