// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Callback events: turn named callback invocations into dispatcher events.
//!
//! Legacy callback-style APIs call a function by name inside some scope object.
//! [`CallbackEvents`] installs a forwarding function at that name the first
//! time a listener is registered for it. Calling the function through the
//! [`CallbackScope`] dispatches a prefixed event (default `"callback."`)
//! carrying the callback name and its arguments.
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use hedgerow_dispatch::{CallbackEvents, CallbackScope, DetailValue, Listener, ListenerOptions};
//!
//! let scope = CallbackScope::new();
//! let mut callbacks = CallbackEvents::new(None, scope.clone(), "callback.", None).unwrap();
//!
//! let total = Rc::new(Cell::new(0));
//! let sum = total.clone();
//! callbacks
//!     .add_event_listener(
//!         "onReady",
//!         Listener::new(move |event| {
//!             let params = event.detail().get::<Vec<DetailValue>>("params").unwrap();
//!             sum.set(sum.get() + params.len());
//!             Ok(())
//!         }),
//!         ListenerOptions::default(),
//!     )
//!     .unwrap();
//!
//! // The host calls the installed function by name.
//! let args = vec![DetailValue::new(1_u8), DetailValue::new("two")];
//! scope.call("onReady", args).unwrap().unwrap();
//! assert_eq!(total.get(), 2);
//! assert!(callbacks.dispatcher().has_listeners("callback.onReady"));
//! ```

use alloc::rc::{Rc, Weak};
use alloc::string::String;
use alloc::vec::Vec;
use core::cell::RefCell;
use core::fmt;

use hashbrown::{HashMap, HashSet};

use crate::bindable::{BindableRef, Listener, ListenerOptions};
use crate::debug::DebugSink;
use crate::dispatcher::EventDispatcher;
use crate::error::{ConfigurationError, ListenerError};
use crate::event::{Detail, DetailValue};

/// Default event name prefix.
pub const DEFAULT_PREFIX: &str = "callback.";

/// Returns `true` if `name` is usable as a callback function name.
///
/// This is a basic identifier check (`[$A-Za-z_][$0-9A-Za-z_]*`); it does not
/// reject reserved words.
#[must_use]
pub fn is_valid_function_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '$' || first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '$' || c == '_' || c.is_ascii_alphanumeric())
}

type Forwarder = Rc<dyn Fn(Vec<DetailValue>) -> Result<bool, ListenerError>>;

#[derive(Clone)]
enum ScopeEntry {
    Value(DetailValue),
    Callback(Forwarder),
}

/// A mutable scope that callers invoke callbacks on by name.
///
/// Host values defined with [`define`](Self::define) occupy their name, so
/// [`CallbackEvents`] refuses to install a forwarder over them.
#[derive(Default)]
pub struct CallbackScope {
    entries: RefCell<HashMap<String, ScopeEntry>>,
}

impl CallbackScope {
    /// Creates an empty shared scope.
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Defines a host value at `name`, replacing whatever was there.
    pub fn define<T: 'static>(&self, name: impl Into<String>, value: T) {
        self.entries
            .borrow_mut()
            .insert(name.into(), ScopeEntry::Value(DetailValue::new(value)));
    }

    /// Returns `true` if anything is defined at `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.entries.borrow().contains_key(name)
    }

    /// Returns `true` if `name` holds an installed callback.
    #[must_use]
    pub fn is_callable(&self, name: &str) -> bool {
        matches!(self.entries.borrow().get(name), Some(ScopeEntry::Callback(_)))
    }

    /// Returns the host value at `name` downcast to `T`.
    #[must_use]
    pub fn value<T: Clone + 'static>(&self, name: &str) -> Option<T> {
        match self.entries.borrow().get(name)? {
            ScopeEntry::Value(value) => value.downcast_ref::<T>().cloned(),
            ScopeEntry::Callback(_) => None,
        }
    }

    /// Calls the callback installed at `name` with `params`.
    ///
    /// Returns `None` if nothing callable is defined there; otherwise the
    /// result of the dispatch the callback performed.
    pub fn call(&self, name: &str, params: Vec<DetailValue>) -> Option<Result<bool, ListenerError>> {
        let callback = match self.entries.borrow().get(name)? {
            ScopeEntry::Callback(callback) => callback.clone(),
            ScopeEntry::Value(_) => return None,
        };
        Some(callback(params))
    }

    fn install(&self, name: &str, callback: Forwarder) {
        self.entries
            .borrow_mut()
            .insert(name.into(), ScopeEntry::Callback(callback));
    }
}

impl fmt::Debug for CallbackScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackScope")
            .field("len", &self.entries.borrow().len())
            .finish_non_exhaustive()
    }
}

/// A dispatcher adapter that namespaces callback names into events.
pub struct CallbackEvents {
    dispatcher: Rc<EventDispatcher>,
    scope: Rc<CallbackScope>,
    prefix: String,
    /// Names whose forwarder has been installed; never shrinks.
    callbacks: HashSet<String>,
}

impl CallbackEvents {
    /// Creates the adapter over a new dispatcher.
    ///
    /// `target` selects native or simulated mode exactly as for
    /// [`EventDispatcher::new`]. Callback dispatchers never have a parent.
    pub fn new(
        target: Option<BindableRef>,
        scope: Rc<CallbackScope>,
        prefix: impl Into<String>,
        debug: Option<Rc<dyn DebugSink>>,
    ) -> Result<Self, ConfigurationError> {
        let prefix = prefix.into();
        if prefix.is_empty() {
            return Err(ConfigurationError::EmptyPrefix);
        }
        let dispatcher = EventDispatcher::new(target, None, debug)?;
        Ok(Self {
            dispatcher,
            scope,
            prefix,
            callbacks: HashSet::new(),
        })
    }

    /// The underlying dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Rc<EventDispatcher> {
        &self.dispatcher
    }

    /// The scope forwarders are installed into.
    #[must_use]
    pub fn scope(&self) -> &Rc<CallbackScope> {
        &self.scope
    }

    /// The event name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns `true` once a forwarder for `name` has been installed.
    #[must_use]
    pub fn is_registered(&self, name: &str) -> bool {
        self.callbacks.contains(name)
    }

    fn event_name(&self, name: &str) -> String {
        let mut full = String::with_capacity(self.prefix.len() + name.len());
        full.push_str(&self.prefix);
        full.push_str(name);
        full
    }

    fn require_callback(&mut self, name: &str) -> Result<(), ConfigurationError> {
        if self.callbacks.contains(name) {
            return Ok(());
        }
        if self.scope.contains(name) {
            return Err(ConfigurationError::CallbackNameTaken(name.into()));
        }

        let dispatcher: Weak<EventDispatcher> = Rc::downgrade(&self.dispatcher);
        let event = self.event_name(name);
        let callback_name = String::from(name);
        let forward: Forwarder = Rc::new(move |params: Vec<DetailValue>| {
            let Some(dispatcher) = dispatcher.upgrade() else {
                return Ok(true);
            };
            let detail = Detail::new()
                .with("name", callback_name.clone())
                .with("params", params);
            dispatcher.dispatch_event(&event, Some(detail), true, false)
        });
        self.scope.install(name, forward);
        self.callbacks.insert(name.into());
        tracing::debug!(callback = name, prefix = %self.prefix, "callback forwarder installed");
        Ok(())
    }

    /// Registers a listener for the callback `name`.
    ///
    /// The first registration installs the forwarder in the scope. Fails if
    /// `name` is not a valid identifier or is already taken by a host value.
    pub fn add_event_listener(
        &mut self,
        name: &str,
        listener: Listener,
        options: impl Into<ListenerOptions>,
    ) -> Result<(), ConfigurationError> {
        if !is_valid_function_name(name) {
            return Err(ConfigurationError::InvalidCallbackName(name.into()));
        }
        self.require_callback(name)?;
        self.dispatcher
            .add_event_listener(&self.event_name(name), listener, options);
        Ok(())
    }

    /// Removes a listener for the callback `name`.
    ///
    /// The installed forwarder stays in place.
    pub fn remove_event_listener(
        &self,
        name: &str,
        listener: &Listener,
        options: impl Into<ListenerOptions>,
    ) {
        self.dispatcher
            .remove_event_listener(&self.event_name(name), listener, options);
    }

    /// Returns `true` if listeners are registered for the callback `name`.
    #[must_use]
    pub fn has_listeners(&self, name: &str) -> bool {
        self.dispatcher.has_listeners(&self.event_name(name))
    }

    /// Dispatches the event for the callback `name` directly.
    pub fn dispatch_event(
        &self,
        name: &str,
        detail: Option<Detail>,
        bubbles: bool,
        cancelable: bool,
    ) -> Result<bool, ListenerError> {
        self.dispatcher
            .dispatch_event(&self.event_name(name), detail, bubbles, cancelable)
    }
}

impl fmt::Debug for CallbackEvents {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackEvents")
            .field("prefix", &self.prefix)
            .field("callbacks", &self.callbacks)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;
    use core::cell::Cell;

    #[test]
    fn function_names() {
        assert!(is_valid_function_name("onReady"));
        assert!(is_valid_function_name("$cb_1"));
        assert!(is_valid_function_name("_"));
        assert!(!is_valid_function_name(""));
        assert!(!is_valid_function_name("1st"));
        assert!(!is_valid_function_name("on-ready"));
        assert!(!is_valid_function_name("on ready"));
        assert!(!is_valid_function_name("caf\u{e9}"));
    }

    #[test]
    fn empty_prefix_is_rejected() {
        let err = CallbackEvents::new(None, CallbackScope::new(), "", None).unwrap_err();
        assert_eq!(err, ConfigurationError::EmptyPrefix);
    }

    #[test]
    fn invalid_name_is_rejected_before_install() {
        let scope = CallbackScope::new();
        let mut cb = CallbackEvents::new(None, scope.clone(), DEFAULT_PREFIX, None).unwrap();
        let err = cb
            .add_event_listener("not valid", Listener::new(|_| Ok(())), false)
            .unwrap_err();
        assert_eq!(err, ConfigurationError::InvalidCallbackName("not valid".into()));
        assert!(!scope.contains("not valid"));
    }

    #[test]
    fn forwarded_call_carries_name_and_params() {
        let scope = CallbackScope::new();
        let mut cb = CallbackEvents::new(None, scope.clone(), "cb:", None).unwrap();
        let seen = Rc::new(Cell::new(false));
        let flag = seen.clone();
        cb.add_event_listener(
            "done",
            Listener::new(move |event| {
                assert_eq!(event.name(), "cb:done");
                assert_eq!(event.detail().get::<String>("name").map(String::as_str), Some("done"));
                let params = event.detail().get::<Vec<DetailValue>>("params").unwrap();
                assert_eq!(params[0].downcast_ref::<i32>(), Some(&42));
                flag.set(true);
                Ok(())
            }),
            false,
        )
        .unwrap();

        assert!(scope.is_callable("done"));
        assert!(scope.call("done", vec![DetailValue::new(42_i32)]).unwrap().unwrap());
        assert!(seen.get());
    }

    #[test]
    fn calling_unknown_or_value_returns_none() {
        let scope = CallbackScope::new();
        scope.define("config", 3_u8);
        assert!(scope.call("missing", Vec::new()).is_none());
        assert!(scope.call("config", Vec::new()).is_none());
        assert_eq!(scope.value::<u8>("config"), Some(3));
    }

    #[test]
    fn forwarder_outliving_dispatcher_is_inert() {
        let scope = CallbackScope::new();
        {
            let mut cb = CallbackEvents::new(None, scope.clone(), DEFAULT_PREFIX, None).unwrap();
            cb.add_event_listener("gone", Listener::new(|_| Ok(())), false)
                .unwrap();
        }
        assert_eq!(scope.call("gone", Vec::new()), Some(Ok(true)));
    }
}
