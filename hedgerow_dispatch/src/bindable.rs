// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The bindable capability contract and listener values.
//!
//! Anything that can register listeners, remove them again, and dispatch an
//! [`Event`] is *bindable*. A real platform event target implements
//! [`Bindable`] by forwarding to its own machinery; an
//! [`EventDispatcher`](crate::EventDispatcher) implements it by running its
//! simulated listener table.
//!
//! Because targets are often only known at runtime (for example when they are
//! produced by a host binding layer), a bindable also reports its
//! [`Capabilities`]. Dispatcher construction checks that probe and rejects
//! partial implementations.
//!
//! ```
//! use hedgerow_dispatch::{Listener, ListenerOptions};
//!
//! let a = Listener::new(|_event| Ok(()));
//! let b = a.clone();
//! assert!(a.ptr_eq(&b));
//! assert!(!a.ptr_eq(&Listener::new(|_event| Ok(()))));
//!
//! // A bare boolean is shorthand for `capture`.
//! let options = ListenerOptions::from(true);
//! assert!(options.capture && !options.once);
//! ```

use alloc::rc::Rc;
use core::fmt;

use crate::error::ListenerError;
use crate::event::Event;

bitflags::bitflags! {
    /// Operations a [`Bindable`] reports it supports.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct Capabilities: u8 {
        /// Listener registration.
        const ADD_LISTENER    = 0b0000_0001;
        /// Listener removal.
        const REMOVE_LISTENER = 0b0000_0010;
        /// Event dispatch.
        const DISPATCH        = 0b0000_0100;
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

/// Result returned by a listener.
pub type ListenerResult = Result<(), ListenerError>;

/// A shared handle to any bindable object.
pub type BindableRef = Rc<dyn Bindable>;

/// The minimal operation set required of a dispatcher target or parent.
pub trait Bindable {
    /// Reports which operations this object supports.
    ///
    /// The default reports the full set. Host bindings wrapping objects of
    /// unknown shape should override it and report only what is available.
    fn capabilities(&self) -> Capabilities {
        Capabilities::all()
    }

    /// Registers `listener` for events named `name`.
    fn add_listener(&self, name: &str, listener: Listener, options: ListenerOptions);

    /// Removes a previously registered `listener` for `name`.
    fn remove_listener(&self, name: &str, listener: &Listener, options: ListenerOptions);

    /// Dispatches `event`, returning `false` if a listener vetoed its default action.
    fn dispatch(&self, event: &mut Event) -> Result<bool, ListenerError>;
}

/// Returns `true` if both handles point at the same object.
#[must_use]
pub fn same_bindable(a: &dyn Bindable, b: &dyn Bindable) -> bool {
    core::ptr::addr_eq(a, b)
}

/// An invocable event listener.
///
/// Listeners are compared by identity: cloning a `Listener` yields a handle
/// that removes the same registration, while wrapping the same closure body
/// twice yields two distinct listeners.
#[derive(Clone)]
pub struct Listener(Rc<dyn Fn(&mut Event) -> ListenerResult>);

impl Listener {
    /// Wraps a closure as a listener.
    #[must_use]
    pub fn new(f: impl Fn(&mut Event) -> ListenerResult + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Invokes the listener.
    pub fn call(&self, event: &mut Event) -> ListenerResult {
        (self.0)(event)
    }

    /// Returns `true` if both handles refer to the same listener.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        core::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Listener")
            .field(&Rc::as_ptr(&self.0).cast::<()>())
            .finish()
    }
}

/// Registration options, mirroring native listener options.
///
/// Only `once` changes simulated behavior; `capture` and `passive` are stored
/// and passed through to real targets.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct ListenerOptions {
    /// Remove the listener after its first invocation.
    pub once: bool,
    /// Register for the capture phase.
    pub capture: bool,
    /// Promise not to veto the event.
    pub passive: bool,
}

impl ListenerOptions {
    /// Options for a listener that fires at most once.
    #[must_use]
    pub const fn once() -> Self {
        Self {
            once: true,
            capture: false,
            passive: false,
        }
    }

    /// Returns a copy with `passive` set.
    #[must_use]
    pub const fn with_passive(mut self, passive: bool) -> Self {
        self.passive = passive;
        self
    }

    /// Returns a copy with `capture` set.
    #[must_use]
    pub const fn with_capture(mut self, capture: bool) -> Self {
        self.capture = capture;
        self
    }
}

impl From<bool> for ListenerOptions {
    fn from(capture: bool) -> Self {
        Self {
            capture,
            ..Self::default()
        }
    }
}
