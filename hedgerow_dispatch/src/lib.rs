// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=hedgerow_dispatch --heading-base-level=0

//! Hedgerow Dispatch: a native-or-simulated event dispatcher for UI code.
//!
//! ## Overview
//!
//! An [`EventDispatcher`] is an event hub that either wraps a real event target
//! or simulates one entirely in memory. Simulated dispatchers keep an ordered
//! listener table per event name and can bubble events to a parent dispatcher,
//! independent of whether any link in the chain is backed by a real target.
//!
//! ## Modes
//!
//! - **Native**: constructed with a `target` implementing [`Bindable`]. Every
//!   registration, removal and dispatch is forwarded to the target, which is
//!   responsible for its own bubbling.
//! - **Simulated**: constructed without a target. Listeners run in
//!   registration order, `once` listeners are consumed, and bubbling follows
//!   explicit `parent` links only.
//!
//! ## Events
//!
//! Each dispatch creates a fresh [`Event`]. Its [`Detail`] carries `target`
//! (the dispatcher the event started on), `current` (the dispatcher handling
//! it right now) and caller fields. A listener can call
//! [`Event::stop_immediate_propagation`] to skip the rest of the hop and all
//! ancestors. On a cancelable event that is also a veto:
//! [`EventDispatcher::dispatch_event`] then returns `false`, which callers use
//! to skip the default action tied to the event.
//!
//! ```
//! use hedgerow_dispatch::{EventDispatcher, Listener, ListenerOptions};
//!
//! let d = EventDispatcher::simulated();
//! d.add_event_listener(
//!     "close",
//!     Listener::new(|event| {
//!         event.stop_immediate_propagation();
//!         Ok(())
//!     }),
//!     ListenerOptions::default(),
//! );
//! let proceed = d.dispatch_event("close", None, true, true).unwrap();
//! assert!(!proceed);
//! ```
//!
//! ## Errors
//!
//! Construction and registration problems are [`ConfigurationError`]s.
//! Listeners return [`ListenerResult`]; the first error aborts the dispatch
//! and is returned to the caller unchanged.
//!
//! ## Consumers
//!
//! - [`CallbackEvents`]: fire events when named callbacks in a [`CallbackScope`] are invoked.
//! - [`scroller::Scroller`]: veto-able scrolling around a host.
//! - [`exception::ExceptionHandler`]: dispatch events for caught errors.
//!
//! ## Diagnostics
//!
//! Every crate emits [`tracing`] events. A console-style [`DebugSink`] can be
//! attached per dispatcher; [`TracingSink`] forwards it to `tracing`.
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod bindable;
pub mod callback;
pub mod debug;
pub mod dispatcher;
pub mod error;
pub mod event;
pub mod exception;
pub mod scroller;

pub use bindable::{
    Bindable, BindableRef, Capabilities, Listener, ListenerOptions, ListenerResult,
    same_bindable,
};
pub use callback::{CallbackEvents, CallbackScope, is_valid_function_name};
pub use debug::{DebugSink, TracingSink};
pub use dispatcher::EventDispatcher;
pub use error::{ConfigurationError, ListenerError};
pub use event::{Detail, DetailValue, Event};
