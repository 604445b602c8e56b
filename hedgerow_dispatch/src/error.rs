// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Error types shared by the dispatcher and its consumers.

use alloc::string::{String, ToString};
use core::fmt;

use crate::bindable::Capabilities;

/// A structural precondition was violated at construction or registration time.
///
/// These errors are always surfaced to the caller and are never retried.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ConfigurationError {
    /// The dispatcher target does not expose the full bindable capability set.
    #[error("target must be absent or a compatible bindable (missing {missing:?})")]
    IncompatibleTarget {
        /// The capabilities the target failed to report.
        missing: Capabilities,
    },
    /// The dispatcher parent does not expose the full bindable capability set.
    #[error("parent must be absent or a compatible bindable (missing {missing:?})")]
    IncompatibleParent {
        /// The capabilities the parent failed to report.
        missing: Capabilities,
    },
    /// A callback name is not a syntactically valid identifier.
    #[error("invalid callback function name: {0}")]
    InvalidCallbackName(String),
    /// A callback name is already occupied in the callback scope.
    #[error("callback \"{0}\" already defined in scope")]
    CallbackNameTaken(String),
    /// An event name prefix was empty.
    #[error("event name prefix must not be empty")]
    EmptyPrefix,
}

/// An error raised by a listener while an event is being dispatched.
///
/// The dispatcher never swallows these: the first listener error aborts the
/// remaining listeners of the current hop (and therefore bubbling) and is
/// returned unchanged from [`EventDispatcher::dispatch_event`].
///
/// [`EventDispatcher::dispatch_event`]: crate::EventDispatcher::dispatch_event
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ListenerError {
    message: String,
}

impl ListenerError {
    /// Creates a listener error with the given message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Wraps any displayable error, keeping its rendered message.
    pub fn from_display(error: &impl fmt::Display) -> Self {
        Self {
            message: error.to_string(),
        }
    }

    /// Returns the error message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}
