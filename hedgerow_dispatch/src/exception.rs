// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Turn caught errors into dispatcher events.
//!
//! [`ExceptionHandler::catch`] classifies its input, dispatches a cancelable
//! `"{prefix}.always"` event and, unless a listener vetoes that, a
//! `"{prefix}.{Kind}"` event named after the input kind.
//!
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use hedgerow_dispatch::exception::{CaughtError, ErrorInput, ExceptionHandler, ExceptionHandlerConfig};
//! use hedgerow_dispatch::{EventDispatcher, Listener, ListenerOptions};
//!
//! let handler = ExceptionHandler::new(EventDispatcher::simulated(), ExceptionHandlerConfig::default());
//! let reports = Rc::new(RefCell::new(Vec::new()));
//! let sink = reports.clone();
//! handler.dispatcher().add_event_listener(
//!     "error.String",
//!     Listener::new(move |event| {
//!         let error = event.detail().get::<CaughtError>("error").unwrap();
//!         sink.borrow_mut().push(error.to_string());
//!         Ok(())
//!     }),
//!     ListenerOptions::default(),
//! );
//!
//! handler.catch(ErrorInput::String("disk full".into())).unwrap();
//! assert_eq!(*reports.borrow(), vec!["String#disk full".to_string()]);
//! ```

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use core::fmt;

use crate::dispatcher::EventDispatcher;
use crate::error::ListenerError;
use crate::event::Detail;

/// An error-like value handed to [`ExceptionHandler::catch`].
#[derive(Clone, Debug, PartialEq)]
pub enum ErrorInput {
    /// A bare number was raised.
    Number(f64),
    /// A bare string was raised.
    String(String),
    /// A plain error.
    Error {
        /// Error message.
        message: String,
    },
    /// An error wrapping a previous error.
    Exception {
        /// Error message.
        message: String,
        /// Rendered previous error.
        previous: String,
    },
    /// An uncaught error event.
    ErrorEvent {
        /// Event message.
        message: String,
        /// Rendered error object, if the event carried one.
        error: Option<String>,
    },
    /// An unhandled promise rejection.
    PromiseRejection {
        /// Rendered rejection reason, if any.
        reason: Option<String>,
    },
}

/// The classification of an [`ErrorInput`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// [`ErrorInput::Number`].
    Number,
    /// [`ErrorInput::String`].
    String,
    /// [`ErrorInput::Error`].
    Error,
    /// [`ErrorInput::Exception`].
    Exception,
    /// [`ErrorInput::ErrorEvent`].
    ErrorEvent,
    /// [`ErrorInput::PromiseRejection`].
    PromiseRejectionEvent,
}

impl ErrorKind {
    /// The name used as event suffix.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Number => "Number",
            Self::String => "String",
            Self::Error => "Error",
            Self::Exception => "Exception",
            Self::ErrorEvent => "ErrorEvent",
            Self::PromiseRejectionEvent => "PromiseRejectionEvent",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ErrorInput {
    /// Classifies the input.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Number(_) => ErrorKind::Number,
            Self::String(_) => ErrorKind::String,
            Self::Error { .. } => ErrorKind::Error,
            Self::Exception { .. } => ErrorKind::Exception,
            Self::ErrorEvent { .. } => ErrorKind::ErrorEvent,
            Self::PromiseRejection { .. } => ErrorKind::PromiseRejectionEvent,
        }
    }

    /// Renders the most specific message the input carries.
    #[must_use]
    pub fn message(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::String(s) => s.clone(),
            Self::Error { message } | Self::Exception { message, .. } => message.clone(),
            Self::ErrorEvent { message, error } => error.clone().unwrap_or_else(|| message.clone()),
            Self::PromiseRejection { reason } => reason
                .clone()
                .unwrap_or_else(|| String::from("PromiseRejectionEvent")),
        }
    }
}

/// The normalized error carried by handler events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaughtError {
    /// Input classification.
    pub kind: ErrorKind,
    /// Rendered message.
    pub message: String,
}

impl fmt::Display for CaughtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.message)
    }
}

/// Exception handler options.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExceptionHandlerConfig {
    /// Event name prefix.
    pub prefix: String,
    /// Suppress the host's default reporting of uncaught errors.
    pub suppress: bool,
}

impl Default for ExceptionHandlerConfig {
    fn default() -> Self {
        Self {
            prefix: String::from("error"),
            suppress: true,
        }
    }
}

/// Dispatches events for caught and uncaught errors.
#[derive(Debug)]
pub struct ExceptionHandler {
    dispatcher: Rc<EventDispatcher>,
    config: ExceptionHandlerConfig,
}

impl ExceptionHandler {
    /// Creates a handler dispatching through `dispatcher`.
    #[must_use]
    pub fn new(dispatcher: Rc<EventDispatcher>, config: ExceptionHandlerConfig) -> Self {
        Self { dispatcher, config }
    }

    /// Creates a handler and registers `handlers` on its dispatcher.
    pub fn with_handlers<'a>(
        dispatcher: Rc<EventDispatcher>,
        config: ExceptionHandlerConfig,
        handlers: impl IntoIterator<Item = (&'a str, crate::Listener, crate::ListenerOptions)>,
    ) -> Self {
        dispatcher.add_event_list(handlers);
        Self::new(dispatcher, config)
    }

    /// The dispatcher error events are sent through.
    #[must_use]
    pub fn dispatcher(&self) -> &Rc<EventDispatcher> {
        &self.dispatcher
    }

    /// The event name prefix.
    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.config.prefix
    }

    /// Dispatches events for `input`.
    ///
    /// Returns `Ok(false)` if the `.always` event was vetoed, in which case the
    /// kind-specific event is not dispatched.
    pub fn catch(&self, input: ErrorInput) -> Result<bool, ListenerError> {
        let kind = input.kind();
        let error = CaughtError {
            kind,
            message: input.message(),
        };
        tracing::debug!(%error, "caught");
        let detail = Detail::new()
            .with("input", input)
            .with("kind", kind)
            .with("error", error);

        let always = format!("{}.always", self.config.prefix);
        if !self
            .dispatcher
            .dispatch_event(&always, Some(detail.clone()), true, true)?
        {
            return Ok(false);
        }
        let specific = format!("{}.{}", self.config.prefix, kind);
        self.dispatcher
            .dispatch_event(&specific, Some(detail), true, false)
    }

    /// Handles an error that reached the host uncaught.
    ///
    /// Returns `true` if the host should still run its own default reporting.
    pub fn report_uncaught(&self, input: ErrorInput) -> Result<bool, ListenerError> {
        self.catch(input)?;
        Ok(!self.config.suppress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Listener, ListenerOptions};
    use alloc::vec;
    use alloc::vec::Vec;
    use core::cell::RefCell;

    fn handler_with_log(prefix: &str) -> (ExceptionHandler, Rc<RefCell<Vec<String>>>) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let config = ExceptionHandlerConfig {
            prefix: prefix.into(),
            suppress: false,
        };
        let names = [
            "always",
            "Number",
            "String",
            "Error",
            "Exception",
            "ErrorEvent",
            "PromiseRejectionEvent",
        ];
        let handler = ExceptionHandler::new(EventDispatcher::simulated(), config);
        for n in names {
            let l = log.clone();
            handler.dispatcher().add_event_listener(
                &format!("{prefix}.{n}"),
                Listener::new(move |event| {
                    l.borrow_mut().push(String::from(event.name()));
                    Ok(())
                }),
                false,
            );
        }
        (handler, log)
    }

    #[test]
    fn classification_and_messages() {
        let e = ErrorInput::ErrorEvent {
            message: "Script error".into(),
            error: Some("TypeError: x".into()),
        };
        assert_eq!(e.kind(), ErrorKind::ErrorEvent);
        assert_eq!(e.message(), "TypeError: x");
        assert_eq!(ErrorInput::Number(4.0).message(), "4");
        assert_eq!(
            ErrorInput::PromiseRejection { reason: None }.message(),
            "PromiseRejectionEvent"
        );
    }

    #[test]
    fn always_then_specific() {
        let (handler, log) = handler_with_log("err");
        assert!(handler.catch(ErrorInput::Error { message: "x".into() }).unwrap());
        assert_eq!(*log.borrow(), vec!["err.always", "err.Error"]);
    }

    #[test]
    fn vetoed_always_skips_specific() {
        let (handler, log) = handler_with_log("error");
        handler.dispatcher().add_event_listener(
            "error.always",
            Listener::new(|event| {
                event.prevent_default();
                Ok(())
            }),
            ListenerOptions::default(),
        );
        assert!(!handler.catch(ErrorInput::Number(1.0)).unwrap());
        assert_eq!(*log.borrow(), vec!["error.always"]);
    }

    #[test]
    fn uncaught_honors_suppress() {
        let handler = ExceptionHandler::new(
            EventDispatcher::simulated(),
            ExceptionHandlerConfig::default(),
        );
        assert!(!handler.report_uncaught(ErrorInput::String("x".into())).unwrap());
        let (handler, _) = handler_with_log("e");
        assert!(handler.report_uncaught(ErrorInput::String("x".into())).unwrap());
    }

    #[test]
    fn handlers_registered_at_construction() {
        let hits = Rc::new(RefCell::new(0));
        let h = hits.clone();
        let handler = ExceptionHandler::with_handlers(
            EventDispatcher::simulated(),
            ExceptionHandlerConfig::default(),
            [(
                "error.always",
                Listener::new(move |_| {
                    *h.borrow_mut() += 1;
                    Ok(())
                }),
                ListenerOptions::default(),
            )],
        );
        handler.catch(ErrorInput::String("a".into())).unwrap();
        assert_eq!(*hits.borrow(), 1);
    }
}
