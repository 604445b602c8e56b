// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Diagnostic sinks.
//!
//! A [`DebugSink`] receives advisory, console-style diagnostics from a
//! dispatcher and its consumers. Sinks never affect control flow: every call
//! site ignores what the sink does with the message.
//!
//! All crates in the workspace also emit structured [`tracing`] events
//! regardless of whether a sink is installed. Use [`TracingSink`] to route the
//! console-style stream into the same subscriber.

use core::fmt;

/// Receiver for console-style diagnostics.
pub trait DebugSink {
    /// An informational message.
    fn log(&self, args: fmt::Arguments<'_>);

    /// A recoverable problem worth surfacing.
    fn warn(&self, args: fmt::Arguments<'_>);

    /// An error condition.
    fn error(&self, args: fmt::Arguments<'_>);

    /// Opens a collapsed group; subsequent messages belong to it until [`group_end`](Self::group_end).
    fn group_collapsed(&self, label: fmt::Arguments<'_>) {
        self.log(label);
    }

    /// Closes the innermost group.
    fn group_end(&self) {}
}

/// A [`DebugSink`] that forwards to [`tracing`].
#[derive(Copy, Clone, Debug, Default)]
pub struct TracingSink;

impl DebugSink for TracingSink {
    fn log(&self, args: fmt::Arguments<'_>) {
        tracing::debug!(target: "hedgerow::debug", "{args}");
    }

    fn warn(&self, args: fmt::Arguments<'_>) {
        tracing::warn!(target: "hedgerow::debug", "{args}");
    }

    fn error(&self, args: fmt::Arguments<'_>) {
        tracing::error!(target: "hedgerow::debug", "{args}");
    }

    fn group_collapsed(&self, label: fmt::Arguments<'_>) {
        tracing::debug!(target: "hedgerow::debug", group = true, "{label}");
    }
}
