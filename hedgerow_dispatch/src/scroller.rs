// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A scroll controller that asks listeners before it scrolls.
//!
//! [`Scroller::scroll_to`] dispatches a cancelable `"scroll.before"` event. If a
//! listener vetoes it, nothing scrolls and no `"scroll.after"` event follows.
//! The actual scrolling is delegated to a [`ScrollHost`].

use alloc::rc::Rc;
use alloc::string::String;

use crate::dispatcher::EventDispatcher;
use crate::error::ListenerError;
use crate::event::Detail;

/// Event dispatched before scrolling; cancelable.
pub const SCROLL_BEFORE: &str = "scroll.before";
/// Event dispatched after scrolling.
pub const SCROLL_AFTER: &str = "scroll.after";

/// The environment that performs scrolling.
pub trait ScrollHost {
    /// The current scroll position.
    fn position(&self) -> f64;

    /// Moves to `position`.
    fn scroll_to(&mut self, position: f64);
}

/// Scroller options.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollerConfig {
    /// Subtracted from every requested position (for example a sticky header height).
    pub offset: f64,
}

impl ScrollerConfig {
    /// Returns a copy with `offset` set.
    #[must_use]
    pub const fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }
}

/// Dispatches veto-able scroll events around a [`ScrollHost`].
#[derive(Debug)]
pub struct Scroller<H> {
    dispatcher: Rc<EventDispatcher>,
    host: H,
    config: ScrollerConfig,
}

impl<H: ScrollHost> Scroller<H> {
    /// Creates a scroller dispatching through `dispatcher`.
    #[must_use]
    pub fn new(host: H, config: ScrollerConfig, dispatcher: Rc<EventDispatcher>) -> Self {
        Self {
            dispatcher,
            host,
            config,
        }
    }

    /// The dispatcher scroll events are sent through.
    #[must_use]
    pub fn dispatcher(&self) -> &Rc<EventDispatcher> {
        &self.dispatcher
    }

    /// The scroll host.
    #[must_use]
    pub fn host(&self) -> &H {
        &self.host
    }

    /// The active configuration.
    #[must_use]
    pub fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    /// Scrolls to `position` unless a `"scroll.before"` listener vetoes it.
    ///
    /// Returns `Ok(true)` if the scroll happened and `Ok(false)` if it was
    /// vetoed. Both events carry `from` and `to` (`f64`) detail fields.
    pub fn scroll_to(&mut self, position: f64) -> Result<bool, ListenerError> {
        let from = self.host.position();
        let to = position - self.config.offset;
        let detail = Detail::new().with("from", from).with("to", to);

        if !self
            .dispatcher
            .dispatch_event(SCROLL_BEFORE, Some(detail.clone()), true, true)?
        {
            tracing::debug!(from, to, "scroll vetoed");
            if let Some(debug) = self.dispatcher.debug() {
                debug.warn(format_args!("Scroller::scroll_to vetoed scroll to {to}"));
            }
            return Ok(false);
        }

        self.host.scroll_to(to);
        self.dispatcher
            .dispatch_event(SCROLL_AFTER, Some(detail), true, false)?;
        Ok(true)
    }
}

/// Replaces the fragment of `url` with `hash` (given without `#`).
#[must_use]
pub fn url_with_hash(url: &str, hash: &str) -> String {
    let base = url.split_once('#').map_or(url, |(base, _)| base);
    let mut out = String::with_capacity(base.len() + hash.len() + 1);
    out.push_str(base);
    out.push('#');
    out.push_str(hash);
    out
}
