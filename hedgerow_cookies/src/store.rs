// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cookie jar access and parsing.
//!
//! A [`CookieStore`] is the host's cookie jar seen through the same narrow
//! window a page script has: read the whole jar as one `name=value; ...`
//! string, write one `Set-Cookie` style string at a time.
//! [`MemoryJar`] is an in-memory implementation.

use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::time::Duration;

use hashbrown::HashMap;

use crate::date::parse_http_date;

/// The host's cookie jar.
pub trait CookieStore {
    /// Returns the jar as `name=value` pairs joined by `"; "`.
    fn read(&self) -> String;

    /// Applies one `name=value; Attr=...` cookie string.
    ///
    /// `now` is the current time since the Unix epoch, used to evaluate
    /// `Expires` and `Max-Age`.
    fn write(&mut self, cookie: &str, now: Duration);

    /// The host name used when a cookie names no domain.
    fn host(&self) -> &str;
}

/// Parses one `name=value` pair, trimming surrounding whitespace.
///
/// Only the first `=` separates name from value. A pair without `=` has an
/// empty value.
#[must_use]
pub fn parse_cookie(s: &str) -> (String, String) {
    let s = s.trim();
    let (name, value) = s.split_once('=').unwrap_or((s, ""));
    (name.to_string(), value.to_string())
}

/// Parses a jar string into a name to value map.
///
/// Empty segments are skipped; a later duplicate name wins.
#[must_use]
pub fn parse_cookies(s: &str) -> HashMap<String, String> {
    s.split(';')
        .filter(|part| !part.trim().is_empty())
        .map(parse_cookie)
        .collect()
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct Stored {
    name: String,
    value: String,
    /// Seconds since the epoch.
    expires: Option<u64>,
}

/// An in-memory cookie jar.
///
/// Cookies keep their creation order. Expiry is evaluated when a cookie is
/// written and by [`clear_expired`](Self::clear_expired). Domain, path and
/// security attributes are accepted but not used for matching.
#[derive(Clone, Debug, Default)]
pub struct MemoryJar {
    host: String,
    cookies: Vec<Stored>,
}

impl MemoryJar {
    /// Creates an empty jar for `host`.
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            cookies: Vec::new(),
        }
    }

    /// Number of stored cookies.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cookies.len()
    }

    /// Returns `true` if the jar holds no cookies.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Returns the expiry of `name` in seconds since the epoch, if it has one.
    #[must_use]
    pub fn expires(&self, name: &str) -> Option<u64> {
        self.cookies.iter().find(|c| c.name == name)?.expires
    }

    /// Drops every cookie expired at `now`.
    pub fn clear_expired(&mut self, now: Duration) {
        let now = now.as_secs();
        self.cookies
            .retain(|c| c.expires.is_none_or(|expires| expires > now));
    }
}

impl CookieStore for MemoryJar {
    fn read(&self) -> String {
        let mut out = String::new();
        for c in &self.cookies {
            if !out.is_empty() {
                out.push_str("; ");
            }
            out.push_str(&c.name);
            out.push('=');
            out.push_str(&c.value);
        }
        out
    }

    fn write(&mut self, cookie: &str, now: Duration) {
        let mut parts = cookie.split(';');
        let (name, value) = parse_cookie(parts.next().unwrap_or_default());
        if name.is_empty() {
            return;
        }
        let now = now.as_secs();
        let mut expires = None;
        let mut max_age = None;
        for part in parts {
            let (attr, val) = parse_cookie(part);
            if attr.eq_ignore_ascii_case("expires") {
                expires = parse_http_date(&val);
            } else if attr.eq_ignore_ascii_case("max-age") {
                max_age = val.parse::<i64>().ok();
            }
        }
        // Max-Age wins over Expires.
        if let Some(secs) = max_age {
            expires = Some(now.saturating_add_signed(secs));
        }

        let pos = self.cookies.iter().position(|c| c.name == name);
        if expires.is_some_and(|at| at <= now) {
            if let Some(pos) = pos {
                self.cookies.remove(pos);
            }
            return;
        }
        let stored = Stored {
            name,
            value,
            expires,
        };
        match pos {
            Some(pos) => self.cookies[pos] = stored,
            None => self.cookies.push(stored),
        }
    }

    fn host(&self) -> &str {
        &self.host
    }
}
