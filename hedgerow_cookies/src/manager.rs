// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The cookie manager and its write options.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::fmt;
use core::str::FromStr;
use core::time::Duration;

use hashbrown::HashMap;
use hedgerow_dispatch::{DebugSink, Detail, EventDispatcher};
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, percent_decode_str, utf8_percent_encode};

use crate::date::format_http_date;
use crate::error::CookieError;
use crate::store::{CookieStore, parse_cookies};

/// Dispatched after the jar was re-read and changed; detail `cookies`.
pub const COOKIES_REFRESHED: &str = "cookies.refreshed";
/// Dispatched after a cookie was written; detail `cookie`.
pub const COOKIE_SET: &str = "cookie.set";
/// Dispatched after a cookie was removed; detail `cookie`.
pub const COOKIE_UNSET: &str = "cookie.unset";

/// Characters escaped in cookie values: everything except `A-Z a-z 0-9 - _ . ! ~ * ' ( )`.
const VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// How far an [`Expiry::In`] amount reaches.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum ExpiryUnit {
    /// Days.
    #[default]
    Day,
    /// Hours.
    Hour,
    /// Minutes.
    Minute,
    /// Seconds.
    Second,
}

impl ExpiryUnit {
    /// Length of one unit in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        match self {
            Self::Day => 24 * 60 * 60,
            Self::Hour => 60 * 60,
            Self::Minute => 60,
            Self::Second => 1,
        }
    }
}

impl FromStr for ExpiryUnit {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "day" => Ok(Self::Day),
            "hr" => Ok(Self::Hour),
            "min" => Ok(Self::Minute),
            "sec" => Ok(Self::Second),
            _ => Err(CookieError::UnknownExpiryMode(s.to_string())),
        }
    }
}

/// When a cookie expires.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Expiry {
    /// Relative to the time of writing; negative amounts lie in the past.
    In(i64, ExpiryUnit),
    /// An absolute time in seconds since the Unix epoch.
    At(u64),
}

impl Expiry {
    /// Resolves to seconds since the epoch, saturating at the epoch.
    #[must_use]
    pub fn resolve(self, now: Duration) -> u64 {
        match self {
            Self::In(amount, unit) => now
                .as_secs()
                .saturating_add_signed(amount.saturating_mul(unit.seconds())),
            Self::At(secs) => secs,
        }
    }
}

/// `SameSite` restriction.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum SameSite {
    /// Sent with top-level navigations.
    Lax,
    /// Same-site requests only.
    #[default]
    Strict,
    /// Sent everywhere; requires `Secure`.
    None,
}

impl SameSite {
    /// The attribute value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Lax => "lax",
            Self::Strict => "strict",
            Self::None => "none",
        }
    }
}

impl fmt::Display for SameSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SameSite {
    type Err = CookieError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "lax" => Ok(Self::Lax),
            "strict" => Ok(Self::Strict),
            "none" => Ok(Self::None),
            _ => Err(CookieError::UnknownSameSite(s.to_string())),
        }
    }
}

/// Attributes for [`CookieManager::set`].
///
/// The default is a session cookie on path `/`, `SameSite=strict`, `Secure`,
/// scoped to the store's host.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CookieOptions {
    /// Expiry; takes precedence over `max_age`.
    pub expiry: Option<Expiry>,
    /// Lifetime in seconds.
    pub max_age: Option<u64>,
    /// `Path` attribute.
    pub path: Option<String>,
    /// `SameSite` attribute.
    pub same_site: Option<SameSite>,
    /// `Secure` attribute.
    pub secure: bool,
    /// `Domain` attribute; the store's host when `None`.
    pub domain: Option<String>,
}

impl Default for CookieOptions {
    fn default() -> Self {
        Self {
            expiry: None,
            max_age: None,
            path: Some(String::from("/")),
            same_site: Some(SameSite::Strict),
            secure: true,
            domain: None,
        }
    }
}

impl CookieOptions {
    /// Returns a copy with `expiry` set.
    #[must_use]
    pub fn with_expiry(mut self, expiry: Expiry) -> Self {
        self.expiry = Some(expiry);
        self
    }

    /// Returns a copy with `max_age` set.
    #[must_use]
    pub fn with_max_age(mut self, secs: u64) -> Self {
        self.max_age = Some(secs);
        self
    }

    /// Returns a copy with `path` set.
    #[must_use]
    pub fn with_path(mut self, path: Option<String>) -> Self {
        self.path = path;
        self
    }

    /// Returns a copy with `same_site` set.
    #[must_use]
    pub fn with_same_site(mut self, same_site: Option<SameSite>) -> Self {
        self.same_site = same_site;
        self
    }

    /// Returns a copy with `secure` set.
    #[must_use]
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Returns a copy with `domain` set.
    #[must_use]
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }
}

/// A written cookie, as carried in `cookie.set`/`cookie.unset` events.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Cookie {
    /// Cookie name.
    pub name: String,
    /// Unencoded value; empty for removals.
    pub value: String,
}

/// Reads and writes a [`CookieStore`], reporting changes through a dispatcher.
pub struct CookieManager<S> {
    store: S,
    dispatcher: Rc<EventDispatcher>,
    jar: String,
    cookies: HashMap<String, String>,
}

impl<S: CookieStore> CookieManager<S> {
    /// Creates a manager over `store` with its own simulated dispatcher.
    ///
    /// The jar is loaded immediately; no listener can observe that first load.
    #[must_use]
    pub fn new(store: S, debug: Option<Rc<dyn DebugSink>>) -> Self {
        let dispatcher = debug.map_or_else(EventDispatcher::simulated, EventDispatcher::with_debug);
        let jar = store.read();
        let cookies = parse_cookies(&jar);
        Self {
            store,
            dispatcher,
            jar,
            cookies,
        }
    }

    /// Creates a manager dispatching through an existing `dispatcher`.
    ///
    /// Unlike [`new`](Self::new), the initial load dispatches
    /// `"cookies.refreshed"` if the jar is not empty.
    pub fn with_dispatcher(store: S, dispatcher: Rc<EventDispatcher>) -> Result<Self, CookieError> {
        let mut manager = Self {
            store,
            dispatcher,
            jar: String::new(),
            cookies: HashMap::new(),
        };
        manager.refresh_jar()?;
        Ok(manager)
    }

    /// The dispatcher cookie events are sent through.
    #[must_use]
    pub fn dispatcher(&self) -> &Rc<EventDispatcher> {
        &self.dispatcher
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Re-reads the jar.
    ///
    /// If the jar string changed, the cookie map is rebuilt and
    /// `"cookies.refreshed"` is dispatched. Returns whether anything changed.
    pub fn refresh_jar(&mut self) -> Result<bool, CookieError> {
        let jar = self.store.read();
        if jar == self.jar {
            return Ok(false);
        }
        self.cookies = parse_cookies(&jar);
        self.jar = jar;
        tracing::trace!(count = self.cookies.len(), "cookie jar refreshed");
        let detail = Detail::new().with("cookies", self.cookies.clone());
        self.dispatcher
            .dispatch_event(COOKIES_REFRESHED, Some(detail), true, false)?;
        Ok(true)
    }

    /// Writes a cookie and returns it.
    ///
    /// `value` is percent-encoded. `now` is the current time since the Unix
    /// epoch and anchors relative expiries. Dispatches `"cookie.set"`, then
    /// refreshes the jar.
    pub fn set(
        &mut self,
        name: &str,
        value: &str,
        options: &CookieOptions,
        now: Duration,
    ) -> Result<Cookie, CookieError> {
        if name.is_empty() {
            return Err(CookieError::EmptyName);
        }
        if value.is_empty() {
            return Err(CookieError::EmptyValue);
        }
        self.write(name, value, options, now, false)
    }

    /// Removes `name` by writing it with an expiry in the past.
    ///
    /// Does nothing and returns `Ok(None)` if the cookie is not present.
    /// Dispatches `"cookie.unset"`.
    pub fn remove(
        &mut self,
        name: &str,
        options: &CookieOptions,
        now: Duration,
    ) -> Result<Option<Cookie>, CookieError> {
        if !self.has(name) {
            return Ok(None);
        }
        let options = CookieOptions {
            expiry: Some(Expiry::In(-1000, ExpiryUnit::Day)),
            max_age: None,
            ..options.clone()
        };
        self.write(name, "", &options, now, true).map(Some)
    }

    fn write(
        &mut self,
        name: &str,
        value: &str,
        options: &CookieOptions,
        now: Duration,
        unset: bool,
    ) -> Result<Cookie, CookieError> {
        let domain = options.domain.as_deref().unwrap_or(self.store.host());
        let mut parts: Vec<String> = Vec::with_capacity(6);
        parts.push(format!("{name}={}", utf8_percent_encode(value, VALUE)));
        parts.push(format!("Domain={domain}"));
        if let Some(expiry) = options.expiry {
            parts.push(format!("Expires={}", format_http_date(expiry.resolve(now))));
        } else if let Some(max_age) = options.max_age {
            parts.push(format!("Max-Age={max_age}"));
        }
        if let Some(path) = &options.path {
            parts.push(format!("Path={path}"));
        }
        if let Some(same_site) = options.same_site {
            parts.push(format!("SameSite={same_site}"));
        }
        if options.secure {
            parts.push(String::from("Secure"));
        }
        let line = parts.join("; ");
        tracing::debug!(cookie = name, unset, "writing cookie");
        self.store.write(&line, now);

        let cookie = Cookie {
            name: name.to_string(),
            value: value.to_string(),
        };
        let event = if unset { COOKIE_UNSET } else { COOKIE_SET };
        let detail = Detail::new().with("cookie", cookie.clone());
        self.dispatcher
            .dispatch_event(event, Some(detail), true, false)?;
        self.refresh_jar()?;
        Ok(cookie)
    }

    /// Returns the decoded value of `name`, or `None` if absent or empty.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<String> {
        let raw = self.cookies.get(name).filter(|v| !v.is_empty())?;
        Some(percent_decode_str(raw).decode_utf8_lossy().into_owned())
    }

    /// Returns `true` if `name` is in the jar, even with an empty value.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.cookies.contains_key(name)
    }

    /// All cookies as last read, with raw (still encoded) values.
    #[must_use]
    pub fn cookies(&self) -> &HashMap<String, String> {
        &self.cookies
    }
}

impl<S: fmt::Debug> fmt::Debug for CookieManager<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CookieManager")
            .field("store", &self.store)
            .field("jar", &self.jar)
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}
