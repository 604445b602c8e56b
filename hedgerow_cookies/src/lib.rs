// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

// After you edit the crate's doc comment, run this command, then check README.md for any missing links
// cargo rdme --workspace-project=hedgerow_cookies --heading-base-level=0

//! Hedgerow Cookies: a cookie jar manager built on `hedgerow_dispatch`.
//!
//! [`CookieManager`] keeps a parsed view of a [`CookieStore`] and writes
//! cookies with encoded values and explicit attributes. Every write is
//! announced on the manager's [`EventDispatcher`](hedgerow_dispatch::EventDispatcher):
//!
//! - `"cookie.set"` / `"cookie.unset"` with a [`Cookie`] in detail field `cookie`
//! - `"cookies.refreshed"` with the name to raw value map in detail field `cookies`
//!
//! ```
//! use std::time::Duration;
//! use hedgerow_cookies::{CookieManager, CookieOptions, Expiry, ExpiryUnit, MemoryJar};
//!
//! let now = Duration::from_secs(1_700_000_000);
//! let mut cookies = CookieManager::new(MemoryJar::new("shop.test"), None);
//! cookies
//!     .set(
//!         "cart",
//!         "3 items",
//!         &CookieOptions::default().with_expiry(Expiry::In(7, ExpiryUnit::Day)),
//!         now,
//!     )
//!     .unwrap();
//! assert_eq!(cookies.get("cart").as_deref(), Some("3 items"));
//!
//! cookies.remove("cart", &CookieOptions::default(), now).unwrap();
//! assert!(!cookies.has("cart"));
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

pub mod date;
mod error;
mod manager;
pub mod store;

pub use error::CookieError;
pub use manager::{
    COOKIE_SET, COOKIE_UNSET, COOKIES_REFRESHED, Cookie, CookieManager, CookieOptions, Expiry,
    ExpiryUnit, SameSite,
};
pub use store::{CookieStore, MemoryJar, parse_cookie, parse_cookies};
