// Copyright 2025 the Hedgerow Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Cookie manager errors.

use alloc::string::String;

use hedgerow_dispatch::ListenerError;

/// A cookie could not be written or an option could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum CookieError {
    /// The cookie name was empty.
    #[error("cookie name must be set")]
    EmptyName,
    /// The cookie value was empty.
    #[error("cookie value must be set")]
    EmptyValue,
    /// An expiry unit keyword was not one of `day`, `hr`, `min`, `sec`.
    #[error("expire mode must be one of (day|hr|min|sec), got \"{0}\"")]
    UnknownExpiryMode(String),
    /// A `SameSite` keyword was not one of `lax`, `strict`, `none`.
    #[error("same-site must be one of (lax|strict|none), got \"{0}\"")]
    UnknownSameSite(String),
    /// A listener failed while a cookie event was dispatched.
    #[error(transparent)]
    Listener(#[from] ListenerError),
}
