#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Network operations for relbuild
//!
//! This crate handles HTTP access to the package index: fetching the index
//! document, streaming package downloads, and bounded retry of transient
//! failures.

mod client;
pub mod retry;

pub use client::{NetClient, NetConfig};
pub use retry::{calculate_backoff_delay, is_transient, retry_transient, RetryConfig};

use relbuild_errors::{Error, IndexError};
use url::Url;

/// Parse and validate a URL
///
/// # Errors
///
/// Returns an error if the URL string is malformed.
pub fn parse_url(url: &str) -> Result<Url, Error> {
    Url::parse(url).map_err(|e| {
        IndexError::Unavailable {
            message: format!("invalid index URL '{url}': {e}"),
        }
        .into()
    })
}

/// Resolve `relative` against the directory of `base`
///
/// # Errors
///
/// Returns an error if either part cannot form a valid URL.
pub fn join_url(base: &str, relative: &str) -> Result<String, Error> {
    let base = parse_url(base)?;
    base.join(relative).map(String::from).map_err(|e| {
        IndexError::InvalidResponse {
            message: format!("cannot resolve '{relative}': {e}"),
        }
        .into()
    })
}
