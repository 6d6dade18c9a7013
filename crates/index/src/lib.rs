#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Published package index for relbuild
//!
//! This crate answers whether a package has already been published and
//! fetches published artifacts. The index document is a JSON listing of
//! canonical file names, cached locally so that a run can skip the refresh.

mod cache;
mod client;
mod models;

pub use cache::IndexCache;
pub use client::{HttpIndexClient, PackageIndexClient};
pub use models::{Index, IndexEntry, IndexMetadata};

use relbuild_errors::{Error, IndexError};
use relbuild_events::{AppEvent, EventEmitter, EventSender, FailureContext, IndexEvent};
use relbuild_net::{retry_transient, RetryConfig};
use relbuild_types::RemotePackage;
use std::path::{Path, PathBuf};

/// Supported index format version
pub const SUPPORTED_INDEX_VERSION: u32 = 1;

/// Fetch `package` into `target_dir` unless it is already there
///
/// Transient failures are retried up to `retries` attempts in total; a
/// permanent failure stops immediately.
///
/// # Errors
///
/// Returns `IndexError::DownloadFailed` carrying the attempt count once the
/// budget is exhausted or a permanent error occurs.
pub async fn download_with_retry(
    client: &dyn PackageIndexClient,
    package: &RemotePackage,
    target_dir: &Path,
    retry: &RetryConfig,
    events: &Option<EventSender>,
) -> Result<PathBuf, Error> {
    let existing = target_dir.join(&package.identifier);
    if tokio::fs::try_exists(&existing).await.unwrap_or(false) {
        events.emit(AppEvent::Index(IndexEvent::FetchSkipped {
            package: package.name.clone(),
            path: existing.clone(),
        }));
        return Ok(existing);
    }

    events.emit(AppEvent::Index(IndexEvent::FetchStarted {
        package: package.name.clone(),
        identifier: package.identifier.clone(),
    }));

    let max_attempts = retry.max_attempts;
    let result = retry_transient(
        retry,
        || client.download(&package.name, target_dir),
        |attempt, err| {
            events.emit(AppEvent::Index(IndexEvent::FetchRetry {
                package: package.name.clone(),
                attempt,
                max_attempts,
                message: err.to_string(),
            }));
        },
    )
    .await;

    match result {
        Ok(path) => {
            events.emit(AppEvent::Index(IndexEvent::FetchCompleted {
                package: package.name.clone(),
                path: path.clone(),
            }));
            Ok(path)
        }
        Err((err, attempts)) => {
            let failed: Error = IndexError::DownloadFailed {
                package: package.identifier.clone(),
                attempts,
                message: err.to_string(),
            }
            .into();
            events.emit(AppEvent::Index(IndexEvent::FetchFailed {
                package: package.name.clone(),
                failure: FailureContext::from_error(&failed),
            }));
            Err(failed)
        }
    }
}
