//! Semaphore helpers shared by every concurrent pass

use relbuild_errors::Error;
use std::sync::Arc;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Wait for a worker slot
///
/// `operation` names the pass in the error message.
///
/// # Errors
///
/// Returns an error if the semaphore is closed
pub async fn acquire_semaphore_permit(
    semaphore: Arc<Semaphore>,
    operation: &str,
) -> Result<OwnedSemaphorePermit, Error> {
    semaphore
        .acquire_owned()
        .await
        .map_err(|_| Error::internal(format!("worker pool for {operation} is closed")))
}

/// Semaphore with `permits` slots; a limit of zero still allows one worker
#[must_use]
pub fn create_semaphore(permits: usize) -> Arc<Semaphore> {
    Arc::new(Semaphore::new(permits.max(1)))
}
