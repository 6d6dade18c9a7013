#![deny(clippy::pedantic, unsafe_code)]

//! Worker limits for relbuild
//!
//! Build passes, signing passes and housekeeping sweeps each bound their
//! concurrency with a semaphore created here and take a permit before
//! spawning a task.

pub mod semaphore;

pub use semaphore::{acquire_semaphore_permit, create_semaphore};
