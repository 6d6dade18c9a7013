#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Artifact signing for relbuild
//!
//! The engine walks an artifact tree and signs each artifact concurrently.
//! Already-signed artifacts are skipped unless forced, each attempt is
//! bounded by a timeout, and every artifact ends with a recorded status.

mod engine;
mod key;
mod report;
mod signer;

pub use engine::{SigningEngine, SigningOptions};
pub use key::SigningKey;
pub use report::SigningReport;
pub use signer::{signature_path, ArtifactSigner, CommandSigner, DigestAlgorithm, MinisignSigner};
