#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Rebuild decisions and bounded-parallel builds for relbuild
//!
//! This crate derives package metadata from each target, decides whether the
//! target must be built, fetched or left alone, runs local builds through a
//! [`BuildProcedure`], and persists a [`BuildRecord`](relbuild_types::BuildRecord)
//! per target. It also provides the fail-fast housekeeping sweep.

mod artifacts;
mod command;
mod decision;
mod descriptor;
mod discovery;
mod housekeeping;
mod layout;
mod procedure;
mod record;
mod scheduler;
pub mod spec;
mod tag;

pub use artifacts::{arch_from_file_name, scan_output, ArtifactSet};
pub use command::{run_in, CommandOutcome};
pub use decision::{DecisionOptions, RebuildDecisionEngine};
pub use descriptor::{find_spec, read_metadata, DEFAULT_RELEASE, MODULE_ARCH};
pub use discovery::{discover_targets, target_at, DiscoveredTargets};
pub use housekeeping::{sweep, HousekeepingOptions};
pub use layout::BuildLayout;
pub use procedure::{BuildProcedure, CommandProcedure};
pub use record::{find_records, read_record, write_record};
pub use scheduler::{BuildScheduler, SchedulerOptions};
pub use tag::probe_tag;
