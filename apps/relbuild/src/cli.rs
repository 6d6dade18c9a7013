//! Command line interface definition

use clap::{Parser, Subcommand};
use relbuild_types::{FetchMode, RebuildPolicy};
use std::path::PathBuf;

/// relbuild - build, sign and publish a package release tree
#[derive(Parser)]
#[command(name = "relbuild")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Build, sign and publish a package release tree")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalArgs,
}

/// Global arguments available for all commands
#[derive(Parser)]
pub struct GlobalArgs {
    /// Output the result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Show per-target decision details and debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use alternate config file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Release tree root
    #[arg(long, global = true, value_name = "DIR", default_value = ".")]
    pub root: PathBuf,

    /// Worker limit for builds, signing and housekeeping (0 = auto)
    #[arg(short, long, global = true)]
    pub jobs: Option<usize>,
}

/// Available commands
#[derive(Subcommand)]
pub enum Commands {
    /// Build the whole release tree and populate the artifact repository
    Build {
        /// Sign the populated repository afterwards
        #[arg(long)]
        sign: bool,

        #[command(flatten)]
        decision: DecisionArgs,
    },

    /// Build the given target directories
    #[command(name = "build-target")]
    BuildTarget {
        /// Target directories, relative to the tree root
        #[arg(required = true)]
        targets: Vec<PathBuf>,

        #[command(flatten)]
        decision: DecisionArgs,
    },

    /// Sign every artifact under a directory
    Sign {
        /// Directory to sign (defaults to the configured artifact directory)
        root: Option<PathBuf>,

        /// Re-sign artifacts that already carry a signature
        #[arg(long)]
        force: bool,

        /// Per-artifact timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Copy the artifacts named in every build record into the repository
    Populate,

    /// Report which targets still need to be published
    #[command(name = "check-published")]
    CheckPublished,

    /// Run the clean command in every target
    Clean,

    /// Run the clobber command in every target
    Clobber,
}

/// Overrides for the rebuild decision
#[derive(clap::Args, Default)]
pub struct DecisionArgs {
    /// Force or suppress local rebuilds
    #[arg(long, value_enum)]
    pub rebuild: Option<RebuildPolicy>,

    /// Whether published packages may replace local builds
    #[arg(long, value_enum)]
    pub fetch: Option<FetchMode>,
}

impl Commands {
    pub fn decision(&self) -> Option<&DecisionArgs> {
        match self {
            Self::Build { decision, .. } | Self::BuildTarget { decision, .. } => Some(decision),
            _ => None,
        }
    }
}
