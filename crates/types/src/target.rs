//! Build target definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Shape of a buildable component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
    Module,
    Auxiliary,
    Doc,
}

impl fmt::Display for TargetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Module => write!(f, "module"),
            Self::Auxiliary => write!(f, "aux"),
            Self::Doc => write!(f, "doc"),
        }
    }
}

/// How a target is built
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BuildStrategy {
    /// A package descriptor drives metadata and the build
    Descriptor,
    /// The target's own build file drives an arbitrary procedure
    GenericBuildFile,
}

/// One independently buildable directory
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BuildTarget {
    pub path: PathBuf,
    pub kind: TargetKind,
    /// `None` when neither a descriptor nor a build file was found
    pub strategy: Option<BuildStrategy>,
}

impl BuildTarget {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, kind: TargetKind, strategy: Option<BuildStrategy>) -> Self {
        Self {
            path: path.into(),
            kind,
            strategy,
        }
    }

    /// Last path component, used as a short display name
    #[must_use]
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map_or_else(|| self.path.display().to_string(), |n| n.to_string_lossy().into_owned())
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl fmt::Display for BuildTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path.display())
    }
}
