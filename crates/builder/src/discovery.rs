//! Target discovery in a release tree

use crate::layout::BuildLayout;
use relbuild_config::{Config, PathConfig};
use relbuild_errors::Error;
use relbuild_types::{BuildTarget, TargetKind};
use std::path::{Path, PathBuf};

/// Targets grouped by kind, each group in path order
#[derive(Debug, Clone, Default)]
pub struct DiscoveredTargets {
    pub modules: Vec<BuildTarget>,
    pub auxiliary: Vec<BuildTarget>,
    pub doc: Option<BuildTarget>,
}

impl DiscoveredTargets {
    /// Every target, auxiliary first, then doc, then modules
    #[must_use]
    pub fn all(&self) -> Vec<BuildTarget> {
        self.auxiliary
            .iter()
            .chain(self.doc.iter())
            .chain(self.modules.iter())
            .cloned()
            .collect()
    }

    /// Directories swept by housekeeping
    #[must_use]
    pub fn directories(&self) -> Vec<PathBuf> {
        self.all().into_iter().map(|t| t.path).collect()
    }
}

/// Find the targets of the tree rooted at `root`
///
/// Missing group directories yield empty groups.
///
/// # Errors
///
/// Returns an error if an existing group directory cannot be read.
pub fn discover_targets(
    root: &Path,
    paths: &PathConfig,
    layout: &BuildLayout,
) -> Result<DiscoveredTargets, Error> {
    let modules = subdirectories(&Config::resolve(root, &paths.modules_dir))?
        .into_iter()
        .map(|dir| target(dir, TargetKind::Module, layout))
        .collect();
    let auxiliary = subdirectories(&Config::resolve(root, &paths.assets_dir))?
        .into_iter()
        .map(|dir| target(dir, TargetKind::Auxiliary, layout))
        .collect();
    let doc_dir = Config::resolve(root, &paths.doc_dir);
    let doc = doc_dir
        .is_dir()
        .then(|| target(doc_dir, TargetKind::Doc, layout));

    Ok(DiscoveredTargets {
        modules,
        auxiliary,
        doc,
    })
}

/// Classify a single directory given by path
#[must_use]
pub fn target_at(path: &Path, paths: &PathConfig, root: &Path, layout: &BuildLayout) -> BuildTarget {
    let kind = if path.starts_with(Config::resolve(root, &paths.modules_dir)) {
        TargetKind::Module
    } else if path.starts_with(Config::resolve(root, &paths.doc_dir)) {
        TargetKind::Doc
    } else {
        TargetKind::Auxiliary
    };
    target(path.to_path_buf(), kind, layout)
}

fn target(path: PathBuf, kind: TargetKind, layout: &BuildLayout) -> BuildTarget {
    let strategy = layout.detect_strategy(&path);
    BuildTarget::new(path, kind, strategy)
}

fn subdirectories(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| Error::io_with_path(&e, dir))? {
        let entry = entry.map_err(|e| Error::io_with_path(&e, dir))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use relbuild_types::BuildStrategy;
    use tempfile::tempdir;

    #[test]
    fn finds_each_kind_in_order() {
        let temp = tempdir().unwrap();
        let root = temp.path();
        for module in ["zeta", "alpha"] {
            let dir = root.join("src/puppet/modules").join(module);
            std::fs::create_dir_all(&dir).unwrap();
            std::fs::write(dir.join("metadata.json"), "{}").unwrap();
        }
        let asset = root.join("src/assets/tools");
        std::fs::create_dir_all(&asset).unwrap();
        std::fs::write(asset.join("Rakefile"), "").unwrap();
        std::fs::create_dir_all(root.join("src/doc")).unwrap();

        let found =
            discover_targets(root, &PathConfig::default(), &BuildLayout::default()).unwrap();
        let names: Vec<String> = found.modules.iter().map(BuildTarget::name).collect();
        assert_eq!(names, ["alpha", "zeta"]);
        assert_eq!(found.auxiliary[0].strategy, Some(BuildStrategy::GenericBuildFile));
        assert_eq!(found.doc.as_ref().map(|d| d.strategy), Some(None));
        assert_eq!(found.all().len(), 4);
        assert_eq!(found.all()[0].kind, TargetKind::Auxiliary);
    }

    #[test]
    fn empty_tree_has_no_targets() {
        let temp = tempdir().unwrap();
        let found =
            discover_targets(temp.path(), &PathConfig::default(), &BuildLayout::default()).unwrap();
        assert!(found.all().is_empty());
    }
}
