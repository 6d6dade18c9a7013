//! Rebuild decisions
//!
//! A decision compares the local package metadata of one target against the
//! package index and, optionally, against the latest source-control tag. It
//! reads no ambient state: identical inputs give identical decisions.

use crate::descriptor::read_metadata;
use crate::layout::BuildLayout;
use relbuild_errors::Error;
use relbuild_events::{AppEvent, DecisionEvent, EventEmitter, EventSender, FailureContext};
use relbuild_index::PackageIndexClient;
use relbuild_rules::DependencyMetadataStore;
use relbuild_types::{
    BuildTarget, DecisionReason, PackageMetadata, RebuildDecision, RebuildPolicy, RemotePackage,
    TagAdvisory, TagInfo, TagNormalizer,
};
use std::sync::Arc;

/// Inputs to a decision that come from run parameters
#[derive(Debug, Clone, Default)]
pub struct DecisionOptions {
    pub rebuild: RebuildPolicy,
    /// Offer published packages as fetch candidates
    pub fetch: bool,
    /// Probe and compare source-control tags
    pub check_tags: bool,
    /// Emit per-target detail events
    pub verbose: bool,
    pub normalizer: TagNormalizer,
}

/// Outcome of looking up one sub-package
enum Lookup {
    Current(RemotePackage),
    Build(DecisionReason),
}

/// Decides, per target, whether a local build is required
pub struct RebuildDecisionEngine {
    index: Option<Arc<dyn PackageIndexClient>>,
    rules: Arc<DependencyMetadataStore>,
    layout: BuildLayout,
    tx: Option<EventSender>,
}

impl EventEmitter for RebuildDecisionEngine {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl RebuildDecisionEngine {
    /// `index` is `None` when no package index could be constructed; every
    /// target then builds locally.
    #[must_use]
    pub fn new(
        index: Option<Arc<dyn PackageIndexClient>>,
        rules: Arc<DependencyMetadataStore>,
        layout: BuildLayout,
    ) -> Self {
        Self {
            index,
            rules,
            layout,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    #[must_use]
    pub fn index(&self) -> Option<&Arc<dyn PackageIndexClient>> {
        self.index.as_ref()
    }

    #[must_use]
    pub fn rules(&self) -> &DependencyMetadataStore {
        &self.rules
    }

    #[must_use]
    pub fn layout(&self) -> &BuildLayout {
        &self.layout
    }

    /// Decide for `target`, deriving its metadata first
    ///
    /// A rebuild override returns before anything is read.
    ///
    /// # Errors
    ///
    /// Returns an error if the target's metadata cannot be derived.
    pub async fn decide(
        &self,
        target: &BuildTarget,
        tag: Option<&TagInfo>,
        options: &DecisionOptions,
    ) -> Result<RebuildDecision, Error> {
        if options.rebuild.forces_rebuild() {
            return Ok(self.forced(target));
        }
        let metadata = read_metadata(target, &self.layout, &self.rules).await?;
        Ok(self.decide_for(target, &metadata, tag, options).await)
    }

    /// Decide for `target` from already derived metadata
    pub async fn decide_for(
        &self,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        tag: Option<&TagInfo>,
        options: &DecisionOptions,
    ) -> RebuildDecision {
        if options.rebuild.forces_rebuild() {
            return self.forced(target);
        }

        if options.verbose {
            self.emit(AppEvent::Decision(DecisionEvent::Details {
                target: target.path.clone(),
                package: metadata.name.clone(),
                version: metadata.version.clone(),
                release: metadata.release.clone(),
                origin: tag.and_then(|t| t.origin_url.clone()),
            }));
        }

        let advisory = tag.map(|info| self.check_tag(target, metadata, info, options));

        let decision = match &self.index {
            None => {
                self.emit(AppEvent::Decision(DecisionEvent::IndexUnavailable {
                    message: "no package index; building locally".to_string(),
                }));
                RebuildDecision::build(DecisionReason::IndexUnavailable)
            }
            Some(index) => self.compare_published(index.as_ref(), target, metadata, options).await,
        }
        .with_tag(advisory);

        self.emit(AppEvent::Decision(DecisionEvent::Decided {
            target: target.path.clone(),
            must_build: decision.must_build,
            reason: decision.reason,
        }));
        decision
    }

    fn forced(&self, target: &BuildTarget) -> RebuildDecision {
        let decision = RebuildDecision::build(DecisionReason::Forced);
        self.emit(AppEvent::Decision(DecisionEvent::Decided {
            target: target.path.clone(),
            must_build: true,
            reason: DecisionReason::Forced,
        }));
        decision
    }

    fn check_tag(
        &self,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        info: &TagInfo,
        options: &DecisionOptions,
    ) -> TagAdvisory {
        let advisory = match metadata.version_release() {
            Ok(local) => options.normalizer.advise(&local, &info.latest_tag),
            Err(_) => TagAdvisory::Unparseable {
                tag: info.latest_tag.clone(),
            },
        };
        self.emit(AppEvent::Decision(DecisionEvent::TagChecked {
            target: target.path.clone(),
            package: metadata.name.clone(),
            advisory: advisory.clone(),
        }));
        advisory
    }

    /// Every sub-package must be current for the target to skip its build
    async fn compare_published(
        &self,
        index: &dyn PackageIndexClient,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        options: &DecisionOptions,
    ) -> RebuildDecision {
        let mut candidates = Vec::new();
        let mut build_reason = None;

        for package in &metadata.packages {
            match self.lookup(index, target, metadata, package).await {
                Lookup::Current(remote) => candidates.push(remote),
                Lookup::Build(reason) => {
                    build_reason.get_or_insert(reason);
                }
            }
        }

        match build_reason {
            Some(reason) => RebuildDecision::build(reason),
            None if options.fetch => RebuildDecision::skip(candidates),
            None => RebuildDecision::skip(Vec::new()),
        }
    }

    async fn lookup(
        &self,
        index: &dyn PackageIndexClient,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        package: &str,
    ) -> Lookup {
        let published = match index.available(package).await {
            Ok(published) => published,
            Err(e) => {
                self.emit(AppEvent::Decision(DecisionEvent::LookupFailed {
                    target: target.path.clone(),
                    package: package.to_string(),
                    failure: FailureContext::from_error(&e),
                }));
                None
            }
        };

        let Some(remote) = published else {
            self.publish_required(target, package, None, DecisionReason::NewPackage);
            return Lookup::Build(DecisionReason::NewPackage);
        };

        let newer = match (metadata.version_release(), remote.version_release()) {
            (Ok(local), Ok(published)) => local.is_newer_than(&published),
            _ => {
                self.emit_warning(format!(
                    "cannot compare {package} {}-{} with {}; building locally",
                    metadata.version, metadata.release, remote.identifier
                ));
                true
            }
        };

        if newer {
            self.publish_required(
                target,
                package,
                Some(remote.identifier),
                DecisionReason::NewerLocalVersion,
            );
            Lookup::Build(DecisionReason::NewerLocalVersion)
        } else {
            self.emit(AppEvent::Decision(DecisionEvent::RemoteCurrent {
                target: target.path.clone(),
                package: package.to_string(),
                published: remote.identifier.clone(),
            }));
            Lookup::Current(remote)
        }
    }

    fn publish_required(
        &self,
        target: &BuildTarget,
        package: &str,
        published: Option<String>,
        reason: DecisionReason,
    ) {
        self.emit(AppEvent::Decision(DecisionEvent::PublishRequired {
            target: target.path.clone(),
            package: package.to_string(),
            published,
            reason,
        }));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use relbuild_errors::IndexError;
    use relbuild_types::{BuildStrategy, TargetKind};
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    struct StaticIndex {
        published: HashMap<String, RemotePackage>,
        failing: Vec<String>,
    }

    #[async_trait]
    impl PackageIndexClient for StaticIndex {
        async fn available(&self, name: &str) -> Result<Option<RemotePackage>, Error> {
            if self.failing.iter().any(|f| f == name) {
                return Err(IndexError::Connection {
                    message: "refused".into(),
                }
                .into());
            }
            Ok(self.published.get(name).cloned())
        }

        async fn download(&self, name: &str, _target_dir: &Path) -> Result<PathBuf, Error> {
            Err(IndexError::NotFound {
                package: name.into(),
            }
            .into())
        }
    }

    fn engine(published: &[&str], failing: &[&str]) -> RebuildDecisionEngine {
        let published = published
            .iter()
            .map(|id| {
                let pkg: RemotePackage = id.parse().unwrap();
                (pkg.name.clone(), pkg)
            })
            .collect();
        let index = StaticIndex {
            published,
            failing: failing.iter().map(ToString::to_string).collect(),
        };
        RebuildDecisionEngine::new(
            Some(Arc::new(index)),
            Arc::new(DependencyMetadataStore::default()),
            BuildLayout::default(),
        )
    }

    fn target() -> BuildTarget {
        BuildTarget::new("/tree/foo", TargetKind::Module, Some(BuildStrategy::Descriptor))
    }

    fn metadata(packages: &[&str], version: &str, release: &str) -> PackageMetadata {
        PackageMetadata {
            name: packages[0].to_string(),
            packages: packages.iter().map(ToString::to_string).collect(),
            version: version.into(),
            release: release.into(),
            arch: "noarch".into(),
            origin: None,
        }
    }

    fn fetching() -> DecisionOptions {
        DecisionOptions {
            fetch: true,
            ..DecisionOptions::default()
        }
    }

    #[tokio::test]
    async fn unpublished_package_builds() {
        let decision = engine(&[], &[])
            .decide_for(&target(), &metadata(&["foo"], "1.0.0", "1"), None, &fetching())
            .await;
        assert!(decision.must_build);
        assert_eq!(decision.reason, DecisionReason::NewPackage);
    }

    #[tokio::test]
    async fn newer_release_builds() {
        let decision = engine(&["foo-1.0.0-1.noarch.rpm"], &[])
            .decide_for(&target(), &metadata(&["foo"], "1.0.0", "2"), None, &fetching())
            .await;
        assert!(decision.must_build);
        assert_eq!(decision.reason, DecisionReason::NewerLocalVersion);
    }

    #[tokio::test]
    async fn current_package_offers_fetch_only_when_requested() {
        let engine = engine(&["foo-1.1.0-1.noarch.rpm"], &[]);
        let meta = metadata(&["foo"], "1.0.0", "1");

        let decision = engine.decide_for(&target(), &meta, None, &fetching()).await;
        assert!(!decision.must_build);
        assert_eq!(
            decision.fetch_candidate().unwrap().identifier,
            "foo-1.1.0-1.noarch.rpm"
        );

        let decision = engine
            .decide_for(&target(), &meta, None, &DecisionOptions::default())
            .await;
        assert!(!decision.must_build);
        assert!(decision.fetch_candidate().is_none());
    }

    #[tokio::test]
    async fn any_sub_package_forces_the_whole_target() {
        let decision = engine(&["foo-1.0.0-1.noarch.rpm"], &[])
            .decide_for(
                &target(),
                &metadata(&["foo", "foo-doc"], "1.0.0", "1"),
                None,
                &fetching(),
            )
            .await;
        assert!(decision.must_build);
        assert_eq!(decision.reason, DecisionReason::NewPackage);
        assert!(decision.fetch_candidates.is_empty());
    }

    #[tokio::test]
    async fn lookup_errors_degrade_to_build() {
        let decision = engine(&["foo-1.0.0-1.noarch.rpm"], &["foo"])
            .decide_for(&target(), &metadata(&["foo"], "1.0.0", "1"), None, &fetching())
            .await;
        assert!(decision.must_build);
    }

    #[tokio::test]
    async fn missing_index_builds_everything() {
        let engine = RebuildDecisionEngine::new(
            None,
            Arc::new(DependencyMetadataStore::default()),
            BuildLayout::default(),
        );
        let decision = engine
            .decide_for(&target(), &metadata(&["foo"], "1.0.0", "1"), None, &fetching())
            .await;
        assert!(decision.must_build);
        assert_eq!(decision.reason, DecisionReason::IndexUnavailable);
    }

    #[tokio::test]
    async fn override_short_circuits() {
        let options = DecisionOptions {
            rebuild: RebuildPolicy::Always,
            ..fetching()
        };
        let decision = engine(&["foo-9.0.0-1.noarch.rpm"], &[])
            .decide(&target(), None, &options)
            .await
            .unwrap();
        assert_eq!(decision.reason, DecisionReason::Forced);
    }

    #[tokio::test]
    async fn tag_advisory_never_forces_a_build() {
        let tag = TagInfo {
            latest_tag: "v0.9.0".into(),
            origin_url: None,
        };
        let decision = engine(&["foo-1.0.0-1.noarch.rpm"], &[])
            .decide_for(
                &target(),
                &metadata(&["foo"], "1.0.0", "1"),
                Some(&tag),
                &fetching(),
            )
            .await;
        assert!(!decision.must_build);
        assert!(matches!(decision.tag, Some(TagAdvisory::TagOwed { .. })));
    }
}
