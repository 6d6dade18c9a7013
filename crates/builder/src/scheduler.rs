//! Bounded-parallel build pass over a target set
//!
//! Every target runs to completion on its own. Failures are collected and
//! reported together once the pass is over; a failing target never cancels
//! its siblings.

use crate::artifacts::{collect, reuse_recorded, scan_output, ArtifactSet};
use crate::decision::{DecisionOptions, RebuildDecisionEngine};
use crate::descriptor::read_metadata;
use crate::procedure::BuildProcedure;
use crate::record::{take_record, write_record};
use crate::tag::probe_tag;
use chrono::Utc;
use relbuild_errors::{BuildError, Error, TargetFailure};
use relbuild_events::{AppEvent, BuildEvent, EventEmitter, EventSender, FailureContext};
use relbuild_index::download_with_retry;
use relbuild_net::RetryConfig;
use relbuild_resources::{acquire_semaphore_permit, create_semaphore};
use relbuild_rules::write_build_metadata;
use relbuild_types::{
    BuildRecord, BuildStrategy, BuildTarget, DecisionReason, FetchMode, PackageMetadata,
    RebuildDecision,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinSet;

/// Options for one build pass
#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    pub concurrency_limit: usize,
    pub decision: DecisionOptions,
    pub fetch: FetchMode,
    /// Retry budget for downloads of published packages
    pub retry: RetryConfig,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 1,
            decision: DecisionOptions::default(),
            fetch: FetchMode::Disabled,
            retry: RetryConfig::default(),
        }
    }
}

impl SchedulerOptions {
    /// Keep the decision's fetch flag in step with the fetch mode
    #[must_use]
    pub fn with_fetch(mut self, fetch: FetchMode) -> Self {
        self.fetch = fetch;
        self.decision.fetch = fetch.fetch_requested();
        self
    }
}

/// Fans target jobs out over a bounded worker pool
pub struct BuildScheduler {
    engine: Arc<RebuildDecisionEngine>,
    procedure: Arc<dyn BuildProcedure>,
    tx: Option<EventSender>,
}

impl EventEmitter for BuildScheduler {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl BuildScheduler {
    #[must_use]
    pub fn new(engine: Arc<RebuildDecisionEngine>, procedure: Arc<dyn BuildProcedure>) -> Self {
        Self {
            engine,
            procedure,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    #[must_use]
    pub fn engine(&self) -> &RebuildDecisionEngine {
        &self.engine
    }

    /// Build or fetch every target in `targets`
    ///
    /// Records are returned in target path order.
    ///
    /// # Errors
    ///
    /// Returns `BuildError::TargetsFailed` naming every target that failed,
    /// after all targets have finished.
    pub async fn build(
        &self,
        operation: &str,
        targets: &[BuildTarget],
        options: &SchedulerOptions,
    ) -> Result<Vec<BuildRecord>, Error> {
        self.emit(AppEvent::Build(BuildEvent::PassStarted {
            operation: operation.to_string(),
            targets: targets.len(),
        }));

        let semaphore = create_semaphore(options.concurrency_limit);
        let mut tasks = JoinSet::new();

        for target in targets {
            let permit = acquire_semaphore_permit(semaphore.clone(), operation).await?;
            let job = TargetJob {
                engine: self.engine.clone(),
                procedure: self.procedure.clone(),
                tx: self.tx.clone(),
                options: options.clone(),
            };
            let target = target.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let result = job.run(&target).await;
                (target, result)
            });
        }

        let mut records = Vec::new();
        let mut failures = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(record))) => records.push(record),
                Ok((target, Err(e))) => {
                    self.emit(AppEvent::Build(BuildEvent::TargetFailed {
                        target: target.path.clone(),
                        failure: FailureContext::from_error(&e),
                    }));
                    failures.push(TargetFailure::new(target.path.display().to_string(), e.to_string()));
                }
                Err(e) => failures.push(TargetFailure::new("<task>", e.to_string())),
            }
        }

        records.sort_by(|a, b| a.target.cmp(&b.target));
        failures.sort_by(|a, b| a.target.cmp(&b.target));

        self.emit(AppEvent::Build(BuildEvent::PassCompleted {
            operation: operation.to_string(),
            succeeded: records.len(),
            failed: failures.len(),
        }));

        if failures.is_empty() {
            Ok(records)
        } else {
            Err(BuildError::TargetsFailed {
                operation: operation.to_string(),
                failures,
            }
            .into())
        }
    }
}

/// Everything one target needs, owned by its task
struct TargetJob {
    engine: Arc<RebuildDecisionEngine>,
    procedure: Arc<dyn BuildProcedure>,
    tx: Option<EventSender>,
    options: SchedulerOptions,
}

impl TargetJob {
    async fn run(&self, target: &BuildTarget) -> Result<BuildRecord, Error> {
        let start = Instant::now();
        if !target.path.is_dir() {
            return Err(BuildError::TargetNotFound {
                path: target.path.display().to_string(),
            }
            .into());
        }
        self.tx.emit(AppEvent::Build(BuildEvent::TargetStarted {
            target: target.path.clone(),
        }));

        let layout = self.engine.layout();
        let record_path = layout.record_path(&target.path);
        let previous = take_record(&record_path).await?;
        let metadata = read_metadata(target, layout, self.engine.rules()).await?;
        let tag = if self.options.decision.check_tags {
            Some(probe_tag(&target.path).await)
        } else {
            None
        };

        let mut decision = self
            .engine
            .decide_for(target, &metadata, tag.as_ref(), &self.options.decision)
            .await;

        let mut fetched = None;
        if !decision.must_build && !decision.fetch_candidates.is_empty() {
            let outcome = self.fetch(target, &metadata, &decision).await;
            match outcome {
                Ok(set) => fetched = Some(set),
                Err(e) if self.options.fetch == FetchMode::Required => return Err(e),
                Err(e) => {
                    self.tx.emit_warning(format!(
                        "{}: {e}; building locally",
                        target.path.display()
                    ));
                    decision = decision.into_fetch_failed();
                }
            }
        }

        let reused = match (&fetched, previous) {
            (None, Some(previous)) => self.reuse(target, &metadata, &decision, &previous).await,
            _ => None,
        };
        let (artifacts, was_fetched) = match (fetched, reused) {
            (Some(set), _) => (set, true),
            (None, Some(set)) => (set, false),
            (None, None) if decision.must_build => {
                (self.build_locally(target, &metadata).await?, false)
            }
            // Published and current, nothing to fetch: keep what is on disk.
            (None, None) => (scan_output(target, &metadata, layout).await?, false),
        };

        let record = BuildRecord {
            target: target.path.clone(),
            package: metadata.name.clone(),
            version: metadata.version.clone(),
            release: metadata.release.clone(),
            reason: decision.reason,
            fetched: was_fetched,
            recorded_at: Utc::now(),
            binary_packages: artifacts.binaries,
            source_packages: artifacts.sources,
        };

        write_record(&record_path, &record).await?;
        self.tx.emit(AppEvent::Build(BuildEvent::RecordWritten {
            target: target.path.clone(),
            path: record_path,
        }));
        self.tx.emit(AppEvent::Build(BuildEvent::TargetCompleted {
            target: target.path.clone(),
            artifacts: record.artifact_count(),
            fetched: was_fetched,
            duration: start.elapsed(),
        }));
        Ok(record)
    }

    /// Artifacts of the previous local build of this exact package
    ///
    /// A forced rebuild never reuses anything.
    async fn reuse(
        &self,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        decision: &RebuildDecision,
        previous: &BuildRecord,
    ) -> Option<ArtifactSet> {
        if decision.reason == DecisionReason::Forced || !previous.built_from(metadata) {
            return None;
        }
        let set = reuse_recorded(target, self.engine.layout(), previous).await?;
        self.tx.emit(AppEvent::Build(BuildEvent::ArtifactsReused {
            target: target.path.clone(),
            artifacts: set.len(),
        }));
        Some(set)
    }

    /// Download every candidate into the output directory
    async fn fetch(
        &self,
        target: &BuildTarget,
        metadata: &PackageMetadata,
        decision: &RebuildDecision,
    ) -> Result<ArtifactSet, Error> {
        let layout = self.engine.layout();
        let Some(index) = self.engine.index() else {
            return Err(BuildError::FetchFailed {
                package: metadata.name.clone(),
                message: "no package index".to_string(),
            }
            .into());
        };

        let dir = layout.output_dir(&target.path);
        tokio::fs::create_dir_all(&dir)
            .await
            .map_err(|e| Error::io_with_path(&e, &dir))?;

        let mut files: Vec<PathBuf> = Vec::with_capacity(decision.fetch_candidates.len());
        for candidate in &decision.fetch_candidates {
            let path = download_with_retry(
                index.as_ref(),
                candidate,
                &dir,
                &self.options.retry,
                &self.tx,
            )
            .await
            .map_err(|e| BuildError::FetchFailed {
                package: candidate.identifier.clone(),
                message: e.to_string(),
            })?;
            files.push(path);
        }
        files.sort();
        collect(target, metadata, layout, &files).await
    }

    async fn build_locally(
        &self,
        target: &BuildTarget,
        metadata: &PackageMetadata,
    ) -> Result<ArtifactSet, Error> {
        let layout = self.engine.layout();
        if target.strategy == Some(BuildStrategy::Descriptor) {
            let files = write_build_metadata(
                &layout.spec_dir(&target.path),
                self.engine.rules().lookup(&metadata.name),
            )
            .await?;
            self.tx.emit(AppEvent::Build(BuildEvent::BuildMetadataWritten {
                target: target.path.clone(),
                path: files.requires,
            }));
        }

        self.procedure.run(target, &target.path).await?;
        scan_output(target, metadata, layout).await
    }
}
