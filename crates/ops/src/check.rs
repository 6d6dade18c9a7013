//! Publication status check over the whole tree

use crate::build::scheduler;
use crate::{OpsCtx, PublishReport, PublishStatus};
use relbuild_builder::{probe_tag, read_metadata, DecisionOptions};
use relbuild_errors::{BuildError, Error, OpsError, TargetFailure};
use relbuild_events::EventEmitter;
use relbuild_types::{DecisionReason, RebuildPolicy};

/// Decide every target without building anything
///
/// Fetching is off, tags are compared and per-target details are emitted.
/// A target whose metadata cannot be derived, or that cannot be compared
/// because no index is reachable, counts as unresolved.
///
/// # Errors
///
/// Returns `OpsError::NoTargets` for an empty tree and
/// `BuildError::TargetsFailed` listing every unresolved target.
pub async fn check_published(ctx: &OpsCtx) -> Result<PublishReport, Error> {
    ctx.emit_operation_started("check published");
    let targets = ctx.discover()?.all();
    if targets.is_empty() {
        return Err(OpsError::NoTargets {
            root: ctx.root.display().to_string(),
        }
        .into());
    }

    let options = DecisionOptions {
        rebuild: RebuildPolicy::Unset,
        fetch: false,
        check_tags: true,
        verbose: true,
        ..ctx.decision_options()
    };
    let scheduler = scheduler(ctx);
    let engine = scheduler.engine();

    let mut report = PublishReport::default();
    let mut unresolved = Vec::new();
    for target in &targets {
        let metadata = match read_metadata(target, &ctx.layout, &ctx.rules).await {
            Ok(metadata) => metadata,
            Err(e) => {
                unresolved.push(TargetFailure::new(target.path.display().to_string(), e.to_string()));
                continue;
            }
        };
        let tag = probe_tag(&target.path).await;
        let decision = engine.decide_for(target, &metadata, Some(&tag), &options).await;

        if decision.reason == DecisionReason::IndexUnavailable {
            unresolved.push(TargetFailure::new(
                target.path.display().to_string(),
                "no package index to compare against",
            ));
        }
        report.targets.push(PublishStatus {
            target: target.path.clone(),
            package: metadata.name,
            version: metadata.version,
            release: metadata.release,
            publish_required: decision.must_build,
            reason: decision.reason,
            tag: decision.tag,
        });
    }

    if unresolved.is_empty() {
        ctx.emit_operation_completed("check published", true);
        Ok(report)
    } else {
        let err: Error = BuildError::TargetsFailed {
            operation: "check published".to_string(),
            failures: unresolved,
        }
        .into();
        ctx.emit_operation_failed("check published", &err);
        Err(err)
    }
}
