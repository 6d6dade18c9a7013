//! Build operations
//!
//! Delegates to `relbuild_builder` for decisions and scheduling.

use crate::populate::populate_repository;
use crate::sign::sign_tree;
use crate::{BuildReport, OpsCtx};
use relbuild_builder::{
    target_at, BuildScheduler, CommandProcedure, RebuildDecisionEngine,
};
use relbuild_errors::{Error, OpsError};
use relbuild_events::EventEmitter;
use relbuild_types::{BuildRecord, BuildTarget};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

/// Scheduler wired to the context's index, rules and build commands
#[must_use]
pub fn scheduler(ctx: &OpsCtx) -> BuildScheduler {
    let tx = Some(ctx.tx.clone());
    let engine = RebuildDecisionEngine::new(ctx.index.clone(), ctx.rules.clone(), ctx.layout.clone())
        .with_event_sender(tx.clone());
    let procedure = CommandProcedure::new(
        ctx.config.build.build_command.clone(),
        ctx.config.build.recovery_command.clone(),
    )
    .with_event_sender(tx.clone());
    BuildScheduler::new(Arc::new(engine), Arc::new(procedure)).with_event_sender(tx)
}

/// Build the whole release tree
///
/// Auxiliary targets build first, then the documentation, then every
/// module. The repository is populated from the resulting records and, when
/// `sign` is set, its artifacts are signed once every build has finished.
///
/// # Errors
///
/// Returns an error if the rules file is missing, the tree has no targets,
/// any build pass fails, or population or signing fails.
pub async fn build_release(ctx: &OpsCtx, sign: bool) -> Result<BuildReport, Error> {
    let start = Instant::now();
    ctx.emit_operation_started("build release");
    ctx.require_rules()?;

    let discovered = ctx.discover()?;
    let targets = discovered.all();
    if targets.is_empty() {
        return Err(OpsError::NoTargets {
            root: ctx.root.display().to_string(),
        }
        .into());
    }

    let scheduler = scheduler(ctx);
    let options = ctx.scheduler_options();
    let mut records = Vec::with_capacity(targets.len());

    let phases: [(&str, Vec<BuildTarget>); 3] = [
        ("build auxiliary", discovered.auxiliary.clone()),
        ("build doc", discovered.doc.iter().cloned().collect()),
        ("build modules", discovered.modules.clone()),
    ];
    for (operation, phase) in phases {
        if phase.is_empty() {
            continue;
        }
        match scheduler.build(operation, &phase, &options).await {
            Ok(built) => records.extend(built),
            Err(e) => {
                ctx.emit_operation_failed("build release", &e);
                return Err(e);
            }
        }
    }

    let population = populate_repository(ctx).await?;
    let signing = if sign {
        Some(sign_tree(ctx, &ctx.resolve(&ctx.config.paths.artifact_dir)).await?)
    } else {
        None
    };

    ctx.emit_operation_completed("build release", true);
    Ok(BuildReport {
        operation: "build release".to_string(),
        records,
        population: Some(population),
        signing,
        duration_ms: elapsed_ms(start),
    })
}

/// Build the given target directories in one pass
///
/// Relative paths are taken from the tree root.
///
/// # Errors
///
/// Returns `OpsError::NoTargets` for an empty list and
/// `BuildError::TargetsFailed` naming every failed target.
pub async fn build_targets(ctx: &OpsCtx, paths: &[PathBuf]) -> Result<BuildReport, Error> {
    let start = Instant::now();
    if paths.is_empty() {
        return Err(OpsError::NoTargets {
            root: ctx.root.display().to_string(),
        }
        .into());
    }

    let targets: Vec<BuildTarget> = paths
        .iter()
        .map(|p| target_at(&ctx.resolve(p), &ctx.config.paths, &ctx.root, &ctx.layout))
        .collect();

    let records = run_pass(ctx, "build", &targets).await?;
    Ok(BuildReport {
        operation: "build".to_string(),
        records,
        population: None,
        signing: None,
        duration_ms: elapsed_ms(start),
    })
}

/// Build a single target directory
///
/// # Errors
///
/// Returns the target's failure wrapped in `BuildError::TargetsFailed`.
pub async fn build_single(ctx: &OpsCtx, path: PathBuf) -> Result<BuildReport, Error> {
    build_targets(ctx, &[path]).await
}

async fn run_pass(
    ctx: &OpsCtx,
    operation: &str,
    targets: &[BuildTarget],
) -> Result<Vec<BuildRecord>, Error> {
    ctx.emit_operation_started(operation);
    let result = scheduler(ctx)
        .build(operation, targets, &ctx.scheduler_options())
        .await;
    match &result {
        Ok(_) => ctx.emit_operation_completed(operation, true),
        Err(e) => ctx.emit_operation_failed(operation, e),
    }
    result
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
}
