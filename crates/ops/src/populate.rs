//! Repository population operation

use crate::{OpsCtx, PopulateReport};
use relbuild_errors::Error;
use relbuild_events::EventEmitter;
use relbuild_repository::ArtifactRepositoryPopulator;

/// Binary package directory under the artifact directory
pub const RPM_DIR_NAME: &str = "RPMS";

/// Copy every recorded artifact of the tree into the repository
///
/// # Errors
///
/// Returns `ConfigError::RulesNotFound` when the rules file is missing,
/// before anything is copied.
pub async fn populate(ctx: &OpsCtx) -> Result<PopulateReport, Error> {
    ctx.emit_operation_started("populate");
    ctx.require_rules()?;
    let report = populate_repository(ctx).await?;
    ctx.emit_operation_completed("populate", true);
    Ok(report)
}

pub(crate) async fn populate_repository(ctx: &OpsCtx) -> Result<PopulateReport, Error> {
    let rpm_dir = ctx
        .resolve(&ctx.config.paths.artifact_dir)
        .join(RPM_DIR_NAME);
    let summary = ArtifactRepositoryPopulator::new(ctx.layout.record_file.clone())
        .with_event_sender(Some(ctx.tx.clone()))
        .populate(&ctx.root, &rpm_dir)
        .await?;

    Ok(PopulateReport {
        rpm_dir,
        records: summary.records,
        binaries: summary.binaries,
        sources: summary.sources,
        skipped_sources: summary.skipped_sources,
    })
}
