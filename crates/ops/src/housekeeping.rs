//! Clean and clobber sweeps

use crate::{OpsCtx, SweepReport};
use relbuild_builder::sweep;
use relbuild_errors::Error;
use relbuild_events::EventEmitter;

/// Run the clean command in every target directory
///
/// # Errors
///
/// Returns `BuildError::HousekeepingFailed` after the first failure has
/// cancelled the remaining directories.
pub async fn clean(ctx: &OpsCtx) -> Result<SweepReport, Error> {
    run(ctx, "clean", &ctx.config.build.clean_command).await
}

/// Run the clobber command in every target directory
///
/// # Errors
///
/// Same as [`clean`].
pub async fn clobber(ctx: &OpsCtx) -> Result<SweepReport, Error> {
    run(ctx, "clobber", &ctx.config.build.clobber_command).await
}

async fn run(ctx: &OpsCtx, task: &str, command: &[String]) -> Result<SweepReport, Error> {
    ctx.emit_operation_started(task);
    let directories = ctx.discover()?.directories();
    let options = ctx.housekeeping_options(task, command);

    match sweep(&directories, &options, &Some(ctx.tx.clone())).await {
        Ok(()) => {
            ctx.emit_operation_completed(task, true);
            Ok(SweepReport {
                task: task.to_string(),
                directories: directories.len(),
            })
        }
        Err(e) => {
            ctx.emit_operation_failed(task, &e);
            Err(e)
        }
    }
}
