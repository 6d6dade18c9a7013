//! Artifact signing operation

use crate::build::elapsed_ms;
use crate::{OpsCtx, SignReport};
use relbuild_errors::Error;
use relbuild_events::EventEmitter;
use relbuild_signing::{ArtifactSigner, CommandSigner, MinisignSigner, SigningEngine, SigningKey};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

/// Sign every artifact under `root`, or under the configured artifact
/// directory when `root` is `None`
///
/// # Errors
///
/// Returns an error if the key directory is unusable, the root does not
/// exist, or any artifact ends unsigned. Total and partial failure are
/// reported as distinct errors.
pub async fn sign_artifacts(ctx: &OpsCtx, root: Option<PathBuf>) -> Result<SignReport, Error> {
    let root = root.map_or_else(
        || ctx.resolve(&ctx.config.paths.artifact_dir),
        |r| ctx.resolve(&r),
    );
    ctx.emit_operation_started("sign");
    let result = sign_tree(ctx, &root).await;
    match &result {
        Ok(_) => ctx.emit_operation_completed("sign", true),
        Err(e) => ctx.emit_operation_failed("sign", e),
    }
    result
}

pub(crate) async fn sign_tree(ctx: &OpsCtx, root: &Path) -> Result<SignReport, Error> {
    let start = Instant::now();
    let key = SigningKey::load(&ctx.resolve(&ctx.config.paths.keys_dir))?;
    let options = ctx.signing_options()?;

    let engine = SigningEngine::new(signer(ctx)?).with_event_sender(ctx.tx.clone());
    let report = engine.sign(root, &key, &options).await?;
    let summary = report.summary();
    report.into_result()?;

    Ok(SignReport {
        root: root.to_path_buf(),
        summary,
        duration_ms: elapsed_ms(start),
    })
}

/// In-process minisign unless an external command is configured
fn signer(ctx: &OpsCtx) -> Result<Arc<dyn ArtifactSigner>, Error> {
    let signing = &ctx.config.signing;
    if signing.command.is_empty() {
        return Ok(Arc::new(MinisignSigner::new(signing.signature_suffix.clone())));
    }
    let signer = CommandSigner::new(signing.command.clone(), signing.signature_suffix.clone())?
        .with_check(signing.check_command.clone());
    Ok(Arc::new(signer))
}
