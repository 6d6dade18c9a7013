//! Concurrent signing over an artifact tree

use crate::key::SigningKey;
use crate::report::SigningReport;
use crate::signer::{ArtifactSigner, DigestAlgorithm};
use relbuild_errors::{Error, SigningError};
use relbuild_events::{AppEvent, EventEmitter, EventSender, SigningEvent};
use relbuild_resources::{acquire_semaphore_permit, create_semaphore};
use relbuild_types::SigningStatus;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use walkdir::WalkDir;

/// Options for one signing pass
#[derive(Debug, Clone)]
pub struct SigningOptions {
    /// Re-sign artifacts that already carry a valid signature
    pub force: bool,
    pub digest: DigestAlgorithm,
    pub concurrency_limit: usize,
    /// Bound on each signing attempt
    pub timeout: Duration,
    /// File name suffixes that mark an artifact
    pub extensions: Vec<String>,
}

impl Default for SigningOptions {
    fn default() -> Self {
        Self {
            force: false,
            digest: DigestAlgorithm::default(),
            concurrency_limit: 1,
            timeout: Duration::from_secs(60),
            extensions: vec![".rpm".to_string()],
        }
    }
}

/// Signs every artifact under a root with bounded concurrency
///
/// Every artifact gets a recorded status; a failure never stops the pass.
pub struct SigningEngine {
    signer: Arc<dyn ArtifactSigner>,
    tx: Option<EventSender>,
}

impl SigningEngine {
    #[must_use]
    pub fn new(signer: Arc<dyn ArtifactSigner>) -> Self {
        Self { signer, tx: None }
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Every artifact file under `root`, in path order
    ///
    /// # Errors
    ///
    /// Returns an error if the tree cannot be walked.
    pub fn enumerate(root: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, Error> {
        let mut artifacts = Vec::new();
        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| Error::internal(format!("walking {}: {e}", root.display())))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy();
            if extensions.iter().any(|ext| name.ends_with(ext.as_str())) {
                artifacts.push(entry.into_path());
            }
        }
        artifacts.sort();
        Ok(artifacts)
    }

    /// Sign the artifacts under `root` with `key`
    ///
    /// # Errors
    ///
    /// Returns `SigningError::ArtifactRootNotFound` if `root` is not a
    /// directory. Per-artifact failures are reported in the result map.
    pub async fn sign(
        &self,
        root: &Path,
        key: &SigningKey,
        options: &SigningOptions,
    ) -> Result<SigningReport, Error> {
        if !root.is_dir() {
            return Err(SigningError::ArtifactRootNotFound {
                path: root.display().to_string(),
            }
            .into());
        }

        let start = Instant::now();
        let artifacts = Self::enumerate(root, &options.extensions)?;
        self.tx.emit(AppEvent::Signing(SigningEvent::Started {
            root: root.to_path_buf(),
            artifacts: artifacts.len(),
        }));

        let results = Arc::new(Mutex::new(BTreeMap::new()));
        let semaphore = create_semaphore(options.concurrency_limit);
        let key = Arc::new(key.clone());
        let mut tasks = JoinSet::new();

        for artifact in &artifacts {
            let permit = acquire_semaphore_permit(semaphore.clone(), "signing").await?;
            let signer = self.signer.clone();
            let key = key.clone();
            let results = results.clone();
            let tx = self.tx.clone();
            let artifact = artifact.clone();
            let options = options.clone();

            tasks.spawn(async move {
                let _permit = permit;
                let status = sign_one(signer.as_ref(), &artifact, &key, &options, &tx).await;
                results.lock().await.insert(artifact, status);
            });
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                self.tx.emit_warning(format!("signing task aborted: {e}"));
            }
        }

        let mut results = std::mem::take(&mut *results.lock().await);
        for artifact in artifacts {
            results.entry(artifact).or_insert(SigningStatus::Unsigned);
        }

        let report = SigningReport {
            root: root.to_path_buf(),
            results,
            duration: start.elapsed(),
        };
        let summary = report.summary();
        self.tx.emit(AppEvent::Signing(SigningEvent::Summary {
            already_signed: summary.already_signed,
            signed: summary.signed,
            failed: summary.failed,
            duration: report.duration,
        }));

        Ok(report)
    }
}

async fn sign_one(
    signer: &dyn ArtifactSigner,
    artifact: &Path,
    key: &SigningKey,
    options: &SigningOptions,
    tx: &Option<EventSender>,
) -> SigningStatus {
    if !options.force {
        match tokio::time::timeout(options.timeout, signer.is_signed(artifact, key)).await {
            Ok(Ok(true)) => {
                tx.emit(AppEvent::Signing(SigningEvent::ArtifactSkipped {
                    path: artifact.to_path_buf(),
                }));
                return SigningStatus::SkippedAlreadySigned;
            }
            Ok(Ok(false)) => {}
            Ok(Err(e)) => {
                tx.emit_debug(format!(
                    "signature check failed for {}: {e}",
                    artifact.display()
                ));
            }
            Err(_) => {
                tx.emit_debug(format!("signature check timed out for {}", artifact.display()));
            }
        }
    }

    let outcome = tokio::time::timeout(
        options.timeout,
        signer.sign(artifact, key, options.digest),
    )
    .await;

    let failure = match outcome {
        Ok(Ok(())) => {
            tx.emit(AppEvent::Signing(SigningEvent::ArtifactSigned {
                path: artifact.to_path_buf(),
            }));
            return SigningStatus::Signed;
        }
        Ok(Err(e)) => e.to_string(),
        Err(_) => SigningError::Timeout {
            artifact: artifact.display().to_string(),
            seconds: options.timeout.as_secs(),
        }
        .to_string(),
    };

    tx.emit(AppEvent::Signing(SigningEvent::ArtifactFailed {
        path: artifact.to_path_buf(),
        message: failure,
    }));
    SigningStatus::Unsigned
}
