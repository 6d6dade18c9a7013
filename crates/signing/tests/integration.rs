//! Integration tests for the signing engine

use async_trait::async_trait;
use relbuild_errors::{Error, SigningError};
use relbuild_signing::{
    ArtifactSigner, DigestAlgorithm, SigningEngine, SigningKey, SigningOptions,
};
use relbuild_types::SigningStatus;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::{tempdir, TempDir};

/// Records concurrency and treats listed files as signed
#[derive(Default)]
struct RecordingSigner {
    signed: Mutex<HashSet<PathBuf>>,
    failing: HashSet<String>,
    hang: HashSet<String>,
    active: AtomicUsize,
    peak: AtomicUsize,
    attempts: AtomicUsize,
}

impl RecordingSigner {
    fn mark_signed(&self, path: PathBuf) {
        self.signed.lock().unwrap().insert(path);
    }
}

#[async_trait]
impl ArtifactSigner for RecordingSigner {
    async fn is_signed(&self, artifact: &Path, _key: &SigningKey) -> Result<bool, Error> {
        Ok(self.signed.lock().unwrap().contains(artifact))
    }

    async fn sign(
        &self,
        artifact: &Path,
        _key: &SigningKey,
        _digest: DigestAlgorithm,
    ) -> Result<(), Error> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);

        let name = artifact.file_name().unwrap().to_string_lossy().into_owned();
        if self.hang.contains(&name) {
            tokio::time::sleep(Duration::from_secs(30)).await;
        } else {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        self.active.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(&name) {
            return Err(SigningError::SigningFailed {
                artifact: name,
                message: "corrupt".into(),
            }
            .into());
        }
        self.mark_signed(artifact.to_path_buf());
        Ok(())
    }
}

fn key_dir() -> (TempDir, SigningKey) {
    let dir = tempdir().unwrap();
    std::fs::write(dir.path().join("dev.key"), "secret").unwrap();
    std::fs::write(dir.path().join("dev.pub"), "public").unwrap();
    let key = SigningKey::load(dir.path()).unwrap();
    (dir, key)
}

fn artifacts(count: usize) -> (TempDir, Vec<PathBuf>) {
    let root = tempdir().unwrap();
    let nested = root.path().join("noarch");
    std::fs::create_dir_all(&nested).unwrap();
    let paths = (0..count)
        .map(|i| {
            let path = nested.join(format!("pkg{i}-1.0.0-1.noarch.rpm"));
            std::fs::write(&path, b"rpm").unwrap();
            path
        })
        .collect();
    std::fs::write(nested.join("README"), b"not an artifact").unwrap();
    (root, paths)
}

fn options(limit: usize) -> SigningOptions {
    SigningOptions {
        concurrency_limit: limit,
        timeout: Duration::from_secs(5),
        ..SigningOptions::default()
    }
}

#[tokio::test]
async fn already_signed_artifacts_are_skipped() {
    let (_keys, key) = key_dir();
    let (root, paths) = artifacts(5);
    let signer = Arc::new(RecordingSigner::default());
    for path in paths.iter().take(3) {
        signer.mark_signed(path.clone());
    }

    let engine = SigningEngine::new(signer.clone());
    let report = engine.sign(root.path(), &key, &options(2)).await.unwrap();

    assert_eq!(report.results.len(), 5);
    let summary = report.summary();
    assert_eq!(summary.already_signed, 3);
    assert_eq!(summary.attempted(), 2);
    assert_eq!(signer.attempts.load(Ordering::SeqCst), 2);
    assert!(signer.peak.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn force_attempts_every_artifact() {
    let (_keys, key) = key_dir();
    let (root, paths) = artifacts(4);
    let signer = Arc::new(RecordingSigner::default());
    for path in &paths {
        signer.mark_signed(path.clone());
    }

    let engine = SigningEngine::new(signer.clone());
    let forced = SigningOptions {
        force: true,
        ..options(4)
    };
    let report = engine.sign(root.path(), &key, &forced).await.unwrap();

    assert!(report
        .results
        .values()
        .all(|s| *s == SigningStatus::Signed));
    assert_eq!(signer.attempts.load(Ordering::SeqCst), 4);
}

#[tokio::test]
async fn concurrency_never_exceeds_limit() {
    let (_keys, key) = key_dir();
    let (root, _) = artifacts(9);
    let signer = Arc::new(RecordingSigner::default());

    let engine = SigningEngine::new(signer.clone());
    let report = engine.sign(root.path(), &key, &options(3)).await.unwrap();

    assert_eq!(report.summary().signed, 9);
    let peak = signer.peak.load(Ordering::SeqCst);
    assert!(peak <= 3, "peak concurrency {peak}");
    assert!(peak >= 1);
}

#[tokio::test]
async fn failures_and_timeouts_are_recorded_as_unsigned() {
    let (_keys, key) = key_dir();
    let (root, paths) = artifacts(4);
    let signer = Arc::new(RecordingSigner {
        failing: HashSet::from(["pkg1-1.0.0-1.noarch.rpm".to_string()]),
        hang: HashSet::from(["pkg2-1.0.0-1.noarch.rpm".to_string()]),
        ..RecordingSigner::default()
    });

    let engine = SigningEngine::new(signer);
    let quick = SigningOptions {
        timeout: Duration::from_millis(200),
        ..options(4)
    };
    let report = engine.sign(root.path(), &key, &quick).await.unwrap();

    assert_eq!(report.results[&paths[0]], SigningStatus::Signed);
    assert_eq!(report.results[&paths[1]], SigningStatus::Unsigned);
    assert_eq!(report.results[&paths[2]], SigningStatus::Unsigned);
    assert_eq!(report.results[&paths[3]], SigningStatus::Signed);

    let err = report.into_result().unwrap_err();
    assert!(matches!(
        err,
        Error::Signing(SigningError::PartialFailure { .. })
    ));
}

#[tokio::test]
async fn every_failure_is_total_failure() {
    let (_keys, key) = key_dir();
    let (root, _) = artifacts(2);
    let signer = Arc::new(RecordingSigner {
        failing: HashSet::from([
            "pkg0-1.0.0-1.noarch.rpm".to_string(),
            "pkg1-1.0.0-1.noarch.rpm".to_string(),
        ]),
        ..RecordingSigner::default()
    });

    let report = SigningEngine::new(signer)
        .sign(root.path(), &key, &options(2))
        .await
        .unwrap();
    assert!(matches!(
        report.into_result().unwrap_err(),
        Error::Signing(SigningError::TotalFailure { attempted: 2, .. })
    ));
}

#[tokio::test]
async fn missing_root_is_rejected() {
    let (_keys, key) = key_dir();
    let temp = tempdir().unwrap();
    let engine = SigningEngine::new(Arc::new(RecordingSigner::default()));
    let err = engine
        .sign(&temp.path().join("absent"), &key, &options(1))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        Error::Signing(SigningError::ArtifactRootNotFound { .. })
    ));
}

#[tokio::test]
async fn summary_event_is_emitted() {
    let (_keys, key) = key_dir();
    let (root, _) = artifacts(2);
    let (tx, mut rx) = relbuild_events::channel();
    let engine = SigningEngine::new(Arc::new(RecordingSigner::default())).with_event_sender(tx);
    engine.sign(root.path(), &key, &options(2)).await.unwrap();
    drop(engine);

    let mut saw_summary = false;
    while let Ok(event) = rx.try_recv() {
        if let relbuild_events::AppEvent::Signing(relbuild_events::SigningEvent::Summary {
            signed,
            ..
        }) = event
        {
            assert_eq!(signed, 2);
            saw_summary = true;
        }
    }
    assert!(saw_summary);
}
