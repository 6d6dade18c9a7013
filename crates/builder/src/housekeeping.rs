//! Fail-fast maintenance sweep (clean, clobber) over target directories
//!
//! Unlike a build pass, the first failing directory cancels the sweep:
//! directories not yet started are skipped and commands still running are
//! killed.

use crate::command::run_in;
use relbuild_errors::{BuildError, Error};
use relbuild_events::{AppEvent, EventEmitter, EventSender, HousekeepingEvent};
use relbuild_resources::{acquire_semaphore_permit, create_semaphore};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone)]
pub struct HousekeepingOptions {
    /// Task name used in events and errors, such as `clean`
    pub task: String,
    pub command: Vec<String>,
    pub concurrency_limit: usize,
}

/// Run the housekeeping command in every directory of `dirs`
///
/// # Errors
///
/// Returns `BuildError::HousekeepingFailed` naming the failed directories,
/// the directories interrupted by the cancellation and the number of
/// directories that never started.
pub async fn sweep(
    dirs: &[PathBuf],
    options: &HousekeepingOptions,
    tx: &Option<EventSender>,
) -> Result<(), Error> {
    let task = options.task.as_str();
    tx.emit(AppEvent::Housekeeping(HousekeepingEvent::Started {
        task: task.to_string(),
        directories: dirs.len(),
    }));

    let token = CancellationToken::new();
    let failed = Arc::new(Mutex::new(Vec::new()));
    let interrupted = Arc::new(Mutex::new(Vec::new()));
    let semaphore = create_semaphore(options.concurrency_limit);
    let mut tasks = JoinSet::new();
    let mut cancelled = 0;

    for (started, dir) in dirs.iter().enumerate() {
        let permit = tokio::select! {
            biased;
            () = token.cancelled() => None,
            permit = acquire_semaphore_permit(semaphore.clone(), task) => Some(permit?),
        };
        let Some(permit) = permit else {
            cancelled = dirs.len() - started;
            break;
        };

        let dir = dir.clone();
        let token = token.clone();
        let failed = failed.clone();
        let interrupted = interrupted.clone();
        let command = options.command.clone();
        let task = task.to_string();
        let tx = tx.clone();

        tasks.spawn(async move {
            let _permit = permit;
            let outcome = tokio::select! {
                biased;
                () = token.cancelled() => None,
                outcome = run_in(&command, &dir, &[]) => Some(outcome),
            };

            let message = match outcome {
                None => {
                    interrupted.lock().await.push(dir.display().to_string());
                    return;
                }
                Some(Ok(outcome)) if outcome.success => {
                    tx.emit(AppEvent::Housekeeping(HousekeepingEvent::DirectoryCompleted {
                        task,
                        directory: dir,
                    }));
                    return;
                }
                Some(Ok(outcome)) => outcome.tail(5),
                Some(Err(e)) => e.to_string(),
            };

            failed.lock().await.push(dir.display().to_string());
            token.cancel();
            tx.emit(AppEvent::Housekeeping(HousekeepingEvent::DirectoryFailed {
                task,
                directory: dir,
                message,
            }));
        });
    }

    while let Some(joined) = tasks.join_next().await {
        if let Err(e) = joined {
            failed.lock().await.push(format!("<task>: {e}"));
        }
    }

    if cancelled > 0 {
        tx.emit(AppEvent::Housekeeping(HousekeepingEvent::Cancelled {
            task: task.to_string(),
            pending: cancelled,
        }));
    }

    let failed = std::mem::take(&mut *failed.lock().await);
    let interrupted = std::mem::take(&mut *interrupted.lock().await);
    let success = failed.is_empty();
    tx.emit(AppEvent::Housekeeping(HousekeepingEvent::Completed {
        task: task.to_string(),
        success,
    }));

    if success {
        Ok(())
    } else {
        Err(BuildError::HousekeepingFailed {
            task: task.to_string(),
            failed,
            interrupted,
            cancelled,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn options(limit: usize, script: &str) -> HousekeepingOptions {
        HousekeepingOptions {
            task: "clean".into(),
            command: vec!["sh".into(), "-c".into(), script.into()],
            concurrency_limit: limit,
        }
    }

    fn dirs(root: &std::path::Path, count: usize) -> Vec<PathBuf> {
        (1..=count)
            .map(|i| {
                let dir = root.join(format!("dir{i}"));
                std::fs::create_dir_all(&dir).unwrap();
                dir
            })
            .collect()
    }

    #[tokio::test]
    async fn clean_sweep_touches_every_directory() {
        let temp = tempdir().unwrap();
        let dirs = dirs(temp.path(), 4);
        sweep(&dirs, &options(2, "touch cleaned"), &None).await.unwrap();
        assert!(dirs.iter().all(|d| d.join("cleaned").exists()));
    }

    #[tokio::test]
    async fn first_failure_cancels_pending_directories() {
        let temp = tempdir().unwrap();
        let dirs = dirs(temp.path(), 4);
        std::fs::write(dirs[1].join("fail"), "").unwrap();

        let err = sweep(&dirs, &options(1, "test ! -e fail && touch cleaned"), &None)
            .await
            .unwrap_err();

        match err {
            Error::Build(BuildError::HousekeepingFailed {
                failed,
                interrupted,
                cancelled,
                ..
            }) => {
                assert_eq!(failed, vec![dirs[1].display().to_string()]);
                assert!(interrupted.is_empty());
                assert_eq!(cancelled, 2);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(dirs[0].join("cleaned").exists());
        assert!(!dirs[2].join("cleaned").exists());
        assert!(!dirs[3].join("cleaned").exists());
    }

    #[tokio::test]
    async fn running_siblings_are_interrupted() {
        let temp = tempdir().unwrap();
        let dirs = dirs(temp.path(), 2);
        std::fs::write(dirs[1].join("fail"), "").unwrap();

        // dir1 sleeps while dir2 fails straight away.
        let script = "if [ -e fail ]; then exit 1; fi; sleep 30; touch cleaned";
        let err = sweep(&dirs, &options(2, script), &None).await.unwrap_err();

        match err {
            Error::Build(BuildError::HousekeepingFailed {
                failed, interrupted, ..
            }) => {
                assert_eq!(failed, vec![dirs[1].display().to_string()]);
                assert_eq!(interrupted, vec![dirs[0].display().to_string()]);
            }
            other => panic!("unexpected error: {other}"),
        }
        assert!(!dirs[0].join("cleaned").exists());
    }
}
