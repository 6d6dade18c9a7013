//! Local build procedures

use crate::command::{run_in, CommandOutcome};
use async_trait::async_trait;
use relbuild_errors::{BuildError, Error};
use relbuild_events::{AppEvent, BuildEvent, EventEmitter, EventSender};
use relbuild_types::{BuildStrategy, BuildTarget};
use std::path::Path;

/// Output lines kept in a procedure failure message
const FAILURE_TAIL_LINES: usize = 20;

/// Runs the local build of one target inside its working directory
#[async_trait]
pub trait BuildProcedure: Send + Sync {
    /// Build `target` with `workdir` as the child's current directory
    ///
    /// # Errors
    ///
    /// Returns `BuildError::ProcedureFailed` once the build has failed for
    /// good, including any permitted retry.
    async fn run(&self, target: &BuildTarget, workdir: &Path) -> Result<(), Error>;
}

/// Build procedure that shells out to a configured command
///
/// Generic build-file targets get one retry after the recovery command has
/// reset the toolchain.
pub struct CommandProcedure {
    build: Vec<String>,
    recovery: Vec<String>,
    envs: Vec<(String, String)>,
    tx: Option<EventSender>,
}

impl EventEmitter for CommandProcedure {
    fn event_sender(&self) -> Option<&EventSender> {
        self.tx.as_ref()
    }
}

impl CommandProcedure {
    #[must_use]
    pub fn new(build: Vec<String>, recovery: Vec<String>) -> Self {
        Self {
            build,
            recovery,
            envs: Vec::new(),
            tx: None,
        }
    }

    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.envs.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: Option<EventSender>) -> Self {
        self.tx = tx;
        self
    }

    async fn attempt(&self, target: &BuildTarget, workdir: &Path) -> Result<CommandOutcome, Error> {
        self.emit(AppEvent::Build(BuildEvent::ProcedureStarted {
            target: target.path.clone(),
            command: self.build.join(" "),
        }));
        run_in(&self.build, workdir, &self.envs).await
    }

    fn failed(target: &BuildTarget, outcome: &CommandOutcome) -> Error {
        let status = outcome
            .exit_code
            .map_or_else(|| "terminated by signal".to_string(), |c| format!("exit code {c}"));
        BuildError::ProcedureFailed {
            target: target.path.display().to_string(),
            message: format!("{status}\n{}", outcome.tail(FAILURE_TAIL_LINES)),
        }
        .into()
    }
}

#[async_trait]
impl BuildProcedure for CommandProcedure {
    async fn run(&self, target: &BuildTarget, workdir: &Path) -> Result<(), Error> {
        let first = self.attempt(target, workdir).await?;
        if first.success {
            return Ok(());
        }

        if target.strategy != Some(BuildStrategy::GenericBuildFile) || self.recovery.is_empty() {
            return Err(Self::failed(target, &first));
        }

        self.emit(AppEvent::Build(BuildEvent::RecoveryAttempted {
            target: target.path.clone(),
            message: first.tail(1),
        }));
        let recovery = run_in(&self.recovery, workdir, &self.envs).await?;
        if !recovery.success {
            self.emit_warning(format!(
                "recovery command failed in {}",
                workdir.display()
            ));
        }

        let second = self.attempt(target, workdir).await?;
        if second.success {
            Ok(())
        } else {
            Err(Self::failed(target, &second))
        }
    }
}
