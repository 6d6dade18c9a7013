//! Child process execution scoped to one directory

use relbuild_errors::{BuildError, Error};
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

/// Captured result of a finished command
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutcome {
    /// Last lines of combined output, for error messages
    #[must_use]
    pub fn tail(&self, lines: usize) -> String {
        let combined = format!("{}{}", self.stdout, self.stderr);
        let all: Vec<&str> = combined.lines().collect();
        all[all.len().saturating_sub(lines)..].join("\n")
    }
}

/// Run `args` in `workdir` with extra environment `envs`
///
/// The child is killed if the returned future is dropped.
///
/// # Errors
///
/// Returns `BuildError::ProcedureFailed` if the command is empty or cannot
/// be spawned. A non-zero exit is reported through the outcome.
pub async fn run_in(
    args: &[String],
    workdir: &Path,
    envs: &[(String, String)],
) -> Result<CommandOutcome, Error> {
    let (program, rest) = args.split_first().ok_or_else(|| BuildError::ProcedureFailed {
        target: workdir.display().to_string(),
        message: "empty command".to_string(),
    })?;

    let output = Command::new(program)
        .args(rest)
        .current_dir(workdir)
        .envs(envs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
        .stdin(Stdio::null())
        .kill_on_drop(true)
        .output()
        .await
        .map_err(|e| BuildError::ProcedureFailed {
            target: workdir.display().to_string(),
            message: format!("cannot run {program}: {e}"),
        })?;

    Ok(CommandOutcome {
        success: output.status.success(),
        exit_code: output.status.code(),
        stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
        stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sh(script: &str) -> Vec<String> {
        vec!["sh".into(), "-c".into(), script.into()]
    }

    #[tokio::test]
    async fn runs_in_the_given_directory() {
        let temp = tempdir().unwrap();
        let outcome = run_in(&sh("touch marker && echo done"), temp.path(), &[])
            .await
            .unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.stdout.trim(), "done");
        assert!(temp.path().join("marker").exists());
    }

    #[tokio::test]
    async fn exit_status_and_env_are_reported() {
        let temp = tempdir().unwrap();
        let envs = vec![("RELBUILD_TEST_VALUE".to_string(), "7".to_string())];
        let outcome = run_in(&sh("echo $RELBUILD_TEST_VALUE >&2; exit 3"), temp.path(), &envs)
            .await
            .unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.exit_code, Some(3));
        assert_eq!(outcome.tail(1), "7");
    }

    #[tokio::test]
    async fn empty_command_is_rejected() {
        let temp = tempdir().unwrap();
        assert!(run_in(&[], temp.path(), &[]).await.is_err());
    }
}
