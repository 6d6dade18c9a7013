//! Structured logging integration for events
//!
//! Library crates never print; they emit `AppEvent`s. This module turns each
//! drained event into a tracing record at the event's own level, under the
//! event's domain target.

use relbuild_events::{
    AppEvent, BuildEvent, DecisionEvent, GeneralEvent, HousekeepingEvent, IndexEvent,
    RepositoryEvent, SigningEvent,
};
use relbuild_types::TagAdvisory;
use tracing::Level;

/// Emit `$msg` at a runtime `Level` under a fixed target
macro_rules! emit_at {
    ($level:expr, $target:literal, $msg:expr) => {
        match $level {
            Level::ERROR => tracing::error!(target: $target, "{}", $msg),
            Level::WARN => tracing::warn!(target: $target, "{}", $msg),
            Level::INFO => tracing::info!(target: $target, "{}", $msg),
            Level::DEBUG => tracing::debug!(target: $target, "{}", $msg),
            Level::TRACE => tracing::trace!(target: $target, "{}", $msg),
        }
    };
}

/// Log an event through tracing
pub fn log_event(event: &AppEvent) {
    let level = event.log_level();
    let message = describe(event);
    match event {
        AppEvent::General(_) => emit_at!(level, "relbuild::events::general", message),
        AppEvent::Decision(_) => emit_at!(level, "relbuild::events::decision", message),
        AppEvent::Build(_) => emit_at!(level, "relbuild::events::build", message),
        AppEvent::Index(_) => emit_at!(level, "relbuild::events::index", message),
        AppEvent::Signing(_) => emit_at!(level, "relbuild::events::signing", message),
        AppEvent::Housekeeping(_) => emit_at!(level, "relbuild::events::housekeeping", message),
        AppEvent::Repository(_) => emit_at!(level, "relbuild::events::repository", message),
    }
}

/// Human-readable line for an event
pub fn describe(event: &AppEvent) -> String {
    match event {
        AppEvent::General(e) => describe_general(e),
        AppEvent::Decision(e) => describe_decision(e),
        AppEvent::Build(e) => describe_build(e),
        AppEvent::Index(e) => describe_index(e),
        AppEvent::Signing(e) => describe_signing(e),
        AppEvent::Housekeeping(e) => describe_housekeeping(e),
        AppEvent::Repository(e) => describe_repository(e),
    }
}

fn describe_general(event: &GeneralEvent) -> String {
    match event {
        GeneralEvent::Warning { message } | GeneralEvent::DebugLog { message } => message.clone(),
        GeneralEvent::OperationStarted { operation } => format!("{operation}: started"),
        GeneralEvent::OperationCompleted { operation, success } => {
            if *success {
                format!("{operation}: completed")
            } else {
                format!("{operation}: completed with problems")
            }
        }
        GeneralEvent::OperationFailed { operation, failure } => {
            format!("{operation}: failed: {}", failure.message)
        }
    }
}

fn describe_decision(event: &DecisionEvent) -> String {
    match event {
        DecisionEvent::Details {
            target,
            package,
            version,
            release,
            origin,
        } => format!(
            "{}: {package} version {version} release {release} origin {}",
            target.display(),
            origin.as_deref().unwrap_or("none")
        ),
        DecisionEvent::TagChecked {
            package, advisory, ..
        } => match advisory {
            TagAdvisory::NoTag => format!("{package}: no tag found, tag owed"),
            TagAdvisory::TagOwed { tag } => format!("{package}: newer than tag {tag}, tag owed"),
            TagAdvisory::UpToDate { tag } => format!("{package}: tag {tag} is current"),
            TagAdvisory::Indeterminate { tag } => {
                format!("{package}: tag {tag} carries no release, cannot tell")
            }
            TagAdvisory::Unparseable { tag } => format!("{package}: cannot compare tag {tag}"),
        },
        DecisionEvent::PublishRequired {
            package,
            published,
            reason,
            ..
        } => match published {
            Some(published) => format!("{package}: publish required ({reason}, index has {published})"),
            None => format!("{package}: publish required ({reason})"),
        },
        DecisionEvent::RemoteCurrent {
            package, published, ..
        } => format!("{package}: {published} is published"),
        DecisionEvent::LookupFailed {
            package, failure, ..
        } => format!("{package}: index lookup failed: {}", failure.message),
        DecisionEvent::IndexUnavailable { message } => {
            format!("package index unavailable, building locally: {message}")
        }
        DecisionEvent::Decided {
            target,
            must_build,
            reason,
        } => {
            let verdict = if *must_build { "build" } else { "skip" };
            format!("{}: {verdict} ({reason})", target.display())
        }
    }
}

fn describe_build(event: &BuildEvent) -> String {
    match event {
        BuildEvent::PassStarted { operation, targets } => {
            format!("{operation}: {targets} target(s)")
        }
        BuildEvent::TargetStarted { target } => format!("{}: started", target.display()),
        BuildEvent::ProcedureStarted { target, command } => {
            format!("{}: running {command}", target.display())
        }
        BuildEvent::RecoveryAttempted { target, message } => {
            format!("{}: first attempt failed, retrying: {message}", target.display())
        }
        BuildEvent::BuildMetadataWritten { path, .. } => format!("wrote {}", path.display()),
        BuildEvent::RecordWritten { path, .. } => format!("wrote {}", path.display()),
        BuildEvent::ArtifactsReused { target, artifacts } => format!(
            "{}: reusing {artifacts} artifact(s) from the previous run",
            target.display()
        ),
        BuildEvent::TargetCompleted {
            target,
            artifacts,
            fetched,
            duration,
        } => {
            let source = if *fetched { "fetched" } else { "built" };
            format!(
                "{}: {source} {artifacts} artifact(s) in {:.1}s",
                target.display(),
                duration.as_secs_f64()
            )
        }
        BuildEvent::TargetFailed { target, failure } => {
            format!("{}: {}", target.display(), failure.message)
        }
        BuildEvent::PassCompleted {
            operation,
            succeeded,
            failed,
        } => format!("{operation}: {succeeded} succeeded, {failed} failed"),
    }
}

fn describe_index(event: &IndexEvent) -> String {
    match event {
        IndexEvent::Loaded { source, packages } => {
            format!("loaded package index from {source} ({packages} packages)")
        }
        IndexEvent::FetchStarted {
            package,
            identifier,
        } => format!("{package}: fetching {identifier}"),
        IndexEvent::FetchSkipped { package, path } => {
            format!("{package}: {} already present", path.display())
        }
        IndexEvent::FetchRetry {
            package,
            attempt,
            max_attempts,
            message,
        } => format!("{package}: attempt {attempt}/{max_attempts} failed: {message}"),
        IndexEvent::FetchCompleted { package, path } => {
            format!("{package}: fetched {}", path.display())
        }
        IndexEvent::FetchFailed { package, failure } => {
            format!("{package}: fetch failed: {}", failure.message)
        }
    }
}

fn describe_signing(event: &SigningEvent) -> String {
    match event {
        SigningEvent::Started { root, artifacts } => {
            format!("signing {artifacts} artifact(s) under {}", root.display())
        }
        SigningEvent::ArtifactSigned { path } => format!("signed {}", path.display()),
        SigningEvent::ArtifactSkipped { path } => format!("{} already signed", path.display()),
        SigningEvent::ArtifactFailed { path, message } => {
            format!("failed to sign {}: {message}", path.display())
        }
        SigningEvent::Summary {
            already_signed,
            signed,
            failed,
            duration,
        } => format!(
            "signing summary: {already_signed} already signed, {signed} signed, {failed} failed in {:.1}s",
            duration.as_secs_f64()
        ),
    }
}

fn describe_housekeeping(event: &HousekeepingEvent) -> String {
    match event {
        HousekeepingEvent::Started { task, directories } => {
            format!("{task}: {directories} director(ies)")
        }
        HousekeepingEvent::DirectoryCompleted { task, directory } => {
            format!("{task}: {} done", directory.display())
        }
        HousekeepingEvent::DirectoryFailed {
            task,
            directory,
            message,
        } => format!("{task}: {} failed: {message}", directory.display()),
        HousekeepingEvent::Cancelled { task, pending } => {
            format!("{task}: {pending} director(ies) skipped after a failure")
        }
        HousekeepingEvent::Completed { task, success } => {
            if *success {
                format!("{task}: completed")
            } else {
                format!("{task}: completed with failures")
            }
        }
    }
}

fn describe_repository(event: &RepositoryEvent) -> String {
    match event {
        RepositoryEvent::RecordLoaded { path, artifacts } => {
            format!("{}: {artifacts} artifact(s)", path.display())
        }
        RepositoryEvent::ArtifactCopied { from, to } => {
            format!("copied {} to {}", from.display(), to.display())
        }
        RepositoryEvent::SourceSkipped { path } => {
            format!("skipped unsigned source package {}", path.display())
        }
        RepositoryEvent::Populated { binaries, sources } => {
            format!("repository populated: {binaries} binary, {sources} source package(s)")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn tag_owed_reads_as_owed() {
        let event = AppEvent::Decision(DecisionEvent::TagChecked {
            target: PathBuf::from("src/assets/foo"),
            package: "foo".to_string(),
            advisory: TagAdvisory::NoTag,
        });
        assert_eq!(describe(&event), "foo: no tag found, tag owed");
        assert_eq!(event.log_level(), Level::INFO);
        assert_eq!(event.log_target(), "relbuild::events::decision");
    }

    #[test]
    fn signing_summary_lists_every_count() {
        let event = AppEvent::Signing(SigningEvent::Summary {
            already_signed: 1,
            signed: 2,
            failed: 0,
            duration: Duration::from_millis(1500),
        });
        assert_eq!(
            describe(&event),
            "signing summary: 1 already signed, 2 signed, 0 failed in 1.5s"
        );
    }

    #[test]
    fn decision_names_the_verdict() {
        let event = AppEvent::Decision(DecisionEvent::Decided {
            target: PathBuf::from("src/puppet/modules/foo"),
            must_build: false,
            reason: relbuild_types::DecisionReason::UpToDate,
        });
        assert_eq!(describe(&event), "src/puppet/modules/foo: skip (up_to_date)");
    }
}
