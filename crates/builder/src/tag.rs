//! Source-control tag probing

use crate::command::run_in;
use relbuild_types::TagInfo;
use std::path::Path;

const REMOTES: &[&str] = &["origin", "upstream"];

fn git(args: &[&str]) -> Vec<String> {
    std::iter::once("git")
        .chain(args.iter().copied())
        .map(ToString::to_string)
        .collect()
}

/// Latest reachable tag and remote URL of the repository at `dir`
///
/// Probe failures are not errors: a directory outside a repository, or one
/// without tags, yields an empty tag.
pub async fn probe_tag(dir: &Path) -> TagInfo {
    let latest_tag = match run_in(&git(&["describe", "--abbrev=0", "--tags"]), dir, &[]).await {
        Ok(outcome) if outcome.success => outcome.stdout.trim().to_string(),
        _ => String::new(),
    };

    let mut origin_url = None;
    for remote in REMOTES {
        let key = format!("remote.{remote}.url");
        if let Ok(outcome) = run_in(&git(&["config", "--get", &key]), dir, &[]).await {
            let url = outcome.stdout.trim();
            if outcome.success && !url.is_empty() {
                origin_url = Some(url.to_string());
                break;
            }
        }
    }

    TagInfo {
        latest_tag,
        origin_url,
    }
}
