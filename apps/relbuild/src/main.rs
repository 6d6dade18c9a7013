//! relbuild - release builder for package trees
//!
//! Thin CLI over the ops crate: loads configuration, installs the tracing
//! subscriber, forwards library events to it and renders the final report.

mod cli;
mod display;
mod error;
mod logging;

use crate::cli::{Cli, Commands, GlobalArgs};
use crate::display::OutputRenderer;
use crate::error::CliError;
use clap::Parser;
use relbuild_config::Config;
use relbuild_events::EventReceiver;
use relbuild_ops::{OperationResult, OpsContextBuilder, OpsCtx};
use std::path::{Path, PathBuf};
use std::process;
use tokio::select;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.global.verbose);

    if let Err(e) = run(cli).await {
        error!("{e}");
        eprintln!("Error: {e}");
        process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    info!("Starting relbuild v{}", env!("CARGO_PKG_VERSION"));

    // File (or defaults), then environment, then CLI flags
    let mut config = Config::load_or_default(cli.global.config.as_deref()).await?;
    config.merge_env()?;
    apply_cli_config(&mut config, &cli.global, &cli.command);
    config.validate()?;

    let root = tree_root(&cli.global.root)?;
    let (event_sender, event_receiver) = relbuild_events::channel();
    let ctx = OpsContextBuilder::new()
        .with_root(root)
        .with_config(config)
        .with_event_sender(event_sender)
        .build()
        .await?;

    let renderer = OutputRenderer::new(cli.global.json);
    let result = execute_command_with_events(cli.command, ctx, event_receiver).await?;
    renderer.render_result(&result)?;

    info!("Command completed successfully");
    Ok(())
}

/// Execute command while forwarding events to tracing
async fn execute_command_with_events(
    command: Commands,
    ctx: OpsCtx,
    mut event_receiver: EventReceiver,
) -> Result<OperationResult, CliError> {
    let mut command_future = Box::pin(execute_command(command, ctx));

    loop {
        select! {
            result = &mut command_future => {
                while let Ok(event) = event_receiver.try_recv() {
                    logging::log_event(&event);
                }
                return result;
            }

            event = event_receiver.recv() => {
                if let Some(event) = event {
                    logging::log_event(&event);
                }
            }
        }
    }
}

async fn execute_command(command: Commands, ctx: OpsCtx) -> Result<OperationResult, CliError> {
    let result = match command {
        Commands::Build { sign, .. } => {
            OperationResult::Build(relbuild_ops::build_release(&ctx, sign).await?)
        }
        Commands::BuildTarget { targets, .. } => {
            OperationResult::Build(relbuild_ops::build_targets(&ctx, &targets).await?)
        }
        Commands::Sign { root, .. } => {
            OperationResult::Sign(relbuild_ops::sign_artifacts(&ctx, root).await?)
        }
        Commands::Populate => OperationResult::Populate(relbuild_ops::populate(&ctx).await?),
        Commands::CheckPublished => {
            OperationResult::Publish(relbuild_ops::check_published(&ctx).await?)
        }
        Commands::Clean => OperationResult::Sweep(relbuild_ops::clean(&ctx).await?),
        Commands::Clobber => OperationResult::Sweep(relbuild_ops::clobber(&ctx).await?),
    };
    Ok(result)
}

/// Apply CLI configuration overrides (highest precedence)
fn apply_cli_config(config: &mut Config, global: &GlobalArgs, command: &Commands) {
    if global.verbose {
        config.general.verbose = true;
    }
    if let Some(jobs) = global.jobs {
        config.general.jobs = jobs;
    }

    if let Some(decision) = command.decision() {
        if let Some(rebuild) = decision.rebuild {
            config.build.rebuild = rebuild;
        }
        if let Some(fetch) = decision.fetch {
            config.build.fetch = fetch;
        }
    }

    if let Commands::Sign { force, timeout, .. } = command {
        if *force {
            config.signing.force = true;
        }
        if let Some(timeout) = timeout {
            config.signing.timeout = *timeout;
        }
    }
}

fn tree_root(root: &Path) -> Result<PathBuf, CliError> {
    if root.is_absolute() {
        Ok(root.to_path_buf())
    } else {
        let cwd = std::env::current_dir()
            .map_err(|e| relbuild_errors::Error::io_with_path(&e, root))?;
        Ok(cwd.join(root))
    }
}

/// Initialize tracing: `RUST_LOG` wins, otherwise info, or debug when verbose
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "debug,relbuild=debug"
    } else {
        "info,relbuild=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use relbuild_types::{FetchMode, RebuildPolicy};

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from([
            "relbuild", "-v", "-j", "3", "build-target", "x", "--fetch", "disabled", "--rebuild",
            "always",
        ]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert!(config.general.verbose);
        assert_eq!(config.general.jobs, 3);
        assert_eq!(config.build.fetch, FetchMode::Disabled);
        assert_eq!(config.build.rebuild, RebuildPolicy::Always);
    }

    #[test]
    fn sign_flags_only_touch_signing() {
        let cli = Cli::parse_from(["relbuild", "sign", "--force", "--timeout", "5"]);
        let mut config = Config::default();
        apply_cli_config(&mut config, &cli.global, &cli.command);

        assert!(config.signing.force);
        assert_eq!(config.signing.timeout, 5);
        assert_eq!(config.build.fetch, FetchMode::Preferred);
    }
}
