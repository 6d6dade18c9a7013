//! Operations context for dependency injection

use relbuild_builder::{
    discover_targets, BuildLayout, DecisionOptions, DiscoveredTargets, HousekeepingOptions,
    SchedulerOptions,
};
use relbuild_config::Config;
use relbuild_errors::{Error, OpsError};
use relbuild_events::{EventEmitter, EventSender};
use relbuild_index::{HttpIndexClient, IndexCache, PackageIndexClient};
use relbuild_net::{NetConfig, RetryConfig};
use relbuild_rules::DependencyMetadataStore;
use relbuild_signing::{DigestAlgorithm, SigningOptions};
use relbuild_types::FetchMode;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Everything an operation needs, resolved once at the operation boundary
pub struct OpsCtx {
    /// Release tree root
    pub root: PathBuf,
    pub config: Config,
    pub layout: BuildLayout,
    /// `None` when no package index could be reached
    pub index: Option<Arc<dyn PackageIndexClient>>,
    pub rules: Arc<DependencyMetadataStore>,
    pub tx: EventSender,
}

impl EventEmitter for OpsCtx {
    fn event_sender(&self) -> Option<&EventSender> {
        Some(&self.tx)
    }
}

impl OpsCtx {
    /// Resolve a configured path against the tree root
    #[must_use]
    pub fn resolve(&self, path: &Path) -> PathBuf {
        Config::resolve(&self.root, path)
    }

    /// # Errors
    ///
    /// Returns an error if a target group directory cannot be read.
    pub fn discover(&self) -> Result<DiscoveredTargets, Error> {
        discover_targets(&self.root, &self.config.paths, &self.layout)
    }

    /// Fail unless the rules were loaded from a file
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::RulesNotFound` naming the configured path.
    pub fn require_rules(&self) -> Result<(), Error> {
        if self.rules.source().is_some() {
            return Ok(());
        }
        Err(relbuild_errors::ConfigError::RulesNotFound {
            path: self.resolve(&self.config.paths.rules_file).display().to_string(),
        }
        .into())
    }

    #[must_use]
    pub fn decision_options(&self) -> DecisionOptions {
        DecisionOptions {
            rebuild: self.config.build.rebuild,
            fetch: self.config.build.fetch.fetch_requested(),
            check_tags: false,
            verbose: self.config.general.verbose,
            normalizer: self.config.tag_normalizer(),
        }
    }

    #[must_use]
    pub fn scheduler_options(&self) -> SchedulerOptions {
        SchedulerOptions {
            concurrency_limit: self.config.jobs(),
            decision: self.decision_options(),
            fetch: self.config.build.fetch,
            retry: RetryConfig::default().with_attempts(self.config.index.retries),
        }
        .with_fetch(self.config.build.fetch)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` for an unknown digest name.
    pub fn signing_options(&self) -> Result<SigningOptions, Error> {
        Ok(SigningOptions {
            force: self.config.signing.force,
            digest: self.config.signing.digest.parse::<DigestAlgorithm>()?,
            concurrency_limit: self.config.jobs(),
            timeout: Duration::from_secs(self.config.signing.timeout),
            extensions: vec![self.layout.artifact_suffix()],
        })
    }

    #[must_use]
    pub fn housekeeping_options(&self, task: &str, command: &[String]) -> HousekeepingOptions {
        HousekeepingOptions {
            task: task.to_string(),
            command: command.to_vec(),
            concurrency_limit: self.config.jobs(),
        }
    }
}

/// Builder for the operations context
///
/// Anything not supplied explicitly is derived from the configuration when
/// the context is built.
pub struct OpsContextBuilder {
    root: Option<PathBuf>,
    config: Option<Config>,
    index: Option<Option<Arc<dyn PackageIndexClient>>>,
    rules: Option<DependencyMetadataStore>,
    tx: Option<EventSender>,
}

impl Default for OpsContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl OpsContextBuilder {
    /// Create new context builder
    #[must_use]
    pub fn new() -> Self {
        Self {
            root: None,
            config: None,
            index: None,
            rules: None,
            tx: None,
        }
    }

    #[must_use]
    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Use `index` instead of connecting to the configured one
    #[must_use]
    pub fn with_index(mut self, index: Option<Arc<dyn PackageIndexClient>>) -> Self {
        self.index = Some(index);
        self
    }

    /// Use `rules` instead of loading the configured rules file
    #[must_use]
    pub fn with_rules(mut self, rules: DependencyMetadataStore) -> Self {
        self.rules = Some(rules);
        self
    }

    #[must_use]
    pub fn with_event_sender(mut self, tx: EventSender) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Build the context
    ///
    /// # Errors
    ///
    /// Returns an error if a required component is missing, the rules file
    /// is invalid, or fetching is required and no index can be reached.
    pub async fn build(self) -> Result<OpsCtx, Error> {
        let tx = self.tx.ok_or_else(|| OpsError::MissingComponent {
            component: "event_sender".to_string(),
        })?;
        let config = self.config.ok_or_else(|| OpsError::MissingComponent {
            component: "config".to_string(),
        })?;
        let root = self.root.ok_or_else(|| OpsError::MissingComponent {
            component: "root".to_string(),
        })?;
        config.validate()?;

        let rules = match self.rules {
            Some(rules) => rules,
            None => {
                let path = Config::resolve(&root, &config.paths.rules_file);
                DependencyMetadataStore::load_or_default(&path).await?
            }
        };

        let index = match self.index {
            Some(index) => index,
            None => connect_index(&config, &tx).await?,
        };
        if index.is_none() && config.build.fetch == FetchMode::Required {
            return Err(OpsError::IndexRequired {
                message: "fetch mode is `required`".to_string(),
            }
            .into());
        }

        Ok(OpsCtx {
            layout: BuildLayout::from_config(&config),
            root,
            config,
            index,
            rules: Arc::new(rules),
            tx,
        })
    }
}

/// Connect to the configured index, degrading to `None` unless fetching is
/// mandatory
async fn connect_index(
    config: &Config,
    tx: &EventSender,
) -> Result<Option<Arc<dyn PackageIndexClient>>, Error> {
    let Some(url) = config.index.url.as_deref() else {
        tx.emit_debug("no package index configured");
        return Ok(None);
    };

    let net = NetConfig {
        timeout: Duration::from_secs(config.index.timeout),
        connect_timeout: Duration::from_secs(config.index.connect_timeout),
        ..NetConfig::default()
    };
    let cache = IndexCache::new(config.cache_dir());

    match HttpIndexClient::connect(url, &cache, config.index.refresh, &net, Some(tx.clone())).await
    {
        Ok(client) => {
            let client: Arc<dyn PackageIndexClient> = Arc::new(client);
            Ok(Some(client))
        }
        Err(e) if config.build.fetch == FetchMode::Required => Err(OpsError::IndexRequired {
            message: e.to_string(),
        }
        .into()),
        Err(e) => {
            tx.emit_warning(format!("package index unavailable, building locally: {e}"));
            Ok(None)
        }
    }
}
