//! Package index client boundary and its HTTP implementation

use crate::cache::IndexCache;
use crate::models::Index;
use async_trait::async_trait;
use relbuild_errors::{Error, IndexError};
use relbuild_events::{AppEvent, EventEmitter, EventSender, IndexEvent};
use relbuild_net::{join_url, NetClient, NetConfig};
use relbuild_types::RemotePackage;
use std::path::{Path, PathBuf};

/// Queries and downloads published packages
///
/// Any failure is a typed `IndexError`; callers treat it as a degraded
/// collaborator rather than a fatal condition.
#[async_trait]
pub trait PackageIndexClient: Send + Sync {
    /// Newest published build of `name`, if any
    async fn available(&self, name: &str) -> Result<Option<RemotePackage>, Error>;

    /// Download the newest published build of `name` into `target_dir`
    async fn download(&self, name: &str, target_dir: &Path) -> Result<PathBuf, Error>;
}

/// Index document served over HTTP
pub struct HttpIndexClient {
    url: String,
    index: Index,
    net: NetClient,
}

impl HttpIndexClient {
    /// Load the index document and build a client around it
    ///
    /// With `refresh` set the document is always fetched and written to the
    /// cache. Without it a cached copy is reused when present.
    ///
    /// # Errors
    ///
    /// Returns an `IndexError` if the document cannot be fetched or is invalid.
    pub async fn connect(
        url: &str,
        cache: &IndexCache,
        refresh: bool,
        net_config: &NetConfig,
        events: Option<EventSender>,
    ) -> Result<Self, Error> {
        relbuild_net::parse_url(url)?;
        let net = NetClient::new(net_config)?;

        let cached = if refresh {
            None
        } else {
            match cache.load().await {
                Ok(index) => Some(index),
                Err(e) => {
                    events.emit_debug(format!("index cache unusable, fetching: {e}"));
                    None
                }
            }
        };

        let (index, source) = if let Some(index) = cached {
            index.validate()?;
            (index, cache.index_path().display().to_string())
        } else {
            let body = net.get_text(url).await?;
            let index = Index::from_json(&body)?;
            index.validate()?;
            if let Err(e) = cache.save(&index).await {
                events.emit_warning(format!("failed to cache index: {e}"));
            }
            (index, url.to_string())
        };

        events.emit(AppEvent::Index(IndexEvent::Loaded {
            source,
            packages: index.package_count(),
        }));

        Ok(Self {
            url: url.to_string(),
            index,
            net,
        })
    }

    #[must_use]
    pub fn index(&self) -> &Index {
        &self.index
    }
}

#[async_trait]
impl PackageIndexClient for HttpIndexClient {
    async fn available(&self, name: &str) -> Result<Option<RemotePackage>, Error> {
        Ok(self.index.latest(name).map(|(pkg, _)| pkg))
    }

    async fn download(&self, name: &str, target_dir: &Path) -> Result<PathBuf, Error> {
        let (pkg, entry) = self
            .index
            .latest(name)
            .ok_or_else(|| IndexError::NotFound {
                package: name.to_string(),
            })?;
        let location = join_url(&self.url, entry.location())?;

        tokio::fs::create_dir_all(target_dir)
            .await
            .map_err(|e| Error::io_with_path(&e, target_dir))?;
        let dest = target_dir.join(&pkg.identifier);
        self.net.download_to(&location, &dest).await?;
        Ok(dest)
    }
}
