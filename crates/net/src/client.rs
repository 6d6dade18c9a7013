//! HTTP client with connection pooling and typed failures

use futures::StreamExt;
use relbuild_errors::{Error, IndexError};
use reqwest::{Client, Response, StatusCode};
use std::path::Path;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Network client configuration
#[derive(Debug, Clone)]
pub struct NetConfig {
    pub timeout: Duration,
    pub connect_timeout: Duration,
    pub pool_idle_timeout: Duration,
    pub pool_max_idle_per_host: usize,
    pub user_agent: String,
}

impl Default for NetConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            connect_timeout: Duration::from_secs(30),
            pool_idle_timeout: Duration::from_secs(90),
            pool_max_idle_per_host: 10,
            user_agent: format!("relbuild/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// HTTP client wrapper
///
/// Performs a single attempt per call and classifies every failure as an
/// `IndexError`; retry policy lives with the caller.
#[derive(Clone)]
pub struct NetClient {
    client: Client,
}

impl NetClient {
    /// Create a new network client
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying reqwest client fails to initialize.
    pub fn new(config: &NetConfig) -> Result<Self, Error> {
        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(config.pool_idle_timeout)
            .pool_max_idle_per_host(config.pool_max_idle_per_host)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| IndexError::Unavailable {
                message: e.to_string(),
            })?;

        Ok(Self { client })
    }

    /// Create with default configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created with default settings.
    pub fn with_defaults() -> Result<Self, Error> {
        Self::new(&NetConfig::default())
    }

    /// GET a URL, failing on any non-success status
    ///
    /// # Errors
    ///
    /// Returns a classified `IndexError` for transport failures and error
    /// statuses.
    pub async fn get(&self, url: &str) -> Result<Response, Error> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_transport(url, &e))?;
        check_status(url, response)
    }

    /// GET a URL as text
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the body cannot be decoded.
    pub async fn get_text(&self, url: &str) -> Result<String, Error> {
        let response = self.get(url).await?;
        response.text().await.map_err(|e| {
            IndexError::InvalidResponse {
                message: e.to_string(),
            }
            .into()
        })
    }

    /// Stream a URL into `dest`, returning the byte count
    ///
    /// The body is written to a sibling `.part` file that is renamed into
    /// place only after the transfer completes.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the file cannot be written.
    pub async fn download_to(&self, url: &str, dest: &Path) -> Result<u64, Error> {
        let response = self.get(url).await?;
        let partial = partial_path(dest);

        let result = stream_into(response, url, &partial).await;
        match result {
            Ok(size) => {
                tokio::fs::rename(&partial, dest)
                    .await
                    .map_err(|e| Error::io_with_path(&e, dest))?;
                Ok(size)
            }
            Err(e) => {
                let _ = tokio::fs::remove_file(&partial).await;
                Err(e)
            }
        }
    }

    /// Get the underlying reqwest client for advanced usage
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

async fn stream_into(response: Response, url: &str, dest: &Path) -> Result<u64, Error> {
    let mut file = tokio::fs::File::create(dest)
        .await
        .map_err(|e| Error::io_with_path(&e, dest))?;
    let mut stream = response.bytes_stream();
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| classify_transport(url, &e))?;
        file.write_all(&chunk)
            .await
            .map_err(|e| Error::io_with_path(&e, dest))?;
        written += chunk.len() as u64;
    }
    file.flush().await.map_err(|e| Error::io_with_path(&e, dest))?;

    Ok(written)
}

fn partial_path(dest: &Path) -> std::path::PathBuf {
    let name = dest
        .file_name()
        .map_or_else(|| "download".into(), |n| n.to_string_lossy().into_owned());
    dest.with_file_name(format!(".{name}.part"))
}

fn check_status(url: &str, response: Response) -> Result<Response, Error> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let err = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => IndexError::Unauthorized {
            url: url.to_string(),
        },
        StatusCode::NOT_FOUND => IndexError::NotFound {
            package: url.to_string(),
        },
        other => IndexError::Http {
            status: other.as_u16(),
            message: other.to_string(),
        },
    };
    Err(err.into())
}

fn classify_transport(url: &str, error: &reqwest::Error) -> Error {
    let err = if error.is_timeout() {
        IndexError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() || error.is_request() || error.is_body() {
        IndexError::Connection {
            message: error.to_string(),
        }
    } else if let Some(status) = error.status() {
        IndexError::Http {
            status: status.as_u16(),
            message: error.to_string(),
        }
    } else {
        IndexError::InvalidResponse {
            message: error.to_string(),
        }
    };
    err.into()
}
