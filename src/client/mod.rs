use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use reqwest::{Method, StatusCode};
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error};
use url::Url;

use crate::model::{Book, BookDraft, BookId};
use crate::utils;

pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("bookshelf/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_DOWNLOAD_NAME: &str = "library.db";

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid base url: {message}")]
    InvalidBaseUrl { message: String },

    #[error("failed to build HTTP client: {source}")]
    ClientBuild {
        #[source]
        source: reqwest::Error,
    },

    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{method} {url} returned {status}")]
    Status {
        method: Method,
        url: String,
        status: StatusCode,
    },

    #[error("malformed response from {url}: {message}")]
    Decode { url: String, message: String },

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: Url,
    pub timeout: Duration,
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Result<Self, ClientError> {
        let base_url = utils::parse_base_url(base_url)
            .map_err(|message| ClientError::InvalidBaseUrl { message })?;
        Ok(Self {
            base_url,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECONDS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn books_url(&self) -> Url {
        utils::join_segments(&self.base_url, &["books"])
    }

    pub fn book_url(&self, id: &BookId) -> Url {
        utils::join_segments(&self.base_url, &["books", id.as_str()])
    }

    pub fn snapshot_url(&self) -> Url {
        utils::join_segments(&self.base_url, &["download-db"])
    }
}

#[async_trait]
pub trait CatalogBackend: Send + Sync {
    async fn list_books(&self) -> Result<Vec<Book>, ClientError>;

    async fn get_book(&self, id: &BookId) -> Result<Book, ClientError>;

    async fn create_book(&self, draft: &BookDraft) -> Result<(), ClientError>;

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<(), ClientError>;

    async fn delete_book(&self, id: &BookId) -> Result<(), ClientError>;

    /// Streams the database snapshot into `dest`, with a progress bar on
    /// stderr when `progress` is set. Returns the number of bytes written.
    async fn download_to(&self, dest: &Path, progress: bool) -> Result<u64, ClientError>;
}

#[async_trait]
impl<T: CatalogBackend + ?Sized> CatalogBackend for &T {
    async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        (**self).list_books().await
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ClientError> {
        (**self).get_book(id).await
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<(), ClientError> {
        (**self).create_book(draft).await
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<(), ClientError> {
        (**self).update_book(id, draft).await
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), ClientError> {
        (**self).delete_book(id).await
    }

    async fn download_to(&self, dest: &Path, progress: bool) -> Result<u64, ClientError> {
        (**self).download_to(dest, progress).await
    }
}

#[derive(Clone, Debug)]
pub struct HttpBackend {
    config: ClientConfig,
    http: reqwest::Client,
}

impl HttpBackend {
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );
        let http = reqwest::Client::builder()
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(|e| ClientError::ClientBuild { source: e })?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    async fn send(
        &self,
        method: Method,
        url: Url,
        body: Option<&BookDraft>,
    ) -> Result<reqwest::Response, ClientError> {
        debug!(%method, %url, "sending request");
        let mut request = self.http.request(method.clone(), url.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send().await.map_err(|e| {
            error!(%method, %url, error = %e, "request failed");
            ClientError::Transport {
                url: url.to_string(),
                source: e,
            }
        })?;
        let status = response.status();
        if !status.is_success() {
            error!(%method, %url, %status, "backend rejected request");
            return Err(ClientError::Status {
                method,
                url: url.to_string(),
                status,
            });
        }
        debug!(%method, %url, %status, "request completed");
        Ok(response)
    }

    async fn read_json<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let url = response.url().to_string();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Transport {
                url: url.clone(),
                source: e,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| {
            error!(%url, error = %e, "could not decode response body");
            ClientError::Decode {
                url,
                message: e.to_string(),
            }
        })
    }
}

#[async_trait]
impl CatalogBackend for HttpBackend {
    async fn list_books(&self) -> Result<Vec<Book>, ClientError> {
        let response = self.send(Method::GET, self.config.books_url(), None).await?;
        Self::read_json(response).await
    }

    async fn get_book(&self, id: &BookId) -> Result<Book, ClientError> {
        let response = self.send(Method::GET, self.config.book_url(id), None).await?;
        Self::read_json(response).await
    }

    async fn create_book(&self, draft: &BookDraft) -> Result<(), ClientError> {
        self.send(Method::POST, self.config.books_url(), Some(draft))
            .await?;
        Ok(())
    }

    async fn update_book(&self, id: &BookId, draft: &BookDraft) -> Result<(), ClientError> {
        self.send(Method::PUT, self.config.book_url(id), Some(draft))
            .await?;
        Ok(())
    }

    async fn delete_book(&self, id: &BookId) -> Result<(), ClientError> {
        self.send(Method::DELETE, self.config.book_url(id), None)
            .await?;
        Ok(())
    }

    async fn download_to(&self, dest: &Path, progress: bool) -> Result<u64, ClientError> {
        let url = self.config.snapshot_url();
        let response = self.send(Method::GET, url.clone(), None).await?;

        let pb = if progress {
            let pb = ProgressBar::with_draw_target(
                response.content_length(),
                ProgressDrawTarget::stderr(),
            );
            pb.set_style(
                ProgressStyle::with_template(
                    "{spinner} {bytes}/{total_bytes} [{wide_bar}] {bytes_per_sec}",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb
        } else {
            ProgressBar::hidden()
        };

        let io_err = |source: std::io::Error| ClientError::Io {
            path: dest.display().to_string(),
            source,
        };
        let mut file = File::create(dest).await.map_err(io_err)?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| ClientError::Transport {
                url: url.to_string(),
                source: e,
            })?;
            file.write_all(&chunk).await.map_err(io_err)?;
            written += chunk.len() as u64;
            pb.set_position(written);
        }
        file.flush().await.map_err(io_err)?;
        pb.finish_and_clear();
        debug!(path = %dest.display(), bytes = written, "snapshot written");
        Ok(written)
    }
}

pub fn snapshot_destination(requested: Option<&Path>) -> PathBuf {
    match requested {
        Some(path) if path.is_dir() => path.join(DEFAULT_DOWNLOAD_NAME),
        Some(path) => path.to_path_buf(),
        None => PathBuf::from(DEFAULT_DOWNLOAD_NAME),
    }
}
