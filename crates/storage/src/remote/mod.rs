use std::sync::Arc;
use std::time::Duration;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use crate::repository::{
    ProfileRepository, QuestionBank, QuestionSource, ResultRepository, Storage, StorageError,
};

mod rows;
mod tables;

const REST_PREFIX: &str = "rest/v1/";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RemoteInitError {
    #[error("invalid remote url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported remote url scheme `{0}`")]
    UnsupportedScheme(String),

    #[error("remote api key is missing")]
    MissingApiKey,

    #[error(transparent)]
    Client(#[from] reqwest::Error),
}

/// Connection settings for a PostgREST-style backend.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    base_url: Url,
    api_key: String,
    access_token: Option<String>,
}

impl RemoteConfig {
    /// # Errors
    ///
    /// Returns `RemoteInitError` if the URL does not parse, is not http(s), or
    /// the API key is blank.
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        access_token: Option<String>,
    ) -> Result<Self, RemoteInitError> {
        let mut base_url = Url::parse(base_url.trim())?;
        if !matches!(base_url.scheme(), "http" | "https") {
            return Err(RemoteInitError::UnsupportedScheme(
                base_url.scheme().to_string(),
            ));
        }
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(RemoteInitError::MissingApiKey);
        }

        Ok(Self {
            base_url,
            api_key,
            access_token: access_token.filter(|t| !t.trim().is_empty()),
        })
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn table_url(&self, table: &str) -> Result<Url, StorageError> {
        self.base_url
            .join(REST_PREFIX)
            .and_then(|u| u.join(table))
            .map_err(|e| StorageError::Connection(e.to_string()))
    }

    /// Bearer token: the user's access token when signed in, else the API key.
    fn bearer(&self) -> &str {
        self.access_token.as_deref().unwrap_or(&self.api_key)
    }
}

#[derive(Clone)]
pub struct RemoteRepository {
    client: Client,
    config: Arc<RemoteConfig>,
}

impl RemoteRepository {
    /// # Errors
    ///
    /// Returns `RemoteInitError::Client` if the HTTP client cannot be built.
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteInitError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        tracing::debug!(base_url = %config.base_url, "remote backend configured");
        Ok(Self {
            client,
            config: Arc::new(config),
        })
    }

    fn request(&self, method: reqwest::Method, table: &str) -> Result<RequestBuilder, StorageError> {
        let url = self.config.table_url(table)?;
        Ok(self
            .client
            .request(method, url)
            .header("apikey", &self.config.api_key)
            .bearer_auth(self.config.bearer()))
    }

    async fn send_json<T: DeserializeOwned>(&self, req: RequestBuilder) -> Result<T, StorageError> {
        let response = send(req).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| StorageError::Serialization(e.to_string()))
    }

    async fn send_empty(&self, req: RequestBuilder) -> Result<(), StorageError> {
        send(req).await.map(|_| ())
    }
}

async fn send(req: RequestBuilder) -> Result<reqwest::Response, StorageError> {
    let response = req
        .send()
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    tracing::warn!(%status, url = %response.url(), "remote request rejected");
    Err(status_error(status))
}

fn status_error(status: StatusCode) -> StorageError {
    match status {
        StatusCode::NOT_FOUND => StorageError::NotFound,
        StatusCode::CONFLICT => StorageError::Conflict,
        other => StorageError::Connection(format!("remote returned {other}")),
    }
}

impl Storage {
    /// Build a `Storage` backed by the remote tables.
    ///
    /// # Errors
    ///
    /// Returns `RemoteInitError` if the HTTP client cannot be built.
    pub fn remote(config: RemoteConfig) -> Result<Self, RemoteInitError> {
        let repo = RemoteRepository::new(config)?;
        let question_source: Arc<dyn QuestionSource> = Arc::new(repo.clone());
        let question_bank: Arc<dyn QuestionBank> = Arc::new(repo.clone());
        let results: Arc<dyn ResultRepository> = Arc::new(repo.clone());
        let profiles: Arc<dyn ProfileRepository> = Arc::new(repo);
        Ok(Self {
            question_source,
            question_bank,
            results,
            profiles,
        })
    }
}
