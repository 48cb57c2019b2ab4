//! Endpoint client for the six GitHub REST resources a report is built from.
//!
//! Responses are returned as loosely-typed `serde_json::Value` documents; turning them
//! into typed records is the job of [`crate::metrics`].

use crate::config::AppConfig;
use crate::identity::RepositoryIdentity;
use http::{StatusCode, Uri};
use octocrab::service::middleware::retry::RetryConfig;
use octocrab::Octocrab;
use serde_json::Value;
use thiserror::Error;

/// Items requested per list endpoint. Only the first page is ever read.
pub const PER_PAGE: u32 = 100;

#[derive(Debug, Error)]
pub enum FetchError {
    /// The API could not be reached, or the response body could not be read.
    #[error("transport error: {0}")]
    Transport(String),

    /// The API answered with a non-success status.
    #[error("GitHub returned status {status}")]
    Status { status: u16 },

    /// The API answered successfully but with a body of the wrong shape.
    #[error("unexpected response body: {0}")]
    Decode(String),

    /// No valid request could be built for the repository.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetchError {
    /// The HTTP status carried by a `Status` error.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            FetchError::Status { status } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Clone)]
pub struct GitHubClient {
    octocrab: Octocrab,
    api_base: String,
}

impl GitHubClient {
    /// Builds a client from explicit configuration. Retries are disabled: a failed call
    /// is reported once.
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        let base_uri: Uri = config.api_base().parse()?;

        let mut builder = Octocrab::builder()
            .base_uri(base_uri)?
            .add_retry_config(RetryConfig::None);
        if let Some(token) = &config.github_pat {
            builder = builder.personal_token(token.clone());
        }

        Ok(Self {
            octocrab: builder.build()?,
            api_base: config.api_base().to_string(),
        })
    }

    /// `repos/{owner}/{name}`
    pub async fn repository(&self, repo: &RepositoryIdentity) -> Result<Value, FetchError> {
        let body = self.get(&repo_path(repo, "")).await?;
        expect_object(body)
    }

    /// `repos/{owner}/{name}/commits`, newest first.
    pub async fn commits(&self, repo: &RepositoryIdentity) -> Result<Vec<Value>, FetchError> {
        let path = format!("{}?per_page={PER_PAGE}", repo_path(repo, "/commits"));
        expect_array(self.get(&path).await?)
    }

    /// `repos/{owner}/{name}/contributors`
    pub async fn contributors(&self, repo: &RepositoryIdentity) -> Result<Vec<Value>, FetchError> {
        let path = format!("{}?per_page={PER_PAGE}", repo_path(repo, "/contributors"));
        expect_array(self.get(&path).await?)
    }

    /// `repos/{owner}/{name}/languages`, a mapping of language name to byte count.
    pub async fn languages(&self, repo: &RepositoryIdentity) -> Result<Value, FetchError> {
        let body = self.get(&repo_path(repo, "/languages")).await?;
        expect_object(body)
    }

    /// `repos/{owner}/{name}/pulls` in every state.
    pub async fn pull_requests(
        &self,
        repo: &RepositoryIdentity,
    ) -> Result<Vec<Value>, FetchError> {
        let path = format!(
            "{}?state=all&per_page={PER_PAGE}",
            repo_path(repo, "/pulls")
        );
        expect_array(self.get(&path).await?)
    }

    /// `repos/{owner}/{name}/issues` in every state. Pull requests are returned intermixed
    /// with issues by this endpoint and are left in place here.
    pub async fn issues(&self, repo: &RepositoryIdentity) -> Result<Vec<Value>, FetchError> {
        let path = format!(
            "{}?state=all&per_page={PER_PAGE}",
            repo_path(repo, "/issues")
        );
        expect_array(self.get(&path).await?)
    }

    /// Issues a single GET, relative to the configured base URI, and parses the body as JSON.
    ///
    /// `204 No Content` parses as an empty array, which is what GitHub sends for the
    /// contributors of an empty repository.
    async fn get(&self, path: &str) -> Result<Value, FetchError> {
        let uri: Uri = path
            .parse()
            .map_err(|e: http::uri::InvalidUri| FetchError::InvalidRequest(e.to_string()))?;

        tracing::debug!(api = %self.api_base, path = %path, "GET");

        let response = self
            .octocrab
            ._get(uri)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(path = %path, status = status.as_u16(), "Non-success response");
            return Err(FetchError::Status {
                status: status.as_u16(),
            });
        }
        if status == StatusCode::NO_CONTENT {
            return Ok(Value::Array(Vec::new()));
        }

        let body = self
            .octocrab
            .body_to_string(response)
            .await
            .map_err(|e| FetchError::Transport(e.to_string()))?;

        if body.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }

        serde_json::from_str(&body).map_err(|e| FetchError::Decode(e.to_string()))
    }
}

/// Owner and name come straight from user input, so both are percent-encoded.
fn repo_path(repo: &RepositoryIdentity, suffix: &str) -> String {
    format!(
        "/repos/{}/{}{}",
        urlencoding::encode(&repo.owner),
        urlencoding::encode(&repo.name),
        suffix
    )
}

fn expect_array(body: Value) -> Result<Vec<Value>, FetchError> {
    match body {
        Value::Array(items) => Ok(items),
        other => Err(FetchError::Decode(format!(
            "expected a JSON array, got {}",
            kind_of(&other)
        ))),
    }
}

fn expect_object(body: Value) -> Result<Value, FetchError> {
    match body {
        Value::Object(_) => Ok(body),
        other => Err(FetchError::Decode(format!(
            "expected a JSON object, got {}",
            kind_of(&other)
        ))),
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
