use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

/// Error from an embedding provider
#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("invalid endpoint URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The provider answered with an `{error}` payload.
    #[error("provider error for {text:?}: {message}")]
    Provider { text: String, message: String },

    #[error("provider returned an empty embedding for {0:?}")]
    Empty(String),
}

/// Turns text into a fixed-length vector.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError>;
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

/// `{embedding}` on success, `{error}` on failure.
#[derive(Deserialize)]
#[serde(untagged)]
enum EmbedResponse {
    Embedding { embedding: Vec<f32> },
    Error { error: String },
}

impl EmbedResponse {
    fn into_result(self, text: &str) -> Result<Vec<f32>, EmbedError> {
        match self {
            EmbedResponse::Embedding { embedding } if embedding.is_empty() => {
                Err(EmbedError::Empty(text.to_string()))
            }
            EmbedResponse::Embedding { embedding } => Ok(embedding),
            EmbedResponse::Error { error } => Err(EmbedError::Provider {
                text: text.to_string(),
                message: error,
            }),
        }
    }
}

/// Blocking client for `POST {endpoint} {text} -> {embedding} | {error}`.
pub struct HttpEmbedder {
    client: reqwest::blocking::Client,
    endpoint: Url,
}

impl HttpEmbedder {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, EmbedError> {
        let endpoint = Url::parse(endpoint)?;
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("semantic-room/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;
        Ok(Self { client, endpoint })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl EmbeddingProvider for HttpEmbedder {
    fn embed(&self, text: &str) -> Result<Vec<f32>, EmbedError> {
        log::debug!("POST {} ({} chars)", self.endpoint, text.len());

        // The provider reports its own failures in the body, sometimes with a
        // non-2xx status, so the body is parsed regardless of status.
        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&EmbedRequest { text })
            .send()?;

        let status = response.status();
        let body: EmbedResponse = match response.json() {
            Ok(body) => body,
            Err(e) if !status.is_success() => {
                return Err(EmbedError::Provider {
                    text: text.to_string(),
                    message: format!("HTTP {status}: {e}"),
                })
            }
            Err(e) => return Err(e.into()),
        };
        body.into_result(text)
    }
}
