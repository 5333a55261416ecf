//! Cover art download and `data:` URL encoding.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::StatusCode;
use thiserror::Error;

/// Content type assumed when the server sends none.
const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

#[derive(Debug, Error)]
pub enum CoverError {
    #[error("cover download from {url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("cover download from {url} failed: {reason}")]
    Transport { url: String, reason: String },
}

/// Turns a cover URL into an inline image.
#[async_trait]
pub trait CoverFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<String, CoverError>;
}

/// Downloads covers over HTTP(S) with a shared client.
#[derive(Debug, Clone, Default)]
pub struct HttpCoverFetcher {
    http: reqwest::Client,
}

impl HttpCoverFetcher {
    pub fn new(http: reqwest::Client) -> Self {
        Self { http }
    }
}

#[async_trait]
impl CoverFetcher for HttpCoverFetcher {
    async fn fetch(&self, url: &str) -> Result<String, CoverError> {
        let transport = |e: reqwest::Error| CoverError::Transport {
            url: url.to_string(),
            reason: e.to_string(),
        };

        let response = self.http.get(url).send().await.map_err(transport)?;
        if response.status() != StatusCode::OK {
            return Err(CoverError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .unwrap_or(DEFAULT_CONTENT_TYPE)
            .to_string();

        let mut body = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            body.extend_from_slice(&chunk.map_err(transport)?);
        }

        tracing::debug!(url, content_type = %content_type, bytes = body.len(), "cover downloaded");
        Ok(data_url(&content_type, &body))
    }
}

/// `data:{content_type};base64,{body}`.
pub fn data_url(content_type: &str, body: &[u8]) -> String {
    format!("data:{content_type};base64,{}", STANDARD.encode(body))
}
