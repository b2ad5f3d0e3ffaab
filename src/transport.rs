//! The network boundary: opening one byte stream per run.
//!
//! `StreamTransport` is the seam between the engine and HTTP; tests
//! substitute scripted streams, production uses reqwest.

use async_trait::async_trait;
use bytes::Bytes;
use futures_util::{Stream, StreamExt};
use std::pin::Pin;

use crate::request::ProviderRequest;
use crate::run::RunError;

/// The byte stream of one upstream response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, RunError>> + Send>>;

/// Opens one streaming connection for a built request.
#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn open(&self, request: &ProviderRequest) -> Result<ByteStream, RunError>;
}

/// HTTP transport over a shared reqwest client.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamTransport for HttpTransport {
    async fn open(&self, request: &ProviderRequest) -> Result<ByteStream, RunError> {
        let mut builder = self.client.post(&request.url);
        for (name, value) in &request.headers {
            builder = builder.header(*name, value);
        }

        let response = builder
            .json(&request.body)
            .send()
            .await
            .map_err(|e| RunError::Transport(format!("request to {} failed: {}", request.url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt: String = body.chars().take(300).collect();
            return Err(RunError::Transport(format!(
                "upstream returned {}: {}",
                status, excerpt
            )));
        }

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| RunError::Transport(format!("stream read error: {}", e))));
        Ok(Box::pin(stream))
    }
}
