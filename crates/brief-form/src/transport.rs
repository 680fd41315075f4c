//! HTTP transport to a brief backend.

use std::sync::Arc;

use async_trait::async_trait;
use brief_core::BriefRecord;
use reqwest::header::CONTENT_TYPE;
use serde::Deserialize;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::status::{Notice, StatusBoard};

/// Plain text keeps browsers from sending a CORS preflight; the body is still JSON.
pub const SUBMIT_CONTENT_TYPE: &str = "text/plain;charset=utf-8";

#[derive(Error, Debug)]
pub enum TransportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON encode error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("service returned {0}")]
    Unavailable(u16),
}

/// What came back from the backend, success or not.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Body of the liveness probe.
#[derive(Debug, Clone, Deserialize)]
pub struct Liveness {
    pub status: String,
    pub timestamp: String,
}

#[async_trait]
pub trait Transport: Send + Sync {
    /// Send one record. `Err` only when no response arrived.
    async fn send(&self, record: &BriefRecord) -> Result<Reply, TransportError>;

    async fn probe(&self) -> Result<Liveness, TransportError>;
}

/// Posts briefs to a single backend URL.
pub struct HttpTransport {
    client: reqwest::Client,
    url: String,
}

impl HttpTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, record: &BriefRecord) -> Result<Reply, TransportError> {
        let body = serde_json::to_string(record)?;

        info!(url = %self.url, bytes = body.len(), "submitting brief");
        let resp = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, SUBMIT_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;
        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();
        info!(status, "backend replied");
        Ok(Reply { status, body })
    }

    async fn probe(&self) -> Result<Liveness, TransportError> {
        let resp = self.client.get(&self.url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Unavailable(status.as_u16()));
        }
        Ok(resp.json().await?)
    }
}

/// Probe once in the background and report availability on the board.
pub fn spawn_probe(transport: Arc<dyn Transport>, status: StatusBoard) -> JoinHandle<bool> {
    tokio::spawn(async move {
        match transport.probe().await {
            Ok(live) => {
                info!(status = %live.status, timestamp = %live.timestamp, "submission service reachable");
                status.push(Notice::ServiceAvailable);
                true
            }
            Err(err) => {
                warn!(error = %err, "submission service not reachable");
                status.push(Notice::ServiceUnavailable);
                false
            }
        }
    })
}
