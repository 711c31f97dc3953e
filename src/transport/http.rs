// src/transport/http.rs

use async_trait::async_trait;
use reqwest::Client;
use std::error::Error as StdError;
use std::time::Instant;
use tracing::debug;

use crate::config::FailoverConfig;
use crate::error::{FailoverError, Result, TransportError, TransportErrorKind};
use crate::transport::{ApiResponse, OutgoingRequest, Transport};

/// HTTP transport backed by a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    /// Builds a client with the connect and request timeouts from `config`
    pub fn new(config: &FailoverConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| FailoverError::Config(format!("cannot build HTTP client: {}", e)))?;

        Ok(Self { client })
    }

    /// Wraps an already configured client
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let started = Instant::now();
        let host = request.url.host_str().unwrap_or_default().to_string();

        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Body, e.to_string()))?;

        debug!(
            host = %host,
            status = status.as_u16(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "HTTP attempt completed"
        );

        Ok(ApiResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        TransportError::new(classify(&err), describe(&err))
    }
}

fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        TransportErrorKind::Timeout
    } else if err.is_connect() {
        if looks_like_dns(err) {
            TransportErrorKind::Dns
        } else {
            TransportErrorKind::Connect
        }
    } else if err.is_builder() || err.is_redirect() {
        TransportErrorKind::InvalidRequest
    } else if err.is_body() || err.is_decode() {
        TransportErrorKind::Body
    } else {
        TransportErrorKind::Io
    }
}

// hyper-util reports resolver failures as connect errors; the cause chain tells them apart
fn looks_like_dns(err: &reqwest::Error) -> bool {
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}

fn describe(err: &reqwest::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}
