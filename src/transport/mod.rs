// src/transport/mod.rs
//! Request/response types and the pluggable HTTP transport.

pub mod http;


pub use http::ReqwestTransport;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use url::Url;

use crate::config::ServerProfile;
use crate::error::{FailoverError, Result, TransportError};

/// An API call as issued by the application.
///
/// Only the scheme, host and port of `url` are ever changed on the way out.
#[derive(Debug, Clone)]
pub struct OutgoingRequest {
    pub method: Method,
    pub url: Url,
    pub headers: HeaderMap,
    pub body: Option<Vec<u8>>,
}

impl OutgoingRequest {
    pub fn new(method: Method, url: Url) -> Self {
        Self {
            method,
            url,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(url: Url) -> Self {
        Self::new(Method::GET, url)
    }

    /// Adds a header, replacing any previous value for the same name
    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| FailoverError::Internal(format!("invalid header name: {}", e)))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| FailoverError::Internal(format!("invalid header value: {}", e)))?;
        self.headers.insert(name, value);
        Ok(self)
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Serializes `body` as JSON and sets the content type
    pub fn with_json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| FailoverError::Internal(format!("cannot encode request body: {}", e)))?;
        self.headers.insert(
            reqwest::header::CONTENT_TYPE,
            HeaderValue::from_static("application/json"),
        );
        self.body = Some(bytes);
        Ok(self)
    }

    /// Copy of this request aimed at `profile`.
    ///
    /// Method, path, query, fragment, headers and body are left untouched.
    pub fn retarget(&self, profile: &ServerProfile) -> Result<OutgoingRequest> {
        let mut url = self.url.clone();

        url.set_scheme(&profile.scheme).map_err(|_| {
            FailoverError::InvalidTarget(format!(
                "cannot switch {} to scheme '{}'",
                self.url, profile.scheme
            ))
        })?;
        url.set_host(Some(&profile.host))?;
        url.set_port(Some(profile.port)).map_err(|_| {
            FailoverError::InvalidTarget(format!("cannot set port {} on {}", profile.port, url))
        })?;

        Ok(OutgoingRequest {
            method: self.method.clone(),
            url,
            headers: self.headers.clone(),
            body: self.body.clone(),
        })
    }
}

/// Any HTTP response that made it back, whatever its status
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Turns 4xx/5xx responses into `FailoverError::Upstream`
    pub fn error_for_status(self) -> Result<Self> {
        if self.status.is_client_error() || self.status.is_server_error() {
            return Err(FailoverError::Upstream {
                status: self.status.as_u16(),
                body: self.body,
            });
        }
        Ok(self)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_slice(&self.body).map_err(|e| FailoverError::Decode(e.to_string()))
    }
}

/// Executes one request against exactly the host named in its URL.
///
/// Implementations report every failure to obtain a response as a
/// `TransportError`; `TransportError::is_transport_failure` decides whether
/// the failover policy gets involved.
#[async_trait]
pub trait Transport: Send + Sync + Debug {
    async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<ApiResponse, TransportError>;
}
