// src/client.rs
//! Thin API client over the failover interceptor.
//!
//! Paths are resolved against a placeholder base derived from the primary
//! profile; the interceptor rewrites the authority of every request anyway.

use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use url::Url;

use crate::error::{FailoverError, Result};
use crate::failover::FailoverInterceptor;
use crate::transport::{ApiResponse, OutgoingRequest};

#[derive(Debug, Clone)]
pub struct ApiClient {
    interceptor: Arc<FailoverInterceptor>,
    base_url: Url,
    bearer_token: Option<String>,
}

impl ApiClient {
    pub fn new(interceptor: Arc<FailoverInterceptor>) -> Result<Self> {
        let base_url = interceptor.config().primary.base_url()?;
        Ok(Self {
            interceptor,
            base_url,
            bearer_token: None,
        })
    }

    /// Attach `Authorization: Bearer <token>` to every request
    pub fn with_bearer_token(mut self, token: impl Into<String>) -> Self {
        self.bearer_token = Some(token.into());
        self
    }

    pub fn interceptor(&self) -> &Arc<FailoverInterceptor> {
        &self.interceptor
    }

    /// Absolute URL for an API path such as `/api/v1/devices`
    pub fn url(&self, path: &str) -> Result<Url> {
        if path.is_empty() {
            return Err(FailoverError::InvalidTarget("empty request path".to_string()));
        }
        Ok(self.base_url.join(path)?)
    }

    pub fn request(&self, method: Method, path: &str) -> Result<OutgoingRequest> {
        let request = OutgoingRequest::new(method, self.url(path)?)
            .with_header("Accept", "application/json")?;

        match &self.bearer_token {
            Some(token) => request.with_header("Authorization", &format!("Bearer {}", token)),
            None => Ok(request),
        }
    }

    /// Dispatch a prepared request through the interceptor
    pub async fn send(&self, request: OutgoingRequest) -> Result<ApiResponse> {
        self.interceptor.dispatch(request).await
    }

    pub async fn get(&self, path: &str) -> Result<ApiResponse> {
        self.send(self.request(Method::GET, path)?).await
    }

    /// GET `path` and decode a successful JSON body
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.get(path).await?.error_for_status()?.json()
    }

    pub async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let request = self.request(Method::POST, path)?.with_json(body)?;
        self.send(request).await
    }

    pub async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<ApiResponse> {
        let request = self.request(Method::PUT, path)?.with_json(body)?;
        self.send(request).await
    }

    pub async fn delete(&self, path: &str) -> Result<ApiResponse> {
        self.send(self.request(Method::DELETE, path)?).await
    }
}
