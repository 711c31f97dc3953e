// src/test_utils.rs

use async_trait::async_trait;
use reqwest::StatusCode;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use url::Url;

use crate::clock::ManualClock;
use crate::config::{FailoverConfig, ServerProfile};
use crate::connectivity::StaticProbe;
use crate::error::{FailoverError, Result, StorageError, TransportError, TransportErrorKind};
use crate::failover::FailoverInterceptor;
use crate::state::{ServerKind, StateStore, StoredState};
use crate::storage::{MemoryStorage, StorageBackend};
use crate::transport::{ApiResponse, OutgoingRequest, Transport};

pub const PRIMARY_HOST: &str = "primary.test";
pub const BACKUP_HOST: &str = "backup.test";

/// Epoch milliseconds the manual clock starts at in interceptor tests
pub const T0: i64 = 1_700_000_000_000;

/// What a mock host does when it receives a request
#[derive(Debug, Clone)]
pub enum MockBehavior {
    /// Answer with this status; the body is the host name
    Respond(u16),
    /// Fail below the HTTP layer
    Fail(TransportErrorKind),
    /// Never answer
    Hang,
}

/// Transport whose behaviour is scripted per host and which records every call
#[derive(Debug, Default)]
pub struct MockTransport {
    behaviors: Mutex<HashMap<String, MockBehavior>>,
    calls: Mutex<Vec<OutgoingRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_behavior(&self, host: &str, behavior: MockBehavior) {
        self.behaviors
            .lock()
            .unwrap()
            .insert(host.to_string(), behavior);
    }

    /// Every request seen so far, in order
    pub fn calls(&self) -> Vec<OutgoingRequest> {
        self.calls.lock().unwrap().clone()
    }

    /// Host names of every request seen so far, in order
    pub fn hosts(&self) -> Vec<String> {
        self.calls()
            .iter()
            .map(|request| request.url.host_str().unwrap_or_default().to_string())
            .collect()
    }

    pub fn calls_to(&self, host: &str) -> usize {
        self.hosts().iter().filter(|h| h.as_str() == host).count()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn execute(
        &self,
        request: OutgoingRequest,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let host = request.url.host_str().unwrap_or_default().to_string();
        self.calls.lock().unwrap().push(request);

        let behavior = self
            .behaviors
            .lock()
            .unwrap()
            .get(&host)
            .cloned()
            .unwrap_or(MockBehavior::Respond(200));

        match behavior {
            MockBehavior::Respond(status) => {
                let status = StatusCode::from_u16(status).unwrap();
                Ok(ApiResponse::new(status, host.into_bytes()))
            }
            MockBehavior::Fail(kind) => Err(TransportError::new(kind, format!("{} failed", host))),
            MockBehavior::Hang => {
                futures::future::pending::<()>().await;
                unreachable!("pending future resolved")
            }
        }
    }
}

/// Memory backend whose reads or writes fail on demand
#[derive(Debug, Default)]
pub struct FaultyStorage {
    inner: MemoryStorage,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FaultyStorage {
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }
}

fn unavailable(what: &str) -> FailoverError {
    FailoverError::Storage(StorageError::Unavailable(format!("simulated {} failure", what)))
}

#[async_trait]
impl StorageBackend for FaultyStorage {
    type Config = ();

    async fn new(_config: Self::Config) -> Result<Self> {
        Ok(Self::default())
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(unavailable("read"));
        }
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("write"));
        }
        self.inner.set(key, value).await
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        self.inner.exists(key).await
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(unavailable("write"));
        }
        self.inner.delete(key).await
    }
}

/// Everything an interceptor test needs a handle on
pub struct Harness {
    pub transport: Arc<MockTransport>,
    pub probe: Arc<StaticProbe>,
    pub state: Arc<StoredState<FaultyStorage>>,
    pub clock: ManualClock,
    pub interceptor: FailoverInterceptor,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: FailoverConfig) -> Self {
        let transport = Arc::new(MockTransport::new());
        let probe = Arc::new(StaticProbe::new(true));
        let state = Arc::new(StoredState::new(FaultyStorage::default(), &config.key_prefix));
        let clock = ManualClock::new(T0);

        let interceptor = FailoverInterceptor::new(
            config,
            transport.clone(),
            probe.clone(),
            state.clone(),
        )
        .unwrap()
        .with_clock(Arc::new(clock.clone()));

        Self {
            transport,
            probe,
            state,
            clock,
            interceptor,
        }
    }

    /// Puts the persisted state into the given shape before a test
    pub async fn seed(&self, active: ServerKind, last_check: i64) {
        self.state.set_active_server(active).await.unwrap();
        self.state
            .set_last_primary_recovery_check(last_check)
            .await
            .unwrap();
    }
}

pub fn test_config() -> FailoverConfig {
    FailoverConfig {
        primary: ServerProfile::new("https", PRIMARY_HOST, 443),
        backup: ServerProfile::new("https", BACKUP_HOST, 8443),
        recovery_cooldown: Duration::from_secs(5 * 60),
        ..FailoverConfig::default()
    }
}

/// A request as the application would issue it, aimed at a placeholder host
pub fn api_request(path: &str) -> OutgoingRequest {
    let url = Url::parse("https://placeholder.invalid/")
        .unwrap()
        .join(path)
        .unwrap();
    OutgoingRequest::get(url)
}

/// Serves every connection with a fixed HTTP response
pub async fn spawn_http_server(status: u16, body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = vec![0u8; 4096];
                let mut seen = Vec::new();
                // Read until the end of the request head
                while let Ok(n) = socket.read(&mut buf).await {
                    if n == 0 {
                        break;
                    }
                    seen.extend_from_slice(&buf[..n]);
                    if seen.windows(4).any(|w| w == b"\r\n\r\n") {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {} Status\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// Accepts connections and never answers
pub async fn spawn_silent_server() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            held.push(socket);
        }
    });

    addr
}

/// A local port with nothing listening on it
pub async fn refused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    port
}
