// src/failover/interceptor.rs

use reqwest::StatusCode;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::{ConnectivityConfig, FailoverConfig, FileStorageConfig, ServerProfile};
use crate::connectivity::{ConnectivityProbe, RouteProbe};
use crate::error::{FailoverError, Result, TransportError};
use crate::failover_event;
use crate::state::{FailoverSnapshot, ServerKind, StateStore, StoredState};
use crate::storage::FileStorage;
use crate::transport::{ApiResponse, OutgoingRequest, ReqwestTransport, Transport};

/// Request dispatcher that switches between the primary and backup server.
///
/// Cheap to share behind an `Arc`; concurrent dispatches need no coordination
/// beyond the per-operation atomicity of the state store. Dropping a dispatch
/// future cancels the attempt in flight and nothing further happens.
#[derive(Debug, Clone)]
pub struct FailoverInterceptor {
    config: FailoverConfig,
    transport: Arc<dyn Transport>,
    probe: Arc<dyn ConnectivityProbe>,
    state: Arc<dyn StateStore>,
    clock: Arc<dyn Clock>,
}

impl FailoverInterceptor {
    /// Create an interceptor from its collaborators; `config` is validated
    pub fn new(
        config: FailoverConfig,
        transport: Arc<dyn Transport>,
        probe: Arc<dyn ConnectivityProbe>,
        state: Arc<dyn StateStore>,
    ) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            config,
            transport,
            probe,
            state,
            clock: Arc::new(SystemClock),
        })
    }

    /// Replace the wall clock used for cooldown decisions
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Production wiring: reqwest transport, route probe, state in a JSON file
    pub async fn with_defaults(
        config: FailoverConfig,
        storage_config: FileStorageConfig,
        connectivity: &ConnectivityConfig,
    ) -> Result<Self> {
        let transport = Arc::new(ReqwestTransport::new(&config)?);
        let probe = Arc::new(RouteProbe::from_config(connectivity)?);
        let storage = FileStorage::open(storage_config).await?;
        let state = Arc::new(StoredState::new(storage, &config.key_prefix));

        Self::new(config, transport, probe, state)
    }

    pub fn config(&self) -> &FailoverConfig {
        &self.config
    }

    /// The shared state store
    pub fn state(&self) -> &Arc<dyn StateStore> {
        &self.state
    }

    /// Profile configured for `server`
    pub fn profile(&self, server: ServerKind) -> &ServerProfile {
        match server {
            ServerKind::Primary => &self.config.primary,
            ServerKind::Backup => &self.config.backup,
        }
    }

    /// Persisted state as the next dispatch would see it
    pub async fn snapshot(&self) -> FailoverSnapshot {
        self.state.snapshot().await
    }

    /// Send `request` to the active server, failing over as needed.
    ///
    /// Returns any HTTP response as-is, whatever its status. Errors are
    /// `NoConnectivity` when the device is offline and `Transport` for the
    /// attempt that is deemed final.
    pub async fn dispatch(&self, request: OutgoingRequest) -> Result<ApiResponse> {
        let request_id = Uuid::new_v4();
        let span = info_span!(
            "dispatch",
            %request_id,
            method = %request.method,
            path = %request.url.path()
        );

        self.dispatch_inner(request).instrument(span).await
    }

    async fn dispatch_inner(&self, request: OutgoingRequest) -> Result<ApiResponse> {
        if !self.probe.is_network_available().await {
            warn!("Network unavailable, request not attempted");
            return Err(FailoverError::NoConnectivity);
        }

        let active = self.state.active_server().await;
        let target = self.target_for(active, &request)?;

        let failure = match self.execute(active, target).await {
            Ok(response) => return Ok(response),
            Err(err) => err,
        };

        if !failure.is_transport_failure() {
            debug!(server = %active, error = %failure, "Attempt ended without failover");
            return Err(FailoverError::Transport(failure));
        }

        warn!(server = %active, error = %failure, "Connection failure");

        match active {
            ServerKind::Primary => self.fail_over_to_backup(&request).await,
            ServerKind::Backup => self.try_recover_primary(&request, failure).await,
        }
    }

    /// Primary is down: switch unconditionally and make the single backup attempt
    async fn fail_over_to_backup(&self, request: &OutgoingRequest) -> Result<ApiResponse> {
        self.persist_active(ServerKind::Primary, ServerKind::Backup, "primary unreachable")
            .await;

        let target = self.target_for(ServerKind::Backup, request)?;
        self.execute(ServerKind::Backup, target)
            .await
            .map_err(FailoverError::Transport)
    }

    /// Backup is down too: probe the primary if the cooldown allows it
    async fn try_recover_primary(
        &self,
        request: &OutgoingRequest,
        backup_failure: TransportError,
    ) -> Result<ApiResponse> {
        let now = self.clock.now_millis();
        let last_check = self.state.last_primary_recovery_check().await;

        if !self.cooldown_elapsed(now, last_check) {
            debug!(
                since_last_check_ms = now.saturating_sub(last_check),
                cooldown_ms = self.config.recovery_cooldown.as_millis() as u64,
                "Recovery probe skipped, cooldown active"
            );
            return Err(FailoverError::Transport(backup_failure));
        }

        // Stamp before probing so a hanging or failing probe still counts
        if let Err(e) = self.state.set_last_primary_recovery_check(now).await {
            warn!(error = %e, "Could not persist recovery check time");
        }

        info!("Probing primary server for recovery");
        let target = self.target_for(ServerKind::Primary, request)?;

        match self.execute(ServerKind::Primary, target).await {
            Ok(response) => {
                self.persist_active(ServerKind::Backup, ServerKind::Primary, "primary answered")
                    .await;
                Ok(response)
            }
            Err(probe_failure) if probe_failure.is_transport_failure() => {
                warn!(error = %probe_failure, "Primary server still unreachable");
                Err(FailoverError::Transport(backup_failure))
            }
            Err(probe_failure) => Err(FailoverError::Transport(probe_failure)),
        }
    }

    /// True when strictly more than the cooldown has passed since `last_check`.
    ///
    /// A check time in the future gives a negative distance and keeps the
    /// cooldown active.
    fn cooldown_elapsed(&self, now: i64, last_check: i64) -> bool {
        let cooldown_ms = i64::try_from(self.config.recovery_cooldown.as_millis()).unwrap_or(i64::MAX);
        now.saturating_sub(last_check) > cooldown_ms
    }

    /// The active server is advisory, so a failed write is logged and the dispatch goes on
    async fn persist_active(&self, from: ServerKind, to: ServerKind, reason: &str) {
        match self.state.set_active_server(to).await {
            Ok(()) => failover_event!(from, to, reason),
            Err(e) => warn!(server = %to, error = %e, "Could not persist active server"),
        }
    }

    fn target_for(&self, server: ServerKind, request: &OutgoingRequest) -> Result<OutgoingRequest> {
        request.retarget(self.profile(server))
    }

    async fn execute(
        &self,
        server: ServerKind,
        request: OutgoingRequest,
    ) -> std::result::Result<ApiResponse, TransportError> {
        let started = Instant::now();
        let host = request.url.host_str().unwrap_or_default().to_string();

        let result = self.transport.execute(request).await;

        match &result {
            Ok(response) => debug!(
                server = %server,
                host = %host,
                status = response.status.as_u16(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Attempt answered"
            ),
            Err(e) => debug!(
                server = %server,
                host = %host,
                error = %e,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Attempt failed"
            ),
        }

        result
    }

    /// Make `server` the active server by hand.
    ///
    /// The backup is taken unconditionally. The primary is only taken once
    /// its health check answers 2xx; on any other outcome the state is left
    /// as it was and the error is returned.
    pub async fn switch_to(&self, server: ServerKind) -> Result<()> {
        if server == ServerKind::Primary {
            let status = self.check_server(ServerKind::Primary).await?;
            if !status.is_success() {
                warn!(status = status.as_u16(), "Primary not healthy, switch refused");
                return Err(FailoverError::Upstream {
                    status: status.as_u16(),
                    body: Vec::new(),
                });
            }
        }

        let previous = self.state.active_server().await;
        self.state.set_active_server(server).await?;
        failover_event!(previous, server, "manual switch");
        Ok(())
    }

    /// GET the configured health path on `server`, bypassing failover.
    ///
    /// Leaves the persisted state untouched.
    pub async fn check_server(&self, server: ServerKind) -> Result<StatusCode> {
        let url = self
            .profile(server)
            .base_url()?
            .join(&self.config.health_path)?;

        let response = self
            .execute(server, OutgoingRequest::get(url))
            .await
            .map_err(FailoverError::Transport)?;

        Ok(response.status)
    }
}
