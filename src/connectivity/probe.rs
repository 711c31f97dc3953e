use async_trait::async_trait;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::UdpSocket;
use tracing::debug;

use super::ConnectivityProbe;
use crate::config::ConnectivityConfig;
use crate::error::{FailoverError, Result};

/// Probe that asks the OS routing table for a path to a public address.
///
/// Connecting a UDP socket sends nothing on the wire; it only succeeds when
/// some interface can route to `target`.
#[derive(Debug, Clone)]
pub struct RouteProbe {
    target: SocketAddr,
}

impl RouteProbe {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }

    pub fn from_config(config: &ConnectivityConfig) -> Result<Self> {
        let target = config.probe_address.parse::<SocketAddr>().map_err(|e| {
            FailoverError::Config(format!(
                "probe address '{}' is not a socket address: {}",
                config.probe_address, e
            ))
        })?;
        Ok(Self::new(target))
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl Default for RouteProbe {
    fn default() -> Self {
        Self::new(SocketAddr::from(([1, 1, 1, 1], 53)))
    }
}

#[async_trait]
impl ConnectivityProbe for RouteProbe {
    async fn is_network_available(&self) -> bool {
        let bind_addr: SocketAddr = if self.target.is_ipv6() {
            SocketAddr::from(([0u16; 8], 0))
        } else {
            SocketAddr::from(([0u8; 4], 0))
        };

        let socket = match UdpSocket::bind(bind_addr).await {
            Ok(socket) => socket,
            Err(e) => {
                debug!(error = %e, "Cannot bind probe socket");
                return false;
            }
        };

        match socket.connect(self.target).await {
            Ok(()) => true,
            Err(e) => {
                debug!(target = %self.target, error = %e, "No route to probe target");
                false
            }
        }
    }
}

/// Probe whose answer is set from outside, e.g. by a platform callback
#[derive(Debug)]
pub struct StaticProbe {
    online: AtomicBool,
}

impl StaticProbe {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl Default for StaticProbe {
    fn default() -> Self {
        Self::new(true)
    }
}

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn is_network_available(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
