use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::task;
use tokio::time;
use tracing::{debug, info, warn};

use super::ConnectivityProbe;
use crate::config::ConnectivityConfig;

/// Background connectivity checker.
///
/// Re-runs a probe at a fixed interval and caches the answer, so a dispatch
/// only pays for an atomic load.
#[derive(Debug)]
pub struct ConnectivityMonitor {
    /// Last probe result
    is_online: Arc<AtomicBool>,
    /// Probe run by the background task
    probe: Arc<dyn ConnectivityProbe>,
    /// Configuration for the checks
    config: ConnectivityConfig,
    /// Cancel flag for the background task
    cancel_flag: Arc<AtomicBool>,
}

impl ConnectivityMonitor {
    /// Create a new monitor around `probe`
    pub fn new(probe: Arc<dyn ConnectivityProbe>, config: ConnectivityConfig) -> Self {
        Self {
            is_online: Arc::new(AtomicBool::new(true)), // Assume online until told otherwise
            probe,
            config,
            cancel_flag: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Start the background task
    pub fn start(&self) -> task::JoinHandle<()> {
        let probe = Arc::clone(&self.probe);
        let is_online = Arc::clone(&self.is_online);
        let interval = self.config.check_interval;
        let timeout = self.config.check_timeout;
        let cancel_flag = Arc::clone(&self.cancel_flag);

        task::spawn(async move {
            let mut interval_timer = time::interval(interval);

            loop {
                if cancel_flag.load(Ordering::SeqCst) {
                    break;
                }

                interval_timer.tick().await;

                let online = run_probe(probe.as_ref(), timeout).await;
                record(&is_online, online);
            }

            debug!("Connectivity monitor task stopped");
        })
    }

    /// Probe once right now and update the cached answer
    pub async fn check_now(&self) -> bool {
        let online = run_probe(self.probe.as_ref(), self.config.check_timeout).await;
        record(&self.is_online, online);
        online
    }

    /// Stop the background task after its current tick; dropping the monitor does the same
    pub fn stop(&self) {
        self.cancel_flag.store(true, Ordering::SeqCst);
    }

    /// Last known connectivity
    pub fn is_online(&self) -> bool {
        self.is_online.load(Ordering::SeqCst)
    }
}

async fn run_probe(probe: &dyn ConnectivityProbe, timeout: std::time::Duration) -> bool {
    match time::timeout(timeout, probe.is_network_available()).await {
        Ok(result) => result,
        Err(_) => {
            warn!("Connectivity probe timed out after {:?}", timeout);
            false
        }
    }
}

fn record(is_online: &AtomicBool, online: bool) {
    let previous = is_online.swap(online, Ordering::SeqCst);
    if previous != online {
        if online {
            info!("Network connectivity restored");
        } else {
            warn!("Network connectivity lost");
        }
    }
}

impl Drop for ConnectivityMonitor {
    fn drop(&mut self) {
        self.stop();
    }
}

#[async_trait]
impl ConnectivityProbe for ConnectivityMonitor {
    async fn is_network_available(&self) -> bool {
        self.is_online()
    }
}
