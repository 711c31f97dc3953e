use api_failover::config::ConnectivityConfig;
use api_failover::{init_logging, FailoverConfig, FailoverInterceptor, FileStorageConfig};
use dotenv::dotenv;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    dotenv().ok();
    init_logging();
    info!("API failover starting up");

    let config = match FailoverConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, "Invalid failover configuration");
            std::process::exit(1);
        }
    };
    let storage_config = FileStorageConfig::from_env();

    info!(
        primary = %config.primary,
        backup = %config.backup,
        cooldown_secs = config.recovery_cooldown.as_secs(),
        state_file = %storage_config.path.display(),
        "Configuration loaded"
    );

    let interceptor = match FailoverInterceptor::with_defaults(
        config,
        storage_config,
        &ConnectivityConfig::default(),
    )
    .await
    {
        Ok(interceptor) => interceptor,
        Err(e) => {
            error!(error = %e, "Could not initialize failover interceptor");
            std::process::exit(1);
        }
    };

    let snapshot = interceptor.snapshot().await;
    info!(
        active_server = %snapshot.active_server,
        last_primary_recovery_check = snapshot.last_primary_recovery_check,
        "Failover state loaded"
    );
}
