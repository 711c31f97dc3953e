// src/bin/failover_cli.rs

use chrono::{TimeZone, Utc};
use prettytable::{row, Table};
use reqwest::Method;
use std::sync::Arc;
use structopt::StructOpt;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use api_failover::config::ConnectivityConfig;
use api_failover::{
    ApiClient, FailoverConfig, FailoverInterceptor, FailoverSnapshot, FileStorageConfig,
    ServerKind,
};

#[derive(Debug, StructOpt)]
#[structopt(
    name = "failover_cli",
    about = "Send API requests through the primary/backup failover and inspect its state"
)]
struct Opt {
    /// Verbosity level
    #[structopt(short, long, parse(from_occurrences), global = true)]
    verbose: usize,

    /// Disable logs
    #[structopt(long, global = true)]
    disable_logs: bool,

    #[structopt(subcommand)]
    command: Command,
}

#[derive(Debug, StructOpt)]
enum Command {
    /// Send one request through the failover interceptor
    Request {
        /// API path, e.g. /api/v1/devices
        path: String,

        /// HTTP method
        #[structopt(short, long, default_value = "GET", parse(try_from_str = parse_method))]
        method: Method,

        /// JSON body for POST and PUT
        #[structopt(short, long)]
        data: Option<String>,
    },
    /// Show the persisted failover state
    Status,
    /// Forget the persisted state; the next request goes to the primary
    Reset,
    /// Call the health endpoint of both servers without touching the state
    Check,
    /// Make a server active by hand; the primary must pass its health check
    Switch {
        /// Server to make active
        #[structopt(possible_values = &["primary", "backup"])]
        server: ServerKind,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();
    let opt = Opt::from_args();

    let log_level = if opt.disable_logs {
        "error"
    } else {
        match opt.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(EnvFilter::new(format!(
            "failover_cli={},api_failover={}",
            log_level, log_level
        )))
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = FailoverConfig::from_env()?;
    let storage_config = FileStorageConfig::from_env();
    info!(
        primary = %config.primary,
        backup = %config.backup,
        state_file = %storage_config.path.display(),
        "Starting failover CLI"
    );

    let interceptor = Arc::new(
        FailoverInterceptor::with_defaults(config, storage_config, &ConnectivityConfig::default())
            .await?,
    );

    match opt.command {
        Command::Request { path, method, data } => {
            let client = ApiClient::new(Arc::clone(&interceptor))?;
            let mut request = client.request(method, &path)?;
            if let Some(data) = data {
                let body: serde_json::Value = serde_json::from_str(&data)?;
                request = request.with_json(&body)?;
            }

            match client.send(request).await {
                Ok(response) => {
                    println!("{}", response.status);
                    println!("{}", response.text());
                }
                Err(e) => {
                    match e.as_transport() {
                        Some(transport) => {
                            error!(kind = %transport.kind, error = %transport.message, "Request failed")
                        }
                        None => error!(error = %e, "Request failed"),
                    }
                    print_status(&interceptor.snapshot().await);
                    return Err(e.into());
                }
            }
            print_status(&interceptor.snapshot().await);
        }
        Command::Status => {
            print_status(&interceptor.snapshot().await);
        }
        Command::Reset => {
            interceptor.state().reset().await?;
            info!("Failover state reset");
            print_status(&interceptor.snapshot().await);
        }
        Command::Check => {
            let mut table = Table::new();
            table.add_row(row!["Server", "Address", "Health"]);
            for server in [ServerKind::Primary, ServerKind::Backup] {
                let health = match interceptor.check_server(server).await {
                    Ok(status) => status.to_string(),
                    Err(e) => e.to_string(),
                };
                table.add_row(row![server, interceptor.profile(server), health]);
            }
            table.printstd();
        }
        Command::Switch { server } => {
            interceptor.switch_to(server).await?;
            info!(server = %server, "Active server switched by hand");
            print_status(&interceptor.snapshot().await);
        }
    }

    Ok(())
}

fn parse_method(raw: &str) -> Result<Method, String> {
    raw.to_ascii_uppercase()
        .parse::<Method>()
        .map_err(|e| format!("invalid method '{}': {}", raw, e))
}

fn print_status(snapshot: &FailoverSnapshot) {
    let last_check = match snapshot.last_primary_recovery_check {
        0 => "never".to_string(),
        millis => Utc
            .timestamp_millis_opt(millis)
            .single()
            .map(|at| at.to_rfc3339())
            .unwrap_or_else(|| millis.to_string()),
    };

    let mut table = Table::new();
    table.add_row(row!["Active server", snapshot.active_server]);
    table.add_row(row!["Last primary recovery check", last_check]);
    table.printstd();
}
