// src/config/mod.rs

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::error::{FailoverError, Result};


/// Connection coordinates of one API server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerProfile {
    /// URL scheme, `http` or `https`
    #[serde(default = "default_scheme")]
    pub scheme: String,

    /// Host name or IP literal
    pub host: String,

    /// TCP port
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_scheme() -> String {
    "https".to_string()
}

fn default_port() -> u16 {
    443
}

impl ServerProfile {
    pub fn new(scheme: impl Into<String>, host: impl Into<String>, port: u16) -> Self {
        Self {
            scheme: scheme.into(),
            host: host.into(),
            port,
        }
    }

    /// Root URL of this server, e.g. `https://api.example.org:443/`
    pub fn base_url(&self) -> Result<Url> {
        let url = Url::parse(&format!("{}://{}:{}/", self.scheme, self.host, self.port))?;
        Ok(url)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.scheme != "http" && self.scheme != "https" {
            return Err(FailoverError::Config(format!(
                "{} server has unsupported scheme '{}'",
                name, self.scheme
            )));
        }
        if self.host.trim().is_empty() {
            return Err(FailoverError::Config(format!(
                "{} server host must not be empty",
                name
            )));
        }
        if self.port == 0 {
            return Err(FailoverError::Config(format!(
                "{} server port must not be 0",
                name
            )));
        }
        self.base_url().map_err(|e| {
            FailoverError::Config(format!("{} server is not a valid URL: {}", name, e))
        })?;
        Ok(())
    }
}

impl fmt::Display for ServerProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
    }
}

/// Settings for the failover interceptor, fixed at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Server used while it is reachable
    #[serde(default = "default_primary")]
    pub primary: ServerProfile,

    /// Server used while the primary is unreachable
    #[serde(default = "default_backup")]
    pub backup: ServerProfile,

    /// Minimum time between two recovery probes against the primary
    #[serde(default = "default_recovery_cooldown", with = "duration_serde")]
    pub recovery_cooldown: Duration,

    /// Overall timeout of a single network attempt
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// Connect timeout of a single network attempt
    #[serde(default = "default_connect_timeout", with = "duration_serde")]
    pub connect_timeout: Duration,

    /// Key prefix to use for all keys in storage
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,

    /// Path probed by health checks, relative to the server root
    #[serde(default = "default_health_path")]
    pub health_path: String,
}

fn default_primary() -> ServerProfile {
    ServerProfile::new("https", "api.vgnc.org", 443)
}

fn default_backup() -> ServerProfile {
    ServerProfile::new("https", "swissairdry.replit.app", 443)
}

fn default_recovery_cooldown() -> Duration {
    Duration::from_secs(5 * 60)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_key_prefix() -> String {
    "failover".to_string()
}

fn default_health_path() -> String {
    "/api/v1/health".to_string()
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            primary: default_primary(),
            backup: default_backup(),
            recovery_cooldown: default_recovery_cooldown(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
            key_prefix: default_key_prefix(),
            health_path: default_health_path(),
        }
    }
}

impl FailoverConfig {
    /// Builds a config from environment variables, falling back to defaults.
    ///
    /// Recognized variables: `PRIMARY_API_SCHEME`, `PRIMARY_API_HOST`,
    /// `PRIMARY_API_PORT`, the same three with a `BACKUP_` prefix,
    /// `FAILOVER_RECOVERY_COOLDOWN_MS`, `FAILOVER_REQUEST_TIMEOUT_MS`,
    /// `FAILOVER_CONNECT_TIMEOUT_MS`, `FAILOVER_KEY_PREFIX` and
    /// `FAILOVER_HEALTH_PATH`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            primary: profile_from_lookup(&lookup, "PRIMARY", &defaults.primary)?,
            backup: profile_from_lookup(&lookup, "BACKUP", &defaults.backup)?,
            recovery_cooldown: millis_from_lookup(
                &lookup,
                "FAILOVER_RECOVERY_COOLDOWN_MS",
                defaults.recovery_cooldown,
            )?,
            request_timeout: millis_from_lookup(
                &lookup,
                "FAILOVER_REQUEST_TIMEOUT_MS",
                defaults.request_timeout,
            )?,
            connect_timeout: millis_from_lookup(
                &lookup,
                "FAILOVER_CONNECT_TIMEOUT_MS",
                defaults.connect_timeout,
            )?,
            key_prefix: lookup("FAILOVER_KEY_PREFIX").unwrap_or(defaults.key_prefix),
            health_path: lookup("FAILOVER_HEALTH_PATH").unwrap_or(defaults.health_path),
        };

        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a JSON document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)
            .map_err(|e| FailoverError::Config(format!("invalid failover config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects configurations the interceptor cannot work with
    pub fn validate(&self) -> Result<()> {
        self.primary.validate("primary")?;
        self.backup.validate("backup")?;

        if self.primary == self.backup {
            return Err(FailoverError::Config(
                "primary and backup servers must differ".to_string(),
            ));
        }
        if self.recovery_cooldown.is_zero() {
            return Err(FailoverError::Config(
                "recovery cooldown must be greater than zero".to_string(),
            ));
        }
        if self.request_timeout.is_zero() || self.connect_timeout.is_zero() {
            return Err(FailoverError::Config(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        if self.key_prefix.is_empty() {
            return Err(FailoverError::Config(
                "key prefix must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

fn profile_from_lookup<F>(lookup: &F, prefix: &str, fallback: &ServerProfile) -> Result<ServerProfile>
where
    F: Fn(&str) -> Option<String>,
{
    let scheme = lookup(&format!("{}_API_SCHEME", prefix)).unwrap_or_else(|| fallback.scheme.clone());
    let host = lookup(&format!("{}_API_HOST", prefix)).unwrap_or_else(|| fallback.host.clone());
    let port = match lookup(&format!("{}_API_PORT", prefix)) {
        Some(raw) => raw.trim().parse::<u16>().map_err(|e| {
            FailoverError::Config(format!("{}_API_PORT '{}' is not a port: {}", prefix, raw, e))
        })?,
        None => fallback.port,
    };
    Ok(ServerProfile::new(scheme, host, port))
}

fn millis_from_lookup<F>(lookup: &F, name: &str, fallback: Duration) -> Result<Duration>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) => raw
            .trim()
            .parse::<u64>()
            .map(Duration::from_millis)
            .map_err(|e| FailoverError::Config(format!("{} '{}' is not a number: {}", name, raw, e))),
        None => Ok(fallback),
    }
}

/// Configuration for the durable JSON-file storage backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileStorageConfig {
    /// Location of the state file
    #[serde(default = "default_state_path")]
    pub path: PathBuf,
}

fn default_state_path() -> PathBuf {
    PathBuf::from("failover_state.json")
}

impl Default for FileStorageConfig {
    fn default() -> Self {
        Self {
            path: default_state_path(),
        }
    }
}

impl FileStorageConfig {
    /// Reads `FAILOVER_STATE_FILE`, defaulting to `failover_state.json`
    pub fn from_env() -> Self {
        env::var("FAILOVER_STATE_FILE")
            .map(|path| Self {
                path: PathBuf::from(path),
            })
            .unwrap_or_default()
    }
}

/// Configuration for in-memory storage backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InMemoryConfig {
    /// Maximum number of entries to store
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

fn default_max_entries() -> usize {
    1_000
}

impl Default for InMemoryConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
        }
    }
}

/// Configuration for the background connectivity monitor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectivityConfig {
    /// Address the route probe connects its UDP socket to
    #[serde(default = "default_probe_address")]
    pub probe_address: String,

    /// How often the monitor re-runs the probe
    #[serde(default = "default_check_interval", with = "duration_serde")]
    pub check_interval: Duration,

    /// Timeout for a single probe run
    #[serde(default = "default_check_timeout", with = "duration_serde")]
    pub check_timeout: Duration,
}

fn default_probe_address() -> String {
    "1.1.1.1:53".to_string()
}

fn default_check_interval() -> Duration {
    Duration::from_secs(5)
}

fn default_check_timeout() -> Duration {
    Duration::from_secs(1)
}

impl Default for ConnectivityConfig {
    fn default() -> Self {
        Self {
            probe_address: default_probe_address(),
            check_interval: default_check_interval(),
            check_timeout: default_check_timeout(),
        }
    }
}

// Helper module to serialize/deserialize Duration with serde
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}
