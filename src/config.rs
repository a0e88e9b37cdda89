use serde::Deserialize;

use crate::environment::DIRECT_API_URL;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    #[serde(default)]
    pub screeps: ScreepsConfig,
    #[serde(default)]
    pub environment: EnvironmentConfig,
    pub polling: PollingConfig,
    #[serde(default)]
    pub charts: ChartsConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScreepsConfig {
    pub base_url: String,
    /// Seed token; persisted storage wins when both are present.
    pub token: Option<String>,
    pub shard: Option<String>,
}

impl Default for ScreepsConfig {
    fn default() -> Self {
        Self {
            base_url: DIRECT_API_URL.to_string(),
            token: None,
            shard: None,
        }
    }
}

/// Hostname fed to the environment resolver. Empty means "no recognizable
/// hosting environment" and resolves to a direct connection.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnvironmentConfig {
    pub hostname: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    pub interval_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Max number of stats snapshots kept in the broadcast channel for /ws/stats (slow clients may lag).
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
    /// How often to log app stats (ws clients, tick totals) at INFO level.
    #[serde(default = "default_status_log_interval_secs")]
    pub status_log_interval_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_broadcast_capacity() -> usize {
    60
}

fn default_status_log_interval_secs() -> u64 {
    60
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartsConfig {
    /// Points retained per chart series; oldest evicted first.
    pub capacity: usize,
}

impl Default for ChartsConfig {
    fn default() -> Self {
        Self { capacity: 20 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    pub upstream_root: String,
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            upstream_root: DIRECT_API_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Key-value file holding token, base URL, and environment override.
    pub path: String,
}

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path)?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> anyhow::Result<Self> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(
            self.server.port > 0,
            "server.port must be between 1 and 65535, got {}",
            self.server.port
        );
        anyhow::ensure!(
            !self.screeps.base_url.is_empty(),
            "screeps.base_url must be non-empty"
        );
        anyhow::ensure!(
            self.polling.interval_secs > 0,
            "polling.interval_secs must be > 0, got {}",
            self.polling.interval_secs
        );
        anyhow::ensure!(
            self.polling.request_timeout_secs > 0,
            "polling.request_timeout_secs must be > 0, got {}",
            self.polling.request_timeout_secs
        );
        anyhow::ensure!(
            self.polling.broadcast_capacity > 0,
            "polling.broadcast_capacity must be > 0, got {}",
            self.polling.broadcast_capacity
        );
        anyhow::ensure!(
            self.polling.status_log_interval_secs > 0,
            "polling.status_log_interval_secs must be > 0, got {}",
            self.polling.status_log_interval_secs
        );
        anyhow::ensure!(
            self.charts.capacity > 0,
            "charts.capacity must be > 0, got {}",
            self.charts.capacity
        );
        anyhow::ensure!(
            !self.relay.upstream_root.is_empty(),
            "relay.upstream_root must be non-empty"
        );
        anyhow::ensure!(!self.storage.path.is_empty(), "storage.path must be non-empty");
        Ok(())
    }
}
