use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

pub const DEFAULT_PORT: u16 = 4000;
pub const DEFAULT_BIND: &str = "127.0.0.1";
/// Sweep cadence floor — one minute, matching cron "minute" granularity.
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 60;
/// Fan-out channel capacity per process.
pub const BROADCAST_CAPACITY: usize = 256;

/// Top-level config (newsroom.toml + NEWSROOM_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewsroomConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind: DEFAULT_BIND.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

/// Publication sweeper tuning. The interval is the only knob; it bounds
/// worst-case publication latency to one interval plus processing time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}
fn default_sweep_interval() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}
fn default_db_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.newsroom/newsroom.db", home)
}

impl NewsroomConfig {
    /// Load config from a TOML file with NEWSROOM_* env var overrides.
    ///
    /// Checks in order:
    ///   1. Explicit path argument
    ///   2. ~/.newsroom/newsroom.toml
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path
            .map(String::from)
            .unwrap_or_else(default_config_path);

        let config: NewsroomConfig = Figment::new()
            .merge(Toml::file(&path))
            .merge(Env::prefixed("NEWSROOM_").split("_"))
            .extract()
            .map_err(|e| crate::error::NewsroomError::Config(e.to_string()))?;

        Ok(config)
    }
}

fn default_config_path() -> String {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    format!("{}/.newsroom/newsroom.toml", home)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = NewsroomConfig::default();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.scheduler.sweep_interval_secs, 60);
        assert!(cfg.database.path.ends_with("newsroom.db"));
    }

    #[test]
    fn partial_toml_fills_missing_sections() {
        let cfg: NewsroomConfig = figment::Figment::new()
            .merge(figment::providers::Toml::string(
                "[scheduler]\nsweep_interval_secs = 5\n",
            ))
            .extract()
            .unwrap();
        assert_eq!(cfg.scheduler.sweep_interval_secs, 5);
        assert_eq!(cfg.server.bind, DEFAULT_BIND);
    }
}
