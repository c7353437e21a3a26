//! Configuration for a star node.
//!
//! Resolution order: explicit path → $STARNODE_CONFIG → ./starnode.toml → defaults.
//! `STARNODE_<SECTION>__<FIELD>` environment variables are applied last.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StarConfig {
    pub probe: ProbeConfig,
    pub network: NetworkConfig,
    pub files: FilesConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Seconds between latency probe rounds.
    pub interval_secs: u64,
    /// How long to wait for each pong.
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Upper bound on any single blocking wait, so workers notice shutdown.
    pub idle_tick_ms: u64,
    /// Receive buffer size in bytes.
    pub recv_buffer: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesConfig {
    /// Where received FILE packets are written.
    pub storage_path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Directory holding `node-<name>.log`.
    pub dir: PathBuf,
}

// ── Defaults ──────────────────────────────────────────────────────────────────

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            timeout_ms: 1000,
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            idle_tick_ms: 50,
            recv_buffer: 65535,
        }
    }
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            storage_path: PathBuf::from("received"),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
        }
    }
}

impl ProbeConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl NetworkConfig {
    pub fn idle_tick(&self) -> Duration {
        Duration::from_millis(self.idle_tick_ms.max(1))
    }
}

impl LogConfig {
    /// Log file for the node with this display name.
    pub fn file_path(&self, name: &str) -> PathBuf {
        self.dir.join(log_file_name(name))
    }
}

pub fn log_file_name(name: &str) -> String {
    format!("node-{name}.log")
}

// ── Errors ────────────────────────────────────────────────────────────────────

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {0}: {1}")]
    ReadFailed(PathBuf, std::io::Error),
    #[error("failed to parse {0}: {1}")]
    ParseFailed(PathBuf, toml::de::Error),
}

// ── Loading ───────────────────────────────────────────────────────────────────

impl StarConfig {
    /// Load config from `explicit` if given, otherwise from the default
    /// location, then apply env overrides.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit.map(Path::to_path_buf).unwrap_or_else(Self::file_path);
        let mut config = if explicit.is_some() || path.exists() {
            Self::from_file(&path)?
        } else {
            StarConfig::default()
        };
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(path.to_path_buf(), e))?;
        toml::from_str(&text).map_err(|e| ConfigError::ParseFailed(path.to_path_buf(), e))
    }

    /// Default config file path.
    pub fn file_path() -> PathBuf {
        std::env::var("STARNODE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("starnode.toml"))
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply `STARNODE_*` overrides from `lookup`. Unparseable values are ignored.
    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(v) = lookup("STARNODE_PROBE__INTERVAL_SECS").and_then(|v| v.parse().ok()) {
            self.probe.interval_secs = v;
        }
        if let Some(v) = lookup("STARNODE_PROBE__TIMEOUT_MS").and_then(|v| v.parse().ok()) {
            self.probe.timeout_ms = v;
        }
        if let Some(v) = lookup("STARNODE_NETWORK__IDLE_TICK_MS").and_then(|v| v.parse().ok()) {
            self.network.idle_tick_ms = v;
        }
        if let Some(v) = lookup("STARNODE_NETWORK__RECV_BUFFER").and_then(|v| v.parse().ok()) {
            self.network.recv_buffer = v;
        }
        if let Some(v) = lookup("STARNODE_FILES__STORAGE_PATH") {
            self.files.storage_path = PathBuf::from(v);
        }
        if let Some(v) = lookup("STARNODE_LOG__DIR") {
            self.log.dir = PathBuf::from(v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = StarConfig::default();
        assert_eq!(config.probe.interval(), Duration::from_secs(5));
        assert_eq!(config.probe.timeout(), Duration::from_millis(1000));
        assert_eq!(config.network.recv_buffer, 65535);
        assert_eq!(config.log.file_path("alice"), PathBuf::from("./node-alice.log"));
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let config: StarConfig = toml::from_str("[probe]\ninterval_secs = 2\n").unwrap();
        assert_eq!(config.probe.interval_secs, 2);
        assert_eq!(config.probe.timeout_ms, 1000);
        assert_eq!(config.files.storage_path, PathBuf::from("received"));
    }

    #[test]
    fn overrides_apply_and_skip_garbage() {
        let mut config = StarConfig::default();
        config.apply_overrides(|key| match key {
            "STARNODE_PROBE__TIMEOUT_MS" => Some("250".into()),
            "STARNODE_PROBE__INTERVAL_SECS" => Some("soon".into()),
            "STARNODE_LOG__DIR" => Some("/var/log/star".into()),
            _ => None,
        });
        assert_eq!(config.probe.timeout_ms, 250);
        assert_eq!(config.probe.interval_secs, 5);
        assert_eq!(config.log.dir, PathBuf::from("/var/log/star"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let path = std::env::temp_dir().join(format!(
            "starnode-config-missing-{}.toml",
            std::process::id()
        ));
        assert!(matches!(
            StarConfig::load(Some(&path)),
            Err(ConfigError::ReadFailed(..))
        ));
    }

    #[test]
    fn bad_toml_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!(
            "starnode-config-bad-{}.toml",
            std::process::id()
        ));
        std::fs::write(&path, "probe = [").unwrap();
        assert!(matches!(
            StarConfig::from_file(&path),
            Err(ConfigError::ParseFailed(..))
        ));
        let _ = std::fs::remove_file(&path);
    }
}
