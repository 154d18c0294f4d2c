//! Configuration loading from TOML files

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use hamlog_contacts::enrich::{DEFAULT_BASE_URL, DEFAULT_MAX_CONCURRENCY, DEFAULT_TIMEOUT};
use hamlog_contacts::gate::DEFAULT_MAX_INVALID_PERCENT;

/// Global configuration for hamlog
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub output: OutputConfig,
    pub workers: WorkersConfig,
    pub enrich: EnrichSettings,
    pub gate: GateConfig,
    pub input: InputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub default_dir: PathBuf,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            default_dir: PathBuf::from("./out"),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct WorkersConfig {
    pub default: usize,
    pub partitions: usize,
}

impl Default for WorkersConfig {
    fn default() -> Self {
        let cpus = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self {
            default: cpus.min(8),
            partitions: 4,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnrichSettings {
    pub base_url: String,
    pub max_concurrency: usize,
    pub timeout_secs: u64,
}

impl Default for EnrichSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    pub max_invalid_percent: u64,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            max_invalid_percent: DEFAULT_MAX_INVALID_PERCENT,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    /// Lines containing this sign are counted
    pub watch_sign: String,
    pub table: PathBuf,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            watch_sign: "KK6JKQ".to_string(),
            table: PathBuf::from("./files/callsign_tbl_sorted"),
        }
    }
}

impl Config {
    /// Load configuration from default locations
    ///
    /// Search order:
    /// 1. ./hamlog.toml (current directory)
    /// 2. ~/.config/hamlog/config.toml
    ///
    /// If no config file found, returns default config.
    pub fn load() -> Result<Self> {
        let local_config = PathBuf::from("hamlog.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = directories::ProjectDirs::from("", "", "hamlog") {
            let user_config = config_dir.config_dir().join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        log::debug!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Load configuration from a specific file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = Config::default();
        assert_eq!(config.output.default_dir, PathBuf::from("./out"));
        assert!(config.workers.default >= 1);
        assert_eq!(config.workers.partitions, 4);
        assert_eq!(config.enrich.max_concurrency, 10);
        assert_eq!(config.enrich.timeout_secs, 30);
        assert_eq!(config.gate.max_invalid_percent, 10);
        assert_eq!(config.input.watch_sign, "KK6JKQ");
    }

    #[test]
    fn parse_config_toml() {
        let toml = r#"
[output]
default_dir = "/tmp/hamlog"

[workers]
default = 2
partitions = 16

[enrich]
base_url = "http://localhost:8080/qsos"
timeout_secs = 5

[gate]
max_invalid_percent = 25
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.output.default_dir, PathBuf::from("/tmp/hamlog"));
        assert_eq!(config.workers.default, 2);
        assert_eq!(config.workers.partitions, 16);
        assert_eq!(config.enrich.base_url, "http://localhost:8080/qsos");
        assert_eq!(config.enrich.timeout_secs, 5);
        assert_eq!(config.enrich.max_concurrency, 10);
        assert_eq!(config.gate.max_invalid_percent, 25);
        assert_eq!(config.input.table, PathBuf::from("./files/callsign_tbl_sorted"));
    }

    #[test]
    fn from_file_reports_parse_errors() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("hamlog.toml");
        std::fs::write(&path, "[workers]\ndefault = \"many\"\n").unwrap();
        let err = Config::from_file(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn from_file_missing() {
        assert!(Config::from_file(Path::new("/no/such/hamlog.toml")).is_err());
    }
}
