/// Top-level configuration loaded from sleepwatch.toml.
///
/// Every field has a default matching the fixed constants the daemon was
/// originally deployed with, so it runs correctly with no config file at all.
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct MonitorConfig {
    pub pins: PinsConfig,
    pub poll: PollConfig,
    pub shutdown: ShutdownConfig,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PinsConfig {
    /// Input pin driven high by the Sleepy Pi to request a shutdown (BCM).
    pub shutdown_request: u8,
    /// Output pin asserted high once at startup to signal liveness (BCM).
    pub liveness: u8,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    pub interval_ms: u64,
}

#[derive(Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ShutdownConfig {
    pub command: String,
    pub args: Vec<String>,
}

// --- Default implementations ---

impl Default for PinsConfig {
    fn default() -> Self {
        Self {
            shutdown_request: 24,
            liveness: 25,
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_ms: 500 }
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            command: "sudo".to_string(),
            args: vec![
                "shutdown".to_string(),
                "-h".to_string(),
                "now".to_string(),
            ],
        }
    }
}

/// Errors that can occur while loading the config file.
#[derive(Debug)]
pub enum ConfigError {
    /// The file exists but could not be read.
    Read { source: std::io::Error },
    /// The file was read but is not valid TOML for this schema.
    Parse { source: toml::de::Error },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Read { source } => {
                write!(f, "failed to read config file: {}", source)
            }
            ConfigError::Parse { source } => {
                write!(f, "failed to parse config file: {}", source)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Read { source } => Some(source),
            ConfigError::Parse { source } => Some(source),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from `path`.
    ///
    /// A missing file is not an error: the daemon predates having a config
    /// surface and must keep running on defaults alone.
    pub fn load(path: &Path) -> Result<MonitorConfig, ConfigError> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "no config file, using defaults");
                return Ok(MonitorConfig::default());
            }
            Err(e) => return Err(ConfigError::Read { source: e }),
        };
        toml::from_str(&contents).map_err(|e| ConfigError::Parse { source: e })
    }
}
