//! Configuration file loading.
//!
//! The file is TOML with one table per side:
//!
//! ```toml
//! [daemon]
//! begin_cmd = "notify-send 'Timer started'"
//! done_cmd = ["paplay", "/usr/share/sounds/freedesktop/stereo/complete.oga"]
//! end_cmd = "notify-send 'Timer over'"
//!
//! [client]
//! default_duration = "25m"
//! ```
//!
//! A missing file is not an error; every setting has a default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::daemon::{HookCommand, HookSet, DEFAULT_SOCKET_PATH};

/// Config file location relative to the user config directory.
const CONFIG_FILE: &str = "pomo/config.toml";

/// Default duration spec used by `start` without `--duration`.
fn default_duration() -> String {
    "25m".to_string()
}

// ============================================================================
// ConfigError
// ============================================================================

/// Errors that can occur while loading the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file exists but could not be read.
    #[error("failed to read config {path:?}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema.
    #[error("invalid config {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

// ============================================================================
// Config
// ============================================================================

/// Daemon-side settings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Run when a timer starts
    pub begin_cmd: Option<HookCommand>,
    /// Run when a timer reaches zero
    pub done_cmd: Option<HookCommand>,
    /// Run when a timer ends for any reason
    pub end_cmd: Option<HookCommand>,
    /// Socket path override
    pub socket: Option<PathBuf>,
}

impl DaemonConfig {
    /// Builds the hook set handed to every timer.
    pub fn hooks(&self) -> HookSet {
        HookSet {
            begin: self.begin_cmd.clone(),
            done: self.done_cmd.clone(),
            end: self.end_cmd.clone(),
        }
    }
}

/// Client-side settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Duration spec used when `start` is given none
    #[serde(default = "default_duration")]
    pub default_duration: String,
    /// Socket path override
    #[serde(default)]
    pub socket: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            default_duration: default_duration(),
            socket: None,
        }
    }
}

/// Whole configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub daemon: DaemonConfig,
    #[serde(default)]
    pub client: ClientConfig,
}

impl Config {
    /// Returns the default config file path, if a config directory exists.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(CONFIG_FILE))
    }

    /// Loads the configuration from `path`, or defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("No config at {:?}, using defaults", path);
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Loads from `path` if given, else from the default location.
    ///
    /// # Errors
    ///
    /// See [`Config::load`].
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path.map(Path::to_path_buf).or_else(Self::default_path) {
            Some(path) => Self::load(&path),
            None => Ok(Self::default()),
        }
    }

    /// Parses configuration from TOML text.
    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Socket path for the daemon: the flag, then the file, then the default.
    pub fn daemon_socket(&self, flag: Option<&Path>) -> PathBuf {
        resolve_socket(flag, self.daemon.socket.as_deref())
    }

    /// Socket path for the client: the flag, then the file, then the default.
    pub fn client_socket(&self, flag: Option<&Path>) -> PathBuf {
        resolve_socket(flag, self.client.socket.as_deref())
    }
}

fn resolve_socket(flag: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    flag.or(configured)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SOCKET_PATH))
}
