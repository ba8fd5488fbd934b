//! Application configuration management.
//!
//! Settings are layered with figment, lowest priority first:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory (or `--config <PATH>`)
//! 3. `QRBATCH_*` environment variables
//! 4. Command-line flags
//!
//! The endpoint edited in the TUI is written back into the same `config.toml`
//! with `toml_edit`, so comments and the order of other keys survive.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::capture::DEFAULT_CAPTURE_COMMAND;
use crate::cli::ThemeArg;
use crate::error::{QrBatchError, Result};

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "QRBATCH_";

/// Endpoint used until the user sets one.
pub const DEFAULT_ENDPOINT: &str = "http://192.168.0.1:1880/send_data";

/// Every key the config file understands.
const KNOWN_KEYS: &[&str] = &[
    "endpoint",
    "debounce_ms",
    "request_timeout_secs",
    "capture_command",
    "theme",
];

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Submission endpoint (opaque template, the batch is appended as `?qr=`)
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Debounce window after an accepted scan, in milliseconds
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// Per-request timeout for submissions, in seconds
    #[serde(default = "default_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Decoder command whose stdout lines are scanned values
    #[serde(default = "default_capture_command")]
    pub capture_command: String,
    /// Preferred TUI theme
    #[serde(default)]
    pub theme: ThemeArg,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_debounce_ms() -> u64 {
    100
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_capture_command() -> String {
    DEFAULT_CAPTURE_COMMAND.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            debounce_ms: default_debounce_ms(),
            request_timeout_secs: default_timeout_secs(),
            capture_command: default_capture_command(),
            theme: ThemeArg::Auto,
        }
    }
}

/// Values given on the command line. `None` leaves the lower layers alone.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debounce_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capture_command: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theme: Option<ThemeArg>,
}

impl Config {
    /// Load the layered configuration.
    ///
    /// `path` replaces the default config file location when given. A missing
    /// file is not an error.
    ///
    /// # Errors
    ///
    /// Returns [`QrBatchError::Config`] if a layer holds a value of the wrong
    /// type or the config directory cannot be determined.
    pub fn load(path: Option<&Path>, overrides: &ConfigOverrides) -> Result<Self> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => Self::config_path()?,
        };

        for (key, suggestion) in unknown_keys(&path) {
            match suggestion {
                Some(s) => log::warn!(
                    "Unknown config key '{}' in {} (did you mean '{}'?)",
                    key,
                    path.display(),
                    s
                ),
                None => log::warn!("Unknown config key '{}' in {}", key, path.display()),
            }
        }

        let config: Config = Self::figment(&path)
            .merge(Serialized::defaults(overrides))
            .extract()?;
        log::debug!("Loaded configuration: {:?}", config);
        Ok(config)
    }

    /// The figment stack without CLI overrides.
    #[must_use]
    pub fn figment(path: &Path) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Get the default platform-specific configuration path.
    ///
    /// # Errors
    ///
    /// Returns an error if no home directory can be determined.
    pub fn config_path() -> Result<PathBuf> {
        let project_dirs = ProjectDirs::from("com", "qrbatch", "qrbatch").ok_or_else(|| {
            QrBatchError::Config("Failed to determine project directories".to_string())
        })?;
        Ok(project_dirs.config_dir().join("config.toml"))
    }

    /// Debounce window as a duration.
    #[must_use]
    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    /// Request timeout as a duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Write `endpoint` into the config file, keeping everything else as is.
///
/// # Errors
///
/// Returns [`QrBatchError::Config`] if the existing file is not valid TOML,
/// or an I/O error if it cannot be written.
pub fn persist_endpoint(path: &Path, endpoint: &str) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };

    let mut doc: toml_edit::DocumentMut = existing
        .parse()
        .map_err(|e: toml_edit::TomlError| QrBatchError::Config(e.to_string()))?;
    doc["endpoint"] = toml_edit::value(endpoint);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, doc.to_string())?;
    log::info!("Saved endpoint to {}", path.display());
    Ok(())
}

/// Keys in the config file that are not recognised, with the closest known
/// key when one is similar enough.
#[must_use]
pub fn unknown_keys(path: &Path) -> Vec<(String, Option<&'static str>)> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };
    let Ok(table) = content.parse::<toml::Table>() else {
        // Syntax errors are reported by figment with a location
        return Vec::new();
    };

    table
        .keys()
        .filter(|k| !KNOWN_KEYS.contains(&k.as_str()))
        .map(|k| (k.clone(), suggest_key(k)))
        .collect()
}

/// Find the known key closest to `key`.
#[must_use]
pub fn suggest_key(key: &str) -> Option<&'static str> {
    KNOWN_KEYS
        .iter()
        .map(|known| (*known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score > 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| known)
}
