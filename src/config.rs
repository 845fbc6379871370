/*!
 * Configuration types for jujuctl
 */

use jujulib_connect::Credentials;
use jujulib_wire::Macaroon;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{CliError, Result};

const DEFAULT_API_PATH: &str = "/api";

/// Connection and logging settings, read from `config.toml` and overridden
/// by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Controller address: a full `wss://` URL or `host:port`
    #[serde(default)]
    pub controller: Option<String>,

    /// User name or `user-` tag to log in as
    #[serde(default)]
    pub user: Option<String>,

    #[serde(default)]
    pub password: Option<String>,

    /// JSON file holding a macaroon array from a previous login
    #[serde(default)]
    pub macaroons_file: Option<PathBuf>,

    /// Log level for diagnostic output
    #[serde(default)]
    pub log_level: LogLevel,

    /// Log file path (None = stderr)
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Enable verbose logging (shorthand for log_level = debug)
    #[serde(default)]
    pub verbose: bool,

    /// How long a single command may wait on the controller
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            controller: None,
            user: None,
            password: None,
            macaroons_file: None,
            log_level: LogLevel::Warn,
            log_file: None,
            verbose: false,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// Log level for diagnostic output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Only errors
    Error,

    /// Warnings and errors
    #[default]
    Warn,

    /// Info, warnings, and errors
    Info,

    /// Debug and above
    Debug,

    /// All messages including wire frames
    Trace,
}

impl LogLevel {
    /// Convert to tracing::Level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            LogLevel::Error => tracing::Level::ERROR,
            LogLevel::Warn => tracing::Level::WARN,
            LogLevel::Info => tracing::Level::INFO,
            LogLevel::Debug => tracing::Level::DEBUG,
            LogLevel::Trace => tracing::Level::TRACE,
        }
    }
}

fn default_request_timeout() -> u64 {
    30
}

impl ClientConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            CliError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        toml::from_str(&contents)
            .map_err(|e| CliError::Config(format!("invalid {}: {}", path.display(), e)))
    }

    /// Save configuration to a TOML file
    pub fn to_file(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| CliError::Config(format!("cannot encode config: {}", e)))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// `~/.config/jujuctl/config.toml` (or the platform equivalent)
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("jujuctl").join("config.toml"))
    }

    /// Load the default config file if there is one.
    pub fn load_default() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::from_file(&path),
            _ => Ok(Self::default()),
        }
    }

    /// The WebSocket URL of the controller API. A bare `host:port` gets the
    /// `wss://` scheme and the `/api` path.
    pub fn api_url(&self) -> Result<String> {
        let controller = self
            .controller
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .ok_or_else(|| CliError::Config("no controller address configured".to_string()))?;

        if controller.starts_with("wss://") || controller.starts_with("ws://") {
            return Ok(controller.to_string());
        }
        Ok(format!(
            "wss://{}{}",
            controller.trim_end_matches('/'),
            DEFAULT_API_PATH
        ))
    }

    /// Credentials to log in with. `None` when neither a password nor a
    /// macaroon file is configured.
    pub fn credentials(&self) -> Result<Option<Credentials>> {
        let macaroons = match &self.macaroons_file {
            Some(path) => Some(read_macaroons(path)?),
            None => None,
        };

        let credentials = Credentials {
            user: self.user.clone().unwrap_or_default(),
            password: self.password.clone().unwrap_or_default(),
            macaroons,
        };
        Ok(credentials.are_available().then_some(credentials))
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}

fn read_macaroons(path: &Path) -> Result<Vec<Macaroon>> {
    let contents = std::fs::read_to_string(path).map_err(|e| {
        CliError::Config(format!("cannot read macaroons {}: {}", path.display(), e))
    })?;
    serde_json::from_str(&contents)
        .map_err(|e| CliError::Config(format!("invalid macaroons {}: {}", path.display(), e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.log_level, LogLevel::Warn);
        assert_eq!(config.request_timeout_secs, 30);
        assert!(config.controller.is_none());
    }

    #[test]
    fn test_api_url_normalisation() {
        let mut config = ClientConfig {
            controller: Some("10.0.0.1:17070".to_string()),
            ..Default::default()
        };
        assert_eq!(config.api_url().unwrap(), "wss://10.0.0.1:17070/api");

        config.controller = Some("wss://ctl.example.com:17070/api".to_string());
        assert_eq!(config.api_url().unwrap(), "wss://ctl.example.com:17070/api");

        config.controller = Some("  ".to_string());
        assert!(matches!(config.api_url(), Err(CliError::Config(_))));
    }

    #[test]
    fn test_toml_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let config = ClientConfig {
            controller: Some("10.0.0.1:17070".to_string()),
            user: Some("admin".to_string()),
            log_level: LogLevel::Debug,
            request_timeout_secs: 5,
            ..Default::default()
        };

        config.to_file(file.path()).unwrap();
        let loaded = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "controller = \"10.0.0.1:17070\"").unwrap();

        let config = ClientConfig::from_file(file.path()).unwrap();
        assert_eq!(config.controller.as_deref(), Some("10.0.0.1:17070"));
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.log_level, LogLevel::Warn);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "request_timeout_secs = \"soon\"").unwrap();
        assert!(matches!(
            ClientConfig::from_file(file.path()),
            Err(CliError::Config(_))
        ));
    }

    #[test]
    fn test_credentials() {
        let config = ClientConfig::default();
        assert_eq!(config.credentials().unwrap(), None);

        let config = ClientConfig {
            user: Some("admin".to_string()),
            password: Some("secret".to_string()),
            ..Default::default()
        };
        let creds = config.credentials().unwrap().unwrap();
        assert_eq!(creds.user, "admin");
        assert_eq!(creds.password, "secret");

        let mut macaroons = NamedTempFile::new().unwrap();
        write!(macaroons, "{}", json!([{"identifier": "m1"}])).unwrap();
        let config = ClientConfig {
            macaroons_file: Some(macaroons.path().to_path_buf()),
            ..Default::default()
        };
        let creds = config.credentials().unwrap().unwrap();
        assert_eq!(creds.macaroons, Some(vec![json!({"identifier": "m1"})]));
    }
}
