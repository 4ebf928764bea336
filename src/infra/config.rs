//! Configuration management infrastructure.
//!
//! Loads and saves the client settings (endpoint, timeouts, token source and
//! an optional default key) as a TOML file in the user's config directory.

use crate::adapters::remote::client::{
    RemoteKeyServiceConfig, DEFAULT_ENDPOINT, DEFAULT_TIMEOUT_SECS,
};
use crate::domain::types::KeyPath;
use crate::infra::error::{KmsError, KmsResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable read for the access token unless configured otherwise.
pub const DEFAULT_ACCESS_TOKEN_ENV: &str = "KMS_ACCESS_TOKEN";

/// Upper bound on the request timeout.
const MAX_TIMEOUT_SECONDS: u64 = 600;

/// Client configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KmsConfiguration {
    /// Base URL of the key service REST API
    pub endpoint: String,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Whether to verify TLS certificates
    pub verify_tls: bool,

    /// Name of the environment variable holding the bearer token
    pub access_token_env: String,

    /// Key used when a command does not name one
    pub default_key: Option<String>,
}

impl Default for KmsConfiguration {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECS,
            verify_tls: true,
            access_token_env: DEFAULT_ACCESS_TOKEN_ENV.to_string(),
            default_key: None,
        }
    }
}

impl KmsConfiguration {
    /// Build the remote client configuration, reading the token from the
    /// configured environment variable.
    pub fn remote_config(&self) -> KmsResult<RemoteKeyServiceConfig> {
        let token = std::env::var(&self.access_token_env).map_err(|_| {
            KmsError::ConfigurationError(format!(
                "Access token not found: set the {} environment variable",
                self.access_token_env
            ))
        })?;

        let mut config = RemoteKeyServiceConfig::new(token)
            .with_endpoint(&self.endpoint)
            .with_timeout(self.timeout_seconds);
        if !self.verify_tls {
            config = config.with_insecure_tls();
        }
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> KmsResult<()> {
        if !self.endpoint.starts_with("https://") && !self.endpoint.starts_with("http://") {
            return Err(KmsError::ConfigurationError(format!(
                "Endpoint must start with http:// or https://, got: {}",
                self.endpoint
            )));
        }

        if self.timeout_seconds == 0 || self.timeout_seconds > MAX_TIMEOUT_SECONDS {
            return Err(KmsError::ConfigurationError(format!(
                "Timeout must be between 1 and {MAX_TIMEOUT_SECONDS} seconds, got: {}",
                self.timeout_seconds
            )));
        }

        if self.access_token_env.trim().is_empty() {
            return Err(KmsError::ConfigurationError(
                "Access token environment variable name must not be empty".to_string(),
            ));
        }

        self.default_key()?;
        Ok(())
    }

    /// The configured default key, if any.
    pub fn default_key(&self) -> KmsResult<Option<KeyPath>> {
        self.default_key.as_deref().map(KeyPath::new).transpose()
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> KmsResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> KmsResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("kms-asymmetric").join("config.toml"))
        } else {
            Ok(PathBuf::from("kms-asymmetric-config.toml"))
        }
    }

    /// Whether the configuration file exists
    #[must_use]
    pub fn exists(&self) -> bool {
        self.config_path.exists()
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> KmsResult<KmsConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = KmsConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file, or defaults if the file is absent
    pub fn load_or_default(&self) -> KmsResult<KmsConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            Ok(KmsConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> KmsResult<KmsConfiguration> {
        log::debug!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            KmsError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: KmsConfiguration = toml::from_str(&content).map_err(|e| {
            KmsError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &KmsConfiguration) -> KmsResult<()> {
        config.validate()?;
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                KmsError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            KmsError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            KmsError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        Ok(())
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }
}
