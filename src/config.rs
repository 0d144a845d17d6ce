use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::operations::CooldownPolicy;

pub const TOKEN_ENV_VAR: &str = "SPACETRADERS_TOKEN";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("failed to serialize configuration: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
    #[error("no agent token: set SPACETRADERS_TOKEN or write it to {0}")]
    MissingToken(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct SyncConfig {
    pub api: ApiConfig,
    pub executor: ExecutorConfig,
    pub bootstrap: BootstrapConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Root of the REST API, without a trailing slash
    pub base_url: String,
    /// Per-request timeout in seconds
    pub request_timeout_seconds: u64,
    /// Minimum spacing between request starts, in milliseconds
    pub min_request_interval_ms: u64,
    /// File holding the agent token when the environment variable is unset
    pub token_file: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct ExecutorConfig {
    /// `reject` fails gated actions on a cooling ship; `wait` suspends them
    pub cooldown_policy: CooldownPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapConfig {
    /// Items per page when listing ships and contracts (1-20)
    pub page_limit: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LoggingConfig {
    /// 0 = warnings only, 1 = info, 2 = debug, 3 = trace
    pub verbosity: u8,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.spacetraders.io/v2".to_string(),
            request_timeout_seconds: 30,
            min_request_interval_ms: 600,
            token_file: "AGENT_TOKEN".to_string(),
        }
    }
}

impl Default for BootstrapConfig {
    fn default() -> Self {
        Self { page_limit: 20 }
    }
}

impl ApiConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }
}

impl SyncConfig {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create(config_path: &str) -> Result<Self, ConfigError> {
        if Path::new(config_path).exists() {
            info!("📋 Loading configuration from {}", config_path);
            let config_str = fs::read_to_string(config_path).map_err(|source| ConfigError::Io {
                path: config_path.to_string(),
                source,
            })?;
            Self::parse(config_path, &config_str)
        } else {
            info!("📋 Creating default configuration at {}", config_path);
            let config = SyncConfig::default();
            config.save(config_path)?;
            Ok(config)
        }
    }

    pub fn parse(origin: &str, config_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(config_str).map_err(|source| ConfigError::Parse {
            path: origin.to_string(),
            source,
        })
    }

    pub fn save(&self, config_path: &str) -> Result<(), ConfigError> {
        let io_error = |source| ConfigError::Io {
            path: config_path.to_string(),
            source,
        };

        if let Some(parent) = Path::new(config_path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_error)?;
            }
        }

        let config_str = toml::to_string_pretty(self)?;
        fs::write(config_path, config_str).map_err(io_error)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.api.base_url.starts_with("http://") && !self.api.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "api.base_url must be an http(s) URL, got {:?}",
                self.api.base_url
            )));
        }
        if self.api.request_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "api.request_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if !(1..=20).contains(&self.bootstrap.page_limit) {
            return Err(ConfigError::Invalid(
                "bootstrap.page_limit must be between 1 and 20".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("   🌐 API: {}", self.api.base_url);
        info!(
            "   ⏱️  Timeout {}s, request spacing {}ms",
            self.api.request_timeout_seconds, self.api.min_request_interval_ms
        );
        info!("   ⏳ Cooldown policy: {:?}", self.executor.cooldown_policy);
        info!("   📄 Bootstrap page size: {}", self.bootstrap.page_limit);
    }

    /// Token from the environment, falling back to the token file.
    pub fn load_agent_token(&self) -> Result<String, ConfigError> {
        if let Ok(token) = env::var(TOKEN_ENV_VAR) {
            let token = token.trim().to_string();
            if !token.is_empty() {
                return Ok(token);
            }
        }

        let token_file = &self.api.token_file;
        let token = match fs::read_to_string(token_file) {
            Ok(contents) => contents.trim().to_string(),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
            Err(source) => {
                return Err(ConfigError::Io {
                    path: token_file.clone(),
                    source,
                })
            }
        };

        if token.is_empty() {
            return Err(ConfigError::MissingToken(token_file.clone()));
        }
        Ok(token)
    }
}
