//! Configuration management for Threadcast

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::bluesky::DEFAULT_SERVICE_URL;
use crate::error::{ConfigError, Result, ThreadcastError};

pub const ENV_CONFIG: &str = "THREADCAST_CONFIG";
pub const ENV_HANDLE: &str = "THREADCAST_BLUESKY_HANDLE";
pub const ENV_APP_PASSWORD: &str = "THREADCAST_BLUESKY_APP_PASSWORD";
pub const ENV_SCHEDULE: &str = "THREADCAST_SCHEDULE";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub bluesky: BlueskyConfig,
    #[serde(default)]
    pub generator: GeneratorConfig,
    #[serde(default)]
    pub publishing: PublishingConfig,
    #[serde(default)]
    pub paths: PathsConfig,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct BlueskyConfig {
    #[serde(default)]
    pub handle: String,
    #[serde(default)]
    pub app_password: String,
    #[serde(default = "default_service_url")]
    pub service_url: String,
}

impl std::fmt::Debug for BlueskyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlueskyConfig")
            .field("handle", &self.handle)
            .field("app_password", &"[REDACTED]")
            .field("service_url", &self.service_url)
            .finish()
    }
}

impl Default for BlueskyConfig {
    fn default() -> Self {
        Self {
            handle: String::new(),
            app_password: String::new(),
            service_url: default_service_url(),
        }
    }
}

impl BlueskyConfig {
    pub fn app_password(&self) -> SecretString {
        SecretString::from(self.app_password.clone())
    }
}

/// Which language-model API a provider entry talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Groq,
    Gemini,
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderKind::Groq => write!(f, "groq"),
            ProviderKind::Gemini => write!(f, "gemini"),
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    /// Override the provider's API base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub providers: Vec<ProviderConfig>,
    #[serde(default = "default_max_attempts")]
    pub max_attempts: usize,
    #[serde(default = "default_retry_delay")]
    pub retry_delay: String,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            providers: Vec::new(),
            max_attempts: default_max_attempts(),
            retry_delay: default_retry_delay(),
        }
    }
}

impl GeneratorConfig {
    pub fn retry_delay(&self) -> Result<Duration> {
        parse_duration_field("generator.retry_delay", &self.retry_delay)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PublishingConfig {
    #[serde(default = "default_inter_post_delay")]
    pub inter_post_delay: String,
    #[serde(default = "default_slot_delay")]
    pub slot_delay: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: String,
}

impl Default for PublishingConfig {
    fn default() -> Self {
        Self {
            inter_post_delay: default_inter_post_delay(),
            slot_delay: default_slot_delay(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl PublishingConfig {
    pub fn inter_post_delay(&self) -> Result<Duration> {
        parse_duration_field("publishing.inter_post_delay", &self.inter_post_delay)
    }

    pub fn slot_delay(&self) -> Result<Duration> {
        parse_duration_field("publishing.slot_delay", &self.slot_delay)
    }

    pub fn request_timeout(&self) -> Result<Duration> {
        parse_duration_field("publishing.request_timeout", &self.request_timeout)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_schedule_path")]
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<String>,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            schedule: default_schedule_path(),
            history: None,
        }
    }
}

impl PathsConfig {
    pub fn schedule_path(&self) -> PathBuf {
        expand_path(&self.schedule)
    }

    pub fn history_path(&self) -> Option<PathBuf> {
        self.history.as_deref().map(expand_path)
    }
}

fn default_service_url() -> String {
    DEFAULT_SERVICE_URL.to_string()
}

fn default_max_attempts() -> usize {
    2
}

fn default_retry_delay() -> String {
    "1s".to_string()
}

fn default_inter_post_delay() -> String {
    "2s".to_string()
}

fn default_slot_delay() -> String {
    "10s".to_string()
}

fn default_request_timeout() -> String {
    "30s".to_string()
}

fn default_schedule_path() -> String {
    "~/.config/threadcast/schedule.json".to_string()
}

fn parse_duration_field(field: &str, value: &str) -> Result<Duration> {
    humantime::parse_duration(value).map_err(|_| {
        ConfigError::InvalidDuration {
            field: field.to_string(),
            value: value.to_string(),
        }
        .into()
    })
}

/// Expand a leading `~` in a configured path
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::tilde(path).to_string())
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load and validate configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let config = Self::read_from_path(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a config file and apply environment overrides without validating
    /// credentials (enough for commands that never authenticate)
    pub fn read_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let mut config = Self::from_toml(&content)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration text without touching the environment
    pub fn from_toml(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).map_err(ConfigError::ParseError)?;
        Ok(config)
    }

    /// Credentials from CI secrets take precedence over the file
    pub fn apply_env_overrides(&mut self) {
        if let Ok(handle) = std::env::var(ENV_HANDLE) {
            self.bluesky.handle = handle;
        }
        if let Ok(password) = std::env::var(ENV_APP_PASSWORD) {
            self.bluesky.app_password = password;
        }
        if let Ok(schedule) = std::env::var(ENV_SCHEDULE) {
            self.paths.schedule = schedule;
        }
    }

    /// Check required fields and duration syntax
    pub fn validate(&self) -> Result<()> {
        if self.bluesky.handle.trim().is_empty() {
            return Err(ConfigError::MissingField("bluesky.handle".to_string()).into());
        }
        if self.bluesky.app_password.is_empty() {
            return Err(ConfigError::MissingField("bluesky.app_password".to_string()).into());
        }
        self.generator.retry_delay()?;
        self.publishing.inter_post_delay()?;
        self.publishing.slot_delay()?;
        self.publishing.request_timeout()?;
        Ok(())
    }

    /// Sample configuration written by `thread-setup`
    pub fn sample(schedule_path: &str) -> Self {
        Self {
            bluesky: BlueskyConfig {
                handle: "username.bsky.social".to_string(),
                app_password: "xxxx-xxxx-xxxx-xxxx".to_string(),
                service_url: default_service_url(),
            },
            generator: GeneratorConfig {
                providers: vec![
                    ProviderConfig {
                        kind: ProviderKind::Groq,
                        api_key: "your-groq-api-key-here".to_string(),
                        base_url: None,
                    },
                    ProviderConfig {
                        kind: ProviderKind::Gemini,
                        api_key: "your-gemini-api-key-here".to_string(),
                        base_url: None,
                    },
                ],
                ..GeneratorConfig::default()
            },
            publishing: PublishingConfig::default(),
            paths: PathsConfig {
                schedule: schedule_path.to_string(),
                history: Some("~/.local/share/threadcast/posts_log.json".to_string()),
            },
        }
    }

    /// Write the configuration as TOML, creating parent directories
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(ConfigError::WriteError)?;
        }
        std::fs::write(path, content).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Serialize to TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| ThreadcastError::InvalidInput(format!("Cannot serialize config: {}", e)))
    }
}

/// Resolve the configuration file path (XDG layout)
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var(ENV_CONFIG) {
        return Ok(expand_path(&path));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("threadcast").join("config.toml"))
}
