//! Configuration loading for platewised and the platewise CLI.
//!
//! Configuration is loaded from TOML files with the following resolution order:
//! 1. `--config <path>` (CLI flag)
//! 2. `~/.platewise/config.toml` (user)
//! 3. `/etc/platewise/config.toml` (system)
//!
//! Secrets are loaded separately with mandatory permission checks:
//! 1. `~/.platewise/secrets.toml` (user, must be 0600)
//! 2. `/etc/platewise/secrets.toml` (system, must be 0600)
//!
//! Missing keys fall back to `OPENAI_API_KEY`, `OPENROUTER_API_KEY` and
//! `USDA_API_KEY`.

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::analyzer::{Platewise, PlatewiseBuilder};
use crate::cache::CacheConfig;
use crate::providers::openai::{OPENAI_DEFAULT_MODEL, OPENROUTER_DEFAULT_MODEL};
use crate::providers::{OpenAiClient, RetryConfig, UsdaClient};
use crate::types::ImageInput;
use crate::{PlatewiseError, Result};

/// Service configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
    /// Lookup cache; enabled when the section is present.
    #[serde(default)]
    pub cache: Option<CacheSection>,
    /// Generation retry; enabled when the section is present.
    #[serde(default)]
    pub retry: Option<RetrySection>,
}

/// Server network configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to (default: 127.0.0.1:8080).
    #[serde(default = "default_address")]
    pub address: String,
    #[serde(default)]
    pub limits: LimitsConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: default_address(),
            limits: LimitsConfig::default(),
        }
    }
}

fn default_address() -> String {
    "127.0.0.1:8080".to_string()
}

/// Resource limits.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted image after base64 decoding (default: 10 MiB).
    #[serde(default = "default_max_image_bytes")]
    pub max_image_bytes: usize,
    /// Whole-request timeout in seconds (default: 60).
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_image_bytes: default_max_image_bytes(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_max_image_bytes() -> usize {
    ImageInput::DEFAULT_MAX_BYTES
}

fn default_request_timeout() -> u64 {
    60
}

/// Provider configurations.
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Which generation provider to use: "openai" or "openrouter".
    /// Default: whichever has a key, OpenRouter first.
    #[serde(default)]
    pub generator: Option<String>,
    #[serde(default)]
    pub openai: Option<GeneratorConfig>,
    #[serde(default)]
    pub openrouter: Option<GeneratorConfig>,
    #[serde(default)]
    pub usda: Option<UsdaConfig>,
    /// Per-request timeout for outbound calls in seconds (default: 30).
    #[serde(default = "default_provider_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            generator: None,
            openai: None,
            openrouter: None,
            usda: None,
            timeout_secs: default_provider_timeout(),
        }
    }
}

fn default_provider_timeout() -> u64 {
    30
}

/// Structured-generation provider configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeneratorConfig {
    /// Override the API base URL.
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default)]
    pub estimator_model: Option<String>,
    /// Sampling temperature for both calls (provider default when unset).
    #[serde(default)]
    pub temperature: Option<f32>,
}

/// USDA FoodData Central configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct UsdaConfig {
    /// Set to false to run estimator-only, without database lookups.
    #[serde(default = "default_usda_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub base_url: Option<String>,
    /// Candidates requested per search (default: 10).
    #[serde(default)]
    pub page_size: Option<u32>,
}

impl Default for UsdaConfig {
    fn default() -> Self {
        Self {
            enabled: default_usda_enabled(),
            base_url: None,
            page_size: None,
        }
    }
}

fn default_usda_enabled() -> bool {
    true
}

/// `[cache]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct CacheSection {
    #[serde(default = "default_cache_entries")]
    pub max_entries: u64,
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

fn default_cache_entries() -> u64 {
    10_000
}

fn default_cache_ttl() -> u64 {
    24 * 60 * 60
}

/// `[retry]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct RetrySection {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    #[serde(default = "default_max_delay")]
    pub max_delay_ms: u64,
    #[serde(default = "default_jitter")]
    pub jitter: bool,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay() -> u64 {
    500
}

fn default_max_delay() -> u64 {
    10_000
}

fn default_jitter() -> bool {
    true
}

/// Secrets configuration (API keys).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Secrets {
    #[serde(default)]
    pub openai: Option<ApiKeySecret>,
    #[serde(default)]
    pub openrouter: Option<ApiKeySecret>,
    #[serde(default)]
    pub usda: Option<ApiKeySecret>,
}

/// A single API key secret.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiKeySecret {
    pub api_key: String,
}

/// Provider name → environment variable name mapping.
const PROVIDER_ENV_VARS: &[(&str, &str)] = &[
    ("openai", "OPENAI_API_KEY"),
    ("openrouter", "OPENROUTER_API_KEY"),
    ("usda", "USDA_API_KEY"),
];

impl Config {
    /// Load configuration from the standard locations.
    ///
    /// Resolution order:
    /// 1. Explicit path (if provided)
    /// 2. `~/.platewise/config.toml`
    /// 3. `/etc/platewise/config.toml`
    pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
        let path = Self::resolve_config_path(explicit_path)?;
        Self::load_from_file(&path)
    }

    /// Like [`load()`](Self::load), but defaults when no file exists.
    ///
    /// An explicit path that does not exist is still an error.
    pub fn load_or_default(explicit_path: Option<&Path>) -> Result<Self> {
        match explicit_path {
            Some(_) => Self::load(explicit_path),
            None => match Self::find_config_path() {
                Some(path) => Self::load_from_file(&path),
                None => Ok(Self::default()),
            },
        }
    }

    fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            PlatewiseError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PlatewiseError::Configuration(format!("Failed to parse config file {path:?}: {e}"))
        })
    }

    /// Resolve the config file path.
    fn resolve_config_path(explicit: Option<&Path>) -> Result<PathBuf> {
        if let Some(path) = explicit {
            if path.exists() {
                return Ok(path.to_path_buf());
            }
            return Err(PlatewiseError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }

        Self::find_config_path().ok_or_else(|| {
            PlatewiseError::Configuration(
                "No config file found. Create ~/.platewise/config.toml or /etc/platewise/config.toml"
                    .to_string(),
            )
        })
    }

    fn find_config_path() -> Option<PathBuf> {
        // User config
        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".platewise").join("config.toml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        // System config
        let system_config = PathBuf::from("/etc/platewise/config.toml");
        system_config.exists().then_some(system_config)
    }

    /// Translate this configuration and the given secrets into a builder.
    ///
    /// Fails when the chosen generation provider has no key, or when USDA
    /// lookups are enabled (the default) without a USDA key.
    pub fn analyzer_builder(&self, secrets: &Secrets) -> Result<PlatewiseBuilder> {
        let timeout = Duration::from_secs(self.providers.timeout_secs);
        let mut builder = Platewise::builder().timeout(timeout);

        let choice = match self.providers.generator.as_deref() {
            Some(name @ ("openai" | "openrouter")) => name,
            Some(other) => {
                return Err(PlatewiseError::Configuration(format!(
                    "unknown generator provider '{other}' (expected openai or openrouter)"
                )));
            }
            None if secrets.api_key("openrouter").is_some() => "openrouter",
            None => "openai",
        };

        let key = secrets.api_key(choice).ok_or_else(|| {
            PlatewiseError::Configuration(format!("no API key configured for {choice}"))
        })?;

        let generator_config = match choice {
            "openrouter" => self.providers.openrouter.clone(),
            _ => self.providers.openai.clone(),
        }
        .unwrap_or_default();

        let default_model = match choice {
            "openrouter" => OPENROUTER_DEFAULT_MODEL,
            _ => OPENAI_DEFAULT_MODEL,
        };

        builder = match (&generator_config.base_url, choice) {
            (Some(base_url), _) => builder.generator(Arc::new(
                OpenAiClient::with_base_url(choice, key, base_url.as_str()).timeout(timeout),
            )),
            (None, "openrouter") => builder.openrouter(key),
            (None, _) => builder.openai(key),
        };
        builder = builder
            .vision_model(generator_config.vision_model.as_deref().unwrap_or(default_model))
            .estimator_model(
                generator_config
                    .estimator_model
                    .as_deref()
                    .unwrap_or(default_model),
            );
        if let Some(temperature) = generator_config.temperature {
            builder = builder.temperature(temperature);
        }

        let usda = self.providers.usda.clone().unwrap_or_default();
        if usda.enabled {
            let usda_key = secrets.api_key("usda").ok_or_else(|| {
                PlatewiseError::Configuration(
                    "no API key configured for usda (set USDA_API_KEY, or \
                     providers.usda.enabled = false for estimator-only mode)"
                        .into(),
                )
            })?;
            builder = match &usda.base_url {
                Some(base_url) => builder.database(Arc::new(
                    UsdaClient::with_base_url(usda_key, base_url.as_str()).timeout(timeout),
                )),
                None => builder.usda(usda_key),
            };
            if let Some(page_size) = usda.page_size {
                builder = builder.page_size(page_size);
            }
        }

        if let Some(cache) = &self.cache {
            builder = builder.lookup_cache(
                CacheConfig::new()
                    .max_entries(cache.max_entries)
                    .ttl(Duration::from_secs(cache.ttl_secs)),
            );
        }

        if let Some(retry) = &self.retry {
            builder = builder.retry(
                RetryConfig::new()
                    .max_attempts(retry.max_attempts)
                    .initial_delay(Duration::from_millis(retry.initial_delay_ms))
                    .max_delay(Duration::from_millis(retry.max_delay_ms))
                    .jitter(retry.jitter),
            );
        }

        Ok(builder)
    }
}

impl Secrets {
    /// Load secrets from the standard locations with permission checks.
    ///
    /// Resolution order:
    /// 1. `~/.platewise/secrets.toml` (if exists, must be 0600)
    /// 2. `/etc/platewise/secrets.toml` (if exists, must be 0600)
    ///
    /// Returns empty secrets if no file exists (keys may come from env vars).
    pub fn load() -> Result<Self> {
        // Try user secrets first
        if let Some(home) = dirs::home_dir() {
            let user_secrets = home.join(".platewise").join("secrets.toml");
            if user_secrets.exists() {
                return Self::load_from(&user_secrets);
            }
        }

        // Try system secrets
        let system_secrets = PathBuf::from("/etc/platewise/secrets.toml");
        if system_secrets.exists() {
            return Self::load_from(&system_secrets);
        }

        Ok(Secrets::default())
    }

    /// Load one secrets file after checking its permissions.
    pub fn load_from(path: &Path) -> Result<Self> {
        Self::check_permissions(path)?;
        let content = fs::read_to_string(path).map_err(|e| {
            PlatewiseError::Configuration(format!("Failed to read secrets file {path:?}: {e}"))
        })?;
        toml::from_str(&content).map_err(|e| {
            PlatewiseError::Configuration(format!("Failed to parse secrets file {path:?}: {e}"))
        })
    }

    /// Check that the secrets file has secure permissions (0600 or 0400).
    #[cfg(unix)]
    fn check_permissions(path: &Path) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let metadata = fs::metadata(path).map_err(|e| {
            PlatewiseError::Configuration(format!("Failed to stat secrets file {path:?}: {e}"))
        })?;

        let mode = metadata.permissions().mode();
        // Reject if group or other bits are set
        if mode & 0o077 != 0 {
            return Err(PlatewiseError::Configuration(format!(
                "Secrets file {path:?} has insecure permissions {:o}. Must be 0600 or 0400.",
                mode & 0o777
            )));
        }

        Ok(())
    }

    #[cfg(not(unix))]
    fn check_permissions(_path: &Path) -> Result<()> {
        Ok(())
    }

    /// Get API key for a provider, falling back to the corresponding environment variable.
    pub fn api_key(&self, provider: &str) -> Option<String> {
        let from_file = match provider {
            "openai" => self.openai.as_ref(),
            "openrouter" => self.openrouter.as_ref(),
            "usda" => self.usda.as_ref(),
            _ => None,
        }
        .map(|s| s.api_key.clone());

        from_file.or_else(|| {
            PROVIDER_ENV_VARS
                .iter()
                .find(|(name, _)| *name == provider)
                .and_then(|(_, env_var)| std::env::var(env_var).ok())
                .filter(|key| !key.trim().is_empty())
        })
    }
}
