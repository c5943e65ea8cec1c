//! Application configuration with layered loading.
//!
//! This module provides configuration management using figment for layered
//! configuration loading from multiple sources:
//!
//! 1. Environment variables (PORTICO_*)
//! 2. TOML config file (if PORTICO_CONFIG_FILE set)
//! 3. Built-in defaults

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::gateway::GatewayConfig;

mod validation;

pub use validation::ConfigError;

/// Application configuration with layered loading.
///
/// Loading precedence (highest wins):
/// 1. Environment variables (PORTICO_*)
/// 2. TOML config file (if PORTICO_CONFIG_FILE set)
/// 3. Built-in defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Path to the SQLite database backing cache and preferences.
    ///
    /// Set via PORTICO_DB_PATH environment variable.
    #[serde(default = "default_db_path")]
    pub db_path: PathBuf,

    /// Site origin; only requests sharing it are intercepted.
    ///
    /// Set via PORTICO_ORIGIN environment variable.
    #[serde(default = "default_origin")]
    pub origin: String,

    /// Current cache generation name.
    ///
    /// Bumping this on deploy is the sole mechanism for invalidating
    /// previously cached entries. Set via PORTICO_GENERATION.
    #[serde(default = "default_generation")]
    pub generation: String,

    /// Site-relative paths precached at install time.
    #[serde(default = "default_precache")]
    pub precache: Vec<String>,

    /// Path of the cached page served when a document navigation fails.
    #[serde(default = "default_fallback_path")]
    pub fallback_path: String,

    /// User-Agent string for HTTP requests.
    ///
    /// Set via PORTICO_USER_AGENT environment variable.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Maximum bytes to fetch per request.
    ///
    /// Set via PORTICO_MAX_BYTES environment variable.
    #[serde(default = "default_max_bytes")]
    pub max_bytes: usize,

    /// HTTP request timeout in milliseconds.
    ///
    /// Set via PORTICO_TIMEOUT_MS environment variable.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Maximum number of redirects to follow.
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("./portico-cache.sqlite")
}

fn default_origin() -> String {
    "http://localhost:8080".into()
}

fn default_generation() -> String {
    "portico-v1.0.0".into()
}

fn default_precache() -> Vec<String> {
    [
        "/",
        "/index.html",
        "/about.html",
        "/contact.html",
        "/gallery.html",
        "/404.html",
        "/css/style.css",
        "/js/main.js",
        "/data.json",
        "/manifest.json",
        "/assets/icon.png",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn default_fallback_path() -> String {
    "/404.html".into()
}

fn default_user_agent() -> String {
    "portico/0.1".into()
}

fn default_max_bytes() -> usize {
    5_242_880 // 5MB
}

fn default_timeout_ms() -> u64 {
    20_000
}

fn default_max_redirects() -> usize {
    5
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            origin: default_origin(),
            generation: default_generation(),
            precache: default_precache(),
            fallback_path: default_fallback_path(),
            user_agent: default_user_agent(),
            max_bytes: default_max_bytes(),
            timeout_ms: default_timeout_ms(),
            max_redirects: default_max_redirects(),
        }
    }
}

impl AppConfig {
    /// Timeout as Duration for use with reqwest/tokio.
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Parsed site origin.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if the configured origin is not a
    /// valid http(s) URL.
    pub fn origin_url(&self) -> Result<Url, ConfigError> {
        let url = Url::parse(&self.origin)
            .map_err(|e| ConfigError::Invalid { field: "origin".into(), reason: e.to_string() })?;
        match url.scheme() {
            "http" | "https" => Ok(url),
            scheme => Err(ConfigError::Invalid {
                field: "origin".into(),
                reason: format!("unsupported scheme: {scheme}"),
            }),
        }
    }

    /// Gateway construction parameters derived from this configuration.
    pub fn gateway(&self) -> Result<GatewayConfig, ConfigError> {
        Ok(GatewayConfig {
            generation: self.generation.clone(),
            origin: self.origin_url()?,
            precache: self.precache.clone(),
            fallback_path: self.fallback_path.clone(),
        })
    }

    /// Load configuration from all sources with layered precedence.
    ///
    /// Priority (highest wins):
    /// 1. Environment variables prefixed with `PORTICO_`
    /// 2. TOML file from `PORTICO_CONFIG_FILE` (if set)
    /// 3. Built-in defaults via `Default::default()`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if:
    /// - Configuration file cannot be read
    /// - Environment variables cannot be parsed
    /// - Validation fails after loading
    pub fn load() -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Ok(config_path) = std::env::var("PORTICO_CONFIG_FILE") {
            figment = figment.merge(Toml::file(&config_path));
        }

        figment = figment.merge(
            Env::prefixed("PORTICO_")
                .map(|key| key.as_str().to_lowercase().into())
                .split("__"),
        );

        let config: Self = figment.extract().map_err(|e| ConfigError::LoadFailed(e.to_string()))?;

        config.validate()?;

        Ok(config)
    }
}
