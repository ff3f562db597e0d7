//! Configuration loading from TOML with environment variable resolution.
//!
//! Reads `config.toml` and deserializes into strongly-typed structs. Every
//! section and field has a default, so a partial file (or no file at all)
//! still yields a working service. Secrets (the ML API key) are referenced
//! by env-var name in the config and resolved at runtime.

use anyhow::{Context, Result};
use secrecy::SecretString;
use serde::Deserialize;
use std::fs;
use std::time::Duration;

use crate::model::league::LeagueProfile;
use crate::model::strength::LeagueStrengths;
use crate::value::ValueConfig;

/// Top-level application configuration.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub ml_service: MlServiceConfig,
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub value: ValueConfig,
    /// League profiles replacing or extending the built-in ones.
    #[serde(default)]
    pub leagues: Vec<LeagueProfile>,
    /// Strength entries replacing or extending the built-in table.
    #[serde(default)]
    pub strengths: Vec<LeagueStrengths>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Allowed CORS origins. Empty allows any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

#[derive(Debug, Deserialize, Clone)]
pub struct MlServiceConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_ml_url")]
    pub base_url: String,
    #[serde(default = "default_ml_timeout")]
    pub timeout_secs: u64,
    /// Env var holding an optional bearer token for the ML service.
    #[serde(default)]
    pub api_key_env: Option<String>,
}

impl Default for MlServiceConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: default_ml_url(),
            timeout_secs: default_ml_timeout(),
            api_key_env: None,
        }
    }
}

impl MlServiceConfig {
    pub const MIN_TIMEOUT_SECS: u64 = 1;
    pub const MAX_TIMEOUT_SECS: u64 = 30;

    /// Configured timeout, clamped to 1–30 s.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(
            self.timeout_secs
                .clamp(Self::MIN_TIMEOUT_SECS, Self::MAX_TIMEOUT_SECS),
        )
    }

    /// Resolve the API key, if one is configured and set.
    pub fn api_key(&self) -> Option<SecretString> {
        self.api_key_env
            .as_deref()
            .and_then(|name| AppConfig::resolve_env(name).ok())
            .filter(|v| !v.is_empty())
            .map(SecretString::new)
    }
}

fn default_ml_url() -> String {
    "http://localhost:5000".to_string()
}

fn default_ml_timeout() -> u64 {
    8
}

/// Tunables for the heuristic models.
#[derive(Debug, Deserialize, Clone)]
pub struct ModelConfig {
    /// Strength assigned to teams missing from the table.
    #[serde(default = "default_strength")]
    pub default_strength: f64,
    /// Home advantage when no league profile applies.
    #[serde(default = "default_home_advantage")]
    pub default_home_advantage: f64,
    /// Model weight when blending over/under with head-to-head history.
    #[serde(default = "default_goals_weight")]
    pub goals_history_weight: f64,
    /// Model weight when blending BTTS with head-to-head history.
    #[serde(default = "default_btts_weight")]
    pub btts_history_weight: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            default_strength: default_strength(),
            default_home_advantage: default_home_advantage(),
            goals_history_weight: default_goals_weight(),
            btts_history_weight: default_btts_weight(),
        }
    }
}

fn default_strength() -> f64 {
    0.65
}

fn default_home_advantage() -> f64 {
    0.15
}

fn default_goals_weight() -> f64 {
    0.7
}

fn default_btts_weight() -> f64 {
    0.5
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    /// Parse configuration from TOML text.
    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        Ok(config)
    }

    /// Resolve an environment variable name to its value.
    /// Useful for loading secrets referenced in the config.
    pub fn resolve_env(env_name: &str) -> Result<String> {
        std::env::var(env_name)
            .with_context(|| format!("Environment variable not set: {env_name}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory (cargo runs tests
        // from the crate root).
        let result = AppConfig::load("config.toml");
        if let Ok(cfg) = result {
            assert_eq!(cfg.server.port, 3000);
            assert!(cfg.ml_service.timeout_secs >= 1);
            assert!(cfg.model.default_strength > 0.0);
            assert!(cfg.value.kelly.max_fraction <= 0.25);
        }
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg.server.bind_addr(), "0.0.0.0:3000");
        assert!(!cfg.ml_service.enabled);
        assert_eq!(cfg.ml_service.timeout(), Duration::from_secs(8));
        assert_eq!(cfg.model.default_strength, 0.65);
        assert_eq!(cfg.model.goals_history_weight, 0.7);
        assert_eq!(cfg.model.btts_history_weight, 0.5);
        assert!(cfg.leagues.is_empty());
        assert!(cfg.strengths.is_empty());
    }

    #[test]
    fn test_partial_sections() {
        let cfg = AppConfig::parse(
            r#"
            [server]
            port = 8080

            [ml_service]
            enabled = true
            timeout_secs = 120
            "#,
        )
        .unwrap();
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert!(cfg.ml_service.enabled);
        assert_eq!(cfg.ml_service.base_url, "http://localhost:5000");
        assert_eq!(cfg.ml_service.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_timeout_lower_clamp() {
        let ml = MlServiceConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert_eq!(ml.timeout(), Duration::from_secs(1));
    }

    #[test]
    fn test_strength_overrides_parse() {
        let cfg = AppConfig::parse(
            r#"
            [[strengths]]
            league = "Eredivisie"
            teams = [
                { name = "Ajax", strength = 0.78 },
                { name = "PSV", strength = 0.76 },
            ]

            [[leagues]]
            name = "Eredivisie"
            home_advantage = 0.13
            avg_goals = 3.2
            avg_corners = 10.0
            avg_cards = 3.6
            "#,
        )
        .unwrap();
        assert_eq!(cfg.strengths.len(), 1);
        assert_eq!(cfg.strengths[0].teams[1].name, "PSV");
        assert_eq!(cfg.leagues[0].home_advantage, 0.13);
    }

    #[test]
    fn test_missing_api_key_env_is_none() {
        let ml = MlServiceConfig {
            api_key_env: Some("MATCHDAY_TEST_KEY_THAT_IS_NEVER_SET".into()),
            ..Default::default()
        };
        assert!(ml.api_key().is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(AppConfig::parse("[server\nport = ").is_err());
    }
}
