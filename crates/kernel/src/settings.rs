use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context};
use serde::Deserialize;

const DEFAULT_ENV: &str = "local";
const ENV_VAR_NAME: &str = "ANE_ENV";
const CONFIG_DIR_ENV: &str = "ANE_CONFIG_DIR";
const ENV_PREFIX: &str = "ANE";
/// Credential variable read by earlier deployments of the backend.
const LEGACY_TOKEN_ENV: &str = "THINGIVERSE_TOKEN";

/// Deployment environment the application is running in.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Local,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> anyhow::Result<Self> {
        match value {
            "local" => Ok(Environment::Local),
            "staging" => Ok(Environment::Staging),
            "production" => Ok(Environment::Production),
            other => Err(anyhow!(
                "unsupported environment '{}'; expected local/staging/production",
                other
            )),
        }
    }
}

/// Top-level configuration structure loaded from layered sources.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub environment: Environment,
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub catalog: CatalogSettings,
}

impl Settings {
    /// Load configuration by layering `.env`, base file, and environment overlay.
    pub fn load() -> anyhow::Result<Self> {
        // Allow missing `.env` files without failing.
        let _ = dotenvy::dotenv();

        let environment = std::env::var(ENV_VAR_NAME).unwrap_or_else(|_| DEFAULT_ENV.to_string());
        let config_dir = match std::env::var(CONFIG_DIR_ENV) {
            Ok(dir) => PathBuf::from(dir),
            // Default to repo root `config` directory.
            Err(_) => std::env::current_dir()
                .context("unable to resolve current directory")?
                .join("config"),
        };

        let mut settings = Self::load_from_dir(&config_dir, &environment)?;

        if settings.catalog.token.is_none() {
            settings.catalog.token = std::env::var(LEGACY_TOKEN_ENV)
                .ok()
                .and_then(ApiToken::non_empty);
        }

        Ok(settings)
    }

    /// Layer `base.toml`, `{environment}.toml` and `ANE_*` variables from `config_dir`.
    pub fn load_from_dir(config_dir: &Path, environment: &str) -> anyhow::Result<Self> {
        let environment_kind = Environment::parse(environment)?;

        let base_path = config_dir.join("base.toml");
        let environment_path = config_dir.join(format!("{}.toml", environment));

        let builder = config::Config::builder()
            .add_source(config::File::from(base_path).required(false))
            .add_source(config::File::from(environment_path).required(false))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let cfg = builder
            .build()
            .with_context(|| "failed to build configuration")?;

        let mut settings: Settings = cfg
            .try_deserialize()
            .with_context(|| "failed to deserialize configuration")?;

        settings.environment = environment_kind;
        settings.catalog.token = settings.catalog.token.take().and_then(|t| ApiToken::non_empty(t.0));

        Ok(settings)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "ServerSettings::default_host")]
    pub host: String,
    #[serde(default = "ServerSettings::default_port")]
    pub port: u16,
    #[serde(default = "ServerSettings::default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl ServerSettings {
    fn default_host() -> String {
        "0.0.0.0".to_string()
    }

    fn default_port() -> u16 {
        5000
    }

    fn default_request_timeout_ms() -> u64 {
        15000
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: Self::default_host(),
            port: Self::default_port(),
            request_timeout_ms: Self::default_request_timeout_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct TelemetrySettings {
    #[serde(default)]
    pub log_format: LogFormat,
    /// `EnvFilter` directives used when `RUST_LOG` is not set.
    #[serde(default = "TelemetrySettings::default_filter")]
    pub filter: String,
}

impl TelemetrySettings {
    fn default_filter() -> String {
        "info".to_string()
    }
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_format: LogFormat::Pretty,
            filter: Self::default_filter(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Upstream catalog provider settings.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogSettings {
    #[serde(default = "CatalogSettings::default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub token: Option<ApiToken>,
    #[serde(default = "CatalogSettings::default_user_agent")]
    pub user_agent: String,
    #[serde(default = "CatalogSettings::default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "CatalogSettings::default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Refuse to start without a token instead of failing each request.
    #[serde(default)]
    pub require_token: bool,
}

impl CatalogSettings {
    fn default_base_url() -> String {
        "https://api.thingiverse.com".to_string()
    }

    fn default_user_agent() -> String {
        "ANE-3D-Model-Library/1.0".to_string()
    }

    fn default_timeout_ms() -> u64 {
        10000
    }

    fn default_connect_timeout_ms() -> u64 {
        5000
    }
}

impl Default for CatalogSettings {
    fn default() -> Self {
        Self {
            base_url: Self::default_base_url(),
            token: None,
            user_agent: Self::default_user_agent(),
            timeout_ms: Self::default_timeout_ms(),
            connect_timeout_ms: Self::default_connect_timeout_ms(),
            require_token: false,
        }
    }
}

/// Bearer credential for the catalog provider. Never printed in full.
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns `None` for empty or whitespace-only values.
    pub fn non_empty(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    /// First four characters followed by an ellipsis, safe for logs.
    pub fn preview(&self) -> String {
        let head: String = self.0.chars().take(4).collect();
        format!("{head}...")
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiToken").field(&"<redacted>").finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_environment_is_local() {
        let settings = Settings::default();
        assert_eq!(settings.environment, Environment::Local);
    }

    #[test]
    fn default_catalog_points_at_thingiverse_without_token() {
        let settings = Settings::default();
        assert_eq!(settings.catalog.base_url, "https://api.thingiverse.com");
        assert!(settings.catalog.token.is_none());
        assert!(!settings.catalog.require_token);
    }

    #[test]
    fn unknown_environment_is_rejected() {
        let err = Environment::parse("qa").unwrap_err();
        assert!(err.to_string().contains("unsupported environment 'qa'"));
    }

    #[test]
    fn token_debug_is_redacted() {
        let token = ApiToken::new("8d7a087ec6bb12b3");
        let printed = format!("{:?}", token);
        assert!(!printed.contains("8d7a087ec6bb12b3"));
        assert_eq!(token.preview(), "8d7a...");
    }

    #[test]
    fn blank_token_counts_as_missing() {
        assert!(ApiToken::non_empty("   ").is_none());
        assert_eq!(ApiToken::non_empty(" abc ").unwrap().expose(), "abc");
    }

    #[test]
    fn load_from_dir_layers_environment_file_over_base() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("base.toml"),
            "[server]\nport = 7000\n\n[catalog]\ntimeout_ms = 2500\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("staging.toml"),
            "[server]\nport = 7100\n\n[catalog]\ntoken = \"\"\n",
        )
        .unwrap();

        let settings = Settings::load_from_dir(dir.path(), "staging").unwrap();
        assert_eq!(settings.environment, Environment::Staging);
        assert_eq!(settings.server.port, 7100);
        assert_eq!(settings.catalog.timeout_ms, 2500);
        assert!(settings.catalog.token.is_none());
    }
}
