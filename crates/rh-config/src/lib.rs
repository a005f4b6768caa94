//! # rh-config
//!
//! Typed application configuration, read from defaults, an optional `.env`
//! file and the process environment (in that order of precedence, lowest
//! first). Keys are the lowercase form of the environment variable name:
//! `GITHUB_ID` → `github_id`.

use std::collections::HashMap;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// A credential the server cannot start without.
    #[error("missing required setting {0}")]
    MissingCredential(&'static str),
}

/// Client credentials for one OAuth identity provider.
#[derive(Debug)]
pub struct OAuthCredentials {
    pub client_id: String,
    pub client_secret: SecretString,
}

#[derive(Debug)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub session_secret: SecretString,
    pub session_ttl_secs: u64,
    pub github: OAuthCredentials,
    pub google: OAuthCredentials,
    pub placeholder_file_url: String,
    pub placeholder_thumbnail_url: String,
    pub max_upload_bytes: usize,
    /// Off by default: any signed-in user may edit any article.
    pub enforce_article_ownership: bool,
    pub cors_allow_any_origin: bool,
}

// Shape of the merged sources before the required settings are checked.
#[derive(Deserialize)]
struct RawConfig {
    database_url: String,
    bind_address: String,
    session_ttl_secs: u64,
    placeholder_file_url: String,
    placeholder_thumbnail_url: String,
    max_upload_bytes: usize,
    enforce_article_ownership: bool,
    cors_allow_any_origin: bool,
    session_secret: Option<String>,
    github_id: Option<String>,
    github_secret: Option<String>,
    google_client_id: Option<String>,
    google_client_secret: Option<String>,
}

impl Config {
    /// Loads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Config, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            debug!(path = %path.display(), "loaded .env file");
        }
        Self::load(config::Environment::default())
    }

    /// Same as [`Config::from_env`] but reads the given variables instead of
    /// the process environment.
    pub fn from_vars(vars: HashMap<String, String>) -> Result<Config, ConfigError> {
        Self::load(config::Environment::default().source(Some(vars)))
    }

    fn load(env: config::Environment) -> Result<Config, ConfigError> {
        let raw: RawConfig = config::Config::builder()
            .set_default("database_url", "sqlite://robohub.db?mode=rwc")?
            .set_default("bind_address", "127.0.0.1:8080")?
            // 30 days, same lifetime the identity providers' sessions use.
            .set_default("session_ttl_secs", 2_592_000)?
            // Storage is not wired up; uploads resolve to these URLs.
            .set_default("placeholder_file_url", "/temp/file-url")?
            .set_default("placeholder_thumbnail_url", "/temp/thumbnail-url")?
            .set_default("max_upload_bytes", 50 * 1024 * 1024)?
            .set_default("enforce_article_ownership", false)?
            .set_default("cors_allow_any_origin", true)?
            .add_source(env)
            .build()?
            .try_deserialize()?;

        Ok(Config {
            session_secret: required(raw.session_secret, "SESSION_SECRET")?.into(),
            github: OAuthCredentials {
                client_id: required(raw.github_id, "GITHUB_ID")?,
                client_secret: required(raw.github_secret, "GITHUB_SECRET")?.into(),
            },
            google: OAuthCredentials {
                client_id: required(raw.google_client_id, "GOOGLE_CLIENT_ID")?,
                client_secret: required(raw.google_client_secret, "GOOGLE_CLIENT_SECRET")?.into(),
            },
            database_url: raw.database_url,
            bind_address: raw.bind_address,
            session_ttl_secs: raw.session_ttl_secs,
            placeholder_file_url: raw.placeholder_file_url,
            placeholder_thumbnail_url: raw.placeholder_thumbnail_url,
            max_upload_bytes: raw.max_upload_bytes,
            enforce_article_ownership: raw.enforce_article_ownership,
            cors_allow_any_origin: raw.cors_allow_any_origin,
        })
    }
}

// Empty strings count as missing: an exported-but-blank variable is the
// usual way this goes wrong in deployments.
fn required(value: Option<String>, name: &'static str) -> Result<String, ConfigError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::MissingCredential(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    fn full_env() -> HashMap<String, String> {
        [
            ("SESSION_SECRET", "s3cret"),
            ("GITHUB_ID", "gh-id"),
            ("GITHUB_SECRET", "gh-secret"),
            ("GOOGLE_CLIENT_ID", "google-id"),
            ("GOOGLE_CLIENT_SECRET", "google-secret"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
    }

    #[test]
    fn defaults_fill_optional_settings() {
        let config = Config::from_vars(full_env()).unwrap();
        assert_eq!(config.bind_address, "127.0.0.1:8080");
        assert_eq!(config.placeholder_file_url, "/temp/file-url");
        assert!(!config.enforce_article_ownership);
        assert_eq!(config.github.client_id, "gh-id");
        assert_eq!(config.session_secret.expose_secret(), "s3cret");
    }

    #[test]
    fn environment_overrides_defaults() {
        let mut env = full_env();
        env.insert("BIND_ADDRESS".into(), "0.0.0.0:3000".into());
        env.insert("ENFORCE_ARTICLE_OWNERSHIP".into(), "true".into());
        let config = Config::from_vars(env).unwrap();
        assert_eq!(config.bind_address, "0.0.0.0:3000");
        assert!(config.enforce_article_ownership);
    }

    #[test]
    fn missing_github_credentials_are_fatal() {
        let mut env = full_env();
        env.remove("GITHUB_SECRET");
        let err = Config::from_vars(env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GITHUB_SECRET")));
    }

    #[test]
    fn blank_google_credentials_are_fatal() {
        let mut env = full_env();
        env.insert("GOOGLE_CLIENT_ID".into(), "  ".into());
        let err = Config::from_vars(env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingCredential("GOOGLE_CLIENT_ID")));
    }
}
