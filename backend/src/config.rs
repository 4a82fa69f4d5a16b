use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::str::FromStr;

use thiserror::Error;
use url::Url;

pub const DEFAULT_DISCOVERY_URL: &str =
    "https://accounts.google.com/.well-known/openid-configuration";

/// Shortest accepted `SESSION_SECRET`, in bytes. The signing key is derived from it.
pub const MIN_SESSION_SECRET_LEN: usize = 32;

const DEFAULT_PORT: u16 = 8001;
const DEFAULT_SESSION_MAX_AGE_SECS: i64 = 14 * 24 * 60 * 60;
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{0} must not be empty")]
    Empty(&'static str),

    #[error("SESSION_SECRET must be at least {min} bytes (got {actual})")]
    SecretTooShort { min: usize, actual: usize },

    #[error("{var} is invalid: {reason}")]
    InvalidValue { var: &'static str, reason: String },
}

/// Server configuration, read once at startup.
#[derive(Clone)]
pub struct AppConfig {
    pub google_client_id: String,
    pub google_client_secret: String,
    pub session_secret: String,
    pub discovery_url: Url,
    pub host: IpAddr,
    pub port: u16,
    /// External base URL (scheme and authority) used to build the callback URL.
    /// When unset the `Host` header of each request is used.
    pub public_url: Option<Url>,
    pub session_max_age_secs: i64,
    pub session_https_only: bool,
    pub http_timeout_secs: u64,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID
    /// - `GOOGLE_CLIENT_SECRET`: Google OAuth client secret
    /// - `SESSION_SECRET`: secret the session cookie signing key is derived from
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let session_secret = required(&lookup, "SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            return Err(ConfigError::SecretTooShort {
                min: MIN_SESSION_SECRET_LEN,
                actual: session_secret.len(),
            });
        }

        let discovery_url = lookup("GOOGLE_DISCOVERY_URL")
            .unwrap_or_else(|| DEFAULT_DISCOVERY_URL.to_string());
        let discovery_url = parse_url("GOOGLE_DISCOVERY_URL", &discovery_url)?;

        let public_url = lookup("PUBLIC_URL")
            .filter(|value| !value.trim().is_empty())
            .map(|value| parse_url("PUBLIC_URL", &value))
            .transpose()?;

        Ok(Self {
            google_client_id: required(&lookup, "GOOGLE_CLIENT_ID")?,
            google_client_secret: required(&lookup, "GOOGLE_CLIENT_SECRET")?,
            session_secret,
            discovery_url,
            host: parsed(&lookup, "HOST", IpAddr::V4(Ipv4Addr::LOCALHOST))?,
            port: parsed(&lookup, "PORT", DEFAULT_PORT)?,
            public_url,
            session_max_age_secs: parsed(
                &lookup,
                "SESSION_MAX_AGE_SECS",
                DEFAULT_SESSION_MAX_AGE_SECS,
            )?,
            session_https_only: parsed(&lookup, "SESSION_HTTPS_ONLY", false)?,
            http_timeout_secs: parsed(&lookup, "HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT_SECS)?,
        })
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("google_client_id", &self.google_client_id)
            .field("google_client_secret", &"<redacted>")
            .field("session_secret", &"<redacted>")
            .field("discovery_url", &self.discovery_url.as_str())
            .field("host", &self.host)
            .field("port", &self.port)
            .field("public_url", &self.public_url.as_ref().map(Url::as_str))
            .field("session_max_age_secs", &self.session_max_age_secs)
            .field("session_https_only", &self.session_https_only)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .finish()
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).ok_or(ConfigError::Missing(var))?;
    if value.trim().is_empty() {
        return Err(ConfigError::Empty(var));
    }
    Ok(value)
}

fn parsed<F, T>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue {
                var,
                reason: e.to_string(),
            }),
        None => Ok(default),
    }
}

fn parse_url(var: &'static str, value: &str) -> Result<Url, ConfigError> {
    Url::parse(value).map_err(|e| ConfigError::InvalidValue {
        var,
        reason: e.to_string(),
    })
}

#[cfg(test)]
pub(crate) fn test_config() -> AppConfig {
    AppConfig::from_lookup(|key| match key {
        "GOOGLE_CLIENT_ID" => Some("test-client-id".to_string()),
        "GOOGLE_CLIENT_SECRET" => Some("test-client-secret".to_string()),
        "SESSION_SECRET" => Some("s".repeat(64)),
        _ => None,
    })
    .expect("test config is valid")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("GOOGLE_CLIENT_ID", "client"),
            ("GOOGLE_CLIENT_SECRET", "secret"),
            ("SESSION_SECRET", "0123456789abcdef0123456789abcdef"),
        ]
    }

    #[test]
    fn test_defaults_applied() {
        let config = AppConfig::from_lookup(lookup_from(&base_vars())).unwrap();

        assert_eq!(config.discovery_url.as_str(), DEFAULT_DISCOVERY_URL);
        assert_eq!(config.bind_addr().to_string(), "127.0.0.1:8001");
        assert_eq!(config.session_max_age_secs, 1_209_600);
        assert!(!config.session_https_only);
        assert!(config.public_url.is_none());
    }

    #[test]
    fn test_missing_client_id_rejected() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "GOOGLE_CLIENT_ID")
            .collect();

        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("GOOGLE_CLIENT_ID"));
    }

    #[test]
    fn test_empty_client_secret_rejected() {
        let mut vars = base_vars();
        vars[1] = ("GOOGLE_CLIENT_SECRET", "  ");

        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Empty("GOOGLE_CLIENT_SECRET"));
    }

    #[test]
    fn test_session_secret_has_no_default() {
        let vars: Vec<_> = base_vars()
            .into_iter()
            .filter(|(k, _)| *k != "SESSION_SECRET")
            .collect();

        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::Missing("SESSION_SECRET"));
    }

    #[test]
    fn test_short_session_secret_rejected() {
        let mut vars = base_vars();
        vars[2] = ("SESSION_SECRET", "your-secret-key-here");

        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert_eq!(err, ConfigError::SecretTooShort { min: 32, actual: 20 });
    }

    #[test]
    fn test_invalid_port_rejected() {
        let mut vars = base_vars();
        vars.push(("PORT", "eighty"));

        let err = AppConfig::from_lookup(lookup_from(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { var: "PORT", .. }));
    }

    #[test]
    fn test_overrides_parsed() {
        let mut vars = base_vars();
        vars.extend([
            ("HOST", "0.0.0.0"),
            ("PORT", "3000"),
            ("PUBLIC_URL", "https://login.example.com"),
            ("SESSION_HTTPS_ONLY", "true"),
            ("GOOGLE_DISCOVERY_URL", "http://127.0.0.1:9000/.well-known/openid-configuration"),
        ]);

        let config = AppConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert_eq!(config.bind_addr().to_string(), "0.0.0.0:3000");
        assert_eq!(
            config.public_url.as_ref().map(Url::as_str),
            Some("https://login.example.com/")
        );
        assert!(config.session_https_only);
        assert_eq!(config.discovery_url.port(), Some(9000));
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let config = AppConfig::from_lookup(lookup_from(&base_vars())).unwrap();
        let rendered = format!("{:?}", config);

        assert!(rendered.contains("client"));
        assert!(!rendered.contains("0123456789abcdef"));
        assert!(!rendered.contains("\"secret\""));
    }
}
