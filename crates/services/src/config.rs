use std::env;
use std::str::FromStr;
use std::time::Duration;

use strand_core::DEFAULT_PAGE_SIZE;
use url::Url;

use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "http://localhost:5000";
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(15 * 60);

/// How authenticated requests prove who is calling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuthPolicy {
    /// `Authorization: Bearer <token>` on every authenticated request.
    #[default]
    Bearer,
    /// Credentialed cookies kept by the client; no header is sent.
    Cookie,
}

impl AuthPolicy {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Bearer => "bearer",
            Self::Cookie => "cookie",
        }
    }
}

impl FromStr for AuthPolicy {
    type Err = ConfigError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "bearer" => Ok(Self::Bearer),
            "cookie" | "cookies" => Ok(Self::Cookie),
            other => Err(ConfigError::AuthMode(other.to_string())),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ApiConfig {
    /// Validated http(s) base, e.g. `http://localhost:5000`.
    pub base_url: String,
    pub auth: AuthPolicy,
    pub page_size: usize,
    pub idle_timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            auth: AuthPolicy::Bearer,
            page_size: DEFAULT_PAGE_SIZE,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Read `STRAND_API_URL`, `STRAND_AUTH_MODE`, `STRAND_PAGE_SIZE` and
    /// `STRAND_IDLE_TIMEOUT_SECS`, falling back to defaults for unset keys.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a set variable cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`ApiConfig::from_env`] with an injectable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a present value cannot be parsed.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let present = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(raw) = present("STRAND_API_URL") {
            config.base_url = parse_api_url(&raw)?.to_string();
        }
        if let Some(raw) = present("STRAND_AUTH_MODE") {
            config.auth = raw.parse()?;
        }
        if let Some(raw) = present("STRAND_PAGE_SIZE") {
            config.page_size = parse_positive("STRAND_PAGE_SIZE", &raw)?;
        }
        if let Some(raw) = present("STRAND_IDLE_TIMEOUT_SECS") {
            let secs = parse_positive("STRAND_IDLE_TIMEOUT_SECS", &raw)?;
            config.idle_timeout = Duration::from_secs(u64::try_from(secs).unwrap_or(u64::MAX));
        }
        Ok(config)
    }

    /// Absolute URL for an API path such as `/me`.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// # Errors
///
/// Returns `ConfigError` for malformed or non-http(s) URLs.
pub fn parse_api_url(raw: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(raw.trim()).map_err(|source| ConfigError::ApiUrl {
        value: raw.to_string(),
        source,
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::ApiScheme(other.to_string())),
    }
}

fn parse_positive(name: &'static str, raw: &str) -> Result<usize, ConfigError> {
    match raw.trim().parse::<usize>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::Number {
            name,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = ApiConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ApiConfig::default());
        assert_eq!(config.page_size, 15);
        assert_eq!(config.idle_timeout, Duration::from_secs(900));
    }

    #[test]
    fn env_values_override_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[
            ("STRAND_API_URL", "https://api.example.test/v1/"),
            ("STRAND_AUTH_MODE", "Cookie"),
            ("STRAND_PAGE_SIZE", "10"),
            ("STRAND_IDLE_TIMEOUT_SECS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.auth, AuthPolicy::Cookie);
        assert_eq!(config.page_size, 10);
        assert_eq!(config.idle_timeout, Duration::from_secs(60));
        assert_eq!(
            config.endpoint("/progress/1/2"),
            "https://api.example.test/v1/progress/1/2"
        );
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("STRAND_API_URL", "not a url")])),
            Err(ConfigError::ApiUrl { .. })
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("STRAND_API_URL", "ftp://host")])),
            Err(ConfigError::ApiScheme(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("STRAND_AUTH_MODE", "jwt")])),
            Err(ConfigError::AuthMode(_))
        ));
        assert!(matches!(
            ApiConfig::from_lookup(lookup(&[("STRAND_PAGE_SIZE", "0")])),
            Err(ConfigError::Number { .. })
        ));
    }
}
