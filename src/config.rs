//! Configuration types.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

use crate::error::ConfigError;
use crate::locale::Locale;

/// Delays used by the onboarding and tour timers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timings {
    /// Wait after a `COMPLETE` response before leaving onboarding.
    pub completion_redirect: Duration,
    /// Settling delay before a forced (replayed) tour start.
    pub forced_restart: Duration,
    /// Delay before an unforced first-time tour start.
    pub auto_start: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            completion_redirect: Duration::from_secs(2),
            forced_restart: Duration::from_millis(500),
            auto_start: Duration::from_secs(1),
        }
    }
}

/// Client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST backend, without trailing slash.
    pub api_base_url: String,
    /// Bearer token attached to every request, if set.
    pub api_token: Option<SecretString>,
    /// Callback URL handed to the Google authorization flow.
    pub google_redirect_uri: String,
    /// Route to navigate to once onboarding is complete.
    pub home_route: String,
    /// Per-request timeout.
    pub request_timeout: Duration,
    pub locale: Locale,
    /// Where the local copy of the completed-tours set is kept.
    pub tour_cache_path: PathBuf,
    pub timings: Timings,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8000".to_string(),
            api_token: None,
            google_redirect_uri: "http://localhost:3000/onboarding".to_string(),
            home_route: "/dashboard".to_string(),
            request_timeout: Duration::from_secs(30),
            locale: Locale::default(),
            tour_cache_path: PathBuf::from("./data/seen-tours.json"),
            timings: Timings::default(),
        }
    }
}

impl ClientConfig {
    /// Build a config from `FINANCE_*` environment variables.
    ///
    /// `FINANCE_API_URL` is required; everything else falls back to
    /// [`ClientConfig::default`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let api_base_url = lookup("FINANCE_API_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("FINANCE_API_URL".to_string()))?
            .trim_end_matches('/')
            .to_string();
        if !api_base_url.starts_with("http://") && !api_base_url.starts_with("https://") {
            return Err(ConfigError::InvalidValue {
                key: "FINANCE_API_URL".to_string(),
                message: format!("expected an http(s) URL, got {api_base_url}"),
            });
        }

        let locale = match lookup("FINANCE_LOCALE") {
            Some(raw) => raw.parse().map_err(|message| ConfigError::InvalidValue {
                key: "FINANCE_LOCALE".to_string(),
                message,
            })?,
            None => defaults.locale,
        };

        let request_timeout = match lookup("FINANCE_HTTP_TIMEOUT_SECS") {
            Some(raw) => {
                let secs: u64 = raw.parse().map_err(|_| ConfigError::InvalidValue {
                    key: "FINANCE_HTTP_TIMEOUT_SECS".to_string(),
                    message: format!("not a number of seconds: {raw}"),
                })?;
                Duration::from_secs(secs)
            }
            None => defaults.request_timeout,
        };

        Ok(Self {
            api_base_url,
            api_token: lookup("FINANCE_API_TOKEN")
                .filter(|v| !v.is_empty())
                .map(SecretString::from),
            google_redirect_uri: lookup("FINANCE_REDIRECT_URI")
                .unwrap_or(defaults.google_redirect_uri),
            home_route: lookup("FINANCE_HOME_ROUTE").unwrap_or(defaults.home_route),
            request_timeout,
            locale,
            tour_cache_path: lookup("FINANCE_TOUR_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.tour_cache_path),
            timings: defaults.timings,
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use secrecy::ExposeSecret;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn default_timings() {
        let t = Timings::default();
        assert_eq!(t.completion_redirect, Duration::from_secs(2));
        assert_eq!(t.forced_restart, Duration::from_millis(500));
        assert_eq!(t.auto_start, Duration::from_secs(1));
    }

    #[test]
    fn missing_api_url_is_an_error() {
        let err = ClientConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "FINANCE_API_URL"));
    }

    #[test]
    fn reads_overrides_and_trims_base_url() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            ("FINANCE_API_URL", "https://api.example.com/"),
            ("FINANCE_API_TOKEN", "tok"),
            ("FINANCE_LOCALE", "en"),
            ("FINANCE_HTTP_TIMEOUT_SECS", "5"),
            ("FINANCE_HOME_ROUTE", "/home"),
        ]))
        .unwrap();

        assert_eq!(config.api_base_url, "https://api.example.com");
        assert_eq!(config.api_token.unwrap().expose_secret(), "tok");
        assert_eq!(config.locale, Locale::En);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.home_route, "/home");
        assert_eq!(config.google_redirect_uri, "http://localhost:3000/onboarding");
    }

    #[test]
    fn rejects_bad_values() {
        let err = ClientConfig::from_lookup(lookup_from(&[("FINANCE_API_URL", "ftp://x")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { .. }));

        let err = ClientConfig::from_lookup(lookup_from(&[
            ("FINANCE_API_URL", "http://x"),
            ("FINANCE_HTTP_TIMEOUT_SECS", "soon"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("FINANCE_HTTP_TIMEOUT_SECS"));
    }
}
