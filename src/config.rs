//! Runtime configuration
//!
//! Read once at startup from the process environment (after `.env` is loaded).

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::AnalysisError;
use crate::Result;

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_SOURCE_TIMEOUT_SECS: u64 = 12;
const DEFAULT_ENRICHMENT_TIMEOUT_SECS: u64 = 20;
const TIMEOUT_SECS_RANGE: std::ops::RangeInclusive<u64> = 1..=300;
const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query1.finance.yahoo.com";
pub const DEFAULT_NSE_BASE_URL: &str = "https://www.nseindia.com";
pub const DEFAULT_SCREENER_BASE_URL: &str = "https://www.screener.in";

/// Values shipped in `.env.example` that mean "no key"
const PLACEHOLDER_KEYS: &[&str] = &["your_gemini_api_key_here", "mock_key"];

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub source_timeout: Duration,
    pub enrichment_timeout: Duration,
    pub yahoo_base_url: String,
    pub nse_base_url: String,
    pub screener_base_url: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            source_timeout: Duration::from_secs(DEFAULT_SOURCE_TIMEOUT_SECS),
            enrichment_timeout: Duration::from_secs(DEFAULT_ENRICHMENT_TIMEOUT_SECS),
            yahoo_base_url: DEFAULT_YAHOO_BASE_URL.to_string(),
            nse_base_url: DEFAULT_NSE_BASE_URL.to_string(),
            screener_base_url: DEFAULT_SCREENER_BASE_URL.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; `from_env` passes the process environment
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let port = match lookup("PORT").or_else(|| lookup("API_PORT")) {
            Some(raw) => parse_value::<u16>("PORT", &raw)?,
            None => defaults.port,
        };

        let source_timeout = match lookup("SOURCE_TIMEOUT_SECS") {
            Some(raw) => parse_timeout("SOURCE_TIMEOUT_SECS", &raw)?,
            None => defaults.source_timeout,
        };

        let enrichment_timeout = match lookup("ENRICHMENT_TIMEOUT_SECS") {
            Some(raw) => parse_timeout("ENRICHMENT_TIMEOUT_SECS", &raw)?,
            None => defaults.enrichment_timeout,
        };

        let gemini_api_key = lookup("GEMINI_API_KEY")
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty() && !PLACEHOLDER_KEYS.contains(&k.as_str()));

        Ok(Self {
            port,
            gemini_api_key,
            gemini_model: lookup("GEMINI_MODEL")
                .filter(|m| !m.trim().is_empty())
                .unwrap_or(defaults.gemini_model),
            source_timeout,
            enrichment_timeout,
            yahoo_base_url: base_url(lookup("YAHOO_BASE_URL"), defaults.yahoo_base_url),
            nse_base_url: base_url(lookup("NSE_BASE_URL"), defaults.nse_base_url),
            screener_base_url: base_url(lookup("SCREENER_BASE_URL"), defaults.screener_base_url),
        })
    }

    pub fn enrichment_configured(&self) -> bool {
        self.gemini_api_key.is_some()
    }
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| AnalysisError::Config(format!("{} has invalid value '{}'", key, raw)))
}

fn parse_timeout(key: &str, raw: &str) -> Result<Duration> {
    let secs = parse_value::<u64>(key, raw)?;
    if !TIMEOUT_SECS_RANGE.contains(&secs) {
        return Err(AnalysisError::Config(format!(
            "{} must be between {} and {} seconds, got {}",
            key,
            TIMEOUT_SECS_RANGE.start(),
            TIMEOUT_SECS_RANGE.end(),
            secs
        )));
    }
    Ok(Duration::from_secs(secs))
}

fn base_url(value: Option<String>, default: String) -> String {
    value
        .filter(|v| !v.trim().is_empty())
        .unwrap_or(default)
        .trim_end_matches('/')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.source_timeout, Duration::from_secs(12));
        assert!(!config.enrichment_configured());
        assert_eq!(config.nse_base_url, DEFAULT_NSE_BASE_URL);
    }

    #[test]
    fn test_placeholder_key_is_not_configured() {
        let config = AppConfig::from_lookup(lookup_from(&[(
            "GEMINI_API_KEY",
            "your_gemini_api_key_here",
        )]))
        .unwrap();
        assert!(config.gemini_api_key.is_none());

        let config =
            AppConfig::from_lookup(lookup_from(&[("GEMINI_API_KEY", " abc123 ")])).unwrap();
        assert_eq!(config.gemini_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn test_overrides_and_trailing_slash() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("API_PORT", "9000"),
            ("SOURCE_TIMEOUT_SECS", "5"),
            ("SCREENER_BASE_URL", "http://localhost:3000/"),
        ]))
        .unwrap();
        assert_eq!(config.port, 9000);
        assert_eq!(config.source_timeout, Duration::from_secs(5));
        assert_eq!(config.screener_base_url, "http://localhost:3000");
    }

    #[test]
    fn test_malformed_number_is_config_error() {
        let err = AppConfig::from_lookup(lookup_from(&[("SOURCE_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Config(_)));
    }

    #[test]
    fn test_timeout_out_of_range_is_config_error() {
        for (key, raw) in [
            ("SOURCE_TIMEOUT_SECS", "0"),
            ("SOURCE_TIMEOUT_SECS", "18446744073709551615"),
            ("ENRICHMENT_TIMEOUT_SECS", "301"),
        ] {
            let err = AppConfig::from_lookup(lookup_from(&[(key, raw)])).unwrap_err();
            assert!(matches!(err, AnalysisError::Config(_)), "{}={}", key, raw);
        }

        let config = AppConfig::from_lookup(lookup_from(&[
            ("SOURCE_TIMEOUT_SECS", "1"),
            ("ENRICHMENT_TIMEOUT_SECS", "300"),
        ]))
        .unwrap();
        assert_eq!(config.source_timeout, Duration::from_secs(1));
        assert_eq!(config.enrichment_timeout, Duration::from_secs(300));
    }
}
