//! Runtime configuration
//!
//! Loaded from environment variables with defaults for every value. The two
//! deployed variants (six-point window with forecasting, single-point ticker)
//! are presets of the same configuration.

use crate::error::{AppError, Result};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_FEED_URL: &str = "https://fr.investing.com/commodities/crude-oil-commentary";
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";
pub const DEFAULT_LOG_PATH: &str = "crude_oil_data.csv";

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub feed_url: Url,
    pub user_agent: String,
    pub fetch_timeout: Duration,
    pub log_path: PathBuf,
    pub history_capacity: usize,
    pub forecast_enabled: bool,
    pub ingest_interval: Duration,
    pub host: String,
    pub port: u16,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            // Constant, known to parse
            feed_url: Url::parse(DEFAULT_FEED_URL).expect("default feed url is valid"),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            fetch_timeout: Duration::from_secs(15),
            log_path: PathBuf::from(DEFAULT_LOG_PATH),
            history_capacity: 6,
            forecast_enabled: true,
            ingest_interval: Duration::from_secs(10),
            host: "127.0.0.1".to_string(),
            port: 5000,
        }
    }
}

impl AppConfig {
    /// Single-point window without forecasting
    pub fn ticker() -> Self {
        Self {
            history_capacity: 1,
            forecast_enabled: false,
            ..Self::default()
        }
    }

    /// Load configuration from the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(url) = lookup("PRICE_FEED_URL") {
            config.feed_url = Url::parse(&url)
                .map_err(|e| AppError::Config(format!("Invalid PRICE_FEED_URL '{}': {}", url, e)))?;
        }
        if let Some(agent) = lookup("PRICE_FEED_USER_AGENT").filter(|v| !v.trim().is_empty()) {
            config.user_agent = agent;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "PRICE_FEED_TIMEOUT_SECS")? {
            config.fetch_timeout = Duration::from_secs(secs);
        }
        if let Some(path) = lookup("PRICE_LOG_PATH").filter(|v| !v.trim().is_empty()) {
            config.log_path = PathBuf::from(path);
        }
        if let Some(capacity) = parse_var::<usize>(&lookup, "HISTORY_CAPACITY")? {
            config.history_capacity = capacity;
        }
        if let Some(flag) = lookup("FORECAST_ENABLED") {
            config.forecast_enabled = parse_flag(&flag)
                .ok_or_else(|| AppError::Config(format!("Invalid FORECAST_ENABLED '{}'", flag)))?;
        }
        if let Some(secs) = parse_var::<u64>(&lookup, "INGEST_INTERVAL_SECS")? {
            config.ingest_interval = Duration::from_secs(secs);
        }
        if let Some(host) = lookup("API_HOST").filter(|v| !v.trim().is_empty()) {
            config.host = host;
        }
        if let Some(port) = parse_var::<u16>(&lookup, "API_PORT")? {
            config.port = port;
        }

        config.validate()?;
        Ok(config)
    }

    /// Reject values the ingestion pipeline cannot run with
    pub fn validate(&self) -> Result<()> {
        if self.history_capacity == 0 {
            return Err(AppError::Config("HISTORY_CAPACITY must be at least 1".to_string()));
        }
        if self.ingest_interval.is_zero() {
            return Err(AppError::Config("INGEST_INTERVAL_SECS must be at least 1".to_string()));
        }
        if self.fetch_timeout.is_zero() {
            return Err(AppError::Config("PRICE_FEED_TIMEOUT_SECS must be at least 1".to_string()));
        }
        Ok(())
    }

    /// Socket address for the API server
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid address {}:{}: {}", self.host, self.port, e)))
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| AppError::Config(format!("Invalid {} '{}': {}", key, raw, e))),
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "on" | "ON" | "yes" => Some(true),
        "0" | "false" | "FALSE" | "off" | "OFF" | "no" => Some(false),
        _ => None,
    }
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
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_without_env() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config.history_capacity, 6);
        assert!(config.forecast_enabled);
        assert_eq!(config.ingest_interval, Duration::from_secs(10));
        assert_eq!(config.log_path, PathBuf::from(DEFAULT_LOG_PATH));
        assert_eq!(config.bind_addr().unwrap().port(), 5000);
    }

    #[test]
    fn test_ticker_preset() {
        let config = AppConfig::ticker();
        assert_eq!(config.history_capacity, 1);
        assert!(!config.forecast_enabled);
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("HISTORY_CAPACITY", "1"),
            ("FORECAST_ENABLED", "off"),
            ("INGEST_INTERVAL_SECS", "30"),
            ("PRICE_LOG_PATH", "/tmp/prices.csv"),
            ("API_PORT", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.history_capacity, 1);
        assert!(!config.forecast_enabled);
        assert_eq!(config.ingest_interval, Duration::from_secs(30));
        assert_eq!(config.log_path, PathBuf::from("/tmp/prices.csv"));
        assert_eq!(config.port, 8080);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("HISTORY_CAPACITY", "0")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("HISTORY_CAPACITY", "six")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("FORECAST_ENABLED", "maybe")])).is_err());
        assert!(AppConfig::from_lookup(lookup_from(&[("PRICE_FEED_URL", "not a url")])).is_err());
    }
}
