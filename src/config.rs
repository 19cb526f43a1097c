use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;
use crate::error::{AppError, Result};

pub const DEFAULT_NOTION_API_BASE_URL: &str = "https://api.notion.com/v1";
pub const DEFAULT_NOTION_VERSION: &str = "2022-06-28";

/// Column names of the target database. They must match the database schema
/// exactly, including case.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyNames {
    pub title: String,
    pub summary: String,
    pub content: String,
    pub url: String,
    pub date: String,
}

impl Default for PropertyNames {
    fn default() -> Self {
        PropertyNames {
            title: "Name".into(),
            summary: "Summary".into(),
            content: "Content".into(),
            url: "URL".into(),
            date: "Date".into(),
        }
    }
}

#[derive(Clone)]
pub struct Config {
    pub server_addr: SocketAddr,
    pub notion_token: String,
    pub notion_database_id: String,
    pub notion_api_base_url: String,
    pub notion_version: String,
    pub notion_timeout: Duration,
    pub properties: PropertyNames,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("server_addr", &self.server_addr)
            .field("notion_token", &"<redacted>")
            .field("notion_database_id", &self.notion_database_id)
            .field("notion_api_base_url", &self.notion_api_base_url)
            .field("notion_version", &self.notion_version)
            .field("notion_timeout", &self.notion_timeout)
            .field("properties", &self.properties)
            .finish()
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Load environment variables from .env file if it exists
        dotenv::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let required = |key: &str| {
            var(key).ok_or_else(|| AppError::ConfigError(format!("{} must be set", key)))
        };

        let notion_token = required("NOTION_TOKEN")?;
        let notion_database_id = required("NOTION_DATABASE_ID")?;

        let host = var("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("PORT").unwrap_or_else(|| "10000".to_string());
        let port = port.parse::<u16>().map_err(|e| AppError::ConfigError(format!("Invalid port: {}", e)))?;
        let ip = IpAddr::from_str(&host).map_err(|e| AppError::ConfigError(format!("Invalid host address: {}", e)))?;

        let notion_api_base_url = var("NOTION_API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_NOTION_API_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        url::Url::parse(&notion_api_base_url)
            .map_err(|e| AppError::ConfigError(format!("Invalid NOTION_API_BASE_URL: {}", e)))?;

        let notion_version = var("NOTION_VERSION").unwrap_or_else(|| DEFAULT_NOTION_VERSION.to_string());

        let timeout_secs = match var("NOTION_TIMEOUT_SECS") {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|e| AppError::ConfigError(format!("Invalid NOTION_TIMEOUT_SECS: {}", e)))?,
            None => 10,
        };
        if timeout_secs == 0 {
            return Err(AppError::ConfigError("NOTION_TIMEOUT_SECS must be greater than zero".into()));
        }

        let defaults = PropertyNames::default();
        let properties = PropertyNames {
            title: var("NOTION_TITLE_PROPERTY").unwrap_or(defaults.title),
            summary: var("NOTION_SUMMARY_PROPERTY").unwrap_or(defaults.summary),
            content: var("NOTION_CONTENT_PROPERTY").unwrap_or(defaults.content),
            url: var("NOTION_URL_PROPERTY").unwrap_or(defaults.url),
            date: var("NOTION_DATE_PROPERTY").unwrap_or(defaults.date),
        };

        Ok(Config {
            server_addr: SocketAddr::new(ip, port),
            notion_token,
            notion_database_id,
            notion_api_base_url,
            notion_version,
            notion_timeout: Duration::from_secs(timeout_secs),
            properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("NOTION_TOKEN", "secret_abc"),
            ("NOTION_DATABASE_ID", "db123"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "0.0.0.0:10000".parse::<SocketAddr>().unwrap());
        assert_eq!(config.notion_api_base_url, DEFAULT_NOTION_API_BASE_URL);
        assert_eq!(config.notion_version, DEFAULT_NOTION_VERSION);
        assert_eq!(config.notion_timeout, Duration::from_secs(10));
        assert_eq!(config.properties, PropertyNames::default());
    }

    #[test]
    fn test_missing_token_fails() {
        let err = Config::from_lookup(lookup(&[("NOTION_DATABASE_ID", "db123")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(ref msg) if msg.contains("NOTION_TOKEN")));
    }

    #[test]
    fn test_missing_database_id_fails() {
        let err = Config::from_lookup(lookup(&[("NOTION_TOKEN", "secret_abc")])).unwrap_err();
        assert!(matches!(err, AppError::ConfigError(ref msg) if msg.contains("NOTION_DATABASE_ID")));
    }

    #[test]
    fn test_empty_token_counts_as_missing() {
        let err = Config::from_lookup(lookup(&[
            ("NOTION_TOKEN", "  "),
            ("NOTION_DATABASE_ID", "db123"),
        ]))
        .unwrap_err();
        assert!(matches!(err, AppError::ConfigError(_)));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("NOTION_TOKEN", "secret_abc"),
            ("NOTION_DATABASE_ID", "db123"),
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("NOTION_API_BASE_URL", "http://localhost:9000/v1/"),
            ("NOTION_TIMEOUT_SECS", "3"),
            ("NOTION_TITLE_PROPERTY", "名前"),
        ]))
        .unwrap();

        assert_eq!(config.server_addr, "127.0.0.1:8080".parse::<SocketAddr>().unwrap());
        assert_eq!(config.notion_api_base_url, "http://localhost:9000/v1");
        assert_eq!(config.notion_timeout, Duration::from_secs(3));
        assert_eq!(config.properties.title, "名前");
        assert_eq!(config.properties.summary, "Summary");
    }

    #[test]
    fn test_invalid_values_fail() {
        let base = [("NOTION_TOKEN", "secret_abc"), ("NOTION_DATABASE_ID", "db123")];

        let mut bad_port = base.to_vec();
        bad_port.push(("PORT", "not-a-port"));
        assert!(Config::from_lookup(lookup(&bad_port)).is_err());

        let mut zero_timeout = base.to_vec();
        zero_timeout.push(("NOTION_TIMEOUT_SECS", "0"));
        assert!(Config::from_lookup(lookup(&zero_timeout)).is_err());
    }

    #[test]
    fn test_debug_redacts_token() {
        let config = Config::from_lookup(lookup(&[
            ("NOTION_TOKEN", "secret_abc"),
            ("NOTION_DATABASE_ID", "db123"),
        ]))
        .unwrap();
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("secret_abc"));
        assert!(rendered.contains("<redacted>"));
    }
}
