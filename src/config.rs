use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_PLACES_SEARCH_URL: &str = "https://places.googleapis.com/v1/places:searchText";
pub const DEFAULT_OPENAI_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_JUSTIFICATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_PHOTO_PROXY_PATH: &str = "/api/places/photo";
pub const DEFAULT_PLACES_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_JUSTIFICATION_TIMEOUT_MS: u64 = 8_000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value '{value}' for {name}: {source}")]
    InvalidNumber {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    #[error("invalid bind address '{value}': {source}")]
    InvalidBindAddr {
        value: String,
        #[source]
        source: std::net::AddrParseError,
    },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    /// Places source credential. Without it every recommendation fails with a
    /// configuration error before any network call.
    pub google_maps_api_key: Option<String>,
    pub places_search_url: String,
    pub places_timeout: Duration,
    /// Text generator credential. Without it justifications are skipped.
    pub openai_api_key: Option<String>,
    pub openai_chat_url: String,
    pub justification_model: String,
    pub justification_timeout: Duration,
    pub photo_proxy_path: String,
}

impl Config {
    /// Reads the environment, loading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let get_or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let bind_value = get_or_default("WHATSPOT_BIND_ADDR", DEFAULT_BIND_ADDR);
        let bind_addr = bind_value
            .parse::<SocketAddr>()
            .map_err(|source| ConfigError::InvalidBindAddr {
                value: bind_value.clone(),
                source,
            })?;

        Ok(Config {
            bind_addr,
            google_maps_api_key: get("GOOGLE_MAPS_API_KEY"),
            places_search_url: get_or_default("PLACES_SEARCH_URL", DEFAULT_PLACES_SEARCH_URL),
            places_timeout: parse_millis(
                "PLACES_TIMEOUT_MS",
                get("PLACES_TIMEOUT_MS"),
                DEFAULT_PLACES_TIMEOUT_MS,
            )?,
            openai_api_key: get("OPENAI_API_KEY"),
            openai_chat_url: get_or_default("OPENAI_CHAT_URL", DEFAULT_OPENAI_CHAT_URL),
            justification_model: get_or_default("JUSTIFICATION_MODEL", DEFAULT_JUSTIFICATION_MODEL),
            justification_timeout: parse_millis(
                "JUSTIFICATION_TIMEOUT_MS",
                get("JUSTIFICATION_TIMEOUT_MS"),
                DEFAULT_JUSTIFICATION_TIMEOUT_MS,
            )?,
            photo_proxy_path: get_or_default("PHOTO_PROXY_PATH", DEFAULT_PHOTO_PROXY_PATH),
        })
    }
}

fn parse_millis(name: &'static str, value: Option<String>, default: u64) -> Result<Duration, ConfigError> {
    let millis = match value {
        Some(value) => value
            .parse::<u64>()
            .map_err(|source| ConfigError::InvalidNumber { name, value, source })?,
        None => default,
    };
    Ok(Duration::from_millis(millis))
}
