use chrono::FixedOffset;
use std::{env, fs, path::Path, time::Duration};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{0} is required to start the client")]
    Missing(&'static str),
    #[error("invalid value for {name}: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Client configuration loaded from environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base_url: String,
    pub identity_public_key: String,
    pub request_timeout: Duration,
    pub bookings_page_size: u32,
    pub search_debounce: Duration,
    pub local_offset: FixedOffset,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_base_url = required(&lookup, "API_BASE_URL")?;
        let key_raw = required(&lookup, "IDENTITY_PUBLIC_KEY")?;
        let identity_public_key = resolve_pem(&key_raw)?;

        let request_timeout_secs = optional(&lookup, "REQUEST_TIMEOUT_SECS", 10u64)?;
        let bookings_page_size = optional(&lookup, "BOOKINGS_PAGE_SIZE", 10u32)?;
        if bookings_page_size == 0 {
            return Err(ConfigError::Invalid {
                name: "BOOKINGS_PAGE_SIZE",
                reason: "must be at least 1".into(),
            });
        }
        let debounce_ms = optional(&lookup, "SEARCH_DEBOUNCE_MS", 500u64)?;
        let offset_minutes = optional(&lookup, "LOCAL_UTC_OFFSET_MINUTES", 0i32)?;
        let local_offset =
            FixedOffset::east_opt(offset_minutes * 60).ok_or_else(|| ConfigError::Invalid {
                name: "LOCAL_UTC_OFFSET_MINUTES",
                reason: format!("{offset_minutes} is out of range"),
            })?;

        Ok(Self {
            api_base_url: api_base_url.trim_end_matches('/').to_string(),
            identity_public_key,
            request_timeout: Duration::from_secs(request_timeout_secs),
            bookings_page_size,
            search_debounce: Duration::from_millis(debounce_ms),
            local_offset,
        })
    }
}

fn required<F>(lookup: &F, name: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn optional<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name).map(|v| v.trim().to_string()) {
        None => Ok(default),
        Some(v) if v.is_empty() => Ok(default),
        Some(v) => v.parse().map_err(|err: T::Err| ConfigError::Invalid {
            name,
            reason: err.to_string(),
        }),
    }
}

// Accepts either inline PEM text or a path to a PEM file.
fn resolve_pem(raw: &str) -> Result<String, ConfigError> {
    if raw.contains("-----BEGIN") {
        return Ok(raw.replace("\\n", "\n"));
    }
    let path = Path::new(raw);
    fs::read_to_string(path).map_err(|err| ConfigError::Invalid {
        name: "IDENTITY_PUBLIC_KEY",
        reason: format!("not PEM text and unreadable as a file ({err})"),
    })
}
