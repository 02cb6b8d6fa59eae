//! Process configuration, read once at startup from the environment
//! (and a `.env` file, if present).

use std::env;
use std::str::FromStr;

use thiserror::Error;

use crate::relatorio::handlers::DEFAULT_JSON_LIMIT;
use crate::report::EngineSettings;

const DEFAULT_ORIGINS: &str = "http://localhost:3000,http://localhost:5173,http://localhost:8080";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub allowed_origins: Vec<String>,
    pub json_limit: usize,
    pub engine: EngineSettings,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let defaults = EngineSettings::default();

        let host = get("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = match get("PORT") {
            Some(value) => parse_number("PORT", &value)?,
            None => 8080,
        };
        let json_limit = match get("JSON_LIMIT_BYTES") {
            Some(value) => parse_number("JSON_LIMIT_BYTES", &value)?,
            None => DEFAULT_JSON_LIMIT,
        };
        let allowed_origins = get("ALLOWED_ORIGINS")
            .unwrap_or_else(|| DEFAULT_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(String::from)
            .collect();
        let debug_layout = match get("REPORT_DEBUG_LAYOUT") {
            Some(value) => parse_bool("REPORT_DEBUG_LAYOUT", &value)?,
            None => defaults.debug_layout,
        };
        let compress = match get("REPORT_COMPRESS") {
            Some(value) => parse_bool("REPORT_COMPRESS", &value)?,
            None => defaults.compress,
        };

        Ok(Self {
            host,
            port,
            allowed_origins,
            json_limit,
            engine: EngineSettings {
                debug_layout,
                compress,
            },
        })
    }
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_number<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
    })
}
