use std::env;
use std::str::FromStr;

use log::warn;

use crate::utils::pagination::DEFAULT_PAGE_SIZE;

const DEFAULT_JWT_SECRET: &str = "secret";

/// Runtime settings read from the environment (and `.env`, if present).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub jwt_secret: String,
    pub jwt_ttl_hours: i64,
    pub page_size: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 8000,
            mongodb_uri: "mongodb://localhost:27017".to_string(),
            database_name: "blogicum".to_string(),
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            jwt_ttl_hours: 24,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; unset or unparsable values keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let config = Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parsed(&lookup, "PORT", defaults.port),
            mongodb_uri: lookup("MONGODB_URI").unwrap_or(defaults.mongodb_uri),
            database_name: lookup("DATABASE_NAME").unwrap_or(defaults.database_name),
            jwt_secret: lookup("JWT_SECRET").unwrap_or(defaults.jwt_secret),
            jwt_ttl_hours: parsed(&lookup, "JWT_TTL_HOURS", defaults.jwt_ttl_hours),
            page_size: parsed(&lookup, "PAGE_SIZE", defaults.page_size).max(1),
        };

        if config.jwt_secret == DEFAULT_JWT_SECRET {
            warn!("JWT_SECRET is not set; using the insecure default");
        }

        config
    }
}

fn parsed<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has an invalid value {:?}; using the default", key, raw);
            default
        }),
        None => default,
    }
}
