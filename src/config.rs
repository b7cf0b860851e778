use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

/// Process configuration, loaded once from the environment at startup.
pub struct Config {
    pub port: u16,
    pub database_url: String,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub db_max_connections: u32,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("TIFFIN_PORT", "3000"),
            database_url: require("DATABASE_URL"),
            jwt_secret: require("JWT_SECRET"),
            token_ttl_hours: try_load("TOKEN_TTL_HOURS", "24"),
            db_max_connections: try_load("DB_MAX_CONNECTIONS", "10"),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}

fn require(key: &str) -> String {
    env::var(key)
        .map_err(|_| {
            warn!("Required environment variable {key} is missing");
        })
        .expect("Environment misconfigured!")
}
