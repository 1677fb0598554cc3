use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result};
use tracing::{debug, info};

/// Gateway settings, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub backend_url: String,
    pub backend_timeout: Duration,
    pub access_cookie: String,
    pub refresh_cookie: String,
    pub access_ttl_secs: i64,
    pub refresh_ttl_secs: i64,
    pub secure_cookies: bool,
    pub allowed_origin: String,
}

impl Config {
    /// Load from the environment, reading `.env` first if one exists
    pub fn load() -> Result<Self> {
        if let Ok(path) = dotenvy::dotenv() {
            info!("Loaded environment from {}", path.display());
        }

        Ok(Self {
            port: try_load("PORTMAN_PORT", "3000")?,
            backend_url: try_load::<String>("PORTMAN_BACKEND_URL", "http://localhost:8080")?
                .trim_end_matches('/')
                .to_string(),
            backend_timeout: Duration::from_secs(try_load("PORTMAN_BACKEND_TIMEOUT_SECS", "30")?),
            access_cookie: try_load("PORTMAN_ACCESS_COOKIE", "accessToken")?,
            refresh_cookie: try_load("PORTMAN_REFRESH_COOKIE", "refreshToken")?,
            access_ttl_secs: try_load("PORTMAN_ACCESS_TTL_SECS", "900")?,
            refresh_ttl_secs: try_load("PORTMAN_REFRESH_TTL_SECS", "604800")?,
            secure_cookies: try_load("PORTMAN_SECURE_COOKIES", "false")?,
            allowed_origin: try_load("PORTMAN_ALLOWED_ORIGIN", "http://localhost:5173")?,
        })
    }

    /// Defaults pointed at a given backend, used by tests and local tooling
    pub fn for_backend(backend_url: impl Into<String>) -> Self {
        Self {
            port: 0,
            backend_url: backend_url.into(),
            backend_timeout: Duration::from_secs(5),
            access_cookie: "accessToken".to_string(),
            refresh_cookie: "refreshToken".to_string(),
            access_ttl_secs: 900,
            refresh_ttl_secs: 604_800,
            secure_cookies: false,
            allowed_origin: "http://localhost:5173".to_string(),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        debug!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse::<T>()
        .map_err(|e| anyhow::anyhow!("{e}"))
        .with_context(|| format!("Invalid {key} value: {raw}"))
}
