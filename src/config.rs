use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} has an invalid value: {value}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub app_url: String,
    pub frontend_url: String,
    pub jwt_secret: String,
    /// Token lifetime in minutes.
    pub jwt_maxage: i64,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub redis_url: Option<String>,
    // Reverse geocoding
    pub geocoder_url: String,
    pub geocoder_user_agent: String,
    pub geocode_timeout_ms: u64,
    // Dashboards
    pub dashboard_page_size: u32,
    /// Seconds an untouched dashboard list is kept.
    pub dashboard_idle_secs: u64,
    pub map_feed_cache_ttl: usize,
    pub map_center_lat: f64,
    pub map_center_lng: f64,
    pub login_rate_limit: usize,
    // Mail
    pub resend_api_key: Option<String>,
    pub from_email: String,
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::Missing(name))
}

fn optional(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parsed<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match optional(name) {
        Some(value) => value
            .parse::<T>()
            .map_err(|_| ConfigError::Invalid { name, value }),
        None => Ok(default),
    }
}

impl Config {
    pub fn init() -> Result<Config, ConfigError> {
        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET_KEY")?;
        let jwt_maxage = required("JWT_MAXAGE")?;
        let jwt_maxage = jwt_maxage.parse::<i64>().map_err(|_| ConfigError::Invalid {
            name: "JWT_MAXAGE",
            value: jwt_maxage,
        })?;

        let port = parsed("PORT", 8000u16)?;
        let app_url = optional("APP_URL").unwrap_or_else(|| format!("http://localhost:{}", port));
        let frontend_url =
            optional("FRONTEND_URL").unwrap_or_else(|| "http://localhost:5173".to_string());

        let cors_origins = optional("CORS_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec![frontend_url.clone()]);

        Ok(Config {
            database_url,
            app_url,
            frontend_url,
            jwt_secret,
            jwt_maxage,
            port,
            cors_origins,
            redis_url: optional("REDIS_URL"),
            geocoder_url: optional("GEOCODER_URL")
                .unwrap_or_else(|| "https://nominatim.openstreetmap.org/reverse".to_string()),
            geocoder_user_agent: optional("GEOCODER_USER_AGENT")
                .unwrap_or_else(|| "lapormap/0.1".to_string()),
            geocode_timeout_ms: parsed("GEOCODE_TIMEOUT_MS", 1500)?,
            dashboard_page_size: parsed("DASHBOARD_PAGE_SIZE", 10)?,
            dashboard_idle_secs: parsed("DASHBOARD_IDLE_SECS", 1800)?,
            map_feed_cache_ttl: parsed("MAP_FEED_CACHE_TTL", 30)?,
            map_center_lat: parsed("MAP_CENTER_LAT", -7.28916)?,
            map_center_lng: parsed("MAP_CENTER_LNG", 112.73439)?,
            login_rate_limit: parsed("LOGIN_RATE_LIMIT", 5)?,
            resend_api_key: optional("RESEND_API_KEY"),
            from_email: optional("FROM_EMAIL")
                .unwrap_or_else(|| "Lapor Map <noreply@lapormap.id>".to_string()),
        })
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Config {
        Config {
            database_url: "postgres://localhost/lapormap_test".to_string(),
            app_url: "http://localhost:8000".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            jwt_secret: "test-secret".to_string(),
            jwt_maxage: 60,
            port: 8000,
            cors_origins: vec!["http://localhost:5173".to_string()],
            redis_url: None,
            geocoder_url: "http://127.0.0.1:9/reverse".to_string(),
            geocoder_user_agent: "lapormap-tests".to_string(),
            geocode_timeout_ms: 50,
            dashboard_page_size: 2,
            dashboard_idle_secs: 1800,
            map_feed_cache_ttl: 30,
            map_center_lat: -7.28916,
            map_center_lng: 112.73439,
            login_rate_limit: 3,
            resend_api_key: None,
            from_email: "tests <noreply@example.com>".to_string(),
        }
    }
}
