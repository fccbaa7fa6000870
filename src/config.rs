use std::net::IpAddr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: IpAddr,
    pub port: u16,
    pub max_body_size: usize,
    pub log_level: String,
    pub upstream: UpstreamConfig,
}

#[derive(Debug, Clone)]
pub struct UpstreamConfig {
    pub url: String,
    pub api_key: Option<String>,
    pub timeout: Duration,
    pub max_concurrent: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        let database_url = env_required("DATABASE_URL")?;

        let db_max_connections: u32 = env_or("PROXY_DB_MAX_CONNECTIONS", "10")
            .parse()
            .map_err(|e| format!("Invalid PROXY_DB_MAX_CONNECTIONS: {e}"))?;

        let host: IpAddr = env_or("PROXY_HOST", "0.0.0.0")
            .parse()
            .map_err(|e| format!("Invalid PROXY_HOST: {e}"))?;

        let port: u16 = env_or("PROXY_PORT", "8080")
            .parse()
            .map_err(|e| format!("Invalid PROXY_PORT: {e}"))?;

        let max_body_size: usize = env_or("PROXY_MAX_BODY_SIZE", "1048576")
            .parse()
            .map_err(|e| format!("Invalid PROXY_MAX_BODY_SIZE: {e}"))?;

        let log_level = env_or("PROXY_LOG_LEVEL", "info");

        Ok(Config {
            database_url,
            db_max_connections,
            host,
            port,
            max_body_size,
            log_level,
            upstream: UpstreamConfig::from_env()?,
        })
    }
}

impl UpstreamConfig {
    fn from_env() -> Result<Self, String> {
        let url = env_required("UPSTREAM_URL")?;
        reqwest::Url::parse(&url).map_err(|e| format!("Invalid UPSTREAM_URL: {e}"))?;

        let api_key = std::env::var("UPSTREAM_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty());

        let timeout_secs: u64 = env_or("UPSTREAM_TIMEOUT_SECS", "30")
            .parse()
            .map_err(|e| format!("Invalid UPSTREAM_TIMEOUT_SECS: {e}"))?;

        let max_concurrent: usize = env_or("UPSTREAM_MAX_CONCURRENT", "5")
            .parse()
            .map_err(|e| format!("Invalid UPSTREAM_MAX_CONCURRENT: {e}"))?;
        if max_concurrent == 0 {
            return Err("UPSTREAM_MAX_CONCURRENT must be at least 1".to_string());
        }

        Ok(UpstreamConfig {
            url,
            api_key,
            timeout: Duration::from_secs(timeout_secs),
            max_concurrent,
        })
    }
}

fn env_required(key: &str) -> Result<String, String> {
    std::env::var(key).map_err(|_| format!("Missing required environment variable: {key}"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
