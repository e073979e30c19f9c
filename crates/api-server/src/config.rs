use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    pub database_url: String,
    pub cors_origins: Vec<String>,
    pub session_cookie_secure: bool,
    pub session_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub enable_hsts: bool,
    pub brute_force: BruteForceConfig,
}

#[derive(Debug, Clone, Copy)]
pub struct BruteForceConfig {
    pub max_failures: u32,
    pub window_secs: u64,
    pub lockout_secs: u64,
}

impl Default for BruteForceConfig {
    fn default() -> Self {
        Self {
            max_failures: 5,
            window_secs: 300,
            lockout_secs: 900,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            database_url: "sqlite:strokedb.db".to_string(),
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            session_cookie_secure: false,
            session_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            enable_hsts: false,
            brute_force: BruteForceConfig::default(),
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        Ok(Self {
            bind_addr: env::var("BIND_ADDR")
                .unwrap_or_else(|_| "0.0.0.0:8000".to_string())
                .parse()
                .context("BIND_ADDR must be host:port")?,
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),
            cors_origins: env::var("CORS_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or(defaults.cors_origins),
            session_cookie_secure: env_flag("SESSION_COOKIE_SECURE"),
            session_ttl_hours: parse_var("SESSION_TTL_HOURS", defaults.session_ttl_hours)?,
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            // needs TLS termination in front of the server
            enable_hsts: env_flag("ENABLE_HSTS"),
            brute_force: BruteForceConfig {
                max_failures: parse_var("AUTH_MAX_FAILURES", 5)?,
                window_secs: parse_var("AUTH_FAILURE_WINDOW_SECS", 300)?,
                lockout_secs: parse_var("AUTH_LOCKOUT_SECS", 900)?,
            },
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{} has an invalid value: {:?}", name, raw)),
        Err(_) => Ok(default),
    }
}

fn env_flag(name: &str) -> bool {
    env::var(name)
        .map(|v| v.eq_ignore_ascii_case("true") || v == "1")
        .unwrap_or(false)
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_origins() {
        assert_eq!(
            parse_origins(" http://a.test , ,http://b.test"),
            vec!["http://a.test".to_string(), "http://b.test".to_string()]
        );
    }

    #[test]
    fn defaults_are_sane() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8000);
        assert_eq!(config.session_ttl_hours, 24);
        assert_eq!(config.brute_force.max_failures, 5);
    }
}
