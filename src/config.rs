use anyhow::{bail, Context};
use dotenvy::dotenv;
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-please-change";

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub production: bool,
    pub bind_addr: SocketAddr,
    pub token_ttl: Duration,
    pub bcrypt_cost: u32,
    pub max_connections: u32,
    pub run_migrations: bool,
    pub seed_demo_users: bool,
    pub principal_cache_ttl: Duration,
    pub request_timeout: Duration,
    pub log_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::new(),
            jwt_secret: DEV_JWT_SECRET.to_string(),
            production: false,
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            token_ttl: Duration::from_secs(2 * 60 * 60),
            bcrypt_cost: 10,
            max_connections: 10,
            run_migrations: true,
            seed_demo_users: false,
            principal_cache_ttl: Duration::from_secs(60),
            request_timeout: Duration::from_secs(30),
            log_dir: PathBuf::from("logs"),
        }
    }
}

impl Config {
    /// ✅ Load environment variables and apply defaults
    pub fn from_env() -> anyhow::Result<Self> {
        dotenv().ok();
        let defaults = Self::default();

        let production = env::var("APP_ENV")
            .map(|value| value.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let jwt_secret = match env::var("JWT_SECRET") {
            Ok(secret) if !secret.trim().is_empty() => secret,
            _ if production => bail!("JWT_SECRET must be set when APP_ENV=production"),
            _ => {
                warn!("JWT_SECRET not set, using the development fallback secret");
                DEV_JWT_SECRET.to_string()
            }
        };

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            jwt_secret,
            production,
            bind_addr: parse_var("BIND_ADDR", defaults.bind_addr)?,
            token_ttl: Duration::from_secs(parse_var("TOKEN_TTL_SECS", defaults.token_ttl.as_secs())?),
            bcrypt_cost: parse_var("BCRYPT_COST", defaults.bcrypt_cost)?,
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS", defaults.max_connections)?,
            run_migrations: parse_var("RUN_MIGRATIONS", defaults.run_migrations)?,
            seed_demo_users: parse_var("SEED_DEMO_USERS", defaults.seed_demo_users)?,
            principal_cache_ttl: Duration::from_secs(parse_var(
                "PRINCIPAL_CACHE_TTL_SECS",
                defaults.principal_cache_ttl.as_secs(),
            )?),
            request_timeout: Duration::from_secs(parse_var(
                "REQUEST_TIMEOUT_SECS",
                defaults.request_timeout.as_secs(),
            )?),
            log_dir: env::var("LOG_DIR").map(PathBuf::from).unwrap_or(defaults.log_dir),
        })
    }
}

fn parse_var<T>(key: &str, default: T) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid value for {key}: {e}")),
        _ => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_var_falls_back_to_default_when_unset() {
        let value: u32 = parse_var("SERVER_PROVISIONING_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn default_token_lifetime_is_two_hours() {
        assert_eq!(Config::default().token_ttl, Duration::from_secs(7200));
    }
}
