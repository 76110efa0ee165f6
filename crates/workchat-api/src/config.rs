use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::warn;

const DEV_JWT_SECRET: &str = "dev-secret-change-me";
const DEV_ADMIN_PASSWORD: &str = "Admin123!";

/// Runtime settings, read from `WORKCHAT_*` environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    pub session_hours: i64,
    /// Seeded at startup and protected from deletion.
    pub admin_email: String,
    pub admin_password: String,
    pub password_min_length: usize,
    pub reset_token_minutes: i64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from("workchat.db"),
            host: "0.0.0.0".into(),
            port: 3000,
            jwt_secret: DEV_JWT_SECRET.into(),
            session_hours: 12,
            admin_email: "admin@local".into(),
            admin_password: DEV_ADMIN_PASSWORD.into(),
            password_min_length: 6,
            reset_token_minutes: 60,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let config = Self {
            db_path: std::env::var("WORKCHAT_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_path),
            host: std::env::var("WORKCHAT_HOST").unwrap_or(defaults.host),
            port: parsed("WORKCHAT_PORT", defaults.port)?,
            jwt_secret: std::env::var("WORKCHAT_JWT_SECRET").unwrap_or(defaults.jwt_secret),
            session_hours: parsed("WORKCHAT_SESSION_HOURS", defaults.session_hours)?,
            admin_email: std::env::var("WORKCHAT_ADMIN_EMAIL").unwrap_or(defaults.admin_email),
            admin_password: std::env::var("WORKCHAT_ADMIN_PASSWORD").unwrap_or(defaults.admin_password),
            password_min_length: parsed("WORKCHAT_PASSWORD_MIN_LENGTH", defaults.password_min_length)?,
            reset_token_minutes: parsed("WORKCHAT_RESET_TOKEN_MINUTES", defaults.reset_token_minutes)?,
        };

        if config.jwt_secret == DEV_JWT_SECRET {
            warn!("WORKCHAT_JWT_SECRET not set, using the development secret");
        }
        if config.admin_password == DEV_ADMIN_PASSWORD {
            warn!("WORKCHAT_ADMIN_PASSWORD not set, the seeded admin uses the default password");
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("{key} has an invalid value '{raw}'")),
        Err(_) => Ok(default),
    }
}
