use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
    "secret",
];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub jwt_secret: String,
    pub jwt_expires_hours: i64,
    pub upload_dir: PathBuf,
    pub upload_url_prefix: String,
    pub profile_window_days: u64,
    pub request_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let jwt_secret = get("PEAKSTREAK_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            bail!("PEAKSTREAK_JWT_SECRET is unset or still a placeholder");
        }

        let upload_url_prefix = var("PEAKSTREAK_UPLOAD_URL_PREFIX", "/uploads/avatars");
        if !upload_url_prefix.starts_with('/') {
            bail!("PEAKSTREAK_UPLOAD_URL_PREFIX must start with '/'");
        }

        Ok(Self {
            host: var("PEAKSTREAK_HOST", "0.0.0.0"),
            port: parse(&get, "PEAKSTREAK_PORT", 8080)?,
            db_path: var("PEAKSTREAK_DB_PATH", "peakstreak.db").into(),
            jwt_secret,
            jwt_expires_hours: parse(&get, "PEAKSTREAK_JWT_EXPIRES_HOURS", 24)?,
            upload_dir: var("PEAKSTREAK_UPLOAD_DIR", "./uploads/avatars").into(),
            upload_url_prefix,
            profile_window_days: parse(&get, "PEAKSTREAK_PROFILE_WINDOW_DAYS", 90)?,
            request_timeout: Duration::from_secs(parse(&get, "PEAKSTREAK_REQUEST_TIMEOUT_SECS", 60)?),
        })
    }
}

fn parse<T>(get: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match get(key) {
        Some(raw) => raw.parse().with_context(|| format!("{} has an invalid value '{}'", key, raw)),
        None => Ok(default),
    }
}
