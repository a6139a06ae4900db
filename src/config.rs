use anyhow::{anyhow, Result};
use std::{env, fmt::Display, path::PathBuf, str::FromStr, time::Duration};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub users_file: PathBuf,
    pub upload_dir: PathBuf,
    pub classifier_url: String,
    pub classifier_timeout: Duration,
    pub bcrypt_cost: u32,
    pub expose_classifier_errors: bool,
}

impl Config {
    pub fn load() -> Result<Self> {
        Ok(Self {
            host: try_load("MOODTUNE_HOST", "127.0.0.1")?,
            port: try_load("MOODTUNE_PORT", "5000")?,
            users_file: try_load("MOODTUNE_USERS_FILE", "users.json")?,
            upload_dir: try_load("MOODTUNE_UPLOAD_DIR", "uploads")?,
            classifier_url: try_load("MOODTUNE_CLASSIFIER_URL", "http://127.0.0.1:5005")?,
            classifier_timeout: Duration::from_secs(try_load(
                "MOODTUNE_CLASSIFIER_TIMEOUT_SECS",
                "120",
            )?),
            bcrypt_cost: try_load("MOODTUNE_BCRYPT_COST", &bcrypt::DEFAULT_COST.to_string())?,
            expose_classifier_errors: try_load("MOODTUNE_EXPOSE_CLASSIFIER_ERRORS", "false")?,
        })
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    parse_value(key, &raw)
}

fn parse_value<T: FromStr>(key: &str, raw: &str) -> Result<T>
where
    T::Err: Display,
{
    raw.parse().map_err(|e| {
        warn!("Invalid {key} value: {e}");
        anyhow!("Invalid {key} value {raw:?}: {e}")
    })
}
