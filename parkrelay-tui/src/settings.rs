//! Settings read from the environment (and an optional `.env` file).

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use parkrelay_provider_landscape::DEFAULT_TIMEOUT;

const API_KEY: &str = "PARKRELAY_API_KEY";
const BASE_URL: &str = "PARKRELAY_BASE_URL";
const TIMEOUT_SECS: &str = "PARKRELAY_TIMEOUT_SECS";
const LOG_PATH: &str = "PARKRELAY_LOG";

const DEFAULT_LOG_PATH: &str = "parkrelay.log";

#[derive(Debug, Clone)]
pub(crate) struct Settings {
    pub api_key: String,
    pub base_url: Option<String>,
    pub timeout: Duration,
    pub log_path: PathBuf,
}

impl Settings {
    pub(crate) fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let timeout = match env::var(TIMEOUT_SECS) {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_secs)
                .with_context(|| format!("{TIMEOUT_SECS} must be a whole number of seconds"))?,
            Err(_) => DEFAULT_TIMEOUT,
        };

        Ok(Self {
            api_key: env::var(API_KEY).unwrap_or_default(),
            base_url: env::var(BASE_URL).ok().filter(|url| !url.trim().is_empty()),
            timeout,
            log_path: env::var_os(LOG_PATH).map_or_else(|| PathBuf::from(DEFAULT_LOG_PATH), PathBuf::from),
        })
    }
}
