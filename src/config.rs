use anyhow::{Result, bail};
use std::env;
use std::path::Path;

pub const ENV_FILE: &str = ".env";
pub const API_KEY_VAR: &str = "DEEPSEEK_API_KEY";
pub const API_URL_VAR: &str = "DEEPSEEK_API_URL";
pub const TIMEOUT_SECS_VAR: &str = "DEEPSEEK_TIMEOUT_SECS";

const DEFAULT_API_URL: &str = "https://api.deepseek.com/v1/chat/completions";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 300;

/// Outcome of loading the optional key=value environment file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvFileStatus {
    Loaded,
    Missing,
    Failed(String),
}

/// Loads `path` into the process environment without overriding variables
/// that are already set. A missing file is not an error.
pub fn load_env_file(path: &Path) -> EnvFileStatus {
    match dotenvy::from_path(path) {
        Ok(()) => EnvFileStatus::Loaded,
        Err(err) if err.not_found() => EnvFileStatus::Missing,
        Err(err) => EnvFileStatus::Failed(err.to_string()),
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub api_url: String,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_env_with(|key| env::var(key).ok())
    }

    fn from_env_with(mut get_var: impl FnMut(&str) -> Option<String>) -> Result<Self> {
        let api_key = match get_var(API_KEY_VAR) {
            Some(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => bail!(
                "DeepSeek API key is not configured. Set the {} environment variable \
                 or add it to a {} file.",
                API_KEY_VAR,
                ENV_FILE
            ),
        };
        let api_url = parse_api_url(get_var(API_URL_VAR).as_deref());
        let request_timeout_secs = parse_request_timeout_secs(get_var(TIMEOUT_SECS_VAR).as_deref());

        Ok(Self {
            api_key,
            api_url,
            request_timeout_secs,
        })
    }
}

fn parse_api_url(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or(DEFAULT_API_URL)
        .to_string()
}

fn parse_request_timeout_secs(raw: Option<&str>) -> u64 {
    raw.and_then(|value| value.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
        .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
}
