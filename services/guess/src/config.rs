//! Application Configuration Module
//!
//! Collects the service settings from environment variables (and an optional
//! `.env` file) into one struct that is passed to the runtime at startup.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

pub const DEFAULT_MODEL_PATH: &str = "models/digits.onnx";
pub const DEFAULT_PROMPTS_DIR: &str = "prompts";
pub const DEFAULT_FRAME_PERIOD_MS: u64 = 100;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 5;

/// Holds all configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    pub misty_address: Option<String>,
    pub model_path: PathBuf,
    pub prompts_dir: PathBuf,
    pub frame_period: Duration,
    pub confidence_threshold: f32,
    pub request_timeout: Duration,
    pub frame_output: Option<PathBuf>,
    pub log_level: Level,
}

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `MISTY_ADDRESS`: (Optional) Robot address, used when `--address` is not given.
    /// *   `MODEL_PATH`: (Optional) ONNX digit classifier. Defaults to `models/digits.onnx`.
    /// *   `PROMPTS_DIR`: (Optional) Directory of spoken prompt templates. Defaults to `prompts`.
    /// *   `FRAME_PERIOD_MS`: (Optional) Loop period in milliseconds. Defaults to 100.
    /// *   `CONFIDENCE_THRESHOLD`: (Optional) Acceptance threshold in `[0, 1]`. Defaults to 0.8.
    /// *   `REQUEST_TIMEOUT_SECS`: (Optional) Per-request device timeout. Defaults to 5.
    /// *   `FRAME_OUTPUT`: (Optional) File the latest camera frame is written to.
    /// *   `RUST_LOG`: (Optional) The logging level. Defaults to "INFO".
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file. Ignored if not present.
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank values count as unset.
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let misty_address = get("MISTY_ADDRESS");
        let model_path = get("MODEL_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_MODEL_PATH));
        let prompts_dir = get("PROMPTS_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROMPTS_DIR));
        let frame_output = get("FRAME_OUTPUT").map(PathBuf::from);

        let frame_period_ms: u64 = parse_or(&get, "FRAME_PERIOD_MS", DEFAULT_FRAME_PERIOD_MS)?;
        if frame_period_ms == 0 {
            return Err(ConfigError::InvalidValue(
                "FRAME_PERIOD_MS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let request_timeout_secs: u64 =
            parse_or(&get, "REQUEST_TIMEOUT_SECS", DEFAULT_REQUEST_TIMEOUT_SECS)?;
        if request_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "REQUEST_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let confidence_threshold: f32 = parse_or(
            &get,
            "CONFIDENCE_THRESHOLD",
            guess_core::CONFIDENCE_THRESHOLD,
        )?;
        if !(0.0..=1.0).contains(&confidence_threshold) {
            return Err(ConfigError::InvalidValue(
                "CONFIDENCE_THRESHOLD".to_string(),
                format!("{confidence_threshold} is outside [0, 1]"),
            ));
        }

        let log_level_str = get("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        Ok(Self {
            misty_address,
            model_path,
            prompts_dir,
            frame_period: Duration::from_millis(frame_period_ms),
            confidence_threshold,
            request_timeout: Duration::from_secs(request_timeout_secs),
            frame_output,
            log_level,
        })
    }
}

fn parse_or<T, G>(get: &G, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), format!("'{raw}': {e}"))),
        None => Ok(default),
    }
}
