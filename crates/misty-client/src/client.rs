use crate::error::MistyError;
use reqwest::Response;

mod config;
mod consts;

pub use config::{Config, ConfigBuilder};

/// HTTP client for the robot's REST API.
///
/// Holds nothing between calls except the base URL and the configured
/// timeout. Every method is a single request.
pub struct Client {
    http: reqwest::Client,
    base_url: String,
}

impl Client {
    pub fn new(config: Config) -> Result<Self, MistyError> {
        let base_url = base_url_for(config.address())?;
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;
        tracing::debug!("Device client using {} (timeout {:?})", base_url, config.timeout());
        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `GET /api/cameras/rgb`. Returns the raw image body.
    pub async fn capture_rgb(&self) -> Result<Vec<u8>, MistyError> {
        let response = self.http.get(self.url(consts::CAMERA_RGB_PATH)).send().await?;
        let bytes = ensure_success(response)?.bytes().await?;
        tracing::trace!("Captured {} bytes", bytes.len());
        Ok(bytes.to_vec())
    }

    /// `POST /api/tts/speak` with `{"text": ...}`.
    pub async fn speak(&self, text: &str) -> Result<(), MistyError> {
        let body = serde_json::json!({ "text": text });
        let response = self
            .http
            .post(self.url(consts::TTS_SPEAK_PATH))
            .json(&body)
            .send()
            .await?;
        ensure_success(response)?;
        Ok(())
    }

    /// `GET /api/device`.
    ///
    /// Any 2xx answer counts as reachable. The payload is returned when it is
    /// JSON and dropped with a warning when it is not.
    pub async fn device_info(&self) -> Result<Option<serde_json::Value>, MistyError> {
        let response = self.http.get(self.url(consts::DEVICE_PATH)).send().await?;
        let body = ensure_success(response)?.bytes().await?;
        if body.is_empty() {
            return Ok(None);
        }
        match serde_json::from_slice(&body) {
            Ok(info) => Ok(Some(info)),
            Err(e) => {
                tracing::warn!("Device info is not JSON ({} bytes): {}", body.len(), e);
                Ok(None)
            }
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn ensure_success(response: Response) -> Result<Response, MistyError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(MistyError::Status(status.as_u16()))
    }
}

// Operators type bare IPs, so a missing scheme means plain http.
fn base_url_for(address: &str) -> Result<String, MistyError> {
    let trimmed = address.trim();
    let (scheme, rest) = trimmed.split_once("://").unwrap_or(("http", trimmed));
    let rest = rest.trim_end_matches('/');
    let host = rest.strip_suffix(consts::API_PREFIX).unwrap_or(rest);

    if scheme.is_empty() || host.is_empty() {
        return Err(MistyError::InvalidAddress(address.to_string()));
    }
    Ok(format!("{scheme}://{host}{}", consts::API_PREFIX))
}
