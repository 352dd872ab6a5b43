use anyhow::{Context, Result};
use async_trait::async_trait;
use guess_core::{CaptureFailure, DeviceApi, Frame};
use misty_client::{Client, Config, MistyError};
use std::time::Duration;

/// Implements the session's `DeviceApi` on top of the Misty REST client.
/// Errors are flattened here so nothing past this boundary sees a `MistyError`.
pub struct MistyDevice {
    client: Client,
}

impl MistyDevice {
    pub fn new(address: &str, timeout: Duration) -> Result<Self> {
        let config = Config::builder()
            .with_address(address)
            .with_timeout(timeout)
            .build();
        let client = Client::new(config)
            .with_context(|| format!("Failed to create device client for '{address}'"))?;
        Ok(Self { client })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl DeviceApi for MistyDevice {
    async fn capture_frame(&self) -> Result<Frame, CaptureFailure> {
        self.client
            .capture_rgb()
            .await
            .map(Frame::new)
            .map_err(to_capture_failure)
    }

    async fn speak(&self, text: &str) -> bool {
        match self.client.speak(text).await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!("Speak request failed: {}", e);
                false
            }
        }
    }

    async fn check_status(&self) -> bool {
        match self.client.device_info().await {
            Ok(Some(info)) => {
                tracing::debug!("Device status: {}", info);
                true
            }
            Ok(None) => true,
            Err(e) => {
                tracing::warn!("Status probe failed: {}", e);
                false
            }
        }
    }
}

fn to_capture_failure(e: MistyError) -> CaptureFailure {
    match e {
        MistyError::Status(code) => CaptureFailure::Status(code),
        other if other.is_timeout() => CaptureFailure::Transport(format!("timed out: {other}")),
        other => CaptureFailure::Transport(other.to_string()),
    }
}
