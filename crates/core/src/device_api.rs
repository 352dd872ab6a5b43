use crate::types::Frame;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Why a capture attempt produced no frame.
///
/// Capture failures are transient: the loop reports them and carries on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CaptureFailure {
    /// The device answered with a non-success status code.
    #[error("HTTP Error {0}")]
    Status(u16),
    /// The request never completed (unreachable host, timeout, reset).
    #[error("{0}")]
    Transport(String),
}

/// The three remote operations the session needs from the robot.
///
/// Implementations must never panic or return errors past this boundary for
/// `speak` and `check_status`; failures are logged and flattened to `false`.
/// Each call is expected to carry its own short timeout.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait DeviceApi: Send + Sync {
    /// Pulls one still image from the camera.
    async fn capture_frame(&self) -> Result<Frame, CaptureFailure>;

    /// Asks the device to say `text`. Returns whether it acknowledged.
    async fn speak(&self, text: &str) -> bool;

    /// Lightweight reachability probe, used once when connecting.
    async fn check_status(&self) -> bool;
}
