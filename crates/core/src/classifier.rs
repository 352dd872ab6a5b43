use crate::types::{Frame, Prediction};
use anyhow::Result;
#[cfg(test)]
use mockall::automock;

// The session only needs "frame in, prediction out". Keeping that behind a trait lets
// the controller be driven by a mock in tests, and keeps the ONNX runtime out of core.
#[cfg_attr(test, automock)]
pub trait Classifier: Send + Sync {
    /// Scores one frame. An error here means the frame could not be turned into a
    /// prediction at all (undecodable image, runtime failure), which ends the loop.
    fn classify(&self, frame: &Frame) -> Result<Prediction>;
}
