use crate::classifier::Classifier;
use crate::device_api::DeviceApi;
use crate::session_state::{GuessSession, SessionError};
use std::fmt;

/// Where the session stands once the device has answered.
pub enum Startup<C> {
    /// The first prompt is out; the loop can run with this classifier.
    Playing(C),
    /// Connected, but there is nothing to recognise digits with. No episode
    /// was started and no frame will be requested.
    RecognitionDisabled(String),
}

impl<C> fmt::Display for Startup<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Startup::Playing(_) => write!(f, "Digit recognition ready"),
            Startup::RecognitionDisabled(reason) => {
                write!(f, "Digit recognition disabled: {reason}")
            }
        }
    }
}

/// Connects to the device, then opens the first episode if a classifier is
/// available.
///
/// The connection is attempted even when the classifier failed to load, so an
/// unreachable device is still reported. `classifier` carries the load error
/// text when there is no model.
pub async fn start_game<D, C>(
    session: &mut GuessSession,
    address: &str,
    device: &D,
    classifier: Result<C, String>,
) -> Result<Startup<C>, SessionError>
where
    D: DeviceApi + ?Sized,
    C: Classifier,
{
    session.connect(address, device).await?;

    match classifier {
        Ok(classifier) => {
            session.start_episode(device).await?;
            Ok(Startup::Playing(classifier))
        }
        Err(reason) => {
            let startup = Startup::RecognitionDisabled(reason);
            tracing::error!("{}", startup);
            tracing::warn!(
                "Connected to {}, but the game cannot start without a model.",
                address
            );
            Ok(startup)
        }
    }
}
