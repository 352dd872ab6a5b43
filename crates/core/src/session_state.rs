use crate::classifier::Classifier;
use crate::device_api::DeviceApi;
use crate::episode::{self, Episode, EpisodeStatus};
use crate::prompts::Prompts;
use crate::stats::SessionStats;
use crate::types::{self, Frame, Prediction};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Disconnected,
    Connecting,
    Connected,
    EpisodeActive(EpisodeStatus),
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("could not reach the device at {0}")]
    Unreachable(String),
    #[error("the session is not connected to a device")]
    NotConnected,
    #[error("no episode is waiting for an answer")]
    NoActiveEpisode,
    #[error("recognition failed: {0:#}")]
    Inference(anyhow::Error),
}

/// What a single tick of the loop amounted to.
#[derive(Debug, Clone, PartialEq)]
pub enum TickOutcome {
    /// No frame this tick. Carries the status code or transport error text.
    CaptureFailed(String),
    /// A frame was scored but the classifier was not sure enough to count it.
    LowConfidence(Prediction),
    /// A confident answer that does not match the target.
    Incorrect { target: u8, prediction: Prediction },
    /// The target was shown. `next_target` is the freshly drawn challenge.
    Correct {
        answered: u8,
        prediction: Prediction,
        next_target: u8,
    },
}

impl fmt::Display for TickOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TickOutcome::CaptureFailed(reason) => write!(f, "Capture failed: {reason}"),
            TickOutcome::LowConfidence(prediction) => {
                write!(f, "Low confidence: best guess {prediction}")
            }
            TickOutcome::Incorrect { target, prediction } => write!(
                f,
                "Incorrect: saw {prediction}, looking for {target}"
            ),
            TickOutcome::Correct {
                answered,
                next_target,
                ..
            } => write!(f, "Correct! It was {answered}. Next up: {next_target}"),
        }
    }
}

/// Everything the render sink needs from one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub frame: Option<Frame>,
    pub outcome: TickOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Link {
    Disconnected,
    Connecting,
    Connected,
}

/// The guessing-game state machine.
///
/// Owns the only cross-tick state: the device address, the connection flag and
/// the current episode. Nothing else mutates it, so no locking is involved; the
/// loop task holds it by `&mut` for its whole run.
pub struct GuessSession {
    device_address: Option<String>,
    link: Link,
    episode: Option<Episode>,
    prompts: Prompts,
    threshold: f32,
    rng: StdRng,
    stats: SessionStats,
}

impl GuessSession {
    pub fn new(prompts: Prompts, threshold: f32) -> Self {
        Self {
            device_address: None,
            link: Link::Disconnected,
            episode: None,
            prompts,
            threshold,
            rng: StdRng::from_entropy(),
            stats: SessionStats::new(),
        }
    }

    /// Replaces the random source used to draw targets.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn state(&self) -> SessionState {
        match (self.link, &self.episode) {
            (Link::Disconnected, _) => SessionState::Disconnected,
            (Link::Connecting, _) => SessionState::Connecting,
            (Link::Connected, None) => SessionState::Connected,
            (Link::Connected, Some(ep)) => SessionState::EpisodeActive(ep.status),
        }
    }

    pub fn episode(&self) -> Option<&Episode> {
        self.episode.as_ref()
    }

    pub fn device_address(&self) -> Option<&str> {
        self.device_address.as_deref()
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Probes the device once. On failure the address is forgotten and the
    /// session stays disconnected.
    pub async fn connect<D>(&mut self, address: &str, device: &D) -> Result<(), SessionError>
    where
        D: DeviceApi + ?Sized,
    {
        self.link = Link::Connecting;
        tracing::info!("Connecting to device at {}...", address);

        if device.check_status().await {
            self.device_address = Some(address.to_string());
            self.link = Link::Connected;
            tracing::info!("Connected to device at {}", address);
            Ok(())
        } else {
            self.device_address = None;
            self.episode = None;
            self.link = Link::Disconnected;
            tracing::error!("Device at {} did not answer the status probe", address);
            Err(SessionError::Unreachable(address.to_string()))
        }
    }

    /// Draws the first target and speaks its prompt. Returns the target.
    pub async fn start_episode<D>(&mut self, device: &D) -> Result<u8, SessionError>
    where
        D: DeviceApi + ?Sized,
    {
        if self.link != Link::Connected {
            return Err(SessionError::NotConnected);
        }
        let target = episode::draw_target(&mut self.rng);
        self.enter_episode(target, None, device).await;
        Ok(target)
    }

    /// Runs one capture, classify and evaluate step.
    ///
    /// Capture failures, low confidence and wrong answers are ordinary outcomes.
    /// Only a classifier error is returned as `Err`, and the loop treats it as fatal.
    pub async fn process_tick<D, C>(
        &mut self,
        device: &D,
        classifier: &C,
    ) -> Result<TickReport, SessionError>
    where
        D: DeviceApi + ?Sized,
        C: Classifier + ?Sized,
    {
        let target = self.awaiting_target()?;

        let frame = match device.capture_frame().await {
            Ok(frame) => frame,
            Err(failure) => {
                tracing::warn!("Capture failed: {}", failure);
                let outcome = TickOutcome::CaptureFailed(failure.to_string());
                self.stats.record(&outcome);
                return Ok(TickReport {
                    frame: None,
                    outcome,
                });
            }
        };

        let prediction = classifier
            .classify(&frame)
            .map_err(SessionError::Inference)?;
        let outcome = self.evaluate(target, prediction, device).await;
        self.stats.record(&outcome);

        Ok(TickReport {
            frame: Some(frame),
            outcome,
        })
    }

    /// Tears the session down: episode dropped, address forgotten.
    pub fn stop(&mut self) {
        tracing::info!("Session stopped. {}", self.stats);
        self.episode = None;
        self.device_address = None;
        self.link = Link::Disconnected;
    }

    fn awaiting_target(&self) -> Result<u8, SessionError> {
        if self.link != Link::Connected {
            return Err(SessionError::NotConnected);
        }
        match &self.episode {
            Some(ep) if ep.is_awaiting() => Ok(ep.target_digit),
            _ => Err(SessionError::NoActiveEpisode),
        }
    }

    async fn evaluate<D>(&mut self, target: u8, prediction: Prediction, device: &D) -> TickOutcome
    where
        D: DeviceApi + ?Sized,
    {
        if !types::accept(prediction.confidence, self.threshold) {
            tracing::debug!("Low confidence prediction {}", prediction);
            return TickOutcome::LowConfidence(prediction);
        }
        if prediction.class != target {
            tracing::debug!("Incorrect guess {} for target {}", prediction, target);
            return TickOutcome::Incorrect { target, prediction };
        }

        if let Some(ep) = self.episode.as_mut() {
            ep.status = EpisodeStatus::Correct;
        }
        tracing::info!("Target {} recognised ({})", target, prediction);

        let next_target = episode::draw_target(&mut self.rng);
        self.enter_episode(next_target, Some(target), device).await;

        TickOutcome::Correct {
            answered: target,
            prediction,
            next_target,
        }
    }

    // Speech failure never blocks the episode: vision can carry on without it.
    async fn enter_episode<D>(&mut self, target: u8, answered: Option<u8>, device: &D)
    where
        D: DeviceApi + ?Sized,
    {
        let prompt = self.prompts.ask(target);
        let utterance = match answered {
            Some(previous) => format!("{} {}", self.prompts.praise(previous), prompt),
            None => prompt.clone(),
        };
        self.episode = Some(Episode::new(target, prompt));
        tracing::info!("New target: {}", target);

        if !device.speak(&utterance).await {
            tracing::warn!("Device did not acknowledge speech: \"{}\"", utterance);
        }
    }
}
