use crate::session_state::TickOutcome;
use std::fmt;

/// Per-session tick counters, reported when the loop ends.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionStats {
    ticks: u64,
    capture_failures: u64,
    low_confidence: u64,
    incorrect: u64,
    correct: u64,
}

impl SessionStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        match outcome {
            TickOutcome::CaptureFailed(_) => self.capture_failures += 1,
            TickOutcome::LowConfidence(_) => self.low_confidence += 1,
            TickOutcome::Incorrect { .. } => self.incorrect += 1,
            TickOutcome::Correct { .. } => self.correct += 1,
        }
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn capture_failures(&self) -> u64 {
        self.capture_failures
    }

    pub fn low_confidence(&self) -> u64 {
        self.low_confidence
    }

    pub fn incorrect(&self) -> u64 {
        self.incorrect
    }

    pub fn correct(&self) -> u64 {
        self.correct
    }
}

impl fmt::Display for SessionStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ticks: {} correct, {} incorrect, {} low confidence, {} capture failures",
            self.ticks, self.correct, self.incorrect, self.low_confidence, self.capture_failures
        )
    }
}
