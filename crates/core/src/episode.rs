use rand::Rng;

pub const MIN_TARGET: u8 = 1;
pub const MAX_TARGET: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodeStatus {
    AwaitingAnswer,
    Correct,
}

/// One target-digit challenge. At most one exists per session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Episode {
    pub target_digit: u8,
    pub prompt_text: String,
    pub status: EpisodeStatus,
}

impl Episode {
    pub fn new(target_digit: u8, prompt_text: String) -> Self {
        Self {
            target_digit,
            prompt_text,
            status: EpisodeStatus::AwaitingAnswer,
        }
    }

    pub fn is_awaiting(&self) -> bool {
        self.status == EpisodeStatus::AwaitingAnswer
    }
}

/// Draws a target uniformly from 1..=9. Repeats of the previous target are allowed.
pub fn draw_target<R: Rng + ?Sized>(rng: &mut R) -> u8 {
    rng.gen_range(MIN_TARGET..=MAX_TARGET)
}
