#[derive(Debug, thiserror::Error)]
pub enum MistyError {
    #[error("invalid device address: {0:?}")]
    InvalidAddress(String),
    /// The device answered, but not with a 2xx status.
    #[error("HTTP Error {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

impl MistyError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, MistyError::Transport(e) if e.is_timeout())
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            MistyError::Status(code) => Some(*code),
            _ => None,
        }
    }
}
