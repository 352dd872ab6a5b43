pub mod classifier;
pub mod device_api;
pub mod episode;
pub mod prompts;
pub mod scheduler;
pub mod session_state;
pub mod startup;
pub mod stats;
pub mod types;

pub use classifier::Classifier;
pub use device_api::{CaptureFailure, DeviceApi};
pub use episode::{Episode, EpisodeStatus};
pub use prompts::Prompts;
pub use scheduler::{LoopExit, Pacer, run_loop};
pub use session_state::{GuessSession, SessionError, SessionState, TickOutcome, TickReport};
pub use startup::{Startup, start_game};
pub use stats::SessionStats;
pub use types::{CONFIDENCE_THRESHOLD, Frame, Prediction};
