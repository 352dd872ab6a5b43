pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

pub const API_PREFIX: &str = "/api";
pub const CAMERA_RGB_PATH: &str = "/cameras/rgb";
pub const TTS_SPEAK_PATH: &str = "/tts/speak";
pub const DEVICE_PATH: &str = "/device";
