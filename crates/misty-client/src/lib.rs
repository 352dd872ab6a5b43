mod client;
mod error;

pub use client::{Client, Config, ConfigBuilder};
pub use error::MistyError;
