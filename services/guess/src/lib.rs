pub mod config;
pub mod connection_check;
pub mod misty_adapter;
pub mod prompt_loader;
pub mod render;
