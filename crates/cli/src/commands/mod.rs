pub mod config;
pub mod key;
pub mod utils;

pub use config::{handle_config_command, ConfigCommands};
pub use key::{handle_key_command, KeyCommands};
