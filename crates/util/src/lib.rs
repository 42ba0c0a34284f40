//! Process configuration for the Customer Service Platform binary.

pub mod config;

pub use config::{server_bind_address, AppConfig, ConfigError, Environment, DEFAULT_BIND_ADDR};

/// Loads variables from `.env` into the process environment, if the file exists.
pub fn load_env_file() {
    let _ = dotenvy::dotenv();
}
