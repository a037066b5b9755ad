//! Application configuration.

/// Configuration values and their defaults.
pub mod app_config;
/// Command line parsing.
pub mod args;
/// Config file loading.
pub mod storage;

pub use app_config::{AppConfig, BotConfig, HealthConfig, LogLevel, ResolverConfig};
pub use args::{CliArgs, Command};
pub use storage::{ConfigError, ConfigStore};
