//! Infrastructure layer with external service adapters.

/// Application configuration.
pub mod config;
/// Discord REST and gateway clients.
pub mod discord;
/// Health endpoint.
pub mod health;
/// HTTP redirect resolution.
pub mod resolver;

pub use config::{AppConfig, CliArgs, Command, ConfigError, ConfigStore, LogLevel};
pub use discord::{DiscordClient, GatewayClient, GatewayClientConfig, GatewayIntents};
pub use resolver::{HttpRedirectResolver, ResolveLimiter, ResolverOptions};
