//! Discord API client.

mod client;
mod dto;
mod gateway;

pub use client::DiscordClient;
pub use gateway::{GatewayClient, GatewayClientConfig, GatewayIntent, GatewayIntents};
