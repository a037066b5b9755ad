//! Discord gateway v10 session over a compressed WebSocket.

mod client;
mod codec;
mod connection;
mod constants;
mod error;
mod heartbeat;
mod payloads;
mod session;
mod state;

pub use client::{GatewayClient, GatewayClientConfig};
pub use constants::{GatewayIntent, GatewayIntents};
