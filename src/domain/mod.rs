//! Domain layer with core entities, errors and port definitions.

/// Entity definitions.
pub mod entities;
/// Error types.
pub mod errors;
/// Port definitions.
pub mod ports;

pub use entities::{BotToken, Message, User};
pub use errors::{DeliveryError, ResolveError, TransformError};
pub use ports::{ChatPort, GatewayEvent, GatewayPort, LinkResolver};
