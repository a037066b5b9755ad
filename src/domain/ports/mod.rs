mod chat_port;
mod gateway_port;
mod link_resolver_port;

pub use chat_port::{ChatPort, ReplyRequest};
pub use gateway_port::{GatewayEvent, GatewayPort};
pub use link_resolver_port::LinkResolver;
