//! Domain entity definitions.

mod channel;
mod message;
mod token;
mod user;

pub use channel::{ChannelId, GuildId};
pub use message::{Message, MessageAuthor, MessageFlags, MessageId};
pub use token::BotToken;
pub use user::{User, UserId};
