use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChannelId, GuildId, UserId};

/// Unique identifier for a Discord message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub u64);

impl std::fmt::Display for MessageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for MessageId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&str> for MessageId {
    fn from(value: &str) -> Self {
        Self(value.parse().unwrap_or(0))
    }
}

bitflags::bitflags! {
    /// Discord message flags.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
    pub struct MessageFlags: u64 {
        /// Message has been published to following channels.
        const CROSSPOSTED = 1 << 0;
        /// Message originated from a followed channel.
        const IS_CROSSPOST = 1 << 1;
        /// Link previews are hidden.
        const SUPPRESS_EMBEDS = 1 << 2;
        /// Only visible to the invoking user.
        const EPHEMERAL = 1 << 6;
        /// Does not trigger push notifications.
        const SUPPRESS_NOTIFICATIONS = 1 << 12;
    }
}

/// Author of a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAuthor {
    /// Author's user ID.
    pub id: UserId,
    /// Author's username.
    pub username: String,
    /// Whether the author is a bot.
    pub bot: bool,
}

impl MessageAuthor {
    /// Creates a message author.
    #[must_use]
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, bot: bool) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            bot,
        }
    }
}

/// A chat message as delivered by the gateway.
#[derive(Debug, Clone)]
pub struct Message {
    id: MessageId,
    channel_id: ChannelId,
    guild_id: Option<GuildId>,
    author: MessageAuthor,
    content: String,
    flags: MessageFlags,
    timestamp: DateTime<Utc>,
}

impl Message {
    /// Creates a message with no guild and empty flags.
    #[must_use]
    pub fn new(
        id: MessageId,
        channel_id: ChannelId,
        author: MessageAuthor,
        content: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            channel_id,
            guild_id: None,
            author,
            content: content.into(),
            flags: MessageFlags::empty(),
            timestamp,
        }
    }

    /// Sets the guild the message was posted in.
    #[must_use]
    pub const fn with_guild_id(mut self, guild_id: GuildId) -> Self {
        self.guild_id = Some(guild_id);
        self
    }

    /// Sets message flags.
    #[must_use]
    pub const fn with_flags(mut self, flags: MessageFlags) -> Self {
        self.flags = flags;
        self
    }

    /// Returns message ID.
    #[must_use]
    pub const fn id(&self) -> MessageId {
        self.id
    }

    /// Returns channel ID.
    #[must_use]
    pub const fn channel_id(&self) -> ChannelId {
        self.channel_id
    }

    /// Returns guild ID, `None` for direct messages.
    #[must_use]
    pub const fn guild_id(&self) -> Option<GuildId> {
        self.guild_id
    }

    /// Returns message author.
    #[must_use]
    pub const fn author(&self) -> &MessageAuthor {
        &self.author
    }

    /// Returns raw message text.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Returns message flags.
    #[must_use]
    pub const fn flags(&self) -> MessageFlags {
        self.flags
    }

    /// Returns creation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns whether link previews are already hidden.
    #[must_use]
    pub const fn embeds_suppressed(&self) -> bool {
        self.flags.contains(MessageFlags::SUPPRESS_EMBEDS)
    }
}
