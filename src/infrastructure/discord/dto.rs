use serde::{Deserialize, Serialize};

/// Discord API user response structure.
#[derive(Debug, Deserialize)]
pub struct UserResponse {
    /// Discord user ID.
    pub id: String,
    /// Discord username.
    pub username: String,
    /// Whether the user is a bot.
    #[serde(default)]
    pub bot: bool,
}

/// Created or edited message, only the fields the bot reads.
#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    /// Snowflake of the message.
    pub id: String,
}

/// Discord API error response structure.
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    /// Error message from Discord.
    pub message: String,
}

/// Body of a 429 response.
#[derive(Debug, Deserialize)]
pub struct RateLimitResponse {
    /// Seconds to wait before retrying.
    pub retry_after: f64,
}

/// `PATCH /channels/{channel}/messages/{message}` body.
#[derive(Debug, Serialize)]
pub struct EditFlagsRequest {
    /// Complete flag set to store.
    pub flags: u64,
}

/// `POST /channels/{channel}/messages` body.
#[derive(Debug, Serialize)]
pub struct CreateMessageRequest<'a> {
    pub content: &'a str,
    pub message_reference: MessageReference,
    pub allowed_mentions: AllowedMentions,
}

#[derive(Debug, Serialize)]
pub struct MessageReference {
    pub message_id: String,
    pub fail_if_not_exists: bool,
}

/// Mention policy; an empty `parse` list pings nobody.
#[derive(Debug, Default, Serialize)]
pub struct AllowedMentions {
    pub parse: Vec<String>,
    pub replied_user: bool,
}
