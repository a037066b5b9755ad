//! Discord user entity.

use serde::{Deserialize, Serialize};

/// Unique identifier for a Discord user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl From<&str> for UserId {
    fn from(value: &str) -> Self {
        Self(value.parse().unwrap_or(0))
    }
}

/// Discord account the bot is logged in as, or any other user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    id: UserId,
    username: String,
    bot: bool,
}

impl User {
    /// Creates new user.
    #[must_use]
    pub fn new(id: impl Into<UserId>, username: impl Into<String>, bot: bool) -> Self {
        Self {
            id: id.into(),
            username: username.into(),
            bot,
        }
    }

    /// Returns user ID.
    #[must_use]
    pub const fn id(&self) -> UserId {
        self.id
    }

    /// Returns username.
    #[must_use]
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Returns whether this is a bot account.
    #[must_use]
    pub const fn is_bot(&self) -> bool {
        self.bot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let user = User::new("81440962496172032", "oxilinks", true);

        assert_eq!(user.id(), UserId(81_440_962_496_172_032));
        assert_eq!(user.username(), "oxilinks");
        assert!(user.is_bot());
    }
}
