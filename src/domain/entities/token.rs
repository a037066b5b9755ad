//! Discord bot token value object.

use std::fmt;

use zeroize::{Zeroize, ZeroizeOnDrop};

const BOT_PREFIX: &str = "Bot ";
const BOT_SCHEME: &str = "Bot";

/// Bot token with masking; the secret is wiped from memory on drop.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct BotToken {
    value: String,
}

impl BotToken {
    /// Creates token from raw input, accepting values with or without the `Bot ` prefix.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Option<Self> {
        let mut input = value.into();
        let trimmed = input.trim();
        let raw = match trimmed.strip_prefix(BOT_SCHEME) {
            Some("") => "",
            Some(rest) if rest.starts_with(char::is_whitespace) => rest.trim_start(),
            _ => trimmed,
        };

        let token = if raw.is_empty() || raw.contains(char::is_whitespace) {
            None
        } else {
            Some(Self {
                value: raw.to_string(),
            })
        };

        input.zeroize();
        token
    }

    /// Returns the bare token, as sent in a gateway Identify.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Returns the `Authorization` header value for REST calls.
    #[must_use]
    pub fn authorization(&self) -> String {
        format!("{BOT_PREFIX}{}", self.value)
    }

    /// Returns masked token for display.
    #[must_use]
    pub fn masked(&self) -> String {
        if self.value.len() <= 10 {
            return "*".repeat(self.value.len());
        }

        let visible_prefix = &self.value[..4];
        let visible_suffix = &self.value[self.value.len() - 4..];
        format!("{visible_prefix}...{visible_suffix}")
    }
}

impl fmt::Debug for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BotToken")
            .field("value", &self.masked())
            .finish()
    }
}

impl fmt::Display for BotToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.masked())
    }
}
