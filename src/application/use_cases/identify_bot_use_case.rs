//! Startup credential check.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::domain::entities::User;
use crate::domain::errors::DeliveryError;
use crate::domain::ports::ChatPort;

/// Confirms the configured credentials and learns the bot's own identity.
#[derive(Clone)]
pub struct IdentifyBotUseCase {
    chat_port: Arc<dyn ChatPort>,
}

impl IdentifyBotUseCase {
    /// Creates new use case.
    #[must_use]
    pub const fn new(chat_port: Arc<dyn ChatPort>) -> Self {
        Self { chat_port }
    }

    /// Returns the account the token belongs to.
    ///
    /// # Errors
    /// Returns error if the token is rejected or Discord is unreachable.
    pub async fn execute(&self) -> Result<User, DeliveryError> {
        debug!("Validating bot token");

        let user = self.chat_port.current_user().await.map_err(|e| {
            warn!(error = %e, "Token validation failed");
            e
        })?;

        if !user.is_bot() {
            warn!(username = %user.username(), "Token does not belong to a bot account");
        }

        info!(user_id = %user.id(), username = %user.username(), "Authenticated");
        Ok(user)
    }
}
