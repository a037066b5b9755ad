use tokio::sync::mpsc;

use crate::domain::entities::{BotToken, Message, UserId};
use crate::domain::errors::DeliveryError;

/// Event emitted by a gateway session.
#[derive(Debug, Clone)]
#[allow(missing_docs)]
pub enum GatewayEvent {
    /// Session established; `user_id` is the bot's own account.
    Ready {
        session_id: String,
        user_id: UserId,
    },
    /// A dropped session was resumed without losing events.
    Resumed,
    /// The session dropped; `attempt` counts retries since the last success.
    Reconnecting {
        attempt: u32,
    },
    /// The socket closed. A reconnect follows unless the session is shutting down.
    Disconnected {
        reason: String,
        can_resume: bool,
    },
    /// A message was posted in a channel or DM the bot can read.
    MessageCreate {
        message: Message,
    },
    /// `recoverable: false` is the last event of the stream.
    Error {
        message: String,
        recoverable: bool,
    },
}

/// Port for a realtime chat event stream.
pub trait GatewayPort: Send + Sync {
    /// Opens the session and returns its event stream.
    ///
    /// The stream is bounded; a slow consumer stalls the session reader.
    ///
    /// # Errors
    ///
    /// Returns `DeliveryError` if a session is already running.
    fn connect(&mut self, token: &BotToken) -> Result<mpsc::Receiver<GatewayEvent>, DeliveryError>;

    /// Asks the session to close; the stream ends shortly after.
    fn disconnect(&self);

    fn is_connected(&self) -> bool;
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Gateway that replays a fixed list of events, then closes the stream.
    pub struct ScriptedGateway {
        events: Mutex<Vec<GatewayEvent>>,
        connected: AtomicBool,
    }

    impl ScriptedGateway {
        pub fn new(events: Vec<GatewayEvent>) -> Self {
            Self {
                events: Mutex::new(events),
                connected: AtomicBool::new(false),
            }
        }
    }

    impl GatewayPort for ScriptedGateway {
        fn connect(
            &mut self,
            _token: &BotToken,
        ) -> Result<mpsc::Receiver<GatewayEvent>, DeliveryError> {
            if self.connected.swap(true, Ordering::SeqCst) {
                return Err(DeliveryError::rejected("already connected"));
            }

            let events = std::mem::take(&mut *self.events.lock().unwrap());
            let (tx, rx) = mpsc::channel(events.len().max(1));
            for event in events {
                tx.try_send(event).unwrap();
            }
            Ok(rx)
        }

        fn disconnect(&self) {
            self.connected.store(false, Ordering::SeqCst);
        }

        fn is_connected(&self) -> bool {
            self.connected.load(Ordering::SeqCst)
        }
    }
}
