//! Long-running bot: gateway events in, link replies out.

use std::future::Future;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::application::services::{DispatcherConfig, LinkDispatcher, MessageIntake};
use crate::application::{IdentifyBotUseCase, TransformRegistry};
use crate::domain::entities::BotToken;
use crate::domain::errors::DeliveryError;
use crate::domain::ports::{ChatPort, GatewayEvent, GatewayPort};

/// Reason the bot stopped before a clean shutdown.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum BotError {
    #[error("failed to identify bot account: {0}")]
    Identify(#[source] DeliveryError),

    #[error("failed to open gateway session: {0}")]
    Connect(#[source] DeliveryError),

    #[error("gateway session ended: {message}")]
    Gateway { message: String },
}

/// Wires a gateway session to the link dispatcher for the life of the process.
pub struct Bot {
    gateway: Box<dyn GatewayPort>,
    chat: Arc<dyn ChatPort>,
    registry: Arc<TransformRegistry>,
    config: DispatcherConfig,
}

impl Bot {
    /// Creates a bot that is not yet connected.
    #[must_use]
    pub fn new(
        gateway: Box<dyn GatewayPort>,
        chat: Arc<dyn ChatPort>,
        registry: Arc<TransformRegistry>,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            gateway,
            chat,
            registry,
            config,
        }
    }

    /// Runs until `shutdown` resolves or the gateway gives up.
    ///
    /// Messages already queued are processed before this returns.
    ///
    /// # Errors
    /// Returns error if the token is rejected or the gateway session fails for good.
    pub async fn run(
        mut self,
        token: &BotToken,
        shutdown: impl Future<Output = ()>,
    ) -> Result<(), BotError> {
        let user = IdentifyBotUseCase::new(Arc::clone(&self.chat))
            .execute()
            .await
            .map_err(BotError::Identify)?;

        let (intake, worker) = LinkDispatcher::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.chat),
            self.config,
        )
        .start(user.id());
        let worker = tokio::spawn(worker.run());

        info!(
            transforms = self.registry.len(),
            user_id = %user.id(),
            "Starting bot"
        );

        let result = match self.gateway.connect(token) {
            Ok(events) => run_event_loop(events, &intake, shutdown).await,
            Err(e) => Err(BotError::Connect(e)),
        };

        self.gateway.disconnect();
        intake.close();
        if let Err(e) = worker.await {
            error!(error = %e, "Dispatch worker panicked");
        }

        info!("Bot stopped");
        result
    }
}

async fn run_event_loop(
    mut events: mpsc::Receiver<GatewayEvent>,
    intake: &MessageIntake,
    shutdown: impl Future<Output = ()>,
) -> Result<(), BotError> {
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            biased;

            () = &mut shutdown => {
                info!("Shutdown requested");
                return Ok(());
            }

            event = events.recv() => {
                let Some(event) = event else {
                    warn!("Gateway event stream closed");
                    return Ok(());
                };
                handle_event(event, intake).await?;
            }
        }
    }
}

async fn handle_event(event: GatewayEvent, intake: &MessageIntake) -> Result<(), BotError> {
    match event {
        GatewayEvent::Ready {
            session_id,
            user_id,
        } => {
            info!(session_id = %session_id, user_id = %user_id, "Gateway ready");
        }
        GatewayEvent::Resumed => info!("Gateway session resumed"),
        GatewayEvent::Reconnecting { attempt } => {
            info!(attempt, "Gateway reconnecting");
        }
        GatewayEvent::Disconnected { reason, can_resume } => {
            warn!(reason = %reason, can_resume, "Gateway disconnected");
        }
        GatewayEvent::MessageCreate { message } => {
            let message_id = message.id();
            if !intake.submit(message).await {
                debug!(message_id = %message_id, "Message not queued");
            }
        }
        GatewayEvent::Error {
            message,
            recoverable: true,
        } => {
            warn!(error = %message, "Recoverable gateway error");
        }
        GatewayEvent::Error {
            message,
            recoverable: false,
        } => {
            error!(error = %message, "Fatal gateway error");
            return Err(BotError::Gateway { message });
        }
    }
    Ok(())
}
