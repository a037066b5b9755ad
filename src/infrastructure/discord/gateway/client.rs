use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use futures_util::FutureExt;
use tokio::sync::{mpsc, watch};
use tokio::time::sleep;
use tracing::{error, info, warn};

use super::connection::{GatewayConnectionHandler, Identity, WebSocketConnection};
use super::constants::{
    EVENT_CHANNEL_CAPACITY, GatewayIntents, MAX_RECONNECT_ATTEMPTS, RECONNECT_DELAY_BASE,
    RECONNECT_DELAY_MAX, RECONNECT_JITTER_MAX,
};
use super::error::{GatewayError, GatewayResult};
use super::heartbeat::HeartbeatManager;
use super::session::SessionInfo;
use crate::domain::entities::BotToken;
use crate::domain::errors::DeliveryError;
use crate::domain::ports::{GatewayEvent, GatewayPort};

/// Gateway session settings.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    /// Events the session subscribes to.
    pub intents: GatewayIntents,
    /// Reconnect after a recoverable drop.
    pub auto_reconnect: bool,
    /// Consecutive failed attempts before giving up.
    pub max_reconnect_attempts: u32,
    /// Buffered events before the socket reader waits on the consumer.
    pub event_capacity: usize,
    /// Name shown in the bot's "Competing in" status.
    pub activity: String,
}

impl Default for GatewayClientConfig {
    fn default() -> Self {
        Self {
            intents: GatewayIntents::bot(),
            auto_reconnect: true,
            max_reconnect_attempts: MAX_RECONNECT_ATTEMPTS,
            event_capacity: EVENT_CHANNEL_CAPACITY,
            activity: format!("v{}", crate::VERSION),
        }
    }
}

impl GatewayClientConfig {
    /// Returns the default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables reconnecting.
    #[must_use]
    pub const fn with_auto_reconnect(mut self, enabled: bool) -> Self {
        self.auto_reconnect = enabled;
        self
    }

    /// Sets the retry limit.
    #[must_use]
    pub const fn with_max_reconnect_attempts(mut self, attempts: u32) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    /// Sets the status text.
    #[must_use]
    pub fn with_activity(mut self, activity: impl Into<String>) -> Self {
        self.activity = activity.into();
        self
    }
}

/// Reconnecting gateway session running on its own task.
pub struct GatewayClient {
    config: GatewayClientConfig,
    running: Arc<AtomicBool>,
    shutdown: Option<watch::Sender<bool>>,
}

impl GatewayClient {
    /// Creates a client that connects on [`GatewayPort::connect`].
    #[must_use]
    pub fn new(config: GatewayClientConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: None,
        }
    }

    /// Creates a client with [`GatewayClientConfig::default`].
    #[must_use]
    pub fn with_default_config() -> Self {
        Self::new(GatewayClientConfig::default())
    }
}

impl GatewayPort for GatewayClient {
    fn connect(&mut self, token: &BotToken) -> Result<mpsc::Receiver<GatewayEvent>, DeliveryError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(GatewayError::AlreadyConnected.into());
        }

        let (event_tx, event_rx) = mpsc::channel(self.config.event_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        self.shutdown = Some(shutdown_tx);

        let config = GatewayLoopConfig {
            identity: Arc::new(Identity {
                token: token.clone(),
                intents: self.config.intents,
                activity: self.config.activity.clone(),
            }),
            auto_reconnect: self.config.auto_reconnect,
            max_attempts: self.config.max_reconnect_attempts,
        };
        let running = self.running.clone();

        tokio::spawn(async move {
            let result = std::panic::AssertUnwindSafe(run_gateway_loop(
                config,
                event_tx.clone(),
                shutdown_rx,
            ))
            .catch_unwind()
            .await;

            running.store(false, Ordering::SeqCst);

            if let Err(panic_info) = result {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    (*s).to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };

                error!(panic = %panic_msg, "Gateway task panicked");
                let _ = event_tx
                    .send(GatewayEvent::Error {
                        message: format!("Gateway task panicked: {panic_msg}"),
                        recoverable: false,
                    })
                    .await;
            }
        });

        Ok(event_rx)
    }

    fn disconnect(&self) {
        if let Some(shutdown) = &self.shutdown {
            shutdown.send_replace(true);
        }
    }

    fn is_connected(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}

impl Drop for GatewayClient {
    fn drop(&mut self) {
        self.disconnect();
    }
}

struct GatewayLoopConfig {
    identity: Arc<Identity>,
    auto_reconnect: bool,
    max_attempts: u32,
}

async fn run_gateway_loop(
    config: GatewayLoopConfig,
    event_tx: mpsc::Sender<GatewayEvent>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut reconnect_attempts: u32 = 0;
    let mut session = SessionInfo::new();

    loop {
        let mut handler = GatewayConnectionHandler::new(
            Box::new(WebSocketConnection::new()),
            config.identity.clone(),
            event_tx.clone(),
            session,
        );

        let outcome = tokio::select! {
            result = run_single_connection(&mut handler) => Some(result),
            () = wait_for_shutdown(&mut shutdown) => None,
        };

        let reached_ready = handler.state().connection().is_connected();
        handler.close().await;
        session = handler.into_session();

        let Some(Err(error)) = outcome else {
            info!("Gateway shutdown requested");
            break;
        };

        if reached_ready {
            reconnect_attempts = 0;
        }

        if matches!(error, GatewayError::ChannelClosed) {
            info!("Gateway event consumer closed");
            break;
        }

        warn!(error = %error, "Gateway connection lost");

        if !error.can_resume() {
            session.clear();
        }

        if emit(
            &event_tx,
            GatewayEvent::Disconnected {
                reason: error.to_string(),
                can_resume: session.can_resume(),
            },
        )
        .await
        .is_err()
        {
            break;
        }

        if !error.should_reconnect() || !config.auto_reconnect {
            error!(error = %error, "Gateway connection cannot be recovered");
            let _ = emit(
                &event_tx,
                GatewayEvent::Error {
                    message: error.to_string(),
                    recoverable: false,
                },
            )
            .await;
            break;
        }

        reconnect_attempts += 1;
        if reconnect_attempts > config.max_attempts {
            error!(
                attempts = config.max_attempts,
                "Max reconnection attempts exceeded"
            );
            let _ = emit(
                &event_tx,
                GatewayEvent::Error {
                    message: format!(
                        "Max reconnection attempts ({}) exceeded",
                        config.max_attempts
                    ),
                    recoverable: false,
                },
            )
            .await;
            break;
        }

        let delay = calculate_backoff_delay(reconnect_attempts - 1);
        info!(
            attempt = reconnect_attempts,
            delay_ms = delay.as_millis(),
            "Reconnecting to gateway"
        );

        if emit(
            &event_tx,
            GatewayEvent::Reconnecting {
                attempt: reconnect_attempts,
            },
        )
        .await
        .is_err()
        {
            break;
        }

        tokio::select! {
            () = sleep(delay) => {}
            () = wait_for_shutdown(&mut shutdown) => {
                info!("Gateway shutdown requested");
                break;
            }
        }
    }

    info!("Gateway loop terminated");
}

async fn run_single_connection(handler: &mut GatewayConnectionHandler) -> GatewayResult<()> {
    let interval = handler.connect().await?;

    let (command_tx, mut command_rx) = mpsc::channel(1);
    let mut heartbeat = HeartbeatManager::new(interval, handler.tracker());
    heartbeat.start(command_tx);

    let result = handler.run(&mut command_rx).await;
    heartbeat.stop();
    result
}

async fn emit(
    event_tx: &mpsc::Sender<GatewayEvent>,
    event: GatewayEvent,
) -> Result<(), GatewayError> {
    event_tx
        .send(event)
        .await
        .map_err(|_| GatewayError::ChannelClosed)
}

/// Resolves once shutdown is requested or the client is dropped.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|stop| *stop).await;
}

#[allow(clippy::cast_possible_truncation)]
fn calculate_backoff_delay(attempt: u32) -> Duration {
    let base_delay = RECONNECT_DELAY_BASE.as_millis() as u64;
    let max_delay = RECONNECT_DELAY_MAX.as_millis() as u64;
    let jitter_max = RECONNECT_JITTER_MAX.as_millis() as u64;

    let exponential_delay = base_delay.saturating_mul(2_u64.saturating_pow(attempt.min(6)));
    let capped_delay = exponential_delay.min(max_delay);

    Duration::from_millis(capped_delay.saturating_add(rand_jitter(jitter_max)))
}

fn rand_jitter(max: u64) -> u64 {
    use std::time::SystemTime;

    if max == 0 {
        return 0;
    }

    let nanos = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| u64::from(d.subsec_nanos()))
        .unwrap_or(0);

    nanos % max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = GatewayClientConfig::new()
            .with_auto_reconnect(false)
            .with_max_reconnect_attempts(5)
            .with_activity("v9");

        assert!(!config.auto_reconnect);
        assert_eq!(config.max_reconnect_attempts, 5);
        assert_eq!(config.activity, "v9");
        assert_eq!(GatewayClientConfig::default().intents, GatewayIntents::bot());
    }

    #[test]
    fn test_backoff_delay() {
        let first = calculate_backoff_delay(0);
        assert!(first >= RECONNECT_DELAY_BASE);
        assert!(first < RECONNECT_DELAY_BASE + RECONNECT_JITTER_MAX);

        assert!(calculate_backoff_delay(3) >= Duration::from_secs(8));
        assert!(calculate_backoff_delay(100) <= RECONNECT_DELAY_MAX + RECONNECT_JITTER_MAX);
    }

    #[tokio::test]
    async fn test_second_connect_is_rejected() {
        let mut client = GatewayClient::with_default_config();
        let token = BotToken::new("abc.def.ghi").unwrap();
        assert!(!client.is_connected());

        let _events = client.connect(&token).unwrap();
        let second = client.connect(&token);

        assert!(matches!(second, Err(DeliveryError::Rejected { .. })));
        client.disconnect();
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_on_drop() {
        let (tx, mut rx) = watch::channel(false);
        drop(tx);
        wait_for_shutdown(&mut rx).await;
    }
}
