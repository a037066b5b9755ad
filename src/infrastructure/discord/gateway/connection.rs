use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::time::{sleep, timeout};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, trace, warn};

use super::codec::{Dispatch, EventParser, GatewayCodec};
use super::constants::{
    CONNECTION_TIMEOUT, GATEWAY_URL, GatewayIntents, GatewayOpcode, HELLO_TIMEOUT,
    IDENTIFY_TIMEOUT,
};
use super::error::{GatewayError, GatewayResult};
use super::heartbeat::{HeartbeatCommand, HeartbeatTracker};
use super::payloads::{GatewayMessage, GatewayPayload};
use super::session::SessionInfo;
use super::state::{ConnectionState, GatewayState};
use crate::domain::entities::BotToken;
use crate::domain::ports::GatewayEvent;

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsWriter = SplitSink<WsStream, WsMessage>;
type WsReader = SplitStream<WsStream>;

const GATEWAY_QUERY: &str = "?v=10&encoding=json&compress=zlib-stream";

/// Socket transport under a gateway session.
#[async_trait]
pub trait GatewayConnection: Send + Sync {
    async fn connect(&mut self, url: &str) -> GatewayResult<()>;
    async fn disconnect(&mut self);
    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()>;
    async fn receive(&mut self) -> GatewayResult<GatewayMessage>;
}

pub struct WebSocketConnection {
    writer: Option<WsWriter>,
    reader: Option<WsReader>,
    codec: GatewayCodec,
}

impl WebSocketConnection {
    #[must_use]
    pub fn new() -> Self {
        Self {
            writer: None,
            reader: None,
            codec: GatewayCodec::new(),
        }
    }
}

impl Default for WebSocketConnection {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GatewayConnection for WebSocketConnection {
    async fn connect(&mut self, url: &str) -> GatewayResult<()> {
        let (ws_stream, _) = timeout(CONNECTION_TIMEOUT, connect_async(url))
            .await
            .map_err(|_| GatewayError::timeout("connection"))?
            .map_err(|e| GatewayError::connection_failed(e.to_string()))?;

        let (writer, reader) = ws_stream.split();
        self.writer = Some(writer);
        self.reader = Some(reader);
        self.codec.reset();

        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.close().await;
        }
        self.reader = None;
        self.codec.reset();
        debug!("WebSocket connection closed");
    }

    async fn send(&mut self, payload: &GatewayPayload) -> GatewayResult<()> {
        let writer = self.writer.as_mut().ok_or(GatewayError::NotConnected)?;

        let json = serde_json::to_string(payload)
            .map_err(|e| GatewayError::serialization(e.to_string()))?;

        writer
            .send(WsMessage::Text(json.into()))
            .await
            .map_err(|e| GatewayError::websocket(e.to_string()))
    }

    async fn receive(&mut self) -> GatewayResult<GatewayMessage> {
        let reader = self.reader.as_mut().ok_or(GatewayError::NotConnected)?;

        loop {
            match reader.next().await {
                Some(Ok(WsMessage::Binary(data))) => {
                    if let Some(json) = self.codec.decode_binary(&data)? {
                        return EventParser::parse_message(&json);
                    }
                }
                Some(Ok(WsMessage::Text(text))) => return EventParser::parse_message(&text),
                Some(Ok(WsMessage::Close(frame))) => {
                    let (code, reason) = frame.map_or_else(
                        || (1000, "Normal closure".to_string()),
                        |f| (f.code.into(), f.reason.to_string()),
                    );
                    return Err(GatewayError::ConnectionClosed { code, reason });
                }
                Some(Ok(WsMessage::Ping(data))) => {
                    if let Some(writer) = self.writer.as_mut() {
                        let _ = writer.send(WsMessage::Pong(data)).await;
                    }
                }
                Some(Ok(WsMessage::Pong(_) | WsMessage::Frame(_))) => {}
                Some(Err(e)) => return Err(GatewayError::websocket(e.to_string())),
                None => {
                    return Err(GatewayError::ConnectionClosed {
                        code: 1006,
                        reason: "Stream ended".to_string(),
                    });
                }
            }
        }
    }
}

/// What the session announces itself as.
#[derive(Debug, Clone)]
pub struct Identity {
    pub token: BotToken,
    pub intents: GatewayIntents,
    pub activity: String,
}

/// Drives one socket from Hello to close, forwarding dispatches as domain events.
pub struct GatewayConnectionHandler {
    connection: Box<dyn GatewayConnection>,
    state: GatewayState,
    session: SessionInfo,
    tracker: HeartbeatTracker,
    identity: Arc<Identity>,
    event_tx: mpsc::Sender<GatewayEvent>,
}

impl GatewayConnectionHandler {
    pub fn new(
        connection: Box<dyn GatewayConnection>,
        identity: Arc<Identity>,
        event_tx: mpsc::Sender<GatewayEvent>,
        session: SessionInfo,
    ) -> Self {
        Self {
            connection,
            state: GatewayState::new(),
            tracker: HeartbeatTracker::new(session.sequence()),
            session,
            identity,
            event_tx,
        }
    }

    /// Opens the socket, waits for Hello and sends Identify or Resume.
    ///
    /// Returns the heartbeat interval announced by the gateway.
    pub async fn connect(&mut self) -> GatewayResult<Duration> {
        self.state.transition_to(ConnectionState::Connecting);

        let url = self
            .session
            .resume_gateway_url()
            .filter(|_| self.session.can_resume())
            .map_or_else(|| GATEWAY_URL.to_string(), |base| format!("{base}{GATEWAY_QUERY}"));
        self.connection.connect(&url).await?;

        self.state.transition_to(ConnectionState::WaitingForHello);
        let interval = self.await_hello().await?;

        if self.session.can_resume() {
            self.resume().await?;
        } else {
            self.identify().await?;
        }

        Ok(interval)
    }

    async fn await_hello(&mut self) -> GatewayResult<Duration> {
        let message = timeout(HELLO_TIMEOUT, self.connection.receive())
            .await
            .map_err(|_| GatewayError::timeout("Hello"))??;

        let opcode = GatewayOpcode::from_u8(message.op);
        if opcode != Some(GatewayOpcode::Hello) {
            return Err(GatewayError::UnexpectedOpcode { opcode });
        }

        let data = message
            .d
            .ok_or_else(|| GatewayError::protocol("Hello missing data"))?;
        let hello = EventParser::parse_hello(data)?;
        let interval = Duration::from_millis(hello.heartbeat_interval);
        self.state.set_heartbeat_interval(interval);

        debug!(
            interval_ms = hello.heartbeat_interval,
            "Received Hello from gateway"
        );

        Ok(interval)
    }

    async fn identify(&mut self) -> GatewayResult<()> {
        self.state.transition_to(ConnectionState::Identifying);

        let payload = GatewayPayload::identify(
            self.identity.token.as_str(),
            self.identity.intents.as_u32(),
            &self.identity.activity,
        );
        self.connection.send(&payload).await
    }

    async fn resume(&mut self) -> GatewayResult<()> {
        self.state.transition_to(ConnectionState::Resuming);

        let (Some(session_id), Some(sequence)) =
            (self.session.session_id(), self.session.sequence())
        else {
            return Err(GatewayError::protocol("No session to resume"));
        };

        let payload = GatewayPayload::resume(self.identity.token.as_str(), session_id, sequence);
        debug!(session_id, sequence, "Sending Resume");

        self.connection.send(&payload).await
    }

    /// Pumps the socket until it fails.
    ///
    /// Heartbeats arrive on `commands`; the handshake must finish within
    /// the identify timeout.
    pub async fn run(&mut self, commands: &mut mpsc::Receiver<HeartbeatCommand>) -> GatewayResult<()> {
        let handshake_deadline = sleep(IDENTIFY_TIMEOUT);
        tokio::pin!(handshake_deadline);

        loop {
            tokio::select! {
                message = self.connection.receive() => {
                    self.handle_message(message?).await?;
                }

                Some(command) = commands.recv() => match command {
                    HeartbeatCommand::Beat(payload) => {
                        self.connection.send(&payload).await?;
                        self.state.record_heartbeat_sent();
                    }
                    HeartbeatCommand::Missed => return Err(GatewayError::HeartbeatTimeout),
                },

                () = &mut handshake_deadline, if !self.state.connection().is_connected() => {
                    return Err(GatewayError::timeout("Ready"));
                }
            }
        }
    }

    async fn handle_message(&mut self, message: GatewayMessage) -> GatewayResult<()> {
        self.session.update_sequence(message.s);
        self.tracker.record_sequence(message.s);

        let opcode = GatewayOpcode::from_u8(message.op);
        match opcode {
            Some(GatewayOpcode::Dispatch) => {
                if let Some(event_type) = message.t.as_deref() {
                    trace!(event = event_type, "Dispatch received");
                    self.handle_dispatch(event_type, message.d).await?;
                }
            }
            Some(GatewayOpcode::HeartbeatAck) => {
                self.tracker.record_ack();
                self.state.record_heartbeat_ack();
                if let Some(latency) = self.state.latency() {
                    trace!(latency_ms = latency.as_millis(), "Heartbeat acknowledged");
                }
            }
            Some(GatewayOpcode::Heartbeat) => {
                debug!("Gateway requested immediate heartbeat");
                let payload = GatewayPayload::heartbeat(self.tracker.sequence());
                self.connection.send(&payload).await?;
                self.state.record_heartbeat_sent();
            }
            Some(GatewayOpcode::Reconnect) => {
                info!("Gateway requested reconnect");
                return Err(GatewayError::ConnectionClosed {
                    code: 4000,
                    reason: "Reconnect requested".to_string(),
                });
            }
            Some(GatewayOpcode::InvalidSession) => {
                let resumable = message.d.and_then(|d| d.as_bool()).unwrap_or(false);
                warn!(resumable, "Session invalidated");

                if !resumable {
                    self.session.clear();
                }
                return Err(GatewayError::SessionInvalidated { resumable });
            }
            _ => {
                debug!(opcode = ?opcode, "Unhandled opcode");
            }
        }

        Ok(())
    }

    async fn handle_dispatch(
        &mut self,
        event_type: &str,
        data: Option<serde_json::Value>,
    ) -> GatewayResult<()> {
        let dispatch = match EventParser::parse_dispatch(event_type, data) {
            Ok(dispatch) => dispatch,
            Err(e) => {
                warn!(event = event_type, error = %e, "Failed to parse dispatch event");
                return Ok(());
            }
        };

        match dispatch {
            Dispatch::Ready {
                session_id,
                resume_gateway_url,
                user_id,
            } => {
                info!(session_id = %session_id, %user_id, "Gateway ready");
                self.session
                    .set_session(session_id.clone(), resume_gateway_url);
                self.session.set_user_id(user_id);
                self.state.transition_to(ConnectionState::Connected);
                self.emit(GatewayEvent::Ready {
                    session_id,
                    user_id,
                })
                .await
            }
            Dispatch::Resumed => {
                info!("Session resumed");
                self.state.transition_to(ConnectionState::Connected);
                self.emit(GatewayEvent::Resumed).await
            }
            Dispatch::MessageCreate(message) => {
                self.emit(GatewayEvent::MessageCreate { message }).await
            }
            Dispatch::Ignored => Ok(()),
        }
    }

    async fn emit(&self, event: GatewayEvent) -> GatewayResult<()> {
        self.event_tx
            .send(event)
            .await
            .map_err(|_| GatewayError::ChannelClosed)
    }

    pub async fn close(&mut self) {
        self.connection.disconnect().await;
        self.state.transition_to(ConnectionState::Disconnected);
    }

    #[must_use]
    pub fn tracker(&self) -> HeartbeatTracker {
        self.tracker.clone()
    }

    #[must_use]
    pub const fn state(&self) -> &GatewayState {
        &self.state
    }

    #[must_use]
    pub fn into_session(self) -> SessionInfo {
        self.session
    }
}
