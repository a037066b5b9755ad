use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    WaitingForHello,
    Identifying,
    Resuming,
    Connected,
}

impl ConnectionState {
    #[must_use]
    pub const fn is_connected(self) -> bool {
        matches!(self, Self::Connected)
    }
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::WaitingForHello => write!(f, "Waiting for Hello"),
            Self::Identifying => write!(f, "Identifying"),
            Self::Resuming => write!(f, "Resuming"),
            Self::Connected => write!(f, "Connected"),
        }
    }
}

/// Per-connection handshake progress and heartbeat timing.
#[derive(Debug, Default)]
pub struct GatewayState {
    connection: ConnectionState,
    heartbeat_interval: Option<Duration>,
    last_heartbeat_sent: Option<Instant>,
    latency: Option<Duration>,
}

impl GatewayState {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            connection: ConnectionState::Disconnected,
            heartbeat_interval: None,
            last_heartbeat_sent: None,
            latency: None,
        }
    }

    #[must_use]
    pub const fn connection(&self) -> ConnectionState {
        self.connection
    }

    pub const fn transition_to(&mut self, state: ConnectionState) {
        self.connection = state;
    }

    pub const fn set_heartbeat_interval(&mut self, interval: Duration) {
        self.heartbeat_interval = Some(interval);
    }

    #[must_use]
    pub const fn heartbeat_interval(&self) -> Option<Duration> {
        self.heartbeat_interval
    }

    pub fn record_heartbeat_sent(&mut self) {
        self.last_heartbeat_sent = Some(Instant::now());
    }

    pub fn record_heartbeat_ack(&mut self) {
        if let Some(sent) = self.last_heartbeat_sent.take() {
            self.latency = Some(sent.elapsed());
        }
    }

    #[must_use]
    pub const fn latency(&self) -> Option<Duration> {
        self.latency
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_state_display() {
        assert_eq!(ConnectionState::WaitingForHello.to_string(), "Waiting for Hello");
        assert!(ConnectionState::Connected.is_connected());
        assert!(!ConnectionState::Resuming.is_connected());
    }

    #[test]
    fn test_latency_needs_sent_heartbeat() {
        let mut state = GatewayState::new();
        state.record_heartbeat_ack();
        assert!(state.latency().is_none());

        state.record_heartbeat_sent();
        state.record_heartbeat_ack();
        assert!(state.latency().is_some());
    }
}
