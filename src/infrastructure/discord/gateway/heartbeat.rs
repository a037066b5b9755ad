use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{Instant, interval_at};
use tracing::{debug, warn};

use super::constants::HEARTBEAT_JITTER_PERCENT;
use super::payloads::GatewayPayload;

/// Sequence and acknowledgement state shared between the reader and the heartbeat task.
#[derive(Debug, Clone)]
pub struct HeartbeatTracker {
    sequence: Arc<AtomicU64>,
    acked: Arc<AtomicBool>,
}

impl HeartbeatTracker {
    #[must_use]
    pub fn new(sequence: Option<u64>) -> Self {
        Self {
            sequence: Arc::new(AtomicU64::new(sequence.unwrap_or(0))),
            acked: Arc::new(AtomicBool::new(true)),
        }
    }

    pub fn record_sequence(&self, sequence: Option<u64>) {
        if let Some(seq) = sequence {
            self.sequence.store(seq, Ordering::SeqCst);
        }
    }

    #[must_use]
    pub fn sequence(&self) -> Option<u64> {
        match self.sequence.load(Ordering::SeqCst) {
            0 => None,
            seq => Some(seq),
        }
    }

    pub fn record_ack(&self) {
        self.acked.store(true, Ordering::SeqCst);
    }

    fn take_ack(&self) -> bool {
        self.acked.swap(false, Ordering::SeqCst)
    }
}

impl Default for HeartbeatTracker {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Output of the heartbeat task.
#[derive(Debug)]
pub enum HeartbeatCommand {
    Beat(GatewayPayload),
    /// The previous beat was never acknowledged.
    Missed,
}

pub struct HeartbeatManager {
    interval: Duration,
    tracker: HeartbeatTracker,
    handle: Option<JoinHandle<()>>,
}

impl HeartbeatManager {
    #[must_use]
    pub const fn new(interval: Duration, tracker: HeartbeatTracker) -> Self {
        Self {
            interval,
            tracker,
            handle: None,
        }
    }

    pub fn start(&mut self, command_tx: mpsc::Sender<HeartbeatCommand>) {
        self.stop();

        let interval = self.interval;
        let tracker = self.tracker.clone();
        let jitter = interval.mul_f64(HEARTBEAT_JITTER_PERCENT);

        self.handle = Some(tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + (interval - jitter), interval);

            loop {
                ticker.tick().await;

                let command = if tracker.take_ack() {
                    let sequence = tracker.sequence();
                    debug!(sequence = ?sequence, "Sending heartbeat");
                    HeartbeatCommand::Beat(GatewayPayload::heartbeat(sequence))
                } else {
                    warn!("Heartbeat ACK not received, connection may be dead");
                    HeartbeatCommand::Missed
                };

                if command_tx.send(command).await.is_err() {
                    debug!("Heartbeat channel closed");
                    break;
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

impl Drop for HeartbeatManager {
    fn drop(&mut self) {
        self.stop();
    }
}
