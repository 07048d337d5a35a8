mod test;

use crate::error::ChatError;
use std::time::Duration;

/// Time allowed to write a frame to the peer.
pub const WRITE_WAIT: Duration = Duration::from_secs(10);

/// Time allowed to read the next liveness acknowledgment from the peer.
pub const PONG_WAIT: Duration = Duration::from_secs(60);

/// Largest inbound frame accepted from a peer, in bytes.
pub const MAX_MESSAGE_SIZE: usize = 512;

/// Default capacity of a client's outbound queue.
pub const SEND_QUEUE_CAPACITY: usize = 256;

/// Default capacity of the hub's input queue.
pub const HUB_QUEUE_CAPACITY: usize = 256;

/// Timing and capacity settings for the hub and its clients.
///
/// The defaults are the values the server runs with; tests shrink them.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub write_wait: Duration,
    pub pong_wait: Duration,
    pub ping_period: Duration,
    pub max_message_size: usize,
    pub send_queue_capacity: usize,
    pub hub_queue_capacity: usize,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            write_wait: WRITE_WAIT,
            pong_wait: PONG_WAIT,
            ping_period: ping_period_for(PONG_WAIT),
            max_message_size: MAX_MESSAGE_SIZE,
            send_queue_capacity: SEND_QUEUE_CAPACITY,
            hub_queue_capacity: HUB_QUEUE_CAPACITY,
        }
    }
}

/// Probe period derived from a read deadline: nine tenths of it.
pub fn ping_period_for(pong_wait: Duration) -> Duration {
    pong_wait * 9 / 10
}

impl ChatConfig {
    pub fn with_write_wait(mut self, write_wait: Duration) -> Self {
        self.write_wait = write_wait;
        self
    }

    /// Sets the read deadline and re-derives the probe period from it.
    pub fn with_pong_wait(mut self, pong_wait: Duration) -> Self {
        self.pong_wait = pong_wait;
        self.ping_period = ping_period_for(pong_wait);
        self
    }

    pub fn with_ping_period(mut self, ping_period: Duration) -> Self {
        self.ping_period = ping_period;
        self
    }

    pub fn with_max_message_size(mut self, max_message_size: usize) -> Self {
        self.max_message_size = max_message_size;
        self
    }

    pub fn with_send_queue_capacity(mut self, capacity: usize) -> Self {
        self.send_queue_capacity = capacity;
        self
    }

    pub fn with_hub_queue_capacity(mut self, capacity: usize) -> Self {
        self.hub_queue_capacity = capacity;
        self
    }

    /// Checks the invariants the pumps rely on.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.ping_period.is_zero() || self.ping_period >= self.pong_wait {
            return Err(ChatError::Config(format!(
                "ping period {:?} must be non-zero and shorter than pong wait {:?}",
                self.ping_period, self.pong_wait
            )));
        }
        if self.write_wait.is_zero() {
            return Err(ChatError::Config("write wait must be non-zero".to_string()));
        }
        // tokio channels panic on a zero capacity
        if self.send_queue_capacity == 0 || self.hub_queue_capacity == 0 {
            return Err(ChatError::Config(
                "queue capacities must be at least 1".to_string(),
            ));
        }
        if self.max_message_size == 0 {
            return Err(ChatError::Config(
                "max message size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
