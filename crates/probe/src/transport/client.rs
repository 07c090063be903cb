//! ClientCore — the connection state machine.
//!
//! `disconnected → connecting → open → disconnected`, looping. The core
//! consumes inputs and returns effect lists for the driver to execute, so
//! queue ordering and reconnect idempotence are testable without sockets.
//!
//! While not open, outbound frames accumulate in an unbounded FIFO queue;
//! on open the whole queue flushes in order, then the per-connection
//! `hello` goes out. Each close schedules exactly one reconnect attempt.

use std::collections::VecDeque;
use wire::ClientMessage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    Disconnected,
    Connecting,
    Open,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Open a TCP connection to the configured address.
    Connect,
    /// Write one serialized frame to the open connection.
    Transmit(String),
    /// Arm the fixed-delay reconnect timer.
    ScheduleReconnect,
    /// Drop the active connection.
    CloseSocket,
}

pub struct ClientCore {
    state: ClientState,
    queue: VecDeque<String>,
    reconnect_pending: bool,
    started: bool,
    hello: String,
}

impl ClientCore {
    pub fn new(hello: &ClientMessage) -> Self {
        let hello = serde_json::to_string(hello).unwrap_or_else(|_| {
            // metadata values are plain JSON, this cannot fail in practice
            "{\"type\":\"hello\",\"client\":{}}".to_string()
        });
        Self {
            state: ClientState::Disconnected,
            queue: VecDeque::new(),
            reconnect_pending: false,
            started: false,
            hello,
        }
    }

    pub fn state(&self) -> ClientState {
        self.state
    }

    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    pub fn on_start(&mut self) -> Vec<Effect> {
        self.started = true;
        if self.state == ClientState::Disconnected && !self.reconnect_pending {
            self.state = ClientState::Connecting;
            vec![Effect::Connect]
        } else {
            vec![]
        }
    }

    /// Queue or transmit one outbound message. Serialization failure drops
    /// the frame; it never propagates into the capture path.
    pub fn on_send(&mut self, msg: &ClientMessage) -> Vec<Effect> {
        let frame = match serde_json::to_string(msg) {
            Ok(frame) => frame,
            Err(e) => {
                tracing::debug!("dropping unserializable frame: {}", e);
                return vec![];
            }
        };
        if self.state == ClientState::Open {
            vec![Effect::Transmit(frame)]
        } else {
            self.queue.push_back(frame);
            vec![]
        }
    }

    /// The driver's connect attempt succeeded: flush the backlog in
    /// original order, then greet this connection.
    pub fn on_opened(&mut self) -> Vec<Effect> {
        self.state = ClientState::Open;
        let mut effects: Vec<Effect> = self.queue.drain(..).map(Effect::Transmit).collect();
        effects.push(Effect::Transmit(self.hello.clone()));
        effects
    }

    /// Connection closed or errored (including failed connect attempts).
    /// Schedules at most one reconnect regardless of how many close events
    /// fire before the timer does.
    pub fn on_closed(&mut self) -> Vec<Effect> {
        self.state = ClientState::Disconnected;
        if !self.started || self.reconnect_pending {
            return vec![];
        }
        self.reconnect_pending = true;
        vec![Effect::ScheduleReconnect]
    }

    /// The reconnect timer fired. Skipped when a connection already exists.
    pub fn on_reconnect_due(&mut self) -> Vec<Effect> {
        self.reconnect_pending = false;
        if self.started && self.state == ClientState::Disconnected {
            self.state = ClientState::Connecting;
            vec![Effect::Connect]
        } else {
            vec![]
        }
    }

    /// Explicit stop: close the connection, abandon any pending reconnect.
    /// The queue is neither drained nor persisted.
    pub fn on_stop(&mut self) -> Vec<Effect> {
        self.started = false;
        self.reconnect_pending = false;
        let had_connection = self.state != ClientState::Disconnected;
        self.state = ClientState::Disconnected;
        if had_connection {
            vec![Effect::CloseSocket]
        } else {
            vec![]
        }
    }
}
