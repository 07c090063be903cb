//! Session registry — one entry per live transport connection.

use dashmap::DashMap;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;
use wire::{ConfigUpdate, ServerMessage};

/// One live connection: process-lifetime id (never reused), outbound
/// channel to the writer task, and handshake metadata.
pub struct Session {
    pub id: u64,
    outbound: mpsc::UnboundedSender<String>,
    metadata: RwLock<HashMap<String, Value>>,
}

impl Session {
    /// Merge hello metadata additively: keys in the payload overwrite,
    /// keys absent from the payload are retained.
    pub fn merge_metadata(&self, incoming: HashMap<String, Value>) {
        self.metadata.write().extend(incoming);
    }

    pub fn metadata(&self) -> HashMap<String, Value> {
        self.metadata.read().clone()
    }

    /// Hand a frame to the writer task. Returns false when the socket is
    /// no longer writable.
    pub fn send_frame(&self, frame: String) -> bool {
        self.outbound.send(frame).is_ok()
    }
}

#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<u64, Arc<Session>>,
    next_id: AtomicU64,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn register(&self, outbound: mpsc::UnboundedSender<String>) -> Arc<Session> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let session = Arc::new(Session {
            id,
            outbound,
            metadata: RwLock::new(HashMap::new()),
        });
        self.sessions.insert(id, Arc::clone(&session));
        session
    }

    /// Drop a session; it is no longer addressable. Events it produced
    /// stay in the log store.
    pub fn remove(&self, id: u64) -> Option<Arc<Session>> {
        self.sessions.remove(&id).map(|(_, session)| session)
    }

    pub fn get(&self, id: u64) -> Option<Arc<Session>> {
        self.sessions.get(&id).map(|entry| Arc::clone(&entry))
    }

    pub fn count(&self) -> usize {
        self.sessions.len()
    }

    /// Re-send the config payload to every live session. A session whose
    /// socket is not ready to send is skipped. Returns the delivery count.
    pub fn broadcast_config(&self, update: &ConfigUpdate) -> usize {
        let frame = match serde_json::to_string(&ServerMessage::Config {
            config: update.clone(),
        }) {
            Ok(frame) => frame,
            Err(e) => {
                debug!("failed to serialize config broadcast: {}", e);
                return 0;
            }
        };
        let mut delivered = 0;
        for session in self.sessions.iter() {
            if session.send_frame(frame.clone()) {
                delivered += 1;
            }
        }
        delivered
    }
}
