//! Hub state — HubState struct, shared state type alias.

use parking_lot::Mutex;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::broadcast;
use wire::{ClientMessage, ConfigUpdate, Level};

use crate::annotate::{AnnotationState, InlineAnnotation};
use crate::conf::HubConfig;
use crate::correlate::{PathMapping, SourceCorrelator};
use crate::server::{Session, SessionRegistry};
use crate::store::{LogEvent, LogStore};

pub struct HubState {
    pub config: HubConfig,
    pub store: Mutex<LogStore>,
    pub annotations: Mutex<AnnotationState>,
    pub correlator: SourceCorrelator,
    pub sessions: SessionRegistry,
    /// Live append feed for the panel collaborator.
    events_tx: broadcast::Sender<Arc<LogEvent>>,
}

impl HubState {
    pub fn new(config: HubConfig) -> Self {
        let mappings = config
            .path_mappings
            .iter()
            .map(|m| PathMapping {
                url_prefix: m.url_prefix.clone(),
                local_path_prefix: m.local_path_prefix.clone(),
            })
            .collect();
        let roots = config.workspace_roots.iter().map(PathBuf::from).collect();
        let (events_tx, _) = broadcast::channel(256);
        Self {
            store: Mutex::new(LogStore::new(config.max_log_entries)),
            annotations: Mutex::new(AnnotationState::new()),
            correlator: SourceCorrelator::new(mappings, roots),
            sessions: SessionRegistry::new(),
            events_tx,
            config,
        }
    }

    /// Process one parsed frame from a session. All state touched by one
    /// frame is updated before the reader moves to the next.
    pub fn handle_message(&self, session: &Session, msg: ClientMessage) {
        match msg {
            ClientMessage::Hello { client } => session.merge_metadata(client),
            ClientMessage::Log(payload) => {
                self.ingest(payload, session.id);
            }
        }
    }

    /// Store, annotate, and announce one event.
    pub fn ingest(&self, payload: wire::LogEventPayload, client_id: u64) -> Arc<LogEvent> {
        let event = self.store.lock().ingest(payload, client_id);
        self.annotations.lock().record(&event, &self.correlator);
        // no receivers is fine; the panel may not be open
        let _ = self.events_tx.send(Arc::clone(&event));
        event
    }

    /// Empty the store and drop every inline annotation. Event ids keep
    /// increasing afterwards.
    pub fn clear_logs(&self) {
        self.store.lock().clear();
        self.annotations.lock().clear_all();
    }

    pub fn snapshot(&self) -> Vec<Arc<LogEvent>> {
        self.store.lock().snapshot()
    }

    pub fn find(&self, id: u64) -> Option<Arc<LogEvent>> {
        self.store.lock().find(id)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<LogEvent>> {
        self.events_tx.subscribe()
    }

    pub fn render_file(&self, file: &Path, enabled: &HashSet<Level>) -> Vec<InlineAnnotation> {
        self.annotations.lock().render(file, enabled)
    }

    /// Live session count, for the status collaborator.
    pub fn live_sessions(&self) -> usize {
        self.sessions.count()
    }

    pub fn client_update(&self) -> ConfigUpdate {
        self.config.client_update()
    }

    /// Push the current config to every connected probe.
    pub fn broadcast_config(&self) -> usize {
        self.sessions.broadcast_config(&self.client_update())
    }
}

pub type SharedState = Arc<HubState>;
