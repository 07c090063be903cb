//! Probe — the explicit capture context owned by the instrumented process.
//!
//! Each process constructs one `Probe`, passes it wherever capture is
//! needed, and controls its lifecycle with `start`/`stop`. There is no
//! module-wide singleton.

use parking_lot::{Mutex, RwLock};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use wire::{CaptureOptions, ClientMessage, ConfigUpdate, Level, LogEventPayload};

use crate::encode::{self, callsite, CallSite, TimerTable};
use crate::transport::{TransportHandle, TransportSettings};
use crate::value::Captured;

/// Capabilities of the hosting runtime, injected at construction. One
/// probe implementation serves every environment; capability flags decide
/// which capture points are live.
#[derive(Debug, Clone)]
pub struct RuntimeCaps {
    pub supports_network_interception: bool,
    pub environment_tag: String,
}

impl RuntimeCaps {
    pub fn server() -> Self {
        Self {
            supports_network_interception: false,
            environment_tag: "server".to_string(),
        }
    }

    pub fn browser() -> Self {
        Self {
            supports_network_interception: true,
            environment_tag: "browser".to_string(),
        }
    }
}

/// Capture configuration, updated in place by inbound `config` frames.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub network_enabled: bool,
    pub capture_errors: bool,
    pub capture: CaptureOptions,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network_enabled: true,
            capture_errors: true,
            capture: CaptureOptions::default(),
        }
    }
}

impl ClientConfig {
    /// Shallow merge: keys present in the update override, absent keys
    /// are retained.
    pub fn apply(&mut self, update: &ConfigUpdate) {
        if let Some(v) = update.network_enabled {
            self.network_enabled = v;
        }
        if let Some(v) = update.capture_errors {
            self.capture_errors = v;
        }
        if let Some(v) = update.log_capture_options {
            self.capture = v;
        }
    }
}

/// Transport settings for a probe.
#[derive(Debug, Clone)]
pub struct ProbeSettings {
    pub host: String,
    pub port: u16,
    pub reconnect_delay: Duration,
    /// Extra handshake metadata, sent alongside the environment tag.
    pub metadata: HashMap<String, Value>,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4780,
            reconnect_delay: Duration::from_secs(2),
            metadata: HashMap::new(),
        }
    }
}

struct ProbeShared {
    caps: RuntimeCaps,
    config: Arc<RwLock<ClientConfig>>,
    timers: Mutex<TimerTable>,
    transport: TransportHandle,
    hooks_installed: AtomicBool,
}

#[derive(Clone)]
pub struct Probe {
    shared: Arc<ProbeShared>,
}

impl Probe {
    /// Build a probe context. Must be called within a tokio runtime; the
    /// transport actor is spawned immediately but stays disconnected
    /// until `start`.
    pub fn new(caps: RuntimeCaps, settings: ProbeSettings) -> Probe {
        let config = Arc::new(RwLock::new(ClientConfig::default()));
        let mut hello = settings.metadata;
        hello.insert(
            "runtime".to_string(),
            Value::from(caps.environment_tag.clone()),
        );
        let transport = TransportHandle::spawn(
            TransportSettings {
                host: settings.host,
                port: settings.port,
                reconnect_delay: settings.reconnect_delay,
                hello: ClientMessage::Hello { client: hello },
            },
            Arc::clone(&config),
        );
        Probe {
            shared: Arc::new(ProbeShared {
                caps,
                config,
                timers: Mutex::new(TimerTable::new()),
                transport,
                hooks_installed: AtomicBool::new(false),
            }),
        }
    }

    /// Install capture hooks (exactly once; a second call is a no-op for
    /// installation) and open the connection.
    pub fn start(&self) {
        if !self.shared.hooks_installed.swap(true, Ordering::SeqCst) {
            self.install_panic_hook();
        }
        self.shared.transport.start();
    }

    /// Close the active connection, if any. The outbound queue is neither
    /// drained nor persisted.
    pub fn stop(&self) {
        self.shared.transport.stop();
    }

    pub fn config(&self) -> ClientConfig {
        self.shared.config.read().clone()
    }

    // ── Console-style capture points ─────────────────────────────

    #[track_caller]
    pub fn log(&self, values: &[Captured]) {
        self.console(Level::Log, values, CallSite::here());
    }

    #[track_caller]
    pub fn info(&self, values: &[Captured]) {
        self.console(Level::Info, values, CallSite::here());
    }

    #[track_caller]
    pub fn warn(&self, values: &[Captured]) {
        self.console(Level::Warn, values, CallSite::here());
    }

    #[track_caller]
    pub fn debug(&self, values: &[Captured]) {
        self.console(Level::Debug, values, CallSite::here());
    }

    #[track_caller]
    pub fn trace(&self, values: &[Captured]) {
        self.console(Level::Trace, values, CallSite::here());
    }

    /// Error-level capture also carries a machinery-filtered backtrace.
    #[track_caller]
    pub fn error(&self, values: &[Captured]) {
        let site = CallSite::here();
        let opts = self.shared.config.read().capture;
        let stack = callsite::capture_stack();
        self.emit(encode::console_event(
            Level::Error,
            values,
            &opts,
            Some(site),
            stack,
            &self.shared.caps.environment_tag,
        ));
    }

    fn console(&self, level: Level, values: &[Captured], site: CallSite) {
        let opts = self.shared.config.read().capture;
        self.emit(encode::console_event(
            level,
            values,
            &opts,
            Some(site),
            None,
            &self.shared.caps.environment_tag,
        ));
    }

    // ── Timers ───────────────────────────────────────────────────

    /// Start (or restart) a timer. `None` means the `"default"` label.
    pub fn time(&self, label: Option<&str>) {
        self.shared.timers.lock().start(label);
    }

    /// Intermediate reading; an unknown label produces no event.
    #[track_caller]
    pub fn time_log(&self, label: Option<&str>) {
        let site = CallSite::here();
        let reading = self.shared.timers.lock().elapsed(label);
        if let Some((label, ms)) = reading {
            self.emit(encode::timer_event(
                &label,
                ms,
                Some(site),
                &self.shared.caps.environment_tag,
            ));
        }
    }

    /// Final reading; an unknown label produces no event.
    #[track_caller]
    pub fn time_end(&self, label: Option<&str>) {
        let site = CallSite::here();
        let reading = self.shared.timers.lock().finish(label);
        if let Some((label, ms)) = reading {
            self.emit(encode::timer_event(
                &label,
                ms,
                Some(site),
                &self.shared.caps.environment_tag,
            ));
        }
    }

    // ── Errors ───────────────────────────────────────────────────

    /// Explicit error report, e.g. a caught top-level failure.
    #[track_caller]
    pub fn report_error(&self, name: &str, message: &str) {
        if !self.shared.config.read().capture_errors {
            return;
        }
        let site = CallSite::here();
        let stack = callsite::capture_stack();
        self.emit(encode::error_event(
            name,
            message,
            stack,
            Some(site),
            &self.shared.caps.environment_tag,
        ));
    }

    // ── Network ──────────────────────────────────────────────────

    /// Begin observing an outbound network call. On runtimes without
    /// network interception the returned span completes as a no-op.
    #[track_caller]
    pub fn observe_network(&self, method: &str, url: &str) -> NetworkSpan {
        NetworkSpan {
            probe: self.clone(),
            method: method.to_string(),
            url: url.to_string(),
            started: Instant::now(),
            site: CallSite::here(),
            enabled: self.shared.caps.supports_network_interception,
        }
    }

    fn emit(&self, payload: LogEventPayload) {
        self.shared.transport.send(ClientMessage::Log(payload));
    }

    /// Emit an error event when a panic reaches the hook, then always
    /// invoke the previously installed hook: capture must not change the
    /// process's own panic behaviour.
    fn install_panic_hook(&self) {
        let shared = Arc::downgrade(&self.shared);
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            if let Some(shared) = shared.upgrade() {
                if shared.config.read().capture_errors {
                    let message = panic_message(info);
                    let site = info.location().map(CallSite::from_location);
                    let stack = callsite::capture_stack();
                    let payload = encode::error_event(
                        "panic",
                        &message,
                        stack,
                        site,
                        &shared.caps.environment_tag,
                    );
                    shared.transport.send(ClientMessage::Log(payload));
                }
            }
            previous(info);
        }));
    }
}

/// One observed network call in flight.
pub struct NetworkSpan {
    probe: Probe,
    method: String,
    url: String,
    started: Instant,
    site: CallSite,
    enabled: bool,
}

impl NetworkSpan {
    /// Complete the observation. `None` means the call failed before a
    /// status was available.
    pub fn complete(self, status: Option<u16>) {
        if !self.enabled || !self.probe.shared.config.read().network_enabled {
            return;
        }
        let ms = self.started.elapsed().as_secs_f64() * 1_000.0;
        self.probe.emit(encode::network_event(
            &self.method,
            &self.url,
            status,
            ms,
            Some(self.site),
            &self.probe.shared.caps.environment_tag,
        ));
    }
}

fn panic_message(info: &std::panic::PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}
