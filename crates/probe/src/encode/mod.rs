//! Encode module — turns capture points into wire payloads.

pub mod callsite;
pub mod event;
pub mod timer;

pub use callsite::CallSite;
pub use event::{console_event, error_event, network_event, timer_event};
pub use timer::{TimerTable, DEFAULT_LABEL};
