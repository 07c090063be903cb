//! Event payload builders for each capture point.

use chrono::Utc;
use serde_json::Value;
use wire::{CaptureOptions, Level, LogEventPayload};

use crate::value::serialize::clip;
use crate::value::{serialize, Captured};

use super::callsite::CallSite;

pub(crate) fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Console-style capture: serialize each value and derive a preview line.
pub fn console_event(
    level: Level,
    values: &[Captured],
    opts: &CaptureOptions,
    site: Option<CallSite>,
    stack: Option<String>,
    source: &str,
) -> LogEventPayload {
    let serialized: Vec<Value> = values.iter().map(|v| serialize(v, opts)).collect();
    let text = preview_line(&serialized, opts);
    LogEventPayload {
        level: Some(level.as_str().to_string()),
        text: Some(text),
        values: serialized,
        timestamp: Some(now_millis()),
        file: site.as_ref().map(|s| s.file.clone()),
        line: site.as_ref().map(|s| s.line),
        column: site.as_ref().map(|s| s.column),
        stack,
        source: Some(source.to_string()),
        ..Default::default()
    }
}

/// Timer reading (`timeLog` / `timeEnd`).
pub fn timer_event(
    label: &str,
    duration_ms: f64,
    site: Option<CallSite>,
    source: &str,
) -> LogEventPayload {
    LogEventPayload {
        level: Some(Level::Time.as_str().to_string()),
        kind: Some("time".to_string()),
        text: Some(format!("{}: {:.1}ms", label, duration_ms)),
        timestamp: Some(now_millis()),
        file: site.as_ref().map(|s| s.file.clone()),
        line: site.as_ref().map(|s| s.line),
        column: site.as_ref().map(|s| s.column),
        label: Some(label.to_string()),
        duration_ms: Some(duration_ms),
        source: Some(source.to_string()),
        ..Default::default()
    }
}

/// Uncaught failure (panic hook or explicit error report).
pub fn error_event(
    name: &str,
    message: &str,
    stack: Option<String>,
    site: Option<CallSite>,
    source: &str,
) -> LogEventPayload {
    let text = if name.is_empty() {
        message.to_string()
    } else {
        format!("{}: {}", name, message)
    };
    LogEventPayload {
        level: Some(Level::Error.as_str().to_string()),
        text: Some(text),
        timestamp: Some(now_millis()),
        file: site.as_ref().map(|s| s.file.clone()),
        line: site.as_ref().map(|s| s.line),
        column: site.as_ref().map(|s| s.column),
        stack,
        source: Some(source.to_string()),
        ..Default::default()
    }
}

/// Completed outbound network call.
pub fn network_event(
    method: &str,
    url: &str,
    status: Option<u16>,
    duration_ms: f64,
    site: Option<CallSite>,
    source: &str,
) -> LogEventPayload {
    let status_text = status
        .map(|s| s.to_string())
        .unwrap_or_else(|| "failed".to_string());
    LogEventPayload {
        level: Some(Level::Network.as_str().to_string()),
        kind: Some("network".to_string()),
        text: Some(format!("{} {} {} ({:.0}ms)", method, url, status_text, duration_ms)),
        timestamp: Some(now_millis()),
        file: site.as_ref().map(|s| s.file.clone()),
        line: site.as_ref().map(|s| s.line),
        column: site.as_ref().map(|s| s.column),
        url: Some(url.to_string()),
        method: Some(method.to_string()),
        status,
        duration_ms: Some(duration_ms),
        source: Some(source.to_string()),
        ..Default::default()
    }
}

/// Best-effort preview of serialized values. Stringification can never
/// fail out of the capture path; anything unprintable coarsens instead.
fn preview_line(values: &[Value], opts: &CaptureOptions) -> String {
    let joined = values
        .iter()
        .map(preview)
        .collect::<Vec<_>>()
        .join(" ");
    clip(&joined, opts.max_string_length)
}

fn preview(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => serde_json::to_string(other).unwrap_or_else(|_| coarse(other).to_string()),
    }
}

fn coarse(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "[Bool]",
        Value::Number(_) => "[Number]",
        Value::String(_) => "[String]",
        Value::Array(_) => "[Array]",
        Value::Object(_) => "[Object]",
    }
}
