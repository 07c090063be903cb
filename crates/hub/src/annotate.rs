//! Inline annotation state — per-file, per-line aggregation of the most
//! recent event plus an occurrence count.
//!
//! Entries are keyed by `(resolved file, zero-based line)`. They are
//! created on the first event for a line, replaced (count incremented) on
//! every later one, and only ever removed by `clear_all`. An entry may
//! outlive its source event in the log store; that staleness is accepted
//! behaviour, not cleaned up.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wire::Level;

use crate::correlate::SourceCorrelator;
use crate::store::LogEvent;

pub struct LineState {
    pub event: Arc<LogEvent>,
    pub occurrences: u64,
}

/// One display directive for an annotated line.
#[derive(Debug, Clone, PartialEq)]
pub struct InlineAnnotation {
    /// Zero-based line number.
    pub line: u32,
    pub text: String,
    /// `+N` for N repeats beyond the first; absent for a single event.
    pub occurrence_suffix: Option<String>,
    pub hover_detail: String,
}

#[derive(Default)]
pub struct AnnotationState {
    lines: HashMap<(PathBuf, u32), LineState>,
}

impl AnnotationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one event in. Unresolvable locations contribute nothing (the
    /// event still lives in the log store). Returns the touched key.
    pub fn record(
        &mut self,
        event: &Arc<LogEvent>,
        correlator: &SourceCorrelator,
    ) -> Option<(PathBuf, u32)> {
        let location = event.location.as_ref()?;
        let file = correlator.resolve(&location.file)?;
        let line = location.line.saturating_sub(1);
        let key = (file, line);
        self.lines
            .entry(key.clone())
            .and_modify(|state| {
                state.event = Arc::clone(event);
                state.occurrences += 1;
            })
            .or_insert_with(|| LineState {
                event: Arc::clone(event),
                occurrences: 1,
            });
        Some(key)
    }

    /// Display directives for one file, restricted to enabled levels.
    /// Filtered-out levels are fully absent from the result.
    pub fn render(&self, file: &Path, enabled: &HashSet<Level>) -> Vec<InlineAnnotation> {
        let mut out: Vec<InlineAnnotation> = self
            .lines
            .iter()
            .filter(|((f, _), _)| f == file)
            .filter(|(_, state)| enabled.contains(&state.event.level))
            .map(|((_, line), state)| InlineAnnotation {
                line: *line,
                text: format_event(&state.event),
                occurrence_suffix: (state.occurrences > 1)
                    .then(|| format!("+{}", state.occurrences - 1)),
                hover_detail: hover_detail(&state.event),
            })
            .collect();
        out.sort_by_key(|a| a.line);
        out
    }

    pub fn clear_all(&mut self) {
        self.lines.clear();
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn occurrences(&self, file: &Path, line: u32) -> Option<u64> {
        self.lines
            .get(&(file.to_path_buf(), line))
            .map(|s| s.occurrences)
    }
}

/// One-line display text; network and timer events get dedicated formats.
fn format_event(event: &LogEvent) -> String {
    match event.kind.as_str() {
        "network" => {
            let method = event.method.as_deref().unwrap_or("GET");
            let url = event.url.as_deref().unwrap_or("");
            let status = event
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "failed".to_string());
            match event.duration_ms {
                Some(ms) => format!("{} {} {} ({:.0}ms)", method, url, status, ms),
                None => format!("{} {} {}", method, url, status),
            }
        }
        "time" => {
            let label = event.label.as_deref().unwrap_or("default");
            match event.duration_ms {
                Some(ms) => format!("{}: {:.1}ms", label, ms),
                None => label.to_string(),
            }
        }
        _ => event.text.clone(),
    }
}

fn hover_detail(event: &LogEvent) -> String {
    let mut detail = format!("[{}] {}", event.level.as_str(), event.text);
    if !event.values.is_empty() {
        if let Ok(json) = serde_json::to_string_pretty(&event.values) {
            detail.push('\n');
            detail.push_str(&json);
        }
    }
    if let Some(location) = &event.location {
        detail.push_str(&format!("\n{}:{}", location.file, location.line));
    }
    detail
}
