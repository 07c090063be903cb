//! Call-site capture — caller locations and machinery-filtered backtraces.

use std::backtrace::Backtrace;
use std::panic::Location;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSite {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl CallSite {
    /// Location of the nearest caller outside the capture machinery.
    /// Every public capture entry point is `#[track_caller]`, so the
    /// machinery's own frames never show up here.
    #[track_caller]
    pub fn here() -> CallSite {
        Self::from_location(Location::caller())
    }

    pub fn from_location(loc: &Location<'_>) -> CallSite {
        CallSite {
            file: loc.file().to_string(),
            line: loc.line(),
            column: loc.column(),
        }
    }
}

/// Symbol fragments identifying the capture machinery's own frames.
const MACHINERY_MARKERS: &[&str] = &[
    "probe::context",
    "probe::encode",
    "probe::value",
    "probe::transport",
    "probe::intercept",
    "std::backtrace",
    "std::panicking",
    "core::panicking",
];

/// Capture a backtrace and drop the capture machinery's own frames.
/// Returns `None` when no frame survives filtering.
pub fn capture_stack() -> Option<String> {
    let raw = Backtrace::force_capture().to_string();
    let filtered = filter_frames(&raw);
    if filtered.trim().is_empty() {
        None
    } else {
        Some(filtered)
    }
}

/// Filter the textual frames of a captured backtrace. The std format pairs
/// a numbered symbol line with an optional `at file:line:col` line; both
/// are dropped together when the symbol belongs to the machinery.
pub fn filter_frames(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    for line in raw.lines() {
        let trimmed = line.trim_start();
        if is_frame_header(trimmed) {
            skipping = MACHINERY_MARKERS.iter().any(|m| trimmed.contains(m));
            if !skipping {
                kept.push(line);
            }
        } else if !skipping {
            kept.push(line);
        }
    }
    if kept.iter().any(|l| is_frame_header(l.trim_start())) {
        kept.join("\n")
    } else {
        String::new()
    }
}

/// A frame header looks like `12: some::symbol::path`.
fn is_frame_header(trimmed: &str) -> bool {
    match trimmed.split_once(':') {
        Some((index, _)) => !index.is_empty() && index.chars().all(|c| c.is_ascii_digit()),
        None => false,
    }
}
