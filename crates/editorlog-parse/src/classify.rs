use lazy_static::lazy_static;
use regex::Regex;

use crate::ir::LineKind;

lazy_static! {
    static ref TIMESTAMP: Regex =
        Regex::new(r"(\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2})").expect("timestamp regex");
}

/// Marker that prefixes an embedded telemetry packet.
pub const TELEMETRY_MARKER: &str = "##utp:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineClass {
    pub kind: LineKind,
    pub indent: u32,
    pub is_error: bool,
    pub is_warning: bool,
    pub timestamp: Option<String>,
}

/// Tags a single line. First match wins; the timestamp is found independently.
pub fn classify(line: &str) -> LineClass {
    let indent = line.chars().take_while(|c| *c == '\t').count() as u32;
    let lower = line.to_lowercase();

    let kind = if lower.contains("error") || lower.contains("exception") {
        LineKind::Error
    } else if lower.contains("warning") {
        LineKind::Warning
    } else if line.starts_with('[') {
        LineKind::System
    } else if line.contains("Start importing") {
        LineKind::Import
    } else if line.contains("Asset Pipeline Refresh") {
        LineKind::Pipeline
    } else if line.contains("Domain Reload") {
        LineKind::DomainReload
    } else if line.contains(TELEMETRY_MARKER) {
        LineKind::Telemetry
    } else {
        LineKind::Normal
    };

    LineClass {
        kind,
        indent,
        is_error: kind == LineKind::Error,
        is_warning: kind == LineKind::Warning,
        timestamp: TIMESTAMP
            .captures(line)
            .map(|caps| caps[1].to_string()),
    }
}
