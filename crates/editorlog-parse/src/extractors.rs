//! Single-line grammars: script compilation, telemetry and timed operations.

use lazy_static::lazy_static;
use regex::Regex;

use crate::classify::TELEMETRY_MARKER;
use crate::ir::{Operation, ScriptCompilation, Telemetry};

lazy_static! {
    static ref ASSEMBLY: Regex = Regex::new(r"Processing assembly (.+?), with (\d+) defines and (\d+) references")
        .expect("assembly regex");
    static ref TELEMETRY: Regex = Regex::new(r"##utp:(\{.+\})").expect("telemetry regex");
    static ref OPERATION: Regex = Regex::new(
        r#"([^:]+)\s*:\s*"\s*##\s*(.+?)\s*##\s*"\s+took\s+([\d.]+)\s+sec(?:.*current mem:\s*(\d+)\s*MB)?"#
    )
    .expect("operation regex");
    static ref TUNDRA: Regex = Regex::new(
        r"\*\*\*\s+Tundra\s+([^(]+)\s+\(([\d.]+)\s+seconds?\),\s+(\d+)\s+items?\s+updated,\s+(\d+)\s+evaluated"
    )
    .expect("tundra regex");
}

pub fn script_compilation(text: &str, line: u32) -> Option<ScriptCompilation> {
    if !text.contains("Processing assembly") {
        return None;
    }
    let caps = ASSEMBLY.captures(text)?;
    Some(ScriptCompilation {
        line,
        assembly_path: caps[1].to_string(),
        defines: caps[2].parse().ok()?,
        references: caps[3].parse().ok()?,
    })
}

/// Whether the line carries a telemetry packet at all.
pub fn has_telemetry(text: &str) -> bool {
    text.contains(TELEMETRY_MARKER) && TELEMETRY.is_match(text)
}

/// Parses a `##utp:{...}` packet.
///
/// The caller decides what to do with a malformed payload; nothing here panics.
pub fn telemetry(text: &str, line: u32) -> Result<Option<Telemetry>, serde_json::Error> {
    let Some(caps) = TELEMETRY.captures(text) else {
        return Ok(None);
    };
    let raw = &caps[1];
    let value: serde_json::Value = serde_json::from_str(raw)?;
    let telemetry_type = value
        .get("type")
        .and_then(|t| t.as_str())
        .unwrap_or("Unknown")
        .to_string();
    Ok(Some(Telemetry {
        line,
        telemetry_type,
        payload: raw.to_string(),
    }))
}

/// `<Type> : " ## <Name> ## " took <N> sec (current mem: <M> MB)`
pub fn operation(text: &str, line: u32) -> Option<Operation> {
    if !text.contains("took") {
        return None;
    }
    let caps = OPERATION.captures(text)?;
    let seconds: f64 = caps[3].parse().ok()?;
    Some(Operation {
        line,
        operation_type: caps[1].trim().to_string(),
        name: caps[2].trim().to_string(),
        seconds,
        ms: seconds * 1000.0,
        memory_mb: caps.get(4).and_then(|m| m.as_str().parse().ok()),
    })
}

/// `*** Tundra <phase> (<N> seconds), <U> items updated, <E> evaluated`
pub fn tundra(text: &str, line: u32) -> Option<Operation> {
    if !text.contains("*** Tundra") {
        return None;
    }
    let caps = TUNDRA.captures(text)?;
    let seconds: f64 = caps[2].parse().ok()?;
    let updated: u64 = caps[3].parse().ok()?;
    let evaluated: u64 = caps[4].parse().ok()?;
    Some(Operation {
        line,
        operation_type: "Tundra".to_string(),
        name: format!(
            "{} ({} items updated, {} evaluated)",
            caps[1].trim(),
            updated,
            evaluated
        ),
        seconds,
        ms: seconds * 1000.0,
        memory_mb: None,
    })
}
