use lazy_static::lazy_static;
use regex::Regex;

use crate::ir::PipelineRefresh;

lazy_static! {
    static ref HEADER: Regex = Regex::new(
        r"Asset Pipeline Refresh \(id=([a-f0-9]+)\): Total: ([\d.]+) seconds - Initiated by (.+?)$"
    )
    .expect("refresh header regex");
    static ref IMPORTS: Regex = Regex::new(r"total=(\d+).*actual=(\d+)").expect("imports regex");
    static ref MANAGED_NATIVE: Regex =
        Regex::new(r"managed=(\d+)\s*ms.*native=(\d+)\s*ms").expect("managed/native regex");
    static ref SCRIPTING: Regex = Regex::new(
        r"domain reloads=(\d+).*domain reload time=(\d+)\s*ms.*compile time=(\d+)\s*ms.*other=(\d+)\s*ms"
    )
    .expect("scripting regex");
}

/// Parses a refresh header and fills its breakdown from the `following` lines.
///
/// Every breakdown field is optional; a header always yields a record.
pub fn parse<S: AsRef<str>>(header: &str, line: u32, following: &[S]) -> Option<PipelineRefresh> {
    let caps = HEADER.captures(header.trim_end())?;
    let mut refresh = PipelineRefresh {
        line,
        refresh_id: caps[1].to_string(),
        total_seconds: caps[2].parse().ok()?,
        initiated_by: caps[3].to_string(),
        ..PipelineRefresh::default()
    };

    for text in following {
        let text: &str = text.as_ref();
        if text.contains("Imports: total=") {
            if let Some(caps) = IMPORTS.captures(text) {
                refresh.imports_total = caps[1].parse().ok();
                refresh.imports_actual = caps[2].parse().ok();
            }
        } else if text.contains("Asset DB Process Time:") {
            refresh.asset_db_process_ms = managed_plus_native(text);
        } else if text.contains("Asset DB Callback time:") {
            refresh.asset_db_callback_ms = managed_plus_native(text);
        } else if text.contains("Scripting:") && text.contains("domain reload") {
            if let Some(caps) = SCRIPTING.captures(text) {
                refresh.domain_reloads = caps[1].parse().ok();
                refresh.domain_reload_ms = caps[2].parse().ok();
                refresh.compile_ms = caps[3].parse().ok();
                refresh.scripting_other_ms = caps[4].parse().ok();
            }
        }
    }

    Some(refresh)
}

fn managed_plus_native(text: &str) -> Option<u64> {
    let caps = MANAGED_NATIVE.captures(text)?;
    let managed: u64 = caps[1].parse().ok()?;
    let native: u64 = caps[2].parse().ok()?;
    managed.checked_add(native)
}
