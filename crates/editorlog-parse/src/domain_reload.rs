use lazy_static::lazy_static;
use regex::Regex;
use std::collections::BTreeMap;

use crate::ir::DomainReloadStep;

pub const HEADER_MARKER: &str = "Domain Reload Profiling:";

lazy_static! {
    static ref STEP: Regex = Regex::new(r"^(\t*)(.+?) \((\d+)ms\)").expect("reload step regex");
}

/// Rebuilds the profiling forest that follows a `Domain Reload Profiling:` header.
///
/// Nodes get ids from a counter that spans the whole run, so every block of
/// the same session shares one id space. Only the most recent node per depth
/// is remembered; a node at depth `d` drops everything deeper than `d`.
#[derive(Debug)]
pub struct ReloadTracker {
    active: bool,
    next_id: u32,
    last_at_depth: BTreeMap<u32, u32>,
}

impl Default for ReloadTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ReloadTracker {
    pub fn new() -> Self {
        Self {
            active: false,
            next_id: 1,
            last_at_depth: BTreeMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enters reload mode; a new block never inherits ancestry from an old one.
    pub fn begin(&mut self) {
        self.active = true;
        self.last_at_depth.clear();
    }

    /// Feeds a line while in reload mode.
    ///
    /// Returns the step it describes. A line that is not a step ends the
    /// mode and is handed back to the caller untouched (`None`).
    pub fn feed(&mut self, text: &str, line: u32) -> Option<DomainReloadStep> {
        let Some(caps) = STEP.captures(text) else {
            self.active = false;
            self.last_at_depth.clear();
            return None;
        };
        let ms: f64 = caps[3].parse().unwrap_or_default();
        let depth = caps[1].len() as u32;
        let parent = match depth {
            0 => None,
            d => self.last_at_depth.get(&(d - 1)).copied(),
        };
        let id = self.next_id;
        self.next_id += 1;

        self.last_at_depth.insert(depth, id);
        self.last_at_depth.retain(|d, _| *d <= depth);

        Some(DomainReloadStep {
            id,
            line,
            parent,
            name: caps[2].to_string(),
            ms,
            depth,
        })
    }
}
