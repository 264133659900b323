//! Reconciliation of asset import evidence spread over several lines.
//!
//! Import workers of the editor interleave their output, each line tagged
//! with `[WorkerN]`. [`WorkerTable`] keeps one state machine per worker id.
//! Untagged imports whose timing arrives later are parked in
//! [`PendingImports`].

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;

use crate::assets::{self, ImportEvidence, MULTI_LINE_IMPORTERS, PLACEHOLDER_SECONDS};
use crate::ir::AssetImport;

pub const START_MARKER: &str = "Start importing";
pub const COMPLETION_MARKER: &str = "-> (artifact id:";

lazy_static! {
    static ref WORKER_PREFIX: Regex = Regex::new(r"^\[Worker(\d+)\]\s+(.+)").expect("worker regex");
    static ref SINGLE_LINE: Regex = Regex::new(
        r"Start importing (.+?) using Guid\(([a-f0-9]+)\) (.+?)(?: -> \(artifact id: '([a-f0-9]+)'\))? in ([\d.]+) seconds"
    )
    .expect("single-line import regex");
    static ref BARE_START: Regex =
        Regex::new(r"Start importing (.+?) using Guid\(([a-f0-9]+)\)\s*$").expect("start regex");
    static ref START_WITH_IMPORTER: Regex =
        Regex::new(r"Start importing (.+?) using Guid\(([a-f0-9]+)\) \((\w+)\)").expect("importer start regex");
    static ref IMPORTER_LINE: Regex = Regex::new(r"^\(([A-Za-z0-9\-]+)\)\s*$").expect("importer regex");
    static ref COMPLETION: Regex =
        Regex::new(r"-> \(artifact id: '([a-f0-9]+)'\) in ([\d.]+) seconds").expect("completion regex");
}

/// The `-> (artifact id: ...) in N seconds` tail of an import.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub artifact_id: String,
    pub seconds: f64,
}

pub fn parse_completion(text: &str) -> Option<Completion> {
    let caps = COMPLETION.captures(text)?;
    Some(Completion {
        artifact_id: caps[1].to_string(),
        seconds: caps[2].parse().ok()?,
    })
}

/// Splits `[WorkerN] rest` into the worker id and the rest of the line.
///
/// The id is kept as written; any digit run is a valid worker id.
pub fn split_worker_prefix(line: &str) -> Option<(&str, &str)> {
    let caps = WORKER_PREFIX.captures(line)?;
    let worker = caps.get(1)?.as_str();
    let body = caps.get(2)?.as_str();
    Some((worker, body))
}

/// Resolves a line that carries both the start and the timing of an import.
fn parse_single_line(text: &str, line: u32) -> Option<Option<AssetImport>> {
    let caps = SINGLE_LINE.captures(text)?;
    let seconds: f64 = caps[5].parse().ok()?;
    let evidence = ImportEvidence {
        path: caps[1].to_string(),
        guid: caps[2].to_string(),
        line,
        importer: assets::normalize_importer(&caps[3]),
    };
    let artifact_id = caps.get(4).map(|m| m.as_str().to_string());
    Some(assets::resolve(evidence, artifact_id, seconds))
}

/// Outcome of an untagged `Start importing` line.
#[derive(Debug, Clone, PartialEq)]
pub enum StartOutcome {
    /// The line was complete, or never gets timing and was given a placeholder.
    Resolved(AssetImport),
    /// Timing follows on a later line.
    Pending(ImportEvidence),
    /// Skip rules rejected it, or nothing recognizable was found.
    Ignored,
}

/// Handles an untagged `Start importing` line.
pub fn parse_start(text: &str, line: u32) -> StartOutcome {
    if let Some(resolved) = parse_single_line(text, line) {
        return resolved.map_or(StartOutcome::Ignored, StartOutcome::Resolved);
    }

    if let Some(caps) = BARE_START.captures(text) {
        let path = caps[1].to_string();
        let importer = Some(assets::infer_importer(&path));
        let evidence = ImportEvidence {
            path,
            guid: caps[2].to_string(),
            line,
            importer,
        };
        return assets::resolve(evidence, None, PLACEHOLDER_SECONDS)
            .map_or(StartOutcome::Ignored, StartOutcome::Resolved);
    }

    if let Some(caps) = START_WITH_IMPORTER.captures(text) {
        let importer = &caps[3];
        let evidence = ImportEvidence {
            path: caps[1].to_string(),
            guid: caps[2].to_string(),
            line,
            importer: Some(importer.to_string()),
        };
        if MULTI_LINE_IMPORTERS.contains(&importer) {
            return StartOutcome::Pending(evidence);
        }
        return assets::resolve(evidence, None, PLACEHOLDER_SECONDS)
            .map_or(StartOutcome::Ignored, StartOutcome::Resolved);
    }

    StartOutcome::Ignored
}

/// Per-worker state machine.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum WorkerState {
    #[default]
    Idle,
    Started(ImportEvidence),
}

/// Import state of every `[WorkerN]` seen so far in a run.
#[derive(Debug, Default)]
pub struct WorkerTable {
    workers: HashMap<String, WorkerState>,
}

impl WorkerTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self, worker: &str) -> Option<&WorkerState> {
        self.workers.get(worker)
    }

    /// Workers still waiting for a completion line.
    pub fn open_count(&self) -> usize {
        self.workers
            .values()
            .filter(|state| matches!(state, WorkerState::Started(_)))
            .count()
    }

    /// Feeds the body of a line tagged with `worker`.
    ///
    /// Returns the import completed by this line, if any.
    pub fn feed(&mut self, worker: &str, body: &str, line: u32) -> Option<AssetImport> {
        if body.contains(START_MARKER) {
            if let Some(caps) = BARE_START.captures(body) {
                let evidence = ImportEvidence {
                    path: caps[1].to_string(),
                    guid: caps[2].to_string(),
                    line,
                    importer: None,
                };
                self.workers.insert(worker.to_string(), WorkerState::Started(evidence));
                return None;
            }
            if let Some(resolved) = parse_single_line(body, line) {
                return resolved;
            }
            if let Some(caps) = START_WITH_IMPORTER.captures(body) {
                let evidence = ImportEvidence {
                    path: caps[1].to_string(),
                    guid: caps[2].to_string(),
                    line,
                    importer: assets::normalize_importer(&caps[3]),
                };
                self.workers.insert(worker.to_string(), WorkerState::Started(evidence));
                return None;
            }
        }

        let state = self.workers.entry(worker.to_string()).or_default();

        if let WorkerState::Started(evidence) = &mut *state {
            if evidence.importer.is_none() {
                if let Some(caps) = IMPORTER_LINE.captures(body) {
                    let token = &caps[1];
                    if token != "-1" && token.ends_with("Importer") {
                        evidence.importer = Some(token.to_string());
                    }
                    return None;
                }
            }
        }

        if !body.contains(COMPLETION_MARKER) {
            return None;
        }
        let completion = parse_completion(body)?;
        match std::mem::take(state) {
            WorkerState::Started(mut evidence) => {
                if evidence.importer.is_none() {
                    evidence.importer = Some(assets::infer_importer(&evidence.path));
                }
                assets::resolve(evidence, Some(completion.artifact_id), completion.seconds)
            }
            WorkerState::Idle => {
                log::debug!("Worker{} completed an import it never started (line {})", worker, line);
                None
            }
        }
    }
}

/// Untagged imports waiting for their completion line, in insertion order.
#[derive(Debug, Default)]
pub struct PendingImports {
    entries: Vec<ImportEvidence>,
}

impl PendingImports {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Parks an import. A GUID seen again keeps its original position.
    pub fn insert(&mut self, evidence: ImportEvidence) {
        match self.entries.iter_mut().find(|e| e.guid == evidence.guid) {
            Some(slot) => *slot = evidence,
            None => self.entries.push(evidence),
        }
    }

    /// Attributes a completion line to the most recently parked import.
    ///
    /// Last-in-first-out: when several pending imports finish out of order,
    /// the timing can land on the wrong asset. The log carries nothing that
    /// would allow a better match.
    pub fn resolve_latest(&mut self, completion: Completion) -> Option<AssetImport> {
        let evidence = self.entries.pop()?;
        assets::resolve(evidence, Some(completion.artifact_id), completion.seconds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_worker_prefix() {
        assert_eq!(
            split_worker_prefix("[Worker12] (TextureImporter)"),
            Some(("12", "(TextureImporter)"))
        );
        assert_eq!(split_worker_prefix("[Licensing::Client] hello"), None);
        assert_eq!(split_worker_prefix("x [Worker1] late prefix"), None);
        assert_eq!(
            split_worker_prefix("[Worker99999999999999999999] -> done"),
            Some(("99999999999999999999", "-> done"))
        );
    }

    #[test]
    fn test_parse_completion() {
        let done = parse_completion("-> (artifact id: 'ab12') in 0.25 seconds").unwrap();
        assert_eq!(done.artifact_id, "ab12");
        assert_eq!(done.seconds, 0.25);
        assert!(parse_completion("-> (artifact id: 'ab12')").is_none());
    }

    #[test]
    fn test_single_line_with_invalid_importer() {
        let line = "Start importing Assets/M.mat using Guid(ab) Importer(-1,00000000000000000000000000000000)  -> (artifact id: 'cd') in 0.5 seconds";
        match parse_start(line, 3) {
            StartOutcome::Resolved(import) => {
                assert_eq!(import.importer, None);
                assert_eq!(import.artifact_id.as_deref(), Some("cd"));
                assert_eq!(import.category, "Materials");
                assert_eq!(import.ms, 500.0);
            }
            other => panic!("expected resolved import, got {:?}", other),
        }
    }

    #[test]
    fn test_single_line_without_artifact() {
        let line = "Start importing Assets/logo.png using Guid(ab) (TextureImporter) in 2 seconds";
        match parse_start(line, 1) {
            StartOutcome::Resolved(import) => {
                assert_eq!(import.importer.as_deref(), Some("TextureImporter"));
                assert_eq!(import.artifact_id, None);
                assert_eq!(import.ms, 2000.0);
            }
            other => panic!("expected resolved import, got {:?}", other),
        }
    }

    #[test]
    fn test_multi_line_importer_is_deferred() {
        let line = "Start importing Assets/intro.mp4 using Guid(ab) (VideoClipImporter)";
        assert!(matches!(parse_start(line, 9), StartOutcome::Pending(e) if e.line == 9));
    }

    #[test]
    fn test_placeholders() {
        let with_importer = "Start importing Assets/Data.json using Guid(ab) (TextScriptImporter)";
        match parse_start(with_importer, 2) {
            StartOutcome::Resolved(import) => {
                assert!((import.ms - 1.0).abs() < 1e-9);
                assert_eq!(import.importer.as_deref(), Some("TextScriptImporter"));
            }
            other => panic!("expected placeholder, got {:?}", other),
        }

        match parse_start("Start importing Assets/Hero.fbx using Guid(ab)", 4) {
            StartOutcome::Resolved(import) => {
                assert_eq!(import.importer.as_deref(), Some("FBXImporter"));
                assert_eq!(import.seconds, PLACEHOLDER_SECONDS);
            }
            other => panic!("expected placeholder, got {:?}", other),
        }

        let folder = "Start importing Assets/Art using Guid(ab) (DefaultImporter)";
        assert_eq!(parse_start(folder, 5), StartOutcome::Ignored);
    }

    #[test]
    fn test_pending_reinsert_keeps_position() {
        let mut pending = PendingImports::new();
        let evidence = |guid: &str, line| ImportEvidence {
            path: format!("Assets/{guid}.mp4"),
            guid: guid.to_string(),
            line,
            importer: Some("VideoClipImporter".to_string()),
        };
        pending.insert(evidence("aa", 1));
        pending.insert(evidence("bb", 2));
        pending.insert(evidence("aa", 3));
        assert_eq!(pending.len(), 2);

        let done = Completion { artifact_id: "ff".into(), seconds: 1.0 };
        assert_eq!(pending.resolve_latest(done.clone()).unwrap().guid, "bb");
        let first = pending.resolve_latest(done.clone()).unwrap();
        assert_eq!((first.guid.as_str(), first.line), ("aa", 3));
        assert!(pending.resolve_latest(done).is_none());
    }
}
