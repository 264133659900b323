//! Session metadata found in the first lines of the log.

use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;

lazy_static! {
    static ref VERSION: Regex = Regex::new(r"Unity Editor version:\s+(\S+)").expect("version regex");
    static ref ARCHITECTURE: Regex = Regex::new(r"Architecture:\s+(\S+)").expect("architecture regex");
    static ref PROJECT_ARG: Regex = Regex::new(r"-projectpath\s+(\S+)").expect("projectpath regex");
    static ref PROJECT_CHANGED: Regex =
        Regex::new(r"Successfully changed project path to:\s+(\S+)").expect("project path regex");
}

const PLATFORM_BANNERS: &[(&str, &str)] = &[
    ("macOS version:", "macOS"),
    ("Windows version:", "Windows"),
    ("Linux version:", "Linux"),
];

/// Directories whose presence marks a project root.
const PROJECT_MARKERS: &[&str] = &["Assets", "ProjectSettings"];

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct HeaderMetadata {
    pub editor_version: Option<String>,
    pub platform: Option<String>,
    pub architecture: Option<String>,
    pub project_name: Option<String>,
}

impl HeaderMetadata {
    /// Feeds one line; each field keeps its first match.
    fn observe(&mut self, line: &str) {
        if self.editor_version.is_none() {
            self.editor_version = VERSION.captures(line).map(|c| c[1].to_string());
        }
        if self.platform.is_none() {
            self.platform = PLATFORM_BANNERS
                .iter()
                .find(|(banner, _)| line.contains(banner))
                .map(|(_, name)| name.to_string());
        }
        if self.architecture.is_none() {
            self.architecture = ARCHITECTURE.captures(line).map(|c| c[1].to_string());
        }
        if self.project_name.is_none() {
            self.project_name = PROJECT_ARG
                .captures(line)
                .or_else(|| PROJECT_CHANGED.captures(line))
                .and_then(|c| last_component(&c[1]));
        }
    }

    fn is_complete(&self) -> bool {
        self.editor_version.is_some()
            && self.platform.is_some()
            && self.architecture.is_some()
            && self.project_name.is_some()
    }
}

/// Scans at most `limit` leading lines for session metadata.
pub fn scan<S: AsRef<str>>(lines: &[S], limit: usize) -> HeaderMetadata {
    let mut meta = HeaderMetadata::default();
    for line in lines.iter().take(limit) {
        meta.observe(line.as_ref());
        if meta.is_complete() {
            break;
        }
    }
    meta
}

/// Guesses the project from where an editor log sits on disk.
///
/// Only applies to editor log file names; the parent directory counts as a
/// project when `exists` reports one of the marker directories inside it.
pub fn infer_project_name(log_path: &Path, exists: impl Fn(&Path) -> bool) -> Option<String> {
    let file_name = log_path.file_name()?.to_string_lossy();
    if !file_name.contains("Editor.log") && !file_name.contains("Editor_") {
        return None;
    }
    let parent = log_path.parent()?;
    if PROJECT_MARKERS.iter().any(|marker| exists(&parent.join(marker))) {
        parent.file_name().map(|name| name.to_string_lossy().into_owned())
    } else {
        None
    }
}

fn last_component(path: &str) -> Option<String> {
    path.trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .filter(|name| !name.is_empty())
        .map(str::to_string)
}
