use serde::{Deserialize, Serialize};

/// Identifier of one parse run, assigned by the [`EventSink`](crate::sink::EventSink).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub i64);

/// Session-level facts gathered before the event pass starts.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SessionInfo {
    pub source: String,
    pub editor_version: Option<String>,
    pub platform: Option<String>,
    pub architecture: Option<String>,
    pub project_name: Option<String>,
    pub total_lines: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineKind {
    Error,
    Warning,
    System,
    Import,
    Pipeline,
    DomainReload,
    Telemetry,
    Normal,
}

impl LineKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            LineKind::Error => "error",
            LineKind::Warning => "warning",
            LineKind::System => "system",
            LineKind::Import => "import",
            LineKind::Pipeline => "pipeline",
            LineKind::DomainReload => "domain_reload",
            LineKind::Telemetry => "telemetry",
            LineKind::Normal => "normal",
        }
    }
}

/// One input line as shown by the log viewer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedLine {
    pub line: u32,
    pub content: String,
    pub kind: LineKind,
    pub indent: u32,
    pub is_error: bool,
    pub is_warning: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetImport {
    /// Line of the `Start importing` evidence.
    pub line: u32,
    pub path: String,
    pub name: String,
    pub asset_type: String,
    pub category: String,
    pub guid: String,
    pub artifact_id: Option<String>,
    pub importer: Option<String>,
    pub seconds: f64,
    pub ms: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PipelineRefresh {
    pub line: u32,
    pub refresh_id: String,
    pub total_seconds: f64,
    pub initiated_by: String,
    pub imports_total: Option<u32>,
    pub imports_actual: Option<u32>,
    pub asset_db_process_ms: Option<u64>,
    pub asset_db_callback_ms: Option<u64>,
    pub domain_reloads: Option<u32>,
    pub domain_reload_ms: Option<u64>,
    pub compile_ms: Option<u64>,
    pub scripting_other_ms: Option<u64>,
}

/// A node of the domain reload profiling forest.
///
/// `id` is unique within a session; `parent` refers to the `id` of the
/// enclosing step one indentation level up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainReloadStep {
    pub id: u32,
    pub line: u32,
    pub parent: Option<u32>,
    pub name: String,
    pub ms: f64,
    pub depth: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptCompilation {
    pub line: u32,
    pub assembly_path: String,
    pub defines: u32,
    pub references: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Telemetry {
    pub line: u32,
    pub telemetry_type: String,
    /// Raw JSON text of the packet.
    pub payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    pub line: u32,
    pub operation_type: String,
    pub name: String,
    pub seconds: f64,
    pub ms: f64,
    pub memory_mb: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data")]
pub enum Record {
    AssetImport(AssetImport),
    PipelineRefresh(PipelineRefresh),
    DomainReloadStep(DomainReloadStep),
    ScriptCompilation(ScriptCompilation),
    Telemetry(Telemetry),
    Operation(Operation),
}

impl Record {
    pub fn line(&self) -> u32 {
        match self {
            Record::AssetImport(r) => r.line,
            Record::PipelineRefresh(r) => r.line,
            Record::DomainReloadStep(r) => r.line,
            Record::ScriptCompilation(r) => r.line,
            Record::Telemetry(r) => r.line,
            Record::Operation(r) => r.line,
        }
    }
}
