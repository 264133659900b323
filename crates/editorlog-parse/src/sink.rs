use serde::Serialize;

use crate::ir::{
    AssetImport, ClassifiedLine, DomainReloadStep, PipelineRefresh, Record, SessionId, SessionInfo,
};

/// Error type returned by sink implementations.
pub type SinkError = Box<dyn std::error::Error + Send + Sync>;

/// Append-only destination for everything a parse run produces.
///
/// Records arrive while the pass is running, so a run that dies half-way
/// leaves the session and a prefix of its records behind.
pub trait EventSink {
    fn begin_session(&mut self, info: &SessionInfo) -> Result<SessionId, SinkError>;

    fn record(&mut self, session: SessionId, record: Record) -> Result<(), SinkError>;

    fn record_lines(&mut self, session: SessionId, lines: &[ClassifiedLine]) -> Result<(), SinkError>;

    /// Called once after the pass with the wall-clock parse duration.
    fn finish_session(&mut self, session: SessionId, parse_ms: f64) -> Result<(), SinkError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredSession {
    pub id: SessionId,
    pub info: SessionInfo,
    pub parse_ms: Option<f64>,
    pub records: Vec<Record>,
    pub lines: Vec<ClassifiedLine>,
}

impl StoredSession {
    pub fn asset_imports(&self) -> impl Iterator<Item = &AssetImport> {
        self.records.iter().filter_map(|r| match r {
            Record::AssetImport(import) => Some(import),
            _ => None,
        })
    }

    pub fn pipeline_refreshes(&self) -> impl Iterator<Item = &PipelineRefresh> {
        self.records.iter().filter_map(|r| match r {
            Record::PipelineRefresh(refresh) => Some(refresh),
            _ => None,
        })
    }

    pub fn domain_reload_steps(&self) -> impl Iterator<Item = &DomainReloadStep> {
        self.records.iter().filter_map(|r| match r {
            Record::DomainReloadStep(step) => Some(step),
            _ => None,
        })
    }
}

/// Keeps every session in memory. Serializes to JSON for the CLI.
#[derive(Debug, Default, Serialize)]
pub struct MemorySink {
    pub sessions: Vec<StoredSession>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn session(&self, id: SessionId) -> Option<&StoredSession> {
        self.sessions.iter().find(|s| s.id == id)
    }

    fn session_mut(&mut self, id: SessionId) -> Result<&mut StoredSession, SinkError> {
        self.sessions
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| format!("unknown session {}", id.0).into())
    }
}

impl EventSink for MemorySink {
    fn begin_session(&mut self, info: &SessionInfo) -> Result<SessionId, SinkError> {
        let id = SessionId(self.sessions.len() as i64 + 1);
        self.sessions.push(StoredSession {
            id,
            info: info.clone(),
            parse_ms: None,
            records: Vec::new(),
            lines: Vec::new(),
        });
        Ok(id)
    }

    fn record(&mut self, session: SessionId, record: Record) -> Result<(), SinkError> {
        self.session_mut(session)?.records.push(record);
        Ok(())
    }

    fn record_lines(&mut self, session: SessionId, lines: &[ClassifiedLine]) -> Result<(), SinkError> {
        self.session_mut(session)?.lines.extend_from_slice(lines);
        Ok(())
    }

    fn finish_session(&mut self, session: SessionId, parse_ms: f64) -> Result<(), SinkError> {
        self.session_mut(session)?.parse_ms = Some(parse_ms);
        Ok(())
    }
}
