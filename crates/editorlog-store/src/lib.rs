//! # Editor Log Store
//!
//! SQLite persistence for parsed editor log sessions.
//!
//! [`SqliteStore`] implements [`EventSink`], so it can be handed straight to
//! [`LogParser::parse`](editorlog_parse::LogParser::parse). Each parse run
//! becomes one row in `sessions`; every record table references it through
//! `session_id`.
//!
//! ```no_run
//! use editorlog_parse::LogParser;
//! use editorlog_store::SqliteStore;
//! use std::path::Path;
//!
//! let mut store = SqliteStore::open(Path::new("editor_log.db"))?;
//! let session = LogParser::new().parse_file(Path::new("Editor.log"), &mut store)?;
//! println!("{}", store.summary(session)?);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::path::Path;

use editorlog_parse::ir::{ClassifiedLine, Record, SessionId, SessionInfo};
use editorlog_parse::sink::{EventSink, SinkError};
use rusqlite::{params, Connection};

mod error;
/// Read access to stored sessions.
pub mod query;

pub use error::StoreError;

const SCHEMA: &str = include_str!("schema.sql");

pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Opens (or creates) a database file and makes sure every table exists.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|source| StoreError::Open {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Opened database {:?}", path);
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::with_connection(Connection::open_in_memory()?)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    fn insert_session(&self, info: &SessionInfo) -> Result<SessionId, StoreError> {
        self.conn.execute(
            "INSERT INTO sessions
             (log_file, editor_version, platform, architecture, project_name, total_lines)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                info.source,
                info.editor_version,
                info.platform,
                info.architecture,
                info.project_name,
                info.total_lines,
            ],
        )?;
        Ok(SessionId(self.conn.last_insert_rowid()))
    }

    fn insert_record(&self, session: SessionId, record: &Record) -> Result<(), StoreError> {
        let sid = session.0;
        match record {
            Record::AssetImport(r) => self.conn.execute(
                "INSERT INTO asset_imports
                 (session_id, line_number, asset_path, asset_name, asset_type, asset_category,
                  guid, artifact_id, importer_type, import_time_seconds, import_time_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                params![
                    sid,
                    r.line,
                    r.path,
                    r.name,
                    r.asset_type,
                    r.category,
                    r.guid,
                    r.artifact_id,
                    r.importer,
                    r.seconds,
                    r.ms,
                ],
            )?,
            Record::PipelineRefresh(r) => self.conn.execute(
                "INSERT INTO pipeline_refreshes
                 (session_id, line_number, refresh_id, total_time_seconds, initiated_by,
                  imports_total, imports_actual, asset_db_process_time_ms,
                  asset_db_callback_time_ms, domain_reloads, domain_reload_time_ms,
                  compile_time_ms, scripting_other_ms)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
                params![
                    sid,
                    r.line,
                    r.refresh_id,
                    r.total_seconds,
                    r.initiated_by,
                    r.imports_total,
                    r.imports_actual,
                    r.asset_db_process_ms,
                    r.asset_db_callback_ms,
                    r.domain_reloads,
                    r.domain_reload_ms,
                    r.compile_ms,
                    r.scripting_other_ms,
                ],
            )?,
            Record::DomainReloadStep(r) => self.conn.execute(
                "INSERT INTO domain_reload_steps
                 (session_id, step_id, parent_step_id, line_number, step_name, time_ms, indent_level)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![sid, r.id, r.parent, r.line, r.name, r.ms, r.depth],
            )?,
            Record::ScriptCompilation(r) => self.conn.execute(
                "INSERT INTO script_compilation
                 (session_id, line_number, assembly_path, defines_count, references_count)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![sid, r.line, r.assembly_path, r.defines, r.references],
            )?,
            Record::Telemetry(r) => self.conn.execute(
                "INSERT INTO telemetry_data (session_id, line_number, telemetry_type, json_data)
                 VALUES (?1, ?2, ?3, ?4)",
                params![sid, r.line, r.telemetry_type, r.payload],
            )?,
            Record::Operation(r) => self.conn.execute(
                "INSERT INTO operations
                 (session_id, line_number, operation_type, operation_name,
                  duration_seconds, duration_ms, memory_mb)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                params![sid, r.line, r.operation_type, r.name, r.seconds, r.ms, r.memory_mb],
            )?,
        };
        Ok(())
    }

    /// Inserts one batch of lines inside a single transaction.
    fn insert_lines(&mut self, session: SessionId, lines: &[ClassifiedLine]) -> Result<(), StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare_cached(
                "INSERT INTO log_lines
                 (session_id, line_number, content, line_type, indent_level,
                  is_error, is_warning, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            )?;
            for line in lines {
                stmt.execute(params![
                    session.0,
                    line.line,
                    line.content,
                    line.kind.as_str(),
                    line.indent,
                    line.is_error,
                    line.is_warning,
                    line.timestamp,
                ])?;
            }
        }
        tx.commit()?;
        Ok(())
    }

    fn update_parse_time(&self, session: SessionId, parse_ms: f64) -> Result<(), StoreError> {
        let updated = self.conn.execute(
            "UPDATE sessions SET total_parse_time_ms = ?1 WHERE id = ?2",
            params![parse_ms, session.0],
        )?;
        if updated == 0 {
            return Err(StoreError::UnknownSession(session.0));
        }
        Ok(())
    }
}

impl EventSink for SqliteStore {
    fn begin_session(&mut self, info: &SessionInfo) -> Result<SessionId, SinkError> {
        let id = self.insert_session(info)?;
        log::debug!("Created session {} for {}", id.0, info.source);
        Ok(id)
    }

    fn record(&mut self, session: SessionId, record: Record) -> Result<(), SinkError> {
        Ok(self.insert_record(session, &record)?)
    }

    fn record_lines(&mut self, session: SessionId, lines: &[ClassifiedLine]) -> Result<(), SinkError> {
        Ok(self.insert_lines(session, lines)?)
    }

    fn finish_session(&mut self, session: SessionId, parse_ms: f64) -> Result<(), SinkError> {
        Ok(self.update_parse_time(session, parse_ms)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn count(store: &SqliteStore, table: &str) -> i64 {
        store
            .connection()
            .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_schema_created() {
        let store = SqliteStore::open_in_memory().unwrap();
        let tables: i64 = store
            .connection()
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 8);

        // Re-running the schema must be harmless.
        store.connection().execute_batch(SCHEMA).unwrap();
    }

    #[test]
    fn test_session_lifecycle() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let info = SessionInfo {
            source: "Editor.log".to_string(),
            platform: Some("Linux".to_string()),
            total_lines: 3,
            ..SessionInfo::default()
        };
        let id = store.begin_session(&info).unwrap();
        assert_eq!(id, SessionId(1));
        store.finish_session(id, 12.5).unwrap();

        let parse_ms: f64 = store
            .connection()
            .query_row("SELECT total_parse_time_ms FROM sessions WHERE id = 1", [], |row| row.get(0))
            .unwrap();
        assert_eq!(parse_ms, 12.5);
        assert!(store.finish_session(SessionId(42), 1.0).is_err());
    }

    #[test]
    fn test_lines_written_in_batches() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        let id = store.begin_session(&SessionInfo::default()).unwrap();
        let lines: Vec<_> = (1..=5)
            .map(|n| ClassifiedLine {
                line: n,
                content: format!("line {n}"),
                kind: editorlog_parse::LineKind::Normal,
                indent: 0,
                is_error: false,
                is_warning: false,
                timestamp: None,
            })
            .collect();
        store.record_lines(id, &lines[..3]).unwrap();
        store.record_lines(id, &lines[3..]).unwrap();
        assert_eq!(count(&store, "log_lines"), 5);

        let kind: String = store
            .connection()
            .query_row("SELECT line_type FROM log_lines WHERE line_number = 4", [], |row| row.get(0))
            .unwrap();
        assert_eq!(kind, "normal");
    }
}
