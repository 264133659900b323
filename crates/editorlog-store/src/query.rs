use editorlog_parse::ir::{AssetImport, SessionId, SessionInfo};
use editorlog_parse::summary::{CategoryTotal, ParseSummary};
use rusqlite::{params, OptionalExtension};

use crate::{SqliteStore, StoreError};

impl SqliteStore {
    /// Recomputes the run summary from the stored rows of one session.
    pub fn summary(&self, session: SessionId) -> Result<ParseSummary, StoreError> {
        let sid = session.0;
        let mut summary = ParseSummary::default();

        let (imports, total, avg, max): (usize, Option<f64>, Option<f64>, Option<f64>) =
            self.conn.query_row(
                "SELECT COUNT(*), SUM(import_time_ms), AVG(import_time_ms), MAX(import_time_ms)
                 FROM asset_imports WHERE session_id = ?1",
                params![sid],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )?;
        summary.imports = imports;
        summary.import_total_ms = total.unwrap_or_default();
        summary.import_avg_ms = avg.unwrap_or_default();
        summary.import_max_ms = max.unwrap_or_default();

        let mut stmt = self.conn.prepare(
            "SELECT asset_category, COUNT(*), SUM(import_time_ms)
             FROM asset_imports WHERE session_id = ?1
             GROUP BY asset_category",
        )?;
        let rows = stmt.query_map(params![sid], |row| {
            Ok(CategoryTotal {
                category: row.get(0)?,
                count: row.get(1)?,
                total_ms: row.get(2)?,
            })
        })?;
        for row in rows {
            summary.by_category.push(row?);
        }
        summary.sort_categories();

        let (refreshes, seconds): (usize, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(total_time_seconds) FROM pipeline_refreshes WHERE session_id = ?1",
            params![sid],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        summary.refreshes = refreshes;
        summary.refresh_total_seconds = seconds.unwrap_or_default();

        let (steps, reload_ms): (usize, Option<f64>) = self.conn.query_row(
            "SELECT COUNT(*), SUM(time_ms) FROM domain_reload_steps WHERE session_id = ?1",
            params![sid],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        summary.reload_steps = steps;
        summary.reload_total_ms = reload_ms.unwrap_or_default();

        summary.assemblies = self.count_rows("script_compilation", session)?;
        summary.telemetry = self.count_rows("telemetry_data", session)?;
        Ok(summary)
    }

    fn count_rows(&self, table: &str, session: SessionId) -> Result<usize, StoreError> {
        let count = self.conn.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE session_id = ?1"),
            params![session.0],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    /// Loads the metadata stored for a session.
    pub fn session_info(&self, session: SessionId) -> Result<SessionInfo, StoreError> {
        self.conn
            .query_row(
                "SELECT log_file, editor_version, platform, architecture, project_name, total_lines
                 FROM sessions WHERE id = ?1",
                params![session.0],
                |row| {
                    Ok(SessionInfo {
                        source: row.get(0)?,
                        editor_version: row.get(1)?,
                        platform: row.get(2)?,
                        architecture: row.get(3)?,
                        project_name: row.get(4)?,
                        total_lines: row.get::<_, Option<u32>>(5)?.unwrap_or_default(),
                    })
                },
            )
            .optional()?
            .ok_or(StoreError::UnknownSession(session.0))
    }

    /// All session ids, oldest first.
    pub fn sessions(&self) -> Result<Vec<SessionId>, StoreError> {
        let mut stmt = self.conn.prepare("SELECT id FROM sessions ORDER BY id")?;
        let ids = stmt
            .query_map([], |row| row.get(0).map(SessionId))?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    /// The `limit` slowest imports of a session.
    pub fn slowest_imports(&self, session: SessionId, limit: usize) -> Result<Vec<AssetImport>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT line_number, asset_path, asset_name, asset_type, asset_category, guid,
                    artifact_id, importer_type, import_time_seconds, import_time_ms
             FROM asset_imports WHERE session_id = ?1
             ORDER BY import_time_ms DESC, line_number
             LIMIT ?2",
        )?;
        let imports = stmt
            .query_map(params![session.0, limit], |row| {
                Ok(AssetImport {
                    line: row.get(0)?,
                    path: row.get(1)?,
                    name: row.get(2)?,
                    asset_type: row.get(3)?,
                    category: row.get(4)?,
                    guid: row.get(5)?,
                    artifact_id: row.get(6)?,
                    importer: row.get(7)?,
                    seconds: row.get(8)?,
                    ms: row.get(9)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(imports)
    }

    /// Number of stored lines flagged as errors.
    pub fn error_line_count(&self, session: SessionId) -> Result<usize, StoreError> {
        let count = self.conn.query_row(
            "SELECT COUNT(*) FROM log_lines WHERE session_id = ?1 AND is_error = 1",
            params![session.0],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}
