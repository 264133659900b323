use std::path::Path;
use std::time::Instant;

use crate::assets::ImportEvidence;
use crate::classify;
use crate::config::ParserConfig;
use crate::domain_reload::{self, ReloadTracker};
use crate::error::ParseError;
use crate::extractors;
use crate::header;
use crate::imports::{self, PendingImports, StartOutcome, WorkerTable};
use crate::ir::{ClassifiedLine, Record, SessionId, SessionInfo};
use crate::progress::{NoProgress, Phase, ProgressObserver};
use crate::sink::EventSink;

/// Single-pass parser for editor logs.
///
/// `LogParser` itself only holds configuration. Every call to
/// [`parse`](Self::parse) builds fresh run state (worker table, pending
/// imports, reload tracker), so one parser can serve many runs.
pub struct LogParser {
    config: ParserConfig,
    progress: Box<dyn ProgressObserver>,
}

impl Default for LogParser {
    fn default() -> Self {
        Self::new()
    }
}

impl LogParser {
    /// Creates a parser with the default configuration.
    pub fn new() -> Self {
        Self::with_config(ParserConfig::default())
    }

    pub fn with_config(config: ParserConfig) -> Self {
        Self {
            config,
            progress: Box::new(NoProgress),
        }
    }

    /// Replaces the progress observer.
    pub fn with_progress(mut self, progress: impl ProgressObserver + 'static) -> Self {
        self.progress = Box::new(progress);
        self
    }

    pub fn config(&self) -> &ParserConfig {
        &self.config
    }

    /// Parses a complete, ordered line sequence into `sink`.
    ///
    /// # Arguments
    ///
    /// * `source` - Identifier of the log, stored with the session.
    /// * `lines` - The whole log, one entry per line, without terminators.
    /// * `sink` - Destination for the session, its records and its lines.
    ///
    /// # Returns
    ///
    /// The id the sink assigned to the new session.
    pub fn parse<S: AsRef<str>>(
        &self,
        source: &str,
        lines: &[S],
        sink: &mut dyn EventSink,
    ) -> Result<SessionId, ParseError> {
        self.run(source, lines, || None, sink)
    }

    /// Reads `path` and parses it.
    ///
    /// Invalid UTF-8 is replaced rather than rejected. When the header names
    /// no project, the directory holding an editor log is checked for
    /// project markers.
    pub fn parse_file(
        &self,
        path: &Path,
        sink: &mut dyn EventSink,
    ) -> Result<SessionId, ParseError> {
        let bytes = std::fs::read(path).map_err(|source| ParseError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let content = String::from_utf8_lossy(&bytes);
        let lines: Vec<&str> = content.lines().collect();
        log::info!("Parsing log file {:?} ({} lines)", path, lines.len());

        self.run(
            &path.to_string_lossy(),
            &lines,
            || header::infer_project_name(path, |p| p.exists()),
            sink,
        )
    }

    fn run<S: AsRef<str>>(
        &self,
        source: &str,
        lines: &[S],
        project_fallback: impl FnOnce() -> Option<String>,
        sink: &mut dyn EventSink,
    ) -> Result<SessionId, ParseError> {
        let started = Instant::now();
        let total = lines.len();

        self.progress.on_phase(Phase::Header);
        let meta = header::scan(lines, self.config.header_scan_lines);
        let info = SessionInfo {
            source: source.to_string(),
            editor_version: meta.editor_version,
            platform: meta.platform,
            architecture: meta.architecture,
            project_name: meta.project_name.or_else(project_fallback),
            total_lines: total as u32,
        };
        let session = sink.begin_session(&info).map_err(ParseError::Sink)?;

        self.progress.on_phase(Phase::Events);
        let mut pass = Pass::new(&self.config, session);
        let mut classified = Vec::with_capacity(total);
        for (idx, raw) in lines.iter().enumerate() {
            let text = raw.as_ref();
            pass.dispatch(lines, idx, sink)?;

            let class = classify::classify(text);
            classified.push(ClassifiedLine {
                line: idx as u32 + 1,
                content: text.to_string(),
                kind: class.kind,
                indent: class.indent,
                is_error: class.is_error,
                is_warning: class.is_warning,
                timestamp: class.timestamp,
            });

            if self.config.progress_interval > 0 && (idx + 1) % self.config.progress_interval == 0 {
                self.progress.on_progress(Phase::Events, idx + 1, total);
            }
        }
        pass.finish();

        self.progress.on_phase(Phase::StoringLines);
        let batch = self.config.line_batch_size.max(1);
        let mut stored = 0;
        for chunk in classified.chunks(batch) {
            sink.record_lines(session, chunk).map_err(ParseError::Sink)?;
            stored += chunk.len();
            self.progress.on_progress(Phase::StoringLines, stored, total);
        }

        let parse_ms = started.elapsed().as_secs_f64() * 1000.0;
        sink.finish_session(session, parse_ms).map_err(ParseError::Sink)?;
        self.progress.on_phase(Phase::Done);
        log::info!(
            "Parsed {} lines from {} in {:.2}ms ({} records)",
            total,
            source,
            parse_ms,
            pass.emitted
        );
        Ok(session)
    }
}

/// Working memory of one run. Dropped when the run ends.
struct Pass<'a> {
    config: &'a ParserConfig,
    session: SessionId,
    workers: WorkerTable,
    pending: PendingImports,
    reload: ReloadTracker,
    emitted: usize,
}

impl<'a> Pass<'a> {
    fn new(config: &'a ParserConfig, session: SessionId) -> Self {
        Self {
            config,
            session,
            workers: WorkerTable::new(),
            pending: PendingImports::new(),
            reload: ReloadTracker::new(),
            emitted: 0,
        }
    }

    fn emit(&mut self, sink: &mut dyn EventSink, record: Record) -> Result<(), ParseError> {
        log::trace!("line {}: {:?}", record.line(), record);
        self.emitted += 1;
        sink.record(self.session, record).map_err(ParseError::Sink)
    }

    /// Routes one line to the first grammar that claims it.
    fn dispatch<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        idx: usize,
        sink: &mut dyn EventSink,
    ) -> Result<(), ParseError> {
        let text = lines[idx].as_ref();
        let number = idx as u32 + 1;

        if let Some((worker, body)) = imports::split_worker_prefix(text) {
            if let Some(import) = self.workers.feed(worker, body, number) {
                self.emit(sink, Record::AssetImport(import))?;
            }
            return Ok(());
        }

        if !self.pending.is_empty()
            && text.contains(imports::COMPLETION_MARKER)
            && !text.contains(imports::START_MARKER)
        {
            if let Some(completion) = imports::parse_completion(text) {
                if let Some(import) = self.pending.resolve_latest(completion) {
                    self.emit(sink, Record::AssetImport(import))?;
                }
                return Ok(());
            }
        }

        if text.contains(imports::START_MARKER) {
            match imports::parse_start(text, number) {
                StartOutcome::Resolved(import) => self.emit(sink, Record::AssetImport(import))?,
                StartOutcome::Pending(evidence) => self.park(evidence),
                StartOutcome::Ignored => {}
            }
            return Ok(());
        }

        if text.contains("Asset Pipeline Refresh") {
            let end = (idx + 1 + self.config.refresh_lookahead).min(lines.len());
            if let Some(refresh) = crate::refresh::parse(text, number, &lines[idx + 1..end]) {
                return self.emit(sink, Record::PipelineRefresh(refresh));
            }
        }

        if self.reload.is_active() {
            if let Some(step) = self.reload.feed(text, number) {
                return self.emit(sink, Record::DomainReloadStep(step));
            }
        }
        if text.contains(domain_reload::HEADER_MARKER) {
            self.reload.begin();
            return Ok(());
        }

        if let Some(record) = extractors::script_compilation(text, number) {
            return self.emit(sink, Record::ScriptCompilation(record));
        }
        if extractors::has_telemetry(text) {
            match extractors::telemetry(text, number) {
                Ok(Some(record)) => return self.emit(sink, Record::Telemetry(record)),
                Ok(None) => {}
                Err(e) => {
                    log::warn!("Failed to parse telemetry JSON at line {}: {}", number, e);
                    return Ok(());
                }
            }
        }
        if let Some(record) = extractors::operation(text, number) {
            return self.emit(sink, Record::Operation(record));
        }
        if let Some(record) = extractors::tundra(text, number) {
            return self.emit(sink, Record::Operation(record));
        }
        Ok(())
    }

    fn park(&mut self, evidence: ImportEvidence) {
        log::debug!(
            "Import of {:?} at line {} waits for a completion line",
            evidence.path,
            evidence.line
        );
        self.pending.insert(evidence);
    }

    fn finish(&self) {
        let open_workers = self.workers.open_count();
        if open_workers > 0 || !self.pending.is_empty() {
            log::debug!(
                "Discarding {} unfinished worker imports and {} pending imports",
                open_workers,
                self.pending.len()
            );
        }
    }
}
