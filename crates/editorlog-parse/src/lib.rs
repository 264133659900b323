//! # Editor Log Parser
//!
//! Single-pass parser for game-editor logs (`Editor.log`) with typed
//! performance records.
//!
//! ## Overview
//!
//! This crate turns the plain-text log an editor writes while it runs into
//! structured records that can be queried later. It handles:
//!
//! - **Session metadata**: editor version, platform and project from the header
//! - **Asset imports**: single-line, multi-line and worker-interleaved forms
//! - **Pipeline refreshes**: the refresh header and its summary block
//! - **Domain reload profiling**: indented timing trees rebuilt as a forest
//! - **Script compilation, telemetry and timed operations**
//! - **Line classification**: every line is kept with its kind and flags
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   parse()   ┌───────────┐  Record   ┌────────────┐
//! │  Editor.log  │ ──────────► │ LogParser │ ────────► │ EventSink  │
//! │   (lines)    │             │  (pass)   │           │ (memory,   │
//! └──────────────┘             └───────────┘           │  sqlite..) │
//!                                                      └────────────┘
//! ```
//!
//! [`LogParser`](parser::LogParser) is stateless between runs. Each run owns
//! a worker table ([`imports::WorkerTable`]), a stack of pending imports
//! ([`imports::PendingImports`]) and a reload tracker
//! ([`domain_reload::ReloadTracker`]). Records are handed to the sink as soon
//! as they are complete; classified lines follow in batches after the pass.
//!
//! ## Record IR
//!
//! The [`ir`] module defines the schema:
//!
//! - [`Record`](ir::Record) - Discriminated union of everything extracted
//!   - `AssetImport` - One asset import with its duration
//!   - `PipelineRefresh` - Refresh total and optional breakdown
//!   - `DomainReloadStep` - One node of a reload profiling tree
//!   - `ScriptCompilation` - `Processing assembly ...` line
//!   - `Telemetry` - `##utp:` JSON packet
//!   - `Operation` - Timed operation or build-system phase
//! - [`ClassifiedLine`](ir::ClassifiedLine) - Every line with its [`LineKind`](ir::LineKind)
//!
//! ## Schema Versioning
//!
//! The IR schema follows **semantic versioning** via [`SCHEMA_VERSION`].
//!
//! ## Examples
//!
//! ### Parsing into memory
//!
//! ```
//! use editorlog_parse::{LogParser, MemorySink};
//!
//! let log = [
//!     "Unity Editor version:    2022.3.10f1 (ff3792e53c62)",
//!     "Start importing Assets/logo.png using Guid(ab12) (TextureImporter) in 0.5 seconds",
//! ];
//! let mut sink = MemorySink::new();
//! let id = LogParser::new().parse("Editor.log", &log, &mut sink)?;
//!
//! let session = sink.session(id).unwrap();
//! assert_eq!(session.info.editor_version.as_deref(), Some("2022.3.10f1"));
//! assert_eq!(session.asset_imports().count(), 1);
//! # Ok::<(), editorlog_parse::ParseError>(())
//! ```
//!
//! ### Exporting to JSON
//!
//! ```no_run
//! use editorlog_parse::{LogParser, MemorySink};
//! use std::path::Path;
//!
//! let mut sink = MemorySink::new();
//! LogParser::new().parse_file(Path::new("Editor.log"), &mut sink)?;
//! let json = serde_json::to_string_pretty(&sink)?;
//! std::fs::write("session.json", json)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Asset categorization and import resolution.
pub mod assets;
/// Per-line classification.
pub mod classify;
pub mod config;
/// Domain reload profiling trees.
pub mod domain_reload;
pub mod error;
pub mod extractors;
/// Session metadata from the log header.
pub mod header;
pub mod imports;
/// Typed record Intermediate Representation (IR).
pub mod ir;
/// Single-pass parser implementation.
pub mod parser;
pub mod progress;
/// Asset pipeline refresh blocks.
pub mod refresh;
/// Destinations for parse output.
pub mod sink;
pub mod summary;

#[cfg(test)]
mod tests;

pub use config::ParserConfig;
pub use error::ParseError;
pub use ir::{
    AssetImport, ClassifiedLine, DomainReloadStep, LineKind, Operation, PipelineRefresh, Record,
    ScriptCompilation, SessionId, SessionInfo, Telemetry,
};
pub use parser::LogParser;
pub use progress::{LogProgress, NoProgress, Phase, ProgressObserver};
pub use sink::{EventSink, MemorySink, SinkError, StoredSession};
pub use summary::ParseSummary;

/// Schema version for the record IR.
///
/// - MAJOR: Breaking changes to record structure
/// - MINOR: New optional fields or record kinds
/// - PATCH: Bug fixes to parsing behavior
pub const SCHEMA_VERSION: &str = "1.0.0";
