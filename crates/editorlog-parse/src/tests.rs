use std::cell::RefCell;
use std::rc::Rc;

use crate::LogParser;
use crate::config::ParserConfig;
use crate::ir::{ClassifiedLine, LineKind, Record, SessionId, SessionInfo};
use crate::progress::{Phase, ProgressObserver};
use crate::sink::{EventSink, MemorySink, SinkError, StoredSession};

fn parse_lines(lines: &[&str]) -> StoredSession {
    let mut sink = MemorySink::new();
    let id = LogParser::new().parse("Editor.log", lines, &mut sink).unwrap();
    sink.session(id).unwrap().clone()
}

#[test]
fn test_parse_empty_log() {
    let session = parse_lines(&[]);
    assert!(session.records.is_empty());
    assert!(session.lines.is_empty());
    assert_eq!(session.info.total_lines, 0);
    assert!(session.parse_ms.is_some());
}

#[test]
fn test_worker_texture_import() {
    let session = parse_lines(&[
        "[Worker3] Start importing Assets/Textures/hero.png using Guid(abc123)",
        "[Worker3] (TextureImporter)",
        "[Worker3] -> (artifact id: 'def456') in 0.500 seconds",
    ]);
    let imports: Vec<_> = session.asset_imports().collect();
    assert_eq!(imports.len(), 1);
    let import = imports[0];
    assert_eq!(import.path, "Assets/Textures/hero.png");
    assert_eq!(import.guid, "abc123");
    assert_eq!(import.artifact_id.as_deref(), Some("def456"));
    assert_eq!(import.importer.as_deref(), Some("TextureImporter"));
    assert_eq!(import.ms, 500.0);
    assert_eq!(import.category, "Textures");
    assert_eq!(import.line, 1);
}

#[test]
fn test_package_folder_never_imported() {
    let session = parse_lines(&[
        "Start importing Packages/com.unity.foo using Guid(aaa) (DefaultImporter) in 0.001 seconds",
        "Start importing Packages/com.unity.foo using Guid(aaa)",
        "[Worker0] Start importing Packages/com.unity.foo using Guid(aaa)",
        "[Worker0] -> (artifact id: 'bbb') in 2.0 seconds",
    ]);
    assert_eq!(session.asset_imports().count(), 0);
}

#[test]
fn test_extension_case_insensitive() {
    let session = parse_lines(&[
        "Start importing Assets/a.PNG using Guid(a1) (TextureImporter) in 0.1 seconds",
        "Start importing Assets/b.png using Guid(b1) (NativeFormatImporter) in 0.1 seconds",
        "Start importing Assets/c.Png using Guid(c1) (NativeFormatImporter) in 0.1 seconds",
    ]);
    let categories: Vec<_> = session.asset_imports().map(|i| i.category.as_str()).collect();
    assert_eq!(categories, vec!["Textures", "Textures", "Textures"]);
}

#[test]
fn test_domain_reload_forest() {
    let session = parse_lines(&[
        "Domain Reload Profiling: 1002ms",
        "Root (10ms)",
        "\tA (4ms)",
        "\tB (5ms)",
        "\t\tB1 (2ms)",
        "Second (7ms)",
        "Refreshing native plugins compatible for Editor in 1.27 ms, found 3 plugins.",
    ]);
    let steps: Vec<_> = session.domain_reload_steps().collect();
    assert_eq!(steps.len(), 5);
    let shape: Vec<_> = steps.iter().map(|s| (s.id, s.parent, s.depth)).collect();
    assert_eq!(
        shape,
        vec![
            (1, None, 0),
            (2, Some(1), 1),
            (3, Some(1), 1),
            (4, Some(3), 2),
            (5, None, 0),
        ]
    );
    assert_eq!(steps[3].name, "B1");
    assert_eq!(steps[3].ms, 2.0);
}

#[test]
fn test_reload_ids_span_blocks() {
    let session = parse_lines(&[
        "Domain Reload Profiling: 10ms",
        "\tBeginReloadAssembly (3ms)",
        "Mono: successfully reloaded assembly",
        "Domain Reload Profiling: 12ms",
        "\tBeginReloadAssembly (4ms)",
    ]);
    let ids: Vec<_> = session.domain_reload_steps().map(|s| s.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[test]
fn test_refresh_without_summary() {
    let session = parse_lines(&[
        "Asset Pipeline Refresh (id=9a8b7c): Total: 0.015 seconds - Initiated by RefreshV2(NoUpdateAssetOptions)",
        "Refreshing native plugins compatible for Editor",
    ]);
    let refreshes: Vec<_> = session.pipeline_refreshes().collect();
    assert_eq!(refreshes.len(), 1);
    let refresh = refreshes[0];
    assert_eq!(refresh.refresh_id, "9a8b7c");
    assert_eq!(refresh.imports_total, None);
    assert_eq!(refresh.imports_actual, None);
    assert_eq!(refresh.asset_db_process_ms, None);
    assert_eq!(refresh.asset_db_callback_ms, None);
    assert_eq!(refresh.domain_reloads, None);
    assert_eq!(refresh.domain_reload_ms, None);
    assert_eq!(refresh.compile_ms, None);
    assert_eq!(refresh.scripting_other_ms, None);
}

#[test]
fn test_refresh_with_oversized_times() {
    let session = parse_lines(&[
        "Asset Pipeline Refresh (id=ab): Total: 1.000 seconds - Initiated by User",
        "\t\tAsset DB Process Time: managed=18446744073709551615 ms, native=1 ms",
    ]);
    let refresh = session.pipeline_refreshes().next().unwrap();
    assert_eq!(refresh.asset_db_process_ms, None);
}

#[test]
fn test_refresh_lookahead_is_bounded() {
    let mut lines = vec!["Asset Pipeline Refresh (id=1f): Total: 2.000 seconds - Initiated by User"];
    lines.extend(std::iter::repeat("filler").take(10));
    lines.push("\t\tImports: total=5 (actual=5, local cache=0, cache server=0)");

    let session = parse_lines(&lines);
    let refresh = session.pipeline_refreshes().next().unwrap();
    assert_eq!(refresh.imports_total, None);

    let config = ParserConfig {
        refresh_lookahead: 11,
        ..ParserConfig::default()
    };
    let mut sink = MemorySink::new();
    let id = LogParser::with_config(config).parse("Editor.log", &lines, &mut sink).unwrap();
    let refresh = sink.session(id).unwrap().pipeline_refreshes().next().unwrap().clone();
    assert_eq!(refresh.imports_total, Some(5));
}

#[test]
fn test_header_metadata_idempotent() {
    let lines = [
        "Unity Editor version:    2022.3.10f1 (ff3792e53c62)",
        "macOS version: Version 14.1 (Build 23B74)",
        "Architecture: arm64",
        "COMMAND LINE ARGUMENTS:",
        "-projectpath /Users/dev/Projects/Starfall",
    ];
    let first = parse_lines(&lines).info;
    let second = parse_lines(&lines).info;
    assert_eq!(first, second);
    assert_eq!(first.editor_version.as_deref(), Some("2022.3.10f1"));
    assert_eq!(first.platform.as_deref(), Some("macOS"));
    assert_eq!(first.architecture.as_deref(), Some("arm64"));
    assert_eq!(first.project_name.as_deref(), Some("Starfall"));
}

#[test]
fn test_pending_multi_line_import() {
    let session = parse_lines(&[
        "Start importing Assets/Video/intro.mp4 using Guid(aa11) (VideoClipImporter)",
        "Video clip transcoding started",
        "-> (artifact id: 'bb22') in 3.25 seconds",
    ]);
    let imports: Vec<_> = session.asset_imports().collect();
    assert_eq!(imports.len(), 1);
    assert_eq!(imports[0].line, 1);
    assert_eq!(imports[0].artifact_id.as_deref(), Some("bb22"));
    assert_eq!(imports[0].ms, 3250.0);
    assert_eq!(imports[0].importer.as_deref(), Some("VideoClipImporter"));
}

#[test]
fn test_other_extractors() {
    let session = parse_lines(&[
        "Processing assembly Library/ScriptAssemblies/Assembly-CSharp.dll, with 142 defines and 231 references",
        r#"##utp:{"type":"AssetImportStatus","version":2,"phase":"Immediate"}"#,
        "##utp:{broken json}",
        r#"Sprite Atlas Operation : " ## Generating Atlas Masks ## " took 1.5 sec (current mem: 2048 MB)"#,
        "*** Tundra build success (3.10 seconds), 5 items updated, 862 evaluated",
    ]);
    let kinds: Vec<_> = session
        .records
        .iter()
        .map(|r| match r {
            Record::ScriptCompilation(_) => "script",
            Record::Telemetry(_) => "telemetry",
            Record::Operation(_) => "operation",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, vec!["script", "telemetry", "operation", "operation"]);
    let lines: Vec<_> = session.records.iter().map(|r| r.line()).collect();
    assert_eq!(lines, vec![1, 2, 4, 5]);
}

#[test]
fn test_every_line_classified() {
    let session = parse_lines(&[
        "[Licensing::Module] Channel ready",
        "\t\tNullReferenceException: Object reference not set",
        "2024-01-15T10:30:45.123Z plain text",
    ]);
    assert_eq!(session.lines.len(), 3);
    assert_eq!(session.lines[0].kind, LineKind::System);
    assert_eq!(session.lines[1].indent, 2);
    assert!(session.lines[1].is_error);
    assert_eq!(session.lines[2].timestamp.as_deref(), Some("2024-01-15T10:30:45"));
    assert_eq!(
        session.lines.iter().map(|l| l.line).collect::<Vec<_>>(),
        vec![1, 2, 3]
    );
}

#[test]
fn test_line_batches() {
    #[derive(Default)]
    struct BatchCounter {
        inner: MemorySink,
        batches: Vec<usize>,
    }

    impl EventSink for BatchCounter {
        fn begin_session(&mut self, info: &SessionInfo) -> Result<SessionId, SinkError> {
            self.inner.begin_session(info)
        }
        fn record(&mut self, session: SessionId, record: Record) -> Result<(), SinkError> {
            self.inner.record(session, record)
        }
        fn record_lines(&mut self, session: SessionId, lines: &[ClassifiedLine]) -> Result<(), SinkError> {
            self.batches.push(lines.len());
            self.inner.record_lines(session, lines)
        }
        fn finish_session(&mut self, session: SessionId, parse_ms: f64) -> Result<(), SinkError> {
            self.inner.finish_session(session, parse_ms)
        }
    }

    let lines = vec!["line"; 7];
    let config = ParserConfig {
        line_batch_size: 3,
        ..ParserConfig::default()
    };
    let mut sink = BatchCounter::default();
    LogParser::with_config(config).parse("Editor.log", &lines, &mut sink).unwrap();
    assert_eq!(sink.batches, vec![3, 3, 1]);
}

#[test]
fn test_sink_failure_aborts_run() {
    struct FailingSink;

    impl EventSink for FailingSink {
        fn begin_session(&mut self, _info: &SessionInfo) -> Result<SessionId, SinkError> {
            Ok(SessionId(1))
        }
        fn record(&mut self, _session: SessionId, _record: Record) -> Result<(), SinkError> {
            Err("disk full".into())
        }
        fn record_lines(&mut self, _session: SessionId, _lines: &[ClassifiedLine]) -> Result<(), SinkError> {
            Ok(())
        }
        fn finish_session(&mut self, _session: SessionId, _parse_ms: f64) -> Result<(), SinkError> {
            Ok(())
        }
    }

    let lines = ["Start importing Assets/a.png using Guid(a1) (TextureImporter) in 0.1 seconds"];
    let err = LogParser::new().parse("Editor.log", &lines, &mut FailingSink).unwrap_err();
    assert!(matches!(err, crate::ParseError::Sink(_)));
    assert!(err.to_string().contains("disk full"));
}

#[test]
fn test_progress_notifications() {
    struct Recorder(Rc<RefCell<Vec<(Phase, usize)>>>);

    impl ProgressObserver for Recorder {
        fn on_progress(&self, phase: Phase, processed: usize, _total: usize) {
            self.0.borrow_mut().push((phase, processed));
        }
    }

    let seen = Rc::new(RefCell::new(Vec::new()));
    let config = ParserConfig {
        progress_interval: 2,
        line_batch_size: 10,
        ..ParserConfig::default()
    };
    let parser = LogParser::with_config(config).with_progress(Recorder(Rc::clone(&seen)));
    let lines = vec!["x"; 5];
    parser.parse("Editor.log", &lines, &mut MemorySink::new()).unwrap();

    assert_eq!(
        *seen.borrow(),
        vec![(Phase::Events, 2), (Phase::Events, 4), (Phase::StoringLines, 5)]
    );
}
