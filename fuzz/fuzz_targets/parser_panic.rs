#![no_main]
use editorlog_parse::{LogParser, MemorySink};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Lossy conversion keeps inputs that are "almost" text.
    let s = String::from_utf8_lossy(data);
    let lines: Vec<&str> = s.lines().collect();
    let mut sink = MemorySink::new();
    // Only sink failures may surface, and the memory sink never fails.
    assert!(LogParser::new().parse("fuzz.log", &lines, &mut sink).is_ok());
});
