#![no_main]

use libfuzzer_sys::fuzz_target;
use notefind::query::{parse_query, QueryCompiler};

fuzz_target!(|data: &str| {
    // Parsing and compiling must never panic, whatever the input.
    if let Ok(node) = parse_query(data) {
        let _ = node.node_count();
    }
    let _ = QueryCompiler::interactive().compile(data);
    let _ = QueryCompiler::batch().compile(data);
});
