#![no_main]

use libfuzzer_sys::fuzz_target;
use splitviz_core::{SessionConfig, VizConfig};

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if text.len() > 4096 {
        return;
    }

    // Parsing and validation must never panic.
    let session = SessionConfig::from_json(text);
    if let (Ok(viz), Ok(session)) = (VizConfig::from_json(text), &session) {
        let _ = viz.validate(session);
    }

    // A config that parsed is valid, so every response question has a
    // complete expanded→collapsed table.
    if let Ok(session) = session {
        for rq in &session.response_questions {
            for g in 0..rq.expanded().len() {
                assert!(rq.collapsed_of(g) < rq.collapsed().len());
            }
        }
    }
});
