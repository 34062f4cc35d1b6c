//! Fuzz the wire-model decode paths.
//!
//! Malformed page or envelope bodies must return a decode error, never
//! panic the engine.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirror_engine::{Page, RemoteEnvelope};

fuzz_target!(|data: &[u8]| {
    if let Ok(text) = std::str::from_utf8(data) {
        // Either decode may fail; neither may panic
        let _ = serde_json::from_str::<RemoteEnvelope>(text);
        let _ = serde_json::from_str::<Page>(text);
    }
});
