//! Fuzz the page-range math.
//!
//! The computed page count must always cover every item with no fully
//! redundant trailing page, for any (items, chunk) pair.

#![no_main]

use libfuzzer_sys::fuzz_target;
use mirror_engine::engine::pages_for;

fuzz_target!(|input: (u32, u16)| {
    let (items, chunk) = input;
    let items = items as usize;
    let chunk = chunk as usize;

    let pages = pages_for(items, chunk);
    let effective = chunk.max(1);

    assert!(pages.saturating_mul(effective) >= items);
    if items > 0 {
        assert!((pages - 1).saturating_mul(effective) < items);
    } else {
        assert_eq!(pages, 0);
    }
});
