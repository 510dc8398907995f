#![no_main]

use cxbench::engine::{SNIPPET_LIMIT, parse_status};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    match parse_status(data) {
        Ok(code) => {
            debug_assert!((100..=999).contains(&code));
            debug_assert!(data.starts_with(b"HTTP/1.1 ") || data.starts_with(b"HTTP/1.0 "));
        }
        Err(malformed) => {
            debug_assert!(malformed.snippet.len() <= SNIPPET_LIMIT.saturating_mul(4));
        }
    }
});
