#![no_main]

use cxbench::engine::{MAX_REQUEST_BYTES, RequestMethod, RequestTemplate};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|query: &[u8]| {
    for method in [RequestMethod::Get, RequestMethod::Post] {
        let template = RequestTemplate::new(method, "/p".to_owned(), "fuzz".to_owned(), None);
        let mut out = Vec::new();
        if template.render(query, &mut out).is_ok() {
            debug_assert!(out.len() <= MAX_REQUEST_BYTES);
            debug_assert!(out.windows(4).any(|window| window == b"\r\n\r\n"));
            if method == RequestMethod::Post {
                debug_assert!(out.ends_with(query));
            }
        }
    }
});
