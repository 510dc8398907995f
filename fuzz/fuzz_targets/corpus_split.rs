#![no_main]

use cxbench::workload::QueryCorpus;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(corpus) = QueryCorpus::from_bytes(data.to_vec()) {
        debug_assert!(!corpus.is_empty());
        for line in corpus.iter() {
            debug_assert!(!line.contains(&b'\n'));
            debug_assert!(!line.ends_with(b"\r"));
        }
        debug_assert!(corpus.get(corpus.len()).is_none());
    }
});
