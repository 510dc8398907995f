#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(target) = cxbench::fuzzing::parse_target_input(input) {
            debug_assert!(!target.host.is_empty());
            let reparsed = cxbench::fuzzing::parse_target_input(&target.to_string());
            debug_assert!(reparsed.is_ok_and(|again| again == target));
        }
    }
});
