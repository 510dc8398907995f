#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(args) = cxbench::fuzzing::apply_config_from_toml(input) {
            debug_assert!(args.parallel.get() >= 1);
            debug_assert!(args.rate.is_finite() && args.rate >= 0.0);
            debug_assert!(args.decay_factor > 0.0 && args.decay_factor < 1.0);
        }
    }
});
