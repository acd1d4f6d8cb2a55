#![no_main]
use gial_rs::decode_index;
use libfuzzer_sys::fuzz_target;

// Any input must decode cleanly or fail with a file-format error
fuzz_target!(|data: &[u8]| {
    if let Err(err) = decode_index(data) {
        assert!(err.is_invalid_index(), "unexpected error kind: {:?}", err);
    }
});
