#![no_main]

use libfuzzer_sys::fuzz_target;

use packstream::{DecodeLimits, Unpack};

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits::for_bytes(data.len()).with_max_depth(64);
    let mut it = Unpack::with_limits(data, None, limits);
    let mut last = 0;
    for item in &mut it {
        if item.is_err() {
            assert_eq!(it.position(), last);
            break;
        }
        assert!(it.position() > last);
        last = it.position();
    }
    assert!(it.next().is_none());
});
