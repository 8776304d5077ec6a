#![no_main]

use libfuzzer_sys::fuzz_target;

use packstream::{pack_all, DecodeLimits, Unpack};

fuzz_target!(|data: &[u8]| {
    let limits = DecodeLimits::for_bytes(data.len()).with_max_depth(64);
    let Ok(values) = Unpack::with_limits(data, None, limits).collect::<Result<Vec<_>, _>>() else {
        return;
    };
    let bytes = pack_all(&values).expect("re-encode");
    let again = Unpack::with_limits(&bytes, None, DecodeLimits::for_bytes(bytes.len()).with_max_depth(64))
        .collect::<Result<Vec<_>, _>>()
        .expect("decode re-encoded bytes");
    assert_eq!(values.len(), again.len());
    for (a, b) in values.iter().zip(&again) {
        assert_eq!(a.total_cmp(b), core::cmp::Ordering::Equal);
    }
    assert!(bytes.len() <= data.len());
});
