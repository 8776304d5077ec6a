#![allow(clippy::unwrap_used, clippy::expect_used)]

use packstream::{
    decode_one, pack, pack_all, unpack, unpack_all, unpack_single, ByteCursor, DecodeLimits,
    ErrorCode, Unpack, Value,
};

#[test]
fn concatenated_packs_unpack_as_a_sequence() {
    let a = Value::text("a");
    let b = Value::List(vec![Value::Int(1), Value::Null]);
    let c = Value::structure(0x4E, vec![Value::Int(7)]);

    let mut bytes = pack(&a).unwrap();
    bytes.extend(pack(&b).unwrap());
    bytes.extend(pack(&c).unwrap());

    assert_eq!(bytes, pack_all([&a, &b, &c]).unwrap());
    assert_eq!(unpack_all(&bytes, None).unwrap(), vec![a, b, c]);
}

#[test]
fn pack_all_of_nothing_is_empty() {
    let none: [Value; 0] = [];
    assert!(pack_all(none).unwrap().is_empty());
    assert!(unpack(&[]).next().is_none());
}

#[test]
fn sequence_is_lazy_and_ordered() {
    let bytes = [0x01, 0x02, 0xCC];
    let mut it = unpack(&bytes);
    assert_eq!(it.next().unwrap().unwrap(), Value::Int(1));
    assert_eq!(it.position(), 1);
    assert_eq!(it.next().unwrap().unwrap(), Value::Int(2));
    let err = it.next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::UnrecognizedMarker(0xCC));
    assert_eq!(err.offset, 2);
    assert!(it.next().is_none());
}

#[test]
fn unpack_all_surfaces_the_first_error() {
    let err = unpack_all(&[0x01, 0xE5, 0x02], None).unwrap_err();
    assert_eq!(err.code, ErrorCode::UnrecognizedMarker(0xE5));
    assert!(err.is_decode());
}

#[test]
fn decode_one_consumes_exactly_one_value() {
    let bytes = [0x92, 0x01, 0x02, 0x81, b'z'];
    let mut c = ByteCursor::new(&bytes);
    assert_eq!(
        decode_one(&mut c, None).unwrap(),
        Value::List(vec![Value::Int(1), Value::Int(2)])
    );
    assert_eq!(c.position(), 3);
    assert_eq!(decode_one(&mut c, None).unwrap(), Value::text("z"));
    assert!(c.at_end());
}

#[test]
fn truncation_reports_requested_and_available() {
    let cases: &[&[u8]] = &[
        &[0xC9, 0x01],
        &[0xC1, 0, 0, 0],
        &[0x85, b'a', b'b'],
        &[0xD1, 0x00],
        &[0x92, 0x01],
        &[0xA1, 0x81, b'k'],
        &[0xB1],
    ];
    for bytes in cases {
        let err = unpack_single(bytes, None).unwrap_err();
        assert!(err.is_truncation(), "{bytes:02X?} gave {err}");
    }

    let err = unpack_single(&[0xCA, 0x00, 0x01], None).unwrap_err();
    assert_eq!(
        err.code,
        ErrorCode::TruncatedInput {
            requested: 4,
            available: 2
        }
    );
    assert_eq!(err.offset, 1);
}

#[test]
fn invalid_utf8_is_a_decode_error() {
    let err = unpack_single(&[0x82, 0xC3, 0x28], None).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidUtf8);
    assert!(err.is_decode());
}

#[test]
fn unused_markers_are_rejected() {
    for m in [0xC4_u8, 0xC7, 0xCC, 0xCF, 0xD3, 0xD7, 0xDB, 0xDE, 0xDF, 0xE0, 0xEF] {
        let err = unpack_single(&[m], None).unwrap_err();
        assert_eq!(err.code, ErrorCode::UnrecognizedMarker(m));
        assert_eq!(err.offset, 0);
    }
}

#[test]
fn forged_lengths_do_not_allocate() {
    let err = unpack_single(&[0xDA, 0xFF, 0xFF, 0xFF, 0xFF], None).unwrap_err();
    assert!(err.is_truncation());
    let err = unpack_single(&[0xD2, 0xFF, 0xFF, 0xFF, 0xFF, b'a'], None).unwrap_err();
    assert!(err.is_truncation());
}

#[test]
fn default_depth_limit_applies_to_decode_one() {
    let mut bytes = vec![0x91; packstream::DEFAULT_MAX_DEPTH + 1];
    bytes.push(0xC0);
    let err = decode_one(&mut ByteCursor::new(&bytes), None).unwrap_err();
    assert_eq!(err.code, ErrorCode::DepthLimitExceeded);
    assert_eq!(err.offset, packstream::DEFAULT_MAX_DEPTH);

    let ok = &bytes[1..];
    assert!(decode_one(&mut ByteCursor::new(ok), None).is_ok());
}

#[test]
fn limits_apply_per_value() {
    let bytes = [0x92, 0x01, 0x02, 0x93, 0x01, 0x02, 0x03];
    let limits = DecodeLimits::unlimited();
    let limits = DecodeLimits {
        max_container_len: 2,
        ..limits
    };
    let mut it = Unpack::with_limits(&bytes, None, limits);
    assert!(it.next().unwrap().is_ok());
    let err = it.next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::ContainerLenLimitExceeded);
    assert_eq!(err.offset, 3);
    assert_eq!(it.remaining_bytes(), &bytes[3..]);
}

#[test]
fn single_value_helpers() {
    assert_eq!(unpack_single(&[0xF5], None).unwrap(), Value::Int(-11));
    let err = unpack_single(&[0x01, 0x02], None).unwrap_err();
    assert_eq!(err.code, ErrorCode::TrailingBytes);
    assert_eq!(err.offset, 1);
}

#[test]
fn partial_consumption_does_not_affect_a_fresh_unpack() {
    let bytes = pack_all([Value::Int(1), Value::text("two"), Value::Null]).unwrap();
    let mut first = unpack(&bytes);
    assert_eq!(first.next().unwrap().unwrap(), Value::Int(1));
    drop(first);

    let fresh: Vec<_> = unpack(&bytes).collect::<Result<_, _>>().unwrap();
    assert_eq!(fresh, vec![Value::Int(1), Value::text("two"), Value::Null]);
}

#[test]
fn codec_types_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Value>();
    assert_send_sync::<packstream::Registry>();
    assert_send_sync::<Unpack<'static>>();
}
