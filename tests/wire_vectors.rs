#![allow(clippy::unwrap_used, clippy::expect_used)]

use packstream::{pack, unpack_single, ErrorCode, Packer, Value};

fn encode_one(f: impl FnOnce(&mut Packer) -> Result<(), packstream::PackStreamError>) -> Vec<u8> {
    let mut enc = Packer::new();
    f(&mut enc).unwrap();
    enc.into_vec()
}

fn decode(bytes: &[u8]) -> Value {
    unpack_single(bytes, None).unwrap()
}

#[test]
fn scalar_markers() {
    assert_eq!(pack(&Value::Null).unwrap(), [0xC0]);
    assert_eq!(pack(&true).unwrap(), [0xC3]);
    assert_eq!(pack(&false).unwrap(), [0xC2]);
    assert_eq!(
        pack(&6.283_185_307_179_586_f64).unwrap(),
        [0xC1, 0x40, 0x19, 0x21, 0xFB, 0x54, 0x44, 0x2D, 0x18]
    );
}

#[test]
fn int_boundaries() {
    let cases: &[(i64, &[u8])] = &[
        (0, &[0x00]),
        (127, &[0x7F]),
        (-1, &[0xFF]),
        (-16, &[0xF0]),
        (-17, &[0xC8, 0xEF]),
        (-128, &[0xC8, 0x80]),
        (128, &[0xC9, 0x00, 0x80]),
        (-129, &[0xC9, 0xFF, 0x7F]),
        (32_767, &[0xC9, 0x7F, 0xFF]),
        (-32_768, &[0xC9, 0x80, 0x00]),
        (32_768, &[0xCA, 0x00, 0x00, 0x80, 0x00]),
        (-32_769, &[0xCA, 0xFF, 0xFF, 0x7F, 0xFF]),
        (2_147_483_647, &[0xCA, 0x7F, 0xFF, 0xFF, 0xFF]),
        (
            2_147_483_648,
            &[0xCB, 0x00, 0x00, 0x00, 0x00, 0x80, 0x00, 0x00, 0x00],
        ),
        (
            i64::MAX,
            &[0xCB, 0x7F, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF],
        ),
        (
            i64::MIN,
            &[0xCB, 0x80, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00],
        ),
    ];
    for (v, expected) in cases {
        assert_eq!(encode_one(|e| e.int(*v)), *expected, "encoding {v}");
        assert_eq!(decode(expected), Value::Int(*v), "decoding {v}");
    }
}

#[test]
fn text_size_classes() {
    assert_eq!(pack("").unwrap(), [0x80]);
    assert_eq!(pack("A").unwrap(), [0x81, 0x41]);
    assert_eq!(pack("é").unwrap(), [0x82, 0xC3, 0xA9]);

    let mut expected = vec![0xD0, 0x12];
    expected.extend_from_slice("Größenmaßstäbe".as_bytes());
    assert_eq!(pack("Größenmaßstäbe").unwrap(), expected);

    let cases: &[(usize, &[u8])] = &[
        (15, &[0x8F]),
        (16, &[0xD0, 0x10]),
        (255, &[0xD0, 0xFF]),
        (256, &[0xD1, 0x01, 0x00]),
        (65_535, &[0xD1, 0xFF, 0xFF]),
        (65_536, &[0xD2, 0x00, 0x01, 0x00, 0x00]),
    ];
    for (len, header) in cases {
        let s = "x".repeat(*len);
        let bytes = pack(s.as_str()).unwrap();
        assert_eq!(&bytes[..header.len()], *header, "text of {len}");
        assert_eq!(bytes.len(), header.len() + len);
        assert_eq!(decode(&bytes), Value::Text(s));
    }
}

#[test]
fn list_size_classes() {
    assert_eq!(pack(&Vec::<i64>::new()).unwrap(), [0x90]);
    assert_eq!(pack(&[1, 2, 3]).unwrap(), [0x93, 0x01, 0x02, 0x03]);

    let cases: &[(usize, &[u8])] = &[
        (15, &[0x9F]),
        (16, &[0xD4, 0x10]),
        (255, &[0xD4, 0xFF]),
        (256, &[0xD5, 0x01, 0x00]),
        (65_535, &[0xD5, 0xFF, 0xFF]),
        (65_536, &[0xD6, 0x00, 0x01, 0x00, 0x00]),
    ];
    for (len, header) in cases {
        let items = vec![Value::Int(1); *len];
        let bytes = pack(&items).unwrap();
        assert_eq!(&bytes[..header.len()], *header, "list of {len}");
        assert_eq!(bytes.len(), header.len() + len);
        assert_eq!(decode(&bytes), Value::List(items));
    }
}

#[test]
fn map_size_classes() {
    let one: packstream::ValueMap = [("one", "eins")].into_iter().collect();
    assert_eq!(
        pack(&one).unwrap(),
        [0xA1, 0x83, b'o', b'n', b'e', 0x84, b'e', b'i', b'n', b's']
    );

    let cases: &[(usize, &[u8])] = &[
        (0, &[0xA0]),
        (15, &[0xAF]),
        (16, &[0xD8, 0x10]),
        (255, &[0xD8, 0xFF]),
        (256, &[0xD9, 0x01, 0x00]),
        (65_535, &[0xD9, 0xFF, 0xFF]),
        (65_536, &[0xDA, 0x00, 0x01, 0x00, 0x00]),
    ];
    for (len, header) in cases {
        let map: packstream::ValueMap = (0..*len)
            .map(|i| (i64::try_from(i).unwrap(), Value::Null))
            .collect();
        let bytes = pack(&map).unwrap();
        assert_eq!(&bytes[..header.len()], *header, "map of {len}");
        assert_eq!(decode(&bytes), Value::Map(map));
    }
}

#[test]
fn structure_size_classes() {
    let cases: &[(usize, &[u8])] = &[
        (0, &[0xB0, 0x4E]),
        (1, &[0xB1, 0x4E]),
        (15, &[0xBF, 0x4E]),
        (16, &[0xDC, 0x10, 0x4E]),
        (255, &[0xDC, 0xFF, 0x4E]),
        (256, &[0xDD, 0x01, 0x00, 0x4E]),
        (65_535, &[0xDD, 0xFF, 0xFF, 0x4E]),
    ];
    for (len, header) in cases {
        let v = Value::structure(0x4E, vec![Value::Null; *len]);
        let bytes = pack(&v).unwrap();
        assert_eq!(&bytes[..header.len()], *header, "structure of {len}");
        assert_eq!(bytes.len(), header.len() + len);
        assert_eq!(decode(&bytes), v);
    }
}

#[test]
fn structure_with_too_many_fields_is_out_of_range() {
    let v = Value::structure(0x4E, vec![Value::Null; 65_536]);
    let err = pack(&v).unwrap_err();
    assert_eq!(err.code, ErrorCode::ValueOutOfRange);
    assert!(err.is_encode());
}

#[test]
fn non_minimal_encodings_are_accepted() {
    assert_eq!(decode(&[0xC8, 0x01]), Value::Int(1));
    assert_eq!(decode(&[0xCB, 0, 0, 0, 0, 0, 0, 0, 0x05]), Value::Int(5));
    assert_eq!(decode(&[0xD0, 0x01, b'a']), Value::text("a"));
    assert_eq!(decode(&[0xD6, 0, 0, 0, 0x01, 0xC0]), Value::List(vec![Value::Null]));
    assert_eq!(
        decode(&[0xDC, 0x01, 0x58, 0x01]),
        Value::structure(0x58, vec![Value::Int(1)])
    );
}

#[test]
fn negative_signature_round_trips() {
    let v = Value::structure(i8::MIN, vec![]);
    let bytes = pack(&v).unwrap();
    assert_eq!(bytes, [0xB0, 0x80]);
    assert_eq!(decode(&bytes), v);
}

#[test]
fn nested_containers() {
    let v = Value::List(vec![
        Value::List(vec![Value::Int(1)]),
        Value::Map([("k", vec![true])].into_iter().collect()),
    ]);
    let bytes = pack(&v).unwrap();
    assert_eq!(
        bytes,
        [0x92, 0x91, 0x01, 0xA1, 0x81, b'k', 0x91, 0xC3]
    );
    assert_eq!(decode(&bytes), v);
}
