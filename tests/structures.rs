#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::borrow::Cow;

use packstream::{
    pack, unpack, unpack_all, unpack_with, BasicStruct, ErrorCode, FromStructure, PackStreamError,
    Packer, Registry, Structure, TryFromValue, Value,
};

#[derive(Debug, Clone, PartialEq, Structure)]
#[packstream(signature = 0x4E)]
struct Node {
    id: i64,
    labels: Vec<String>,
    properties: packstream::ValueMap,
}

#[derive(Debug, Clone, PartialEq, Structure)]
#[packstream(signature = 0x52)]
struct Relationship {
    id: i64,
    start: i64,
    end: i64,
    kind: String,
    #[packstream(skip)]
    cached_weight: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Structure)]
#[packstream(signature = 0x58)]
struct Point2D(i64, f64, f64);

#[derive(Debug, Clone, PartialEq, Structure)]
#[packstream(signature = 0xFF)]
struct Marker;

#[derive(Debug, Clone, PartialEq, Structure)]
#[packstream(signature = 0x50)]
struct Path {
    nodes: Vec<Node>,
}

fn node() -> Node {
    Node {
        id: 1,
        labels: vec!["Person".into()],
        properties: [("name", "Alice")].into_iter().collect(),
    }
}

#[test]
fn derived_structure_encodes_fields_in_order() {
    let bytes = pack(&node()).unwrap();
    let mut expected = vec![0xB3, 0x4E, 0x01, 0x91, 0x86];
    expected.extend_from_slice(b"Person");
    expected.extend_from_slice(&[0xA1, 0x84]);
    expected.extend_from_slice(b"name");
    expected.push(0x85);
    expected.extend_from_slice(b"Alice");
    assert_eq!(bytes, expected);
}

#[test]
fn without_registry_structures_stay_generic() {
    let bytes = pack(&node()).unwrap();
    let v = unpack_all(&bytes, None).unwrap().remove(0);
    let s = v.as_struct().expect("generic structure");
    assert_eq!(s.signature, 0x4E);
    assert_eq!(s.fields.len(), 3);
    assert_eq!(Node::try_from_value(v).unwrap(), node());
}

#[test]
fn registry_rebuilds_domain_values() {
    let registry = Registry::new().with::<Node>(0x4E);
    let bytes = pack(&node()).unwrap();
    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    assert_eq!(v.downcast_ref::<Node>(), Some(&node()));

    let again = pack(&v).unwrap();
    assert_eq!(again, bytes);
}

#[test]
fn registry_miss_and_empty_registry_fall_back() {
    let registry = Registry::new().with::<Node>(0x4E);
    let bytes = pack(&Point2D(7, 1.5, -2.0)).unwrap();
    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    assert_eq!(
        v,
        Value::structure(0x58, vec![Value::Int(7), Value::Float(1.5), Value::Float(-2.0)])
    );

    let empty = Registry::new();
    let bytes = pack(&node()).unwrap();
    let v = unpack_with(&bytes, &empty).next().unwrap().unwrap();
    assert!(v.as_struct().is_some());
}

#[test]
fn registry_errors_propagate_with_kind_intact() {
    let mut registry = Registry::new();
    registry.insert(0x4E, |_, _| {
        Err(PackStreamError::convert(ErrorCode::InvalidStructure))
    });
    let bytes = pack(&node()).unwrap();
    let err = unpack_with(&bytes, &registry).next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStructure);
}

#[test]
fn registry_entries_see_the_signed_signature() {
    let mut registry = Registry::new();
    registry.insert(-1, |sig, fields| {
        Ok(Value::List(vec![Value::Int(i64::from(sig)), Value::Int(fields.len().try_into().unwrap())]))
    });
    let bytes = pack(&Marker).unwrap();
    assert_eq!(bytes, [0xB0, 0xFF]);
    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    assert_eq!(v, Value::List(vec![Value::Int(-1), Value::Int(0)]));
    assert_eq!(Marker.signature(), -1);
}

#[test]
fn skipped_fields_are_defaulted() {
    let rel = Relationship {
        id: 9,
        start: 1,
        end: 2,
        kind: "KNOWS".into(),
        cached_weight: Some(0.5),
    };
    assert_eq!(rel.fields().len(), 4);
    let bytes = pack(&rel).unwrap();
    assert_eq!(bytes[0], 0xB4);

    let registry = Registry::new().with::<Relationship>(0x52);
    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    let back = v.downcast_ref::<Relationship>().unwrap();
    assert_eq!(back.kind, "KNOWS");
    assert_eq!(back.cached_weight, None);
}

#[test]
fn field_count_and_signature_are_checked() {
    let err = Node::from_structure(0x4E, vec![Value::Int(1)]).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStructure);

    let err = Point2D::from_structure(0x4E, vec![Value::Int(1), 1.0.into(), 2.0.into()])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStructure);

    let err = Point2D::from_structure(0x58, vec![Value::text("x"), 1.0.into(), 2.0.into()])
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TypeMismatch);
}

#[test]
fn nested_domain_values() {
    let path = Path {
        nodes: vec![node(), node()],
    };
    let bytes = pack(&path).unwrap();
    assert_eq!(&bytes[..3], [0xB1, 0x50, 0x92]);

    let registry = Registry::new().with::<Path>(0x50).with::<Node>(0x4E);
    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    assert_eq!(v.downcast_ref::<Path>(), Some(&path));

    let generic = unpack(&bytes).next().unwrap().unwrap();
    assert_eq!(Path::try_from_value(generic).unwrap(), path);
}

#[derive(Debug, Clone)]
struct Date {
    days: i64,
}

impl Structure for Date {
    fn signature(&self) -> i8 {
        0x44
    }

    fn fields(&self) -> Cow<'_, [Value]> {
        Cow::Owned(vec![Value::Int(self.days)])
    }
}

impl FromStructure for Date {
    fn from_structure(_signature: i8, fields: Vec<Value>) -> Result<Self, PackStreamError> {
        match fields.as_slice() {
            [Value::Int(days)] => Ok(Self { days: *days }),
            _ => Err(PackStreamError::convert(ErrorCode::InvalidStructure)),
        }
    }
}

#[test]
fn hand_written_structures_use_the_same_path() {
    let mut registry = Registry::new();
    registry.register::<Date>(0x44);
    assert!(registry.contains(0x44));

    let mut enc = Packer::new();
    enc.structure(&Date { days: 19_000 }).unwrap();
    let bytes = enc.into_vec();
    assert_eq!(bytes, [0xB1, 0x44, 0xC9, 0x4A, 0x38]);

    let v = unpack_with(&bytes, &registry).next().unwrap().unwrap();
    assert_eq!(v.downcast_ref::<Date>().map(|d| d.days), Some(19_000));

    let generic = v.as_domain().unwrap().to_basic();
    assert_eq!(generic, BasicStruct::new(0x44, vec![Value::Int(19_000)]));
}

#[test]
fn structure_builder_checks_declared_field_count() {
    let mut enc = Packer::new();
    let err = enc
        .structure_with(0x01, 2, |s| s.int(1))
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::LengthMismatch);
    assert!(enc.is_empty());

    enc.structure_with(0x01, 2, |s| {
        s.int(1)?;
        s.text("two")
    })
    .unwrap();
    assert_eq!(enc.as_bytes(), [0xB2, 0x01, 0x01, 0x83, b't', b'w', b'o']);
}

#[test]
fn registry_round_trip_at_field_count_boundaries() {
    let mut registry = Registry::new();
    registry.insert(0x10, |sig, fields| {
        Ok(Value::domain(BasicStruct::new(sig, fields)))
    });
    for len in [0_usize, 15, 16, 255, 256] {
        let fields: Vec<Value> = (0..len).map(|i| Value::Int(i64::try_from(i).unwrap())).collect();
        let original = Value::structure(0x10, fields.clone());
        let bytes = pack(&original).unwrap();

        let rebuilt = unpack_with(&bytes, &registry).next().unwrap().unwrap();
        let domain = rebuilt.downcast_ref::<BasicStruct>().unwrap();
        assert_eq!(domain.fields, fields, "{len} fields");
        assert_eq!(pack(&rebuilt).unwrap(), bytes);

        let generic = unpack(&bytes).next().unwrap().unwrap();
        assert_eq!(generic, original);
    }
}

#[test]
fn derived_types_only_rebuild_their_own_signature() {
    let registry = Registry::new().with::<Node>(0x4D);
    let mut bytes = pack(&node()).unwrap();
    bytes[1] = 0x4D;
    let err = unpack_with(&bytes, &registry).next().unwrap().unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStructure);

    let mut registry = Registry::new();
    registry.register::<Date>(0x64);
    let v = unpack_with(&[0xB1, 0x64, 0x05], &registry).next().unwrap().unwrap();
    assert_eq!(v.downcast_ref::<Date>().map(|d| d.days), Some(5));
}
