//! Black-box integration tests exercising the public API the way a
//! consumer would: build descriptors, register them, construct and mutate
//! dynamic messages, and cross into well-known-type representations.
//!
//! Mirrors `tokio-rs-prost`'s `tests/message_encoding.rs` `let _ =
//! env_logger::init();` idiom for observing `log` output under test.

use protodyn::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use protodyn::dynamic::{DynamicMessage, MessageFactory, Value};
use protodyn::error::Error;
use protodyn::registry::TypeRegistry;
use protodyn::wkt::any::{AnyHandler, AnyValue, WireCodec};
use protodyn::wkt::{
    DurationValue, EmptyValue, FieldMaskValue, SpecializedValue, StructValue, TimestampValue,
    ValueValue, WellKnownTypeHandler, WellKnownTypesRegistry,
};

/// A small fake codec good enough to exercise the `Any` round-trip law:
/// stores each set field as `field_number|len|bytes`, *not* real protobuf
/// wire format (wire-format encoding is out of scope for this crate).
struct FakeCodec;

impl WireCodec for FakeCodec {
    fn serialize(&self, msg: &DynamicMessage) -> protodyn::error::Result<Vec<u8>> {
        let mut out = Vec::new();
        for field in msg.descriptor().fields() {
            if let Some(value) = msg.get(field.name())? {
                let bytes = match value {
                    Value::String(s) => s.into_bytes(),
                    Value::I32(n) => n.to_le_bytes().to_vec(),
                    Value::I64(n) => n.to_le_bytes().to_vec(),
                    _ => continue,
                };
                out.extend_from_slice(&field.number().to_le_bytes());
                out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                out.extend_from_slice(&bytes);
            }
        }
        Ok(out)
    }

    fn deserialize(
        &self,
        bytes: &[u8],
        descriptor: &MessageDescriptor,
    ) -> protodyn::error::Result<DynamicMessage> {
        let mut msg = MessageFactory::new_message(descriptor);
        let mut cursor = bytes;
        while !cursor.is_empty() {
            let number = u32::from_le_bytes(cursor[0..4].try_into().unwrap());
            let len = u32::from_le_bytes(cursor[4..8].try_into().unwrap()) as usize;
            let payload = &cursor[8..8 + len];
            cursor = &cursor[8 + len..];
            let field = descriptor
                .field_by_number(number)
                .expect("fake codec only emits known field numbers");
            let value = match field.field_type() {
                FieldType::String => Value::String(String::from_utf8(payload.to_vec()).unwrap()),
                FieldType::Int32 => Value::I32(i32::from_le_bytes(payload.try_into().unwrap())),
                FieldType::Int64 => Value::I64(i64::from_le_bytes(payload.try_into().unwrap())),
                other => panic!("fake codec does not support {other}"),
            };
            msg.set(field.name(), value)?;
        }
        Ok(msg)
    }
}

fn test_message_file() -> protodyn::descriptor::FileDescriptor {
    FileDescriptorBuilder::new("test.proto")
        .package("test.package")
        .message(
            MessageDescriptorBuilder::new("TestMessage")
                .field(FieldDescriptorBuilder::new("name", 1, FieldType::String))
                .field(FieldDescriptorBuilder::new("count", 2, FieldType::Int32)),
        )
        .build()
        .unwrap()
}

/// S1: Timestamp round-trip.
#[test]
fn s1_timestamp_round_trip() {
    let _ = env_logger::try_init();

    let handler = protodyn::wkt::timestamp::TimestampHandler;
    let value = SpecializedValue::Timestamp(
        TimestampValue::new(1_234_567_890, 123_456_789).unwrap(),
    );
    let msg = handler.create_dynamic(&value).unwrap();
    assert_eq!(msg.get("seconds").unwrap().unwrap().as_i64(), Some(1_234_567_890));
    assert_eq!(msg.get("nanos").unwrap().unwrap().as_i32(), Some(123_456_789));
    assert_eq!(handler.create_specialized(&msg).unwrap(), value);
}

/// S2: Duration sign enforcement.
#[test]
fn s2_duration_sign_enforcement() {
    let _ = env_logger::try_init();

    let err = DurationValue::new(1, -500_000_000).unwrap_err();
    match err {
        Error::InvalidData { reason, .. } => assert!(reason.contains("same sign")),
        other => panic!("expected InvalidData, got {other:?}"),
    }
    assert!(DurationValue::new(0, -999_999_999).is_ok());
}

/// S3: FieldMask covers semantics.
#[test]
fn s3_field_mask_covers_semantics() {
    let _ = env_logger::try_init();

    let mut mask = FieldMaskValue::new();
    mask.add("user").unwrap();
    mask.add("metadata.tags").unwrap();

    assert!(mask.covers("user.name"));
    assert!(!mask.covers("metadata"));
    assert!(mask.covers("metadata.tags.name"));
    assert!(!mask.contains("user.name"));
}

/// S4: Any type mismatch.
#[test]
fn s4_any_type_mismatch() {
    let _ = env_logger::try_init();

    let file = test_message_file();
    let descriptor = file.messages()[0].clone();
    let msg = MessageFactory::new_message(&descriptor);

    let codec = FakeCodec;
    let any = AnyValue::pack(&msg, &codec).unwrap();
    assert_eq!(any.type_url(), "type.googleapis.com/test.package.TestMessage");

    let wrong = FileDescriptorBuilder::new("wrong.proto")
        .package("wrong.package")
        .message(MessageDescriptorBuilder::new("WrongMessage"))
        .build()
        .unwrap()
        .messages()[0]
        .clone();

    assert!(matches!(
        any.unpack_to(&wrong, &codec),
        Err(Error::ConversionFailed { .. })
    ));
}

/// S5: Any via registry.
#[test]
fn s5_any_via_registry() {
    let _ = env_logger::try_init();

    let registry = TypeRegistry::new();
    registry.register_file(test_message_file()).unwrap();
    let descriptor = registry.find_message("test.package.TestMessage").unwrap();

    let mut msg = MessageFactory::new_message(&descriptor);
    msg.set("name", Value::String("Alice".into())).unwrap();
    msg.set("count", Value::I32(42)).unwrap();

    let codec = FakeCodec;
    let any = AnyValue::pack(&msg, &codec).unwrap();
    let unpacked = any.unpack_using(&registry, &codec).unwrap();

    assert_eq!(unpacked.get("name").unwrap(), msg.get("name").unwrap());
    assert_eq!(unpacked.get("count").unwrap(), msg.get("count").unwrap());
    assert_eq!(unpacked, msg);
}

/// S6: Struct nesting.
#[test]
fn s6_struct_nesting() {
    let _ = env_logger::try_init();

    let registry = WellKnownTypesRegistry::new_isolated();

    let mut scores = Vec::new();
    scores.push(ValueValue::Number(95.5));
    scores.push(ValueValue::Number(87.2));

    let mut inner = std::collections::HashMap::new();
    inner.insert("name".to_string(), ValueValue::String("Alice".to_string()));
    inner.insert("scores".to_string(), ValueValue::List(scores));

    let mut outer = std::collections::HashMap::new();
    outer.insert("user".to_string(), ValueValue::Struct(StructValue { fields: inner }));

    let value = SpecializedValue::Struct(StructValue { fields: outer });

    let msg = registry
        .create_dynamic(&value, "google.protobuf.Struct")
        .unwrap();
    let round_tripped = registry
        .create_specialized(&msg, "google.protobuf.Struct")
        .unwrap();
    assert_eq!(round_tripped, value);
}

/// Universal law 4/5: FieldMask covers reflexivity and subsumption.
#[test]
fn field_mask_covers_reflexivity_and_subsumption() {
    let _ = env_logger::try_init();

    let mut mask = FieldMaskValue::new();
    mask.add("a.b").unwrap();
    assert!(mask.covers("a.b"));
    assert!(mask.covers("a.b.c"));
    assert!(!mask.covers("a"));
    assert!(!mask.contains("a.b.c"));
}

/// Universal law 10: every handler rejects a mismatched descriptor.
#[test]
fn every_handler_rejects_wrong_descriptor() {
    let _ = env_logger::try_init();

    let other = FileDescriptorBuilder::new("other.proto")
        .package("google.protobuf")
        .message(MessageDescriptorBuilder::new("NotAWellKnownType"))
        .build()
        .unwrap();
    let msg = MessageFactory::new_message(&other.messages()[0]);

    let registry = WellKnownTypesRegistry::new_isolated();
    for fqn in [
        "google.protobuf.Timestamp",
        "google.protobuf.Duration",
        "google.protobuf.Empty",
        "google.protobuf.FieldMask",
        "google.protobuf.Struct",
        "google.protobuf.Value",
        "google.protobuf.Any",
    ] {
        let handler = registry.get_handler(fqn).unwrap();
        assert!(
            matches!(handler.create_specialized(&msg), Err(Error::InvalidData { .. })),
            "handler for {fqn} did not reject a mismatched descriptor"
        );
    }
}

/// Empty is total: any message whose descriptor is `google.protobuf.Empty`
/// yields the unit, and vice versa.
#[test]
fn empty_conversion_is_total() {
    let _ = env_logger::try_init();

    let registry = WellKnownTypesRegistry::new_isolated();
    let value = SpecializedValue::Empty(EmptyValue);
    let msg = registry.create_dynamic(&value, "google.protobuf.Empty").unwrap();
    assert_eq!(
        registry.create_specialized(&msg, "google.protobuf.Empty").unwrap(),
        value
    );
}

/// `Any` packed through the registry's `AnyHandler` moves `type_url`/bytes
/// without touching the referenced message's own wire bytes.
#[test]
fn any_handler_is_independent_of_pack_unpack() {
    let _ = env_logger::try_init();

    let handler = AnyHandler;
    let value = SpecializedValue::Any(
        AnyValue::new("type.googleapis.com/test.package.TestMessage", vec![9, 9, 9]).unwrap(),
    );
    let msg = handler.create_dynamic(&value).unwrap();
    assert_eq!(handler.create_specialized(&msg).unwrap(), value);
}
