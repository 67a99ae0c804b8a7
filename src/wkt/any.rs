//! The `google.protobuf.Any` well-known type: a type-erased, self-describing
//! payload identified by a type URL.
//!
//! Wire-format encoding/decoding is explicitly out of scope for this crate,
//! so `pack`/`unpack_to`/`unpack_using` are written generically against a
//! caller-supplied [`WireCodec`] rather than against any concrete encoder,
//! mirroring `prost-types::Any::from_msg`/`to_msg`
//! (`prost-types/src/any.rs`) but with the codec as an explicit parameter
//! instead of a `prost::Message` bound baked into the type.

use std::sync::OnceLock;

use crate::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use crate::dynamic::{DynamicMessage, MessageFactory, Value};
use crate::error::{Error, Result};
use crate::registry::TypeRegistry;
use crate::type_url::{self, GOOGLE_APIS_DOMAIN};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const HANDLED_TYPE_NAME: &str = "google.protobuf.Any";

/// The wire-format boundary `Any` packing/unpacking is written against.
/// This crate ships no implementation: encoding/decoding protobuf's binary
/// wire format is a separate collaborator's job.
pub trait WireCodec {
    /// Encodes `msg` to its wire-format bytes.
    fn serialize(&self, msg: &DynamicMessage) -> Result<Vec<u8>>;

    /// Decodes `bytes` into a fresh [`DynamicMessage`] bound to
    /// `descriptor`.
    fn deserialize(&self, bytes: &[u8], descriptor: &MessageDescriptor) -> Result<DynamicMessage>;
}

/// A type-erased payload: `type_url` identifies the packed message's type,
/// `value` holds its wire-format bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AnyValue {
    type_url: String,
    value: Vec<u8>,
}

impl AnyValue {
    /// Validates `type_url` before constructing.
    pub fn new(type_url: impl Into<String>, value: impl Into<Vec<u8>>) -> Result<Self> {
        let type_url = type_url.into();
        if !type_url::is_valid_type_url(&type_url) {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: format!("`{type_url}` is not a valid type URL"),
            });
        }
        Ok(AnyValue {
            type_url,
            value: value.into(),
        })
    }

    pub fn type_url(&self) -> &str {
        &self.type_url
    }

    pub fn value(&self) -> &[u8] {
        &self.value
    }

    /// The portion of `type_url` after the first `/`, or the whole string
    /// if there is none. Lenient by design, see
    /// [`crate::type_url::extract_type_name`].
    pub fn get_type_name(&self) -> &str {
        type_url::extract_type_name(&self.type_url)
    }

    /// Packs `msg` as an `Any`: `type_url` becomes
    /// `"type.googleapis.com/" + msg.descriptor().full_name()`, `value`
    /// becomes `codec.serialize(msg)`.
    pub fn pack(msg: &DynamicMessage, codec: &dyn WireCodec) -> Result<Self> {
        let type_url = type_url::create_type_url_with_domain(
            GOOGLE_APIS_DOMAIN,
            msg.descriptor().full_name(),
        );
        let value = codec.serialize(msg)?;
        Ok(AnyValue { type_url, value })
    }

    /// Unpacks into a fresh message of `descriptor`.
    ///
    /// Fails with [`Error::ConversionFailed`] if `descriptor.full_name()`
    /// does not equal [`Self::get_type_name`].
    pub fn unpack_to(&self, descriptor: &MessageDescriptor, codec: &dyn WireCodec) -> Result<DynamicMessage> {
        if descriptor.full_name() != self.get_type_name() {
            return Err(Error::ConversionFailed {
                from: self.type_url.clone(),
                to: descriptor.full_name().to_string(),
                reason: format!(
                    "Any holds `{}`, not `{}`",
                    self.get_type_name(),
                    descriptor.full_name()
                ),
            });
        }
        codec.deserialize(&self.value, descriptor)
    }

    /// Looks up [`Self::get_type_name`] in `registry` and unpacks into it.
    ///
    /// Fails with [`Error::ConversionFailed`] if the registry has no
    /// descriptor for that name.
    pub fn unpack_using(&self, registry: &TypeRegistry, codec: &dyn WireCodec) -> Result<DynamicMessage> {
        let type_name = self.get_type_name();
        let descriptor = registry.find_message(type_name).ok_or_else(|| Error::ConversionFailed {
            from: self.type_url.clone(),
            to: type_name.to_string(),
            reason: format!("no descriptor registered for `{type_name}`"),
        })?;
        self.unpack_to(&descriptor, codec)
    }
}

fn descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/any.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("Any")
                    .field(FieldDescriptorBuilder::new("type_url", 1, FieldType::String))
                    .field(FieldDescriptorBuilder::new("value", 2, FieldType::Bytes)),
            )
            .build()
            .expect("well-known Any descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// Handler for `google.protobuf.Any`.
///
/// Unlike the other six handlers, `create_specialized`/`create_dynamic`
/// here only move `type_url`/`value` bytes in and out of the dynamic
/// message's own two fields. Packing/unpacking a *referenced* message
/// goes through [`AnyValue::pack`]/[`AnyValue::unpack_to`] instead, since
/// those require a [`WireCodec`] the stateless handler contract has no
/// room for.
#[derive(Debug, Default, Clone, Copy)]
pub struct AnyHandler;

impl WellKnownTypeHandler for AnyHandler {
    fn handled_type_name(&self) -> &'static str {
        HANDLED_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Critical
    }

    fn create_specialized(&self, msg: &DynamicMessage) -> Result<SpecializedValue> {
        if msg.descriptor().full_name() != HANDLED_TYPE_NAME {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: format!(
                    "expected a `{}` message, got `{}`",
                    HANDLED_TYPE_NAME,
                    msg.descriptor().full_name()
                ),
            });
        }
        let type_url = msg.get("type_url")?.and_then(|v| v.as_str().map(str::to_string)).unwrap_or_default();
        let value = msg.get("value")?.and_then(|v| v.as_bytes().cloned()).unwrap_or_default();
        Ok(SpecializedValue::Any(AnyValue::new(type_url, value.to_vec())?))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::Any(any) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: HANDLED_TYPE_NAME.to_string(),
                reason: "expected an Any specialized value".to_string(),
            });
        };
        let mut msg = MessageFactory::new_message(descriptor());
        msg.set("type_url", Value::String(any.type_url.clone()))?;
        msg.set("value", Value::Bytes(any.value.clone().into()))?;
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        matches!(value, SpecializedValue::Any(any) if type_url::is_valid_type_url(&any.type_url))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptorBuilder as FB, FieldType as FT, FileDescriptorBuilder as FDB, MessageDescriptorBuilder as MDB};

    /// A fake, non-protobuf "codec" good enough to exercise the round-trip
    /// law: it stores the message's fields as a trivial `len|bytes` stream
    /// keyed by field number, ordered by field number ascending.
    struct FakeCodec;

    impl WireCodec for FakeCodec {
        fn serialize(&self, msg: &DynamicMessage) -> Result<Vec<u8>> {
            let mut out = Vec::new();
            for field in msg.descriptor().fields() {
                if let Some(value) = msg.get(field.name())? {
                    let bytes = match value {
                        Value::String(s) => s.into_bytes(),
                        Value::I32(n) => n.to_le_bytes().to_vec(),
                        Value::Bytes(b) => b.to_vec(),
                        _ => continue,
                    };
                    out.extend_from_slice(&field.number().to_le_bytes());
                    out.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
                    out.extend_from_slice(&bytes);
                }
            }
            Ok(out)
        }

        fn deserialize(&self, bytes: &[u8], descriptor: &MessageDescriptor) -> Result<DynamicMessage> {
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
                    FT::String => Value::String(String::from_utf8(payload.to_vec()).unwrap()),
                    FT::Int32 => Value::I32(i32::from_le_bytes(payload.try_into().unwrap())),
                    FT::Bytes => Value::Bytes(payload.to_vec().into()),
                    other => panic!("fake codec does not support {other}"),
                };
                msg.set(field.name(), value)?;
            }
            Ok(msg)
        }
    }

    fn test_message_descriptor() -> MessageDescriptor {
        FDB::new("test.proto")
            .package("test.package")
            .message(
                MDB::new("TestMessage")
                    .field(FB::new("name", 1, FT::String))
                    .field(FB::new("count", 2, FT::Int32)),
            )
            .build()
            .unwrap()
            .messages()[0]
            .clone()
    }

    #[test]
    fn type_url_validation() {
        assert!(AnyValue::new("type.googleapis.com/a.b.C", Vec::new()).is_ok());
        assert!(AnyValue::new("no-slash-no-dot", Vec::new()).is_err());
    }

    #[test]
    fn get_type_name_strips_domain() {
        let any = AnyValue::new("type.googleapis.com/a.b.C", Vec::new()).unwrap();
        assert_eq!(any.get_type_name(), "a.b.C");
    }

    #[test]
    fn pack_and_unpack_to_round_trips() {
        let descriptor = test_message_descriptor();
        let mut msg = MessageFactory::new_message(&descriptor);
        msg.set("name", Value::String("Alice".into())).unwrap();
        msg.set("count", Value::I32(7)).unwrap();

        let codec = FakeCodec;
        let any = AnyValue::pack(&msg, &codec).unwrap();
        assert_eq!(any.type_url(), "type.googleapis.com/test.package.TestMessage");

        let round_tripped = any.unpack_to(&descriptor, &codec).unwrap();
        assert_eq!(round_tripped, msg);
    }

    #[test]
    fn unpack_to_wrong_descriptor_fails() {
        let descriptor = test_message_descriptor();
        let msg = MessageFactory::new_message(&descriptor);
        let codec = FakeCodec;
        let any = AnyValue::pack(&msg, &codec).unwrap();

        let wrong = FDB::new("wrong.proto")
            .package("wrong.package")
            .message(MDB::new("WrongMessage"))
            .build()
            .unwrap()
            .messages()[0]
            .clone();

        assert!(matches!(
            any.unpack_to(&wrong, &codec),
            Err(Error::ConversionFailed { .. })
        ));
    }

    #[test]
    fn unpack_using_registry() {
        let descriptor = test_message_descriptor();
        let registry = TypeRegistry::new();
        registry
            .register_file(
                FDB::new("test.proto")
                    .package("test.package")
                    .message(
                        MDB::new("TestMessage")
                            .field(FB::new("name", 1, FT::String))
                            .field(FB::new("count", 2, FT::Int32)),
                    )
                    .build()
                    .unwrap(),
            )
            .unwrap();

        let mut msg = MessageFactory::new_message(&descriptor);
        msg.set("name", Value::String("Bob".into())).unwrap();
        msg.set("count", Value::I32(2)).unwrap();

        let codec = FakeCodec;
        let any = AnyValue::pack(&msg, &codec).unwrap();
        let unpacked = any.unpack_using(&registry, &codec).unwrap();
        assert_eq!(unpacked, msg);
    }

    #[test]
    fn unpack_using_unknown_type_fails() {
        let any = AnyValue::new("type.googleapis.com/nothing.Here", Vec::new()).unwrap();
        let registry = TypeRegistry::new();
        let codec = FakeCodec;
        assert!(matches!(
            any.unpack_using(&registry, &codec),
            Err(Error::ConversionFailed { .. })
        ));
    }

    #[test]
    fn handler_round_trip_moves_type_url_and_bytes() {
        let handler = AnyHandler;
        let value = SpecializedValue::Any(
            AnyValue::new("type.googleapis.com/a.b.C", vec![1, 2, 3]).unwrap(),
        );
        let msg = handler.create_dynamic(&value).unwrap();
        assert_eq!(handler.create_specialized(&msg).unwrap(), value);
    }
}
