//! The `google.protobuf.Struct` and `google.protobuf.Value` well-known
//! types.
//!
//! This core's wire representation deviates from upstream protobuf's
//! actual `Struct`/`Value` encoding: rather than recursive `map<string,
//! Value>` and `oneof` fields, the structured payload is serialized to a
//! canonical JSON byte string carried in a single `bytes` field (`fields`
//! for `Struct`, `value_data` for `Value`). This is a deliberate
//! simplification that still satisfies the same host-value interchange
//! contract.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use crate::dynamic::{DynamicMessage, MessageFactory, Value as DynValue};
use crate::error::{Error, Result};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const STRUCT_TYPE_NAME: &str = "google.protobuf.Struct";
pub const VALUE_TYPE_NAME: &str = "google.protobuf.Value";

/// A JSON-like tagged value.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueValue {
    Null,
    Number(f64),
    String(String),
    Bool(bool),
    List(Vec<ValueValue>),
    Struct(StructValue),
}

/// A `String → ValueValue` mapping.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StructValue {
    pub fields: HashMap<String, ValueValue>,
}

impl StructValue {
    pub fn new() -> Self {
        StructValue::default()
    }
}

/// Converts a [`serde_json::Value`] into this core's [`ValueValue`]. Total:
/// every JSON shape has a corresponding `ValueValue` case.
pub fn host_to_value(host: &serde_json::Value) -> ValueValue {
    match host {
        serde_json::Value::Null => ValueValue::Null,
        serde_json::Value::Bool(b) => ValueValue::Bool(*b),
        serde_json::Value::Number(n) => ValueValue::Number(n.as_f64().unwrap_or(0.0)),
        serde_json::Value::String(s) => ValueValue::String(s.clone()),
        serde_json::Value::Array(items) => ValueValue::List(items.iter().map(host_to_value).collect()),
        serde_json::Value::Object(map) => ValueValue::Struct(StructValue {
            fields: map.iter().map(|(k, v)| (k.clone(), host_to_value(v))).collect(),
        }),
    }
}

/// The inverse of [`host_to_value`].
pub fn value_to_host(value: &ValueValue) -> serde_json::Value {
    match value {
        ValueValue::Null => serde_json::Value::Null,
        ValueValue::Number(n) => serde_json::Number::from_f64(*n)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueValue::String(s) => serde_json::Value::String(s.clone()),
        ValueValue::Bool(b) => serde_json::Value::Bool(*b),
        ValueValue::List(items) => serde_json::Value::Array(items.iter().map(value_to_host).collect()),
        ValueValue::Struct(s) => serde_json::Value::Object(
            s.fields.iter().map(|(k, v)| (k.clone(), value_to_host(v))).collect(),
        ),
    }
}

fn struct_descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/struct.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("Struct")
                    .field(FieldDescriptorBuilder::new("fields", 1, FieldType::Bytes)),
            )
            .build()
            .expect("well-known Struct descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

fn value_descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/struct.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("Value")
                    .field(FieldDescriptorBuilder::new("value_data", 1, FieldType::Bytes)),
            )
            .build()
            .expect("well-known Value descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// `serde_json::Number::from_f64` collapses NaN/±infinity to `None`, which
/// `value_to_host` then maps to `Null`. A `ValueValue::Number` carrying a
/// non-finite float would therefore silently change shape on a
/// create_dynamic/create_specialized round trip, so `validate` rejects it
/// up front.
fn all_numbers_finite(value: &ValueValue) -> bool {
    match value {
        ValueValue::Number(n) => n.is_finite(),
        ValueValue::List(items) => items.iter().all(all_numbers_finite),
        ValueValue::Struct(s) => s.fields.values().all(all_numbers_finite),
        ValueValue::Null | ValueValue::String(_) | ValueValue::Bool(_) => true,
    }
}

fn decode_json_bytes(type_name: &str, bytes: &[u8]) -> Result<serde_json::Value> {
    if bytes.is_empty() {
        return Ok(serde_json::Value::Null);
    }
    serde_json::from_slice(bytes).map_err(|err| Error::ConversionFailed {
        from: "bytes".to_string(),
        to: type_name.to_string(),
        reason: err.to_string(),
    })
}

/// Handler for `google.protobuf.Struct`.
#[derive(Debug, Default, Clone, Copy)]
pub struct StructHandler;

impl WellKnownTypeHandler for StructHandler {
    fn handled_type_name(&self) -> &'static str {
        STRUCT_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Important
    }

    fn create_specialized(&self, msg: &DynamicMessage) -> Result<SpecializedValue> {
        if msg.descriptor().full_name() != STRUCT_TYPE_NAME {
            return Err(Error::InvalidData {
                type_name: STRUCT_TYPE_NAME.to_string(),
                reason: format!(
                    "expected a `{}` message, got `{}`",
                    STRUCT_TYPE_NAME,
                    msg.descriptor().full_name()
                ),
            });
        }
        let bytes = msg.get("fields")?.and_then(|v| v.as_bytes().cloned()).unwrap_or_default();
        let host = decode_json_bytes(STRUCT_TYPE_NAME, &bytes)?;
        let fields = match host {
            serde_json::Value::Null => HashMap::new(),
            serde_json::Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), host_to_value(v))).collect(),
            other => {
                return Err(Error::ConversionFailed {
                    from: "bytes".to_string(),
                    to: STRUCT_TYPE_NAME.to_string(),
                    reason: format!("expected a JSON object, got {other}"),
                })
            }
        };
        Ok(SpecializedValue::Struct(StructValue { fields }))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::Struct(struct_value) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: STRUCT_TYPE_NAME.to_string(),
                reason: "expected a Struct specialized value".to_string(),
            });
        };
        let host = serde_json::Value::Object(
            struct_value
                .fields
                .iter()
                .map(|(k, v)| (k.clone(), value_to_host(v)))
                .collect(),
        );
        let bytes = serde_json::to_vec(&host).expect("serde_json::Value always serializes");
        let mut msg = MessageFactory::new_message(struct_descriptor());
        msg.set("fields", DynValue::Bytes(bytes.into()))?;
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        matches!(value, SpecializedValue::Struct(s) if s.fields.values().all(all_numbers_finite))
    }
}

/// Handler for `google.protobuf.Value`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ValueHandler;

impl WellKnownTypeHandler for ValueHandler {
    fn handled_type_name(&self) -> &'static str {
        VALUE_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Important
    }

    fn create_specialized(&self, msg: &DynamicMessage) -> Result<SpecializedValue> {
        if msg.descriptor().full_name() != VALUE_TYPE_NAME {
            return Err(Error::InvalidData {
                type_name: VALUE_TYPE_NAME.to_string(),
                reason: format!(
                    "expected a `{}` message, got `{}`",
                    VALUE_TYPE_NAME,
                    msg.descriptor().full_name()
                ),
            });
        }
        let bytes = msg
            .get("value_data")?
            .and_then(|v| v.as_bytes().cloned())
            .unwrap_or_default();
        let host = decode_json_bytes(VALUE_TYPE_NAME, &bytes)?;
        Ok(SpecializedValue::Value(host_to_value(&host)))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::Value(value_value) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: VALUE_TYPE_NAME.to_string(),
                reason: "expected a Value specialized value".to_string(),
            });
        };
        let host = value_to_host(value_value);
        let bytes = serde_json::to_vec(&host).expect("serde_json::Value always serializes");
        let mut msg = MessageFactory::new_message(value_descriptor());
        msg.set("value_data", DynValue::Bytes(bytes.into()))?;
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        matches!(value, SpecializedValue::Value(v) if all_numbers_finite(v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn struct_round_trip_via_handler() {
        let handler = StructHandler;
        let mut fields = HashMap::new();
        fields.insert("name".to_string(), ValueValue::String("Alice".to_string()));
        fields.insert(
            "scores".to_string(),
            ValueValue::List(vec![ValueValue::Number(95.5), ValueValue::Number(87.2)]),
        );
        let value = SpecializedValue::Struct(StructValue { fields });
        let msg = handler.create_dynamic(&value).unwrap();
        assert_eq!(handler.create_specialized(&msg).unwrap(), value);
    }

    #[test]
    fn nested_struct_round_trips() {
        let mut inner = HashMap::new();
        inner.insert("name".to_string(), ValueValue::String("Alice".to_string()));
        inner.insert(
            "scores".to_string(),
            ValueValue::List(vec![ValueValue::Number(95.5), ValueValue::Number(87.2)]),
        );
        let mut outer = HashMap::new();
        outer.insert("user".to_string(), ValueValue::Struct(StructValue { fields: inner }));
        let value = SpecializedValue::Struct(StructValue { fields: outer });

        let handler = StructHandler;
        let msg = handler.create_dynamic(&value).unwrap();
        assert_eq!(handler.create_specialized(&msg).unwrap(), value);
    }

    #[test]
    fn empty_payload_is_empty_struct() {
        let msg = MessageFactory::new_message(struct_descriptor());
        let handler = StructHandler;
        assert_eq!(
            handler.create_specialized(&msg).unwrap(),
            SpecializedValue::Struct(StructValue::new())
        );
    }

    #[test]
    fn value_null_round_trips() {
        let handler = ValueHandler;
        let value = SpecializedValue::Value(ValueValue::Null);
        let msg = handler.create_dynamic(&value).unwrap();
        assert_eq!(handler.create_specialized(&msg).unwrap(), value);
    }

    #[test]
    fn non_finite_number_fails_validation() {
        let handler = ValueHandler;
        assert!(!handler.validate(&SpecializedValue::Value(ValueValue::Number(f64::NAN))));
        assert!(!handler.validate(&SpecializedValue::Value(ValueValue::Number(f64::INFINITY))));
        assert!(!handler.validate(&SpecializedValue::Value(ValueValue::Number(f64::NEG_INFINITY))));
        assert!(handler.validate(&SpecializedValue::Value(ValueValue::Number(1.5))));

        let struct_handler = StructHandler;
        let mut fields = HashMap::new();
        fields.insert("x".to_string(), ValueValue::Number(f64::NAN));
        assert!(!struct_handler.validate(&SpecializedValue::Struct(StructValue { fields })));
    }

    #[test]
    fn malformed_json_fails_with_conversion_failed() {
        let mut msg = MessageFactory::new_message(struct_descriptor());
        msg.set("fields", DynValue::Bytes(bytes::Bytes::from_static(b"{not json"))).unwrap();
        let handler = StructHandler;
        assert!(matches!(
            handler.create_specialized(&msg),
            Err(Error::ConversionFailed { .. })
        ));
    }
}
