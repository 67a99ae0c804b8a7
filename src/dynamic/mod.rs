//! The dynamic message value store: `(descriptor, values)` with full
//! field-type validation on every mutation.
//!
//! `Value`/`MapKey` follow the shape of `prost-reflect`'s own
//! `DynamicValue`/`MapKey` enums, extended here with the `set`/`append`/`put`
//! mutation surface and the integer-widening coercion rules those enums
//! never needed, since `prost-reflect` only constructs values while
//! decoding and never validates an arbitrary caller-supplied value against
//! a field's declared type.

pub mod factory;
mod message;

use std::collections::BTreeMap;

use bytes::Bytes;

pub use factory::MessageFactory;
pub use message::DynamicMessage;

use crate::descriptor::{FieldDescriptor, FieldType};

/// A dynamically-typed protobuf field value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    String(String),
    Bytes(Bytes),
    EnumNumber(i32),
    Message(DynamicMessage),
    List(Vec<Value>),
    Map(BTreeMap<MapKey, Value>),
}

/// A dynamically-typed protobuf map key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MapKey {
    Bool(bool),
    I32(i32),
    I64(i64),
    U32(u32),
    U64(u64),
    String(String),
}

impl Value {
    /// The proto3 zero value for a non-message, non-repeated, non-map
    /// field of the given type.
    pub fn zero_value(field_type: FieldType) -> Value {
        match field_type {
            FieldType::Double => Value::F64(0.0),
            FieldType::Float => Value::F32(0.0),
            FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32 => Value::I32(0),
            FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64 => Value::I64(0),
            FieldType::UInt32 | FieldType::Fixed32 => Value::U32(0),
            FieldType::UInt64 | FieldType::Fixed64 => Value::U64(0),
            FieldType::Bool => Value::Bool(false),
            FieldType::String => Value::String(String::new()),
            FieldType::Bytes => Value::Bytes(Bytes::new()),
            FieldType::Enum => Value::EnumNumber(0),
            FieldType::Message | FieldType::Group => {
                unreachable!("message/group fields have no zero value; presence is nil/absent")
            }
        }
    }

    /// The default value for `field`: an empty list/map for
    /// repeated/map fields, otherwise [`Value::zero_value`] (or, for
    /// message fields, a fresh nested message).
    pub fn default_for_field(field: &FieldDescriptor, nested: Option<DynamicMessage>) -> Value {
        if field.is_map() {
            Value::Map(BTreeMap::new())
        } else if field.is_repeated() {
            Value::List(Vec::new())
        } else if let Some(nested) = nested {
            Value::Message(nested)
        } else {
            Value::zero_value(field.field_type())
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match *self {
            Value::I32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::I64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match *self {
            Value::U32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            Value::U64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f32(&self) -> Option<f32> {
        match *self {
            Value::F32(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::F64(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_enum_number(&self) -> Option<i32> {
        match *self {
            Value::EnumNumber(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&Bytes> {
        match self {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_message(&self) -> Option<&DynamicMessage> {
        match self {
            Value::Message(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Value::List(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&BTreeMap<MapKey, Value>> {
        match self {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }

    /// A short, human-readable name of this value's runtime shape, used in
    /// `TypeMismatch` error messages.
    pub(crate) fn kind_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::U32(_) => "u32",
            Value::U64(_) => "u64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::EnumNumber(_) => "enum",
            Value::Message(_) => "message",
            Value::List(_) => "list",
            Value::Map(_) => "map",
        }
    }
}
