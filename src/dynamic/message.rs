use std::collections::{BTreeMap, HashMap};

use crate::descriptor::{FieldDescriptor, FieldType, MessageDescriptor};
use crate::error::{Error, Result};

use super::{MapKey, Value};

/// A message instance bound to a [`MessageDescriptor`], whose fields are
/// read and written by name at runtime.
///
/// Storage is a `HashMap<String, Value>` keyed by field name; a missing key
/// *is* the "absent" cell. [`DynamicMessage::get`] reconstructs the proto3
/// zero value for singular scalar fields, and `None`/empty collections for
/// everything else, rather than storing an explicit presence bitset
/// alongside the value.
#[derive(Debug, Clone, PartialEq)]
pub struct DynamicMessage {
    descriptor: MessageDescriptor,
    values: HashMap<String, Value>,
    frozen: bool,
}

impl DynamicMessage {
    /// Creates a new, empty message bound to `descriptor`. All singular
    /// fields are absent; repeated and map fields read back as empty.
    ///
    /// This is the operation [`crate::dynamic::MessageFactory`] exposes
    /// publicly; it is also used internally wherever a fresh message of a
    /// known descriptor is needed (e.g. well-known-type handlers building
    /// their dynamic representation).
    pub fn new(descriptor: MessageDescriptor) -> Self {
        DynamicMessage {
            descriptor,
            values: HashMap::new(),
            frozen: false,
        }
    }

    pub fn descriptor(&self) -> &MessageDescriptor {
        &self.descriptor
    }

    fn field(&self, field_name: &str) -> Result<&FieldDescriptor> {
        self.descriptor
            .field_by_name(field_name)
            .ok_or_else(|| Error::FieldNotFound(field_name.to_string()))
    }

    /// Returns the field's current value, or the proto3 zero value (for
    /// singular scalars) / empty collection (for repeated or map fields)
    /// when unset. Message-typed singular fields return `None` when unset,
    /// since presence for them is nil/absent rather than a reconstructible
    /// zero value.
    pub fn get(&self, field_name: &str) -> Result<Option<Value>> {
        let field = self.field(field_name)?;
        if let Some(value) = self.values.get(field_name) {
            return Ok(Some(value.clone()));
        }
        if field.is_map() {
            return Ok(Some(Value::Map(BTreeMap::new())));
        }
        if field.is_repeated() {
            return Ok(Some(Value::List(Vec::new())));
        }
        if field.field_type() == FieldType::Message || field.field_type() == FieldType::Group {
            return Ok(None);
        }
        Ok(Some(Value::zero_value(field.field_type())))
    }

    /// Whether `field_name` has been explicitly set (via `set`, `append`,
    /// or `put`) since the message was created or last cleared.
    pub fn has_value(&self, field_name: &str) -> Result<bool> {
        self.field(field_name)?;
        Ok(self.values.contains_key(field_name))
    }

    /// Replaces the entire value of `field_name`.
    ///
    /// Fails atomically: on any error the message is left unchanged.
    pub fn set(&mut self, field_name: &str, value: Value) -> Result<()> {
        let field = self.field(field_name)?.clone();
        if self.frozen {
            return Err(Error::Immutable);
        }
        let coerced = coerce_for_field(&field, value)?;
        self.values.insert(field_name.to_string(), coerced);
        Ok(())
    }

    /// Removes any value set for `field_name`, returning it to "absent".
    pub fn clear(&mut self, field_name: &str) -> Result<()> {
        self.field(field_name)?;
        if self.frozen {
            return Err(Error::Immutable);
        }
        self.values.remove(field_name);
        Ok(())
    }

    /// Appends `element` to a repeated field, validating it against the
    /// field's element type.
    pub fn append(&mut self, field_name: &str, element: Value) -> Result<()> {
        let field = self.field(field_name)?.clone();
        if self.frozen {
            return Err(Error::Immutable);
        }
        if !field.is_repeated() || field.is_map() {
            return Err(Error::TypeMismatch {
                field: field_name.to_string(),
                expected: "repeated field".into(),
                actual: "non-repeated or map field".into(),
            });
        }
        let coerced = coerce_scalar_like(&field, element)?;
        match self.values.entry(field_name.to_string()).or_insert_with(|| Value::List(Vec::new())) {
            Value::List(list) => {
                list.push(coerced);
                Ok(())
            }
            _ => unreachable!("repeated field storage is always a Value::List"),
        }
    }

    /// Inserts `(key, value)` into a map field, validating both against
    /// the field's declared key/value types.
    pub fn put(&mut self, field_name: &str, key: MapKey, value: Value) -> Result<()> {
        let field = self.field(field_name)?.clone();
        if self.frozen {
            return Err(Error::Immutable);
        }
        if !field.is_map() {
            return Err(Error::TypeMismatch {
                field: field_name.to_string(),
                expected: "map field".into(),
                actual: "non-map field".into(),
            });
        }
        let key_type = field
            .map_key_type()
            .expect("map fields always declare a key type");
        let coerced_key = coerce_map_key(key_type, key, &field)?;
        let coerced_value = coerce_scalar_like(&field, value)?;
        match self.values.entry(field_name.to_string()).or_insert_with(|| Value::Map(BTreeMap::new())) {
            Value::Map(map) => {
                map.insert(coerced_key, coerced_value);
                Ok(())
            }
            _ => unreachable!("map field storage is always a Value::Map"),
        }
    }

    /// Prevents further mutation of this message (`Immutable` on
    /// subsequent `set`/`clear`/`append`/`put`).
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }
}

/// Validates/coerces `value` against `field`'s declared type for a `set`
/// call (handles the repeated/map wrapper shapes itself).
fn coerce_for_field(field: &FieldDescriptor, value: Value) -> Result<Value> {
    if field.is_map() {
        let Value::Map(map) = value else {
            return Err(mismatch(field, "map", &value));
        };
        let key_type = field
            .map_key_type()
            .expect("map fields always declare a key type");
        let mut out = BTreeMap::new();
        for (k, v) in map {
            let k = coerce_map_key(key_type, k, field)?;
            let v = coerce_scalar_like(field, v)?;
            out.insert(k, v);
        }
        return Ok(Value::Map(out));
    }
    if field.is_repeated() {
        let Value::List(list) = value else {
            return Err(mismatch(field, "list", &value));
        };
        let mut out = Vec::with_capacity(list.len());
        for element in list {
            out.push(coerce_scalar_like(field, element)?);
        }
        return Ok(Value::List(out));
    }
    coerce_scalar_like(field, value)
}

/// Validates/coerces a single element/value against `field`'s *element*
/// type (i.e. ignoring the repeated/map wrapper, which the caller has
/// already stripped off).
fn coerce_scalar_like(field: &FieldDescriptor, value: Value) -> Result<Value> {
    match field.field_type() {
        FieldType::Message | FieldType::Group => match value {
            Value::Message(msg) => {
                let expected = field.type_name().unwrap_or_default();
                if msg.descriptor().full_name() != expected {
                    return Err(Error::TypeMismatch {
                        field: field.name().to_string(),
                        expected: expected.to_string(),
                        actual: msg.descriptor().full_name().to_string(),
                    });
                }
                Ok(Value::Message(msg))
            }
            other => Err(mismatch(field, "message", &other)),
        },
        FieldType::Enum => match value {
            Value::EnumNumber(n) => Ok(Value::EnumNumber(n)),
            Value::I32(n) => Ok(Value::EnumNumber(n)),
            Value::I64(n) => i32::try_from(n)
                .map(Value::EnumNumber)
                .map_err(|_| mismatch(field, "enum", &Value::I64(n))),
            other => Err(mismatch(field, "enum", &other)),
        },
        target => coerce_scalar(value, target).map_err(|actual| mismatch(field, &target.to_string(), &actual)),
    }
}

fn coerce_map_key(key_type: FieldType, key: MapKey, field: &FieldDescriptor) -> Result<MapKey> {
    let as_value = match key {
        MapKey::Bool(v) => Value::Bool(v),
        MapKey::I32(v) => Value::I32(v),
        MapKey::I64(v) => Value::I64(v),
        MapKey::U32(v) => Value::U32(v),
        MapKey::U64(v) => Value::U64(v),
        MapKey::String(v) => Value::String(v),
    };
    let coerced = coerce_scalar(as_value, key_type)
        .map_err(|actual| mismatch(field, &format!("{key_type} map key"), &actual))?;
    Ok(match coerced {
        Value::Bool(v) => MapKey::Bool(v),
        Value::I32(v) => MapKey::I32(v),
        Value::I64(v) => MapKey::I64(v),
        Value::U32(v) => MapKey::U32(v),
        Value::U64(v) => MapKey::U64(v),
        Value::String(v) => MapKey::String(v),
        _ => unreachable!("coerce_scalar only returns key-shaped values for key_type"),
    })
}

fn mismatch(field: &FieldDescriptor, expected: &str, actual: &Value) -> Error {
    Error::TypeMismatch {
        field: field.name().to_string(),
        expected: expected.to_string(),
        actual: actual.kind_name().to_string(),
    }
}

/// The scalar coercion table: widening integers of the same signedness, and
/// signed/unsigned conversion only when the value is in range. Returns the
/// original (uncoerced) value as the `Err` payload so the caller can report
/// it in a `TypeMismatch`.
fn coerce_scalar(value: Value, target: FieldType) -> std::result::Result<Value, Value> {
    match (target, value) {
        (FieldType::Bool, Value::Bool(v)) => Ok(Value::Bool(v)),
        (FieldType::String, Value::String(v)) => Ok(Value::String(v)),
        (FieldType::Bytes, Value::Bytes(v)) => Ok(Value::Bytes(v)),
        (FieldType::Double, Value::F64(v)) => Ok(Value::F64(v)),
        (FieldType::Double, Value::F32(v)) => Ok(Value::F64(v as f64)),
        (FieldType::Float, Value::F32(v)) => Ok(Value::F32(v)),

        (FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32, Value::I32(v)) => {
            Ok(Value::I32(v))
        }
        (FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64, Value::I64(v)) => {
            Ok(Value::I64(v))
        }
        // Widening: i32 -> i64 is always lossless for the same signedness.
        (FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64, Value::I32(v)) => {
            Ok(Value::I64(v as i64))
        }
        (FieldType::UInt32 | FieldType::Fixed32, Value::U32(v)) => Ok(Value::U32(v)),
        (FieldType::UInt64 | FieldType::Fixed64, Value::U64(v)) => Ok(Value::U64(v)),
        (FieldType::UInt64 | FieldType::Fixed64, Value::U32(v)) => Ok(Value::U64(v as u64)),

        // Signed -> unsigned: allowed only when the value is in range
        // (i.e. non-negative).
        (FieldType::UInt32 | FieldType::Fixed32, Value::I32(v)) if v >= 0 => {
            Ok(Value::U32(v as u32))
        }
        (FieldType::UInt64 | FieldType::Fixed64, Value::I64(v)) if v >= 0 => {
            Ok(Value::U64(v as u64))
        }
        (FieldType::UInt64 | FieldType::Fixed64, Value::I32(v)) if v >= 0 => {
            Ok(Value::U64(v as u64))
        }
        // Unsigned -> signed: allowed only when the value fits in the
        // target's range.
        (FieldType::Int32 | FieldType::SInt32 | FieldType::SFixed32, Value::U32(v))
            if v <= i32::MAX as u32 =>
        {
            Ok(Value::I32(v as i32))
        }
        (FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64, Value::U64(v))
            if v <= i64::MAX as u64 =>
        {
            Ok(Value::I64(v as i64))
        }
        (FieldType::Int64 | FieldType::SInt64 | FieldType::SFixed64, Value::U32(v)) => {
            Ok(Value::I64(v as i64))
        }

        (_, other) => Err(other),
    }
}
