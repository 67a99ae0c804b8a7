//! The `google.protobuf.FieldMask` well-known type.

use std::sync::OnceLock;

use crate::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use crate::dynamic::{DynamicMessage, MessageFactory, Value};
use crate::error::{Error, Result};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const HANDLED_TYPE_NAME: &str = "google.protobuf.FieldMask";

/// An ordered, deduplicated-on-insert set of field paths.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldMaskValue {
    paths: Vec<String>,
}

/// A path segment is `[A-Za-z_][A-Za-z0-9_]*`; a path is one or more
/// segments joined by `.`.
fn is_valid_path(path: &str) -> bool {
    if path.is_empty() {
        return false;
    }
    path.split('.').all(|segment| {
        let mut chars = segment.chars();
        match chars.next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return false,
        }
        chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

impl FieldMaskValue {
    pub fn new() -> Self {
        FieldMaskValue::default()
    }

    pub fn from_paths(paths: impl IntoIterator<Item = String>) -> Result<Self> {
        let mut mask = FieldMaskValue::new();
        for path in paths {
            mask.add(path)?;
        }
        Ok(mask)
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    /// Exact membership.
    pub fn contains(&self, path: &str) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    /// True iff `path` equals a stored path, or a stored path is a
    /// dot-prefix ancestor of `path` (storing `"user"` covers
    /// `"user.name"`, but storing `"user.name"` does not cover `"user"`).
    pub fn covers(&self, path: &str) -> bool {
        self.paths.iter().any(|stored| {
            stored == path
                || (path.len() > stored.len()
                    && path.starts_with(stored.as_str())
                    && path.as_bytes()[stored.len()] == b'.')
        })
    }

    /// Adds `path`, failing with [`Error::InvalidData`] if it does not
    /// satisfy the path grammar. A duplicate add is a no-op.
    pub fn add(&mut self, path: impl Into<String>) -> Result<()> {
        let path = path.into();
        if !is_valid_path(&path) {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: format!("`{path}` is not a valid field-mask path"),
            });
        }
        if !self.paths.contains(&path) {
            self.paths.push(path);
        }
        Ok(())
    }

    /// Removes `path` if present. A no-op if it is not a member.
    pub fn remove(&mut self, path: &str) {
        self.paths.retain(|p| p != path);
    }

    /// The set union, order of first appearance, deduplicated.
    pub fn union(&self, other: &FieldMaskValue) -> FieldMaskValue {
        let mut out = self.clone();
        for path in &other.paths {
            if !out.paths.contains(path) {
                out.paths.push(path.clone());
            }
        }
        out
    }

    /// The set intersection, in `self`'s order.
    pub fn intersection(&self, other: &FieldMaskValue) -> FieldMaskValue {
        FieldMaskValue {
            paths: self
                .paths
                .iter()
                .filter(|p| other.paths.contains(p))
                .cloned()
                .collect(),
        }
    }
}

fn descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/field_mask.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("FieldMask").field(
                    FieldDescriptorBuilder::new("paths", 1, FieldType::String).repeated(),
                ),
            )
            .build()
            .expect("well-known FieldMask descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// Handler for `google.protobuf.FieldMask`.
#[derive(Debug, Default, Clone, Copy)]
pub struct FieldMaskHandler;

impl WellKnownTypeHandler for FieldMaskHandler {
    fn handled_type_name(&self) -> &'static str {
        HANDLED_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Important
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
        let raw_paths = msg
            .get("paths")?
            .and_then(|v| v.as_list().map(<[Value]>::to_vec))
            .unwrap_or_default();
        let mut mask = FieldMaskValue::new();
        for path in raw_paths {
            let path = path.as_str().ok_or_else(|| Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: "paths must be strings".to_string(),
            })?;
            mask.add(path.to_string())?;
        }
        Ok(SpecializedValue::FieldMask(mask))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::FieldMask(mask) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: HANDLED_TYPE_NAME.to_string(),
                reason: "expected a FieldMask specialized value".to_string(),
            });
        };
        let mut msg = MessageFactory::new_message(descriptor());
        for path in &mask.paths {
            msg.append("paths", Value::String(path.clone()))?;
        }
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        match value {
            SpecializedValue::FieldMask(mask) => mask.paths.iter().all(|p| is_valid_path(p)),
            _ => false,
        }
    }
}
