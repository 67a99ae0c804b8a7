//! The `google.protobuf.Empty` well-known type.

use std::sync::OnceLock;

use crate::descriptor::{FileDescriptorBuilder, MessageDescriptor, MessageDescriptorBuilder};
use crate::dynamic::{DynamicMessage, MessageFactory};
use crate::error::{Error, Result};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const HANDLED_TYPE_NAME: &str = "google.protobuf.Empty";

/// The unit value: all instances are equal. Conversion to/from
/// [`DynamicMessage`] is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EmptyValue;

fn descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/empty.proto")
            .package("google.protobuf")
            .message(MessageDescriptorBuilder::new("Empty"))
            .build()
            .expect("well-known Empty descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// Handler for `google.protobuf.Empty`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyHandler;

impl WellKnownTypeHandler for EmptyHandler {
    fn handled_type_name(&self) -> &'static str {
        HANDLED_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Advanced
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
        Ok(SpecializedValue::Empty(EmptyValue))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        match value {
            SpecializedValue::Empty(EmptyValue) => Ok(MessageFactory::new_message(descriptor())),
            other => Err(Error::ConversionFailed {
                from: format!("{other:?}"),
                to: HANDLED_TYPE_NAME.to_string(),
                reason: "expected an Empty specialized value".to_string(),
            }),
        }
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        matches!(value, SpecializedValue::Empty(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_total() {
        let handler = EmptyHandler;
        let value = SpecializedValue::Empty(EmptyValue);
        let msg = handler.create_dynamic(&value).unwrap();
        assert_eq!(handler.create_specialized(&msg).unwrap(), value);
    }

    #[test]
    fn all_instances_are_equal() {
        assert_eq!(EmptyValue, EmptyValue::default());
    }
}
