//! Creates new, empty [`DynamicMessage`]s bound to a descriptor.

use crate::descriptor::MessageDescriptor;

use super::DynamicMessage;

/// Pure factory for empty dynamic messages: all singular fields absent,
/// repeated/map fields empty. Does not touch a [`crate::registry::TypeRegistry`].
pub struct MessageFactory;

impl MessageFactory {
    /// Creates a new, zero-valued [`DynamicMessage`] for `descriptor`.
    pub fn new_message(descriptor: &MessageDescriptor) -> DynamicMessage {
        DynamicMessage::new(descriptor.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptorBuilder};

    #[test]
    fn factory_produces_empty_message() {
        let file = FileDescriptorBuilder::new("factory.proto")
            .package("test.package")
            .message(
                MessageDescriptorBuilder::new("Widget")
                    .field(FieldDescriptorBuilder::new("id", 1, FieldType::Int64)),
            )
            .build()
            .unwrap();
        let descriptor = &file.messages()[0];

        let msg = MessageFactory::new_message(descriptor);
        assert!(!msg.has_value("id").unwrap());
        assert_eq!(msg.get("id").unwrap(), Some(crate::dynamic::Value::I64(0)));
    }
}
