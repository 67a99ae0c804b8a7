//! Builders for the descriptor model.
//!
//! Each descriptor kind has a builder that accepts name, package, and
//! sub-descriptor insertion in any order and is consumed by `build()`,
//! which validates that field names and numbers are unique within a
//! message and computes every `full_name` before producing an immutable
//! descriptor. The descriptor is frozen once `register_file` returns.

use crate::error::{Error, Result};

use super::{
    join_full_name, EnumDescriptor, EnumValueDescriptor, FieldDescriptor, FieldType,
    FileDescriptor, MessageDescriptor, MethodDescriptor, ServiceDescriptor,
};

/// Builds a [`FieldDescriptor`].
#[derive(Debug, Clone)]
pub struct FieldDescriptorBuilder {
    name: String,
    number: u32,
    field_type: FieldType,
    type_name: Option<String>,
    is_repeated: bool,
    is_map: bool,
    map_key_type: Option<FieldType>,
}

impl FieldDescriptorBuilder {
    pub fn new(name: impl Into<String>, number: u32, field_type: FieldType) -> Self {
        FieldDescriptorBuilder {
            name: name.into(),
            number,
            field_type,
            type_name: None,
            is_repeated: false,
            is_map: false,
            map_key_type: None,
        }
    }

    /// Sets the fully qualified target type for `message`/`enum`/`group`
    /// fields.
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    pub fn repeated(mut self) -> Self {
        self.is_repeated = true;
        self
    }

    /// Marks this field as a map with the given key type. Map fields are
    /// repeated by construction (`repeated <synthetic entry>`).
    pub fn map(mut self, key_type: FieldType) -> Self {
        self.is_map = true;
        self.is_repeated = true;
        self.map_key_type = Some(key_type);
        self
    }

    pub(crate) fn build(self) -> Result<FieldDescriptor> {
        if self.number == 0 {
            return Err(Error::InvalidData {
                type_name: self.name.clone(),
                reason: "field numbers must be positive".into(),
            });
        }
        if self.field_type.needs_type_name() && self.type_name.is_none() {
            return Err(Error::InvalidData {
                type_name: self.name.clone(),
                reason: format!(
                    "a `{}` field requires a type_name",
                    self.field_type
                ),
            });
        }
        Ok(FieldDescriptor::new(
            self.name,
            self.number,
            self.field_type,
            self.type_name,
            self.is_repeated,
            self.is_map,
            self.map_key_type,
        ))
    }
}

/// Builds a [`MessageDescriptor`], possibly with nested messages/enums.
#[derive(Debug, Clone)]
pub struct MessageDescriptorBuilder {
    name: String,
    fields: Vec<FieldDescriptorBuilder>,
    nested_messages: Vec<MessageDescriptorBuilder>,
    nested_enums: Vec<EnumDescriptorBuilder>,
}

impl MessageDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        MessageDescriptorBuilder {
            name: name.into(),
            fields: Vec::new(),
            nested_messages: Vec::new(),
            nested_enums: Vec::new(),
        }
    }

    pub fn field(mut self, field: FieldDescriptorBuilder) -> Self {
        self.fields.push(field);
        self
    }

    pub fn nested_message(mut self, message: MessageDescriptorBuilder) -> Self {
        self.nested_messages.push(message);
        self
    }

    pub fn nested_enum(mut self, enum_: EnumDescriptorBuilder) -> Self {
        self.nested_enums.push(enum_);
        self
    }

    pub(crate) fn build(self, scope: &str, parent: &str) -> Result<MessageDescriptor> {
        let full_name = join_full_name(scope, &self.name);
        let fields = self
            .fields
            .into_iter()
            .map(FieldDescriptorBuilder::build)
            .collect::<Result<Vec<_>>>()?;
        let nested_messages = self
            .nested_messages
            .into_iter()
            .map(|m| m.build(&full_name, &full_name))
            .collect::<Result<Vec<_>>>()?;
        let nested_enums = self
            .nested_enums
            .into_iter()
            .map(|e| e.build(&full_name))
            .collect::<Vec<_>>();
        MessageDescriptor::new(
            self.name,
            full_name,
            Some(parent.to_string()),
            fields,
            nested_messages,
            nested_enums,
        )
    }
}

/// Builds an [`EnumDescriptor`].
#[derive(Debug, Clone)]
pub struct EnumDescriptorBuilder {
    name: String,
    values: Vec<(String, i32)>,
}

impl EnumDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        EnumDescriptorBuilder {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn value(mut self, name: impl Into<String>, number: i32) -> Self {
        self.values.push((name.into(), number));
        self
    }

    pub(crate) fn build(self, scope: &str) -> EnumDescriptor {
        let full_name = join_full_name(scope, &self.name);
        let values = self
            .values
            .into_iter()
            .map(|(name, number)| (name, EnumValueDescriptor::new(number)))
            .collect();
        EnumDescriptor::new(self.name, full_name, values)
    }
}

/// Builds a [`MethodDescriptor`].
#[derive(Debug, Clone)]
pub struct MethodDescriptorBuilder {
    name: String,
    input_type: String,
    output_type: String,
    client_streaming: bool,
    server_streaming: bool,
}

impl MethodDescriptorBuilder {
    pub fn new(
        name: impl Into<String>,
        input_type: impl Into<String>,
        output_type: impl Into<String>,
    ) -> Self {
        MethodDescriptorBuilder {
            name: name.into(),
            input_type: input_type.into(),
            output_type: output_type.into(),
            client_streaming: false,
            server_streaming: false,
        }
    }

    pub fn client_streaming(mut self) -> Self {
        self.client_streaming = true;
        self
    }

    pub fn server_streaming(mut self) -> Self {
        self.server_streaming = true;
        self
    }

    pub(crate) fn build(self, scope: &str) -> MethodDescriptor {
        let full_name = join_full_name(scope, &self.name);
        MethodDescriptor::new(
            self.name,
            full_name,
            self.input_type,
            self.output_type,
            self.client_streaming,
            self.server_streaming,
        )
    }
}

/// Builds a [`ServiceDescriptor`].
#[derive(Debug, Clone)]
pub struct ServiceDescriptorBuilder {
    name: String,
    methods: Vec<MethodDescriptorBuilder>,
}

impl ServiceDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        ServiceDescriptorBuilder {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn method(mut self, method: MethodDescriptorBuilder) -> Self {
        self.methods.push(method);
        self
    }

    pub(crate) fn build(self, scope: &str) -> ServiceDescriptor {
        let full_name = join_full_name(scope, &self.name);
        let methods = self
            .methods
            .into_iter()
            .map(|m| m.build(&full_name))
            .collect();
        ServiceDescriptor::new(self.name, full_name, methods)
    }
}

/// Builds a [`FileDescriptor`].
#[derive(Debug, Clone)]
pub struct FileDescriptorBuilder {
    name: String,
    package: String,
    messages: Vec<MessageDescriptorBuilder>,
    enums: Vec<EnumDescriptorBuilder>,
    services: Vec<ServiceDescriptorBuilder>,
}

impl FileDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        FileDescriptorBuilder {
            name: name.into(),
            package: String::new(),
            messages: Vec::new(),
            enums: Vec::new(),
            services: Vec::new(),
        }
    }

    pub fn package(mut self, package: impl Into<String>) -> Self {
        self.package = package.into();
        self
    }

    pub fn message(mut self, message: MessageDescriptorBuilder) -> Self {
        self.messages.push(message);
        self
    }

    pub fn enum_type(mut self, enum_: EnumDescriptorBuilder) -> Self {
        self.enums.push(enum_);
        self
    }

    pub fn service(mut self, service: ServiceDescriptorBuilder) -> Self {
        self.services.push(service);
        self
    }

    pub fn build(self) -> Result<FileDescriptor> {
        let messages = self
            .messages
            .into_iter()
            .map(|m| m.build(&self.package, &self.name))
            .collect::<Result<Vec<_>>>()?;
        let enums = self
            .enums
            .into_iter()
            .map(|e| e.build(&self.package))
            .collect::<Vec<_>>();
        let services = self
            .services
            .into_iter()
            .map(|s| s.build(&self.package))
            .collect::<Vec<_>>();
        Ok(FileDescriptor::new(
            self.name,
            self.package,
            messages,
            enums,
            services,
        ))
    }
}
