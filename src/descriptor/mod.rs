//! Immutable schema records: files, messages, fields, enums, services, and
//! methods.
//!
//! Descriptors are built through the builders in [`builder`] and become
//! immutable once `build()` returns. Cross-message references (a field's
//! `type_name`, a method's `input_type`/`output_type`) are kept as plain
//! fully-qualified name strings rather than direct links to the referenced
//! descriptor, so that cyclic/self-referential message graphs never need an
//! owning reference cycle; resolution happens lazily through a
//! [`crate::registry::TypeRegistry`]. This mirrors the arena-by-index
//! approach of `prost-reflect`'s `DescriptorPool`, simplified to
//! string-keyed lookup since this crate never parses compiled
//! `FileDescriptorProto` bytes.

pub mod builder;

use std::collections::BTreeMap;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

pub use builder::{
    EnumDescriptorBuilder, FieldDescriptorBuilder, FileDescriptorBuilder, MessageDescriptorBuilder,
    MethodDescriptorBuilder, ServiceDescriptorBuilder,
};

/// The declared wire type of a message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Double,
    Float,
    Int32,
    Int64,
    UInt32,
    UInt64,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
    Message,
    Enum,
    Group,
}

impl FieldType {
    /// Whether this field type is a numeric scalar (the types that
    /// participate in the integer-widening coercion rules on `set`).
    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            FieldType::Int32
                | FieldType::Int64
                | FieldType::UInt32
                | FieldType::UInt64
                | FieldType::SInt32
                | FieldType::SInt64
                | FieldType::Fixed32
                | FieldType::Fixed64
                | FieldType::SFixed32
                | FieldType::SFixed64
        )
    }

    /// Whether this is a singular proto3 scalar (i.e. a field whose
    /// "unset" presence resolves to a zero value on `get`).
    pub fn has_zero_value(&self) -> bool {
        !matches!(self, FieldType::Message | FieldType::Group)
    }

    /// Whether this field type refers to another descriptor by name
    /// (`Message`, `Enum`, or `Group`).
    pub fn needs_type_name(&self) -> bool {
        matches!(self, FieldType::Message | FieldType::Enum | FieldType::Group)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FieldType::Double => "double",
            FieldType::Float => "float",
            FieldType::Int32 => "int32",
            FieldType::Int64 => "int64",
            FieldType::UInt32 => "uint32",
            FieldType::UInt64 => "uint64",
            FieldType::SInt32 => "sint32",
            FieldType::SInt64 => "sint64",
            FieldType::Fixed32 => "fixed32",
            FieldType::Fixed64 => "fixed64",
            FieldType::SFixed32 => "sfixed32",
            FieldType::SFixed64 => "sfixed64",
            FieldType::Bool => "bool",
            FieldType::String => "string",
            FieldType::Bytes => "bytes",
            FieldType::Message => "message",
            FieldType::Enum => "enum",
            FieldType::Group => "group",
        };
        f.write_str(name)
    }
}

/// A single field in a [`MessageDescriptor`].
#[derive(Clone, PartialEq, Eq)]
pub struct FieldDescriptor(Arc<FieldDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct FieldDescriptorInner {
    name: String,
    number: u32,
    field_type: FieldType,
    type_name: Option<String>,
    is_repeated: bool,
    is_map: bool,
    map_key_type: Option<FieldType>,
}

impl FieldDescriptor {
    pub(crate) fn new(
        name: String,
        number: u32,
        field_type: FieldType,
        type_name: Option<String>,
        is_repeated: bool,
        is_map: bool,
        map_key_type: Option<FieldType>,
    ) -> Self {
        FieldDescriptor(Arc::new(FieldDescriptorInner {
            name,
            number,
            field_type,
            type_name,
            is_repeated,
            is_map,
            map_key_type,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn number(&self) -> u32 {
        self.0.number
    }

    pub fn field_type(&self) -> FieldType {
        self.0.field_type
    }

    /// Fully qualified name of the referenced message/enum, for fields
    /// whose [`FieldType`] is `Message`, `Enum`, or `Group`.
    pub fn type_name(&self) -> Option<&str> {
        self.0.type_name.as_deref()
    }

    pub fn is_repeated(&self) -> bool {
        self.0.is_repeated
    }

    /// A map field is represented as `repeated <synthetic entry>`; this
    /// reports whether the field is a map as opposed to a plain repeated
    /// field.
    pub fn is_map(&self) -> bool {
        self.0.is_map
    }

    /// The key type of a map field. Only meaningful when [`is_map`] is
    /// `true`.
    pub fn map_key_type(&self) -> Option<FieldType> {
        self.0.map_key_type
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.0.name)
            .field("number", &self.0.number)
            .field("field_type", &self.0.field_type)
            .finish()
    }
}

/// A protobuf message definition.
#[derive(Clone, PartialEq, Eq)]
pub struct MessageDescriptor(Arc<MessageDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct MessageDescriptorInner {
    name: String,
    full_name: String,
    parent: Option<String>,
    fields: Vec<FieldDescriptor>,
    fields_by_name: HashMap<String, usize>,
    fields_by_number: BTreeMap<u32, usize>,
    nested_messages: Vec<MessageDescriptor>,
    nested_enums: Vec<EnumDescriptor>,
}

impl MessageDescriptor {
    pub(crate) fn new(
        name: String,
        full_name: String,
        parent: Option<String>,
        fields: Vec<FieldDescriptor>,
        nested_messages: Vec<MessageDescriptor>,
        nested_enums: Vec<EnumDescriptor>,
    ) -> crate::error::Result<Self> {
        let mut fields_by_name = HashMap::with_capacity(fields.len());
        let mut fields_by_number = BTreeMap::new();
        for (i, field) in fields.iter().enumerate() {
            if fields_by_name.insert(field.name().to_string(), i).is_some() {
                return Err(crate::error::Error::DuplicateName(format!(
                    "{full_name}.{}",
                    field.name()
                )));
            }
            if fields_by_number.insert(field.number(), i).is_some() {
                return Err(crate::error::Error::DuplicateName(format!(
                    "{full_name}#{}",
                    field.number()
                )));
            }
        }
        Ok(MessageDescriptor(Arc::new(MessageDescriptorInner {
            name,
            full_name,
            parent,
            fields,
            fields_by_name,
            fields_by_number,
            nested_messages,
            nested_enums,
        })))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    /// The fully qualified name of the enclosing file or message, if any.
    pub fn parent(&self) -> Option<&str> {
        self.0.parent.as_deref()
    }

    /// Fields ordered by ascending field number, matching wire order.
    pub fn fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.0.fields_by_number.values().map(move |&i| &self.0.fields[i])
    }

    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.0
            .fields_by_name
            .get(name)
            .map(|&i| &self.0.fields[i])
    }

    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.0.fields_by_number.get(&number).map(|&i| &self.0.fields[i])
    }

    pub fn nested_messages(&self) -> &[MessageDescriptor] {
        &self.0.nested_messages
    }

    pub fn nested_enums(&self) -> &[EnumDescriptor] {
        &self.0.nested_enums
    }
}

impl fmt::Debug for MessageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MessageDescriptor")
            .field("full_name", &self.0.full_name)
            .field("fields", &self.0.fields.len())
            .finish()
    }
}

/// A single named value in an [`EnumDescriptor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnumValueDescriptor {
    number: i32,
}

impl EnumValueDescriptor {
    pub(crate) fn new(number: i32) -> Self {
        EnumValueDescriptor { number }
    }

    pub fn number(&self) -> i32 {
        self.number
    }
}

/// A protobuf enum type.
#[derive(Clone, PartialEq, Eq)]
pub struct EnumDescriptor(Arc<EnumDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct EnumDescriptorInner {
    name: String,
    full_name: String,
    values: Vec<(String, EnumValueDescriptor)>,
}

impl EnumDescriptor {
    pub(crate) fn new(
        name: String,
        full_name: String,
        values: Vec<(String, EnumValueDescriptor)>,
    ) -> Self {
        EnumDescriptor(Arc::new(EnumDescriptorInner {
            name,
            full_name,
            values,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn values(&self) -> impl Iterator<Item = (&str, EnumValueDescriptor)> {
        self.0.values.iter().map(|(name, v)| (name.as_str(), *v))
    }

    pub fn value_by_name(&self, name: &str) -> Option<EnumValueDescriptor> {
        self.0
            .values
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| *v)
    }

    pub fn value_by_number(&self, number: i32) -> Option<&str> {
        self.0
            .values
            .iter()
            .find(|(_, v)| v.number == number)
            .map(|(n, _)| n.as_str())
    }
}

impl fmt::Debug for EnumDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnumDescriptor")
            .field("full_name", &self.0.full_name)
            .finish()
    }
}

/// A single RPC method on a [`ServiceDescriptor`].
#[derive(Clone, PartialEq, Eq)]
pub struct MethodDescriptor(Arc<MethodDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct MethodDescriptorInner {
    name: String,
    full_name: String,
    input_type: String,
    output_type: String,
    client_streaming: bool,
    server_streaming: bool,
}

impl MethodDescriptor {
    pub(crate) fn new(
        name: String,
        full_name: String,
        input_type: String,
        output_type: String,
        client_streaming: bool,
        server_streaming: bool,
    ) -> Self {
        MethodDescriptor(Arc::new(MethodDescriptorInner {
            name,
            full_name,
            input_type,
            output_type,
            client_streaming,
            server_streaming,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn input_type(&self) -> &str {
        &self.0.input_type
    }

    pub fn output_type(&self) -> &str {
        &self.0.output_type
    }

    pub fn client_streaming(&self) -> bool {
        self.0.client_streaming
    }

    pub fn server_streaming(&self) -> bool {
        self.0.server_streaming
    }
}

impl fmt::Debug for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("full_name", &self.0.full_name)
            .finish()
    }
}

/// A protobuf service definition.
#[derive(Clone, PartialEq, Eq)]
pub struct ServiceDescriptor(Arc<ServiceDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct ServiceDescriptorInner {
    name: String,
    full_name: String,
    methods: Vec<MethodDescriptor>,
}

impl ServiceDescriptor {
    pub(crate) fn new(name: String, full_name: String, methods: Vec<MethodDescriptor>) -> Self {
        ServiceDescriptor(Arc::new(ServiceDescriptorInner {
            name,
            full_name,
            methods,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn full_name(&self) -> &str {
        &self.0.full_name
    }

    pub fn methods(&self) -> &[MethodDescriptor] {
        &self.0.methods
    }

    pub fn method_by_name(&self, name: &str) -> Option<&MethodDescriptor> {
        self.0.methods.iter().find(|m| m.name() == name)
    }
}

impl fmt::Debug for ServiceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceDescriptor")
            .field("full_name", &self.0.full_name)
            .finish()
    }
}

/// A single `.proto` file's worth of descriptors: identity `(name,
/// package)`, owning ordered sets of messages, enums, and services.
#[derive(Clone, PartialEq, Eq)]
pub struct FileDescriptor(Arc<FileDescriptorInner>);

#[derive(Debug, PartialEq, Eq)]
struct FileDescriptorInner {
    name: String,
    package: String,
    messages: Vec<MessageDescriptor>,
    enums: Vec<EnumDescriptor>,
    services: Vec<ServiceDescriptor>,
}

impl FileDescriptor {
    pub(crate) fn new(
        name: String,
        package: String,
        messages: Vec<MessageDescriptor>,
        enums: Vec<EnumDescriptor>,
        services: Vec<ServiceDescriptor>,
    ) -> Self {
        FileDescriptor(Arc::new(FileDescriptorInner {
            name,
            package,
            messages,
            enums,
            services,
        }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }

    pub fn package(&self) -> &str {
        &self.0.package
    }

    pub fn messages(&self) -> &[MessageDescriptor] {
        &self.0.messages
    }

    pub fn enums(&self) -> &[EnumDescriptor] {
        &self.0.enums
    }

    pub fn services(&self) -> &[ServiceDescriptor] {
        &self.0.services
    }

    /// All messages and enums transitively nested within this file,
    /// including top-level ones, used by [`crate::registry::TypeRegistry`]
    /// to index every descriptor under its fully qualified name.
    pub(crate) fn all_messages(&self) -> Vec<MessageDescriptor> {
        let mut out = Vec::new();
        for m in &self.0.messages {
            collect_messages(m, &mut out);
        }
        out
    }

    pub(crate) fn all_enums(&self) -> Vec<EnumDescriptor> {
        let mut out: Vec<EnumDescriptor> = self.0.enums.clone();
        for m in &self.0.messages {
            collect_enums(m, &mut out);
        }
        out
    }
}

fn collect_messages(message: &MessageDescriptor, out: &mut Vec<MessageDescriptor>) {
    out.push(message.clone());
    for nested in message.nested_messages() {
        collect_messages(nested, out);
    }
}

fn collect_enums(message: &MessageDescriptor, out: &mut Vec<EnumDescriptor>) {
    out.extend(message.nested_enums().iter().cloned());
    for nested in message.nested_messages() {
        collect_enums(nested, out);
    }
}

impl fmt::Debug for FileDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileDescriptor")
            .field("name", &self.0.name)
            .field("package", &self.0.package)
            .finish()
    }
}

/// Joins a package/outer-scope name with a local name into a fully
/// qualified name, omitting an empty package.
pub(crate) fn join_full_name(scope: &str, name: &str) -> String {
    if scope.is_empty() {
        name.to_string()
    } else {
        format!("{scope}.{name}")
    }
}
