//! Runtime reflection over Protocol Buffers.
//!
//! `protodyn` describes message schemas, constructs and mutates messages
//! against those schemas, and interchanges values with the canonical
//! well-known types, all without compile-time code generation from
//! `.proto` files.
//!
//! - [`descriptor`]: the immutable schema model (files, messages, fields,
//!   enums, services, methods) and the builders that construct it.
//! - [`registry`]: the [`registry::TypeRegistry`] that resolves fully
//!   qualified names to descriptors.
//! - [`dynamic`]: the [`dynamic::DynamicMessage`] value store and the
//!   [`dynamic::MessageFactory`] that creates empty instances.
//! - [`wkt`]: handlers bridging `google.protobuf.*` well-known types to
//!   native host values, and the [`wkt::WellKnownTypesRegistry`] that
//!   dispatches on type name.
//! - [`type_url`]: `type.googleapis.com/<FQN>`-style type URL helpers.
//! - [`error`]: the single error taxonomy shared by every layer above.
//!
//! This crate does not parse `.proto` files, does not perform wire-format
//! encoding/decoding, and has no gRPC transport of its own. Those are
//! external collaborators reached through narrow interfaces (a caller
//! producing [`descriptor::FileDescriptor`] trees, and the
//! [`wkt::any::WireCodec`] trait for `Any` packing).

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod descriptor;
pub mod dynamic;
pub mod error;
pub mod registry;
pub mod type_url;
pub mod wkt;

pub use descriptor::{
    EnumDescriptor, FieldDescriptor, FieldType, FileDescriptor, MessageDescriptor,
    MethodDescriptor, ServiceDescriptor,
};
pub use dynamic::{DynamicMessage, MapKey, MessageFactory, Value};
pub use error::{Error, Result};
pub use registry::TypeRegistry;
pub use wkt::{SpecializedValue, WellKnownTypeHandler, WellKnownTypesRegistry};
