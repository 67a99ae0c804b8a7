//! The error taxonomy shared by the descriptor/dynamic-message surface and
//! the well-known-type handler layer.
//!
//! A single enum covers both layers (rather than two), since a caller
//! walking from a [`crate::dynamic::DynamicMessage`] into a WKT handler and
//! back should not have to juggle two incompatible error types. Two errors
//! compare equal iff their variant and payload fields compare equal, so
//! tests can assert on shape rather than on message text.

use core::fmt;

/// Result alias used throughout this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Errors produced by the descriptor model, the dynamic message, and the
/// well-known-type handlers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    /// A handler for the requested fully-qualified type name is not known
    /// in a context that required one.
    UnsupportedType(String),
    /// Cross-representation conversion failed: a type-URL mismatch, a codec
    /// failure, or a host-value bridge failure.
    ConversionFailed {
        from: String,
        to: String,
        reason: String,
    },
    /// The payload violates a well-known type's invariants.
    InvalidData { type_name: String, reason: String },
    /// The well-known-types registry has no handler for the requested
    /// fully-qualified type name.
    HandlerNotFound(String),
    /// A value was structurally valid but rejected by a validator.
    ValidationFailed { type_name: String, reason: String },
    /// A fully qualified name collided with an already-registered entry.
    DuplicateName(String),
    /// A message field was addressed by a name or number the descriptor
    /// does not define.
    FieldNotFound(String),
    /// A value's runtime type is not compatible with a field's declared
    /// type.
    TypeMismatch {
        field: String,
        expected: String,
        actual: String,
    },
    /// The message has been frozen and can no longer be mutated.
    Immutable,
    /// A fully qualified name could not be resolved against a type
    /// registry.
    UnknownDescriptor(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnsupportedType(type_name) => {
                write!(f, "no handler is registered for type `{type_name}`")
            }
            Error::ConversionFailed { from, to, reason } => {
                write!(f, "failed to convert from {from} to {to}: {reason}")
            }
            Error::InvalidData { type_name, reason } => {
                write!(f, "invalid `{type_name}` data: {reason}")
            }
            Error::HandlerNotFound(type_name) => {
                write!(f, "no well-known-type handler registered for `{type_name}`")
            }
            Error::ValidationFailed { type_name, reason } => {
                write!(f, "`{type_name}` value failed validation: {reason}")
            }
            Error::DuplicateName(fqn) => {
                write!(f, "`{fqn}` is already registered")
            }
            Error::FieldNotFound(name) => {
                write!(f, "no field named `{name}` on this message")
            }
            Error::TypeMismatch {
                field,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "field `{field}` expects {expected}, got {actual}"
                )
            }
            Error::Immutable => write!(f, "message is frozen and cannot be mutated"),
            Error::UnknownDescriptor(fqn) => {
                write!(f, "no descriptor registered for `{fqn}`")
            }
        }
    }
}

impl std::error::Error for Error {}
