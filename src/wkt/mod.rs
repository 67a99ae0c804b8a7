//! Well-known-type handlers: bridges between a [`DynamicMessage`] of a
//! standard `google.protobuf.*` message and a native, host-side
//! representation.
//!
//! Each handler is stateless and exposes the same contract:
//! `create_specialized` reads a dynamic message into the native shape,
//! `create_dynamic` goes the other way, and `validate` checks
//! well-formedness without ever failing. A single [`SpecializedValue`]
//! enum unions all seven native shapes so [`registry::WellKnownTypesRegistry`]
//! can dispatch through one object-safe trait object despite each
//! handler's native type being different, the same role `prost-types`'
//! `AnyValue` trait plays for its own `Any` caching (`any_v2.rs`).

pub mod any;
pub mod duration;
pub mod empty;
pub mod field_mask;
pub mod registry;
pub mod struct_value;
pub mod timestamp;

use crate::dynamic::DynamicMessage;
use crate::error::Result;

pub use any::{AnyValue, WireCodec};
pub use duration::DurationValue;
pub use empty::EmptyValue;
pub use field_mask::FieldMaskValue;
pub use registry::WellKnownTypesRegistry;
pub use struct_value::{StructValue, ValueValue};
pub use timestamp::TimestampValue;

/// Where a well-known type sits on the adoption curve; documentation-only,
/// consulted by nothing in this crate's control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupportPhase {
    /// Used by nearly every protobuf-based system (`Timestamp`, `Duration`,
    /// `Any`).
    Critical,
    /// Common in REST/JSON bridges and partial-update APIs (`FieldMask`,
    /// `Struct`, `Value`).
    Important,
    /// Narrow but still standard (`Empty`).
    Advanced,
}

/// The native, host-side value produced by a [`WellKnownTypeHandler`].
///
/// A catch-all over the seven well-known types so the registry can return
/// a uniform type regardless of which handler serviced the call.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecializedValue {
    Timestamp(TimestampValue),
    Duration(DurationValue),
    Empty(EmptyValue),
    FieldMask(FieldMaskValue),
    Struct(StructValue),
    Value(ValueValue),
    Any(AnyValue),
}

/// Bridges a `google.protobuf.*` well-known type between its
/// [`DynamicMessage`] wire shape and a native [`SpecializedValue`].
///
/// Implementations are stateless; construction and field access never
/// depend on external state beyond a fixed, per-type descriptor.
///
/// Round-trip law: for every `s` accepted by `validate`,
/// `create_specialized(create_dynamic(s)?)? == s`.
pub trait WellKnownTypeHandler: Send + Sync {
    /// The fully qualified name this handler services, e.g.
    /// `google.protobuf.Timestamp`.
    fn handled_type_name(&self) -> &'static str;

    /// Where this type sits on the adoption curve. Informational only.
    fn support_phase(&self) -> SupportPhase;

    /// Reads `msg`'s fields into this handler's native representation.
    ///
    /// Fails with [`crate::error::Error::InvalidData`] when `msg`'s
    /// descriptor does not match [`Self::handled_type_name`] or when field
    /// values violate the type's invariants.
    fn create_specialized(&self, msg: &DynamicMessage) -> Result<SpecializedValue>;

    /// Builds a fresh [`DynamicMessage`] of [`Self::handled_type_name`],
    /// populated from `value`.
    ///
    /// Fails with [`crate::error::Error::ConversionFailed`] when `value`'s
    /// runtime variant does not match the one this handler produces.
    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage>;

    /// Whether `value` is a well-formed specialized value for this
    /// handler. Never fails.
    fn validate(&self, value: &SpecializedValue) -> bool;
}
