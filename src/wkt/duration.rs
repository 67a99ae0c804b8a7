//! The `google.protobuf.Duration` well-known type.

use std::fmt;
use std::sync::OnceLock;

use crate::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use crate::dynamic::{DynamicMessage, MessageFactory, Value};
use crate::error::{Error, Result};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const HANDLED_TYPE_NAME: &str = "google.protobuf.Duration";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// `seconds` plus signed `nanos`, where `nanos` is in `[-999_999_999,
/// 999_999_999]` and, when both components are non-zero, they share a
/// sign.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DurationValue {
    pub seconds: i64,
    pub nanos: i32,
}

impl DurationValue {
    pub fn new(seconds: i64, nanos: i32) -> Result<Self> {
        if !(-999_999_999..=999_999_999).contains(&nanos) {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: format!("nanos {nanos} is out of range [-999999999, 999999999]"),
            });
        }
        if seconds != 0 && nanos != 0 && seconds.signum() != i64::from(nanos.signum()) {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: "seconds and nanos must share the same sign".to_string(),
            });
        }
        Ok(DurationValue { seconds, nanos })
    }

    pub fn zero() -> Self {
        DurationValue { seconds: 0, nanos: 0 }
    }

    /// Both components made non-negative.
    pub fn abs(self) -> Self {
        DurationValue {
            seconds: self.seconds.abs(),
            nanos: self.nanos.abs(),
        }
    }

    /// Both components sign-flipped.
    pub fn negate(self) -> Self {
        DurationValue {
            seconds: -self.seconds,
            nanos: -self.nanos,
        }
    }

    pub fn to_seconds_f64(self) -> f64 {
        self.seconds as f64 + self.nanos as f64 / NANOS_PER_SECOND as f64
    }

    /// Splits a host seconds value into whole seconds and nanoseconds,
    /// preserving sign within one microsecond for typical inputs.
    pub fn from_seconds_f64(t: f64) -> Self {
        let seconds = t.trunc() as i64;
        let nanos = ((t - t.trunc()) * NANOS_PER_SECOND as f64).round() as i32;
        DurationValue { seconds, nanos }
    }
}

impl fmt::Display for DurationValue {
    /// Renders e.g. `1.500s`, `-0.000000500s`, or `0s`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.seconds < 0 || self.nanos < 0 {
            write!(f, "-")?;
        }
        write!(f, "{}", self.seconds.abs())?;

        let nanos = self.nanos.abs();
        if nanos == 0 {
            write!(f, "s")
        } else if nanos % 1_000_000 == 0 {
            write!(f, ".{:03}s", nanos / 1_000_000)
        } else if nanos % 1_000 == 0 {
            write!(f, ".{:06}s", nanos / 1_000)
        } else {
            write!(f, ".{:09}s", nanos)
        }
    }
}

fn descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/duration.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("Duration")
                    .field(FieldDescriptorBuilder::new("seconds", 1, FieldType::Int64))
                    .field(FieldDescriptorBuilder::new("nanos", 2, FieldType::Int32)),
            )
            .build()
            .expect("well-known Duration descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// Handler for `google.protobuf.Duration`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DurationHandler;

impl WellKnownTypeHandler for DurationHandler {
    fn handled_type_name(&self) -> &'static str {
        HANDLED_TYPE_NAME
    }

    fn support_phase(&self) -> SupportPhase {
        SupportPhase::Critical
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
        let seconds = msg.get("seconds")?.and_then(|v| v.as_i64()).unwrap_or(0);
        let nanos = msg.get("nanos")?.and_then(|v| v.as_i32()).unwrap_or(0);
        Ok(SpecializedValue::Duration(DurationValue::new(seconds, nanos)?))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::Duration(duration) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: HANDLED_TYPE_NAME.to_string(),
                reason: "expected a Duration specialized value".to_string(),
            });
        };
        let mut msg = MessageFactory::new_message(descriptor());
        msg.set("seconds", Value::I64(duration.seconds))?;
        msg.set("nanos", Value::I32(duration.nanos))?;
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        match value {
            SpecializedValue::Duration(d) => DurationValue::new(d.seconds, d.nanos).is_ok(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatched_sign_is_rejected() {
        let err = DurationValue::new(1, -500_000_000).unwrap_err();
        match err {
            Error::InvalidData { reason, .. } => assert!(reason.contains("same sign")),
            other => panic!("expected InvalidData, got {other:?}"),
        }
    }

    #[test]
    fn zero_seconds_with_negative_nanos_is_valid() {
        assert!(DurationValue::new(0, -999_999_999).is_ok());
    }

    #[test]
    fn abs_and_negate() {
        let d = DurationValue::new(-5, -250_000_000).unwrap();
        assert_eq!(d.abs(), DurationValue::new(5, 250_000_000).unwrap());
        assert_eq!(d.negate(), DurationValue::new(5, 250_000_000).unwrap());
    }

    #[test]
    fn round_trip_via_handler() {
        let handler = DurationHandler;
        let value = SpecializedValue::Duration(DurationValue::new(10, -0).unwrap());
        let msg = handler.create_dynamic(&value).unwrap();
        let round_tripped = handler.create_specialized(&msg).unwrap();
        assert_eq!(round_tripped, value);
    }

    #[test]
    fn display_formats_subseconds() {
        assert_eq!(DurationValue::zero().to_string(), "0s");
        assert_eq!(DurationValue::new(1, 500_000_000).unwrap().to_string(), "1.500s");
        assert_eq!(DurationValue::new(0, -500).unwrap().to_string(), "-0.000000500s");
    }
}
