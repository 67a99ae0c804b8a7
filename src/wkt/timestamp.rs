//! The `google.protobuf.Timestamp` well-known type.

use std::fmt;
use std::sync::OnceLock;

use crate::descriptor::{
    FieldDescriptorBuilder, FieldType, FileDescriptorBuilder, MessageDescriptor,
    MessageDescriptorBuilder,
};
use crate::dynamic::{DynamicMessage, MessageFactory, Value};
use crate::error::{Error, Result};

use super::{SpecializedValue, SupportPhase, WellKnownTypeHandler};

pub const HANDLED_TYPE_NAME: &str = "google.protobuf.Timestamp";

const NANOS_PER_SECOND: i64 = 1_000_000_000;

/// `seconds` since the Unix epoch plus fractional `nanos`, always
/// non-negative: `nanos` is in `[0, 999_999_999]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TimestampValue {
    pub seconds: i64,
    pub nanos: i32,
}

impl TimestampValue {
    pub fn new(seconds: i64, nanos: i32) -> Result<Self> {
        if !(0..=999_999_999).contains(&nanos) {
            return Err(Error::InvalidData {
                type_name: HANDLED_TYPE_NAME.to_string(),
                reason: format!("nanos {nanos} is out of range [0, 999999999]"),
            });
        }
        Ok(TimestampValue { seconds, nanos })
    }

    /// `t = seconds + nanos/1e9`.
    pub fn to_seconds_f64(self) -> f64 {
        self.seconds as f64 + self.nanos as f64 / NANOS_PER_SECOND as f64
    }

    /// Splits a host wall-clock value into whole seconds and nanoseconds,
    /// carrying into `seconds` if rounding the fractional part produces
    /// exactly one second.
    pub fn from_seconds_f64(t: f64) -> Self {
        let mut seconds = t.floor() as i64;
        let mut nanos = ((t - t.floor()) * NANOS_PER_SECOND as f64).round() as i64;
        if nanos >= NANOS_PER_SECOND {
            nanos -= NANOS_PER_SECOND;
            seconds += 1;
        }
        TimestampValue {
            seconds,
            nanos: nanos as i32,
        }
    }
}

impl fmt::Display for TimestampValue {
    /// Renders the canonical `YYYY-MM-DDThh:mm:ss[.fffffffff]Z` form.
    ///
    /// The calendar conversion follows musl's `__secs_to_tm`, the same
    /// algorithm `prost-types::DateTime` uses for its `Timestamp`
    /// `Display` impl (`prost-types/src/datetime.rs`).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (year, month, day, hour, minute, second) = civil_from_seconds(self.seconds);

        let subsec = if self.nanos == 0 {
            String::new()
        } else if self.nanos % 1_000_000 == 0 {
            format!(".{:03}", self.nanos / 1_000_000)
        } else if self.nanos % 1_000 == 0 {
            format!(".{:06}", self.nanos / 1_000)
        } else {
            format!(".{:09}", self.nanos)
        };

        write!(
            f,
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}{}Z",
            year, month, day, hour, minute, second, subsec
        )
    }
}

/// Converts Unix seconds into a UTC calendar date/time.
fn civil_from_seconds(t: i64) -> (i64, u8, u8, u8, u8, u8) {
    // 2000-03-01 (mod 400 year, immediately after Feb 29).
    const LEAPOCH: i64 = 946_684_800 + 86400 * (31 + 29);
    const DAYS_PER_400Y: i32 = 365 * 400 + 97;
    const DAYS_PER_100Y: i32 = 365 * 100 + 24;
    const DAYS_PER_4Y: i32 = 365 * 4 + 1;
    const DAYS_IN_MONTH: [u8; 12] = [31, 30, 31, 30, 31, 31, 30, 31, 30, 31, 31, 29];

    let mut days: i64 = (t / 86_400) - (LEAPOCH / 86_400);
    let mut remsecs: i32 = (t % 86_400) as i32;
    if remsecs < 0 {
        remsecs += 86_400;
        days -= 1;
    }

    let mut qc_cycles = (days / i64::from(DAYS_PER_400Y)) as i32;
    let mut remdays = (days % i64::from(DAYS_PER_400Y)) as i32;
    if remdays < 0 {
        remdays += DAYS_PER_400Y;
        qc_cycles -= 1;
    }

    let mut c_cycles = remdays / DAYS_PER_100Y;
    if c_cycles == 4 {
        c_cycles -= 1;
    }
    remdays -= c_cycles * DAYS_PER_100Y;

    let mut q_cycles = remdays / DAYS_PER_4Y;
    if q_cycles == 25 {
        q_cycles -= 1;
    }
    remdays -= q_cycles * DAYS_PER_4Y;

    let mut remyears = remdays / 365;
    if remyears == 4 {
        remyears -= 1;
    }
    remdays -= remyears * 365;

    let mut years: i64 =
        i64::from(remyears) + 4 * i64::from(q_cycles) + 100 * i64::from(c_cycles) + 400 * i64::from(qc_cycles);

    let mut months = 0;
    while i32::from(DAYS_IN_MONTH[months as usize]) <= remdays {
        remdays -= i32::from(DAYS_IN_MONTH[months as usize]);
        months += 1;
    }
    if months >= 10 {
        months -= 12;
        years += 1;
    }

    (
        years + 2000,
        (months + 3) as u8,
        (remdays + 1) as u8,
        (remsecs / 3600) as u8,
        (remsecs / 60 % 60) as u8,
        (remsecs % 60) as u8,
    )
}

fn descriptor() -> &'static MessageDescriptor {
    static DESCRIPTOR: OnceLock<MessageDescriptor> = OnceLock::new();
    DESCRIPTOR.get_or_init(|| {
        FileDescriptorBuilder::new("google/protobuf/timestamp.proto")
            .package("google.protobuf")
            .message(
                MessageDescriptorBuilder::new("Timestamp")
                    .field(FieldDescriptorBuilder::new("seconds", 1, FieldType::Int64))
                    .field(FieldDescriptorBuilder::new("nanos", 2, FieldType::Int32)),
            )
            .build()
            .expect("well-known Timestamp descriptor is internally consistent")
            .messages()[0]
            .clone()
    })
}

/// Handler for `google.protobuf.Timestamp`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TimestampHandler;

impl WellKnownTypeHandler for TimestampHandler {
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
        Ok(SpecializedValue::Timestamp(TimestampValue::new(seconds, nanos)?))
    }

    fn create_dynamic(&self, value: &SpecializedValue) -> Result<DynamicMessage> {
        let SpecializedValue::Timestamp(timestamp) = value else {
            return Err(Error::ConversionFailed {
                from: "SpecializedValue".to_string(),
                to: HANDLED_TYPE_NAME.to_string(),
                reason: "expected a Timestamp specialized value".to_string(),
            });
        };
        let mut msg = MessageFactory::new_message(descriptor());
        msg.set("seconds", Value::I64(timestamp.seconds))?;
        msg.set("nanos", Value::I32(timestamp.nanos))?;
        Ok(msg)
    }

    fn validate(&self, value: &SpecializedValue) -> bool {
        matches!(value, SpecializedValue::Timestamp(t) if (0..=999_999_999).contains(&t.nanos))
    }
}
