//! Property-based tests for the universal laws of `spec.md` §8.1, in the
//! style of `prost-types`' own `proptest!` usage (`prost-types/src/lib.rs`,
//! `check_timestamp_roundtrip_via_system_time`).

use proptest::prelude::*;

use protodyn::wkt::{DurationValue, FieldMaskValue, StructValue, TimestampValue, ValueValue};
use protodyn::type_url::{create_type_url, extract_type_name, is_valid_type_url};

proptest! {
    /// Law 9: constructing a `TimestampValue` succeeds iff `nanos` is in
    /// `[0, 999_999_999]`.
    #[test]
    fn timestamp_canonicalization(seconds: i64, nanos in i32::MIN..=i32::MAX) {
        let result = TimestampValue::new(seconds, nanos);
        prop_assert_eq!(result.is_ok(), (0..=999_999_999).contains(&nanos));
    }

    /// Law 8: constructing a `DurationValue` succeeds iff `nanos` is in
    /// range and shares a sign with `seconds` whenever both are non-zero.
    #[test]
    fn duration_canonicalization(seconds: i64, nanos in i32::MIN..=i32::MAX) {
        let result = DurationValue::new(seconds, nanos);
        let expected = (-999_999_999..=999_999_999).contains(&nanos)
            && (seconds == 0 || nanos == 0 || seconds.signum() == i64::from(nanos.signum()));
        prop_assert_eq!(result.is_ok(), expected);
    }

    /// Law 3: type-URL stability — extraction inverts construction for any
    /// FQN containing at least one dot.
    #[test]
    fn type_url_stability(package in "[a-z]{2,8}", name in "[A-Z][a-zA-Z0-9]{1,12}") {
        let fqn = format!("{package}.{name}");
        let url = create_type_url(&fqn);
        prop_assert_eq!(extract_type_name(&url), fqn.as_str());
        prop_assert!(is_valid_type_url(&url));
    }

    /// Law 4/6: FieldMask `add` is reflexive under `covers`, and `union` is
    /// idempotent-safe (adding the same path twice does not duplicate it).
    #[test]
    fn field_mask_add_is_reflexive(segments in prop::collection::vec("[a-z]{1,6}", 1..4)) {
        let path = segments.join(".");
        let mut mask = FieldMaskValue::new();
        mask.add(path.clone()).unwrap();
        prop_assert!(mask.covers(&path));
        prop_assert!(mask.contains(&path));

        let doubled = mask.union(&mask);
        prop_assert_eq!(doubled.paths().len(), mask.paths().len());
    }

    /// Law 6: intersection is idempotent.
    #[test]
    fn field_mask_intersection_is_idempotent(segments in prop::collection::vec("[a-z]{1,6}", 1..4)) {
        let path = segments.join(".");
        let mut mask = FieldMaskValue::new();
        mask.add(path).unwrap();
        prop_assert_eq!(mask.intersection(&mask), mask.clone());
    }

    /// Law 7: a `StructValue` built from a host JSON object then converted
    /// back yields an equal object (flat case: nested cases are exercised
    /// by the S6 scenario test).
    #[test]
    fn struct_interchange_flat(
        keys in prop::collection::vec("[a-z]{1,6}", 1..5),
        values in prop::collection::vec(-1000.0f64..1000.0, 1..5),
    ) {
        let n = keys.len().min(values.len());
        let mut fields = std::collections::HashMap::new();
        for i in 0..n {
            fields.insert(keys[i].clone(), ValueValue::Number(values[i]));
        }
        let host = protodyn::wkt::struct_value::value_to_host(&ValueValue::Struct(StructValue {
            fields: fields.clone(),
        }));
        let back = protodyn::wkt::struct_value::host_to_value(&host);
        prop_assert_eq!(back, ValueValue::Struct(StructValue { fields }));
    }
}
