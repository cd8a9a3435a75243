// SPDX-License-Identifier: MIT OR Apache-2.0
//! Property-based round-trip coverage for `ocan_codec` (spec.md §8, P1/P2).

use ocan_codec::{parse, stringify};
use ocan_core::{OrderedMap, Value};
use proptest::prelude::*;

fn arb_scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Undefined),
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<f64>().prop_map(Value::Number),
        "[0-9]{1,18}".prop_map(Value::BigInt),
        "[a-zA-Z0-9 _-]{0,12}".prop_map(Value::String),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_scalar().prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::array),
            prop::collection::vec(("[a-z]{1,6}", inner), 0..4).prop_map(|entries| {
                let mut map = OrderedMap::new();
                for (k, v) in entries {
                    map.insert(k, v);
                }
                Value::object(map)
            }),
        ]
    })
}

proptest! {
    /// P1: `decode(encode(v))` is structurally equal to `v`.
    #[test]
    fn round_trip_preserves_structure(value in arb_value()) {
        let text = stringify(&value).unwrap();
        let decoded = parse(&text).unwrap();
        prop_assert!(value.deep_eq(&decoded));
    }

    /// P2: encoding the same value graph twice produces byte-identical output.
    #[test]
    fn encoding_is_deterministic(value in arb_value()) {
        let a = stringify(&value).unwrap();
        let b = stringify(&value).unwrap();
        prop_assert_eq!(a, b);
    }
}
