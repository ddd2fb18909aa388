use layerconf_core::{Bag, Value};
use proptest::prelude::*;

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|i| Value::Int(i as i64)),
        "[a-z]{1,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 16, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Seq),
            prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                .prop_map(|m| Value::Map(Bag::from_map(m.into_iter().collect()))),
        ]
    })
}

fn arb_bag() -> impl Strategy<Value = Bag> {
    prop::collection::btree_map("[a-z]{1,4}", arb_value(), 0..4)
        .prop_map(|m| Bag::from_map(m.into_iter().collect()))
}

proptest! {
    /// Merging an empty overlay onto any base never changes it.
    #[test]
    fn merge_with_empty_overlay_is_identity(base in arb_bag()) {
        let mut merged = base.clone();
        merged.merge(&Bag::new());
        prop_assert_eq!(merged, base);
    }

    /// Merging the same overlay twice gives the same result as once — the
    /// overlay always wins wholesale, so repetition cannot accumulate.
    #[test]
    fn merge_is_idempotent_given_the_same_overlay(base in arb_bag(), overlay in arb_bag()) {
        let mut once = base.clone();
        once.merge(&overlay);
        let mut twice = once.clone();
        twice.merge(&overlay);
        prop_assert_eq!(once, twice);
    }

    /// A value just written via `set` is exactly what the next `get` at the
    /// same path returns.
    #[test]
    fn set_then_get_roundtrips(mut base in arb_bag(), value in arb_value()) {
        base.set("roundtrip.path", value.clone()).unwrap();
        prop_assert_eq!(base.get("roundtrip.path"), value);
    }
}
