//! Property tests: values survive a dump and a reload, and dumping is idempotent.

use proptest::prelude::*;

use yaml_codec::{Mapping, Value, dump, dump_options, dump_with_options, load};

/// Printable ASCII plus line breaks and tabs, short enough to stay clear of folding.
fn text() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.,:#&*!|>'\"%@`?=\\-\\[\\]{}\n\t]{0,40}"
}

fn key() -> impl Strategy<Value = String> {
    "[a-zA-Z0-9 _.:#'\\-]{0,12}"
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::Int),
        (-1.0e15f64..1.0e15f64).prop_map(Value::Float),
        text().prop_map(Value::String),
        proptest::collection::vec(any::<u8>(), 0..64).prop_map(Value::Binary),
    ]
}

fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(4, 48, 6, |inner| {
        prop_oneof![
            proptest::collection::vec(inner.clone(), 0..6).prop_map(Value::Sequence),
            proptest::collection::vec((key(), inner), 0..6)
                .prop_map(|entries| Value::Mapping(entries.into_iter().collect::<Mapping>())),
        ]
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn load_inverts_dump(v in value()) {
        let text = dump(&v).unwrap();
        let back = load(&text).unwrap_or_else(|e| panic!("{e}\n--- dumped ---\n{text}"));
        prop_assert_eq!(back, v, "dumped:\n{}", text);
    }

    #[test]
    fn load_inverts_flow_dump(v in value()) {
        let options = dump_options! { flow_level: 0 };
        let text = dump_with_options(&v, &options).unwrap();
        let back = load(&text).unwrap_or_else(|e| panic!("{e}\n--- dumped ---\n{text}"));
        prop_assert_eq!(back, v, "dumped:\n{}", text);
    }

    #[test]
    fn dump_is_idempotent(v in value()) {
        let once = dump(&v).unwrap();
        let twice = dump(&load(&once).unwrap()).unwrap();
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn unambiguous_words_stay_plain(s in "[a-zA-Z][a-zA-Z0-9]{0,8}( [a-zA-Z0-9]{1,8}){0,4}") {
        prop_assume!(matches!(load(&s), Ok(Value::String(ref loaded)) if *loaded == s));
        prop_assume!(!matches!(s.as_str(), "y" | "Y" | "n" | "N" | "yes" | "Yes" | "YES" | "no"
            | "No" | "NO" | "on" | "On" | "ON" | "off" | "Off" | "OFF"));
        prop_assert_eq!(dump(&Value::String(s.clone())).unwrap(), format!("{s}\n"));
    }

    #[test]
    fn repeated_keys_never_load(k in "[a-z]{1,8}", a in any::<i32>(), b in any::<i32>()) {
        let err = load(&format!("{k}: {a}\n{k}: {b}\n")).unwrap_err();
        prop_assert!(matches!(err.kind(), yaml_codec::ErrorKind::DuplicateKey(found) if *found == k));
    }
}
