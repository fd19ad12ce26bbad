use indoc::indoc;

use yaml_codec::{ErrorKind, Value, load};

fn keys(v: &Value) -> Vec<&str> {
    v.as_mapping().unwrap().keys().map(String::as_str).collect()
}

#[test]
fn merge_expands_nested_mappings() {
    let yaml = indoc! {"
        base1: &B1 { a: 1, b: 2 }
        base2: &B2
          <<: { c: 3 }
          d: 4
        target:
          <<: [*B1, *B2]
          e: 5
    "};
    let v = load(yaml).unwrap();
    let expected: Value = [("a", 1), ("b", 2), ("c", 3), ("d", 4), ("e", 5)]
        .into_iter()
        .collect();
    assert_eq!(v["target"], expected);
}

#[test]
fn explicit_keys_win_over_merged_ones() {
    let yaml = indoc! {"
        base: &base { name: base, port: 80 }
        service:
          name: web
          <<: *base
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["service"]["name"].as_str(), Some("web"));
    assert_eq!(v["service"]["port"], Value::Int(80));
    assert_eq!(keys(&v["service"]), ["name", "port"]);
}

#[test]
fn first_source_wins_between_merged_mappings() {
    let yaml = indoc! {"
        a: &a { k: from_a }
        b: &b { k: from_b, only_b: 1 }
        c:
          <<: [*a, *b]
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["c"]["k"].as_str(), Some("from_a"));
    assert_eq!(v["c"]["only_b"], Value::Int(1));
}

#[test]
fn merged_keys_may_be_overridden_later() {
    let yaml = indoc! {"
        base: &base { port: 80 }
        svc:
          <<: *base
          port: 8080
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["svc"]["port"], Value::Int(8080));
}

#[test]
fn merging_a_scalar_is_an_error() {
    let err = load("a:\n  <<: 1\n").unwrap_err();
    assert!(err.reason().contains("cannot merge mappings"), "{err}");
}

#[test]
fn duplicate_key_is_fatal() {
    let err = load("a: 1\nb: 2\na: 3\n").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateKey("a".to_owned()));
    assert_eq!(err.mark().line(), 3);
}

#[test]
fn duplicate_key_in_flow_mapping_is_fatal() {
    let err = load("{x: 1, x: 2}").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DuplicateKey(k) if k == "x"), "{err}");
}

#[test]
fn keys_that_stringify_alike_collide() {
    let err = load("1: a\n'1': b\n").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::DuplicateKey(_)), "{err}");
}

#[test]
fn duplicate_anchor_is_fatal() {
    let err = load("a: &x 1\nb: &x 2\n").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::DuplicateAnchor("x".to_owned()));
}

#[test]
fn unknown_alias_is_fatal() {
    let err = load("a: *missing\n").unwrap_err();
    assert_eq!(err.kind(), &ErrorKind::UnknownAlias("missing".to_owned()));
}

#[test]
fn anchors_are_scoped_to_their_document() {
    let result = yaml_codec::load_all("--- &a 1\n--- *a\n");
    assert!(matches!(
        result.unwrap_err().kind(),
        ErrorKind::UnknownAlias(name) if name == "a"
    ));
}

#[test]
fn alias_with_properties_is_rejected() {
    let err = load("a: &x 1\nb: !!str *x\n").unwrap_err();
    assert!(err.reason().contains("alias node should not have any properties"), "{err}");
}

#[test]
fn anchored_collections_are_copied_into_values() {
    let yaml = indoc! {"
        defaults: &d
          retries: 3
          hosts: [a, b]
        first: *d
        second: *d
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["first"], v["defaults"]);
    assert_eq!(v["second"]["hosts"][1].as_str(), Some("b"));
}
