use indoc::indoc;

use yaml_codec::{Budget, BudgetBreach, ErrorKind, Value, load, load_all, load_options, load_with_options};

fn seq(items: Vec<Value>) -> Value {
    Value::Sequence(items)
}

#[test]
fn flow_like_text_in_a_block_sequence_is_one_string() {
    let v = load("rules:\n  - DOMAIN,gemini.google.com,Openai\n").unwrap();
    let expected: Value = [("rules", seq(vec!["DOMAIN,gemini.google.com,Openai".into()]))]
        .into_iter()
        .collect();
    assert_eq!(v, expected);
}

#[test]
fn aliases_leave_no_artifacts() {
    let v = load("a: &x 1\nb: *x\n").unwrap();
    let expected: Value = [("a", 1), ("b", 1)].into_iter().collect();
    assert_eq!(v, expected);
}

#[test]
fn core_schema_scalars() {
    let yaml = indoc! {"
        null_word: null
        tilde: ~
        empty:
        yes_is_text: yes
        truth: True
        hex: 0x1F
        octal: 0o17
        binary: 0b101
        grouped: 1_000
        float: -1.5e3
        inf: .inf
        text: hello world
        quoted_int: '12'
    "};
    let v = load(yaml).unwrap();
    assert!(v["null_word"].is_null());
    assert!(v["tilde"].is_null());
    assert!(v["empty"].is_null());
    assert_eq!(v["yes_is_text"].as_str(), Some("yes"));
    assert_eq!(v["truth"], Value::Bool(true));
    assert_eq!(v["hex"], Value::Int(31));
    assert_eq!(v["octal"], Value::Int(15));
    assert_eq!(v["binary"], Value::Int(5));
    assert_eq!(v["grouped"], Value::Int(1000));
    assert_eq!(v["float"], Value::Float(-1500.0));
    assert_eq!(v["inf"], Value::Float(f64::INFINITY));
    assert_eq!(v["text"].as_str(), Some("hello world"));
    assert_eq!(v["quoted_int"].as_str(), Some("12"));
}

#[test]
fn nan_is_loaded() {
    assert!(load(".NaN").unwrap().as_f64().is_some_and(f64::is_nan));
}

#[test]
fn timestamps_are_typed() {
    let v = load("d: 2002-12-14\nt: 2001-12-14t21:59:43.10-05:00\n").unwrap();
    let Value::Timestamp(d) = &v["d"] else {
        panic!("expected a timestamp, got {:?}", v["d"]);
    };
    assert_eq!(d.to_rfc3339(), "2002-12-14T00:00:00+00:00");
    assert!(matches!(v["t"], Value::Timestamp(_)));
}

#[test]
fn nested_block_collections() {
    let yaml = indoc! {"
        server:
          hosts:
          - alpha
          - beta
          ports: [80, 443]
          tls: {enabled: true, cert: /etc/cert.pem}
        - not a sibling key
    "};
    // The trailing entry sits at the wrong indentation.
    assert!(load(yaml).is_err());

    let v = load(&yaml.replace("- not a sibling key\n", "")).unwrap();
    let server = &v["server"];
    assert_eq!(server["hosts"], seq(vec!["alpha".into(), "beta".into()]));
    assert_eq!(server["ports"], seq(vec![80.into(), 443.into()]));
    assert_eq!(server["tls"]["enabled"], Value::Bool(true));
    assert_eq!(server["tls"]["cert"].as_str(), Some("/etc/cert.pem"));
}

#[test]
fn mapping_order_is_insertion_order() {
    let v = load("z: 1\na: 2\nm: 3\n").unwrap();
    let keys: Vec<&str> = v.as_mapping().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn explicit_keys_and_compact_sequences() {
    let yaml = indoc! {"
        ? complex key
        : - one
          - two
        plain: value
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["complex key"], seq(vec!["one".into(), "two".into()]));
    assert_eq!(v["plain"].as_str(), Some("value"));
}

#[test]
fn non_string_keys_are_stringified() {
    let v = load("1: int\ntrue: bool\n~: null\n[a, b]: seq\n").unwrap();
    let keys: Vec<&str> = v.as_mapping().unwrap().keys().map(String::as_str).collect();
    assert_eq!(keys, ["1", "true", "null", "a,b"]);
}

#[test]
fn nested_collection_keys_are_rejected() {
    let err = load("? [a, [b]]\n: x\n").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Syntax(_)), "{err}");
}

#[test]
fn quoted_scalars() {
    let yaml = indoc! {r#"
        single: 'it''s'
        double: "tab\tand \u00e9 and \x41"
        folded_quote: "a
          b"
    "#};
    let v = load(yaml).unwrap();
    assert_eq!(v["single"].as_str(), Some("it's"));
    assert_eq!(v["double"].as_str(), Some("tab\tand é and A"));
    assert_eq!(v["folded_quote"].as_str(), Some("a b"));
}

#[test]
fn unknown_escape_is_fatal() {
    let err = load(r#""\q""#).unwrap_err();
    assert!(err.reason().contains("unknown escape sequence"), "{err}");
}

#[test]
fn flow_collections() {
    let v = load("{a: [1, 2, {b: c}], d: [], e: {}, 'f': [x: 1]}").unwrap();
    assert_eq!(v["a"][2]["b"].as_str(), Some("c"));
    assert_eq!(v["d"], seq(vec![]));
    assert_eq!(v["e"], Value::Mapping(Default::default()));
    // A pair inside a flow sequence becomes a single-entry mapping.
    assert_eq!(v["f"][0]["x"], Value::Int(1));
}

#[test]
fn flow_collection_errors() {
    let err = load(r#"["a" "b"]"#).unwrap_err();
    assert!(err.reason().contains("missed comma"), "{err}");
    let err = load("[1, 2").unwrap_err();
    assert!(err.reason().contains("within a flow collection"), "{err}");
}

#[test]
fn tabs_in_indentation_are_rejected() {
    let err = load("a:\n\t- b\n").unwrap_err();
    assert!(matches!(err.kind(), ErrorKind::Syntax(_)), "{err}");
}

#[test]
fn multiple_documents() {
    let docs = load_all("--- 1\n--- [a]\n...\n--- {b: 2}\n").unwrap();
    assert_eq!(docs.len(), 3);
    assert_eq!(docs[0], Value::Int(1));
    assert_eq!(docs[1], seq(vec!["a".into()]));
    assert_eq!(docs[2]["b"], Value::Int(2));
}

#[test]
fn streaming_callback_sees_each_document() {
    let mut seen = Vec::new();
    let result = yaml_codec::load_all_with("--- 1\n--- 2\n--- *nope\n", &Default::default(), |v| {
        seen.push(v)
    });
    assert!(result.is_err());
    assert_eq!(seen, [Value::Int(1), Value::Int(2)]);
}

#[test]
fn json_mode_lets_the_last_duplicate_win() {
    let options = load_options! { json: true };
    let v = load_with_options(r#"{"a": 1, "a": 2}"#, &options).unwrap();
    assert_eq!(v["a"], Value::Int(2));
}

#[test]
fn failsafe_schema_keeps_strings() {
    let options = load_options! { schema: yaml_codec::Schema::failsafe() };
    let v = load_with_options("a: 1\nb: true\n", &options).unwrap();
    assert_eq!(v["a"].as_str(), Some("1"));
    assert_eq!(v["b"].as_str(), Some("true"));
}

#[test]
fn json_schema_has_no_timestamps() {
    let options = load_options! { schema: yaml_codec::Schema::json() };
    let v = load_with_options("d: 2002-12-14\nb: True\nc: null\n", &options).unwrap();
    assert_eq!(v["d"].as_str(), Some("2002-12-14"));
    assert_eq!(v["b"], Value::Bool(true));
    assert!(v["c"].is_null());
}

fn nested_flow(depth: usize) -> String {
    format!("{}{}", "[".repeat(depth), "]".repeat(depth))
}

#[test]
fn default_depth_limit_fits_a_default_thread_stack() {
    let limit = Budget::default().max_depth;
    // Spawned threads get the platform default stack, like test threads.
    let (at_limit, over_limit) = std::thread::spawn(move || {
        (load(&nested_flow(limit)), load(&nested_flow(limit + 1)))
    })
    .join()
    .expect("loader thread must not overflow its stack");

    assert!(at_limit.is_ok(), "{:?}", at_limit.err());
    let err = over_limit.unwrap_err();
    assert!(
        matches!(err.kind(), ErrorKind::Budget(BudgetBreach::Depth { .. })),
        "{err}"
    );
}
