use std::rc::Rc;

use indoc::indoc;

use yaml_codec::dump_options::{QuotingType, Replacer};
use yaml_codec::{
    DumpError, LoadOptions, Node, Value, dump, dump_document, dump_options, dump_with_options,
    load, load_document,
};

#[test]
fn scalars_in_a_mapping() {
    let v: Value = [
        ("a", Value::Null),
        ("b", Value::Bool(true)),
        ("c", Value::Float(3.14)),
    ]
    .into_iter()
    .collect();
    assert_eq!(dump(&v).unwrap(), "a: null\nb: true\nc: 3.14\n");
}

#[test]
fn settings_object_layout() {
    let yaml = indoc! {"
        name: proxy
        port: 7890
        rules:
          - DOMAIN,gemini.google.com,Openai
          - MATCH,DIRECT
        dns:
          enable: true
          nameserver: []
          fallback: {}
        note: ''
    "};
    let v = load(yaml).unwrap();
    assert_eq!(dump(&v).unwrap(), yaml);
}

#[test]
fn strings_that_look_like_other_types_are_quoted() {
    let v: Value = [
        ("int", "12"),
        ("bool", "true"),
        ("null", "~"),
        ("date", "2001-12-14"),
        ("float", "1e3"),
        ("yaml11", "on"),
        ("merge", "<<"),
    ]
    .into_iter()
    .collect();
    let out = dump(&v).unwrap();
    assert_eq!(
        out,
        indoc! {"
            int: '12'
            bool: 'true'
            'null': '~'
            date: '2001-12-14'
            float: '1e3'
            yaml11: 'on'
            merge: '<<'
        "}
    );
    assert_eq!(load(&out).unwrap(), v);
}

#[test]
fn double_quoting_preference() {
    let v: Value = [("k", "yes")].into_iter().collect();
    let options = dump_options! { quoting_type: QuotingType::Double };
    assert_eq!(dump_with_options(&v, &options).unwrap(), "k: \"yes\"\n");
}

#[test]
fn compat_mode_can_be_disabled() {
    let v: Value = [("k", "yes")].into_iter().collect();
    let options = dump_options! { no_compat_mode: true };
    assert_eq!(dump_with_options(&v, &options).unwrap(), "k: yes\n");
}

#[test]
fn indentation_width() {
    let v = load("a:\n  b:\n    - 1\n").unwrap();
    let options = dump_options! { indent: 4 };
    assert_eq!(dump_with_options(&v, &options).unwrap(), "a:\n    b:\n        - 1\n");
}

#[test]
fn zero_indent_is_rejected() {
    let options = dump_options! { indent: 0 };
    assert!(matches!(
        dump_with_options(&Value::Null, &options),
        Err(DumpError::InvalidOptions(_))
    ));
}

#[test]
fn multiline_strings_round_trip() {
    let v: Value = [
        ("script", "set -e\nmake\n"),
        ("stripped", "no newline\nat end"),
        ("kept", "trailing\n\n"),
        ("indented", "  leading spaces\nsecond\n"),
    ]
    .into_iter()
    .collect();
    let out = dump(&v).unwrap();
    assert!(out.starts_with("script: |\n  set -e\n  make\n"), "{out}");
    assert!(out.contains("stripped: |-\n"), "{out}");
    assert!(out.contains("kept: |+\n"), "{out}");
    assert!(out.contains("indented: |2\n"), "{out}");
    assert_eq!(load(&out).unwrap(), v);
}

#[test]
fn binary_and_timestamps() {
    let v = load("bin: !!binary aGVsbG8=\nwhen: 2001-12-14 21:59:43.10 -5\n").unwrap();
    let out = dump(&v).unwrap();
    assert_eq!(out, "bin: !!binary aGVsbG8=\nwhen: 2001-12-14T21:59:43.100-05:00\n");
    assert_eq!(load(&out).unwrap(), v);
}

#[test]
fn self_reference_gets_one_anchor_and_one_alias() {
    let doc = load_document("&a [*a]", &LoadOptions::default()).unwrap();
    let out = dump_document(&doc, &Default::default()).unwrap();
    assert_eq!(out, "&ref_0\n- *ref_0\n");
    assert_eq!(out.matches("&ref_").count(), 1);
    assert_eq!(out.matches("*ref_").count(), 1);

    // The output describes the same graph.
    let again = load_document(&out, &LoadOptions::default()).unwrap();
    let root = again.root();
    assert_eq!(again.node(root), &Node::Sequence(vec![root]));
}

#[test]
fn shared_collections_from_aliases() {
    let doc = load_document("a: &x [1]\nb: *x\n", &LoadOptions::default()).unwrap();
    let out = dump_document(&doc, &Default::default()).unwrap();
    assert_eq!(out, "a: &ref_0\n  - 1\nb: *ref_0\n");

    let copied = dump_document(&doc, &dump_options! { no_refs: true }).unwrap();
    assert_eq!(copied, "a:\n  - 1\nb:\n  - 1\n");
}

#[test]
fn self_referencing_mapping() {
    let doc = load_document("&a {self: *a}", &LoadOptions::default()).unwrap();
    assert_eq!(
        dump_document(&doc, &Default::default()).unwrap(),
        "&ref_0\nself: *ref_0\n"
    );
    let err = dump_document(&doc, &dump_options! { no_refs: true }).unwrap_err();
    assert!(matches!(err, DumpError::RecursionLimit { .. }), "{err}");
}

#[test]
fn default_recursion_limit_fits_a_default_thread_stack() {
    let err = std::thread::spawn(|| {
        let doc = load_document("&a [*a]", &LoadOptions::default()).unwrap();
        dump_document(&doc, &dump_options! { no_refs: true }).unwrap_err()
    })
    .join()
    .expect("dumper thread must not overflow its stack");
    assert!(matches!(err, DumpError::RecursionLimit { depth } if depth > 256), "{err}");
}

#[test]
fn colon_before_flow_indicator_is_quoted_in_flow() {
    let v = Value::Sequence(vec![
        "a:,b".into(),
        "a:]".into(),
        [("a:]", "")].into_iter().collect(),
    ]);
    let out = dump_with_options(&v, &dump_options! { flow_level: 0 }).unwrap();
    assert_eq!(out, "['a:,b', 'a:]', {'a:]': ''}]\n");
    assert_eq!(load(&out).unwrap(), v);
}

#[test]
fn empty_replacer_result_is_empty_output() {
    let replacer: Replacer = Rc::new(|_: &str, _: Value| -> Option<Value> { None });
    let options = dump_options! { replacer: Some(replacer) };
    assert_eq!(dump_with_options(&Value::Int(1), &options).unwrap(), "");
}

#[test]
fn flow_output_reloads() {
    let v = load("a: {b: [1, 'x y', {c: d}]}\n").unwrap();
    let out = dump_with_options(&v, &dump_options! { flow_level: 0 }).unwrap();
    assert_eq!(out, "{a: {b: [1, x y, {c: d}]}}\n");
    assert_eq!(load(&out).unwrap(), v);

    let condensed = dump_with_options(&v, &dump_options! { flow_level: 0, condense_flow: true }).unwrap();
    assert_eq!(condensed, "{\"a\":{\"b\":[1,x y,{\"c\":d}]}}\n");
    assert_eq!(load(&condensed).unwrap(), v);
}
