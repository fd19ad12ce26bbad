use indoc::indoc;

use yaml_codec::{Value, load};

fn text(yaml: &str) -> String {
    match load(yaml).unwrap() {
        Value::String(s) => s,
        other => panic!("expected a string, got {other:?}"),
    }
}

#[test]
fn explicit_indent_with_strip_chomping() {
    assert_eq!(text("|2-\n  hi\n"), "hi");
}

#[test]
fn chomping_modes() {
    assert_eq!(text("|\n  x\n\n"), "x\n");
    assert_eq!(text("|-\n  x\n\n"), "x");
    assert_eq!(text("|+\n  x\n\n"), "x\n\n");
}

#[test]
fn literal_keeps_line_breaks() {
    let yaml = indoc! {"
        script: |
          echo one
            indented
          echo two
        after: 1
    "};
    let v = load(yaml).unwrap();
    assert_eq!(v["script"].as_str(), Some("echo one\n  indented\necho two\n"));
    assert_eq!(v["after"], Value::Int(1));
}

#[test]
fn folded_joins_lines_and_keeps_paragraphs() {
    let yaml = indoc! {"
        >
          first
          line

          second
    "};
    assert_eq!(text(yaml), "first line\nsecond\n");
}

#[test]
fn folded_never_folds_more_indented_lines() {
    assert_eq!(text(">\n  a\n    b\n  c\n"), "a\n  b\nc\n");
}

#[test]
fn indentation_indicator_keeps_leading_spaces() {
    let v = load("a: |1\n  x\n").unwrap();
    assert_eq!(v["a"].as_str(), Some(" x\n"));
}

#[test]
fn header_comment_is_ignored() {
    assert_eq!(text("| # note\n  body\n"), "body\n");
}

#[test]
fn malformed_headers() {
    let err = load("|++\n  x\n").unwrap_err();
    assert!(err.reason().contains("repeat of a chomping mode identifier"), "{err}");
    let err = load("|0\n  x\n").unwrap_err();
    assert!(err.reason().contains("cannot be less than one"), "{err}");
    let err = load("|22\n  x\n").unwrap_err();
    assert!(err.reason().contains("repeat of an indentation width identifier"), "{err}");
}

#[test]
fn empty_block_scalar() {
    assert_eq!(load("a: |\nb: 1\n").unwrap()["a"].as_str(), Some(""));
}
