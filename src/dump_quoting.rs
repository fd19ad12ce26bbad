//! Scalar style selection for the dumper.
//!
//! A string is scanned once. Characters outside the printable set force double quotes.
//! Line breaks and over-wide lines select a block style. Anything else is plain when it is
//! unambiguous and quoted otherwise.

use crate::dump_options::QuotingType;
use crate::parse_scalars::{is_yaml11_base60, is_yaml11_bool};

const BOM: char = '\u{FEFF}';

/// How a string scalar is written.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ScalarStyle {
    Plain,
    Single,
    Double,
    Literal,
    Folded,
}

/// Characters that may appear unescaped in a YAML stream.
#[inline]
pub(crate) fn is_printable(c: char) -> bool {
    matches!(c,
        '\u{20}'..='\u{7E}'
        | '\u{A1}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
        && c != '\u{2028}'
        && c != '\u{2029}'
        && c != BOM
}

#[inline]
fn is_white_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

#[inline]
fn is_ns_char_or_white_space(c: char) -> bool {
    is_printable(c) && c != '\r' && c != '\n'
}

/// May `c` follow `prev` inside a plain scalar? Flow indicators are only fine in block
/// context.
#[inline]
fn is_plain_safe(c: char, prev: Option<char>, in_block: bool) -> bool {
    let ns_or_ws = is_ns_char_or_white_space(c);
    let ns = ns_or_ws && !is_white_space(c);
    let allowed = if in_block {
        ns_or_ws
    } else {
        ns_or_ws && !matches!(c, ',' | '[' | ']' | '{' | '}')
    };
    let after_colon = prev == Some(':');
    (allowed && c != '#' && !(after_colon && !ns))
        || (prev.is_some_and(|p| is_ns_char_or_white_space(p) && !is_white_space(p)) && c == '#')
        || (allowed && after_colon && ns)
}

/// First character of a plain scalar: no indicator that would start other syntax.
#[inline]
fn is_plain_safe_first(c: char) -> bool {
    is_printable(c)
        && !is_white_space(c)
        && !matches!(
            c,
            '-' | '?'
                | ':'
                | ','
                | '['
                | ']'
                | '{'
                | '}'
                | '#'
                | '&'
                | '*'
                | '!'
                | '|'
                | '='
                | '>'
                | '\''
                | '"'
                | '%'
                | '@'
                | '`'
        )
}

#[inline]
fn is_plain_safe_last(c: char) -> bool {
    !is_white_space(c) && c != ':'
}

/// Block scalars whose content starts with a space (after any line breaks) need an explicit
/// indentation indicator.
pub(crate) fn needs_indent_indicator(s: &str) -> bool {
    s.trim_start_matches('\n').starts_with(' ')
}

/// Strings a YAML 1.1 reader would take for a boolean or a base-60 number.
pub(crate) fn needs_compat_quotes(s: &str) -> bool {
    is_yaml11_bool(s) || is_yaml11_base60(s)
}

/// Inputs to [`choose_scalar_style`] besides the string itself.
pub(crate) struct StyleContext<'a> {
    /// Keys and strings at or below the flow level must stay on one line.
    pub single_line_only: bool,
    pub indent_per_level: usize,
    /// `None` is unlimited.
    pub line_width: Option<usize>,
    pub quoting_type: QuotingType,
    pub force_quotes: bool,
    pub in_block: bool,
    /// True if an implicit type of the schema would resolve the plain text.
    pub is_ambiguous: &'a dyn Fn(&str) -> bool,
}

fn quoted(quoting_type: QuotingType) -> ScalarStyle {
    match quoting_type {
        QuotingType::Single => ScalarStyle::Single,
        QuotingType::Double => ScalarStyle::Double,
    }
}

/// `---` or `...` at a line start would end the document.
fn starts_with_marker(s: &str) -> bool {
    s.starts_with("---") || s.starts_with("...")
}

/// Pick the style for a non-empty string.
pub(crate) fn choose_scalar_style(s: &str, ctx: &StyleContext<'_>) -> ScalarStyle {
    let chars: Vec<char> = s.chars().collect();
    let (Some(&first), Some(&last)) = (chars.first(), chars.last()) else {
        return quoted(ctx.quoting_type);
    };
    let mut plain =
        is_plain_safe_first(first) && is_plain_safe_last(last) && !starts_with_marker(s);
    let mut has_line_break = false;
    let mut has_foldable_line = false;
    let mut prev: Option<char> = None;

    // A line is foldable when it is too wide and not more-indented.
    let mut line_start = 0usize;
    let foldable = |start: usize, end: usize| {
        ctx.line_width
            .is_some_and(|width| end - start > width && chars.get(start) != Some(&' '))
    };

    if ctx.single_line_only || ctx.force_quotes {
        for &c in &chars {
            if !is_printable(c) {
                return ScalarStyle::Double;
            }
            plain = plain && is_plain_safe(c, prev, ctx.in_block);
            prev = Some(c);
        }
    } else {
        for (i, &c) in chars.iter().enumerate() {
            if c == '\n' {
                has_line_break = true;
                has_foldable_line = has_foldable_line || foldable(line_start, i);
                line_start = i + 1;
            } else if !is_printable(c) {
                return ScalarStyle::Double;
            }
            plain = plain && is_plain_safe(c, prev, ctx.in_block);
            prev = Some(c);
        }
        has_foldable_line = has_foldable_line || foldable(line_start, chars.len());
    }

    if !has_line_break && !has_foldable_line {
        if plain && !ctx.force_quotes && !(ctx.is_ambiguous)(s) {
            return ScalarStyle::Plain;
        }
        return quoted(ctx.quoting_type);
    }
    if ctx.indent_per_level > 9 && needs_indent_indicator(s) {
        return ScalarStyle::Double;
    }
    if !ctx.force_quotes {
        return if has_foldable_line {
            ScalarStyle::Folded
        } else {
            ScalarStyle::Literal
        };
    }
    quoted(ctx.quoting_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn never(_: &str) -> bool {
        false
    }

    fn ctx(ambiguous: &dyn Fn(&str) -> bool) -> StyleContext<'_> {
        StyleContext {
            single_line_only: false,
            indent_per_level: 2,
            line_width: Some(80),
            quoting_type: QuotingType::Single,
            force_quotes: false,
            in_block: true,
            is_ambiguous: ambiguous,
        }
    }

    #[test]
    fn simple_words_are_plain() {
        assert_eq!(choose_scalar_style("hello world", &ctx(&never)), ScalarStyle::Plain);
        assert_eq!(choose_scalar_style("a:b", &ctx(&never)), ScalarStyle::Plain);
        assert_eq!(choose_scalar_style("a#b", &ctx(&never)), ScalarStyle::Plain);
    }

    #[test]
    fn indicators_force_quotes() {
        for s in ["- a", "a: b", "a #b", "trailing ", " leading", "key:", "&x", "'q'"] {
            assert_eq!(choose_scalar_style(s, &ctx(&never)), ScalarStyle::Single, "{s:?}");
        }
    }

    #[test]
    fn ambiguous_strings_are_quoted() {
        let looks_like_int = |s: &str| s.parse::<i64>().is_ok();
        assert_eq!(choose_scalar_style("12", &ctx(&looks_like_int)), ScalarStyle::Single);
        let mut c = ctx(&looks_like_int);
        c.quoting_type = QuotingType::Double;
        assert_eq!(choose_scalar_style("12", &c), ScalarStyle::Double);
    }

    #[test]
    fn flow_indicators_only_matter_in_flow() {
        let mut c = ctx(&never);
        assert_eq!(choose_scalar_style("a,b", &c), ScalarStyle::Plain);
        c.in_block = false;
        assert_eq!(choose_scalar_style("a,b", &c), ScalarStyle::Single);
    }

    #[test]
    fn flow_indicators_after_a_colon() {
        let mut c = ctx(&never);
        for s in ["a:,b", "a:]", "a:{b", "x:}"] {
            assert_eq!(choose_scalar_style(s, &c), ScalarStyle::Plain, "{s:?}");
        }
        c.in_block = false;
        for s in ["a:,b", "a:]", "a:{b", "x:}"] {
            assert_eq!(choose_scalar_style(s, &c), ScalarStyle::Single, "{s:?}");
        }
        assert_eq!(choose_scalar_style("a:b", &c), ScalarStyle::Plain);
    }

    #[test]
    fn control_characters_need_double_quotes() {
        assert_eq!(choose_scalar_style("a\tb", &ctx(&never)), ScalarStyle::Double);
        assert_eq!(choose_scalar_style("bell\u{7}", &ctx(&never)), ScalarStyle::Double);
    }

    #[test]
    fn line_breaks_select_block_styles() {
        assert_eq!(choose_scalar_style("a\nb\n", &ctx(&never)), ScalarStyle::Literal);
        let long = format!("{}\nshort", "word ".repeat(30));
        assert_eq!(choose_scalar_style(&long, &ctx(&never)), ScalarStyle::Folded);

        let mut keyish = ctx(&never);
        keyish.single_line_only = true;
        assert_eq!(choose_scalar_style("a\nb", &keyish), ScalarStyle::Double);
    }

    #[test]
    fn more_indented_long_lines_are_not_folded() {
        let s = format!("x\n {}", "w ".repeat(60));
        assert_eq!(choose_scalar_style(&s, &ctx(&never)), ScalarStyle::Literal);
    }

    #[test]
    fn document_markers_are_quoted() {
        assert_eq!(choose_scalar_style("...", &ctx(&never)), ScalarStyle::Single);
        assert_eq!(choose_scalar_style("... more", &ctx(&never)), ScalarStyle::Single);
        assert_eq!(choose_scalar_style("a...", &ctx(&never)), ScalarStyle::Plain);
    }

    #[test]
    fn compat_words() {
        assert!(needs_compat_quotes("yes"));
        assert!(needs_compat_quotes("1:20"));
        assert!(!needs_compat_quotes("yesterday"));
    }

    #[test]
    fn indent_indicator_detection() {
        assert!(needs_indent_indicator("  x"));
        assert!(needs_indent_indicator("\n\n x"));
        assert!(!needs_indent_indicator("x\n y"));
    }
}
