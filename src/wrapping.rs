//! Text shaping for block and double-quoted scalars: folding, indentation, block headers and
//! escapes.

use std::fmt::Write;

use crate::dump_quoting::{is_printable, needs_indent_indicator};

/// Block scalar header: optional indentation indicator, chomping indicator, line break.
pub(crate) fn block_header(s: &str, indent_per_level: usize) -> String {
    let mut header = String::new();
    if needs_indent_indicator(s) {
        header.push_str(&indent_per_level.to_string());
    }
    let clip = s.ends_with('\n');
    let keep = clip && (s.ends_with("\n\n") || s == "\n");
    if keep {
        header.push('+');
    } else if !clip {
        header.push('-');
    }
    header.push('\n');
    header
}

/// Prefix every non-empty line with `spaces` spaces.
pub(crate) fn indent_string(s: &str, spaces: usize) -> String {
    let pad = " ".repeat(spaces);
    let mut out = String::with_capacity(s.len() + spaces);
    for line in s.split_inclusive('\n') {
        if line != "\n" {
            out.push_str(&pad);
        }
        out.push_str(line);
    }
    out
}

pub(crate) fn drop_ending_newline(s: &str) -> &str {
    s.strip_suffix('\n').unwrap_or(s)
}

/// Fold `s` for a `>` block scalar so that loading it gives back `s`.
///
/// Every break between two regular lines gets an extra `\n` (a single break would fold into a
/// space). Lines starting with a space are "more indented" and are never folded.
pub(crate) fn fold_string(s: &str, width: usize) -> String {
    let first_end = s.find('\n').unwrap_or(s.len());
    let mut result = fold_line(&s[..first_end], width);
    let mut prev_more_indented = s.starts_with('\n') || s.starts_with(' ');

    let mut rest = &s[first_end..];
    while !rest.is_empty() {
        let breaks = rest.len() - rest.trim_start_matches('\n').len();
        let after = &rest[breaks..];
        let line_end = after.find('\n').unwrap_or(after.len());
        let line = &after[..line_end];
        let more_indented = line.starts_with(' ');

        result.push_str(&rest[..breaks]);
        if !prev_more_indented && !more_indented && !line.is_empty() {
            result.push('\n');
        }
        result.push_str(&fold_line(line, width));
        prev_more_indented = more_indented;
        rest = &after[line_end..];
    }
    result
}

/// Greedy folding of one line at single spaces, keeping each piece within `width` characters
/// where a break exists.
fn fold_line(line: &str, width: usize) -> String {
    if line.is_empty() || line.starts_with(' ') {
        return line.to_owned();
    }
    let chars: Vec<char> = line.chars().collect();
    let piece = |from: usize, to: usize| chars[from..to].iter().collect::<String>();

    let mut result = String::new();
    let mut start = 0usize;
    let mut curr = 0usize;
    // Break candidates: a space followed by a non-space.
    for next in 0..chars.len().saturating_sub(1) {
        if chars[next] != ' ' || chars[next + 1] == ' ' {
            continue;
        }
        if next - start > width {
            let end = if curr > start { curr } else { next };
            result.push('\n');
            result.push_str(&piece(start, end));
            start = end + 1;
        }
        curr = next;
    }

    result.push('\n');
    if chars.len() - start > width && curr > start {
        result.push_str(&piece(start, curr));
        result.push('\n');
        result.push_str(&piece(curr + 1, chars.len()));
    } else {
        result.push_str(&piece(start, chars.len()));
    }
    result.split_off(1)
}

fn named_escape(c: char) -> Option<&'static str> {
    Some(match c {
        '\0' => "\\0",
        '\u{07}' => "\\a",
        '\u{08}' => "\\b",
        '\t' => "\\t",
        '\n' => "\\n",
        '\u{0B}' => "\\v",
        '\u{0C}' => "\\f",
        '\r' => "\\r",
        '\u{1B}' => "\\e",
        '"' => "\\\"",
        '\\' => "\\\\",
        '\u{85}' => "\\N",
        '\u{A0}' => "\\_",
        '\u{2028}' => "\\L",
        '\u{2029}' => "\\P",
        _ => return None,
    })
}

/// Body of a double-quoted scalar: named escapes where YAML has them, otherwise `\xXX`,
/// `\uXXXX` or `\UXXXXXXXX` sized by the code point.
pub(crate) fn escape_double_quoted(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    for c in s.chars() {
        if let Some(escape) = named_escape(c) {
            out.push_str(escape);
        } else if is_printable(c) {
            out.push(c);
        } else {
            let code = u32::from(c);
            // Writing into a String cannot fail.
            let _ = match code {
                0..=0xFF => write!(out, "\\x{code:02X}"),
                0x100..=0xFFFF => write!(out, "\\u{code:04X}"),
                _ => write!(out, "\\U{code:08X}"),
            };
        }
    }
    out
}
