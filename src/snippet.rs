use annotate_snippets::{
    AnnotationKind, Level, Renderer, Snippet as AnnotateSnippet, renderer::DecorStyle,
};

use crate::mark::Mark;

/// Render `msg` against the source window around `mark`.
///
/// The window holds two lines before and after the marked line, clipped to the input. Lines
/// longer than `2 * crop_radius` characters are cropped horizontally around the marked column
/// (`crop_radius == 0` disables cropping). Returns `None` if the mark lies outside its buffer.
#[cold]
#[inline(never)]
pub(crate) fn render(mark: &Mark, msg: &str, crop_radius: usize) -> Option<String> {
    let text: &str = &mark.buffer;
    let starts = line_starts(text);
    if starts.is_empty() {
        return None;
    }

    let row = mark.line;
    let col = mark.column;
    if row == 0 || row > starts.len() || mark.offset > text.len() {
        return None;
    }

    // Minimal span: usually one character, empty at EOL/EOF.
    let start = mark.offset;
    let end = match text.as_bytes().get(start) {
        Some(b'\n') | Some(b'\r') => start,
        _ => next_char_boundary(text, start).unwrap_or(start),
    };

    let total_lines = starts.len();
    let window_start_row = row.saturating_sub(2).max(1);
    let window_end_row = row.saturating_add(2).min(total_lines);
    let window_start_row = window_start_row.min(window_end_row);

    let window_start = starts[window_start_row - 1];
    let window_end = if window_end_row < total_lines {
        starts[window_end_row]
    } else {
        text.len()
    };
    let window_text = &text[window_start..window_end];

    let local_start = start.saturating_sub(window_start).min(window_text.len());
    let local_end = end.saturating_sub(window_start).min(window_text.len());

    let (window_text, local_start, local_end) = crop_window_text(
        window_text,
        window_start_row,
        row,
        col,
        crop_radius,
        local_start,
        local_end,
    );

    let path = mark.name.as_deref().unwrap_or("<input>");
    let report = &[Level::ERROR
        .primary_title(format!("line {row} column {col}: {msg}"))
        .element(
            AnnotateSnippet::source(&window_text)
                .line_start(window_start_row)
                .path(path)
                .fold(false)
                .annotation(AnnotationKind::Primary.span(local_start..local_end).label(msg)),
        )];

    // Plain ASCII carets keep error strings stable and free of escape sequences.
    let renderer = Renderer::plain().decor_style(DecorStyle::Ascii);
    Some(renderer.render(report).to_string())
}

/// Crop each line of the window to the same column range around the error and drop `\r`.
///
/// Returns the new window text with the annotation span rebased onto it.
fn crop_window_text(
    window_text: &str,
    window_start_row: usize,
    error_row: usize,
    error_col: usize,
    crop_radius: usize,
    local_start: usize,
    local_end: usize,
) -> (String, usize, usize) {
    if crop_radius == 0 && !window_text.contains('\r') && is_terminal_clean(window_text) {
        return (window_text.to_owned(), local_start, local_end);
    }

    let do_crop = crop_radius != 0;
    let left_col = error_col.saturating_sub(crop_radius).max(1);
    let right_col = error_col.saturating_add(crop_radius);

    let mut out = String::with_capacity(window_text.len().min(4096));
    let mut new_start = local_start;
    let mut new_end = local_end;
    let mut old_pos = 0usize;
    let mut row = window_start_row;

    for raw in window_text.split_inclusive('\n') {
        let had_nl = raw.ends_with('\n');
        let body = raw.strip_suffix('\n').unwrap_or(raw);
        let line = body.strip_suffix('\r').unwrap_or(body);

        let line_start_new = out.len();
        let (rendered, crop) = if do_crop {
            crop_line_by_cols(line, left_col, right_col)
        } else {
            (line.to_owned(), LineCrop::default())
        };
        out.push_str(&rendered);
        if had_nl {
            out.push('\n');
        }

        if row == error_row {
            let in_line_start = local_start.saturating_sub(old_pos).min(line.len());
            let in_line_end = local_end.saturating_sub(old_pos).min(line.len());
            let max = line_start_new + rendered.len();
            new_start = (line_start_new + crop.prefix_bytes + in_line_start.saturating_sub(crop.start_byte)).min(max);
            new_end = (line_start_new + crop.prefix_bytes + in_line_end.saturating_sub(crop.start_byte)).min(max);
        }

        old_pos += raw.len();
        row += 1;
    }

    if row == error_row && window_text.ends_with('\n') {
        new_start = out.len();
        new_end = out.len();
    }
    if new_end < new_start {
        new_end = new_start;
    }

    (sanitize_preserve_len(out), new_start, new_end)
}

#[derive(Clone, Copy, Debug, Default)]
struct LineCrop {
    start_byte: usize,
    prefix_bytes: usize,
}

/// Crop one line to the 1-based, inclusive column range `[left, right]`, marking cuts with `…`.
fn crop_line_by_cols(line: &str, left: usize, right: usize) -> (String, LineCrop) {
    let len_cols = line.chars().count();
    if len_cols == 0 || left > len_cols || (left <= 1 && right >= len_cols) {
        return (line.to_owned(), LineCrop::default());
    }

    let end_col_excl = right.saturating_add(1).min(len_cols + 1);
    let start_byte = col_to_byte_offset(line, left).unwrap_or(0);
    let end_byte = col_to_byte_offset(line, end_col_excl).unwrap_or(line.len());

    let left_clipped = start_byte > 0;
    let right_clipped = end_byte < line.len();

    let mut out = String::new();
    if left_clipped {
        out.push('…');
    }
    out.push_str(&line[start_byte..end_byte]);
    if right_clipped {
        out.push('…');
    }
    let prefix_bytes = if left_clipped { '…'.len_utf8() } else { 0 };
    (
        out,
        LineCrop {
            start_byte,
            prefix_bytes,
        },
    )
}

/// 1-based column to byte offset within a line; `len + 1` points at EOL.
fn col_to_byte_offset(line: &str, col: usize) -> Option<usize> {
    if col == 0 {
        return None;
    }
    match line.char_indices().nth(col - 1) {
        Some((i, _)) => Some(i),
        None if col == line.chars().count() + 1 => Some(line.len()),
        None => None,
    }
}

/// Byte offsets of every line start. A trailing `\n` contributes a final empty line.
fn line_starts(source: &str) -> Vec<usize> {
    if source.is_empty() {
        return Vec::new();
    }
    let mut starts = vec![0usize];
    starts.extend(
        source
            .bytes()
            .enumerate()
            .filter(|(_, b)| *b == b'\n')
            .map(|(i, _)| i + 1),
    );
    starts
}

fn next_char_boundary(source: &str, start: usize) -> Option<usize> {
    let ch = source.get(start..)?.chars().next()?;
    Some(start + ch.len_utf8())
}

/// True if `text` holds no control characters besides `\n` and `\t`.
fn is_terminal_clean(text: &str) -> bool {
    !text
        .chars()
        .any(|c| (c.is_control() && c != '\n' && c != '\t') || c == '\u{7f}')
}

/// Neutralize control characters without changing byte offsets.
///
/// C0 controls and DEL become a space, C1 controls (two bytes in UTF-8) become NBSP.
fn sanitize_preserve_len(s: String) -> String {
    if is_terminal_clean(&s) {
        return s;
    }
    s.chars()
        .map(|c| match c {
            '\n' | '\t' => c,
            '\u{0}'..='\u{1f}' | '\u{7f}' => ' ',
            '\u{80}'..='\u{9f}' => '\u{a0}',
            _ => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn mark_at(text: &str, offset: usize, line: usize, column: usize) -> Mark {
        Mark::new(None, Arc::from(text), offset, line, column)
    }

    #[test]
    fn renders_caret_under_error_column() {
        let text = "a: 1\nb: [1, 2\nc: 3\n";
        let rendered = render(&mark_at(text, 10, 2, 6), "unexpected end", 0).unwrap();
        assert!(rendered.contains("line 2 column 6: unexpected end"));
        assert!(rendered.contains("b: [1, 2"));
        assert!(rendered.contains('^'));
    }

    #[test]
    fn window_is_two_lines_each_side() {
        let text = "l1\nl2\nl3\nl4\nl5\nl6\nl7\n";
        let rendered = render(&mark_at(text, 9, 4, 1), "here", 0).unwrap();
        assert!(rendered.contains("l2"));
        assert!(rendered.contains("l6"));
        assert!(!rendered.contains("l1"));
        assert!(!rendered.contains("l7"));
    }

    #[test]
    fn empty_buffer_has_no_snippet() {
        assert!(render(&mark_at("", 0, 1, 1), "x", 0).is_none());
    }

    #[test]
    fn long_lines_are_cropped() {
        let line = format!("{}X{}", "a".repeat(200), "b".repeat(200));
        let rendered = render(&mark_at(&line, 200, 1, 201), "here", 10).unwrap();
        assert!(rendered.contains('…'));
        assert!(!rendered.contains(&"a".repeat(50)));
    }

    #[test]
    fn control_characters_are_neutralized() {
        let s = sanitize_preserve_len("a\u{1b}[31mb\n".to_string());
        assert_eq!(s.len(), "a\u{1b}[31mb\n".len());
        assert!(!s.contains('\u{1b}'));
    }

    #[test]
    fn crop_line_keeps_short_lines() {
        let (out, crop) = crop_line_by_cols("abc", 1, 10);
        assert_eq!(out, "abc");
        assert_eq!(crop.start_byte, 0);
    }
}
