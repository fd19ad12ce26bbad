//! Character classes, line tracking and diagnostics shared by all readers.

use std::sync::Arc;

use super::{Parser, Pos, Result};
use crate::error::{Error, ErrorKind, Warning};
use crate::mark::Mark;

/// Sentinel after the last input character.
pub(super) const EOF: char = '\0';

pub(super) fn is_eol(c: char) -> bool {
    c == '\n' || c == '\r'
}

pub(super) fn is_white_space(c: char) -> bool {
    c == ' ' || c == '\t'
}

pub(super) fn is_ws_or_eol(c: char) -> bool {
    is_white_space(c) || is_eol(c)
}

pub(super) fn is_flow_indicator(c: char) -> bool {
    matches!(c, ',' | '[' | ']' | '{' | '}')
}

/// Characters YAML does not allow unescaped in a stream.
pub(super) fn is_non_printable(c: char) -> bool {
    matches!(c,
        '\u{00}'..='\u{08}'
        | '\u{0B}'
        | '\u{0C}'
        | '\u{0E}'..='\u{1F}'
        | '\u{7F}'..='\u{84}'
        | '\u{86}'..='\u{9F}'
        | '\u{FFFE}'
        | '\u{FFFF}')
}

/// JSON allows tab and everything from space up inside strings.
fn is_json_char(c: char) -> bool {
    c == '\t' || c >= ' '
}

impl Parser<'_> {
    #[inline]
    pub(super) fn peek(&self) -> char {
        self.at(self.position)
    }

    /// Character at `index`, or the sentinel past the end.
    #[inline]
    pub(super) fn at(&self, index: usize) -> char {
        self.input.get(index).copied().unwrap_or(EOF)
    }

    /// Advance one character and return the new current one.
    #[inline]
    pub(super) fn bump(&mut self) -> char {
        self.position += 1;
        self.peek()
    }

    pub(super) fn pos(&self) -> Pos {
        Pos {
            position: self.position,
            line: self.line,
            line_start: self.line_start,
        }
    }

    pub(super) fn set_pos(&mut self, pos: Pos) {
        self.position = pos.position;
        self.line = pos.line;
        self.line_start = pos.line_start;
    }

    pub(super) fn slice(&self, start: usize, end: usize) -> String {
        self.input[start..end].iter().collect()
    }

    /// Consume the line break at the cursor; the caller has checked it is one.
    fn consume_line_break(&mut self) {
        if self.peek() == '\r' {
            self.position += 1;
        }
        if self.peek() == '\n' {
            self.position += 1;
        }
        self.line += 1;
        self.line_start = self.position;
        self.first_tab_in_line = None;
    }

    pub(super) fn read_line_break(&mut self) -> Result<()> {
        if !is_eol(self.peek()) {
            return Err(self.syntax("a line break is expected"));
        }
        self.consume_line_break();
        Ok(())
    }

    /// Skip white space, line breaks and (optionally) comments, tracking the indentation
    /// of the last line reached. Returns the number of line breaks crossed.
    ///
    /// `check_indent >= 0` warns when a new line is indented less than that.
    pub(super) fn skip_separation_space(&mut self, allow_comments: bool, check_indent: isize) -> usize {
        let mut line_breaks = 0;
        let mut ch = self.peek();

        while ch != EOF {
            while is_white_space(ch) {
                if ch == '\t' && self.first_tab_in_line.is_none() {
                    self.first_tab_in_line = Some(self.position);
                }
                ch = self.bump();
            }

            if allow_comments && ch == '#' {
                loop {
                    ch = self.bump();
                    if is_eol(ch) || ch == EOF {
                        break;
                    }
                }
            }

            if !is_eol(ch) {
                break;
            }
            self.consume_line_break();
            ch = self.peek();
            line_breaks += 1;
            self.line_indent = 0;
            while ch == ' ' {
                self.line_indent += 1;
                ch = self.bump();
            }
        }

        if check_indent >= 0 && line_breaks != 0 && self.line_indent < check_indent {
            self.warn("deficient indentation");
        }
        line_breaks
    }

    /// `---` or `...` followed by white space or the end of input. The caller checks that the
    /// cursor is at the start of a line.
    pub(super) fn test_document_separator(&self) -> bool {
        let ch = self.peek();
        if (ch == '-' || ch == '.')
            && self.at(self.position + 1) == ch
            && self.at(self.position + 2) == ch
        {
            let after = self.at(self.position + 3);
            return after == EOF || is_ws_or_eol(after);
        }
        false
    }

    /// Append `input[start..end]` to `out`, rejecting characters the scalar style cannot hold.
    pub(super) fn capture_segment(
        &self,
        out: &mut String,
        start: usize,
        end: usize,
        quoted: bool,
    ) -> Result<()> {
        if start >= end {
            return Ok(());
        }
        let segment = &self.input[start..end];
        if quoted && self.options.json {
            if !segment.iter().all(|&c| is_json_char(c)) {
                return Err(self.syntax("expected valid JSON character"));
            }
        } else if segment.iter().any(|&c| is_non_printable(c)) {
            return Err(self.syntax("the stream contains non-printable characters"));
        }
        out.extend(segment);
        Ok(())
    }

    /// Line folding: one break becomes a space, `n` breaks become `n - 1` newlines.
    pub(super) fn write_folded_lines(out: &mut String, count: usize) {
        if count == 1 {
            out.push(' ');
        } else if count > 1 {
            out.extend(std::iter::repeat_n('\n', count - 1));
        }
    }

    pub(super) fn mark_at(&self, pos: Pos) -> Mark {
        let position = pos.position.min(self.length);
        let offset = self.input[..position].iter().map(|c| c.len_utf8()).sum();
        let column = position.saturating_sub(pos.line_start) + 1;
        Mark::new(
            self.name.clone(),
            Arc::clone(&self.source),
            offset,
            pos.line + 1,
            column,
        )
    }

    pub(super) fn error_at(&self, kind: ErrorKind, pos: Pos) -> Error {
        Error::new(kind, self.mark_at(pos))
            .with_rendering(self.options.with_snippet, self.options.crop_radius)
    }

    pub(super) fn error(&self, kind: ErrorKind) -> Error {
        self.error_at(kind, self.pos())
    }

    pub(super) fn syntax(&self, msg: impl Into<String>) -> Error {
        self.error(ErrorKind::Syntax(msg.into()))
    }

    /// Deliver an advisory warning to the handler, or log it.
    pub(super) fn warn(&self, reason: &str) {
        let warning = Warning {
            reason: reason.to_owned(),
            mark: self.mark_at(self.pos()),
        };
        match &self.options.on_warning {
            Some(handler) => match handler.try_borrow_mut() {
                Ok(mut handler) => (&mut *handler)(&warning),
                Err(_) => tracing::warn!("{warning}"),
            },
            None => tracing::warn!("{warning}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_printable_classes() {
        assert!(is_non_printable('\u{1}'));
        assert!(is_non_printable('\u{7F}'));
        assert!(!is_non_printable('\u{85}'));
        assert!(!is_non_printable('\t'));
        assert!(!is_non_printable('é'));
        assert!(is_non_printable('\u{FFFE}'));
    }

    #[test]
    fn folded_line_counts() {
        let mut s = String::from("a");
        Parser::write_folded_lines(&mut s, 1);
        Parser::write_folded_lines(&mut s, 3);
        assert_eq!(s, "a \n\n");
    }
}
