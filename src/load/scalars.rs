//! Plain, quoted and block scalars.

use super::reader::{EOF, is_eol, is_flow_indicator, is_white_space, is_ws_or_eol};
use super::{Parser, Pos, Result};
use crate::document::Node;
use crate::schema::Kind;
use crate::value::Value;

#[derive(Clone, Copy, PartialEq, Eq)]
enum Chomping {
    Clip,
    Strip,
    Keep,
}

/// Character denoted by a one-letter escape in a double-quoted scalar.
fn simple_escape(c: char) -> Option<char> {
    Some(match c {
        '0' => '\0',
        'a' => '\u{07}',
        'b' => '\u{08}',
        't' | '\t' => '\t',
        'n' => '\n',
        'v' => '\u{0B}',
        'f' => '\u{0C}',
        'r' => '\r',
        'e' => '\u{1B}',
        ' ' => ' ',
        '"' => '"',
        '/' => '/',
        '\\' => '\\',
        'N' => '\u{85}',
        '_' => '\u{A0}',
        'L' => '\u{2028}',
        'P' => '\u{2029}',
        _ => return None,
    })
}

/// Number of hex digits after `\x`, `\u` and `\U`.
fn escaped_hex_len(c: char) -> Option<u32> {
    match c {
        'x' => Some(2),
        'u' => Some(4),
        'U' => Some(8),
        _ => None,
    }
}

impl Parser<'_> {
    /// Store a scalar as the current result.
    fn finish_scalar(&mut self, text: String, start: Pos) {
        let id = self.push_node(Node::Scalar(Value::String(text.clone())), start);
        self.kind = Some(Kind::Scalar);
        self.result = Some(id);
        self.raw = Some(text);
        self.from_alias = false;
    }

    pub(super) fn read_plain_scalar(&mut self, node_indent: isize, within_flow: bool) -> Result<bool> {
        let start = self.pos();
        let mut ch = self.peek();

        if is_ws_or_eol(ch)
            || is_flow_indicator(ch)
            || matches!(ch, '#' | '&' | '*' | '!' | '|' | '>' | '\'' | '"' | '%' | '@' | '`')
        {
            return Ok(false);
        }
        if ch == '?' || ch == '-' {
            let following = self.at(self.position + 1);
            if is_ws_or_eol(following) || within_flow && is_flow_indicator(following) {
                return Ok(false);
            }
        }

        let mut result = String::new();
        let mut capture_start = self.position;
        let mut capture_end = self.position;
        let mut has_pending_content = false;
        let mut last_line = self.line;

        while ch != EOF {
            if ch == ':' {
                let following = self.at(self.position + 1);
                if is_ws_or_eol(following) || within_flow && is_flow_indicator(following) {
                    break;
                }
            } else if ch == '#' {
                if is_ws_or_eol(self.at(self.position - 1)) {
                    break;
                }
            } else if (self.position == self.line_start && self.test_document_separator())
                || within_flow && is_flow_indicator(ch)
            {
                break;
            } else if is_eol(ch) {
                let saved = self.pos();
                let saved_indent = self.line_indent;
                last_line = self.line;
                self.skip_separation_space(false, -1);

                if self.line_indent >= node_indent {
                    has_pending_content = true;
                    ch = self.peek();
                    continue;
                }
                self.set_pos(Pos {
                    position: capture_end,
                    ..saved
                });
                self.line_indent = saved_indent;
                break;
            }

            if has_pending_content {
                self.capture_segment(&mut result, capture_start, capture_end, false)?;
                Self::write_folded_lines(&mut result, self.line - last_line);
                capture_start = self.position;
                capture_end = self.position;
                has_pending_content = false;
            }

            if !is_white_space(ch) {
                capture_end = self.position + 1;
            }
            ch = self.bump();
        }

        self.capture_segment(&mut result, capture_start, capture_end, false)?;

        if result.is_empty() {
            return Ok(false);
        }
        self.finish_scalar(result, start);
        Ok(true)
    }

    pub(super) fn read_single_quoted_scalar(&mut self, node_indent: isize) -> Result<bool> {
        if self.peek() != '\'' {
            return Ok(false);
        }
        let start = self.pos();
        let mut result = String::new();
        self.position += 1;
        let mut capture_start = self.position;
        let mut capture_end = self.position;

        loop {
            let ch = self.peek();
            if ch == EOF {
                break;
            }
            if ch == '\'' {
                self.capture_segment(&mut result, capture_start, self.position, true)?;
                if self.bump() == '\'' {
                    capture_start = self.position;
                    self.position += 1;
                    capture_end = self.position;
                } else {
                    self.finish_scalar(result, start);
                    return Ok(true);
                }
            } else if is_eol(ch) {
                self.capture_segment(&mut result, capture_start, capture_end, true)?;
                let breaks = self.skip_separation_space(false, node_indent);
                Self::write_folded_lines(&mut result, breaks);
                capture_start = self.position;
                capture_end = self.position;
            } else if self.position == self.line_start && self.test_document_separator() {
                return Err(self.syntax(
                    "unexpected end of the document within a single quoted scalar",
                ));
            } else {
                self.position += 1;
                capture_end = self.position;
            }
        }

        Err(self.syntax("unexpected end of the stream within a single quoted scalar"))
    }

    pub(super) fn read_double_quoted_scalar(&mut self, node_indent: isize) -> Result<bool> {
        if self.peek() != '"' {
            return Ok(false);
        }
        let start = self.pos();
        let mut result = String::new();
        self.position += 1;
        let mut capture_start = self.position;
        let mut capture_end = self.position;

        loop {
            let ch = self.peek();
            if ch == EOF {
                break;
            }
            if ch == '"' {
                self.capture_segment(&mut result, capture_start, self.position, true)?;
                self.position += 1;
                self.finish_scalar(result, start);
                return Ok(true);
            } else if ch == '\\' {
                self.capture_segment(&mut result, capture_start, self.position, true)?;
                let escaped = self.bump();

                if is_eol(escaped) {
                    self.skip_separation_space(false, node_indent);
                } else if let Some(c) = simple_escape(escaped) {
                    result.push(c);
                    self.position += 1;
                } else if let Some(len) = escaped_hex_len(escaped) {
                    let mut code: u32 = 0;
                    for _ in 0..len {
                        let Some(digit) = self.bump().to_digit(16) else {
                            return Err(self.syntax("expected hexadecimal character"));
                        };
                        code = (code << 4) | digit;
                    }
                    let Some(c) = char::from_u32(code) else {
                        return Err(self.syntax(format!(
                            "escaped code point {code:#X} is not a valid character"
                        )));
                    };
                    result.push(c);
                    self.position += 1;
                } else {
                    return Err(self.syntax("unknown escape sequence"));
                }

                capture_start = self.position;
                capture_end = self.position;
            } else if is_eol(ch) {
                self.capture_segment(&mut result, capture_start, capture_end, true)?;
                let breaks = self.skip_separation_space(false, node_indent);
                Self::write_folded_lines(&mut result, breaks);
                capture_start = self.position;
                capture_end = self.position;
            } else if self.position == self.line_start && self.test_document_separator() {
                return Err(self.syntax(
                    "unexpected end of the document within a double quoted scalar",
                ));
            } else {
                self.position += 1;
                capture_end = self.position;
            }
        }

        Err(self.syntax("unexpected end of the stream within a double quoted scalar"))
    }

    /// Literal (`|`) and folded (`>`) block scalars.
    pub(super) fn read_block_scalar(&mut self, node_indent: isize) -> Result<bool> {
        let folding = match self.peek() {
            '|' => false,
            '>' => true,
            _ => return Ok(false),
        };
        let start = self.pos();
        let mut result = String::new();
        let mut chomping = Chomping::Clip;
        let mut did_read_content = false;
        let mut detected_indent = false;
        let mut text_indent = node_indent;
        let mut empty_lines = 0usize;
        let mut at_more_indented = false;

        let mut ch = self.peek();
        while ch != EOF {
            ch = self.bump();
            if ch == '+' || ch == '-' {
                if chomping != Chomping::Clip {
                    return Err(self.syntax("repeat of a chomping mode identifier"));
                }
                chomping = if ch == '+' { Chomping::Keep } else { Chomping::Strip };
            } else if let Some(digit) = ch.to_digit(10) {
                if digit == 0 {
                    return Err(self.syntax(
                        "bad explicit indentation width of a block scalar; it cannot be less than one",
                    ));
                }
                if detected_indent {
                    return Err(self.syntax("repeat of an indentation width identifier"));
                }
                // A top-level scalar counts its indentation from column zero.
                text_indent = node_indent.max(1) + digit as isize - 1;
                detected_indent = true;
            } else {
                break;
            }
        }

        if is_white_space(ch) {
            while is_white_space(ch) {
                ch = self.bump();
            }
            if ch == '#' {
                while !is_eol(ch) && ch != EOF {
                    ch = self.bump();
                }
            }
        }

        while ch != EOF {
            self.read_line_break()?;
            self.line_indent = 0;
            ch = self.peek();

            while (!detected_indent || self.line_indent < text_indent) && ch == ' ' {
                self.line_indent += 1;
                ch = self.bump();
            }

            if !detected_indent && self.line_indent > text_indent {
                text_indent = self.line_indent;
            }

            if is_eol(ch) {
                empty_lines += 1;
                continue;
            }

            if self.line_indent < text_indent {
                match chomping {
                    Chomping::Keep => {
                        let n = if did_read_content { 1 + empty_lines } else { empty_lines };
                        result.extend(std::iter::repeat_n('\n', n));
                    }
                    Chomping::Clip if did_read_content => result.push('\n'),
                    _ => {}
                }
                break;
            }

            if folding {
                if is_white_space(ch) {
                    // More-indented lines are kept as they are.
                    at_more_indented = true;
                    let n = if did_read_content { 1 + empty_lines } else { empty_lines };
                    result.extend(std::iter::repeat_n('\n', n));
                } else if at_more_indented {
                    at_more_indented = false;
                    result.extend(std::iter::repeat_n('\n', empty_lines + 1));
                } else if empty_lines == 0 {
                    if did_read_content {
                        result.push(' ');
                    }
                } else {
                    result.extend(std::iter::repeat_n('\n', empty_lines));
                }
            } else {
                let n = if did_read_content { 1 + empty_lines } else { empty_lines };
                result.extend(std::iter::repeat_n('\n', n));
            }

            did_read_content = true;
            detected_indent = true;
            empty_lines = 0;
            let capture_start = self.position;

            while !is_eol(ch) && ch != EOF {
                ch = self.bump();
            }
            self.capture_segment(&mut result, capture_start, self.position, false)?;
        }

        self.finish_scalar(result, start);
        Ok(true)
    }
}
