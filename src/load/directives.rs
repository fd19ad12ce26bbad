//! `%YAML` and `%TAG` directives, tag handles and tag URIs.

use super::reader::{EOF, is_eol, is_white_space, is_ws_or_eol};
use super::{Parser, Result};

/// `!`, `!!` or `!word!` with ASCII letters and dashes.
pub(super) fn is_tag_handle(handle: &str) -> bool {
    match handle {
        "!" | "!!" => true,
        _ => handle
            .strip_prefix('!')
            .and_then(|rest| rest.strip_suffix('!'))
            .is_some_and(|word| {
                !word.is_empty() && word.chars().all(|c| c.is_ascii_alphabetic() || c == '-')
            }),
    }
}

fn is_uri_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "-#;/?:@&=+$,_.!~*'()[]".contains(c)
}

/// Tag URI: a first character that is not a flow indicator, then URI characters and
/// `%XX` escapes.
pub(super) fn is_tag_uri(uri: &str) -> bool {
    let mut chars = uri.chars();
    match chars.next() {
        None => return false,
        Some(c) if matches!(c, ',' | '[' | ']' | '{' | '}') => return false,
        Some(_) => {}
    }
    while let Some(c) = chars.next() {
        if c == '%' {
            let hex = [chars.next(), chars.next()];
            if !hex.iter().all(|h| h.is_some_and(|h| h.is_ascii_hexdigit())) {
                return false;
            }
        } else if !is_uri_char(c) {
            return false;
        }
    }
    true
}

/// Percent-decode a URI; `None` if the bytes are not UTF-8.
pub(super) fn decode_uri(uri: &str) -> Option<String> {
    let bytes = uri.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let hex = uri.get(i + 1..i + 3)?;
            out.push(u8::from_str_radix(hex, 16).ok()?);
            i += 3;
        } else {
            out.push(bytes[i]);
            i += 1;
        }
    }
    String::from_utf8(out).ok()
}

impl Parser<'_> {
    /// Read directive lines at the start of a document. Returns whether any was present.
    pub(super) fn read_directives(&mut self) -> Result<bool> {
        let mut has_directives = false;

        while self.peek() != EOF {
            self.skip_separation_space(true, -1);
            let mut ch = self.peek();
            if self.line_indent > 0 || ch != '%' {
                break;
            }

            has_directives = true;
            ch = self.bump();
            let start = self.position;
            while ch != EOF && !is_ws_or_eol(ch) {
                ch = self.bump();
            }
            let name = self.slice(start, self.position);
            if name.is_empty() {
                return Err(self.syntax(
                    "directive name must not be less than one character in length",
                ));
            }

            let mut args = Vec::new();
            while ch != EOF {
                while is_white_space(ch) {
                    ch = self.bump();
                }
                if ch == '#' {
                    while ch != EOF && !is_eol(ch) {
                        ch = self.bump();
                    }
                    break;
                }
                if is_eol(ch) {
                    break;
                }
                let start = self.position;
                while ch != EOF && !is_ws_or_eol(ch) {
                    ch = self.bump();
                }
                args.push(self.slice(start, self.position));
            }

            if ch != EOF {
                self.read_line_break()?;
            }

            match name.as_str() {
                "YAML" => self.yaml_directive(&args)?,
                "TAG" => self.tag_directive(&args)?,
                _ => self.warn(&format!("unknown document directive \"{name}\"")),
            }
        }
        Ok(has_directives)
    }

    fn yaml_directive(&mut self, args: &[String]) -> Result<()> {
        if self.version.is_some() {
            return Err(self.syntax("duplication of %YAML directive"));
        }
        let [version] = args else {
            return Err(self.syntax("YAML directive accepts exactly one argument"));
        };
        let parsed = version
            .split_once('.')
            .filter(|(major, minor)| {
                [major, minor]
                    .iter()
                    .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_digit()))
            })
            .and_then(|(major, minor)| Some((major.parse::<u64>().ok()?, minor.parse::<u64>().ok()?)));
        let Some((major, minor)) = parsed else {
            return Err(self.syntax("ill-formed argument of the YAML directive"));
        };
        if major != 1 {
            return Err(self.syntax("unacceptable YAML version of the document"));
        }

        self.version = Some(version.clone());
        self.check_line_breaks = self.check_line_breaks || minor < 2;
        if minor != 1 && minor != 2 {
            self.warn("unsupported YAML version of the document");
        }
        Ok(())
    }

    fn tag_directive(&mut self, args: &[String]) -> Result<()> {
        let [handle, prefix] = args else {
            return Err(self.syntax("TAG directive accepts exactly two arguments"));
        };
        if !is_tag_handle(handle) {
            return Err(self.syntax(
                "ill-formed tag handle (first argument) of the TAG directive",
            ));
        }
        if self.tag_map.contains_key(handle) {
            return Err(self.syntax(format!(
                "there is a previously declared suffix for \"{handle}\" tag handle"
            )));
        }
        if !is_tag_uri(prefix) {
            return Err(self.syntax(
                "ill-formed tag prefix (second argument) of the TAG directive",
            ));
        }
        let Some(prefix) = decode_uri(prefix) else {
            return Err(self.syntax(format!("tag prefix is malformed: {prefix}")));
        };
        self.tag_map.insert(handle.clone(), prefix);
        Ok(())
    }
}
