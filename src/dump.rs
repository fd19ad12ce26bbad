//! Dumper: values and documents to YAML text.
//!
//! Every node goes through type detection first: implicit types of the schema (written
//! without a tag), then explicit types (written with their tag). The text a type represents
//! is used as is for implicit types and goes through scalar style selection for explicit
//! ones. Strings nobody claims are styled directly; collections are laid out in block or
//! flow style depending on `flow_level` and emptiness.

use std::borrow::Cow;
use std::collections::HashMap;

use indexmap::IndexMap;

use crate::document::{Document, Node, NodeId};
use crate::dump_error::DumpError;
use crate::dump_options::{DumpOptions, QuotingType, Replacer};
use crate::dump_quoting::{ScalarStyle, StyleContext, choose_scalar_style, needs_compat_quotes};
use crate::dump_refs::DuplicateTable;
use crate::value::{Mapping, Value};
use crate::wrapping::{block_header, drop_ending_newline, escape_double_quoted, fold_string, indent_string};

pub(crate) type Result<T> = std::result::Result<T, DumpError>;

/// Keys longer than this are written as explicit `? key` entries.
const MAX_IMPLICIT_KEY: usize = 1024;

/// Cap on nodes expanded to show a tagged collection to type predicates.
const PROBE_LIMIT: usize = 1 << 16;

const YAML_ORG: &str = "tag:yaml.org,2002:";

/// Dump `value` with the default options.
///
/// ```rust
/// use yaml_codec::Value;
///
/// let v: Value = [("a", Value::Null), ("b", Value::Bool(true)), ("c", Value::Float(3.14))]
///     .into_iter()
///     .collect();
/// assert_eq!(yaml_codec::dump(&v).unwrap(), "a: null\nb: true\nc: 3.14\n");
/// ```
pub fn dump(value: &Value) -> Result<String> {
    dump_with_options(value, &DumpOptions::default())
}

/// [`dump`] with explicit options. The replacer, if any, runs before anything is written.
pub fn dump_with_options(value: &Value, options: &DumpOptions) -> Result<String> {
    options.consistent()?;
    let doc = match &options.replacer {
        Some(replacer) => match replace_tree(replacer, "", value.clone(), 0, options.max_depth)? {
            Some(replaced) => Document::from_value(&replaced),
            None => return Ok(String::new()),
        },
        None => Document::from_value(value),
    };
    Dumper::new(&doc, options).run()
}

/// Dump a document graph. Nodes reached more than once are written once with `&ref_N` and
/// referenced with `*ref_N` afterwards, unless `no_refs` is set.
pub fn dump_document(doc: &Document, options: &DumpOptions) -> Result<String> {
    options.consistent()?;
    if options.replacer.is_some() {
        return Err(DumpError::InvalidOptions(
            "a replacer works on values; dump the expanded value instead".to_string(),
        ));
    }
    let holds_composites = (0..doc.len())
        .map(NodeId)
        .any(|id| doc.node(id).as_scalar().is_some_and(Value::is_composite));
    let doc = if holds_composites {
        let mut split = doc.clone();
        split.normalize();
        Cow::Owned(split)
    } else {
        Cow::Borrowed(doc)
    };
    Dumper::new(&doc, options).run()
}

/// Apply the replacer outermost first. Tagged payloads are left alone.
fn replace_tree(
    replacer: &Replacer,
    key: &str,
    value: Value,
    depth: usize,
    max_depth: usize,
) -> Result<Option<Value>> {
    if depth > max_depth {
        return Err(DumpError::RecursionLimit { depth });
    }
    let Some(value) = replacer(key, value) else {
        return Ok(None);
    };
    Ok(Some(match value {
        Value::Sequence(items) => Value::Sequence(
            items
                .into_iter()
                .enumerate()
                .map(|(i, item)| {
                    replace_tree(replacer, &i.to_string(), item, depth + 1, max_depth)
                        .map(|v| v.unwrap_or(Value::Null))
                })
                .collect::<Result<_>>()?,
        ),
        Value::Mapping(entries) => {
            let mut out = Mapping::with_capacity(entries.len());
            for (k, v) in entries {
                if let Some(v) = replace_tree(replacer, &k, v, depth + 1, max_depth)? {
                    out.insert(k, v);
                }
            }
            Value::Mapping(out)
        }
        other => other,
    }))
}

/// `!local`, `!!core` or `!<verbatim>`, with the characters a tag cannot hold percent-encoded.
fn format_tag(tag: &str) -> String {
    let (local, body) = match tag.strip_prefix('!') {
        Some(rest) => (true, rest),
        None => (false, tag),
    };
    let mut encoded = String::with_capacity(body.len());
    for c in body.chars() {
        if c.is_ascii_alphanumeric() || "-_.~*'();/?:@&=+$,#".contains(c) {
            encoded.push(c);
        } else {
            let mut buf = [0u8; 4];
            for b in c.encode_utf8(&mut buf).bytes() {
                encoded.push_str(&format!("%{b:02X}"));
            }
        }
    }
    if local {
        format!("!{encoded}")
    } else if let Some(core) = encoded.strip_prefix(YAML_ORG) {
        format!("!!{core}")
    } else {
        format!("!<{encoded}>")
    }
}

/// What a node turned into after type detection.
enum Content<'d> {
    /// Written as is.
    Raw(String),
    /// Goes through scalar style selection.
    Text(Cow<'d, str>),
    Sequence(&'d [NodeId]),
    Mapping(&'d IndexMap<String, NodeId>),
}

struct Detected<'d> {
    tag: Option<String>,
    content: Content<'d>,
}

/// Per-call dumper state.
struct Dumper<'a> {
    doc: &'a Document,
    options: &'a DumpOptions,
    /// `styles` keyed by full tag.
    styles: HashMap<String, String>,
    duplicates: DuplicateTable,
    depth: usize,
}

impl<'a> Dumper<'a> {
    fn new(doc: &'a Document, options: &'a DumpOptions) -> Self {
        let duplicates = if options.no_refs {
            DuplicateTable::default()
        } else {
            DuplicateTable::scan(doc, doc.root())
        };
        Self {
            doc,
            options,
            styles: options.compiled_styles(),
            duplicates,
            depth: 0,
        }
    }

    fn run(mut self) -> Result<String> {
        let written = self.write_node(0, self.doc.root(), true, true, false)?;
        tracing::debug!(
            nodes = self.doc.len(),
            anchors = self.duplicates.len(),
            "document dumped"
        );
        Ok(match written {
            Some(text) => text + "\n",
            None => String::new(),
        })
    }

    /// The value type predicates and representers see for a node.
    fn probe(&self, id: NodeId) -> Option<Cow<'a, Value>> {
        let doc = self.doc;
        match doc.node(id) {
            Node::Scalar(v) => Some(Cow::Borrowed(v)),
            Node::Tagged { tag, inner } => {
                let payload = doc
                    .node_to_value(*inner, PROBE_LIMIT)
                    .unwrap_or_else(|_| match doc.node(*inner) {
                        Node::Sequence(_) => Value::Sequence(Vec::new()),
                        Node::Mapping(_) => Value::Mapping(Mapping::new()),
                        _ => Value::Null,
                    });
                Some(Cow::Owned(Value::tagged(tag.clone(), payload)))
            }
            Node::Sequence(_) | Node::Mapping(_) => None,
        }
    }

    /// Content of a node without any type applied. `Err` names what cannot be written.
    fn natural(&self, id: NodeId) -> std::result::Result<(Option<&'a str>, Content<'a>), &'static str> {
        let doc = self.doc;
        match doc.node(id) {
            Node::Scalar(Value::String(s)) => Ok((None, Content::Text(Cow::Borrowed(s)))),
            Node::Scalar(other) => Err(other.type_name()),
            Node::Sequence(items) => Ok((None, Content::Sequence(items))),
            Node::Mapping(entries) => Ok((None, Content::Mapping(entries))),
            Node::Tagged { tag, inner } => match doc.node(*inner) {
                Node::Tagged { .. } => Err("nested tagged value"),
                _ => self.natural(*inner).map(|(_, content)| (Some(tag.as_str()), content)),
            },
        }
    }

    /// `Ok(None)`: unsupported and skipped.
    fn detect(&self, id: NodeId) -> Result<Option<Detected<'a>>> {
        let schema = &self.options.schema;
        if let Some(probe) = self.probe(id) {
            let candidates = schema
                .implicit_types()
                .map(|t| (false, t))
                .chain(schema.explicit_types().map(|t| (true, t)));
            for (explicit, t) in candidates {
                if !t.matches_value(&probe) {
                    continue;
                }
                let tag = explicit.then(|| t.output_tag(&probe));
                let style = self.styles.get(t.tag()).map(String::as_str);
                let represented = t.represent(&probe, style).map_err(DumpError::InvalidOptions)?;
                let content = match represented {
                    Some(text) if explicit => Content::Text(Cow::Owned(text)),
                    Some(text) => Content::Raw(text),
                    None => match self.natural(id) {
                        Ok((_, Content::Text(s))) if !explicit => Content::Raw(s.into_owned()),
                        Ok((_, content)) => content,
                        Err(type_name) => return self.unsupported(type_name),
                    },
                };
                return Ok(Some(Detected { tag, content }));
            }
        }
        match self.natural(id) {
            Ok((tag, content)) => Ok(Some(Detected {
                tag: tag.map(str::to_owned),
                content,
            })),
            Err(type_name) => self.unsupported(type_name),
        }
    }

    fn unsupported<T>(&self, type_name: &str) -> Result<Option<T>> {
        if self.options.skip_invalid {
            tracing::debug!(type_name, "skipping a value no type represents");
            Ok(None)
        } else {
            Err(DumpError::Unsupported {
                type_name: type_name.to_owned(),
            })
        }
    }

    fn write_node(
        &mut self,
        level: usize,
        id: NodeId,
        block: bool,
        compact: bool,
        block_seq_item: bool,
    ) -> Result<Option<String>> {
        self.depth += 1;
        let written = if self.depth > self.options.max_depth {
            Err(DumpError::RecursionLimit { depth: self.depth })
        } else {
            self.write_node_inner(level, id, block, compact, block_seq_item)
        };
        self.depth -= 1;
        written
    }

    fn write_node_inner(
        &mut self,
        level: usize,
        id: NodeId,
        block: bool,
        mut compact: bool,
        block_seq_item: bool,
    ) -> Result<Option<String>> {
        let Some(Detected { tag, content }) = self.detect(id)? else {
            return Ok(None);
        };
        let in_block = block;
        let block = block && usize::try_from(self.options.flow_level).map_or(true, |flow| flow > level);

        let duplicate = match content {
            Content::Sequence(_) | Content::Mapping(_) if !self.options.no_refs => self.duplicates.lookup(id),
            _ => None,
        };
        if tag.is_some() || duplicate.is_some() || (self.options.indent != 2 && level > 0) {
            compact = false;
        }
        let anchor = match duplicate {
            Some((n, true)) => return Ok(Some(format!("*ref_{n}"))),
            Some((n, false)) => {
                self.duplicates.mark_emitted(n);
                Some(n)
            }
            None => None,
        };

        let body = match content {
            Content::Mapping(entries) if block && !entries.is_empty() => {
                let body = self.write_block_mapping(level, entries, compact)?;
                with_block_anchor(anchor, body)
            }
            Content::Mapping(entries) => {
                let body = self.write_flow_mapping(level, entries)?;
                with_flow_anchor(anchor, body)
            }
            Content::Sequence(items) if block && !items.is_empty() => {
                let level = if self.options.no_array_indent && !block_seq_item && level > 0 {
                    level - 1
                } else {
                    level
                };
                let body = self.write_block_sequence(level, items, compact)?;
                with_block_anchor(anchor, body)
            }
            Content::Sequence(items) => {
                let body = self.write_flow_sequence(level, items)?;
                with_flow_anchor(anchor, body)
            }
            Content::Raw(text) => text,
            Content::Text(s) => self.write_scalar(&s, level, false, in_block),
        };

        Ok(Some(match tag {
            Some(tag) if body.starts_with('\n') => format!("{}{body}", format_tag(&tag)),
            Some(tag) => format!("{} {body}", format_tag(&tag)),
            None => body,
        }))
    }

    fn next_line(&self, level: usize) -> String {
        let mut s = String::with_capacity(1 + self.options.indent * level);
        s.push('\n');
        s.extend(std::iter::repeat_n(' ', self.options.indent * level));
        s
    }

    fn ordered_entries(&self, entries: &'a IndexMap<String, NodeId>) -> Vec<(&'a str, NodeId)> {
        let mut list: Vec<(&'a str, NodeId)> = entries.iter().map(|(k, &v)| (k.as_str(), v)).collect();
        let sort_keys = self.options.sort_keys;
        if sort_keys.is_sorted() {
            list.sort_by(|(a, _), (b, _)| sort_keys.compare(a, b));
        }
        list
    }

    fn write_block_mapping(
        &mut self,
        level: usize,
        entries: &'a IndexMap<String, NodeId>,
        compact: bool,
    ) -> Result<String> {
        let mut out = String::new();
        for (key, value) in self.ordered_entries(entries) {
            let mut pair = String::new();
            if !compact || !out.is_empty() {
                pair.push_str(&self.next_line(level));
            }

            let key_text = self.write_scalar(key, level + 1, true, true);
            let explicit_pair = key_text.chars().count() > MAX_IMPLICIT_KEY;
            if explicit_pair {
                pair.push_str("? ");
            }
            pair.push_str(&key_text);
            if explicit_pair {
                pair.push_str(&self.next_line(level));
            }

            let Some(value_text) = self.write_node(level + 1, value, true, explicit_pair, false)? else {
                continue;
            };
            pair.push_str(if value_text.starts_with('\n') { ":" } else { ": " });
            pair.push_str(&value_text);
            out.push_str(&pair);
        }
        Ok(if out.is_empty() { "{}".to_owned() } else { out })
    }

    fn write_flow_mapping(&mut self, level: usize, entries: &'a IndexMap<String, NodeId>) -> Result<String> {
        let condense = self.options.condense_flow;
        let mut out = String::new();
        for (key, value) in self.ordered_entries(entries) {
            let mut pair = String::new();
            if !out.is_empty() {
                pair.push_str(if condense { "," } else { ", " });
            }
            let key_text = if condense {
                // `{a:1}` would read back as a single plain scalar.
                format!("\"{}\"", escape_double_quoted(key))
            } else {
                self.write_scalar(key, level, true, false)
            };
            if key_text.chars().count() > MAX_IMPLICIT_KEY {
                pair.push_str("? ");
            }
            pair.push_str(&key_text);
            pair.push_str(if condense { ":" } else { ": " });

            let Some(value_text) = self.write_node(level, value, false, false, false)? else {
                continue;
            };
            pair.push_str(&value_text);
            out.push_str(&pair);
        }
        Ok(format!("{{{out}}}"))
    }

    fn write_block_sequence(&mut self, level: usize, items: &'a [NodeId], compact: bool) -> Result<String> {
        let mut out = String::new();
        for &item in items {
            let Some(text) = self.write_node(level + 1, item, true, true, true)? else {
                continue;
            };
            if !compact || !out.is_empty() {
                out.push_str(&self.next_line(level));
            }
            out.push_str(if text.starts_with('\n') { "-" } else { "- " });
            out.push_str(&text);
        }
        Ok(if out.is_empty() { "[]".to_owned() } else { out })
    }

    fn write_flow_sequence(&mut self, level: usize, items: &'a [NodeId]) -> Result<String> {
        let separator = if self.options.condense_flow { "," } else { ", " };
        let mut out = String::new();
        for &item in items {
            let Some(text) = self.write_node(level, item, false, false, false)? else {
                continue;
            };
            if !out.is_empty() {
                out.push_str(separator);
            }
            out.push_str(&text);
        }
        Ok(format!("[{out}]"))
    }

    fn quote_char(&self) -> char {
        match self.options.quoting_type {
            QuotingType::Single => '\'',
            QuotingType::Double => '"',
        }
    }

    fn write_scalar(&self, s: &str, level: usize, is_key: bool, in_block: bool) -> String {
        let options = self.options;
        if s.is_empty() {
            let q = self.quote_char();
            return format!("{q}{q}");
        }
        if !options.no_compat_mode && needs_compat_quotes(s) {
            let q = self.quote_char();
            return format!("{q}{s}{q}");
        }

        let indent = options.indent * level.max(1);
        let line_width = usize::try_from(options.line_width)
            .ok()
            .map(|width| width.min(40).max(width.saturating_sub(indent)));
        let single_line_only = is_key
            || usize::try_from(options.flow_level).is_ok_and(|flow| level >= flow);
        let schema = &options.schema;
        let is_ambiguous = |text: &str| schema.resolve_implicit(text).is_some();
        let ctx = StyleContext {
            single_line_only,
            indent_per_level: options.indent,
            line_width,
            quoting_type: options.quoting_type,
            force_quotes: options.force_quotes && !is_key,
            in_block,
            is_ambiguous: &is_ambiguous,
        };

        match choose_scalar_style(s, &ctx) {
            ScalarStyle::Plain => s.to_owned(),
            ScalarStyle::Single => format!("'{}'", s.replace('\'', "''")),
            ScalarStyle::Double => format!("\"{}\"", escape_double_quoted(s)),
            ScalarStyle::Literal => format!(
                "|{}{}",
                block_header(s, options.indent),
                drop_ending_newline(&indent_string(s, indent))
            ),
            ScalarStyle::Folded => {
                let folded = fold_string(s, line_width.unwrap_or(usize::MAX));
                format!(
                    ">{}{}",
                    block_header(s, options.indent),
                    drop_ending_newline(&indent_string(&folded, indent))
                )
            }
        }
    }
}

fn with_block_anchor(anchor: Option<usize>, body: String) -> String {
    match anchor {
        Some(n) => format!("&ref_{n}{body}"),
        None => body,
    }
}

fn with_flow_anchor(anchor: Option<usize>, body: String) -> String {
    match anchor {
        Some(n) => format!("&ref_{n} {body}"),
        None => body,
    }
}
