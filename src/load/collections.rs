//! Block sequences, block mappings and flow collections.
//!
//! Mapping keys are stringified when they are stored: scalars by their canonical text,
//! sequences of scalars joined with `,`. Merge keys (`<<` resolved to the merge type) copy
//! the entries of a mapping, or of each mapping in a sequence, without overriding keys that
//! are already present. Keys that arrived through a merge may be overridden later.

use ahash::AHashSet;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::SecondsFormat;
use indexmap::IndexMap;

use super::compose::Context;
use super::reader::{EOF, is_white_space, is_ws_or_eol};
use super::{Parser, Pos, Result};
use crate::document::{Node, NodeId};
use crate::error::ErrorKind;
use crate::schema::Kind;
use crate::value::Value;
use crate::zmij_format::push_float_string;

const MERGE_TAG: &str = "tag:yaml.org,2002:merge";

/// Entries of a mapping under construction.
#[derive(Default)]
struct MappingBuilder {
    entries: IndexMap<String, NodeId>,
    /// Keys that came from a merge and may still be overridden.
    overridable: AHashSet<String>,
}

/// Key of a pending mapping pair: its node, its resolved tag and where it started.
struct PendingKey {
    node: Option<NodeId>,
    tag: Option<String>,
    pos: Pos,
}

fn scalar_key(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(f) => {
            let mut s = String::new();
            push_float_string(&mut s, *f);
            s
        }
        Value::String(s) => s.clone(),
        Value::Binary(bytes) => B64.encode(bytes),
        Value::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        // Composite values live in their own nodes.
        other => other.to_string(),
    }
}

impl Parser<'_> {
    fn key_string(&self, key: Option<NodeId>, pos: Pos) -> Result<String> {
        let Some(id) = key else {
            return Ok("null".to_owned());
        };
        let unsupported = |what: &str| {
            Err(self.error_at(
                ErrorKind::Syntax(format!("{what} are not supported inside keys")),
                pos,
            ))
        };
        let scalar_of = |id: NodeId| match self.doc.node(id) {
            Node::Scalar(v) => Some(v),
            Node::Tagged { inner, .. } => self.doc.node(*inner).as_scalar(),
            _ => None,
        };
        match self.doc.node(id) {
            Node::Sequence(items) => {
                let mut parts = Vec::with_capacity(items.len());
                for &item in items {
                    match self.doc.node(item) {
                        Node::Sequence(_) => return unsupported("nested arrays"),
                        Node::Mapping(_) => return unsupported("nested mappings"),
                        _ => match scalar_of(item) {
                            Some(v) => parts.push(scalar_key(v)),
                            None => return unsupported("tagged collections"),
                        },
                    }
                }
                Ok(parts.join(","))
            }
            Node::Mapping(_) => unsupported("mappings"),
            _ => match scalar_of(id) {
                Some(v) => Ok(scalar_key(v)),
                None => unsupported("tagged collections"),
            },
        }
    }

    fn store_mapping_pair(
        &mut self,
        builder: &mut MappingBuilder,
        key: PendingKey,
        value: Option<NodeId>,
    ) -> Result<()> {
        let key_text = self.key_string(key.node, key.pos)?;

        if key.tag.as_deref() == Some(MERGE_TAG) {
            return self.merge_into(builder, value, key.pos);
        }

        if !self.options.json
            && !builder.overridable.contains(&key_text)
            && builder.entries.contains_key(&key_text)
        {
            return Err(self.error_at(ErrorKind::DuplicateKey(key_text), key.pos));
        }
        let value = match value {
            Some(id) => id,
            None => self.push_node(Node::Scalar(Value::Null), self.pos()),
        };
        builder.overridable.remove(&key_text);
        builder.entries.insert(key_text, value);
        Ok(())
    }

    fn merge_into(&self, builder: &mut MappingBuilder, source: Option<NodeId>, pos: Pos) -> Result<()> {
        let unacceptable = || {
            self.error_at(
                ErrorKind::Syntax(
                    "cannot merge mappings; the provided source object is unacceptable".to_owned(),
                ),
                pos,
            )
        };
        let Some(source) = source else {
            return Err(unacceptable());
        };
        let sources: Vec<NodeId> = match self.doc.node(source) {
            Node::Mapping(_) => vec![source],
            Node::Sequence(items) => items.clone(),
            _ => return Err(unacceptable()),
        };
        for id in sources {
            let Node::Mapping(entries) = self.doc.node(id) else {
                return Err(unacceptable());
            };
            for (k, &v) in entries {
                if !builder.entries.contains_key(k) {
                    builder.entries.insert(k.clone(), v);
                    builder.overridable.insert(k.clone());
                }
            }
        }
        Ok(())
    }

    pub(super) fn read_block_sequence(&mut self, node_indent: isize) -> Result<bool> {
        if self.first_tab_in_line.is_some() {
            return Ok(false);
        }
        let saved_tag = self.tag.clone();
        let saved_anchor = self.anchor.clone();
        let start = self.pos();
        let mut slot: Option<NodeId> = None;
        let mut items = Vec::new();
        let mut ch = self.peek();

        while ch != EOF {
            if let Some(tab) = self.first_tab_in_line {
                self.position = tab;
                return Err(self.syntax("tab characters must not be used in indentation"));
            }
            if ch != '-' || !is_ws_or_eol(self.at(self.position + 1)) {
                break;
            }
            if slot.is_none() {
                slot = Some(self.open_collection(Node::Sequence(Vec::new()), start, saved_anchor.as_deref())?);
            }
            self.position += 1;

            if self.skip_separation_space(true, -1) > 0 && self.line_indent <= node_indent {
                items.push(self.push_node(Node::Scalar(Value::Null), self.pos()));
                ch = self.peek();
                continue;
            }

            let line = self.line;
            let composed = self.compose_node(node_indent, Context::BlockIn, false, true)?;
            items.push(self.take_result(composed));
            self.skip_separation_space(true, -1);
            ch = self.peek();

            if (self.line == line || self.line_indent > node_indent) && ch != EOF {
                return Err(self.syntax("bad indentation of a sequence entry"));
            } else if self.line_indent < node_indent {
                break;
            }
        }

        match slot {
            Some(id) => {
                self.finish_collection(id, Node::Sequence(items), Kind::Sequence, saved_tag, saved_anchor);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub(super) fn read_block_mapping(&mut self, node_indent: isize, flow_indent: isize) -> Result<bool> {
        if self.first_tab_in_line.is_some() {
            return Ok(false);
        }
        let saved_tag = self.tag.clone();
        let saved_anchor = self.anchor.clone();
        let start = self.pos();
        let mut slot: Option<NodeId> = None;
        let mut builder = MappingBuilder::default();
        let mut key = PendingKey {
            node: None,
            tag: None,
            pos: start,
        };
        let mut value: Option<NodeId> = None;
        let mut at_explicit_key = false;
        let mut detected = false;
        let mut ch = self.peek();

        while ch != EOF {
            let allow_compact;
            if !at_explicit_key && let Some(tab) = self.first_tab_in_line {
                self.position = tab;
                return Err(self.syntax("tab characters must not be used in indentation"));
            }
            let following = self.at(self.position + 1);
            let line = self.line;

            if (ch == '?' || ch == ':') && is_ws_or_eol(following) {
                // Explicit notation: `? key` and `: value` lines.
                if ch == '?' {
                    if at_explicit_key {
                        let pos = key.pos;
                        let done = std::mem::replace(&mut key, PendingKey { node: None, tag: None, pos });
                        self.store_mapping_pair(&mut builder, done, None)?;
                        value = None;
                    }
                    detected = true;
                    at_explicit_key = true;
                    allow_compact = true;
                } else if at_explicit_key {
                    at_explicit_key = false;
                    allow_compact = true;
                } else {
                    return Err(self.syntax(
                        "incomplete explicit mapping pair; a key node is missed; or followed by a non-tabulated empty line",
                    ));
                }
                self.position += 1;
                ch = following;
            } else {
                // Implicit notation: a flow-style key, `:`, then the value.
                let key_pos = self.pos();
                if !self.compose_node(flow_indent, Context::FlowOut, false, true)? {
                    break;
                }

                if self.line != line {
                    if detected {
                        return Err(self.syntax(
                            "can not read a block mapping entry; a multiline key may not be an implicit key",
                        ));
                    }
                    // Not a mapping: keep what was composed.
                    self.tag = saved_tag;
                    self.anchor = saved_anchor;
                    return Ok(true);
                }

                ch = self.peek();
                while is_white_space(ch) {
                    ch = self.bump();
                }

                if ch != ':' {
                    if detected {
                        return Err(self.syntax("can not read an implicit mapping pair; a colon is missed"));
                    }
                    self.tag = saved_tag;
                    self.anchor = saved_anchor;
                    return Ok(true);
                }

                ch = self.bump();
                if !is_ws_or_eol(ch) {
                    return Err(self.syntax(
                        "a whitespace character is expected after the key-value separator within a block mapping",
                    ));
                }
                if at_explicit_key {
                    let done = std::mem::replace(&mut key, PendingKey { node: None, tag: None, pos: key_pos });
                    self.store_mapping_pair(&mut builder, done, None)?;
                    value = None;
                }
                detected = true;
                at_explicit_key = false;
                allow_compact = false;
                key = PendingKey {
                    node: self.result,
                    tag: self.tag.clone(),
                    pos: key_pos,
                };
            }

            if detected && slot.is_none() {
                slot = Some(self.open_collection(Node::Mapping(IndexMap::new()), start, saved_anchor.as_deref())?);
            }

            if self.line == line || self.line_indent > node_indent {
                if at_explicit_key {
                    key.pos = self.pos();
                }
                if self.compose_node(node_indent, Context::BlockOut, true, allow_compact)? {
                    if at_explicit_key {
                        key.node = self.result;
                        key.tag = self.tag.clone();
                    } else {
                        value = self.result;
                    }
                }
                if !at_explicit_key {
                    let pos = key.pos;
                    let done = std::mem::replace(&mut key, PendingKey { node: None, tag: None, pos });
                    self.store_mapping_pair(&mut builder, done, value.take())?;
                }
                self.skip_separation_space(true, -1);
                ch = self.peek();
            }

            if (self.line == line || self.line_indent > node_indent) && ch != EOF {
                return Err(self.syntax("bad indentation of a mapping entry"));
            } else if self.line_indent < node_indent {
                break;
            }
        }

        // A trailing explicit key without a value.
        if at_explicit_key {
            self.store_mapping_pair(&mut builder, key, None)?;
        }

        match slot {
            Some(id) if detected => {
                self.finish_collection(id, Node::Mapping(builder.entries), Kind::Mapping, saved_tag, saved_anchor);
                Ok(true)
            }
            _ => {
                self.tag = saved_tag;
                self.anchor = saved_anchor;
                Ok(false)
            }
        }
    }

    /// `[...]` and `{...}`.
    pub(super) fn read_flow_collection(&mut self, node_indent: isize) -> Result<bool> {
        let (terminator, is_mapping) = match self.peek() {
            '[' => (']', false),
            '{' => ('}', true),
            _ => return Ok(false),
        };
        let saved_tag = self.tag.clone();
        let saved_anchor = self.anchor.clone();
        let start = self.pos();
        let empty = if is_mapping {
            Node::Mapping(IndexMap::new())
        } else {
            Node::Sequence(Vec::new())
        };
        let slot = self.open_collection(empty, start, saved_anchor.as_deref())?;
        let mut builder = MappingBuilder::default();
        let mut items = Vec::new();
        let mut read_next = true;
        let mut ch = self.bump();

        while ch != EOF {
            self.skip_separation_space(true, node_indent);
            ch = self.peek();

            if ch == terminator {
                self.position += 1;
                let (node, kind) = if is_mapping {
                    (Node::Mapping(builder.entries), Kind::Mapping)
                } else {
                    (Node::Sequence(items), Kind::Sequence)
                };
                self.finish_collection(slot, node, kind, saved_tag, saved_anchor);
                return Ok(true);
            } else if !read_next {
                return Err(self.syntax("missed comma between flow collection entries"));
            } else if ch == ',' {
                return Err(self.syntax("expected the node content, but found ','"));
            }

            let mut is_pair = false;
            let mut is_explicit_pair = false;
            if ch == '?' && is_ws_or_eol(self.at(self.position + 1)) {
                is_pair = true;
                is_explicit_pair = true;
                self.position += 1;
                self.skip_separation_space(true, node_indent);
            }

            let line = self.line;
            let key_pos = self.pos();
            let key_composed = self.compose_node(node_indent, Context::FlowIn, false, true)?;
            let key = PendingKey {
                node: if key_composed { self.result } else { None },
                tag: self.tag.clone(),
                pos: key_pos,
            };
            self.skip_separation_space(true, node_indent);
            ch = self.peek();

            let mut value = None;
            if (is_explicit_pair || self.line == line) && ch == ':' {
                is_pair = true;
                self.position += 1;
                self.skip_separation_space(true, node_indent);
                if self.compose_node(node_indent, Context::FlowIn, false, true)? {
                    value = self.result;
                }
            }

            if is_mapping {
                self.store_mapping_pair(&mut builder, key, value)?;
            } else if is_pair {
                // `[a: 1]` holds a single-pair mapping.
                let mut pair = MappingBuilder::default();
                self.store_mapping_pair(&mut pair, key, value)?;
                items.push(self.push_node(Node::Mapping(pair.entries), key_pos));
            } else {
                items.push(self.take_result(key_composed));
            }

            self.skip_separation_space(true, node_indent);
            ch = self.peek();
            if ch == ',' {
                read_next = true;
                ch = self.bump();
            } else {
                read_next = false;
            }
        }

        Err(self.syntax("unexpected end of the stream within a flow collection"))
    }
}
