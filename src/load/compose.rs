//! Node composition: properties, aliases and tag resolution.

use std::cmp::Ordering;

use super::directives::{decode_uri, is_tag_handle, is_tag_uri};
use super::reader::{EOF, is_flow_indicator, is_ws_or_eol};
use super::{Parser, Pos, Result};
use crate::document::{Node, NodeId};
use crate::error::ErrorKind;
use crate::schema::{Kind, TypeDescriptor};
use crate::value::Value;

/// Where a node appears; decides which productions are legal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum Context {
    FlowIn,
    FlowOut,
    BlockIn,
    BlockOut,
}

const YAML_ORG: &str = "tag:yaml.org,2002:";

impl Parser<'_> {
    pub(super) fn push_node(&mut self, node: Node, start: Pos) -> NodeId {
        let id = self.doc.push(node);
        if self.positions.len() <= id.index() {
            self.positions.resize(id.index() + 1, start);
        }
        self.positions[id.index()] = start;
        id
    }

    /// Put a constructed value into slot `id`. Composite values become nodes.
    fn store_value(&mut self, id: NodeId, value: Value) {
        if value.is_composite() {
            let start = self.positions.get(id.index()).copied().unwrap_or_default();
            let top = self.doc.import(&value);
            if self.positions.len() < self.doc.len() {
                self.positions.resize(self.doc.len(), start);
            }
            let node = self.doc.replace(top, Node::Scalar(Value::Null));
            self.doc.replace(id, node);
        } else {
            self.doc.replace(id, Node::Scalar(value));
        }
    }

    /// Bind `name` to `id`. Binding the same node again is a no-op.
    pub(super) fn register_anchor(&mut self, name: &str, id: NodeId) -> Result<()> {
        match self.anchor_map.get(name) {
            Some(&existing) if existing == id => Ok(()),
            Some(_) => Err(self.error(ErrorKind::DuplicateAnchor(name.to_owned()))),
            None => {
                if let Err(breach) = self.budget.on_anchor() {
                    return Err(self.error(ErrorKind::Budget(breach)));
                }
                self.anchor_map.insert(name.to_owned(), id);
                Ok(())
            }
        }
    }

    /// Allocate the slot of a collection whose first entry was detected, and bind its
    /// anchor so that entries may refer back to it.
    pub(super) fn open_collection(&mut self, node: Node, start: Pos, anchor: Option<&str>) -> Result<NodeId> {
        let id = self.push_node(node, start);
        if let Some(anchor) = anchor {
            self.register_anchor(anchor, id)?;
        }
        Ok(id)
    }

    /// Publish a finished collection as the current result.
    pub(super) fn finish_collection(
        &mut self,
        id: NodeId,
        node: Node,
        kind: Kind,
        tag: Option<String>,
        anchor: Option<String>,
    ) {
        self.doc.replace(id, node);
        self.tag = tag;
        self.anchor = anchor;
        self.kind = Some(kind);
        self.result = Some(id);
        self.raw = None;
        self.from_alias = false;
    }

    /// Current result, or a fresh null node.
    pub(super) fn take_result(&mut self, composed: bool) -> NodeId {
        match self.result {
            Some(id) if composed => id,
            _ => self.push_node(Node::Scalar(Value::Null), self.pos()),
        }
    }

    /// Compose one node at `parent_indent` in `context`, leaving it in `self.result`.
    ///
    /// Returns `false` when there was neither content nor properties.
    pub(super) fn compose_node(
        &mut self,
        parent_indent: isize,
        context: Context,
        allow_to_seek: bool,
        allow_compact: bool,
    ) -> Result<bool> {
        self.depth += 1;
        let composed = match self.budget.check_depth(self.depth) {
            Ok(()) => self.compose_node_inner(parent_indent, context, allow_to_seek, allow_compact),
            Err(breach) => Err(self.error(ErrorKind::Budget(breach))),
        };
        self.depth -= 1;
        composed
    }

    fn compose_node_inner(
        &mut self,
        parent_indent: isize,
        context: Context,
        allow_to_seek: bool,
        allow_compact: bool,
    ) -> Result<bool> {
        self.tag = None;
        self.anchor = None;
        self.kind = None;
        self.result = None;
        self.raw = None;
        self.from_alias = false;

        let start = self.pos();
        let block = matches!(context, Context::BlockOut | Context::BlockIn);
        let allow_block_styles = block;
        let allow_block_scalars = block;
        let mut allow_block_collections = block;
        let mut indent_status = Ordering::Greater;
        let mut at_new_line = false;
        let mut has_content = false;

        if allow_to_seek && self.skip_separation_space(true, -1) > 0 {
            at_new_line = true;
            indent_status = self.line_indent.cmp(&parent_indent);
        }

        if indent_status == Ordering::Greater {
            while self.read_tag_property()? || self.read_anchor_property()? {
                if self.skip_separation_space(true, -1) > 0 {
                    at_new_line = true;
                    allow_block_collections = allow_block_styles;
                    indent_status = self.line_indent.cmp(&parent_indent);
                } else {
                    allow_block_collections = false;
                }
            }
        }

        if allow_block_collections {
            allow_block_collections = at_new_line || allow_compact;
        }

        if indent_status == Ordering::Greater || context == Context::BlockOut {
            let flow_indent = match context {
                Context::FlowIn | Context::FlowOut => parent_indent,
                Context::BlockIn | Context::BlockOut => parent_indent + 1,
            };
            let block_indent = (self.position - self.line_start) as isize;

            if indent_status == Ordering::Greater {
                if (allow_block_collections
                    && (self.read_block_sequence(block_indent)?
                        || self.read_block_mapping(block_indent, flow_indent)?))
                    || self.read_flow_collection(flow_indent)?
                {
                    has_content = true;
                } else if (allow_block_scalars && self.read_block_scalar(flow_indent)?)
                    || self.read_single_quoted_scalar(flow_indent)?
                    || self.read_double_quoted_scalar(flow_indent)?
                {
                    has_content = true;
                } else if self.read_alias()? {
                    has_content = true;
                } else if self.read_plain_scalar(flow_indent, context == Context::FlowIn)? {
                    has_content = true;
                    if self.tag.is_none() {
                        self.tag = Some("?".to_owned());
                    }
                }
            } else if indent_status == Ordering::Equal {
                // Block sequences may sit at their parent's indentation.
                has_content = allow_block_collections && self.read_block_sequence(block_indent)?;
            }
        }

        if self.from_alias && (self.tag.is_some() || self.anchor.is_some()) {
            return Err(self.syntax("alias node should not have any properties"));
        }

        match self.tag.clone().as_deref() {
            None => {}
            Some("?") => self.resolve_implicit(start)?,
            Some("!") => {
                if let (Some(id), Some(raw)) = (self.result, self.raw.clone()) {
                    self.doc.replace(id, Node::Scalar(Value::String(raw)));
                }
            }
            Some(tag) => self.resolve_explicit(tag, start)?,
        }

        let composed = self.tag.is_some() || self.anchor.is_some() || has_content;
        if composed && self.result.is_none() {
            self.result = Some(self.push_node(Node::Scalar(Value::Null), start));
        }
        if let (Some(anchor), Some(id)) = (self.anchor.clone(), self.result) {
            self.register_anchor(&anchor, id)?;
        }
        Ok(composed)
    }

    /// Plain scalars (and `!<?>`) go through the implicit types in order.
    fn resolve_implicit(&mut self, start: Pos) -> Result<()> {
        if self.result.is_some()
            && let Some(found) = self.kind
            && found != Kind::Scalar
        {
            return Err(self.error(ErrorKind::KindMismatch {
                tag: "?".to_owned(),
                expected: Kind::Scalar,
                found,
            }));
        }
        let data = self.raw.clone().unwrap_or_default();
        let options = self.options;
        let Some(t) = options
            .schema
            .implicit_types()
            .find(|t| t.resolve_scalar(&data, t.tag()))
        else {
            return Ok(());
        };
        let value = self.construct_scalar(t, &data, t.tag())?;
        let id = match self.result {
            Some(id) => id,
            None => self.push_node(Node::Scalar(Value::Null), start),
        };
        self.store_value(id, value);
        self.result = Some(id);
        self.kind = Some(Kind::Scalar);
        self.tag = Some(t.tag().to_owned());
        Ok(())
    }

    fn construct_scalar(&self, t: &TypeDescriptor, data: &str, tag: &str) -> Result<Value> {
        t.construct_scalar(data, tag).map_err(|reason| {
            self.error(ErrorKind::Construct {
                tag: tag.to_owned(),
                reason,
            })
        })
    }

    fn resolve_explicit(&mut self, tag: &str, start: Pos) -> Result<()> {
        let options = self.options;
        let schema = &options.schema;
        let unknown = || ErrorKind::UnknownTag(tag.to_owned());
        let cannot_resolve = || ErrorKind::CannotResolve(tag.to_owned());

        let Some(id) = self.result else {
            // No content: construct from an empty scalar or collection.
            let Some(t) = schema.lookup(tag, None) else {
                return Err(self.error(unknown()));
            };
            let id = match t.kind() {
                Kind::Scalar => {
                    if !t.resolve_scalar("", tag) {
                        return Err(self.error(cannot_resolve()));
                    }
                    let value = self.construct_scalar(t, "", tag)?;
                    let id = self.push_node(Node::Scalar(Value::Null), start);
                    self.store_value(id, value);
                    id
                }
                Kind::Sequence | Kind::Mapping => {
                    let empty = if t.kind() == Kind::Sequence {
                        Node::Sequence(Vec::new())
                    } else {
                        Node::Mapping(Default::default())
                    };
                    let id = self.push_node(empty, start);
                    self.construct_node(t, id, tag)?;
                    id
                }
            };
            self.result = Some(id);
            self.kind = Some(t.kind());
            return Ok(());
        };

        let found = self.kind.unwrap_or(Kind::Scalar);
        let t = match schema.lookup(tag, Some(found)) {
            Some(t) => t,
            None => {
                return Err(self.error(match schema.lookup(tag, None) {
                    Some(other) => ErrorKind::KindMismatch {
                        tag: tag.to_owned(),
                        expected: other.kind(),
                        found,
                    },
                    None => unknown(),
                }));
            }
        };

        match found {
            Kind::Scalar => {
                let data = self.raw.clone().unwrap_or_default();
                if !t.resolve_scalar(&data, tag) {
                    return Err(self.error(cannot_resolve()));
                }
                let value = self.construct_scalar(t, &data, tag)?;
                self.store_value(id, value);
            }
            Kind::Sequence | Kind::Mapping => self.construct_node(t, id, tag)?,
        }
        Ok(())
    }

    fn construct_node(&mut self, t: &TypeDescriptor, id: NodeId, tag: &str) -> Result<()> {
        if !t.resolve_node(&self.doc, id, tag) {
            return Err(self.error(ErrorKind::CannotResolve(tag.to_owned())));
        }
        let before = self.doc.len();
        let constructed = t.construct_node(&mut self.doc, id, tag);
        if self.doc.len() > before {
            let start = self.positions.get(id.index()).copied().unwrap_or_default();
            self.positions.resize(self.doc.len(), start);
        }
        constructed.map_err(|reason| {
            self.error(ErrorKind::Construct {
                tag: tag.to_owned(),
                reason,
            })
        })
    }

    /// `!suffix`, `!!suffix`, `!handle!suffix` or `!<verbatim>`.
    fn read_tag_property(&mut self) -> Result<bool> {
        if self.peek() != '!' {
            return Ok(false);
        }
        if self.tag.is_some() {
            return Err(self.syntax("duplication of a tag property"));
        }

        let mut ch = self.bump();
        let mut is_verbatim = false;
        let mut is_named = false;
        let mut handle = "!".to_owned();
        if ch == '<' {
            is_verbatim = true;
            ch = self.bump();
        } else if ch == '!' {
            is_named = true;
            handle = "!!".to_owned();
            ch = self.bump();
        }

        let mut start = self.position;
        let name = if is_verbatim {
            while ch != EOF && ch != '>' {
                ch = self.bump();
            }
            if ch == EOF {
                return Err(self.syntax("unexpected end of the stream within a verbatim tag"));
            }
            let name = self.slice(start, self.position);
            self.position += 1;
            name
        } else {
            while ch != EOF && !is_ws_or_eol(ch) {
                if ch == '!' {
                    if is_named {
                        return Err(self.syntax("tag suffix cannot contain exclamation marks"));
                    }
                    handle = self.slice(start - 1, self.position + 1);
                    if !is_tag_handle(&handle) {
                        return Err(self.syntax("named tag handle cannot contain such characters"));
                    }
                    is_named = true;
                    start = self.position + 1;
                }
                ch = self.bump();
            }
            let name = self.slice(start, self.position);
            if name.chars().any(is_flow_indicator) {
                return Err(self.syntax("tag suffix cannot contain flow indicator characters"));
            }
            name
        };

        if !name.is_empty() && !is_tag_uri(&name) {
            return Err(self.syntax(format!("tag name cannot contain such characters: {name}")));
        }
        let Some(name) = decode_uri(&name) else {
            return Err(self.syntax(format!("tag name is malformed: {name}")));
        };

        let tag = if is_verbatim {
            name
        } else if let Some(prefix) = self.tag_map.get(&handle) {
            format!("{prefix}{name}")
        } else if handle == "!" {
            format!("!{name}")
        } else if handle == "!!" {
            format!("{YAML_ORG}{name}")
        } else {
            return Err(self.syntax(format!("undeclared tag handle \"{handle}\"")));
        };
        self.tag = Some(tag);
        Ok(true)
    }

    fn read_anchor_property(&mut self) -> Result<bool> {
        if self.peek() != '&' {
            return Ok(false);
        }
        if self.anchor.is_some() {
            return Err(self.syntax("duplication of an anchor property"));
        }
        let name = self.read_node_name();
        if name.is_empty() {
            return Err(self.syntax("name of an anchor node must contain at least one character"));
        }
        self.anchor = Some(name);
        Ok(true)
    }

    /// Name after `&` or `*`, up to white space or a flow indicator.
    fn read_node_name(&mut self) -> String {
        let mut ch = self.bump();
        let start = self.position;
        while ch != EOF && !is_ws_or_eol(ch) && !is_flow_indicator(ch) {
            ch = self.bump();
        }
        self.slice(start, self.position)
    }

    fn read_alias(&mut self) -> Result<bool> {
        if self.peek() != '*' {
            return Ok(false);
        }
        let name = self.read_node_name();
        if name.is_empty() {
            return Err(self.syntax("name of an alias node must contain at least one character"));
        }
        let Some(&id) = self.anchor_map.get(&name) else {
            return Err(self.error(ErrorKind::UnknownAlias(name)));
        };
        if let Err(breach) = self.budget.on_alias() {
            return Err(self.error(ErrorKind::Budget(breach)));
        }
        self.result = Some(id);
        self.kind = None;
        self.raw = None;
        self.from_alias = true;
        self.skip_separation_space(true, -1);
        Ok(true)
    }
}
