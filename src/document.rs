//! Arena representation of a YAML document graph.
//!
//! Anchors and aliases make a YAML document a graph rather than a tree: an alias denotes the
//! very node its anchor was attached to, and that node may be one of its own ancestors. The
//! loader therefore builds every document into a [`Document`], an arena of [`Node`]s addressed
//! by [`NodeId`]. An alias resolves to the anchored node's id, so sharing and cycles cost
//! nothing. [`Document::to_value`] expands the graph into a plain [`Value`] tree.
//!
//! The dumper accepts documents as well; node identity is what it uses to detect shared and
//! cyclic structure and emit `&ref_N` / `*ref_N` pairs.

use std::fmt;

use indexmap::IndexMap;

use crate::value::{Mapping, Value};

/// Index of a node inside its [`Document`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl nohash_hasher::IsEnabled for NodeId {}

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// One node of the arena.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A leaf value. Composite values stored here are split into nodes before dumping.
    Scalar(Value),
    Sequence(Vec<NodeId>),
    Mapping(IndexMap<String, NodeId>),
    /// A value of an extension type wrapping its payload node.
    Tagged { tag: String, inner: NodeId },
}

impl Node {
    pub fn is_scalar(&self) -> bool {
        matches!(self, Node::Scalar(_))
    }

    /// Scalar value held by this node, if any.
    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Node::Scalar(v) => Some(v),
            _ => None,
        }
    }
}

/// Why a document could not be expanded into a tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExpandError {
    /// `node` is reachable from itself.
    Cycle { node: NodeId },
    /// Expansion produced more than `limit` values.
    Limit { node: NodeId, limit: usize },
}

impl ExpandError {
    /// The node at which expansion stopped.
    pub fn node(&self) -> NodeId {
        match self {
            ExpandError::Cycle { node } | ExpandError::Limit { node, .. } => *node,
        }
    }
}

impl fmt::Display for ExpandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExpandError::Cycle { node } => {
                write!(f, "node {} refers to itself", node.0)
            }
            ExpandError::Limit { limit, .. } => {
                write!(f, "expansion exceeds {limit} nodes")
            }
        }
    }
}

impl std::error::Error for ExpandError {}

/// An arena of nodes with a designated root.
///
/// ```rust
/// use yaml_codec::{Document, Node, Value};
///
/// let mut doc = Document::new();
/// let shared = doc.push(Node::Scalar(Value::from("x")));
/// let root = doc.push(Node::Sequence(vec![shared, shared]));
/// doc.set_root(root);
///
/// let yaml = yaml_codec::dump_document(&doc, &Default::default()).unwrap();
/// assert_eq!(yaml, "- x\n- x\n");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Document {
    nodes: Vec<Node>,
    root: NodeId,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// A document whose root is a single null scalar.
    pub fn new() -> Self {
        Self {
            nodes: vec![Node::Scalar(Value::Null)],
            root: NodeId(0),
        }
    }

    /// Build a document from a value tree. Nothing is shared.
    pub fn from_value(value: &Value) -> Self {
        let mut doc = Self {
            nodes: Vec::new(),
            root: NodeId(0),
        };
        doc.root = doc.import(value);
        doc
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn set_root(&mut self, root: NodeId) {
        self.root = root;
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn push(&mut self, node: Node) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    /// # Panics
    /// If `id` was not allocated by this document.
    pub fn node(&self, id: NodeId) -> &Node {
        &self.nodes[id.0]
    }

    /// # Panics
    /// If `id` was not allocated by this document.
    pub fn node_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.0]
    }

    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Replace the node at `id`, keeping every reference to it.
    pub fn replace(&mut self, id: NodeId, node: Node) -> Node {
        std::mem::replace(&mut self.nodes[id.0], node)
    }

    /// Move the node at `id` one level down, under a [`Node::Tagged`] wrapper that takes its
    /// place. Anchors and aliases that pointed at `id` now see the tagged node.
    pub fn wrap_tagged(&mut self, id: NodeId, tag: impl Into<String>) -> NodeId {
        let inner = self.push(Node::Scalar(Value::Null));
        let original = self.replace(
            id,
            Node::Tagged {
                tag: tag.into(),
                inner,
            },
        );
        self.nodes[inner.0] = original;
        inner
    }

    /// Append `value` as fresh nodes and return the id of its top node.
    pub fn import(&mut self, value: &Value) -> NodeId {
        match value {
            Value::Sequence(seq) => {
                let slot = self.push(Node::Sequence(Vec::new()));
                let items = seq.iter().map(|v| self.import(v)).collect();
                self.nodes[slot.0] = Node::Sequence(items);
                slot
            }
            Value::Mapping(map) => {
                let slot = self.push(Node::Mapping(IndexMap::new()));
                let entries = map
                    .iter()
                    .map(|(k, v)| (k.clone(), self.import(v)))
                    .collect();
                self.nodes[slot.0] = Node::Mapping(entries);
                slot
            }
            Value::Tagged(t) => {
                let slot = self.push(Node::Scalar(Value::Null));
                let inner = self.import(&t.value);
                self.nodes[slot.0] = Node::Tagged {
                    tag: t.tag.clone(),
                    inner,
                };
                slot
            }
            scalar => self.push(Node::Scalar(scalar.clone())),
        }
    }

    /// Expand the graph reachable from the root into a tree, copying shared nodes.
    pub fn to_value(&self) -> Result<Value, ExpandError> {
        self.to_value_with_limit(usize::MAX)
    }

    /// Like [`Document::to_value`], failing once more than `limit` values were produced.
    pub fn to_value_with_limit(&self, limit: usize) -> Result<Value, ExpandError> {
        self.node_to_value(self.root, limit)
    }

    /// Expand the subgraph reachable from `id`.
    pub fn node_to_value(&self, id: NodeId, limit: usize) -> Result<Value, ExpandError> {
        let mut expander = Expander {
            doc: self,
            on_path: vec![false; self.nodes.len()],
            produced: 0,
            limit,
        };
        expander.expand(id)
    }

    /// True if a node is reachable from itself.
    pub fn has_cycle(&self) -> bool {
        matches!(self.to_value(), Err(ExpandError::Cycle { .. }))
    }

    /// Split composite values held by scalar nodes into proper nodes, in place.
    pub(crate) fn normalize(&mut self) {
        let mut i = 0;
        while i < self.nodes.len() {
            if let Node::Scalar(v) = &self.nodes[i]
                && v.is_composite()
            {
                let value = v.clone();
                let top = self.import(&value);
                let node = self.replace(top, Node::Scalar(Value::Null));
                self.nodes[i] = node;
            }
            i += 1;
        }
    }
}

struct Expander<'a> {
    doc: &'a Document,
    on_path: Vec<bool>,
    produced: usize,
    limit: usize,
}

impl Expander<'_> {
    fn expand(&mut self, id: NodeId) -> Result<Value, ExpandError> {
        self.produced += 1;
        if self.produced > self.limit {
            return Err(ExpandError::Limit {
                node: id,
                limit: self.limit,
            });
        }
        let doc = self.doc;
        let node = doc.node(id);
        if let Node::Scalar(v) = node {
            return Ok(v.clone());
        }
        if self.on_path[id.0] {
            return Err(ExpandError::Cycle { node: id });
        }
        self.on_path[id.0] = true;
        let value = match node {
            Node::Sequence(items) => Value::Sequence(
                items
                    .iter()
                    .map(|&child| self.expand(child))
                    .collect::<Result<_, _>>()?,
            ),
            Node::Mapping(entries) => {
                let mut map = Mapping::with_capacity(entries.len());
                for (k, &child) in entries {
                    map.insert(k.clone(), self.expand(child)?);
                }
                Value::Mapping(map)
            }
            Node::Tagged { tag, inner } => Value::tagged(tag.clone(), self.expand(*inner)?),
            Node::Scalar(v) => v.clone(),
        };
        self.on_path[id.0] = false;
        Ok(value)
    }
}
