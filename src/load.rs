//! Loader: YAML text to documents and values.
//!
//! Responsibilities
//! - Scan the character stream (`reader`), directives (`directives`), scalars (`scalars`)
//!   and collections (`collections`).
//! - Compose every node into the document arena and resolve its tag (`compose`).
//! - Track anchors per document; an alias yields the anchored node's id.
//! - Enforce the [`Budget`](crate::Budget) and deliver warnings.
//!
//! Documents are composed one at a time. `load_all_with` hands each value to its callback
//! as soon as the document is complete.

use std::sync::Arc;

use ahash::AHashMap;

use crate::budget::{BudgetBreach, BudgetEnforcer};
use crate::document::{Document, ExpandError, NodeId};
use crate::error::{Error, ErrorKind};
use crate::options::LoadOptions;
use crate::schema::Kind;
use crate::value::Value;

mod collections;
mod compose;
mod directives;
mod reader;
mod scalars;

use compose::Context;
use reader::EOF;

pub(crate) type Result<T> = std::result::Result<T, Error>;

/// Position of a character together with the line it belongs to.
#[derive(Clone, Copy, Debug, Default)]
pub(crate) struct Pos {
    position: usize,
    /// 0-based.
    line: usize,
    line_start: usize,
}

/// A composed document and the source position of each of its nodes.
pub(crate) struct Composed {
    pub(crate) doc: Document,
    positions: Vec<Pos>,
}

/// Per-call parser state. Never escapes the `load*` call that created it.
pub(crate) struct Parser<'a> {
    /// Input characters followed by a `'\0'` sentinel.
    input: Vec<char>,
    /// Number of input characters, sentinel excluded.
    length: usize,
    /// Input text as seen by the parser (BOM removed, final line break added).
    source: Arc<str>,
    name: Option<Arc<str>>,
    options: &'a LoadOptions,

    position: usize,
    line: usize,
    line_start: usize,
    line_indent: isize,
    /// First tab in the current line's indentation, if any.
    first_tab_in_line: Option<usize>,

    // Document scope.
    version: Option<String>,
    check_line_breaks: bool,
    tag_map: AHashMap<String, String>,
    anchor_map: AHashMap<String, NodeId>,
    doc: Document,
    positions: Vec<Pos>,

    // Node under composition.
    tag: Option<String>,
    anchor: Option<String>,
    kind: Option<Kind>,
    result: Option<NodeId>,
    /// Source text of the last scalar, for tags applied after implicit resolution.
    raw: Option<String>,
    /// `result` came from an alias.
    from_alias: bool,

    depth: usize,
    budget: BudgetEnforcer,
}

impl<'a> Parser<'a> {
    pub(crate) fn new(text: &str, options: &'a LoadOptions) -> Result<Self> {
        let mut text = text.strip_prefix('\u{feff}').unwrap_or(text).to_owned();
        if !text.is_empty() && !text.ends_with(['\n', '\r']) {
            text.push('\n');
        }
        let mut input: Vec<char> = text.chars().collect();
        let length = input.len();
        input.push(EOF);

        let mut parser = Self {
            input,
            length,
            source: Arc::from(text),
            name: options.filename.as_deref().map(Arc::from),
            options,
            position: 0,
            line: 0,
            line_start: 0,
            line_indent: 0,
            first_tab_in_line: None,
            version: None,
            check_line_breaks: options.legacy,
            tag_map: AHashMap::new(),
            anchor_map: AHashMap::new(),
            doc: Document::new(),
            positions: Vec::new(),
            tag: None,
            anchor: None,
            kind: None,
            result: None,
            raw: None,
            from_alias: false,
            depth: 0,
            budget: BudgetEnforcer::new(options.budget),
        };

        if let Some(nul) = parser.input[..length].iter().position(|&c| c == EOF) {
            parser.position = nul;
            return Err(parser.syntax("null byte is not allowed in input"));
        }

        while parser.peek() == ' ' {
            parser.line_indent += 1;
            parser.position += 1;
        }
        Ok(parser)
    }

    /// Compose the next document, or `None` at the end of the stream.
    pub(crate) fn next_document(&mut self) -> Result<Option<Composed>> {
        if self.length == 0 || self.position >= self.length - 1 {
            return Ok(None);
        }
        if let Err(breach) = self.budget.on_document() {
            return Err(self.error(ErrorKind::Budget(breach)));
        }
        let composed = self.read_document()?;
        tracing::debug!(
            nodes = composed.doc.len(),
            line = self.line + 1,
            "document composed"
        );
        Ok(Some(composed))
    }

    /// Expand a composed document into a value tree, within the expansion budget.
    pub(crate) fn expand(&self, composed: &Composed) -> Result<Value> {
        let limit = self.budget.expansion_limit();
        composed.doc.to_value_with_limit(limit).map_err(|e| {
            let pos = composed
                .positions
                .get(e.node().index())
                .copied()
                .unwrap_or_default();
            let kind = match e {
                ExpandError::Cycle { .. } => ErrorKind::RecursiveAlias,
                ExpandError::Limit { limit, .. } => {
                    ErrorKind::Budget(BudgetBreach::ExpandedNodes { nodes: limit })
                }
            };
            self.error_at(kind, pos)
        })
    }

    fn read_document(&mut self) -> Result<Composed> {
        let document_start = self.position;

        self.version = None;
        self.check_line_breaks = self.options.legacy;
        self.tag_map.clear();
        self.anchor_map.clear();
        self.doc = Document::new();
        self.positions = vec![self.pos()];

        let has_directives = self.read_directives()?;

        self.skip_separation_space(true, -1);

        if self.line_indent == 0
            && self.peek() == '-'
            && self.at(self.position + 1) == '-'
            && self.at(self.position + 2) == '-'
        {
            self.position += 3;
            self.skip_separation_space(true, -1);
        } else if has_directives {
            return Err(self.syntax("directives end mark is expected"));
        }

        let has_node = self.compose_node(self.line_indent - 1, Context::BlockOut, false, true)?;
        self.skip_separation_space(true, -1);

        if self.check_line_breaks
            && self.input[document_start..self.position]
                .iter()
                .any(|c| matches!(c, '\u{85}' | '\u{2028}' | '\u{2029}'))
        {
            self.warn("non-ASCII line breaks are interpreted as content");
        }

        let mut doc = std::mem::take(&mut self.doc);
        if has_node && let Some(root) = self.result {
            doc.set_root(root);
        }
        let composed = Composed {
            doc,
            positions: std::mem::take(&mut self.positions),
        };

        if self.position == self.line_start && self.test_document_separator() {
            if self.peek() == '.' {
                self.position += 3;
                self.skip_separation_space(true, -1);
            }
            return Ok(composed);
        }

        if self.position < self.length - 1 {
            return Err(self.syntax("end of the stream or a document separator is expected"));
        }
        Ok(composed)
    }
}

/// Parse a stream that must hold exactly one document.
///
/// ```rust
/// let v = yaml_codec::load("rules:\n  - DOMAIN,gemini.google.com,Openai\n").unwrap();
/// assert_eq!(v["rules"][0].as_str(), Some("DOMAIN,gemini.google.com,Openai"));
/// ```
pub fn load(text: &str) -> Result<Value> {
    load_with_options(text, &LoadOptions::default())
}

/// [`load`] with explicit options.
pub fn load_with_options(text: &str, options: &LoadOptions) -> Result<Value> {
    let mut parser = Parser::new(text, options)?;
    let (first, count) = single_document(&mut parser)?;
    match first {
        Some(composed) if count == 1 => parser.expand(&composed),
        _ => Err(parser.error(ErrorKind::DocumentCount(count))),
    }
}

/// Compose every document, keeping the first one and counting the rest.
fn single_document(parser: &mut Parser<'_>) -> Result<(Option<Composed>, usize)> {
    let mut first = None;
    let mut count = 0;
    while let Some(composed) = parser.next_document()? {
        count += 1;
        if first.is_none() {
            first = Some(composed);
        }
    }
    Ok((first, count))
}

/// Parse every document of a stream.
pub fn load_all(text: &str) -> Result<Vec<Value>> {
    load_all_with_options(text, &LoadOptions::default())
}

/// [`load_all`] with explicit options.
pub fn load_all_with_options(text: &str, options: &LoadOptions) -> Result<Vec<Value>> {
    let mut values = Vec::new();
    load_all_with(text, options, |v| values.push(v))?;
    Ok(values)
}

/// Parse every document, handing each value to `on_document` as soon as it is composed.
///
/// Documents before a failing one have already been delivered when the error is returned.
///
/// ```rust
/// let mut seen = Vec::new();
/// yaml_codec::load_all_with("--- 1\n--- 2\n", &Default::default(), |v| seen.push(v)).unwrap();
/// assert_eq!(seen, [yaml_codec::Value::Int(1), yaml_codec::Value::Int(2)]);
/// ```
pub fn load_all_with<F>(text: &str, options: &LoadOptions, mut on_document: F) -> Result<()>
where
    F: FnMut(Value),
{
    let mut parser = Parser::new(text, options)?;
    while let Some(composed) = parser.next_document()? {
        on_document(parser.expand(&composed)?);
    }
    Ok(())
}

/// Parse a single document into its arena form, keeping shared and cyclic structure.
///
/// ```rust
/// use yaml_codec::Node;
///
/// let doc = yaml_codec::load_document("&a [*a]", &Default::default()).unwrap();
/// let root = doc.root();
/// assert_eq!(doc.node(root), &Node::Sequence(vec![root]));
/// ```
pub fn load_document(text: &str, options: &LoadOptions) -> Result<Document> {
    let mut parser = Parser::new(text, options)?;
    let (first, count) = single_document(&mut parser)?;
    match first {
        Some(composed) if count == 1 => Ok(composed.doc),
        _ => Err(parser.error(ErrorKind::DocumentCount(count))),
    }
}

/// Parse every document of a stream into its arena form.
pub fn load_all_documents(text: &str, options: &LoadOptions) -> Result<Vec<Document>> {
    let mut parser = Parser::new(text, options)?;
    let mut documents = Vec::new();
    while let Some(composed) = parser.next_document()? {
        documents.push(composed.doc);
    }
    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_has_no_documents() {
        assert!(load_all("").unwrap().is_empty());
        assert!(matches!(
            load("").unwrap_err().kind(),
            ErrorKind::DocumentCount(0)
        ));
    }

    #[test]
    fn several_documents_rejected_by_load() {
        let err = load("--- 1\n--- 2\n").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::DocumentCount(2));
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(load("\u{feff}a: 1").unwrap()["a"], Value::Int(1));
    }

    #[test]
    fn nul_is_rejected() {
        let err = load("a: 1\0").unwrap_err();
        assert!(err.reason().contains("null byte"));
        assert_eq!(err.mark().column(), 5);
    }

    #[test]
    fn document_end_marker() {
        let docs = load_all("a: 1\n...\n---\nb: 2\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["b"], Value::Int(2));
    }

    #[test]
    fn comment_only_stream_is_one_null_document() {
        assert_eq!(load_all("# nothing\n").unwrap(), vec![Value::Null]);
    }

    #[test]
    fn trailing_garbage_after_document() {
        let err = load("--- a\n]\n").unwrap_err();
        assert!(err.reason().contains("end of the stream or a document separator"));
    }

    #[test]
    fn document_budget() {
        let mut budget = crate::Budget::default();
        budget.max_documents = 2;
        let options = load_options! { budget: Some(budget) };
        let err = load_all_with_options("--- 1\n--- 2\n--- 3\n", &options).unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::Budget(BudgetBreach::Documents { .. })));
    }

    #[test]
    fn expansion_budget_stops_alias_bombs() {
        let yaml = "a: &a [1, 1, 1, 1, 1, 1, 1, 1]\nb: &b [*a, *a, *a, *a, *a, *a, *a, *a]\nc: [*b, *b, *b, *b, *b, *b, *b, *b]\n";
        let mut budget = crate::Budget::default();
        budget.max_expanded_nodes = 100;
        let err = load_with_options(yaml, &load_options! { budget: Some(budget) }).unwrap_err();
        assert!(matches!(
            err.kind(),
            ErrorKind::Budget(BudgetBreach::ExpandedNodes { nodes: 100 })
        ));
    }

    #[test]
    fn recursive_alias_cannot_become_a_value() {
        let err = load("&a [*a]").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::RecursiveAlias);
        assert!(load_document("&a [*a]", &LoadOptions::default()).is_ok());
    }
}
