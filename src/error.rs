//! Load errors and warnings.
use std::fmt;

use crate::budget::BudgetBreach;
use crate::mark::Mark;
use crate::schema::Kind;

/// What went wrong while loading.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum ErrorKind {
    /// Lexical or structural violation: bad indentation, unterminated constructs,
    /// malformed directives, tags or anchors.
    Syntax(String),
    /// A mapping key occurs twice (outside of merge keys).
    DuplicateKey(String),
    /// An anchor name is defined twice in the same document.
    DuplicateAnchor(String),
    /// An alias refers to an anchor that was never defined.
    UnknownAlias(String),
    /// An explicit tag has no type in the active schema.
    UnknownTag(String),
    /// The node kind does not match what the tag's type accepts.
    KindMismatch {
        tag: String,
        expected: Kind,
        found: Kind,
    },
    /// The tag's type rejected the node content.
    CannotResolve(String),
    /// The tag's type failed to construct the value.
    Construct { tag: String, reason: String },
    /// `load` got zero or several documents.
    DocumentCount(usize),
    /// A document refers to itself and cannot be expanded into a tree.
    RecursiveAlias,
    /// A [`Budget`](crate::Budget) limit was exceeded.
    Budget(BudgetBreach),
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::Syntax(msg) => f.write_str(msg),
            ErrorKind::DuplicateKey(key) => write!(f, "duplicated mapping key \"{key}\""),
            ErrorKind::DuplicateAnchor(name) => write!(f, "duplicated anchor \"{name}\""),
            ErrorKind::UnknownAlias(name) => write!(f, "unidentified alias \"{name}\""),
            ErrorKind::UnknownTag(tag) => write!(f, "unknown tag !<{tag}>"),
            ErrorKind::KindMismatch {
                tag,
                expected,
                found,
            } => write!(
                f,
                "unacceptable node kind for !<{tag}> tag; it should be \"{expected}\", not \"{found}\""
            ),
            ErrorKind::CannotResolve(tag) => {
                write!(f, "cannot resolve a node with !<{tag}> explicit tag")
            }
            ErrorKind::Construct { tag, reason } => {
                write!(f, "cannot construct !<{tag}>: {reason}")
            }
            ErrorKind::DocumentCount(0) => {
                f.write_str("expected a single document in the stream, but found none")
            }
            ErrorKind::DocumentCount(n) => write!(
                f,
                "expected a single document in the stream, but found {n}"
            ),
            ErrorKind::RecursiveAlias => {
                f.write_str("document contains a recursive alias and cannot be expanded")
            }
            ErrorKind::Budget(breach) => write!(f, "budget exceeded: {breach}"),
        }
    }
}

/// Fatal load error.
///
/// `Display` prints the reason, the position and, unless disabled through
/// `LoadOptions::with_snippet`, a caret-pointed excerpt of the source.
#[derive(Clone, Debug)]
pub struct Error {
    pub(crate) kind: ErrorKind,
    pub(crate) mark: Mark,
    pub(crate) with_snippet: bool,
    pub(crate) crop_radius: usize,
}

impl Error {
    pub(crate) fn new(kind: ErrorKind, mark: Mark) -> Self {
        Self {
            kind,
            mark,
            with_snippet: true,
            crop_radius: 64,
        }
    }

    pub(crate) fn with_rendering(mut self, with_snippet: bool, crop_radius: usize) -> Self {
        self.with_snippet = with_snippet;
        self.crop_radius = crop_radius;
        self
    }

    pub fn kind(&self) -> &ErrorKind {
        &self.kind
    }

    pub fn mark(&self) -> &Mark {
        &self.mark
    }

    /// The reason without position or snippet.
    pub fn reason(&self) -> String {
        self.kind.to_string()
    }

    /// Rendered source excerpt, if the mark points into its buffer.
    pub fn snippet(&self) -> Option<String> {
        self.mark.snippet(&self.reason(), self.crop_radius)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind, self.mark)?;
        if self.with_snippet
            && let Some(snippet) = self.snippet()
        {
            write!(f, "\n\n{snippet}")?;
        }
        Ok(())
    }
}

impl std::error::Error for Error {}

/// Advisory issue found while loading; parsing continues.
#[derive(Clone, Debug, PartialEq)]
pub struct Warning {
    pub(crate) reason: String,
    pub(crate) mark: Mark,
}

impl Warning {
    pub fn reason(&self) -> &str {
        &self.reason
    }

    pub fn mark(&self) -> &Mark {
        &self.mark
    }
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.reason, self.mark)
    }
}
