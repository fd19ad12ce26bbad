//! Resource budgets enforced while loading.
//!
//! The loader is a recursive-descent parser and aliases may fan out into exponentially large
//! trees once expanded, so a few counters guard against pathological inputs. All limits are
//! checked as the input is consumed; the first breach aborts the load with
//! [`ErrorKind::Budget`](crate::ErrorKind::Budget).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Limits applied to a single `load*` call.
///
/// The defaults are permissive for configuration files while stopping alias bombs and
/// stack exhaustion.
///
/// ```rust
/// use yaml_codec::{Budget, load_options};
///
/// let options = load_options! {
///     budget: Some(Budget { max_depth: 4, ..Budget::default() }),
/// };
/// let err = yaml_codec::load_with_options("a: [[[[[1]]]]]\n", &options).unwrap_err();
/// assert!(err.to_string().contains("nesting depth"));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Budget {
    /// Maximum nesting depth of collections.
    ///
    /// Default: 128, which keeps the recursive descent within a 2 MiB thread stack in
    /// debug builds.
    pub max_depth: usize,
    /// Maximum number of documents in one stream.
    ///
    /// Default: 1,024
    pub max_documents: usize,
    /// Maximum number of anchor definitions per stream.
    ///
    /// Default: 50,000
    pub max_anchors: usize,
    /// Maximum number of alias references per stream.
    ///
    /// Default: 50,000
    pub max_aliases: usize,
    /// Maximum number of nodes produced when a document graph is expanded into a tree.
    /// Shared nodes count once per occurrence, which is what bounds alias bombs.
    ///
    /// Default: 1,000,000
    pub max_expanded_nodes: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_depth: 128,
            max_documents: 1_024,
            max_anchors: 50_000,
            max_aliases: 50_000,
            max_expanded_nodes: 1_000_000,
        }
    }
}

/// What tripped the budget.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BudgetBreach {
    Depth { depth: usize },
    Documents { documents: usize },
    Anchors { anchors: usize },
    Aliases { aliases: usize },
    ExpandedNodes { nodes: usize },
}

impl fmt::Display for BudgetBreach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BudgetBreach::Depth { depth } => write!(f, "nesting depth {depth} exceeds the limit"),
            BudgetBreach::Documents { documents } => {
                write!(f, "document count {documents} exceeds the limit")
            }
            BudgetBreach::Anchors { anchors } => write!(f, "anchor count {anchors} exceeds the limit"),
            BudgetBreach::Aliases { aliases } => write!(f, "alias count {aliases} exceeds the limit"),
            BudgetBreach::ExpandedNodes { nodes } => {
                write!(f, "alias expansion produced more than {nodes} nodes")
            }
        }
    }
}

/// Running counters checked against a [`Budget`].
#[derive(Debug, Default)]
pub(crate) struct BudgetEnforcer {
    budget: Option<Budget>,
    documents: usize,
    anchors: usize,
    aliases: usize,
}

impl BudgetEnforcer {
    pub(crate) fn new(budget: Option<Budget>) -> Self {
        Self {
            budget,
            ..Self::default()
        }
    }

    pub(crate) fn check_depth(&self, depth: usize) -> Result<(), BudgetBreach> {
        match &self.budget {
            Some(b) if depth > b.max_depth => Err(BudgetBreach::Depth { depth }),
            _ => Ok(()),
        }
    }

    pub(crate) fn on_document(&mut self) -> Result<(), BudgetBreach> {
        self.documents += 1;
        match &self.budget {
            Some(b) if self.documents > b.max_documents => Err(BudgetBreach::Documents {
                documents: self.documents,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn on_anchor(&mut self) -> Result<(), BudgetBreach> {
        self.anchors += 1;
        match &self.budget {
            Some(b) if self.anchors > b.max_anchors => Err(BudgetBreach::Anchors {
                anchors: self.anchors,
            }),
            _ => Ok(()),
        }
    }

    pub(crate) fn on_alias(&mut self) -> Result<(), BudgetBreach> {
        self.aliases += 1;
        match &self.budget {
            Some(b) if self.aliases > b.max_aliases => Err(BudgetBreach::Aliases {
                aliases: self.aliases,
            }),
            _ => Ok(()),
        }
    }

    /// Node limit for [`Document::to_value_with_limit`](crate::Document::to_value_with_limit).
    pub(crate) fn expansion_limit(&self) -> usize {
        self.budget
            .as_ref()
            .map_or(usize::MAX, |b| b.max_expanded_nodes)
    }
}
