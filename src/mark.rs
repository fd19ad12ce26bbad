//! Source positions attached to load errors and warnings.

use std::fmt;
use std::sync::Arc;

/// Position within the YAML source a diagnostic refers to.
///
/// A mark carries the whole input buffer (shared, not copied) so that an error can render
/// the surrounding lines long after the loader has returned. Line and column are 1-based;
/// the column counts Unicode scalar values, `offset` counts bytes.
///
/// ```rust
/// let err = yaml_codec::load("a: 1\na: 2\n").unwrap_err();
/// let mark = err.mark();
/// assert_eq!(mark.line(), 2);
/// assert_eq!(mark.column(), 1);
/// assert_eq!(mark.offset(), 5);
/// ```
#[derive(Clone)]
pub struct Mark {
    pub(crate) name: Option<Arc<str>>,
    pub(crate) buffer: Arc<str>,
    pub(crate) offset: usize,
    pub(crate) line: usize,
    pub(crate) column: usize,
}

impl Mark {
    pub(crate) fn new(
        name: Option<Arc<str>>,
        buffer: Arc<str>,
        offset: usize,
        line: usize,
        column: usize,
    ) -> Self {
        Self {
            name,
            buffer,
            offset,
            line,
            column,
        }
    }

    /// Source name given through `LoadOptions::filename`, if any.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// The complete input the mark points into.
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Absolute byte offset into [`Mark::buffer`].
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// 1-based line number.
    pub fn line(&self) -> usize {
        self.line
    }

    /// 1-based column, in characters.
    pub fn column(&self) -> usize {
        self.column
    }

    /// Render a caret-pointed window of the lines around this mark.
    ///
    /// Returns `None` when the mark does not point into its buffer (for example an empty input).
    pub fn snippet(&self, msg: &str, crop_radius: usize) -> Option<String> {
        crate::snippet::render(self, msg, crop_radius)
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mark")
            .field("name", &self.name)
            .field("offset", &self.offset)
            .field("line", &self.line)
            .field("column", &self.column)
            .finish()
    }
}

impl PartialEq for Mark {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.offset == other.offset
            && self.line == other.line
            && self.column == other.column
    }
}

impl Eq for Mark {}

impl fmt::Display for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => write!(f, "in \"{name}\" at line {}, column {}", self.line, self.column),
            None => write!(f, "at line {}, column {}", self.line, self.column),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mark(name: Option<&str>, line: usize, column: usize) -> Mark {
        Mark::new(name.map(Arc::from), Arc::from("a: 1\n"), 0, line, column)
    }

    #[test]
    fn display_without_name() {
        assert_eq!(mark(None, 3, 7).to_string(), "at line 3, column 7");
    }

    #[test]
    fn display_with_name() {
        assert_eq!(
            mark(Some("conf.yaml"), 1, 2).to_string(),
            "in \"conf.yaml\" at line 1, column 2"
        );
    }

    #[test]
    fn equality_ignores_buffer_identity() {
        let a = mark(None, 1, 1);
        let mut b = mark(None, 1, 1);
        b.buffer = Arc::from("a: 1\n");
        assert_eq!(a, b);
    }
}
