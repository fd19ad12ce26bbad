//! Dumper options.
//!
//! ```rust
//! use yaml_codec::{Value, dump_options, dump_with_options};
//! use yaml_codec::dump_options::SortKeys;
//!
//! let value: Value = [("b", 1), ("a", 2)].into_iter().collect();
//! let options = dump_options! {
//!     indent: 4,
//!     sort_keys: SortKeys::Lexical,
//! };
//! assert_eq!(dump_with_options(&value, &options).unwrap(), "a: 2\nb: 1\n");
//! ```

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;
use std::str::FromStr;

use crate::dump_error::DumpError;
use crate::schema::Schema;
use crate::value::Value;

/// Preferred quote character for strings that cannot be plain.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum QuotingType {
    #[default]
    Single,
    Double,
}

impl FromStr for QuotingType {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "'" | "single" => Ok(QuotingType::Single),
            "\"" | "double" => Ok(QuotingType::Double),
            other => Err(DumpError::InvalidOptions(format!(
                "quoting type must be ' or \", not {other:?}"
            ))),
        }
    }
}

/// Mapping key order.
#[derive(Clone, Copy, Default)]
pub enum SortKeys {
    /// Insertion order.
    #[default]
    Unsorted,
    /// Byte-wise lexical order.
    Lexical,
    By(fn(&str, &str) -> Ordering),
}

impl fmt::Debug for SortKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortKeys::Unsorted => f.write_str("Unsorted"),
            SortKeys::Lexical => f.write_str("Lexical"),
            SortKeys::By(_) => f.write_str("By(<fn>)"),
        }
    }
}

impl SortKeys {
    pub(crate) fn compare(&self, a: &str, b: &str) -> Ordering {
        match self {
            SortKeys::Unsorted => Ordering::Equal,
            SortKeys::Lexical => a.cmp(b),
            SortKeys::By(f) => f(a, b),
        }
    }

    pub(crate) fn is_sorted(&self) -> bool {
        !matches!(self, SortKeys::Unsorted)
    }
}

impl FromStr for SortKeys {
    type Err = DumpError;

    /// Accepts the boolean spellings used by configuration files.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" | "lexical" => Ok(SortKeys::Lexical),
            "false" | "none" => Ok(SortKeys::Unsorted),
            other => Err(DumpError::InvalidOptions(format!(
                "sort keys must be a boolean or a comparator, not {other:?}"
            ))),
        }
    }
}

/// Transform applied to every value before it is dumped, outermost first.
///
/// Receives the key (mapping key, sequence index, or `""` for the root) and the value.
/// `None` drops a mapping entry and turns a sequence element into null.
pub type Replacer = Rc<dyn Fn(&str, Value) -> Option<Value>>;

/// Options for the `dump*` family. Construct with [`dump_options!`](crate::dump_options!).
#[derive(Clone)]
pub struct DumpOptions {
    /// Spaces per nesting level; at least 1. Default 2.
    pub indent: usize,
    /// Depth from which collections are written in flow style; `-1` never forces flow.
    pub flow_level: i32,
    /// Preferred line width for folding; `-1` is unlimited. Default 80.
    pub line_width: i32,
    pub quoting_type: QuotingType,
    /// Quote every string that is not written as a block scalar.
    pub force_quotes: bool,
    pub sort_keys: SortKeys,
    /// Re-emit shared values in full instead of using `&ref_N` / `*ref_N`.
    pub no_refs: bool,
    /// Do not indent sequences nested in mappings.
    pub no_array_indent: bool,
    /// Skip values no type can represent instead of failing.
    pub skip_invalid: bool,
    /// Omit spaces after `,` and `:` in flow collections.
    pub condense_flow: bool,
    /// Do not quote strings YAML 1.1 parsers would read as booleans or base-60 numbers.
    pub no_compat_mode: bool,
    /// Style per tag, e.g. `("!!int", "hex")` or `("tag:yaml.org,2002:null", "canonical")`.
    pub styles: HashMap<String, String>,
    /// Types used for representation. Defaults to [`Schema::default`].
    pub schema: Schema,
    pub replacer: Option<Replacer>,
    /// Maximum nesting depth while emitting. Default 256, which fits a 2 MiB thread stack in debug builds.
    pub max_depth: usize,
}

impl DumpOptions {
    /// Validate option values before anything is written.
    pub(crate) fn consistent(&self) -> Result<(), DumpError> {
        if self.indent == 0 {
            return Err(DumpError::InvalidOptions(
                "indent must be at least 1".to_string(),
            ));
        }
        if self.line_width == 0 || self.line_width < -1 {
            return Err(DumpError::InvalidOptions(format!(
                "line width must be positive or -1, not {}",
                self.line_width
            )));
        }
        if self.flow_level < -1 {
            return Err(DumpError::InvalidOptions(format!(
                "flow level must be -1 or more, not {}",
                self.flow_level
            )));
        }
        if self.max_depth == 0 {
            return Err(DumpError::InvalidOptions(
                "max depth must be positive".to_string(),
            ));
        }
        for (tag, style) in &self.styles {
            let full = expand_tag_shorthand(tag);
            let Some(t) = self.schema.find_by_tag(&full) else {
                continue;
            };
            if !t.accepts_style(style) {
                return Err(DumpError::InvalidOptions(format!(
                    "!<{full}> tag resolver accepts not \"{style}\" style"
                )));
            }
        }
        Ok(())
    }

    /// `styles` keyed by full tag.
    pub(crate) fn compiled_styles(&self) -> HashMap<String, String> {
        self.styles
            .iter()
            .map(|(tag, style)| (expand_tag_shorthand(tag), style.clone()))
            .collect()
    }
}

/// `!!int` -> `tag:yaml.org,2002:int`.
pub(crate) fn expand_tag_shorthand(tag: &str) -> String {
    match tag.strip_prefix("!!") {
        Some(suffix) => format!("tag:yaml.org,2002:{suffix}"),
        None => tag.to_owned(),
    }
}

impl Default for DumpOptions {
    fn default() -> Self {
        Self {
            indent: 2,
            flow_level: -1,
            line_width: 80,
            quoting_type: QuotingType::Single,
            force_quotes: false,
            sort_keys: SortKeys::Unsorted,
            no_refs: false,
            no_array_indent: false,
            skip_invalid: false,
            condense_flow: false,
            no_compat_mode: false,
            styles: HashMap::new(),
            schema: Schema::default(),
            replacer: None,
            max_depth: 256,
        }
    }
}

impl fmt::Debug for DumpOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DumpOptions")
            .field("indent", &self.indent)
            .field("flow_level", &self.flow_level)
            .field("line_width", &self.line_width)
            .field("quoting_type", &self.quoting_type)
            .field("force_quotes", &self.force_quotes)
            .field("sort_keys", &self.sort_keys)
            .field("no_refs", &self.no_refs)
            .field("no_array_indent", &self.no_array_indent)
            .field("skip_invalid", &self.skip_invalid)
            .field("condense_flow", &self.condense_flow)
            .field("no_compat_mode", &self.no_compat_mode)
            .field("styles", &self.styles)
            .field("replacer", &if self.replacer.is_some() { "set" } else { "none" })
            .field("max_depth", &self.max_depth)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_consistent() {
        assert!(DumpOptions::default().consistent().is_ok());
    }

    #[test]
    fn zero_indent_rejected() {
        let opts = DumpOptions {
            indent: 0,
            ..DumpOptions::default()
        };
        assert!(matches!(opts.consistent(), Err(DumpError::InvalidOptions(_))));
    }

    #[test]
    fn bad_line_width_rejected() {
        for width in [0, -2] {
            let opts = DumpOptions {
                line_width: width,
                ..DumpOptions::default()
            };
            assert!(opts.consistent().is_err(), "{width}");
        }
    }

    #[test]
    fn unknown_style_rejected() {
        let mut opts = DumpOptions::default();
        opts.styles.insert("!!int".into(), "roman".into());
        let err = opts.consistent().unwrap_err();
        assert!(err.to_string().contains("accepts not \"roman\" style"));

        opts.styles.insert("!!int".into(), "hex".into());
        assert!(opts.consistent().is_ok());
    }

    #[test]
    fn sort_keys_from_str() {
        assert!(matches!("true".parse::<SortKeys>(), Ok(SortKeys::Lexical)));
        assert!(matches!("false".parse::<SortKeys>(), Ok(SortKeys::Unsorted)));
        assert!(matches!(
            "sideways".parse::<SortKeys>(),
            Err(DumpError::InvalidOptions(_))
        ));
    }

    #[test]
    fn quoting_type_from_str() {
        assert_eq!("\"".parse::<QuotingType>().unwrap(), QuotingType::Double);
        assert!("`".parse::<QuotingType>().is_err());
    }
}
