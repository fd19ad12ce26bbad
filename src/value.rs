//! Native values produced by the loader and consumed by the dumper.

use std::fmt;
use std::ops::Index;

use chrono::{DateTime, FixedOffset};
use indexmap::IndexMap;

/// Insertion-ordered mapping with string keys.
pub type Mapping = IndexMap<String, Value>;

/// A loaded YAML value.
///
/// Mappings keep their insertion order and keys are unique once stringified. Values of
/// extension types are carried as [`Value::Tagged`]: the tag plus whatever payload the
/// type's constructor produced.
#[derive(Clone, Debug, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    Binary(Vec<u8>),
    Timestamp(DateTime<FixedOffset>),
    Sequence(Vec<Value>),
    Mapping(Mapping),
    Tagged(Box<TaggedValue>),
}

/// A value of an extension-defined type.
#[derive(Clone, Debug, PartialEq)]
pub struct TaggedValue {
    pub tag: String,
    pub value: Value,
}

impl Value {
    /// Wrap `value` under `tag`.
    pub fn tagged(tag: impl Into<String>, value: Value) -> Self {
        Value::Tagged(Box::new(TaggedValue {
            tag: tag.into(),
            value,
        }))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Floats, and integers widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Float(f) => Some(*f),
            Value::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Sequence(seq) => Some(seq),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            Value::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_tagged(&self) -> Option<&TaggedValue> {
        match self {
            Value::Tagged(t) => Some(t),
            _ => None,
        }
    }

    /// Look up a key of a mapping value.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_mapping().and_then(|m| m.get(key))
    }

    /// True for sequences, mappings and tagged values.
    pub fn is_composite(&self) -> bool {
        matches!(
            self,
            Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_)
        )
    }

    /// Short name of the variant, used in diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Binary(_) => "binary",
            Value::Timestamp(_) => "timestamp",
            Value::Sequence(_) => "sequence",
            Value::Mapping(_) => "mapping",
            Value::Tagged(_) => "tagged",
        }
    }
}

static NULL: Value = Value::Null;

impl Index<&str> for Value {
    type Output = Value;

    /// Missing keys and non-mapping values index to `Null`.
    fn index(&self, key: &str) -> &Value {
        self.get(key).unwrap_or(&NULL)
    }
}

impl Index<usize> for Value {
    type Output = Value;

    fn index(&self, index: usize) -> &Value {
        self.as_sequence()
            .and_then(|s| s.get(index))
            .unwrap_or(&NULL)
    }
}

impl fmt::Display for Value {
    /// Compact, flow-like rendering for diagnostics. Use [`crate::dump`] for YAML output.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("null"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(v) => {
                let mut s = String::new();
                crate::zmij_format::push_float_string(&mut s, *v);
                f.write_str(&s)
            }
            Value::String(s) => write!(f, "{s:?}"),
            Value::Binary(b) => write!(f, "<{} bytes>", b.len()),
            Value::Timestamp(t) => write!(f, "{}", t.to_rfc3339()),
            Value::Sequence(seq) => {
                f.write_str("[")?;
                for (i, v) in seq.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{v}")?;
                }
                f.write_str("]")
            }
            Value::Mapping(map) => {
                f.write_str("{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{k:?}: {v}")?;
                }
                f.write_str("}")
            }
            Value::Tagged(t) => write!(f, "!{} {}", t.tag, t.value),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_owned())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<Vec<u8>> for Value {
    fn from(b: Vec<u8>) -> Self {
        Value::Binary(b)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(t: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(t)
    }
}

impl From<Vec<Value>> for Value {
    fn from(seq: Vec<Value>) -> Self {
        Value::Sequence(seq)
    }
}

impl From<Mapping> for Value {
    fn from(map: Mapping) -> Self {
        Value::Mapping(map)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Value::Mapping(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_missing_is_null() {
        let v: Value = [("a", Value::Int(1))].into_iter().collect();
        assert_eq!(v["a"], Value::Int(1));
        assert!(v["b"].is_null());
        assert!(v[3].is_null());
    }

    #[test]
    fn as_f64_widens_ints() {
        assert_eq!(Value::Int(3).as_f64(), Some(3.0));
        assert_eq!(Value::from("x").as_f64(), None);
    }

    #[test]
    fn display_is_compact() {
        let v: Value = [
            ("a", Value::Null),
            ("b", Value::Sequence(vec![1.into(), 2.5.into()])),
        ]
        .into_iter()
        .collect();
        assert_eq!(v.to_string(), "{\"a\": null, \"b\": [1, 2.5]}");
    }

    #[test]
    fn tagged_constructor() {
        let v = Value::tagged("!point", Value::Sequence(vec![1.into(), 2.into()]));
        let t = v.as_tagged().unwrap();
        assert_eq!(t.tag, "!point");
        assert!(v.is_composite());
    }
}
