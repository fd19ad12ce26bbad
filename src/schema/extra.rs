//! Types beyond the core schema: timestamps, merge keys, binary data and the ordered
//! collection types `omap`, `pairs` and `set`.

use std::sync::Arc;

use ahash::AHashSet;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as B64;
use chrono::SecondsFormat;

use super::{Kind, TypeDescriptor, TypeRef};
use crate::document::{Document, Node, NodeId};
use crate::parse_scalars::{construct_timestamp, match_timestamp};
use crate::value::Value;

pub(crate) const TIMESTAMP: &str = "tag:yaml.org,2002:timestamp";
pub(crate) const MERGE: &str = "tag:yaml.org,2002:merge";
pub(crate) const BINARY: &str = "tag:yaml.org,2002:binary";
pub(crate) const OMAP: &str = "tag:yaml.org,2002:omap";
pub(crate) const PAIRS: &str = "tag:yaml.org,2002:pairs";
pub(crate) const SET: &str = "tag:yaml.org,2002:set";

/// Base64 line length used when dumping binary data.
const BINARY_LINE: usize = 76;

fn timestamp_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(TIMESTAMP, Kind::Scalar)
        .resolve_scalar(|data, _| match_timestamp(data).is_some())
        .construct_scalar(|data, _| {
            let parts = match_timestamp(data).ok_or_else(|| format!("invalid timestamp \"{data}\""))?;
            construct_timestamp(parts).map(Value::Timestamp)
        })
        .predicate(|v| matches!(v, Value::Timestamp(_)))
        .represent(|v, _| match v {
            Value::Timestamp(t) => t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            _ => String::new(),
        })
        .build()
        .ok()
}

fn merge_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(MERGE, Kind::Scalar)
        .resolve_scalar(|data, _| data == "<<")
        .build()
        .ok()
}

fn decode_binary(data: &str) -> Result<Vec<u8>, String> {
    let cleaned: Vec<u8> = data.bytes().filter(|b| !b.is_ascii_whitespace()).collect();
    B64.decode(cleaned).map_err(|e| format!("invalid base64: {e}"))
}

fn binary_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(BINARY, Kind::Scalar)
        .resolve_scalar(|data, _| decode_binary(data).is_ok())
        .construct_scalar(|data, _| decode_binary(data).map(Value::Binary))
        .predicate(|v| matches!(v, Value::Binary(_)))
        .represent(|v, _| {
            let Value::Binary(bytes) = v else {
                return String::new();
            };
            let encoded = B64.encode(bytes);
            let mut out = String::with_capacity(encoded.len() + encoded.len() / BINARY_LINE);
            for (i, ch) in encoded.chars().enumerate() {
                if i > 0 && i % BINARY_LINE == 0 {
                    out.push('\n');
                }
                out.push(ch);
            }
            out
        })
        .build()
        .ok()
}

/// Sequence items that are single-entry mappings, as `(item, key, value)`.
fn single_entry_items(doc: &Document, id: NodeId) -> Option<Vec<(NodeId, &str, NodeId)>> {
    let Node::Sequence(items) = doc.node(id) else {
        return None;
    };
    items
        .iter()
        .map(|&item| match doc.node(item) {
            Node::Mapping(entries) if entries.len() == 1 => entries
                .first()
                .map(|(k, &v)| (item, k.as_str(), v)),
            _ => None,
        })
        .collect()
}

fn omap_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(OMAP, Kind::Sequence)
        .resolve_node(|doc, id, _| {
            let Some(items) = single_entry_items(doc, id) else {
                return false;
            };
            let mut seen = AHashSet::with_capacity(items.len());
            items.iter().all(|(_, key, _)| seen.insert(*key))
        })
        .build()
        .ok()
}

fn pairs_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(PAIRS, Kind::Sequence)
        .resolve_node(|doc, id, _| single_entry_items(doc, id).is_some())
        .construct_node(|doc, id, _| {
            let items: Vec<(String, NodeId)> = single_entry_items(doc, id)
                .ok_or_else(|| "expected a sequence of single-entry mappings".to_string())?
                .into_iter()
                .map(|(_, k, v)| (k.to_owned(), v))
                .collect();
            // New pair nodes: the original mappings may be aliased elsewhere.
            let pairs = items
                .into_iter()
                .map(|(key, value)| {
                    let key = doc.push(Node::Scalar(Value::String(key)));
                    doc.push(Node::Sequence(vec![key, value]))
                })
                .collect();
            doc.replace(id, Node::Sequence(pairs));
            Ok(())
        })
        .build()
        .ok()
}

fn set_type() -> Option<TypeDescriptor> {
    TypeDescriptor::builder(SET, Kind::Mapping)
        .resolve_node(|doc, id, _| match doc.node(id) {
            Node::Mapping(entries) => entries
                .values()
                .all(|&v| matches!(doc.node(v), Node::Scalar(Value::Null))),
            _ => false,
        })
        .build()
        .ok()
}

pub(super) fn implicit_types() -> Vec<TypeRef> {
    [timestamp_type(), merge_type()]
        .into_iter()
        .flatten()
        .map(Arc::new)
        .collect()
}

pub(super) fn explicit_types() -> Vec<TypeRef> {
    [binary_type(), omap_type(), pairs_type(), set_type()]
        .into_iter()
        .flatten()
        .map(Arc::new)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binary_round_trip_with_line_breaks() {
        let t = binary_type().unwrap();
        let bytes: Vec<u8> = (0..=255).collect();
        let text = t.represent(&Value::Binary(bytes.clone()), None).unwrap().unwrap();
        assert!(text.lines().all(|l| l.len() <= BINARY_LINE));
        assert!(text.contains('\n'));
        assert_eq!(t.construct_scalar(&text, BINARY), Ok(Value::Binary(bytes)));
    }

    #[test]
    fn binary_rejects_garbage() {
        let t = binary_type().unwrap();
        assert!(!t.resolve_scalar("not base64!", BINARY));
        assert!(t.resolve_scalar("R0lG\n ODlh", BINARY));
    }

    #[test]
    fn timestamp_repr_uses_z_for_utc() {
        let t = timestamp_type().unwrap();
        let v = t.construct_scalar("2001-12-14 21:59:43.10", TIMESTAMP).unwrap();
        assert_eq!(t.represent(&v, None).unwrap().unwrap(), "2001-12-14T21:59:43.100Z");
        assert!(t.construct_scalar("2001-02-30", TIMESTAMP).is_err());
    }

    #[test]
    fn omap_requires_unique_single_keys() {
        let doc = Document::from_value(&Value::Sequence(vec![
            [("a", 1)].into_iter().collect(),
            [("b", 2)].into_iter().collect(),
        ]));
        let t = omap_type().unwrap();
        assert!(t.resolve_node(&doc, doc.root(), OMAP));

        let dup = Document::from_value(&Value::Sequence(vec![
            [("a", 1)].into_iter().collect(),
            [("a", 2)].into_iter().collect(),
        ]));
        assert!(!t.resolve_node(&dup, dup.root(), OMAP));
    }

    #[test]
    fn pairs_become_two_element_sequences() {
        let mut doc = Document::from_value(&Value::Sequence(vec![
            [("a", 1)].into_iter().collect(),
            [("a", 2)].into_iter().collect(),
        ]));
        let t = pairs_type().unwrap();
        let root = doc.root();
        assert!(t.resolve_node(&doc, root, PAIRS));
        t.construct_node(&mut doc, root, PAIRS).unwrap();
        assert_eq!(
            doc.to_value().unwrap(),
            Value::Sequence(vec![
                Value::Sequence(vec!["a".into(), 1.into()]),
                Value::Sequence(vec!["a".into(), 2.into()]),
            ])
        );
    }

    #[test]
    fn set_requires_null_values() {
        let t = set_type().unwrap();
        let ok = Document::from_value(&[("a", Value::Null)].into_iter().collect::<Value>());
        assert!(t.resolve_node(&ok, ok.root(), SET));
        let bad = Document::from_value(&[("a", Value::Int(1))].into_iter().collect::<Value>());
        assert!(!t.resolve_node(&bad, bad.root(), SET));
    }
}
