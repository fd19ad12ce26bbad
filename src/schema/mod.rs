//! Schemas: ordered, immutable sets of type descriptors.
//!
//! A schema keeps two lists. *Implicit* types are tried, in order, against every plain scalar
//! without a tag; *explicit* types are only used for tagged nodes. Both lists are compiled into
//! per-kind lookup tables when the schema is created and never change afterwards, so a schema
//! can be shared freely between threads and calls.
//!
//! ```rust
//! use yaml_codec::schema::{Kind, Schema, SchemaDefinition, TypeDescriptor};
//! use yaml_codec::{Value, load_options};
//!
//! let point = TypeDescriptor::builder("!point", Kind::Sequence)
//!     .construct_node(|doc, id, tag| {
//!         doc.wrap_tagged(id, tag);
//!         Ok(())
//!     })
//!     .build()
//!     .unwrap();
//! let schema = Schema::default()
//!     .extend(SchemaDefinition { implicit: vec![], explicit: vec![point] })
//!     .unwrap();
//!
//! let options = load_options! { schema: schema };
//! let v = yaml_codec::load_with_options("!point [1, 2]", &options).unwrap();
//! assert_eq!(v.as_tagged().unwrap().tag, "!point");
//! ```

use std::fmt;
use std::sync::{Arc, OnceLock};

use ahash::AHashMap;

mod descriptor;
mod extra;
mod failsafe;
mod json;

pub use descriptor::{
    Kind, NodeConstruct, NodeResolve, Predicate, Represent, RepresentFn, RepresentName,
    ScalarConstruct, ScalarResolve, TypeDescriptor, TypeDescriptorBuilder,
};

/// Invalid type or schema definition.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaError {
    /// A kind name other than `scalar`, `sequence` or `mapping`.
    UnknownKind(String),
    /// The descriptor's options contradict each other.
    InvalidType { tag: String, reason: String },
    /// Only non-multi scalar types can be resolved implicitly.
    NotImplicit { tag: String, reason: &'static str },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaError::UnknownKind(kind) => write!(
                f,
                "unknown kind \"{kind}\"; expected scalar, sequence or mapping"
            ),
            SchemaError::InvalidType { tag, reason } => {
                write!(f, "invalid type !<{tag}>: {reason}")
            }
            SchemaError::NotImplicit { tag, reason } => {
                write!(f, "type !<{tag}> cannot be implicit: {reason}")
            }
        }
    }
}

impl std::error::Error for SchemaError {}

/// Types to add with [`Schema::extend`].
#[derive(Clone, Debug, Default)]
pub struct SchemaDefinition {
    pub implicit: Vec<TypeDescriptor>,
    pub explicit: Vec<TypeDescriptor>,
}

type TypeRef = Arc<TypeDescriptor>;

/// Exact-tag tables per kind plus prefix lists for multi types.
#[derive(Default)]
struct TypeMap {
    scalar: AHashMap<String, TypeRef>,
    sequence: AHashMap<String, TypeRef>,
    mapping: AHashMap<String, TypeRef>,
    fallback: AHashMap<String, TypeRef>,
    multi_scalar: Vec<TypeRef>,
    multi_sequence: Vec<TypeRef>,
    multi_mapping: Vec<TypeRef>,
    multi_fallback: Vec<TypeRef>,
}

struct SchemaInner {
    implicit: Vec<TypeRef>,
    explicit: Vec<TypeRef>,
    compiled_implicit: Vec<TypeRef>,
    compiled_explicit: Vec<TypeRef>,
    type_map: TypeMap,
}

/// Immutable, cheaply clonable set of types.
#[derive(Clone)]
pub struct Schema {
    inner: Arc<SchemaInner>,
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tags = |list: &[TypeRef]| list.iter().map(|t| t.tag().to_owned()).collect::<Vec<_>>();
        f.debug_struct("Schema")
            .field("implicit", &tags(&self.inner.compiled_implicit))
            .field("explicit", &tags(&self.inner.compiled_explicit))
            .finish()
    }
}

/// Keep one entry per `(tag, kind, multi)`; a later entry takes the earlier one's position.
fn compile_list(list: &[TypeRef]) -> Vec<TypeRef> {
    let mut result: Vec<TypeRef> = Vec::with_capacity(list.len());
    for current in list {
        let existing = result.iter().rposition(|previous| {
            previous.tag() == current.tag()
                && previous.kind() == current.kind()
                && previous.multi() == current.multi()
        });
        match existing {
            Some(i) => result[i] = Arc::clone(current),
            None => result.push(Arc::clone(current)),
        }
    }
    result
}

fn compile_map(lists: [&[TypeRef]; 2]) -> TypeMap {
    let mut map = TypeMap::default();
    for t in lists.into_iter().flatten() {
        if t.multi() {
            match t.kind() {
                Kind::Scalar => map.multi_scalar.push(Arc::clone(t)),
                Kind::Sequence => map.multi_sequence.push(Arc::clone(t)),
                Kind::Mapping => map.multi_mapping.push(Arc::clone(t)),
            }
            map.multi_fallback.push(Arc::clone(t));
        } else {
            let table = match t.kind() {
                Kind::Scalar => &mut map.scalar,
                Kind::Sequence => &mut map.sequence,
                Kind::Mapping => &mut map.mapping,
            };
            table.insert(t.tag().to_owned(), Arc::clone(t));
            map.fallback.insert(t.tag().to_owned(), Arc::clone(t));
        }
    }
    map
}

impl Schema {
    fn from_lists(implicit: Vec<TypeRef>, explicit: Vec<TypeRef>) -> Self {
        let compiled_implicit = compile_list(&implicit);
        let compiled_explicit = compile_list(&explicit);
        let type_map = compile_map([&compiled_implicit, &compiled_explicit]);
        Self {
            inner: Arc::new(SchemaInner {
                implicit,
                explicit,
                compiled_implicit,
                compiled_explicit,
                type_map,
            }),
        }
    }

    /// A new schema with `definition`'s types appended after this schema's.
    ///
    /// Implicit types must be non-multi scalars. A type with the same tag, kind and multi
    /// flag as an existing one replaces it.
    pub fn extend(&self, definition: SchemaDefinition) -> Result<Schema, SchemaError> {
        for t in &definition.implicit {
            if t.kind() != Kind::Scalar {
                return Err(SchemaError::NotImplicit {
                    tag: t.tag().to_owned(),
                    reason: "implicit resolving of non-scalar types is not supported",
                });
            }
            if t.multi() {
                return Err(SchemaError::NotImplicit {
                    tag: t.tag().to_owned(),
                    reason: "multi tags can only be listed as explicit",
                });
            }
        }
        let implicit = self
            .inner
            .implicit
            .iter()
            .cloned()
            .chain(definition.implicit.into_iter().map(Arc::new))
            .collect();
        let explicit = self
            .inner
            .explicit
            .iter()
            .cloned()
            .chain(definition.explicit.into_iter().map(Arc::new))
            .collect();
        tracing::debug!("extending schema");
        Ok(Self::from_lists(implicit, explicit))
    }

    /// Only `str`, `seq` and `map`.
    pub fn failsafe() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| Self::from_lists(Vec::new(), failsafe::types()))
            .clone()
    }

    /// Failsafe plus implicit `null`, `bool`, `int` and `float`.
    pub fn json() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let base = Self::failsafe();
                Self::from_lists(json::types(), base.inner.explicit.clone())
            })
            .clone()
    }

    /// Same types as [`Schema::json`].
    pub fn core() -> Schema {
        Self::json()
    }

    /// Core plus implicit `timestamp` and `merge`, explicit `binary`, `omap`, `pairs` and `set`.
    fn default_schema() -> Schema {
        static SCHEMA: OnceLock<Schema> = OnceLock::new();
        SCHEMA
            .get_or_init(|| {
                let core = Self::core();
                let implicit = core.inner.implicit.iter().cloned().chain(extra::implicit_types()).collect();
                let explicit = core.inner.explicit.iter().cloned().chain(extra::explicit_types()).collect();
                Self::from_lists(implicit, explicit)
            })
            .clone()
    }

    /// Implicit types in resolution order.
    pub fn implicit_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.inner.compiled_implicit.iter().map(Arc::as_ref)
    }

    /// Explicit types in declaration order.
    pub fn explicit_types(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.inner.compiled_explicit.iter().map(Arc::as_ref)
    }

    /// Type for an explicit `tag` on a node of `kind` (`None`: node without content).
    ///
    /// Exact tags win; otherwise the first multi type whose tag prefixes `tag`.
    pub fn lookup(&self, tag: &str, kind: Option<Kind>) -> Option<&TypeDescriptor> {
        let map = &self.inner.type_map;
        let (table, multi) = match kind {
            Some(Kind::Scalar) => (&map.scalar, &map.multi_scalar),
            Some(Kind::Sequence) => (&map.sequence, &map.multi_sequence),
            Some(Kind::Mapping) => (&map.mapping, &map.multi_mapping),
            None => (&map.fallback, &map.multi_fallback),
        };
        table
            .get(tag)
            .or_else(|| multi.iter().find(|t| tag.starts_with(t.tag())))
            .map(Arc::as_ref)
    }

    /// Implicit type recognizing plain scalar `data`.
    pub fn resolve_implicit(&self, data: &str) -> Option<&TypeDescriptor> {
        self.implicit_types().find(|t| t.resolve_scalar(data, "?"))
    }

    /// Type for an explicit tag used in the dumper's `styles` option.
    pub(crate) fn find_by_tag(&self, tag: &str) -> Option<&TypeDescriptor> {
        self.inner.type_map.fallback.get(tag).map(Arc::as_ref)
    }
}

impl Default for Schema {
    /// The full default schema.
    fn default() -> Self {
        Self::default_schema()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    fn scalar(tag: &str) -> TypeDescriptor {
        TypeDescriptor::builder(tag, Kind::Scalar).build().unwrap()
    }

    #[test]
    fn builtin_lists() {
        let tags: Vec<_> = Schema::default().implicit_types().map(|t| t.tag().to_owned()).collect();
        assert_eq!(
            tags,
            [
                "tag:yaml.org,2002:null",
                "tag:yaml.org,2002:bool",
                "tag:yaml.org,2002:int",
                "tag:yaml.org,2002:float",
                "tag:yaml.org,2002:timestamp",
                "tag:yaml.org,2002:merge",
            ]
        );
        assert_eq!(Schema::failsafe().implicit_types().count(), 0);
        assert_eq!(Schema::failsafe().explicit_types().count(), 3);
    }

    #[test]
    fn implicit_resolution_order() {
        let s = Schema::default();
        assert_eq!(s.resolve_implicit("12").unwrap().tag(), "tag:yaml.org,2002:int");
        assert_eq!(s.resolve_implicit("1.5").unwrap().tag(), "tag:yaml.org,2002:float");
        assert_eq!(s.resolve_implicit("~").unwrap().tag(), "tag:yaml.org,2002:null");
        assert!(s.resolve_implicit("hello").is_none());
    }

    #[test]
    fn extend_rejects_collection_implicit() {
        let seq = TypeDescriptor::builder("!s", Kind::Sequence).build().unwrap();
        let err = Schema::default()
            .extend(SchemaDefinition {
                implicit: vec![seq],
                explicit: vec![],
            })
            .unwrap_err();
        assert!(matches!(err, SchemaError::NotImplicit { .. }));
    }

    #[test]
    fn extend_rejects_multi_implicit() {
        let t = TypeDescriptor::builder("!m", Kind::Scalar).multi(true).build().unwrap();
        assert!(Schema::default()
            .extend(SchemaDefinition {
                implicit: vec![t],
                explicit: vec![],
            })
            .is_err());
    }

    #[test]
    fn extend_dedups_keeping_later_in_place() {
        let base = Schema::failsafe()
            .extend(SchemaDefinition {
                implicit: vec![],
                explicit: vec![scalar("!a"), scalar("!b")],
            })
            .unwrap();
        let replacement = TypeDescriptor::builder("!a", Kind::Scalar)
            .construct_scalar(|_, _| Ok(Value::Int(1)))
            .build()
            .unwrap();
        let extended = base
            .extend(SchemaDefinition {
                implicit: vec![],
                explicit: vec![replacement],
            })
            .unwrap();
        let tags: Vec<_> = extended.explicit_types().map(|t| t.tag().to_owned()).collect();
        assert_eq!(
            tags,
            ["tag:yaml.org,2002:str", "tag:yaml.org,2002:seq", "tag:yaml.org,2002:map", "!a", "!b"]
        );
        let a = extended.lookup("!a", Some(Kind::Scalar)).unwrap();
        assert_eq!(a.construct_scalar("x", "!a"), Ok(Value::Int(1)));
        // The parent schema is untouched.
        let old = base.lookup("!a", Some(Kind::Scalar)).unwrap();
        assert_eq!(old.construct_scalar("x", "!a"), Ok(Value::from("x")));
    }

    #[test]
    fn multi_prefix_lookup() {
        let t = TypeDescriptor::builder("!env:", Kind::Scalar).multi(true).build().unwrap();
        let s = Schema::default()
            .extend(SchemaDefinition {
                implicit: vec![],
                explicit: vec![t],
            })
            .unwrap();
        assert_eq!(s.lookup("!env:HOME", Some(Kind::Scalar)).unwrap().tag(), "!env:");
        assert_eq!(s.lookup("!env:HOME", None).unwrap().tag(), "!env:");
        assert!(s.lookup("!env:HOME", Some(Kind::Mapping)).is_none());
        assert!(s.lookup("!other", Some(Kind::Scalar)).is_none());
    }

    #[test]
    fn schema_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Schema>();
    }
}
