//! `str`, `seq` and `map`.

use std::sync::Arc;

use super::{Kind, TypeDescriptor, TypeRef};

pub(crate) const STR: &str = "tag:yaml.org,2002:str";
pub(crate) const SEQ: &str = "tag:yaml.org,2002:seq";
pub(crate) const MAP: &str = "tag:yaml.org,2002:map";

pub(super) fn types() -> Vec<TypeRef> {
    [
        TypeDescriptor::builder(STR, Kind::Scalar).build(),
        TypeDescriptor::builder(SEQ, Kind::Sequence).build(),
        TypeDescriptor::builder(MAP, Kind::Mapping).build(),
    ]
    .into_iter()
    .flatten()
    .map(Arc::new)
    .collect()
}
