//! YAML loader and dumper driven by an extensible schema.
//!
//! ```rust
//! let v = yaml_codec::load("a: &x 1\nb: *x\n").unwrap();
//! assert_eq!(v["b"], yaml_codec::Value::Int(1));
//! assert_eq!(yaml_codec::dump(&v).unwrap(), "a: 1\nb: 1\n");
//! ```
pub use budget::{Budget, BudgetBreach};
pub use document::{Document, ExpandError, Node, NodeId};
pub use dump::{dump, dump_document, dump_with_options};
pub use dump_error::DumpError;
pub use dump_options::DumpOptions;
pub use error::{Error, ErrorKind, Warning};
pub use load::{
    load, load_all, load_all_documents, load_all_with, load_all_with_options, load_document,
    load_with_options,
};
pub use mark::Mark;
pub use options::LoadOptions;
pub use schema::Schema;
pub use value::{Mapping, TaggedValue, Value};

#[macro_use]
mod macros;

pub mod budget;
mod document;
mod dump;
mod dump_error;
pub mod dump_options;
mod dump_quoting;
mod dump_refs;
mod error;
mod load;
mod mark;
pub mod options;
mod parse_scalars;
pub mod schema;
mod snippet;
mod value;
mod value_serde;
mod wrapping;
mod zmij_format;
