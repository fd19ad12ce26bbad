use std::fmt;

/// Error type returned by the dumper.
///
/// - `Unsupported` names a value no type of the active schema can represent.
/// - `InvalidOptions` rejects option combinations that would produce invalid YAML, and
///   per-tag styles the tag's type does not offer.
/// - `RecursionLimit` is raised when nesting exceeds `DumpOptions::max_depth`. With
///   `no_refs` a cyclic document always ends here.
/// - `Format` wraps a `std::fmt::Error` from the output buffer.
#[derive(Debug)]
pub enum DumpError {
    /// No type of the schema represents this value.
    Unsupported { type_name: String },
    /// Options used would produce invalid YAML (0 indentation, etc)
    InvalidOptions(String),
    /// Nesting deeper than the configured limit.
    RecursionLimit { depth: usize },
    /// Wrapper for formatting errors.
    Format { error: fmt::Error },
}

impl From<fmt::Error> for DumpError {
    fn from(error: fmt::Error) -> Self {
        DumpError::Format { error }
    }
}

impl fmt::Display for DumpError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DumpError::Unsupported { type_name } => {
                write!(f, "unacceptable kind of an object to dump {type_name}")
            }
            DumpError::InvalidOptions(msg) => write!(f, "invalid dump options: {msg}"),
            DumpError::RecursionLimit { depth } => write!(
                f,
                "nesting depth {depth} exceeds the limit; the value is probably cyclic"
            ),
            DumpError::Format { error } => write!(f, "formatting error: {error}"),
        }
    }
}

impl std::error::Error for DumpError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DumpError::Format { error } => Some(error),
            _ => None,
        }
    }
}
