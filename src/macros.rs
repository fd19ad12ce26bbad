//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! These macros keep call sites ergonomic while allowing the option structs to gain fields
//! without breaking callers.

/// Construct [`crate::LoadOptions`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let options = yaml_codec::load_options! {
///     json: true,
///     with_snippet: false,
/// };
/// assert!(!options.with_snippet);
/// ```
#[macro_export]
macro_rules! load_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::LoadOptions::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}

/// Construct [`crate::DumpOptions`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let opts = yaml_codec::dump_options! {
///     indent: 4,
///     force_quotes: true,
/// };
/// assert_eq!(opts.indent, 4);
/// ```
#[macro_export]
macro_rules! dump_options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::DumpOptions::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}
