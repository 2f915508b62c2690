//! Public macros for constructing option structs without relying on struct literal syntax.
//!
//! These macros keep call sites short while allowing the option structs to
//! grow new fields without breaking callers.

/// Construct [`crate::Options`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// use graph_unmarshal::options::UnknownFieldPolicy;
///
/// let options = graph_unmarshal::options! {
///     unknown_fields: UnknownFieldPolicy::Ignore,
/// };
/// ```
#[macro_export]
macro_rules! options {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut opt = $crate::Options::default();
        $(
            {
                opt.$field = $value;
            }
        )*
        opt
    }};
}

/// Construct [`crate::Budget`] from `Default` and a list of field assignments.
///
/// Example:
///
/// ```rust
/// let budget = graph_unmarshal::budget! {
///     max_depth: 32,
///     max_references: 1_000,
/// };
/// ```
#[macro_export]
macro_rules! budget {
    ( $( $field:ident : $value:expr ),* $(,)? ) => {{
        let mut budget = $crate::Budget::default();
        $(
            {
                budget.$field = $value;
            }
        )*
        budget
    }};
}
