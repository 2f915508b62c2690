//! Fully-qualified type names: `"<type-name>, <module>"`.
//!
//! The split happens at the **first** comma, and exactly one leading space is
//! stripped from the module half. Generic names whose argument list holds
//! qualified names themselves (``List`1[[i32, core]], core``) therefore split
//! inside the brackets. Such names only resolve when registered verbatim in
//! the default registry, which is consulted with the unsplit name first.

/// A type name split into its type and module halves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct QualifiedName<'a> {
    /// Everything before the first comma.
    pub type_name: &'a str,
    /// Everything after the first comma, minus one leading space.
    /// Empty when the name has no comma.
    pub module: &'a str,
}

impl<'a> QualifiedName<'a> {
    /// Split `full` at its first comma.
    ///
    /// ```rust
    /// use graph_unmarshal::types::QualifiedName;
    ///
    /// let q = QualifiedName::parse("System.Int32, mscorlib");
    /// assert_eq!(q.type_name, "System.Int32");
    /// assert_eq!(q.module, "mscorlib");
    /// ```
    pub fn parse(full: &'a str) -> Self {
        match full.split_once(',') {
            Some((type_name, rest)) => Self {
                type_name,
                module: rest.strip_prefix(' ').unwrap_or(rest),
            },
            None => Self {
                type_name: full,
                module: "",
            },
        }
    }
}
