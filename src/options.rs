use crate::budget::Budget;
use serde::{Deserialize, Serialize};

/// How the document reader derives the position key of a node.
///
/// The position is what objects are staked at, and therefore what a
/// `references` attribute has to name.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReferenceMode {
    /// Absolute element path: `/list/item`, `/list/item[2]`, ...
    XPath,
    /// The node's `id` attribute; nodes without one fall back to their path.
    ///
    /// Ids must not start with `/`, so they never collide with a path.
    Id,
}

/// What the structural unmarshaller does with attributes and child elements
/// that do not correspond to any field.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnknownFieldPolicy {
    /// Fail the pass.
    Error,
    /// Skip the attribute or the whole child subtree.
    Ignore,
}

/// Unmarshalling configuration options.
///
/// Example: accept unknown fields and address references by `id`.
///
/// ```rust
/// use graph_unmarshal::options::{ReferenceMode, UnknownFieldPolicy};
///
/// let options = graph_unmarshal::options! {
///     reference_mode: ReferenceMode::Id,
///     unknown_fields: UnknownFieldPolicy::Ignore,
/// };
/// assert_eq!(options.reference_mode, ReferenceMode::Id);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Options {
    /// Optional budget enforced during each pass.
    pub budget: Option<Budget>,
    /// How positions (and thus reference targets) are derived.
    pub reference_mode: ReferenceMode,
    /// Policy for attributes and child elements with no matching field.
    pub unknown_fields: UnknownFieldPolicy,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            budget: Some(Budget::default()),
            reference_mode: ReferenceMode::XPath,
            unknown_fields: UnknownFieldPolicy::Error,
        }
    }
}
