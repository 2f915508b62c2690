//! Document navigation.
//!
//! The unmarshalling core never touches XML directly: it sees the document
//! through [`DocumentReader`], a cursor over a tree of named nodes with
//! attributes and text. [`XmlReader`] is the implementation backed by
//! `quick-xml`; other tree formats can be plugged in by implementing the
//! trait.

use crate::error::Location;

mod input;
mod xml;

pub(crate) use input::decode_to_string;
pub use xml::XmlReader;

/// Reserved attribute names recognized by the core.
pub mod attributes {
    /// `null="true"` makes a node deserialize to `None`.
    pub const NULL: &str = "null";
    /// Holds the position of a previously deserialized node.
    pub const REFERENCES: &str = "references";
    /// Holds a fully-qualified type name (`"Type, Module"`).
    pub const CLASS: &str = "class";
    /// Position key of a node in [`crate::ReferenceMode::Id`].
    pub const ID: &str = "id";

    /// Attributes that never map to structure fields.
    pub(crate) fn is_reserved(name: &str, id_mode: bool) -> bool {
        matches!(name, NULL | REFERENCES | CLASS) || (id_mode && name == ID)
    }
}

/// Cursor over a tree-shaped document.
///
/// The cursor always points at one node. `move_down` enters the next unread
/// child of that node, `move_up` returns to the parent. Converters must leave
/// the cursor on the node they were called on.
pub trait DocumentReader {
    /// Tag name of the current node.
    fn node_name(&self) -> &str;

    /// Value of the named attribute on the current node.
    fn attribute(&self, name: &str) -> Option<&str>;

    /// Names of all attributes of the current node, in document order.
    fn attribute_names(&self) -> Vec<&str>;

    /// Stable position of the current node, unique within one pass.
    ///
    /// This is the key objects are staked at in the reference table.
    fn current_path(&self) -> &str;

    /// Text content of the current node.
    fn value(&self) -> &str;

    /// Whether the current node has children that were not entered yet.
    fn has_more_children(&self) -> bool;

    /// Enter the next unread child. Returns `false` when there is none.
    fn move_down(&mut self) -> bool;

    /// Return to the parent node. Does nothing on the root.
    fn move_up(&mut self);

    /// Source location of the current node, if the reader tracks it.
    fn location(&self) -> Location {
        Location::UNKNOWN
    }
}
