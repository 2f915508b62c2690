//! Defines error and its location
use std::fmt;

use crate::budget::BudgetBreach;

/// Row/column location within the source XML document (1-indexed).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Location {
    /// 1-indexed row number in the input.
    pub(crate) line: u32,
    /// 1-indexed column number in the input (in characters).
    pub(crate) column: u32,
    /// Byte offset of the start of the element. Only meaningful when `line != 0`.
    pub(crate) offset: usize,
}

impl Location {
    /// Sentinel value meaning "location unknown".
    ///
    /// Used when a precise position is not yet available at error creation time.
    pub const UNKNOWN: Self = Self {
        line: 0,
        column: 0,
        offset: 0,
    };

    /// Create a new location record.
    ///
    /// Lines and columns beyond `u32::MAX` saturate.
    pub fn new(line: usize, column: usize, offset: usize) -> Self {
        Self {
            line: u32::try_from(line).unwrap_or(u32::MAX),
            column: u32::try_from(column).unwrap_or(u32::MAX),
            offset,
        }
    }

    /// 1-indexed line of the element.
    pub fn line(&self) -> u64 {
        self.line as u64
    }

    /// 1-indexed column of the element.
    pub fn column(&self) -> u64 {
        self.column as u64
    }

    /// Byte offset of the element start within the source text.
    pub fn offset(&self) -> usize {
        self.offset
    }

    pub(crate) fn is_known(&self) -> bool {
        self.line != 0
    }
}

/// Everything that can abort an unmarshalling pass.
///
/// Nothing is caught or retried inside the crate: the first error ends the
/// pass and no partial object graph is returned.
#[derive(Debug)]
pub enum Error {
    /// The same document position was staked twice.
    DuplicateReference { path: String, location: Location },
    /// A `references` attribute names a position no object was staked at.
    UnresolvedReference { reference: String, location: Location },
    /// No alias matched the node and it carries no `class` attribute.
    MissingTypeInfo { node: String, location: Location },
    /// The `class` attribute names a type unknown to the registry and to every module.
    TypeResolution { type_name: String, location: Location },
    /// The type has neither a converter nor a structural description.
    NotConstructible { type_name: String, location: Location },
    /// A structure received an attribute or child element it has no field for.
    UnknownField {
        type_name: String,
        field: String,
        location: Location,
    },
    /// A field received a value of another Rust type than it stores.
    FieldType {
        type_name: String,
        field: String,
        location: Location,
    },
    /// Scalar text could not be parsed into the requested type.
    InvalidValue {
        type_name: String,
        msg: String,
        location: Location,
    },
    /// Free-form error, mostly raised by converters.
    Message { msg: String, location: Location },
    /// A [`crate::Budget`] limit was exceeded.
    Budget {
        breach: BudgetBreach,
        location: Location,
    },
    /// The input is not a well-formed XML document.
    Xml { msg: String, location: Location },
    /// Unexpected I/O error. This may happen only when reading from a `Read`.
    IOError { cause: std::io::Error },
}

impl Error {
    /// Construct a `Message` error with no known location.
    pub fn msg<S: Into<String>>(s: S) -> Self {
        Error::Message {
            msg: s.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn duplicate_reference(path: &str) -> Self {
        Error::DuplicateReference {
            path: path.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unresolved_reference(reference: &str) -> Self {
        Error::UnresolvedReference {
            reference: reference.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn missing_type_info(node: &str) -> Self {
        Error::MissingTypeInfo {
            node: node.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn type_resolution(type_name: &str) -> Self {
        Error::TypeResolution {
            type_name: type_name.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn not_constructible(type_name: &str) -> Self {
        Error::NotConstructible {
            type_name: type_name.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn unknown_field(type_name: &str, field: &str) -> Self {
        Error::UnknownField {
            type_name: type_name.to_owned(),
            field: field.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn field_type(type_name: &str, field: &str) -> Self {
        Error::FieldType {
            type_name: type_name.to_owned(),
            field: field.to_owned(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn invalid_value<S: Into<String>>(type_name: &str, msg: S) -> Self {
        Error::InvalidValue {
            type_name: type_name.to_owned(),
            msg: msg.into(),
            location: Location::UNKNOWN,
        }
    }

    pub(crate) fn xml<S: Into<String>>(msg: S) -> Self {
        Error::Xml {
            msg: msg.into(),
            location: Location::UNKNOWN,
        }
    }

    /// Attach/override a concrete location to this error and return it.
    pub fn with_location(mut self, set_location: Location) -> Self {
        match &mut self {
            Error::DuplicateReference { location, .. }
            | Error::UnresolvedReference { location, .. }
            | Error::MissingTypeInfo { location, .. }
            | Error::TypeResolution { location, .. }
            | Error::NotConstructible { location, .. }
            | Error::UnknownField { location, .. }
            | Error::FieldType { location, .. }
            | Error::InvalidValue { location, .. }
            | Error::Message { location, .. }
            | Error::Budget { location, .. }
            | Error::Xml { location, .. } => {
                *location = set_location;
            }
            Error::IOError { .. } => {} // this error does not support location
        }
        self
    }

    /// Attach `fallback` only if the error has no location yet.
    ///
    /// Errors raised deep in the recursion already point at the innermost
    /// node; enclosing frames must not overwrite that.
    pub(crate) fn or_location(self, fallback: Location) -> Self {
        if self.location().is_some() || !fallback.is_known() {
            self
        } else {
            self.with_location(fallback)
        }
    }

    /// If the error has a known location, return it.
    pub fn location(&self) -> Option<Location> {
        match self {
            Error::DuplicateReference { location, .. }
            | Error::UnresolvedReference { location, .. }
            | Error::MissingTypeInfo { location, .. }
            | Error::TypeResolution { location, .. }
            | Error::NotConstructible { location, .. }
            | Error::UnknownField { location, .. }
            | Error::FieldType { location, .. }
            | Error::InvalidValue { location, .. }
            | Error::Message { location, .. }
            | Error::Budget { location, .. }
            | Error::Xml { location, .. } => {
                if location.is_known() {
                    Some(*location)
                } else {
                    None
                }
            }
            Error::IOError { .. } => None,
        }
    }
}

impl Error {
    /// The error text without the location suffix `Display` appends.
    pub fn message(&self) -> String {
        match self {
            Error::DuplicateReference { path, .. } => {
                format!("an object is already registered at position `{path}`")
            }
            Error::UnresolvedReference { reference, .. } => {
                format!("reference `{reference}` does not point to any deserialized object")
            }
            Error::MissingTypeInfo { node, .. } => {
                format!("node `{node}` has no alias and no `class` attribute")
            }
            Error::TypeResolution { type_name, .. } => {
                format!("couldn't resolve type `{type_name}`")
            }
            Error::NotConstructible { type_name, .. } => {
                format!("type `{type_name}` has no converter and no structure to build")
            }
            Error::UnknownField {
                type_name, field, ..
            } => format!("type `{type_name}` has no field `{field}`"),
            Error::FieldType {
                type_name, field, ..
            } => format!("value of wrong type for field `{field}` of `{type_name}`"),
            Error::InvalidValue { type_name, msg, .. } => format!("invalid {type_name}: {msg}"),
            Error::Message { msg, .. } => msg.clone(),
            Error::Budget { breach, .. } => format!("budget breached: {breach:?}"),
            Error::Xml { msg, .. } => format!("malformed XML: {msg}"),
            Error::IOError { cause } => format!("IO error: {cause}"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.message();
        match self.location() {
            Some(location) => write!(
                f,
                "{msg} at line {}, column {}",
                location.line, location.column
            ),
            None => f.write_str(&msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IOError { cause } => Some(cause),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(cause: std::io::Error) -> Self {
        Error::IOError { cause }
    }
}

/// Convert a budget breach into a user-facing error.
pub(crate) fn budget_error(breach: BudgetBreach) -> Error {
    Error::Budget {
        breach,
        location: Location::UNKNOWN,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_appends_known_location() {
        let err = Error::unresolved_reference("/a/b").with_location(Location::new(3, 7, 42));
        assert_eq!(
            err.to_string(),
            "reference `/a/b` does not point to any deserialized object at line 3, column 7"
        );
        assert_eq!(err.location().map(|l| l.offset()), Some(42));
    }

    #[test]
    fn unknown_location_is_not_reported() {
        let err = Error::missing_type_info("thing");
        assert!(err.location().is_none());
        assert_eq!(
            err.to_string(),
            "node `thing` has no alias and no `class` attribute"
        );
    }

    #[test]
    fn oversized_positions_saturate() {
        let location = Location::new(usize::MAX, usize::MAX, 7);
        assert_eq!(location.line(), u64::from(u32::MAX));
        assert_eq!(location.column(), u64::from(u32::MAX));
        assert_eq!(location.offset(), 7);
    }

    #[test]
    fn or_location_keeps_the_innermost_location() {
        let inner = Location::new(5, 2, 80);
        let outer = Location::new(1, 1, 0);
        let err = Error::msg("boom").with_location(inner).or_location(outer);
        assert_eq!(err.location(), Some(inner));

        let err = Error::msg("boom").or_location(outer);
        assert_eq!(err.location(), Some(outer));
    }
}
