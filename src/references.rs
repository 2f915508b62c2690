//! Objects already deserialized in the current pass, by document position.
//!
//! A converter stakes the object it builds at the position of its node; any
//! later node carrying a `references` attribute with that position resolves
//! to the very same `Rc`. Staking before reading children is what lets a
//! child point back at its parent.

use std::rc::Rc;

use ahash::AHashMap;

use crate::error::Error;
use crate::types::Object;

/// Position → object map of one pass.
///
/// Entries are never replaced: staking a position twice is an error even if
/// the object is the same.
#[derive(Default)]
pub struct ReferenceTable {
    objects: AHashMap<String, Object>,
}

impl ReferenceTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `object` at `position`.
    pub fn register(&mut self, position: &str, object: Object) -> Result<(), Error> {
        if self.objects.contains_key(position) {
            return Err(Error::duplicate_reference(position));
        }
        self.objects.insert(position.to_owned(), object);
        Ok(())
    }

    /// Resolve the value of a `references` attribute.
    ///
    /// An absent or empty attribute is not a reference (`Ok(None)`). A
    /// reference to a position nothing was staked at is an error.
    pub fn resolve(&self, reference: Option<&str>) -> Result<Option<Object>, Error> {
        match reference {
            None | Some("") => Ok(None),
            Some(position) => self
                .objects
                .get(position)
                .map(|object| Some(Rc::clone(object)))
                .ok_or_else(|| Error::unresolved_reference(position)),
        }
    }

    /// Object staked at `position`, if any.
    pub fn get(&self, position: &str) -> Option<&Object> {
        self.objects.get(position)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_then_resolve_returns_the_same_object() {
        let mut table = ReferenceTable::new();
        let object: Object = Rc::new(String::from("shared"));
        assert!(table.register("/root/a", Rc::clone(&object)).is_ok());
        let found = table.resolve(Some("/root/a")).ok().flatten();
        assert!(found.is_some_and(|f| Rc::ptr_eq(&f, &object)));
    }

    #[test]
    fn duplicate_position_is_refused_even_for_the_same_object() {
        let mut table = ReferenceTable::new();
        let object: Object = Rc::new(1_u8);
        assert!(table.register("/x", Rc::clone(&object)).is_ok());
        assert!(matches!(
            table.register("/x", Rc::clone(&object)),
            Err(Error::DuplicateReference { path, .. }) if path == "/x"
        ));
        // the first registration is untouched
        assert!(table.get("/x").is_some_and(|o| Rc::ptr_eq(o, &object)));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn duplicate_position_is_refused_for_another_object() {
        let mut table = ReferenceTable::new();
        let first: Object = Rc::new(1_u8);
        let second: Object = Rc::new(2_u8);
        assert!(table.register("/x", Rc::clone(&first)).is_ok());
        assert!(matches!(
            table.register("/x", second),
            Err(Error::DuplicateReference { path, .. }) if path == "/x"
        ));
        assert!(table.get("/x").is_some_and(|o| Rc::ptr_eq(o, &first)));
    }

    #[test]
    fn absent_or_empty_reference_is_not_a_reference() {
        let table = ReferenceTable::new();
        assert!(matches!(table.resolve(None), Ok(None)));
        assert!(matches!(table.resolve(Some("")), Ok(None)));
    }

    #[test]
    fn dangling_reference_fails() {
        let table = ReferenceTable::new();
        assert!(matches!(
            table.resolve(Some("/nowhere")),
            Err(Error::UnresolvedReference { reference, .. }) if reference == "/nowhere"
        ));
    }
}
