//! Pluggable per-type reconstruction.
//!
//! A [`Converter`] claims node names, types, or both. For every node the
//! context asks the [`ConverterLookup`] first by node name, then by resolved
//! type; the first converter in registration order that claims the key is the
//! one used. When no converter claims a type, the node is built by the
//! [`crate::StructuralUnmarshaller`].

use std::sync::Arc;

use crate::context::UnmarshallingContext;
use crate::error::Error;
use crate::types::{Object, TypeDescriptor, TypeHandle};

mod builtin;

pub use builtin::{ListConverter, ScalarConverter};

/// Reconstructs values of the node names or types it claims.
///
/// A converter reads the current node through [`UnmarshallingContext::reader`],
/// builds its object and stakes it with [`UnmarshallingContext::stack_object`].
/// Objects that may be referenced by their own children must be staked before
/// the children are converted. Nested values are converted by calling back
/// into the context ([`UnmarshallingContext::convert_child`] and friends).
///
/// The cursor must be back on the converter's node when it returns.
pub trait Converter: Send + Sync {
    /// Whether this converter handles nodes with tag `node_name`.
    fn handles_name(&self, _node_name: &str) -> bool {
        false
    }

    /// Whether this converter handles values of type `ty`.
    fn handles_type(&self, _ty: &TypeDescriptor) -> bool {
        false
    }

    /// Build the value of the current node.
    ///
    /// `target` is the resolved type when the converter was selected by type,
    /// and `None` when it was selected by node name.
    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        target: Option<&TypeHandle>,
    ) -> Result<Object, Error>;
}

/// Ordered set of converters. The first registered claimant of a key wins.
#[derive(Default, Clone)]
pub struct ConverterLookup {
    converters: Vec<Arc<dyn Converter>>,
}

impl ConverterLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `converter` after the ones already registered.
    pub fn register(&mut self, converter: Arc<dyn Converter>) {
        self.converters.push(converter);
    }

    pub fn by_name(&self, node_name: &str) -> Option<&Arc<dyn Converter>> {
        self.converters.iter().find(|c| c.handles_name(node_name))
    }

    pub fn by_type(&self, ty: &TypeDescriptor) -> Option<&Arc<dyn Converter>> {
        self.converters.iter().find(|c| c.handles_type(ty))
    }

    pub fn len(&self) -> usize {
        self.converters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.converters.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;

    struct Claims {
        name: &'static str,
        tag: u8,
    }

    impl Converter for Claims {
        fn handles_name(&self, node_name: &str) -> bool {
            node_name == self.name
        }

        fn handles_type(&self, ty: &TypeDescriptor) -> bool {
            ty.is::<i32>()
        }

        fn from_document(
            &self,
            _context: &mut UnmarshallingContext<'_>,
            _target: Option<&TypeHandle>,
        ) -> Result<Object, Error> {
            Ok(Rc::new(self.tag))
        }
    }

    fn tag_of(found: Option<&Arc<dyn Converter>>) -> Option<usize> {
        // identify converters by their address within the registration order
        found.map(|c| Arc::as_ptr(c) as *const () as usize)
    }

    #[test]
    fn first_registered_claimant_wins() {
        let first: Arc<dyn Converter> = Arc::new(Claims { name: "a", tag: 1 });
        let second: Arc<dyn Converter> = Arc::new(Claims { name: "a", tag: 2 });
        let mut lookup = ConverterLookup::new();
        lookup.register(Arc::clone(&first));
        lookup.register(Arc::clone(&second));

        let int = TypeDescriptor::opaque::<i32>("i32", "core");
        assert_eq!(tag_of(lookup.by_name("a")), tag_of(Some(&first)));
        assert_eq!(tag_of(lookup.by_type(&int)), tag_of(Some(&first)));
        assert_eq!(lookup.len(), 2);
    }

    #[test]
    fn unclaimed_keys_find_nothing() {
        let mut lookup = ConverterLookup::new();
        lookup.register(Arc::new(Claims { name: "a", tag: 1 }));
        assert!(lookup.by_name("b").is_none());
        assert!(lookup.by_type(&TypeDescriptor::opaque::<u8>("u8", "core")).is_none());
    }
}
