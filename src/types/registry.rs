//! Where types are found by name.
//!
//! [`TypeRegistry`] is the default lookup mechanism: it answers for a
//! fully-qualified name exactly as registered. [`TypeModule`]s are searched
//! afterwards, by module identity, for names the registry does not know.

use std::any::TypeId;
use std::sync::Arc;

use ahash::AHashMap;

use super::{TypeDescriptor, TypeHandle};

/// A unit providing types, searched by its identity string.
pub trait TypeModule: Send + Sync {
    /// Module identity, compared with the module half of a qualified name.
    fn identity(&self) -> &str;

    /// Type by its name within this module (no module qualifier).
    fn get_type(&self, name: &str) -> Option<TypeHandle>;

    /// Type producing objects of the given Rust type, if this module has one.
    fn get_type_by_id(&self, _id: TypeId) -> Option<TypeHandle> {
        None
    }
}

/// Registry of directly known types, keyed by qualified name and by `TypeId`.
///
/// When several descriptors produce the same Rust type, the first one
/// registered is the one fields of that type bind to.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    by_name: AHashMap<String, TypeHandle>,
    by_id: AHashMap<TypeId, TypeHandle>,
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in `core` types.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        super::builtin::register_builtins(&mut registry);
        registry
    }

    /// Add a descriptor, replacing any previous one with the same qualified name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> TypeHandle {
        let handle: TypeHandle = Arc::new(descriptor);
        self.by_id
            .entry(handle.type_id())
            .or_insert_with(|| handle.clone());
        self.by_name
            .insert(handle.qualified_name().to_owned(), handle.clone());
        handle
    }

    /// Look up by the exact qualified name.
    pub fn get(&self, qualified: &str) -> Option<TypeHandle> {
        self.by_name.get(qualified).cloned()
    }

    pub fn get_by_id(&self, id: TypeId) -> Option<TypeHandle> {
        self.by_id.get(&id).cloned()
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

/// A [`TypeModule`] backed by a map.
#[derive(Debug)]
pub struct Module {
    identity: String,
    types: AHashMap<String, TypeHandle>,
    by_id: AHashMap<TypeId, TypeHandle>,
}

impl Module {
    pub fn new(identity: &str) -> Self {
        Self {
            identity: identity.to_owned(),
            types: AHashMap::new(),
            by_id: AHashMap::new(),
        }
    }

    /// Add a descriptor under its unqualified name.
    pub fn register(&mut self, descriptor: TypeDescriptor) -> TypeHandle {
        let handle: TypeHandle = Arc::new(descriptor);
        self.by_id
            .entry(handle.type_id())
            .or_insert_with(|| handle.clone());
        self.types.insert(handle.name().to_owned(), handle.clone());
        handle
    }
}

impl TypeModule for Module {
    fn identity(&self) -> &str {
        &self.identity
    }

    fn get_type(&self, name: &str) -> Option<TypeHandle> {
        self.types.get(name).cloned()
    }

    fn get_type_by_id(&self, id: TypeId) -> Option<TypeHandle> {
        self.by_id.get(&id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registry_looks_up_qualified_names_only() {
        let mut registry = TypeRegistry::empty();
        registry.register(TypeDescriptor::opaque::<u8>("Byte", "sys"));
        assert!(registry.get("Byte, sys").is_some());
        assert!(registry.get("Byte").is_none());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn first_registration_owns_the_type_id() {
        let mut registry = TypeRegistry::empty();
        let first = registry.register(TypeDescriptor::opaque::<u8>("A", "m"));
        registry.register(TypeDescriptor::opaque::<u8>("B", "m"));
        let bound = registry.get_by_id(TypeId::of::<u8>());
        assert!(bound.is_some_and(|b| Arc::ptr_eq(&b, &first)));
    }

    #[test]
    fn module_answers_by_unqualified_name() {
        let mut module = Module::new("plugins");
        module.register(TypeDescriptor::opaque::<u32>("Counter", "plugins"));
        assert_eq!(module.identity(), "plugins");
        assert!(module.get_type("Counter").is_some());
        assert!(module.get_type("Counter, plugins").is_none());
        assert!(module.get_type_by_id(TypeId::of::<u32>()).is_some());
    }

    #[test]
    fn builtins_are_present() {
        let registry = TypeRegistry::new();
        assert!(registry.get("i32, core").is_some());
        assert!(registry.get("String, core").is_some());
        assert!(registry.get_by_id(TypeId::of::<f64>()).is_some());
    }
}
