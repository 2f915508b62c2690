use std::sync::Arc;

use ahash::AHashMap;

use super::TypeHandle;

/// Maps tag names to types.
///
/// Providers are consulted in order and the first one answering wins.
pub trait AliasProvider: Send + Sync {
    fn try_resolve(&self, node_name: &str) -> Option<TypeHandle>;
}

/// Map-backed [`AliasProvider`].
#[derive(Debug, Default, Clone)]
pub struct AliasTable {
    aliases: AHashMap<String, TypeHandle>,
}

impl AliasTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `alias` to `ty`, returning the type it previously mapped to.
    pub fn insert(&mut self, alias: &str, ty: &TypeHandle) -> Option<TypeHandle> {
        self.aliases.insert(alias.to_owned(), Arc::clone(ty))
    }

    pub fn remove(&mut self, alias: &str) -> Option<TypeHandle> {
        self.aliases.remove(alias)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }
}

impl AliasProvider for AliasTable {
    fn try_resolve(&self, node_name: &str) -> Option<TypeHandle> {
        self.aliases.get(node_name).cloned()
    }
}
