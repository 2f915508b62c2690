use std::any::TypeId;
use std::sync::Arc;

use tracing::trace;

use super::alias::{AliasProvider, AliasTable};
use super::qualified::QualifiedName;
use super::registry::{TypeModule, TypeRegistry};
use super::TypeHandle;
use crate::error::Error;

/// Decides which type a node deserializes into.
///
/// Lookup order for a node:
///
/// 1. the resolver's own [`AliasTable`], then every added [`AliasProvider`]
///    in the order they were added; the first answer wins;
/// 2. the explicit `class` attribute, looked up with its full text in the
///    [`TypeRegistry`];
/// 3. the modules, in order, whose identity equals the module half of the
///    `class` attribute (see [`QualifiedName`]).
///
/// Resolution is a pure lookup: the same inputs always give the same type.
#[derive(Default)]
pub struct TypeResolver {
    aliases: AliasTable,
    providers: Vec<Arc<dyn AliasProvider>>,
    registry: TypeRegistry,
    modules: Vec<Arc<dyn TypeModule>>,
}

impl TypeResolver {
    pub fn new(registry: TypeRegistry, aliases: AliasTable) -> Self {
        Self {
            aliases,
            providers: Vec::new(),
            registry,
            modules: Vec::new(),
        }
    }

    pub fn aliases(&self) -> &AliasTable {
        &self.aliases
    }

    pub fn aliases_mut(&mut self) -> &mut AliasTable {
        &mut self.aliases
    }

    /// Append a provider after the ones already present.
    pub fn add_alias_provider(&mut self, provider: Arc<dyn AliasProvider>) {
        self.providers.push(provider);
    }

    pub fn registry(&self) -> &TypeRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut TypeRegistry {
        &mut self.registry
    }

    /// Append a module to the end of the search order.
    pub fn add_module(&mut self, module: Arc<dyn TypeModule>) {
        self.modules.push(module);
    }

    /// First alias any provider maps `node_name` to.
    pub fn resolve_alias(&self, node_name: &str) -> Option<TypeHandle> {
        self.aliases.try_resolve(node_name).or_else(|| {
            self.providers
                .iter()
                .find_map(|provider| provider.try_resolve(node_name))
        })
    }

    /// Type of a node with tag `node_name` and an optional `class` attribute.
    pub fn resolve(&self, node_name: &str, explicit: Option<&str>) -> Result<TypeHandle, Error> {
        if let Some(ty) = self.resolve_alias(node_name) {
            trace!(node = node_name, ty = ty.qualified_name(), "resolved by alias");
            return Ok(ty);
        }
        match explicit {
            Some(full) if !full.is_empty() => self.resolve_qualified(full),
            _ => Err(Error::missing_type_info(node_name)),
        }
    }

    /// Type of a field element: its tag is a field name, so aliases do not
    /// apply. The `class` attribute overrides the declared field type.
    pub fn resolve_declared(
        &self,
        explicit: Option<&str>,
        declared: &TypeHandle,
    ) -> Result<TypeHandle, Error> {
        match explicit {
            Some(full) if !full.is_empty() => self.resolve_qualified(full),
            _ => Ok(Arc::clone(declared)),
        }
    }

    /// Look up a fully-qualified name: registry first, then modules.
    pub fn resolve_qualified(&self, full: &str) -> Result<TypeHandle, Error> {
        if let Some(ty) = self.registry.get(full) {
            trace!(ty = full, "resolved by registry");
            return Ok(ty);
        }
        let qualified = QualifiedName::parse(full);
        for module in &self.modules {
            if module.identity() != qualified.module {
                continue;
            }
            if let Some(ty) = module.get_type(qualified.type_name) {
                trace!(ty = full, module = module.identity(), "resolved by module");
                return Ok(ty);
            }
        }
        Err(Error::type_resolution(full))
    }

    /// Descriptor producing objects of the given Rust type.
    pub fn resolve_type_id(&self, id: TypeId) -> Option<TypeHandle> {
        self.registry.get_by_id(id).or_else(|| {
            self.modules
                .iter()
                .find_map(|module| module.get_type_by_id(id))
        })
    }
}
