//! Configuration holder and entry points.

use std::any::{Any, type_name};
use std::io::Read;
use std::rc::Rc;
use std::sync::Arc;

use tracing::debug;

use crate::context::UnmarshallingContext;
use crate::convert::{Converter, ConverterLookup, ListConverter, ScalarConverter};
use crate::error::Error;
use crate::options::Options;
use crate::reader::{DocumentReader, XmlReader, decode_to_string};
use crate::types::builtin::default_aliases;
use crate::types::{
    AliasProvider, AliasTable, Object, TypeDescriptor, TypeHandle, TypeModule, TypeRegistry,
    TypeResolver,
};

/// Everything a pass needs besides the document: types, aliases, modules,
/// converters and options.
///
/// A `Mapper` is configured once and then only read. It is `Send + Sync`, so
/// it can be shared between threads; every call to [`Mapper::unmarshal`] (and
/// the `from_*` helpers) runs with its own [`UnmarshallingContext`] and its
/// own reference table. The objects produced are `Rc`s and stay on the
/// calling thread.
///
/// Example: a structure with an alias and no converter of its own.
///
/// ```rust
/// use graph_unmarshal::{Mapper, TypeDescriptor};
///
/// #[derive(Default, Debug, PartialEq)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let mut mapper = Mapper::new();
/// let point = mapper.register(
///     TypeDescriptor::structure::<Point>("Point", "geometry")
///         .field("x", |p: &mut Point, x: i32| p.x = x)
///         .field("y", |p: &mut Point, y: i32| p.y = y)
///         .build(),
/// );
/// mapper.alias("Point", &point);
///
/// let value = mapper.from_str_as::<Point>(r#"<Point x="1" y="2"/>"#).unwrap();
/// assert_eq!(value.as_deref(), Some(&Point { x: 1, y: 2 }));
/// ```
pub struct Mapper {
    resolver: TypeResolver,
    converters: ConverterLookup,
    options: Options,
}

impl Mapper {
    /// A mapper knowing the built-in `core` types, their default aliases and
    /// the built-in scalar and list converters.
    pub fn new() -> Self {
        Self::with_options(Options::default())
    }

    /// [`Mapper::new`] with the given options.
    pub fn with_options(options: Options) -> Self {
        let registry = TypeRegistry::new();
        let aliases = default_aliases(&registry);
        let mut converters = ConverterLookup::new();
        converters.register(Arc::new(ScalarConverter));
        converters.register(Arc::new(ListConverter));
        Self {
            resolver: TypeResolver::new(registry, aliases),
            converters,
            options,
        }
    }

    /// A mapper with no types, no aliases and no converters.
    pub fn empty(options: Options) -> Self {
        Self {
            resolver: TypeResolver::new(TypeRegistry::empty(), AliasTable::new()),
            converters: ConverterLookup::new(),
            options,
        }
    }

    /// Add a type to the default registry.
    ///
    /// If another descriptor already produces the same Rust type, that one
    /// stays the declared type of fields holding it.
    pub fn register(&mut self, ty: TypeDescriptor) -> TypeHandle {
        self.resolver.registry_mut().register(ty)
    }

    /// Make nodes tagged `alias` resolve to `ty`. Returns the type the alias
    /// pointed to before, if any.
    pub fn alias(&mut self, alias: &str, ty: &TypeHandle) -> Option<TypeHandle> {
        self.resolver.aliases_mut().insert(alias, ty)
    }

    /// Consult `provider` after the mapper's own aliases and after every
    /// provider added earlier.
    pub fn add_alias_provider(&mut self, provider: Arc<dyn AliasProvider>) {
        self.resolver.add_alias_provider(provider);
    }

    /// Search `module` for fully-qualified names the registry does not know,
    /// after every module added earlier.
    pub fn add_module(&mut self, module: Arc<dyn TypeModule>) {
        self.resolver.add_module(module);
    }

    /// Register a converter after the ones already present. For a given node
    /// name or type, the first registered converter claiming it is used, so a
    /// converter added here never replaces a built-in one for the same key.
    pub fn register_converter(&mut self, converter: Arc<dyn Converter>) {
        self.converters.register(converter);
    }

    pub fn resolver(&self) -> &TypeResolver {
        &self.resolver
    }

    pub fn converters(&self) -> &ConverterLookup {
        &self.converters
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut Options {
        &mut self.options
    }

    /// Unmarshal the root node of an XML document.
    ///
    /// `Ok(None)` when the root carries the null marker.
    pub fn from_str(&self, input: &str) -> Result<Option<Object>, Error> {
        let mut reader = XmlReader::from_str(input, self.options.reference_mode)?;
        self.unmarshal(&mut reader)
    }

    /// Unmarshal an XML document given as bytes in UTF-8, or in UTF-16 with a
    /// byte order mark.
    pub fn from_slice(&self, bytes: &[u8]) -> Result<Option<Object>, Error> {
        self.from_reader(bytes)
    }

    /// Read `reader` to the end, then unmarshal it as [`Mapper::from_slice`]
    /// does.
    pub fn from_reader<R: Read>(&self, reader: R) -> Result<Option<Object>, Error> {
        let text = decode_to_string(reader)?;
        self.from_str(&text)
    }

    /// [`Mapper::from_str`], downcasting the root object to `T`.
    pub fn from_str_as<T: Any>(&self, input: &str) -> Result<Option<Rc<T>>, Error> {
        match self.from_str(input)? {
            None => Ok(None),
            Some(object) => object.downcast::<T>().map(Some).map_err(|_| {
                Error::msg(format!("document root is not a `{}`", type_name::<T>()))
            }),
        }
    }

    /// Run one pass over `reader`, starting at its current node.
    ///
    /// All or nothing: on error no part of the graph is returned.
    pub fn unmarshal(&self, reader: &mut dyn DocumentReader) -> Result<Option<Object>, Error> {
        debug!(root = reader.node_name(), "unmarshalling");
        let mut context =
            UnmarshallingContext::new(reader, &self.resolver, &self.converters, &self.options);
        let result = context.convert_next();
        let report = context.budget_report();
        debug!(
            nodes = report.nodes,
            references = report.references,
            max_depth = report.max_depth,
            ok = result.is_ok(),
            "unmarshalling finished"
        );
        result
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn mapper_can_be_shared_between_threads() {
        assert_send_sync::<Mapper>();
    }

    #[test]
    fn empty_mapper_knows_nothing() {
        let mapper = Mapper::empty(Options::default());
        assert!(mapper.converters().is_empty());
        assert!(matches!(
            mapper.from_str("<int>1</int>"),
            Err(Error::MissingTypeInfo { .. })
        ));
    }

    #[test]
    fn root_of_another_type_is_reported() {
        let mapper = Mapper::new();
        assert!(matches!(
            mapper.from_str_as::<String>("<int>1</int>"),
            Err(Error::Message { .. })
        ));
        let ok = mapper.from_str_as::<i32>("<int>1</int>");
        assert_eq!(ok.ok().flatten().as_deref(), Some(&1));
    }
}
