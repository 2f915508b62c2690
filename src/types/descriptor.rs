//! Type descriptors: what the engine knows about a type it may instantiate.
//!
//! Rust has no runtime reflection, so every type the engine can build is
//! described once, at configuration time, by a [`TypeDescriptor`]. The
//! descriptor records the names the type is known by, the [`TypeId`] of the
//! object it produces, and how to produce it:
//!
//! - scalars are parsed from text;
//! - structures are default-constructed and then populated field by field
//!   through typed setters;
//! - opaque types can only be produced by a [`crate::Converter`].

use std::any::{Any, TypeId, type_name};
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::Rc;
use std::sync::Arc;

use super::Object;

type ScalarParser = Arc<dyn Fn(&str) -> Result<Object, String> + Send + Sync>;

/// Stores a value into a field. Returns `false` when the value has another
/// Rust type than the field.
type FieldSetter = Arc<dyn Fn(&mut dyn Any, Object) -> bool + Send + Sync>;

/// How a structure instance becomes an [`Object`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Construction {
    /// The object is the finished `T`, registered as a reference target once
    /// all its fields are read. Children cannot refer back to it.
    Owned,
    /// The object is an `Rc<RefCell<T>>`, registered before any field is
    /// read, so children may refer back to it (cycles).
    Shared,
}

/// One settable field of a structure.
pub struct FieldDescriptor {
    name: String,
    value_type: TypeId,
    value_type_name: &'static str,
    /// The setter clones the object out of its `Rc` when it is shared.
    clones_value: bool,
    setter: FieldSetter,
}

impl FieldDescriptor {
    /// Field name as it appears in documents (attribute or child tag).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// `TypeId` of the objects this field accepts.
    pub fn value_type(&self) -> TypeId {
        self.value_type
    }

    /// Rust name of the accepted type, for diagnostics.
    pub fn value_type_name(&self) -> &'static str {
        self.value_type_name
    }

    /// Whether the field accepts objects of any type. The type of such a
    /// field's value must come from the document (`class` attribute).
    pub fn is_untyped(&self) -> bool {
        self.value_type == TypeId::of::<dyn Any>()
    }
}

impl fmt::Debug for FieldDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type_name)
            .finish()
    }
}

/// A structure under construction.
pub(crate) trait Instance {
    /// The object to register before fields are read, for shared structures.
    fn early_object(&self) -> Option<Object>;

    fn set(&mut self, field: &FieldDescriptor, value: Object) -> bool;

    fn finish(self: Box<Self>) -> Object;
}

struct OwnedInstance<T>(T);

impl<T: Any> Instance for OwnedInstance<T> {
    fn early_object(&self) -> Option<Object> {
        None
    }

    fn set(&mut self, field: &FieldDescriptor, value: Object) -> bool {
        (field.setter)(&mut self.0 as &mut dyn Any, value)
    }

    fn finish(self: Box<Self>) -> Object {
        Rc::new(self.0)
    }
}

struct SharedInstance<T>(Rc<RefCell<T>>);

impl<T: Any> Instance for SharedInstance<T> {
    fn early_object(&self) -> Option<Object> {
        Some(self.0.clone() as Object)
    }

    fn set(&mut self, field: &FieldDescriptor, value: Object) -> bool {
        // Cloning the instance into its own field would borrow the cell twice.
        if field.clones_value && std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&value)) {
            return false;
        }
        let Ok(mut target) = self.0.try_borrow_mut() else {
            return false;
        };
        (field.setter)(&mut *target as &mut dyn Any, value)
    }

    fn finish(self: Box<Self>) -> Object {
        self.0
    }
}

fn owned_instance<T: Default + Any>() -> Box<dyn Instance> {
    Box::new(OwnedInstance(T::default()))
}

fn shared_instance<T: Default + Any>() -> Box<dyn Instance> {
    Box::new(SharedInstance(Rc::new(RefCell::new(T::default()))))
}

pub(crate) struct StructureInfo {
    construction: Construction,
    instantiate: fn() -> Box<dyn Instance>,
    fields: Vec<FieldDescriptor>,
}

impl StructureInfo {
    pub(crate) fn construction(&self) -> Construction {
        self.construction
    }

    pub(crate) fn instantiate(&self) -> Box<dyn Instance> {
        (self.instantiate)()
    }

    pub(crate) fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }
}

pub(crate) enum TypeKind {
    Scalar(ScalarParser),
    Structure(StructureInfo),
    Opaque,
}

/// Everything the engine knows about one instantiable type.
///
/// Shared between threads and passes as a [`crate::TypeHandle`].
///
/// ```rust
/// use graph_unmarshal::TypeDescriptor;
///
/// #[derive(Default)]
/// struct Point {
///     x: i32,
///     y: i32,
/// }
///
/// let point = TypeDescriptor::structure::<Point>("geo.Point", "geometry")
///     .field("x", |p: &mut Point, x: i32| p.x = x)
///     .field("y", |p: &mut Point, y: i32| p.y = y)
///     .build();
/// assert_eq!(point.qualified_name(), "geo.Point, geometry");
/// assert!(point.is::<Point>());
/// ```
pub struct TypeDescriptor {
    name: String,
    module: String,
    qualified: String,
    type_id: TypeId,
    rust_name: &'static str,
    kind: TypeKind,
}

fn qualify(name: &str, module: &str) -> String {
    if module.is_empty() {
        name.to_owned()
    } else {
        format!("{name}, {module}")
    }
}

impl TypeDescriptor {
    fn new<T: Any>(name: &str, module: &str, kind: TypeKind) -> Self {
        Self {
            name: name.to_owned(),
            module: module.to_owned(),
            qualified: qualify(name, module),
            type_id: TypeId::of::<T>(),
            rust_name: type_name::<T>(),
            kind,
        }
    }

    /// A type read from text by `parse`.
    pub fn scalar<T: Any>(
        name: &str,
        module: &str,
        parse: impl Fn(&str) -> Result<T, String> + Send + Sync + 'static,
    ) -> Self {
        let parser: ScalarParser = Arc::new(move |text: &str| parse(text).map(|v| Rc::new(v) as Object));
        Self::new::<T>(name, module, TypeKind::Scalar(parser))
    }

    /// A structure producing plain `T` objects.
    pub fn structure<T: Default + Any>(name: &str, module: &str) -> StructureBuilder<T> {
        StructureBuilder::new(name, module, Construction::Owned)
    }

    /// A structure producing `RefCell<T>` objects that may take part in cycles.
    pub fn shared_structure<T: Default + Any>(name: &str, module: &str) -> StructureBuilder<T> {
        StructureBuilder::new(name, module, Construction::Shared)
    }

    /// A type only a converter can build.
    pub fn opaque<T: Any>(name: &str, module: &str) -> Self {
        Self::new::<T>(name, module, TypeKind::Opaque)
    }

    /// Type name without the module qualifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Identity of the module providing the type.
    pub fn module(&self) -> &str {
        &self.module
    }

    /// `"<name>, <module>"`, or just the name when the module is empty.
    pub fn qualified_name(&self) -> &str {
        &self.qualified
    }

    /// `TypeId` of the objects this descriptor produces.
    ///
    /// For shared structures this is `RefCell<T>`.
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Rust name of the produced objects.
    pub fn rust_name(&self) -> &'static str {
        self.rust_name
    }

    /// Whether produced objects downcast to `T`.
    pub fn is<T: Any>(&self) -> bool {
        self.type_id == TypeId::of::<T>()
    }

    pub fn is_scalar(&self) -> bool {
        matches!(self.kind, TypeKind::Scalar(_))
    }

    pub fn is_structure(&self) -> bool {
        matches!(self.kind, TypeKind::Structure(_))
    }

    /// Parse text into an object. `None` when the type is not a scalar.
    pub fn parse_text(&self, text: &str) -> Option<Result<Object, String>> {
        match &self.kind {
            TypeKind::Scalar(parse) => Some(parse(text)),
            _ => None,
        }
    }

    /// Field descriptors, empty unless the type is a structure.
    pub fn fields(&self) -> &[FieldDescriptor] {
        match &self.kind {
            TypeKind::Structure(info) => &info.fields,
            _ => &[],
        }
    }

    pub(crate) fn kind(&self) -> &TypeKind {
        &self.kind
    }
}

impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &self.kind {
            TypeKind::Scalar(_) => "scalar",
            TypeKind::Structure(info) => match info.construction {
                Construction::Owned => "structure",
                Construction::Shared => "shared structure",
            },
            TypeKind::Opaque => "opaque",
        };
        f.debug_struct("TypeDescriptor")
            .field("qualified", &self.qualified)
            .field("rust", &self.rust_name)
            .field("kind", &kind)
            .field("fields", &self.fields())
            .finish()
    }
}

/// Collects the fields of a structure descriptor.
pub struct StructureBuilder<T> {
    name: String,
    module: String,
    construction: Construction,
    fields: Vec<FieldDescriptor>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Default + Any> StructureBuilder<T> {
    fn new(name: &str, module: &str, construction: Construction) -> Self {
        Self {
            name: name.to_owned(),
            module: module.to_owned(),
            construction,
            fields: Vec::new(),
            _marker: PhantomData,
        }
    }

    /// Add a field holding a value of type `F`, cloned out of the object.
    ///
    /// Suits scalars and other cheap values. Use [`Self::field_rc`] to keep
    /// the shared object itself.
    pub fn field<F: Any + Clone>(
        self,
        name: &str,
        set: impl Fn(&mut T, F) + Send + Sync + 'static,
    ) -> Self {
        let mut builder = self.field_rc(name, move |target: &mut T, value: Rc<F>| {
            set(target, Rc::unwrap_or_clone(value))
        });
        if let Some(added) = builder.fields.last_mut() {
            added.clones_value = true;
        }
        builder
    }

    /// Add a field receiving the object as `Rc<F>`, preserving identity.
    ///
    /// A shared structure `S` is received as `Rc<RefCell<S>>`, i.e. `F = RefCell<S>`.
    pub fn field_rc<F: Any>(
        self,
        name: &str,
        set: impl Fn(&mut T, Rc<F>) + Send + Sync + 'static,
    ) -> Self {
        let setter: FieldSetter = Arc::new(move |target: &mut dyn Any, value: Object| {
            let Some(target) = target.downcast_mut::<T>() else {
                return false;
            };
            match value.downcast::<F>() {
                Ok(value) => {
                    set(target, value);
                    true
                }
                Err(_) => false,
            }
        });
        self.push_field(name, TypeId::of::<F>(), type_name::<F>(), setter)
    }

    /// Add a field accepting an object of any type.
    ///
    /// Child elements for this field must name their type with a `class`
    /// attribute, since there is no declared type to fall back to.
    pub fn field_any(self, name: &str, set: impl Fn(&mut T, Object) + Send + Sync + 'static) -> Self {
        let setter: FieldSetter = Arc::new(move |target: &mut dyn Any, value: Object| {
            match target.downcast_mut::<T>() {
                Some(target) => {
                    set(target, value);
                    true
                }
                None => false,
            }
        });
        self.push_field(name, TypeId::of::<dyn Any>(), "dyn Any", setter)
    }

    fn push_field(
        mut self,
        name: &str,
        value_type: TypeId,
        value_type_name: &'static str,
        setter: FieldSetter,
    ) -> Self {
        self.fields.retain(|field| field.name != name);
        self.fields.push(FieldDescriptor {
            name: name.to_owned(),
            value_type,
            value_type_name,
            clones_value: false,
            setter,
        });
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let (type_id, rust_name, instantiate): (TypeId, &'static str, fn() -> Box<dyn Instance>) =
            match self.construction {
                Construction::Owned => (
                    TypeId::of::<T>(),
                    type_name::<T>(),
                    owned_instance::<T> as fn() -> Box<dyn Instance>,
                ),
                Construction::Shared => (
                    TypeId::of::<RefCell<T>>(),
                    type_name::<RefCell<T>>(),
                    shared_instance::<T> as fn() -> Box<dyn Instance>,
                ),
            };
        TypeDescriptor {
            qualified: qualify(&self.name, &self.module),
            name: self.name,
            module: self.module,
            type_id,
            rust_name,
            kind: TypeKind::Structure(StructureInfo {
                construction: self.construction,
                instantiate,
                fields: self.fields,
            }),
        }
    }
}
