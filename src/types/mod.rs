//! Type resolution: descriptors, registries, aliases and qualified names.

use std::any::Any;
use std::rc::Rc;
use std::sync::Arc;

mod alias;
pub(crate) mod builtin;
mod descriptor;
mod qualified;
mod registry;
mod resolver;

pub use alias::{AliasProvider, AliasTable};
pub use builtin::{CORE_MODULE, ObjectList};
pub(crate) use descriptor::{Instance, StructureInfo, TypeKind};
pub use descriptor::{Construction, FieldDescriptor, StructureBuilder, TypeDescriptor};
pub use qualified::QualifiedName;
pub use registry::{Module, TypeModule, TypeRegistry};
pub use resolver::TypeResolver;

/// A deserialized value. Identity is pointer identity.
pub type Object = Rc<dyn Any>;

/// Shared, immutable type descriptor.
pub type TypeHandle = Arc<TypeDescriptor>;
