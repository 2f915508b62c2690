//! Reconstructs typed object graphs from XML documents.
//!
//! Every element of the document becomes one object. Its type is found by
//! tag name through aliases, or through a `"Type, Module"` name in its
//! `class` attribute. Objects are built by pluggable [`Converter`]s, or field
//! by field by the [`StructuralUnmarshaller`] when no converter claims the
//! type. An element with `references="<position>"` stands for the object
//! built earlier at that position, so shared and cyclic graphs come back with
//! their identities intact.
//!
//! ```rust
//! use std::cell::RefCell;
//! use std::rc::Rc;
//!
//! use graph_unmarshal::{Mapper, TypeDescriptor};
//!
//! #[derive(Default)]
//! struct Person {
//!     name: String,
//!     friend: Option<Rc<RefCell<Person>>>,
//! }
//!
//! let mut mapper = Mapper::new();
//! let person = mapper.register(
//!     TypeDescriptor::shared_structure::<Person>("Person", "people")
//!         .field("name", |p: &mut Person, name: String| p.name = name)
//!         .field_rc("friend", |p: &mut Person, f: Rc<RefCell<Person>>| p.friend = Some(f))
//!         .build(),
//! );
//! mapper.alias("person", &person);
//!
//! let xml = r#"<person name="Ann"><friend name="Bob"><friend references="/person"/></friend></person>"#;
//! let ann = mapper
//!     .from_str_as::<RefCell<Person>>(xml)
//!     .unwrap()
//!     .unwrap();
//! let bob = ann.borrow().friend.clone().unwrap();
//! assert_eq!(bob.borrow().name, "Bob");
//! let back = bob.borrow().friend.clone().unwrap();
//! assert!(Rc::ptr_eq(&back, &ann));
//! ```

pub mod budget;
mod context;
mod convert;
mod error;
mod macros;
mod mapper;
#[cfg(feature = "miette")]
pub mod miette;
pub mod options;
pub mod parse_scalars;
mod reader;
mod references;
mod structural;
pub mod types;

pub use budget::{Budget, BudgetBreach, BudgetReport};
pub use context::UnmarshallingContext;
pub use convert::{Converter, ConverterLookup, ListConverter, ScalarConverter};
pub use error::{Error, Location};
pub use mapper::Mapper;
pub use options::{Options, ReferenceMode, UnknownFieldPolicy};
pub use reader::{DocumentReader, XmlReader, attributes};
pub use references::ReferenceTable;
pub use structural::StructuralUnmarshaller;
pub use types::{
    AliasProvider, AliasTable, CORE_MODULE, Construction, FieldDescriptor, Module, Object,
    ObjectList, QualifiedName, StructureBuilder, TypeDescriptor, TypeHandle, TypeModule,
    TypeRegistry, TypeResolver,
};
