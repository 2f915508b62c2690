//! The per-pass orchestrator every converter calls back into.

use std::rc::Rc;

use tracing::trace;

use crate::budget::{BudgetEnforcer, BudgetReport};
use crate::convert::ConverterLookup;
use crate::error::{Error, budget_error};
use crate::options::Options;
use crate::reader::{DocumentReader, attributes};
use crate::references::ReferenceTable;
use crate::structural::StructuralUnmarshaller;
use crate::types::{Object, TypeHandle, TypeResolver};

/// Where the type of the current node comes from.
#[derive(Clone, Copy)]
enum Expected<'t> {
    /// Tag name alias, else the `class` attribute.
    Node,
    /// The `class` attribute, else the declared field type.
    Declared(&'t TypeHandle),
    /// The `class` attribute only.
    Explicit,
}

/// State of one unmarshalling pass.
///
/// A context lives exactly as long as one top-level call. It borrows the
/// reader and the (shared, read-only) configuration, and owns the
/// [`ReferenceTable`] of the pass. Converters receive it mutably and use it to
/// read the current node, stake the objects they build and convert nested
/// nodes through [`Self::convert_next`], which is the single recursive entry
/// point of the engine.
pub struct UnmarshallingContext<'a> {
    reader: &'a mut dyn DocumentReader,
    resolver: &'a TypeResolver,
    converters: &'a ConverterLookup,
    options: &'a Options,
    references: ReferenceTable,
    budget: BudgetEnforcer,
}

impl<'a> UnmarshallingContext<'a> {
    pub fn new(
        reader: &'a mut dyn DocumentReader,
        resolver: &'a TypeResolver,
        converters: &'a ConverterLookup,
        options: &'a Options,
    ) -> Self {
        Self {
            reader,
            resolver,
            converters,
            options,
            references: ReferenceTable::new(),
            budget: BudgetEnforcer::new(options.budget.clone()),
        }
    }

    /// Convert the node under the cursor.
    ///
    /// In order:
    ///
    /// 1. `null="true"` yields `None` without touching anything else;
    /// 2. a `references` attribute yields the object staked at that position,
    ///    as is;
    /// 3. a converter claiming the tag name builds the value;
    /// 4. otherwise the type is resolved (alias, then `class`) and a converter
    ///    claiming the type builds the value;
    /// 5. otherwise the [`StructuralUnmarshaller`] does.
    ///
    /// Errors are not recovered from; the first one ends the pass.
    pub fn convert_next(&mut self) -> Result<Option<Object>, Error> {
        self.within_node(Expected::Node)
    }

    /// Convert the node under the cursor as a field of type `declared`.
    ///
    /// The tag of a field element is the field name, so neither the
    /// name-keyed converters nor the aliases are consulted. A `class`
    /// attribute overrides `declared`.
    pub fn convert_next_as(&mut self, declared: &TypeHandle) -> Result<Option<Object>, Error> {
        self.within_node(Expected::Declared(declared))
    }

    /// Convert the node under the cursor, taking its type from the `class`
    /// attribute alone. Used for fields that accept any type.
    pub fn convert_next_explicit(&mut self) -> Result<Option<Object>, Error> {
        self.within_node(Expected::Explicit)
    }

    /// Build the current node as `ty`: a converter claiming `ty`, else the
    /// structural unmarshaller. Skips the null and reference checks.
    pub fn convert_original(&mut self, ty: &TypeHandle) -> Result<Object, Error> {
        let converters = self.converters;
        if let Some(converter) = converters.by_type(ty) {
            trace!(ty = ty.qualified_name(), "type-keyed converter");
            return converter.from_document(self, Some(ty));
        }
        trace!(ty = ty.qualified_name(), "structural fallback");
        StructuralUnmarshaller::new(self).unmarshal(ty)
    }

    /// Enter the next unread child, convert it and come back.
    pub fn convert_child(&mut self) -> Result<Option<Object>, Error> {
        self.enter_child()?;
        let result = self.convert_next();
        self.reader.move_up();
        result
    }

    /// [`Self::convert_child`] for a child of a declared type.
    pub fn convert_child_as(&mut self, declared: &TypeHandle) -> Result<Option<Object>, Error> {
        self.enter_child()?;
        let result = self.convert_next_as(declared);
        self.reader.move_up();
        result
    }

    /// Register `object` at the current position, so that later nodes
    /// referencing this position resolve to it.
    ///
    /// Call it before converting children that may refer back to `object`.
    /// Staking the same position twice fails with
    /// [`Error::DuplicateReference`].
    pub fn stack_object(&mut self, object: &Object) -> Result<(), Error> {
        let position = self.reader.current_path();
        trace!(position, "stake");
        self.references.register(position, Rc::clone(object))
    }

    /// The object the current node's `references` attribute points at.
    ///
    /// `Ok(None)` if the node has no such attribute.
    pub fn find(&mut self) -> Result<Option<Object>, Error> {
        let reference = self.reader.attribute(attributes::REFERENCES);
        let Some(object) = self.references.resolve(reference)? else {
            return Ok(None);
        };
        self.budget.observe_reference().map_err(budget_error)?;
        Ok(Some(object))
    }

    /// Whether the current node carries the null marker (`null="true"`).
    pub fn is_null(&self) -> bool {
        self.reader.attribute(attributes::NULL) == Some("true")
    }

    pub fn reader(&self) -> &dyn DocumentReader {
        &*self.reader
    }

    /// Mutable access to the cursor, for converters that navigate by hand.
    pub fn reader_mut(&mut self) -> &mut dyn DocumentReader {
        &mut *self.reader
    }

    pub fn options(&self) -> &'a Options {
        self.options
    }

    pub fn resolver(&self) -> &'a TypeResolver {
        self.resolver
    }

    pub fn references(&self) -> &ReferenceTable {
        &self.references
    }

    /// Counters of the pass so far.
    pub fn budget_report(&self) -> &BudgetReport {
        self.budget.report()
    }

    fn enter_child(&mut self) -> Result<(), Error> {
        if self.reader.move_down() {
            Ok(())
        } else {
            Err(Error::msg(format!(
                "node `{}` has no more children",
                self.reader.node_name()
            )))
        }
    }

    fn within_node(&mut self, expected: Expected<'_>) -> Result<Option<Object>, Error> {
        let location = self.reader.location();
        let entered = self.budget.enter();
        let result = match entered {
            Ok(()) => self.convert_current(expected),
            Err(breach) => Err(budget_error(breach)),
        };
        self.budget.leave();
        result.map_err(|err| err.or_location(location))
    }

    fn convert_current(&mut self, expected: Expected<'_>) -> Result<Option<Object>, Error> {
        if self.is_null() {
            trace!(position = self.reader.current_path(), "null");
            return Ok(None);
        }
        if let Some(object) = self.find()? {
            trace!(position = self.reader.current_path(), "reference");
            return Ok(Some(object));
        }

        let resolver = self.resolver;
        let explicit = self.reader.attribute(attributes::CLASS);
        let ty = match expected {
            Expected::Node => {
                let converters = self.converters;
                if let Some(converter) = converters.by_name(self.reader.node_name()) {
                    trace!(node = self.reader.node_name(), "name-keyed converter");
                    return converter.from_document(self, None).map(Some);
                }
                resolver.resolve(self.reader.node_name(), explicit)?
            }
            Expected::Declared(declared) => resolver.resolve_declared(explicit, declared)?,
            Expected::Explicit => match explicit {
                Some(full) if !full.is_empty() => resolver.resolve_qualified(full)?,
                _ => return Err(Error::missing_type_info(self.reader.node_name())),
            },
        };
        self.convert_original(&ty).map(Some)
    }
}
