//! Fallback reconstruction for types no converter claims.

use tracing::trace;

use crate::context::UnmarshallingContext;
use crate::error::Error;
use crate::options::{ReferenceMode, UnknownFieldPolicy};
use crate::reader::attributes;
use crate::types::{
    Construction, FieldDescriptor, Instance, Object, StructureInfo, TypeHandle, TypeKind,
};

/// Builds objects from their [`crate::TypeDescriptor`] alone.
///
/// - A scalar is parsed from the node text.
/// - A structure is default-constructed, then every non-reserved attribute is
///   parsed into the field of the same name, then every child element is
///   converted through the context into the field named by its tag.
/// - An opaque type cannot be built and fails with
///   [`Error::NotConstructible`].
///
/// Owned structures are staked once complete; shared structures are staked
/// before their first field, so their children may refer back to them.
/// A null child leaves the field at its default value.
pub struct StructuralUnmarshaller<'c, 'a> {
    context: &'c mut UnmarshallingContext<'a>,
}

impl<'c, 'a> StructuralUnmarshaller<'c, 'a> {
    pub fn new(context: &'c mut UnmarshallingContext<'a>) -> Self {
        Self { context }
    }

    /// Build the current node as `ty`.
    pub fn unmarshal(mut self, ty: &TypeHandle) -> Result<Object, Error> {
        match ty.kind() {
            TypeKind::Scalar(_) => self.scalar(ty),
            TypeKind::Structure(info) => {
                let mut instance = info.instantiate();
                if let Some(early) = instance.early_object() {
                    self.context.stack_object(&early)?;
                }
                self.read_attributes(ty, info, &mut *instance)?;
                self.read_children(ty, info, &mut *instance)?;
                let object = instance.finish();
                if info.construction() == Construction::Owned {
                    self.context.stack_object(&object)?;
                }
                Ok(object)
            }
            TypeKind::Opaque => Err(Error::not_constructible(ty.qualified_name())),
        }
    }

    fn scalar(&mut self, ty: &TypeHandle) -> Result<Object, Error> {
        let object = match ty.parse_text(self.context.reader().value()) {
            Some(Ok(object)) => object,
            Some(Err(msg)) => return Err(Error::invalid_value(ty.qualified_name(), msg)),
            None => return Err(Error::not_constructible(ty.qualified_name())),
        };
        self.context.stack_object(&object)?;
        Ok(object)
    }

    fn read_attributes(
        &mut self,
        ty: &TypeHandle,
        info: &StructureInfo,
        instance: &mut dyn Instance,
    ) -> Result<(), Error> {
        let id_mode = self.context.options().reference_mode == ReferenceMode::Id;
        let names: Vec<String> = self
            .context
            .reader()
            .attribute_names()
            .into_iter()
            .filter(|name| !attributes::is_reserved(name, id_mode))
            .map(str::to_owned)
            .collect();

        for name in names {
            let Some(field) = info.field(&name) else {
                self.unknown_field(ty, &name)?;
                continue;
            };
            let field_type = self.declared_type(ty, field)?;
            let text = self.context.reader().attribute(&name).unwrap_or_default();
            let value = match field_type.parse_text(text) {
                Some(Ok(value)) => value,
                Some(Err(msg)) => {
                    return Err(Error::invalid_value(field_type.qualified_name(), msg));
                }
                None => {
                    return Err(Error::msg(format!(
                        "field `{name}` of `{}` holds `{}`, which cannot be read from an attribute",
                        ty.qualified_name(),
                        field_type.qualified_name()
                    )));
                }
            };
            if !instance.set(field, value) {
                return Err(Error::field_type(ty.qualified_name(), &name));
            }
        }
        Ok(())
    }

    fn read_children(
        &mut self,
        ty: &TypeHandle,
        info: &StructureInfo,
        instance: &mut dyn Instance,
    ) -> Result<(), Error> {
        while self.context.reader_mut().move_down() {
            let location = self.context.reader().location();
            let result = self.read_child(ty, info, instance);
            self.context.reader_mut().move_up();
            result.map_err(|err| err.or_location(location))?;
        }
        Ok(())
    }

    fn read_child(
        &mut self,
        ty: &TypeHandle,
        info: &StructureInfo,
        instance: &mut dyn Instance,
    ) -> Result<(), Error> {
        let name = self.context.reader().node_name().to_owned();
        let Some(field) = info.field(&name) else {
            return self.unknown_field(ty, &name);
        };
        let value = if field.is_untyped() {
            self.context.convert_next_explicit()?
        } else {
            let declared = self.declared_type(ty, field)?;
            self.context.convert_next_as(&declared)?
        };
        if let Some(value) = value {
            if !instance.set(field, value) {
                return Err(Error::field_type(ty.qualified_name(), &name));
            }
        }
        Ok(())
    }

    fn declared_type(&self, ty: &TypeHandle, field: &FieldDescriptor) -> Result<TypeHandle, Error> {
        self.context
            .resolver()
            .resolve_type_id(field.value_type())
            .ok_or_else(|| {
                trace!(
                    ty = ty.qualified_name(),
                    field = field.name(),
                    "field type is not registered"
                );
                Error::type_resolution(field.value_type_name())
            })
    }

    fn unknown_field(&self, ty: &TypeHandle, name: &str) -> Result<(), Error> {
        match self.context.options().unknown_fields {
            UnknownFieldPolicy::Ignore => {
                trace!(ty = ty.qualified_name(), field = name, "unknown field skipped");
                Ok(())
            }
            UnknownFieldPolicy::Error => Err(Error::unknown_field(ty.qualified_name(), name)),
        }
    }
}
