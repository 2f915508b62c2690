use std::cell::RefCell;
use std::rc::Rc;

use super::Converter;
use crate::context::UnmarshallingContext;
use crate::error::Error;
use crate::types::{ObjectList, Object, TypeDescriptor, TypeHandle};

/// Parses the node text with the scalar parser of the resolved type.
///
/// Selected by type only: `target` is always present when the context calls it.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScalarConverter;

impl Converter for ScalarConverter {
    fn handles_type(&self, ty: &TypeDescriptor) -> bool {
        ty.is_scalar()
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        // Claims types only, so the context always passes the resolved one.
        let Some(ty) = target else {
            return Err(Error::msg(format!(
                "node `{}` reached the scalar converter without a resolved type",
                context.reader().node_name()
            )));
        };
        let object = match ty.parse_text(context.reader().value()) {
            Some(Ok(object)) => object,
            Some(Err(msg)) => return Err(Error::invalid_value(ty.qualified_name(), msg)),
            None => return Err(Error::not_constructible(ty.qualified_name())),
        };
        context.stack_object(&object)?;
        Ok(object)
    }
}

/// Builds an [`ObjectList`] from the children of a `<list>` node.
///
/// The list is staked before its items are converted, so items may refer
/// back to the list that contains them.
#[derive(Debug, Default, Clone, Copy)]
pub struct ListConverter;

/// Tag name claimed by [`ListConverter`].
pub const LIST_NODE: &str = "list";

impl Converter for ListConverter {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == LIST_NODE
    }

    fn handles_type(&self, ty: &TypeDescriptor) -> bool {
        ty.is::<ObjectList>()
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        let list: Rc<ObjectList> = Rc::new(RefCell::new(Vec::new()));
        let object: Object = list.clone();
        context.stack_object(&object)?;
        while context.reader().has_more_children() {
            let item = context.convert_child()?;
            list.borrow_mut().push(item);
        }
        Ok(object)
    }
}
