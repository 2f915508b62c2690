//! Converter dispatch order.

use std::rc::Rc;
use std::sync::Arc;

use graph_unmarshal::{
    Converter, Error, Mapper, Object, ObjectList, TypeDescriptor, TypeHandle,
    UnmarshallingContext,
};

#[derive(Debug, PartialEq)]
struct Celsius(f64);

/// Claims `Celsius` by type and reports which converter built the value.
struct Thermometer {
    offset: f64,
}

impl Converter for Thermometer {
    fn handles_type(&self, ty: &TypeDescriptor) -> bool {
        ty.is::<Celsius>()
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        assert!(target.is_some_and(|t| t.is::<Celsius>()));
        let degrees: f64 = context
            .reader()
            .value()
            .parse()
            .map_err(|e| Error::msg(format!("bad temperature: {e}")))?;
        let object: Object = Rc::new(Celsius(degrees + self.offset));
        context.stack_object(&object)?;
        Ok(object)
    }
}

/// Claims the tag `celsius` by name.
struct Frozen;

impl Converter for Frozen {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == "celsius"
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        assert!(target.is_none());
        let object: Object = Rc::new(Celsius(0.0));
        context.stack_object(&object)?;
        Ok(object)
    }
}

fn celsius_mapper(converters: Vec<Arc<dyn Converter>>) -> Mapper {
    let mut mapper = Mapper::new();
    let celsius = mapper.register(TypeDescriptor::opaque::<Celsius>("Celsius", "physics"));
    mapper.alias("celsius", &celsius);
    for converter in converters {
        mapper.register_converter(converter);
    }
    mapper
}

fn boxed(converter: impl Converter + 'static) -> Arc<dyn Converter> {
    Arc::new(converter)
}

fn read(mapper: &Mapper, xml: &str) -> f64 {
    let value = mapper.from_str_as::<Celsius>(xml).unwrap().unwrap();
    value.0
}

#[test]
fn first_registered_type_converter_wins() {
    let mapper = celsius_mapper(vec![
        boxed(Thermometer { offset: 0.0 }),
        boxed(Thermometer { offset: 100.0 }),
    ]);
    assert_eq!(read(&mapper, "<celsius>21.5</celsius>"), 21.5);

    let mapper = celsius_mapper(vec![
        boxed(Thermometer { offset: 100.0 }),
        boxed(Thermometer { offset: 0.0 }),
    ]);
    assert_eq!(read(&mapper, "<celsius>21.5</celsius>"), 121.5);
}

#[test]
fn name_keyed_converter_is_asked_before_type_resolution() {
    let mapper = celsius_mapper(vec![
        boxed(Thermometer { offset: 0.0 }),
        boxed(Frozen),
    ]);
    assert_eq!(read(&mapper, "<celsius>21.5</celsius>"), 0.0);
    // by class the tag is not `celsius`, so the type-keyed converter builds it
    assert_eq!(
        read(&mapper, r#"<t class="Celsius, physics">21.5</t>"#),
        21.5
    );
}

#[test]
fn name_keyed_converter_needs_no_type_information() {
    // no alias and no class: only the tag name selects the converter
    let mut mapper = Mapper::new();
    mapper.register_converter(Arc::new(Frozen));
    assert_eq!(read(&mapper, "<celsius/>"), 0.0);
}

#[test]
fn without_converter_opaque_type_is_not_constructible() {
    let mapper = celsius_mapper(Vec::new());
    assert!(matches!(
        mapper.from_str("<celsius>1</celsius>"),
        Err(Error::NotConstructible { .. })
    ));
}

#[test]
fn converter_errors_propagate_with_location() {
    let mapper = celsius_mapper(vec![boxed(Thermometer { offset: 0.0 })]);
    let err = mapper
        .from_str("<list>\n  <celsius>warm</celsius>\n</list>")
        .unwrap_err();
    assert!(matches!(err, Error::Message { ref msg, .. } if msg.starts_with("bad temperature")));
    assert_eq!(err.location().map(|l| (l.line(), l.column())), Some((2, 3)));
}

/// Claims every `i32`; registered after the built-in scalar converter.
struct Doubler;

impl Converter for Doubler {
    fn handles_type(&self, ty: &TypeDescriptor) -> bool {
        ty.is::<i32>()
    }

    fn from_document(
        &self,
        _context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        Ok(Rc::new(-1_i32))
    }
}

#[test]
fn late_converters_do_not_replace_built_in_ones() {
    let mut mapper = Mapper::new();
    mapper.register_converter(Arc::new(Doubler));
    let value = mapper.from_str_as::<i32>("<int>21</int>").unwrap().unwrap();
    assert_eq!(*value, 21);
}

#[test]
fn empty_mapper_uses_only_what_is_registered() {
    let mut mapper = Mapper::empty(graph_unmarshal::Options::default());
    let int = mapper.register(TypeDescriptor::opaque::<i32>("i32", "core"));
    mapper.alias("int", &int);
    mapper.register_converter(Arc::new(Doubler));
    let value = mapper.from_str_as::<i32>("<int>21</int>").unwrap().unwrap();
    assert_eq!(*value, -1);
}

/// A converter building a list of its children by hand, staking first.
struct Bag;

impl Converter for Bag {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == "bag"
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        let bag: Rc<ObjectList> = Rc::default();
        let object: Object = bag.clone();
        context.stack_object(&object)?;
        while context.reader_mut().move_down() {
            let item = context.convert_next();
            context.reader_mut().move_up();
            bag.borrow_mut().push(item?);
        }
        Ok(object)
    }
}

#[test]
fn custom_container_converter_recurses_through_the_context() {
    let mut mapper = Mapper::new();
    mapper.register_converter(Arc::new(Bag));
    let bag = mapper
        .from_str_as::<ObjectList>(r#"<bag><int>1</int><bag references="/bag"/></bag>"#)
        .unwrap()
        .unwrap();
    let items = bag.borrow().clone();
    assert_eq!(items[0].as_ref().and_then(|o| o.downcast_ref::<i32>()), Some(&1));
    let inner: Object = items[1].clone().unwrap();
    let outer: Object = bag.clone();
    assert!(Rc::ptr_eq(&inner, &outer));
    bag.borrow_mut().clear();
}
