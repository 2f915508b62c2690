//! Null markers, back-references and staking.

use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use graph_unmarshal::{Converter, Error, Mapper, Object, ObjectList, TypeHandle, UnmarshallingContext};
use indoc::indoc;

fn items(list: &ObjectList) -> Vec<Option<Object>> {
    list.borrow().clone()
}

#[test]
fn null_marker_yields_none() {
    let mapper = Mapper::new();
    let value = mapper.from_str(r#"<int null="true">5</int>"#);
    assert!(matches!(value, Ok(None)));
}

#[test]
fn null_marker_is_checked_before_references() {
    // `/nowhere` would fail as a dangling reference if it were looked at.
    let mapper = Mapper::new();
    let value = mapper.from_str(r#"<int null="true" references="/nowhere"/>"#);
    assert!(matches!(value, Ok(None)));
}

#[test]
fn null_marker_must_be_exactly_true() {
    let mapper = Mapper::new();
    let value = mapper.from_str_as::<i32>(r#"<int null="false">5</int>"#);
    assert_eq!(value.ok().flatten().as_deref(), Some(&5));
    let value = mapper.from_str_as::<i32>(r#"<int null="TRUE">6</int>"#);
    assert_eq!(value.ok().flatten().as_deref(), Some(&6));
}

#[test]
fn null_items_are_kept_in_lists() {
    let mapper = Mapper::new();
    let list = mapper
        .from_str_as::<ObjectList>(r#"<list><int>1</int><int null="true"/></list>"#)
        .unwrap()
        .unwrap();
    let items = items(&list);
    assert_eq!(items.len(), 2);
    assert!(items[1].is_none());
}

#[test]
fn reference_returns_the_identical_object() {
    let xml = indoc! {r#"
        <list>
          <string>shared</string>
          <string references="/list/string"/>
          <string>copy</string>
        </list>
    "#};
    let mapper = Mapper::new();
    let list = mapper.from_str_as::<ObjectList>(xml).unwrap().unwrap();
    let items = items(&list);
    let first = items[0].clone().unwrap();
    let second = items[1].clone().unwrap();
    let third = items[2].clone().unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert!(!Rc::ptr_eq(&first, &third));
    assert_eq!(second.downcast_ref::<String>().map(String::as_str), Some("shared"));
}

#[test]
fn dangling_reference_fails_with_the_reference() {
    let xml = indoc! {r#"
        <list>
          <int>1</int>
          <int references="/list/int[2]"/>
        </list>
    "#};
    let err = Mapper::new().from_str(xml).unwrap_err();
    assert!(matches!(
        &err,
        Error::UnresolvedReference { reference, .. } if reference == "/list/int[2]"
    ));
    assert_eq!(err.location().map(|l| l.line()), Some(3));
}

#[test]
fn reference_to_the_enclosing_list_resolves() {
    let mapper = Mapper::new();
    let list = mapper
        .from_str_as::<ObjectList>(r#"<list><list references="/list"/></list>"#)
        .unwrap()
        .unwrap();
    let inner = items(&list)[0].clone().unwrap();
    let as_object: Object = list.clone();
    assert!(Rc::ptr_eq(&inner, &as_object));
    // break the cycle
    list.borrow_mut().clear();
}

/// Claims `<tick/>` and counts how often it is asked to build one.
#[derive(Default)]
struct Tick {
    calls: AtomicUsize,
}

impl Converter for Tick {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == "tick"
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        let object: Object = Rc::new(n);
        context.stack_object(&object)?;
        Ok(object)
    }
}

#[test]
fn referenced_objects_are_not_converted_again() {
    let tick = Arc::new(Tick::default());
    let mut mapper = Mapper::new();
    mapper.register_converter(tick.clone());
    let xml = r#"<list><tick/><tick references="/list/tick"/><tick/></list>"#;
    let list = mapper.from_str_as::<ObjectList>(xml).unwrap().unwrap();
    assert_eq!(tick.calls.load(Ordering::SeqCst), 2);
    let items = items(&list);
    assert!(Rc::ptr_eq(
        items[0].as_ref().unwrap(),
        items[1].as_ref().unwrap()
    ));
    let third = items[2].as_ref().and_then(|o| o.downcast_ref::<usize>().copied());
    assert_eq!(third, Some(1));
}

/// Stakes its object twice at the same position.
struct Greedy;

impl Converter for Greedy {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == "greedy"
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        let object: Object = Rc::new(());
        context.stack_object(&object)?;
        context.stack_object(&object)?;
        Ok(object)
    }
}

#[test]
fn staking_one_position_twice_fails() {
    let mut mapper = Mapper::new();
    mapper.register_converter(Arc::new(Greedy));
    let err = mapper.from_str("<list>\n<greedy/>\n</list>").unwrap_err();
    assert!(matches!(
        &err,
        Error::DuplicateReference { path, .. } if path == "/list/greedy"
    ));
    assert_eq!(err.location().map(|l| l.line()), Some(2));
}

/// Stakes a draft, then the finished object, at the same position.
struct Redrafting;

impl Converter for Redrafting {
    fn handles_name(&self, node_name: &str) -> bool {
        node_name == "draft"
    }

    fn from_document(
        &self,
        context: &mut UnmarshallingContext<'_>,
        _target: Option<&TypeHandle>,
    ) -> Result<Object, Error> {
        let draft: Object = Rc::new(String::from("draft"));
        context.stack_object(&draft)?;
        let done: Object = Rc::new(String::from("done"));
        context.stack_object(&done)?;
        Ok(done)
    }
}

#[test]
fn staking_a_different_object_at_a_taken_position_fails() {
    let mut mapper = Mapper::new();
    mapper.register_converter(Arc::new(Redrafting));
    let err = mapper.from_str("<list><draft/></list>").unwrap_err();
    assert!(matches!(
        &err,
        Error::DuplicateReference { path, .. } if path == "/list/draft"
    ));
}

#[test]
fn failure_returns_no_partial_graph() {
    let xml = indoc! {r#"
        <list>
          <int>1</int>
          <int>2</int>
          <mystery/>
        </list>
    "#};
    let result = Mapper::new().from_str(xml);
    assert!(matches!(
        result,
        Err(Error::MissingTypeInfo { node, .. }) if node == "mystery"
    ));
}
