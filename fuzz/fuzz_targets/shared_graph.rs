#![no_main]

use std::cell::RefCell;
use std::rc::Rc;

use graph_unmarshal::{Mapper, ObjectList, TypeDescriptor};
use libfuzzer_sys::fuzz_target;

#[derive(Default)]
struct Node {
    label: String,
    weight: i64,
    next: Option<Rc<RefCell<Node>>>,
    items: Option<Rc<ObjectList>>,
}

// Shared structures allow cycles, so the fuzzer can build arbitrary graphs
// out of `<node>` and `<list>` elements and references between them.
fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let mut mapper = Mapper::new();
    let node = mapper.register(
        TypeDescriptor::shared_structure::<Node>("Node", "fuzz")
            .field("label", |n: &mut Node, v: String| n.label = v)
            .field("weight", |n: &mut Node, v: i64| n.weight = v)
            .field_rc("next", |n: &mut Node, v: Rc<RefCell<Node>>| n.next = Some(v))
            .field_rc("items", |n: &mut Node, v: Rc<ObjectList>| n.items = Some(v))
            .build(),
    );
    mapper.alias("node", &node);
    let _ = mapper.from_str(text);
});
