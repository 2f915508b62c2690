#![no_main]

use graph_unmarshal::{Mapper, Options};
use libfuzzer_sys::fuzz_target;

// Arbitrary bytes through the default mapper: built-in scalars and lists only.
// Any input must end in Ok or Err, never in a panic or a stack overflow.
fuzz_target!(|data: &[u8]| {
    let mapper = Mapper::with_options(graph_unmarshal::options! {
        budget: Some(graph_unmarshal::budget! {
            max_depth: 64,
            max_nodes: 10_000,
        }),
    });
    let _ = mapper.from_slice(data);

    if let Ok(text) = std::str::from_utf8(data) {
        let id_mode = Mapper::with_options(Options {
            reference_mode: graph_unmarshal::ReferenceMode::Id,
            ..Options::default()
        });
        let _ = id_mode.from_str(text);
    }
});
