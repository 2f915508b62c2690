//! Built-in `core` types and their default aliases.

use std::cell::RefCell;

use super::alias::AliasTable;
use super::registry::TypeRegistry;
use super::{Object, TypeDescriptor};
use crate::parse_scalars::{
    parse_base64, parse_bool, parse_char, parse_f32, parse_f64, parse_int_signed,
    parse_int_unsigned,
};

/// Module identity of the built-in types.
pub const CORE_MODULE: &str = "core";

/// Object produced for `<list>` nodes. Entries are `None` for null items.
pub type ObjectList = RefCell<Vec<Option<Object>>>;

pub(crate) fn register_builtins(registry: &mut TypeRegistry) {
    registry.register(TypeDescriptor::scalar::<bool>("bool", CORE_MODULE, parse_bool));
    registry.register(TypeDescriptor::scalar::<char>("char", CORE_MODULE, parse_char));
    registry.register(TypeDescriptor::scalar::<i8>("i8", CORE_MODULE, parse_int_signed::<i8>));
    registry.register(TypeDescriptor::scalar::<i16>("i16", CORE_MODULE, parse_int_signed::<i16>));
    registry.register(TypeDescriptor::scalar::<i32>("i32", CORE_MODULE, parse_int_signed::<i32>));
    registry.register(TypeDescriptor::scalar::<i64>("i64", CORE_MODULE, parse_int_signed::<i64>));
    registry.register(TypeDescriptor::scalar::<u8>("u8", CORE_MODULE, parse_int_unsigned::<u8>));
    registry.register(TypeDescriptor::scalar::<u16>("u16", CORE_MODULE, parse_int_unsigned::<u16>));
    registry.register(TypeDescriptor::scalar::<u32>("u32", CORE_MODULE, parse_int_unsigned::<u32>));
    registry.register(TypeDescriptor::scalar::<u64>("u64", CORE_MODULE, parse_int_unsigned::<u64>));
    registry.register(TypeDescriptor::scalar::<f32>("f32", CORE_MODULE, parse_f32));
    registry.register(TypeDescriptor::scalar::<f64>("f64", CORE_MODULE, parse_f64));
    registry.register(TypeDescriptor::scalar::<String>("String", CORE_MODULE, |s| {
        Ok(s.to_owned())
    }));
    registry.register(TypeDescriptor::scalar::<Vec<u8>>("bytes", CORE_MODULE, parse_base64));
    registry.register(TypeDescriptor::opaque::<ObjectList>("list", CORE_MODULE));
}

/// Short tag names for the built-in types.
const DEFAULT_ALIASES: &[(&str, &str)] = &[
    ("boolean", "bool"),
    ("byte", "i8"),
    ("short", "i16"),
    ("int", "i32"),
    ("long", "i64"),
    ("float", "f32"),
    ("double", "f64"),
    ("string", "String"),
];

/// Alias table mapping the Rust names and the short tag names of the
/// built-in types present in `registry`.
pub(crate) fn default_aliases(registry: &TypeRegistry) -> AliasTable {
    let mut table = AliasTable::new();
    let rust_names = [
        "bool", "char", "i8", "i16", "i32", "i64", "u8", "u16", "u32", "u64", "f32", "f64",
        "String", "bytes", "list",
    ];
    let pairs = rust_names
        .iter()
        .map(|name| (*name, *name))
        .chain(DEFAULT_ALIASES.iter().copied());
    for (alias, name) in pairs {
        if let Some(ty) = registry.get(&format!("{name}, {CORE_MODULE}")) {
            table.insert(alias, &ty);
        }
    }
    table
}
