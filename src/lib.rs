//! A scanner, SNBT lexer/serializer, and path-query engine for Named Binary Tag data.
//!
//! The binary reader is a stack-machine scanner ([`scanner`]) that produces a flat, non-owning
//! index over the input buffer; [`materialize`] turns that index into owned [`NbtTag`] trees on
//! demand. [`binary`] goes the other way, writing a tree back to bytes. [`snbt`] handles the
//! textual (stringified) form. [`path`] is a small addressing language for querying and mutating
//! a tree, and [`container`]/[`schema`] build on top of the rest for whole-file and
//! constrained-compound use cases respectively.

mod tag;
pub use self::tag::*;

pub mod settings;

#[expect(unreachable_pub, reason = "nothing in this module is publicly reachable")]
mod raw;

pub mod scanner;
pub mod materialize;
pub mod binary;
pub mod snbt;
pub mod path;
pub mod container;
pub mod schema;

#[cfg(feature = "json")]
pub mod json;

use thiserror::Error;

pub use self::{
    container::ContainerError,
    path::{Path, PathError},
    scanner::ScanError,
    schema::{Schema, SchemaCompound, SchemaError},
    snbt::SnbtError,
};

/// The crate's umbrella error type: wraps each subsystem's own error so callers who don't care
/// which layer failed can match on one type, while `source()`/`Display` still surface the
/// specific kind (§7).
#[derive(Error, Debug)]
pub enum NbtError {
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error(transparent)]
    Snbt(#[from] SnbtError),
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Schema(#[from] SchemaError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Crate-wide properties that cut across modules: round-trip laws between the binary and textual
/// forms, and the handful of worked scenarios the format is expected to handle exactly.
#[cfg(test)]
mod integration_tests {
    use crate::{
        path::Path,
        scanner::ScanError,
        settings::{Endianness, SnbtParseOptions},
        snbt,
        snbt::SnbtError,
        tag::{NbtCompound, NbtTag},
    };

    fn binary_round_trip(root: &NbtCompound, endianness: Endianness) -> NbtCompound {
        let mut buffer = Vec::new();
        crate::binary::write_root(&mut buffer, endianness, "", root).unwrap();
        let index = crate::scanner::scan(&buffer, 512, endianness).unwrap();
        let (_name, tag) = crate::materialize::materialize_at(&buffer, &index, 0);
        tag.as_compound().cloned().unwrap()
    }

    fn sample_compound() -> NbtCompound {
        let mut foo = NbtCompound::new();
        foo.insert("a", 1i32);
        let mut inner = NbtCompound::new();
        inner.insert("c", 42i32);
        foo.insert("b", inner);
        let mut root = NbtCompound::new();
        root.insert("foo", NbtTag::List(vec![NbtTag::Compound(foo)].into()));
        root.insert("bar", "Hello, world!");
        root
    }

    #[test]
    fn binary_round_trip_preserves_both_byte_orders() {
        let root = sample_compound();
        assert_eq!(binary_round_trip(&root, Endianness::BigEndian), root);
        assert_eq!(binary_round_trip(&root, Endianness::LittleEndian), root);
    }

    #[test]
    fn snbt_round_trip_preserves_the_tree() {
        let root = sample_compound();
        let text = NbtTag::Compound(root.clone()).to_compact_snbt();
        let parsed = snbt::parse_compound(&text, SnbtParseOptions::default()).unwrap();
        assert_eq!(parsed, root);
    }

    #[test]
    fn snbt_canonicalization_is_idempotent() {
        let root = sample_compound();
        let once = NbtTag::Compound(root).to_compact_snbt();
        let reparsed = snbt::parse_any(&once, SnbtParseOptions::default()).unwrap();
        let twice = reparsed.to_compact_snbt();
        assert_eq!(once, twice);
    }

    #[test]
    fn scenario_snbt_round_trips_bit_exact_in_big_endian_binary() {
        let text = r#"{foo:[1,2,3],bar:"Hello, world!"}"#;
        let root = snbt::parse_compound(text, SnbtParseOptions::default()).unwrap();

        let mut body = Vec::new();
        crate::binary::write_root(&mut body, Endianness::BigEndian, "", &root).unwrap();

        let index = crate::scanner::scan(&body, 512, Endianness::BigEndian).unwrap();
        let (_name, tag) = crate::materialize::materialize_at(&body, &index, 0);
        assert_eq!(tag, NbtTag::Compound(root));

        // The "foo" list's own payload (child-type byte + i32 length + three i32 elements) is
        // exactly 17 bytes: 1 + 4 + 3 * 4. A numeric-scalar list gets a single `TagDesc` with no
        // per-element entries, so its full payload span is derivable from that one descriptor.
        let foo = index.tags.iter().find(|d| d.type_id == 9).expect("foo is a List");
        let list_header_and_elements = 1 + 4 + foo.children as usize * 4;
        assert_eq!(list_header_and_elements, 17);
    }

    #[test]
    fn scenario_nested_path_query_reaches_a_deeply_nested_scalar() {
        let text = r#"{a:[{b:{c:42}}]}"#;
        let root = NbtTag::Compound(snbt::parse_compound(text, SnbtParseOptions::default()).unwrap());
        let path = Path::parse("a[0].b.c").unwrap();
        assert_eq!(path.get_all(&root), vec![NbtTag::Int(42)]);
    }

    fn scenario_tree() -> NbtTag {
        let text = r#"{foo:[{a:1,b:{c:42}},{a:2,b:{c:0}}]}"#;
        NbtTag::Compound(snbt::parse_compound(text, SnbtParseOptions::default()).unwrap())
    }

    #[test]
    fn scenario_set_all_replaces_every_match_in_a_list_of_compounds() {
        let mut root = scenario_tree();
        let replaced = Path::parse("foo[].a").unwrap().set_all(&mut root, NbtTag::Int(99));
        assert_eq!(replaced, 2);

        let expected = r#"{foo:[{a:99,b:{c:42}},{a:99,b:{c:0}}]}"#;
        assert_eq!(root.to_compact_snbt(), NbtTag::Compound(snbt::parse_compound(expected, SnbtParseOptions::default()).unwrap()).to_compact_snbt());
    }

    #[test]
    fn scenario_delete_all_removes_filtered_elements_within_a_list() {
        let mut root = scenario_tree();
        let removed = Path::parse("foo[].b{c:0}").unwrap().delete_all(&mut root);
        assert_eq!(removed, 1);

        let expected = r#"{foo:[{a:1,b:{c:42}},{a:2}]}"#;
        assert_eq!(root.to_compact_snbt(), NbtTag::Compound(snbt::parse_compound(expected, SnbtParseOptions::default()).unwrap()).to_compact_snbt());
    }

    #[test]
    fn scenario_long_array_descriptor_reports_element_count_as_children() {
        #[rustfmt::skip]
        let buffer: Vec<u8> = vec![
            10, 0, 0, // root Compound, unnamed
                12, 0, 1, b'x', 0, 0, 0, 3, // LongArray "x", length 3
                    0, 0, 0, 0, 0, 0, 0, 1,
                    0, 0, 0, 0, 0, 0, 0, 2,
                    0, 0, 0, 0, 0, 0, 0, 3,
                0, // End
        ];
        let index = crate::scanner::scan(&buffer, 512, Endianness::BigEndian).unwrap();
        let desc = index.tags[1];
        assert_eq!(desc.type_id, 12);
        assert_eq!(desc.children, 3);
        assert_eq!(desc.name_length, 1);

        let (_name, tag) = crate::materialize::materialize_at(&buffer, &index, 0);
        let compound = tag.as_compound().unwrap();
        assert_eq!(compound.get("x"), Some(&NbtTag::LongArray(vec![1, 2, 3])));
    }

    fn deeply_nested_compound_chain(depth: usize) -> Vec<u8> {
        let mut buffer = Vec::new();
        for _ in 0..depth {
            buffer.extend_from_slice(&[10, 0, 1, b'n']); // Compound "n"
        }
        buffer.push(0); // innermost End
        for _ in 0..depth {
            buffer.push(0); // closing End for each wrapping Compound
        }
        buffer
    }

    #[test]
    fn scenario_shallow_stack_budget_rejects_deep_nesting_that_a_larger_one_accepts() {
        let buffer = deeply_nested_compound_chain(100);
        assert!(matches!(
            crate::scanner::scan(&buffer, 64, Endianness::BigEndian),
            Err(ScanError::DepthExceeded { .. })
        ));
        assert!(crate::scanner::scan(&buffer, 4096, Endianness::BigEndian).is_ok());
    }

    #[test]
    fn scenario_unsuffixed_literal_outgrowing_int_becomes_long_but_byte_suffix_overflows() {
        assert_eq!(
            snbt::parse_any("2147483648", SnbtParseOptions::default()).unwrap(),
            NbtTag::Long(2147483648)
        );
        assert!(matches!(
            snbt::parse_any("2147483648b", SnbtParseOptions::default()).unwrap_err(),
            SnbtError::NumericRange { .. }
        ));
    }

    #[test]
    fn path_law_get_all_distributes_over_concatenation() {
        let root = scenario_tree();
        let p1 = Path::parse("foo[]").unwrap();
        let p2 = Path::parse(".a").unwrap();

        let direct = Path::parse("foo[].a").unwrap().get_all(&root);
        let via_flatmap: Vec<NbtTag> =
            p1.get_all(&root).into_iter().flat_map(|x| p2.get_all(&x)).collect();

        assert_eq!(direct, via_flatmap);
    }
}
