//! Turns a [`ScanIndex`] into owned [`NbtTag`] trees, either for the whole buffer or on demand
//! for a single tag index (§4.2). Both paths must yield identical trees.

use crate::{
    raw,
    scanner::{ScanIndex, TagDesc},
    tag::{NbtCompound, NbtList, NbtTag},
};

/// Materializes every top-level tag recorded in `index`, returning `(name, tag)` pairs in
/// document order. For a typical file container there is exactly one: the root Compound.
pub fn materialize_all(buffer: &[u8], index: &ScanIndex) -> Vec<(String, NbtTag)> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < index.tags.len() {
        let (name, tag) = materialize_at(buffer, index, i);
        i += index.tags[i].children as usize + 1;
        out.push((name, tag));
    }
    out
}

/// Materializes the single tag (and its subtree) rooted at `tag_index`, along with its name.
pub fn materialize_at(buffer: &[u8], index: &ScanIndex, tag_index: usize) -> (String, NbtTag) {
    let desc = index.tags[tag_index];
    let name = read_name(buffer, desc);
    let tag = materialize_tag(buffer, index, tag_index);
    (name, tag)
}

fn read_name(buffer: &[u8], desc: TagDesc) -> String {
    if desc.name_length == 0 {
        return String::new();
    }
    let start = desc.name_offset() as usize;
    let end = desc.payload_offset as usize;
    raw::string_from_modified_utf8(&buffer[start..end])
}

fn materialize_tag(buffer: &[u8], index: &ScanIndex, tag_index: usize) -> NbtTag {
    let desc = index.tags[tag_index];
    let endianness = index.endianness;
    let offset = desc.payload_offset as usize;

    match desc.type_id {
        1 => NbtTag::Byte(raw::read_i8(buffer, offset).unwrap_or(0)),
        2 => NbtTag::Short(raw::read_i16(buffer, offset, endianness).unwrap_or(0)),
        3 => NbtTag::Int(raw::read_i32(buffer, offset, endianness).unwrap_or(0)),
        4 => NbtTag::Long(raw::read_i64(buffer, offset, endianness).unwrap_or(0)),
        5 => NbtTag::Float(raw::read_f32(buffer, offset, endianness).unwrap_or(0.0)),
        6 => NbtTag::Double(raw::read_f64(buffer, offset, endianness).unwrap_or(0.0)),

        7 => {
            let len = desc.children as usize;
            let bytes = &buffer[offset..offset + len];
            NbtTag::ByteArray(raw::cast_byte_buf_to_signed(bytes.to_vec()))
        }

        8 => {
            let len = desc.children as usize;
            NbtTag::String(raw::string_from_modified_utf8(&buffer[offset..offset + len]))
        }

        11 => {
            let len = desc.children as usize;
            let mut cursor = &buffer[offset..offset + len * 4];
            NbtTag::IntArray(raw::read_i32_array(&mut cursor, endianness, len).unwrap_or_default())
        }

        12 => {
            let len = desc.children as usize;
            let mut cursor = &buffer[offset..offset + len * 8];
            NbtTag::LongArray(raw::read_i64_array(&mut cursor, endianness, len).unwrap_or_default())
        }

        9 => materialize_list(buffer, index, tag_index),

        10 => materialize_compound(buffer, index, tag_index),

        other => unreachable!("scanner never emits a TagDesc with type id {other}"),
    }
}

fn materialize_list(buffer: &[u8], index: &ScanIndex, tag_index: usize) -> NbtTag {
    let desc = index.tags[tag_index];
    if desc.children == 0 {
        return NbtTag::List(NbtList::new());
    }

    // The list's declared child type id sits 5 bytes before its payload: 1 byte child type id
    // followed by the 4-byte length the scanner already consumed before recording payload_offset.
    let declared_child = buffer[desc.payload_offset as usize - 5];

    if (1..=6).contains(&declared_child) {
        return materialize_numeric_list(buffer, index, tag_index, declared_child);
    }

    // Non-numeric list: direct children are exactly those immediate descendants whose recursive
    // descendant counts sum to `desc.children` (§4.2).
    let mut elements = NbtList::new();
    let mut i = tag_index + 1;
    let end = tag_index + desc.children as usize + 1;
    while i < end {
        elements.push(materialize_tag(buffer, index, i));
        i += index.tags[i].children as usize + 1;
    }
    NbtTag::List(elements)
}

fn materialize_numeric_list(buffer: &[u8], index: &ScanIndex, tag_index: usize, child_type_id: u8) -> NbtTag {
    let desc = index.tags[tag_index];
    let endianness = index.endianness;
    let offset = desc.payload_offset as usize;
    let len = desc.children as usize;

    let mut list = NbtList::with_capacity(len);

    for n in 0..len {
        let elem_offset = match child_type_id {
            1 => offset + n,
            2 => offset + n * 2,
            3 | 5 => offset + n * 4,
            4 | 6 => offset + n * 8,
            _ => unreachable!("numeric child type ids are 1..=6"),
        };
        let tag = match child_type_id {
            1 => NbtTag::Byte(raw::read_i8(buffer, elem_offset).unwrap_or(0)),
            2 => NbtTag::Short(raw::read_i16(buffer, elem_offset, endianness).unwrap_or(0)),
            3 => NbtTag::Int(raw::read_i32(buffer, elem_offset, endianness).unwrap_or(0)),
            4 => NbtTag::Long(raw::read_i64(buffer, elem_offset, endianness).unwrap_or(0)),
            5 => NbtTag::Float(raw::read_f32(buffer, elem_offset, endianness).unwrap_or(0.0)),
            6 => NbtTag::Double(raw::read_f64(buffer, elem_offset, endianness).unwrap_or(0.0)),
            _ => unreachable!(),
        };
        list.push(tag);
    }

    NbtTag::List(list)
}

fn materialize_compound(buffer: &[u8], index: &ScanIndex, tag_index: usize) -> NbtTag {
    let desc = index.tags[tag_index];
    let mut compound = NbtCompound::new();
    let mut i = tag_index + 1;
    let end = tag_index + desc.children as usize + 1;
    while i < end {
        let (name, tag) = materialize_at(buffer, index, i);
        i += index.tags[i].children as usize + 1;
        compound.insert(name, tag);
    }
    NbtTag::Compound(compound)
}
