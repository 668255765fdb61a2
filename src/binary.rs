//! Binary NBT serialization. Unlike the scanner, writing is a straightforward recursive walk: the
//! tree is already in memory, so there is no need for an explicit stack to bound recursion depth
//! the way reading untrusted input does.

use crate::{
    raw,
    settings::Endianness,
    tag::{NbtCompound, NbtTag},
};

/// Serializes `root` as the body of a named root Compound tag: type id, name, then the
/// Compound's own encoding (fields followed by a trailing End byte).
pub fn write_root<W: std::io::Write>(
    writer: &mut W,
    endianness: Endianness,
    outer_name: &str,
    root: &NbtCompound,
) -> std::io::Result<()> {
    raw::write_u8(writer, 10)?;
    raw::write_string(writer, endianness, outer_name)?;
    write_compound_body(writer, endianness, root)
}

fn write_tag<W: std::io::Write>(writer: &mut W, endianness: Endianness, tag: &NbtTag) -> std::io::Result<()> {
    match tag {
        NbtTag::Byte(v) => raw::write_i8(writer, *v),
        NbtTag::Short(v) => raw::write_i16(writer, *v, endianness),
        NbtTag::Int(v) => raw::write_i32(writer, *v, endianness),
        NbtTag::Long(v) => raw::write_i64(writer, *v, endianness),
        NbtTag::Float(v) => raw::write_f32(writer, *v, endianness),
        NbtTag::Double(v) => raw::write_f64(writer, *v, endianness),
        NbtTag::ByteArray(items) => {
            raw::write_i32(writer, items.len() as i32, endianness)?;
            let bytes = raw::cast_byte_buf_to_unsigned(items.clone());
            writer.write_all(&bytes)
        }
        NbtTag::String(s) => raw::write_string(writer, endianness, s),
        NbtTag::List(list) => write_list_body(writer, endianness, list),
        NbtTag::Compound(compound) => write_compound_body(writer, endianness, compound),
        NbtTag::IntArray(items) => {
            raw::write_i32(writer, items.len() as i32, endianness)?;
            for &v in items {
                raw::write_i32(writer, v, endianness)?;
            }
            Ok(())
        }
        NbtTag::LongArray(items) => {
            raw::write_i32(writer, items.len() as i32, endianness)?;
            for &v in items {
                raw::write_i64(writer, v, endianness)?;
            }
            Ok(())
        }
    }
}

fn write_list_body<W: std::io::Write>(
    writer: &mut W,
    endianness: Endianness,
    list: &crate::tag::NbtList,
) -> std::io::Result<()> {
    if list.is_empty() {
        raw::write_u8(writer, 0)?;
        return raw::write_i32(writer, 0, endianness);
    }
    let child_id = list[0].tag_type().id();
    raw::write_u8(writer, child_id)?;
    raw::write_i32(writer, list.len() as i32, endianness)?;
    for element in list.iter() {
        write_tag(writer, endianness, element)?;
    }
    Ok(())
}

fn write_compound_body<W: std::io::Write>(
    writer: &mut W,
    endianness: Endianness,
    compound: &NbtCompound,
) -> std::io::Result<()> {
    for (name, tag) in compound.iter() {
        raw::write_u8(writer, tag.tag_type().id())?;
        raw::write_string(writer, endianness, name)?;
        write_tag(writer, endianness, tag)?;
    }
    raw::write_u8(writer, 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{materialize, scanner};

    #[test]
    fn round_trips_through_scanner() {
        let mut compound = NbtCompound::new();
        compound.insert("foo", 42i8);
        compound.insert("bar", 256i32);

        let mut buffer = Vec::new();
        write_root(&mut buffer, Endianness::BigEndian, "", &compound).unwrap();

        let index = scanner::scan(&buffer, 512, Endianness::BigEndian).unwrap();
        let (name, tag) = materialize::materialize_at(&buffer, &index, 0);
        assert_eq!(name, "");
        assert_eq!(tag, NbtTag::Compound(compound));
    }

    #[test]
    fn emits_trailing_end_byte() {
        let compound = NbtCompound::new();
        let mut buffer = Vec::new();
        write_root(&mut buffer, Endianness::BigEndian, "", &compound).unwrap();
        // Compound id (1) + empty name (2) + immediate End byte (1).
        assert_eq!(buffer, vec![10, 0, 0, 0]);
    }

    #[test]
    fn list_round_trips_with_declared_child_type() {
        let mut compound = NbtCompound::new();
        compound.insert("nums", NbtTag::List(vec![1i32, 2i32, 3i32].into()));

        let mut buffer = Vec::new();
        write_root(&mut buffer, Endianness::LittleEndian, "root", &compound).unwrap();

        let index = scanner::scan(&buffer, 512, Endianness::LittleEndian).unwrap();
        let (name, tag) = materialize::materialize_at(&buffer, &index, 0);
        assert_eq!(name, "root");
        assert_eq!(tag, NbtTag::Compound(compound));
    }
}
