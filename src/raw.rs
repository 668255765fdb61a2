//! Byte-level primitives: endian-aware reads/writes and modified-UTF-8 string conversion.

use std::{mem::ManuallyDrop, ptr};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt as _, WriteBytesExt as _};

use crate::settings::Endianness;

/// Encodes as Java's modified UTF-8 (CESU-8-like: NUL as `0xC0 0x80`, supplementary planes as
/// surrogate pairs). Never fails — every Rust `str` is valid input.
pub fn string_to_modified_utf8(value: &str) -> Vec<u8> {
    cesu8::to_java_cesu8(value).into_owned()
}

/// Decodes modified-UTF-8 (or plain UTF-8) bytes into a `String`, replacing invalid sequences with
/// U+FFFD instead of failing (§3, §9: "Decoders should replace invalid sequences with U+FFFD").
pub fn string_from_modified_utf8(bytes: &[u8]) -> String {
    if let Ok(cow) = cesu8::from_java_cesu8(bytes) {
        return cow.into_owned();
    }
    String::from_utf8_lossy(bytes).into_owned()
}

#[inline]
pub fn read_u8(buf: &[u8], offset: usize) -> Option<u8> {
    buf.get(offset).copied()
}

#[inline]
pub fn read_i8(buf: &[u8], offset: usize) -> Option<i8> {
    read_u8(buf, offset).map(|b| b as i8)
}

macro_rules! read_multibyte {
    ($name:ident, $ty:ty, $size:expr, $method:ident) => {
        #[inline]
        pub fn $name(buf: &[u8], offset: usize, endianness: Endianness) -> Option<$ty> {
            let mut cursor = buf.get(offset..offset + $size)?;
            Some(match endianness {
                Endianness::BigEndian => cursor.$method::<BigEndian>().expect("slice has exact length"),
                Endianness::LittleEndian => cursor.$method::<LittleEndian>().expect("slice has exact length"),
            })
        }
    };
}

read_multibyte!(read_i16, i16, 2, read_i16);
read_multibyte!(read_i32, i32, 4, read_i32);
read_multibyte!(read_i64, i64, 8, read_i64);
read_multibyte!(read_f32, f32, 4, read_f32);
read_multibyte!(read_f64, f64, 8, read_f64);

#[inline]
pub fn read_u16(buf: &[u8], offset: usize, endianness: Endianness) -> Option<u16> {
    let slice = buf.get(offset..offset + 2)?;
    let mut cursor = slice;
    Some(match endianness {
        Endianness::BigEndian => cursor.read_u16::<BigEndian>().expect("slice has exact length"),
        Endianness::LittleEndian => cursor.read_u16::<LittleEndian>().expect("slice has exact length"),
    })
}

/// Reads a signed 32-bit length field and clamps negative values to zero, truncating at
/// `i32::MAX` as lengths in practice are never negative (§3).
#[inline]
pub fn read_length(buf: &[u8], offset: usize, endianness: Endianness) -> Option<u32> {
    read_i32(buf, offset, endianness).map(|n| n.max(0) as u32)
}

pub fn write_u8<W: std::io::Write>(writer: &mut W, value: u8) -> std::io::Result<()> {
    writer.write_u8(value)
}

pub fn write_i8<W: std::io::Write>(writer: &mut W, value: i8) -> std::io::Result<()> {
    writer.write_i8(value)
}

/// Writes a name/string field: a u16 code-unit length prefix followed by modified-UTF-8 bytes.
pub fn write_string<W: std::io::Write>(writer: &mut W, endianness: Endianness, value: &str) -> std::io::Result<()> {
    let bytes = string_to_modified_utf8(value);
    write_u16(writer, bytes.len() as u16, endianness)?;
    writer.write_all(&bytes)
}

pub fn write_u16<W: std::io::Write>(writer: &mut W, value: u16, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_u16::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_u16::<LittleEndian>(value),
    }
}

pub fn write_i16<W: std::io::Write>(writer: &mut W, value: i16, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_i16::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_i16::<LittleEndian>(value),
    }
}

pub fn write_i32<W: std::io::Write>(writer: &mut W, value: i32, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_i32::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_i32::<LittleEndian>(value),
    }
}

pub fn write_i64<W: std::io::Write>(writer: &mut W, value: i64, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_i64::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_i64::<LittleEndian>(value),
    }
}

pub fn write_f32<W: std::io::Write>(writer: &mut W, value: f32, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_f32::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_f32::<LittleEndian>(value),
    }
}

pub fn write_f64<W: std::io::Write>(writer: &mut W, value: f64, endianness: Endianness) -> std::io::Result<()> {
    match endianness {
        Endianness::BigEndian => writer.write_f64::<BigEndian>(value),
        Endianness::LittleEndian => writer.write_f64::<LittleEndian>(value),
    }
}

/// Reinterprets a `Vec<u8>` as a `Vec<i8>` without copying.
///
/// ## Safety
/// `i8` and `u8` have identical size and alignment, so any valid `Vec<u8>` is a valid `Vec<i8>`
/// of the same length and capacity.
#[inline]
pub fn cast_byte_buf_to_signed(buf: Vec<u8>) -> Vec<i8> {
    let mut me = ManuallyDrop::new(buf);
    let ptr = me.as_mut_ptr().cast::<i8>();
    let length = me.len();
    let capacity = me.capacity();
    // Safety: see doc comment above; ptr/length/capacity are taken from a valid Vec<u8>.
    unsafe { Vec::from_raw_parts(ptr, length, capacity) }
}

/// Reinterprets a `Vec<i8>` as a `Vec<u8>` without copying. See [`cast_byte_buf_to_signed`].
#[inline]
pub fn cast_byte_buf_to_unsigned(buf: Vec<i8>) -> Vec<u8> {
    let mut me = ManuallyDrop::new(buf);
    let ptr = me.as_mut_ptr().cast::<u8>();
    let length = me.len();
    let capacity = me.capacity();
    // Safety: see doc comment on cast_byte_buf_to_signed.
    unsafe { Vec::from_raw_parts(ptr, length, capacity) }
}

/// Reads `len` big/little-endian `i32`s from `reader` in one bulk read, swapping bytes in place
/// if necessary, rather than decoding one element at a time.
pub fn read_i32_array<R: std::io::Read>(
    reader: &mut R,
    endianness: Endianness,
    len: usize,
) -> std::io::Result<Vec<i32>> {
    let mut bytes = ManuallyDrop::new(vec![0i32; len]);
    let ptr = bytes.as_mut_ptr().cast::<u8>();
    let byte_len = bytes.len() * 4;
    let byte_cap = bytes.capacity() * 4;
    // Safety: i32's alignment/size requirements are satisfied because the allocation came from a
    // Vec<i32> of the same backing length, just reinterpreted byte-wise.
    let mut byte_buf = unsafe { Vec::from_raw_parts(ptr, byte_len, byte_cap) };
    reader.read_exact(&mut byte_buf)?;
    Ok(unsafe {
        convert_in_place::<i32, 4>(byte_buf, match endianness {
            Endianness::BigEndian => i32::from_be_bytes,
            Endianness::LittleEndian => i32::from_le_bytes,
        })
    })
}

/// Reads `len` big/little-endian `i64`s from `reader` in one bulk read. See [`read_i32_array`].
pub fn read_i64_array<R: std::io::Read>(
    reader: &mut R,
    endianness: Endianness,
    len: usize,
) -> std::io::Result<Vec<i64>> {
    let mut bytes = ManuallyDrop::new(vec![0i64; len]);
    let ptr = bytes.as_mut_ptr().cast::<u8>();
    let byte_len = bytes.len() * 8;
    let byte_cap = bytes.capacity() * 8;
    // Safety: see read_i32_array.
    let mut byte_buf = unsafe { Vec::from_raw_parts(ptr, byte_len, byte_cap) };
    reader.read_exact(&mut byte_buf)?;
    Ok(unsafe {
        convert_in_place::<i64, 8>(byte_buf, match endianness {
            Endianness::BigEndian => i64::from_be_bytes,
            Endianness::LittleEndian => i64::from_le_bytes,
        })
    })
}

/// ## Safety
/// The length of `bytes` must be a multiple of `SIZE`, and `SIZE` must equal the size (and
/// alignment requirement) of `I`.
unsafe fn convert_in_place<I, const SIZE: usize>(
    mut bytes: Vec<u8>,
    convert: fn([u8; SIZE]) -> I,
) -> Vec<I> {
    let mut read = bytes.as_ptr().cast::<[u8; SIZE]>();
    let mut write = bytes.as_mut_ptr().cast::<I>();

    // Safety: `read`/`write` alias the same allocation; reading SIZE bytes and immediately
    // overwriting them with the converted value never races because reads always run ahead.
    unsafe {
        let end = bytes.as_ptr().add(bytes.len()).cast::<[u8; SIZE]>();
        while read != end {
            let chunk = ptr::read(read);
            ptr::write(write, convert(chunk));
            read = read.add(1);
            write = write.add(1);
        }
    }

    let mut me = ManuallyDrop::new(bytes);
    let ptr = me.as_mut_ptr().cast::<I>();
    let length = me.len() / SIZE;
    let capacity = me.capacity() / SIZE;
    // Safety: the buffer was allocated as Vec<u8> with length/capacity multiples of SIZE, and
    // every element has now been overwritten with a valid I in place.
    unsafe { Vec::from_raw_parts(ptr, length, capacity) }
}
