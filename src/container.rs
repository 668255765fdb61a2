//! The file container: a named root Compound plus the framing (compression, byte order) it was
//! read with or will be written with, and the `NamedFile` convenience wrapper around a path.

use std::{
    fs,
    io::{self, Read, Write},
    path::{Path, PathBuf},
};

use flate2::{
    read::{GzDecoder, ZlibDecoder},
    write::{GzEncoder, ZlibEncoder},
};
use log::debug;

use crate::{
    binary, materialize, scanner,
    scanner::ScanError,
    settings::{CompressionLevel, Endianness, IoOptions, NbtCompression},
    tag::NbtCompound,
};

const GZIP_MAGIC: [u8; 2] = [0x1F, 0x8B];
const ZLIB_MAGIC: u8 = 0x78;

/// A decoded or about-to-be-encoded NBT file: the root Compound, its outer name, and the framing
/// it carries (§4.6).
#[derive(Debug, Clone)]
pub struct NbtFile {
    pub root: NbtCompound,
    pub outer_name: String,
    pub compression: NbtCompression,
    pub byte_order: Endianness,
}

impl NbtFile {
    /// Sniffs compression from the leading bytes (gzip: `1F 8B`; zlib: `78`), scans, and
    /// materializes the root Compound from `bytes`.
    pub fn decode(bytes: &[u8], byte_order: Endianness, depth: usize) -> Result<Self, ScanError> {
        let compression = detect_compression(bytes);
        let decompressed = decompress(bytes, compression);

        let index = scanner::scan(&decompressed, depth, byte_order)?;
        let (outer_name, root_tag) = materialize::materialize_at(&decompressed, &index, 0);
        let root = root_tag.as_compound().cloned().unwrap_or_default();

        Ok(Self { root, outer_name, compression, byte_order })
    }

    /// As [`decode`](Self::decode), but for a file whose byte order isn't known in advance: tries
    /// `preferred` first, and on `UnexpectedEof` or `InvalidType` (the two failure modes that
    /// plausibly indicate a byte-order mismatch rather than genuine corruption or a budget
    /// overrun) retries once with the opposite order (§9). `DepthExceeded`/`OutOfMemory` are
    /// never retried, since the opposite byte order wouldn't change that outcome.
    pub fn decode_auto(bytes: &[u8], preferred: Endianness, depth: usize) -> Result<Self, ScanError> {
        match Self::decode(bytes, preferred, depth) {
            Ok(file) => Ok(file),
            Err(ScanError::UnexpectedEof { .. } | ScanError::InvalidType { .. }) => {
                Self::decode(bytes, preferred.opposite(), depth)
            }
            Err(other) => Err(other),
        }
    }

    /// Serializes `self.root` with `self.outer_name`, applying `self.compression`'s framing, and
    /// emitting the trailing End byte the binary writer always produces for the root Compound's
    /// body (§4.6: "must not be omitted").
    pub fn encode(&self, level: CompressionLevel) -> Vec<u8> {
        let mut body = Vec::new();
        binary::write_root(&mut body, self.byte_order, &self.outer_name, &self.root)
            .expect("writing to a Vec<u8> never fails");

        match self.compression {
            NbtCompression::Uncompressed => body,
            NbtCompression::GzipCompressed => {
                let mut encoder = GzEncoder::new(Vec::new(), level.as_flate2());
                encoder.write_all(&body).expect("writing to a Vec<u8> never fails");
                encoder.finish().expect("writing to a Vec<u8> never fails")
            }
            NbtCompression::ZlibCompressed => {
                let mut encoder = ZlibEncoder::new(Vec::new(), level.as_flate2());
                encoder.write_all(&body).expect("writing to a Vec<u8> never fails");
                encoder.finish().expect("writing to a Vec<u8> never fails")
            }
        }
    }
}

fn detect_compression(bytes: &[u8]) -> NbtCompression {
    if bytes.starts_with(&GZIP_MAGIC) {
        NbtCompression::GzipCompressed
    } else if bytes.first() == Some(&ZLIB_MAGIC) {
        NbtCompression::ZlibCompressed
    } else {
        NbtCompression::Uncompressed
    }
}

fn decompress(bytes: &[u8], compression: NbtCompression) -> Vec<u8> {
    let mut out = Vec::new();
    match compression {
        NbtCompression::GzipCompressed => {
            GzDecoder::new(bytes).read_to_end(&mut out).expect("decompression covered by caller's detection");
        }
        NbtCompression::ZlibCompressed => {
            ZlibDecoder::new(bytes).read_to_end(&mut out).expect("decompression covered by caller's detection");
        }
        NbtCompression::Uncompressed => out.extend_from_slice(bytes),
    }
    out
}

/// An error encountered opening or saving a [`NamedFile`].
#[derive(Debug, thiserror::Error)]
pub enum ContainerError {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
}

/// A `NbtFile` bound to a path on disk, matching the scoped-acquisition pattern described in
/// §9: `with` opens, lets the caller mutate, and saves on success only.
#[derive(Debug)]
pub struct NamedFile {
    path: PathBuf,
    opts: IoOptions,
    pub file: NbtFile,
}

impl NamedFile {
    /// Reads and scans `path` once, auto-detecting compression from its contents and retrying the
    /// opposite byte order if `opts.endianness` turns out to be wrong (§9).
    pub fn open(path: impl AsRef<Path>, opts: IoOptions) -> Result<Self, ContainerError> {
        let path = path.as_ref().to_path_buf();
        let bytes = fs::read(&path)?;
        let file = NbtFile::decode_auto(&bytes, opts.endianness, opts.depth_limit.limit() as usize)?;
        debug!("opened {} ({} top-level key(s))", path.display(), file.root.len());
        Ok(Self { path, opts, file })
    }

    /// Re-serializes `self.file` and writes it back to the bound path.
    pub fn save(&self) -> Result<(), ContainerError> {
        let bytes = self.file.encode(CompressionLevel::default());
        fs::write(&self.path, bytes)?;
        Ok(())
    }

    /// Opens `path`, runs `f` against the loaded file, and saves only if `f` returns `Ok`.
    pub fn with<R>(
        path: impl AsRef<Path>,
        opts: IoOptions,
        f: impl FnOnce(&mut NamedFile) -> Result<R, ContainerError>,
    ) -> Result<R, ContainerError> {
        let mut file = Self::open(path, opts)?;
        let result = f(&mut file)?;
        file.save()?;
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::NbtTag;

    #[test]
    fn round_trips_uncompressed() {
        let mut root = NbtCompound::new();
        root.insert("x", 1i32);
        let file = NbtFile {
            root,
            outer_name: "root".to_owned(),
            compression: NbtCompression::Uncompressed,
            byte_order: Endianness::BigEndian,
        };

        let bytes = file.encode(CompressionLevel::default());
        let decoded = NbtFile::decode(&bytes, Endianness::BigEndian, 512).unwrap();
        assert_eq!(decoded.outer_name, "root");
        assert_eq!(decoded.root.get("x"), Some(&NbtTag::Int(1)));
        assert_eq!(decoded.compression, NbtCompression::Uncompressed);
    }

    #[test]
    fn round_trips_gzip_compressed() {
        let mut root = NbtCompound::new();
        root.insert("x", 1i32);
        let file = NbtFile {
            root,
            outer_name: String::new(),
            compression: NbtCompression::GzipCompressed,
            byte_order: Endianness::BigEndian,
        };

        let bytes = file.encode(CompressionLevel::default());
        assert!(bytes.starts_with(&GZIP_MAGIC));

        let decoded = NbtFile::decode(&bytes, Endianness::BigEndian, 512).unwrap();
        assert_eq!(decoded.compression, NbtCompression::GzipCompressed);
        assert_eq!(decoded.root.get("x"), Some(&NbtTag::Int(1)));
    }

    #[test]
    fn round_trips_zlib_compressed() {
        let mut root = NbtCompound::new();
        root.insert("x", 1i32);
        let file = NbtFile {
            root,
            outer_name: String::new(),
            compression: NbtCompression::ZlibCompressed,
            byte_order: Endianness::BigEndian,
        };

        let bytes = file.encode(CompressionLevel::default());
        assert_eq!(bytes.first(), Some(&ZLIB_MAGIC));

        let decoded = NbtFile::decode(&bytes, Endianness::BigEndian, 512).unwrap();
        assert_eq!(decoded.compression, NbtCompression::ZlibCompressed);
        assert_eq!(decoded.root.get("x"), Some(&NbtTag::Int(1)));
    }

    #[test]
    fn detects_zlib_by_magic() {
        let mut root = NbtCompound::new();
        root.insert("x", 1i32);
        let mut body = Vec::new();
        binary::write_root(&mut body, Endianness::BigEndian, "", &root).unwrap();
        let mut encoder = ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&body).unwrap();
        let bytes = encoder.finish().unwrap();

        assert_eq!(detect_compression(&bytes), NbtCompression::ZlibCompressed);
        let decoded = NbtFile::decode(&bytes, Endianness::BigEndian, 512).unwrap();
        assert_eq!(decoded.root.get("x"), Some(&NbtTag::Int(1)));
    }

    #[test]
    fn decode_auto_retries_opposite_byte_order() {
        // A length-prefixed field (here an IntArray) misread in the wrong byte order turns a
        // small length into a huge one, which the scanner rejects as UnexpectedEof — the
        // retryable case this method exists for.
        let mut root = NbtCompound::new();
        root.insert("nums", NbtTag::IntArray(vec![1, 2]));
        let file = NbtFile {
            root,
            outer_name: String::new(),
            compression: NbtCompression::Uncompressed,
            byte_order: Endianness::LittleEndian,
        };
        let bytes = file.encode(CompressionLevel::default());

        assert!(NbtFile::decode(&bytes, Endianness::BigEndian, 512).is_err());

        let decoded = NbtFile::decode_auto(&bytes, Endianness::BigEndian, 512).unwrap();
        assert_eq!(decoded.byte_order, Endianness::LittleEndian);
        assert_eq!(decoded.root.get("nums"), Some(&NbtTag::IntArray(vec![1, 2])));
    }

    #[test]
    fn decode_auto_does_not_retry_depth_exceeded() {
        let mut root = NbtCompound::new();
        root.insert("x", 1i32);
        let file = NbtFile {
            root,
            outer_name: String::new(),
            compression: NbtCompression::Uncompressed,
            byte_order: Endianness::BigEndian,
        };
        let bytes = file.encode(CompressionLevel::default());

        let err = NbtFile::decode_auto(&bytes, Endianness::BigEndian, 0).unwrap_err();
        assert!(matches!(err, ScanError::DepthExceeded { .. }));
    }
}
