//! Plain-data option types shared across the scanner, SNBT lexer/serializer, and file container.

use flate2::Compression;

// ================================
//      Limits
// ================================

/// Bound on how deeply Compounds and Lists may nest. Enforced by the scanner's explicit stack
/// (see [`crate::scanner`]) and by the SNBT parser's recursion counter.
///
/// Minecraft itself enforces 512, which is the default here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthLimit(pub(crate) u32);

impl Default for DepthLimit {
    fn default() -> Self {
        Self(512)
    }
}

impl DepthLimit {
    pub fn new(limit: u32) -> Self {
        Self(limit)
    }

    pub fn limit(self) -> u32 {
        self.0
    }
}

// ================================
//      Endianness
// ================================

/// Byte order used for multi-byte numeric fields in binary NBT.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endianness {
    /// Used by Java Edition NBT files.
    BigEndian,
    /// Used by Bedrock Edition NBT files.
    LittleEndian,
}

impl Endianness {
    /// The character Minecraft tooling conventionally uses to denote this byte order
    /// (`'>'` for big-endian, `'<'` for little-endian).
    pub fn marker(self) -> char {
        match self {
            Self::BigEndian => '>',
            Self::LittleEndian => '<',
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            Self::BigEndian => Self::LittleEndian,
            Self::LittleEndian => Self::BigEndian,
        }
    }
}

// ================================
//      Compression
// ================================

/// Framing applied around a serialized root Compound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NbtCompression {
    Uncompressed,
    GzipCompressed,
    ZlibCompressed,
}

/// Compression level used when writing gzip/zlib-framed data. Irrelevant on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompressionLevel(u8);

impl CompressionLevel {
    pub fn new(level: u8) -> Self {
        Self(level.min(9))
    }

    pub(crate) fn as_flate2(self) -> Compression {
        Compression::new(u32::from(self.0))
    }
}

impl Default for CompressionLevel {
    fn default() -> Self {
        Self(6)
    }
}

// ================================
//      IO options
// ================================

/// Encoding options used when scanning/writing a file container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IoOptions {
    pub endianness: Endianness,
    pub compression: NbtCompression,
    pub depth_limit: DepthLimit,
}

impl IoOptions {
    /// Java Edition on-disk encoding: big-endian, gzip-compressed.
    pub fn java() -> Self {
        Self {
            endianness: Endianness::BigEndian,
            compression: NbtCompression::GzipCompressed,
            depth_limit: DepthLimit::default(),
        }
    }

    /// Java Edition encoding without compression (used for e.g. network chunk packets).
    pub fn java_uncompressed() -> Self {
        Self {
            compression: NbtCompression::Uncompressed,
            ..Self::java()
        }
    }

    /// Bedrock Edition on-disk encoding: little-endian, uncompressed.
    pub fn bedrock() -> Self {
        Self {
            endianness: Endianness::LittleEndian,
            compression: NbtCompression::Uncompressed,
            depth_limit: DepthLimit::default(),
        }
    }
}

impl Default for IoOptions {
    fn default() -> Self {
        Self::java()
    }
}

// ================================
//      SNBT options
// ================================

/// How the SNBT serializer lays out whitespace and newlines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnbtWriteMode {
    /// No whitespace inside structural punctuation: `{a:1,b:[2,3]}`.
    Compact,
    /// A single space after `:` and `,`, no newlines: `{a: 1, b: [2, 3]}`.
    Default,
    /// One entry per line, indented by `indent` repeated per nesting level.
    Pretty { indent: String },
}

impl Default for SnbtWriteMode {
    fn default() -> Self {
        Self::Default
    }
}

/// Options controlling SNBT serialization.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SnbtWriteOptions {
    pub mode: SnbtWriteMode,
}

impl SnbtWriteOptions {
    pub fn compact() -> Self {
        Self { mode: SnbtWriteMode::Compact }
    }

    pub fn pretty(indent: impl Into<String>) -> Self {
        Self { mode: SnbtWriteMode::Pretty { indent: indent.into() } }
    }
}

/// Options controlling SNBT parsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnbtParseOptions {
    pub depth_limit: DepthLimit,
}

impl Default for SnbtParseOptions {
    fn default() -> Self {
        Self { depth_limit: DepthLimit::default() }
    }
}
