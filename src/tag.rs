//! The NBT tag data model: twelve typed variants, plus the `NbtList`/`NbtCompound` containers.

use std::{
    borrow::Borrow,
    fmt::{self, Debug, Formatter},
    ops::{Deref, DerefMut, Index, IndexMut},
};

#[cfg(feature = "preserve_order")]
pub type Map<T> = indexmap::IndexMap<String, T>;
#[cfg(not(feature = "preserve_order"))]
pub type Map<T> = std::collections::BTreeMap<String, T>;

/// A tag's type, without its payload. Used by the scanner, the schema layer, and anywhere a tag
/// type needs to be named without constructing a value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NbtType {
    Byte,
    Short,
    Int,
    Long,
    Float,
    Double,
    ByteArray,
    String,
    List,
    Compound,
    IntArray,
    LongArray,
}

impl NbtType {
    /// The one-byte binary discriminator for this type (§3 of the format).
    pub const fn id(self) -> u8 {
        match self {
            Self::Byte => 1,
            Self::Short => 2,
            Self::Int => 3,
            Self::Long => 4,
            Self::Float => 5,
            Self::Double => 6,
            Self::ByteArray => 7,
            Self::String => 8,
            Self::List => 9,
            Self::Compound => 10,
            Self::IntArray => 11,
            Self::LongArray => 12,
        }
    }

    /// Recover a type from its binary discriminator, if it names one of the twelve variants.
    pub const fn from_id(id: u8) -> Option<Self> {
        match id {
            1 => Some(Self::Byte),
            2 => Some(Self::Short),
            3 => Some(Self::Int),
            4 => Some(Self::Long),
            5 => Some(Self::Float),
            6 => Some(Self::Double),
            7 => Some(Self::ByteArray),
            8 => Some(Self::String),
            9 => Some(Self::List),
            10 => Some(Self::Compound),
            11 => Some(Self::IntArray),
            12 => Some(Self::LongArray),
            _ => None,
        }
    }

    /// True for the six scalar numeric variants (1-6), which is what the scanner and the SNBT
    /// array grammar mean by "numeric".
    pub const fn is_numeric_scalar(self) -> bool {
        matches!(
            self,
            Self::Byte | Self::Short | Self::Int | Self::Long | Self::Float | Self::Double
        )
    }

    /// Fixed encoded size in bytes for a numeric scalar, or `None` for variable-length types.
    pub const fn fixed_size(self) -> Option<usize> {
        match self {
            Self::Byte => Some(1),
            Self::Short => Some(2),
            Self::Int | Self::Float => Some(4),
            Self::Long | Self::Double => Some(8),
            _ => None,
        }
    }
}

/// The generic NBT value type, one variant per entry in the format's type table.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NbtTag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(NbtList),
    Compound(NbtCompound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl NbtTag {
    pub fn tag_type(&self) -> NbtType {
        match self {
            Self::Byte(_) => NbtType::Byte,
            Self::Short(_) => NbtType::Short,
            Self::Int(_) => NbtType::Int,
            Self::Long(_) => NbtType::Long,
            Self::Float(_) => NbtType::Float,
            Self::Double(_) => NbtType::Double,
            Self::ByteArray(_) => NbtType::ByteArray,
            Self::String(_) => NbtType::String,
            Self::List(_) => NbtType::List,
            Self::Compound(_) => NbtType::Compound,
            Self::IntArray(_) => NbtType::IntArray,
            Self::LongArray(_) => NbtType::LongArray,
        }
    }

    /// Numeric-suffix letter used in the SNBT grammar (§4.4), or `None` for types with no suffix.
    pub fn type_specifier(&self) -> Option<&'static str> {
        match self {
            Self::Byte(_) | Self::ByteArray(_) => Some("B"),
            Self::Short(_) => Some("S"),
            Self::Long(_) | Self::LongArray(_) => Some("L"),
            Self::Float(_) => Some("F"),
            Self::Double(_) => Some("D"),
            Self::IntArray(_) => Some("I"),
            _ => None,
        }
    }

    pub fn as_compound(&self) -> Option<&NbtCompound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_compound_mut(&mut self) -> Option<&mut NbtCompound> {
        match self {
            Self::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&NbtList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_list_mut(&mut self) -> Option<&mut NbtList> {
        match self {
            Self::List(l) => Some(l),
            _ => None,
        }
    }

    /// Serializes to SNBT with [`SnbtWriteOptions::default()`](crate::settings::SnbtWriteOptions).
    pub fn to_snbt(&self) -> String {
        crate::snbt::ser::to_snbt(self, &crate::settings::SnbtWriteOptions::default())
    }

    /// Serializes to SNBT with no inserted whitespace.
    pub fn to_compact_snbt(&self) -> String {
        crate::snbt::ser::to_snbt(self, &crate::settings::SnbtWriteOptions::compact())
    }

    /// Serializes to SNBT with one entry per line, indented by `indent` per nesting level.
    pub fn to_pretty_snbt(&self, indent: impl Into<String>) -> String {
        crate::snbt::ser::to_snbt(self, &crate::settings::SnbtWriteOptions::pretty(indent))
    }
}

impl Debug for NbtTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_compact_snbt())
    }
}

impl fmt::Display for NbtTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_snbt())
    }
}

macro_rules! from_prim {
    ($variant:ident, $ty:ty) => {
        impl From<$ty> for NbtTag {
            #[inline]
            fn from(value: $ty) -> Self {
                Self::$variant(value)
            }
        }

        impl TryFrom<NbtTag> for $ty {
            type Error = NbtTag;

            #[inline]
            fn try_from(tag: NbtTag) -> Result<Self, NbtTag> {
                match tag {
                    NbtTag::$variant(value) => Ok(value),
                    other => Err(other),
                }
            }
        }

        impl<'a> TryFrom<&'a NbtTag> for &'a $ty {
            type Error = ();

            #[inline]
            fn try_from(tag: &'a NbtTag) -> Result<Self, ()> {
                match tag {
                    NbtTag::$variant(value) => Ok(value),
                    _ => Err(()),
                }
            }
        }
    };
}

from_prim!(Byte, i8);
from_prim!(Short, i16);
from_prim!(Int, i32);
from_prim!(Long, i64);
from_prim!(Float, f32);
from_prim!(Double, f64);
from_prim!(ByteArray, Vec<i8>);
from_prim!(String, String);
from_prim!(List, NbtList);
from_prim!(Compound, NbtCompound);
from_prim!(IntArray, Vec<i32>);
from_prim!(LongArray, Vec<i64>);

impl From<&str> for NbtTag {
    fn from(value: &str) -> Self {
        Self::String(value.to_owned())
    }
}

impl From<bool> for NbtTag {
    fn from(value: bool) -> Self {
        Self::Byte(value.into())
    }
}

/// An ordered sequence of tags that all share the same [`NbtType`] (§3: a List declares a single
/// child type).
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NbtList(pub(crate) Vec<NbtTag>);

impl NbtList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// The child type this list declares, or `None` if it is empty (an empty list may declare
    /// child-type End, which has no `NbtType` counterpart here).
    pub fn element_type(&self) -> Option<NbtType> {
        self.0.first().map(NbtTag::tag_type)
    }

    pub fn push(&mut self, tag: impl Into<NbtTag>) {
        self.0.push(tag.into());
    }

    pub fn get(&self, index: usize) -> Option<&NbtTag> {
        self.0.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut NbtTag> {
        self.0.get_mut(index)
    }

    pub fn remove(&mut self, index: usize) -> Option<NbtTag> {
        (index < self.0.len()).then(|| self.0.remove(index))
    }
}

impl Deref for NbtList {
    type Target = [NbtTag];

    fn deref(&self) -> &[NbtTag] {
        &self.0
    }
}

impl DerefMut for NbtList {
    fn deref_mut(&mut self) -> &mut [NbtTag] {
        &mut self.0
    }
}

impl Index<usize> for NbtList {
    type Output = NbtTag;

    fn index(&self, index: usize) -> &NbtTag {
        &self.0[index]
    }
}

impl IndexMut<usize> for NbtList {
    fn index_mut(&mut self, index: usize) -> &mut NbtTag {
        &mut self.0[index]
    }
}

impl<T: Into<NbtTag>> From<Vec<T>> for NbtList {
    fn from(list: Vec<T>) -> Self {
        Self(list.into_iter().map(Into::into).collect())
    }
}

impl FromIterator<NbtTag> for NbtList {
    fn from_iter<I: IntoIterator<Item = NbtTag>>(iter: I) -> Self {
        Self(Vec::from_iter(iter))
    }
}

impl IntoIterator for NbtList {
    type Item = NbtTag;
    type IntoIter = std::vec::IntoIter<NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a NbtList {
    type Item = &'a NbtTag;
    type IntoIter = std::slice::Iter<'a, NbtTag>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Debug for NbtList {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&NbtTag::List(self.clone()).to_compact_snbt())
    }
}

/// An ordered mapping from non-duplicate names to tags (§3). Insertion order is preserved for
/// canonical output but is not semantically significant for equality.
#[derive(Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NbtCompound(pub(crate) Map<NbtTag>);

impl NbtCompound {
    pub fn new() -> Self {
        Self(Map::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        #[cfg(feature = "preserve_order")]
        {
            Self(Map::with_capacity(capacity))
        }
        #[cfg(not(feature = "preserve_order"))]
        {
            let _ = capacity;
            Self(Map::new())
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, tag: impl Into<NbtTag>) -> Option<NbtTag> {
        self.0.insert(name.into(), tag.into())
    }

    pub fn get<Q>(&self, name: &Q) -> Option<&NbtTag>
    where
        String: Borrow<Q>,
        Q: Ord + std::hash::Hash + Eq + ?Sized,
    {
        #[cfg(feature = "preserve_order")]
        {
            self.0.get(name)
        }
        #[cfg(not(feature = "preserve_order"))]
        {
            self.0.get(name)
        }
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut NbtTag> {
        self.0.get_mut(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<NbtTag> {
        #[cfg(feature = "preserve_order")]
        {
            self.0.shift_remove(name)
        }
        #[cfg(not(feature = "preserve_order"))]
        {
            self.0.remove(name)
        }
    }

    pub fn contains_key(&self, name: &str) -> bool {
        self.0.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &NbtTag)> {
        self.0.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&String, &mut NbtTag)> {
        self.0.iter_mut()
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }
}

impl FromIterator<(String, NbtTag)> for NbtCompound {
    fn from_iter<I: IntoIterator<Item = (String, NbtTag)>>(iter: I) -> Self {
        Self(Map::from_iter(iter))
    }
}

impl<'a> IntoIterator for &'a NbtCompound {
    type Item = (&'a String, &'a NbtTag);
    type IntoIter = <&'a Map<NbtTag> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl Debug for NbtCompound {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&NbtTag::Compound(self.clone()).to_compact_snbt())
    }
}
