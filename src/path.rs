//! NBT Path: a small addressing language for selecting and mutating tags within a tree.
//!
//! Grammar (informal): a path is a sequence of accessors —
//! `name`, `.name`, `[]`, `[i]`, `[{k:v,...}]`, `{k:v,...}`, `name{k:v,...}` — applied left to
//! right starting from a root tag. There is no precedent for this kind of mini-language elsewhere
//! in the crate, so its grammar, error type, and evaluator are designed from scratch, but the
//! error-reporting shape (an offending segment plus a byte index, via a private `segment()`
//! excerpting helper) follows the same idiom as [`crate::snbt::SnbtError`].

use std::fmt;

use thiserror::Error;

use crate::tag::{NbtCompound, NbtTag};

/// A single step in a [`Path`].
#[derive(Debug, Clone, PartialEq)]
enum Accessor {
    Key(String),
    Index(usize),
    Wildcard,
    Filter(Vec<(String, NbtTag)>),
}

/// A parsed NBT Path expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Path {
    accessors: Vec<Accessor>,
}

/// An error encountered while parsing a path expression.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PathError {
    #[error("invalid path syntax near '{segment}' at byte {index}: {message}")]
    Syntax { segment: String, index: usize, message: String },
}

impl PathError {
    fn at(input: &str, index: usize, message: impl Into<String>) -> Self {
        Self::Syntax { segment: Self::segment(input, index), index, message: message.into() }
    }

    fn segment(input: &str, index: usize) -> String {
        let start = input[..index.min(input.len())]
            .char_indices()
            .rev()
            .nth(9)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let end = input[index.min(input.len())..]
            .char_indices()
            .nth(15)
            .map(|(i, _)| index + i)
            .unwrap_or(input.len());
        input[start..end].to_owned()
    }
}

impl Path {
    /// The empty path: `get_all` on it returns the root tag itself.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a path expression.
    pub fn parse(text: &str) -> Result<Self, PathError> {
        let mut parser = PathParser { input: text, bytes: text.as_bytes(), pos: 0 };
        let path = parser.parse_path()?;
        parser.skip_ws();
        if parser.pos != text.len() {
            return Err(PathError::at(text, parser.pos, "unexpected trailing characters"));
        }
        Ok(path)
    }

    /// Concatenates two paths: `Path::new() + Path::parse("a.b")` is `Path::parse("a.b")`.
    pub fn join(mut self, mut other: Path) -> Self {
        self.accessors.append(&mut other.accessors);
        self
    }

    /// Returns every tag the path selects, in document order. Array elements (`ByteArray`/
    /// `IntArray`/`LongArray`) are returned as freshly wrapped `Byte`/`Int`/`Long` tags, so
    /// selected tags are owned rather than borrowed from `root`.
    pub fn get_all(&self, root: &NbtTag) -> Vec<NbtTag> {
        let mut current = vec![root.clone()];
        for accessor in &self.accessors {
            current = current.iter().flat_map(|tag| apply_get(accessor, tag)).collect();
        }
        current
    }

    /// Replaces every tag the path selects with `value`, returning the number of replacements.
    pub fn set_all(&self, root: &mut NbtTag, value: NbtTag) -> usize {
        let Some((last, init)) = self.accessors.split_last() else {
            *root = value;
            return 1;
        };
        let mut count = 0;
        for target in init.iter().fold(vec![root], |acc, accessor| {
            acc.into_iter().flat_map(|tag| apply_get_mut(accessor, tag)).collect()
        }) {
            count += apply_set(last, target, &value);
        }
        count
    }

    /// Removes every tag the path selects, returning the number of removals. Matches within a
    /// single list/array are removed in reverse index order so earlier indices stay valid.
    pub fn delete_all(&self, root: &mut NbtTag) -> usize {
        let Some((last, init)) = self.accessors.split_last() else {
            return 0; // Deleting the whole tree isn't a tag mutation; there is nothing to drop it from.
        };
        let mut count = 0;
        for target in init.iter().fold(vec![root], |acc, accessor| {
            acc.into_iter().flat_map(|tag| apply_get_mut(accessor, tag)).collect()
        }) {
            count += apply_delete(last, target);
        }
        count
    }

    /// Returns the first match via pre-order search, or `None`.
    pub fn find(&self, root: &NbtTag) -> Option<NbtTag> {
        self.get_all(root).into_iter().next()
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, accessor) in self.accessors.iter().enumerate() {
            match accessor {
                Accessor::Key(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write_key(f, name)?;
                }
                Accessor::Index(idx) => write!(f, "[{idx}]")?,
                Accessor::Wildcard => write!(f, "[]")?,
                Accessor::Filter(entries) => {
                    write!(f, "[{{")?;
                    for (j, (key, value)) in entries.iter().enumerate() {
                        if j > 0 {
                            write!(f, ",")?;
                        }
                        write_key(f, key)?;
                        write!(f, ":{}", value.to_compact_snbt())?;
                    }
                    write!(f, "}}]")?;
                }
            }
        }
        Ok(())
    }
}

fn write_key(f: &mut fmt::Formatter<'_>, key: &str) -> fmt::Result {
    if !key.is_empty() && key.chars().all(crate::snbt::allowed_unquoted) {
        write!(f, "{key}")
    } else {
        write!(f, "{:?}", NbtTag::String(key.to_owned()))
    }
}

// ================================
//      Evaluation
// ================================

/// Number of elements in a list/array tag, or `None` if `tag` is neither (§4.5: `[]`/`[i]`/
/// `[{k:v,...}]` apply to "list/array").
fn array_len(tag: &NbtTag) -> Option<usize> {
    match tag {
        NbtTag::List(l) => Some(l.len()),
        NbtTag::ByteArray(a) => Some(a.len()),
        NbtTag::IntArray(a) => Some(a.len()),
        NbtTag::LongArray(a) => Some(a.len()),
        _ => None,
    }
}

/// The element at `index`, owned: List elements are cloned, array elements are wrapped back into
/// the matching scalar tag (`Byte`/`Int`/`Long`).
fn array_element(tag: &NbtTag, index: usize) -> Option<NbtTag> {
    match tag {
        NbtTag::List(l) => l.get(index).cloned(),
        NbtTag::ByteArray(a) => a.get(index).map(|&v| NbtTag::Byte(v)),
        NbtTag::IntArray(a) => a.get(index).map(|&v| NbtTag::Int(v)),
        NbtTag::LongArray(a) => a.get(index).map(|&v| NbtTag::Long(v)),
        _ => None,
    }
}

fn apply_get(accessor: &Accessor, tag: &NbtTag) -> Vec<NbtTag> {
    match accessor {
        Accessor::Key(name) => tag.as_compound().and_then(|c| c.get(name)).cloned().into_iter().collect(),
        Accessor::Index(i) => array_element(tag, *i).into_iter().collect(),
        Accessor::Wildcard => (0..array_len(tag).unwrap_or(0)).filter_map(|i| array_element(tag, i)).collect(),
        Accessor::Filter(entries) => match tag {
            NbtTag::List(list) => list.iter().filter(|t| matches_filter(t, entries)).cloned().collect(),
            NbtTag::Compound(_) if matches_filter(tag, entries) => vec![tag.clone()],
            _ => Vec::new(),
        },
    }
}

fn apply_get_mut<'a>(accessor: &Accessor, tag: &'a mut NbtTag) -> Vec<&'a mut NbtTag> {
    match accessor {
        Accessor::Key(name) => tag.as_compound_mut().and_then(|c| c.get_mut(name)).into_iter().collect(),
        Accessor::Index(i) => tag.as_list_mut().and_then(|l| l.get_mut(*i)).into_iter().collect(),
        Accessor::Wildcard => tag.as_list_mut().map(|l| l.iter_mut().collect()).unwrap_or_default(),
        Accessor::Filter(entries) => match tag {
            NbtTag::List(list) => list.iter_mut().filter(|t| matches_filter(t, entries)).collect(),
            NbtTag::Compound(_) if matches_filter(tag, entries) => vec![tag],
            _ => Vec::new(),
        },
    }
}

/// Writes `value` into the array element at `index`, coercing to the array's scalar type.
/// Mismatched value types (e.g. setting a `ByteArray` slot to a `String`) are a no-op, matching
/// this module's existing silent-no-op handling of inapplicable accessors.
fn set_array_element(tag: &mut NbtTag, index: usize, value: &NbtTag) -> bool {
    match (tag, value) {
        (NbtTag::ByteArray(a), NbtTag::Byte(v)) => a.get_mut(index).map(|slot| *slot = *v).is_some(),
        (NbtTag::IntArray(a), NbtTag::Int(v)) => a.get_mut(index).map(|slot| *slot = *v).is_some(),
        (NbtTag::LongArray(a), NbtTag::Long(v)) => a.get_mut(index).map(|slot| *slot = *v).is_some(),
        _ => false,
    }
}

fn apply_set(accessor: &Accessor, tag: &mut NbtTag, value: &NbtTag) -> usize {
    let is_array = matches!(tag, NbtTag::ByteArray(_) | NbtTag::IntArray(_) | NbtTag::LongArray(_));
    match accessor {
        Accessor::Index(i) if is_array => usize::from(set_array_element(tag, *i, value)),
        Accessor::Wildcard if is_array => {
            let len = array_len(tag).unwrap_or(0);
            (0..len).filter(|&i| set_array_element(tag, i, value)).count()
        }
        _ => {
            let mut count = 0;
            for slot in apply_get_mut(accessor, tag) {
                *slot = value.clone();
                count += 1;
            }
            count
        }
    }
}

/// Removes the array element at `index`, returning whether one was removed.
fn remove_array_element(tag: &mut NbtTag, index: usize) -> bool {
    match tag {
        NbtTag::ByteArray(a) if index < a.len() => {
            a.remove(index);
            true
        }
        NbtTag::IntArray(a) if index < a.len() => {
            a.remove(index);
            true
        }
        NbtTag::LongArray(a) if index < a.len() => {
            a.remove(index);
            true
        }
        _ => false,
    }
}

fn apply_delete(accessor: &Accessor, tag: &mut NbtTag) -> usize {
    match accessor {
        Accessor::Key(name) => match tag.as_compound_mut() {
            Some(c) => usize::from(c.remove(name).is_some()),
            None => 0,
        },
        Accessor::Index(i) => match tag {
            NbtTag::ByteArray(_) | NbtTag::IntArray(_) | NbtTag::LongArray(_) => {
                usize::from(remove_array_element(tag, *i))
            }
            _ => match tag.as_list_mut() {
                Some(l) => usize::from(l.remove(*i).is_some()),
                None => 0,
            },
        },
        Accessor::Wildcard => match tag {
            NbtTag::ByteArray(_) | NbtTag::IntArray(_) | NbtTag::LongArray(_) => {
                let n = array_len(tag).unwrap_or(0);
                for i in (0..n).rev() {
                    remove_array_element(tag, i);
                }
                n
            }
            _ => match tag.as_list_mut() {
                Some(l) => {
                    let n = l.len();
                    for i in (0..n).rev() {
                        l.remove(i);
                    }
                    n
                }
                None => 0,
            },
        },
        Accessor::Filter(entries) => match tag {
            NbtTag::List(list) => {
                let matches: Vec<usize> =
                    list.iter().enumerate().filter(|(_, t)| matches_filter(t, entries)).map(|(i, _)| i).collect();
                for &i in matches.iter().rev() {
                    list.remove(i);
                }
                matches.len()
            }
            NbtTag::Compound(_) if matches_filter(tag, entries) => {
                // There is no containing collection at this accessor to remove `tag` from;
                // a bare `{...}` filter only narrows an existing selection (§4.5).
                0
            }
            _ => 0,
        },
    }
}

fn matches_filter(tag: &NbtTag, entries: &[(String, NbtTag)]) -> bool {
    let Some(compound) = tag.as_compound() else { return false };
    entries.iter().all(|(key, expected)| compound.get(key) == Some(expected))
}

// ================================
//      Parsing
// ================================

struct PathParser<'a> {
    input: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> PathParser<'a> {
    fn skip_ws(&mut self) {
        while matches!(self.bytes.get(self.pos), Some(b) if b.is_ascii_whitespace()) {
            self.pos += 1;
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn parse_path(&mut self) -> Result<Path, PathError> {
        let mut accessors = Vec::new();
        self.skip_ws();

        loop {
            self.skip_ws();
            match self.peek() {
                None => break,
                Some(b'.') => {
                    self.pos += 1;
                    accessors.push(Accessor::Key(self.parse_key()?));
                }
                Some(b'[') => accessors.extend(self.parse_bracket()?),
                Some(b'{') => accessors.push(Accessor::Filter(self.parse_filter_body()?)),
                Some(b',') | Some(b')') => break,
                _ => {
                    let key = self.parse_key()?;
                    accessors.push(Accessor::Key(key));
                    if self.peek() == Some(b'{') {
                        accessors.push(Accessor::Filter(self.parse_filter_body()?));
                    }
                }
            }
        }

        Ok(Path { accessors })
    }

    fn parse_bracket(&mut self) -> Result<Vec<Accessor>, PathError> {
        self.pos += 1; // '['
        self.skip_ws();
        match self.peek() {
            Some(b']') => {
                self.pos += 1;
                Ok(vec![Accessor::Wildcard])
            }
            Some(b'{') => {
                let entries = self.parse_filter_body()?;
                self.skip_ws();
                self.expect(b']')?;
                Ok(vec![Accessor::Filter(entries)])
            }
            Some(c) if c.is_ascii_digit() => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
                    self.pos += 1;
                }
                let index: usize = self.input[start..self.pos]
                    .parse()
                    .map_err(|_| PathError::at(self.input, start, "invalid list index"))?;
                self.skip_ws();
                self.expect(b']')?;
                Ok(vec![Accessor::Index(index)])
            }
            _ => Err(PathError::at(self.input, self.pos, "expected ']', '{', or a non-negative integer")),
        }
    }

    fn parse_filter_body(&mut self) -> Result<Vec<(String, NbtTag)>, PathError> {
        self.expect(b'{')?;
        let mut entries = Vec::new();
        self.skip_ws();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            return Ok(entries);
        }
        loop {
            self.skip_ws();
            let key = self.parse_key()?;
            self.skip_ws();
            self.expect(b':')?;
            self.skip_ws();
            let value = self.parse_filter_value()?;
            entries.push((key, value));
            self.skip_ws();
            match self.peek() {
                Some(b',') => {
                    self.pos += 1;
                }
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                _ => return Err(PathError::at(self.input, self.pos, "expected ',' or '}' in filter")),
            }
        }
        Ok(entries)
    }

    fn parse_filter_value(&mut self) -> Result<NbtTag, PathError> {
        let start = self.pos;
        let mut depth = 0i32;
        loop {
            match self.peek() {
                None => break,
                Some(b'{' | b'[') => {
                    depth += 1;
                    self.pos += 1;
                }
                Some(b'}' | b']') if depth > 0 => {
                    depth -= 1;
                    self.pos += 1;
                }
                Some(b'}' | b']') => break,
                Some(b',') if depth == 0 => break,
                Some(b'"' | b'\'') => self.skip_quoted()?,
                _ => self.pos += 1,
            }
        }
        let text = &self.input[start..self.pos];
        crate::snbt::parse_any(text.trim(), crate::settings::SnbtParseOptions::default())
            .map_err(|e| PathError::at(self.input, start, format!("invalid filter value: {e}")))
    }

    fn skip_quoted(&mut self) -> Result<(), PathError> {
        let quote = self.peek().expect("caller checked");
        self.pos += 1;
        loop {
            match self.peek() {
                None => return Err(PathError::at(self.input, self.pos, "unmatched quote")),
                Some(b'\\') => self.pos += 2,
                Some(c) if c == quote => {
                    self.pos += 1;
                    return Ok(());
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn parse_key(&mut self) -> Result<String, PathError> {
        self.skip_ws();
        match self.peek() {
            Some(b'"' | b'\'') => {
                let quote = self.peek().expect("checked");
                let start = self.pos;
                self.skip_quoted()?;
                let raw = &self.input[start + 1..self.pos - 1];
                Ok(unescape(raw, quote as char))
            }
            _ => {
                let start = self.pos;
                while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || matches!(c, b'_' | b'-')) {
                    self.pos += 1;
                }
                if self.pos == start {
                    return Err(PathError::at(self.input, start, "expected a compound key"));
                }
                Ok(self.input[start..self.pos].to_owned())
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), PathError> {
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(PathError::at(self.input, self.pos, format!("expected '{}'", byte as char)))
        }
    }
}

fn unescape(raw: &str, quote: char) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(c) if c == quote => out.push(c),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tag::NbtCompound;

    fn sample() -> NbtTag {
        let mut a0 = NbtCompound::new();
        a0.insert("b", 1i32);
        a0.insert("c", 2i32);
        let mut a1 = NbtCompound::new();
        a1.insert("b", 3i32);
        a1.insert("c", 4i32);
        let mut root = NbtCompound::new();
        root.insert("a", NbtTag::List(vec![NbtTag::Compound(a0), NbtTag::Compound(a1)].into()));
        NbtTag::Compound(root)
    }

    fn array_sample() -> NbtTag {
        let mut root = NbtCompound::new();
        root.insert("bytes", NbtTag::ByteArray(vec![1, 2, 3]));
        root.insert("ints", NbtTag::IntArray(vec![10, 20, 30]));
        root.insert("longs", NbtTag::LongArray(vec![100, 200, 300]));
        NbtTag::Compound(root)
    }

    #[test]
    fn indexed_accessor_selects_one_element() {
        let root = sample();
        let path = Path::parse("a[0].b").unwrap();
        assert_eq!(path.get_all(&root), vec![NbtTag::Int(1)]);
    }

    #[test]
    fn wildcard_selects_every_element() {
        let root = sample();
        let path = Path::parse("a[].b").unwrap();
        assert_eq!(path.get_all(&root), vec![NbtTag::Int(1), NbtTag::Int(3)]);
    }

    #[test]
    fn filter_narrows_to_matching_compounds() {
        let root = sample();
        let path = Path::parse("a[{b:3}].c").unwrap();
        assert_eq!(path.get_all(&root), vec![NbtTag::Int(4)]);
    }

    #[test]
    fn set_all_replaces_every_match() {
        let mut root = sample();
        let path = Path::parse("a[].b").unwrap();
        let replaced = path.set_all(&mut root, NbtTag::Int(99));
        assert_eq!(replaced, 2);
        assert_eq!(path.get_all(&root), vec![NbtTag::Int(99), NbtTag::Int(99)]);
    }

    #[test]
    fn delete_all_removes_in_reverse_order() {
        let mut root = sample();
        let path = Path::parse("a[]").unwrap();
        let removed = path.delete_all(&mut root);
        assert_eq!(removed, 2);
        assert!(root.as_compound().unwrap().get("a").unwrap().as_list().unwrap().is_empty());
    }

    #[test]
    fn find_returns_first_match() {
        let root = sample();
        let path = Path::parse("a[].c").unwrap();
        assert_eq!(path.find(&root), Some(NbtTag::Int(2)));
    }

    #[test]
    fn display_round_trips_through_parse() {
        let path = Path::parse("a[0].b").unwrap();
        let text = path.to_string();
        assert_eq!(Path::parse(&text).unwrap(), path);
    }

    #[test]
    fn empty_path_selects_root() {
        let root = sample();
        let path = Path::new();
        assert_eq!(path.get_all(&root), vec![root]);
    }

    #[test]
    fn join_concatenates_accessors() {
        let joined = Path::new().join(Path::parse("a.b").unwrap());
        assert_eq!(joined, Path::parse("a.b").unwrap());
    }

    #[test]
    fn wildcard_selects_every_array_element() {
        let root = array_sample();
        assert_eq!(
            Path::parse("bytes[]").unwrap().get_all(&root),
            vec![NbtTag::Byte(1), NbtTag::Byte(2), NbtTag::Byte(3)]
        );
        assert_eq!(
            Path::parse("ints[]").unwrap().get_all(&root),
            vec![NbtTag::Int(10), NbtTag::Int(20), NbtTag::Int(30)]
        );
        assert_eq!(
            Path::parse("longs[]").unwrap().get_all(&root),
            vec![NbtTag::Long(100), NbtTag::Long(200), NbtTag::Long(300)]
        );
    }

    #[test]
    fn indexed_accessor_selects_one_array_element() {
        let root = array_sample();
        assert_eq!(Path::parse("ints[1]").unwrap().get_all(&root), vec![NbtTag::Int(20)]);
    }

    #[test]
    fn set_all_replaces_an_array_element() {
        let mut root = array_sample();
        let replaced = Path::parse("ints[1]").unwrap().set_all(&mut root, NbtTag::Int(99));
        assert_eq!(replaced, 1);
        assert_eq!(
            root.as_compound().unwrap().get("ints"),
            Some(&NbtTag::IntArray(vec![10, 99, 30]))
        );
    }

    #[test]
    fn set_all_over_array_wildcard_replaces_every_element() {
        let mut root = array_sample();
        let replaced = Path::parse("longs[]").unwrap().set_all(&mut root, NbtTag::Long(7));
        assert_eq!(replaced, 3);
        assert_eq!(
            root.as_compound().unwrap().get("longs"),
            Some(&NbtTag::LongArray(vec![7, 7, 7]))
        );
    }

    #[test]
    fn set_all_on_array_element_ignores_mismatched_value_type() {
        let mut root = array_sample();
        let replaced = Path::parse("ints[0]").unwrap().set_all(&mut root, NbtTag::String("nope".to_owned()));
        assert_eq!(replaced, 0);
        assert_eq!(root.as_compound().unwrap().get("ints"), Some(&NbtTag::IntArray(vec![10, 20, 30])));
    }

    #[test]
    fn delete_all_removes_one_array_element() {
        let mut root = array_sample();
        let removed = Path::parse("bytes[1]").unwrap().delete_all(&mut root);
        assert_eq!(removed, 1);
        assert_eq!(root.as_compound().unwrap().get("bytes"), Some(&NbtTag::ByteArray(vec![1, 3])));
    }

    #[test]
    fn delete_all_over_array_wildcard_empties_it() {
        let mut root = array_sample();
        let removed = Path::parse("ints[]").unwrap().delete_all(&mut root);
        assert_eq!(removed, 3);
        assert_eq!(root.as_compound().unwrap().get("ints"), Some(&NbtTag::IntArray(vec![])));
    }
}
