//! Schema-constrained compounds: a `key -> expected type` map that coerces numeric assignments to
//! their declared type and optionally rejects unknown keys (§4.7).

use thiserror::Error;

use crate::tag::{NbtCompound, NbtTag, NbtType};

/// An error encountered inserting into a [`SchemaCompound`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchemaError {
    #[error("key '{key}' is not declared in this schema")]
    UnknownKey { key: String },
    #[error("key '{key}' expected a {expected:?} but got a {found:?} value that cannot be coerced")]
    TypeMismatch { key: String, expected: NbtType, found: NbtType },
}

/// Declares the expected [`NbtType`] for each key a [`SchemaCompound`] will hold.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    fields: Vec<(String, NbtType)>,
    strict: bool,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares that `key` must hold a value of type `kind`.
    pub fn require(mut self, key: impl Into<String>, kind: NbtType) -> Self {
        self.fields.push((key.into(), kind));
        self
    }

    /// In strict mode, [`SchemaCompound::insert`] rejects keys this schema doesn't declare.
    pub fn strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    fn expected(&self, key: &str) -> Option<NbtType> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, kind)| *kind)
    }
}

/// A Compound that coerces assignments according to a [`Schema`] (§4.7).
#[derive(Debug, Clone)]
pub struct SchemaCompound {
    schema: Schema,
    inner: NbtCompound,
}

impl SchemaCompound {
    pub fn new(schema: Schema) -> Self {
        Self { schema, inner: NbtCompound::new() }
    }

    pub fn inner(&self) -> &NbtCompound {
        &self.inner
    }

    pub fn into_inner(self) -> NbtCompound {
        self.inner
    }

    /// Inserts `tag` under `key`, coercing it to the schema's declared type for `key` when the
    /// types differ and a masking numeric conversion exists. Unknown keys are rejected in strict
    /// mode and passed through unexamined otherwise.
    pub fn insert(&mut self, key: impl Into<String>, tag: impl Into<NbtTag>) -> Result<Option<NbtTag>, SchemaError> {
        let key = key.into();
        let tag = tag.into();

        let Some(expected) = self.schema.expected(&key) else {
            if self.schema.strict {
                return Err(SchemaError::UnknownKey { key });
            }
            return Ok(self.inner.insert(key, tag));
        };

        if tag.tag_type() == expected {
            return Ok(self.inner.insert(key, tag));
        }

        match coerce(&tag, expected) {
            Some(coerced) => Ok(self.inner.insert(key, coerced)),
            None => Err(SchemaError::TypeMismatch { key, expected, found: tag.tag_type() }),
        }
    }
}

/// Narrows/widens a numeric scalar tag to `target`, masking via `as` the way integer conversions
/// do elsewhere in this crate's tag layer. Returns `None` for any non-numeric mismatch.
fn coerce(tag: &NbtTag, target: NbtType) -> Option<NbtTag> {
    let value: f64 = match tag {
        NbtTag::Byte(v) => f64::from(*v),
        NbtTag::Short(v) => f64::from(*v),
        NbtTag::Int(v) => f64::from(*v),
        NbtTag::Long(v) => *v as f64,
        NbtTag::Float(v) => f64::from(*v),
        NbtTag::Double(v) => *v,
        _ => return None,
    };
    // Masking integer conversions go through the original integer representation, not the f64
    // intermediate above, so large Long values narrow the same way `as i32` would rather than
    // losing low bits to floating-point rounding first.
    let as_i64 = match tag {
        NbtTag::Byte(v) => i64::from(*v),
        NbtTag::Short(v) => i64::from(*v),
        NbtTag::Int(v) => i64::from(*v),
        NbtTag::Long(v) => *v,
        NbtTag::Float(v) => *v as i64,
        NbtTag::Double(v) => *v as i64,
        _ => return None,
    };

    Some(match target {
        NbtType::Byte => NbtTag::Byte(as_i64 as i8),
        NbtType::Short => NbtTag::Short(as_i64 as i16),
        NbtType::Int => NbtTag::Int(as_i64 as i32),
        NbtType::Long => NbtTag::Long(as_i64),
        NbtType::Float => NbtTag::Float(value as f32),
        NbtType::Double => NbtTag::Double(value),
        _ => return None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Schema {
        Schema::new().require("id", NbtType::Int).require("health", NbtType::Float)
    }

    #[test]
    fn coerces_matching_numeric_types() {
        let mut compound = SchemaCompound::new(schema());
        compound.insert("id", 5i32).unwrap();
        assert_eq!(compound.inner().get("id"), Some(&NbtTag::Int(5)));
    }

    #[test]
    fn narrows_via_masking_cast() {
        let mut compound = SchemaCompound::new(schema());
        compound.insert("id", 300i64).unwrap();
        assert_eq!(compound.inner().get("id"), Some(&NbtTag::Int(300)));
    }

    #[test]
    fn widens_int_to_float() {
        let mut compound = SchemaCompound::new(schema());
        compound.insert("health", 20i32).unwrap();
        assert_eq!(compound.inner().get("health"), Some(&NbtTag::Float(20.0)));
    }

    #[test]
    fn rejects_non_numeric_mismatch() {
        let mut compound = SchemaCompound::new(schema());
        let err = compound.insert("id", "not a number").unwrap_err();
        assert!(matches!(err, SchemaError::TypeMismatch { .. }));
    }

    #[test]
    fn strict_mode_rejects_unknown_keys() {
        let mut compound = SchemaCompound::new(schema().strict(true));
        let err = compound.insert("extra", 1i32).unwrap_err();
        assert!(matches!(err, SchemaError::UnknownKey { .. }));
    }

    #[test]
    fn non_strict_mode_passes_unknown_keys_through() {
        let mut compound = SchemaCompound::new(schema());
        compound.insert("extra", 1i32).unwrap();
        assert_eq!(compound.inner().get("extra"), Some(&NbtTag::Int(1)));
    }
}
