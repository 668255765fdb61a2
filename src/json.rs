//! JSON projection: a lossy, one-directional view of a tag tree as a `serde_json::Value` (§6).
//! Tag type information does not survive the trip; Long/LongArray values outside the range a JSON
//! number can represent exactly (±2^53) may lose precision, matching `serde_json`'s own handling
//! of large integers under its default (non-`arbitrary_precision`) number representation.

use serde_json::{Map, Number, Value};

use crate::tag::{NbtCompound, NbtList, NbtTag};

/// Projects `tag` to a JSON value. Scalars become JSON numbers/strings/booleans-as-numbers
/// (Byte keeps its numeric value rather than becoming a JSON `bool`, since NBT has no boolean
/// tag), arrays and lists become JSON arrays, and compounds become JSON objects.
pub fn to_json(tag: &NbtTag) -> Value {
    match tag {
        NbtTag::Byte(v) => Value::Number(Number::from(*v)),
        NbtTag::Short(v) => Value::Number(Number::from(*v)),
        NbtTag::Int(v) => Value::Number(Number::from(*v)),
        NbtTag::Long(v) => Value::Number(Number::from(*v)),
        NbtTag::Float(v) => Number::from_f64(f64::from(*v)).map(Value::Number).unwrap_or(Value::Null),
        NbtTag::Double(v) => Number::from_f64(*v).map(Value::Number).unwrap_or(Value::Null),
        NbtTag::ByteArray(items) => Value::Array(items.iter().map(|v| Value::Number(Number::from(*v))).collect()),
        NbtTag::IntArray(items) => Value::Array(items.iter().map(|v| Value::Number(Number::from(*v))).collect()),
        NbtTag::LongArray(items) => Value::Array(items.iter().map(|v| Value::Number(Number::from(*v))).collect()),
        NbtTag::String(s) => Value::String(s.clone()),
        NbtTag::List(list) => list_to_json(list),
        NbtTag::Compound(compound) => compound_to_json(compound),
    }
}

fn list_to_json(list: &NbtList) -> Value {
    Value::Array(list.iter().map(to_json).collect())
}

fn compound_to_json(compound: &NbtCompound) -> Value {
    let mut map = Map::with_capacity(compound.len());
    for (key, value) in compound.iter() {
        map.insert(key.clone(), to_json(value));
    }
    Value::Object(map)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn projects_scalars_and_strings() {
        assert_eq!(to_json(&NbtTag::Int(5)), Value::Number(Number::from(5)));
        assert_eq!(to_json(&NbtTag::String("hi".to_owned())), Value::String("hi".to_owned()));
    }

    #[test]
    fn projects_compound_to_object() {
        let mut compound = NbtCompound::new();
        compound.insert("id", 5i32);
        let value = to_json(&NbtTag::Compound(compound));
        assert_eq!(value, serde_json::json!({"id": 5}));
    }

    #[test]
    fn projects_numeric_list_to_array() {
        let list = NbtList::from(vec![1i32, 2i32, 3i32]);
        let value = to_json(&NbtTag::List(list));
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }

    #[test]
    fn projects_int_array_to_array() {
        let value = to_json(&NbtTag::IntArray(vec![1, 2, 3]));
        assert_eq!(value, serde_json::json!([1, 2, 3]));
    }
}
