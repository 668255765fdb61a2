//! SNBT serialization: emits compact, default, or pretty-printed text for a tag tree.

use std::fmt::Write as _;

use super::lexer::allowed_unquoted;
use crate::{
    settings::{SnbtWriteMode, SnbtWriteOptions},
    tag::{NbtCompound, NbtList, NbtTag},
};

/// Serializes `tag` to SNBT text using `options`.
pub fn to_snbt(tag: &NbtTag, options: &SnbtWriteOptions) -> String {
    let mut out = String::new();
    write_tag(&mut out, tag, &options.mode, 0);
    out
}

fn write_tag(out: &mut String, tag: &NbtTag, mode: &SnbtWriteMode, depth: usize) {
    match tag {
        NbtTag::Byte(v) => write!(out, "{v}b").unwrap(),
        NbtTag::Short(v) => write!(out, "{v}s").unwrap(),
        NbtTag::Int(v) => write!(out, "{v}").unwrap(),
        NbtTag::Long(v) => write!(out, "{v}L").unwrap(),
        NbtTag::Float(v) => write!(out, "{v}f").unwrap(),
        NbtTag::Double(v) => write!(out, "{v}d").unwrap(),
        NbtTag::ByteArray(items) => write_prim_array(out, "B", items.iter().map(|v| format!("{v}"))),
        NbtTag::IntArray(items) => write_prim_array(out, "I", items.iter().map(|v| format!("{v}"))),
        NbtTag::LongArray(items) => write_prim_array(out, "L", items.iter().map(|v| format!("{v}"))),
        NbtTag::String(s) => write_quoted(out, s),
        NbtTag::List(list) => write_list(out, list, mode, depth),
        NbtTag::Compound(compound) => write_compound(out, compound, mode, depth),
    }
}

fn write_prim_array(out: &mut String, letter: &str, items: impl Iterator<Item = String>) {
    out.push('[');
    out.push_str(letter);
    out.push(';');
    for (i, item) in items.enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push(' ');
        out.push_str(&item);
    }
    out.push(']');
}

fn write_list(out: &mut String, list: &NbtList, mode: &SnbtWriteMode, depth: usize) {
    if list.is_empty() {
        out.push_str("[]");
        return;
    }

    match mode {
        SnbtWriteMode::Pretty { indent } => {
            out.push_str("[\n");
            for (i, element) in list.iter().enumerate() {
                push_indent(out, indent, depth + 1);
                write_tag(out, element, mode, depth + 1);
                if i + 1 < list.len() {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, indent, depth);
            out.push(']');
        }
        _ => {
            out.push('[');
            for (i, element) in list.iter().enumerate() {
                if i > 0 {
                    push_separator(out, mode);
                }
                write_tag(out, element, mode, depth);
            }
            out.push(']');
        }
    }
}

fn write_compound(out: &mut String, compound: &NbtCompound, mode: &SnbtWriteMode, depth: usize) {
    if compound.is_empty() {
        out.push_str("{}");
        return;
    }

    match mode {
        SnbtWriteMode::Pretty { indent } => {
            out.push_str("{\n");
            let len = compound.len();
            for (i, (key, value)) in compound.iter().enumerate() {
                push_indent(out, indent, depth + 1);
                write_key(out, key);
                out.push_str(": ");
                write_tag(out, value, mode, depth + 1);
                if i + 1 < len {
                    out.push(',');
                }
                out.push('\n');
            }
            push_indent(out, indent, depth);
            out.push('}');
        }
        _ => {
            out.push('{');
            for (i, (key, value)) in compound.iter().enumerate() {
                if i > 0 {
                    push_separator(out, mode);
                }
                write_key(out, key);
                out.push(':');
                if matches!(mode, SnbtWriteMode::Default) {
                    out.push(' ');
                }
                write_tag(out, value, mode, depth);
            }
            out.push('}');
        }
    }
}

fn push_separator(out: &mut String, mode: &SnbtWriteMode) {
    out.push(',');
    if matches!(mode, SnbtWriteMode::Default) {
        out.push(' ');
    }
}

fn push_indent(out: &mut String, indent: &str, depth: usize) {
    for _ in 0..depth {
        out.push_str(indent);
    }
}

fn write_key(out: &mut String, key: &str) {
    if !key.is_empty() && key.chars().all(allowed_unquoted) {
        out.push_str(key);
    } else {
        write_quoted(out, key);
    }
}

/// Quotes `s`, preferring `"` and falling back to `'` when `s` contains `"` but not `'`.
fn write_quoted(out: &mut String, s: &str) {
    let quote = if s.contains('"') && !s.contains('\'') { '\'' } else { '"' };
    out.push(quote);
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            '\n' => out.push_str("\\n"),
            c => out.push(c),
        }
    }
    out.push(quote);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::SnbtWriteOptions;

    #[test]
    fn compact_has_no_whitespace() {
        let mut compound = NbtCompound::new();
        compound.insert("a", 1i32);
        compound.insert("b", NbtTag::List(NbtList::from(vec![2i32, 3i32])));
        let text = to_snbt(&NbtTag::Compound(compound), &SnbtWriteOptions::compact());
        assert_eq!(text, "{a:1,b:[2,3]}");
    }

    #[test]
    fn default_mode_has_single_spaces() {
        let mut compound = NbtCompound::new();
        compound.insert("a", 1i32);
        let text = to_snbt(&NbtTag::Compound(compound), &SnbtWriteOptions::default());
        assert_eq!(text, "{a: 1}");
    }

    #[test]
    fn pretty_mode_indents_per_level() {
        let mut inner = NbtCompound::new();
        inner.insert("x", 1i32);
        let mut outer = NbtCompound::new();
        outer.insert("inner", inner);
        let text = to_snbt(&NbtTag::Compound(outer), &SnbtWriteOptions::pretty("  "));
        assert_eq!(text, "{\n  inner: {\n    x: 1\n  }\n}");
    }

    #[test]
    fn strings_quote_with_minimal_escaping() {
        let mut out = String::new();
        write_quoted(&mut out, "has \"quotes\"");
        assert_eq!(out, "'has \"quotes\"'");
    }
}
