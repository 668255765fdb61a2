//! SNBT (stringified NBT): a recursive-descent reader and a mode-aware writer for the textual
//! representation of NBT trees.

mod lexer;
mod parser;
pub mod ser;

pub use lexer::{allowed_unquoted, starts_unquoted_number};
use lexer::{line_col, Lexer};
use thiserror::Error;

use crate::{
    settings::SnbtParseOptions,
    tag::{NbtCompound, NbtTag},
};

/// An error encountered while lexing or parsing SNBT text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SnbtError {
    #[error("{line}:{col}: {message}")]
    Syntax { line: usize, col: usize, message: String },
    #[error("{line}:{col}: numeric literal '{literal}' is out of range for its type")]
    NumericRange { line: usize, col: usize, literal: String },
    #[error("{line}:{col}: list elements do not share a single tag type")]
    ListHeterogeneous { line: usize, col: usize },
}

impl SnbtError {
    fn at(input: &str, index: usize, message: impl Into<String>) -> Self {
        let (line, col) = line_col(input, index);
        Self::Syntax { line, col, message: message.into() }
    }

    fn unexpected(input: &str, index: usize, expected: &str) -> Self {
        let segment = Self::segment(input, index);
        Self::at(input, index, format!("unexpected token near '{segment}', expected {expected}"))
    }

    fn unexpected_eof(expected: &str) -> Self {
        Self::Syntax { line: 0, col: 0, message: format!("reached end of input but expected {expected}") }
    }

    fn unmatched_quote(input: &str, index: usize) -> Self {
        Self::at(input, index, "unmatched quote")
    }

    fn invalid_character(input: &str, index: usize, ch: char) -> Self {
        Self::at(input, index, format!("character '{ch}' is not allowed here"))
    }

    fn numeric_range(input: &str, index: usize, literal: &str) -> Self {
        let (line, col) = line_col(input, index);
        Self::NumericRange { line, col, literal: literal.to_owned() }
    }

    fn list_heterogeneous(input: &str, index: usize) -> Self {
        let (line, col) = line_col(input, index);
        Self::ListHeterogeneous { line, col }
    }

    fn segment(input: &str, index: usize) -> &str {
        let end = input[index..].char_indices().nth(15).map(|(i, _)| index + i).unwrap_or(input.len());
        &input[index..end]
    }
}

/// Parses `text` into a tag of any type (a bare value, list, array, or compound).
pub fn parse_any(text: &str, opts: SnbtParseOptions) -> Result<NbtTag, SnbtError> {
    let mut lexer = Lexer::new(text);
    parser::parse_value(&mut lexer, opts, 0)
}

/// Parses `text`, requiring the outermost tag to be a compound.
pub fn parse_compound(text: &str, opts: SnbtParseOptions) -> Result<NbtCompound, SnbtError> {
    match parse_any(text, opts)? {
        NbtTag::Compound(c) => Ok(c),
        _ => Err(SnbtError::at(text, 0, "expected a compound tag at the top level")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_nested_compound() {
        let text = r#"{name: "eve", pos: [1.0d, 2.0d, 3.0d], tags: ["a", "b"]}"#;
        let tag = parse_any(text, SnbtParseOptions::default()).unwrap();
        let compound = tag.as_compound().unwrap();
        assert_eq!(compound.get("name"), Some(&NbtTag::String("eve".to_owned())));
        assert!(matches!(compound.get("pos"), Some(NbtTag::List(_))));
    }

    #[test]
    fn requires_compound_at_top_level() {
        assert!(parse_compound("5", SnbtParseOptions::default()).is_err());
    }
}
