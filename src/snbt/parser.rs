//! Recursive-descent parser: token stream → [`NbtTag`] tree.

use super::{
    lexer::{allowed_unquoted, starts_unquoted_number, Lexer, Token, TokenData},
    SnbtError,
};
use crate::{
    settings::SnbtParseOptions,
    tag::{NbtCompound, NbtList, NbtTag},
};

pub fn parse_value(lexer: &mut Lexer<'_>, opts: SnbtParseOptions, depth: u32) -> Result<NbtTag, SnbtError> {
    let Some(td) = lexer.next()? else {
        return Err(SnbtError::unexpected_eof("a value"));
    };
    parse_value_from(lexer, td, opts, depth)
}

fn parse_value_from(
    lexer: &mut Lexer<'_>,
    td: TokenData,
    opts: SnbtParseOptions,
    depth: u32,
) -> Result<NbtTag, SnbtError> {
    if depth > opts.depth_limit.limit() {
        return Err(SnbtError::at(lexer.raw(), td.index, "exceeded depth limit for nested compound and list tags"));
    }

    match td.token {
        Token::OpenCurly => parse_compound(lexer, opts, depth).map(NbtTag::Compound),
        Token::OpenSquare => parse_list(lexer, opts, depth),
        Token::Quoted(s) => Ok(NbtTag::String(s)),
        Token::Bare(s) => parse_bare(lexer.raw(), td.index, &s),
        other => Err(SnbtError::unexpected(lexer.raw(), td.index, &format!("a value, got {other:?}"))),
    }
}

fn parse_bare(input: &str, index: usize, s: &str) -> Result<NbtTag, SnbtError> {
    match parse_numeric_bare(input, index, s)? {
        Some(tag) => Ok(tag),
        None => Ok(NbtTag::String(s.to_owned())),
    }
}

/// Attempts to interpret `s` as a numeric literal, per the disambiguation rules: returns `Ok(None)`
/// when `s` isn't numeric-shaped at all (falls back to a bare string), and `Err` only for a
/// genuinely out-of-range literal with an explicit suffix or decimal form.
fn parse_numeric_bare(input: &str, index: usize, s: &str) -> Result<Option<NbtTag>, SnbtError> {
    if s == "true" {
        return Ok(Some(NbtTag::Byte(1)));
    }
    if s == "false" {
        return Ok(Some(NbtTag::Byte(0)));
    }

    let Some(first) = s.chars().next() else { return Ok(None) };
    if !starts_unquoted_number(first) {
        return Ok(None);
    }

    let last = s.chars().last().expect("non-empty, checked above");
    let (body, suffix) = if matches!(last, 'b' | 'B' | 's' | 'S' | 'l' | 'L' | 'f' | 'F' | 'd' | 'D') && s.len() > 1 {
        (&s[..s.len() - last.len_utf8()], Some(last))
    } else {
        (s, None)
    };

    if !is_number_literal(body) {
        return Ok(None);
    }

    let is_float_syntax = body.contains('.') || body.to_ascii_lowercase().contains('e');

    let range_err = || SnbtError::numeric_range(input, index, s);

    let tag = match suffix {
        Some('b' | 'B') if !is_float_syntax => NbtTag::Byte(body.parse().map_err(|_| range_err())?),
        Some('s' | 'S') if !is_float_syntax => NbtTag::Short(body.parse().map_err(|_| range_err())?),
        Some('l' | 'L') if !is_float_syntax => NbtTag::Long(body.parse().map_err(|_| range_err())?),
        Some('b' | 'B' | 's' | 'S' | 'l' | 'L') => return Ok(None), // int suffix on float syntax: not a number
        Some('f' | 'F') => NbtTag::Float(body.parse().map_err(|_| range_err())?),
        Some('d' | 'D') => NbtTag::Double(body.parse().map_err(|_| range_err())?),
        Some(_) => unreachable!("suffix is restricted to the chars matched above"),
        None if is_float_syntax => NbtTag::Double(body.parse().map_err(|_| range_err())?),
        None => match body.parse::<i32>() {
            Ok(v) => NbtTag::Int(v),
            Err(_) => NbtTag::Long(body.parse().map_err(|_| range_err())?),
        },
    };

    Ok(Some(tag))
}

/// Syntactic (not range) check: an optional sign, digits, an optional `.digits`, and an optional
/// exponent, with at least one digit somewhere in the mantissa.
fn is_number_literal(s: &str) -> bool {
    let mut chars = s.chars().peekable();
    let mut saw_digit = false;

    if matches!(chars.peek(), Some('+' | '-')) {
        chars.next();
    }
    while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
        chars.next();
        saw_digit = true;
    }
    if chars.peek() == Some(&'.') {
        chars.next();
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_digit = true;
        }
    }
    if matches!(chars.peek(), Some('e' | 'E')) {
        chars.next();
        if matches!(chars.peek(), Some('+' | '-')) {
            chars.next();
        }
        let mut saw_exp_digit = false;
        while matches!(chars.peek(), Some(c) if c.is_ascii_digit()) {
            chars.next();
            saw_exp_digit = true;
        }
        if !saw_exp_digit {
            return false;
        }
    }

    saw_digit && chars.next().is_none()
}

fn parse_compound(lexer: &mut Lexer<'_>, opts: SnbtParseOptions, depth: u32) -> Result<NbtCompound, SnbtError> {
    let mut compound = NbtCompound::new();

    loop {
        let Some(td) = lexer.next()? else {
            return Err(SnbtError::unexpected_eof("a compound key or '}'"));
        };

        match td.token {
            Token::ClosedCurly => return Ok(compound),
            Token::Quoted(key) | Token::Bare(key) => {
                lexer.expect(Token::Colon, "':'")?;
                let value = parse_value(lexer, opts, depth + 1)?;
                compound.insert(key, value);

                match lexer.next()? {
                    Some(TokenData { token: Token::Comma, .. }) => {
                        // Trailing comma before '}' is accepted; loop back to check.
                        if let Some(TokenData { token: Token::ClosedCurly, .. }) = lexer.peek()? {
                            lexer.next()?;
                            return Ok(compound);
                        }
                    }
                    Some(TokenData { token: Token::ClosedCurly, .. }) => return Ok(compound),
                    Some(other) => return Err(SnbtError::unexpected(lexer.raw(), other.index, "',' or '}'")),
                    None => return Err(SnbtError::unexpected_eof("',' or '}'")),
                }
            }
            other => return Err(SnbtError::unexpected(lexer.raw(), td.index, &format!("a compound key, got {other:?}"))),
        }
    }
}

fn parse_list(lexer: &mut Lexer<'_>, opts: SnbtParseOptions, depth: u32) -> Result<NbtTag, SnbtError> {
    match lexer.peek()? {
        Some(TokenData { token: Token::ClosedSquare, .. }) => {
            lexer.next()?;
            return Ok(NbtTag::List(NbtList::new()));
        }
        Some(TokenData { token: Token::Bare(ref s), .. }) if matches!(s.as_str(), "B" | "b" | "I" | "i" | "L" | "l") => {
            let kind_token = lexer.next()?.expect("peeked Some above");
            if let Some(TokenData { token: Token::Semicolon, .. }) = lexer.peek()? {
                lexer.next()?;
                let Token::Bare(letter) = kind_token.token else { unreachable!() };
                return parse_array(lexer, &letter);
            }
            // Not actually an array marker; re-enter as the first element of a plain list.
            let first = parse_value_from(lexer, kind_token, opts, depth + 1)?;
            return parse_tag_list(lexer, first, opts, depth);
        }
        _ => {}
    }

    let first = parse_value(lexer, opts, depth + 1)?;
    parse_tag_list(lexer, first, opts, depth)
}

fn parse_tag_list(lexer: &mut Lexer<'_>, first: NbtTag, opts: SnbtParseOptions, depth: u32) -> Result<NbtTag, SnbtError> {
    let kind = std::mem::discriminant(&first);
    let mut list = NbtList::new();
    list.push(first);

    loop {
        match lexer.next()? {
            Some(TokenData { token: Token::ClosedSquare, .. }) => return Ok(NbtTag::List(list)),
            Some(TokenData { token: Token::Comma, index }) => {
                if let Some(TokenData { token: Token::ClosedSquare, .. }) = lexer.peek()? {
                    lexer.next()?;
                    return Ok(NbtTag::List(list));
                }
                let element = parse_value(lexer, opts, depth + 1)?;
                if std::mem::discriminant(&element) != kind {
                    return Err(SnbtError::list_heterogeneous(lexer.raw(), index));
                }
                list.push(element);
            }
            Some(other) => return Err(SnbtError::unexpected(lexer.raw(), other.index, "',' or ']'")),
            None => return Err(SnbtError::unexpected_eof("',' or ']'")),
        }
    }
}

#[derive(Clone, Copy)]
enum ArrayKind {
    Byte,
    Int,
    Long,
}

fn parse_array(lexer: &mut Lexer<'_>, letter: &str) -> Result<NbtTag, SnbtError> {
    let kind = match letter {
        "B" | "b" => ArrayKind::Byte,
        "I" | "i" => ArrayKind::Int,
        "L" | "l" => ArrayKind::Long,
        _ => unreachable!("checked by caller"),
    };

    let mut bytes = Vec::new();
    let mut ints = Vec::new();
    let mut longs = Vec::new();

    loop {
        let Some(td) = lexer.next()? else {
            return Err(SnbtError::unexpected_eof("a numeric literal, ',', or ']'"));
        };
        match td.token {
            Token::ClosedSquare => break,
            Token::Bare(s) => {
                match parse_array_element(lexer.raw(), td.index, &s, kind)? {
                    ArrayElement::Byte(v) => bytes.push(v),
                    ArrayElement::Int(v) => ints.push(v),
                    ArrayElement::Long(v) => longs.push(v),
                }
                match lexer.next()? {
                    Some(TokenData { token: Token::ClosedSquare, .. }) => break,
                    Some(TokenData { token: Token::Comma, .. }) => {
                        if let Some(TokenData { token: Token::ClosedSquare, .. }) = lexer.peek()? {
                            lexer.next()?;
                            break;
                        }
                    }
                    Some(other) => return Err(SnbtError::unexpected(lexer.raw(), other.index, "',' or ']'")),
                    None => return Err(SnbtError::unexpected_eof("',' or ']'")),
                }
            }
            _ => return Err(SnbtError::unexpected(lexer.raw(), td.index, "a numeric literal")),
        }
    }

    Ok(match kind {
        ArrayKind::Byte => NbtTag::ByteArray(bytes),
        ArrayKind::Int => NbtTag::IntArray(ints),
        ArrayKind::Long => NbtTag::LongArray(longs),
    })
}

enum ArrayElement {
    Byte(i8),
    Int(i32),
    Long(i64),
}

fn parse_array_element(input: &str, index: usize, s: &str, kind: ArrayKind) -> Result<ArrayElement, SnbtError> {
    let last = s.chars().last().unwrap_or('\0');
    let (body, suffix) = if matches!(last, 'b' | 'B' | 'l' | 'L') && s.len() > 1 {
        (&s[..s.len() - last.len_utf8()], Some(last))
    } else {
        (s, None)
    };

    if !is_number_literal(body) {
        return Err(SnbtError::list_heterogeneous(input, index));
    }

    let range_err = || SnbtError::numeric_range(input, index, s);

    match (kind, suffix) {
        (ArrayKind::Byte, None | Some('b' | 'B')) => body.parse::<i8>().map(ArrayElement::Byte).map_err(|_| range_err()),
        (ArrayKind::Int, None) => body.parse::<i32>().map(ArrayElement::Int).map_err(|_| range_err()),
        (ArrayKind::Long, None | Some('l' | 'L')) => body.parse::<i64>().map(ArrayElement::Long).map_err(|_| range_err()),
        _ => Err(SnbtError::list_heterogeneous(input, index)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> NbtTag {
        let mut lexer = Lexer::new(s);
        parse_value(&mut lexer, SnbtParseOptions::default(), 0).unwrap()
    }

    #[test]
    fn disambiguates_int_vs_long() {
        assert_eq!(parse("5"), NbtTag::Int(5));
        assert_eq!(parse("2147483648"), NbtTag::Long(2147483648));
        assert_eq!(parse("5L"), NbtTag::Long(5));
        assert_eq!(parse("5b"), NbtTag::Byte(5));
        assert_eq!(parse("1.5"), NbtTag::Double(1.5));
        assert_eq!(parse("1.5f"), NbtTag::Float(1.5));
    }

    #[test]
    fn bools_and_bare_strings() {
        assert_eq!(parse("true"), NbtTag::Byte(1));
        assert_eq!(parse("hello"), NbtTag::String("hello".to_owned()));
    }

    #[test]
    fn numeric_range_errors() {
        let mut lexer = Lexer::new("500b");
        let err = parse_value(&mut lexer, SnbtParseOptions::default(), 0).unwrap_err();
        assert!(matches!(err, SnbtError::NumericRange { .. }));
    }

    #[test]
    fn heterogeneous_list_errors() {
        let mut lexer = Lexer::new("[1, \"a\"]");
        let err = parse_value(&mut lexer, SnbtParseOptions::default(), 0).unwrap_err();
        assert!(matches!(err, SnbtError::ListHeterogeneous { .. }));
    }

    #[test]
    fn parses_int_array() {
        let tag = parse("[I; 1, 2, 3]");
        assert_eq!(tag, NbtTag::IntArray(vec![1, 2, 3]));
    }

    #[test]
    fn trailing_comma_accepted() {
        let tag = parse("{a: 1,}");
        assert_eq!(tag.as_compound().unwrap().get("a"), Some(&NbtTag::Int(1)));
    }
}
