//! Literal and comment parsing for the mlc lexer
//!
//! - Integer literals: decimal digits
//! - Float literals: digits '.' digits? exponent? | digits exponent
//! - String literals: '"' (char | escape)* '"' with \n \t \r \\ \" escapes
//! - Comments: (* ... *), which may nest

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{char, digit0, digit1, one_of},
    combinator::{map_res, opt, recognize},
    error::{Error, ErrorKind},
    sequence::tuple,
};

use super::Token;

// Exponent: (e|E)[+|-]digits
fn exponent(input: &str) -> IResult<&str, &str> {
    recognize(tuple((one_of("eE"), opt(one_of("+-")), digit1)))(input)
}

// Float: digits '.' digits? exponent? | digits exponent
pub fn parse_float_literal(input: &str) -> IResult<&str, Token> {
    map_res(
        recognize(tuple((
            digit1,
            alt((
                recognize(tuple((char('.'), digit0, opt(exponent)))),
                exponent,
            )),
        ))),
        |s: &str| s.parse::<f64>().map(Token::FloatLiteral),
    )(input)
}

pub fn parse_int_literal(input: &str) -> IResult<&str, Token> {
    map_res(digit1, |s: &str| s.parse::<i64>().map(Token::IntLiteral))(input)
}

/// String literal with escapes. Fails without consuming anything when the
/// closing quote is missing.
pub fn parse_string_literal(input: &str) -> IResult<&str, Token> {
    let (body, _) = char::<_, Error<&str>>('"')(input)?;
    let mut value = String::new();
    let mut chars = body.char_indices();

    while let Some((i, c)) = chars.next() {
        match c {
            '"' => return Ok((&body[i + 1..], Token::StringLiteral(value))),
            '\\' => {
                let escaped = match chars.next() {
                    Some((_, 'n')) => '\n',
                    Some((_, 't')) => '\t',
                    Some((_, 'r')) => '\r',
                    Some((_, '\\')) => '\\',
                    Some((_, '"')) => '"',
                    _ => break,
                };
                value.push(escaped);
            }
            '\n' => break,
            c => value.push(c),
        }
    }

    Err(nom::Err::Error(Error::new(input, ErrorKind::Char)))
}

/// Block comment, which may nest. An unterminated comment is a hard failure
/// so no other token parser gets to read `(` from it.
pub fn parse_comment(input: &str) -> IResult<&str, Token> {
    let (mut rest, _) = tag::<_, _, Error<&str>>("(*")(input)?;
    let mut depth = 1usize;

    while depth > 0 {
        if let Some(after) = rest.strip_prefix("*)") {
            depth -= 1;
            rest = after;
        } else if let Some(after) = rest.strip_prefix("(*") {
            depth += 1;
            rest = after;
        } else if let Some(c) = rest.chars().next() {
            rest = &rest[c.len_utf8()..];
        } else {
            return Err(nom::Err::Failure(Error::new(input, ErrorKind::TakeUntil)));
        }
    }

    // Strip the outermost "(*" and "*)"
    let consumed = input.len() - rest.len();
    let text = &input[2..consumed - 2];
    Ok((rest, Token::Comment(text.trim().to_string())))
}
