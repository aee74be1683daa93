//! Lexer for the mlc source language.
//!
//! `Lexer` produces tokens lazily, one per call to `next`, so callers can
//! consume a token stream while the rest of the source is still unread.
//! `tokenize` collects the whole stream and drops comments.

mod literal;

use std::fmt;

use nom::{
    IResult,
    branch::alt,
    bytes::complete::tag,
    character::complete::{alpha1, alphanumeric1, char, multispace1, satisfy},
    combinator::{map, not, recognize, value},
    multi::many0,
    sequence::{pair, terminated},
};
use thiserror::Error;

use crate::span::{LineOffsets, Span};
use literal::{parse_comment, parse_float_literal, parse_int_literal, parse_string_literal};

/// Token with source location information
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedToken {
    pub token: Token,
    pub span: Span,
}

impl LocatedToken {
    pub fn new(token: Token, span: Span) -> Self {
        LocatedToken { token, span }
    }
}

impl fmt::Display for LocatedToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token, self.span)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // Keywords
    Let,
    Rec,
    In,
    If,
    Then,
    Else,
    Fun,
    Match,
    With,
    Type,
    External,
    Not,
    SomeCtor,
    NoneCtor,

    // Identifiers and literals
    Identifier(String),
    Underscore,
    BoolLiteral(bool),
    IntLiteral(i64),
    FloatLiteral(f64),
    StringLiteral(String),

    // Array primitives
    ArrayMake,   // Array.make
    ArrayLength, // Array.length

    // Operators
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    PlusDot,
    MinusDot,
    StarDot,
    SlashDot,
    Equal,
    LessGreater,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    AndAnd,
    BarBar,
    LessMinus,    // <- for array stores
    MinusGreater, // -> for lambdas and match arms
    Semicolon,
    Comma,
    Dot,
    Bar,
    Colon,

    // Delimiters
    LeftParen,
    RightParen,
    LeftBracket,
    RightBracket,
    LeftBracketBar, // [|
    BarRightBracket, // |]

    Comment(String),
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Token::Identifier(s) => return write!(f, "IDENT({})", s),
            Token::BoolLiteral(b) => return write!(f, "BOOL({})", b),
            Token::IntLiteral(i) => return write!(f, "INT({})", i),
            Token::FloatLiteral(x) => return write!(f, "FLOAT({:?})", x),
            Token::StringLiteral(s) => return write!(f, "STRING({:?})", s),
            Token::Comment(s) => return write!(f, "COMMENT({:?})", s),
            Token::Let => "LET",
            Token::Rec => "REC",
            Token::In => "IN",
            Token::If => "IF",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::Fun => "FUN",
            Token::Match => "MATCH",
            Token::With => "WITH",
            Token::Type => "TYPE",
            Token::External => "EXTERNAL",
            Token::Not => "NOT",
            Token::SomeCtor => "SOME",
            Token::NoneCtor => "NONE",
            Token::Underscore => "UNDERSCORE",
            Token::ArrayMake => "ARRAY_MAKE",
            Token::ArrayLength => "ARRAY_LENGTH",
            Token::Plus => "PLUS",
            Token::Minus => "MINUS",
            Token::Star => "STAR",
            Token::Slash => "SLASH",
            Token::Percent => "PERCENT",
            Token::PlusDot => "PLUS_DOT",
            Token::MinusDot => "MINUS_DOT",
            Token::StarDot => "STAR_DOT",
            Token::SlashDot => "SLASH_DOT",
            Token::Equal => "EQUAL",
            Token::LessGreater => "LESS_GREATER",
            Token::Less => "LESS",
            Token::LessEqual => "LESS_EQUAL",
            Token::Greater => "GREATER",
            Token::GreaterEqual => "GREATER_EQUAL",
            Token::AndAnd => "AND_AND",
            Token::BarBar => "BAR_BAR",
            Token::LessMinus => "LESS_MINUS",
            Token::MinusGreater => "MINUS_GREATER",
            Token::Semicolon => "SEMICOLON",
            Token::Comma => "COMMA",
            Token::Dot => "DOT",
            Token::Bar => "BAR",
            Token::Colon => "COLON",
            Token::LeftParen => "LPAREN",
            Token::RightParen => "RPAREN",
            Token::LeftBracket => "LBRACKET",
            Token::RightBracket => "RBRACKET",
            Token::LeftBracketBar => "LBRACKET_BAR",
            Token::BarRightBracket => "BAR_RBRACKET",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexError {
    #[error("invalid token {found:?} at {span}")]
    InvalidToken { found: char, span: Span },

    #[error("unterminated comment starting at {span}")]
    UnterminatedComment { span: Span },

    #[error("unterminated string literal starting at {span}")]
    UnterminatedString { span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::InvalidToken { span, .. }
            | LexError::UnterminatedComment { span }
            | LexError::UnterminatedString { span } => *span,
        }
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '\''
}

fn keyword_or_identifier(word: &str) -> Token {
    match word {
        "let" => Token::Let,
        "rec" => Token::Rec,
        "in" => Token::In,
        "if" => Token::If,
        "then" => Token::Then,
        "else" => Token::Else,
        "fun" => Token::Fun,
        "match" => Token::Match,
        "with" => Token::With,
        "type" => Token::Type,
        "external" => Token::External,
        "not" => Token::Not,
        "true" => Token::BoolLiteral(true),
        "false" => Token::BoolLiteral(false),
        "Some" => Token::SomeCtor,
        "None" => Token::NoneCtor,
        "_" => Token::Underscore,
        _ => Token::Identifier(word.to_string()),
    }
}

fn parse_word(input: &str) -> IResult<&str, Token> {
    map(
        recognize(pair(
            alt((alpha1, tag("_"))),
            many0(alt((alphanumeric1, tag("_"), tag("'")))),
        )),
        keyword_or_identifier,
    )(input)
}

fn parse_array_primitive(input: &str) -> IResult<&str, Token> {
    let primitive = |name: &'static str, token: Token| {
        value(token, terminated(tag(name), not(satisfy(is_ident_char))))
    };

    alt((
        primitive("Array.make", Token::ArrayMake),
        primitive("Array.length", Token::ArrayLength),
    ))(input)
}

fn parse_operator(input: &str) -> IResult<&str, Token> {
    alt((
        // Multi-character operators (must come before their prefixes)
        alt((
            value(Token::PlusDot, tag("+.")),
            value(Token::MinusDot, tag("-.")),
            value(Token::StarDot, tag("*.")),
            value(Token::SlashDot, tag("/.")),
            value(Token::MinusGreater, tag("->")),
            value(Token::LessMinus, tag("<-")),
            value(Token::LessGreater, tag("<>")),
            value(Token::LessEqual, tag("<=")),
            value(Token::GreaterEqual, tag(">=")),
            value(Token::AndAnd, tag("&&")),
            value(Token::BarBar, tag("||")),
        )),
        alt((
            value(Token::Plus, char('+')),
            value(Token::Minus, char('-')),
            value(Token::Star, char('*')),
            value(Token::Slash, char('/')),
            value(Token::Percent, char('%')),
            value(Token::Equal, char('=')),
            value(Token::Less, char('<')),
            value(Token::Greater, char('>')),
            value(Token::Semicolon, char(';')),
            value(Token::Comma, char(',')),
            value(Token::Dot, char('.')),
            value(Token::Bar, char('|')),
            value(Token::Colon, char(':')),
        )),
    ))(input)
}

fn parse_delimiter(input: &str) -> IResult<&str, Token> {
    alt((
        value(Token::LeftBracketBar, tag("[|")),
        value(Token::BarRightBracket, tag("|]")),
        value(Token::LeftParen, char('(')),
        value(Token::RightParen, char(')')),
        value(Token::LeftBracket, char('[')),
        value(Token::RightBracket, char(']')),
    ))(input)
}

fn parse_token(input: &str) -> IResult<&str, Token> {
    alt((
        parse_comment, // Must come before parse_delimiter to match (* before (
        parse_string_literal,
        parse_array_primitive,
        parse_float_literal, // Must come before parse_int_literal
        parse_int_literal,
        parse_word,
        parse_delimiter, // Must come before parse_operator to match |] before |
        parse_operator,
    ))(input)
}

/// Streaming lexer. Yields tokens (including comments) in source order and
/// stops after the first error.
pub struct Lexer<'a> {
    input: &'a str,
    remaining: &'a str,
    line_offsets: LineOffsets,
    failed: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input,
            remaining: input,
            line_offsets: LineOffsets::new(input),
            failed: false,
        }
    }

    fn offset(&self) -> usize {
        self.input.len() - self.remaining.len()
    }

    fn error_here(&self) -> LexError {
        let start = self.offset();
        if self.remaining.starts_with("(*") {
            LexError::UnterminatedComment {
                span: self.line_offsets.span(start, start + 2),
            }
        } else if self.remaining.starts_with('"') {
            LexError::UnterminatedString {
                span: self.line_offsets.span(start, start + 1),
            }
        } else {
            let found = self.remaining.chars().next().unwrap_or('\0');
            LexError::InvalidToken {
                found,
                span: self.line_offsets.span(start, start + found.len_utf8()),
            }
        }
    }
}

impl Iterator for Lexer<'_> {
    type Item = Result<LocatedToken, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        if let Ok((rest, _)) = multispace1::<&str, nom::error::Error<&str>>(self.remaining) {
            self.remaining = rest;
        }
        if self.remaining.is_empty() {
            return None;
        }

        let start = self.offset();
        match parse_token(self.remaining) {
            Ok((rest, token)) => {
                let end = self.input.len() - rest.len();
                self.remaining = rest;
                Some(Ok(LocatedToken::new(token, self.line_offsets.span(start, end))))
            }
            Err(_) => {
                self.failed = true;
                Some(Err(self.error_here()))
            }
        }
    }
}

/// Tokenize a whole source string, skipping comments.
pub fn tokenize(input: &str) -> Result<Vec<LocatedToken>, LexError> {
    Lexer::new(input)
        .filter(|t| !matches!(t, Ok(LocatedToken { token: Token::Comment(_), .. })))
        .collect()
}
