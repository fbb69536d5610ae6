//! Byte stream to token sequence.
//!
//! Consumes a whole source string and produces a finite, non-restartable
//! sequence of [`Token`]s with exact source positions. Rules, in priority
//! order: line comments (`;` to end of line); double-quoted string literals
//! with backslash escapes; single-character tokens for parens and the
//! reader shorthands (`'`, `` ` ``, `,`, `,@`); numeric literals
//! distinguished by the presence of `.`; `#t`/`#f` booleans; `nil`/`NIL`;
//! everything else is a symbol. The tokenizer never fails on unknown
//! characters -- only an unterminated string literal is an error.

use crate::error::FuelError;
use crate::token::{Token, TokenKind};
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, one_of},
    combinator::{opt, recognize},
    sequence::pair,
    IResult, Parser,
};

/// Tokenize a whole source string, discarding whitespace and comments.
pub fn tokenize(source: &str) -> Result<Vec<Token>, FuelError> {
    let mut tokens = Vec::new();
    let mut rest = source;
    let mut line: u32 = 1;
    let mut consumed: usize = 0;

    while !rest.is_empty() {
        match lex_one(rest) {
            Ok((next_rest, Some(kind), text)) => {
                let start = consumed;
                let stop = start + text.len();
                line += text.matches('\n').count() as u32;
                tokens.push(Token::new(kind, text, line_before_text(line, &text), start, stop));
                consumed = stop;
                rest = next_rest;
            }
            Ok((next_rest, None, text)) => {
                // whitespace or comment: still advances line count, produces no token
                line += text.matches('\n').count() as u32;
                consumed += text.len();
                rest = next_rest;
            }
            Err(e) => return Err(e),
        }
    }

    Ok(tokens)
}

fn line_before_text(line_after: u32, text: &str) -> u32 {
    line_after - text.matches('\n').count() as u32
}

type LexResult<'a> = IResult<&'a str, (Option<TokenKind>, &'a str)>;

fn lex_one(input: &str) -> Result<(&str, Option<TokenKind>, String), FuelError> {
    if let Ok((rest, (kind, text))) = lex_token(input) {
        return Ok((rest, kind, text.to_string()));
    }
    // Unterminated string literal surfaces as a lexical error; everything
    // else the tokenizer can always make progress on.
    if input.starts_with('"') {
        return Err(FuelError::lexical("unterminated string literal", None));
    }
    Err(FuelError::lexical(
        format!("unable to tokenize input near '{}'", &input[..input.len().min(16)]),
        None,
    ))
}

fn lex_token(input: &str) -> LexResult<'_> {
    alt((
        whitespace,
        line_comment,
        string_literal,
        single_char("(", TokenKind::OpenParen),
        single_char(")", TokenKind::CloseParen),
        unquote_splicing,
        single_char("'", TokenKind::Quote),
        single_char("`", TokenKind::Quasiquote),
        single_char(",", TokenKind::Unquote),
        boolean_literal,
        number_literal,
        nil_literal,
        symbol,
    ))
    .parse(input)
}

fn whitespace(input: &str) -> LexResult<'_> {
    let (rest, text) = take_while1(|c: char| c.is_whitespace())(input)?;
    Ok((rest, (None, text)))
}

fn line_comment(input: &str) -> LexResult<'_> {
    let (rest, text) = recognize(pair(char(';'), take_while(|c| c != '\n'))).parse(input)?;
    Ok((rest, (None, text)))
}

fn single_char(lit: &'static str, kind: TokenKind) -> impl Fn(&str) -> LexResult<'_> {
    move |input| {
        let (rest, text) = tag(lit)(input)?;
        Ok((rest, (Some(kind), text)))
    }
}

fn unquote_splicing(input: &str) -> LexResult<'_> {
    let (rest, text) = tag(",@")(input)?;
    Ok((rest, (Some(TokenKind::UnquoteSplicing), text)))
}

fn string_literal(input: &str) -> LexResult<'_> {
    let (_, _) = char('"')(input)?;
    let mut idx = 1;
    let bytes = input.as_bytes();
    loop {
        if idx >= bytes.len() {
            return Err(nom::Err::Error(nom::error::Error::new(
                input,
                nom::error::ErrorKind::Eof,
            )));
        }
        match bytes[idx] {
            b'\\' => {
                idx += 2;
            }
            b'"' => {
                idx += 1;
                break;
            }
            _ => idx += 1,
        }
    }
    Ok((&input[idx..], (Some(TokenKind::StringLiteral), &input[..idx])))
}

fn boolean_literal(input: &str) -> LexResult<'_> {
    let (rest, text) = alt((tag("#t"), tag("#f"))).parse(input)?;
    Ok((rest, (Some(TokenKind::BooleanLiteral), text)))
}

fn nil_literal(input: &str) -> LexResult<'_> {
    let (rest, text) = alt((tag("nil"), tag("NIL"))).parse(input)?;
    // make sure this isn't a prefix of a longer symbol, e.g. "nilable"
    if rest
        .chars()
        .next()
        .is_some_and(|c| is_symbol_continue(c))
    {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Tag,
        )));
    }
    Ok((rest, (Some(TokenKind::Nil), text)))
}

fn number_literal(input: &str) -> LexResult<'_> {
    let (rest, text) = recognize(pair(
        opt(char('-')),
        alt((
            recognize(pair(digit1, opt(pair(char('.'), opt(digit1))))),
            recognize(pair(char('.'), digit1)),
        )),
    ))
    .parse(input)?;
    // don't allow a bare "-" to be mistaken for a number
    if text == "-" {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Digit,
        )));
    }
    let kind = if text.contains('.') {
        TokenKind::Double
    } else {
        TokenKind::Integer
    };
    Ok((rest, (Some(kind), text)))
}

fn is_symbol_continue(c: char) -> bool {
    c.is_alphanumeric() || "-_*+/%<>=!?.".contains(c)
}

fn symbol(input: &str) -> LexResult<'_> {
    let (rest, first) = one_of("abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ+-*/%<>=!?.")(input)?;
    let (rest, more) = take_while(is_symbol_continue)(rest)?;
    let len = first.len_utf8() + more.len();
    Ok((rest, (Some(TokenKind::Symbol), &input[..len])))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        tokenize(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn tokenizes_atoms() {
        assert_eq!(kinds("42"), vec![TokenKind::Integer]);
        assert_eq!(kinds("-42"), vec![TokenKind::Integer]);
        assert_eq!(kinds("3.14"), vec![TokenKind::Double]);
        assert_eq!(kinds("#t"), vec![TokenKind::BooleanLiteral]);
        assert_eq!(kinds("nil"), vec![TokenKind::Nil]);
        assert_eq!(kinds("foo-bar?"), vec![TokenKind::Symbol]);
    }

    #[test]
    fn tokenizes_list() {
        let tokens = tokenize("(+ 1 2)").unwrap();
        assert_eq!(
            tokens.iter().map(|t| t.kind).collect::<Vec<_>>(),
            vec![
                TokenKind::OpenParen,
                TokenKind::Symbol,
                TokenKind::Integer,
                TokenKind::Integer,
                TokenKind::CloseParen,
            ]
        );
    }

    #[test]
    fn tracks_line_numbers() {
        let tokens = tokenize("(+ 1\n   2)").unwrap();
        let last_int = tokens
            .iter()
            .filter(|t| t.kind == TokenKind::Integer)
            .nth(1)
            .unwrap();
        assert_eq!(last_int.line, 2);
    }

    #[test]
    fn skips_comments() {
        let tokens = tokenize("; comment\n(+ 1 2) ; trailing").unwrap();
        assert!(tokens.iter().all(|t| t.kind != TokenKind::Comment));
        assert_eq!(tokens[0].kind, TokenKind::OpenParen);
    }

    #[test]
    fn string_with_escapes() {
        let tokens = tokenize(r#""a\"b\n""#).unwrap();
        assert_eq!(tokens[0].kind, TokenKind::StringLiteral);
    }

    #[test]
    fn unterminated_string_is_lexical_error() {
        assert!(tokenize("\"abc").is_err());
    }

    #[test]
    fn reader_shorthand_tokens() {
        assert_eq!(kinds("'x"), vec![TokenKind::Quote, TokenKind::Symbol]);
        assert_eq!(kinds("`x"), vec![TokenKind::Quasiquote, TokenKind::Symbol]);
        assert_eq!(kinds(",x"), vec![TokenKind::Unquote, TokenKind::Symbol]);
        assert_eq!(
            kinds(",@x"),
            vec![TokenKind::UnquoteSplicing, TokenKind::Symbol]
        );
    }
}
