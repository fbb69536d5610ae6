// ABOUTME: Reader - folds a flat token stream into a value tree (the AST)

use crate::error::FuelError;
use crate::scope::Scope;
use crate::token::{Token, TokenKind};
use crate::value::Value;
use std::rc::Rc;

/// Read a single top-level expression out of `tokens`.
///
/// A valid script is exactly one top-level form; trailing tokens after the
/// first complete form are a syntax error ("script too long"). List origin
/// tokens are recorded on `scope` (normally the global scope) so the
/// evaluator and debugger can recover source positions later.
pub fn read(tokens: &[Token], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let mut cursor = Cursor { tokens, pos: 0 };
    if cursor.peek().is_none() {
        return Ok(Value::Nil);
    }
    let value = read_form(&mut cursor, scope)?;
    if cursor.peek().is_some() {
        return Err(FuelError::syntactic(
            "script too long: more than one top-level expression",
            cursor.peek().cloned().map(Rc::new),
        ));
    }
    Ok(value)
}

/// Read every top-level form present, without the "one expression" rule.
/// Used by `import`/module loading, where a file is a sequence of
/// top-level definitions rather than a single script.
pub fn read_all(tokens: &[Token], scope: &Rc<Scope>) -> Result<Vec<Value>, FuelError> {
    let mut cursor = Cursor { tokens, pos: 0 };
    let mut forms = Vec::new();
    while cursor.peek().is_some() {
        forms.push(read_form(&mut cursor, scope)?);
    }
    Ok(forms)
}

struct Cursor<'a> {
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn next(&mut self) -> Option<&Token> {
        let t = self.tokens.get(self.pos);
        if t.is_some() {
            self.pos += 1;
        }
        t
    }
}

fn read_form(cursor: &mut Cursor, scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = cursor
        .next()
        .ok_or_else(|| FuelError::syntactic("unexpected end of input", None))?
        .clone();
    match token.kind {
        TokenKind::OpenParen => read_list(cursor, scope, &token),
        TokenKind::CloseParen => Err(FuelError::syntactic("unmatched ')'", Some(Rc::new(token)))),
        TokenKind::Quote => wrap(cursor, scope, "quote", &token),
        TokenKind::Quasiquote => wrap(cursor, scope, "quasiquote", &token),
        TokenKind::Unquote => wrap(cursor, scope, "unquote", &token),
        TokenKind::UnquoteSplicing => wrap(cursor, scope, "unquote-splicing", &token),
        TokenKind::Integer => Ok(Value::Int(token.text.parse().map_err(|_| {
            FuelError::lexical(format!("invalid integer literal '{}'", token.text), Some(Rc::new(token.clone())))
        })?)),
        TokenKind::Double => Ok(Value::Double(token.text.parse().map_err(|_| {
            FuelError::lexical(format!("invalid double literal '{}'", token.text), Some(Rc::new(token.clone())))
        })?)),
        TokenKind::StringLiteral => Ok(Value::string(unescape(&token)?)),
        TokenKind::BooleanLiteral => Ok(Value::Bool(token.text == "#t")),
        TokenKind::Nil => Ok(Value::Nil),
        TokenKind::Symbol => Ok(Value::symbol(token.text.clone())),
        TokenKind::Comment | TokenKind::Whitespace => read_form(cursor, scope),
    }
}

fn wrap(cursor: &mut Cursor, scope: &Rc<Scope>, head: &str, token: &Token) -> Result<Value, FuelError> {
    let inner = read_form(cursor, scope)?;
    let items = Rc::new(vec![Value::symbol(head), inner]);
    scope.record_position(&items, Rc::new(token.clone()));
    Ok(Value::List(items))
}

fn read_list(cursor: &mut Cursor, scope: &Rc<Scope>, open: &Token) -> Result<Value, FuelError> {
    let mut items = Vec::new();
    loop {
        match cursor.peek() {
            None => {
                return Err(FuelError::syntactic(
                    "unmatched '('",
                    Some(Rc::new(open.clone())),
                ))
            }
            Some(t) if t.kind == TokenKind::CloseParen => {
                cursor.next();
                break;
            }
            _ => items.push(read_form(cursor, scope)?),
        }
    }
    let items = Rc::new(items);
    scope.record_position(&items, Rc::new(open.clone()));
    Ok(Value::List(items))
}

/// Strip the surrounding quotes and resolve backslash escapes for a string
/// literal token (`\\`, `\"`, `\n`, `\r`, `\t`).
fn unescape(token: &Token) -> Result<String, FuelError> {
    let raw = &token.text;
    let inner = raw
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .ok_or_else(|| FuelError::lexical("malformed string literal", Some(Rc::new(token.clone()))))?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some(other) => {
                return Err(FuelError::lexical(
                    format!("invalid escape sequence '\\{}'", other),
                    Some(Rc::new(token.clone())),
                ))
            }
            None => {
                return Err(FuelError::lexical(
                    "unterminated escape sequence",
                    Some(Rc::new(token.clone())),
                ))
            }
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CapturingWriter, QueuedReader};
    use crate::tokenizer::tokenize;

    fn root() -> Rc<Scope> {
        Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()))
    }

    fn read_str(src: &str) -> Value {
        let scope = root();
        let tokens = tokenize(src).unwrap();
        read(&tokens, &scope).unwrap()
    }

    #[test]
    fn reads_atoms() {
        assert!(matches!(read_str("42"), Value::Int(42)));
        assert!(matches!(read_str("3.5"), Value::Double(d) if d == 3.5));
        assert!(matches!(read_str("#t"), Value::Bool(true)));
        assert!(matches!(read_str("nil"), Value::Nil));
    }

    #[test]
    fn reads_nested_list() {
        let v = read_str("(+ 1 (* 2 3))");
        let items = v.as_list().unwrap();
        assert_eq!(items.len(), 3);
        assert!(matches!(&items[2], Value::List(_)));
    }

    #[test]
    fn quote_shorthand_expands() {
        let v = read_str("'x");
        let items = v.as_list().unwrap();
        assert_eq!(items[0].as_symbol(), Some("quote"));
        assert_eq!(items[1].as_symbol(), Some("x"));
    }

    #[test]
    fn quasiquote_shorthands_expand() {
        let v = read_str("`(1 ,a ,@b)");
        let items = v.as_list().unwrap();
        assert_eq!(items[0].as_symbol(), Some("quasiquote"));
        let inner = items[1].as_list().unwrap();
        let unq = inner[1].as_list().unwrap();
        assert_eq!(unq[0].as_symbol(), Some("unquote"));
        let spl = inner[2].as_list().unwrap();
        assert_eq!(spl[0].as_symbol(), Some("unquote-splicing"));
    }

    #[test]
    fn unmatched_close_paren_is_error() {
        let scope = root();
        let tokens = tokenize(")").unwrap();
        assert!(read(&tokens, &scope).is_err());
    }

    #[test]
    fn unmatched_open_paren_is_error() {
        let scope = root();
        let tokens = tokenize("(+ 1 2").unwrap();
        assert!(read(&tokens, &scope).is_err());
    }

    #[test]
    fn multiple_top_level_forms_is_error() {
        let scope = root();
        let tokens = tokenize("1 2").unwrap();
        assert!(read(&tokens, &scope).is_err());
    }

    #[test]
    fn string_literal_unescapes() {
        let v = read_str(r#""a\"b\nc""#);
        match v {
            Value::String(s) => assert_eq!(&*s, "a\"b\nc"),
            _ => panic!("expected string"),
        }
    }
}
