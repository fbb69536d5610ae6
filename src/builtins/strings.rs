//! String primitives: `string str sym trim lower-case upper-case search
//! replace slice parse-integer parse-float`.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

#[builtin(name = "string", category = "Strings", related(str))]
/// Concatenates the printed form of every argument into one string.
///
/// # Examples
///
/// ```lisp
/// (string "count: " 3)
/// ```
pub fn string(args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::string(args.iter().map(|v| v.to_string()).collect::<String>()))
}

#[builtin(name = "str", category = "Strings", related(string))]
/// Alias of `string`.
pub fn str_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    string(args, scope)
}

#[builtin(name = "sym", category = "Strings")]
/// Converts a string to a symbol.
pub fn sym(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    match args.first() {
        Some(Value::String(s)) => Ok(Value::symbol(s.to_string())),
        Some(other) => Ok(Value::symbol(other.to_string())),
        None => Err(FuelError::semantic("'sym' expects 1 argument", token)),
    }
}

fn as_str<'a>(v: &'a Value, who: &str, token: Option<Rc<crate::token::Token>>) -> Result<&'a str, FuelError> {
    match v {
        Value::String(s) => Ok(s),
        _ => Err(FuelError::semantic(format!("'{}' expects a string argument", who), token)),
    }
}

#[builtin(name = "trim", category = "Strings")]
/// Strips leading and trailing whitespace.
pub fn trim(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let s = args.first().ok_or_else(|| FuelError::semantic("'trim' expects 1 argument", token.clone()))?;
    Ok(Value::string(as_str(s, "trim", token)?.trim().to_string()))
}

#[builtin(name = "lower-case", category = "Strings", related(upper_case))]
/// Lowercases every character.
pub fn lower_case(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let s = args.first().ok_or_else(|| FuelError::semantic("'lower-case' expects 1 argument", token.clone()))?;
    Ok(Value::string(as_str(s, "lower-case", token)?.to_lowercase()))
}

#[builtin(name = "upper-case", category = "Strings", related(lower_case))]
/// Uppercases every character.
pub fn upper_case(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let s = args.first().ok_or_else(|| FuelError::semantic("'upper-case' expects 1 argument", token.clone()))?;
    Ok(Value::string(as_str(s, "upper-case", token)?.to_uppercase()))
}

#[builtin(name = "search", category = "Strings", related(replace))]
/// The zero-based index of the first occurrence of a substring, or `nil`
/// if not found.
///
/// # Examples
///
/// ```lisp
/// (search "hello world" "world")
/// ```
pub fn search(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 2 {
        return Err(FuelError::semantic("'search' expects exactly 2 arguments", token));
    }
    let haystack = as_str(&args[0], "search", token.clone())?;
    let needle = as_str(&args[1], "search", token)?;
    Ok(match haystack.find(needle) {
        Some(byte_idx) => Value::Int(haystack[..byte_idx].chars().count() as i64),
        None => Value::Nil,
    })
}

#[builtin(name = "replace", category = "Strings", related(search))]
/// Replaces every occurrence of a substring with another.
///
/// # Examples
///
/// ```lisp
/// (replace "a-b-c" "-" "_")
/// ```
pub fn replace(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 3 {
        return Err(FuelError::semantic("'replace' expects exactly 3 arguments", token));
    }
    let s = as_str(&args[0], "replace", token.clone())?;
    let from = as_str(&args[1], "replace", token.clone())?;
    let to = as_str(&args[2], "replace", token)?;
    Ok(Value::string(s.replace(from, to)))
}

#[builtin(name = "slice", category = "Strings")]
/// A substring from `start` to `end`, both inclusive; negative indices
/// count back from the end (`-1` is the last character).
///
/// # Examples
///
/// ```lisp
/// (slice "this is a string" 8 -1)
/// ```
pub fn slice(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 3 {
        return Err(FuelError::semantic("'slice' expects exactly 3 arguments", token));
    }
    let s = as_str(&args[0], "slice", token.clone())?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as i64;
    let start = args[1].as_f64().ok_or_else(|| FuelError::semantic("'slice' expects a numeric start", token.clone()))? as i64;
    let end = args[2].as_f64().ok_or_else(|| FuelError::semantic("'slice' expects a numeric end", token))? as i64;
    let norm = |i: i64| -> i64 { if i < 0 { len + i } else { i } };
    let start = norm(start).clamp(0, len.max(0));
    let end = norm(end).clamp(-1, len - 1);
    if start > end {
        return Ok(Value::string(String::new()));
    }
    Ok(Value::string(chars[start as usize..=end as usize].iter().collect::<String>()))
}

#[builtin(name = "parse-integer", category = "Strings")]
/// Parses a string as an integer; `Undefined` if it does not parse.
pub fn parse_integer(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let s = args.first().ok_or_else(|| FuelError::semantic("'parse-integer' expects 1 argument", token.clone()))?;
    let s = as_str(s, "parse-integer", token)?;
    Ok(s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Undefined))
}

#[builtin(name = "parse-float", category = "Strings")]
/// Parses a string as a floating-point number; `Undefined` if it does not
/// parse.
pub fn parse_float(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let s = args.first().ok_or_else(|| FuelError::semantic("'parse-float' expects 1 argument", token.clone()))?;
    let s = as_str(s, "parse-float", token)?;
    Ok(s.trim().parse::<f64>().map(Value::Double).unwrap_or(Value::Undefined))
}

pub fn register(scope: &Rc<Scope>) {
    register_string(scope);
    register_str_(scope);
    register_sym(scope);
    register_trim(scope);
    register_lower_case(scope);
    register_upper_case(scope);
    register_search(scope);
    register_replace(scope);
    register_slice(scope);
    register_parse_integer(scope);
    register_parse_float(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CapturingWriter, QueuedReader};

    fn root() -> Rc<Scope> {
        let s = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
        register(&s);
        s
    }

    #[test]
    fn slice_supports_negative_end_inclusive() {
        let s = root();
        let r = slice(&[Value::string("this is a string"), Value::Int(8), Value::Int(-1)], &s).unwrap();
        assert!(matches!(r, Value::String(s) if &*s == "a string"));
    }

    #[test]
    fn search_finds_substring_index() {
        let s = root();
        let r = search(&[Value::string("hello world"), Value::string("world")], &s).unwrap();
        assert!(matches!(r, Value::Int(6)));
    }

    #[test]
    fn search_missing_is_nil() {
        let s = root();
        let r = search(&[Value::string("hello"), Value::string("zzz")], &s).unwrap();
        assert!(matches!(r, Value::Nil));
    }

    #[test]
    fn parse_integer_failure_is_undefined() {
        let s = root();
        let r = parse_integer(&[Value::string("not-a-number")], &s).unwrap();
        assert!(matches!(r, Value::Undefined));
    }

    #[test]
    fn replace_replaces_all() {
        let s = root();
        let r = replace(&[Value::string("a-b-c"), Value::string("-"), Value::string("_")], &s).unwrap();
        assert!(matches!(r, Value::String(s) if &*s == "a_b_c"));
    }
}
