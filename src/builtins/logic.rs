//! Logic primitives: `and or not !`.
//!
//! `and`/`or` are ordinary (non-special-form) functions, so every argument
//! is evaluated before either primitive runs -- there is no short-circuit.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

#[builtin(name = "and", category = "Logic", related(or, not))]
/// True if every (already evaluated) argument is truthy. Returns the last
/// value if all are truthy, otherwise the first falsy value encountered.
/// All arguments are evaluated regardless of outcome.
///
/// # Examples
///
/// ```lisp
/// (and #t #t 3)
/// ```
pub fn and(args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let mut last = Value::Bool(true);
    for a in args {
        if !a.is_truthy() {
            return Ok(a.clone());
        }
        last = a.clone();
    }
    Ok(last)
}

#[builtin(name = "or", category = "Logic", related(and, not))]
/// True if any argument is truthy. Returns the first truthy value, or the
/// last (falsy) value if none are. All arguments are evaluated regardless
/// of outcome.
///
/// # Examples
///
/// ```lisp
/// (or #f #f 5)
/// ```
pub fn or(args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let mut last = Value::Bool(false);
    for a in args {
        if a.is_truthy() {
            return Ok(a.clone());
        }
        last = a.clone();
    }
    Ok(last)
}

#[builtin(name = "not", category = "Logic", related(and, or))]
/// Boolean negation of a single argument's truthiness.
pub fn not(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let a = args.first().ok_or_else(|| FuelError::semantic("'not' requires 1 argument", token))?;
    Ok(Value::Bool(!a.is_truthy()))
}

pub fn register(scope: &Rc<Scope>) {
    register_and(scope);
    register_or(scope);
    register_not(scope);
    if let Some(v) = scope.resolve("not") {
        scope.define("!", v);
    }
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
    fn and_returns_last_when_all_truthy() {
        let s = root();
        assert!(matches!(and(&[Value::Bool(true), Value::Int(3)], &s).unwrap(), Value::Int(3)));
    }

    #[test]
    fn and_returns_first_falsy() {
        let s = root();
        assert!(matches!(and(&[Value::Bool(false), Value::Int(3)], &s).unwrap(), Value::Bool(false)));
    }

    #[test]
    fn or_returns_first_truthy() {
        let s = root();
        assert!(matches!(or(&[Value::Bool(false), Value::Int(5)], &s).unwrap(), Value::Int(5)));
    }

    #[test]
    fn not_negates() {
        let s = root();
        assert!(matches!(not(&[Value::Bool(false)], &s).unwrap(), Value::Bool(true)));
    }
}
