//! Comparison primitives: `< <= > >= = == != equal`.
//!
//! Mixed numeric operands promote through `f64`; string operands compare
//! lexicographically; `==`/`equal` additionally compare lists elementwise.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::cmp::Ordering;
use std::rc::Rc;

fn compare(a: &Value, b: &Value, token: Option<Rc<crate::token::Token>>) -> Result<Ordering, FuelError> {
    match (a.as_f64(), b.as_f64()) {
        (Some(x), Some(y)) => x.partial_cmp(&y).ok_or_else(|| FuelError::runtime("cannot compare NaN", token.clone())),
        _ => match (a, b) {
            (Value::String(x), Value::String(y)) => Ok(x.cmp(y)),
            _ => Err(FuelError::semantic(
                format!("cannot compare '{}' and '{}'", a, b),
                token,
            )),
        },
    }
}

fn chain(args: &[Value], scope: &Rc<Scope>, ok: impl Fn(Ordering) -> bool) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic("comparison requires at least 2 arguments", token));
    }
    for pair in args.windows(2) {
        if !ok(compare(&pair[0], &pair[1], token.clone())?) {
            return Ok(Value::Bool(false));
        }
    }
    Ok(Value::Bool(true))
}

#[builtin(name = "<", category = "Comparison")]
/// True if each argument is strictly less than the next.
pub fn lt(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    chain(args, scope, |o| o == Ordering::Less)
}

#[builtin(name = "<=", category = "Comparison")]
/// True if each argument is less than or equal to the next.
pub fn le(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    chain(args, scope, |o| o != Ordering::Greater)
}

#[builtin(name = ">", category = "Comparison")]
/// True if each argument is strictly greater than the next.
pub fn gt(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    chain(args, scope, |o| o == Ordering::Greater)
}

#[builtin(name = ">=", category = "Comparison")]
/// True if each argument is greater than or equal to the next.
pub fn ge(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    chain(args, scope, |o| o != Ordering::Less)
}

/// Deep value equality: numeric promotion, lexicographic strings, `nil`
/// equivalent to the empty list, and elementwise recursive list comparison.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        _ if a.is_nil() && b.is_nil() => true,
        (Value::Bool(x), Value::Bool(y)) => x == y,
        (Value::Symbol(x), Value::Symbol(y)) => x == y,
        (Value::String(x), Value::String(y)) => x == y,
        (Value::List(x), Value::List(y)) => x.len() == y.len() && x.iter().zip(y.iter()).all(|(p, q)| values_equal(p, q)),
        _ => match (a.as_f64(), b.as_f64()) {
            (Some(x), Some(y)) => x == y,
            _ => false,
        },
    }
}

#[builtin(name = "=", category = "Comparison", related(equal))]
/// True if every argument is equal to the first.
///
/// # Examples
///
/// ```lisp
/// (= 1 1 1)
/// ```
pub fn eq(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic("'=' requires at least 2 arguments", token));
    }
    Ok(Value::Bool(args[1..].iter().all(|v| values_equal(&args[0], v))))
}

#[builtin(name = "==", category = "Comparison", related(equal))]
/// Alias of `=`; also compares lists elementwise.
pub fn eq2(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    eq(args, scope)
}

#[builtin(name = "equal", category = "Comparison")]
/// Alias of `=`.
pub fn equal(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    eq(args, scope)
}

#[builtin(name = "!=", category = "Comparison")]
/// Negation of `==`.
pub fn neq(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match eq(args, scope)? {
        Value::Bool(b) => Ok(Value::Bool(!b)),
        _ => unreachable!(),
    }
}

pub fn register(scope: &Rc<Scope>) {
    register_lt(scope);
    register_le(scope);
    register_gt(scope);
    register_ge(scope);
    register_eq(scope);
    register_eq2(scope);
    register_equal(scope);
    register_neq(scope);
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
    fn chained_less_than() {
        let s = root();
        assert!(matches!(lt(&[Value::Int(1), Value::Int(2), Value::Int(3)], &s).unwrap(), Value::Bool(true)));
        assert!(matches!(lt(&[Value::Int(1), Value::Int(3), Value::Int(2)], &s).unwrap(), Value::Bool(false)));
    }

    #[test]
    fn strings_compare_lexicographically() {
        let s = root();
        assert!(matches!(lt(&[Value::string("a"), Value::string("b")], &s).unwrap(), Value::Bool(true)));
    }

    #[test]
    fn equal_compares_lists_elementwise() {
        let a = Value::list(vec![Value::Int(1), Value::Int(2)]);
        let b = Value::list(vec![Value::Int(1), Value::Int(2)]);
        assert!(values_equal(&a, &b));
    }

    #[test]
    fn nil_equals_empty_list() {
        assert!(values_equal(&Value::Nil, &Value::list(vec![])));
    }

    #[test]
    fn neq_negates_eq() {
        let s = root();
        assert!(matches!(neq(&[Value::Int(1), Value::Int(2)], &s).unwrap(), Value::Bool(true)));
    }
}
