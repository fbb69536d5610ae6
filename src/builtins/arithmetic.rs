//! Arithmetic primitives: `+ - * / add sub mul div %`.
//!
//! Numeric contagion rule: if any operand is `Double` the result is
//! `Double`, otherwise `Int`. `+` additionally concatenates when its first
//! argument is a `String` or `List`.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

fn as_number(v: &Value) -> Option<(bool, f64, i64)> {
    match v {
        Value::Int(i) => Some((false, *i as f64, *i)),
        Value::Double(d) => Some((true, *d, *d as i64)),
        Value::Bool(true) => Some((false, 1.0, 1)),
        Value::Bool(false) => Some((false, 0.0, 0)),
        _ => None,
    }
}

fn contagion(values: &[Value], token: Option<Rc<crate::token::Token>>) -> Result<(bool, Vec<f64>, Vec<i64>), FuelError> {
    let mut any_double = false;
    let mut doubles = Vec::with_capacity(values.len());
    let mut ints = Vec::with_capacity(values.len());
    for v in values {
        let (is_double, d, i) = as_number(v)
            .ok_or_else(|| FuelError::semantic(format!("'{}' is not a number", v), token.clone()))?;
        any_double |= is_double;
        doubles.push(d);
        ints.push(i);
    }
    Ok((any_double, doubles, ints))
}

#[builtin(name = "+", category = "Arithmetic", related(sub, mul, div))]
/// Sums every argument, promoting to `Double` if any operand is a `Double`.
///
/// A `String` or `List` first argument switches to concatenation instead of
/// arithmetic: `(+ "a" "b")` yields `"ab"`, `(+ (list 1) (list 2))` yields
/// `(1 2)`.
///
/// # Examples
///
/// ```lisp
/// (+ 1 2 3)
/// (+ 1 2.0)
/// ```
pub fn add(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    match args.first() {
        Some(Value::String(_)) => {
            let mut out = String::new();
            for a in args {
                out.push_str(&a.to_string());
            }
            Ok(Value::string(out))
        }
        Some(Value::List(_)) => {
            let mut out = Vec::new();
            for a in args {
                match a {
                    Value::List(items) => out.extend(items.iter().cloned()),
                    Value::Nil => {}
                    other => return Err(FuelError::semantic(format!("cannot append '{}' to a list", other), token)),
                }
            }
            Ok(Value::list(out))
        }
        _ => {
            let (any_double, doubles, ints) = contagion(args, token)?;
            if any_double {
                Ok(Value::Double(doubles.iter().sum()))
            } else {
                Ok(Value::Int(ints.iter().sum()))
            }
        }
    }
}

#[builtin(name = "-", category = "Arithmetic", related(add, mul, div))]
/// Subtracts every subsequent argument from the first. A single argument
/// negates it.
///
/// # Examples
///
/// ```lisp
/// (- 10 3 2)
/// (- 5)
/// ```
pub fn sub(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.is_empty() {
        return Err(FuelError::semantic("'-' requires at least one argument", token));
    }
    let (any_double, doubles, ints) = contagion(args, token)?;
    if args.len() == 1 {
        return Ok(if any_double { Value::Double(-doubles[0]) } else { Value::Int(-ints[0]) });
    }
    if any_double {
        Ok(Value::Double(doubles[1..].iter().fold(doubles[0], |acc, d| acc - d)))
    } else {
        Ok(Value::Int(ints[1..].iter().fold(ints[0], |acc, i| acc - i)))
    }
}

#[builtin(name = "*", category = "Arithmetic", related(add, sub, div))]
/// Multiplies every argument, promoting to `Double` if any operand is a
/// `Double`.
///
/// # Examples
///
/// ```lisp
/// (* 2 3 4)
/// ```
pub fn mul(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let (any_double, doubles, ints) = contagion(args, token)?;
    if any_double {
        Ok(Value::Double(doubles.iter().product()))
    } else {
        Ok(Value::Int(ints.iter().product()))
    }
}

#[builtin(name = "/", category = "Arithmetic", related(add, sub, mul))]
/// Divides the first argument by every subsequent argument. Division by
/// zero is a runtime error.
///
/// # Examples
///
/// ```lisp
/// (/ 20 4)
/// ```
pub fn div(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.is_empty() {
        return Err(FuelError::semantic("'/' requires at least one argument", token));
    }
    let (any_double, doubles, ints) = contagion(args, token.clone())?;
    if args.len() == 1 {
        if doubles[0] == 0.0 {
            return Err(FuelError::runtime("division by zero", token));
        }
        return Ok(Value::Double(1.0 / doubles[0]));
    }
    if any_double {
        let mut acc = doubles[0];
        for d in &doubles[1..] {
            if *d == 0.0 {
                return Err(FuelError::runtime("division by zero", token));
            }
            acc /= d;
        }
        Ok(Value::Double(acc))
    } else {
        let mut acc = ints[0];
        for i in &ints[1..] {
            if *i == 0 {
                return Err(FuelError::runtime("division by zero", token));
            }
            acc /= i;
        }
        Ok(Value::Int(acc))
    }
}

#[builtin(name = "%", category = "Arithmetic", related(div))]
/// Remainder of dividing the first argument by the second.
///
/// # Examples
///
/// ```lisp
/// (% 17 5)
/// ```
pub fn rem(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 2 {
        return Err(FuelError::semantic("'%' expects exactly 2 arguments", token));
    }
    let (any_double, doubles, ints) = contagion(args, token.clone())?;
    if doubles[1] == 0.0 {
        return Err(FuelError::runtime("division by zero", token));
    }
    if any_double {
        Ok(Value::Double(doubles[0] % doubles[1]))
    } else {
        Ok(Value::Int(ints[0] % ints[1]))
    }
}

/// Bind an already-registered function value under an additional alias name.
pub fn alias(scope: &Rc<Scope>, existing: &str, alias: &str) {
    if let Some(v) = scope.resolve(existing) {
        scope.define(alias, v);
    }
}

pub fn register(scope: &Rc<Scope>) {
    register_add(scope);
    register_sub(scope);
    register_mul(scope);
    register_div(scope);
    register_rem(scope);
    alias(scope, "+", "add");
    alias(scope, "-", "sub");
    alias(scope, "*", "mul");
    alias(scope, "/", "div");
}
