//! Type primitives: `type typestr int float`.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

#[builtin(name = "type", category = "Types", related(typestr))]
/// The numeric type code of a value (see the external interface's type
/// table: 0 Undefined, 1 Nil, 2 Bool, 3 Int, 4 Double, 5 String, 6 List,
/// 7 Function, 8 Symbol, 9 NativeObject, 10 Error).
pub fn type_of(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'type' expects 1 argument", token))?;
    Ok(Value::Int(v.type_code()))
}

#[builtin(name = "typestr", category = "Types", related(type_of))]
/// The type name of a value, as a lowercase string.
pub fn typestr(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'typestr' expects 1 argument", token))?;
    Ok(Value::string(v.type_name().to_lowercase()))
}

#[builtin(name = "int", category = "Types", related(float))]
/// Coerces a value to `Int`; `Undefined` if it cannot be coerced (a
/// non-numeric string, for instance).
pub fn int(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'int' expects 1 argument", token))?;
    Ok(match v {
        Value::Int(i) => Value::Int(*i),
        Value::Double(d) => Value::Int(*d as i64),
        Value::Bool(b) => Value::Int(if *b { 1 } else { 0 }),
        Value::String(s) => s.trim().parse::<i64>().map(Value::Int).unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    })
}

#[builtin(name = "float", category = "Types", related(int))]
/// Coerces a value to `Double`; `Undefined` if it cannot be coerced.
pub fn float(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'float' expects 1 argument", token))?;
    Ok(match v {
        Value::Int(i) => Value::Double(*i as f64),
        Value::Double(d) => Value::Double(*d),
        Value::Bool(b) => Value::Double(if *b { 1.0 } else { 0.0 }),
        Value::String(s) => s.trim().parse::<f64>().map(Value::Double).unwrap_or(Value::Undefined),
        _ => Value::Undefined,
    })
}

pub fn register(scope: &Rc<Scope>) {
    register_type_of(scope);
    register_typestr(scope);
    register_int(scope);
    register_float(scope);
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
    fn type_codes_match_table() {
        let s = root();
        assert!(matches!(type_of(&[Value::Int(1)], &s).unwrap(), Value::Int(3)));
        assert!(matches!(type_of(&[Value::Nil], &s).unwrap(), Value::Int(1)));
    }

    #[test]
    fn typestr_is_lowercase() {
        let s = root();
        let r = typestr(&[Value::Int(1)], &s).unwrap();
        assert!(matches!(r, Value::String(s) if &*s == "int"));
    }

    #[test]
    fn int_on_non_numeric_string_is_undefined() {
        let s = root();
        let r = int(&[Value::string("not-a-number")], &s).unwrap();
        assert!(matches!(r, Value::Undefined));
    }

    #[test]
    fn float_coerces_int() {
        let s = root();
        assert!(matches!(float(&[Value::Int(3)], &s).unwrap(), Value::Double(d) if d == 3.0));
    }
}
