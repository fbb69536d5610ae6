//! `define-macro-eval`.
//!
//! `define-macro-expand` is recognized structurally by
//! [`crate::macro_expander::expand_compile_time`] during its compile-time
//! pre-pass and normally never reaches the evaluator at all. It is
//! registered here too, as an ordinary special form, purely so that code
//! which builds and evaluates it dynamically (through `eval`/`evalstr`,
//! after the pre-pass has already run) still registers the macro instead
//! of erroring on an unrecognized head.

use crate::error::FuelError;
use crate::macro_expander::parse_macro_definition;
use crate::scope::Scope;
use crate::value::{Macro, Value};
use fuel_macros::builtin;
use std::rc::Rc;

fn define(args: &[Value], scope: &Rc<Scope>, who: &str, wrap: impl Fn(crate::value::MacroDef) -> Macro) -> Result<Value, FuelError> {
    let mut items = Vec::with_capacity(args.len() + 1);
    items.push(Value::symbol(who));
    items.extend_from_slice(args);
    let (name, def) = parse_macro_definition(&items)?;
    scope.define_macro(name, wrap(def));
    Ok(Value::Nil)
}

#[builtin(name = "define-macro-eval", category = "Macros", related(define_macro_expand), special_form)]
/// Registers a macro that is substituted at every call site immediately
/// before that call is evaluated, on every evaluation (unlike
/// `define-macro-expand`, which expands once over the whole program ahead
/// of time).
///
/// # Examples
///
/// ```lisp
/// (define-macro-eval unless (cond body) (if cond nil body))
/// ```
pub fn define_macro_eval(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    define(args, scope, "define-macro-eval", Macro::RuntimeEval)
}

#[builtin(name = "define-macro-expand", category = "Macros", related(define_macro_eval), special_form)]
/// Registers a macro that is expanded once, structurally, over the whole
/// program before evaluation begins. Ordinarily consumed entirely by the
/// compile-time pre-pass; reaching the evaluator only happens for macros
/// defined dynamically (e.g. from within `evalstr`).
pub fn define_macro_expand(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    define(args, scope, "define-macro-expand", Macro::CompileTimeExpand)
}

pub fn register(scope: &Rc<Scope>) {
    register_define_macro_eval(scope);
    register_define_macro_expand(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::eval::eval;
    use crate::io::{CapturingWriter, QueuedReader};
    use crate::reader::read;
    use crate::tokenizer::tokenize;

    fn root() -> Rc<Scope> {
        let scope = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
        register_builtins(&scope);
        scope
    }

    #[test]
    fn runtime_macro_expands_on_every_call() {
        let scope = root();
        let ast = read(&tokenize("(define-macro-eval unless (cond body) (if cond nil body))").unwrap(), &scope).unwrap();
        eval(ast, &scope).unwrap();
        assert!(scope.lookup_macro("unless").is_some());

        let call = read(&tokenize("(unless nil 42)").unwrap(), &scope).unwrap();
        let result = eval(call, &scope).unwrap();
        assert!(matches!(result, Value::Int(42)));
    }
}
