// ABOUTME: The tree-walking evaluator: recursive interpretation of an AST under a scope

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::{Callable, FunctionWrapper, Macro, Value};
use std::rc::Rc;

/// Evaluate a value tree under `scope`. The heart of the system: a literal
/// evaluates to itself, a symbol resolves through the lexical chain, an
/// empty list is `nil`, and anything else is a call.
pub fn eval(value: Value, scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match &value {
        Value::Undefined
        | Value::Nil
        | Value::Bool(_)
        | Value::Int(_)
        | Value::Double(_)
        | Value::String(_)
        | Value::Function(_)
        | Value::NativeObject(_)
        | Value::Error(_)
        | Value::Macro(_) => Ok(value),
        Value::Symbol(name) => scope.resolve(name).ok_or_else(|| {
            FuelError::semantic(format!("symbol '{}' not found", name), scope.current_token.borrow().clone())
        }),
        Value::List(items) if items.is_empty() => Ok(Value::Nil),
        Value::List(items) => eval_call(items, scope),
    }
}

fn eval_call(items: &Rc<Vec<Value>>, scope: &Rc<Scope>) -> Result<Value, FuelError> {
    if let Some(token) = scope.lookup_position(items) {
        scope.current_token.replace(Some(token.clone()));
        if let Some(debugger) = scope.debugger.borrow().clone() {
            if debugger.needs_break(scope, &token)? {
                debugger.repl(scope)?;
            }
        }
    }

    let head = &items[0];
    let args = &items[1..];

    let global = scope.global();
    if global.tracing.get() {
        global.trace_log.borrow_mut().push(head.to_string());
    }

    // A symbolic head naming a runtime macro is expanded against the
    // unevaluated argument subtrees, then the expansion is evaluated.
    if let Value::Symbol(name) = head {
        if let Some(m) = scope.lookup_macro(name) {
            if let Macro::RuntimeEval(def) = m.as_ref() {
                if args.len() != def.formals.len() {
                    return Err(FuelError::semantic(
                        format!(
                            "macro '{}' expects {} argument(s), got {}",
                            name,
                            def.formals.len(),
                            args.len()
                        ),
                        scope.current_token.borrow().clone(),
                    ));
                }
                let expanded = crate::macro_expander::substitute(&def.body, &def.formals, args);
                return eval(expanded, scope);
            }
        }
    }

    let callee = match head {
        Value::Symbol(name) => scope.resolve(name).ok_or_else(|| {
            FuelError::semantic(format!("Function {} not found", name), scope.current_token.borrow().clone())
        })?,
        other => eval(other.clone(), scope)?,
    };

    let Value::Function(wrapper) = callee else {
        return Err(FuelError::semantic(
            format!("{} is not callable", head),
            scope.current_token.borrow().clone(),
        ));
    };

    if wrapper.is_special_form {
        (wrapper.function)(args, scope)
    } else {
        let mut evaluated = Vec::with_capacity(args.len());
        for arg in args {
            evaluated.push(eval(arg.clone(), scope)?);
        }
        (wrapper.function)(&evaluated, scope)
    }
}

/// Invoke an already-resolved function value with already-evaluated
/// arguments, as `apply`/`map`/`reduce` need. Special forms cannot
/// meaningfully be invoked this way (there is no unevaluated subtree to give
/// them), so it is an error to pass one.
pub fn invoke(func: &Value, args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match func {
        Value::Function(wrapper) if !wrapper.is_special_form => (wrapper.function)(args, scope),
        Value::Function(_) => Err(FuelError::semantic(
            "cannot invoke a special form as a value",
            scope.current_token.borrow().clone(),
        )),
        other => Err(FuelError::semantic(
            format!("{} is not a function", other),
            scope.current_token.borrow().clone(),
        )),
    }
}

/// Evaluate a sequence of forms in order, returning the last one's value
/// (the implicit-last-expression rule). Any error, including a `(return
/// ...)` signal, propagates straight out -- this does NOT catch `Return`.
/// Used by `do`, and as the building block for function-body evaluation.
pub fn eval_sequence(forms: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let mut result = Value::Nil;
    for form in forms {
        result = eval(form.clone(), scope)?;
    }
    Ok(result)
}

/// Evaluate a function body: like [`eval_sequence`], but a `(return ...)`
/// that escapes is caught here -- the enclosing `do` the return unwinds to
/// is always a function call's body, never a bare `do` nested inside one.
pub fn eval_function_body(forms: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match eval_sequence(forms, scope) {
        Err(e) if e.is_return() => Ok(e.payload.clone().unwrap_or(Value::Nil)),
        other => other,
    }
}

/// Build the `Value::Function` for a `fn`/`lambda`/`defn`/`gdefn` closure.
/// Captures `defining_scope` for lexical resolution; each call creates a
/// fresh call frame linked to both the closure's defining scope (for lexical
/// lookups) and the live caller (for the debugger's call stack), per the
/// scope graph's separation of lexical parent from call-stack caller.
pub fn make_closure(formals: Vec<Rc<str>>, body: Vec<Value>, defining_scope: Rc<Scope>, signature: String) -> Value {
    let module_name = signature_module_name(&signature);
    let callable: Callable = Rc::new(move |args: &[Value], caller: &Rc<Scope>| {
        let call_scope = Scope::new_call(&defining_scope, caller, module_name.clone());
        for (i, formal) in formals.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::Nil);
            call_scope.define(formal.to_string(), value);
        }
        let extra: Vec<Value> = if args.len() > formals.len() {
            args[formals.len()..].to_vec()
        } else {
            Vec::new()
        };
        call_scope.define("_additionalArgs", Value::list(extra));
        eval_function_body(&body, &call_scope)
    });
    Value::Function(Rc::new(FunctionWrapper::new(callable, signature, String::new(), false, false)))
}

fn signature_module_name(signature: &str) -> String {
    signature
        .split_whitespace()
        .next()
        .unwrap_or("lambda")
        .trim_start_matches('(')
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builtins::register_builtins;
    use crate::io::{CapturingWriter, QueuedReader};
    use crate::reader::read;
    use crate::tokenizer::tokenize;

    fn root() -> Rc<Scope> {
        let scope = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
        register_builtins(&scope);
        scope
    }

    fn run(src: &str) -> Value {
        let scope = root();
        let ast = read(&tokenize(src).unwrap(), &scope).unwrap();
        eval(ast, &scope).unwrap()
    }

    #[test]
    fn literals_self_evaluate() {
        assert!(matches!(run("42"), Value::Int(42)));
        assert!(matches!(run("\"hi\""), Value::String(_)));
    }

    #[test]
    fn if_picks_branch() {
        assert!(matches!(run("(if #t (+ 1 2) (- 3 5))"), Value::Int(3)));
    }

    #[test]
    fn if_without_else_is_nil_on_false() {
        assert!(matches!(run("(if #f 1)"), Value::Nil));
    }

    #[test]
    fn closures_capture_defining_scope() {
        let v = run("(do (defn addx (delta) (lambda (x) (+ x delta))) (def addclosure (addx 41)) (addclosure 1))");
        assert!(matches!(v, Value::Int(42)));
    }

    #[test]
    fn unresolved_symbol_is_semantic_error() {
        let scope = root();
        let ast = read(&tokenize("nosuchvar").unwrap(), &scope).unwrap();
        assert!(eval(ast, &scope).is_err());
    }

    #[test]
    fn return_short_circuits_function_body_only() {
        let v = run("(do (defn f (x) (if (> x 0) (return 1) 0) 99) (f 5))");
        assert!(matches!(v, Value::Int(1)));
    }

    #[test]
    fn gdef_is_visible_globally_after_call_returns() {
        let v = run("(do (defn setup () (gdef shared 7)) (setup) shared)");
        assert!(matches!(v, Value::Int(7)));
    }

    #[test]
    fn local_def_inside_function_is_not_visible_to_caller() {
        let scope = root();
        let ast = read(&tokenize("(do (defn setup () (def local 7)) (setup))").unwrap(), &scope).unwrap();
        eval(ast, &scope).unwrap();
        assert!(scope.resolve("local").is_none());
    }

    #[test]
    fn tracing_records_call_heads_when_enabled() {
        let scope = root();
        scope.tracing.set(true);
        run_in(&scope, "(+ 1 2)");
        assert!(scope.trace_log.borrow().iter().any(|h| h == "+"));
    }

    fn run_in(scope: &Rc<Scope>, src: &str) -> Value {
        let ast = read(&tokenize(src).unwrap(), scope).unwrap();
        eval(ast, scope).unwrap()
    }
}
