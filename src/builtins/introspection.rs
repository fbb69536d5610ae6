//! Introspection primitives: `vars argscount arg args trace gettrace
//! tickcount fuel copyright help doc searchdoc nop`.

use crate::config;
use crate::error::FuelError;
use crate::help::{format_help_entry, format_quick_reference, get_help, search_help};
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;
use std::time::Instant;

thread_local! {
    static START: Instant = Instant::now();
}

fn additional_args(scope: &Rc<Scope>) -> Vec<Value> {
    scope
        .resolve("_additionalArgs")
        .and_then(|v| v.as_list().map(|items| items.to_vec()))
        .unwrap_or_default()
}

#[builtin(name = "vars", category = "Introspection")]
/// The names bound in the current (innermost local) scope.
pub fn vars(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::list(scope.binding_names().into_iter().map(Value::symbol).collect()))
}

#[builtin(name = "argscount", category = "Introspection", related(arg, args))]
/// The number of actual arguments beyond the declared formals, in the
/// current function call.
pub fn argscount(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::Int(additional_args(scope).len() as i64))
}

#[builtin(name = "arg", category = "Introspection", related(argscount, args))]
/// The excess actual argument at a zero-based index, or `nil` if out of
/// range.
pub fn arg(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let index = args
        .first()
        .and_then(Value::as_f64)
        .ok_or_else(|| FuelError::semantic("'arg' expects a numeric index", token))? as i64;
    if index < 0 {
        return Ok(Value::Nil);
    }
    Ok(additional_args(scope).get(index as usize).cloned().unwrap_or(Value::Nil))
}

#[builtin(name = "args", category = "Introspection", related(argscount, arg))]
/// All excess actual arguments of the current function call, as a list.
pub fn args(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::list(additional_args(scope)))
}

#[builtin(name = "trace", category = "Introspection", related(gettrace))]
/// Turns the global call trace on or off (defaults to turning it on); the
/// trace buffer is consulted by `(gettrace)`.
pub fn trace(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let enabled = args.first().map(Value::is_truthy).unwrap_or(true);
    scope.global().tracing.set(enabled);
    Ok(Value::Bool(enabled))
}

#[builtin(name = "gettrace", category = "Introspection", related(trace))]
/// The call trace accumulated since tracing was turned on, as a list of
/// strings naming each evaluated call's head, oldest first.
pub fn gettrace(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::list(scope.global().trace_log.borrow().iter().map(Value::string).collect()))
}

#[builtin(name = "tickcount", category = "Introspection")]
/// Milliseconds elapsed since the interpreter started.
pub fn tickcount(_args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let elapsed = START.with(|start| start.elapsed());
    Ok(Value::Int(elapsed.as_millis() as i64))
}

#[builtin(name = "fuel", category = "Introspection")]
/// The interpreter's version string.
pub fn fuel(_args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::string(config::VERSION))
}

#[builtin(name = "copyright", category = "Introspection")]
/// The interpreter's welcome banner.
pub fn copyright(_args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::string(format!("{}\n{}", config::WELCOME_MESSAGE, config::WELCOME_SUBTITLE)))
}

#[builtin(name = "help", category = "Introspection", related(doc, searchdoc))]
/// With no argument, a quick reference of every function by category; with
/// a name, that function's full documentation entry.
pub fn help(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match args.first() {
        None => Ok(Value::string(format_quick_reference())),
        Some(v) => {
            let name = v.as_symbol().or_else(|| if let Value::String(s) = v { Some(s.as_ref()) } else { None });
            let token = scope.current_token.borrow().clone();
            let name = name.ok_or_else(|| FuelError::semantic("'help' expects a symbol or string", token.clone()))?;
            match get_help(name) {
                Some(entry) => Ok(Value::string(format_help_entry(&entry))),
                None => Err(FuelError::runtime(format!("no help found for '{}'", name), token)),
            }
        }
    }
}

#[builtin(name = "doc", category = "Introspection", related(help, searchdoc))]
/// A function's one-line description, as a bare string.
pub fn doc(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'doc' expects 1 argument", token.clone()))?;
    let name = v
        .as_symbol()
        .or_else(|| if let Value::String(s) = v { Some(s.as_ref()) } else { None })
        .ok_or_else(|| FuelError::semantic("'doc' expects a symbol or string", token.clone()))?;
    match get_help(name) {
        Some(entry) => Ok(Value::string(entry.description)),
        None => Err(FuelError::runtime(format!("no documentation for '{}'", name), token)),
    }
}

#[builtin(name = "searchdoc", category = "Introspection", related(doc, help))]
/// The names of every function whose name, description, or examples
/// mention a substring.
pub fn searchdoc(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let query = match args.first() {
        Some(Value::String(s)) => s.to_string(),
        Some(Value::Symbol(s)) => s.to_string(),
        _ => return Err(FuelError::semantic("'searchdoc' expects a string or symbol", token)),
    };
    Ok(Value::list(search_help(&query).into_iter().map(|e| Value::symbol(e.name)).collect()))
}

#[builtin(name = "nop", category = "Introspection")]
/// Does nothing; always returns `nil`.
pub fn nop(_args: &[Value], _scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(Value::Nil)
}

pub fn register(scope: &Rc<Scope>) {
    register_vars(scope);
    register_argscount(scope);
    register_arg(scope);
    register_args(scope);
    register_trace(scope);
    register_gettrace(scope);
    register_tickcount(scope);
    register_fuel(scope);
    register_copyright(scope);
    register_help(scope);
    register_doc(scope);
    register_searchdoc(scope);
    register_nop(scope);
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

    fn run(src: &str, scope: &Rc<Scope>) -> Value {
        let ast = read(&tokenize(src).unwrap(), scope).unwrap();
        eval(ast, scope).unwrap()
    }

    #[test]
    fn args_and_argscount_see_excess_actuals() {
        let scope = root();
        let v = run("(do (defn f (a) (list (argscount) (arg 0) (args))) (f 1 2 3))", &scope);
        let items = v.as_list().unwrap();
        assert!(matches!(items[0], Value::Int(2)));
        assert!(matches!(items[1], Value::Int(2)));
        assert_eq!(items[2].as_list().unwrap().len(), 2);
    }

    #[test]
    fn trace_then_gettrace_reports_call_heads() {
        let scope = root();
        run("(trace)", &scope);
        run("(+ 1 2)", &scope);
        let log = run("(gettrace)", &scope);
        let names: Vec<String> = log.as_list().unwrap().iter().map(|v| v.to_string()).collect();
        assert!(names.iter().any(|n| n == "+"));
    }

    #[test]
    fn doc_returns_description_for_known_builtin() {
        let scope = root();
        let v = run("(doc 'first)", &scope);
        assert!(matches!(v, Value::String(_)));
    }

    #[test]
    fn searchdoc_finds_related_names() {
        let scope = root();
        let v = run("(searchdoc \"nth\")", &scope);
        let names: Vec<String> = v.as_list().unwrap().iter().filter_map(|v| v.as_symbol().map(str::to_string)).collect();
        assert!(names.contains(&"nth".to_string()));
    }

    #[test]
    fn nop_is_nil() {
        let scope = root();
        assert!(matches!(run("(nop)", &scope), Value::Nil));
    }

    #[test]
    fn tickcount_is_nonnegative() {
        let scope = root();
        let v = run("(tickcount)", &scope);
        assert!(matches!(v, Value::Int(n) if n >= 0));
    }
}
