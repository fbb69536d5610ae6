//! Control special forms: `if do while def defn fn lambda setf gdef gdefn
//! quote quasiquote unquote unquote-splicing return eval evalstr apply map
//! reduce import`.
//!
//! `if`/`do`/`while`/`def`/.../`quote` receive their argument subtrees
//! unevaluated, as special forms must to control which parts of a call get
//! evaluated at all (or get evaluated more than once, as `while`'s body
//! does). `eval`/`evalstr`/`apply`/`map`/`reduce` are ordinary functions:
//! their arguments are evaluated exactly once by the normal call path
//! before the primitive ever runs.

use crate::error::FuelError;
use crate::eval::{eval, eval_sequence, invoke, make_closure};
use crate::macro_expander::expand_compile_time;
use crate::reader::read_all;
use crate::scope::Scope;
use crate::tokenizer::tokenize;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

#[builtin(name = "if", category = "Control", special_form)]
/// Evaluates the condition; if truthy evaluates and returns the first
/// branch, otherwise the second (or `nil` if there is no second branch).
///
/// # Examples
///
/// ```lisp
/// (if (> x 0) "positive" "non-positive")
/// ```
pub fn if_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let cond = args.first().ok_or_else(|| FuelError::semantic("'if' requires a condition", token))?;
    if eval(cond.clone(), scope)?.is_truthy() {
        args.get(1).map(|e| eval(e.clone(), scope)).unwrap_or(Ok(Value::Nil))
    } else {
        args.get(2).map(|e| eval(e.clone(), scope)).unwrap_or(Ok(Value::Nil))
    }
}

#[builtin(name = "do", category = "Control", special_form)]
/// Evaluates every form in order, returning the value of the last one.
pub fn do_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    eval_sequence(args, scope)
}

#[builtin(name = "while", category = "Control", special_form)]
/// Repeatedly evaluates the body while the condition is truthy, returning
/// the value of the body's last iteration (`nil` if it never ran).
///
/// # Examples
///
/// ```lisp
/// (while (< i 10) (setf i (+ i 1)))
/// ```
pub fn while_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let cond = args.first().ok_or_else(|| FuelError::semantic("'while' requires a condition", token))?;
    let body = &args[1..];
    let mut result = Value::Nil;
    while eval(cond.clone(), scope)?.is_truthy() {
        result = eval_sequence(body, scope)?;
    }
    Ok(result)
}

fn target_name(v: &Value, who: &str, token: Option<Rc<crate::token::Token>>) -> Result<String, FuelError> {
    v.as_symbol()
        .map(|s| s.to_string())
        .ok_or_else(|| FuelError::semantic(format!("'{}' expects a symbol name", who), token))
}

#[builtin(name = "def", category = "Control", related(gdef), special_form)]
/// Binds a name in the current (local, block-scoped) environment.
pub fn def(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 2 {
        return Err(FuelError::semantic("'def' expects exactly 2 arguments", token));
    }
    let name = target_name(&args[0], "def", token)?;
    let value = eval(args[1].clone(), scope)?;
    scope.define(name, value.clone());
    Ok(value)
}

#[builtin(name = "gdef", category = "Control", related(def), special_form)]
/// Binds a name in the global environment regardless of where it is called
/// from.
pub fn gdef(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 2 {
        return Err(FuelError::semantic("'gdef' expects exactly 2 arguments", token));
    }
    let name = target_name(&args[0], "gdef", token)?;
    let value = eval(args[1].clone(), scope)?;
    scope.define_global(name, value.clone());
    Ok(value)
}

fn parse_formals(v: &Value, who: &str, token: Option<Rc<crate::token::Token>>) -> Result<Vec<Rc<str>>, FuelError> {
    let items = v
        .as_list()
        .ok_or_else(|| FuelError::semantic(format!("'{}' expects a formal parameter list", who), token.clone()))?;
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        let s = item
            .as_symbol()
            .ok_or_else(|| FuelError::semantic(format!("'{}' formal parameters must be symbols", who), token.clone()))?;
        out.push(Rc::from(s));
    }
    Ok(out)
}

#[builtin(name = "fn", category = "Control", related(lambda, defn), special_form)]
/// Builds an anonymous function closing over the defining scope.
///
/// # Examples
///
/// ```lisp
/// (fn (x y) (+ x y))
/// ```
pub fn fn_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let formals = parse_formals(args.first().ok_or_else(|| FuelError::semantic("'fn' expects a formal list", token.clone()))?, "fn", token)?;
    let body = args[1..].to_vec();
    let signature = format!("(lambda ({}) ...)", formals.join(" "));
    Ok(make_closure(formals, body, scope.clone(), signature))
}

#[builtin(name = "lambda", category = "Control", related(fn_), special_form)]
/// Alias of `fn`.
pub fn lambda(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    fn_(args, scope)
}

fn defn_impl(args: &[Value], scope: &Rc<Scope>, global: bool) -> Result<Value, FuelError> {
    let who = if global { "gdefn" } else { "defn" };
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic(format!("'{}' requires a name and a formal list", who), token));
    }
    let name = target_name(&args[0], who, token.clone())?;
    let formals = parse_formals(&args[1], who, token)?;
    let body = args[2..].to_vec();
    let signature = format!("({} ({}) ...)", name, formals.join(" "));
    let closure = make_closure(formals, body, scope.clone(), signature);
    if global {
        scope.define_global(name, closure.clone());
    } else {
        scope.define(name, closure.clone());
    }
    Ok(closure)
}

#[builtin(name = "defn", category = "Control", related(fn_, gdefn), special_form)]
/// Sugar for `(def name (fn (formals...) body...))`.
pub fn defn(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    defn_impl(args, scope, false)
}

#[builtin(name = "gdefn", category = "Control", related(defn, gdef), special_form)]
/// Like `defn`, but always binds the name globally.
pub fn gdefn(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    defn_impl(args, scope, true)
}

#[builtin(name = "setf", category = "Control", special_form)]
/// Generalized assignment, pattern-matched on the shape of its first
/// (unevaluated) argument: `(setf sym v)` rebinds a variable, `(setf (nth
/// k l) v)`/`(setf (first l) v)`/`(setf (last l) v)` replace an element of
/// the list bound to `l` and rebind `l` to the result. Returns the
/// assigned value.
///
/// # Examples
///
/// ```lisp
/// (do (def l (list 'a 'b 'c 'd)) (setf (nth 2 l) 9) l)
/// ```
pub fn setf(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() != 2 {
        return Err(FuelError::semantic("'setf' expects exactly 2 arguments", token));
    }
    let value = eval(args[1].clone(), scope)?;

    if let Value::Symbol(name) = &args[0] {
        if scope.resolve(name).is_none() {
            return Err(FuelError::semantic(
                format!("bad setf target: '{}' is not bound", name),
                token,
            ));
        }
        scope.set(name, value.clone());
        return Ok(value);
    }

    let target = args[0]
        .as_list()
        .ok_or_else(|| FuelError::semantic("'setf' target must be a symbol or (nth k l)/(first l)/(last l)", token.clone()))?;
    let head = target.first().and_then(Value::as_symbol).unwrap_or("");
    match head {
        "nth" if target.len() == 3 => {
            let index = eval(target[1].clone(), scope)?
                .as_f64()
                .ok_or_else(|| FuelError::semantic("'setf' nth index must be numeric", token.clone()))? as i64;
            let name = target_name(&target[2], "setf", token.clone())?;
            let list = scope
                .resolve(&name)
                .ok_or_else(|| FuelError::semantic(format!("symbol '{}' not found", name), token.clone()))?;
            let items = list.as_list().ok_or_else(|| FuelError::semantic("'setf' target is not a list", token.clone()))?;
            if index < 0 || index as usize >= items.len() {
                return Err(FuelError::runtime("'setf' index out of range", token));
            }
            let mut out = items.to_vec();
            out[index as usize] = value.clone();
            scope.set(&name, Value::list(out));
            Ok(value)
        }
        "first" if target.len() == 2 => {
            let name = target_name(&target[1], "setf", token.clone())?;
            let list = scope
                .resolve(&name)
                .ok_or_else(|| FuelError::semantic(format!("symbol '{}' not found", name), token.clone()))?;
            let items = list.as_list().ok_or_else(|| FuelError::semantic("'setf' target is not a list", token.clone()))?;
            let mut out = items.to_vec();
            if out.is_empty() {
                out.push(value.clone());
            } else {
                out[0] = value.clone();
            }
            scope.set(&name, Value::list(out));
            Ok(value)
        }
        "last" if target.len() == 2 => {
            let name = target_name(&target[1], "setf", token.clone())?;
            let list = scope
                .resolve(&name)
                .ok_or_else(|| FuelError::semantic(format!("symbol '{}' not found", name), token.clone()))?;
            let items = list.as_list().ok_or_else(|| FuelError::semantic("'setf' target is not a list", token.clone()))?;
            let mut out = items.to_vec();
            if let Some(last) = out.last_mut() {
                *last = value.clone();
            } else {
                out.push(value.clone());
            }
            scope.set(&name, Value::list(out));
            Ok(value)
        }
        _ => Err(FuelError::semantic("unrecognized 'setf' target shape", token)),
    }
}

#[builtin(name = "quote", category = "Control", special_form)]
/// Returns its argument unevaluated.
pub fn quote(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    args.first().cloned().ok_or_else(|| FuelError::semantic("'quote' expects 1 argument", token))
}

fn is_tagged(items: &[Value], tag: &str) -> bool {
    items.len() == 2 && matches!(items.first(), Some(Value::Symbol(s)) if &**s == tag)
}

fn quasi_one(node: &Value, scope: &Rc<Scope>) -> Result<Value, FuelError> {
    match node {
        Value::List(items) if is_tagged(items, "unquote") => eval(items[1].clone(), scope),
        Value::List(items) if is_tagged(items, "unquote-splicing") => Err(FuelError::semantic(
            "'unquote-splicing' used outside a list context",
            scope.current_token.borrow().clone(),
        )),
        Value::List(items) => Ok(Value::list(quasi_list(items, scope)?)),
        other => Ok(other.clone()),
    }
}

fn quasi_list(items: &[Value], scope: &Rc<Scope>) -> Result<Vec<Value>, FuelError> {
    let mut out = Vec::with_capacity(items.len());
    for item in items {
        if let Value::List(inner) = item {
            if is_tagged(inner, "unquote-splicing") {
                match eval(inner[1].clone(), scope)? {
                    Value::List(spliced) => out.extend(spliced.iter().cloned()),
                    Value::Nil => {}
                    _ => {
                        return Err(FuelError::semantic(
                            "'unquote-splicing' requires a list",
                            scope.current_token.borrow().clone(),
                        ))
                    }
                }
                continue;
            }
        }
        out.push(quasi_one(item, scope)?);
    }
    Ok(out)
}

#[builtin(name = "quasiquote", category = "Control", related(unquote), special_form)]
/// Returns its argument mostly unevaluated, except for `unquote` forms
/// (evaluated in place) and `unquote-splicing` forms (evaluated and
/// spliced into the enclosing list).
///
/// # Examples
///
/// ```lisp
/// (let ((x 1)) `(a ,x))
/// ```
pub fn quasiquote(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    quasi_one(args.first().ok_or_else(|| FuelError::semantic("'quasiquote' expects 1 argument", token))?, scope)
}

#[builtin(name = "unquote", category = "Control", related(quasiquote), special_form)]
/// Only meaningful inside `quasiquote`; evaluated directly, it is an error.
pub fn unquote(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Err(FuelError::semantic("'unquote' used outside quasiquote", scope.current_token.borrow().clone()))
}

#[builtin(name = "unquote-splicing", category = "Control", related(quasiquote), special_form)]
/// Only meaningful inside `quasiquote`; evaluated directly, it is an error.
pub fn unquote_splicing(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Err(FuelError::semantic("'unquote-splicing' used outside quasiquote", scope.current_token.borrow().clone()))
}

#[builtin(name = "return", category = "Control", special_form)]
/// Unwinds to the nearest enclosing function call, yielding its argument
/// (or `nil`) as that call's result.
pub fn return_(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let value = match args.first() {
        Some(expr) => eval(expr.clone(), scope)?,
        None => Value::Nil,
    };
    Err(FuelError::return_signal(value))
}

#[builtin(name = "eval", category = "Control")]
/// Evaluates an already-computed value as code (e.g. a list built by
/// `quote`/`quasiquote` or returned by `list`).
pub fn eval_builtin(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let v = args.first().ok_or_else(|| FuelError::semantic("'eval' expects 1 argument", token))?;
    eval(v.clone(), scope)
}

#[builtin(name = "evalstr", category = "Control", related(eval_builtin))]
/// Tokenizes, reads, compile-time-expands, and evaluates a string of FUEL
/// source.
pub fn evalstr(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let src = args
        .first()
        .and_then(|v| if let Value::String(s) = v { Some(s.to_string()) } else { None })
        .ok_or_else(|| FuelError::semantic("'evalstr' expects a string argument", token))?;
    let tokens = tokenize(&src)?;
    let ast = crate::reader::read(&tokens, scope)?;
    let expanded = expand_compile_time(ast, scope)?;
    eval(expanded, scope)
}

#[builtin(name = "apply", category = "Control")]
/// Calls a function with a list of arguments; any arguments before the
/// final list are prepended individually.
///
/// # Examples
///
/// ```lisp
/// (apply + (list 1 2 3))
/// ```
pub fn apply(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic("'apply' expects at least 2 arguments", token));
    }
    let func = &args[0];
    let mut call_args: Vec<Value> = args[1..args.len() - 1].to_vec();
    match args.last().unwrap() {
        Value::List(items) => call_args.extend(items.iter().cloned()),
        Value::Nil => {}
        other => call_args.push(other.clone()),
    }
    invoke(func, &call_args, scope)
}

#[builtin(name = "map", category = "Control")]
/// Applies a function across one or more lists in lockstep, collecting
/// the results; stops at the shortest list.
///
/// # Examples
///
/// ```lisp
/// (map (lambda (x) (* x x)) (list 1 2 3))
/// ```
pub fn map(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic("'map' expects a function and at least 1 list", token));
    }
    let func = &args[0];
    let lists: Vec<&[Value]> = args[1..]
        .iter()
        .map(|v| v.as_list().ok_or_else(|| FuelError::semantic("'map' expects list arguments", token.clone())))
        .collect::<Result<_, _>>()?;
    let len = lists.iter().map(|l| l.len()).min().unwrap_or(0);
    let mut out = Vec::with_capacity(len);
    for i in 0..len {
        let call_args: Vec<Value> = lists.iter().map(|l| l[i].clone()).collect();
        out.push(invoke(func, &call_args, scope)?);
    }
    Ok(Value::list(out))
}

#[builtin(name = "reduce", category = "Control")]
/// Folds a list from the left with a two-argument function, `(func acc
/// item)`. An explicit initial value may be given; otherwise the list's
/// first element seeds the accumulator.
///
/// # Examples
///
/// ```lisp
/// (reduce (lambda (x y) (* x y)) (list 2 3 4 5) 2)
/// ```
pub fn reduce(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    if args.len() < 2 {
        return Err(FuelError::semantic("'reduce' expects a function and a list", token));
    }
    let func = &args[0];
    let items = args[1].as_list().ok_or_else(|| FuelError::semantic("'reduce' expects a list", token.clone()))?;
    let (mut acc, rest): (Value, &[Value]) = if let Some(initial) = args.get(2) {
        (initial.clone(), items)
    } else {
        match items.split_first() {
            Some((first, rest)) => (first.clone(), rest),
            None => return Err(FuelError::semantic("'reduce' on an empty list requires an initial value", token)),
        }
    };
    for item in rest {
        acc = invoke(func, &[acc, item.clone()], scope)?;
    }
    Ok(acc)
}

#[builtin(name = "import", category = "Control", special_form)]
/// Loads a module by name or path, searched across the configured library
/// directories, reading and evaluating every top-level form it contains in
/// the calling scope.
pub fn import(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let token = scope.current_token.borrow().clone();
    let raw = args.first().ok_or_else(|| FuelError::semantic("'import' expects a module name", token.clone()))?;
    let name = match raw {
        Value::Symbol(s) => s.to_string(),
        Value::String(s) => s.to_string(),
        other => return Err(FuelError::semantic(format!("'import' expects a symbol or string, got {}", other), token)),
    };
    let file_name = if name.ends_with(".fuel") { name.clone() } else { format!("{}.fuel", name) };
    let mut candidates = scope.lib_paths();
    candidates.push(std::path::PathBuf::from("."));
    for dir in candidates {
        let path = dir.join(&file_name);
        if let Ok(source) = std::fs::read_to_string(&path) {
            let tokens = tokenize(&source)?;
            let forms = read_all(&tokens, scope)?;
            let ast = expand_compile_time(Value::list(forms), scope)?;
            return eval(ast, scope);
        }
    }
    Err(FuelError::runtime(format!("module '{}' not found", name), token))
}

pub fn register(scope: &Rc<Scope>) {
    register_if_(scope);
    register_do_(scope);
    register_while_(scope);
    register_def(scope);
    register_gdef(scope);
    register_fn_(scope);
    register_lambda(scope);
    register_defn(scope);
    register_gdefn(scope);
    register_setf(scope);
    register_quote(scope);
    register_quasiquote(scope);
    register_unquote(scope);
    register_unquote_splicing(scope);
    register_return_(scope);
    register_eval_builtin(scope);
    register_evalstr(scope);
    register_apply(scope);
    register_map(scope);
    register_reduce(scope);
    register_import(scope);
}
