// ABOUTME: The crate's single public entry point, composing tokenizer -> reader -> macro expander -> evaluator

use crate::builtins::register_builtins;
use crate::error::FuelError;
use crate::io::{LispReader, LispWriter, StdinReader, StdoutWriter};
use crate::macro_expander::expand_compile_time;
use crate::reader::read;
use crate::scope::Scope;
use crate::tokenizer::tokenize;
use crate::value::Value;
use std::rc::Rc;

/// Evaluate one top-level FUEL expression end to end: tokenize, read, expand
/// compile-time macros, then evaluate.
///
/// `scope` lets a caller reuse a scope across repeated calls (a REPL, or an
/// embedder driving several scripts against shared global state); when
/// omitted a fresh global scope is built with the builtin library already
/// registered. `module_name` tags the source for error messages and
/// debugger breakpoints, defaulting to `"script"`. `writer`/`reader` are only
/// consulted when building a fresh scope -- they have no effect if `scope`
/// is supplied, since a scope already carries its own.
///
/// If a debugger is attached to the scope and evaluation fails with an
/// ordinary error (not a `(return ...)` or a debugger `exit`), the error is
/// printed and the debugger's REPL is entered post-mortem so the failure can
/// be inspected before it propagates to the caller.
///
/// The debugger's `restart` command unwinds here as a distinguished signal
/// rather than a plain error: `eval` catches it and re-runs `source` from
/// the top in a fresh global scope (same reader/writer/debugger/lib-paths),
/// without returning to the caller.
pub fn eval(
    source: &str,
    scope: Option<Rc<Scope>>,
    module_name: Option<&str>,
    tracing: bool,
    writer: Option<Rc<dyn LispWriter>>,
    reader: Option<Rc<dyn LispReader>>,
) -> Result<Value, FuelError> {
    let mut scope = scope.unwrap_or_else(|| {
        let scope = Scope::new_global(
            reader.unwrap_or_else(|| Rc::new(StdinReader)),
            writer.unwrap_or_else(|| Rc::new(StdoutWriter)),
        );
        register_builtins(&scope);
        scope
    });

    let module_name = module_name.unwrap_or("script");

    loop {
        *scope.module_name.borrow_mut() = module_name.to_string();
        if let Some(debugger) = scope.debugger.borrow().clone() {
            debugger.register_source(module_name, source);
        }
        if tracing {
            scope.tracing.set(true);
        }

        let result = (|| {
            let tokens = tokenize(source)?;
            let ast = read(&tokens, &scope)?;
            let ast = expand_compile_time(ast, &scope)?;
            crate::eval::eval(ast, &scope)
        })();

        match result {
            Ok(value) => return Ok(value),
            Err(e) if e.is_return() || e.is_debugger_stop() => return Err(e),
            Err(e) if e.is_restart() => {
                scope = fresh_scope_from(&scope);
                continue;
            }
            Err(e) => {
                if let Some(debugger) = scope.debugger.borrow().clone() {
                    scope.output.write_line(&format!("Exception: {}", e.message));
                    match debugger.repl(&scope) {
                        Err(e2) if e2.is_restart() => {
                            scope = fresh_scope_from(&scope);
                            continue;
                        }
                        _ => {}
                    }
                }
                return Err(e);
            }
        }
    }
}

/// Build a brand-new global scope that keeps the prior one's I/O
/// collaborators, attached debugger, and `import` library path, so
/// `restart` drops every user/global binding without losing the session's
/// surrounding configuration.
fn fresh_scope_from(previous: &Rc<Scope>) -> Rc<Scope> {
    let scope = Scope::new_global(Rc::clone(&previous.input), Rc::clone(&previous.output));
    register_builtins(&scope);
    *scope.debugger.borrow_mut() = previous.debugger.borrow().clone();
    scope.set_lib_paths(previous.lib_paths());
    scope
}
