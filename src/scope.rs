// ABOUTME: Lexical environments, call-stack linkage, and the root scope's macro table

use crate::debugger::Debugger;
use crate::io::{LispReader, LispWriter};
use crate::token::Token;
use crate::value::{Macro, Value};
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::{Rc, Weak};

/// A lexical environment.
///
/// `parent` is the lexical enclosing scope (how closures capture bindings);
/// `caller` is a separate, weak link to the scope a call was made *from*,
/// used only to measure call-stack depth for the debugger's step/over/out
/// commands and to build a stack trace on error. Keeping the two links
/// distinct from one another is what lets a closure defined at module scope
/// be called from deep inside someone else's call stack without the
/// resulting scope chain becoming the call stack.
pub struct Scope {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Scope>>,
    global: RefCell<Weak<Scope>>,
    caller: RefCell<Option<Weak<Scope>>>,
    pub module_name: RefCell<String>,
    pub current_token: RefCell<Option<Rc<Token>>>,
    pub tracing: Cell<bool>,
    pub trace_log: RefCell<Vec<String>>,
    pub input: Rc<dyn LispReader>,
    pub output: Rc<dyn LispWriter>,
    pub debugger: RefCell<Option<Rc<Debugger>>>,
    macros: RefCell<HashMap<String, Rc<Macro>>>,
    /// Origin tokens for list forms, keyed by the `Rc<Vec<Value>>` allocation
    /// identity backing a `Value::List`. The reader populates this for every
    /// list it assembles so the evaluator can recover a call's source line
    /// for error reporting and debugger breakpoint matching without needing
    /// every `Value` variant to carry a token field. Only the root owns it.
    positions: RefCell<HashMap<usize, Rc<Token>>>,
    /// Directories searched by `import`, set once by the facade/CLI.
    lib_paths: RefCell<Vec<std::path::PathBuf>>,
}

impl Scope {
    /// Build a fresh root scope. Only the root owns the macro table;
    /// descendants delegate macro lookups to it through `global`.
    pub fn new_global(input: Rc<dyn LispReader>, output: Rc<dyn LispWriter>) -> Rc<Scope> {
        Rc::new_cyclic(|weak_self| Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: None,
            global: RefCell::new(weak_self.clone()),
            caller: RefCell::new(None),
            module_name: RefCell::new("global".to_string()),
            current_token: RefCell::new(None),
            tracing: Cell::new(false),
            trace_log: RefCell::new(Vec::new()),
            input,
            output,
            debugger: RefCell::new(None),
            macros: RefCell::new(HashMap::new()),
            positions: RefCell::new(HashMap::new()),
            lib_paths: RefCell::new(Vec::new()),
        })
    }

    /// A lexically nested scope (function body, `let`-style block) that
    /// shares the parent's position in the call stack.
    pub fn child(parent: &Rc<Scope>, module_name: impl Into<String>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
            global: RefCell::new(parent.global.borrow().clone()),
            caller: RefCell::new(parent.caller.borrow().clone()),
            module_name: RefCell::new(module_name.into()),
            current_token: RefCell::new(None),
            tracing: Cell::new(parent.tracing.get()),
            trace_log: RefCell::new(Vec::new()),
            input: Rc::clone(&parent.input),
            output: Rc::clone(&parent.output),
            debugger: RefCell::new(parent.debugger.borrow().clone()),
            macros: RefCell::new(HashMap::new()),
            positions: RefCell::new(HashMap::new()),
            lib_paths: RefCell::new(Vec::new()),
        })
    }

    /// A new call frame: lexically parented to the function's closure scope,
    /// but linked into the call stack via `caller`.
    pub fn new_call(closure: &Rc<Scope>, caller: &Rc<Scope>, module_name: impl Into<String>) -> Rc<Scope> {
        Rc::new(Scope {
            bindings: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(closure)),
            global: RefCell::new(closure.global.borrow().clone()),
            caller: RefCell::new(Some(Rc::downgrade(caller))),
            module_name: RefCell::new(module_name.into()),
            current_token: RefCell::new(None),
            tracing: Cell::new(closure.tracing.get()),
            trace_log: RefCell::new(Vec::new()),
            input: Rc::clone(&closure.input),
            output: Rc::clone(&closure.output),
            debugger: RefCell::new(closure.debugger.borrow().clone()),
            macros: RefCell::new(HashMap::new()),
            positions: RefCell::new(HashMap::new()),
            lib_paths: RefCell::new(Vec::new()),
        })
    }

    pub fn global(&self) -> Rc<Scope> {
        self.global
            .borrow()
            .upgrade()
            .expect("global scope dropped while a child scope still lives")
    }

    pub fn is_global(&self) -> bool {
        self.parent.is_none()
    }

    /// Local, block-scoped binding (`def`, function parameters).
    pub fn define(&self, name: impl Into<String>, value: Value) {
        self.bindings.borrow_mut().insert(name.into(), value);
    }

    /// Binds in the global scope regardless of where it is called from (`gdef`).
    pub fn define_global(&self, name: impl Into<String>, value: Value) {
        self.global().bindings.borrow_mut().insert(name.into(), value);
    }

    pub fn resolve(&self, name: &str) -> Option<Value> {
        if let Some(v) = self.bindings.borrow().get(name) {
            return Some(v.clone());
        }
        match &self.parent {
            Some(parent) => parent.resolve(name),
            None => None,
        }
    }

    /// `setf`: mutate the nearest enclosing binding in place. Callers are
    /// expected to have already confirmed the binding exists (`resolve`);
    /// this only falls back to inserting locally if that invariant is
    /// violated.
    pub fn set(&self, name: &str, value: Value) {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return;
        }
        match &self.parent {
            Some(parent) if parent.has_binding(name) => parent.set(name, value),
            _ => {
                self.bindings.borrow_mut().insert(name.to_string(), value);
            }
        }
    }

    fn has_binding(&self, name: &str) -> bool {
        if self.bindings.borrow().contains_key(name) {
            return true;
        }
        match &self.parent {
            Some(parent) => parent.has_binding(name),
            None => false,
        }
    }

    pub fn define_macro(&self, name: impl Into<String>, m: Macro) {
        self.global().macros.borrow_mut().insert(name.into(), Rc::new(m));
    }

    pub fn lookup_macro(&self, name: &str) -> Option<Rc<Macro>> {
        self.global().macros.borrow().get(name).cloned()
    }

    pub fn macro_names(&self) -> Vec<String> {
        self.global().macros.borrow().keys().cloned().collect()
    }

    pub fn binding_names(&self) -> Vec<String> {
        self.bindings.borrow().keys().cloned().collect()
    }

    /// Record the token a freshly-read list form originated from, keyed by
    /// the identity of its backing allocation. Called by the reader.
    pub fn record_position(&self, list: &Rc<Vec<Value>>, token: Rc<Token>) {
        self.global()
            .positions
            .borrow_mut()
            .insert(Rc::as_ptr(list) as usize, token);
    }

    /// Recover the token a list form originated from, if the reader recorded
    /// one for it. Used by the evaluator to update `current_token` before a
    /// call, and by error reporting.
    pub fn lookup_position(&self, list: &Rc<Vec<Value>>) -> Option<Rc<Token>> {
        self.global()
            .positions
            .borrow()
            .get(&(Rc::as_ptr(list) as usize))
            .cloned()
    }

    pub fn set_lib_paths(&self, paths: Vec<std::path::PathBuf>) {
        *self.global().lib_paths.borrow_mut() = paths;
    }

    pub fn lib_paths(&self) -> Vec<std::path::PathBuf> {
        self.global().lib_paths.borrow().clone()
    }

    /// The live scope this call was made from, if any (a weak link that may
    /// have been dropped). Used by the debugger to walk the call stack.
    pub fn caller_scope(&self) -> Option<Rc<Scope>> {
        self.caller.borrow().as_ref().and_then(|w| w.upgrade())
    }

    /// Depth of the call stack at this scope, counted by walking `caller`
    /// links. Used by the debugger's step/over/out predicates, which close
    /// over the depth observed at the moment the command was issued.
    pub fn call_depth(&self) -> usize {
        match self.caller.borrow().as_ref().and_then(|w| w.upgrade()) {
            Some(caller) => 1 + caller.call_depth(),
            None => 0,
        }
    }

    /// Module names from innermost call outward, for error stack traces.
    pub fn stack_trace(&self) -> Vec<String> {
        let mut frames = vec![self.module_name.borrow().clone()];
        let mut cur = self.caller.borrow().as_ref().and_then(|w| w.upgrade());
        while let Some(scope) = cur {
            frames.push(scope.module_name.borrow().clone());
            cur = scope.caller.borrow().as_ref().and_then(|w| w.upgrade());
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CapturingWriter, QueuedReader};

    fn root() -> Rc<Scope> {
        Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()))
    }

    #[test]
    fn resolves_through_lexical_parent() {
        let g = root();
        g.define("x", Value::Int(1));
        let child = Scope::child(&g, "child");
        assert_eq!(child.resolve("x").map(|v| matches!(v, Value::Int(1))), Some(true));
    }

    #[test]
    fn setf_mutates_existing_binding_in_enclosing_scope() {
        let g = root();
        g.define("x", Value::Int(1));
        let child = Scope::child(&g, "child");
        child.set("x", Value::Int(2));
        assert!(matches!(g.resolve("x"), Some(Value::Int(2))));
    }

    #[test]
    fn gdef_always_targets_global() {
        let g = root();
        let child = Scope::child(&g, "child");
        child.define_global("y", Value::Int(9));
        assert!(matches!(g.resolve("y"), Some(Value::Int(9))));
    }

    #[test]
    fn call_depth_follows_caller_not_lexical_parent() {
        let g = root();
        let caller = Scope::child(&g, "caller");
        let call = Scope::new_call(&g, &caller, "callee");
        assert_eq!(call.call_depth(), caller.call_depth() + 1);
    }
}
