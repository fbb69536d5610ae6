// ABOUTME: FuelError and the five error kinds produced across the pipeline

use crate::token::Token;
use crate::value::Value;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

/// Where in the pipeline an error originated. `DebuggerStop` is not a
/// failure at all -- it is how a breakpoint hit or a `(break)` call
/// unwinds out of the evaluator and back into the debugger's own loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Lexical,
    Syntactic,
    Semantic,
    Runtime,
    DebuggerStop,
    /// Not a failure: how `(return expr)` unwinds to the nearest enclosing
    /// function call, which catches it and yields `payload` as the call's
    /// result. Reuses the `Result` plumbing instead of a parallel return
    /// channel through every evaluator call site.
    Return,
    /// Not a failure: the debugger's `restart` command unwinds all the way
    /// to the facade, which re-runs the current script from the top in a
    /// fresh global scope without leaving the process.
    Restart,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ErrorKind::Lexical => "lexical error",
            ErrorKind::Syntactic => "syntax error",
            ErrorKind::Semantic => "semantic error",
            ErrorKind::Runtime => "runtime error",
            ErrorKind::DebuggerStop => "debugger stop",
            ErrorKind::Return => "return",
            ErrorKind::Restart => "restart",
        };
        write!(f, "{}", s)
    }
}

/// An error carrying the token where it was raised, if any, and a snapshot
/// of the call stack (module names, innermost first) at the point of
/// raising. Only the top-level facade and the debugger's REPL catch these;
/// there is no `try`/`catch` construct inside FUEL scripts.
#[derive(Error, Debug, Clone)]
#[error("{kind}: {message}")]
pub struct FuelError {
    pub kind: ErrorKind,
    pub message: String,
    pub token: Option<Rc<Token>>,
    pub stack: Vec<String>,
    /// Only populated for `ErrorKind::Return`: the value `(return expr)` is
    /// carrying back to its enclosing function call.
    pub payload: Option<Value>,
}

impl FuelError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, token: Option<Rc<Token>>) -> Self {
        FuelError {
            kind,
            message: message.into(),
            token,
            stack: Vec::new(),
            payload: None,
        }
    }

    pub fn lexical(message: impl Into<String>, token: Option<Rc<Token>>) -> Self {
        FuelError::new(ErrorKind::Lexical, message, token)
    }

    pub fn syntactic(message: impl Into<String>, token: Option<Rc<Token>>) -> Self {
        FuelError::new(ErrorKind::Syntactic, message, token)
    }

    pub fn semantic(message: impl Into<String>, token: Option<Rc<Token>>) -> Self {
        FuelError::new(ErrorKind::Semantic, message, token)
    }

    pub fn runtime(message: impl Into<String>, token: Option<Rc<Token>>) -> Self {
        FuelError::new(ErrorKind::Runtime, message, token)
    }

    pub fn debugger_stop(message: impl Into<String>) -> Self {
        FuelError::new(ErrorKind::DebuggerStop, message, None)
    }

    pub fn is_debugger_stop(&self) -> bool {
        self.kind == ErrorKind::DebuggerStop
    }

    /// The signal `(return expr)` raises to unwind to its enclosing call.
    pub fn return_signal(value: Value) -> Self {
        let mut e = FuelError::new(ErrorKind::Return, "return", None);
        e.payload = Some(value);
        e
    }

    pub fn is_return(&self) -> bool {
        self.kind == ErrorKind::Return
    }

    /// The signal the debugger's `restart` command raises to unwind to the
    /// facade, which re-runs the script from the top in a fresh scope.
    pub fn restart_signal() -> Self {
        FuelError::new(ErrorKind::Restart, "restart", None)
    }

    pub fn is_restart(&self) -> bool {
        self.kind == ErrorKind::Restart
    }

    /// Attach a stack frame, innermost first, as the error unwinds.
    pub fn with_frame(mut self, module_name: impl Into<String>) -> Self {
        self.stack.push(module_name.into());
        self
    }

    pub fn line(&self) -> Option<u32> {
        self.token.as_ref().map(|t| t.line)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_kind_and_message() {
        let e = FuelError::runtime("division by zero", None);
        assert_eq!(format!("{}", e), "runtime error: division by zero");
    }

    #[test]
    fn with_frame_appends_innermost_first() {
        let e = FuelError::semantic("undefined symbol", None)
            .with_frame("inner")
            .with_frame("outer");
        assert_eq!(e.stack, vec!["inner".to_string(), "outer".to_string()]);
    }

    #[test]
    fn restart_is_distinguished_from_debugger_stop() {
        let e = FuelError::restart_signal();
        assert!(e.is_restart());
        assert!(!e.is_debugger_stop());
        let e2 = FuelError::debugger_stop("exited");
        assert!(!e2.is_restart());
    }

    #[test]
    fn debugger_stop_is_distinguished() {
        let e = FuelError::debugger_stop("breakpoint hit");
        assert!(e.is_debugger_stop());
        let e2 = FuelError::runtime("boom", None);
        assert!(!e2.is_debugger_stop());
    }
}
