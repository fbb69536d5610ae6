//! Console I/O primitives: `print println readline`.

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::Value;
use fuel_macros::builtin;
use std::rc::Rc;

fn joined(args: &[Value]) -> String {
    args.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" ")
}

#[builtin(name = "print", category = "Console I/O", related(println))]
/// Writes every argument, space-separated, with no trailing newline.
pub fn print(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    scope.output.write(&joined(args));
    Ok(Value::Nil)
}

#[builtin(name = "println", category = "Console I/O", related(print))]
/// Like `print`, followed by a newline.
pub fn println(args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    scope.output.write_line(&joined(args));
    Ok(Value::Nil)
}

#[builtin(name = "readline", category = "Console I/O")]
/// Reads one line from the configured input source; `nil` at end of input.
pub fn readline(_args: &[Value], scope: &Rc<Scope>) -> Result<Value, FuelError> {
    Ok(scope.input.read_line("").map(Value::string).unwrap_or(Value::Nil))
}

pub fn register(scope: &Rc<Scope>) {
    register_print(scope);
    register_println(scope);
    register_readline(scope);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CapturingWriter, QueuedReader};

    #[test]
    fn print_has_no_trailing_newline() {
        let w = Rc::new(CapturingWriter::new());
        let s = Scope::new_global(Rc::new(QueuedReader::new(vec![])), w.clone());
        register(&s);
        print(&[Value::Int(1), Value::Int(2)], &s).unwrap();
        assert_eq!(w.contents(), "1 2");
    }

    #[test]
    fn readline_returns_queued_line() {
        let s = Scope::new_global(Rc::new(QueuedReader::new(vec!["hi".to_string()])), Rc::new(CapturingWriter::new()));
        register(&s);
        let r = readline(&[], &s).unwrap();
        assert!(matches!(r, Value::String(s) if &*s == "hi"));
    }

    #[test]
    fn readline_at_eof_is_nil() {
        let s = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
        register(&s);
        assert!(matches!(readline(&[], &s).unwrap(), Value::Nil));
    }
}
