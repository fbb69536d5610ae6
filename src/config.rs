// ABOUTME: Version info, welcome banner, and static help text for the CLI/REPL

pub const VERSION: &str = "0.9.0";
pub const WELCOME_MESSAGE: &str = "FUEL(isp) -- a Fast Usable Embeddable Lisp";
pub const WELCOME_SUBTITLE: &str = "Type (help) for a quick reference, (exit) to leave.";

pub const HELP_TEXT: &str = r#"
Available commands:
  (exit) or (quit)     - Exit the REPL
  (help)               - Show a quick reference of all functions
  (help 'name)         - Show documentation for one function or special form
  (doc name)           - Return a function's docstring as a string

Type any FUEL expression to evaluate it. Use Ctrl-D or (exit) to quit.
"#;

pub const BUILTINS_SUMMARY: &str = r#"
Control:        if do while def defn fn lambda setf gdef gdefn
                quote quasiquote unquote unquote-splicing return
                eval evalstr apply map reduce import
Arithmetic:     + - * / % add sub mul div
Comparison:     = == != < > <= >= equal
Logic:          and or not !
Lists:          list cons first car cdr last rest nth len append reverse push pop
Strings:        string str sym trim lower-case upper-case search replace slice
                parse-integer parse-float
Types:          type typestr int float
Console I/O:    print println readline
Macros:         define-macro-eval define-macro-expand
Introspection:  vars argscount arg args trace gettrace tickcount
                fuel copyright help doc searchdoc nop

Type (help) for the full, per-category listing.
"#;
