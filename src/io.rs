// ABOUTME: Pluggable input/output collaborators used by the REPL, debugger, and (print)/(readline)

use std::cell::RefCell;
use std::io::Write as _;

/// Source of input lines for `(readline)` and the debugger's command prompt.
/// Swappable so embedders can drive FUEL without a real terminal.
pub trait LispReader {
    fn read_line(&self, prompt: &str) -> Option<String>;
}

/// Destination for `(print)`/`(println)` and diagnostic output. There is no
/// separate logging backend: every message FUEL emits, including debugger
/// transcripts, goes through this collaborator.
pub trait LispWriter {
    fn write(&self, text: &str);

    fn write_line(&self, text: &str) {
        self.write(text);
        self.write("\n");
    }
}

/// Default writer: stdout, unbuffered per call to match REPL expectations.
pub struct StdoutWriter;

impl LispWriter for StdoutWriter {
    fn write(&self, text: &str) {
        print!("{}", text);
        let _ = std::io::stdout().flush();
    }
}

/// Default reader backed by stdin; used outside of rustyline-driven REPL
/// contexts (e.g. `(readline)` calls from a script run non-interactively).
pub struct StdinReader;

impl LispReader for StdinReader {
    fn read_line(&self, prompt: &str) -> Option<String> {
        if !prompt.is_empty() {
            print!("{}", prompt);
            let _ = std::io::stdout().flush();
        }
        let mut buf = String::new();
        match std::io::stdin().read_line(&mut buf) {
            Ok(0) => None,
            Ok(_) => {
                if buf.ends_with('\n') {
                    buf.pop();
                    if buf.ends_with('\r') {
                        buf.pop();
                    }
                }
                Some(buf)
            }
            Err(_) => None,
        }
    }
}

/// In-memory writer used by tests and embedders that want to capture
/// everything a script prints instead of letting it reach stdout.
#[derive(Default)]
pub struct CapturingWriter {
    buffer: RefCell<String>,
}

impl CapturingWriter {
    pub fn new() -> Self {
        CapturingWriter {
            buffer: RefCell::new(String::new()),
        }
    }

    pub fn contents(&self) -> String {
        self.buffer.borrow().clone()
    }
}

impl LispWriter for CapturingWriter {
    fn write(&self, text: &str) {
        self.buffer.borrow_mut().push_str(text);
    }
}

/// In-memory reader used by tests to script `(readline)` interactions.
pub struct QueuedReader {
    lines: RefCell<std::collections::VecDeque<String>>,
}

impl QueuedReader {
    pub fn new(lines: Vec<String>) -> Self {
        QueuedReader {
            lines: RefCell::new(lines.into()),
        }
    }
}

impl LispReader for QueuedReader {
    fn read_line(&self, _prompt: &str) -> Option<String> {
        self.lines.borrow_mut().pop_front()
    }
}
