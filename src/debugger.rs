// ABOUTME: Breakpoints, step/over/out predicates, and the interactive debugger REPL

use crate::error::FuelError;
use crate::eval::eval;
use crate::reader::read;
use crate::scope::Scope;
use crate::tokenizer::tokenize;
use crate::token::Token;
use crate::value::Value;
use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

/// A single breakpoint: fires when the module matches (or is unset),
/// the line matches, and the optional condition evaluates truthy.
#[derive(Clone)]
pub struct Breakpoint {
    pub line: u32,
    pub module: String,
    pub condition: Option<Value>,
    pub condition_text: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum DebuggerState {
    Running,
    Stopped,
}

/// The predicate capturing "should the next call stop execution", as a
/// closure over the call-stack depth observed when the command was issued.
#[derive(Clone, Copy)]
enum StopMode {
    /// `run`: never stop except on an explicit breakpoint.
    Run,
    /// `step`: stop at the very next call.
    Step,
    /// `over`: stop once depth has returned to at most the recorded depth.
    Over(usize),
    /// `out`: stop once depth is strictly less than the recorded depth.
    Out(usize),
}

impl StopMode {
    fn should_stop(&self, depth: usize) -> bool {
        match self {
            StopMode::Run => false,
            StopMode::Step => true,
            StopMode::Over(recorded) => depth <= *recorded,
            StopMode::Out(recorded) => depth < *recorded,
        }
    }
}

/// A distinguished control-flow signal: the debugger REPL's `exit` raised it
/// to unwind cleanly back to the facade, the same way a `(return ...)`
/// unwinds a function body.
pub fn stop_debugging_error() -> FuelError {
    FuelError::debugger_stop("debugger exited")
}

pub struct Debugger {
    state: Cell<DebuggerState>,
    mode: RefCell<StopMode>,
    breakpoints: RefCell<Vec<Breakpoint>>,
    sources: RefCell<HashMap<String, String>>,
    selected_frame: Cell<usize>,
}

impl Default for Debugger {
    fn default() -> Self {
        Self::new()
    }
}

impl Debugger {
    pub fn new() -> Self {
        Debugger {
            state: Cell::new(DebuggerState::Running),
            mode: RefCell::new(StopMode::Run),
            breakpoints: RefCell::new(Vec::new()),
            sources: RefCell::new(HashMap::new()),
            selected_frame: Cell::new(0),
        }
    }

    pub fn register_source(&self, module: impl Into<String>, text: impl Into<String>) {
        self.sources.borrow_mut().insert(module.into(), text.into());
    }

    /// `(line, module)`-keyed replace, per the data model's equality rule.
    pub fn set_breakpoint(&self, bp: Breakpoint) {
        let mut bps = self.breakpoints.borrow_mut();
        if let Some(existing) = bps
            .iter_mut()
            .find(|b| b.line == bp.line && b.module == bp.module)
        {
            *existing = bp;
        } else {
            bps.push(bp);
        }
    }

    pub fn clear_breakpoint(&self, index: usize) -> bool {
        let mut bps = self.breakpoints.borrow_mut();
        if index == 0 || index > bps.len() {
            return false;
        }
        bps.remove(index - 1);
        true
    }

    pub fn clear_all_breakpoints(&self) {
        self.breakpoints.borrow_mut().clear();
    }

    pub fn breakpoints(&self) -> Vec<Breakpoint> {
        self.breakpoints.borrow().clone()
    }

    fn breakpoint_fires(&self, scope: &Rc<Scope>, token: &Token) -> Result<bool, FuelError> {
        let module = scope.module_name.borrow().clone();
        for bp in self.breakpoints.borrow().iter() {
            if (bp.module.is_empty() || bp.module == module) && bp.line == token.line {
                match &bp.condition {
                    None => return Ok(true),
                    Some(cond) => {
                        if eval(cond.clone(), scope)?.is_truthy() {
                            return Ok(true);
                        }
                    }
                }
            }
        }
        Ok(false)
    }

    /// Called once at the top of the evaluator, before every call. Returns
    /// true when a breakpoint fires or the active step/over/out predicate
    /// says to stop; the evaluator then drives the REPL before proceeding.
    pub fn needs_break(&self, scope: &Rc<Scope>, token: &Token) -> Result<bool, FuelError> {
        if self.breakpoint_fires(scope, token)? {
            return Ok(true);
        }
        Ok(self.mode.borrow().should_stop(scope.call_depth()))
    }

    /// Blocks synchronously on `scope`'s input stream, printing to its
    /// output stream, until the user issues a command that resumes
    /// execution (`run`/`step`/`over`/`out`) or `exit`s the whole program.
    pub fn repl(&self, scope: &Rc<Scope>) -> Result<(), FuelError> {
        self.state.set(DebuggerState::Stopped);
        self.selected_frame.set(0);
        let frames = call_stack_frames(scope);
        loop {
            let prompt = "FUEL(isp)-DBG> ";
            let Some(line) = scope.input.read_line(prompt) else {
                return Err(stop_debugging_error());
            };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let mut words = line.split_whitespace();
            let command = words.next().unwrap_or("").to_ascii_lowercase();
            let rest = line[command.len()..].trim();

            match command.as_str() {
                "help" | "h" => scope.output.write_line(HELP_TEXT),
                "version" => scope.output.write_line(crate::config::VERSION),
                "about" => scope.output.write_line(crate::config::WELCOME_MESSAGE),
                "code" | "c" => self.print_code(scope, &frames),
                "stack" | "k" => self.print_stack(&frames),
                "up" | "u" => self.move_frame(&frames, 1),
                "down" | "d" => self.move_frame(&frames, -1),
                "run" | "r" => {
                    *self.mode.borrow_mut() = StopMode::Run;
                    self.state.set(DebuggerState::Running);
                    return Ok(());
                }
                "step" | "s" => {
                    *self.mode.borrow_mut() = StopMode::Step;
                    self.state.set(DebuggerState::Running);
                    return Ok(());
                }
                "over" | "v" => {
                    *self.mode.borrow_mut() = StopMode::Over(scope.call_depth());
                    self.state.set(DebuggerState::Running);
                    return Ok(());
                }
                "out" | "o" => {
                    *self.mode.borrow_mut() = StopMode::Out(scope.call_depth());
                    self.state.set(DebuggerState::Running);
                    return Ok(());
                }
                "break" | "b" => self.handle_break(scope, rest),
                "clear" => self.handle_clear(scope, rest),
                "list" | "t" => self.print_breakpoints(scope),
                "locals" | "l" => self.print_bindings(&frames, true),
                "globals" | "g" => self.print_bindings(&frames, false),
                "modules" => self.print_modules(&frames),
                "builtins" => scope.output.write_line(&crate::help::format_quick_reference()),
                "funcs" => self.print_funcs(&frames),
                "macros" => self.print_macros(scope),
                "doc" => self.print_doc(scope, rest),
                "searchdoc" => self.print_searchdoc(scope, rest),
                "restart" => return Err(FuelError::restart_signal()),
                "exit" | "quit" | "q" => return Err(stop_debugging_error()),
                _ => self.eval_in_frame(&frames, line),
            }
        }
    }

    fn selected(&self, frames: &[Rc<Scope>]) -> Rc<Scope> {
        let idx = self.selected_frame.get().min(frames.len().saturating_sub(1));
        frames[idx].clone()
    }

    fn move_frame(&self, frames: &[Rc<Scope>], delta: i64) {
        let cur = self.selected_frame.get() as i64;
        let next = (cur + delta).clamp(0, frames.len().saturating_sub(1) as i64);
        self.selected_frame.set(next as usize);
    }

    fn eval_in_frame(&self, frames: &[Rc<Scope>], line: &str) {
        let scope = self.selected(frames);
        match tokenize(line).and_then(|tokens| read(&tokens, &scope)) {
            Ok(form) => match eval(form, &scope) {
                Ok(v) => scope.output.write_line(&format!("{}", v)),
                Err(e) => scope.output.write_line(&format!("Exception: {}", e.message)),
            },
            Err(e) => scope.output.write_line(&format!("Exception: {}", e.message)),
        }
    }

    fn print_stack(&self, frames: &[Rc<Scope>]) {
        for (i, frame) in frames.iter().enumerate() {
            let marker = if i == self.selected_frame.get() { "-->" } else { "   " };
            frame.output.write_line(&format!("{} #{} {}", marker, i, frame.module_name.borrow()));
        }
    }

    fn print_code(&self, scope: &Rc<Scope>, frames: &[Rc<Scope>]) {
        let frame = self.selected(frames);
        let module = frame.module_name.borrow().clone();
        let line = frame.current_token.borrow().as_ref().map(|t| t.line).unwrap_or(0);
        let sources = self.sources.borrow();
        let Some(src) = sources.get(&module) else {
            scope.output.write_line("(no source available for this module)");
            return;
        };
        let bp_lines: std::collections::HashSet<u32> = self
            .breakpoints
            .borrow()
            .iter()
            .filter(|b| b.module.is_empty() || b.module == module)
            .map(|b| b.line)
            .collect();
        for (i, text) in src.lines().enumerate() {
            let n = (i + 1) as u32;
            let marker = if n == line { "-->" } else { "   " };
            let bp = if bp_lines.contains(&n) { "*" } else { " " };
            scope.output.write_line(&format!("{}{}{:4} {}", marker, bp, n, text));
        }
    }

    fn handle_break(&self, scope: &Rc<Scope>, rest: &str) {
        if rest.is_empty() {
            scope.output.write_line("usage: break [module:]line [condition]");
            return;
        }
        let mut parts = rest.splitn(2, ' ');
        let location = parts.next().unwrap_or("");
        let condition_text = parts.next().map(|s| s.trim().to_string()).filter(|s| !s.is_empty());
        let (module, line_str) = match location.split_once(':') {
            Some((m, l)) => (m.to_string(), l),
            None => (String::new(), location),
        };
        let Ok(line) = line_str.parse::<u32>() else {
            scope.output.write_line("invalid line number");
            return;
        };
        let condition = match &condition_text {
            Some(text) => match tokenize(text).and_then(|tokens| read(&tokens, scope)) {
                Ok(v) => Some(v),
                Err(e) => {
                    scope.output.write_line(&format!("invalid condition: {}", e.message));
                    return;
                }
            },
            None => None,
        };
        self.set_breakpoint(Breakpoint {
            line,
            module,
            condition,
            condition_text,
        });
        scope.output.write_line("breakpoint set");
    }

    fn handle_clear(&self, scope: &Rc<Scope>, rest: &str) {
        if rest.is_empty() {
            scope.output.write_line("clear all breakpoints? (y/n)");
            if let Some(answer) = scope.input.read_line("") {
                if answer.trim().eq_ignore_ascii_case("y") {
                    self.clear_all_breakpoints();
                    scope.output.write_line("all breakpoints cleared");
                }
            }
            return;
        }
        match rest.trim().parse::<usize>() {
            Ok(n) if self.clear_breakpoint(n) => scope.output.write_line("breakpoint cleared"),
            _ => scope.output.write_line("no such breakpoint"),
        }
    }

    fn print_breakpoints(&self, scope: &Rc<Scope>) {
        for (i, bp) in self.breakpoints.borrow().iter().enumerate() {
            let module = if bp.module.is_empty() { "*" } else { &bp.module };
            let cond = bp.condition_text.as_deref().unwrap_or("");
            scope.output.write_line(&format!("{}: {}:{} {}", i + 1, module, bp.line, cond));
        }
    }

    fn print_bindings(&self, frames: &[Rc<Scope>], locals: bool) {
        let frame = self.selected(frames);
        let scope = if locals { frame.clone() } else { frame.global() };
        let mut names = scope.binding_names();
        names.sort();
        for name in names {
            if let Some(v) = scope.resolve(&name) {
                frame.output.write_line(&format!("{} = {}", name, v));
            }
        }
    }

    fn print_modules(&self, frames: &[Rc<Scope>]) {
        let frame = self.selected(frames);
        let mut modules: Vec<String> = frames.iter().map(|f| f.module_name.borrow().clone()).collect();
        modules.sort();
        modules.dedup();
        for m in modules {
            frame.output.write_line(&m);
        }
    }

    fn print_funcs(&self, frames: &[Rc<Scope>]) {
        let frame = self.selected(frames);
        let mut names = frame.global().binding_names();
        names.sort();
        for name in names {
            if matches!(frame.global().resolve(&name), Some(Value::Function(_))) {
                frame.output.write_line(&name);
            }
        }
    }

    fn print_macros(&self, scope: &Rc<Scope>) {
        let mut names = scope.macro_names();
        names.sort();
        for name in names {
            scope.output.write_line(&name);
        }
    }

    fn print_doc(&self, scope: &Rc<Scope>, name: &str) {
        if let Some(entry) = crate::help::get_help(name) {
            scope.output.write_line(&crate::help::format_help_entry(&entry));
        } else {
            scope.output.write_line(&format!("no documentation for '{}'", name));
        }
    }

    fn print_searchdoc(&self, scope: &Rc<Scope>, needle: &str) {
        for name in crate::help::all_names() {
            if name.contains(needle) {
                scope.output.write_line(&name);
            }
        }
    }
}

fn call_stack_frames(scope: &Rc<Scope>) -> Vec<Rc<Scope>> {
    let mut frames = vec![scope.clone()];
    let mut cur = scope.clone();
    while let Some(caller) = cur.caller_scope() {
        frames.push(caller.clone());
        cur = caller;
    }
    frames
}

const HELP_TEXT: &str = "\
Debugger commands:
  help/h            show this help
  version           show interpreter version
  about             show welcome banner
  code/c            show source with current line and breakpoint markers
  stack/k           show call stack
  up/u down/d       move selected frame
  run/r             resume until next breakpoint
  step/s            stop at the next call
  over/v            stop when back at this depth
  out/o             stop when shallower than this depth
  break/b [module:]line [cond]   set a breakpoint
  clear [n]         clear breakpoint n, or all if omitted
  list/t            list breakpoints
  locals/l          show local bindings in the selected frame
  globals/g         show global bindings
  modules           list known modules
  builtins          list builtin functions
  funcs             list user/global functions
  macros            list registered macros
  doc [name]        show documentation for name
  searchdoc name    search documentation
  restart           restart the script from the top
  exit/quit/q       leave the debugger and stop running
Anything else is evaluated as a FUEL expression in the selected frame.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn breakpoint_insertion_is_idempotent_by_line_and_module() {
        let dbg = Debugger::new();
        dbg.set_breakpoint(Breakpoint {
            line: 10,
            module: "m".into(),
            condition: None,
            condition_text: None,
        });
        dbg.set_breakpoint(Breakpoint {
            line: 10,
            module: "m".into(),
            condition: None,
            condition_text: Some("replaced".into()),
        });
        assert_eq!(dbg.breakpoints().len(), 1);
        assert_eq!(dbg.breakpoints()[0].condition_text.as_deref(), Some("replaced"));
    }

    #[test]
    fn clear_by_one_based_index() {
        let dbg = Debugger::new();
        dbg.set_breakpoint(Breakpoint { line: 1, module: "a".into(), condition: None, condition_text: None });
        dbg.set_breakpoint(Breakpoint { line: 2, module: "a".into(), condition: None, condition_text: None });
        assert!(dbg.clear_breakpoint(1));
        assert_eq!(dbg.breakpoints().len(), 1);
        assert_eq!(dbg.breakpoints()[0].line, 2);
    }

    #[test]
    fn stop_modes_match_depth_rules() {
        assert!(StopMode::Step.should_stop(0));
        assert!(StopMode::Over(3).should_stop(3));
        assert!(StopMode::Over(3).should_stop(2));
        assert!(!StopMode::Over(3).should_stop(4));
        assert!(StopMode::Out(3).should_stop(2));
        assert!(!StopMode::Out(3).should_stop(3));
        assert!(!StopMode::Run.should_stop(100));
    }
}
