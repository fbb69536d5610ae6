use clap::Parser;
use fuel::config;
use fuel::debugger::Debugger;
use fuel::highlighter::LispHelper;
use fuel::io::{StdinReader, StdoutWriter};
use fuel::scope::Scope;
use fuel::builtins;
use fuel::eval as run_eval;
use rustyline::error::ReadlineError;
use rustyline::{Config, Editor};
use std::path::PathBuf;
use std::rc::Rc;

/// FUEL(isp) -- a fast, usable, embeddable Lisp interpreter.
#[derive(Parser, Debug)]
#[command(name = "fuel")]
#[command(version = config::VERSION)]
#[command(about = "An embeddable Lisp interpreter with a built-in stepping debugger")]
struct CliArgs {
    /// Script file to execute (a valid script is one top-level expression;
    /// if omitted, starts the interactive REPL)
    #[arg(value_name = "FILE")]
    script: Option<PathBuf>,

    /// Module name tagged onto error messages and debugger breakpoints
    #[arg(long = "module", value_name = "NAME")]
    module: Option<String>,

    /// Enable the global call trace from startup
    #[arg(long = "trace")]
    trace: bool,

    /// Directory searched by `import`, in addition to the current directory
    /// (can be repeated)
    #[arg(long = "lib-path", value_name = "DIR", action = clap::ArgAction::Append)]
    lib_paths: Vec<PathBuf>,

    /// Attach the stepping debugger before running
    #[arg(long = "debug")]
    debug: bool,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let scope = Scope::new_global(Rc::new(StdinReader), Rc::new(StdoutWriter));
    builtins::register_builtins(&scope);
    scope.set_lib_paths(args.lib_paths.clone());
    if args.trace {
        scope.tracing.set(true);
    }
    if args.debug {
        *scope.debugger.borrow_mut() = Some(Rc::new(Debugger::new()));
    }

    if let Some(path) = &args.script {
        return run_script(path, &scope, args.module.as_deref());
    }

    run_repl(&scope, args.module.as_deref())
}

fn run_script(path: &PathBuf, scope: &Rc<Scope>, module: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("cannot read script file {}: {}", path.display(), e))?;
    let module_name = module
        .map(str::to_string)
        .unwrap_or_else(|| path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_else(|| "script".to_string()));

    match run_eval(&contents, Some(scope.clone()), Some(&module_name), false, None, None) {
        Ok(_) => Ok(()),
        Err(e) if e.is_debugger_stop() => Ok(()),
        Err(e) => Err(format!("{}", e).into()),
    }
}

fn run_repl(scope: &Rc<Scope>, module: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let module_name = module.unwrap_or("repl").to_string();

    let rl_config = Config::builder().auto_add_history(true).build();
    let mut rl = Editor::with_config(rl_config).map_err(|e| format!("failed to initialize REPL: {}", e))?;
    rl.set_helper(Some(LispHelper::new()));

    let history_file = ".fuel_history";
    let _ = rl.load_history(history_file);

    println!("{}", config::WELCOME_MESSAGE);
    println!("{}", config::WELCOME_SUBTITLE);

    loop {
        match rl.readline("FUEL(isp)> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                if trimmed == "(exit)" || trimmed == "(quit)" {
                    println!("Goodbye!");
                    break;
                }
                match run_eval(&line, Some(scope.clone()), Some(&module_name), false, None, None) {
                    Ok(value) => println!("=> {}", value),
                    Err(e) if e.is_debugger_stop() => {
                        println!("Goodbye!");
                        break;
                    }
                    Err(e) => eprintln!("Exception: {}", e.message),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                println!("\nGoodbye!");
                break;
            }
            Err(err) => {
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    let _ = rl.save_history(history_file);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn script_module_name_falls_back_to_file_stem() {
        let path = PathBuf::from("examples/demo.fuel");
        let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned());
        assert_eq!(stem, Some("demo".to_string()));
    }
}
