// ABOUTME: Compile-time macro expansion pass and the shared substitution rule

use crate::error::FuelError;
use crate::scope::Scope;
use crate::value::{Macro, MacroDef, Value};
use std::rc::Rc;

/// `define-macro-expand`'s registration form name. Recognized structurally
/// during the pre-pass so the defining node can evaporate after it runs its
/// side effect (registering the macro).
const DEFINE_MACRO_EXPAND: &str = "define-macro-expand";

/// Run the compile-time macro expansion pre-pass over a freshly-read AST to
/// a fixed point: `define-macro-expand` forms register their macro and are
/// removed; every call site naming a registered compile-time macro is
/// replaced, in place, by its substituted body. Repeats until a full pass
/// produces no further change, so macros may expand into other macro calls.
pub fn expand_compile_time(ast: Value, scope: &Rc<Scope>) -> Result<Value, FuelError> {
    let mut current = ast;
    loop {
        let (next, changed) = expand_once(&current, scope)?;
        if !changed {
            return Ok(next);
        }
        current = next;
    }
}

fn expand_once(node: &Value, scope: &Rc<Scope>) -> Result<(Value, bool), FuelError> {
    let items = match node {
        Value::List(items) => items,
        other => return Ok((other.clone(), false)),
    };

    if let Some(def) = try_parse_macro_definition(items) {
        let (name, macro_def) = def?;
        scope.define_macro(name, Macro::CompileTimeExpand(macro_def));
        // The definition form evaporates once registered.
        return Ok((Value::Nil, true));
    }

    if let Some(Value::Symbol(head)) = items.first() {
        if let Some(m) = scope.lookup_macro(head) {
            if let Macro::CompileTimeExpand(def) = m.as_ref() {
                let args = &items[1..];
                if args.len() != def.formals.len() {
                    return Err(FuelError::semantic(
                        format!(
                            "macro '{}' expects {} argument(s), got {}",
                            head,
                            def.formals.len(),
                            args.len()
                        ),
                        None,
                    ));
                }
                let expanded = substitute(&def.body, &def.formals, args);
                return Ok((expanded, true));
            }
        }
    }

    // Not a macro form: recurse into children, tracking whether any changed.
    let mut changed = false;
    let mut new_items = Vec::with_capacity(items.len());
    for item in items.iter() {
        let (next, this_changed) = expand_once(item, scope)?;
        changed |= this_changed;
        new_items.push(next);
    }
    if changed {
        Ok((Value::list(new_items), true))
    } else {
        Ok((node.clone(), false))
    }
}

fn try_parse_macro_definition(
    items: &[Value],
) -> Option<Result<(String, MacroDef), FuelError>> {
    let head = items.first()?.as_symbol()?;
    if head != DEFINE_MACRO_EXPAND {
        return None;
    }
    Some(parse_macro_definition(items))
}

/// Shared by both `define-macro-eval` and `define-macro-expand`: `(KEYWORD
/// NAME (formals...) BODY)`.
pub fn parse_macro_definition(items: &[Value]) -> Result<(String, MacroDef), FuelError> {
    if items.len() != 4 {
        return Err(FuelError::syntactic(
            "macro definition requires (KEYWORD name (formals...) body)",
            None,
        ));
    }
    let name = items[1]
        .as_symbol()
        .ok_or_else(|| FuelError::syntactic("macro name must be a symbol", None))?
        .to_string();
    let formal_list = items[2]
        .as_list()
        .ok_or_else(|| FuelError::syntactic("macro formals must be a list", None))?;
    let mut formals = Vec::with_capacity(formal_list.len());
    for f in formal_list {
        let s = f
            .as_symbol()
            .ok_or_else(|| FuelError::syntactic("macro formal must be a symbol", None))?;
        formals.push(Rc::from(s));
    }
    Ok((
        name,
        MacroDef {
            formals,
            body: items[3].clone(),
        },
    ))
}

/// Structural substitution: every node in `body` that equals a formal symbol
/// by name is replaced by the corresponding unevaluated argument subtree. A
/// list argument is inlined as a sub-list -- there is no splicing here, only
/// `unquote-splicing` inside quasiquotation splices.
pub fn substitute(body: &Value, formals: &[Rc<str>], args: &[Value]) -> Value {
    match body {
        Value::Symbol(s) => {
            for (formal, arg) in formals.iter().zip(args.iter()) {
                if **formal == **s {
                    return arg.clone();
                }
            }
            body.clone()
        }
        Value::List(items) => {
            let replaced: Vec<Value> = items
                .iter()
                .map(|item| substitute(item, formals, args))
                .collect();
            Value::list(replaced)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::{CapturingWriter, QueuedReader};
    use crate::reader::read;
    use crate::tokenizer::tokenize;

    fn root() -> Rc<Scope> {
        Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()))
    }

    fn read_src(scope: &Rc<Scope>, src: &str) -> Value {
        read(&tokenize(src).unwrap(), scope).unwrap()
    }

    #[test]
    fn definition_form_evaporates_and_registers() {
        let scope = root();
        let ast = read_src(&scope, "(do (define-macro-expand twice (x) (+ x x)) (twice 21))");
        let expanded = expand_compile_time(ast, &scope).unwrap();
        let items = expanded.as_list().unwrap();
        // "do" NIL (+ 21 21)
        assert_eq!(items.len(), 3);
        assert!(matches!(items[1], Value::Nil));
        let call = items[2].as_list().unwrap();
        assert_eq!(call[0].as_symbol(), Some("+"));
    }

    #[test]
    fn expansion_reaches_fixed_point_across_macro_calls() {
        let scope = root();
        let ast = read_src(
            &scope,
            "(do (define-macro-expand inc (x) (+ x 1)) (define-macro-expand incincr (x) (inc (inc x))) (incincr 5))",
        );
        let expanded = expand_compile_time(ast, &scope).unwrap();
        let items = expanded.as_list().unwrap();
        let call = items[3].as_list().unwrap();
        // (+ (+ 5 1) 1)
        assert_eq!(call[0].as_symbol(), Some("+"));
        assert!(matches!(call[2], Value::Int(1)));
        let inner = call[1].as_list().unwrap();
        assert_eq!(inner[0].as_symbol(), Some("+"));
    }

    #[test]
    fn substitute_inlines_list_argument_whole() {
        let formals: Vec<Rc<str>> = vec![Rc::from("x")];
        let body = Value::list(vec![Value::symbol("list"), Value::symbol("x")]);
        let args = vec![Value::list(vec![Value::Int(1), Value::Int(2)])];
        let result = substitute(&body, &formals, &args);
        let items = result.as_list().unwrap();
        assert_eq!(items[0].as_symbol(), Some("list"));
        assert!(matches!(&items[1], Value::List(l) if l.len() == 2));
    }
}
