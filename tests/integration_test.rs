// Black-box tests exercising the `fuel::eval` facade end to end: tokenizer,
// reader, compile-time macro expansion, and evaluator wired together exactly
// as an embedder would use them.

use fuel::debugger::{Breakpoint, Debugger};
use fuel::io::{CapturingWriter, QueuedReader};
use fuel::scope::Scope;
use fuel::value::Value;
use std::rc::Rc;

fn fresh_scope() -> Rc<Scope> {
    let scope = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
    fuel::builtins::register_builtins(&scope);
    scope
}

fn scope_with_capture() -> (Rc<Scope>, Rc<CapturingWriter>) {
    let writer = Rc::new(CapturingWriter::new());
    let scope = Scope::new_global(Rc::new(QueuedReader::new(vec![])), writer.clone());
    fuel::builtins::register_builtins(&scope);
    (scope, writer)
}

fn run(src: &str) -> Value {
    fuel::eval(src, Some(fresh_scope()), None, false, None, None).unwrap()
}

#[test]
fn scenario_1_if_picks_the_true_branch() {
    assert!(matches!(run("(if #t (+ 1 2) (- 3 5))"), Value::Int(3)));
}

#[test]
fn scenario_2_setf_nth_mutates_in_place() {
    let (scope, writer) = scope_with_capture();
    fuel::eval(
        "(do (def l '(a b c d)) (setf (nth 2 l) 9) (print l))",
        Some(scope),
        None,
        false,
        None,
        None,
    )
    .unwrap();
    assert_eq!(writer.contents(), "(a b 9 d)");
}

#[test]
fn scenario_3_closures_capture_their_defining_scope() {
    let (scope, writer) = scope_with_capture();
    fuel::eval(
        "(do (defn addx (delta) (lambda (x) (+ x delta))) (def addclosure (addx 41)) (println (addclosure 1)))",
        Some(scope),
        None,
        false,
        None,
        None,
    )
    .unwrap();
    assert_eq!(writer.contents(), "42\n");
}

#[test]
fn scenario_4_quasiquote_splices_and_unquotes() {
    let (scope, writer) = scope_with_capture();
    fuel::eval(
        "(do (def a 42) (def lst (list 6 8 12)) (println (quasiquote (1 2 3 ,a ,@lst))))",
        Some(scope),
        None,
        false,
        None,
        None,
    )
    .unwrap();
    assert_eq!(writer.contents(), "(1 2 3 42 6 8 12)\n");
}

#[test]
fn scenario_5_reduce_folds_with_a_seed() {
    let v = run("(reduce (lambda (x y) (* x y)) '(2 3 4 5) 2)");
    assert!(matches!(v, Value::Int(240)));
}

#[test]
fn scenario_6_pop_mutates_and_returns_the_first_element() {
    let (scope, writer) = scope_with_capture();
    fuel::eval(
        "(do (def l '(a b c)) (def a (pop l)) (print a l))",
        Some(scope),
        None,
        false,
        None,
        None,
    )
    .unwrap();
    assert_eq!(writer.contents(), "a (b c)");
}

#[test]
fn scenario_7_slice_takes_a_negative_end_index() {
    let v = run(r#"(do (def s "this is a string") (slice s 8 -1))"#);
    assert_eq!(v.to_string(), "a string");
}

#[test]
fn scenario_8_quasiquote_wraps_a_single_unquote() {
    let v = run("(do (def args '(1 2 3)) `(,(first args)))");
    let items = v.as_list().unwrap();
    assert_eq!(items.len(), 1);
    assert!(matches!(items[0], Value::Int(1)));
}

#[test]
fn boundary_if_false_with_no_else_is_nil() {
    assert!(matches!(run("(if false 1)"), Value::Nil));
}

#[test]
fn boundary_pop_on_empty_list_is_nil_and_list_stays_empty() {
    let v = run("(do (def l '()) (def popped (pop l)) (list popped l))");
    let items = v.as_list().unwrap();
    assert!(matches!(items[0], Value::Nil));
    assert!(items[1].is_nil());
}

#[test]
fn boundary_nth_on_a_string_returns_a_one_character_substring() {
    let v = run(r#"(nth 1 "hello")"#);
    assert_eq!(v.to_string(), "e");
}

#[test]
fn invariant_round_trip_through_print_and_read_back() {
    let scope = fresh_scope();
    let v = fuel::eval("'(1 2.5 \"three\" #t nil four)", Some(scope.clone()), None, false, None, None).unwrap();
    let printed = v.to_string();
    let reread = fuel::eval(&format!("'{}", printed), Some(scope), None, false, None, None).unwrap();
    assert_eq!(v.to_string(), reread.to_string());
}

#[test]
fn invariant_local_def_is_not_visible_after_return_but_gdef_is() {
    let scope = fresh_scope();
    fuel::eval("(defn setup () (def local 1) (gdef shared 2))", Some(scope.clone()), None, false, None, None).unwrap();
    fuel::eval("(setup)", Some(scope.clone()), None, false, None, None).unwrap();
    assert!(scope.resolve("local").is_none());
    assert!(matches!(scope.resolve("shared"), Some(Value::Int(2))));
}

#[test]
fn invariant_arithmetic_contagion_promotes_to_double_only_when_needed() {
    assert!(matches!(run("(type (+ 1 2.0))"), Value::Int(4)));
    assert!(matches!(run("(type (+ 1 2))"), Value::Int(3)));
}

#[test]
fn invariant_macro_fixed_point_expands_nested_macro_calls() {
    let v = run("(do (define-macro-expand twice (x) (+ x x)) (define-macro-expand quad (x) (twice (twice x))) (quad 5))");
    assert!(matches!(v, Value::Int(20)));
}

#[test]
fn invariant_debugger_breakpoint_insertion_is_idempotent() {
    let dbg = Debugger::new();
    dbg.set_breakpoint(Breakpoint { line: 3, module: "m".into(), condition: None, condition_text: None });
    dbg.set_breakpoint(Breakpoint { line: 3, module: "m".into(), condition: None, condition_text: None });
    assert_eq!(dbg.breakpoints().len(), 1);
}

#[test]
fn facade_reused_scope_makes_gdef_visible_to_later_calls() {
    let scope = fresh_scope();
    fuel::eval("(gdef total 0)", Some(scope.clone()), None, false, None, None).unwrap();
    fuel::eval("(setf total (+ total 10))", Some(scope.clone()), None, false, None, None).unwrap();
    let v = fuel::eval("total", Some(scope), None, false, None, None).unwrap();
    assert!(matches!(v, Value::Int(10)));
}

#[test]
fn runtime_macro_unless_passes_through_a_truthy_condition() {
    let v = run("(do (define-macro-eval unless (cond body) (if cond nil body)) (unless nil 42))");
    assert!(matches!(v, Value::Int(42)));
}

#[test]
fn a_script_with_more_than_one_top_level_form_is_a_syntax_error() {
    let result = fuel::eval("1 2", Some(fresh_scope()), None, false, None, None);
    assert!(result.is_err());
}
