// Black-box string-handling tests driven through the full tokenize -> read ->
// evaluate pipeline via `fuel::eval`, rather than calling builtins directly
// (those are already covered in src/builtins/strings.rs's own unit tests).

use fuel::io::{CapturingWriter, QueuedReader};
use fuel::scope::Scope;
use fuel::value::Value;
use std::rc::Rc;

fn run(src: &str) -> Value {
    let scope = Scope::new_global(Rc::new(QueuedReader::new(vec![])), Rc::new(CapturingWriter::new()));
    fuel::builtins::register_builtins(&scope);
    fuel::eval(src, Some(scope), None, false, None, None).unwrap()
}

#[test]
fn string_concatenation_via_plus() {
    let v = run(r#"(+ "foo" "bar")"#);
    assert_eq!(v.to_string(), "foobar");
}

#[test]
fn string_conversion_of_non_string_values() {
    assert_eq!(run("(string 42)").to_string(), "42");
    assert_eq!(run("(string #t)").to_string(), "#t");
}

#[test]
fn sym_turns_a_string_into_a_symbol() {
    let v = run(r#"(sym "x")"#);
    assert_eq!(v.as_symbol(), Some("x"));
}

#[test]
fn trim_strips_leading_and_trailing_whitespace() {
    assert_eq!(run(r#"(trim "  padded  ")"#).to_string(), "padded");
}

#[test]
fn case_conversion_round_trips() {
    assert_eq!(run(r#"(upper-case "shout")"#).to_string(), "SHOUT");
    assert_eq!(run(r#"(lower-case "WHISPER")"#).to_string(), "whisper");
}

#[test]
fn search_returns_the_character_index_of_a_substring() {
    let v = run(r#"(search "hello world" "lo w")"#);
    assert!(matches!(v, Value::Int(3)));
}

#[test]
fn search_returns_nil_when_not_found() {
    let v = run(r#"(search "hello world" "xyz")"#);
    assert!(matches!(v, Value::Nil));
}

#[test]
fn replace_substitutes_every_occurrence() {
    assert_eq!(run(r#"(replace "a-b-c" "-" "_")"#).to_string(), "a_b_c");
}

#[test]
fn slice_supports_negative_indices_from_the_end() {
    assert_eq!(run(r#"(slice "this is a string" 8 -1)"#).to_string(), "a string");
}

#[test]
fn slice_end_index_is_inclusive() {
    assert_eq!(run(r#"(slice "cafe" 0 2)"#).to_string(), "caf");
}

#[test]
fn parse_integer_succeeds_and_fails_to_undefined() {
    assert!(matches!(run(r#"(parse-integer "42")"#), Value::Int(42)));
    assert!(matches!(run(r#"(parse-integer "nope")"#), Value::Undefined));
}

#[test]
fn parse_float_succeeds_and_fails_to_undefined() {
    assert!(matches!(run(r#"(parse-float "3.5")"#), Value::Double(d) if d == 3.5));
    assert!(matches!(run(r#"(parse-float "nope")"#), Value::Undefined));
}

#[test]
fn nth_on_a_string_indexes_a_single_character() {
    assert_eq!(run(r#"(nth 0 "hello")"#).to_string(), "h");
}

#[test]
fn string_printing_quotes_only_when_nested_inside_a_list() {
    assert_eq!(run(r#""bare""#).to_string(), "bare");
    assert_eq!(run(r#"(list "nested")"#).to_string(), "(\"nested\")");
}
