//! Language behavior tests.
//!
//! Each test runs a complete script through `sprig_lang::run` and inspects the
//! value of its last statement.

use pretty_assertions::assert_eq;
use sprig_lang::{Environment, Error, ErrorCode, Interpreter, Value};

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn run(src: &str) -> Value {
    sprig_lang::run(src).unwrap_or_else(|e| panic!("run failed: {e}"))
}

fn run_err(src: &str) -> Error {
    match sprig_lang::run(src) {
        Ok(v)  => panic!("expected run to fail but it produced {v:?}"),
        Err(e) => e,
    }
}

/// Runs in an environment the test can inspect afterwards.
fn run_env(src: &str) -> Environment {
    let mut interp = Interpreter::new();
    interp.run(src).unwrap_or_else(|e| panic!("run failed: {e}"));
    interp.environment().clone()
}

fn int(n: i64) -> Value { Value::Int(n) }
fn text(s: &str) -> Value { Value::from(s) }

// ─── Arithmetic ──────────────────────────────────────────────────────────────

#[test]
fn int_addition() {
    assert_eq!(run("1 + 2"), int(3));
    assert_eq!(run("1 + 2 == 3"), Value::Bool(true));
}

#[test]
fn float_addition() {
    assert_eq!(run("1.0 + 0.5"), Value::Float(1.5));
}

#[test]
fn string_concatenation() {
    assert_eq!(run(r#""aa" + "bb""#), text("aabb"));
}

#[test]
fn number_plus_string_is_string() {
    assert_eq!(run(r#"10 + "10""#), text("1010"));
}

#[test]
fn invalid_plus_string() {
    assert_eq!(run(r#"nothing + "10""#), text("10"));
}

#[test]
fn invalid_in_arithmetic_is_zero() {
    assert_eq!(run("nothing * 3 + 1"), int(1));
}

#[test]
fn precedence_and_grouping() {
    assert_eq!(run("2 + 3 * 4"), int(14));
    assert_eq!(run("(2 + 3) * 4"), int(20));
    assert_eq!(run("1 << 2 + 1"), int(8));
    assert_eq!(run("7 & 3 | 8"), int(11));
}

#[test]
fn string_operands_in_numeric_operators() {
    assert_eq!(run(r#""6" * "7""#), int(42));
    assert_eq!(run(r#""1.5" - 1"#), Value::Float(0.5));
    assert_eq!(run(r#"-"true""#), int(-1));
    assert!(run(r#""abc" / 2"#).is_nan());
}

#[test]
fn arrays_and_functions_are_not_numbers() {
    assert!(run("+[5]").is_nan());
    assert!(run("-[]").is_nan());
    assert!(run(r#"-["3"]"#).is_nan());
    assert!(run("fn f() { 1 } -f").is_nan());
    assert!(run("[1] - [2]").is_nan());
    assert_eq!(run("[4] * 2"), int(8));
}

#[test]
fn integer_divide_by_zero_is_float() {
    assert_eq!(run("1 / 0"), Value::Float(f64::INFINITY));
    assert_eq!(run("-1 / 0").to_string(), "-Infinity");
}

// ─── Equality ────────────────────────────────────────────────────────────────

#[test]
fn weak_equality_crosses_types() {
    assert_eq!(run(r#"1 == "1""#), Value::Bool(true));
    assert_eq!(run(r#"1 != "1""#), Value::Bool(false));
}

#[test]
fn identity_does_not() {
    assert_eq!(run(r#"1 === "1""#), Value::Bool(false));
    assert_eq!(run(r#"1 !== "1""#), Value::Bool(true));
    assert_eq!(run("2 === 2"), Value::Bool(true));
}

#[test]
fn nan_equals_nothing() {
    assert_eq!(run("NaN == NaN"), Value::Bool(false));
    assert_eq!(run("NaN === NaN"), Value::Bool(false));
    assert_eq!(run("NaN < 1 || NaN > 1 || NaN <= NaN"), Value::Bool(false));
}

#[test]
fn comparisons_form_a_total_order() {
    let samples = [
        Value::Invalid,
        Value::Bool(true),
        int(1),
        int(-4),
        Value::Float(2.5),
        text("1"),
        text("abc"),
        text(""),
        Value::array(vec![int(1)]),
        Value::array(vec![int(1), int(2)]),
    ];
    for a in &samples {
        for b in &samples {
            let lt = a.binary(sprig_lang::syntax::ast::BinaryOp::Lt, b).to_bool();
            let eq = a.binary(sprig_lang::syntax::ast::BinaryOp::Eq, b).to_bool();
            let gt = a.binary(sprig_lang::syntax::ast::BinaryOp::Gt, b).to_bool();
            let held = [lt, eq, gt].iter().filter(|x| **x).count();
            assert_eq!(held, 1, "{a:?} vs {b:?}");
        }
    }
}

#[test]
fn spaceship() {
    assert_eq!(run("[1, 3, 2] <=> [1, 3]"), int(1));
    assert_eq!(run(r#""a" <=> "b""#), int(-1));
}

// ─── Logic ───────────────────────────────────────────────────────────────────

#[test]
fn and_short_circuits() {
    let src = "called = false;
               fn side() { called = true; return true; }
               r = false && side();
               called";
    assert_eq!(run(src), Value::Bool(false));
}

#[test]
fn or_short_circuits() {
    let src = "called = false;
               fn side() { called = true; return false; }
               true || side();
               called";
    assert_eq!(run(src), Value::Bool(false));
}

#[test]
fn logical_operators_yield_bool() {
    assert_eq!(run("1 && \"x\""), Value::Bool(true));
    assert_eq!(run("0 || \"\""), Value::Bool(false));
}

// ─── Scoping ─────────────────────────────────────────────────────────────────

#[test]
fn function_locals_do_not_leak() {
    let env = run_env("fn f() { x = 1; } f();");
    assert!(!env.contains("x"));
}

#[test]
fn function_writes_rebind_outer_variables() {
    assert_eq!(run("x = 1; fn f() { x = 2; } f(); x"), int(2));
}

#[test]
fn blocks_scope_new_bindings() {
    let env = run_env("y = 1; { y = 2; z = 3; }");
    assert_eq!(env.get("y"), Some(int(2)));
    assert!(!env.contains("z"));
}

// ─── Functions ───────────────────────────────────────────────────────────────

const SUB: &str = "fn Sub(a, b) { return a - b; } ";

#[test]
fn named_arguments() {
    assert_eq!(run(&format!("{SUB} Sub(a: 1, b: 2)")), int(-1));
    assert_eq!(run(&format!("{SUB} Sub(b: 2, a: 1)")), int(-1));
    assert_eq!(run(&format!("{SUB} Sub(2, a: 1)")), int(-1));
    assert_eq!(run(&format!("{SUB} Sub(2, 1)")), int(1));
}

#[test]
fn default_arguments() {
    let src = "fn pad(s, width = 3, fill = \"-\") {
                   while (len(s) < width) s = fill + s;
                   return s;
               }
               pad(\"a\") + pad(\"b\", fill: \"*\") + pad(\"c\", 2)";
    assert_eq!(run(src), text("--a**b-c"));
}

#[test]
fn recursion() {
    let src = "fn fib(n) { if (n <= 1) return n; return fib(n - 1) + fib(n - 2); } fib(10)";
    assert_eq!(run(src), int(55));
}

#[test]
fn functions_are_values() {
    let src = "fn apply(f, x) { return f(x); } fn neg(v) { return -v; } apply(neg, 4)";
    assert_eq!(run(src), int(-4));
}

#[test]
fn function_identity() {
    assert_eq!(run("fn f() {} g = f; g === f"), Value::Bool(true));
    assert_eq!(run("fn f() {} fn g() {} f == g"), Value::Bool(false));
}

#[test]
fn closures_capture_defining_scope() {
    let src = "fn counter() {
                   n = 0;
                   fn next() { n = n + 1; return n; }
                   return next;
               }
               c = counter();
               c(); c(); c()";
    assert_eq!(run(src), int(3));
}

// ─── Control flow ────────────────────────────────────────────────────────────

const SWITCH: &str = r#"
    fn pick(x) {
        s = "";
        switch (x) {
            case 0: s += "0";
            case 1: s += "1";
            case 2: s += "2";
            case 3: s += "3"; break;
            default: s += "d";
            case 4: s += "4"; break;
        }
        return s;
    }
"#;

#[test]
fn switch_falls_through_until_break() {
    assert_eq!(run(&format!("{SWITCH} pick(1)")), text("123"));
}

#[test]
fn switch_uses_default_when_nothing_matches() {
    assert_eq!(run(&format!("{SWITCH} pick(5)")), text("d4"));
}

#[test]
fn switch_matches_loosely() {
    assert_eq!(run(&format!("{SWITCH} pick(\"4\")")), text("4"));
}

#[test]
fn switch_labels_stop_evaluating_after_match() {
    let src = "hits = 0; fn probe(v) { hits++; return v; }
               switch (1) { case probe(1): ; case probe(2): ; }
               hits";
    assert_eq!(run(src), int(1));
}

#[test]
fn if_else_chain() {
    let src = "fn grade(n) { if (n > 90) return \"a\"; else if (n > 80) return \"b\"; else return \"c\"; }
               grade(95) + grade(85) + grade(10)";
    assert_eq!(run(src), text("abc"));
}

#[test]
fn nested_loops_break_inner_only() {
    let src = "count = 0;
               for (i = 0; i < 3; i++) {
                   for (j = 0; j < 10; j++) { if (j == 2) break; count++; }
               }
               count";
    assert_eq!(run(src), int(6));
}

#[test]
fn return_inside_loop_leaves_function() {
    let src = "fn find(a, v) { for (i = 0; i < len(a); i++) if (a[i] == v) return i; return -1; }
               find([5, 6, 7], 7) * 10 + find([1], 9)";
    assert_eq!(run(src), int(19));
}

#[test]
fn empty_loop_body() {
    assert_eq!(run("i = 0; while (i++ < 3) ; i"), int(4));
    assert_eq!(run("for (n = 1; n < 100; n *= 2) ; n"), int(128));
}

// ─── Strings ─────────────────────────────────────────────────────────────────

#[test]
fn interpolation() {
    assert_eq!(run(r#""abc{1}def""#), text("abc1def"));
}

#[test]
fn brace_escapes() {
    assert_eq!(run(r#""abc{{1}}def""#), text("abc{1}def"));
}

#[test]
fn nested_interpolation() {
    assert_eq!(run(r#""abc{"x{"y"}z"}def""#), text("abcxyzdef"));
}

#[test]
fn interpolation_renders_values() {
    assert_eq!(run(r#"a = [1, 2.5]; "{a} / {1 + 1} / {true}""#), text("1,2.5 / 2 / true"));
}

#[test]
fn string_indexing() {
    assert_eq!(run(r#"s = "cat"; s[0] = "b"; s + s[2]"#), text("batt"));
}

// ─── Assignment ──────────────────────────────────────────────────────────────

#[test]
fn assignable_ternary_true() {
    let env = run_env("(true ? a : b) = 10;");
    assert_eq!(env.get("a"), Some(int(10)));
    assert_eq!(env.get("b"), None);
}

#[test]
fn assignable_ternary_false() {
    let env = run_env("(false ? a : b) = 10;");
    assert_eq!(env.get("a"), None);
    assert_eq!(env.get("b"), Some(int(10)));
}

#[test]
fn assignment_is_an_expression() {
    assert_eq!(run("a = b = 4; a + b"), int(8));
}

#[test]
fn compound_assignment_on_elements() {
    assert_eq!(run("a = [1, 2]; a[1] *= 10; a[1] += 1; a").to_string(), "1,21");
}

#[test]
fn array_aliasing() {
    assert_eq!(run("a = [1]; b = a; b[1] = 2; a").to_string(), "1,2");
}

#[test]
fn huge_subscript_write_is_an_error() {
    assert_eq!(run_err("a = []; a[4611686018427387904] = 1").code(), ErrorCode::R003);
    assert_eq!(run_err("s = \"ab\"; s[4611686018427387904] = \"x\"").code(), ErrorCode::R003);
    assert_eq!(run_err("fresh[4611686018427387904] = 1").code(), ErrorCode::R003);
    assert_eq!(run("a = []; a[3] = 1; len(a)"), int(4));
}

#[test]
fn self_containing_array() {
    assert_eq!(run("a = [0]; a[0] = a; a").to_string(), "[...]");
    assert_eq!(run("a = [0]; a[0] = a; \"{a}!\""), text("[...]!"));
    assert_eq!(run("a = [1]; a[1] = a; b = [1]; b[1] = b; a == b && a === copy(a)"), Value::Bool(true));
    assert_eq!(run("a = [0]; a[0] = a; len(a[0][0])"), int(1));
}

#[test]
fn result_arrays_are_copies() {
    let mut interp = Interpreter::new();
    let held = interp.run("data = [1, 2]; data").unwrap();
    interp.run("data[0] = 99;").unwrap();
    assert_eq!(held.to_string(), "1,2");
}

// ─── References ──────────────────────────────────────────────────────────────

#[test]
fn reference_reads_track_the_target() {
    assert_eq!(run("x = 1; r = &x; x = 5; r"), int(5));
}

#[test]
fn reference_writes_reach_the_target() {
    assert_eq!(run("x = 1; r = &x; r = 7; x"), int(7));
}

#[test]
fn reference_to_array_cell() {
    assert_eq!(run("a = [1, 2]; r = &a[1]; r = 9; a").to_string(), "1,9");
}

#[test]
fn reference_type_name() {
    assert_eq!(run("x = 1; type(&x)"), text("reference"));
}

#[test]
fn by_reference_parameter() {
    assert_eq!(run("fn bump(p) { p += 1; } n = 1; bump(&n); bump(&n); n"), int(3));
}

// ─── Errors ──────────────────────────────────────────────────────────────────

#[test]
fn calling_unknown_function() {
    let err = run_err("x = 1\nnope(x)");
    assert_eq!(err.code(), ErrorCode::R001);
    assert_eq!(err.line(), 2);
}

#[test]
fn unknown_character() {
    let Error::Syntax(err) = run_err("a = 1;\na = a # 2") else { panic!("expected syntax error") };
    assert_eq!(err.code, ErrorCode::L001);
    assert_eq!((err.line, err.column), (2, 7));
}

#[test]
fn unterminated_string() {
    assert_eq!(run_err("s = \"abc").code(), ErrorCode::L002);
}

#[test]
fn missing_paren() {
    assert_eq!(run_err("if (x { }").code(), ErrorCode::P002);
}

#[test]
fn assigning_into_a_number() {
    assert_eq!(run_err("n = 4; n[0] = 1;").code(), ErrorCode::R003);
}
