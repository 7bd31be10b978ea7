//! End-to-end execution tests: source text in, final value (or runtime
//! error) out.

use cairn::{Opcode, RecordingTracer, Runner, RunnerError, Value, Vm};

fn run(input: &str) -> Value {
    Runner::new("testing:///test/test.cairn", input)
        .run()
        .unwrap_or_else(|err| panic!("run {input:?}: {err}"))
}

fn run_err(input: &str) -> String {
    match Runner::new("testing:///test/test.cairn", input).run() {
        Ok(value) => panic!("expected a runtime error for {input:?}, got {}", value.inspect()),
        Err(RunnerError::Runtime(err)) => err.to_string(),
        Err(other) => panic!("expected a runtime error for {input:?}, got {other}"),
    }
}

#[track_caller]
fn assert_int(input: &str, want: i64) {
    match run(input) {
        Value::Int(got) => assert_eq!(got, want, "{input}"),
        other => panic!("{input}: not an Int: {}", other.inspect()),
    }
}

#[track_caller]
fn assert_bool(input: &str, want: bool) {
    match run(input) {
        Value::Bool(got) => assert_eq!(got, want, "{input}"),
        other => panic!("{input}: not a Bool: {}", other.inspect()),
    }
}

#[test]
fn arithmetic_and_literals() {
    assert_int("1", 1);
    assert_int("1 + 2", 3);
    assert_int("1 - 2", -1);
    assert_int("2 * 3", 6);
    assert_int("6 / 3", 2);
    assert_int("7 % 3", 1);
    assert_int("-3 + 5", 2);
    assert_int("0xFFF", 4095);
    assert_int("0b101010", 42);
    assert_int("0777", 511);
}

#[test]
fn float_promotion() {
    match run("1 + 2.5") {
        Value::Float(got) => assert!((got - 3.5).abs() < f64::EPSILON),
        other => panic!("not a Float: {}", other.inspect()),
    }
    match run("2.0 * 3") {
        Value::Float(got) => assert!((got - 6.0).abs() < f64::EPSILON),
        other => panic!("not a Float: {}", other.inspect()),
    }
    assert_bool("1.5 < 2", true);
}

#[test]
fn booleans_and_logic() {
    assert_bool("true", true);
    assert_bool("false", false);
    assert_bool("!true", false);
    assert_bool("!false", true);
    assert_bool("true && true", true);
    assert_bool("false && true", false);
    assert_bool("false || true", true);
    assert_bool("false || false", false);
}

#[test]
fn comparisons() {
    assert_bool("1 == 1", true);
    assert_bool("1 != 1", false);
    assert_bool("1 < 2", true);
    assert_bool("2 <= 2", true);
    assert_bool("3 > 2", true);
    assert_bool("2 >= 3", false);
    assert_bool("\"a\" == \"a\"", true);
    assert_bool("\"a\" == \"b\"", false);
    assert_bool("1 == 1.0", false);
    assert_bool("null == null", true);
    assert_bool("'a' == 'a'", true);
}

#[test]
fn aggregate_equality_is_structural() {
    assert_bool("[1, 2] == [1, 2]", true);
    assert_bool("[1, 2] == [2, 1]", false);
    assert_bool("[1: 2] == [1: 2]", true);
    assert_bool("[:] == [:]", true);
    assert_bool("data P { x }\nP(1) == P(1)", true);
    assert_bool("data P { x }\nP(1) == P(2)", false);
}

#[test]
fn short_circuit_type_assertion_fails_loudly() {
    let err = run_err("true && 3");
    assert!(err.contains("unexpected type"), "{err}");
    assert!(err.contains("Int"), "{err}");
    assert!(err.contains('3'), "{err}");

    let err = run_err("false || 3");
    assert!(err.contains("unexpected type"), "{err}");
}

#[test]
fn short_circuit_skips_the_right_operand() {
    // The right operand would fail the type assertion if evaluated.
    assert_bool("false && 3", false);
    assert_bool("true || 3", true);
}

#[test]
fn if_expressions_yield_values() {
    assert_int("(if true { 2 } else { 3 })", 2);
    assert_int("(if 1 == 1 { 2 * 3 } else { 3 })", 6);
    assert_int("(if 1 == 0 { 2 * 3 } else { 3 })", 3);
    assert_int("(if 1 != 0 { 2 * 3 } else { 3 })", 6);
    assert_int("(if true || false { 2 * 3 } else { 3 })", 6);
    assert_int("if true || false { 2 * 3 } else { 3 }", 6);
    assert_int("(if false { 1 } else if false { 2 } else { 3 })", 3);
    assert_int("(if false { 1 } else if true { 2 } else { 3 })", 2);
}

#[test]
fn non_false_conditions_count_as_truthy() {
    assert_int("(if 1 { 2 } else { 3 })", 2);
    assert_int("(if null { 2 } else { 3 })", 2);
}

#[test]
fn strings_and_chars() {
    match run("\"abc\"") {
        Value::String(s) => assert_eq!(&*s, "abc"),
        other => panic!("not a String: {}", other.inspect()),
    }
    match run("'a'") {
        Value::Char(c) => assert_eq!(c, 'a'),
        other => panic!("not a Char: {}", other.inspect()),
    }
    match run("'\\n'") {
        Value::Char(c) => assert_eq!(c, '\n'),
        other => panic!("not a Char: {}", other.inspect()),
    }
}

#[test]
fn arrays_preserve_source_order() {
    match run("[1, 2, 3]") {
        Value::Array(elements) => {
            let got: Vec<String> = elements.iter().map(Value::inspect).collect();
            assert_eq!(got, ["1", "2", "3"]);
        }
        other => panic!("not an Array: {}", other.inspect()),
    }
    match run("[]") {
        Value::Array(elements) => assert!(elements.is_empty()),
        other => panic!("not an Array: {}", other.inspect()),
    }
    assert_int("[1, 2, 3][0]", 1);
    assert_int("[1, 2, 3][2]", 3);
}

#[test]
fn array_index_is_bounds_checked() {
    let err = run_err("[1, 2, 3][3]");
    assert_eq!(err, "array index 3 out of bounds");
    let err = run_err("[1, 2, 3][-1]");
    assert!(err.contains("out of bounds"), "{err}");
}

#[test]
fn dicts_preserve_insertion_order_and_miss_to_null() {
    match run("[\"hello\": \"world\", 1: 2]") {
        Value::Dict(entries) => {
            assert_eq!(entries.len(), 2);
            let keys: Vec<String> = entries.keys().map(|k| k.to_value().inspect()).collect();
            assert_eq!(keys, ["hello", "1"]);
        }
        other => panic!("not a Dict: {}", other.inspect()),
    }
    match run("[:]") {
        Value::Dict(entries) => assert!(entries.is_empty()),
        other => panic!("not a Dict: {}", other.inspect()),
    }

    match run("[\"hello\": \"world\"][\"hello\"]") {
        Value::String(s) => assert_eq!(&*s, "world"),
        other => panic!("not a String: {}", other.inspect()),
    }
    assert!(matches!(run("[\"hello\": \"world\"][\"missing\"]"), Value::Null));
    assert_int("[\"1\": 3, 1: 2][1]", 2);
}

#[test]
fn index_on_scalars_is_an_error() {
    let err = run_err("42[0]");
    assert!(err.contains("index operator not supported on Int"), "{err}");
}

#[test]
fn functions_calls_and_locals() {
    assert_int("func example() { return 42 }\nexample()", 42);
    assert!(matches!(run("func example() { return }\nexample()"), Value::Null));
    assert_int("func example() {\n\tlet x = 1\n\treturn x + x\n}\nexample()", 2);
    assert_int("func twice(n) {\n\treturn n + n\n}\ntwice(2)", 4);
    assert!(matches!(run("func nothing() { 42 }\nnothing()"), Value::Null));
}

#[test]
fn arguments_arrive_in_declaration_order() {
    assert_int("func sub(a, b) { return a - b }\nsub(10, 4)", 6);
    assert_int("func pick(a, b, c) { return b }\npick(1, 2, 3)", 2);
}

#[test]
fn recursion_works_through_the_constant_pool() {
    let fib = "
func fib(n) {
	return if n < 2 {
		n
	} else {
		fib(n - 1) + fib(n - 2)
	}
}

fib(10)
";
    assert_int(fib, 55);
}

#[test]
fn wrong_arity_is_reported() {
    let err = run_err("func g(a) { return a }\ng()");
    assert_eq!(err, "wrong number of arguments: want=1, got=0");
    let err = run_err("data P { x }\nP(1, 2)");
    assert_eq!(err, "wrong number of arguments: want=1, got=2");
}

#[test]
fn calling_a_non_callable_fails() {
    let err = run_err("42(1)");
    assert!(err.contains("cannot call Int"), "{err}");
}

#[test]
fn function_literals_are_first_class() {
    assert_int("let f = { n -> n + n }\nf(3)", 6);
    assert_int("func apply { x -> return x * 2 }\napply(21)", 42);
}

#[test]
fn data_construction_and_field_access() {
    match run("data Example\nExample()") {
        Value::Data(data) => {
            assert_eq!(data.ty.name, "Example");
            assert!(data.values.is_empty());
            assert_eq!(Value::Data(data.clone()).type_constant_id().0, 0);
        }
        other => panic!("not a Data value: {}", other.inspect()),
    }

    match run("data Person {\n\tname\n\tage\n}\nPerson(\"Max\", 42)") {
        Value::Data(data) => {
            assert_eq!(data.values.len(), 2);
            assert_eq!(data.values[0].inspect(), "Max");
            assert_eq!(data.values[1].inspect(), "42");
        }
        other => panic!("not a Data value: {}", other.inspect()),
    }

    match run("data Person {\n\tname\n\tage\n}\nPerson(\"Max\", 42).name") {
        Value::String(s) => assert_eq!(&*s, "Max"),
        other => panic!("not a String: {}", other.inspect()),
    }
    assert_int("data Person {\n\tname\n\tage\n}\nPerson(\"Max\", 42).age", 42);
}

#[test]
fn unknown_field_is_an_error() {
    let err = run_err("data P { x }\nP(1).y");
    assert!(err.contains("not found"), "{err}");
}

#[test]
fn function_members_expose_arity() {
    assert_int("func twice(n) { return n + n }\ntwice.arity", 1);
}

#[test]
fn globals_initialise_lazily_and_once() {
    assert_int("let a = 42\na", 42);
    assert_int("let a = 42\na + a", 84);
    assert_int("let a = 2 * 3\nlet b = a + 1\na + b", 13);
}

#[test]
fn forward_global_reference_resolves_at_run_time() {
    let input = "
func example() {
	return x
}
let x = 42
example()
";
    assert_int(input, 42);
}

#[test]
fn recursive_global_initialisation_is_detected() {
    let input = "
func f() {
	return a
}
let a = f()
a
";
    let err = run_err(input);
    assert_eq!(err, "recursive initialization of global variable");
}

#[test]
fn unary_type_errors() {
    let err = run_err("!5");
    assert!(err.contains("prefix operator ! is only defined on Bool"), "{err}");
    let err = run_err("-true");
    assert!(err.contains("prefix operator - is only defined on Int or Float"), "{err}");
}

#[test]
fn binary_type_errors() {
    let err = run_err("\"a\" + \"b\"");
    assert!(err.contains("unsupported operand"), "{err}");
    let err = run_err("7 % 3.0");
    assert!(err.contains("operator % is only defined on Int"), "{err}");
}

#[test]
fn integer_division_by_zero_fails() {
    assert_eq!(run_err("1 / 0"), "division by zero");
    assert_eq!(run_err("1 % 0"), "division by zero");
}

#[test]
fn runaway_recursion_overflows_the_frame_stack() {
    let err = run_err("func f() { return f() }\nf()");
    assert_eq!(err, "frame overflow");
}

#[test]
fn tracer_observes_dispatch_order() {
    let bytecode = Runner::new("testing:///test/test.cairn", "1 + 2").compile().expect("compiles");
    let mut vm = Vm::new(bytecode);
    let mut tracer = RecordingTracer::new();
    vm.run_traced(&mut tracer).expect("runs");
    assert_eq!(tracer.opcodes(), vec![Opcode::Const, Opcode::Const, Opcode::Add, Opcode::Pop]);
    assert_eq!(vm.last_popped().inspect(), "3");
}
