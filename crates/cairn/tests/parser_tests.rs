//! Parser tests: literal conversion, expression shapes, declarations,
//! error recovery and symbol population.

use cairn::{
    Lexer, ParseError, Parser, StaticSource,
    ast::{Decl, Expr, SourceFile, Stmt, SymbolTables},
    parser::symbol_errors,
};

struct Parsed {
    file: SourceFile,
    errors: Vec<ParseError>,
    tables: SymbolTables,
}

fn parse(input: &str) -> Parsed {
    let source = StaticSource::new("testing:///test/test.cairn", input.as_bytes());
    let lexer = Lexer::new(&source).expect("static sources never fail to read");
    let mut tables = SymbolTables::new();
    let parser = Parser::new(lexer, &mut tables, None, "test.cairn");
    let (file, errors) = parser.parse_source_file();
    Parsed { file, errors, tables }
}

fn parse_ok(input: &str) -> Parsed {
    let parsed = parse(input);
    assert!(parsed.errors.is_empty(), "unexpected parse errors for {input:?}: {:?}", parsed.errors);
    let sym_errs = symbol_errors(&parsed.tables, parsed.file.table);
    assert!(sym_errs.is_empty(), "unexpected symbol errors for {input:?}: {sym_errs:?}");
    parsed
}

fn only_expr(parsed: &Parsed) -> &Expr {
    assert_eq!(parsed.file.statements.len(), 1, "want exactly one statement");
    match &parsed.file.statements[0] {
        Stmt::Expr(stmt) => &stmt.expr,
        other => panic!("statement is not an expression statement: {other:?}"),
    }
}

#[test]
fn int_literals_honour_their_base_prefix() {
    let cases = [
        ("42", 42),
        ("0xFFF", 0xFFF),
        ("0x8899aa", 0x8899aa),
        ("0777", 0o777),
        ("0b101010", 0b101010),
        ("0B100011", 0b10_0011),
    ];
    for (input, want) in cases {
        let parsed = parse_ok(input);
        match only_expr(&parsed) {
            Expr::Int(lit) => assert_eq!(lit.value, want, "{input}"),
            other => panic!("{input}: not an int literal: {other:?}"),
        }
    }
}

#[test]
fn float_literals_cover_exponent_forms() {
    let cases = [("3.14", 3.14), ("2e10", 2e10), ("1.5e-3", 1.5e-3), ("3.14E+2", 3.14e+2), ("42.0", 42.0)];
    for (input, want) in cases {
        let parsed = parse_ok(input);
        match only_expr(&parsed) {
            Expr::Float(lit) => assert!((lit.value - want).abs() < f64::EPSILON, "{input}"),
            other => panic!("{input}: not a float literal: {other:?}"),
        }
    }
}

#[test]
fn char_literals_decode_escapes() {
    let cases = [("'a'", 'a'), ("'\\n'", '\n'), ("'\\''", '\''), ("'\\\\'", '\\')];
    for (input, want) in cases {
        let parsed = parse_ok(input);
        match only_expr(&parsed) {
            Expr::Char(lit) => assert_eq!(lit.value, want, "{input}"),
            other => panic!("{input}: not a char literal: {other:?}"),
        }
    }
}

#[test]
fn expressions_print_canonically() {
    let cases = [
        ("example", "example"),
        (" other ", "other"),
        ("42", "42"),
        ("13.37", "13.37"),
        ("!true", "(!true)"),
        ("-3", "(-3)"),
        ("(-3)", "(-3)"),
        ("(if x { y } else { z })", "(if x { y } else { z })"),
        ("(if x { y } else if e { e1 } else { z })", "(if x { y } else if e { e1 } else { z })"),
        (
            "(if x { y } else if e { e1 } else if f { f1 } else { z })",
            "(if x { y } else if e { e1 } else if f { f1 } else { z })",
        ),
        ("json.Null", "json.Null"),
        ("[42 + 1337]", "[(42+1337)]"),
        ("[42 + 1337: 12 - 34]", "[(42+1337): (12-34)]"),
        ("[42 + 1337: 12 - 34, 2: 3]", "[(42+1337): (12-34), 2: 3]"),
        ("true", "true"),
        ("false", "false"),
        ("'a'", "'a'"),
        ("'\\n'", "'\\n'"),
        ("[1, 2]", "[1, 2]"),
        ("[]", "[]"),
        ("[:]", "[:]"),
        ("some()", "some()"),
        ("call(1, 2)", "call(1, 2)"),
        ("a[0]", "a[0]"),
        ("{}", "{->/* 0 stmts */}"),
        ("1 + 2 * 3", "(1+(2*3))"),
        ("1 * 2 + 3", "((1*2)+3)"),
        ("a && b || c", "((a&&b)||c)"),
        ("1 + 2 == 3", "((1+2)==3)"),
    ];
    for (input, want) in cases {
        let parsed = parse(input);
        assert!(parsed.errors.is_empty(), "{input}: {:?}", parsed.errors);
        assert_eq!(only_expr(&parsed).to_string(), want, "{input}");
    }
}

#[test]
fn printed_expressions_reparse_to_the_same_print() {
    let inputs = [
        "1 + 2 * 3",
        "!true",
        "-3",
        "(if x { y } else { z })",
        "[42 + 1337: 12 - 34, 2: 3]",
        "call(1, a.b[0])",
        "a && b || !c",
    ];
    for input in inputs {
        let first = only_expr(&parse(input)).to_string();
        let second = only_expr(&parse(&first)).to_string();
        assert_eq!(first, second, "round trip of {input:?}");
    }
}

#[test]
fn if_statement_collects_else_if_chain() {
    let cases = [
        ("func f() { if true { return 1 } else if false { return 2 } else { return 3 } }", 1, true),
        ("func f() { if true { return 1 } else if false { return 2 } }", 1, false),
        (
            "func f() { if true { return 1 } else if false { return 2 } else if true { return 3 } else { return 4 } }",
            2,
            true,
        ),
    ];
    for (input, else_ifs, has_else) in cases {
        let parsed = parse_ok(input);
        let sym = parsed.tables.resolve(parsed.file.table, "f").expect("f declared");
        let Some(Decl::Func(decl)) = &parsed.tables.symbol(sym).decl else {
            panic!("f is not a function declaration");
        };
        let Stmt::If(stmt) = &decl.implementation.body[0] else {
            panic!("body does not start with an if statement");
        };
        assert_eq!(stmt.else_ifs.len(), else_ifs, "{input}");
        assert_eq!(stmt.else_block.is_some(), has_else, "{input}");
    }
}

#[test]
fn import_forms_resolve_alias_and_members() {
    struct Case {
        input: &'static str,
        alias: &'static str,
        module: &'static [&'static str],
        members: &'static [&'static str],
    }
    let cases = [
        Case {
            input: "import alias = foo.bar { one, two }",
            alias: "alias",
            module: &["foo", "bar"],
            members: &["one", "two"],
        },
        Case { input: "import alias = foo.bar", alias: "alias", module: &["foo", "bar"], members: &[] },
        Case { input: "import foo.bar { one }", alias: "bar", module: &["foo"], members: &["one"] },
        Case { input: "import foo.bar", alias: "bar", module: &["foo"], members: &[] },
    ];
    for case in cases {
        let parsed = parse_ok(case.input);
        let sym = parsed.tables.resolve(parsed.file.table, case.alias).expect("alias symbol");
        let Some(Decl::Import(decl)) = &parsed.tables.symbol(sym).decl else {
            panic!("{}: symbol is not an import", case.input);
        };
        let module: Vec<&str> = decl.module.iter().map(|i| i.value.as_str()).collect();
        assert_eq!(module, case.module, "{}", case.input);
        let members: Vec<&str> = decl.members.iter().map(|m| m.name.value.as_str()).collect();
        assert_eq!(members, case.members, "{}", case.input);
        assert_eq!(decl.alias.value, case.alias, "{}", case.input);
    }
}

#[test]
fn extern_forms_dispatch_to_three_declarations() {
    let cases: [(&str, fn(&Decl) -> bool, &str); 5] = [
        ("extern type Void", |d| matches!(d, Decl::ExternType(_)), "Void"),
        ("extern type String { length }", |d| matches!(d, Decl::ExternType(_)), "String"),
        ("extern func print()", |d| matches!(d, Decl::ExternFunc(_)), "print"),
        ("extern func add(a, b)", |d| matches!(d, Decl::ExternFunc(_)), "add"),
        ("extern let myvalue", |d| matches!(d, Decl::ExternValue(_)), "myvalue"),
    ];
    for (input, is_kind, name) in cases {
        let parsed = parse_ok(input);
        let sym = parsed.tables.resolve(parsed.file.table, name).expect("extern symbol registered");
        let decl = parsed.tables.symbol(sym).decl.as_ref().expect("declaration attached");
        assert!(is_kind(decl), "{input}: wrong declaration kind: {decl:?}");
        assert_eq!(decl.name().value, name, "{input}");
    }
}

#[test]
fn extern_func_records_parameters() {
    let parsed = parse_ok("extern func add(a, b)");
    let sym = parsed.tables.resolve(parsed.file.table, "add").expect("add");
    let Some(Decl::ExternFunc(decl)) = &parsed.tables.symbol(sym).decl else {
        panic!("not an extern func");
    };
    let params: Vec<&str> = decl.params.iter().map(|p| p.name.value.as_str()).collect();
    assert_eq!(params, ["a", "b"]);
}

#[test]
fn data_fields_live_in_a_child_table() {
    let parsed = parse_ok("data Person {\n\tname\n\tage\n}");
    let sym = parsed.tables.resolve(parsed.file.table, "Person").expect("Person");
    let Some(Decl::Data(decl)) = &parsed.tables.symbol(sym).decl else {
        panic!("not a data declaration");
    };
    let fields: Vec<&str> = decl.fields.iter().map(|f| f.name.value.as_str()).collect();
    assert_eq!(fields, ["name", "age"]);

    let child = parsed.tables.symbol(sym).child_table.expect("data opens a scope");
    assert!(parsed.tables.resolve_shallow(child, "name").is_some());
    assert!(parsed.tables.resolve_shallow(child, "age").is_some());
    assert!(parsed.tables.resolve_shallow(parsed.file.table, "name").is_none(), "fields stay out of file scope");
}

#[test]
fn enum_hoists_nested_declarations() {
    let parsed = parse_ok("enum Shape {\n\tdata Circle { radius }\n\tdata Point\n}");
    let shape = parsed.tables.resolve(parsed.file.table, "Shape").expect("Shape");
    let Some(Decl::Enum(decl)) = &parsed.tables.symbol(shape).decl else {
        panic!("not an enum declaration");
    };
    let cases: Vec<String> = decl.cases.iter().map(|c| c.reference.to_string()).collect();
    assert_eq!(cases, ["Circle", "Point"]);

    // Nested data declarations are hoisted into the enum's parent scope.
    assert!(parsed.tables.resolve(parsed.file.table, "Circle").is_some());
    assert!(parsed.tables.resolve(parsed.file.table, "Point").is_some());
}

#[test]
fn module_must_come_first() {
    let parsed = parse_ok("module example\n1 + 2");
    assert_eq!(parsed.file.statements.len(), 1);

    let misplaced = parse("1 + 2\nmodule example");
    assert_eq!(misplaced.errors.len(), 1);
    assert_eq!(misplaced.errors[0].summary, "module may only appear first");
}

#[test]
fn return_expression_must_stay_inline() {
    let parsed = parse_ok("func f() {\n\treturn\n\t42\n}");
    let sym = parsed.tables.resolve(parsed.file.table, "f").expect("f");
    let Some(Decl::Func(decl)) = &parsed.tables.symbol(sym).decl else {
        panic!("not a function");
    };
    let Stmt::Return(ret) = &decl.implementation.body[0] else {
        panic!("first statement is not return");
    };
    assert!(ret.expr.is_none(), "newline ends the return");
    assert_eq!(decl.implementation.body.len(), 2, "the literal is its own statement");

    let inline = parse_ok("func g() { return 42 }");
    let sym = inline.tables.resolve(inline.file.table, "g").expect("g");
    let Some(Decl::Func(decl)) = &inline.tables.symbol(sym).decl else {
        panic!("not a function");
    };
    let Stmt::Return(ret) = &decl.implementation.body[0] else {
        panic!("first statement is not return");
    };
    assert!(ret.expr.is_some(), "inline expression belongs to the return");
}

#[test]
fn return_at_top_level_is_reported() {
    let parsed = parse("return 1");
    assert!(parsed.errors.iter().any(|e| e.summary == "return must be inside function"), "{:?}", parsed.errors);
}

#[test]
fn redeclaration_surfaces_as_symbol_error() {
    let parsed = parse("let x = 1\nlet x = 2");
    assert!(parsed.errors.is_empty());
    let errs = symbol_errors(&parsed.tables, parsed.file.table);
    assert_eq!(errs.len(), 1, "{errs:?}");
    assert!(errs[0].details.contains("redeclaration"), "{errs:?}");
}

#[test]
fn declarations_move_out_of_the_statement_list() {
    let parsed = parse_ok("let x = 1\nfunc f() { return x }\nf()");
    assert_eq!(parsed.file.statements.len(), 1, "only the call stays in the list");
    assert!(parsed.tables.resolve(parsed.file.table, "x").is_some());
    assert!(parsed.tables.resolve(parsed.file.table, "f").is_some());
}

#[test]
fn parse_recovers_and_accumulates_errors() {
    let parsed = parse("let = 3\nlet y = 4");
    assert!(!parsed.errors.is_empty());
    // The second declaration still lands in the symbol table.
    assert!(parsed.tables.resolve(parsed.file.table, "y").is_some());
}

#[test]
fn errors_render_with_line_column_and_caret() {
    let input = "let x =\nlet y = 2";
    let parsed = parse(input);
    assert!(!parsed.errors.is_empty());
    let rendered = parsed.errors[0].render(input);
    assert!(rendered.contains("test.cairn:2:1"), "{rendered}");
    assert!(rendered.contains("  let y = 2"), "{rendered}");
    assert!(rendered.contains('^'), "{rendered}");
}

#[test]
fn function_brace_form_parses_parameters_before_arrow() {
    let parsed = parse_ok("func apply { x, y -> return x }");
    let sym = parsed.tables.resolve(parsed.file.table, "apply").expect("apply");
    let Some(Decl::Func(decl)) = &parsed.tables.symbol(sym).decl else {
        panic!("not a function");
    };
    let params: Vec<&str> = decl.implementation.params.iter().map(|p| p.name.value.as_str()).collect();
    assert_eq!(params, ["x", "y"]);
}

#[test]
fn annotation_chain_attaches_to_declaration() {
    let parsed = parse_ok("annotation Inline\n@Inline\ndata Wrapped { value }");
    let sym = parsed.tables.resolve(parsed.file.table, "Wrapped").expect("Wrapped");
    let Some(Decl::Data(decl)) = &parsed.tables.symbol(sym).decl else {
        panic!("not a data declaration");
    };
    assert_eq!(decl.annotations.len(), 1);
    assert_eq!(decl.annotations[0].reference.to_string(), "Inline");
}

#[test]
fn annotating_a_non_annotation_records_a_usage_error() {
    let parsed = parse("data NotAnno\n@NotAnno\ndata Wrapped");
    assert!(parsed.errors.is_empty());
    let errs = symbol_errors(&parsed.tables, parsed.file.table);
    assert!(errs.iter().any(|e| e.details.contains("not an annotation")), "{errs:?}");
}
