//! Symbol table invariants: insertion, redeclaration, placeholders and
//! free-symbol materialisation.

use cairn::{
    Token, TokenKind,
    ast::{Decl, DeclVariable, Docs, Expr, Identifier, SymbolScope, SymbolTables, TableId},
    token::SourcePos,
};

fn token(kind: TokenKind, literal: &str) -> Token {
    Token::new(kind, literal, SourcePos::new("testing:///symbols.cairn".into(), 0))
}

fn identifier(name: &str) -> Identifier {
    Identifier::new(token(TokenKind::Ident, name))
}

fn variable_decl(name: &str) -> Decl {
    Decl::Variable(DeclVariable {
        token: token(TokenKind::Let, "let"),
        name: identifier(name),
        value: Expr::Null { token: token(TokenKind::Null, "null") },
        is_global: true,
        annotations: Vec::new(),
        docs: Docs::default(),
    })
}

fn global_table(tables: &mut SymbolTables) -> TableId {
    tables.push_table(None, None, SymbolScope::Global)
}

#[test]
fn insert_creates_a_symbol_with_insertion_index() {
    let mut tables = SymbolTables::new();
    let table = global_table(&mut tables);

    let sym = tables.insert(table, variable_decl("answer"));
    assert_eq!(tables.symbol(sym).name, "answer");
    assert_eq!(tables.symbol(sym).index, 0);
    assert!(matches!(tables.symbol(sym).decl, Some(Decl::Variable(_))));

    let looked_up = tables.lookup(table, "answer", token(TokenKind::Ident, "answer"));
    assert_eq!(looked_up, sym, "lookup should return the same symbol");
    assert_eq!(tables.symbol(sym).usages.len(), 1, "lookup records exactly one usage");
    assert_eq!(tables.symbol(sym).usages[0].token.literal, "answer");
}

#[test]
fn redeclaration_keeps_one_symbol_and_records_one_error() {
    let mut tables = SymbolTables::new();
    let table = global_table(&mut tables);

    let first = tables.insert(table, variable_decl("value"));
    let second = tables.insert(table, variable_decl("value"));
    assert_eq!(first, second, "redeclaration returns the existing symbol");

    let sym = tables.symbol(first);
    assert_eq!(sym.errs.len(), 1, "exactly one error on redeclaration");
    assert_eq!(sym.usages.len(), 1, "redeclaration records a usage");
    assert_eq!(tables.symbols_of(table).len(), 1, "table still holds one symbol");
}

#[test]
fn lookup_of_undefined_name_creates_a_placeholder() {
    let mut tables = SymbolTables::new();
    let table = global_table(&mut tables);

    let sym = tables.lookup(table, "unknown", token(TokenKind::Ident, "unknown"));
    assert!(tables.symbol(sym).decl.is_none(), "placeholder has no declaration");
    assert_eq!(tables.symbol(sym).usages.len(), 1);
}

#[test]
fn later_declaration_populates_the_placeholder() {
    let mut tables = SymbolTables::new();
    let table = global_table(&mut tables);

    let placeholder = tables.lookup(table, "later", token(TokenKind::Ident, "later"));
    let declared = tables.insert(table, variable_decl("later"));

    assert_eq!(placeholder, declared, "insert populates the placeholder instead of replacing it");
    assert!(tables.symbol(declared).decl.is_some());
    assert!(tables.symbol(declared).errs.is_empty(), "populating a placeholder is not a redeclaration");
}

#[test]
fn ancestor_hit_materialises_a_free_symbol() {
    let mut tables = SymbolTables::new();
    let parent = global_table(&mut tables);
    let child = tables.push_table(Some(parent), None, SymbolScope::Local);

    let original = tables.insert(parent, variable_decl("capture"));
    let resolved = tables.lookup(child, "capture", token(TokenKind::Ident, "capture"));

    assert_ne!(resolved, original, "child lookup creates a free symbol");
    assert_eq!(tables.symbol(resolved).scope, SymbolScope::Free);
    assert_eq!(tables.symbol(resolved).parent, Some(original));
    assert_eq!(tables.table(child).free_symbols, vec![original]);
    assert_eq!(tables.original(resolved), original);

    // Exactly one free symbol, even after another lookup.
    tables.lookup(child, "capture", token(TokenKind::Ident, "capture"));
    assert_eq!(tables.table(child).free_symbols.len(), 1);
    assert_eq!(tables.symbols_of(child).len(), 1);
}

#[test]
fn anonymous_function_names_count_per_table() {
    let mut tables = SymbolTables::new();
    let table = global_table(&mut tables);
    let other = global_table(&mut tables);

    assert_eq!(tables.next_anonymous_function_name(table), "func#1");
    assert_eq!(tables.next_anonymous_function_name(table), "func#2");
    assert_eq!(tables.next_anonymous_function_name(other), "func#1", "counters are per table");
}
