//! Token-level tests: kinds, literals, operator canonicalisation and
//! decorative trivia attachment.

use cairn::{
    Lexer, StaticSource, TokenKind,
    token::{Decorative, DecorativeKind},
};

fn lexer_for(input: &str) -> Lexer {
    let source = StaticSource::new("testing:///test/test.cairn", input.as_bytes());
    Lexer::new(&source).expect("static sources never fail to read")
}

fn collect_kinds(input: &str) -> Vec<(TokenKind, String)> {
    let mut lexer = lexer_for(input);
    let mut tokens = Vec::new();
    loop {
        let tok = lexer.next_token();
        let done = tok.kind == TokenKind::Eof;
        tokens.push((tok.kind, tok.literal));
        if done {
            return tokens;
        }
    }
}

#[test]
fn lexes_a_whole_program() {
    let input = r#"
module example

import tests {
	test
}
import tests.helpers

func twice(n) {
	return n + n
}

let answer = twice(21)
"#;

    let want: &[(TokenKind, &str)] = &[
        (TokenKind::Module, "module"),
        (TokenKind::Ident, "example"),
        (TokenKind::Import, "import"),
        (TokenKind::Ident, "tests"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Ident, "test"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Import, "import"),
        (TokenKind::Ident, "tests"),
        (TokenKind::Dot, "."),
        (TokenKind::Ident, "helpers"),
        (TokenKind::Func, "func"),
        (TokenKind::Ident, "twice"),
        (TokenKind::Lparen, "("),
        (TokenKind::Ident, "n"),
        (TokenKind::Rparen, ")"),
        (TokenKind::Lbrace, "{"),
        (TokenKind::Return, "return"),
        (TokenKind::Ident, "n"),
        (TokenKind::Plus, "+"),
        (TokenKind::Ident, "n"),
        (TokenKind::Rbrace, "}"),
        (TokenKind::Let, "let"),
        (TokenKind::Ident, "answer"),
        (TokenKind::Assign, "="),
        (TokenKind::Ident, "twice"),
        (TokenKind::Lparen, "("),
        (TokenKind::Int, "21"),
        (TokenKind::Rparen, ")"),
        (TokenKind::Eof, ""),
    ];

    let got = collect_kinds(input);
    assert_eq!(got.len(), want.len(), "token count mismatch: {got:?}");
    for (i, ((got_kind, got_lit), (want_kind, want_lit))) in got.iter().zip(want).enumerate() {
        assert_eq!(got_kind, want_kind, "token {i} kind");
        assert_eq!(got_lit, want_lit, "token {i} literal");
    }
}

#[test]
fn two_char_operators_win_over_prefixes() {
    let got = collect_kinds("== != <= >= -> => && || = < > ! - |");
    let kinds: Vec<TokenKind> = got.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![
        TokenKind::Eq,
        TokenKind::Neq,
        TokenKind::Lte,
        TokenKind::Gte,
        TokenKind::RightArrow,
        TokenKind::RightArrow,
        TokenKind::And,
        TokenKind::Or,
        TokenKind::Assign,
        TokenKind::Lt,
        TokenKind::Gt,
        TokenKind::Bang,
        TokenKind::Minus,
        TokenKind::Illegal,
        TokenKind::Eof,
    ]);
    // `=>` canonicalises to the arrow spelling.
    assert_eq!(got[4].1, "->");
    assert_eq!(got[5].1, "->");
}

#[test]
fn lone_ampersand_is_illegal() {
    let got = collect_kinds("&");
    assert_eq!(got[0].0, TokenKind::Illegal);
}

#[test]
fn numbers_take_all_their_forms() {
    let cases = [
        ("42", TokenKind::Int, "42"),
        ("0xFFF", TokenKind::Int, "0xFFF"),
        ("0x8899aa", TokenKind::Int, "0x8899aa"),
        ("0b101010", TokenKind::Int, "0b101010"),
        ("0B100011", TokenKind::Int, "0B100011"),
        ("0777", TokenKind::Int, "0777"),
        ("3.14", TokenKind::Float, "3.14"),
        ("2e10", TokenKind::Float, "2e10"),
        ("1.5e-3", TokenKind::Float, "1.5e-3"),
        ("3.14E+2", TokenKind::Float, "3.14E+2"),
    ];
    for (input, kind, literal) in cases {
        let got = collect_kinds(input);
        assert_eq!(got[0].0, kind, "{input}");
        assert_eq!(got[0].1, literal, "{input}");
    }
}

#[test]
fn a_dot_without_fraction_stays_a_member_dot() {
    let got = collect_kinds("1.x");
    let kinds: Vec<TokenKind> = got.iter().map(|(k, _)| *k).collect();
    assert_eq!(kinds, vec![TokenKind::Int, TokenKind::Dot, TokenKind::Ident, TokenKind::Eof]);
}

#[test]
fn strings_decode_known_escapes_only() {
    let got = collect_kinds(r#""a\nb" "back\\slash" "quo\"te" "other\qkept""#);
    assert_eq!(got[0], (TokenKind::String, "a\nb".to_owned()));
    assert_eq!(got[1], (TokenKind::String, "back\\slash".to_owned()));
    assert_eq!(got[2], (TokenKind::String, "quo\"te".to_owned()));
    assert_eq!(got[3], (TokenKind::String, "other\\qkept".to_owned()));
}

#[test]
fn unterminated_string_ends_silently() {
    let got = collect_kinds("\"open");
    assert_eq!(got[0], (TokenKind::String, "open".to_owned()));
    assert_eq!(got[1].0, TokenKind::Eof);
}

#[test]
fn chars_are_captured_verbatim() {
    let got = collect_kinds(r"'a' '\n' '\'' '\\'");
    assert_eq!(got[0], (TokenKind::Char, "a".to_owned()));
    assert_eq!(got[1], (TokenKind::Char, "\\n".to_owned()));
    assert_eq!(got[2], (TokenKind::Char, "\\'".to_owned()));
    assert_eq!(got[3], (TokenKind::Char, "\\\\".to_owned()));
}

#[test]
fn newline_inside_char_is_illegal() {
    let got = collect_kinds("'a\n'");
    assert_eq!(got[0].0, TokenKind::Illegal);
}

#[test]
fn blank_is_its_own_kind() {
    let got = collect_kinds("_ _x");
    assert_eq!(got[0].0, TokenKind::Blank);
    assert_eq!(got[1], (TokenKind::Ident, "_x".to_owned()));
}

fn decos(input: &str) -> Vec<Vec<(DecorativeKind, String)>> {
    let mut lexer = lexer_for(input);
    let mut all = Vec::new();
    loop {
        let tok = lexer.next_token();
        all.push(tok.leading.iter().map(|d: &Decorative| (d.kind, d.literal.clone())).collect());
        if tok.kind == TokenKind::Eof {
            return all;
        }
    }
}

#[test]
fn empty_input_is_a_bare_eof() {
    assert_eq!(decos(""), vec![Vec::new()]);
}

#[test]
fn trailing_trivia_attaches_to_eof() {
    let got = decos("  \t\n ");
    assert_eq!(got, vec![vec![(DecorativeKind::Multi, "  \t\n ".to_owned())]]);
}

#[test]
fn trailing_comment_mix_attaches_to_eof() {
    let got = decos("\t\n// hello\n\t");
    assert_eq!(got, vec![vec![
        (DecorativeKind::Multi, "\t\n".to_owned()),
        (DecorativeKind::Comment, "hello".to_owned()),
        (DecorativeKind::Inline, "\t".to_owned()),
    ]]);
}

#[test]
fn shebang_is_a_comment() {
    let got = decos("#!/usr/bin/env cairn");
    assert_eq!(got, vec![vec![(DecorativeKind::Comment, "!/usr/bin/env cairn".to_owned())]]);
}

#[test]
fn comment_before_token_leads_it() {
    let mut lexer = lexer_for("// cool stuff\ndata");
    let tok = lexer.next_token();
    assert_eq!(tok.kind, TokenKind::Data);
    assert_eq!(tok.leading.len(), 1);
    assert_eq!(tok.leading[0].kind, DecorativeKind::Comment);
    assert_eq!(tok.leading[0].literal, "cool stuff");
}

#[test]
fn comment_after_token_trails_to_next() {
    let mut lexer = lexer_for("data // cool stuff\n\n\t// hello\n\t");
    let data = lexer.next_token();
    assert_eq!(data.kind, TokenKind::Data);
    assert!(data.leading.is_empty());

    let eof = lexer.next_token();
    assert_eq!(eof.kind, TokenKind::Eof);
    let got: Vec<(DecorativeKind, &str)> = eof.leading.iter().map(|d| (d.kind, d.literal.as_str())).collect();
    assert_eq!(got, vec![
        (DecorativeKind::Inline, " "),
        (DecorativeKind::Comment, "cool stuff"),
        (DecorativeKind::Multi, "\n\t"),
        (DecorativeKind::Comment, "hello"),
        (DecorativeKind::Inline, "\t"),
    ]);
}

#[test]
fn token_offsets_point_into_the_source() {
    let input = "let answer = 42";
    let mut lexer = lexer_for(input);
    loop {
        let tok = lexer.next_token();
        if tok.kind == TokenKind::Eof {
            break;
        }
        let start = tok.pos.offset;
        assert_eq!(&input[start..start + tok.literal.len()], tok.literal, "literal of {:?}", tok.kind);
    }
}
