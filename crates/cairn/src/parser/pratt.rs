//! Pratt expression parsing: precedence climbing with prefix and infix
//! productions dispatched on the current token kind.

use crate::{
    ast::{DictEntry, Expr, ExprElseIf, ExprFunc, ExprIf, ExprLit, Identifier, StmtExpr},
    parser::{Parser, StatementPosition},
    token::TokenKind,
};

/// Binding powers from loosest to tightest. The `Coalescing`, `Range` and
/// `Bitwise` levels are reserved for operators the grammar does not carry
/// yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
    Lowest,
    LogicalOr,
    LogicalAnd,
    Comparison,
    Coalescing,
    Range,
    Sum,
    Product,
    Bitwise,
    Prefix,
    Call,
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Associativity {
    None,
    Left,
    Right,
}

fn precedence_of(kind: TokenKind) -> Precedence {
    match kind {
        TokenKind::Or => Precedence::LogicalOr,
        TokenKind::And => Precedence::LogicalAnd,
        TokenKind::Eq | TokenKind::Neq | TokenKind::Lte | TokenKind::Gte | TokenKind::Lt | TokenKind::Gt => {
            Precedence::Comparison
        }
        TokenKind::Plus | TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk | TokenKind::Slash | TokenKind::Percent => Precedence::Product,
        TokenKind::Lparen | TokenKind::Lbracket => Precedence::Call,
        TokenKind::Dot => Precedence::Member,
        _ => Precedence::Lowest,
    }
}

fn associativity_of(prec: Precedence) -> Associativity {
    match prec {
        Precedence::LogicalOr | Precedence::LogicalAnd | Precedence::Sum | Precedence::Product => Associativity::Left,
        Precedence::Coalescing => Associativity::Right,
        _ => Associativity::None,
    }
}

/// Drops the precedence one level for right-associative recursion.
fn one_lower(prec: Precedence) -> Precedence {
    match prec {
        Precedence::Lowest | Precedence::LogicalOr => Precedence::Lowest,
        Precedence::LogicalAnd => Precedence::LogicalOr,
        Precedence::Comparison => Precedence::LogicalAnd,
        Precedence::Coalescing => Precedence::Comparison,
        Precedence::Range => Precedence::Coalescing,
        Precedence::Sum => Precedence::Range,
        Precedence::Product => Precedence::Sum,
        Precedence::Bitwise => Precedence::Product,
        Precedence::Prefix => Precedence::Bitwise,
        Precedence::Call => Precedence::Prefix,
        Precedence::Member => Precedence::Call,
    }
}

/// Token kinds that can start an expression, in the order they are reported
/// in "unexpected token" diagnostics.
pub(super) const EXPR_START: &[TokenKind] = &[
    TokenKind::Ident,
    TokenKind::True,
    TokenKind::False,
    TokenKind::Null,
    TokenKind::Int,
    TokenKind::Float,
    TokenKind::String,
    TokenKind::Char,
    TokenKind::Bang,
    TokenKind::Minus,
    TokenKind::Plus,
    TokenKind::Lparen,
    TokenKind::Lbracket,
    TokenKind::Lbrace,
    TokenKind::If,
];

impl Parser<'_> {
    pub(super) fn is_expr_start(&self, kind: TokenKind) -> bool {
        EXPR_START.contains(&kind)
    }

    pub(super) fn parse_expr(&mut self) -> Option<Expr> {
        self.parse_pratt_expr(Precedence::Lowest)
    }

    pub(super) fn parse_expr_stmt(&mut self) -> Option<StmtExpr> {
        let stmt_token = self.cur.clone();
        let expr = self.parse_pratt_expr(Precedence::Lowest)?;
        Some(StmtExpr { token: stmt_token, expr })
    }

    pub(super) fn parse_pratt_expr(&mut self, precedence: Precedence) -> Option<Expr> {
        let mut lhs = self.parse_prefix()?;

        while precedence < self.cur_precedence() {
            match self.parse_infix(lhs) {
                (expr, true) => lhs = expr?,
                // No infix production for this token; hand back up.
                (expr, false) => return expr,
            }
        }
        Some(lhs)
    }

    fn cur_precedence(&self) -> Precedence {
        precedence_of(self.cur.kind)
    }

    fn parse_prefix(&mut self) -> Option<Expr> {
        match self.cur.kind {
            TokenKind::Ident => {
                let (tok, _) = self.expect(&[TokenKind::Ident]);
                let ident = Identifier::new(tok);
                // Uses resolve eagerly; undefined names become placeholders
                // to be populated by a later declaration.
                self.tables.lookup(self.cur_table, &ident.value, ident.token.clone());
                Some(Expr::Identifier(ident))
            }
            TokenKind::True => {
                let (tok, _) = self.expect(&[TokenKind::True]);
                Some(Expr::Bool(ExprLit { value: true, token: tok }))
            }
            TokenKind::False => {
                let (tok, _) = self.expect(&[TokenKind::False]);
                Some(Expr::Bool(ExprLit { value: false, token: tok }))
            }
            TokenKind::Null => {
                let (tok, _) = self.expect(&[TokenKind::Null]);
                Some(Expr::Null { token: tok })
            }
            TokenKind::Int => self.parse_int_expr(),
            TokenKind::Float => self.parse_float_expr(),
            TokenKind::String => {
                let tok = self.next_token();
                let value = tok.literal.clone();
                Some(Expr::String(ExprLit { value, token: tok }))
            }
            TokenKind::Char => self.parse_char_expr(),
            TokenKind::Bang | TokenKind::Minus | TokenKind::Plus => {
                let op = self.next_token();
                let expr = self.parse_pratt_expr(Precedence::Prefix)?;
                Some(Expr::Unary { op, expr: Box::new(expr) })
            }
            TokenKind::Lparen => self.parse_group_expr(),
            TokenKind::If => self.parse_if_expr(),
            TokenKind::Lbrace => self.parse_expr_function().map(Expr::Func),
            TokenKind::Lbracket => self.parse_array_or_dict_expr(),
            _ => {
                self.err_unexpected_token(EXPR_START);
                None
            }
        }
    }

    /// Returns the parsed expression plus whether an infix production
    /// applied at all.
    fn parse_infix(&mut self, lhs: Expr) -> (Option<Expr>, bool) {
        match self.cur.kind {
            TokenKind::Or
            | TokenKind::And
            | TokenKind::Eq
            | TokenKind::Neq
            | TokenKind::Lte
            | TokenKind::Gte
            | TokenKind::Lt
            | TokenKind::Gt
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Slash
            | TokenKind::Asterisk
            | TokenKind::Percent => (self.parse_binary_expr(lhs), true),
            TokenKind::Lparen => (self.parse_call_expr(lhs), true),
            TokenKind::Dot => (self.parse_member_expr(lhs), true),
            TokenKind::Lbracket => (self.parse_index_expr(lhs), true),
            _ => (Some(lhs), false),
        }
    }

    fn parse_int_expr(&mut self) -> Option<Expr> {
        let (tok, _) = self.expect(&[TokenKind::Int]);
        let value = match parse_int_literal(&tok.literal) {
            Some(value) => value,
            None => {
                let literal = tok.literal.clone();
                self.err_underlying(format!("invalid int literal {literal:?}"), "out of range or malformed".to_owned());
                0
            }
        };
        Some(Expr::Int(ExprLit { value, token: tok }))
    }

    fn parse_float_expr(&mut self) -> Option<Expr> {
        let (tok, _) = self.expect(&[TokenKind::Float]);
        let value = match tok.literal.parse::<f64>() {
            Ok(value) => value,
            Err(err) => {
                let literal = tok.literal.clone();
                self.err_underlying(format!("invalid float literal {literal:?}"), err.to_string());
                0.0
            }
        };
        Some(Expr::Float(ExprLit { value, token: tok }))
    }

    fn parse_char_expr(&mut self) -> Option<Expr> {
        let (tok, _) = self.expect(&[TokenKind::Char]);
        let value = match parse_char_literal(&tok.literal) {
            Ok(value) => value,
            Err(details) => {
                let literal = tok.literal.clone();
                self.err_underlying(format!("invalid char literal {literal:?}"), details.to_owned());
                '\u{fffd}'
            }
        };
        Some(Expr::Char(ExprLit { value, token: tok }))
    }

    fn parse_binary_expr(&mut self, lhs: Expr) -> Option<Expr> {
        let mut prec = self.cur_precedence();
        if associativity_of(prec) == Associativity::Right {
            prec = one_lower(prec);
        }
        let op = self.next_token();
        let rhs = self.parse_pratt_expr(prec)?;
        Some(Expr::Binary { op, left: Box::new(lhs), right: Box::new(rhs) })
    }

    fn parse_group_expr(&mut self) -> Option<Expr> {
        self.expect(&[TokenKind::Lparen]);
        let expr = self.parse_pratt_expr(Precedence::Lowest);
        let (_, ok) = self.expect(&[TokenKind::Rparen]);
        if !ok {
            return None;
        }
        expr
    }

    fn parse_if_expr(&mut self) -> Option<Expr> {
        let if_token = self.next_token();

        let condition = self.parse_pratt_expr(Precedence::Lowest)?;

        let (_, ok) = self.expect(&[TokenKind::Lbrace]);
        if !ok {
            return None;
        }
        let then = self.parse_pratt_expr(Precedence::Lowest)?;
        let (_, ok) = self.expect(&[TokenKind::Rbrace]);
        if !ok {
            return None;
        }

        let (else_token, ok) = self.expect(&[TokenKind::Else]);
        if !ok {
            return None;
        }

        let mut else_ifs = Vec::new();
        while self.cur_is(&[TokenKind::If]) {
            self.next_token();
            let else_cond = self.parse_pratt_expr(Precedence::Lowest)?;
            self.expect(&[TokenKind::Lbrace]);
            let else_then = self.parse_pratt_expr(Precedence::Lowest)?;
            self.expect(&[TokenKind::Rbrace]);
            else_ifs.push(ExprElseIf { token: else_token.clone(), condition: else_cond, then: else_then });
            self.expect(&[TokenKind::Else]);
        }

        let (_, ok) = self.expect(&[TokenKind::Lbrace]);
        if !ok {
            return None;
        }
        let else_expr = self.parse_pratt_expr(Precedence::Lowest)?;
        let (_, ok) = self.expect(&[TokenKind::Rbrace]);
        if !ok {
            return None;
        }

        Some(Expr::If(Box::new(ExprIf { token: if_token, condition, then, else_ifs, else_expr })))
    }

    /// Parses a brace function expression `{ params -> body }`; the arrow is
    /// omitted when there are no parameters.
    pub(super) fn parse_expr_function(&mut self) -> Option<ExprFunc> {
        let (brace_token, ok) = self.expect(&[TokenKind::Lbrace]);
        if !ok {
            return None;
        }
        let name = self.tables.next_anonymous_function_name(self.cur_table);
        let table = self.push_function_table(brace_token.clone());

        let params = self.parse_decl_parameter_list();
        if params.is_empty() {
            self.skip(&[TokenKind::RightArrow]);
        } else {
            self.expect(&[TokenKind::RightArrow]);
        }

        let body = self.parse_stmt_block(StatementPosition::Func);
        self.expect(&[TokenKind::Rbrace]);
        self.pop_symbol_table();

        Some(ExprFunc { token: brace_token, name, params, body, table })
    }

    fn parse_call_expr(&mut self, callee: Expr) -> Option<Expr> {
        self.next_token();

        let mut arguments = Vec::new();
        if self.cur_is(&[TokenKind::Rparen]) {
            self.next_token();
            return Some(Expr::Invocation { callee: Box::new(callee), arguments });
        }

        arguments.push(self.parse_pratt_expr(Precedence::Lowest)?);
        while self.cur_is(&[TokenKind::Comma]) {
            self.next_token();
            arguments.push(self.parse_pratt_expr(Precedence::Lowest)?);
        }

        let (_, ok) = self.expect(&[TokenKind::Rparen]);
        if !ok {
            return None;
        }
        Some(Expr::Invocation { callee: Box::new(callee), arguments })
    }

    fn parse_member_expr(&mut self, target: Expr) -> Option<Expr> {
        let dot_token = self.next_token();
        let (ident_token, ok) = self.expect(&[TokenKind::Ident]);
        if !ok {
            return None;
        }
        Some(Expr::Member { token: dot_token, target: Box::new(target), property: Identifier::new(ident_token) })
    }

    fn parse_index_expr(&mut self, target: Expr) -> Option<Expr> {
        let bracket_token = self.next_token();
        let index = self.parse_pratt_expr(Precedence::Lowest)?;
        let (_, ok) = self.expect(&[TokenKind::Rbracket]);
        if !ok {
            return None;
        }
        Some(Expr::Index { token: bracket_token, target: Box::new(target), index: Box::new(index) })
    }

    /// `[…]` parses uniformly as array or dict: a colon after the first
    /// element switches to dict mode, `[:]` is the empty dict.
    fn parse_array_or_dict_expr(&mut self) -> Option<Expr> {
        let bracket_token = self.next_token();

        if self.cur_is(&[TokenKind::Rbracket]) {
            self.next_token();
            return Some(Expr::Array { token: bracket_token, elements: Vec::new() });
        }
        if self.cur_is(&[TokenKind::Colon]) {
            self.next_token();
            self.expect(&[TokenKind::Rbracket]);
            return Some(Expr::Dict { token: bracket_token, entries: Vec::new() });
        }

        let initial = self.parse_pratt_expr(Precedence::Lowest)?;

        if self.cur_is(&[TokenKind::Rbracket]) {
            self.next_token();
            return Some(Expr::Array { token: bracket_token, elements: vec![initial] });
        }

        if self.cur_is(&[TokenKind::Comma]) {
            let mut elements = vec![initial];
            elements.extend(self.parse_array_elements()?);
            let (_, ok) = self.expect(&[TokenKind::Rbracket]);
            if !ok {
                return None;
            }
            return Some(Expr::Array { token: bracket_token, elements });
        }

        let (_, ok) = self.expect(&[TokenKind::Colon]);
        if !ok {
            return None;
        }
        let value = self.parse_pratt_expr(Precedence::Lowest)?;
        let mut entries = vec![DictEntry { key: initial, value }];

        if self.cur_is(&[TokenKind::Rbracket]) {
            self.next_token();
            return Some(Expr::Dict { token: bracket_token, entries });
        }
        entries.extend(self.parse_dict_entries()?);
        self.expect(&[TokenKind::Rbracket]);
        Some(Expr::Dict { token: bracket_token, entries })
    }

    fn parse_array_elements(&mut self) -> Option<Vec<Expr>> {
        let mut elements = Vec::new();
        while self.cur_is(&[TokenKind::Comma]) {
            self.next_token();
            elements.push(self.parse_pratt_expr(Precedence::Lowest)?);
        }
        Some(elements)
    }

    fn parse_dict_entries(&mut self) -> Option<Vec<DictEntry>> {
        let mut entries = Vec::new();
        while self.cur_is(&[TokenKind::Comma]) {
            self.next_token();
            let key = self.parse_pratt_expr(Precedence::Lowest)?;
            let (_, ok) = self.expect(&[TokenKind::Colon]);
            if !ok {
                return None;
            }
            let value = self.parse_pratt_expr(Precedence::Lowest)?;
            entries.push(DictEntry { key, value });
        }
        Some(entries)
    }
}

/// Converts an integer lexeme honouring the `0x`, `0b`/`0B` and leading-`0`
/// octal prefixes.
fn parse_int_literal(literal: &str) -> Option<i64> {
    if let Some(hex) = literal.strip_prefix("0x").or_else(|| literal.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).ok();
    }
    if let Some(bin) = literal.strip_prefix("0b").or_else(|| literal.strip_prefix("0B")) {
        return i64::from_str_radix(bin, 2).ok();
    }
    if literal.len() > 1 && literal.starts_with('0') {
        return i64::from_str_radix(&literal[1..], 8).ok();
    }
    literal.parse().ok()
}

/// Decodes the verbatim contents of a `'…'` literal into a single scalar.
fn parse_char_literal(literal: &str) -> Result<char, &'static str> {
    let mut chars = literal.chars();
    let first = chars.next().ok_or("char literal must contain exactly one character")?;

    if first != '\\' {
        if chars.next().is_some() {
            return Err("char literal must contain exactly one character");
        }
        return Ok(first);
    }

    let escape = chars.next().ok_or("incomplete escape sequence")?;
    let decoded = match escape {
        'n' => '\n',
        't' => '\t',
        'r' => '\r',
        '0' => '\0',
        '\\' => '\\',
        '\'' => '\'',
        '"' => '"',
        'x' => {
            let hex: String = chars.by_ref().take(2).collect();
            let code = u32::from_str_radix(&hex, 16).map_err(|_| "invalid hex escape")?;
            return finish_char(char::from_u32(code).ok_or("invalid hex escape")?, chars);
        }
        'u' => {
            let hex: String = chars.by_ref().take(4).collect();
            let code = u32::from_str_radix(&hex, 16).map_err(|_| "invalid unicode escape")?;
            return finish_char(char::from_u32(code).ok_or("invalid unicode escape")?, chars);
        }
        _ => return Err("unknown escape sequence"),
    };
    finish_char(decoded, chars)
}

fn finish_char(decoded: char, mut rest: std::str::Chars<'_>) -> Result<char, &'static str> {
    if rest.next().is_some() {
        return Err("char literal must contain exactly one character");
    }
    Ok(decoded)
}
