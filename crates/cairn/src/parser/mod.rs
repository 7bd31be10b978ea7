//! Recursive-descent parser for declarations and statements.
//!
//! Expressions are parsed by the Pratt machinery in [`pratt`]; everything
//! else lives here. The parser is eager about names: declarations are
//! registered in the current symbol table as they are parsed, identifier and
//! annotation uses are looked up immediately (creating placeholders for
//! forward references), and scope-opening constructs push child tables.
//!
//! The parser never aborts. Mismatches record a [`ParseError`] and continue
//! with a best-effort tree.

mod errors;
mod module;
mod pratt;

pub use errors::ParseError;
pub use module::ModuleParser;
pub use pratt::Precedence;

use crate::{
    ast::{
        AnnotationChain, AnnotationInstance, Block, Decl, DeclAnnotation, DeclData, DeclEnum, DeclEnumCase,
        DeclExternFunc, DeclExternType, DeclExternValue, DeclField, DeclFunc, DeclImport, DeclImportMember,
        DeclModule, DeclParameter, DeclVariable, Docs, ExprFunc, Identifier, SourceFile, StaticReference, Stmt,
        StmtElseIf, StmtIf, StmtReturn, SymbolScope, SymbolTables, TableId,
    },
    lexer::Lexer,
    token::{Token, TokenKind},
};

/// Where a statement appears, used solely for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum StatementPosition {
    Initial,
    Global,
    Enum,
    Data,
    Extern,
    Func,
    For,
    Switch,
}

pub struct Parser<'t> {
    tables: &'t mut SymbolTables,
    lexer: Lexer,
    errors: Vec<ParseError>,

    cur: Token,
    peek: Token,

    cur_table: TableId,
    file: SourceFile,
}

impl<'t> Parser<'t> {
    /// Creates a parser for one source file whose symbol table is parented
    /// to `parent` (the module table, if any).
    pub fn new(mut lexer: Lexer, tables: &'t mut SymbolTables, parent: Option<TableId>, path: &str) -> Self {
        let cur = lexer.next_token();
        let peek = lexer.next_token();
        let file = SourceFile::new(tables, parent, path, cur.clone());
        let cur_table = file.table;
        Self { tables, lexer, errors: Vec::new(), cur, peek, cur_table, file }
    }

    /// Parses the whole file, returning the tree and the accumulated parse
    /// errors. Symbol-level errors are collected separately via
    /// [`symbol_errors`].
    pub fn parse_source_file(mut self) -> (SourceFile, Vec<ParseError>) {
        let mut position = StatementPosition::Initial;
        while self.cur.kind != TokenKind::Eof {
            let (stmt, child_decls) = self.parse_statement_in_context(position, AnnotationChain::new());
            position = StatementPosition::Global;
            match stmt {
                Some(stmt) => {
                    self.file.add(self.tables, stmt);
                    for decl in child_decls {
                        self.file.add(self.tables, Stmt::Decl(decl));
                    }
                }
                None => {
                    self.next_token();
                }
            }
        }
        (self.file, self.errors)
    }

    // === Token plumbing ==================================================

    fn next_token(&mut self) -> Token {
        let cur = std::mem::replace(&mut self.cur, self.peek.clone());
        self.peek = self.lexer.next_token();
        cur
    }

    pub(super) fn cur_is(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.cur.kind)
    }

    fn peek_is(&self, kinds: &[TokenKind]) -> bool {
        kinds.contains(&self.peek.kind)
    }

    pub(super) fn expect(&mut self, kinds: &[TokenKind]) -> (Token, bool) {
        if !self.cur_is(kinds) {
            self.err_unexpected_token(kinds);
            return (self.error_token(), false);
        }
        (self.next_token(), true)
    }

    pub(super) fn skip(&mut self, kinds: &[TokenKind]) {
        if self.cur_is(kinds) {
            self.next_token();
        }
    }

    fn expect_peek(&mut self, kinds: &[TokenKind]) -> (Token, bool) {
        if !self.peek_is(kinds) {
            self.err_unexpected_peek_token(kinds);
            return (self.error_token(), false);
        }
        self.next_token();
        (self.cur.clone(), true)
    }

    fn error_token(&self) -> Token {
        let mut tok = Token::new(TokenKind::Illegal, "ERROR", self.cur.pos.clone());
        tok.leading = self.cur.leading.clone();
        tok
    }

    // === Scope plumbing ==================================================

    pub(super) fn push_function_table(&mut self, opened_by: Token) -> TableId {
        let table = self.tables.push_table(Some(self.cur_table), Some(opened_by), SymbolScope::Local);
        self.cur_table = table;
        table
    }

    pub(super) fn pop_symbol_table(&mut self) -> TableId {
        let old = self.cur_table;
        if let Some(parent) = self.tables.table(old).parent {
            self.cur_table = parent;
        }
        old
    }

    // === Statements ======================================================

    fn parse_statement_in_context(
        &mut self,
        pos: StatementPosition,
        annos: AnnotationChain,
    ) -> (Option<Stmt>, Vec<Decl>) {
        match self.cur.kind {
            TokenKind::Module => (self.parse_module_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Extern => (self.parse_extern_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Enum => {
                let (decl, children) = self.parse_enum_decl(pos, annos);
                (decl.map(|d| Stmt::Decl(Decl::Enum(d))), children)
            }
            TokenKind::Data => (self.parse_data_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Annotation => (self.parse_annotation_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Func => (self.parse_function_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Let => (self.parse_variable_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::Import => (self.parse_import_decl(pos, annos).map(Stmt::Decl), Vec::new()),
            TokenKind::At => self.parse_annotated_statement_declaration(pos),
            TokenKind::If => (Some(Stmt::If(self.parse_statement_if(pos))), Vec::new()),
            TokenKind::Return => (Some(Stmt::Return(self.parse_statement_return(pos))), Vec::new()),
            kind if self.is_expr_start(kind) => {
                if !annos.is_empty() {
                    self.err_cannot_be_annotated();
                }
                (self.parse_expr_stmt().map(Stmt::Expr), Vec::new())
            }
            _ => {
                let mut want = vec![
                    TokenKind::Enum,
                    TokenKind::Data,
                    TokenKind::Module,
                    TokenKind::Extern,
                    TokenKind::Func,
                    TokenKind::Import,
                    TokenKind::At,
                    TokenKind::Let,
                    TokenKind::If,
                    TokenKind::For,
                ];
                want.extend_from_slice(pratt::EXPR_START);
                self.err_unexpected_token(&want);
                (None, Vec::new())
            }
        }
    }

    fn parse_annotated_statement_declaration(&mut self, pos: StatementPosition) -> (Option<Stmt>, Vec<Decl>) {
        let annos = self.parse_annotation_chain();
        self.parse_statement_in_context(pos, annos)
    }

    fn parse_statement_if(&mut self, pos: StatementPosition) -> StmtIf {
        let (if_token, _) = self.expect(&[TokenKind::If]);
        let condition = self.parse_expr().unwrap_or_else(|| error_expr(&if_token));
        self.expect(&[TokenKind::Lbrace]);
        let then_block = self.parse_stmt_block(pos);
        self.expect(&[TokenKind::Rbrace]);

        let mut stmt = StmtIf { token: if_token, condition, then_block, else_ifs: Vec::new(), else_block: None };

        while self.cur_is(&[TokenKind::Else]) {
            if self.peek_is(&[TokenKind::If]) {
                let else_if = self.parse_statement_else_if(pos);
                stmt.else_ifs.push(else_if);
                continue;
            }
            self.expect(&[TokenKind::Else]);
            self.expect(&[TokenKind::Lbrace]);
            let else_block = self.parse_stmt_block(pos);
            self.expect(&[TokenKind::Rbrace]);
            stmt.else_block = Some(else_block);
            break;
        }
        stmt
    }

    fn parse_statement_else_if(&mut self, pos: StatementPosition) -> StmtElseIf {
        let (else_token, _) = self.expect(&[TokenKind::Else]);
        self.expect(&[TokenKind::If]);
        let condition = self.parse_expr().unwrap_or_else(|| error_expr(&else_token));
        self.expect(&[TokenKind::Lbrace]);
        let block = self.parse_stmt_block(pos);
        self.expect(&[TokenKind::Rbrace]);
        StmtElseIf { token: else_token, condition, block }
    }

    /// `return [expr]` — the expression is parsed only when it continues the
    /// same line as the keyword.
    fn parse_statement_return(&mut self, pos: StatementPosition) -> StmtReturn {
        if pos != StatementPosition::Func {
            self.err_statement_misplaced(pos);
        }
        let (return_token, _) = self.expect(&[TokenKind::Return]);

        if !self.cur.is_inline() {
            return StmtReturn { token: return_token, expr: None };
        }
        if self.cur_is(&[TokenKind::Rbrace]) {
            return StmtReturn { token: return_token, expr: None };
        }

        let expr = self.parse_expr();
        StmtReturn { token: return_token, expr }
    }

    pub(super) fn parse_stmt_block(&mut self, _pos: StatementPosition) -> Block {
        let mut block = Block::new();
        while !self.cur_is(&[TokenKind::Rbrace, TokenKind::Rbracket, TokenKind::Rparen, TokenKind::Eof]) {
            let (stmt, decls) = self.parse_annotated_statement_declaration(StatementPosition::Func);
            if !decls.is_empty() {
                self.err_statement_misplaced(StatementPosition::Func);
            }
            match stmt {
                Some(stmt) => block.push(stmt),
                None => {
                    self.next_token();
                }
            }
        }
        block
    }

    // === Declarations ====================================================

    /// `module <identifier>` — only valid as the first statement of a file.
    fn parse_module_decl(&mut self, pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        if pos != StatementPosition::Initial {
            self.err_statement_misplaced(pos);
        }
        let (module_token, _) = self.expect(&[TokenKind::Module]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        Some(Decl::Module(DeclModule { token: module_token, name: Identifier::new(name_token), annotations: annos }))
    }

    /// Dispatches `extern type`, `extern func` and `extern let`.
    fn parse_extern_decl(&mut self, pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        if pos != StatementPosition::Initial && pos != StatementPosition::Global {
            self.err_statement_misplaced(pos);
        }
        let (extern_token, _) = self.expect(&[TokenKind::Extern]);

        if self.cur_is(&[TokenKind::Type]) {
            Some(self.parse_extern_type_decl(extern_token, annos))
        } else if self.cur_is(&[TokenKind::Func]) {
            Some(self.parse_extern_func_decl(extern_token, annos))
        } else if self.cur_is(&[TokenKind::Let]) {
            Some(self.parse_extern_value_decl(extern_token, annos))
        } else {
            let literal = self.cur.literal.clone();
            self.err_underlying(
                "expected 'type', 'func', or 'let' after 'extern'".to_owned(),
                format!("got {literal:?}"),
            );
            None
        }
    }

    fn parse_extern_type_decl(&mut self, extern_token: Token, annos: AnnotationChain) -> Decl {
        self.expect(&[TokenKind::Type]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let name = Identifier::new(name_token);

        let mut fields = Vec::new();
        let mut child = None;
        if self.cur_is(&[TokenKind::Lbrace]) {
            self.expect(&[TokenKind::Lbrace]);
            child = Some(self.push_function_table(extern_token.clone()));
            fields = self.parse_property_declaration_list();
            self.expect(&[TokenKind::Rbrace]);
            self.pop_symbol_table();
        }

        let decl = DeclExternType { token: extern_token, name, fields, annotations: annos };
        let sym = self.tables.insert(self.cur_table, Decl::ExternType(decl.clone()));
        if child.is_some() {
            self.tables.symbol_mut(sym).child_table = child;
        }
        Decl::ExternType(decl)
    }

    fn parse_extern_func_decl(&mut self, extern_token: Token, annos: AnnotationChain) -> Decl {
        self.expect(&[TokenKind::Func]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let name = Identifier::new(name_token);

        let child = self.push_function_table(extern_token.clone());
        self.expect(&[TokenKind::Lparen]);
        let mut params = Vec::new();
        if !self.cur_is(&[TokenKind::Rparen]) {
            params = self.parse_decl_parameter_list();
        }
        self.expect(&[TokenKind::Rparen]);
        self.pop_symbol_table();

        let decl = DeclExternFunc { token: extern_token, name, params, annotations: annos };
        let sym = self.tables.insert(self.cur_table, Decl::ExternFunc(decl.clone()));
        self.tables.symbol_mut(sym).child_table = Some(child);
        Decl::ExternFunc(decl)
    }

    fn parse_extern_value_decl(&mut self, extern_token: Token, annos: AnnotationChain) -> Decl {
        self.expect(&[TokenKind::Let]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let decl = DeclExternValue { token: extern_token, name: Identifier::new(name_token), annotations: annos };
        self.tables.insert(self.cur_table, Decl::ExternValue(decl.clone()));
        Decl::ExternValue(decl)
    }

    /// `data NAME [{ field … }]` — the body opens a child symbol table the
    /// fields are registered in.
    fn parse_data_decl(&mut self, _pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        let (data_token, _) = self.expect(&[TokenKind::Data]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let docs = Docs::from_token(&data_token);
        let name = Identifier::new(name_token);

        let preliminary = DeclData {
            token: data_token.clone(),
            name: name.clone(),
            fields: Vec::new(),
            annotations: annos.clone(),
            docs: docs.clone(),
        };
        let sym = self.tables.insert(self.cur_table, Decl::Data(preliminary.clone()));
        let child = self.tables.push_table(Some(self.cur_table), Some(data_token.clone()), SymbolScope::Local);
        self.tables.symbol_mut(sym).child_table = Some(child);
        self.cur_table = child;

        let mut fields = Vec::new();
        if self.cur_is(&[TokenKind::Lbrace]) {
            self.expect(&[TokenKind::Lbrace]);
            fields = self.parse_property_declaration_list();
            self.expect(&[TokenKind::Rbrace]);
        }
        self.pop_symbol_table();

        let decl = DeclData { token: data_token, name, fields, annotations: annos, docs };
        // Propagate the parsed fields into the registered declaration,
        // unless the insert hit a redeclaration and kept an older one.
        {
            let registered = self.tables.symbol_mut(sym);
            if registered.decl.as_ref() == Some(&Decl::Data(preliminary)) {
                registered.decl = Some(Decl::Data(decl.clone()));
            }
        }
        Some(Decl::Data(decl))
    }

    /// `annotation NAME [{ field … }]`.
    fn parse_annotation_decl(&mut self, _pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        let (anno_token, _) = self.expect(&[TokenKind::Annotation]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let name = Identifier::new(name_token);

        let mut fields = Vec::new();
        if self.cur_is(&[TokenKind::Lbrace]) {
            self.expect(&[TokenKind::Lbrace]);
            fields = self.parse_property_declaration_list();
            self.expect(&[TokenKind::Rbrace]);
        }
        Some(Decl::Annotation(DeclAnnotation { token: anno_token, name, fields, annotations: annos }))
    }

    /// `enum NAME [{ case … }]`. Nested `data`/`enum` cases are returned as
    /// child declarations to be hoisted into the enum's parent scope.
    fn parse_enum_decl(&mut self, pos: StatementPosition, annos: AnnotationChain) -> (Option<DeclEnum>, Vec<Decl>) {
        let (enum_token, _) = self.expect(&[TokenKind::Enum]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let docs = Docs::from_token(&enum_token);
        let mut decl = DeclEnum {
            token: enum_token,
            name: Identifier::new(name_token),
            cases: Vec::new(),
            annotations: annos,
            docs,
        };

        if !self.cur_is(&[TokenKind::Lbrace]) {
            return (Some(decl), Vec::new());
        }
        self.expect(&[TokenKind::Lbrace]);

        let mut child_decls = Vec::new();
        while !self.cur_is(&[TokenKind::Rbrace, TokenKind::Eof]) {
            let (case, children) = self.parse_enum_decl_case(pos);
            child_decls.extend(children);
            match case {
                Some(case) => decl.cases.push(case),
                None => {
                    self.next_token();
                }
            }
        }
        self.expect(&[TokenKind::Rbrace]);

        (Some(decl), child_decls)
    }

    /// A case is a bare (possibly dotted) reference, or an annotated nested
    /// `data`/`enum` declaration.
    fn parse_enum_decl_case(&mut self, pos: StatementPosition) -> (Option<DeclEnumCase>, Vec<Decl>) {
        if self.cur.kind == TokenKind::Ident {
            let reference = self.parse_static_reference();
            let token = reference.token().clone();
            return (Some(DeclEnumCase { token, reference }), Vec::new());
        }
        let annos = self.parse_annotation_chain();
        match self.cur.kind {
            TokenKind::Data => match self.parse_data_decl(pos, annos) {
                Some(data) => {
                    let case = DeclEnumCase {
                        token: data.token().clone(),
                        reference: StaticReference(vec![data.name().clone()]),
                    };
                    (Some(case), vec![data])
                }
                None => (None, Vec::new()),
            },
            TokenKind::Enum => {
                let (nested, mut children) = self.parse_enum_decl(pos, annos);
                match nested {
                    Some(nested) => {
                        let case = DeclEnumCase {
                            token: nested.token.clone(),
                            reference: StaticReference(vec![nested.name.clone()]),
                        };
                        children.push(Decl::Enum(nested));
                        (Some(case), children)
                    }
                    None => (None, children),
                }
            }
            _ => {
                self.err_unexpected_token(&[TokenKind::Data, TokenKind::Enum]);
                (None, Vec::new())
            }
        }
    }

    /// `func NAME ( params ) { block }` or `func NAME { params -> block }`.
    fn parse_function_decl(&mut self, _pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        let (func_token, _) = self.expect(&[TokenKind::Func]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let docs = Docs::from_token(&func_token);

        let implementation = if self.cur_is(&[TokenKind::Lparen]) {
            let table = self.push_function_table(func_token.clone());

            self.expect(&[TokenKind::Lparen]);
            let params = self.parse_decl_parameter_list();
            self.expect(&[TokenKind::Rparen]);

            let (brace_token, _) = self.expect(&[TokenKind::Lbrace]);
            let body = self.parse_stmt_block(StatementPosition::Func);
            self.expect(&[TokenKind::Rbrace]);
            self.pop_symbol_table();

            ExprFunc { token: brace_token, name: name_token.literal.clone(), params, body, table }
        } else {
            self.parse_expr_function()?
        };

        let table = implementation.table;
        let decl = DeclFunc { token: func_token, name: Identifier::new(name_token), implementation, annotations: annos, docs };
        let sym = self.tables.insert(self.cur_table, Decl::Func(decl.clone()));
        self.tables.symbol_mut(sym).child_table = Some(table);
        Some(Decl::Func(decl))
    }

    /// `import [alias =] path[.name] { member, … }`.
    fn parse_import_decl(&mut self, pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        if pos != StatementPosition::Initial && pos != StatementPosition::Global {
            self.err_statement_misplaced(pos);
        }
        if !annos.is_empty() {
            self.err_cannot_be_annotated();
        }
        let (import_token, _) = self.expect(&[TokenKind::Import]);

        let mut decl = if self.peek_is(&[TokenKind::Assign]) {
            let (alias_token, _) = self.expect(&[TokenKind::Ident]);
            self.expect(&[TokenKind::Assign]);
            let reference = self.parse_static_reference();
            DeclImport::with_alias(import_token, Identifier::new(alias_token), reference)
        } else {
            let reference = self.parse_static_reference();
            DeclImport::from_reference(import_token, reference)
        };

        if !self.cur_is(&[TokenKind::Lbrace]) {
            return Some(Decl::Import(decl));
        }
        self.expect(&[TokenKind::Lbrace]);
        while !self.cur_is(&[TokenKind::Rbrace, TokenKind::Eof]) {
            let (member_token, ok) = self.expect(&[TokenKind::Ident]);
            if !ok {
                self.next_token();
                continue;
            }
            let member = DeclImportMember {
                token: member_token.clone(),
                module: decl.module.clone(),
                name: Identifier::new(member_token),
            };
            self.tables.insert(self.cur_table, Decl::ImportMember(member.clone()));
            decl.members.push(member);

            if self.cur_is(&[TokenKind::Comma]) {
                self.expect(&[TokenKind::Comma]);
            }
        }
        self.expect(&[TokenKind::Rbrace]);
        Some(Decl::Import(decl))
    }

    /// `let NAME = expr` — a global slot at file scope, a local slot inside
    /// functions.
    fn parse_variable_decl(&mut self, pos: StatementPosition, annos: AnnotationChain) -> Option<Decl> {
        let (let_token, _) = self.expect(&[TokenKind::Let]);
        let (name_token, _) = self.expect(&[TokenKind::Ident]);
        let docs = Docs::from_token(&let_token);
        self.expect(&[TokenKind::Assign]);
        let value = self.parse_expr().unwrap_or_else(|| error_expr(&let_token));

        let decl = DeclVariable {
            token: let_token,
            name: Identifier::new(name_token),
            value,
            is_global: pos < StatementPosition::Func,
            annotations: annos,
            docs,
        };
        self.tables.insert(self.cur_table, Decl::Variable(decl.clone()));
        Some(Decl::Variable(decl))
    }

    // === Shared pieces ===================================================

    fn parse_static_reference(&mut self) -> StaticReference {
        let mut segments = Vec::new();
        loop {
            let (ident_token, ok) = self.expect(&[TokenKind::Ident]);
            if !ok {
                break;
            }
            segments.push(Identifier::new(ident_token));

            if !self.cur_is(&[TokenKind::Dot]) {
                break;
            }
            self.expect(&[TokenKind::Dot]);
        }
        if segments.is_empty() {
            self.expect_peek(&[TokenKind::Ident]);
            return StaticReference(vec![Identifier::new(self.error_token())]);
        }
        StaticReference(segments)
    }

    fn parse_property_declaration_list(&mut self) -> Vec<DeclField> {
        let mut fields = Vec::new();
        while !self.cur_is(&[TokenKind::Rbrace, TokenKind::Eof]) {
            match self.parse_data_decl_field() {
                Some(field) => {
                    self.tables.insert(self.cur_table, Decl::Field(field.clone()));
                    fields.push(field);
                }
                None => {
                    self.next_token();
                }
            }
        }
        fields
    }

    /// A single field: `[@anno …] NAME [( params )]`.
    fn parse_data_decl_field(&mut self) -> Option<DeclField> {
        let annos = self.parse_annotation_chain();
        let (ident_token, ok) = self.expect(&[TokenKind::Ident]);
        if !ok {
            return None;
        }
        let docs = Docs::from_token(&ident_token);
        let name = Identifier::new(ident_token);

        if !self.cur_is(&[TokenKind::Lparen]) {
            return Some(DeclField { name, params: None, annotations: annos, docs });
        }

        self.expect(&[TokenKind::Lparen]);
        let params = self.parse_decl_parameter_list();
        self.expect(&[TokenKind::Rparen]);
        Some(DeclField { name, params: Some(params), annotations: annos, docs })
    }

    fn parse_annotation_chain(&mut self) -> AnnotationChain {
        let mut chain = AnnotationChain::new();
        while self.cur_is(&[TokenKind::At]) {
            if let Some(anno) = self.parse_annotation_instance() {
                chain.push(anno);
            }
        }
        chain
    }

    fn parse_annotation_instance(&mut self) -> Option<AnnotationInstance> {
        let (at_token, _) = self.expect(&[TokenKind::At]);
        let reference = self.parse_static_reference();
        self.tables.lookup_annotation(self.cur_table, &reference.0[0].value, reference.token().clone());

        let mut instance = AnnotationInstance { token: at_token, reference, arguments: Vec::new() };
        if !self.cur_is(&[TokenKind::Lparen]) {
            return Some(instance);
        }
        self.expect(&[TokenKind::Lparen]);
        while !self.cur_is(&[TokenKind::Rparen, TokenKind::Eof]) {
            match self.parse_expr() {
                Some(arg) => instance.arguments.push(arg),
                None => break,
            }
            if !self.cur_is(&[TokenKind::Comma]) {
                break;
            }
            self.expect(&[TokenKind::Comma]);
        }
        self.expect(&[TokenKind::Rparen]);
        Some(instance)
    }

    /// Parameters are registered in the current (function) table as they
    /// are parsed. The blank identifier is accepted but not registered.
    pub(super) fn parse_decl_parameter_list(&mut self) -> Vec<DeclParameter> {
        let mut params = Vec::new();
        loop {
            let annos = self.parse_annotation_chain();
            if !self.cur_is(&[TokenKind::Ident, TokenKind::Blank]) {
                // eventual errors will be triggered by the caller
                return params;
            }
            let is_blank = self.cur.kind == TokenKind::Blank;
            let (ident_token, _) = self.expect(&[TokenKind::Ident, TokenKind::Blank]);
            let decl = DeclParameter { name: Identifier::new(ident_token), annotations: annos };
            if !is_blank {
                self.tables.insert(self.cur_table, Decl::Parameter(decl.clone()));
            }
            params.push(decl);

            if !self.cur_is(&[TokenKind::Comma]) {
                return params;
            }
            self.expect(&[TokenKind::Comma]);
        }
    }

}

/// Placeholder expression for unrecoverable sub-parses; carries the
/// construct's token so diagnostics stay anchored.
fn error_expr(token: &Token) -> crate::ast::Expr {
    crate::ast::Expr::Null { token: token.clone() }
}

/// Collects symbol and usage errors of a whole table tree as parse errors.
#[must_use]
pub fn symbol_errors(tables: &SymbolTables, root: TableId) -> Vec<ParseError> {
    tables
        .collect_errors(root)
        .into_iter()
        .map(|(token, summary, details)| ParseError { token, summary, details })
        .collect()
}
