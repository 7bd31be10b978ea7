//! Syntax tree for cairn sources.
//!
//! The tree is split into three tagged categories — [`Decl`], [`Stmt`] and
//! [`Expr`] — with boxed payloads for the recursive variants. Every node
//! exposes its representative token; [`NodeRef`] plus the per-category
//! `for_each_child` methods provide the generic child walk.
//!
//! Declarations do not stay in statement lists: [`SourceFile::add`] moves
//! them into the file's symbol table, leaving only runnable statements in
//! the ordered list.

pub mod symbols;

use std::fmt;

use crate::{
    source::LogicalUri,
    token::{DecorativeKind, SourcePos, Token, TokenKind},
};

pub use symbols::{Symbol, SymbolId, SymbolScope, SymbolTables, TableId, Usage};

/// Visibility of a declaration.
///
/// Top-level names starting with `_` are public, other top-level names are
/// internal to their module, and declarations inside functions are local.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Local,
    Internal,
    Public,
}

fn named_export_scope(name: &Identifier) -> ExportScope {
    if name.value.starts_with('_') { ExportScope::Public } else { ExportScope::Internal }
}

/// Documentation lines attached to a declaration, collected from the
/// comment trivia leading its first token.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Docs {
    pub lines: Vec<String>,
}

impl Docs {
    /// Collects the comment trivia leading `token`.
    #[must_use]
    pub fn from_token(token: &Token) -> Self {
        let lines = token
            .leading
            .iter()
            .filter(|d| d.kind == DecorativeKind::Comment)
            .map(|d| d.literal.clone())
            .collect();
        Self { lines }
    }
}

/// A name occurrence with its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identifier {
    pub token: Token,
    pub value: String,
}

impl Identifier {
    #[must_use]
    pub fn new(token: Token) -> Self {
        let value = token.literal.clone();
        Self { token, value }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// A static reference: a dotted, fully qualified identifier path.
///
/// Invariant: contains at least one identifier; the last segment is the
/// reference's name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaticReference(pub Vec<Identifier>);

impl StaticReference {
    #[must_use]
    pub fn name(&self) -> &Identifier {
        self.0.last().expect("static reference must not be empty")
    }

    #[must_use]
    pub fn token(&self) -> &Token {
        &self.0[0].token
    }
}

impl fmt::Display for StaticReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, ident) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            f.write_str(&ident.value)?;
        }
        Ok(())
    }
}

/// A dotted module path, e.g. `tests.helpers`.
pub type ModulePath = Vec<Identifier>;

/// One `@Annotation(args…)` application.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationInstance {
    pub token: Token,
    pub reference: StaticReference,
    pub arguments: Vec<Expr>,
}

/// The chain of annotations preceding a declaration, outermost first.
pub type AnnotationChain = Vec<AnnotationInstance>;

/// An ordered statement block.
pub type Block = Vec<Stmt>;

// === Expressions =========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Bool(ExprLit<bool>),
    Int(ExprLit<i64>),
    Float(ExprLit<f64>),
    Char(ExprLit<char>),
    String(ExprLit<String>),
    Null { token: Token },
    Identifier(Identifier),
    Array { token: Token, elements: Vec<Expr> },
    Dict { token: Token, entries: Vec<DictEntry> },
    Member { token: Token, target: Box<Expr>, property: Identifier },
    Index { token: Token, target: Box<Expr>, index: Box<Expr> },
    Invocation { callee: Box<Expr>, arguments: Vec<Expr> },
    Unary { op: Token, expr: Box<Expr> },
    Binary { op: Token, left: Box<Expr>, right: Box<Expr> },
    If(Box<ExprIf>),
    Func(ExprFunc),
}

/// A literal with its token.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprLit<T> {
    pub value: T,
    pub token: Token,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DictEntry {
    pub key: Expr,
    pub value: Expr,
}

/// An `if` expression; the else branch is mandatory.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprIf {
    pub token: Token,
    pub condition: Expr,
    pub then: Expr,
    pub else_ifs: Vec<ExprElseIf>,
    pub else_expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExprElseIf {
    pub token: Token,
    pub condition: Expr,
    pub then: Expr,
}

/// A function literal: parameters, body block, and its own symbol table.
#[derive(Debug, Clone, PartialEq)]
pub struct ExprFunc {
    pub token: Token,
    pub name: String,
    pub params: Vec<DeclParameter>,
    pub body: Block,
    pub table: TableId,
}

impl Expr {
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Bool(lit) => &lit.token,
            Self::Int(lit) => &lit.token,
            Self::Float(lit) => &lit.token,
            Self::Char(lit) => &lit.token,
            Self::String(lit) => &lit.token,
            Self::Null { token }
            | Self::Array { token, .. }
            | Self::Dict { token, .. }
            | Self::Member { token, .. }
            | Self::Index { token, .. } => token,
            Self::Identifier(ident) => &ident.token,
            Self::Invocation { callee, .. } => callee.token(),
            Self::Unary { op, .. } | Self::Binary { op, .. } => op,
            Self::If(expr_if) => &expr_if.token,
            Self::Func(func) => &func.token,
        }
    }

    /// Invokes `action` on every direct child node.
    pub fn for_each_child<'a>(&'a self, action: &mut dyn FnMut(NodeRef<'a>)) {
        match self {
            Self::Bool(_) | Self::Int(_) | Self::Float(_) | Self::Char(_) | Self::String(_) | Self::Null { .. } => {}
            Self::Identifier(ident) => action(NodeRef::Ident(ident)),
            Self::Array { elements, .. } => {
                for el in elements {
                    action(NodeRef::Expr(el));
                }
            }
            Self::Dict { entries, .. } => {
                for entry in entries {
                    action(NodeRef::Expr(&entry.key));
                    action(NodeRef::Expr(&entry.value));
                }
            }
            Self::Member { target, property, .. } => {
                action(NodeRef::Expr(target));
                action(NodeRef::Ident(property));
            }
            Self::Index { target, index, .. } => {
                action(NodeRef::Expr(target));
                action(NodeRef::Expr(index));
            }
            Self::Invocation { callee, arguments } => {
                action(NodeRef::Expr(callee));
                for arg in arguments {
                    action(NodeRef::Expr(arg));
                }
            }
            Self::Unary { expr, .. } => action(NodeRef::Expr(expr)),
            Self::Binary { left, right, .. } => {
                action(NodeRef::Expr(left));
                action(NodeRef::Expr(right));
            }
            Self::If(expr_if) => {
                action(NodeRef::Expr(&expr_if.condition));
                action(NodeRef::Expr(&expr_if.then));
                for elif in &expr_if.else_ifs {
                    action(NodeRef::Expr(&elif.condition));
                    action(NodeRef::Expr(&elif.then));
                }
                action(NodeRef::Expr(&expr_if.else_expr));
            }
            Self::Func(func) => {
                for stmt in &func.body {
                    action(NodeRef::Stmt(stmt));
                }
            }
        }
    }
}

impl fmt::Display for Expr {
    /// Printable form; reparsing it yields a semantically equal expression
    /// (function bodies print as a statement-count placeholder).
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(lit) => write!(f, "{}", lit.value),
            Self::Int(lit) => write!(f, "{}", lit.value),
            Self::Float(lit) => write!(f, "{}", lit.value),
            Self::Char(lit) => write!(f, "'{}'", escape_char(lit.value)),
            Self::String(lit) => write!(f, "\"{}\"", escape_string(&lit.value)),
            Self::Null { .. } => f.write_str("null"),
            Self::Identifier(ident) => f.write_str(&ident.value),
            Self::Array { elements, .. } => {
                f.write_str("[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{el}")?;
                }
                f.write_str("]")
            }
            Self::Dict { entries, .. } => {
                if entries.is_empty() {
                    return f.write_str("[:]");
                }
                f.write_str("[")?;
                for (i, entry) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", entry.key, entry.value)?;
                }
                f.write_str("]")
            }
            Self::Member { target, property, .. } => write!(f, "{target}.{property}"),
            Self::Index { target, index, .. } => write!(f, "{target}[{index}]"),
            Self::Invocation { callee, arguments } => {
                write!(f, "{callee}(")?;
                for (i, arg) in arguments.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{arg}")?;
                }
                f.write_str(")")
            }
            Self::Unary { op, expr } => write!(f, "({}{expr})", op.literal),
            Self::Binary { op, left, right } => write!(f, "({left}{}{right})", op.literal),
            Self::If(expr_if) => {
                write!(f, "(if {} {{ {} }}", expr_if.condition, expr_if.then)?;
                for elif in &expr_if.else_ifs {
                    write!(f, " else if {} {{ {} }}", elif.condition, elif.then)?;
                }
                write!(f, " else {{ {} }})", expr_if.else_expr)
            }
            Self::Func(func) => {
                f.write_str("{")?;
                for (i, param) in func.params.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    f.write_str(&param.name.value)?;
                }
                write!(f, "->/* {} stmts */}}", func.body.len())
            }
        }
    }
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_owned(),
        '\t' => "\\t".to_owned(),
        '\r' => "\\r".to_owned(),
        '\\' => "\\\\".to_owned(),
        '\'' => "\\'".to_owned(),
        other => other.to_string(),
    }
}

fn escape_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            other => out.push(other),
        }
    }
    out
}

// === Statements ==========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Expr(StmtExpr),
    If(StmtIf),
    Return(StmtReturn),
    Decl(Decl),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtExpr {
    pub token: Token,
    pub expr: Expr,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtIf {
    pub token: Token,
    pub condition: Expr,
    pub then_block: Block,
    pub else_ifs: Vec<StmtElseIf>,
    pub else_block: Option<Block>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtElseIf {
    pub token: Token,
    pub condition: Expr,
    pub block: Block,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StmtReturn {
    pub token: Token,
    pub expr: Option<Expr>,
}

impl Stmt {
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Expr(stmt) => &stmt.token,
            Self::If(stmt) => &stmt.token,
            Self::Return(stmt) => &stmt.token,
            Self::Decl(decl) => decl.token(),
        }
    }

    pub fn for_each_child<'a>(&'a self, action: &mut dyn FnMut(NodeRef<'a>)) {
        match self {
            Self::Expr(stmt) => action(NodeRef::Expr(&stmt.expr)),
            Self::If(stmt) => {
                action(NodeRef::Expr(&stmt.condition));
                for s in &stmt.then_block {
                    action(NodeRef::Stmt(s));
                }
                for elif in &stmt.else_ifs {
                    action(NodeRef::Expr(&elif.condition));
                    for s in &elif.block {
                        action(NodeRef::Stmt(s));
                    }
                }
                for s in stmt.else_block.iter().flatten() {
                    action(NodeRef::Stmt(s));
                }
            }
            Self::Return(stmt) => {
                if let Some(expr) = &stmt.expr {
                    action(NodeRef::Expr(expr));
                }
            }
            Self::Decl(decl) => decl.for_each_child(action),
        }
    }
}

// === Declarations ========================================================

#[derive(Debug, Clone, PartialEq)]
pub enum Decl {
    Variable(DeclVariable),
    Func(DeclFunc),
    Data(DeclData),
    Enum(DeclEnum),
    EnumCase(DeclEnumCase),
    Annotation(DeclAnnotation),
    ExternType(DeclExternType),
    ExternFunc(DeclExternFunc),
    ExternValue(DeclExternValue),
    Import(DeclImport),
    ImportMember(DeclImportMember),
    Module(DeclModule),
    Field(DeclField),
    Parameter(DeclParameter),
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclVariable {
    pub token: Token,
    pub name: Identifier,
    pub value: Expr,
    pub is_global: bool,
    pub annotations: AnnotationChain,
    pub docs: Docs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclFunc {
    pub token: Token,
    pub name: Identifier,
    pub implementation: ExprFunc,
    pub annotations: AnnotationChain,
    pub docs: Docs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclData {
    pub token: Token,
    pub name: Identifier,
    pub fields: Vec<DeclField>,
    pub annotations: AnnotationChain,
    pub docs: Docs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclEnum {
    pub token: Token,
    pub name: Identifier,
    pub cases: Vec<DeclEnumCase>,
    pub annotations: AnnotationChain,
    pub docs: Docs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclEnumCase {
    pub token: Token,
    pub reference: StaticReference,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclAnnotation {
    pub token: Token,
    pub name: Identifier,
    pub fields: Vec<DeclField>,
    pub annotations: AnnotationChain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclExternType {
    pub token: Token,
    pub name: Identifier,
    pub fields: Vec<DeclField>,
    pub annotations: AnnotationChain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclExternFunc {
    pub token: Token,
    pub name: Identifier,
    pub params: Vec<DeclParameter>,
    pub annotations: AnnotationChain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclExternValue {
    pub token: Token,
    pub name: Identifier,
    pub annotations: AnnotationChain,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclImport {
    pub token: Token,
    pub alias: Identifier,
    pub module: ModulePath,
    pub members: Vec<DeclImportMember>,
}

impl DeclImport {
    /// `import a.b.c`: the trailing segment becomes the alias and the rest
    /// is the module path.
    #[must_use]
    pub fn from_reference(token: Token, reference: StaticReference) -> Self {
        let mut module = reference.0;
        let alias = module.pop().expect("static reference must not be empty");
        Self { token, alias, module, members: Vec::new() }
    }

    /// `import alias = a.b.c`: the full reference is the module path.
    #[must_use]
    pub fn with_alias(token: Token, alias: Identifier, reference: StaticReference) -> Self {
        Self { token, alias, module: reference.0, members: Vec::new() }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclImportMember {
    pub token: Token,
    pub module: ModulePath,
    pub name: Identifier,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclModule {
    pub token: Token,
    pub name: Identifier,
    pub annotations: AnnotationChain,
}

/// A field of a `data`, `annotation` or `extern type` declaration. A field
/// with a parameter list declares a method-shaped member.
#[derive(Debug, Clone, PartialEq)]
pub struct DeclField {
    pub name: Identifier,
    pub params: Option<Vec<DeclParameter>>,
    pub annotations: AnnotationChain,
    pub docs: Docs,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeclParameter {
    pub name: Identifier,
    pub annotations: AnnotationChain,
}

impl Decl {
    #[must_use]
    pub fn name(&self) -> &Identifier {
        match self {
            Self::Variable(d) => &d.name,
            Self::Func(d) => &d.name,
            Self::Data(d) => &d.name,
            Self::Enum(d) => &d.name,
            Self::EnumCase(d) => d.reference.name(),
            Self::Annotation(d) => &d.name,
            Self::ExternType(d) => &d.name,
            Self::ExternFunc(d) => &d.name,
            Self::ExternValue(d) => &d.name,
            Self::Import(d) => &d.alias,
            Self::ImportMember(d) => &d.name,
            Self::Module(d) => &d.name,
            Self::Field(d) => &d.name,
            Self::Parameter(d) => &d.name,
        }
    }

    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Variable(d) => &d.token,
            Self::Func(d) => &d.token,
            Self::Data(d) => &d.token,
            Self::Enum(d) => &d.token,
            Self::EnumCase(d) => &d.token,
            Self::Annotation(d) => &d.token,
            Self::ExternType(d) => &d.token,
            Self::ExternFunc(d) => &d.token,
            Self::ExternValue(d) => &d.token,
            Self::Import(d) => &d.token,
            Self::ImportMember(d) => &d.token,
            Self::Module(d) => &d.token,
            Self::Field(d) => &d.name.token,
            Self::Parameter(d) => &d.name.token,
        }
    }

    #[must_use]
    pub fn export_scope(&self) -> ExportScope {
        match self {
            Self::Variable(d) => {
                if d.is_global { named_export_scope(&d.name) } else { ExportScope::Local }
            }
            Self::Func(d) => named_export_scope(&d.name),
            Self::Data(d) => named_export_scope(&d.name),
            Self::Enum(d) => named_export_scope(&d.name),
            Self::EnumCase(d) => named_export_scope(d.reference.name()),
            Self::Annotation(d) => named_export_scope(&d.name),
            Self::ExternType(d) => named_export_scope(&d.name),
            Self::ExternFunc(d) => named_export_scope(&d.name),
            Self::ExternValue(d) => named_export_scope(&d.name),
            Self::Field(d) => named_export_scope(&d.name),
            Self::Import(_) | Self::ImportMember(_) | Self::Module(_) | Self::Parameter(_) => ExportScope::Local,
        }
    }

    /// One-line summary of the declaration, used by tooling surfaces.
    #[must_use]
    pub fn overview(&self) -> String {
        match self {
            Self::Variable(d) => format!("let {}", d.name),
            Self::Func(d) => {
                if d.implementation.params.is_empty() {
                    format!("func {} {{ -> }}", d.name)
                } else {
                    let params: Vec<&str> = d.implementation.params.iter().map(|p| p.name.value.as_str()).collect();
                    format!("func {} {{ {} -> }}", d.name, params.join(", "))
                }
            }
            Self::Data(d) => {
                if d.fields.is_empty() {
                    format!("data {}", d.name)
                } else {
                    let fields: Vec<&str> = d.fields.iter().map(|f| f.name.value.as_str()).collect();
                    format!("data {} {{ {} }}", d.name, fields.join(", "))
                }
            }
            Self::Enum(d) => {
                if d.cases.is_empty() {
                    format!("enum {}", d.name)
                } else {
                    let cases: Vec<String> = d.cases.iter().map(|c| c.reference.to_string()).collect();
                    format!("enum {} {{ {} }}", d.name, cases.join(", "))
                }
            }
            Self::EnumCase(d) => d.reference.to_string(),
            Self::Annotation(d) => format!("annotation {}", d.name),
            Self::ExternType(d) => format!("extern type {}", d.name),
            Self::ExternFunc(d) => format!("extern func {}(#{})", d.name, d.params.len()),
            Self::ExternValue(d) => format!("extern let {}", d.name),
            Self::Import(d) => {
                let path: Vec<&str> = d.module.iter().map(|i| i.value.as_str()).collect();
                format!("import {} = {}", d.alias, path.join("."))
            }
            Self::ImportMember(d) => format!("import {{ {} }}", d.name),
            Self::Module(d) => format!("module {}", d.name),
            Self::Field(d) => d.name.value.clone(),
            Self::Parameter(d) => d.name.value.clone(),
        }
    }

    pub fn for_each_child<'a>(&'a self, action: &mut dyn FnMut(NodeRef<'a>)) {
        match self {
            Self::Variable(d) => {
                action(NodeRef::Ident(&d.name));
                action(NodeRef::Expr(&d.value));
            }
            Self::Func(d) => {
                action(NodeRef::Ident(&d.name));
                for stmt in &d.implementation.body {
                    action(NodeRef::Stmt(stmt));
                }
            }
            Self::Data(d) => {
                action(NodeRef::Ident(&d.name));
                for field in &d.fields {
                    action(NodeRef::Ident(&field.name));
                }
            }
            Self::Enum(d) => {
                action(NodeRef::Ident(&d.name));
                for case in &d.cases {
                    action(NodeRef::Ident(case.reference.name()));
                }
            }
            Self::EnumCase(d) => action(NodeRef::Ident(d.reference.name())),
            Self::Annotation(d) => {
                action(NodeRef::Ident(&d.name));
                for field in &d.fields {
                    action(NodeRef::Ident(&field.name));
                }
            }
            Self::ExternType(d) => {
                action(NodeRef::Ident(&d.name));
                for field in &d.fields {
                    action(NodeRef::Ident(&field.name));
                }
            }
            Self::ExternFunc(d) => {
                action(NodeRef::Ident(&d.name));
                for param in &d.params {
                    action(NodeRef::Ident(&param.name));
                }
            }
            Self::ExternValue(d) => action(NodeRef::Ident(&d.name)),
            Self::Import(d) => {
                action(NodeRef::Ident(&d.alias));
                for member in &d.members {
                    action(NodeRef::Ident(&member.name));
                }
            }
            Self::ImportMember(d) => action(NodeRef::Ident(&d.name)),
            Self::Module(d) => action(NodeRef::Ident(&d.name)),
            Self::Field(d) => {
                action(NodeRef::Ident(&d.name));
                for param in d.params.iter().flatten() {
                    action(NodeRef::Ident(&param.name));
                }
            }
            Self::Parameter(d) => action(NodeRef::Ident(&d.name)),
        }
    }
}

/// A borrowed reference to any node category, used by the child walks.
#[derive(Debug, Clone, Copy)]
pub enum NodeRef<'a> {
    Expr(&'a Expr),
    Stmt(&'a Stmt),
    Decl(&'a Decl),
    Ident(&'a Identifier),
}

impl NodeRef<'_> {
    #[must_use]
    pub fn token(&self) -> &Token {
        match self {
            Self::Expr(e) => e.token(),
            Self::Stmt(s) => s.token(),
            Self::Decl(d) => d.token(),
            Self::Ident(i) => &i.token,
        }
    }
}

// === Containers ==========================================================

/// One parsed source file: its runnable statements plus a symbol table
/// parented to the module's table.
#[derive(Debug)]
pub struct SourceFile {
    pub token: Token,
    pub path: String,
    pub statements: Vec<Stmt>,
    pub table: TableId,
}

impl SourceFile {
    #[must_use]
    pub fn new(tables: &mut SymbolTables, parent: Option<TableId>, path: impl Into<String>, token: Token) -> Self {
        let table = tables.push_table(parent, Some(token.clone()), SymbolScope::Global);
        Self { token, path: path.into(), statements: Vec::new(), table }
    }

    /// Adds a top-level statement. Declarations move into the symbol table
    /// (unless the parser already registered them); runnable statements are
    /// appended in order.
    pub fn add(&mut self, tables: &mut SymbolTables, stmt: Stmt) {
        if let Stmt::Decl(decl) = stmt {
            let already_declared = tables
                .resolve(self.table, &decl.name().value)
                .is_some_and(|sym| tables.symbol(sym).decl.is_some());
            if !already_declared {
                tables.insert(self.table, decl);
            }
            return;
        }
        self.statements.push(stmt);
    }
}

/// A module under compilation: a logical URI and the source files sharing
/// one symbol table.
#[derive(Debug)]
pub struct ContextModule {
    pub name: LogicalUri,
    pub table: TableId,
    pub files: Vec<SourceFile>,
}

impl ContextModule {
    #[must_use]
    pub fn new(tables: &mut SymbolTables, name: LogicalUri) -> Self {
        let table = tables.push_table(None, None, SymbolScope::Global);
        Self { name, table, files: Vec::new() }
    }

    pub fn add_source_file(&mut self, file: SourceFile) {
        self.files.push(file);
    }

    #[must_use]
    pub fn token(&self) -> Token {
        Token::new(
            TokenKind::ModuleDirectory,
            self.name.as_str(),
            SourcePos::new(self.name.clone(), 0),
        )
    }
}
