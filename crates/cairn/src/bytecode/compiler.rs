//! AST → bytecode compiler.
//!
//! Compilation of a source file runs two passes over its symbol table
//! before any statement is compiled: pass one *reserves* a slot for every
//! symbol (constant pool for callables and types, global slot for top-level
//! variables, local index for function-scoped variables and parameters),
//! pass two *defines* the reserved slots by building their values. Only
//! then are the remaining top-level statements compiled, so forward
//! references resolve without declaration-order bookkeeping.
//!
//! Unlike lex and parse errors, compile errors are fatal and abort
//! compilation.

use std::{fmt, sync::Arc};

use crate::{
    ast::{
        Block, ContextModule, Decl, ExportScope, Expr, ExprFunc, ExprIf, SourceFile, Stmt, StmtIf, SymbolId,
        SymbolScope, SymbolTables, TableId,
    },
    bytecode::{Bytecode, CodeBuilder, Opcode, op},
    runtime::PluginRegistry,
    token::TokenKind,
    value::{CompiledFunction, DataType, EnumType, PreludeType, Value},
};

/// A fatal compilation failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompileError {
    UnknownNode { node: String },
    UndefinedIdentifier { name: String },
    MissingConstantId { name: String },
    MissingSlot { name: String },
    MissingFieldSymbol { data: String, field: String },
    UnknownOperator { literal: String },
    UnsupportedCapture { name: String },
    UnboundExtern { name: String },
    SlotOverflow { what: &'static str },
}

impl fmt::Display for CompileError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownNode { node } => write!(f, "unknown ast node {node}"),
            Self::UndefinedIdentifier { name } => write!(f, "undefined identifier {name:?}"),
            Self::MissingConstantId { name } => write!(f, "identifier {name:?} has no constant id"),
            Self::MissingSlot { name } => write!(f, "variable {name:?} has no local or global id"),
            Self::MissingFieldSymbol { data, field } => {
                write!(f, "data {data:?} has no symbol for field {field:?}")
            }
            Self::UnknownOperator { literal } => write!(f, "unknown operator {literal:?}"),
            Self::UnsupportedCapture { name } => {
                write!(f, "cannot capture local {name:?} in a nested function")
            }
            Self::UnboundExtern { name } => write!(f, "no plugin binds extern {name:?}"),
            Self::SlotOverflow { what } => write!(f, "too many {what}"),
        }
    }
}

impl std::error::Error for CompileError {}

pub type CompileResult<T> = Result<T, CompileError>;

/// One compilation scope: the instruction stream under construction, the
/// governing symbol table, and the local slots reserved in it.
struct Scope {
    code: CodeBuilder,
    table: TableId,
    locals: Vec<SymbolId>,
}

impl Scope {
    fn new(table: TableId) -> Self {
        Self { code: CodeBuilder::new(), table, locals: Vec::new() }
    }
}

pub struct Compiler<'t> {
    tables: &'t mut SymbolTables,
    constants: Vec<Value>,
    globals: Vec<Option<Arc<[u8]>>>,
    plugins: PluginRegistry,
    scopes: Vec<Scope>,
}

impl<'t> Compiler<'t> {
    pub fn new(tables: &'t mut SymbolTables) -> Self {
        let base_table = tables.push_table(None, None, SymbolScope::Global);
        Self {
            tables,
            constants: Vec::new(),
            globals: Vec::new(),
            plugins: PluginRegistry::new(),
            scopes: vec![Scope::new(base_table)],
        }
    }

    pub fn with_plugins(tables: &'t mut SymbolTables, plugins: PluginRegistry) -> Self {
        let mut compiler = Self::new(tables);
        compiler.plugins = plugins;
        compiler
    }

    /// Compiles every file of a module; their top-level code is
    /// concatenated in file order.
    pub fn compile_module(&mut self, module: &ContextModule) -> CompileResult<()> {
        self.enter_scope(module.table);
        for file in &module.files {
            self.compile_source_file(file)?;
        }
        let scope = self.leave_scope();
        self.append_instructions(&scope.code.build());
        Ok(())
    }

    /// Compiles one source file: reserve pass, define pass, then the
    /// remaining top-level statements.
    pub fn compile_source_file(&mut self, file: &SourceFile) -> CompileResult<()> {
        self.enter_scope(file.table);

        let symbols = self.tables.symbols_of(file.table);
        for &sym in &symbols {
            self.reserve_symbol(sym)?;
        }
        for &sym in &symbols {
            self.define_symbol(sym)?;
        }

        for stmt in &file.statements {
            self.compile_stmt(stmt)?;
        }

        let scope = self.leave_scope();
        self.append_instructions(&scope.code.build());
        Ok(())
    }

    /// The finished artefact. Globals that were reserved but never defined
    /// keep an empty initialiser.
    #[must_use]
    pub fn bytecode(mut self) -> Bytecode {
        let scope = self.scopes.pop().expect("base scope present");
        let globals = self
            .globals
            .into_iter()
            .map(|init| init.unwrap_or_else(|| Arc::from(Vec::new().into_boxed_slice())))
            .collect();
        Bytecode { instructions: Arc::from(scope.code.build().into_boxed_slice()), constants: self.constants, globals }
    }

    // === Scopes and emission =============================================

    fn enter_scope(&mut self, table: TableId) {
        self.scopes.push(Scope::new(table));
    }

    fn leave_scope(&mut self) -> Scope {
        self.scopes.pop().expect("scope stack underflow")
    }

    fn scope(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack empty")
    }

    fn current_table(&self) -> TableId {
        self.scopes.last().expect("scope stack empty").table
    }

    fn emit(&mut self, opcode: Opcode, operands: &[u16]) -> usize {
        self.scope().code.emit(opcode, operands)
    }

    /// Appends a finished child stream onto the current scope, shifting the
    /// absolute targets of its jump instructions by the insertion offset.
    fn append_instructions(&mut self, child: &[u8]) {
        let base = self.scope().code.current_position();
        let mut offset = 0;
        while offset < child.len() {
            let Some(opcode) = Opcode::lookup(child[offset]) else {
                offset += 1;
                continue;
            };
            match opcode {
                Opcode::Jump | Opcode::JumpFalse | Opcode::JumpTrue => {
                    let target = usize::from(op::read_u16(&child[offset + 1..]));
                    let shifted = u16::try_from(target + base).unwrap_or(u16::MAX);
                    self.scope().code.emit(opcode, &[shifted]);
                }
                _ => {
                    let mut operands = [0u16; 1];
                    for (i, slot) in operands.iter_mut().enumerate().take(opcode.operand_count()) {
                        *slot = op::read_u16(&child[offset + 1 + 2 * i..]);
                    }
                    self.scope().code.emit(opcode, &operands[..opcode.operand_count()]);
                }
            }
            offset += opcode.width();
        }
    }

    fn add_constant(&mut self, value: Value) -> CompileResult<u16> {
        let id = u16::try_from(self.constants.len()).map_err(|_| CompileError::SlotOverflow { what: "constants" })?;
        self.constants.push(value);
        Ok(id)
    }

    fn reserve_constant(&mut self) -> CompileResult<u16> {
        self.add_constant(Value::Null)
    }

    fn reserve_global(&mut self) -> CompileResult<u16> {
        let id = u16::try_from(self.globals.len()).map_err(|_| CompileError::SlotOverflow { what: "globals" })?;
        self.globals.push(None);
        Ok(id)
    }

    // === Symbol reservation and definition ===============================

    /// Pass one: allocate a slot for one symbol.
    fn reserve_symbol(&mut self, sym: SymbolId) -> CompileResult<()> {
        enum Slot {
            Constant,
            Global,
            Local,
            None,
        }
        let slot = match self.tables.symbol(sym).decl.as_ref() {
            // Placeholders and free symbols resolve through their original.
            None => Slot::None,
            Some(
                Decl::Func(_)
                | Decl::Data(_)
                | Decl::Enum(_)
                | Decl::Annotation(_)
                | Decl::ExternFunc(_)
                | Decl::ExternType(_)
                | Decl::ExternValue(_),
            ) => Slot::Constant,
            Some(decl @ Decl::Variable(_)) => {
                if decl.export_scope() == ExportScope::Local {
                    Slot::Local
                } else {
                    Slot::Global
                }
            }
            Some(Decl::Parameter(_)) => Slot::Local,
            // No storage: resolved structurally or not at all.
            Some(Decl::Module(_) | Decl::Import(_) | Decl::ImportMember(_) | Decl::EnumCase(_) | Decl::Field(_)) => {
                Slot::None
            }
        };
        match slot {
            Slot::Constant => {
                let id = self.reserve_constant()?;
                self.tables.symbol_mut(sym).constant_id = Some(id);
            }
            Slot::Global => {
                let id = self.reserve_global()?;
                self.tables.symbol_mut(sym).global_id = Some(id);
            }
            Slot::Local => {
                let id = self.reserve_local(sym)?;
                self.tables.symbol_mut(sym).local_id = Some(id);
            }
            Slot::None => {}
        }
        Ok(())
    }

    fn reserve_local(&mut self, sym: SymbolId) -> CompileResult<u16> {
        let locals = &mut self.scope().locals;
        let id = u16::try_from(locals.len()).map_err(|_| CompileError::SlotOverflow { what: "locals" })?;
        locals.push(sym);
        Ok(id)
    }

    /// Pass two: build the value for one reserved symbol.
    fn define_symbol(&mut self, sym: SymbolId) -> CompileResult<()> {
        let Some(decl) = self.tables.symbol(sym).decl.as_ref() else {
            return Ok(());
        };
        match decl.clone() {
            Decl::Func(decl) => self.define_function(sym, &decl.implementation),
            Decl::Data(decl) => {
                let value = self.build_data_type(sym, decl.name.value.clone(), decl.fields.iter().map(|f| f.name.value.clone()))?;
                self.set_reserved_constant(sym, value)
            }
            Decl::Enum(decl) => {
                let constant_id = self.reserved_constant_id(sym)?;
                let cases = decl.cases.iter().map(|c| c.reference.name().value.clone()).collect();
                let value = Value::EnumType(Arc::new(EnumType {
                    symbol: sym,
                    constant_id,
                    name: decl.name.value.clone(),
                    cases,
                }));
                self.set_reserved_constant(sym, value)
            }
            Decl::Annotation(decl) => {
                // Annotation types behave like data constructors at runtime.
                let value =
                    self.build_data_type(sym, decl.name.value.clone(), decl.fields.iter().map(|f| f.name.value.clone()))?;
                self.set_reserved_constant(sym, value)
            }
            Decl::ExternFunc(_) | Decl::ExternType(_) | Decl::ExternValue(_) => {
                let table = self.current_table();
                match self.plugins.bind(self.tables, table, sym) {
                    Some(value) => self.set_reserved_constant(sym, value),
                    None => Err(CompileError::UnboundExtern { name: self.tables.symbol(sym).name.clone() }),
                }
            }
            Decl::Variable(decl) => {
                if decl.is_global {
                    // The initialiser compiles into its own stream and runs
                    // lazily in the VM, not at compile time.
                    let table = self.current_table();
                    self.enter_scope(table);
                    let result = self.compile_expr(&decl.value);
                    let scope = self.leave_scope();
                    result?;

                    let Some(global_id) = self.tables.symbol(sym).global_id else {
                        return Err(CompileError::MissingSlot { name: decl.name.value.clone() });
                    };
                    self.globals[usize::from(global_id)] = Some(Arc::from(scope.code.build().into_boxed_slice()));
                    Ok(())
                } else {
                    self.compile_expr(&decl.value)?;
                    let Some(local_id) = self.tables.symbol(sym).local_id else {
                        return Err(CompileError::MissingSlot { name: decl.name.value.clone() });
                    };
                    self.scope().locals[usize::from(local_id)] = sym;
                    self.emit(Opcode::SetLocal, &[local_id]);
                    Ok(())
                }
            }
            Decl::Module(_) | Decl::Import(_) | Decl::ImportMember(_) | Decl::EnumCase(_) | Decl::Field(_) => Ok(()),
            Decl::Parameter(_) => Ok(()),
        }
    }

    /// Compiles a function body into a `CompiledFunction` stored at the
    /// symbol's reserved constant slot.
    fn define_function(&mut self, sym: SymbolId, implementation: &ExprFunc) -> CompileResult<()> {
        let instructions = self.compile_function_body(implementation)?;
        let symbols = self.tables.len_of(implementation.table);
        let free = self.tables.table(implementation.table).free_symbols.len();
        let params = implementation.params.len();

        let function = CompiledFunction {
            instructions,
            params,
            symbol: Some(sym),
            name: implementation.name.clone(),
            frame_locals: params + (symbols - free),
        };
        self.set_reserved_constant(sym, Value::Function(Arc::new(function)))
    }

    /// Compiles a function scope: reserve its child symbols, compile the
    /// block, and guarantee a trailing return.
    fn compile_function_body(&mut self, implementation: &ExprFunc) -> CompileResult<Arc<[u8]>> {
        self.enter_scope(implementation.table);
        let result: CompileResult<()> = (|| {
            for sym in self.tables.symbols_of(implementation.table) {
                self.reserve_symbol(sym)?;
            }
            self.compile_block(&implementation.body)?;
            if !self.scope().code.last_is(Opcode::Return) {
                self.emit(Opcode::ConstNull, &[]);
                self.emit(Opcode::Return, &[]);
            }
            Ok(())
        })();
        let scope = self.leave_scope();
        result?;
        Ok(Arc::from(scope.code.build().into_boxed_slice()))
    }

    fn build_data_type(
        &mut self,
        sym: SymbolId,
        name: String,
        field_names: impl Iterator<Item = String>,
    ) -> CompileResult<Value> {
        let constant_id = self.reserved_constant_id(sym)?;
        let child = self.tables.symbol(sym).child_table;
        let mut fields = Vec::new();
        for field in field_names {
            // Field symbols must have been registered while parsing the
            // declaration body; annotations register them in the enclosing
            // table instead of a child table.
            let lookup_table = child.unwrap_or_else(|| self.current_table());
            if self.tables.resolve(lookup_table, &field).is_none() {
                return Err(CompileError::MissingFieldSymbol { data: name, field });
            }
            fields.push(field);
        }
        Ok(Value::DataType(Arc::new(DataType { symbol: sym, constant_id, name, fields })))
    }

    fn reserved_constant_id(&self, sym: SymbolId) -> CompileResult<u16> {
        self.tables
            .symbol(sym)
            .constant_id
            .ok_or_else(|| CompileError::MissingConstantId { name: self.tables.symbol(sym).name.clone() })
    }

    fn set_reserved_constant(&mut self, sym: SymbolId, value: Value) -> CompileResult<()> {
        let id = self.reserved_constant_id(sym)?;
        self.constants[usize::from(id)] = value;
        Ok(())
    }

    // === Statements ======================================================

    fn compile_block(&mut self, block: &Block) -> CompileResult<()> {
        for stmt in block {
            self.compile_stmt(stmt)?;
        }
        Ok(())
    }

    fn compile_stmt(&mut self, stmt: &Stmt) -> CompileResult<()> {
        match stmt {
            Stmt::Expr(stmt) => {
                self.compile_expr(&stmt.expr)?;
                self.emit(Opcode::Pop, &[]);
                Ok(())
            }
            Stmt::If(stmt) => self.compile_stmt_if(stmt),
            Stmt::Return(stmt) => {
                match &stmt.expr {
                    Some(expr) => self.compile_expr(expr)?,
                    None => {
                        self.emit(Opcode::ConstNull, &[]);
                    }
                }
                self.emit(Opcode::Return, &[]);
                Ok(())
            }
            Stmt::Decl(decl @ (Decl::Variable(_) | Decl::Func(_))) => {
                // The parser registered the declaration in the scope's
                // table; definition happens here, in statement order.
                let table = self.current_table();
                let name = &decl.name().value;
                let sym = self
                    .tables
                    .resolve(table, name)
                    .ok_or_else(|| CompileError::UndefinedIdentifier { name: name.clone() })?;
                self.define_symbol(sym)
            }
            Stmt::Decl(decl) => Err(CompileError::UnknownNode { node: decl.overview() }),
        }
    }

    /// Classic backpatched if/else-if/else chain in statement position.
    ///
    /// Without an else branch the trailing end-jump is dropped and the last
    /// `JumpFalse` falls through to the end of the construct.
    fn compile_stmt_if(&mut self, stmt: &StmtIf) -> CompileResult<()> {
        let mut jump_ends = Vec::with_capacity(1 + stmt.else_ifs.len());

        self.compile_expr(&stmt.condition)?;
        let mut jump_next = self.scope().code.emit_jump(Opcode::JumpFalse);

        self.compile_block(&stmt.then_block)?;
        jump_ends.push(self.scope().code.emit_jump(Opcode::Jump));

        for else_if in &stmt.else_ifs {
            let position = self.scope().code.current_position();
            self.scope().code.patch_operand(jump_next, position);

            self.compile_expr(&else_if.condition)?;
            jump_next = self.scope().code.emit_jump(Opcode::JumpFalse);

            self.compile_block(&else_if.block)?;
            jump_ends.push(self.scope().code.emit_jump(Opcode::Jump));
        }

        if let Some(else_block) = &stmt.else_block {
            let position = self.scope().code.current_position();
            self.scope().code.patch_operand(jump_next, position);
            self.compile_block(else_block)?;
        } else {
            let last_index = jump_ends.len() - 1;
            if self.scope().code.last_is(Opcode::Jump) {
                self.scope().code.remove_last();
            }
            jump_ends[last_index] = jump_next;
        }

        let end = self.scope().code.current_position();
        for position in jump_ends {
            self.scope().code.patch_operand(position, end);
        }
        Ok(())
    }

    /// The if expression mirrors the statement form, but every branch
    /// yields a value and the else branch is mandatory.
    fn compile_expr_if(&mut self, expr: &ExprIf) -> CompileResult<()> {
        let mut jump_ends = Vec::with_capacity(1 + expr.else_ifs.len());

        self.compile_expr(&expr.condition)?;
        let mut jump_next = self.scope().code.emit_jump(Opcode::JumpFalse);

        self.compile_expr(&expr.then)?;
        jump_ends.push(self.scope().code.emit_jump(Opcode::Jump));

        for else_if in &expr.else_ifs {
            let position = self.scope().code.current_position();
            self.scope().code.patch_operand(jump_next, position);

            self.compile_expr(&else_if.condition)?;
            jump_next = self.scope().code.emit_jump(Opcode::JumpFalse);

            self.compile_expr(&else_if.then)?;
            jump_ends.push(self.scope().code.emit_jump(Opcode::Jump));
        }

        let position = self.scope().code.current_position();
        self.scope().code.patch_operand(jump_next, position);
        self.compile_expr(&expr.else_expr)?;

        let end = self.scope().code.current_position();
        for position in jump_ends {
            self.scope().code.patch_operand(position, end);
        }
        Ok(())
    }

    // === Expressions =====================================================

    fn compile_expr(&mut self, expr: &Expr) -> CompileResult<()> {
        match expr {
            Expr::Bool(lit) => {
                self.emit(if lit.value { Opcode::ConstTrue } else { Opcode::ConstFalse }, &[]);
                Ok(())
            }
            Expr::Null { .. } => {
                self.emit(Opcode::ConstNull, &[]);
                Ok(())
            }
            Expr::Int(lit) => {
                let value = self.plugins.prelude().int(lit.value);
                let id = self.add_constant(value)?;
                self.emit(Opcode::Const, &[id]);
                Ok(())
            }
            Expr::Float(lit) => {
                let value = self.plugins.prelude().float(lit.value);
                let id = self.add_constant(value)?;
                self.emit(Opcode::Const, &[id]);
                Ok(())
            }
            Expr::Char(lit) => {
                let value = self.plugins.prelude().char(lit.value);
                let id = self.add_constant(value)?;
                self.emit(Opcode::Const, &[id]);
                Ok(())
            }
            Expr::String(lit) => {
                let value = self.plugins.prelude().string(lit.value.as_str());
                let id = self.add_constant(value)?;
                self.emit(Opcode::Const, &[id]);
                Ok(())
            }
            Expr::Array { elements, .. } => {
                for element in elements {
                    self.compile_expr(element)?;
                }
                let length = self.plugins.prelude().int(as_i64(elements.len()));
                let id = self.add_constant(length)?;
                self.emit(Opcode::Const, &[id]);
                self.emit(Opcode::Array, &[]);
                Ok(())
            }
            Expr::Dict { entries, .. } => {
                for entry in entries {
                    self.compile_expr(&entry.key)?;
                    self.compile_expr(&entry.value)?;
                }
                let length = self.plugins.prelude().int(as_i64(entries.len()));
                let id = self.add_constant(length)?;
                self.emit(Opcode::Const, &[id]);
                self.emit(Opcode::Dict, &[]);
                Ok(())
            }
            Expr::Identifier(ident) => self.compile_identifier(&ident.value),
            Expr::Member { target, property, .. } => {
                self.compile_expr(target)?;
                let name = self.plugins.prelude().string(property.value.as_str());
                let id = self.add_constant(name)?;
                self.emit(Opcode::GetField, &[id]);
                Ok(())
            }
            Expr::Index { target, index, .. } => {
                self.compile_expr(target)?;
                self.compile_expr(index)?;
                self.emit(Opcode::GetIndex, &[]);
                Ok(())
            }
            Expr::Invocation { callee, arguments } => {
                // Arguments compile left to right so the first argument
                // sits deepest on the stack when the callee runs.
                for argument in arguments {
                    self.compile_expr(argument)?;
                }
                self.compile_expr(callee)?;
                let argc = u16::try_from(arguments.len()).map_err(|_| CompileError::SlotOverflow { what: "arguments" })?;
                self.emit(Opcode::Call, &[argc]);
                Ok(())
            }
            Expr::Unary { op, expr } => {
                self.compile_expr(expr)?;
                match op.kind {
                    // All numbers are positive by default.
                    TokenKind::Plus => Ok(()),
                    TokenKind::Bang => {
                        self.emit(Opcode::Invert, &[]);
                        Ok(())
                    }
                    TokenKind::Minus => {
                        self.emit(Opcode::Negate, &[]);
                        Ok(())
                    }
                    _ => Err(CompileError::UnknownOperator { literal: op.literal.clone() }),
                }
            }
            Expr::Binary { op, left, right } => self.compile_binary(op.kind, &op.literal, left, right),
            Expr::If(expr_if) => self.compile_expr_if(expr_if),
            Expr::Func(implementation) => {
                // A function literal in expression position: compile it as
                // an anonymous constant and push it.
                let id = self.reserve_constant()?;
                let instructions = self.compile_function_body(implementation)?;
                let symbols = self.tables.len_of(implementation.table);
                let free = self.tables.table(implementation.table).free_symbols.len();
                let params = implementation.params.len();
                self.constants[usize::from(id)] = Value::Function(Arc::new(CompiledFunction {
                    instructions,
                    params,
                    symbol: None,
                    name: implementation.name.clone(),
                    frame_locals: params + (symbols - free),
                }));
                self.emit(Opcode::Const, &[id]);
                Ok(())
            }
        }
    }

    fn compile_binary(&mut self, kind: TokenKind, literal: &str, left: &Expr, right: &Expr) -> CompileResult<()> {
        self.compile_expr(left)?;

        match kind {
            TokenKind::And => {
                let jump_quick = self.scope().code.emit_jump(Opcode::JumpFalse);
                self.compile_expr(right)?;
                self.emit(Opcode::AssertType, &[PreludeType::Bool.type_id().0]);
                let jump_end = self.scope().code.emit_jump(Opcode::Jump);
                let position = self.emit(Opcode::ConstFalse, &[]);
                self.scope().code.patch_operand(jump_quick, position);
                let end = self.scope().code.current_position();
                self.scope().code.patch_operand(jump_end, end);
                Ok(())
            }
            TokenKind::Or => {
                let jump_quick = self.scope().code.emit_jump(Opcode::JumpTrue);
                self.compile_expr(right)?;
                self.emit(Opcode::AssertType, &[PreludeType::Bool.type_id().0]);
                let jump_end = self.scope().code.emit_jump(Opcode::Jump);
                let position = self.emit(Opcode::ConstTrue, &[]);
                self.scope().code.patch_operand(jump_quick, position);
                let end = self.scope().code.current_position();
                self.scope().code.patch_operand(jump_end, end);
                Ok(())
            }
            _ => {
                self.compile_expr(right)?;
                let opcode = match kind {
                    TokenKind::Plus => Opcode::Add,
                    TokenKind::Minus => Opcode::Sub,
                    TokenKind::Asterisk => Opcode::Mul,
                    TokenKind::Slash => Opcode::Div,
                    TokenKind::Percent => Opcode::Mod,
                    TokenKind::Eq => Opcode::Equal,
                    TokenKind::Neq => Opcode::NotEqual,
                    TokenKind::Gt => Opcode::GreaterThan,
                    TokenKind::Gte => Opcode::GreaterThanOrEqual,
                    TokenKind::Lt => Opcode::LessThan,
                    TokenKind::Lte => Opcode::LessThanOrEqual,
                    _ => return Err(CompileError::UnknownOperator { literal: literal.to_owned() }),
                };
                self.emit(opcode, &[]);
                Ok(())
            }
        }
    }

    /// Resolves an identifier to its original symbol and pushes its value:
    /// callables and types via their constant slot, variables via their
    /// local or global slot.
    fn compile_identifier(&mut self, name: &str) -> CompileResult<()> {
        enum Target {
            Constant(Option<u16>),
            Variable { local_id: Option<u16>, global_id: Option<u16> },
            Parameter(Option<u16>),
            Unknown,
        }
        let Some((original, in_current_scope)) = self.lookup_identifier(name) else {
            return Err(CompileError::UndefinedIdentifier { name: name.to_owned() });
        };
        let symbol = self.tables.symbol(original);
        let target = match symbol.decl.as_ref() {
            Some(
                Decl::Func(_)
                | Decl::Data(_)
                | Decl::Enum(_)
                | Decl::Annotation(_)
                | Decl::ExternFunc(_)
                | Decl::ExternType(_)
                | Decl::ExternValue(_),
            ) => Target::Constant(symbol.constant_id),
            Some(Decl::Variable(_)) => Target::Variable { local_id: symbol.local_id, global_id: symbol.global_id },
            Some(Decl::Parameter(_)) => Target::Parameter(symbol.local_id),
            _ => Target::Unknown,
        };

        match target {
            Target::Constant(constant_id) => {
                let Some(constant_id) = constant_id else {
                    return Err(CompileError::MissingConstantId { name: name.to_owned() });
                };
                self.emit(Opcode::Const, &[constant_id]);
                Ok(())
            }
            Target::Variable { local_id, global_id } => {
                if let Some(local_id) = local_id {
                    if !in_current_scope {
                        return Err(CompileError::UnsupportedCapture { name: name.to_owned() });
                    }
                    self.emit(Opcode::GetLocal, &[local_id]);
                    return Ok(());
                }
                if let Some(global_id) = global_id {
                    self.emit(Opcode::GetGlobal, &[global_id]);
                    return Ok(());
                }
                Err(CompileError::MissingSlot { name: name.to_owned() })
            }
            Target::Parameter(local_id) => {
                if !in_current_scope {
                    return Err(CompileError::UnsupportedCapture { name: name.to_owned() });
                }
                let Some(local_id) = local_id else {
                    return Err(CompileError::MissingSlot { name: name.to_owned() });
                };
                self.emit(Opcode::GetLocal, &[local_id]);
                Ok(())
            }
            Target::Unknown => Err(CompileError::UndefinedIdentifier { name: name.to_owned() }),
        }
    }

    /// Walks the scope chain for a declared symbol, skipping placeholders
    /// and following free-symbol back-pointers to their original. The flag
    /// reports whether the hit is a direct entry of the current scope's own
    /// table (locals are only addressable there).
    fn lookup_identifier(&self, name: &str) -> Option<(SymbolId, bool)> {
        let mut table = Some(self.current_table());
        let mut first = true;
        while let Some(current) = table {
            if let Some(found) = self.tables.resolve_shallow(current, name) {
                let original = self.tables.original(found);
                if self.tables.symbol(original).decl.is_some() {
                    return Some((original, first && original == found));
                }
            }
            table = self.tables.table(current).parent;
            first = false;
        }
        None
    }
}

fn as_i64(len: usize) -> i64 {
    i64::try_from(len).unwrap_or(i64::MAX)
}
