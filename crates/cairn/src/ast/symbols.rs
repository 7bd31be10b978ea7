//! Arena-backed lexical symbol tables.
//!
//! The table graph has up-pointers (child table → parent table) and
//! down-pointers (symbol → child table), so both tables and symbols live in
//! a central [`SymbolTables`] arena and reference each other through the
//! integer handles [`TableId`] and [`SymbolId`]. Ownership flows from the
//! root module table down; parent handles are non-owning.
//!
//! Lookups are eager and side-effecting: every use of a name records a
//! [`Usage`] on its symbol, unresolved names create placeholder symbols to
//! be populated by a later declaration, and names resolved through an outer
//! scope materialise a free symbol in the inner scope.

use std::fmt;

use indexmap::IndexMap;

use crate::{ast::Decl, token::Token};

/// Handle of a table in the [`SymbolTables`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TableId(u32);

/// Handle of a symbol in the [`SymbolTables`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolId(u32);

/// Where a symbol's storage lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolScope {
    Global,
    Local,
    /// A stand-in materialised in an inner scope for a name declared in an
    /// outer scope; `Symbol::parent` points at the captured symbol.
    Free,
}

/// An error accumulated on a symbol or one of its usages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SymbolError {
    Redeclaration { name: String },
    NotAnAnnotation { name: String },
}

impl fmt::Display for SymbolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Redeclaration { name } => write!(f, "invalid redeclaration of {name:?}"),
            Self::NotAnAnnotation { name } => write!(f, "{name:?} is not an annotation"),
        }
    }
}

/// One recorded use of a symbol: the using node's token plus any errors
/// attached to this particular usage.
#[derive(Debug, Clone)]
pub struct Usage {
    pub token: Token,
    pub errs: Vec<SymbolError>,
}

/// A named table entry: the declaration it stands for (if any), the slot ids
/// assigned during compilation, and the accumulated errors and usages.
#[derive(Debug)]
pub struct Symbol {
    pub name: String,
    /// The declaring node; `None` for placeholders created by lookups and
    /// for materialised free symbols.
    pub decl: Option<Decl>,
    /// Insertion order within the owning table.
    pub index: usize,
    /// Constant pool slot, reserved for functions, types and annotations.
    pub constant_id: Option<u16>,
    /// Global slot, reserved for top-level variables.
    pub global_id: Option<u16>,
    /// Local slot within the owning compilation scope.
    pub local_id: Option<u16>,
    pub scope: SymbolScope,
    /// For free symbols: the symbol in the outer scope this one captures.
    pub parent: Option<SymbolId>,
    /// The scope this symbol opens (functions, data, extern with members).
    pub child_table: Option<TableId>,
    pub errs: Vec<SymbolError>,
    pub usages: Vec<Usage>,
}

/// One lexical scope: an ordered name → symbol mapping.
#[derive(Debug)]
pub struct SymbolTable {
    pub parent: Option<TableId>,
    /// Token of the node that opened this scope, if any.
    pub opened_by: Option<Token>,
    symbols: IndexMap<String, SymbolId>,
    /// Original-scope symbols captured by this scope.
    pub free_symbols: Vec<SymbolId>,
    default_scope: SymbolScope,
    anonymous_count: usize,
}

/// The arena holding every table and symbol of a module graph.
#[derive(Debug, Default)]
pub struct SymbolTables {
    tables: Vec<SymbolTable>,
    symbols: Vec<Symbol>,
}

impl SymbolTables {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a table. `default_scope` is the scope tag given to symbols
    /// inserted directly into it: `Global` for module/file tables, `Local`
    /// for function and type member tables.
    pub fn push_table(&mut self, parent: Option<TableId>, opened_by: Option<Token>, default_scope: SymbolScope) -> TableId {
        let id = TableId(u32::try_from(self.tables.len()).expect("table arena overflow"));
        self.tables.push(SymbolTable {
            parent,
            opened_by,
            symbols: IndexMap::new(),
            free_symbols: Vec::new(),
            default_scope,
            anonymous_count: 0,
        });
        id
    }

    #[must_use]
    pub fn table(&self, id: TableId) -> &SymbolTable {
        &self.tables[id.0 as usize]
    }

    fn table_mut(&mut self, id: TableId) -> &mut SymbolTable {
        &mut self.tables[id.0 as usize]
    }

    #[must_use]
    pub fn symbol(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0 as usize]
    }

    pub fn symbol_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0 as usize]
    }

    /// Symbols of a table in insertion order.
    #[must_use]
    pub fn symbols_of(&self, table: TableId) -> Vec<SymbolId> {
        self.table(table).symbols.values().copied().collect()
    }

    /// Number of symbols in a table.
    #[must_use]
    pub fn len_of(&self, table: TableId) -> usize {
        self.table(table).symbols.len()
    }

    /// Inserts a declaration. If the name already exists with a real
    /// declaration, the existing symbol is kept, a redeclaration error and a
    /// usage are recorded on it. If the name exists as a placeholder, the
    /// placeholder is populated.
    pub fn insert(&mut self, table: TableId, decl: Decl) -> SymbolId {
        let name = decl.name().value.clone();
        if let Some(&existing) = self.table(table).symbols.get(&name) {
            let token = decl.token().clone();
            let sym = self.symbol_mut(existing);
            if sym.decl.is_none() {
                sym.decl = Some(decl);
            } else {
                sym.errs.push(SymbolError::Redeclaration { name });
                sym.usages.push(Usage { token, errs: Vec::new() });
            }
            return existing;
        }

        let scope = self.table(table).default_scope;
        let index = self.table(table).symbols.len();
        let id = self.push_symbol(Symbol {
            name: name.clone(),
            decl: Some(decl),
            index,
            constant_id: None,
            global_id: None,
            local_id: None,
            scope,
            parent: None,
            child_table: None,
            errs: Vec::new(),
            usages: Vec::new(),
        });
        self.table_mut(table).symbols.insert(name, id);
        id
    }

    /// Looks a name up from `table`, recording `usage` on the result.
    ///
    /// Resolution order: the current table, then the ancestor chain. A hit
    /// in an ancestor materialises a free symbol in the current table whose
    /// `parent` points back at the captured symbol, and registers the
    /// capture in the table's `free_symbols`. A miss inserts a placeholder
    /// to be populated by a later declaration.
    pub fn lookup(&mut self, table: TableId, name: &str, usage: Token) -> SymbolId {
        if let Some(&found) = self.table(table).symbols.get(name) {
            self.symbol_mut(found).usages.push(Usage { token: usage, errs: Vec::new() });
            return found;
        }

        let mut ancestor = self.table(table).parent;
        while let Some(current) = ancestor {
            if let Some(&found) = self.table(current).symbols.get(name) {
                let index = self.table(table).symbols.len();
                let free = self.push_symbol(Symbol {
                    name: name.to_owned(),
                    decl: None,
                    index,
                    constant_id: None,
                    global_id: None,
                    local_id: None,
                    scope: SymbolScope::Free,
                    parent: Some(found),
                    child_table: None,
                    errs: Vec::new(),
                    usages: vec![Usage { token: usage, errs: Vec::new() }],
                });
                let tbl = self.table_mut(table);
                tbl.symbols.insert(name.to_owned(), free);
                tbl.free_symbols.push(found);
                return free;
            }
            ancestor = self.table(current).parent;
        }

        let scope = self.table(table).default_scope;
        let index = self.table(table).symbols.len();
        let placeholder = self.push_symbol(Symbol {
            name: name.to_owned(),
            decl: None,
            index,
            constant_id: None,
            global_id: None,
            local_id: None,
            scope,
            parent: None,
            child_table: None,
            errs: Vec::new(),
            usages: vec![Usage { token: usage, errs: Vec::new() }],
        });
        self.table_mut(table).symbols.insert(name.to_owned(), placeholder);
        placeholder
    }

    /// Looks up an annotation reference and requires the target to be an
    /// annotation declaration; a mismatch is recorded on the usage.
    pub fn lookup_annotation(&mut self, table: TableId, name: &str, usage: Token) -> SymbolId {
        let id = self.lookup(table, name, usage);
        let target = self.original(id);
        let is_annotation = match &self.symbol(target).decl {
            Some(Decl::Annotation(_)) | None => true,
            Some(_) => false,
        };
        if !is_annotation {
            let err = SymbolError::NotAnAnnotation { name: name.to_owned() };
            if let Some(last) = self.symbol_mut(id).usages.last_mut() {
                last.errs.push(err);
            }
        }
        id
    }

    /// Resolves a name in one table only, without side effects.
    #[must_use]
    pub fn resolve_shallow(&self, table: TableId, name: &str) -> Option<SymbolId> {
        self.table(table).symbols.get(name).copied()
    }

    /// Resolves a name without recording a usage or materialising anything.
    #[must_use]
    pub fn resolve(&self, table: TableId, name: &str) -> Option<SymbolId> {
        let mut current = Some(table);
        while let Some(tbl) = current {
            if let Some(&found) = self.table(tbl).symbols.get(name) {
                return Some(found);
            }
            current = self.table(tbl).parent;
        }
        None
    }

    /// Follows the free-symbol chain back to the declaring symbol.
    #[must_use]
    pub fn original(&self, id: SymbolId) -> SymbolId {
        let mut current = id;
        while let Some(parent) = self.symbol(current).parent {
            current = parent;
        }
        current
    }

    /// Next `func#N` name for an anonymous function in this table.
    pub fn next_anonymous_function_name(&mut self, table: TableId) -> String {
        let tbl = self.table_mut(table);
        tbl.anonymous_count += 1;
        format!("func#{}", tbl.anonymous_count)
    }

    fn push_symbol(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(u32::try_from(self.symbols.len()).expect("symbol arena overflow"));
        self.symbols.push(symbol);
        id
    }

    /// Walks a table tree collecting every symbol and usage error as
    /// `(token, summary, details)` triples for rendering.
    #[must_use]
    pub fn collect_errors(&self, root: TableId) -> Vec<(Token, String, String)> {
        let mut out = Vec::new();
        self.collect_errors_into(root, &mut out);
        out
    }

    fn collect_errors_into(&self, table: TableId, out: &mut Vec<(Token, String, String)>) {
        for id in self.table(table).symbols.values() {
            let sym = self.symbol(*id);
            let decl_token = sym
                .decl
                .as_ref()
                .map(|d| d.token().clone())
                .or_else(|| self.table(table).opened_by.clone());
            for err in &sym.errs {
                if let Some(token) = &decl_token {
                    out.push((token.clone(), "declaration error".to_owned(), err.to_string()));
                }
            }
            for usage in &sym.usages {
                for err in &usage.errs {
                    out.push((usage.token.clone(), "usage error".to_owned(), err.to_string()));
                }
            }
            if let Some(child) = sym.child_table {
                self.collect_errors_into(child, out);
            }
        }
    }
}
