//! Driver parsing every source of a resolved module into one
//! [`ContextModule`] with a shared symbol table.

use std::io;

use crate::{
    ast::{ContextModule, SymbolTables},
    lexer::Lexer,
    parser::{ParseError, Parser, symbol_errors},
    source::ResolvedModule,
};

/// Parses all sources of a module; file tables are parented to the module
/// table so cross-file names resolve.
pub struct ModuleParser {
    errors: Vec<ParseError>,
}

impl ModuleParser {
    #[must_use]
    pub fn new() -> Self {
        Self { errors: Vec::new() }
    }

    /// Lexes and parses every source, accumulating parse errors across
    /// files. I/O failures reading a source abort the parse.
    pub fn parse(&mut self, tables: &mut SymbolTables, module: &dyn ResolvedModule) -> io::Result<ContextModule> {
        let mut context = ContextModule::new(tables, module.uri().clone());

        for src in module.sources()? {
            let lexer = Lexer::new(src)?;
            let parser = Parser::new(lexer, tables, Some(context.table), src.uri().as_str());
            let (file, errors) = parser.parse_source_file();
            self.errors.extend(errors);
            context.add_source_file(file);
        }
        Ok(context)
    }

    /// Parse errors accumulated across all files so far.
    #[must_use]
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// Symbol and usage errors for a parsed module's table tree.
    #[must_use]
    pub fn symbol_errors(&self, tables: &SymbolTables, context: &ContextModule) -> Vec<ParseError> {
        symbol_errors(tables, context.table)
    }
}

impl Default for ModuleParser {
    fn default() -> Self {
        Self::new()
    }
}
