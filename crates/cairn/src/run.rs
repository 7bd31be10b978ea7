//! Convenience front door: source text in, final value out.
//!
//! [`Runner`] wires the pipeline end to end — lex, parse, compile, run —
//! with the errors of each stage surfaced through [`RunnerError`]. Embedders
//! that need the intermediate artefacts (token streams, the tree, bytecode)
//! use the stage types directly.

use std::{fmt, io};

use crate::{
    ast::SymbolTables,
    bytecode::{Bytecode, CompileError, Compiler},
    lexer::Lexer,
    parser::{ParseError, Parser, symbol_errors},
    source::{LogicalUri, StaticSource},
    value::Value,
    vm::{RunError, Vm},
};

/// Failure of any pipeline stage.
#[derive(Debug)]
pub enum RunnerError {
    Io(io::Error),
    /// One or more parse or symbol errors; the parse never aborts, so all
    /// of them are reported together.
    Parse(Vec<ParseError>),
    Compile(CompileError),
    Runtime(RunError),
}

impl fmt::Display for RunnerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(err) => write!(f, "io error: {err}"),
            Self::Parse(errors) => {
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 {
                        writeln!(f)?;
                    }
                    write!(f, "{err}")?;
                }
                Ok(())
            }
            Self::Compile(err) => write!(f, "compile error: {err}"),
            Self::Runtime(err) => write!(f, "runtime error: {err}"),
        }
    }
}

impl std::error::Error for RunnerError {}

/// Runs one source file front to back.
pub struct Runner {
    uri: LogicalUri,
    code: String,
}

impl Runner {
    #[must_use]
    pub fn new(uri: impl Into<LogicalUri>, code: impl Into<String>) -> Self {
        Self { uri: uri.into(), code: code.into() }
    }

    #[must_use]
    pub fn code(&self) -> &str {
        &self.code
    }

    /// Renders every parse error of `err` against this runner's source.
    #[must_use]
    pub fn render_errors(&self, errors: &[ParseError]) -> String {
        errors.iter().map(|err| err.render(&self.code)).collect()
    }

    /// Parses and compiles, returning the bytecode artefact.
    pub fn compile(&self) -> Result<Bytecode, RunnerError> {
        let source = StaticSource::new(self.uri.clone(), self.code.as_bytes());
        let lexer = Lexer::new(&source).map_err(RunnerError::Io)?;

        let mut tables = SymbolTables::new();
        let parser = Parser::new(lexer, &mut tables, None, self.uri.as_str());
        let (file, mut errors) = parser.parse_source_file();
        errors.extend(symbol_errors(&tables, file.table));
        if !errors.is_empty() {
            return Err(RunnerError::Parse(errors));
        }

        let mut compiler = Compiler::new(&mut tables);
        compiler.compile_source_file(&file).map_err(RunnerError::Compile)?;
        Ok(compiler.bytecode())
    }

    /// Compiles and executes, returning the value of the file's final
    /// expression statement.
    pub fn run(&self) -> Result<Value, RunnerError> {
        let bytecode = self.compile()?;
        let mut vm = Vm::new(bytecode);
        vm.run().map_err(RunnerError::Runtime)?;
        Ok(vm.last_popped().clone())
    }
}
