//! Compiler and stack virtual machine for the cairn language.
//!
//! cairn is a small statically-scoped, expression-oriented language with
//! user-defined data types, enums, annotations, first-class functions and
//! modules. This crate contains the full front-to-back pipeline for a
//! source file:
//!
//! 1. [`lexer`] — byte stream → tokens with attached decorative trivia
//! 2. [`parser`] — tokens → syntax tree plus eagerly-populated symbol tables
//! 3. [`bytecode`] — tree → compact instructions, constants and global
//!    initialisers
//! 4. [`vm`] — executes instructions on a fixed-size value and frame stack,
//!    with thread-safe lazily-initialised globals
//!
//! Module discovery, package management and the CLI live outside this
//! crate; a module here is an opaque set of sources addressed by logical
//! URI (see [`source`]). The quickest way in is [`Runner`]:
//!
//! ```
//! use cairn::Runner;
//!
//! let runner = Runner::new("testing:///demo.cairn", "1 + 2");
//! let value = runner.run().unwrap();
//! assert_eq!(value.inspect(), "3");
//! ```

pub mod ast;
pub mod bytecode;
pub mod diagnostics;
pub mod lexer;
pub mod parser;
mod run;
pub mod runtime;
pub mod source;
pub mod token;
pub mod tracer;
pub mod value;
pub mod vm;

pub use crate::{
    bytecode::{Bytecode, CompileError, Compiler, Opcode},
    lexer::Lexer,
    parser::{ModuleParser, ParseError, Parser},
    run::{Runner, RunnerError},
    source::{LogicalUri, ResolvedModule, Source, StaticModule, StaticSource},
    token::{Token, TokenKind},
    tracer::{NoopTracer, RecordingTracer, VmTracer},
    value::{PreludeType, TypeId, Value},
    vm::{RunError, TaskId, Vm},
};
