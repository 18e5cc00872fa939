//! Front‑to‑back pipeline over one persistent interpreter.
//!
//! A [`Session`] is what a driver talks to: `compile` turns source into a
//! resolved program (or the full list of static diagnostics), `execute` runs
//! it against the session's global scope. The REPL keeps one session alive so
//! definitions from earlier inputs stay visible.

use std::io::Write;

use log::{debug, info};
use thiserror::Error;

use crate::ast::Program;
use crate::error::{LoxError, RuntimeError};
use crate::interpreter::Interpreter;
use crate::parser::Parser;
use crate::resolver::{Locals, Resolver};
use crate::scanner::scan_tokens;

/// Exit code for scan, parse and resolve failures.
pub const EXIT_STATIC: i32 = 65;

/// Exit code for a failure while executing.
pub const EXIT_RUNTIME: i32 = 70;

/// A program that passed scanning, parsing and resolution.
#[derive(Debug)]
pub struct Compiled {
    pub program: Program,
    pub locals: Locals,
}

/// Why [`Session::run`] stopped.
#[derive(Debug, Error)]
pub enum RunError {
    /// Scan, parse or resolve diagnostics; nothing was executed.
    #[error("{} static error(s)", .0.len())]
    Static(Vec<LoxError>),

    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}

impl RunError {
    /// Conventional `sysexits` code for the failure.
    pub fn exit_code(&self) -> i32 {
        match self {
            RunError::Static(_) => EXIT_STATIC,
            RunError::Runtime(_) => EXIT_RUNTIME,
        }
    }
}

pub struct Session {
    interpreter: Interpreter,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            interpreter: Interpreter::new(),
        }
    }

    /// A session whose `print` output goes to `output`.
    pub fn with_output<W: Write + 'static>(output: W) -> Self {
        Self {
            interpreter: Interpreter::with_output(output),
        }
    }

    /// Scan, parse and resolve. Diagnostics from scanning and parsing are
    /// reported together; resolution only runs on a syntactically clean
    /// program.
    pub fn compile(&self, source: &str) -> Result<Compiled, Vec<LoxError>> {
        let (tokens, mut errors) = scan_tokens(source);
        let (program, parse_errors) = Parser::new(tokens).parse();
        errors.extend(parse_errors);

        if !errors.is_empty() {
            debug!("Compilation stopped with {} error(s)", errors.len());
            return Err(errors);
        }

        let locals: Locals = Resolver::new()
            .with_globals(self.interpreter.global_names())
            .resolve(&program)?;

        info!("Compiled {} top-level statement(s)", program.len());

        Ok(Compiled { program, locals })
    }

    pub fn execute(&mut self, compiled: &Compiled) -> Result<(), RuntimeError> {
        self.interpreter.resolve(compiled.locals.clone());
        self.interpreter.interpret(&compiled.program)
    }

    /// `compile` then `execute`.
    pub fn run(&mut self, source: &str) -> Result<(), RunError> {
        let compiled: Compiled = self.compile(source).map_err(RunError::Static)?;
        self.execute(&compiled)?;
        Ok(())
    }

    pub fn interpreter(&mut self) -> &mut Interpreter {
        &mut self.interpreter
    }
}
