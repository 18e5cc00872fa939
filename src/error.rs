//! Centralised error hierarchy for the **Lox interpreter**.
//!
//! Two tiers exist. *Static* diagnostics ([`LoxError::Lex`],
//! [`LoxError::Parse`], [`LoxError::Resolve`]) are accumulated per pass and
//! collectively prevent execution. *Runtime* failures ([`RuntimeError`]) abort
//! the current `interpret` call but leave the host process alive.
//!
//! Nothing here prints; drivers decide how diagnostics are shown.

use std::io;
use thiserror::Error;

use log::info;

use crate::token::{Token, TokenType};

/// Canonical error type used throughout the interpreter.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Lexical (scanner) error with source line information.
    #[error("[line {line}] Error: {message}")]
    Lex {
        /// Human‑readable description.
        message: String,

        /// 1‑based line where the error occurred.
        line: usize,
    },

    /// Syntactic (parser) error.
    #[error("[line {line}] Error{location}: {message}")]
    Parse {
        message: String,
        line: usize,

        /// `" at end"` or `" at '<lexeme>'"`.
        location: String,
    },

    /// Static‑analysis or resolution failure (e.g. early‑binding errors).
    #[error("[line {line}] Error{location}: {message}")]
    Resolve {
        message: String,
        line: usize,
        location: String,
    },

    /// UTF‑8 decoding failure when ingesting external text.
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

/// Context string pointing at the offending token.
fn location_of(token: &Token) -> String {
    if token.token_type == TokenType::EOF {
        " at end".to_string()
    } else {
        format!(" at '{}'", token.lexeme)
    }
}

impl LoxError {
    /// Helper constructor for the **scanner**.
    pub fn lex<S: Into<String>>(line: usize, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Lex error: line={}, msg={}", line, message);

        LoxError::Lex { message, line }
    }

    /// Helper constructor for the **parser**.
    pub fn parse<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Parse error: line={}, msg={}", token.line, message);

        LoxError::Parse {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Helper constructor for the **resolver**.
    pub fn resolve<S: Into<String>>(token: &Token, msg: S) -> Self {
        let message: String = msg.into();

        info!("Creating Resolve error: line={}, msg={}", token.line, message);

        LoxError::Resolve {
            message,
            line: token.line,
            location: location_of(token),
        }
    }

    /// Source line of the diagnostic, when it has one.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Resolve { line, .. } => Some(*line),
            LoxError::Utf8(_) => None,
        }
    }

    /// The bare message without line or location decoration.
    pub fn message(&self) -> String {
        match self {
            LoxError::Lex { message, .. }
            | LoxError::Parse { message, .. }
            | LoxError::Resolve { message, .. } => message.clone(),
            LoxError::Utf8(e) => e.to_string(),
        }
    }
}

/// Failures raised while executing a program.
///
/// Every variant that originates from user code carries the line of the
/// offending token. Rendering follows `<message>\n[line N]`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RuntimeError {
    /// Operand(s) of the wrong type for an operator.
    #[error("{message}\n[line {line}]")]
    Type { message: String, line: usize },

    #[error("Expected {expected} arguments but got {got}.\n[line {line}]")]
    Arity {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Divide by zero is not valid.\n[line {line}]")]
    DivideByZero { line: usize },

    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    #[error("Can only call functions and classes.\n[line {line}]")]
    NotCallable { line: usize },

    #[error("Only instances have properties.\n[line {line}]")]
    NotAnObject { line: usize },

    #[error("Only instances have fields.\n[line {line}]")]
    NoFields { line: usize },

    #[error("Superclass must be a class.\n[line {line}]")]
    SuperclassNotClass { line: usize },

    /// Call nesting went past the interpreter's depth limit.
    #[error("Stack overflow.\n[line {line}]")]
    StackOverflow { line: usize },

    /// Failure reported by a native function.
    #[error("{message}\n[line {line}]")]
    Native { message: String, line: usize },

    /// Writing `print` output failed.
    #[error("Failed to write output: {0}")]
    Output(#[from] io::Error),
}

impl RuntimeError {
    pub fn type_error<S: Into<String>>(token: &Token, msg: S) -> Self {
        RuntimeError::Type {
            message: msg.into(),
            line: token.line,
        }
    }

    pub fn line(&self) -> Option<usize> {
        match self {
            RuntimeError::Type { line, .. }
            | RuntimeError::Arity { line, .. }
            | RuntimeError::DivideByZero { line }
            | RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::NotCallable { line }
            | RuntimeError::NotAnObject { line }
            | RuntimeError::NoFields { line }
            | RuntimeError::SuperclassNotClass { line }
            | RuntimeError::StackOverflow { line }
            | RuntimeError::Native { line, .. } => Some(*line),
            RuntimeError::Output(_) => None,
        }
    }
}

/// Crate‑wide `Result` alias.
pub type Result<T> = std::result::Result<T, LoxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_utf8_has_no_line() {
        let err = match String::from_utf8(vec![b'a', 0xff]) {
            Ok(s) => panic!("decoded {:?}", s),
            Err(e) => LoxError::from(e),
        };

        assert_eq!(err.line(), None);
        assert!(err.message().contains("invalid utf-8"));
    }

    #[test]
    fn stack_overflow_renders_like_other_runtime_errors() {
        let err = RuntimeError::StackOverflow { line: 4 };

        assert_eq!(err.to_string(), "Stack overflow.\n[line 4]");
        assert_eq!(err.line(), Some(4));
    }
}
