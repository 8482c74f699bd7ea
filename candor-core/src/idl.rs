//! # IDL Parser
//!
//! Turns the textual description of an interface (a `.did` file) into a [`TypeTable`] and a
//! [`ServiceDescriptor`].
//!
//! Parsing runs in two passes:
//!
//! 1. **Syntax**: the text is tokenized and parsed into a small syntax tree. Names are
//!    kept as written, so declarations may appear in any order and refer to each other
//!    freely.
//! 2. **Resolution**: every named type is registered first (constructors get a table
//!    slot, aliases are followed to what they denote). Bodies are then lowered into
//!    descriptors, replacing names with table references, and the table is checked for
//!    recursion that does not pass through an `opt`, `vec`, `variant`, `func` or
//!    `service` (a type of infinite size).
//!
//! ```
//! use candor_core::idl;
//!
//! let (table, service) = idl::parse(r#"
//!     type List = opt record { head : nat; tail : List };
//!     service : { sum : (List) -> (nat) query }
//! "#).unwrap();
//!
//! assert!(table.resolve("List").is_some());
//! assert!(service.method("sum").unwrap().mode.is_query());
//! ```
mod lexer;
mod parser;
mod resolve;

use crate::{service::ServiceDescriptor, types::TypeTable};
use std::fmt;

/// A location in the IDL text, both 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Errors that can occur while parsing an interface description.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("Unterminated text literal starting at {0}")]
    UnterminatedText(Position),
    #[error("Unterminated block comment starting at {0}")]
    UnterminatedComment(Position),
    #[error("Invalid character '{ch}' at {at}")]
    InvalidCharacter { ch: char, at: Position },
    #[error("Invalid number '{text}' at {at}")]
    InvalidNumber { text: String, at: Position },
    #[error("Invalid escape sequence '{escape}' at {at}")]
    InvalidEscape { escape: String, at: Position },
    #[error("Text literal at {0} is not valid UTF-8")]
    InvalidUtf8(Position),
    #[error("Expected {expected} but found '{found}' at {at}")]
    Unexpected {
        expected: &'static str,
        found: String,
        at: Position,
    },
    #[error("Imports are not supported ({0})")]
    ImportUnsupported(Position),
    #[error("Unknown type '{name}' at {at}")]
    UnknownType { name: String, at: Position },
    #[error("Type '{0}' is defined more than once")]
    DuplicateType(String),
    #[error("Field '{label}' at {at} is declared twice or its id collides with another field")]
    DuplicateField { label: String, at: Position },
    #[error("Method '{name}' at {at} is declared more than once")]
    DuplicateMethod { name: String, at: Position },
    #[error("Type '{0}' has infinite size, its recursion must go through opt, vec or variant")]
    InfiniteType(String),
    #[error("A oneway function cannot return results ({0})")]
    OnewayWithResults(Position),
    #[error("Type '{name}' at {at} is not a function type")]
    NotAFunction { name: String, at: Position },
    #[error("Type '{name}' at {at} is not a service type")]
    NotAService { name: String, at: Position },
}

/// Parses an interface description.
///
/// # Returns
///
/// * `Ok((table, service))` - Every named and anonymous type, plus the service's methods.
///   An interface without a service clause yields a service with no methods.
/// * `Err(ParseError)` - On the first syntax or resolution error.
pub fn parse(text: &str) -> Result<(TypeTable, ServiceDescriptor), ParseError> {
    let tokens = lexer::tokenize(text)?;
    let program = parser::Parser::new(tokens).program()?;
    let (table, service) = resolve::resolve(program)?;

    tracing::debug!(
        types = table.names().count(),
        entries = table.len(),
        methods = service.methods.len(),
        "Parsed interface description"
    );
    Ok((table, service))
}
