/*!
# Rust Language Module

This Rust module provides lexical analysis and parsing of the two
calculator notations, bc and dc, into the bytecode of the `mach` module.

*/

pub type Column = std::ops::Range<usize>;
pub type LineNumber = Option<usize>;

#[macro_use]
mod error;
mod bc;
mod dc;
mod ident;
mod lex;
mod parse;
mod session;
mod token;

pub use error::Error;
pub use error::ErrorCode;
pub use ident::{Name, NAME_END};
pub use lex::{BcLexer, DcLexer, TokenSource};
pub use parse::{Mode, Posix};
pub use session::{Config, Notation, Session, Status};
pub use token::{Command, Operator, Token, Word};

#[cfg(test)]
#[path = "tests/dc_test.rs"]
mod dc_test;

#[cfg(test)]
#[path = "tests/bc_test.rs"]
mod bc_test;
