//! lyra-lex - Lexical analysis.
//!
//! Transforms source text into a stream of [`Token`]s. The scanner is
//! byte-oriented (source is treated as ASCII for classification), tracks
//! line numbers for diagnostics, and never fails: unrecognized input is
//! emitted as [`TokenKind::Error`] tokens which the parser reports as
//! syntax errors when it reaches them. The stream always ends with exactly
//! one [`TokenKind::Eof`] token.

pub mod cursor;
pub mod scanner;
pub mod token;

pub use cursor::Cursor;
pub use scanner::Scanner;
pub use token::{Token, TokenKind};
