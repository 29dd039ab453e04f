//! Lexical analysis module for the compiler.
//!
//! This module contains the lexer (tokenizer) that converts Tiger source
//! into a stream of tokens for parsing. It handles:
//!
//! - Tokenization of source code using anchored regex patterns
//! - Recognition of keywords, identifiers, literals, and operators
//! - Token position tracking for error reporting
//! - Nested `/* */` comments and whitespace

pub mod lexer;
pub mod tokens;

#[cfg(test)]
mod tests;
