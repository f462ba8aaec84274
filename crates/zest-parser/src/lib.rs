//! Zest Language Parser
//!
//! Lexer and error-tolerant parser for the Zest scripting language.
//!
//! Zest is a small, dynamically-flavored scripting language embedded in a
//! larger host application. Sources are parsed into a homogeneous concrete
//! syntax tree ([`cst::SyntaxTree`]) whose nodes carry a stable identity,
//! a kind tag, parent/child links and precise source spans, so that
//! semantic layers can annotate nodes without owning them.
//!
//! The parser never fails: malformed input produces a tree covering
//! whatever could be recognized plus a list of [`parser::ParseError`]
//! values describing what could not.

#![warn(missing_docs)]

pub mod token;
pub mod lexer;
pub mod cst;
pub mod parser;

pub use token::{Span, Token, TokenKind};
pub use lexer::{LexError, Lexer};
pub use cst::{NodeId, NodeKind, SyntaxTree};
pub use parser::{ParseError, Parser};
