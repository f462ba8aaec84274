//! Lexer for the Zest scripting language.
//!
//! Built on the logos derive lexer. Unknown input never aborts lexing:
//! offending characters are reported as [`LexError`] values and skipped,
//! so downstream layers always receive a token stream.

use crate::token::{Span, Token, TokenKind};
use logos::Logos;
use thiserror::Error;

/// An error produced while lexing.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LexError {
    /// A character that does not start any token.
    #[error("unexpected character `{text}` at {line}:{column}")]
    UnexpectedCharacter {
        /// The offending text.
        text: String,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
    },
}

/// Logos-based token enum for lexing.
///
/// Converted to the public [`Token`] type after lexing.
#[derive(Logos, Debug, Clone, Copy, PartialEq)]
enum LogosToken {
    #[regex(r"[ \t\r\n]+", logos::skip)]
    Whitespace,

    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    #[regex(r"/\*", lex_block_comment)]
    BlockComment,

    // Keywords (must come before identifiers)
    #[token("import")]
    Import,
    #[token("class")]
    Class,
    #[token("implements")]
    Implements,
    #[token("function")]
    Function,
    #[token("expand")]
    Expand,
    #[token("constructor")]
    Constructor,
    #[token("operator")]
    Operator,
    #[token("var")]
    Var,
    #[token("val")]
    Val,
    #[token("static")]
    Static,
    #[token("global")]
    Global,
    #[token("if")]
    If,
    #[token("else")]
    Else,
    #[token("while")]
    While,
    #[token("for")]
    For,
    #[token("return")]
    Return,
    #[token("this")]
    This,
    #[token("as")]
    As,
    #[token("to")]
    To,
    #[token("in")]
    In,
    #[token("has")]
    Has,
    #[token("true")]
    True,
    #[token("false")]
    False,
    #[token("null")]
    Null,
    #[token("any")]
    Any,
    #[token("byte")]
    Byte,
    #[token("short")]
    Short,
    #[token("int")]
    Int,
    #[token("long")]
    Long,
    #[token("float")]
    Float,
    #[token("double")]
    Double,
    #[token("bool")]
    Bool,
    #[token("string")]
    StringKw,
    #[token("void")]
    Void,

    // Literals
    #[regex(r"[0-9]+[lL]")]
    LongLiteral,
    #[regex(r"[0-9]+\.[0-9]+[fF]")]
    FloatLiteral,
    #[regex(r"[0-9]+\.[0-9]+")]
    DoubleLiteral,
    #[regex(r"0[xX][0-9a-fA-F]+")]
    #[regex(r"[0-9]+")]
    IntLiteral,
    #[regex(r#""(\\.|[^"\\\n])*""#)]
    #[regex(r#"'(\\.|[^'\\\n])*'"#)]
    StringLiteral,

    #[regex(r"#[a-zA-Z_][a-zA-Z0-9_]*")]
    Annotation,

    #[regex(r"[a-zA-Z_][a-zA-Z0-9_]*")]
    Identifier,

    // Operators
    #[token("+=")]
    PlusAssign,
    #[token("-=")]
    MinusAssign,
    #[token("*=")]
    StarAssign,
    #[token("/=")]
    SlashAssign,
    #[token("%=")]
    PercentAssign,
    #[token("~=")]
    TildeAssign,
    #[token("==")]
    Equals,
    #[token("!=")]
    NotEquals,
    #[token("<=")]
    LessEquals,
    #[token(">=")]
    GreaterEquals,
    #[token("&&")]
    AndAnd,
    #[token("||")]
    OrOr,
    #[token("+")]
    Plus,
    #[token("-")]
    Minus,
    #[token("*")]
    Star,
    #[token("/")]
    Slash,
    #[token("%")]
    Percent,
    #[token("~")]
    Tilde,
    #[token("!")]
    Bang,
    #[token("=")]
    Assign,
    #[token("<")]
    Less,
    #[token(">")]
    Greater,
    #[token("&")]
    Amp,
    #[token("|")]
    Pipe,
    #[token("^")]
    Caret,

    // Punctuation
    #[token("?")]
    Question,
    #[token(":")]
    Colon,
    #[token(";")]
    Semicolon,
    #[token(",")]
    Comma,
    #[token("...")]
    DotDotDot,
    #[token("..")]
    DotDot,
    #[token(".")]
    Dot,
    #[token("$")]
    Dollar,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
}

fn lex_block_comment(lex: &mut logos::Lexer<LogosToken>) -> logos::Skip {
    let rest = lex.remainder();
    match rest.find("*/") {
        Some(pos) => lex.bump(pos + 2),
        None => lex.bump(rest.len()),
    }
    logos::Skip
}

impl LogosToken {
    fn to_kind(self) -> Option<TokenKind> {
        let kind = match self {
            LogosToken::Whitespace | LogosToken::LineComment | LogosToken::BlockComment => return None,
            LogosToken::Import => TokenKind::Import,
            LogosToken::Class => TokenKind::Class,
            LogosToken::Implements => TokenKind::Implements,
            LogosToken::Function => TokenKind::Function,
            LogosToken::Expand => TokenKind::Expand,
            LogosToken::Constructor => TokenKind::Constructor,
            LogosToken::Operator => TokenKind::Operator,
            LogosToken::Var => TokenKind::Var,
            LogosToken::Val => TokenKind::Val,
            LogosToken::Static => TokenKind::Static,
            LogosToken::Global => TokenKind::Global,
            LogosToken::If => TokenKind::If,
            LogosToken::Else => TokenKind::Else,
            LogosToken::While => TokenKind::While,
            LogosToken::For => TokenKind::For,
            LogosToken::Return => TokenKind::Return,
            LogosToken::This => TokenKind::This,
            LogosToken::As => TokenKind::As,
            LogosToken::To => TokenKind::To,
            LogosToken::In => TokenKind::In,
            LogosToken::Has => TokenKind::Has,
            LogosToken::True => TokenKind::True,
            LogosToken::False => TokenKind::False,
            LogosToken::Null => TokenKind::Null,
            LogosToken::Any => TokenKind::Any,
            LogosToken::Byte => TokenKind::Byte,
            LogosToken::Short => TokenKind::Short,
            LogosToken::Int => TokenKind::Int,
            LogosToken::Long => TokenKind::Long,
            LogosToken::Float => TokenKind::Float,
            LogosToken::Double => TokenKind::Double,
            LogosToken::Bool => TokenKind::Bool,
            LogosToken::StringKw => TokenKind::StringKw,
            LogosToken::Void => TokenKind::Void,
            LogosToken::IntLiteral => TokenKind::IntLiteral,
            LogosToken::LongLiteral => TokenKind::LongLiteral,
            LogosToken::FloatLiteral => TokenKind::FloatLiteral,
            LogosToken::DoubleLiteral => TokenKind::DoubleLiteral,
            LogosToken::StringLiteral => TokenKind::StringLiteral,
            LogosToken::Annotation => TokenKind::Annotation,
            LogosToken::Identifier => TokenKind::Identifier,
            LogosToken::PlusAssign => TokenKind::PlusAssign,
            LogosToken::MinusAssign => TokenKind::MinusAssign,
            LogosToken::StarAssign => TokenKind::StarAssign,
            LogosToken::SlashAssign => TokenKind::SlashAssign,
            LogosToken::PercentAssign => TokenKind::PercentAssign,
            LogosToken::TildeAssign => TokenKind::TildeAssign,
            LogosToken::Equals => TokenKind::Equals,
            LogosToken::NotEquals => TokenKind::NotEquals,
            LogosToken::LessEquals => TokenKind::LessEquals,
            LogosToken::GreaterEquals => TokenKind::GreaterEquals,
            LogosToken::AndAnd => TokenKind::AndAnd,
            LogosToken::OrOr => TokenKind::OrOr,
            LogosToken::Plus => TokenKind::Plus,
            LogosToken::Minus => TokenKind::Minus,
            LogosToken::Star => TokenKind::Star,
            LogosToken::Slash => TokenKind::Slash,
            LogosToken::Percent => TokenKind::Percent,
            LogosToken::Tilde => TokenKind::Tilde,
            LogosToken::Bang => TokenKind::Bang,
            LogosToken::Assign => TokenKind::Assign,
            LogosToken::Less => TokenKind::Less,
            LogosToken::Greater => TokenKind::Greater,
            LogosToken::Amp => TokenKind::Amp,
            LogosToken::Pipe => TokenKind::Pipe,
            LogosToken::Caret => TokenKind::Caret,
            LogosToken::Question => TokenKind::Question,
            LogosToken::Colon => TokenKind::Colon,
            LogosToken::Semicolon => TokenKind::Semicolon,
            LogosToken::Comma => TokenKind::Comma,
            LogosToken::DotDotDot => TokenKind::DotDotDot,
            LogosToken::DotDot => TokenKind::DotDot,
            LogosToken::Dot => TokenKind::Dot,
            LogosToken::Dollar => TokenKind::Dollar,
            LogosToken::LParen => TokenKind::LParen,
            LogosToken::RParen => TokenKind::RParen,
            LogosToken::LBracket => TokenKind::LBracket,
            LogosToken::RBracket => TokenKind::RBracket,
            LogosToken::LBrace => TokenKind::LBrace,
            LogosToken::RBrace => TokenKind::RBrace,
        };
        Some(kind)
    }
}

/// The Zest lexer.
pub struct Lexer<'a> {
    source: &'a str,
    line_starts: Vec<usize>,
}

impl<'a> Lexer<'a> {
    /// Create a lexer over `source`.
    pub fn new(source: &'a str) -> Self {
        let mut line_starts = vec![0];
        for (i, b) in source.bytes().enumerate() {
            if b == b'\n' {
                line_starts.push(i + 1);
            }
        }
        Self { source, line_starts }
    }

    /// Tokenize the whole source.
    ///
    /// Always returns the tokens that could be recognized; characters that
    /// start no token are collected as errors and skipped.
    pub fn tokenize(&self) -> (Vec<Token>, Vec<LexError>) {
        let mut tokens = Vec::new();
        let mut errors = Vec::new();
        let mut lexer = LogosToken::lexer(self.source);
        while let Some(result) = lexer.next() {
            let range = lexer.span();
            match result {
                Ok(token) => {
                    if let Some(kind) = token.to_kind() {
                        let span = self.span_for(range.start, range.end);
                        tokens.push(Token::new(kind, lexer.slice(), span));
                    }
                }
                Err(()) => {
                    let (line, column) = self.line_col(range.start);
                    errors.push(LexError::UnexpectedCharacter {
                        text: lexer.slice().to_string(),
                        line,
                        column,
                    });
                }
            }
        }
        (tokens, errors)
    }

    /// 1-based line/column of a byte offset.
    pub fn line_col(&self, offset: usize) -> (u32, u32) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(i) => i,
            Err(i) => i - 1,
        };
        let column = offset - self.line_starts[line];
        (line as u32 + 1, column as u32 + 1)
    }

    fn span_for(&self, start: usize, end: usize) -> Span {
        let (line, column) = self.line_col(start);
        let (last_line, last_column) = self.line_col(end);
        Span::new(start, end, line, column, last_line, last_column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        let (tokens, errors) = Lexer::new(source).tokenize();
        assert!(errors.is_empty(), "unexpected lex errors: {errors:?}");
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn keywords_and_identifiers() {
        assert_eq!(
            kinds("var x as int;"),
            vec![
                TokenKind::Var,
                TokenKind::Identifier,
                TokenKind::As,
                TokenKind::Int,
                TokenKind::Semicolon
            ]
        );
    }

    #[test]
    fn numeric_literals() {
        assert_eq!(
            kinds("1 2L 3.5 4.5f 0xFF"),
            vec![
                TokenKind::IntLiteral,
                TokenKind::LongLiteral,
                TokenKind::DoubleLiteral,
                TokenKind::FloatLiteral,
                TokenKind::IntLiteral
            ]
        );
    }

    #[test]
    fn range_is_not_a_double() {
        assert_eq!(
            kinds("1 .. 5"),
            vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral]
        );
        assert_eq!(
            kinds("1..5"),
            vec![TokenKind::IntLiteral, TokenKind::DotDot, TokenKind::IntLiteral]
        );
    }

    #[test]
    fn strings_both_quotes() {
        assert_eq!(
            kinds(r#""hello" 'world'"#),
            vec![TokenKind::StringLiteral, TokenKind::StringLiteral]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            kinds("1 // line\n/* block\n comment */ 2"),
            vec![TokenKind::IntLiteral, TokenKind::IntLiteral]
        );
    }

    #[test]
    fn annotations() {
        let (tokens, _) = Lexer::new("#foreach\nfunction iter() as [int];").tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Annotation);
        assert_eq!(tokens[0].text, "#foreach");
    }

    #[test]
    fn spans_track_lines() {
        let (tokens, _) = Lexer::new("a\n  b").tokenize();
        assert_eq!((tokens[0].span.line, tokens[0].span.column), (1, 1));
        assert_eq!((tokens[1].span.line, tokens[1].span.column), (2, 3));
    }

    #[test]
    fn unexpected_character_is_reported_and_skipped() {
        let (tokens, errors) = Lexer::new("a @ b").tokenize();
        assert_eq!(tokens.len(), 2);
        assert_eq!(errors.len(), 1);
    }
}
