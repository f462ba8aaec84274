//! Error-tolerant recursive-descent parser for Zest.
//!
//! The parser always produces a [`SyntaxTree`]: unparsable regions become
//! `Error` nodes, diagnostics are collected as [`ParseError`] values, and
//! parsing resynchronizes at statement boundaries. This matters because
//! the semantic model is queried while files are being edited.

use crate::cst::{NodeId, NodeKind, SyntaxTree, TreeBuilder};
use crate::lexer::{LexError, Lexer};
use crate::token::{Span, Token, TokenKind};
use thiserror::Error;

/// A parse diagnostic.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ParseError {
    /// The parser found a token it could not use here.
    #[error("expected {expected}, found `{found}` at {line}:{column}")]
    UnexpectedToken {
        /// What the parser was looking for.
        expected: String,
        /// The text of the offending token.
        found: String,
        /// 1-based line.
        line: u32,
        /// 1-based column.
        column: u32,
    },
    /// The source ended while a construct was still open.
    #[error("unexpected end of file, expected {expected}")]
    UnexpectedEof {
        /// What the parser was looking for.
        expected: String,
    },
    /// A lexer diagnostic carried through.
    #[error(transparent)]
    Lex(#[from] LexError),
}

/// The Zest parser.
pub struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    builder: TreeBuilder,
    errors: Vec<ParseError>,
    eof_span: Span,
}

impl Parser {
    /// Parse `source` into a syntax tree plus diagnostics.
    pub fn parse(source: &str) -> (SyntaxTree, Vec<ParseError>) {
        let (tokens, lex_errors) = Lexer::new(source).tokenize();
        let eof_span = tokens.last().map_or(Span::new(0, 0, 1, 1, 1, 1), |t| {
            Span::new(
                t.span.end,
                t.span.end,
                t.span.last_line,
                t.span.last_column,
                t.span.last_line,
                t.span.last_column,
            )
        });
        let mut parser = Parser {
            tokens,
            pos: 0,
            builder: TreeBuilder::new(),
            errors: lex_errors.into_iter().map(ParseError::from).collect(),
            eof_span,
        };
        let root = parser.parse_source_unit();
        (parser.builder.finish(root), parser.errors)
    }

    // ------------------------------------------------------------------
    // Token helpers
    // ------------------------------------------------------------------

    fn at_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    fn current(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn current_kind(&self) -> Option<TokenKind> {
        self.current().map(|t| t.kind)
    }

    fn peek_kind(&self, offset: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + offset).map(|t| t.kind)
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.current_kind() == Some(kind)
    }

    fn bump(&mut self) -> Option<Token> {
        let token = self.tokens.get(self.pos).cloned();
        if token.is_some() {
            self.pos += 1;
        }
        token
    }

    fn eat(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            self.bump()
        } else {
            None
        }
    }

    fn expect(&mut self, kind: TokenKind) -> Option<Token> {
        if self.at(kind) {
            self.bump()
        } else {
            self.error_expected(&kind.to_string());
            None
        }
    }

    fn span_here(&self) -> Span {
        self.current().map_or(self.eof_span, |t| t.span)
    }

    fn error_expected(&mut self, expected: &str) {
        match self.current() {
            Some(token) => self.errors.push(ParseError::UnexpectedToken {
                expected: expected.to_string(),
                found: token.text.clone(),
                line: token.span.line,
                column: token.span.column,
            }),
            None => self.errors.push(ParseError::UnexpectedEof {
                expected: expected.to_string(),
            }),
        }
    }

    fn error_node(&mut self) -> NodeId {
        let span = self.span_here();
        self.builder.node(NodeKind::Error, Vec::new(), span)
    }

    /// Skip to the next statement boundary after an error.
    fn sync_to_statement(&mut self) {
        while let Some(kind) = self.current_kind() {
            match kind {
                TokenKind::Semicolon => {
                    self.bump();
                    return;
                }
                TokenKind::RBrace
                | TokenKind::Import
                | TokenKind::Class
                | TokenKind::Function
                | TokenKind::Expand
                | TokenKind::Var
                | TokenKind::Val
                | TokenKind::Static
                | TokenKind::Global
                | TokenKind::If
                | TokenKind::While
                | TokenKind::For
                | TokenKind::Return => return,
                _ => {
                    self.bump();
                }
            }
        }
    }

    // ------------------------------------------------------------------
    // Declarations
    // ------------------------------------------------------------------

    fn parse_source_unit(&mut self) -> NodeId {
        let start_span = self.span_here();
        let mut children = Vec::new();
        let mut annotations = Vec::new();
        while !self.at_eof() {
            let before = self.pos;
            match self.current_kind() {
                Some(TokenKind::Annotation) => {
                    let token = self.bump().unwrap_or_else(|| unreachable!());
                    annotations.push(self.builder.leaf(NodeKind::Annotation, token));
                }
                Some(TokenKind::Import) => children.push(self.parse_import()),
                Some(TokenKind::Class) => children.push(self.parse_class()),
                Some(TokenKind::Function) => {
                    let anns = std::mem::take(&mut annotations);
                    children.push(self.parse_function(None, anns));
                }
                Some(TokenKind::Expand) => children.push(self.parse_expand_function()),
                _ => children.push(self.parse_statement()),
            }
            if self.pos == before {
                // No progress; drop the offending token into an error node.
                self.error_expected("declaration or statement");
                let node = self.error_node();
                self.bump();
                children.push(node);
            }
        }
        children.extend(annotations);
        self.builder.node(NodeKind::SourceUnit, children, start_span)
    }

    fn parse_import(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::Import);
        let mut children = Vec::new();
        children.push(self.parse_qualified_name());
        if let Some(as_token) = self.eat(TokenKind::As) {
            match self.parse_simple_name() {
                Some(name) => {
                    let alias = self.builder.node(NodeKind::Alias, vec![name], as_token.span);
                    children.push(alias);
                }
                None => self.sync_to_statement(),
            }
        }
        self.expect(TokenKind::Semicolon);
        let node = self.builder.node(NodeKind::ImportDeclaration, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_qualified_name(&mut self) -> NodeId {
        let mut segments = Vec::new();
        match self.parse_simple_name() {
            Some(name) => segments.push(name),
            None => return self.error_node(),
        }
        while self.at(TokenKind::Dot) {
            self.bump();
            match self.parse_simple_name() {
                Some(name) => segments.push(name),
                None => break,
            }
        }
        self.builder.node(NodeKind::QualifiedName, segments, self.span_here())
    }

    fn parse_simple_name(&mut self) -> Option<NodeId> {
        match self.current_kind() {
            Some(TokenKind::Identifier) | Some(TokenKind::To) => {
                let token = self.bump()?;
                Some(self.builder.leaf(NodeKind::SimpleName, token))
            }
            _ => {
                self.error_expected("name");
                None
            }
        }
    }

    /// Class names additionally admit primitive-type keywords, so
    /// declaration-only units can describe extensions of `string`,
    /// `int` and friends via same-named classes.
    fn parse_class_name(&mut self) -> Option<NodeId> {
        match self.current_kind() {
            Some(kind) if kind.is_primitive_type() => {
                let token = self.bump()?;
                Some(self.builder.leaf(NodeKind::SimpleName, token))
            }
            _ => self.parse_simple_name(),
        }
    }

    fn parse_class(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::Class);
        let mut children = Vec::new();
        if let Some(name) = self.parse_class_name() {
            children.push(name);
        }
        if let Some(implements) = self.eat(TokenKind::Implements) {
            let mut interfaces = Vec::new();
            loop {
                interfaces.push(self.parse_qualified_name());
                if self.eat(TokenKind::Comma).is_none() {
                    break;
                }
            }
            let list = self.builder.node(NodeKind::InterfaceList, interfaces, implements.span);
            children.push(list);
        }
        children.push(self.parse_class_body());
        let node = self.builder.node(NodeKind::ClassDeclaration, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_class_body(&mut self) -> NodeId {
        let open_span = self.span_here();
        self.expect(TokenKind::LBrace);
        let mut entries = Vec::new();
        let mut annotations = Vec::new();
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            let before = self.pos;
            match self.current_kind() {
                Some(TokenKind::Annotation) => {
                    let token = self.bump().unwrap_or_else(|| unreachable!());
                    annotations.push(self.builder.leaf(NodeKind::Annotation, token));
                }
                Some(TokenKind::Static) if self.peek_kind(1) == Some(TokenKind::Function) => {
                    let modifier = self.bump();
                    let anns = std::mem::take(&mut annotations);
                    entries.push(self.parse_function(modifier, anns));
                }
                Some(kind) if kind.is_declaration_prefix() => {
                    entries.push(self.parse_variable_declaration());
                }
                Some(TokenKind::Function) => {
                    let anns = std::mem::take(&mut annotations);
                    entries.push(self.parse_function(None, anns));
                }
                Some(TokenKind::Constructor) => entries.push(self.parse_constructor()),
                Some(TokenKind::Operator) => {
                    let anns = std::mem::take(&mut annotations);
                    entries.push(self.parse_operator_function(anns));
                }
                _ => {
                    self.error_expected("class member");
                    let node = self.error_node();
                    self.bump();
                    entries.push(node);
                }
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace);
        entries.extend(annotations);
        self.builder.node(NodeKind::ClassBody, entries, open_span)
    }

    fn parse_function(&mut self, modifier: Option<Token>, annotations: Vec<NodeId>) -> NodeId {
        let keyword = self.expect(TokenKind::Function);
        let mut children = annotations;
        if let Some(name) = self.parse_simple_name() {
            children.push(name);
        }
        children.push(self.parse_formal_parameter_list());
        if let Some(return_type) = self.parse_return_type() {
            children.push(return_type);
        }
        if self.at(TokenKind::LBrace) {
            children.push(self.parse_block());
        } else {
            self.expect(TokenKind::Semicolon);
        }
        let node = self.builder.node(NodeKind::FunctionDeclaration, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        if let Some(modifier) = modifier {
            self.builder.attach_token(node, modifier);
        }
        node
    }

    fn parse_expand_function(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::Expand);
        let mut children = Vec::new();
        children.push(self.parse_type_literal());
        self.expect(TokenKind::Dollar);
        if self.at(TokenKind::Operator) {
            self.bump();
            if let Some(op) = self.parse_operator_symbol() {
                children.push(op);
            }
        } else if let Some(name) = self.parse_simple_name() {
            children.push(name);
        }
        children.push(self.parse_formal_parameter_list());
        if let Some(return_type) = self.parse_return_type() {
            children.push(return_type);
        }
        if self.at(TokenKind::LBrace) {
            children.push(self.parse_block());
        } else {
            self.expect(TokenKind::Semicolon);
        }
        let node = self
            .builder
            .node(NodeKind::ExpandFunctionDeclaration, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_constructor(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::Constructor);
        let mut children = Vec::new();
        if let Some(keyword) = &keyword {
            children.push(self.builder.leaf(NodeKind::SimpleName, keyword.clone()));
        }
        children.push(self.parse_formal_parameter_list());
        if self.at(TokenKind::LBrace) {
            children.push(self.parse_block());
        } else {
            self.expect(TokenKind::Semicolon);
        }
        self.builder
            .node(NodeKind::ConstructorDeclaration, children, self.span_here())
    }

    fn parse_operator_function(&mut self, annotations: Vec<NodeId>) -> NodeId {
        let keyword = self.expect(TokenKind::Operator);
        let mut children = annotations;
        if let Some(op) = self.parse_operator_symbol() {
            children.push(op);
        }
        children.push(self.parse_formal_parameter_list());
        if let Some(return_type) = self.parse_return_type() {
            children.push(return_type);
        }
        if self.at(TokenKind::LBrace) {
            children.push(self.parse_block());
        } else {
            self.expect(TokenKind::Semicolon);
        }
        let node = self
            .builder
            .node(NodeKind::OperatorFunctionDeclaration, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_operator_symbol(&mut self) -> Option<NodeId> {
        let kind = self.current_kind()?;
        match kind {
            TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::Percent
            | TokenKind::Tilde
            | TokenKind::Bang
            | TokenKind::Equals
            | TokenKind::NotEquals
            | TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEquals
            | TokenKind::GreaterEquals
            | TokenKind::In
            | TokenKind::Has
            | TokenKind::As
            | TokenKind::DotDot => {
                let token = self.bump()?;
                Some(self.builder.leaf(NodeKind::Operator, token))
            }
            TokenKind::LBracket => {
                let open = self.bump()?;
                let close = self.expect(TokenKind::RBracket);
                let mut span = open.span;
                let mut text = String::from("[]");
                if let Some(close) = close {
                    span = span.merge(&close.span);
                }
                if let Some(assign) = self.eat(TokenKind::Assign) {
                    span = span.merge(&assign.span);
                    text.push('=');
                }
                let token = Token::new(open.kind, text, span);
                Some(self.builder.leaf(NodeKind::Operator, token))
            }
            _ => {
                self.error_expected("operator symbol");
                None
            }
        }
    }

    fn parse_formal_parameter_list(&mut self) -> NodeId {
        let open_span = self.span_here();
        self.expect(TokenKind::LParen);
        let mut params = Vec::new();
        while !self.at_eof() && !self.at(TokenKind::RParen) {
            let before = self.pos;
            params.push(self.parse_formal_parameter());
            if self.eat(TokenKind::Comma).is_none() && !self.at(TokenKind::RParen) {
                self.error_expected("`,` or `)`");
                if self.pos == before {
                    break;
                }
            }
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RParen);
        self.builder.node(NodeKind::FormalParameterList, params, open_span)
    }

    fn parse_formal_parameter(&mut self) -> NodeId {
        let vararg = self.eat(TokenKind::DotDotDot);
        let mut children = Vec::new();
        match self.parse_simple_name() {
            Some(name) => children.push(name),
            None => return self.error_node(),
        }
        if self.eat(TokenKind::As).is_some() {
            children.push(self.parse_type_literal());
        }
        if let Some(assign) = self.eat(TokenKind::Assign) {
            let expr = self.parse_expression();
            let default = self.builder.node(NodeKind::DefaultValue, vec![expr], assign.span);
            children.push(default);
        }
        let node = self.builder.node(NodeKind::FormalParameter, children, self.span_here());
        if let Some(vararg) = vararg {
            self.builder.attach_token(node, vararg);
        }
        node
    }

    fn parse_return_type(&mut self) -> Option<NodeId> {
        let as_token = self.eat(TokenKind::As)?;
        let ty = self.parse_type_literal();
        Some(self.builder.node(NodeKind::ReturnType, vec![ty], as_token.span))
    }

    fn parse_variable_declaration(&mut self) -> NodeId {
        let modifier = self.bump();
        let mut children = Vec::new();
        match self.parse_simple_name() {
            Some(name) => children.push(name),
            None => {
                self.sync_to_statement();
                return self.error_node();
            }
        }
        if self.eat(TokenKind::As).is_some() {
            children.push(self.parse_type_literal());
        }
        if let Some(assign) = self.eat(TokenKind::Assign) {
            let expr = self.parse_expression();
            let init = self.builder.node(NodeKind::Initializer, vec![expr], assign.span);
            children.push(init);
        }
        self.expect(TokenKind::Semicolon);
        let node = self.builder.node(NodeKind::VariableDeclaration, children, self.span_here());
        if let Some(modifier) = modifier {
            self.builder.attach_token(node, modifier);
        }
        node
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    fn parse_statement(&mut self) -> NodeId {
        match self.current_kind() {
            Some(TokenKind::LBrace) => self.parse_block(),
            Some(TokenKind::Return) => self.parse_return(),
            Some(TokenKind::If) => self.parse_if(),
            Some(TokenKind::While) => self.parse_while(),
            Some(TokenKind::For) => self.parse_foreach(),
            Some(kind) if kind.is_declaration_prefix() => self.parse_variable_declaration(),
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) -> NodeId {
        let open_span = self.span_here();
        self.expect(TokenKind::LBrace);
        let mut statements = Vec::new();
        while !self.at_eof() && !self.at(TokenKind::RBrace) {
            let before = self.pos;
            statements.push(self.parse_statement());
            if self.pos == before {
                self.bump();
            }
        }
        self.expect(TokenKind::RBrace);
        self.builder.node(NodeKind::BlockStatement, statements, open_span)
    }

    fn parse_return(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::Return);
        let mut children = Vec::new();
        if !self.at(TokenKind::Semicolon) && !self.at_eof() {
            children.push(self.parse_expression());
        }
        self.expect(TokenKind::Semicolon);
        let node = self.builder.node(NodeKind::ReturnStatement, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_if(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::If);
        let mut children = Vec::new();
        children.push(self.parse_expression());
        children.push(self.parse_statement());
        if self.eat(TokenKind::Else).is_some() {
            children.push(self.parse_statement());
        }
        let node = self.builder.node(NodeKind::IfStatement, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_while(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::While);
        let mut children = Vec::new();
        children.push(self.parse_expression());
        children.push(self.parse_statement());
        let node = self.builder.node(NodeKind::WhileStatement, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_foreach(&mut self) -> NodeId {
        let keyword = self.expect(TokenKind::For);
        let list_span = self.span_here();
        let mut variables = Vec::new();
        loop {
            match self.parse_simple_name() {
                Some(name) => {
                    variables.push(self.builder.node(NodeKind::ForeachVariable, vec![name], list_span));
                }
                None => break,
            }
            if self.eat(TokenKind::Comma).is_none() {
                break;
            }
        }
        let variable_list = self.builder.node(NodeKind::ForeachVariableList, variables, list_span);
        let mut children = vec![variable_list];
        self.expect(TokenKind::In);
        children.push(self.parse_expression());
        children.push(self.parse_statement());
        let node = self.builder.node(NodeKind::ForeachStatement, children, self.span_here());
        if let Some(keyword) = keyword {
            self.builder.widen(node, keyword.span);
        }
        node
    }

    fn parse_expression_statement(&mut self) -> NodeId {
        let expr = self.parse_expression();
        if self.expect(TokenKind::Semicolon).is_none() {
            self.sync_to_statement();
        }
        self.builder
            .node(NodeKind::ExpressionStatement, vec![expr], self.span_here())
    }

    // ------------------------------------------------------------------
    // Expressions
    // ------------------------------------------------------------------

    fn parse_expression(&mut self) -> NodeId {
        self.parse_assignment()
    }

    fn parse_assignment(&mut self) -> NodeId {
        let left = self.parse_ternary();
        let is_assign = matches!(
            self.current_kind(),
            Some(
                TokenKind::Assign
                    | TokenKind::PlusAssign
                    | TokenKind::MinusAssign
                    | TokenKind::StarAssign
                    | TokenKind::SlashAssign
                    | TokenKind::PercentAssign
                    | TokenKind::TildeAssign
            )
        );
        if !is_assign {
            return left;
        }
        let op_token = match self.bump() {
            Some(token) => token,
            None => return left,
        };
        let op = self.builder.leaf(NodeKind::Operator, op_token);
        let right = self.parse_assignment();
        self.builder
            .node(NodeKind::AssignmentExpr, vec![left, op, right], self.span_here())
    }

    fn parse_ternary(&mut self) -> NodeId {
        let condition = self.parse_binary(0);
        if self.eat(TokenKind::Question).is_none() {
            return condition;
        }
        let true_part = self.parse_binary(0);
        self.expect(TokenKind::Colon);
        let false_part = self.parse_ternary();
        self.builder.node(
            NodeKind::TernaryExpr,
            vec![condition, true_part, false_part],
            self.span_here(),
        )
    }

    fn binary_precedence(kind: TokenKind) -> Option<u8> {
        match kind {
            TokenKind::OrOr => Some(1),
            TokenKind::AndAnd => Some(2),
            TokenKind::Pipe => Some(3),
            TokenKind::Caret => Some(4),
            TokenKind::Amp => Some(5),
            TokenKind::Equals | TokenKind::NotEquals => Some(6),
            TokenKind::Less
            | TokenKind::Greater
            | TokenKind::LessEquals
            | TokenKind::GreaterEquals
            | TokenKind::In
            | TokenKind::Has => Some(7),
            TokenKind::DotDot | TokenKind::To => Some(8),
            TokenKind::Plus | TokenKind::Minus | TokenKind::Tilde => Some(9),
            TokenKind::Star | TokenKind::Slash | TokenKind::Percent => Some(10),
            _ => None,
        }
    }

    fn parse_binary(&mut self, min_precedence: u8) -> NodeId {
        let mut left = self.parse_unary();
        while let Some(kind) = self.current_kind() {
            let Some(precedence) = Self::binary_precedence(kind) else {
                break;
            };
            if precedence < min_precedence {
                break;
            }
            let op_token = match self.bump() {
                Some(token) => token,
                None => break,
            };
            let right = self.parse_binary(precedence + 1);
            left = if matches!(kind, TokenKind::DotDot | TokenKind::To) {
                self.builder
                    .node(NodeKind::RangeExpr, vec![left, right], self.span_here())
            } else {
                let op = self.builder.leaf(NodeKind::Operator, op_token);
                self.builder
                    .node(NodeKind::BinaryExpr, vec![left, op, right], self.span_here())
            };
        }
        left
    }

    fn parse_unary(&mut self) -> NodeId {
        match self.current_kind() {
            Some(TokenKind::Bang) | Some(TokenKind::Minus) => {
                let op_token = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                let op = self.builder.leaf(NodeKind::Operator, op_token);
                let operand = self.parse_unary();
                self.builder
                    .node(NodeKind::UnaryExpr, vec![op, operand], self.span_here())
            }
            _ => self.parse_postfix(),
        }
    }

    fn parse_postfix(&mut self) -> NodeId {
        let mut expr = self.parse_primary();
        loop {
            match self.current_kind() {
                Some(TokenKind::Dot) => {
                    self.bump();
                    match self.parse_simple_name() {
                        Some(name) => {
                            expr = self.builder.node(
                                NodeKind::MemberAccessExpr,
                                vec![expr, name],
                                self.span_here(),
                            );
                        }
                        None => break,
                    }
                }
                Some(TokenKind::LParen) => {
                    let open_span = self.span_here();
                    self.bump();
                    let mut args = Vec::new();
                    while !self.at_eof() && !self.at(TokenKind::RParen) {
                        let before = self.pos;
                        args.push(self.parse_expression());
                        if self.eat(TokenKind::Comma).is_none() {
                            break;
                        }
                        if self.pos == before {
                            self.bump();
                        }
                    }
                    self.expect(TokenKind::RParen);
                    let arguments = self.builder.node(NodeKind::ArgumentList, args, open_span);
                    expr = self
                        .builder
                        .node(NodeKind::CallExpr, vec![expr, arguments], self.span_here());
                }
                Some(TokenKind::LBracket) => {
                    self.bump();
                    let index = self.parse_expression();
                    self.expect(TokenKind::RBracket);
                    expr = self.builder.node(
                        NodeKind::MemberIndexExpr,
                        vec![expr, index],
                        self.span_here(),
                    );
                }
                Some(TokenKind::As) => {
                    self.bump();
                    let ty = self.parse_type_literal();
                    expr = self
                        .builder
                        .node(NodeKind::TypeCastExpr, vec![expr, ty], self.span_here());
                }
                _ => break,
            }
        }
        expr
    }

    fn parse_primary(&mut self) -> NodeId {
        match self.current_kind() {
            Some(
                TokenKind::IntLiteral
                | TokenKind::LongLiteral
                | TokenKind::FloatLiteral
                | TokenKind::DoubleLiteral
                | TokenKind::StringLiteral
                | TokenKind::True
                | TokenKind::False
                | TokenKind::Null,
            ) => {
                let token = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                self.builder.leaf(NodeKind::LiteralExpr, token)
            }
            Some(TokenKind::Identifier) | Some(TokenKind::To) => {
                let token = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                let name = self.builder.leaf(NodeKind::SimpleName, token);
                self.builder
                    .node(NodeKind::LocalAccessExpr, vec![name], self.span_here())
            }
            Some(TokenKind::This) => {
                let token = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                self.builder.leaf(NodeKind::ThisExpr, token)
            }
            Some(TokenKind::LParen) => {
                self.bump();
                let inner = self.parse_expression();
                self.expect(TokenKind::RParen);
                self.builder
                    .node(NodeKind::ParensExpr, vec![inner], self.span_here())
            }
            Some(TokenKind::LBracket) => {
                let open_span = self.span_here();
                self.bump();
                let mut elements = Vec::new();
                while !self.at_eof() && !self.at(TokenKind::RBracket) {
                    let before = self.pos;
                    elements.push(self.parse_expression());
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
                self.expect(TokenKind::RBracket);
                let node = self.builder.node(NodeKind::ArrayLiteralExpr, elements, open_span);
                self.builder.widen(node, open_span);
                node
            }
            Some(TokenKind::LBrace) => {
                let open_span = self.span_here();
                self.bump();
                let mut entries = Vec::new();
                while !self.at_eof() && !self.at(TokenKind::RBrace) {
                    let before = self.pos;
                    let key = self.parse_expression();
                    self.expect(TokenKind::Colon);
                    let value = self.parse_expression();
                    entries.push(
                        self.builder
                            .node(NodeKind::MapEntry, vec![key, value], open_span),
                    );
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
                self.expect(TokenKind::RBrace);
                let children = if entries.is_empty() {
                    Vec::new()
                } else {
                    vec![self.builder.node(NodeKind::MapEntryList, entries, open_span)]
                };
                let node = self.builder.node(NodeKind::MapLiteralExpr, children, open_span);
                self.builder.widen(node, open_span);
                node
            }
            Some(TokenKind::Function) => {
                let keyword = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                let mut children = vec![self.parse_formal_parameter_list()];
                if let Some(return_type) = self.parse_return_type() {
                    children.push(return_type);
                }
                children.push(self.parse_block());
                let node = self
                    .builder
                    .node(NodeKind::FunctionExpr, children, keyword.span);
                self.builder.widen(node, keyword.span);
                node
            }
            _ => {
                self.error_expected("expression");
                self.error_node()
            }
        }
    }

    // ------------------------------------------------------------------
    // Type literals
    // ------------------------------------------------------------------

    fn parse_type_literal(&mut self) -> NodeId {
        let base = match self.current_kind() {
            Some(kind) if kind.is_primitive_type() => {
                let token = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                self.builder.leaf(NodeKind::PrimitiveType, token)
            }
            Some(TokenKind::LBracket) => {
                let open_span = self.span_here();
                self.bump();
                let element = self.parse_type_literal();
                self.expect(TokenKind::RBracket);
                let node = self.builder.node(NodeKind::ListType, vec![element], open_span);
                self.builder.widen(node, open_span);
                node
            }
            Some(TokenKind::Function) => {
                let keyword = match self.bump() {
                    Some(token) => token,
                    None => return self.error_node(),
                };
                let open_span = self.span_here();
                self.expect(TokenKind::LParen);
                let mut types = Vec::new();
                while !self.at_eof() && !self.at(TokenKind::RParen) {
                    let before = self.pos;
                    types.push(self.parse_type_literal());
                    if self.eat(TokenKind::Comma).is_none() {
                        break;
                    }
                    if self.pos == before {
                        self.bump();
                    }
                }
                self.expect(TokenKind::RParen);
                let params = self.builder.node(NodeKind::TypeLiteralList, types, open_span);
                let return_type = self.parse_type_literal();
                let node = self
                    .builder
                    .node(NodeKind::FunctionType, vec![params, return_type], keyword.span);
                self.builder.widen(node, keyword.span);
                node
            }
            Some(TokenKind::Identifier) | Some(TokenKind::To) => {
                let name = self.parse_qualified_name();
                self.builder
                    .node(NodeKind::ClassType, vec![name], self.span_here())
            }
            _ => {
                self.error_expected("type literal");
                return self.error_node();
            }
        };
        self.parse_type_suffix(base)
    }

    /// Array (`T[]`) and map (`V[K]`) suffixes, left-associative.
    fn parse_type_suffix(&mut self, mut ty: NodeId) -> NodeId {
        while self.at(TokenKind::LBracket) {
            if self.peek_kind(1) == Some(TokenKind::RBracket) {
                self.bump();
                let close = self.bump();
                let node = self.builder.node(NodeKind::ArrayType, vec![ty], self.span_here());
                if let Some(close) = close {
                    self.builder.widen(node, close.span);
                }
                ty = node;
            } else {
                self.bump();
                let key = self.parse_type_literal();
                self.expect(TokenKind::RBracket);
                ty = self
                    .builder
                    .node(NodeKind::MapType, vec![ty, key], self.span_here());
            }
        }
        ty
    }
}
