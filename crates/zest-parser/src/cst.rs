//! Concrete syntax tree for Zest.
//!
//! The tree is homogeneous: every node is a [`NodeKind`] tag plus a span,
//! a parent link and an ordered child list, stored in a single arena owned
//! by the [`SyntaxTree`]. A [`NodeId`] is the node's stable identity for
//! the lifetime of the tree; semantic layers key their annotation tables
//! by it instead of attaching fields to nodes.
//!
//! Terminal nodes (names, literals, operators, primitive types) also carry
//! their [`Token`], which is how consumers classify literals without
//! re-lexing.

use crate::token::{Span, Token, TokenKind};

/// Stable identity of a node within one [`SyntaxTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// The kind of a CST node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// One source file.
    SourceUnit,

    // Declarations
    /// `import a.b.C as D;`
    ImportDeclaration,
    /// Dot-separated name path.
    QualifiedName,
    /// A single name token.
    SimpleName,
    /// `as D` import alias.
    Alias,
    /// `class Name implements A, B { ... }`
    ClassDeclaration,
    /// The `implements` name list of a class.
    InterfaceList,
    /// The braced body of a class.
    ClassBody,
    /// `constructor(params) { ... }`
    ConstructorDeclaration,
    /// `function name(params) as Ret { ... }`
    FunctionDeclaration,
    /// `expand Type$name(params) as Ret { ... }`
    ExpandFunctionDeclaration,
    /// `operator +(params) as Ret { ... }`
    OperatorFunctionDeclaration,
    /// An operator token of an operator-function declaration.
    Operator,
    /// `#foreach`-style annotation attached to a member.
    Annotation,
    /// Parenthesized formal parameter list.
    FormalParameterList,
    /// One formal parameter.
    FormalParameter,
    /// `= expr` default value of a parameter.
    DefaultValue,
    /// `as Type` declared return type.
    ReturnType,
    /// `var|val|static|global name as Type = expr;`
    VariableDeclaration,
    /// `= expr` initializer of a variable.
    Initializer,

    // Statements
    /// `{ ... }`
    BlockStatement,
    /// `return expr;`
    ReturnStatement,
    /// `if cond stmt else stmt`
    IfStatement,
    /// `while cond stmt`
    WhileStatement,
    /// `for a, b in expr stmt`
    ForeachStatement,
    /// Variable list of a foreach statement.
    ForeachVariableList,
    /// One foreach loop variable.
    ForeachVariable,
    /// An expression used as a statement.
    ExpressionStatement,

    // Expressions
    /// A bare name reference.
    LocalAccessExpr,
    /// `expr.name`
    MemberAccessExpr,
    /// `expr[index]`
    MemberIndexExpr,
    /// `callee(args)`
    CallExpr,
    /// Argument list of a call.
    ArgumentList,
    /// `!expr`, `-expr`
    UnaryExpr,
    /// `left op right`
    BinaryExpr,
    /// `cond ? a : b`
    TernaryExpr,
    /// `left = right` (and compound forms)
    AssignmentExpr,
    /// `(expr)`
    ParensExpr,
    /// A literal token.
    LiteralExpr,
    /// `[a, b, c]`
    ArrayLiteralExpr,
    /// `{k: v, ...}`
    MapLiteralExpr,
    /// Entry list of a map literal.
    MapEntryList,
    /// One `key: value` entry.
    MapEntry,
    /// `a .. b` / `a to b`
    RangeExpr,
    /// `this`
    ThisExpr,
    /// `function(params) as Ret { ... }` expression.
    FunctionExpr,
    /// `expr as Type`
    TypeCastExpr,

    // Type literals
    /// `T[]`
    ArrayType,
    /// `[T]`
    ListType,
    /// `V[K]`
    MapType,
    /// `function(T1,T2)R`
    FunctionType,
    /// Comma-separated type literal list.
    TypeLiteralList,
    /// A primitive type keyword.
    PrimitiveType,
    /// A class reference type literal.
    ClassType,

    /// Unparsable region retained for error tolerance.
    Error,
}

impl NodeKind {
    /// Whether this kind is a type literal.
    pub fn is_type_literal(self) -> bool {
        matches!(
            self,
            NodeKind::ArrayType
                | NodeKind::ListType
                | NodeKind::MapType
                | NodeKind::FunctionType
                | NodeKind::PrimitiveType
                | NodeKind::ClassType
        )
    }

    /// Whether this kind is an expression.
    pub fn is_expression(self) -> bool {
        matches!(
            self,
            NodeKind::LocalAccessExpr
                | NodeKind::MemberAccessExpr
                | NodeKind::MemberIndexExpr
                | NodeKind::CallExpr
                | NodeKind::UnaryExpr
                | NodeKind::BinaryExpr
                | NodeKind::TernaryExpr
                | NodeKind::AssignmentExpr
                | NodeKind::ParensExpr
                | NodeKind::LiteralExpr
                | NodeKind::ArrayLiteralExpr
                | NodeKind::MapLiteralExpr
                | NodeKind::RangeExpr
                | NodeKind::ThisExpr
                | NodeKind::FunctionExpr
                | NodeKind::TypeCastExpr
        )
    }
}

/// Data of one node in the arena.
#[derive(Debug, Clone)]
struct NodeData {
    kind: NodeKind,
    span: Span,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    token: Option<Token>,
}

/// An arena-backed concrete syntax tree.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    nodes: Vec<NodeData>,
    root: NodeId,
}

impl SyntaxTree {
    /// The root node (always a `SourceUnit`).
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the tree has no nodes besides the root.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Kind of `node`.
    pub fn kind(&self, node: NodeId) -> NodeKind {
        self.data(node).kind
    }

    /// Span of `node`.
    pub fn span(&self, node: NodeId) -> Span {
        self.data(node).span
    }

    /// Parent of `node`, if any.
    pub fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.data(node).parent
    }

    /// Ordered children of `node`.
    pub fn children(&self, node: NodeId) -> &[NodeId] {
        &self.data(node).children
    }

    /// The token of a terminal node.
    pub fn token(&self, node: NodeId) -> Option<&Token> {
        self.data(node).token.as_ref()
    }

    /// The token kind of a terminal node.
    pub fn token_kind(&self, node: NodeId) -> Option<TokenKind> {
        self.data(node).token.as_ref().map(|t| t.kind)
    }

    /// Source text of a terminal node, or the concatenated text of a
    /// qualified name.
    pub fn text(&self, node: NodeId) -> Option<String> {
        if let Some(token) = &self.data(node).token {
            return Some(token.text.clone());
        }
        match self.kind(node) {
            NodeKind::QualifiedName => {
                let segments: Vec<String> = self
                    .children(node)
                    .iter()
                    .filter_map(|&child| self.text(child))
                    .collect();
                Some(segments.join("."))
            }
            _ => None,
        }
    }

    /// First child of `node` with the given kind.
    pub fn child_of_kind(&self, node: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(node).iter().copied().find(|&c| self.kind(c) == kind)
    }

    /// All children of `node` with the given kind.
    pub fn children_of_kind(&self, node: NodeId, kind: NodeKind) -> Vec<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .filter(|&c| self.kind(c) == kind)
            .collect()
    }

    /// First child of `node` that is a type literal.
    pub fn type_literal_child(&self, node: NodeId) -> Option<NodeId> {
        self.children(node)
            .iter()
            .copied()
            .find(|&c| self.kind(c).is_type_literal())
    }

    /// Iterator over `node` and its ancestors up to the root.
    pub fn ancestors(&self, node: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        let mut current = Some(node);
        std::iter::from_fn(move || {
            let node = current?;
            current = self.parent(node);
            Some(node)
        })
    }

    /// Whether `node` is `ancestor` or one of its descendants.
    pub fn is_within(&self, node: NodeId, ancestor: NodeId) -> bool {
        self.ancestors(node).any(|n| n == ancestor)
    }

    /// The deepest node whose span contains the 1-based `line`/`column`
    /// position.
    pub fn node_at(&self, line: u32, column: u32) -> NodeId {
        let mut current = self.root;
        'descend: loop {
            for &child in self.children(current) {
                if span_contains(self.span(child), line, column) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    fn data(&self, node: NodeId) -> &NodeData {
        &self.nodes[node.0 as usize]
    }
}

fn span_contains(span: Span, line: u32, column: u32) -> bool {
    if (line, column) < (span.line, span.column) {
        return false;
    }
    (line, column) < (span.last_line, span.last_column)
}

/// Builder used by the parser to grow a [`SyntaxTree`] bottom-up.
#[derive(Debug, Default)]
pub struct TreeBuilder {
    nodes: Vec<NodeData>,
}

impl TreeBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a terminal node carrying `token`.
    pub fn leaf(&mut self, kind: NodeKind, token: Token) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(NodeData {
            kind,
            span: token.span,
            parent: None,
            children: Vec::new(),
            token: Some(token),
        });
        id
    }

    /// Add an interior node adopting `children`; the span is the merge of
    /// the children's spans (or `fallback` when there are none).
    pub fn node(&mut self, kind: NodeKind, children: Vec<NodeId>, fallback: Span) -> NodeId {
        let id = NodeId(self.nodes.len() as u32);
        let mut span: Option<Span> = None;
        for &child in &children {
            let child_span = self.nodes[child.0 as usize].span;
            span = Some(match span {
                Some(s) => s.merge(&child_span),
                None => child_span,
            });
        }
        self.nodes.push(NodeData {
            kind,
            span: span.unwrap_or(fallback),
            parent: None,
            children: Vec::new(),
            token: None,
        });
        for &child in &children {
            self.nodes[child.0 as usize].parent = Some(id);
        }
        self.nodes[id.0 as usize].children = children;
        id
    }

    /// Attach `token` to an existing node (declaration modifiers, vararg
    /// prefixes), widening the node's span to cover it.
    pub fn attach_token(&mut self, node: NodeId, token: Token) {
        let data = &mut self.nodes[node.0 as usize];
        data.span = data.span.merge(&token.span);
        data.token = Some(token);
    }

    /// Widen a node's span to cover `span` (used to include keyword
    /// tokens that are not kept as children).
    pub fn widen(&mut self, node: NodeId, span: Span) {
        let data = &mut self.nodes[node.0 as usize];
        data.span = data.span.merge(&span);
    }

    /// Finish the tree with `root`.
    pub fn finish(self, root: NodeId) -> SyntaxTree {
        SyntaxTree { nodes: self.nodes, root }
    }
}
