//! Cursor-based symbol resolution.
//!
//! Finds the nearest enclosing root expression of the query node, then
//! revisits it left to right, threading a candidate set: bare names
//! search lexical scopes, then imports, then global symbols; qualified
//! names and member accesses fold the candidate set segment by segment,
//! capturing the set whose segment covers the query node.
//!
//! Ambiguity is never resolved here: a left-hand side with zero or
//! several candidates yields no members. This is a query tool, not a
//! checker.

use crate::env::CompilationEnvironment;
use crate::provider::SymbolProvider;
use crate::symbol::Symbol;
use crate::unit::CompilationUnit;
use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};

/// Statement/declaration kinds whose direct expression child is a
/// resolution entry point.
const ROOT_EXPRESSION_PARENTS: &[NodeKind] = &[
    NodeKind::ImportDeclaration,
    NodeKind::ForeachStatement,
    NodeKind::ForeachVariable,
    NodeKind::WhileStatement,
    NodeKind::IfStatement,
    NodeKind::ExpressionStatement,
    NodeKind::ReturnStatement,
];

/// The symbol candidates denoted by the node under the cursor.
///
/// Returns an empty list when the node sits outside any root expression
/// or nothing resolves; resolution never fails.
pub fn lookup_symbols(
    node: NodeId,
    unit: &CompilationUnit,
    env: &CompilationEnvironment,
) -> Vec<Symbol> {
    let tree = unit.tree();
    let Some(root) = find_root_expression(tree, node) else {
        return Vec::new();
    };
    let mut visitor = SymbolVisitor {
        unit,
        env,
        target: node,
        result: None,
    };
    visitor.visit(root);
    visitor.result.unwrap_or_default()
}

fn find_root_expression(tree: &SyntaxTree, node: NodeId) -> Option<NodeId> {
    let mut current = node;
    loop {
        let parent = tree.parent(current)?;
        if ROOT_EXPRESSION_PARENTS.contains(&tree.kind(parent)) {
            return Some(current);
        }
        current = parent;
    }
}

struct SymbolVisitor<'a> {
    unit: &'a CompilationUnit,
    env: &'a CompilationEnvironment,
    target: NodeId,
    result: Option<Vec<Symbol>>,
}

impl<'a> SymbolVisitor<'a> {
    fn visit(&mut self, node: NodeId) -> SymbolProvider {
        let tree = self.unit.tree();
        match tree.kind(node) {
            NodeKind::QualifiedName => {
                let segments = tree.children(node).to_vec();
                let Some(&first) = segments.first() else {
                    return SymbolProvider::empty();
                };
                let Some(first_name) = tree.text(first) else {
                    return SymbolProvider::empty();
                };
                let mut provider = self.lookup_name(node, &first_name);
                if self.hits(first) {
                    self.result = Some(provider.symbols().to_vec());
                }
                for &segment in &segments[1..] {
                    let Some(name) = tree.text(segment) else {
                        continue;
                    };
                    provider = self.access_member(&provider, &name);
                    if self.hits(segment) {
                        self.result = Some(provider.symbols().to_vec());
                    }
                }
                provider
            }
            NodeKind::LocalAccessExpr => {
                let Some(name_node) = tree.child_of_kind(node, NodeKind::SimpleName) else {
                    return SymbolProvider::empty();
                };
                let Some(name) = tree.text(name_node) else {
                    return SymbolProvider::empty();
                };
                let provider = self.lookup_name(node, &name);
                if self.hits(name_node) {
                    self.result = Some(provider.symbols().to_vec());
                }
                provider
            }
            NodeKind::MemberAccessExpr => {
                let Some(&left) = tree.children(node).first() else {
                    return SymbolProvider::empty();
                };
                let left_provider = self.visit(left);
                let Some(name_node) = tree.child_of_kind(node, NodeKind::SimpleName) else {
                    return SymbolProvider::empty();
                };
                let Some(name) = tree.text(name_node) else {
                    return SymbolProvider::empty();
                };
                let provider = self.access_member(&left_provider, &name);
                if self.hits(name_node) {
                    self.result = Some(provider.symbols().to_vec());
                }
                provider
            }
            _ => {
                let children = tree.children(node).to_vec();
                let mut last = SymbolProvider::empty();
                for child in children {
                    last = self.visit(child);
                }
                last
            }
        }
    }

    /// Whether the query node falls within `name_node` (or wraps it).
    fn hits(&self, name_node: NodeId) -> bool {
        let tree = self.unit.tree();
        tree.is_within(self.target, name_node) || tree.is_within(name_node, self.target)
    }

    /// Bare-name resolution: lexical scope chain, then this unit's
    /// imports, then the environment's global symbols. The first
    /// non-empty tier wins.
    fn lookup_name(&self, node: NodeId, name: &str) -> SymbolProvider {
        if let Some(scope_id) = self.unit.lookup_scope_id(node) {
            let matches = self.unit.scopes().lookup_all(scope_id, name);
            if !matches.is_empty() {
                return SymbolProvider::of(matches);
            }
        }

        let imports = self.lookup_import(name);
        if !imports.is_empty() {
            return imports;
        }

        SymbolProvider::of(self.env.global_symbols()).named(name)
    }

    /// Imports resolve to their target class symbol when the qualified
    /// name is known, so member access downstream sees a class.
    fn lookup_import(&self, name: &str) -> SymbolProvider {
        let class_symbols = self.env.class_symbol_map();
        let symbols = self
            .unit
            .imports()
            .into_iter()
            .filter(|import| import.name() == name)
            .map(|import| {
                let target = match &import {
                    Symbol::Import(import_symbol) => {
                        class_symbols.get(&import_symbol.qualified_name).cloned()
                    }
                    _ => None,
                };
                match target {
                    Some(class) => Symbol::Class(class),
                    None => import,
                }
            });
        SymbolProvider::of(symbols)
    }

    /// Member access over a candidate set: requires exactly one
    /// candidate; a class candidate exposes its static members only,
    /// anything else exposes its type's members plus expands.
    fn access_member(&self, left: &SymbolProvider, name: &str) -> SymbolProvider {
        if left.len() != 1 {
            return SymbolProvider::empty();
        }
        let Some(symbol) = left.first() else {
            return SymbolProvider::empty();
        };
        match symbol {
            Symbol::Class(class) => {
                SymbolProvider::of(class.declared_members(self.env))
                    .filter(|member| member.is_static())
                    .named(name)
            }
            other => {
                let ty = other.ty(self.env);
                SymbolProvider::of(ty.members_with_expands(self.env)).named(name)
            }
        }
    }
}
