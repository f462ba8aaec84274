//! Declaration resolution.
//!
//! Walks a unit's CST once after parsing: every scope-introducing node
//! gets a [`Scope`](crate::scope::Scope) chained to its enclosing scope,
//! every declaration node gets its symbol, and both are recorded in the
//! unit's annotation tables. Symbols are declared typeless; their types
//! are recomputed per query so the model stays consistent with a tree
//! that is replaced on every keystroke.
//!
//! Normally invoked through [`CompilationUnit::load`](crate::unit::CompilationUnit::load).

use crate::factory;
use crate::scope::{ScopeArena, ScopeId};
use crate::symbol::{ClassSymbol, Symbol};
use rustc_hash::FxHashMap;
use std::path::Path;
use std::sync::Arc;
use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};

/// Build scopes and symbols for one unit.
#[allow(clippy::too_many_arguments)]
pub(crate) fn resolve_declarations(
    tree: &SyntaxTree,
    path: &Path,
    unit_qualified_name: &str,
    declaration_unit: bool,
    scopes: &mut ScopeArena,
    scope_table: &mut FxHashMap<NodeId, ScopeId>,
    symbol_table: &mut FxHashMap<NodeId, Symbol>,
) {
    let mut resolver = DeclarationResolver {
        tree,
        path,
        unit_qualified_name,
        declaration_unit,
        scopes,
        scope_table,
        symbol_table,
        scope_stack: Vec::new(),
        class_stack: Vec::new(),
    };
    resolver.run();
}

struct DeclarationResolver<'a> {
    tree: &'a SyntaxTree,
    path: &'a Path,
    unit_qualified_name: &'a str,
    declaration_unit: bool,
    scopes: &'a mut ScopeArena,
    scope_table: &'a mut FxHashMap<NodeId, ScopeId>,
    symbol_table: &'a mut FxHashMap<NodeId, Symbol>,
    scope_stack: Vec<ScopeId>,
    class_stack: Vec<Arc<ClassSymbol>>,
}

impl<'a> DeclarationResolver<'a> {
    fn run(&mut self) {
        let root = self.tree.root();
        let file_scope = self.scopes.alloc(None);
        self.scope_table.insert(root, file_scope);
        self.scope_stack.push(file_scope);
        self.visit_children(root);
        self.scope_stack.pop();
    }

    fn current_scope(&self) -> ScopeId {
        self.scope_stack.last().copied().unwrap_or(ScopeId(0))
    }

    fn open_scope(&mut self, node: NodeId) {
        let scope = self.scopes.alloc(Some(self.current_scope()));
        self.scope_table.insert(node, scope);
        self.scope_stack.push(scope);
    }

    fn close_scope(&mut self) {
        self.scope_stack.pop();
    }

    fn declare(&mut self, symbol: Symbol, node: NodeId) {
        self.scopes.get_mut(self.current_scope()).add(symbol.clone());
        self.symbol_table.insert(node, symbol);
    }

    fn visit_children(&mut self, node: NodeId) {
        let tree = self.tree;
        for &child in tree.children(node) {
            self.visit(child);
        }
    }

    fn visit(&mut self, node: NodeId) {
        let tree = self.tree;
        match tree.kind(node) {
            NodeKind::ImportDeclaration => {
                // Imports are annotated but not declared into the file
                // scope; name resolution consults them as their own tier
                // after the lexical scopes.
                if let Some(symbol) = factory::create_import_symbol(tree, node, self.path) {
                    self.symbol_table.insert(node, symbol);
                }
            }
            NodeKind::ClassDeclaration => {
                let class = factory::create_class_symbol(
                    tree,
                    node,
                    self.path,
                    self.unit_qualified_name,
                    self.declaration_unit,
                );
                if let Some(class) = &class {
                    self.declare(Symbol::Class(class.clone()), node);
                }
                self.open_scope(node);
                if let Some(class) = class {
                    self.scopes
                        .get_mut(self.current_scope())
                        .add(factory::create_this_symbol(class.clone()));
                    self.class_stack.push(class);
                    self.visit_children(node);
                    self.class_stack.pop();
                } else {
                    self.visit_children(node);
                }
                self.close_scope();
            }
            NodeKind::FunctionDeclaration => {
                if let Some(symbol) = factory::create_function_symbol(tree, node, self.path) {
                    self.declare(symbol, node);
                }
                self.open_scope(node);
                self.visit_children(node);
                self.close_scope();
            }
            NodeKind::ExpandFunctionDeclaration => {
                if let Some(symbol) = factory::create_expand_function_symbol(tree, node, self.path) {
                    self.declare(symbol, node);
                }
                self.open_scope(node);
                self.visit_children(node);
                self.close_scope();
            }
            NodeKind::OperatorFunctionDeclaration => {
                if let Some(symbol) = factory::create_operator_function_symbol(tree, node, self.path)
                {
                    self.declare(symbol, node);
                }
                self.open_scope(node);
                self.visit_children(node);
                self.close_scope();
            }
            NodeKind::ConstructorDeclaration => {
                if let Some(class) = self.class_stack.last().cloned() {
                    let symbol = factory::create_constructor_symbol(tree, node, self.path, class);
                    self.declare(symbol, node);
                }
                self.open_scope(node);
                self.visit_children(node);
                self.close_scope();
            }
            NodeKind::VariableDeclaration | NodeKind::ForeachVariable => {
                if let Some(symbol) = factory::create_variable_symbol(tree, node, self.path) {
                    self.declare(symbol, node);
                }
                self.visit_children(node);
            }
            NodeKind::FormalParameter => {
                if let Some(symbol) = factory::create_parameter_symbol(tree, node, self.path) {
                    self.declare(symbol, node);
                }
                self.visit_children(node);
            }
            NodeKind::BlockStatement | NodeKind::ForeachStatement | NodeKind::FunctionExpr => {
                self.open_scope(node);
                self.visit_children(node);
                self.close_scope();
            }
            _ => self.visit_children(node),
        }
    }
}
