//! Symbol construction.
//!
//! Builds the concrete symbol for a declaration node on demand during
//! declaration resolution. Types are never computed here: a symbol
//! recomputes its type from its node on every query, so edits are always
//! reflected.

use crate::range::Range;
use crate::resolve::name;
use crate::symbol::{
    BuiltinSymbol, ClassSymbol, ConstructorSymbol, ExpandFunctionSymbol, FunctionSymbol,
    ImportSymbol, Modifier, Operator, OperatorFunctionSymbol, ParameterSpec, ParameterSymbol,
    Symbol, SymbolKind, ThisSymbol, VariableSymbol,
};
use crate::ty::Type;
use std::path::Path;
use std::sync::Arc;
use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};
use zest_parser::token::TokenKind;

fn declaration_ranges(tree: &SyntaxTree, node: NodeId, name_node: Option<NodeId>) -> (Range, Range) {
    let range = Range::of(tree.span(node));
    let selection = name_node.map_or(range, |n| Range::of(tree.span(n)));
    (range, selection)
}

fn modifier_of(tree: &SyntaxTree, node: NodeId) -> Modifier {
    match tree.token_kind(node) {
        Some(TokenKind::Var) => Modifier::Var,
        Some(TokenKind::Val) => Modifier::Val,
        Some(TokenKind::Static) => Modifier::Static,
        Some(TokenKind::Global) => Modifier::Global,
        _ => Modifier::None,
    }
}

/// Import symbol for an `ImportDeclaration` node.
pub fn create_import_symbol(tree: &SyntaxTree, node: NodeId, unit_path: &Path) -> Option<Symbol> {
    let name = name::declared_name(tree, node)?;
    let qualified = tree.child_of_kind(node, NodeKind::QualifiedName)?;
    let qualified_name = tree.text(qualified)?;
    let name_node = tree
        .child_of_kind(node, NodeKind::Alias)
        .and_then(|alias| tree.child_of_kind(alias, NodeKind::SimpleName))
        .or_else(|| tree.children(qualified).last().copied());
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Some(Symbol::Import(Arc::new(ImportSymbol {
        name,
        qualified_name,
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    })))
}

/// Class symbol for a `ClassDeclaration` node.
///
/// The qualified name composes the unit's qualified name with the class
/// name, except in declaration-only units where the unit name itself is
/// the class's qualified name.
pub fn create_class_symbol(
    tree: &SyntaxTree,
    node: NodeId,
    unit_path: &Path,
    unit_qualified_name: &str,
    declaration_unit: bool,
) -> Option<Arc<ClassSymbol>> {
    let name = name::declared_name(tree, node)?;
    let name_node = tree.child_of_kind(node, NodeKind::SimpleName);
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    let qualified_name = if declaration_unit || unit_qualified_name.is_empty() {
        if unit_qualified_name.is_empty() {
            name.clone()
        } else {
            unit_qualified_name.to_string()
        }
    } else {
        format!("{unit_qualified_name}.{name}")
    };
    Some(Arc::new(ClassSymbol {
        name,
        qualified_name,
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    }))
}

/// Variable symbol for a `VariableDeclaration` or `ForeachVariable` node.
pub fn create_variable_symbol(tree: &SyntaxTree, node: NodeId, unit_path: &Path) -> Option<Symbol> {
    let name = name::declared_name(tree, node)?;
    let name_node = tree.child_of_kind(node, NodeKind::SimpleName);
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Some(Symbol::Variable(Arc::new(VariableSymbol {
        name,
        modifier: modifier_of(tree, node),
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    })))
}

/// Parameter symbol for a `FormalParameter` node.
pub fn create_parameter_symbol(tree: &SyntaxTree, node: NodeId, unit_path: &Path) -> Option<Symbol> {
    let name = name::declared_name(tree, node)?;
    let name_node = tree.child_of_kind(node, NodeKind::SimpleName);
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Some(Symbol::Parameter(Arc::new(ParameterSymbol {
        name,
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
        optional: tree.child_of_kind(node, NodeKind::DefaultValue).is_some(),
        vararg: tree.token_kind(node) == Some(TokenKind::DotDotDot),
    })))
}

/// Function symbol for a `FunctionDeclaration` node.
pub fn create_function_symbol(tree: &SyntaxTree, node: NodeId, unit_path: &Path) -> Option<Symbol> {
    let name = name::declared_name(tree, node)?;
    let name_node = tree.child_of_kind(node, NodeKind::SimpleName);
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Some(Symbol::Function(Arc::new(FunctionSymbol {
        name,
        modifier: modifier_of(tree, node),
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    })))
}

/// Expand-function symbol for an `ExpandFunctionDeclaration` node.
pub fn create_expand_function_symbol(
    tree: &SyntaxTree,
    node: NodeId,
    unit_path: &Path,
) -> Option<Symbol> {
    let name = name::declared_name(tree, node)?;
    let op = tree.child_of_kind(node, NodeKind::Operator).and_then(|op_node| {
        let literal = tree.text(op_node)?;
        let params = tree
            .child_of_kind(node, NodeKind::FormalParameterList)
            .map_or(0, |list| tree.children(list).len());
        Operator::from_literal(&literal, params)
    });
    let name_node = tree
        .child_of_kind(node, NodeKind::SimpleName)
        .or_else(|| tree.child_of_kind(node, NodeKind::Operator));
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Some(Symbol::ExpandFunction(Arc::new(ExpandFunctionSymbol {
        name,
        op,
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    })))
}

/// Operator-function symbol for an `OperatorFunctionDeclaration` node.
pub fn create_operator_function_symbol(
    tree: &SyntaxTree,
    node: NodeId,
    unit_path: &Path,
) -> Option<Symbol> {
    let op_node = tree.child_of_kind(node, NodeKind::Operator)?;
    let literal = tree.text(op_node)?;
    let params = tree
        .child_of_kind(node, NodeKind::FormalParameterList)
        .map_or(0, |list| tree.children(list).len());
    let op = Operator::from_literal(&literal, params)?;
    let (range, selection_range) = declaration_ranges(tree, node, Some(op_node));
    Some(Symbol::OperatorFunction(Arc::new(OperatorFunctionSymbol {
        op,
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
    })))
}

/// Constructor symbol for a `ConstructorDeclaration` node.
pub fn create_constructor_symbol(
    tree: &SyntaxTree,
    node: NodeId,
    unit_path: &Path,
    class: Arc<ClassSymbol>,
) -> Symbol {
    let name_node = tree.child_of_kind(node, NodeKind::SimpleName);
    let (range, selection_range) = declaration_ranges(tree, node, name_node);
    Symbol::Constructor(Arc::new(ConstructorSymbol {
        node,
        unit_path: unit_path.to_path_buf(),
        range,
        selection_range,
        class,
    }))
}

/// The implicit `this` of a class scope.
pub fn create_this_symbol(class: Arc<ClassSymbol>) -> Symbol {
    Symbol::This(Arc::new(ThisSymbol { class }))
}

/// The synthetic caster produced when several `as` operators with
/// different targets merge: one caster whose result is the intersection
/// of all individual results.
pub fn create_merged_caster(targets: Vec<Type>) -> Symbol {
    Symbol::Builtin(Arc::new(BuiltinSymbol {
        name: Operator::As.literal().to_string(),
        kind: SymbolKind::Operator,
        modifier: Modifier::None,
        op: Some(Operator::As),
        params: Vec::new(),
        ty: Type::Function {
            params: Vec::new(),
            return_type: Box::new(Type::Intersection(targets)),
        },
    }))
}

/// Builder for the fixed builtin member sets of non-class types.
#[derive(Debug, Default)]
pub struct MembersBuilder {
    symbols: Vec<Symbol>,
}

impl MembersBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a builtin field.
    pub fn variable(mut self, name: &str, ty: Type, modifier: Modifier) -> Self {
        self.symbols.push(Symbol::Builtin(Arc::new(BuiltinSymbol {
            name: name.to_string(),
            kind: SymbolKind::Variable,
            modifier,
            op: None,
            params: Vec::new(),
            ty,
        })));
        self
    }

    /// Add a builtin function.
    pub fn function(mut self, name: &str, return_type: Type, params: &[(&str, Type)]) -> Self {
        self.symbols.push(Symbol::Builtin(Arc::new(BuiltinSymbol {
            name: name.to_string(),
            kind: SymbolKind::Function,
            modifier: Modifier::None,
            op: None,
            params: parameter_specs(params),
            ty: function_type(return_type, params),
        })));
        self
    }

    /// Add a builtin operator.
    pub fn operator(mut self, op: Operator, return_type: Type, params: &[(&str, Type)]) -> Self {
        self.symbols.push(Symbol::Builtin(Arc::new(BuiltinSymbol {
            name: op.literal().to_string(),
            kind: SymbolKind::Operator,
            modifier: Modifier::None,
            op: Some(op),
            params: parameter_specs(params),
            ty: function_type(return_type, params),
        })));
        self
    }

    /// Finish the member list.
    pub fn build(self) -> Vec<Symbol> {
        self.symbols
    }
}

fn parameter_specs(params: &[(&str, Type)]) -> Vec<ParameterSpec> {
    params
        .iter()
        .map(|(name, ty)| ParameterSpec {
            name: (*name).to_string(),
            ty: ty.clone(),
        })
        .collect()
}

fn function_type(return_type: Type, params: &[(&str, Type)]) -> Type {
    Type::Function {
        params: params.iter().map(|(_, ty)| ty.clone()).collect(),
        return_type: Box::new(return_type),
    }
}
