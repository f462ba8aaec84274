//! Static type computation.
//!
//! Dispatches on node kind and recursively resolves subexpressions.
//! Every rule degrades to [`Type::Any`] on ambiguity; a query never
//! fails, because the tool must stay useful on incomplete source.

use crate::env::CompilationEnvironment;
use crate::symbol::Symbol;
use crate::ty::{ClassType, Type};
use crate::unit::CompilationUnit;
use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};
use zest_parser::token::TokenKind;

/// The static type of `node`, or [`Type::Any`] when it cannot be
/// determined.
pub fn type_of(node: NodeId, unit: &CompilationUnit, env: &CompilationEnvironment) -> Type {
    resolve_type(node, unit, env).unwrap_or(Type::Any)
}

fn resolve_type(node: NodeId, unit: &CompilationUnit, env: &CompilationEnvironment) -> Option<Type> {
    let tree = unit.tree();
    match tree.kind(node) {
        // Declarations
        NodeKind::ImportDeclaration | NodeKind::ClassDeclaration => {
            unit.symbol_of(node).map(|symbol| symbol.ty(env))
        }
        NodeKind::FunctionDeclaration
        | NodeKind::ExpandFunctionDeclaration
        | NodeKind::OperatorFunctionDeclaration => Some(function_type(node, unit, env, None)),
        NodeKind::ConstructorDeclaration => {
            let class_type = match unit.symbol_of(node) {
                Some(Symbol::Constructor(constructor)) => {
                    Some(Type::Class(ClassType::new(constructor.class.clone())))
                }
                _ => None,
            };
            Some(function_type(node, unit, env, class_type))
        }
        NodeKind::FunctionExpr => Some(function_type(node, unit, env, None)),
        NodeKind::VariableDeclaration => tree
            .type_literal_child(node)
            .and_then(|literal| resolve_type(literal, unit, env))
            .or_else(|| {
                let initializer = tree.child_of_kind(node, NodeKind::Initializer)?;
                resolve_type(initializer, unit, env)
            }),
        NodeKind::FormalParameter => tree
            .type_literal_child(node)
            .and_then(|literal| resolve_type(literal, unit, env))
            .or_else(|| {
                let default = tree.child_of_kind(node, NodeKind::DefaultValue)?;
                resolve_type(default, unit, env)
            }),
        NodeKind::Initializer | NodeKind::DefaultValue | NodeKind::ReturnType => {
            let child = tree.children(node).first().copied()?;
            resolve_type(child, unit, env)
        }
        NodeKind::ForeachVariable => foreach_variable_type(node, unit, env),

        // Expressions
        NodeKind::AssignmentExpr | NodeKind::BinaryExpr | NodeKind::ParensExpr => {
            let left = tree.children(node).first().copied()?;
            resolve_type(left, unit, env)
        }
        NodeKind::UnaryExpr => {
            let operand = tree.children(node).get(1).copied()?;
            resolve_type(operand, unit, env)
        }
        NodeKind::TernaryExpr => {
            let true_part = tree.children(node).get(1).copied()?;
            resolve_type(true_part, unit, env)
        }
        NodeKind::RangeExpr => Some(Type::IntRange),
        NodeKind::ThisExpr => {
            let class_node = tree
                .ancestors(node)
                .find(|&n| tree.kind(n) == NodeKind::ClassDeclaration)?;
            unit.symbol_of(class_node).map(|symbol| symbol.ty(env))
        }
        NodeKind::LiteralExpr => literal_type(tree, node),
        NodeKind::LocalAccessExpr => {
            let name_node = tree.child_of_kind(node, NodeKind::SimpleName)?;
            let name = tree.text(name_node)?;
            lookup_symbol(node, &name, unit, env).map(|symbol| symbol.ty(env))
        }
        NodeKind::MemberAccessExpr => {
            let left = tree.children(node).first().copied()?;
            let left_type = resolve_type(left, unit, env)?;
            let name_node = tree.child_of_kind(node, NodeKind::SimpleName)?;
            let name = tree.text(name_node)?;
            for member in left_type.members(env) {
                if member.name() == name {
                    return Some(member.ty(env));
                }
            }
            // Unknown members fall back to the receiver type: Zest
            // values can grow members the model cannot see.
            Some(left_type)
        }
        NodeKind::CallExpr => {
            let callee = tree.children(node).first().copied()?;
            match resolve_type(callee, unit, env)? {
                // Overload selection by argument type is not performed
                // here; non-function callees yield no type.
                Type::Function { return_type, .. } => Some(*return_type),
                _ => None,
            }
        }
        NodeKind::MemberIndexExpr => {
            let left = tree.children(node).first().copied()?;
            match resolve_type(left, unit, env)? {
                Type::Array(element) | Type::List(element) => Some(*element),
                Type::Map { value, .. } => Some(*value),
                _ => None,
            }
        }
        NodeKind::ArrayLiteralExpr => {
            let element = tree
                .children(node)
                .first()
                .and_then(|&first| resolve_type(first, unit, env))
                .unwrap_or(Type::Any);
            Some(Type::Array(Box::new(element)))
        }
        NodeKind::MapLiteralExpr => {
            let entry = tree
                .child_of_kind(node, NodeKind::MapEntryList)
                .and_then(|list| tree.children(list).first().copied());
            let (key, value) = match entry {
                Some(entry) => {
                    let key = tree
                        .children(entry)
                        .first()
                        .and_then(|&k| resolve_type(k, unit, env))
                        .unwrap_or(Type::Any);
                    let value = tree
                        .children(entry)
                        .get(1)
                        .and_then(|&v| resolve_type(v, unit, env))
                        .unwrap_or(Type::Any);
                    (key, value)
                }
                None => (Type::Any, Type::Any),
            };
            Some(Type::Map {
                key: Box::new(key),
                value: Box::new(value),
            })
        }
        NodeKind::TypeCastExpr => {
            let literal = tree.type_literal_child(node)?;
            resolve_type(literal, unit, env)
        }

        // Type literals
        NodeKind::PrimitiveType => primitive_type(tree, node),
        NodeKind::ArrayType => {
            let element = tree.children(node).first().copied()?;
            Some(Type::Array(Box::new(type_of(element, unit, env))))
        }
        NodeKind::ListType => {
            let element = tree.children(node).first().copied()?;
            Some(Type::List(Box::new(type_of(element, unit, env))))
        }
        NodeKind::MapType => {
            // Children are [value, key]: `int[string]` maps string to int.
            let value = tree.children(node).first().copied()?;
            let key = tree.children(node).get(1).copied()?;
            Some(Type::Map {
                key: Box::new(type_of(key, unit, env)),
                value: Box::new(type_of(value, unit, env)),
            })
        }
        NodeKind::FunctionType => {
            let params = tree
                .child_of_kind(node, NodeKind::TypeLiteralList)
                .map(|list| {
                    tree.children(list)
                        .iter()
                        .map(|&ty| type_of(ty, unit, env))
                        .collect()
                })
                .unwrap_or_default();
            let return_type = tree
                .children(node)
                .get(1)
                .map(|&ty| type_of(ty, unit, env))
                .unwrap_or(Type::Any);
            Some(Type::Function {
                params,
                return_type: Box::new(return_type),
            })
        }
        NodeKind::ClassType => {
            let name = tree.child_of_kind(node, NodeKind::QualifiedName)?;
            let text = tree.text(name)?;
            resolve_class_name(&text, unit, env)
        }

        _ => None,
    }
}

/// Scope-chain lookup for a name reference: innermost lexical scope
/// first, then this unit's imports, then the environment's global
/// symbols.
fn lookup_symbol(
    node: NodeId,
    name: &str,
    unit: &CompilationUnit,
    env: &CompilationEnvironment,
) -> Option<Symbol> {
    if let Some(scope_id) = unit.lookup_scope_id(node) {
        if let Some(symbol) = unit.scopes().lookup_symbol(scope_id, name) {
            return Some(symbol);
        }
    }
    if let Some(import) = unit.imports().into_iter().find(|i| i.name() == name) {
        return Some(import);
    }
    env.global_symbols()
        .into_iter()
        .find(|symbol| symbol.name() == name)
}

fn function_type(
    node: NodeId,
    unit: &CompilationUnit,
    env: &CompilationEnvironment,
    return_override: Option<Type>,
) -> Type {
    let tree = unit.tree();
    let params = tree
        .child_of_kind(node, NodeKind::FormalParameterList)
        .map(|list| {
            tree.children(list)
                .iter()
                .map(|&param| type_of(param, unit, env))
                .collect()
        })
        .unwrap_or_default();
    let return_type = return_override.unwrap_or_else(|| {
        tree.child_of_kind(node, NodeKind::ReturnType)
            .map(|ret| type_of(ret, unit, env))
            .unwrap_or(Type::Any)
    });
    Type::Function {
        params,
        return_type: Box::new(return_type),
    }
}

fn literal_type(tree: &SyntaxTree, node: NodeId) -> Option<Type> {
    match tree.token_kind(node)? {
        TokenKind::IntLiteral => Some(Type::Int),
        TokenKind::LongLiteral => Some(Type::Long),
        TokenKind::FloatLiteral => Some(Type::Float),
        TokenKind::DoubleLiteral => Some(Type::Double),
        TokenKind::StringLiteral => Some(Type::String),
        TokenKind::True | TokenKind::False => Some(Type::Bool),
        TokenKind::Null => Some(Type::Any),
        _ => None,
    }
}

fn primitive_type(tree: &SyntaxTree, node: NodeId) -> Option<Type> {
    match tree.token_kind(node)? {
        TokenKind::Any => Some(Type::Any),
        TokenKind::Byte => Some(Type::Byte),
        TokenKind::Short => Some(Type::Short),
        TokenKind::Int => Some(Type::Int),
        TokenKind::Long => Some(Type::Long),
        TokenKind::Float => Some(Type::Float),
        TokenKind::Double => Some(Type::Double),
        TokenKind::Bool => Some(Type::Bool),
        TokenKind::StringKw => Some(Type::String),
        TokenKind::Void => Some(Type::Void),
        _ => None,
    }
}

/// Resolve a class-name type literal: classes declared in this unit's
/// file scope first, then imports by simple name, then the
/// environment's qualified-name map.
fn resolve_class_name(
    text: &str,
    unit: &CompilationUnit,
    env: &CompilationEnvironment,
) -> Option<Type> {
    if let Some(scope_id) = unit.scope_id_of(unit.tree().root()) {
        if let Some(symbol) = unit.scopes().lookup_symbol(scope_id, text) {
            return Some(symbol.ty(env));
        }
    }
    if let Some(Symbol::Import(import)) = unit
        .imports()
        .into_iter()
        .find(|import| import.name() == text)
    {
        if let Some(class_type) = env.class_type_map().get(&import.qualified_name) {
            return Some(class_type.clone());
        }
    }
    env.class_type_map().get(text).cloned()
}

/// Foreach loop variables derive their type from the iterated
/// expression.
fn foreach_variable_type(
    node: NodeId,
    unit: &CompilationUnit,
    env: &CompilationEnvironment,
) -> Option<Type> {
    let tree = unit.tree();
    let list = tree.parent(node)?;
    if tree.kind(list) != NodeKind::ForeachVariableList {
        return None;
    }
    let statement = tree.parent(list)?;
    if tree.kind(statement) != NodeKind::ForeachStatement {
        return None;
    }
    let iterable = tree.children(statement).get(1).copied()?;
    let iterable_type = resolve_type(iterable, unit, env)?;
    let variables = tree.children(list);
    let index = variables.iter().position(|&v| v == node)?;
    let count = variables.len();
    match iterable_type {
        Type::IntRange => Some(Type::Int),
        Type::Array(element) | Type::List(element) => Some(*element),
        Type::Map { key, value } => {
            if count == 1 || index == 0 {
                Some(*key)
            } else {
                Some(*value)
            }
        }
        Type::Class(class_type) => {
            if count == 1 {
                let member = find_annotated_member(&class_type, "#foreach", env)?;
                match member.return_type(env)? {
                    Type::List(element) => Some(*element),
                    _ => None,
                }
            } else {
                let member = find_annotated_member(&class_type, "#foreachMap", env)?;
                match member.return_type(env)? {
                    Type::Map { key, value } => {
                        if index == 0 {
                            Some(*key)
                        } else {
                            Some(*value)
                        }
                    }
                    _ => None,
                }
            }
        }
        _ => None,
    }
}

/// A class member carrying the given annotation line (`#foreach`,
/// `#foreachMap`).
fn find_annotated_member(
    class_type: &ClassType,
    annotation: &str,
    env: &CompilationEnvironment,
) -> Option<Symbol> {
    for member in class_type.members(env) {
        let Some(node) = member.node() else {
            continue;
        };
        let Some(path) = member.unit_path() else {
            continue;
        };
        let Some(member_unit) = env.unit(path) else {
            continue;
        };
        let tree = member_unit.tree();
        let annotated = tree
            .child_of_kind(node, NodeKind::Annotation)
            .and_then(|a| tree.text(a))
            .is_some_and(|text| text == annotation);
        if annotated {
            return Some(member);
        }
    }
    None
}
