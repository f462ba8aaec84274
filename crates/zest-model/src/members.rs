//! Builtin member sets of the non-class type variants.
//!
//! Members that cannot be expressed in Zest source (collection length,
//! numeric operators) are represented as builtin symbols, mirrored after
//! what the host runtime exposes.

use crate::env::CompilationEnvironment;
use crate::factory::MembersBuilder;
use crate::symbol::{Modifier, Operator, Symbol};
use crate::ty::Type;
use once_cell::sync::Lazy;

static BOOL_MEMBERS: Lazy<Vec<Symbol>> = Lazy::new(|| {
    MembersBuilder::new()
        .operator(Operator::And, Type::Bool, &[("val", Type::Bool)])
        .operator(Operator::Or, Type::Bool, &[("val", Type::Bool)])
        .operator(Operator::Xor, Type::Bool, &[("val", Type::Bool)])
        .operator(Operator::Not, Type::Bool, &[])
        .operator(Operator::Cat, Type::String, &[("str", Type::String)])
        .build()
});

static STRING_MEMBERS: Lazy<Vec<Symbol>> = Lazy::new(|| {
    MembersBuilder::new()
        .variable("length", Type::Int, Modifier::Val)
        .operator(Operator::Cat, Type::String, &[("str", Type::String)])
        .operator(Operator::IndexGet, Type::String, &[("index", Type::Int)])
        .operator(Operator::Contains, Type::Bool, &[("str", Type::String)])
        .build()
});

static INT_RANGE_MEMBERS: Lazy<Vec<Symbol>> = Lazy::new(|| {
    MembersBuilder::new()
        .variable("from", Type::Int, Modifier::Val)
        .variable("to", Type::Int, Modifier::Val)
        .build()
});

/// Members usable via `.` syntax on a value of `ty`.
pub(crate) fn members_of(ty: &Type, env: &CompilationEnvironment) -> Vec<Symbol> {
    match ty {
        Type::Any | Type::Void | Type::Function { .. } | Type::Intersection(_) => Vec::new(),
        Type::Bool => BOOL_MEMBERS.clone(),
        Type::String => STRING_MEMBERS.clone(),
        Type::IntRange => INT_RANGE_MEMBERS.clone(),
        numeric if numeric.is_numeric() => numeric_members(numeric),
        Type::Array(element) => array_members(element),
        Type::List(element) => list_members(element),
        Type::Map { key, value } => map_members(key, value),
        Type::MapEntry { key, value } => MembersBuilder::new()
            .variable("key", (**key).clone(), Modifier::Val)
            .variable("value", (**value).clone(), Modifier::Val)
            .build(),
        Type::Class(class_type) => class_type.members(env),
        _ => Vec::new(),
    }
}

fn numeric_members(ty: &Type) -> Vec<Symbol> {
    MembersBuilder::new()
        .operator(Operator::Add, ty.clone(), &[("val", ty.clone())])
        .operator(Operator::Sub, ty.clone(), &[("val", ty.clone())])
        .operator(Operator::Mul, ty.clone(), &[("val", ty.clone())])
        .operator(Operator::Div, ty.clone(), &[("val", ty.clone())])
        .operator(Operator::Mod, ty.clone(), &[("val", ty.clone())])
        .operator(Operator::Neg, ty.clone(), &[])
        .operator(Operator::Cat, Type::String, &[("str", Type::String)])
        .build()
}

fn array_members(element: &Type) -> Vec<Symbol> {
    MembersBuilder::new()
        .variable("length", Type::Int, Modifier::Val)
        .operator(Operator::IndexGet, element.clone(), &[("index", Type::Int)])
        .operator(
            Operator::IndexSet,
            element.clone(),
            &[("index", Type::Int), ("element", element.clone())],
        )
        .operator(
            Operator::Add,
            Type::Array(Box::new(element.clone())),
            &[("element", element.clone())],
        )
        .build()
}

fn list_members(element: &Type) -> Vec<Symbol> {
    MembersBuilder::new()
        .variable("length", Type::Int, Modifier::Val)
        .function("remove", Type::Void, &[("index", Type::Int)])
        .operator(Operator::IndexGet, element.clone(), &[("index", Type::Int)])
        .operator(
            Operator::IndexSet,
            element.clone(),
            &[("index", Type::Int), ("element", element.clone())],
        )
        .operator(
            Operator::Add,
            Type::List(Box::new(element.clone())),
            &[("element", element.clone())],
        )
        .build()
}

fn map_members(key: &Type, value: &Type) -> Vec<Symbol> {
    let key_array = Type::Array(Box::new(key.clone()));
    let value_array = Type::Array(Box::new(value.clone()));
    let entry_array = Type::Array(Box::new(Type::MapEntry {
        key: Box::new(key.clone()),
        value: Box::new(value.clone()),
    }));
    MembersBuilder::new()
        .variable("length", Type::Int, Modifier::Val)
        .variable("keys", key_array.clone(), Modifier::Val)
        .variable("keySet", key_array, Modifier::Val)
        .variable("values", value_array.clone(), Modifier::Val)
        .variable("valueSet", value_array, Modifier::Val)
        .variable("entrySet", entry_array, Modifier::Val)
        .operator(Operator::IndexGet, value.clone(), &[("key", key.clone())])
        .operator(
            Operator::IndexSet,
            value.clone(),
            &[("key", key.clone()), ("value", value.clone())],
        )
        .build()
}
