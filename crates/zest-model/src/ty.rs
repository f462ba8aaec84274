//! Type model for Zest.
//!
//! A closed variant set with a subtype/cast ranking used by member lookup
//! and overload grouping. [`Type::Any`] is the universal top: everything
//! is assignable to it, and every unresolved expression degrades to it.

use crate::env::CompilationEnvironment;
use crate::members;
use crate::symbol::{ClassSymbol, Operator, Symbol};
use rustc_hash::FxHashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Result of a subtype query, ranked `Identity > Inherit > Caster > None`.
///
/// The derived order puts stronger results first, so `a.max(b)` yields
/// the *weaker* of two results (used to cap composite rankings).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum SubtypeResult {
    /// The exact same type.
    Identity,
    /// Structurally inherited (interfaces, the `Any` top).
    Inherit,
    /// Reachable through an implicit cast.
    Caster,
    /// Not a subtype.
    None,
}

impl SubtypeResult {
    /// Whether the query found any relation at all.
    pub fn matches(self) -> bool {
        self != SubtypeResult::None
    }
}

/// A class type: a back-reference to its declaring symbol, never a bare
/// name string.
///
/// Two class types over the same declaration are equal and
/// interchangeable regardless of how they were discovered, which is why
/// equality and hashing go through the declaration's qualified name.
#[derive(Debug, Clone)]
pub struct ClassType {
    symbol: Arc<ClassSymbol>,
}

impl ClassType {
    /// Create a class type for `symbol`.
    pub fn new(symbol: Arc<ClassSymbol>) -> Self {
        Self { symbol }
    }

    /// The declaring class symbol.
    pub fn symbol(&self) -> &Arc<ClassSymbol> {
        &self.symbol
    }

    /// Simple name of the class.
    pub fn name(&self) -> &str {
        &self.symbol.name
    }

    /// Qualified name of the class.
    pub fn qualified_name(&self) -> &str {
        &self.symbol.qualified_name
    }

    /// Interface types the class implements.
    pub fn interfaces(&self, env: &CompilationEnvironment) -> Vec<ClassType> {
        self.symbol.interfaces(env)
    }

    /// Declared members combined with inherited interface members,
    /// deduplicated by the symbol-group identity rules.
    pub fn members(&self, env: &CompilationEnvironment) -> Vec<Symbol> {
        let mut group = crate::provider::SymbolGroup::new();
        let mut visited = FxHashSet::default();
        self.collect_members(env, &mut visited, &mut group);
        group.into_symbols()
    }

    fn collect_members(
        &self,
        env: &CompilationEnvironment,
        visited: &mut FxHashSet<String>,
        group: &mut crate::provider::SymbolGroup,
    ) {
        if !visited.insert(self.symbol.qualified_name.clone()) {
            return;
        }
        for symbol in self.symbol.declared_members(env) {
            group.add(symbol, env);
        }
        for interface in self.interfaces(env) {
            interface.collect_members(env, visited, group);
        }
    }

    /// Whether this class reaches `other` through its interface chain.
    pub fn inherits(&self, other: &ClassType, env: &CompilationEnvironment) -> bool {
        let mut visited = FxHashSet::default();
        self.inherits_inner(other, env, &mut visited)
    }

    fn inherits_inner(
        &self,
        other: &ClassType,
        env: &CompilationEnvironment,
        visited: &mut FxHashSet<String>,
    ) -> bool {
        if !visited.insert(self.symbol.qualified_name.clone()) {
            return false;
        }
        self.interfaces(env)
            .iter()
            .any(|interface| interface == other || interface.inherits_inner(other, env, visited))
    }
}

impl PartialEq for ClassType {
    fn eq(&self, other: &Self) -> bool {
        self.symbol.qualified_name == other.symbol.qualified_name
    }
}

impl Eq for ClassType {}

impl Hash for ClassType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.symbol.qualified_name.hash(state);
    }
}

/// The static type of a Zest expression or declaration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Type {
    /// The universal top; also the fallback for anything unresolved.
    Any,
    /// `byte`
    Byte,
    /// `short`
    Short,
    /// `int`
    Int,
    /// `long`
    Long,
    /// `float`
    Float,
    /// `double`
    Double,
    /// `bool`
    Bool,
    /// `string`
    String,
    /// `void`
    Void,
    /// The type of `a .. b` range expressions.
    IntRange,
    /// `T[]`
    Array(Box<Type>),
    /// `[T]`
    List(Box<Type>),
    /// `V[K]`
    Map {
        /// Key type.
        key: Box<Type>,
        /// Value type.
        value: Box<Type>,
    },
    /// One entry of a map's `entrySet`.
    MapEntry {
        /// Key type.
        key: Box<Type>,
        /// Value type.
        value: Box<Type>,
    },
    /// `function(T1,T2)R`
    Function {
        /// Parameter types.
        params: Vec<Type>,
        /// Return type.
        return_type: Box<Type>,
    },
    /// A declared class.
    Class(ClassType),
    /// Simultaneous result of several overlapping `as` casters.
    Intersection(Vec<Type>),
}

impl Type {
    /// Whether this is one of the numeric scalar types.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Type::Byte | Type::Short | Type::Int | Type::Long | Type::Float | Type::Double
        )
    }

    /// Whether this is a function type.
    pub fn is_function(&self) -> bool {
        matches!(self, Type::Function { .. })
    }

    /// Whether this is a class type.
    pub fn is_class(&self) -> bool {
        matches!(self, Type::Class(_))
    }

    /// The class type, if this is one.
    pub fn as_class(&self) -> Option<&ClassType> {
        match self {
            Type::Class(class_type) => Some(class_type),
            _ => None,
        }
    }

    /// Members usable via `.` syntax on a value of this type.
    ///
    /// Builtin variants carry fixed member sets; class types combine
    /// declared and inherited interface members.
    pub fn members(&self, env: &CompilationEnvironment) -> Vec<Symbol> {
        members::members_of(self, env)
    }

    /// Members including every applicable `expand` extension member.
    pub fn members_with_expands(&self, env: &CompilationEnvironment) -> Vec<Symbol> {
        let mut group = crate::provider::SymbolGroup::new();
        for symbol in self.members(env) {
            group.add(symbol, env);
        }
        for symbol in env.expand_members(self) {
            group.add(symbol, env);
        }
        group.into_symbols()
    }

    /// Rank how a value of this type can stand in for `other`.
    pub fn subtype_of(&self, other: &Type, env: &CompilationEnvironment) -> SubtypeResult {
        if self == other {
            return SubtypeResult::Identity;
        }
        if matches!(other, Type::Any) {
            return SubtypeResult::Inherit;
        }
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => SubtypeResult::Caster,
            (a, Type::String) if a.is_numeric() || matches!(a, Type::Bool) => SubtypeResult::Caster,

            (Type::List(a), Type::List(b)) | (Type::Array(a), Type::Array(b)) => {
                a.subtype_of(b, env)
            }
            // Lists and arrays convert into each other when the element
            // relation holds, capped at caster strength.
            (Type::List(a), Type::Array(b)) | (Type::Array(a), Type::List(b)) => {
                a.subtype_of(b, env).max(SubtypeResult::Caster)
            }

            (Type::Map { key: k1, value: v1 }, Type::Map { key: k2, value: v2 }) => {
                if k1 == k2 {
                    v1.subtype_of(v2, env)
                } else {
                    SubtypeResult::None
                }
            }
            (
                Type::MapEntry { key: k1, value: v1 },
                Type::MapEntry { key: k2, value: v2 },
            ) => k1.subtype_of(k2, env).max(v1.subtype_of(v2, env)),

            (
                Type::Function { params: p1, return_type: r1 },
                Type::Function { params: p2, return_type: r2 },
            ) => {
                if p1.len() != p2.len() {
                    return SubtypeResult::None;
                }
                let mut rank = r1.subtype_of(r2, env);
                for (a, b) in p1.iter().zip(p2.iter()) {
                    rank = rank.max(a.subtype_of(b, env));
                }
                rank
            }

            (Type::Class(sub), Type::Class(sup)) => {
                if sub.inherits(sup, env) {
                    SubtypeResult::Inherit
                } else {
                    self.caster_rank(other, env)
                }
            }

            (Type::Intersection(parts), _) => parts
                .iter()
                .map(|part| part.subtype_of(other, env))
                .min()
                .unwrap_or(SubtypeResult::None),

            _ => self.caster_rank(other, env),
        }
    }

    /// `Caster` when one of this type's own `as` operator members
    /// targets `other` (directly or through an intersection result).
    fn caster_rank(&self, other: &Type, env: &CompilationEnvironment) -> SubtypeResult {
        for member in self.members(env) {
            if member.operator() != Some(Operator::As) {
                continue;
            }
            match member.return_type(env) {
                Some(ref target) if target == other => return SubtypeResult::Caster,
                Some(Type::Intersection(parts)) if parts.contains(other) => {
                    return SubtypeResult::Caster;
                }
                _ => {}
            }
        }
        SubtypeResult::None
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Type::Any => write!(f, "any"),
            Type::Byte => write!(f, "byte"),
            Type::Short => write!(f, "short"),
            Type::Int => write!(f, "int"),
            Type::Long => write!(f, "long"),
            Type::Float => write!(f, "float"),
            Type::Double => write!(f, "double"),
            Type::Bool => write!(f, "bool"),
            Type::String => write!(f, "string"),
            Type::Void => write!(f, "void"),
            Type::IntRange => write!(f, "intRange"),
            Type::Array(element) => write!(f, "{element}[]"),
            Type::List(element) => write!(f, "[{element}]"),
            Type::Map { key, value } => write!(f, "{value}[{key}]"),
            Type::MapEntry { key, value } => write!(f, "entry<{key},{value}>"),
            Type::Function { params, return_type } => {
                write!(f, "function(")?;
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{param}")?;
                }
                write!(f, "){return_type}")
            }
            Type::Class(class_type) => write!(f, "{}", class_type.name()),
            Type::Intersection(parts) => {
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, " & ")?;
                    }
                    write!(f, "{part}")?;
                }
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_composites() {
        let list = Type::List(Box::new(Type::Int));
        assert_eq!(list.to_string(), "[int]");

        let array = Type::Array(Box::new(Type::String));
        assert_eq!(array.to_string(), "string[]");

        let map = Type::Map {
            key: Box::new(Type::String),
            value: Box::new(Type::Int),
        };
        assert_eq!(map.to_string(), "int[string]");

        let function = Type::Function {
            params: vec![Type::Int, Type::Bool],
            return_type: Box::new(Type::Void),
        };
        assert_eq!(function.to_string(), "function(int,bool)void");
    }

    #[test]
    fn subtype_result_order_prefers_stronger() {
        assert!(SubtypeResult::Identity < SubtypeResult::Inherit);
        assert!(SubtypeResult::Inherit < SubtypeResult::Caster);
        assert!(SubtypeResult::Caster < SubtypeResult::None);
        assert_eq!(
            SubtypeResult::Identity.max(SubtypeResult::Caster),
            SubtypeResult::Caster
        );
    }
}
