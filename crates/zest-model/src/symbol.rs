//! Symbol model for Zest.
//!
//! Symbols are a closed variant set ([`Symbol`]); each variant carries
//! only the fields it needs, and the shared contract (name, kind,
//! modifier, type, ranges) dispatches on the tag.
//!
//! Declared symbols never store their type: it is recomputed per query
//! from the owning CST node, so an edited tree is always reflected in the
//! next answer. Builtin symbols (collection members, numeric operators,
//! the implicit `this`) are constructed from name/type tuples and have no
//! source location.

use crate::env::CompilationEnvironment;
use crate::range::Range;
use crate::resolve;
use crate::ty::{ClassType, Type};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zest_parser::cst::{NodeId, NodeKind};

/// Symbol kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    /// An import declaration.
    Import,
    /// A class declaration.
    Class,
    /// A variable (including foreach loop variables and `this`).
    Variable,
    /// A formal parameter.
    Parameter,
    /// A function, expand function or constructor.
    Function,
    /// An operator function.
    Operator,
    /// No particular kind.
    None,
}

/// Declaration modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Modifier {
    /// `var` - mutable variable.
    Var,
    /// `val` - immutable variable.
    Val,
    /// `static` - class-level member.
    Static,
    /// `global` - exported across the whole environment.
    Global,
    /// `expand` - extension member.
    Expand,
    /// No modifier.
    None,
}

/// Operator of an operator-function symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// `+`
    Add,
    /// `-` (binary)
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
    /// `~` string concat
    Cat,
    /// `==`
    Equals,
    /// `!=`
    NotEquals,
    /// `<`
    Less,
    /// `>`
    Greater,
    /// `<=`
    LessEquals,
    /// `>=`
    GreaterEquals,
    /// `in` / `has` containment
    Contains,
    /// `[]` index read
    IndexGet,
    /// `[]=` index write
    IndexSet,
    /// `..` range construction
    Range,
    /// `as` implicit/explicit cast
    As,
    /// `!` (unary)
    Not,
    /// `-` (unary)
    Neg,
    /// `&`
    And,
    /// `|`
    Or,
    /// `^`
    Xor,
}

impl Operator {
    /// The source literal of this operator.
    pub fn literal(self) -> &'static str {
        match self {
            Operator::Add => "+",
            Operator::Sub => "-",
            Operator::Mul => "*",
            Operator::Div => "/",
            Operator::Mod => "%",
            Operator::Cat => "~",
            Operator::Equals => "==",
            Operator::NotEquals => "!=",
            Operator::Less => "<",
            Operator::Greater => ">",
            Operator::LessEquals => "<=",
            Operator::GreaterEquals => ">=",
            Operator::Contains => "in",
            Operator::IndexGet => "[]",
            Operator::IndexSet => "[]=",
            Operator::Range => "..",
            Operator::As => "as",
            Operator::Not => "!",
            Operator::Neg => "-",
            Operator::And => "&",
            Operator::Or => "|",
            Operator::Xor => "^",
        }
    }

    /// Map an operator literal and parameter count to an operator.
    ///
    /// `-` and `!` are unary when declared with no parameters (the
    /// receiver is implicit).
    pub fn from_literal(literal: &str, params: usize) -> Option<Operator> {
        let op = match literal {
            "+" => Operator::Add,
            "-" if params == 0 => Operator::Neg,
            "-" => Operator::Sub,
            "*" => Operator::Mul,
            "/" => Operator::Div,
            "%" => Operator::Mod,
            "~" => Operator::Cat,
            "==" => Operator::Equals,
            "!=" => Operator::NotEquals,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "<=" => Operator::LessEquals,
            ">=" => Operator::GreaterEquals,
            "in" | "has" => Operator::Contains,
            "[]" => Operator::IndexGet,
            "[]=" => Operator::IndexSet,
            ".." => Operator::Range,
            "as" => Operator::As,
            "!" => Operator::Not,
            "&" => Operator::And,
            "|" => Operator::Or,
            "^" => Operator::Xor,
            _ => return None,
        };
        Some(op)
    }
}

/// An import declaration symbol.
#[derive(Debug, Clone)]
pub struct ImportSymbol {
    /// Alias, or the last segment of the imported qualified name.
    pub name: String,
    /// The imported qualified name.
    pub qualified_name: String,
    /// The import declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
}

/// A class declaration symbol.
#[derive(Debug, Clone)]
pub struct ClassSymbol {
    /// Declared simple name.
    pub name: String,
    /// Environment-wide qualified name.
    pub qualified_name: String,
    /// The class declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
}

impl ClassSymbol {
    /// Members declared directly in the class body.
    pub fn declared_members(&self, env: &CompilationEnvironment) -> Vec<Symbol> {
        let Some(unit) = env.unit(&self.unit_path) else {
            return Vec::new();
        };
        let Some(scope) = unit.scope_of(self.node) else {
            return Vec::new();
        };
        scope
            .symbols()
            .iter()
            .filter(|symbol| symbol.node().is_some())
            .cloned()
            .collect()
    }

    /// Interface types this class implements.
    ///
    /// Interface names that do not resolve to a known class are silently
    /// skipped; a partially-broken declaration still yields its other
    /// interfaces.
    pub fn interfaces(&self, env: &CompilationEnvironment) -> Vec<ClassType> {
        let Some(unit) = env.unit(&self.unit_path) else {
            return Vec::new();
        };
        let tree = unit.tree();
        let Some(list) = tree.child_of_kind(self.node, NodeKind::InterfaceList) else {
            return Vec::new();
        };
        let class_types = env.class_type_map();
        let mut interfaces = Vec::new();
        for &name_node in tree.children(list) {
            let Some(text) = tree.text(name_node) else {
                continue;
            };
            let resolved = unit
                .imports()
                .into_iter()
                .find(|import| import.name() == text)
                .and_then(|import| match import {
                    Symbol::Import(import) => class_types.get(&import.qualified_name).cloned(),
                    _ => None,
                })
                .or_else(|| class_types.get(&text).cloned());
            if let Some(Type::Class(class_type)) = resolved {
                interfaces.push(class_type);
            }
        }
        interfaces
    }
}

/// A variable declaration symbol (also used for foreach loop variables).
#[derive(Debug, Clone)]
pub struct VariableSymbol {
    /// Declared name.
    pub name: String,
    /// Declaration modifier.
    pub modifier: Modifier,
    /// The declaring node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
}

/// A formal parameter symbol.
#[derive(Debug, Clone)]
pub struct ParameterSymbol {
    /// Declared name.
    pub name: String,
    /// The formal parameter node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
    /// Whether the parameter has a default value.
    pub optional: bool,
    /// Whether the parameter is a vararg.
    pub vararg: bool,
}

/// A function declaration symbol.
#[derive(Debug, Clone)]
pub struct FunctionSymbol {
    /// Declared name.
    pub name: String,
    /// Declaration modifier.
    pub modifier: Modifier,
    /// The function declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
}

/// An `expand` extension function symbol.
#[derive(Debug, Clone)]
pub struct ExpandFunctionSymbol {
    /// Declared name (the operator literal for operator expands).
    pub name: String,
    /// Operator, when this expand declares one (e.g. an `as` caster).
    pub op: Option<Operator>,
    /// The expand declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Name-token range.
    pub selection_range: Range,
}

impl ExpandFunctionSymbol {
    /// The type this expand function extends.
    pub fn expanding_type(&self, env: &CompilationEnvironment) -> Option<Type> {
        let unit = env.unit(&self.unit_path)?;
        let type_literal = unit.tree().type_literal_child(self.node)?;
        Some(resolve::type_of(type_literal, unit, env))
    }
}

/// An operator function declared in a class body.
#[derive(Debug, Clone)]
pub struct OperatorFunctionSymbol {
    /// The declared operator.
    pub op: Operator,
    /// The operator declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Operator-token range.
    pub selection_range: Range,
}

/// A constructor symbol.
#[derive(Debug, Clone)]
pub struct ConstructorSymbol {
    /// The constructor declaration node.
    pub node: NodeId,
    /// Path of the declaring unit.
    pub unit_path: PathBuf,
    /// Whole-declaration range.
    pub range: Range,
    /// Keyword-token range.
    pub selection_range: Range,
    /// The class declaring this constructor.
    pub class: Arc<ClassSymbol>,
}

/// The implicit `this` of a class scope.
#[derive(Debug, Clone)]
pub struct ThisSymbol {
    /// The enclosing class.
    pub class: Arc<ClassSymbol>,
}

/// Parameter of a builtin executable symbol.
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    /// Parameter name.
    pub name: String,
    /// Parameter type.
    pub ty: Type,
}

/// A location-free builtin symbol (collection members, numeric
/// operators, merged casters).
#[derive(Debug, Clone)]
pub struct BuiltinSymbol {
    /// Symbol name (operator literal for operators).
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Modifier (`Val` for builtin fields).
    pub modifier: Modifier,
    /// Operator, for operator symbols.
    pub op: Option<Operator>,
    /// Parameters, for executable symbols.
    pub params: Vec<ParameterSpec>,
    /// The symbol's type (a function type for executables).
    pub ty: Type,
}

/// A symbol: one declared or builtin named entity.
#[derive(Debug, Clone)]
pub enum Symbol {
    /// Import declaration.
    Import(Arc<ImportSymbol>),
    /// Class declaration.
    Class(Arc<ClassSymbol>),
    /// Variable declaration.
    Variable(Arc<VariableSymbol>),
    /// Formal parameter.
    Parameter(Arc<ParameterSymbol>),
    /// Function declaration.
    Function(Arc<FunctionSymbol>),
    /// Expand function declaration.
    ExpandFunction(Arc<ExpandFunctionSymbol>),
    /// Operator function declaration.
    OperatorFunction(Arc<OperatorFunctionSymbol>),
    /// Constructor declaration.
    Constructor(Arc<ConstructorSymbol>),
    /// Implicit `this`.
    This(Arc<ThisSymbol>),
    /// Location-free builtin.
    Builtin(Arc<BuiltinSymbol>),
}

impl Symbol {
    /// The symbol's name.
    pub fn name(&self) -> &str {
        match self {
            Symbol::Import(s) => &s.name,
            Symbol::Class(s) => &s.name,
            Symbol::Variable(s) => &s.name,
            Symbol::Parameter(s) => &s.name,
            Symbol::Function(s) => &s.name,
            Symbol::ExpandFunction(s) => &s.name,
            Symbol::OperatorFunction(s) => s.op.literal(),
            Symbol::Constructor(_) => "constructor",
            Symbol::This(_) => "this",
            Symbol::Builtin(s) => &s.name,
        }
    }

    /// The symbol's kind.
    pub fn kind(&self) -> SymbolKind {
        match self {
            Symbol::Import(_) => SymbolKind::Import,
            Symbol::Class(_) => SymbolKind::Class,
            Symbol::Variable(_) | Symbol::This(_) => SymbolKind::Variable,
            Symbol::Parameter(_) => SymbolKind::Parameter,
            Symbol::Function(_) | Symbol::ExpandFunction(_) | Symbol::Constructor(_) => {
                SymbolKind::Function
            }
            Symbol::OperatorFunction(_) => SymbolKind::Operator,
            Symbol::Builtin(s) => s.kind,
        }
    }

    /// The symbol's modifier.
    pub fn modifier(&self) -> Modifier {
        match self {
            Symbol::Import(_) | Symbol::Class(_) => Modifier::None,
            Symbol::Variable(s) => s.modifier,
            Symbol::Parameter(_) => Modifier::None,
            Symbol::Function(s) => s.modifier,
            Symbol::ExpandFunction(_) => Modifier::Expand,
            Symbol::OperatorFunction(_) | Symbol::Constructor(_) => Modifier::None,
            Symbol::This(_) => Modifier::Val,
            Symbol::Builtin(s) => s.modifier,
        }
    }

    /// Whether the symbol carries the given modifier.
    pub fn is_modified_by(&self, modifier: Modifier) -> bool {
        self.modifier() == modifier
    }

    /// Whether the symbol is `static`.
    pub fn is_static(&self) -> bool {
        self.is_modified_by(Modifier::Static)
    }

    /// Whether the symbol is `global`.
    pub fn is_global(&self) -> bool {
        self.is_modified_by(Modifier::Global)
    }

    /// The symbol's static type, recomputed from its declaration.
    ///
    /// Symbols whose declaring unit has been removed from the
    /// environment degrade to [`Type::Any`].
    pub fn ty(&self, env: &CompilationEnvironment) -> Type {
        match self {
            Symbol::Import(s) => env
                .class_type_map()
                .get(&s.qualified_name)
                .cloned()
                .unwrap_or(Type::Void),
            Symbol::Class(s) => Type::Class(ClassType::new(s.clone())),
            Symbol::Variable(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::Parameter(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::Function(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::ExpandFunction(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::OperatorFunction(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::Constructor(s) => self.declared_type(&s.unit_path, s.node, env),
            Symbol::This(s) => Type::Class(ClassType::new(s.class.clone())),
            Symbol::Builtin(s) => s.ty.clone(),
        }
    }

    fn declared_type(&self, unit_path: &Path, node: NodeId, env: &CompilationEnvironment) -> Type {
        match env.unit(unit_path) {
            Some(unit) => resolve::type_of(node, unit, env),
            None => Type::Any,
        }
    }

    /// Whether the symbol is callable (relevant for overload grouping).
    pub fn is_executable(&self) -> bool {
        match self {
            Symbol::Function(_)
            | Symbol::ExpandFunction(_)
            | Symbol::OperatorFunction(_)
            | Symbol::Constructor(_) => true,
            Symbol::Builtin(s) => matches!(s.kind, SymbolKind::Function | SymbolKind::Operator),
            _ => false,
        }
    }

    /// The operator of an operator-function symbol.
    pub fn operator(&self) -> Option<Operator> {
        match self {
            Symbol::OperatorFunction(s) => Some(s.op),
            Symbol::ExpandFunction(s) => s.op,
            Symbol::Builtin(s) => s.op,
            _ => None,
        }
    }

    /// Parameter types of an executable symbol.
    pub fn parameter_types(&self, env: &CompilationEnvironment) -> Vec<Type> {
        match self.ty(env) {
            Type::Function { params, .. } => params,
            _ => Vec::new(),
        }
    }

    /// Return type of an executable symbol.
    pub fn return_type(&self, env: &CompilationEnvironment) -> Option<Type> {
        match self.ty(env) {
            Type::Function { return_type, .. } => Some(*return_type),
            _ => None,
        }
    }

    /// The declaring CST node, for source-anchored symbols.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            Symbol::Import(s) => Some(s.node),
            Symbol::Class(s) => Some(s.node),
            Symbol::Variable(s) => Some(s.node),
            Symbol::Parameter(s) => Some(s.node),
            Symbol::Function(s) => Some(s.node),
            Symbol::ExpandFunction(s) => Some(s.node),
            Symbol::OperatorFunction(s) => Some(s.node),
            Symbol::Constructor(s) => Some(s.node),
            Symbol::This(_) | Symbol::Builtin(_) => None,
        }
    }

    /// Path of the declaring unit, for source-anchored symbols.
    pub fn unit_path(&self) -> Option<&Path> {
        match self {
            Symbol::Import(s) => Some(&s.unit_path),
            Symbol::Class(s) => Some(&s.unit_path),
            Symbol::Variable(s) => Some(&s.unit_path),
            Symbol::Parameter(s) => Some(&s.unit_path),
            Symbol::Function(s) => Some(&s.unit_path),
            Symbol::ExpandFunction(s) => Some(&s.unit_path),
            Symbol::OperatorFunction(s) => Some(&s.unit_path),
            Symbol::Constructor(s) => Some(&s.unit_path),
            Symbol::This(_) | Symbol::Builtin(_) => None,
        }
    }

    /// Whole-declaration range, for source-anchored symbols.
    pub fn range(&self) -> Option<Range> {
        match self {
            Symbol::Import(s) => Some(s.range),
            Symbol::Class(s) => Some(s.range),
            Symbol::Variable(s) => Some(s.range),
            Symbol::Parameter(s) => Some(s.range),
            Symbol::Function(s) => Some(s.range),
            Symbol::ExpandFunction(s) => Some(s.range),
            Symbol::OperatorFunction(s) => Some(s.range),
            Symbol::Constructor(s) => Some(s.range),
            Symbol::This(_) | Symbol::Builtin(_) => None,
        }
    }

    /// Name-token range, for source-anchored symbols.
    pub fn selection_range(&self) -> Option<Range> {
        match self {
            Symbol::Import(s) => Some(s.selection_range),
            Symbol::Class(s) => Some(s.selection_range),
            Symbol::Variable(s) => Some(s.selection_range),
            Symbol::Parameter(s) => Some(s.selection_range),
            Symbol::Function(s) => Some(s.selection_range),
            Symbol::ExpandFunction(s) => Some(s.selection_range),
            Symbol::OperatorFunction(s) => Some(s.selection_range),
            Symbol::Constructor(s) => Some(s.selection_range),
            Symbol::This(_) | Symbol::Builtin(_) => None,
        }
    }
}
