//! Zest Semantic Code Model
//!
//! The semantic core behind Zest's editor tooling. Given source files
//! parsed into concrete syntax trees by `zest-parser`, this crate builds
//! scopes and symbols, infers a static type for every node, resolves
//! names (including qualified names, member access and `expand` extension
//! members) across file boundaries, and ranks subtype/cast queries for
//! member lookup.
//!
//! The model is deliberately best-effort: Zest is loosely typed and the
//! sources being analyzed are usually mid-edit, so every query degrades
//! to [`ty::Type::Any`] or an empty symbol list instead of failing.
//!
//! # Usage
//!
//! ```ignore
//! use zest_model::env::CompilationEnvironment;
//! use zest_model::resolve;
//!
//! let mut env = CompilationEnvironment::new("scripts");
//! env.load_unit("scripts/box.zest", source);
//!
//! let unit = env.unit("scripts/box.zest").unwrap();
//! let node = unit.tree().node_at(line, column);
//! let symbols = resolve::lookup_symbols(node, unit, &env);
//! let ty = resolve::type_of(node, unit, &env);
//! ```

#![warn(missing_docs)]

pub mod range;
pub mod ty;
pub mod members;
pub mod symbol;
pub mod factory;
pub mod scope;
pub mod provider;
pub mod resolve;
pub mod unit;
pub mod env;

pub use range::{Position, Range};
pub use ty::{ClassType, SubtypeResult, Type};
pub use symbol::{Modifier, Operator, Symbol, SymbolKind};
pub use scope::{Scope, ScopeId};
pub use provider::{SymbolGroup, SymbolProvider};
pub use unit::CompilationUnit;
pub use env::{CompilationEnvironment, SharedEnvironment};
