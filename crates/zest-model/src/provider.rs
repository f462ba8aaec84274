//! Overload-aware symbol collections.
//!
//! [`SymbolProvider`] is the filterable view the resolvers thread through
//! a lookup; [`SymbolGroup`] applies the merge rules whenever symbols
//! from several sources are combined:
//!
//! - fields are keyed by name, first occurrence wins;
//! - executables are keyed by `(name, parameter types, kind)`, so
//!   overloads by arity or parameter type coexist while identical
//!   redeclarations collapse;
//! - `as` casters are never keyed: every caster with a distinct target
//!   folds into one synthetic caster returning the intersection of all
//!   targets.

use crate::env::CompilationEnvironment;
use crate::factory;
use crate::symbol::{Operator, Symbol, SymbolKind};
use crate::ty::Type;
use rustc_hash::FxHashSet;

/// A filterable sequence of symbol candidates.
#[derive(Debug, Clone, Default)]
pub struct SymbolProvider {
    symbols: Vec<Symbol>,
}

impl SymbolProvider {
    /// The empty provider.
    pub fn empty() -> Self {
        Self::default()
    }

    /// A provider over the given symbols.
    pub fn of(symbols: impl IntoIterator<Item = Symbol>) -> Self {
        Self {
            symbols: symbols.into_iter().collect(),
        }
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// Whether there are no candidates.
    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// The first candidate.
    pub fn first(&self) -> Option<&Symbol> {
        self.symbols.first()
    }

    /// The candidates as a slice.
    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    /// Consume into the candidate list.
    pub fn into_symbols(self) -> Vec<Symbol> {
        self.symbols
    }

    /// Keep only candidates matching `predicate`.
    pub fn filter(self, predicate: impl Fn(&Symbol) -> bool) -> Self {
        Self {
            symbols: self.symbols.into_iter().filter(|s| predicate(s)).collect(),
        }
    }

    /// Keep only candidates with the given name.
    pub fn named(self, name: &str) -> Self {
        self.filter(|symbol| symbol.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct ExecutableKey {
    name: String,
    params: Vec<Type>,
    kind: SymbolKind,
}

/// The dedup/merge collection behind member and overload grouping.
#[derive(Debug, Default)]
pub struct SymbolGroup {
    symbols: Vec<Symbol>,
    field_names: FxHashSet<String>,
    executable_keys: FxHashSet<ExecutableKey>,
    first_caster: Option<Symbol>,
    caster_targets: Vec<Type>,
}

impl SymbolGroup {
    /// Create an empty group.
    pub fn new() -> Self {
        Self::default()
    }

    /// A group over the given symbols.
    pub fn of(symbols: impl IntoIterator<Item = Symbol>, env: &CompilationEnvironment) -> Self {
        let mut group = Self::new();
        group.add_all(symbols, env);
        group
    }

    /// Add one symbol, applying the merge rules.
    pub fn add(&mut self, symbol: Symbol, env: &CompilationEnvironment) {
        if symbol.operator() == Some(Operator::As) {
            self.add_caster(symbol, env);
        } else if symbol.is_executable() {
            self.add_executable(symbol, env);
        } else {
            self.add_field(symbol);
        }
    }

    /// Add every symbol of `symbols`.
    pub fn add_all(&mut self, symbols: impl IntoIterator<Item = Symbol>, env: &CompilationEnvironment) {
        for symbol in symbols {
            self.add(symbol, env);
        }
    }

    /// Number of symbols the group will yield.
    pub fn len(&self) -> usize {
        self.symbols.len() + usize::from(!self.caster_targets.is_empty())
    }

    /// Whether the group is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The merged symbols, in first-seen order, with the caster (if any)
    /// last. A lone caster keeps its original symbol; overlapping
    /// casters become one synthetic intersection caster.
    pub fn into_symbols(self) -> Vec<Symbol> {
        let mut symbols = self.symbols;
        if self.caster_targets.len() > 1 {
            symbols.push(factory::create_merged_caster(self.caster_targets));
        } else if let Some(caster) = self.first_caster {
            symbols.push(caster);
        }
        symbols
    }

    fn add_field(&mut self, symbol: Symbol) {
        if self.field_names.insert(symbol.name().to_string()) {
            self.symbols.push(symbol);
        }
    }

    fn add_executable(&mut self, symbol: Symbol, env: &CompilationEnvironment) {
        let key = ExecutableKey {
            name: symbol.name().to_string(),
            params: symbol.parameter_types(env),
            kind: symbol.kind(),
        };
        if self.executable_keys.insert(key) {
            self.symbols.push(symbol);
        }
    }

    fn add_caster(&mut self, symbol: Symbol, env: &CompilationEnvironment) {
        let target = symbol.return_type(env).unwrap_or(Type::Any);
        if self.first_caster.is_none() {
            self.first_caster = Some(symbol);
        }
        match target {
            Type::Intersection(parts) => {
                for part in parts {
                    if !self.caster_targets.contains(&part) {
                        self.caster_targets.push(part);
                    }
                }
            }
            target => {
                if !self.caster_targets.contains(&target) {
                    self.caster_targets.push(target);
                }
            }
        }
    }
}
