//! The multi-file registry.
//!
//! Owns every loaded unit and exposes the environment-wide views
//! (global symbols, expand functions, qualified-name maps). Views are
//! recomputed from the live unit set on every call, never cached across
//! mutation, so they cannot go stale.
//!
//! Concurrency: a [`SharedEnvironment`] wraps the environment in one
//! coarse `parking_lot::RwLock`. Queries run under a read lock and may
//! overlap; loading, replacing or removing a unit takes the write lock
//! and swaps whole unit objects, so readers always observe a coherent
//! unit.

use crate::symbol::{ClassSymbol, Modifier, Symbol};
use crate::ty::{ClassType, Type};
use crate::unit::CompilationUnit;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Default root directory of script units.
pub const DEFAULT_ROOT_DIRECTORY: &str = "scripts";
/// Default directory of generated declaration-only units.
pub const DEFAULT_GENERATED_DIRECTORY: &str = "generated";

/// The registry of all loaded units, created once per workspace root.
#[derive(Debug)]
pub struct CompilationEnvironment {
    root: PathBuf,
    units: FxHashMap<PathBuf, CompilationUnit>,
}

impl CompilationEnvironment {
    /// Create an empty environment rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            units: FxHashMap::default(),
        }
    }

    /// The workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The directory of generated declaration-only units.
    pub fn generated_root(&self) -> PathBuf {
        self.root.join(DEFAULT_GENERATED_DIRECTORY)
    }

    /// Parse `source` and register (or replace) the unit at `path`.
    ///
    /// Replacement swaps the whole unit object; annotations of the old
    /// tree are discarded with it.
    pub fn load_unit(&mut self, path: impl Into<PathBuf>, source: &str) -> &CompilationUnit {
        let path = path.into();
        let unit = CompilationUnit::load(path.clone(), source, &self.root);
        debug!(path = %path.display(), errors = unit.errors().len(), "loaded unit");
        self.units.insert(path.clone(), unit);
        &self.units[&path]
    }

    /// Drop the unit at `path`.
    pub fn remove_unit(&mut self, path: &Path) -> Option<CompilationUnit> {
        let removed = self.units.remove(path);
        if removed.is_some() {
            debug!(path = %path.display(), "removed unit");
        }
        removed
    }

    /// The unit at `path`.
    pub fn unit(&self, path: &Path) -> Option<&CompilationUnit> {
        self.units.get(path)
    }

    /// All loaded units.
    pub fn units(&self) -> impl Iterator<Item = &CompilationUnit> {
        self.units.values()
    }

    /// Number of loaded units.
    pub fn unit_count(&self) -> usize {
        self.units.len()
    }

    /// Top-level symbols marked `global`, across every unit.
    pub fn global_symbols(&self) -> Vec<Symbol> {
        self.units()
            .flat_map(|unit| unit.top_level_symbols().iter())
            .filter(|symbol| symbol.is_modified_by(Modifier::Global))
            .cloned()
            .collect()
    }

    /// Every expand function registered in the environment.
    pub fn expand_functions(&self) -> Vec<Symbol> {
        self.units()
            .flat_map(|unit| unit.top_level_symbols().iter())
            .filter(|symbol| matches!(symbol, Symbol::ExpandFunction(_)))
            .cloned()
            .collect()
    }

    /// Qualified name to class type, across every unit.
    pub fn class_type_map(&self) -> FxHashMap<String, Type> {
        self.class_symbols()
            .map(|class| {
                (
                    class.qualified_name.clone(),
                    Type::Class(ClassType::new(class.clone())),
                )
            })
            .collect()
    }

    /// Qualified name to class symbol, across every unit.
    pub fn class_symbol_map(&self) -> FxHashMap<String, Arc<ClassSymbol>> {
        self.class_symbols()
            .map(|class| (class.qualified_name.clone(), class.clone()))
            .collect()
    }

    /// Expand members applicable to a receiver of type `ty`: every
    /// expand function whose expanded type the receiver ranks above
    /// `None` against, plus - for non-class receivers - the members of
    /// any class whose name renders the same as the receiver type
    /// (the naming-convention bridge for primitive extensions).
    pub fn expand_members(&self, ty: &Type) -> Vec<Symbol> {
        let mut members: Vec<Symbol> = self
            .expand_functions()
            .into_iter()
            .filter(|symbol| match symbol {
                Symbol::ExpandFunction(expand) => expand
                    .expanding_type(self)
                    .map(|expanding| ty.subtype_of(&expanding, self).matches())
                    .unwrap_or(false),
                _ => false,
            })
            .collect();
        if !ty.is_class() {
            if let Some(Type::Class(class_type)) = self.class_type_map().get(&ty.to_string()) {
                members.extend(class_type.members(self));
            }
        }
        members
    }

    fn class_symbols(&self) -> impl Iterator<Item = &Arc<ClassSymbol>> {
        self.units()
            .flat_map(|unit| unit.top_level_symbols().iter())
            .filter_map(|symbol| match symbol {
                Symbol::Class(class) => Some(class),
                _ => None,
            })
    }
}

/// The shared form of the environment: one coarse reader/writer lock,
/// readers concurrent, writers exclusive.
pub type SharedEnvironment = Arc<RwLock<CompilationEnvironment>>;

/// Create a [`SharedEnvironment`] rooted at `root`.
pub fn shared(root: impl Into<PathBuf>) -> SharedEnvironment {
    Arc::new(RwLock::new(CompilationEnvironment::new(root)))
}
