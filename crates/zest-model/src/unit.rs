//! One source file: its CST, scopes and semantic annotations.

use crate::resolve::decl;
use crate::scope::{Scope, ScopeArena, ScopeId};
use crate::symbol::Symbol;
use rustc_hash::FxHashMap;
use std::path::{Path, PathBuf};
use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};
use zest_parser::parser::{ParseError, Parser};

/// Extension of regular script files.
pub const FILE_EXTENSION: &str = ".zest";
/// Extension of declaration-only units describing host types.
pub const DECLARATION_FILE_EXTENSION: &str = ".d.zest";

/// One source file's CST plus its resolved scope/symbol annotations.
///
/// The two node-keyed annotation tables are the single source of truth
/// for what a node means; they are built once per load and discarded
/// wholesale when the unit is replaced.
#[derive(Debug)]
pub struct CompilationUnit {
    path: PathBuf,
    qualified_name: String,
    declaration: bool,
    tree: SyntaxTree,
    errors: Vec<ParseError>,
    scopes: ScopeArena,
    scope_table: FxHashMap<NodeId, ScopeId>,
    symbol_table: FxHashMap<NodeId, Symbol>,
}

impl CompilationUnit {
    /// Parse `source` and run declaration resolution.
    ///
    /// Never fails: parse diagnostics are collected on the unit and the
    /// model is built over whatever tree was recognized.
    pub fn load(path: PathBuf, source: &str, root: &Path) -> Self {
        let (tree, errors) = Parser::parse(source);
        let (qualified_name, declaration) = derive_qualified_name(&path, root);
        let mut unit = CompilationUnit {
            path,
            qualified_name,
            declaration,
            tree,
            errors,
            scopes: ScopeArena::new(),
            scope_table: FxHashMap::default(),
            symbol_table: FxHashMap::default(),
        };
        decl::resolve_declarations(
            &unit.tree,
            &unit.path,
            &unit.qualified_name,
            unit.declaration,
            &mut unit.scopes,
            &mut unit.scope_table,
            &mut unit.symbol_table,
        );
        unit
    }

    /// Path of the unit.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Qualified name derived from the unit's path.
    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    /// Whether this is a declaration-only (`.d.zest`) unit.
    pub fn is_declaration(&self) -> bool {
        self.declaration
    }

    /// The unit's concrete syntax tree.
    pub fn tree(&self) -> &SyntaxTree {
        &self.tree
    }

    /// Parse diagnostics collected while loading.
    pub fn errors(&self) -> &[ParseError] {
        &self.errors
    }

    /// The unit's scope arena.
    pub fn scopes(&self) -> &ScopeArena {
        &self.scopes
    }

    /// The scope introduced by `node`, if it introduces one.
    pub fn scope_of(&self, node: NodeId) -> Option<&Scope> {
        self.scope_id_of(node).map(|id| self.scopes.get(id))
    }

    /// Id of the scope introduced by `node`.
    pub fn scope_id_of(&self, node: NodeId) -> Option<ScopeId> {
        self.scope_table.get(&node).copied()
    }

    /// The nearest scope enclosing `node` (walking the parent chain).
    pub fn lookup_scope(&self, node: NodeId) -> Option<&Scope> {
        self.lookup_scope_id(node).map(|id| self.scopes.get(id))
    }

    /// Id of the nearest scope enclosing `node`.
    pub fn lookup_scope_id(&self, node: NodeId) -> Option<ScopeId> {
        self.tree
            .ancestors(node)
            .find_map(|ancestor| self.scope_table.get(&ancestor).copied())
    }

    /// The symbol declared by `node`, if it is a declaration.
    pub fn symbol_of(&self, node: NodeId) -> Option<&Symbol> {
        self.symbol_table.get(&node)
    }

    /// Symbols declared in the unit's file scope.
    pub fn top_level_symbols(&self) -> &[Symbol] {
        self.scope_of(self.tree.root())
            .map(Scope::symbols)
            .unwrap_or(&[])
    }

    /// This unit's import symbols, in source order.
    pub fn imports(&self) -> Vec<Symbol> {
        self.tree
            .children(self.tree.root())
            .iter()
            .filter(|&&node| self.tree.kind(node) == NodeKind::ImportDeclaration)
            .filter_map(|&node| self.symbol_table.get(&node).cloned())
            .collect()
    }
}

/// Qualified name of a unit: its path relative to the environment root,
/// separators turned into dots, extension stripped. Declaration-only
/// units also drop the leading `generated` segment, so a host class
/// declared in `generated/string.d.zest` is addressed as `string`.
fn derive_qualified_name(path: &Path, root: &Path) -> (String, bool) {
    let file_name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let declaration = file_name.ends_with(DECLARATION_FILE_EXTENSION);

    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .components()
        .filter_map(|c| c.as_os_str().to_str().map(str::to_string))
        .collect();
    if let Some(last) = segments.last_mut() {
        if let Some(stem) = last.strip_suffix(DECLARATION_FILE_EXTENSION) {
            *last = stem.to_string();
        } else if let Some(stem) = last.strip_suffix(FILE_EXTENSION) {
            *last = stem.to_string();
        }
    }
    if declaration && segments.first().map(String::as_str) == Some("generated") {
        segments.remove(0);
    }
    (segments.join("."), declaration)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn qualified_name_from_relative_path() {
        let (name, declaration) =
            derive_qualified_name(Path::new("scripts/util/box.zest"), Path::new("scripts"));
        assert_eq!(name, "util.box");
        assert!(!declaration);
    }

    #[test]
    fn declaration_unit_drops_generated_prefix() {
        let (name, declaration) =
            derive_qualified_name(Path::new("root/generated/string.d.zest"), Path::new("root"));
        assert_eq!(name, "string");
        assert!(declaration);
    }

    #[test]
    fn foreign_path_is_used_as_is() {
        let (name, _) = derive_qualified_name(Path::new("other/lib.zest"), Path::new("scripts"));
        assert_eq!(name, "other.lib");
    }

    #[test]
    fn load_builds_scopes_and_symbols() {
        let unit = CompilationUnit::load(
            PathBuf::from("scripts/test.zest"),
            "val answer = 42; function f() as int { return answer; }",
            Path::new("scripts"),
        );
        assert!(unit.errors().is_empty());
        assert_eq!(unit.qualified_name(), "test");
        let names: Vec<&str> = unit.top_level_symbols().iter().map(|s| s.name()).collect();
        assert_eq!(names, vec!["answer", "f"]);
    }
}
