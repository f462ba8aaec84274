use std::path::Path;
use std::thread;
use zest_model::env::{self, CompilationEnvironment};
use zest_model::resolve;
use zest_model::symbol::SymbolKind;
use zest_model::ty::Type;

const BOX_SOURCE: &str = "\
class Box {
    var value as int;
}
";

// ============================================================================
// Aggregate views
// ============================================================================

#[test]
fn global_symbols_span_units() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/a.zest", "global answer = 42;\nval local = 1;\n");
    env.load_unit("scripts/b.zest", "global greeting = \"hi\";\n");

    let mut names: Vec<String> = env
        .global_symbols()
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    names.sort();
    assert_eq!(names, vec!["answer".to_string(), "greeting".to_string()]);

    let answer = env
        .global_symbols()
        .into_iter()
        .find(|s| s.name() == "answer")
        .unwrap();
    assert_eq!(answer.ty(&env), Type::Int);
}

#[test]
fn global_symbols_resolve_across_files() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/a.zest", "global answer = 42;\n");
    env.load_unit("scripts/b.zest", "answer;\n");

    let unit = env.unit(Path::new("scripts/b.zest")).unwrap();
    let name = unit.tree().node_at(1, 1);
    let symbols = resolve::lookup_symbols(name, unit, &env);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].kind(), SymbolKind::Variable);

    let reference = unit.tree().parent(name).unwrap();
    assert_eq!(resolve::type_of(reference, unit, &env), Type::Int);
}

#[test]
fn class_maps_use_qualified_names() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/lib/box.zest", BOX_SOURCE);

    let types = env.class_type_map();
    assert!(types.contains_key("lib.box.Box"));
    assert!(!types.contains_key("Box"));

    let symbols = env.class_symbol_map();
    assert_eq!(symbols["lib.box.Box"].name, "Box");
}

#[test]
fn expand_registry_lists_expand_functions() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/e.zest", "expand string$shout() as string;\n");
    let expands = env.expand_functions();
    assert_eq!(expands.len(), 1);
    assert_eq!(expands[0].name(), "shout");
}

// ============================================================================
// Unit lifecycle
// ============================================================================

#[test]
fn replacing_a_unit_refreshes_every_answer() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/a.zest", "global answer = 42;\n");
    let answer = env.global_symbols().into_iter().find(|s| s.name() == "answer").unwrap();
    assert_eq!(answer.ty(&env), Type::Int);

    // The edit flips the initializer type; nothing caches the old one.
    env.load_unit("scripts/a.zest", "global answer = \"now\";\n");
    let answer = env.global_symbols().into_iter().find(|s| s.name() == "answer").unwrap();
    assert_eq!(answer.ty(&env), Type::String);
}

#[test]
fn removing_a_unit_drops_its_symbols() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/a.zest", "global answer = 42;\n");
    assert_eq!(env.global_symbols().len(), 1);

    assert!(env.remove_unit(Path::new("scripts/a.zest")).is_some());
    assert!(env.global_symbols().is_empty());
    assert!(env.unit(Path::new("scripts/a.zest")).is_none());
    assert!(env.remove_unit(Path::new("scripts/a.zest")).is_none());
}

#[test]
fn stale_symbols_degrade_after_removal() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/a.zest", "global answer = 42;\n");
    let answer = env.global_symbols().into_iter().find(|s| s.name() == "answer").unwrap();

    env.remove_unit(Path::new("scripts/a.zest"));
    assert_eq!(answer.ty(&env), Type::Any);
}

// ============================================================================
// Shared environment
// ============================================================================

#[test]
fn concurrent_readers_and_a_writer() {
    let shared = env::shared("scripts");
    shared.write().load_unit("scripts/lib/box.zest", BOX_SOURCE);
    shared
        .write()
        .load_unit("scripts/main.zest", "import lib.box.Box;\nval b as Box;\nb.value;\n");

    let mut handles = Vec::new();
    for _ in 0..4 {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            for _ in 0..200 {
                let guard = shared.read();
                if let Some(unit) = guard.unit(Path::new("scripts/main.zest")) {
                    let name = unit.tree().node_at(3, 3);
                    let member_access = unit.tree().parent(name);
                    if let Some(member_access) = member_access {
                        let ty = resolve::type_of(member_access, unit, &guard);
                        assert!(matches!(ty, Type::Int | Type::Any));
                    }
                }
            }
        }));
    }

    {
        let shared = shared.clone();
        handles.push(thread::spawn(move || {
            for i in 0..100 {
                let source = if i % 2 == 0 {
                    "import lib.box.Box;\nval b as Box;\nb.value;\n"
                } else {
                    "import lib.box.Box;\nval b as Box;\nb.value; // edited\n"
                };
                shared.write().load_unit("scripts/main.zest", source);
            }
        }));
    }

    for handle in handles {
        handle.join().unwrap();
    }

    let guard = shared.read();
    let unit = guard.unit(Path::new("scripts/main.zest")).unwrap();
    let name = unit.tree().node_at(3, 3);
    let member_access = unit.tree().parent(name).unwrap();
    assert_eq!(resolve::type_of(member_access, unit, &guard), Type::Int);
}
