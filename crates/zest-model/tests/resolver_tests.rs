use std::path::Path;
use zest_model::env::CompilationEnvironment;
use zest_model::resolve;
use zest_model::symbol::{Operator, Symbol, SymbolKind};
use zest_model::ty::Type;
use zest_parser::cst::NodeId;

const BOX_SOURCE: &str = "\
class Box {
    static function make() as int {
        return 1;
    }
    var value as int;
    constructor(value as int) {
        this.value = value;
    }
}
";

const MAIN_SOURCE: &str = "\
import lib.box.Box;

val b as Box;
b.value;
Box.make();
";

fn env_with_box() -> CompilationEnvironment {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/lib/box.zest", BOX_SOURCE);
    env.load_unit("scripts/main.zest", MAIN_SOURCE);
    env
}

fn main_node_at(env: &CompilationEnvironment, line: u32, column: u32) -> NodeId {
    env.unit(Path::new("scripts/main.zest"))
        .unwrap()
        .tree()
        .node_at(line, column)
}

// ============================================================================
// Shadowing
// ============================================================================

#[test]
fn innermost_declaration_shadows_outer() {
    let mut env = CompilationEnvironment::new("scripts");
    let source = "\
val x = \"outer\";
function f(x as int) as int {
    return x;
}
val y = x;
";
    env.load_unit("scripts/shadow.zest", source);
    let unit = env.unit(Path::new("scripts/shadow.zest")).unwrap();

    // `x` inside the function resolves to the parameter.
    let inner = unit.tree().node_at(3, 12);
    let symbols = resolve::lookup_symbols(inner, unit, &env);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].kind(), SymbolKind::Parameter);

    let inner_ref = unit.tree().parent(inner).unwrap();
    assert_eq!(resolve::type_of(inner_ref, unit, &env), Type::Int);

    // `x` at the top level resolves to the file-scope variable.
    let outer = unit.tree().node_at(5, 9);
    let outer_ref = unit.tree().parent(outer).unwrap();
    assert_eq!(resolve::type_of(outer_ref, unit, &env), Type::String);
}

// ============================================================================
// Member access and qualified names
// ============================================================================

#[test]
fn member_access_resolves_class_member_type() {
    let env = env_with_box();
    let unit = env.unit(Path::new("scripts/main.zest")).unwrap();

    // `b.value` on line 4; the member access expression types as int.
    let value_name = main_node_at(&env, 4, 3);
    let member_access = unit.tree().parent(value_name).unwrap();
    assert_eq!(resolve::type_of(member_access, unit, &env), Type::Int);

    let symbols = resolve::lookup_symbols(value_name, unit, &env);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name(), "value");
    assert_eq!(symbols[0].kind(), SymbolKind::Variable);
}

#[test]
fn imported_class_exposes_static_members_only() {
    let env = env_with_box();
    let unit = env.unit(Path::new("scripts/main.zest")).unwrap();

    // `Box.make()` on line 5.
    let make_name = main_node_at(&env, 5, 5);
    let symbols = resolve::lookup_symbols(make_name, unit, &env);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name(), "make");
    assert!(symbols[0].is_static());

    // `value` is not static, so it is not reachable through the class.
    let member_access = unit.tree().parent(make_name).unwrap();
    let call = unit.tree().parent(member_access).unwrap();
    assert_eq!(resolve::type_of(call, unit, &env), Type::Int);
}

#[test]
fn import_alias_resolves_like_the_class() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/lib/box.zest", BOX_SOURCE);
    env.load_unit(
        "scripts/alias.zest",
        "import lib.box.Box as Crate;\nCrate.make();\n",
    );
    let unit = env.unit(Path::new("scripts/alias.zest")).unwrap();
    let make_name = unit.tree().node_at(2, 7);
    let symbols = resolve::lookup_symbols(make_name, unit, &env);
    assert_eq!(symbols.len(), 1);
    assert_eq!(symbols[0].name(), "make");
}

#[test]
fn unresolvable_member_access_yields_no_symbols() {
    let env = env_with_box();
    let unit = env.unit(Path::new("scripts/main.zest")).unwrap();
    let value_name = main_node_at(&env, 4, 3);
    let symbols = resolve::lookup_symbols(value_name, unit, &env);
    assert_eq!(symbols.len(), 1);

    // Same query against a missing member name.
    let mut env2 = CompilationEnvironment::new("scripts");
    env2.load_unit("scripts/lib/box.zest", BOX_SOURCE);
    env2.load_unit("scripts/main.zest", "import lib.box.Box;\nval b as Box;\nb.missing;\n");
    let unit2 = env2.unit(Path::new("scripts/main.zest")).unwrap();
    let missing = unit2.tree().node_at(3, 3);
    assert!(resolve::lookup_symbols(missing, unit2, &env2).is_empty());
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn repeated_queries_are_identical() {
    let env = env_with_box();
    let unit = env.unit(Path::new("scripts/main.zest")).unwrap();
    let value_name = main_node_at(&env, 4, 3);
    let member_access = unit.tree().parent(value_name).unwrap();

    let first_type = resolve::type_of(member_access, unit, &env);
    let second_type = resolve::type_of(member_access, unit, &env);
    assert_eq!(first_type, second_type);

    let first: Vec<String> = resolve::lookup_symbols(value_name, unit, &env)
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    let second: Vec<String> = resolve::lookup_symbols(value_name, unit, &env)
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert_eq!(first, second);
}

// ============================================================================
// Foreach inference
// ============================================================================

#[test]
fn foreach_variables_follow_the_iterated_type() {
    let mut env = CompilationEnvironment::new("scripts");
    let source = "\
val m as int[string];
for k in m {
}
for k, v in m {
}
for i in 0 .. 10 {
}
for s in [\"a\", \"b\"] {
}
";
    env.load_unit("scripts/loops.zest", source);
    let unit = env.unit(Path::new("scripts/loops.zest")).unwrap();
    let tree = unit.tree();

    let foreach_vars: Vec<NodeId> = tree
        .children(tree.root())
        .iter()
        .filter(|&&n| tree.kind(n) == zest_parser::cst::NodeKind::ForeachStatement)
        .flat_map(|&n| {
            let list = tree
                .child_of_kind(n, zest_parser::cst::NodeKind::ForeachVariableList)
                .unwrap();
            tree.children(list).to_vec()
        })
        .collect();
    assert_eq!(foreach_vars.len(), 5);

    // map<string,int>: single variable infers the key type.
    assert_eq!(resolve::type_of(foreach_vars[0], unit, &env), Type::String);
    // Two variables infer key then value.
    assert_eq!(resolve::type_of(foreach_vars[1], unit, &env), Type::String);
    assert_eq!(resolve::type_of(foreach_vars[2], unit, &env), Type::Int);
    // An integer range iterates ints.
    assert_eq!(resolve::type_of(foreach_vars[3], unit, &env), Type::Int);
    // An array literal iterates its element type.
    assert_eq!(resolve::type_of(foreach_vars[4], unit, &env), Type::String);
}

#[test]
fn foreach_over_annotated_class_member() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/items.zest",
        "\
class Items {
    #foreach
    function iterate() as [string];
    #foreachMap
    function entries() as int[string];
}
",
    );
    env.load_unit(
        "scripts/use.zest",
        "\
import items.Items;
val it as Items;
for x in it {
}
for k, v in it {
}
",
    );
    let unit = env.unit(Path::new("scripts/use.zest")).unwrap();
    let tree = unit.tree();
    let foreach_vars: Vec<NodeId> = tree
        .children(tree.root())
        .iter()
        .filter(|&&n| tree.kind(n) == zest_parser::cst::NodeKind::ForeachStatement)
        .flat_map(|&n| {
            let list = tree
                .child_of_kind(n, zest_parser::cst::NodeKind::ForeachVariableList)
                .unwrap();
            tree.children(list).to_vec()
        })
        .collect();

    assert_eq!(resolve::type_of(foreach_vars[0], unit, &env), Type::String);
    assert_eq!(resolve::type_of(foreach_vars[1], unit, &env), Type::String);
    assert_eq!(resolve::type_of(foreach_vars[2], unit, &env), Type::Int);
}

// ============================================================================
// Expand functions
// ============================================================================

#[test]
fn expand_function_appears_on_its_type_and_subtypes() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/expands.zest",
        "\
expand string$reverse() as string {
    return this;
}
expand any$dump() as void {
}
",
    );

    let string_members: Vec<String> = Type::String
        .members_with_expands(&env)
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert!(string_members.contains(&"reverse".to_string()));
    assert!(string_members.contains(&"dump".to_string()));

    // `void` ranks None against string, so `reverse` does not leak there,
    // but the `any` expand still applies.
    let void_members: Vec<String> = Type::Void
        .members_with_expands(&env)
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert!(!void_members.contains(&"reverse".to_string()));
    assert!(void_members.contains(&"dump".to_string()));
}

#[test]
fn overlapping_expand_casters_merge_into_an_intersection() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/casters.zest",
        "expand bool$operator as() as string;\nexpand bool$operator as() as int;\n",
    );

    let members = Type::Bool.members_with_expands(&env);
    let casters: Vec<&Symbol> = members
        .iter()
        .filter(|s| s.operator() == Some(Operator::As))
        .collect();
    assert_eq!(casters.len(), 1);

    match casters[0].return_type(&env) {
        Some(Type::Intersection(parts)) => {
            assert!(parts.contains(&Type::String));
            assert!(parts.contains(&Type::Int));
        }
        other => panic!("expected an intersection result, got {other:?}"),
    }
}

#[test]
fn primitive_extension_through_same_named_class() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/generated/string.d.zest",
        "class string {\n    function reverse() as string;\n}\n",
    );
    let unit = env.unit(Path::new("scripts/generated/string.d.zest")).unwrap();
    assert!(unit.is_declaration());
    assert_eq!(unit.qualified_name(), "string");

    let names: Vec<String> = Type::String
        .members_with_expands(&env)
        .iter()
        .map(|s| s.name().to_string())
        .collect();
    assert!(names.contains(&"reverse".to_string()));
}

// ============================================================================
// Overload grouping
// ============================================================================

#[test]
fn overloads_survive_and_duplicates_collapse() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/calc.zest",
        "\
class Calc {
    function add(a as int) as int;
    function add(a as int, b as int) as int;
    function add(a as int) as int;
}
",
    );
    let class_type = env.class_type_map().get("calc.Calc").cloned().unwrap();
    let adds = class_type
        .members(&env)
        .iter()
        .filter(|s| s.name() == "add")
        .count();
    assert_eq!(adds, 2);
}

// ============================================================================
// Interfaces
// ============================================================================

#[test]
fn interface_members_are_inherited_and_ranked() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/iface.zest",
        "class Printable {\n    function print() as void;\n}\n",
    );
    env.load_unit(
        "scripts/impl.zest",
        "import iface.Printable;\nclass Doc implements Printable {\n    var body as string;\n}\n",
    );

    let types = env.class_type_map();
    let doc = types.get("impl.Doc").cloned().unwrap();
    let printable = types.get("iface.Printable").cloned().unwrap();

    let names: Vec<String> = doc.members(&env).iter().map(|s| s.name().to_string()).collect();
    assert!(names.contains(&"body".to_string()));
    assert!(names.contains(&"print".to_string()));

    assert_eq!(
        doc.subtype_of(&printable, &env),
        zest_model::ty::SubtypeResult::Inherit
    );

    // A broken interface name is skipped, not fatal.
    let mut env2 = CompilationEnvironment::new("scripts");
    env2.load_unit(
        "scripts/impl.zest",
        "class Doc implements Nowhere {\n    var body as string;\n}\n",
    );
    let doc2 = env2.class_type_map().get("impl.Doc").cloned().unwrap();
    let names2: Vec<String> = doc2.members(&env2).iter().map(|s| s.name().to_string()).collect();
    assert_eq!(names2, vec!["body".to_string()]);
}

// ============================================================================
// Declared casters
// ============================================================================

#[test]
fn class_caster_ranks_caster() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit(
        "scripts/temp.zest",
        "class Temp {\n    operator as() as int;\n}\n",
    );
    let temp = env.class_type_map().get("temp.Temp").cloned().unwrap();
    assert_eq!(
        temp.subtype_of(&Type::Int, &env),
        zest_model::ty::SubtypeResult::Caster
    );
    assert_eq!(
        temp.subtype_of(&Type::String, &env),
        zest_model::ty::SubtypeResult::None
    );
}

// ============================================================================
// Permissive fallbacks
// ============================================================================

#[test]
fn unknown_member_falls_back_to_receiver_type() {
    let mut env = env_with_box();
    env.load_unit("scripts/main.zest", "import lib.box.Box;\nval b as Box;\nb.unknown;\n");
    let unit = env.unit(Path::new("scripts/main.zest")).unwrap();
    let unknown = unit.tree().node_at(3, 3);
    let member_access = unit.tree().parent(unknown).unwrap();
    let ty = resolve::type_of(member_access, unit, &env);
    assert_eq!(ty.to_string(), "Box");
}

#[test]
fn unresolved_expressions_degrade_to_any() {
    let mut env = CompilationEnvironment::new("scripts");
    env.load_unit("scripts/broken.zest", "ghost;\nval n = null;\n1();\n");
    let unit = env.unit(Path::new("scripts/broken.zest")).unwrap();
    let tree = unit.tree();

    // Unresolved name.
    let ghost = tree.node_at(1, 1);
    let ghost_ref = tree.parent(ghost).unwrap();
    assert_eq!(resolve::type_of(ghost_ref, unit, &env), Type::Any);

    // Null literal.
    let n_decl = tree.children(tree.root())[1];
    assert_eq!(resolve::type_of(n_decl, unit, &env), Type::Any);

    // Calling a non-function.
    let call_stmt = tree.children(tree.root())[2];
    let call = tree.children(call_stmt)[0];
    assert_eq!(resolve::type_of(call, unit, &env), Type::Any);
}
