use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};
use zest_parser::parser::Parser;
use zest_parser::token::TokenKind;

fn parse_clean(source: &str) -> SyntaxTree {
    let (tree, errors) = Parser::parse(source);
    assert!(errors.is_empty(), "unexpected parse errors: {errors:?}");
    tree
}

fn top_level_kinds(tree: &SyntaxTree) -> Vec<NodeKind> {
    tree.children(tree.root()).iter().map(|&c| tree.kind(c)).collect()
}

fn find_descendant(tree: &SyntaxTree, from: NodeId, kind: NodeKind) -> Option<NodeId> {
    if tree.kind(from) == kind {
        return Some(from);
    }
    for &child in tree.children(from) {
        if let Some(found) = find_descendant(tree, child, kind) {
            return Some(found);
        }
    }
    None
}

// ============================================================================
// Declarations
// ============================================================================

#[test]
fn import_with_alias() {
    let tree = parse_clean("import scripts.util.Box as B;");
    assert_eq!(top_level_kinds(&tree), vec![NodeKind::ImportDeclaration]);

    let import = tree.children(tree.root())[0];
    let qualified = tree.child_of_kind(import, NodeKind::QualifiedName).unwrap();
    assert_eq!(tree.text(qualified).as_deref(), Some("scripts.util.Box"));

    let alias = tree.child_of_kind(import, NodeKind::Alias).unwrap();
    let alias_name = tree.child_of_kind(alias, NodeKind::SimpleName).unwrap();
    assert_eq!(tree.text(alias_name).as_deref(), Some("B"));
}

#[test]
fn class_with_members() {
    let tree = parse_clean(
        r#"
        class Box {
            var value as int;
            static count as int = 0;

            constructor(value as int) {
                this.value = value;
            }

            function get() as int {
                return this.value;
            }

            operator +(other as int) as int;
        }
        "#,
    );
    let class = tree.children(tree.root())[0];
    assert_eq!(tree.kind(class), NodeKind::ClassDeclaration);

    let body = tree.child_of_kind(class, NodeKind::ClassBody).unwrap();
    let kinds: Vec<NodeKind> = tree.children(body).iter().map(|&c| tree.kind(c)).collect();
    assert_eq!(
        kinds,
        vec![
            NodeKind::VariableDeclaration,
            NodeKind::VariableDeclaration,
            NodeKind::ConstructorDeclaration,
            NodeKind::FunctionDeclaration,
            NodeKind::OperatorFunctionDeclaration,
        ]
    );

    // The static field carries its modifier token.
    let static_field = tree.children(body)[1];
    assert_eq!(tree.token_kind(static_field), Some(TokenKind::Static));
}

#[test]
fn class_with_interfaces() {
    let tree = parse_clean("class Impl implements IFoo, pkg.IBar { }");
    let class = tree.children(tree.root())[0];
    let interfaces = tree.child_of_kind(class, NodeKind::InterfaceList).unwrap();
    let names: Vec<String> = tree
        .children(interfaces)
        .iter()
        .filter_map(|&c| tree.text(c))
        .collect();
    assert_eq!(names, vec!["IFoo", "pkg.IBar"]);
}

#[test]
fn expand_function() {
    let tree = parse_clean("expand string$reverse() as string { return this; }");
    let expand = tree.children(tree.root())[0];
    assert_eq!(tree.kind(expand), NodeKind::ExpandFunctionDeclaration);
    assert_eq!(
        tree.children(expand)
            .first()
            .map(|&c| tree.kind(c)),
        Some(NodeKind::PrimitiveType)
    );
    let name = tree.child_of_kind(expand, NodeKind::SimpleName).unwrap();
    assert_eq!(tree.text(name).as_deref(), Some("reverse"));
}

#[test]
fn expand_caster_operator() {
    let tree = parse_clean("expand bool$operator as() as string;");
    let expand = tree.children(tree.root())[0];
    let op = tree.child_of_kind(expand, NodeKind::Operator).unwrap();
    assert_eq!(tree.text(op).as_deref(), Some("as"));
}

#[test]
fn annotated_class_member() {
    let tree = parse_clean(
        r#"
        class Items {
            #foreach
            function iterate() as [int];
        }
        "#,
    );
    let class = tree.children(tree.root())[0];
    let body = tree.child_of_kind(class, NodeKind::ClassBody).unwrap();
    let function = tree.children(body)[0];
    assert_eq!(tree.kind(function), NodeKind::FunctionDeclaration);
    let annotation = tree.child_of_kind(function, NodeKind::Annotation).unwrap();
    assert_eq!(tree.text(annotation).as_deref(), Some("#foreach"));
}

#[test]
fn vararg_parameter() {
    let tree = parse_clean("function sum(...values as int[]) as int;");
    let function = tree.children(tree.root())[0];
    let params = tree.child_of_kind(function, NodeKind::FormalParameterList).unwrap();
    let param = tree.children(params)[0];
    assert_eq!(tree.token_kind(param), Some(TokenKind::DotDotDot));
}

// ============================================================================
// Statements and expressions
// ============================================================================

#[test]
fn foreach_two_variables() {
    let tree = parse_clean("for k, v in m { print(k); }");
    let foreach = tree.children(tree.root())[0];
    assert_eq!(tree.kind(foreach), NodeKind::ForeachStatement);
    let list = tree.child_of_kind(foreach, NodeKind::ForeachVariableList).unwrap();
    assert_eq!(tree.children(list).len(), 2);
}

#[test]
fn member_call_chain() {
    let tree = parse_clean("box.get().length;");
    let stmt = tree.children(tree.root())[0];
    let outer = tree.children(stmt)[0];
    assert_eq!(tree.kind(outer), NodeKind::MemberAccessExpr);
    let call = tree.children(outer)[0];
    assert_eq!(tree.kind(call), NodeKind::CallExpr);
}

#[test]
fn precedence_mul_binds_tighter() {
    let tree = parse_clean("val x = 1 + 2 * 3;");
    let decl = tree.children(tree.root())[0];
    let init = tree.child_of_kind(decl, NodeKind::Initializer).unwrap();
    let add = tree.children(init)[0];
    assert_eq!(tree.kind(add), NodeKind::BinaryExpr);
    // Right operand of `+` is the multiplication.
    let right = *tree.children(add).last().unwrap();
    assert_eq!(tree.kind(right), NodeKind::BinaryExpr);
}

#[test]
fn range_and_cast() {
    let tree = parse_clean("for i in 0 .. max as int { }");
    let foreach = tree.children(tree.root())[0];
    let range = tree.child_of_kind(foreach, NodeKind::RangeExpr).unwrap();
    let cast = tree.children(range)[1];
    assert_eq!(tree.kind(cast), NodeKind::TypeCastExpr);
}

#[test]
fn map_literal() {
    let tree = parse_clean("val m = {one: 1, two: 2};");
    let decl = tree.children(tree.root())[0];
    let map = find_descendant(&tree, decl, NodeKind::MapLiteralExpr).unwrap();
    let entries = tree.child_of_kind(map, NodeKind::MapEntryList).unwrap();
    assert_eq!(tree.children(entries).len(), 2);
}

#[test]
fn anonymous_function_expression() {
    let tree = parse_clean("val f = function(a as int) as int { return a; };");
    let decl = tree.children(tree.root())[0];
    assert!(find_descendant(&tree, decl, NodeKind::FunctionExpr).is_some());
}

// ============================================================================
// Type literals
// ============================================================================

#[test]
fn composite_type_literals() {
    let tree = parse_clean("var a as int[]; var l as [string]; var m as int[string]; var f as function(int)bool;");
    let declarations = tree.children(tree.root());

    let array = tree.type_literal_child(declarations[0]).unwrap();
    assert_eq!(tree.kind(array), NodeKind::ArrayType);

    let list = tree.type_literal_child(declarations[1]).unwrap();
    assert_eq!(tree.kind(list), NodeKind::ListType);

    let map = tree.type_literal_child(declarations[2]).unwrap();
    assert_eq!(tree.kind(map), NodeKind::MapType);
    // Children are [value, key].
    assert_eq!(tree.kind(tree.children(map)[0]), NodeKind::PrimitiveType);

    let function = tree.type_literal_child(declarations[3]).unwrap();
    assert_eq!(tree.kind(function), NodeKind::FunctionType);
}

#[test]
fn class_type_literal() {
    let tree = parse_clean("var b as scripts.Box;");
    let decl = tree.children(tree.root())[0];
    let class_type = tree.type_literal_child(decl).unwrap();
    assert_eq!(tree.kind(class_type), NodeKind::ClassType);
    let name = tree.children(class_type)[0];
    assert_eq!(tree.text(name).as_deref(), Some("scripts.Box"));
}

// ============================================================================
// Error tolerance
// ============================================================================

#[test]
fn recovers_after_bad_statement() {
    let (tree, errors) = Parser::parse("val x = ; val y = 2;");
    assert!(!errors.is_empty());
    // The second declaration still parses.
    let kinds = top_level_kinds(&tree);
    assert!(kinds.contains(&NodeKind::VariableDeclaration));
    assert_eq!(
        kinds.iter().filter(|&&k| k == NodeKind::VariableDeclaration).count(),
        2
    );
}

#[test]
fn incomplete_member_access_still_builds_a_tree() {
    let (tree, errors) = Parser::parse("box.");
    assert!(!errors.is_empty());
    assert!(tree.len() > 1);
}

#[test]
fn unclosed_class_body() {
    let (tree, errors) = Parser::parse("class Box { var x as int;");
    assert!(!errors.is_empty());
    let class = tree.children(tree.root())[0];
    assert_eq!(tree.kind(class), NodeKind::ClassDeclaration);
    let body = tree.child_of_kind(class, NodeKind::ClassBody).unwrap();
    assert_eq!(tree.children(body).len(), 1);
}
