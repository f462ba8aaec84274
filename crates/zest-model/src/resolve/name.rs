//! Declared-name recovery.
//!
//! A pure structural dispatch from CST node to name string: no symbol
//! table or type involvement, safe to call before any scope exists.

use zest_parser::cst::{NodeId, NodeKind, SyntaxTree};

/// The declared or referenced name of `node`, or `None` for nodes that
/// carry no name.
pub fn declared_name(tree: &SyntaxTree, node: NodeId) -> Option<String> {
    match tree.kind(node) {
        NodeKind::ImportDeclaration => {
            let alias = tree
                .child_of_kind(node, NodeKind::Alias)
                .and_then(|alias| tree.child_of_kind(alias, NodeKind::SimpleName));
            match alias {
                Some(alias_name) => tree.text(alias_name),
                None => {
                    let qualified = tree.child_of_kind(node, NodeKind::QualifiedName)?;
                    let last = tree.children(qualified).last().copied()?;
                    tree.text(last)
                }
            }
        }
        NodeKind::ClassDeclaration
        | NodeKind::FunctionDeclaration
        | NodeKind::VariableDeclaration
        | NodeKind::FormalParameter
        | NodeKind::ForeachVariable
        | NodeKind::LocalAccessExpr => {
            let name = tree.child_of_kind(node, NodeKind::SimpleName)?;
            tree.text(name)
        }
        NodeKind::ExpandFunctionDeclaration => tree
            .child_of_kind(node, NodeKind::SimpleName)
            .or_else(|| tree.child_of_kind(node, NodeKind::Operator))
            .and_then(|name| tree.text(name)),
        NodeKind::OperatorFunctionDeclaration => {
            let op = tree.child_of_kind(node, NodeKind::Operator)?;
            tree.text(op)
        }
        NodeKind::ConstructorDeclaration => Some("constructor".to_string()),
        NodeKind::QualifiedName | NodeKind::SimpleName => tree.text(node),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zest_parser::parser::Parser;

    fn first_top_level(source: &str) -> (SyntaxTree, NodeId) {
        let (tree, _) = Parser::parse(source);
        let node = tree.children(tree.root())[0];
        (tree, node)
    }

    #[test]
    fn import_name_is_last_segment() {
        let (tree, node) = first_top_level("import scripts.util.Box;");
        assert_eq!(declared_name(&tree, node).as_deref(), Some("Box"));
    }

    #[test]
    fn import_alias_wins() {
        let (tree, node) = first_top_level("import scripts.util.Box as Crate;");
        assert_eq!(declared_name(&tree, node).as_deref(), Some("Crate"));
    }

    #[test]
    fn function_name() {
        let (tree, node) = first_top_level("function greet(name as string) as void { }");
        assert_eq!(declared_name(&tree, node).as_deref(), Some("greet"));
    }

    #[test]
    fn operator_name_is_its_literal() {
        let (tree, node) = first_top_level("class C { operator +(o as int) as int; }");
        let body = tree.child_of_kind(node, NodeKind::ClassBody).unwrap();
        let op = tree.children(body)[0];
        assert_eq!(declared_name(&tree, op).as_deref(), Some("+"));
    }

    #[test]
    fn nameless_node_yields_none() {
        let (tree, node) = first_top_level("return 1;");
        assert_eq!(declared_name(&tree, node), None);
    }
}
