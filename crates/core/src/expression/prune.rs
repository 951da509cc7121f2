//! Predicate pruning: pure rewrite passes over expression trees.
//!
//! A pruner is visited post-order (children before parents) by the shared
//! traversal driver. Returning `None` removes a subtree; the driver then
//! applies the collapse rules so the remaining tree is still well-formed:
//!
//! - a comparison that lost any operand is dropped;
//! - AND/OR with no surviving child is dropped;
//! - AND/OR with a single surviving child is replaced by that child;
//! - NOT losing its child is dropped.
//!
//! Collapsing propagates upward, so `AND(unsupported, unsupported)` prunes
//! to `None` and the connector falls back to a full scan. Pruning is never
//! an error path: an unsupported operator or type is an expected outcome.

use std::collections::HashSet;

use super::{DataType, Node, Operator};

/// A composable rewrite pass over a predicate tree.
pub trait TreePruner {
    /// Pre-descent hook; returning `false` drops the whole subtree without
    /// visiting its children or siblings below it.
    fn descend(&self, _node: &Node, _depth: usize) -> bool {
        true
    }

    /// Post-order visit of a node whose children have already been pruned
    /// and collapsed. Return `None` to remove the node.
    fn visit(&self, node: Node, depth: usize) -> Option<Node>;
}

/// Run a single pruner over a tree. `None` means no usable predicate
/// survives and the connector should scan everything.
pub fn prune(tree: Node, pruner: &dyn TreePruner) -> Option<Node> {
    prune_at(tree, pruner, 0)
}

/// Run pruners in sequence, each over the previous pass's output.
pub fn prune_chain(tree: Node, pruners: &[&dyn TreePruner]) -> Option<Node> {
    pruners
        .iter()
        .try_fold(tree, |tree, pruner| prune(tree, *pruner))
}

fn prune_at(node: Node, pruner: &dyn TreePruner, depth: usize) -> Option<Node> {
    if !pruner.descend(&node, depth) {
        return None;
    }
    let node = match node {
        Node::Operator { op, children } => {
            let arity = children.len();
            let kept: Vec<Node> = children
                .into_iter()
                .filter_map(|child| prune_at(child, pruner, depth + 1))
                .collect();
            collapse(op, arity, kept)?
        }
        leaf => leaf,
    };
    pruner.visit(node, depth)
}

fn collapse(op: Operator, arity: usize, kept: Vec<Node>) -> Option<Node> {
    if op.is_logical() {
        match (op, kept.len()) {
            (Operator::Not, 1) => Some(Node::Operator { op, children: kept }),
            (Operator::Not, _) => None,
            (_, 0) => None,
            // A surviving single child replaces the AND/OR node.
            (_, 1) => kept.into_iter().next(),
            _ => Some(Node::Operator { op, children: kept }),
        }
    } else if kept.len() == arity {
        Some(Node::Operator { op, children: kept })
    } else {
        // A comparison missing an operand is no longer evaluable.
        None
    }
}

/// Drops operator nodes whose operator is outside the connector's
/// supported set. Unsupported comparison subtrees are cut before their
/// operands are even visited.
pub struct SupportedOperatorPruner {
    supported: HashSet<Operator>,
}

impl SupportedOperatorPruner {
    pub fn new(supported: impl IntoIterator<Item = Operator>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
        }
    }
}

impl TreePruner for SupportedOperatorPruner {
    fn descend(&self, node: &Node, _depth: usize) -> bool {
        match node {
            Node::Operator { op, .. } if !op.is_logical() => self.supported.contains(op),
            _ => true,
        }
    }

    fn visit(&self, node: Node, _depth: usize) -> Option<Node> {
        match &node {
            Node::Operator { op, .. } if !self.supported.contains(op) => None,
            _ => Some(node),
        }
    }
}

/// Drops column leaves whose declared type the connector cannot handle;
/// the parent comparison then collapses via the missing-operand rule.
pub struct SupportedTypesPruner {
    supported: HashSet<DataType>,
}

impl SupportedTypesPruner {
    pub fn new(supported: impl IntoIterator<Item = DataType>) -> Self {
        Self {
            supported: supported.into_iter().collect(),
        }
    }
}

impl TreePruner for SupportedTypesPruner {
    fn visit(&self, node: Node, _depth: usize) -> Option<Node> {
        match &node {
            Node::Column { data_type, .. } if !self.supported.contains(data_type) => None,
            _ => Some(node),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn supported_cmp() -> Node {
        Node::comparison(
            Operator::GreaterThan,
            Node::column("id", 0, DataType::BigInt),
            Node::scalar("5", DataType::BigInt),
        )
    }

    fn unsupported_cmp() -> Node {
        Node::comparison(
            Operator::Like,
            Node::column("name", 1, DataType::Text),
            Node::scalar("a%", DataType::Text),
        )
    }

    fn operator_pruner() -> SupportedOperatorPruner {
        SupportedOperatorPruner::new([
            Operator::GreaterThan,
            Operator::Equal,
            Operator::And,
            Operator::Or,
        ])
    }

    #[test]
    fn test_supported_tree_is_untouched() {
        let tree = Node::and(supported_cmp(), supported_cmp());
        let expected = tree.clone();
        assert_eq!(prune(tree, &operator_pruner()), Some(expected));
    }

    #[test]
    fn test_and_with_one_unsupported_child_collapses_to_survivor() {
        let tree = Node::and(supported_cmp(), unsupported_cmp());
        // Not a one-child AND node: the survivor replaces it.
        assert_eq!(prune(tree, &operator_pruner()), Some(supported_cmp()));
    }

    #[test]
    fn test_and_with_both_unsupported_children_prunes_to_none() {
        let tree = Node::and(unsupported_cmp(), unsupported_cmp());
        assert_eq!(prune(tree, &operator_pruner()), None);
    }

    #[test]
    fn test_collapse_propagates_upward() {
        // OR(AND(unsupported, unsupported), supported) -> supported
        let tree = Node::or(
            Node::and(unsupported_cmp(), unsupported_cmp()),
            supported_cmp(),
        );
        assert_eq!(prune(tree, &operator_pruner()), Some(supported_cmp()));
    }

    #[test]
    fn test_unsupported_logical_operator_drops_node() {
        let pruner = SupportedOperatorPruner::new([Operator::GreaterThan, Operator::Equal]);
        // AND itself unsupported: even with valid children the node goes.
        let tree = Node::and(supported_cmp(), supported_cmp());
        assert_eq!(prune(tree, &pruner), None);
    }

    #[test]
    fn test_not_losing_child_is_dropped() {
        let pruner = operator_pruner();
        let tree = Node::unary(Operator::Not, unsupported_cmp());
        // NOT is not in the supported set either way, but the child goes first.
        assert_eq!(prune(tree, &pruner), None);
    }

    #[test]
    fn test_type_pruner_collapses_comparison() {
        let pruner = SupportedTypesPruner::new([DataType::BigInt, DataType::Integer]);
        let tree = Node::and(
            supported_cmp(),
            Node::comparison(
                Operator::Equal,
                Node::column("name", 1, DataType::Text),
                Node::scalar("x", DataType::Text),
            ),
        );
        // Text column leaf pruned -> comparison collapses -> AND collapses.
        assert_eq!(prune(tree, &pruner), Some(supported_cmp()));
    }

    #[test]
    fn test_chain_applies_passes_in_order() {
        let ops = operator_pruner();
        let types = SupportedTypesPruner::new([DataType::BigInt]);
        let tree = Node::and(
            Node::and(supported_cmp(), unsupported_cmp()),
            Node::comparison(
                Operator::Equal,
                Node::column("name", 1, DataType::Text),
                Node::scalar("x", DataType::Text),
            ),
        );
        let pruned = prune_chain(tree, &[&ops, &types]);
        assert_eq!(pruned, Some(supported_cmp()));
    }
}
