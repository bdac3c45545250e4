//! Metric tree merging.
//!
//! A metric tree is the call-tree-shaped breakdown of where execution time
//! was spent, aggregated across many transaction executions. Merging folds
//! any number of trees into one by matching siblings on exact name equality
//! and summing their totals.

use serde::{Deserialize, Serialize};

/// One node of a metric tree.
///
/// Sibling names are unique and sibling order is first-seen order, which
/// merging preserves across inputs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricNode {
    /// Timer name, unique among siblings. Empty only at a synthetic root.
    pub name: String,
    /// Total time spent in this timer, microseconds
    pub total_micros: u64,
    /// Number of times this timer was started
    pub count: u64,
    /// Child timers, in first-seen order
    pub children: Vec<MetricNode>,
}

impl MetricNode {
    /// Creates a leaf node
    pub fn new<S: Into<String>>(name: S, total_micros: u64, count: u64) -> Self {
        MetricNode {
            name: name.into(),
            total_micros,
            count,
            children: Vec::new(),
        }
    }

    /// Creates a node with children
    pub fn with_children<S: Into<String>>(
        name: S,
        total_micros: u64,
        count: u64,
        children: Vec<MetricNode>,
    ) -> Self {
        MetricNode {
            name: name.into(),
            total_micros,
            count,
            children,
        }
    }

    /// Creates the synthetic root that wraps multiple real roots
    pub fn synthetic_root() -> Self {
        MetricNode::new("", 0, 0)
    }

    /// Returns true if this is a synthetic multi-root wrapper
    pub fn is_synthetic_root(&self) -> bool {
        self.name.is_empty()
    }

    /// The top-level real timers: the children of a synthetic root, or the
    /// node itself.
    pub fn top_level_timers(&self) -> &[MetricNode] {
        if self.is_synthetic_root() {
            &self.children
        } else {
            std::slice::from_ref(self)
        }
    }

    /// Finds a direct child by name
    pub fn child(&self, name: &str) -> Option<&MetricNode> {
        self.children.iter().find(|c| c.name == name)
    }
}

/// Merges metric trees into one.
///
/// Each input is consumed and either folded into a matched node or moved
/// into the output as a new subtree, so no two trees ever share state. A
/// synthetic-root input contributes its children directly, which makes the
/// merge closed under repeated application. If the result has exactly one
/// real root the synthetic wrapper is stripped.
pub fn merge_metric_trees(roots: Vec<MetricNode>) -> MetricNode {
    let mut acc = MetricNode::synthetic_root();
    for root in roots {
        if root.is_synthetic_root() {
            for child in root.children {
                fold_sibling(&mut acc.children, child);
            }
        } else {
            fold_sibling(&mut acc.children, root);
        }
    }
    if acc.children.len() == 1 {
        acc.children.pop().unwrap()
    } else {
        acc
    }
}

fn fold_sibling(siblings: &mut Vec<MetricNode>, node: MetricNode) {
    match siblings.iter_mut().find(|s| s.name == node.name) {
        Some(existing) => {
            existing.total_micros += node.total_micros;
            existing.count += node.count;
            for child in node.children {
                fold_sibling(&mut existing.children, child);
            }
        },
        None => siblings.push(node),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn servlet_with_jdbc(total: u64, jdbc_total: u64) -> MetricNode {
        MetricNode::with_children(
            "servlet",
            total,
            1,
            vec![MetricNode::new("jdbc query", jdbc_total, 1)],
        )
    }

    #[test]
    fn test_merge_nested_trees() {
        let merged = merge_metric_trees(vec![
            servlet_with_jdbc(100, 100),
            servlet_with_jdbc(200, 200),
            MetricNode::new("servlet", 50, 1),
        ]);

        assert_eq!(merged.name, "servlet");
        assert_eq!(merged.total_micros, 350);
        assert_eq!(merged.count, 3);
        let jdbc = merged.child("jdbc query").unwrap();
        assert_eq!(jdbc.total_micros, 300);
        assert_eq!(jdbc.count, 2);
    }

    #[test]
    fn test_merge_order_independence() {
        let a = servlet_with_jdbc(100, 40);
        let b = MetricNode::new("async task", 75, 3);
        let c = servlet_with_jdbc(25, 10);

        let forward = merge_metric_trees(vec![a.clone(), b.clone(), c.clone()]);
        let backward = merge_metric_trees(vec![c, b, a]);

        // Child ordering may differ, totals may not.
        assert_eq!(forward.top_level_timers().len(), backward.top_level_timers().len());
        for timer in forward.top_level_timers() {
            let other = backward
                .top_level_timers()
                .iter()
                .find(|t| t.name == timer.name)
                .unwrap();
            assert_eq!(timer.total_micros, other.total_micros);
            assert_eq!(timer.count, other.count);
        }
    }

    #[test]
    fn test_self_merge_idempotence() {
        let tree = servlet_with_jdbc(100, 40);
        let merged = merge_metric_trees(vec![tree.clone()]);
        assert_eq!(merged, tree);
    }

    #[test]
    fn test_multiple_roots_keep_synthetic_wrapper() {
        let merged = merge_metric_trees(vec![
            MetricNode::new("servlet", 100, 1),
            MetricNode::new("background job", 20, 1),
        ]);
        assert!(merged.is_synthetic_root());
        assert_eq!(merged.children.len(), 2);
        // First-seen order preserved.
        assert_eq!(merged.children[0].name, "servlet");
        assert_eq!(merged.children[1].name, "background job");
    }

    #[test]
    fn test_synthetic_input_unfolds() {
        let prior = merge_metric_trees(vec![
            MetricNode::new("servlet", 100, 1),
            MetricNode::new("background job", 20, 1),
        ]);
        let merged = merge_metric_trees(vec![prior, MetricNode::new("servlet", 50, 1)]);
        assert!(merged.is_synthetic_root());
        assert_eq!(merged.child("servlet").unwrap().total_micros, 150);
        assert_eq!(merged.child("background job").unwrap().total_micros, 20);
    }

    #[test]
    fn test_empty_input_yields_synthetic_root() {
        let merged = merge_metric_trees(Vec::new());
        assert!(merged.is_synthetic_root());
        assert!(merged.children.is_empty());
    }
}
