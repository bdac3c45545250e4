//! Profile tree merging, truncation, and flame-graph shaping.
//!
//! A profile tree records stack-sample counts per call-stack position,
//! aggregated across many transaction executions. Node identity for merging
//! is the (frame, leaf thread state) pair: the same frame sampled while
//! executing and while merely on-stack are distinct chart entries.

use serde::{Deserialize, Serialize};

/// One node of a stack-sampling profile tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileNode {
    /// Stack frame label. `None` only at a synthetic root.
    pub frame: Option<String>,
    /// Thread state when this frame was sampled as the executing leaf,
    /// `None` when it was only ever seen mid-stack.
    pub leaf_thread_state: Option<String>,
    /// Number of samples that passed through this position
    pub sample_count: u64,
    /// Metric names associated with this frame. Partially-captured stacks
    /// can disagree on the list; the longer one wins during merge.
    pub metric_names: Vec<String>,
    /// Child frames, in first-seen order
    pub children: Vec<ProfileNode>,
    /// True when child subtrees were dropped by truncation
    pub ellipsed: bool,
}

impl ProfileNode {
    /// Creates a frame node with no children
    pub fn frame<S: Into<String>>(frame: S, sample_count: u64) -> Self {
        ProfileNode {
            frame: Some(frame.into()),
            leaf_thread_state: None,
            sample_count,
            metric_names: Vec::new(),
            children: Vec::new(),
            ellipsed: false,
        }
    }

    /// Creates a frame node sampled as the executing leaf
    pub fn leaf<S: Into<String>, T: Into<String>>(
        frame: S,
        thread_state: T,
        sample_count: u64,
    ) -> Self {
        ProfileNode {
            frame: Some(frame.into()),
            leaf_thread_state: Some(thread_state.into()),
            sample_count,
            metric_names: Vec::new(),
            children: Vec::new(),
            ellipsed: false,
        }
    }

    /// Creates the synthetic root that wraps multiple real roots
    pub fn synthetic_root() -> Self {
        ProfileNode {
            frame: None,
            leaf_thread_state: None,
            sample_count: 0,
            metric_names: Vec::new(),
            children: Vec::new(),
            ellipsed: false,
        }
    }

    /// Returns true if this is a synthetic multi-root wrapper
    pub fn is_synthetic_root(&self) -> bool {
        self.frame.is_none()
    }

    /// Attaches children, returning self (test/fixture convenience)
    pub fn with_children(mut self, children: Vec<ProfileNode>) -> Self {
        self.children = children;
        self
    }

    /// Attaches metric names, returning self
    pub fn with_metric_names<S: Into<String>>(mut self, names: Vec<S>) -> Self {
        self.metric_names = names.into_iter().map(Into::into).collect();
        self
    }

    fn matches(&self, other: &ProfileNode) -> bool {
        self.frame == other.frame && self.leaf_thread_state == other.leaf_thread_state
    }
}

/// Result of merging and truncating profile trees.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileOutcome {
    /// No samples survived (or none existed)
    NoData,
    /// The merged tree; a single real root is unwrapped, multiple real
    /// roots stay under a synthetic wrapper
    Tree(ProfileNode),
}

impl ProfileOutcome {
    /// Returns the tree, if any data survived
    pub fn tree(&self) -> Option<&ProfileNode> {
        match self {
            ProfileOutcome::Tree(node) => Some(node),
            ProfileOutcome::NoData => None,
        }
    }
}

/// Merges profile trees into one under a synthetic root.
///
/// Inputs are consumed; matched nodes accumulate sample counts, unmatched
/// subtrees move into the output. The synthetic root's sample count ends up
/// as the total across all inputs. Callers pass the result to [`truncate`]
/// before exposing it.
pub fn merge_profile_trees(roots: Vec<ProfileNode>) -> ProfileNode {
    let mut acc = ProfileNode::synthetic_root();
    for root in roots {
        acc.sample_count += root.sample_count;
        acc.ellipsed |= root.ellipsed;
        if root.is_synthetic_root() {
            for child in root.children {
                fold_sibling(&mut acc.children, child);
            }
        } else {
            fold_sibling(&mut acc.children, root);
        }
    }
    acc
}

fn fold_sibling(siblings: &mut Vec<ProfileNode>, node: ProfileNode) {
    match siblings.iter_mut().find(|s| s.matches(&node)) {
        Some(existing) => {
            existing.sample_count += node.sample_count;
            existing.ellipsed |= node.ellipsed;
            // Partially-captured stacks report shorter metric-name lists;
            // the longer list is the more complete capture.
            if node.metric_names.len() > existing.metric_names.len() {
                existing.metric_names = node.metric_names;
            }
            for child in node.children {
                fold_sibling(&mut existing.children, child);
            }
        },
        None => siblings.push(node),
    }
}

/// Truncates low-sample subtrees from a merged profile.
///
/// Any child subtree whose own sample count falls below
/// `total_samples * truncate_leaf_fraction` is dropped and the parent's
/// `ellipsed` flag is set. Returns [`ProfileOutcome::NoData`] when nothing
/// survives at the top level, the unwrapped child when exactly one does.
pub fn truncate(mut root: ProfileNode, truncate_leaf_fraction: f64) -> ProfileOutcome {
    let min_samples = root.sample_count as f64 * truncate_leaf_fraction;
    truncate_node(&mut root, min_samples);
    tracing::debug!(
        total_samples = root.sample_count,
        min_samples,
        top_level = root.children.len(),
        "truncated profile"
    );
    match root.children.len() {
        0 => ProfileOutcome::NoData,
        1 => {
            let mut child = root.children.pop().unwrap();
            child.ellipsed |= root.ellipsed;
            ProfileOutcome::Tree(child)
        },
        _ => ProfileOutcome::Tree(root),
    }
}

fn truncate_node(node: &mut ProfileNode, min_samples: f64) {
    let before = node.children.len();
    node.children.retain(|child| child.sample_count as f64 >= min_samples);
    if node.children.len() < before {
        node.ellipsed = true;
    }
    for child in &mut node.children {
        truncate_node(child, min_samples);
    }
}

/// One node of the flame-graph chart shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlameNode {
    /// Frame label (empty at a synthetic root)
    pub label: String,
    /// Samples that ended at exactly this frame. Only meaningful for
    /// frames that were ever sampled as the executing leaf; 0 otherwise.
    pub unique_samples: u64,
    /// Samples that passed through this frame
    pub total_samples: u64,
    /// Child frames
    pub children: Vec<FlameNode>,
}

/// Shapes a merged profile tree for flame-graph rendering.
///
/// Descends single-child chains to the first branching node, skipping the
/// uninteresting common prefix; a descent that lands on a childless node
/// falls back to the original root so the chain itself stays visible.
pub fn flame_graph(root: &ProfileNode) -> FlameNode {
    let mut node = root;
    while node.children.len() == 1 {
        node = &node.children[0];
    }
    let visual_root = if node.children.is_empty() { root } else { node };
    build_flame(visual_root)
}

fn build_flame(node: &ProfileNode) -> FlameNode {
    let child_samples: u64 = node.children.iter().map(|c| c.sample_count).sum();
    let unique_samples = if node.leaf_thread_state.is_some() {
        node.sample_count.saturating_sub(child_samples)
    } else {
        0
    };
    FlameNode {
        label: node.frame.clone().unwrap_or_default(),
        unique_samples,
        total_samples: node.sample_count,
        children: node.children.iter().map(build_flame).collect(),
    }
}
