//! Recursive tree and histogram merging.
//!
//! Everything here operates on freshly-owned values: merge inputs are
//! consumed, outputs never alias an input, so merged results are safe to
//! hand across task boundaries without locking.

pub mod histogram;
pub mod metric;
pub mod profile;

pub use histogram::{merge_histograms, LatencyHistogram};
pub use metric::{merge_metric_trees, MetricNode};
pub use profile::{flame_graph, merge_profile_trees, truncate, FlameNode, ProfileNode, ProfileOutcome};
