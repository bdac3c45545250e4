//! Query orchestration over persisted and live data.

pub mod dao;
pub mod reconciler;

pub use dao::{AggregateDao, IntervalCollector, LiveRegistry};
pub use reconciler::TimeRangeReconciler;
