//! Vantage - query-time aggregation engine for APM backends.
//!
//! Vantage answers "what happened between time A and time B" for an
//! application-performance-monitoring backend by reconciling durable
//! rolled-up aggregates with still-in-memory live data, merging call-time
//! trees and stack-sampling profiles across many transaction executions,
//! and folding compressed latency histograms for percentile queries.
//!
//! # Architecture
//!
//! - `core`: domain models, configuration, errors
//! - `codec`: blob codecs for persisted tree payloads
//! - `merge`: recursive tree merging and histogram addition
//! - `series`: top-N selection and gap-aware chart series
//! - `rollup`: on-the-fly coarsening of fine-grained rows
//! - `query`: the live/persisted boundary reconciler and its two
//!   collaborator traits
//!
//! The capture pipeline, durable storage engine, and HTTP/JSON transport
//! are external collaborators reached only through the traits in `query`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use vantage::core::{Config, TransactionKey};
//! use vantage::query::{AggregateDao, LiveRegistry, TimeRangeReconciler};
//!
//! async fn overall(dao: Arc<dyn AggregateDao>, live: Arc<dyn LiveRegistry>) {
//!     let reconciler = TimeRangeReconciler::new(dao, live, Config::default());
//!     let summary = reconciler
//!         .overall_summary("Web", 1_000, 60_000)
//!         .await
//!         .unwrap();
//!     println!("{} transactions", summary.transaction_count);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

pub mod codec;
pub mod core;
pub mod merge;
pub mod query;
pub mod rollup;
pub mod series;

// Re-export core types for convenience
pub use crate::core::{Config, Result};
