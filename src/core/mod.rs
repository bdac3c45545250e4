//! Core domain models for the query engine.
//!
//! This module contains the value types that flow between the persistence
//! DAO, the live collector registry, and the merge pipeline.

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{ChartConfig, Config, ProfileConfig, RollupConfig};
pub use error::{Result, VantageError};
pub use types::{
    Aggregate, ErrorPoint, ErrorSortOrder, OverallErrorSummary, OverallSummary, SummarySortOrder,
    TransactionErrorSummary, TransactionKey, TransactionSummary,
};
