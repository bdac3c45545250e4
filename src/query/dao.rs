//! External collaborator traits.
//!
//! The query engine reads from exactly two sources: the persistence DAO for
//! durable rows and the live registry for still-open aggregation windows.
//! Both are supplied by the embedding application; everything here is a
//! boundary contract, not an implementation.

use crate::core::{
    Aggregate, ErrorPoint, OverallErrorSummary, OverallSummary, Result, TransactionErrorSummary,
    TransactionKey, TransactionSummary,
};
use std::sync::Arc;

/// Read access to durably stored aggregate rows.
///
/// All time ranges are inclusive on both ends and results come back
/// ascending by capture time. `rollup_level` 0 is the fine-grained table;
/// higher levels are precomputed coarse tables.
#[async_trait::async_trait]
pub trait AggregateDao: Send + Sync {
    /// Read aggregate rows for a key
    async fn read_aggregates(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
        rollup_level: u32,
    ) -> Result<Vec<Aggregate>>;

    /// Read the summed summary across every transaction of a type
    async fn read_overall_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallSummary>;

    /// Read per-name summaries for a type (unsorted, unlimited)
    async fn read_transaction_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<TransactionSummary>>;

    /// Read the summed error summary across every transaction of a type
    async fn read_overall_error_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallErrorSummary>;

    /// Read per-name error summaries for a type (unsorted, unlimited)
    async fn read_transaction_error_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<TransactionErrorSummary>>;

    /// Read one error point per stored interval for a key
    async fn read_error_points(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<ErrorPoint>>;

    /// Read encoded profile tree blobs for a key
    async fn read_profiles(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<Vec<u8>>>;
}

/// Registry of still-open aggregation windows.
#[async_trait::async_trait]
pub trait LiveRegistry: Send + Sync {
    /// Collectors whose windows overlap the range, ascending by end time.
    ///
    /// The contract behind boundary reconciliation: a collector's window is
    /// flushed to durable storage atomically at its end time, so any window
    /// ending before the earliest still-open one is already durable.
    async fn ordered_collectors_in_range(
        &self,
        from: i64,
        to: i64,
    ) -> Result<Vec<Arc<dyn IntervalCollector>>>;
}

/// One still-open, in-memory aggregation window.
///
/// Every accessor returns a point-in-time, internally consistent snapshot;
/// the capture pipeline writing the collector never hands out data that is
/// mid-update. Absent data is `None` or empty, never an error.
pub trait IntervalCollector: Send + Sync {
    /// Fixed end time of this collector's window, ms since epoch
    fn end_time(&self) -> i64;

    /// Snapshot of the accumulating aggregate for a key, with capture time
    /// set to the collector's most recent capture
    fn live_aggregate(&self, key: &TransactionKey) -> Option<Aggregate>;

    /// Snapshot summary across every transaction of a type
    fn live_overall_summary(&self, transaction_type: &str) -> Option<OverallSummary>;

    /// Snapshot per-name summaries for a type
    fn live_transaction_summaries(&self, transaction_type: &str) -> Vec<TransactionSummary>;

    /// Snapshot error summary across every transaction of a type
    fn live_overall_error_summary(&self, transaction_type: &str) -> Option<OverallErrorSummary>;

    /// Snapshot per-name error summaries for a type
    fn live_transaction_error_summaries(
        &self,
        transaction_type: &str,
    ) -> Vec<TransactionErrorSummary>;

    /// Snapshot error point for a key at the most recent capture time
    fn live_error_point(&self, key: &TransactionKey) -> Option<ErrorPoint>;

    /// Snapshot encoded profile tree for a key
    fn live_profile(&self, key: &TransactionKey) -> Option<Vec<u8>>;

    /// Snapshot profile sample count for a key
    fn live_profile_sample_count(&self, key: &TransactionKey) -> Option<u64>;
}
