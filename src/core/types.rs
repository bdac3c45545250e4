//! Value types flowing between the DAO, the live registry, and the
//! merge pipeline.

use crate::core::error::{Result, VantageError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one stream of aggregated transactions.
///
/// A key is either type-scoped (`transaction_name == None`, covering every
/// transaction of that type) or name-scoped (one specific transaction).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionKey {
    transaction_type: String,
    transaction_name: Option<String>,
}

impl TransactionKey {
    /// Creates a type-scoped key after validation
    pub fn overall<S: Into<String>>(transaction_type: S) -> Result<Self> {
        let transaction_type = transaction_type.into();
        if transaction_type.is_empty() {
            return Err(VantageError::invalid_query("transaction type cannot be empty"));
        }
        Ok(TransactionKey {
            transaction_type,
            transaction_name: None,
        })
    }

    /// Creates a name-scoped key after validation
    pub fn named<S: Into<String>, N: Into<String>>(transaction_type: S, name: N) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(VantageError::invalid_query("transaction name cannot be empty"));
        }
        let mut key = Self::overall(transaction_type)?;
        key.transaction_name = Some(name);
        Ok(key)
    }

    /// Returns the transaction type
    pub fn transaction_type(&self) -> &str {
        &self.transaction_type
    }

    /// Returns the transaction name, if this key is name-scoped
    pub fn transaction_name(&self) -> Option<&str> {
        self.transaction_name.as_deref()
    }
}

impl fmt::Display for TransactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.transaction_name {
            Some(name) => write!(f, "{}/{}", self.transaction_type, name),
            None => write!(f, "{}", self.transaction_type),
        }
    }
}

/// One fixed-interval aggregation row for a transaction key.
///
/// `capture_time` is the end of the interval in milliseconds since the epoch.
/// The tree and histogram payloads are opaque encoded blobs; see the `codec`
/// and `merge::histogram` modules for the decode contracts. Persisted rows
/// are immutable once written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Aggregate {
    /// End of the aggregation interval, ms since epoch
    pub capture_time: i64,
    /// Total transaction time, microseconds
    pub total_micros: u64,
    /// Number of transactions in the interval
    pub transaction_count: u64,
    /// Number of transactions that ended with an error
    pub error_count: u64,
    /// Total CPU time, microseconds (absent when not captured)
    pub total_cpu_micros: Option<u64>,
    /// Total blocked time, microseconds (absent when not captured)
    pub total_blocked_micros: Option<u64>,
    /// Total waited time, microseconds (absent when not captured)
    pub total_waited_micros: Option<u64>,
    /// Total allocated memory, bytes (absent when not captured)
    pub total_allocated_bytes: Option<u64>,
    /// Encoded metric tree (see `codec::encode_metric_tree`)
    pub metric_tree: Vec<u8>,
    /// Encoded profile tree, when stack sampling captured anything
    pub profile_tree: Option<Vec<u8>>,
    /// Number of stack samples behind `profile_tree`
    pub profile_sample_count: Option<u64>,
    /// Encoded latency histogram (see `merge::histogram`)
    pub histogram: Vec<u8>,
}

/// Summary totals across every transaction of a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallSummary {
    /// Total transaction time, microseconds
    pub total_micros: u64,
    /// Number of transactions
    pub transaction_count: u64,
}

impl OverallSummary {
    /// Folds another summary into this one
    pub fn add(&mut self, other: &OverallSummary) {
        self.total_micros += other.total_micros;
        self.transaction_count += other.transaction_count;
    }
}

/// Summary totals for one named transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionSummary {
    /// Transaction name
    pub transaction_name: String,
    /// Total transaction time, microseconds
    pub total_micros: u64,
    /// Number of transactions
    pub transaction_count: u64,
}

impl TransactionSummary {
    /// Average transaction time in microseconds, 0.0 when empty
    pub fn average_micros(&self) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            self.total_micros as f64 / self.transaction_count as f64
        }
    }
}

/// Error totals across every transaction of a type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverallErrorSummary {
    /// Number of transactions that ended with an error
    pub error_count: u64,
    /// Number of transactions overall
    pub transaction_count: u64,
}

impl OverallErrorSummary {
    /// Folds another summary into this one
    pub fn add(&mut self, other: &OverallErrorSummary) {
        self.error_count += other.error_count;
        self.transaction_count += other.transaction_count;
    }
}

/// Error totals for one named transaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionErrorSummary {
    /// Transaction name
    pub transaction_name: String,
    /// Number of transactions that ended with an error
    pub error_count: u64,
    /// Number of transactions overall
    pub transaction_count: u64,
}

impl TransactionErrorSummary {
    /// Error rate in [0.0, 1.0], 0.0 when empty
    pub fn error_rate(&self) -> f64 {
        if self.transaction_count == 0 {
            0.0
        } else {
            self.error_count as f64 / self.transaction_count as f64
        }
    }
}

/// One time point on an error chart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPoint {
    /// End of the interval, ms since epoch
    pub capture_time: i64,
    /// Number of transactions that ended with an error
    pub error_count: u64,
    /// Number of transactions overall
    pub transaction_count: u64,
}

/// Sort orders for transaction summary queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummarySortOrder {
    /// Descending by total transaction time
    TotalTime,
    /// Descending by average transaction time
    AverageTime,
    /// Descending by transaction count
    Throughput,
}

/// Sort orders for error summary queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorSortOrder {
    /// Descending by error count
    ErrorCount,
    /// Descending by error rate
    ErrorRate,
}
