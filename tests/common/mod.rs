//! Common test fixtures: an in-memory DAO and a fake live registry.

#![allow(dead_code)]

use std::sync::Arc;
use vantage::codec::{encode_metric_tree, encode_profile_tree};
use vantage::core::{
    Aggregate, ErrorPoint, OverallErrorSummary, OverallSummary, Result, TransactionErrorSummary,
    TransactionKey, TransactionSummary,
};
use vantage::merge::{LatencyHistogram, MetricNode, ProfileNode};
use vantage::query::{AggregateDao, IntervalCollector, LiveRegistry};

/// Builds aggregate rows with sensible defaults.
pub struct AggregateBuilder {
    capture_time: i64,
    total_micros: u64,
    transaction_count: u64,
    error_count: u64,
    latencies: Vec<u64>,
    tree: MetricNode,
    profile: Option<ProfileNode>,
}

impl AggregateBuilder {
    pub fn new(capture_time: i64) -> Self {
        Self {
            capture_time,
            total_micros: 1_000,
            transaction_count: 1,
            error_count: 0,
            latencies: vec![1_000],
            tree: MetricNode::new("servlet", 1_000, 1),
            profile: None,
        }
    }

    pub fn totals(mut self, total_micros: u64, transaction_count: u64) -> Self {
        self.total_micros = total_micros;
        self.transaction_count = transaction_count;
        self
    }

    pub fn errors(mut self, error_count: u64) -> Self {
        self.error_count = error_count;
        self
    }

    pub fn latencies(mut self, latencies: &[u64]) -> Self {
        self.latencies = latencies.to_vec();
        self
    }

    pub fn tree(mut self, tree: MetricNode) -> Self {
        self.tree = tree;
        self
    }

    pub fn profile(mut self, profile: ProfileNode) -> Self {
        self.profile = Some(profile);
        self
    }

    pub fn build(self) -> Aggregate {
        let mut histogram = LatencyHistogram::new(3).unwrap();
        for latency in &self.latencies {
            histogram.record(*latency).unwrap();
        }
        let profile_sample_count = self.profile.as_ref().map(|p| p.sample_count);
        Aggregate {
            capture_time: self.capture_time,
            total_micros: self.total_micros,
            transaction_count: self.transaction_count,
            error_count: self.error_count,
            total_cpu_micros: None,
            total_blocked_micros: None,
            total_waited_micros: None,
            total_allocated_bytes: None,
            metric_tree: encode_metric_tree(&self.tree).unwrap(),
            profile_tree: self
                .profile
                .as_ref()
                .map(|p| encode_profile_tree(p).unwrap()),
            profile_sample_count,
            histogram: histogram.encode().unwrap(),
        }
    }
}

/// In-memory persistence DAO. Rows are stored per (key, rollup level);
/// summaries derive from the stored rows.
#[derive(Default)]
pub struct InMemoryDao {
    rows: Vec<(TransactionKey, u32, Aggregate)>,
}

impl InMemoryDao {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_row(&mut self, key: TransactionKey, rollup_level: u32, row: Aggregate) {
        self.rows.push((key, rollup_level, row));
    }

    fn rows_for(&self, key: &TransactionKey, from: i64, to: i64, level: u32) -> Vec<&Aggregate> {
        self.rows
            .iter()
            .filter(|(k, l, row)| {
                k == key && *l == level && (from..=to).contains(&row.capture_time)
            })
            .map(|(_, _, row)| row)
            .collect()
    }

    fn named_rows(&self, transaction_type: &str, from: i64, to: i64) -> Vec<(&str, &Aggregate)> {
        self.rows
            .iter()
            .filter(|(k, l, row)| {
                k.transaction_type() == transaction_type
                    && k.transaction_name().is_some()
                    && *l == 0
                    && (from..=to).contains(&row.capture_time)
            })
            .map(|(k, _, row)| (k.transaction_name().unwrap(), row))
            .collect()
    }
}

#[async_trait::async_trait]
impl AggregateDao for InMemoryDao {
    async fn read_aggregates(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
        rollup_level: u32,
    ) -> Result<Vec<Aggregate>> {
        Ok(self
            .rows_for(key, from, to, rollup_level)
            .into_iter()
            .cloned()
            .collect())
    }

    async fn read_overall_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallSummary> {
        let key = TransactionKey::overall(transaction_type)?;
        let mut summary = OverallSummary::default();
        for row in self.rows_for(&key, from, to, 0) {
            summary.total_micros += row.total_micros;
            summary.transaction_count += row.transaction_count;
        }
        Ok(summary)
    }

    async fn read_transaction_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<TransactionSummary>> {
        let mut summaries: Vec<TransactionSummary> = Vec::new();
        for (name, row) in self.named_rows(transaction_type, from, to) {
            match summaries.iter_mut().find(|s| s.transaction_name == name) {
                Some(s) => {
                    s.total_micros += row.total_micros;
                    s.transaction_count += row.transaction_count;
                },
                None => summaries.push(TransactionSummary {
                    transaction_name: name.to_string(),
                    total_micros: row.total_micros,
                    transaction_count: row.transaction_count,
                }),
            }
        }
        Ok(summaries)
    }

    async fn read_overall_error_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallErrorSummary> {
        let key = TransactionKey::overall(transaction_type)?;
        let mut summary = OverallErrorSummary::default();
        for row in self.rows_for(&key, from, to, 0) {
            summary.error_count += row.error_count;
            summary.transaction_count += row.transaction_count;
        }
        Ok(summary)
    }

    async fn read_transaction_error_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<Vec<TransactionErrorSummary>> {
        let mut summaries: Vec<TransactionErrorSummary> = Vec::new();
        for (name, row) in self.named_rows(transaction_type, from, to) {
            match summaries.iter_mut().find(|s| s.transaction_name == name) {
                Some(s) => {
                    s.error_count += row.error_count;
                    s.transaction_count += row.transaction_count;
                },
                None => summaries.push(TransactionErrorSummary {
                    transaction_name: name.to_string(),
                    error_count: row.error_count,
                    transaction_count: row.transaction_count,
                }),
            }
        }
        Ok(summaries)
    }

    async fn read_error_points(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<ErrorPoint>> {
        Ok(self
            .rows_for(key, from, to, 0)
            .into_iter()
            .map(|row| ErrorPoint {
                capture_time: row.capture_time,
                error_count: row.error_count,
                transaction_count: row.transaction_count,
            })
            .collect())
    }

    async fn read_profiles(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<Vec<u8>>> {
        Ok(self
            .rows_for(key, from, to, 0)
            .into_iter()
            .filter_map(|row| row.profile_tree.clone())
            .collect())
    }
}

/// One fake still-open aggregation window backed by per-key snapshots.
pub struct FakeCollector {
    end_time: i64,
    snapshots: Vec<(TransactionKey, Aggregate)>,
}

impl FakeCollector {
    pub fn new(end_time: i64) -> Self {
        Self {
            end_time,
            snapshots: Vec::new(),
        }
    }

    pub fn insert(mut self, key: TransactionKey, aggregate: Aggregate) -> Self {
        self.snapshots.push((key, aggregate));
        self
    }

    fn snapshot(&self, key: &TransactionKey) -> Option<&Aggregate> {
        self.snapshots.iter().find(|(k, _)| k == key).map(|(_, a)| a)
    }
}

impl IntervalCollector for FakeCollector {
    fn end_time(&self) -> i64 {
        self.end_time
    }

    fn live_aggregate(&self, key: &TransactionKey) -> Option<Aggregate> {
        self.snapshot(key).cloned()
    }

    fn live_overall_summary(&self, transaction_type: &str) -> Option<OverallSummary> {
        let key = TransactionKey::overall(transaction_type).unwrap();
        self.snapshot(&key).map(|a| OverallSummary {
            total_micros: a.total_micros,
            transaction_count: a.transaction_count,
        })
    }

    fn live_transaction_summaries(&self, transaction_type: &str) -> Vec<TransactionSummary> {
        self.snapshots
            .iter()
            .filter(|(k, _)| {
                k.transaction_type() == transaction_type && k.transaction_name().is_some()
            })
            .map(|(k, a)| TransactionSummary {
                transaction_name: k.transaction_name().unwrap().to_string(),
                total_micros: a.total_micros,
                transaction_count: a.transaction_count,
            })
            .collect()
    }

    fn live_overall_error_summary(&self, transaction_type: &str) -> Option<OverallErrorSummary> {
        let key = TransactionKey::overall(transaction_type).unwrap();
        self.snapshot(&key).map(|a| OverallErrorSummary {
            error_count: a.error_count,
            transaction_count: a.transaction_count,
        })
    }

    fn live_transaction_error_summaries(
        &self,
        transaction_type: &str,
    ) -> Vec<TransactionErrorSummary> {
        self.snapshots
            .iter()
            .filter(|(k, _)| {
                k.transaction_type() == transaction_type && k.transaction_name().is_some()
            })
            .map(|(k, a)| TransactionErrorSummary {
                transaction_name: k.transaction_name().unwrap().to_string(),
                error_count: a.error_count,
                transaction_count: a.transaction_count,
            })
            .collect()
    }

    fn live_error_point(&self, key: &TransactionKey) -> Option<ErrorPoint> {
        self.snapshot(key).map(|a| ErrorPoint {
            capture_time: a.capture_time,
            error_count: a.error_count,
            transaction_count: a.transaction_count,
        })
    }

    fn live_profile(&self, key: &TransactionKey) -> Option<Vec<u8>> {
        self.snapshot(key).and_then(|a| a.profile_tree.clone())
    }

    fn live_profile_sample_count(&self, key: &TransactionKey) -> Option<u64> {
        self.snapshot(key).and_then(|a| a.profile_sample_count)
    }
}

/// Fake live registry over a fixed collector list.
#[derive(Default)]
pub struct FakeLiveRegistry {
    collectors: Vec<Arc<FakeCollector>>,
}

impl FakeLiveRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, collector: FakeCollector) {
        self.collectors.push(Arc::new(collector));
        self.collectors.sort_by_key(|c| c.end_time());
    }
}

#[async_trait::async_trait]
impl LiveRegistry for FakeLiveRegistry {
    async fn ordered_collectors_in_range(
        &self,
        from: i64,
        _to: i64,
    ) -> Result<Vec<Arc<dyn IntervalCollector>>> {
        Ok(self
            .collectors
            .iter()
            .filter(|c| c.end_time() > from)
            .map(|c| c.clone() as Arc<dyn IntervalCollector>)
            .collect())
    }
}
