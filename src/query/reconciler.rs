//! Live/persisted boundary reconciliation.
//!
//! The reconciler answers "what happened between A and B" from two sources
//! that must never overlap: durable aggregate rows and still-open live
//! collectors. The boundary rule is the whole trick: collectors come back
//! ascending by window end time, and the persisted query is cut off at one
//! millisecond before the earliest still-open window. Anything that window
//! (or a later one) covers is not yet durable, and anything before it is,
//! so nothing is double-counted and nothing falls in the gap.

use crate::codec::decode_metric_tree;
use crate::codec::decode_profile_tree;
use crate::core::{
    Aggregate, Config, ErrorPoint, ErrorSortOrder, OverallErrorSummary, OverallSummary, Result,
    SummarySortOrder, TransactionErrorSummary, TransactionKey, TransactionSummary,
};
use crate::merge::histogram::LatencyHistogram;
use crate::merge::{
    flame_graph, merge_metric_trees, merge_profile_trees, truncate, FlameNode, MetricNode,
    ProfileOutcome,
};
use crate::query::dao::{AggregateDao, IntervalCollector, LiveRegistry};
use crate::rollup::rollup;
use crate::series::{bucket_values, select_top_contributors, ContributionBucket, DataSeries, SeriesGroup};
use ahash::AHashMap;
use std::cmp::Ordering;
use std::sync::Arc;

/// Top-level query orchestrator.
///
/// One instance serves many concurrent queries: it holds no mutable state,
/// every operation allocates its trees and series fresh, and the only
/// awaits are the two external reads.
pub struct TimeRangeReconciler {
    dao: Arc<dyn AggregateDao>,
    live: Arc<dyn LiveRegistry>,
    config: Config,
}

impl TimeRangeReconciler {
    /// Creates a reconciler over the two external sources
    pub fn new(dao: Arc<dyn AggregateDao>, live: Arc<dyn LiveRegistry>, config: Config) -> Self {
        TimeRangeReconciler { dao, live, config }
    }

    /// Fetches the live collectors overlapping the range and revises the
    /// persisted query's upper bound to just before the earliest one.
    async fn collectors_and_revised_to(
        &self,
        from: i64,
        to: i64,
    ) -> Result<(Vec<Arc<dyn IntervalCollector>>, i64)> {
        let collectors = self.live.ordered_collectors_in_range(from, to).await?;
        let revised_to = match collectors.first() {
            Some(earliest) => {
                let revised_to = earliest.end_time() - 1;
                tracing::debug!(from, to, revised_to, live_windows = collectors.len(),
                    "revised persisted boundary");
                revised_to
            },
            None => to,
        };
        Ok((collectors, revised_to))
    }

    /// Summed summary across every transaction of a type
    pub async fn overall_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallSummary> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let mut summary = self
            .dao
            .read_overall_summary(transaction_type, from, revised_to)
            .await?;
        for collector in &collectors {
            if let Some(live) = collector.live_overall_summary(transaction_type) {
                summary.add(&live);
            }
        }
        Ok(summary)
    }

    /// Per-name summaries, sorted and limited only after every source is
    /// merged — merging can change relative rank, so limiting the persisted
    /// side early would drop the wrong names.
    pub async fn transaction_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
        sort_order: SummarySortOrder,
        limit: usize,
    ) -> Result<Vec<TransactionSummary>> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let persisted = self
            .dao
            .read_transaction_summaries(transaction_type, from, revised_to)
            .await?;

        let mut merged: Vec<TransactionSummary> = Vec::new();
        let mut index: AHashMap<String, usize> = AHashMap::new();
        let fold = |summary: TransactionSummary,
                    merged: &mut Vec<TransactionSummary>,
                    index: &mut AHashMap<String, usize>| {
            match index.get(&summary.transaction_name) {
                Some(&i) => {
                    merged[i].total_micros += summary.total_micros;
                    merged[i].transaction_count += summary.transaction_count;
                },
                None => {
                    index.insert(summary.transaction_name.clone(), merged.len());
                    merged.push(summary);
                },
            }
        };
        for summary in persisted {
            fold(summary, &mut merged, &mut index);
        }
        for collector in &collectors {
            for summary in collector.live_transaction_summaries(transaction_type) {
                fold(summary, &mut merged, &mut index);
            }
        }

        match sort_order {
            SummarySortOrder::TotalTime => {
                merged.sort_by(|a, b| b.total_micros.cmp(&a.total_micros));
            },
            SummarySortOrder::AverageTime => {
                merged.sort_by(|a, b| {
                    b.average_micros()
                        .partial_cmp(&a.average_micros())
                        .unwrap_or(Ordering::Equal)
                });
            },
            SummarySortOrder::Throughput => {
                merged.sort_by(|a, b| b.transaction_count.cmp(&a.transaction_count));
            },
        }
        merged.truncate(limit);
        Ok(merged)
    }

    /// Summed error summary across every transaction of a type
    pub async fn overall_error_summary(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
    ) -> Result<OverallErrorSummary> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let mut summary = self
            .dao
            .read_overall_error_summary(transaction_type, from, revised_to)
            .await?;
        for collector in &collectors {
            if let Some(live) = collector.live_overall_error_summary(transaction_type) {
                summary.add(&live);
            }
        }
        Ok(summary)
    }

    /// Per-name error summaries, merged across all sources before sorting
    /// and limiting
    pub async fn transaction_error_summaries(
        &self,
        transaction_type: &str,
        from: i64,
        to: i64,
        sort_order: ErrorSortOrder,
        limit: usize,
    ) -> Result<Vec<TransactionErrorSummary>> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let persisted = self
            .dao
            .read_transaction_error_summaries(transaction_type, from, revised_to)
            .await?;

        let mut merged: Vec<TransactionErrorSummary> = Vec::new();
        let mut index: AHashMap<String, usize> = AHashMap::new();
        let fold = |summary: TransactionErrorSummary,
                    merged: &mut Vec<TransactionErrorSummary>,
                    index: &mut AHashMap<String, usize>| {
            match index.get(&summary.transaction_name) {
                Some(&i) => {
                    merged[i].error_count += summary.error_count;
                    merged[i].transaction_count += summary.transaction_count;
                },
                None => {
                    index.insert(summary.transaction_name.clone(), merged.len());
                    merged.push(summary);
                },
            }
        };
        for summary in persisted {
            fold(summary, &mut merged, &mut index);
        }
        for collector in &collectors {
            for summary in collector.live_transaction_error_summaries(transaction_type) {
                fold(summary, &mut merged, &mut index);
            }
        }

        match sort_order {
            ErrorSortOrder::ErrorCount => {
                merged.sort_by(|a, b| b.error_count.cmp(&a.error_count));
            },
            ErrorSortOrder::ErrorRate => {
                merged.sort_by(|a, b| {
                    b.error_rate()
                        .partial_cmp(&a.error_rate())
                        .unwrap_or(Ordering::Equal)
                });
            },
        }
        merged.truncate(limit);
        Ok(merged)
    }

    /// One error point per persisted interval plus one per live collector
    /// holding data for the key
    pub async fn error_points(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<ErrorPoint>> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let mut points = self.dao.read_error_points(key, from, revised_to).await?;
        for collector in &collectors {
            if let Some(point) = collector.live_error_point(key) {
                points.push(point);
            }
        }
        Ok(points)
    }

    /// Merged and truncated stack-sampling profile for the range
    pub async fn profile(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<ProfileOutcome> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let blobs = self.dao.read_profiles(key, from, revised_to).await?;
        let mut roots = Vec::with_capacity(blobs.len());
        for blob in &blobs {
            roots.push(decode_profile_tree(blob)?);
        }
        for collector in &collectors {
            if let Some(blob) = collector.live_profile(key) {
                roots.push(decode_profile_tree(&blob)?);
            }
        }
        if roots.is_empty() {
            return Ok(ProfileOutcome::NoData);
        }
        let merged = merge_profile_trees(roots);
        Ok(truncate(merged, self.config.profile.truncate_leaf_fraction))
    }

    /// Flame-graph shape of the merged profile, `None` when no data
    pub async fn profile_flame_graph(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Option<FlameNode>> {
        let outcome = self.profile(key, from, to).await?;
        Ok(outcome.tree().map(flame_graph))
    }

    /// Number of stack samples behind the profile for the range
    pub async fn profile_sample_count(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<u64> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let rows = self.dao.read_aggregates(key, from, revised_to, 0).await?;
        let mut total: u64 = rows.iter().filter_map(|r| r.profile_sample_count).sum();
        for collector in &collectors {
            if let Some(count) = collector.live_profile_sample_count(key) {
                total += count;
            }
        }
        Ok(total)
    }

    /// Merged metric tree across every row and live snapshot in the range
    pub async fn metric_tree(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<MetricNode> {
        let rows = self.aggregates(key, from, to).await?;
        let mut roots = Vec::with_capacity(rows.len());
        for row in &rows {
            roots.push(decode_metric_tree(&row.metric_tree)?);
        }
        Ok(merge_metric_trees(roots))
    }

    /// Aggregate rows for the range: fine-grained for short ranges, coarse
    /// plus a rolled-up tail for long ones, plus one row per live collector
    /// holding data for the key
    pub async fn aggregates(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<Aggregate>> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let mut rows = if self.needs_rollup(from, to) {
            self.read_rolled_up(key, from, revised_to).await?
        } else {
            self.dao.read_aggregates(key, from, revised_to, 0).await?
        };
        for collector in &collectors {
            if let Some(aggregate) = collector.live_aggregate(key) {
                rows.push(aggregate);
            }
        }
        Ok(rows)
    }

    /// Latency values at the requested percentiles (0..=100), merged across
    /// every row and live snapshot in the range
    pub async fn percentiles(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
        percentiles: &[f64],
    ) -> Result<Vec<u64>> {
        let (collectors, revised_to) = self.collectors_and_revised_to(from, to).await?;
        let rows = self.dao.read_aggregates(key, from, revised_to, 0).await?;
        let mut merged =
            LatencyHistogram::new(self.config.profile.histogram_significant_digits)?;
        for row in &rows {
            merged.merge_from(&LatencyHistogram::decode(&row.histogram)?)?;
        }
        for collector in &collectors {
            if let Some(aggregate) = collector.live_aggregate(key) {
                merged.merge_from(&LatencyHistogram::decode(&aggregate.histogram)?)?;
            }
        }
        Ok(percentiles.iter().map(|&p| merged.value_at_percentile(p)).collect())
    }

    /// Stacked chart of the top timers by average time per transaction,
    /// with the remainder folded into "Other". `now` is wall-clock ms,
    /// used for the final-downslope decision.
    pub async fn timer_chart(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
        now: i64,
    ) -> Result<Vec<DataSeries>> {
        let rows = self.aggregates(key, from, to).await?;
        let mut buckets = Vec::with_capacity(rows.len());
        for row in &rows {
            let tree = decode_metric_tree(&row.metric_tree)?;
            let contributions = tree
                .top_level_timers()
                .iter()
                .map(|timer| {
                    let average = if row.transaction_count == 0 {
                        0.0
                    } else {
                        timer.total_micros as f64 / row.transaction_count as f64
                    };
                    (timer.name.clone(), average)
                })
                .collect();
            buckets.push(ContributionBucket {
                capture_time: row.capture_time,
                contributions,
            });
        }

        let selected = select_top_contributors(&buckets, self.config.chart.top_n);
        let mut names: Vec<Option<String>> = selected.iter().cloned().map(Some).collect();
        names.push(None); // the synthetic "Other" series
        let mut group = SeriesGroup::new(
            from,
            to,
            self.data_point_interval(from, to),
            self.config.chart.downslope_slack_intervals,
            names,
        );
        for bucket in &buckets {
            let (mut values, other) = bucket_values(bucket, &selected);
            values.push(other);
            group.push(bucket.capture_time, &values);
        }
        Ok(group.finish(now))
    }

    /// Error-rate percentage series through the same gap-aware shaping
    pub async fn error_rate_chart(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
        now: i64,
    ) -> Result<DataSeries> {
        let points = self.error_points(key, from, to).await?;
        let mut group = SeriesGroup::new(
            from,
            to,
            self.data_point_interval(from, to),
            self.config.chart.downslope_slack_intervals,
            vec![Some("error rate".to_string())],
        );
        for point in &points {
            let rate = if point.transaction_count == 0 {
                0.0
            } else {
                point.error_count as f64 / point.transaction_count as f64 * 100.0
            };
            group.push(point.capture_time, &[rate]);
        }
        let mut series = group.finish(now);
        Ok(series.pop().expect("group was built with one series"))
    }

    fn needs_rollup(&self, from: i64, to: i64) -> bool {
        to - from > self.config.rollup_threshold_millis()
    }

    fn data_point_interval(&self, from: i64, to: i64) -> i64 {
        if self.needs_rollup(from, to) {
            self.config.rollup_interval_millis()
        } else {
            self.config.data_point_interval_millis()
        }
    }

    /// Coarse rows first, then the fine-grained tail past the last coarse
    /// row rolled up on the fly, concatenated
    async fn read_rolled_up(
        &self,
        key: &TransactionKey,
        from: i64,
        to: i64,
    ) -> Result<Vec<Aggregate>> {
        let mut coarse = self.dao.read_aggregates(key, from, to, 1).await?;
        let tail_from = match coarse.last() {
            Some(last) => last.capture_time + 1,
            None => from,
        };
        let fine_tail = self.dao.read_aggregates(key, tail_from, to, 0).await?;
        let rolled = rollup(
            fine_tail,
            self.config.rollup_interval_millis(),
            self.config.profile.histogram_significant_digits,
        )?;
        coarse.extend(rolled);
        Ok(coarse)
    }
}
