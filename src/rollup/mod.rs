//! On-the-fly rollup of fine-grained aggregate rows into coarser buckets.
//!
//! Fine rows arrive ascending by capture time and fold into one running
//! accumulator per coarse bucket; a completed bucket is emitted when the
//! input moves past it. The emitted capture time is the last contributing
//! row's, not the bucket edge, so a partially-filled bucket never claims
//! time it has no data for.

use crate::codec::{decode_metric_tree, encode_metric_tree};
use crate::core::{Aggregate, Result};
use crate::merge::histogram::LatencyHistogram;
use crate::merge::{merge_metric_trees, MetricNode};

/// Rolls fine-grained rows up into buckets of `rollup_interval_millis`.
///
/// Rows must be ascending by capture time. Bucket assignment is
/// `ceil(capture_time / interval) * interval`. Metric trees merge through
/// the tree merger and histograms through histogram addition; both are
/// re-encoded into the emitted row.
pub fn rollup(
    rows: Vec<Aggregate>,
    rollup_interval_millis: i64,
    significant_digits: u8,
) -> Result<Vec<Aggregate>> {
    let mut output = Vec::new();
    let mut accumulator: Option<RollupAccumulator> = None;

    for row in rows {
        let bucket = ceil_to_grid(row.capture_time, rollup_interval_millis);
        match accumulator.as_mut() {
            Some(acc) if acc.bucket == bucket => acc.fold(row)?,
            Some(_) => {
                let done = accumulator.take().unwrap();
                output.push(done.emit()?);
                accumulator = Some(RollupAccumulator::start(bucket, row, significant_digits)?);
            },
            None => {
                accumulator = Some(RollupAccumulator::start(bucket, row, significant_digits)?);
            },
        }
    }
    if let Some(acc) = accumulator {
        output.push(acc.emit()?);
    }
    Ok(output)
}

struct RollupAccumulator {
    bucket: i64,
    last_capture_time: i64,
    total_micros: u64,
    transaction_count: u64,
    error_count: u64,
    total_cpu_micros: Option<u64>,
    total_blocked_micros: Option<u64>,
    total_waited_micros: Option<u64>,
    total_allocated_bytes: Option<u64>,
    profile_sample_count: Option<u64>,
    metric_roots: Vec<MetricNode>,
    histogram: LatencyHistogram,
}

impl RollupAccumulator {
    fn start(bucket: i64, row: Aggregate, significant_digits: u8) -> Result<Self> {
        let mut acc = RollupAccumulator {
            bucket,
            last_capture_time: row.capture_time,
            total_micros: 0,
            transaction_count: 0,
            error_count: 0,
            total_cpu_micros: None,
            total_blocked_micros: None,
            total_waited_micros: None,
            total_allocated_bytes: None,
            profile_sample_count: None,
            metric_roots: Vec::new(),
            histogram: LatencyHistogram::new(significant_digits)?,
        };
        acc.fold(row)?;
        Ok(acc)
    }

    fn fold(&mut self, row: Aggregate) -> Result<()> {
        self.last_capture_time = row.capture_time;
        self.total_micros += row.total_micros;
        self.transaction_count += row.transaction_count;
        self.error_count += row.error_count;
        fold_optional(&mut self.total_cpu_micros, row.total_cpu_micros);
        fold_optional(&mut self.total_blocked_micros, row.total_blocked_micros);
        fold_optional(&mut self.total_waited_micros, row.total_waited_micros);
        fold_optional(&mut self.total_allocated_bytes, row.total_allocated_bytes);
        fold_optional(&mut self.profile_sample_count, row.profile_sample_count);
        self.metric_roots.push(decode_metric_tree(&row.metric_tree)?);
        let row_histogram = LatencyHistogram::decode(&row.histogram)?;
        self.histogram.merge_from(&row_histogram)?;
        Ok(())
    }

    fn emit(self) -> Result<Aggregate> {
        tracing::debug!(
            bucket = self.bucket,
            capture_time = self.last_capture_time,
            transaction_count = self.transaction_count,
            "emitting rollup bucket"
        );
        let merged_tree = merge_metric_trees(self.metric_roots);
        Ok(Aggregate {
            capture_time: self.last_capture_time,
            total_micros: self.total_micros,
            transaction_count: self.transaction_count,
            error_count: self.error_count,
            total_cpu_micros: self.total_cpu_micros,
            total_blocked_micros: self.total_blocked_micros,
            total_waited_micros: self.total_waited_micros,
            total_allocated_bytes: self.total_allocated_bytes,
            metric_tree: encode_metric_tree(&merged_tree)?,
            // Coarse rows carry no profile tree; profile queries always read
            // the fine-grained rows.
            profile_tree: None,
            profile_sample_count: self.profile_sample_count,
            histogram: self.histogram.encode()?,
        })
    }
}

fn fold_optional(acc: &mut Option<u64>, value: Option<u64>) {
    if let Some(v) = value {
        *acc = Some(acc.unwrap_or(0) + v);
    }
}

fn ceil_to_grid(time: i64, interval: i64) -> i64 {
    time.div_euclid(interval) * interval
        + if time.rem_euclid(interval) == 0 { 0 } else { interval }
}
