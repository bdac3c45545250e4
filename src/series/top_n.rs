//! Top-N contributor selection with "Other" folding.
//!
//! Stacked charts name only the dominant contributors; everything else is
//! folded into one synthetic "Other" value per time bucket so the stack
//! still sums to the bucket total.

use ahash::AHashMap;
use std::cmp::Ordering;

/// Per-bucket leaf contributions, name to value.
#[derive(Debug, Clone)]
pub struct ContributionBucket {
    /// End of the bucket, ms since epoch
    pub capture_time: i64,
    /// (name, value) contributions within the bucket
    pub contributions: Vec<(String, f64)>,
}

/// Selects the top contributors by summed value across all buckets.
///
/// Descending by total; ties break by stable first-seen order across the
/// bucket scan.
pub fn select_top_contributors(buckets: &[ContributionBucket], limit: usize) -> Vec<String> {
    let mut totals: AHashMap<&str, f64> = AHashMap::new();
    let mut first_seen: Vec<&str> = Vec::new();
    for bucket in buckets {
        for (name, value) in &bucket.contributions {
            if !totals.contains_key(name.as_str()) {
                first_seen.push(name);
            }
            *totals.entry(name).or_insert(0.0) += value;
        }
    }
    // Stable sort keeps first-seen order for equal totals.
    first_seen.sort_by(|a, b| {
        totals[b].partial_cmp(&totals[a]).unwrap_or(Ordering::Equal)
    });
    first_seen.truncate(limit);
    first_seen.into_iter().map(str::to_owned).collect()
}

/// Splits one bucket into per-selected values plus the "Other" remainder.
///
/// Returns values in `selected` order. The remainder is the bucket total
/// minus the selected contributions, which is never negative by
/// construction.
pub fn bucket_values(bucket: &ContributionBucket, selected: &[String]) -> (Vec<f64>, f64) {
    let mut values = vec![0.0; selected.len()];
    let mut other = 0.0;
    for (name, value) in &bucket.contributions {
        match selected.iter().position(|s| s == name) {
            Some(i) => values[i] += value,
            None => other += value,
        }
    }
    (values, other)
}
