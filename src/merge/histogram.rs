//! Latency histogram merging and percentile queries.
//!
//! Persisted rows carry latencies as HdrHistogram blobs (V2 + deflate).
//! Histogram addition is commutative and associative, so rows and live
//! snapshots can be folded together in any order before percentile lookup.

use crate::core::{Result, VantageError};
use hdrhistogram::serialization::{Deserializer, Serializer, V2DeflateSerializer};
use hdrhistogram::Histogram;
use std::io::Cursor;

/// Default significant value digits when no config is in play
pub const DEFAULT_SIGNIFICANT_DIGITS: u8 = 3;

/// A mergeable latency histogram over microsecond values.
#[derive(Debug, Clone)]
pub struct LatencyHistogram {
    inner: Histogram<u64>,
}

impl LatencyHistogram {
    /// Creates an empty auto-resizing histogram
    pub fn new(significant_digits: u8) -> Result<Self> {
        let mut inner = Histogram::new(significant_digits)
            .map_err(|e| VantageError::internal(format!("histogram creation: {}", e)))?;
        inner.auto(true);
        Ok(LatencyHistogram { inner })
    }

    /// Decodes a histogram from its persisted blob encoding
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let mut inner: Histogram<u64> = Deserializer::new()
            .deserialize(&mut cursor)
            .map_err(|e| VantageError::decode(format!("histogram blob: {}", e)))?;
        inner.auto(true);
        Ok(LatencyHistogram { inner })
    }

    /// Encodes this histogram into its persisted blob form
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        V2DeflateSerializer::new()
            .serialize(&self.inner, &mut buf)
            .map_err(|e| VantageError::internal(format!("histogram encode: {}", e)))?;
        Ok(buf)
    }

    /// Records a single latency value, microseconds
    pub fn record(&mut self, micros: u64) -> Result<()> {
        self.inner
            .record(micros)
            .map_err(|e| VantageError::internal(format!("histogram record: {}", e)))
    }

    /// Adds another histogram into this one.
    ///
    /// Incompatible histograms are a programmer/configuration error, not a
    /// recoverable runtime condition.
    pub fn merge_from(&mut self, other: &LatencyHistogram) -> Result<()> {
        self.inner
            .add(&other.inner)
            .map_err(|e| VantageError::internal(format!("incompatible histograms: {}", e)))
    }

    /// Approximate latency at the given percentile (0.0 to 100.0),
    /// microseconds. An empty histogram answers 0.
    pub fn value_at_percentile(&self, percentile: f64) -> u64 {
        self.inner.value_at_quantile(percentile / 100.0)
    }

    /// Number of recorded values
    pub fn total_count(&self) -> u64 {
        self.inner.len()
    }
}

/// Decodes and merges histogram blobs into one.
///
/// Order-independent. Zero inputs yield an empty histogram whose percentile
/// queries return 0 rather than erroring.
pub fn merge_histograms<B: AsRef<[u8]>>(
    blobs: &[B],
    significant_digits: u8,
) -> Result<LatencyHistogram> {
    let mut merged = LatencyHistogram::new(significant_digits)?;
    for blob in blobs {
        let decoded = LatencyHistogram::decode(blob.as_ref())?;
        merged.merge_from(&decoded)?;
    }
    Ok(merged)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn histogram_of(values: &[u64]) -> LatencyHistogram {
        let mut h = LatencyHistogram::new(DEFAULT_SIGNIFICANT_DIGITS).unwrap();
        for &v in values {
            h.record(v).unwrap();
        }
        h
    }

    #[test]
    fn test_empty_percentiles_are_zero() {
        let h = merge_histograms::<Vec<u8>>(&[], DEFAULT_SIGNIFICANT_DIGITS).unwrap();
        assert_eq!(h.total_count(), 0);
        assert_eq!(h.value_at_percentile(50.0), 0);
        assert_eq!(h.value_at_percentile(99.9), 0);
    }

    #[test]
    fn test_merge_commutativity() {
        let a = histogram_of(&[100, 200, 300]).encode().unwrap();
        let b = histogram_of(&[1_000, 2_000, 40_000]).encode().unwrap();

        let ab = merge_histograms(&[a.clone(), b.clone()], DEFAULT_SIGNIFICANT_DIGITS).unwrap();
        let ba = merge_histograms(&[b, a], DEFAULT_SIGNIFICANT_DIGITS).unwrap();

        assert_eq!(ab.total_count(), 6);
        for p in [50.0, 90.0, 95.0, 99.0] {
            assert_eq!(ab.value_at_percentile(p), ba.value_at_percentile(p));
        }
    }

    #[test]
    fn test_percentile_approximation() {
        let mut h = LatencyHistogram::new(DEFAULT_SIGNIFICANT_DIGITS).unwrap();
        for v in 1..=1000 {
            h.record(v).unwrap();
        }
        let p50 = h.value_at_percentile(50.0);
        // 3 significant digits keeps the error well under 1%.
        assert!((495..=505).contains(&p50), "p50 was {}", p50);
    }

    #[test]
    fn test_encode_decode_survives_merge() {
        let h = histogram_of(&[500, 1_500, 2_500]);
        let blob = h.encode().unwrap();
        let decoded = LatencyHistogram::decode(&blob).unwrap();
        assert_eq!(decoded.total_count(), 3);
        assert_eq!(
            decoded.value_at_percentile(100.0),
            h.value_at_percentile(100.0)
        );
    }

    #[test]
    fn test_malformed_blob_is_decode_error() {
        let err = LatencyHistogram::decode(b"not a histogram").unwrap_err();
        assert!(err.is_data_corruption());
    }
}
