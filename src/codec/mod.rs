//! Blob codecs for persisted tree payloads.
//!
//! Metric and profile trees are stored inside aggregate rows as opaque
//! bincode blobs. These are stateless utility functions; a malformed blob is
//! fatal for the row that carries it, never silently skipped.

use crate::core::{Result, VantageError};
use crate::merge::{MetricNode, ProfileNode};

/// Encodes a metric tree for storage inside an aggregate row
pub fn encode_metric_tree(root: &MetricNode) -> Result<Vec<u8>> {
    bincode::serialize(root).map_err(|e| VantageError::internal(format!("metric tree encode: {}", e)))
}

/// Decodes a metric tree blob from an aggregate row
pub fn decode_metric_tree(bytes: &[u8]) -> Result<MetricNode> {
    bincode::deserialize(bytes).map_err(|e| VantageError::decode(format!("metric tree blob: {}", e)))
}

/// Encodes a profile tree for storage inside an aggregate row
pub fn encode_profile_tree(root: &ProfileNode) -> Result<Vec<u8>> {
    bincode::serialize(root).map_err(|e| VantageError::internal(format!("profile tree encode: {}", e)))
}

/// Decodes a profile tree blob from an aggregate row
pub fn decode_profile_tree(bytes: &[u8]) -> Result<ProfileNode> {
    bincode::deserialize(bytes).map_err(|e| VantageError::decode(format!("profile tree blob: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_tree_round_trip() {
        let tree = MetricNode::with_children(
            "servlet",
            350,
            3,
            vec![MetricNode::new("jdbc query", 300, 2)],
        );
        let blob = encode_metric_tree(&tree).unwrap();
        let decoded = decode_metric_tree(&blob).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_profile_tree_round_trip() {
        let tree = ProfileNode::leaf("main", "RUNNABLE", 12)
            .with_metric_names(vec!["servlet"])
            .with_children(vec![ProfileNode::frame("handle", 8)]);
        let blob = encode_profile_tree(&tree).unwrap();
        let decoded = decode_profile_tree(&blob).unwrap();
        assert_eq!(decoded, tree);
    }

    #[test]
    fn test_malformed_blob_is_decode_error() {
        let err = decode_metric_tree(&[0xff, 0x01]).unwrap_err();
        assert!(err.is_data_corruption());
        let err = decode_profile_tree(&[0xff]).unwrap_err();
        assert!(err.is_data_corruption());
    }
}
