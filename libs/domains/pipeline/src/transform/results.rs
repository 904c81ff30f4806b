//! Reconstructing readable search hits from raw index neighbors.

use chrono::DateTime;
use serde_json::Value;

use crate::models::{Neighbor, NumericValue, Row, SearchResult};

/// Attribute namespaces rendered back as ISO-8601 UTC timestamps.
const TIMESTAMP_NAMESPACES: [&str; 2] = ["created_at", "updated_at"];

/// Rebuild a flat metadata map from a neighbor's stored attributes.
///
/// Categorical restricts collapse to their first allow entry (or an empty
/// string when the list is empty); this is lossy for multi-valued
/// namespaces. Numeric restricts keep their number, except the timestamp
/// namespaces which render as ISO-8601 UTC. A stored metadata mirror, when
/// present, seeds the map and explicit restricts overlay it.
pub fn reconstruct_result(neighbor: Neighbor) -> SearchResult {
    let mut metadata: Row = neighbor.metadata.unwrap_or_default();

    for restrict in &neighbor.restricts {
        if restrict.namespace.is_empty() {
            continue;
        }
        let value = restrict.allow.first().cloned().unwrap_or_default();
        metadata.insert(restrict.namespace.clone(), Value::String(value));
    }

    for numeric in &neighbor.numeric_restricts {
        if numeric.namespace.is_empty() {
            continue;
        }
        let value = if TIMESTAMP_NAMESPACES.contains(&numeric.namespace.as_str()) {
            epoch_to_iso(numeric.value).map_or_else(|| numeric.value.as_json(), Value::String)
        } else {
            numeric.value.as_json()
        };
        metadata.insert(numeric.namespace.clone(), value);
    }

    SearchResult {
        id: neighbor.id.unwrap_or_default(),
        score: neighbor.distance,
        metadata,
    }
}

fn epoch_to_iso(value: NumericValue) -> Option<String> {
    let dt = match value {
        NumericValue::Int(secs) => DateTime::from_timestamp(secs, 0)?,
        NumericValue::Float(secs) => {
            DateTime::from_timestamp_nanos((secs * 1e9) as i64)
        }
    };
    Some(dt.to_rfc3339())
}
