//! Request and response bodies for the pipeline API.
//!
//! Optional request fields serialize as absent so configured defaults can
//! fill them; whatever the caller sends explicitly always wins.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::models::{FilterSpec, QueryKind, Row, SearchResult};

/// Embed warehouse rows into index-ready datapoints staged in object
/// storage.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EmbedRowsRequest {
    /// Fully qualified source table, `project.dataset.table`.
    #[validate(length(min = 1))]
    pub bigquery_table: String,
    /// Row filter in SQL syntax; absent selects every row.
    #[serde(rename = "where", default, skip_serializing_if = "Option::is_none")]
    pub where_clause: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col_to_embed: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restrict_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub numeric_restricts_columns: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_columns: Option<Vec<String>>,
    /// Destination prefix, `gs://bucket/path`.
    #[validate(length(min = 1))]
    pub gcs_output_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model_name: Option<String>,
}

/// Embed caller-supplied texts without attaching ids or attributes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EmbedTextRequest {
    #[validate(length(min = 1))]
    pub texts: Vec<String>,
    #[validate(length(min = 1))]
    pub gcs_output_prefix: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct IndexCreateRequest {
    #[validate(length(min = 1))]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shard_size: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance_measure_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_norm_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_update_method: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approximate_neighbors_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_node_embedding_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leaf_nodes_to_search_percent: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EndpointCreateRequest {
    #[validate(length(min = 1))]
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_endpoint_enabled: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct EndpointDeployRequest {
    #[validate(length(min = 1))]
    pub endpoint_id: String,
    #[validate(length(min = 1))]
    pub index_id: String,
    #[validate(length(min = 1))]
    pub deployed_index_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub machine_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_replica_count: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_replica_count: Option<u32>,
}

/// Bulk-load staged datapoints into an index.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct UpsertRequest {
    #[validate(length(min = 1))]
    pub index_id: String,
    /// Only `gcs` is supported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub datapoints_source: Option<String>,
    #[validate(length(min = 1))]
    pub datapoints_gcs_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct DeleteRequest {
    #[validate(length(min = 1))]
    pub index_id: String,
    #[validate(length(min = 1))]
    pub datapoint_ids: Vec<String>,
}

/// A search query: raw text to embed, or a ready vector.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum QueryInput {
    Text(String),
    Vector(Vec<f32>),
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
pub struct SearchRequest {
    #[validate(length(min = 1))]
    pub endpoint_id: String,
    #[validate(length(min = 1))]
    pub deployed_index_id: String,
    pub query: QueryInput,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query_type: Option<QueryKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub top_k: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub restricts: Option<Vec<FilterSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_model_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension: Option<u32>,
}

// Responses

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EmbedResponse {
    pub status: String,
    pub mode: String,
    pub gcs_output_prefix: String,
    pub gcs_output_file: String,
    pub row_count: usize,
    pub dimension: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct IndexCreateResponse {
    pub index_id: String,
    pub status: String,
    /// The request after defaulting, echoed for auditability.
    #[schema(value_type = Object)]
    pub request: Row,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndpointCreateResponse {
    pub endpoint_id: String,
    pub status: String,
    #[schema(value_type = Object)]
    pub request: Row,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct EndpointDeployResponse {
    pub deployed_index_id: String,
    pub endpoint_id: String,
    pub status: String,
    #[schema(value_type = Object)]
    pub request: Row,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UpsertResponse {
    pub index_id: String,
    pub upserted: usize,
    pub datapoints_source: String,
    pub datapoints_gcs_prefix: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DeleteResponse {
    pub index_id: String,
    pub deleted: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResponse {
    pub query: QueryInput,
    pub query_type: QueryKind,
    pub num_recommendations: usize,
    pub results: Vec<SearchResult>,
}
