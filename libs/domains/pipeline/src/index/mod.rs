//! Vector index lifecycle and data-plane access.

mod vertex;

pub use vertex::VertexIndexClient;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::models::{Datapoint, NamespaceFilter, Neighbor};

/// Fully resolved parameters for a new approximate-neighbor index.
#[derive(Debug, Clone)]
pub struct IndexDefinition {
    pub display_name: String,
    pub description: Option<String>,
    pub dimensions: u32,
    pub shard_size: String,
    pub distance_measure_type: String,
    pub feature_norm_type: String,
    pub index_update_method: String,
    pub approximate_neighbors_count: u32,
    pub leaf_node_embedding_count: u32,
    pub leaf_nodes_to_search_percent: u32,
}

/// Fully resolved parameters for a new serving endpoint.
#[derive(Debug, Clone)]
pub struct EndpointDefinition {
    pub display_name: String,
    pub description: Option<String>,
    pub public_endpoint_enabled: bool,
}

/// Fully resolved parameters for deploying an index onto an endpoint.
#[derive(Debug, Clone)]
pub struct DeploymentSpec {
    pub endpoint_id: String,
    pub index_id: String,
    pub deployed_index_id: String,
    pub machine_type: String,
    pub min_replica_count: u32,
    pub max_replica_count: u32,
}

/// Trait for the vector index service.
///
/// Lifecycle operations return resource identifiers; data-plane operations
/// move datapoints and queries.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VectorIndexClient: Send + Sync {
    /// Create an index; returns its resource identifier.
    async fn create_index(&self, definition: &IndexDefinition) -> PipelineResult<String>;

    /// Create a serving endpoint; returns its resource identifier.
    async fn create_endpoint(&self, definition: &EndpointDefinition) -> PipelineResult<String>;

    /// Deploy an existing index onto an existing endpoint.
    async fn deploy_index(&self, spec: &DeploymentSpec) -> PipelineResult<()>;

    /// Insert or overwrite datapoints by id.
    async fn upsert_datapoints(
        &self,
        index_id: &str,
        datapoints: &[Datapoint],
    ) -> PipelineResult<()>;

    /// Remove datapoints by id.
    async fn remove_datapoints(
        &self,
        index_id: &str,
        datapoint_ids: &[String],
    ) -> PipelineResult<()>;

    /// Query a deployed index for the nearest neighbors of one vector,
    /// returning full stored datapoints.
    async fn find_neighbors(
        &self,
        endpoint_id: &str,
        deployed_index_id: &str,
        query: &[f32],
        top_k: u32,
        filters: &[NamespaceFilter],
    ) -> PipelineResult<Vec<Neighbor>>;
}
