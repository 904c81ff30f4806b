//! Pipeline orchestration.
//!
//! Each operation follows the same shape: merge the request with its
//! configured defaults, validate what remains, then drive the warehouse,
//! embedding provider, object store and vector index in order. Client
//! faults are raised before anything external is written.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use crate::config::PipelineConfig;
use crate::defaults::{resolve, to_row};
use crate::embedding::{EmbeddingProvider, EmbeddingTaskType};
use crate::error::{PipelineError, PipelineResult};
use crate::index::{DeploymentSpec, EndpointDefinition, IndexDefinition, VectorIndexClient};
use crate::models::{Datapoint, QueryKind, Row};
use crate::requests::{
    DeleteRequest, DeleteResponse, EmbedResponse, EmbedRowsRequest, EmbedTextRequest,
    EndpointCreateRequest, EndpointCreateResponse, EndpointDeployRequest, EndpointDeployResponse,
    IndexCreateRequest, IndexCreateResponse, QueryInput, SearchRequest, SearchResponse,
    UpsertRequest, UpsertResponse,
};
use crate::storage::{parse_gcs_prefix, FileType, ObjectStore};
use crate::transform::{
    assemble_datapoints, compose_text, default_text_columns, l2_normalize, l2_normalize_batch,
    reconstruct_result, translate_filters, AttributeColumns,
};
use crate::warehouse::WarehouseClient;

const DEFAULT_EMBEDDING_MODEL: &str = "gemini-embedding-001";
const DEFAULT_QUERY_EMBEDDING_MODEL: &str = "text-embedding-005";
const DEFAULT_DIMENSION: u32 = 768;
const DEFAULT_FILENAME: &str = "part-00000";
const DEFAULT_TOP_K: u32 = 10;

pub struct PipelineService<W, E, S, I>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    config: Arc<PipelineConfig>,
    warehouse: Arc<W>,
    embeddings: Arc<E>,
    storage: Arc<S>,
    index: Arc<I>,
}

// Per-operation parameter structs, filled from the request after
// defaulting. Every defaultable field is optional here; a `null` left by
// the merge must still deserialize.

#[derive(Debug, Deserialize)]
struct EmbedRowsParams {
    bigquery_table: String,
    #[serde(rename = "where", default)]
    where_clause: Option<String>,
    #[serde(default)]
    col_to_embed: Option<Vec<String>>,
    #[serde(default)]
    restrict_columns: Option<Vec<String>>,
    #[serde(default)]
    numeric_restricts_columns: Option<Vec<String>>,
    #[serde(default)]
    metadata_columns: Option<Vec<String>>,
    gcs_output_prefix: String,
    #[serde(default)]
    dimension: Option<u32>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    embedding_model_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EmbedTextParams {
    texts: Vec<String>,
    gcs_output_prefix: String,
    #[serde(default)]
    dimension: Option<u32>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    file_type: Option<String>,
    #[serde(default)]
    embedding_model_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct IndexCreateParams {
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    dimensions: Option<u32>,
    #[serde(default)]
    shard_size: Option<String>,
    #[serde(default)]
    distance_measure_type: Option<String>,
    #[serde(default)]
    feature_norm_type: Option<String>,
    #[serde(default)]
    index_update_method: Option<String>,
    #[serde(default)]
    approximate_neighbors_count: Option<u32>,
    #[serde(default)]
    leaf_node_embedding_count: Option<u32>,
    #[serde(default)]
    leaf_nodes_to_search_percent: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct EndpointCreateParams {
    display_name: String,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    public_endpoint_enabled: Option<bool>,
}

#[derive(Debug, Deserialize)]
struct EndpointDeployParams {
    endpoint_id: String,
    index_id: String,
    deployed_index_id: String,
    #[serde(default)]
    machine_type: Option<String>,
    #[serde(default)]
    min_replica_count: Option<u32>,
    #[serde(default)]
    max_replica_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct UpsertParams {
    index_id: String,
    #[serde(default)]
    datapoints_source: Option<String>,
    datapoints_gcs_prefix: String,
}

#[derive(Debug, Deserialize)]
struct DeleteParams {
    index_id: String,
    #[serde(default)]
    datapoint_ids: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchParams {
    endpoint_id: String,
    deployed_index_id: String,
    query: QueryInput,
    #[serde(default)]
    query_type: Option<QueryKind>,
    #[serde(default)]
    top_k: Option<u32>,
    #[serde(default)]
    restricts: Option<Vec<crate::models::FilterSpec>>,
    #[serde(default)]
    embedding_model_name: Option<String>,
    #[serde(default)]
    dimension: Option<u32>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

impl<W, E, S, I> PipelineService<W, E, S, I>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    pub fn new(
        config: Arc<PipelineConfig>,
        warehouse: Arc<W>,
        embeddings: Arc<E>,
        storage: Arc<S>,
        index: Arc<I>,
    ) -> Self {
        Self {
            config,
            warehouse,
            embeddings,
            storage,
            index,
        }
    }

    /// Read rows from the warehouse, embed them, and stage a datapoint
    /// batch file in object storage.
    pub async fn embed_rows(&self, request: EmbedRowsRequest) -> PipelineResult<EmbedResponse> {
        let defaults = self.config.defaults_for("embed_rows");
        let (params, _): (EmbedRowsParams, Row) = resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let file_type = FileType::parse(params.file_type.as_deref().unwrap_or("json"))?;
        parse_gcs_prefix(&params.gcs_output_prefix, "gcs_output_prefix")?;

        let rows = self
            .warehouse
            .query_rows(
                &params.bigquery_table,
                params.where_clause.as_deref(),
                &[],
            )
            .await?;
        if rows.is_empty() {
            return Err(PipelineError::EmptyResult(
                "No rows found for the given bigquery_table/where filter. \
                 No file was written to object storage."
                    .to_string(),
            ));
        }

        let text_columns = match params.col_to_embed {
            Some(columns) if !columns.is_empty() => columns,
            _ => default_text_columns(&rows[0]),
        };
        let texts: Vec<String> = rows
            .iter()
            .map(|row| compose_text(row, &text_columns))
            .collect();

        let model = non_empty(params.embedding_model_name)
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let dimension = params.dimension.unwrap_or(DEFAULT_DIMENSION);
        info!(rows = rows.len(), model = %model, "Embedding warehouse rows");

        let vectors = self
            .embeddings
            .embed_batch(&model, EmbeddingTaskType::Document, dimension, &texts)
            .await?;
        let vectors = l2_normalize_batch(&vectors)?;

        let columns = AttributeColumns {
            restrict_columns: params.restrict_columns.unwrap_or_default(),
            numeric_restricts_columns: params.numeric_restricts_columns.unwrap_or_default(),
            metadata_columns: params.metadata_columns.unwrap_or_default(),
        };
        let datapoints =
            assemble_datapoints(&rows, vectors, self.config.attribute_style, &columns);
        let items: Vec<Value> = datapoints
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;

        let filename = non_empty(params.filename).unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let gcs_output_file = self
            .storage
            .write_items(&params.gcs_output_prefix, &items, &filename, file_type)
            .await?;

        Ok(EmbedResponse {
            status: "EMBEDDED".to_string(),
            mode: "vertex_index_datapoints".to_string(),
            gcs_output_prefix: params.gcs_output_prefix,
            gcs_output_file,
            row_count: rows.len(),
            dimension,
        })
    }

    /// Embed caller-supplied texts and stage the bare vectors.
    pub async fn embed_text(&self, request: EmbedTextRequest) -> PipelineResult<EmbedResponse> {
        let defaults = self.config.defaults_for("embed_text");
        let (params, _): (EmbedTextParams, Row) = resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let file_type = FileType::parse(params.file_type.as_deref().unwrap_or("json"))?;
        parse_gcs_prefix(&params.gcs_output_prefix, "gcs_output_prefix")?;

        let texts: Vec<String> = params
            .texts
            .iter()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .collect();
        if texts.is_empty() {
            return Err(PipelineError::Validation(
                "texts must not be empty".to_string(),
            ));
        }

        let model = non_empty(params.embedding_model_name)
            .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string());
        let dimension = params.dimension.unwrap_or(DEFAULT_DIMENSION);
        info!(texts = texts.len(), model = %model, "Embedding raw texts");

        let vectors = self
            .embeddings
            .embed_batch(&model, EmbeddingTaskType::Document, dimension, &texts)
            .await?;
        let items: Vec<Value> = l2_normalize_batch(&vectors)?
            .into_iter()
            .map(|embedding| serde_json::json!({"embedding": embedding}))
            .collect();

        let filename = non_empty(params.filename).unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let gcs_output_file = self
            .storage
            .write_items(&params.gcs_output_prefix, &items, &filename, file_type)
            .await?;

        Ok(EmbedResponse {
            status: "EMBEDDED".to_string(),
            mode: "text".to_string(),
            gcs_output_prefix: params.gcs_output_prefix,
            gcs_output_file,
            row_count: texts.len(),
            dimension,
        })
    }

    /// Create a stream-updatable approximate-neighbor index.
    pub async fn create_index(
        &self,
        request: IndexCreateRequest,
    ) -> PipelineResult<IndexCreateResponse> {
        let defaults = self.config.defaults_for("index_create");
        let (params, merged): (IndexCreateParams, Row) = resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let dimensions = params.dimensions.ok_or_else(|| {
            PipelineError::Validation("dimensions is required to create an index".to_string())
        })?;

        let definition = IndexDefinition {
            display_name: params.display_name,
            description: params.description,
            dimensions,
            shard_size: params.shard_size.unwrap_or_else(|| "SHARD_SIZE_SMALL".to_string()),
            distance_measure_type: params
                .distance_measure_type
                .unwrap_or_else(|| "DOT_PRODUCT".to_string()),
            feature_norm_type: params
                .feature_norm_type
                .unwrap_or_else(|| "UNIT_L2_NORM".to_string()),
            index_update_method: params
                .index_update_method
                .unwrap_or_else(|| "STREAM_UPDATE".to_string()),
            approximate_neighbors_count: params.approximate_neighbors_count.unwrap_or(150),
            leaf_node_embedding_count: params.leaf_node_embedding_count.unwrap_or(1000),
            leaf_nodes_to_search_percent: params.leaf_nodes_to_search_percent.unwrap_or(5),
        };

        info!(display_name = %definition.display_name, "Creating index");
        let index_id = self.index.create_index(&definition).await?;

        Ok(IndexCreateResponse {
            index_id,
            status: "CREATED".to_string(),
            request: merged,
        })
    }

    /// Create a serving endpoint for deployed indexes.
    pub async fn create_endpoint(
        &self,
        request: EndpointCreateRequest,
    ) -> PipelineResult<EndpointCreateResponse> {
        let defaults = self.config.defaults_for("endpoint_create");
        let (params, merged): (EndpointCreateParams, Row) =
            resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let definition = EndpointDefinition {
            display_name: params.display_name,
            description: params.description,
            public_endpoint_enabled: params.public_endpoint_enabled.unwrap_or(true),
        };

        info!(display_name = %definition.display_name, "Creating endpoint");
        let endpoint_id = self.index.create_endpoint(&definition).await?;

        Ok(EndpointCreateResponse {
            endpoint_id,
            status: "CREATED".to_string(),
            request: merged,
        })
    }

    /// Deploy an index onto an endpoint.
    pub async fn deploy_index(
        &self,
        request: EndpointDeployRequest,
    ) -> PipelineResult<EndpointDeployResponse> {
        let defaults = self.config.defaults_for("endpoint_deploy");
        let (params, merged): (EndpointDeployParams, Row) =
            resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let spec = DeploymentSpec {
            endpoint_id: params.endpoint_id.clone(),
            index_id: params.index_id,
            deployed_index_id: params.deployed_index_id.clone(),
            machine_type: params
                .machine_type
                .unwrap_or_else(|| "e2-standard-2".to_string()),
            min_replica_count: params.min_replica_count.unwrap_or(1),
            max_replica_count: params.max_replica_count.unwrap_or(1),
        };

        info!(deployed_index_id = %spec.deployed_index_id, "Deploying index");
        self.index.deploy_index(&spec).await?;

        Ok(EndpointDeployResponse {
            deployed_index_id: spec.deployed_index_id,
            endpoint_id: params.endpoint_id,
            status: "DEPLOYED".to_string(),
            request: merged,
        })
    }

    /// Load staged datapoints from object storage and upsert them into an
    /// index.
    pub async fn upsert(&self, request: UpsertRequest) -> PipelineResult<UpsertResponse> {
        let defaults = self.config.defaults_for("upsert");
        let (params, _): (UpsertParams, Row) = resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let source = non_empty(params.datapoints_source).unwrap_or_else(|| "gcs".to_string());
        if source != "gcs" {
            return Err(PipelineError::Validation(
                "Only datapoints_source='gcs' is supported".to_string(),
            ));
        }

        let items = self
            .storage
            .load_items(&params.datapoints_gcs_prefix, FileType::Json)
            .await?;
        if items.is_empty() {
            return Err(PipelineError::EmptyResult(format!(
                "No datapoints found under {}",
                params.datapoints_gcs_prefix
            )));
        }

        let datapoints: Vec<Datapoint> = items
            .into_iter()
            .map(|item| {
                serde_json::from_value(item)
                    .map_err(|e| PipelineError::Validation(format!("Invalid datapoint: {}", e)))
            })
            .collect::<PipelineResult<_>>()?;

        info!(count = datapoints.len(), index_id = %params.index_id, "Upserting datapoints");
        self.index
            .upsert_datapoints(&params.index_id, &datapoints)
            .await?;

        Ok(UpsertResponse {
            index_id: params.index_id,
            upserted: datapoints.len(),
            datapoints_source: source,
            datapoints_gcs_prefix: params.datapoints_gcs_prefix,
        })
    }

    /// Remove datapoints from an index by id.
    pub async fn delete(&self, request: DeleteRequest) -> PipelineResult<DeleteResponse> {
        let (params, _): (DeleteParams, Row) = resolve(&to_row(&request)?, &Row::new())?;
        self.config.require_context()?;

        if params.datapoint_ids.is_empty() {
            return Err(PipelineError::Validation(
                "datapoint_ids must not be empty".to_string(),
            ));
        }

        info!(count = params.datapoint_ids.len(), index_id = %params.index_id, "Removing datapoints");
        self.index
            .remove_datapoints(&params.index_id, &params.datapoint_ids)
            .await?;

        Ok(DeleteResponse {
            index_id: params.index_id,
            deleted: params.datapoint_ids.len(),
        })
    }

    /// Query a deployed index with a text or vector query.
    pub async fn search(&self, request: SearchRequest) -> PipelineResult<SearchResponse> {
        let defaults = self.config.defaults_for("search");
        let (params, _): (SearchParams, Row) = resolve(&to_row(&request)?, &defaults)?;
        self.config.require_context()?;

        let query_type = params.query_type.unwrap_or_default();
        let query_vector = match (query_type, &params.query) {
            (QueryKind::Text, QueryInput::Text(text)) => {
                let model = non_empty(params.embedding_model_name)
                    .or_else(|| self.embed_rows_default_str("embedding_model_name"))
                    .unwrap_or_else(|| DEFAULT_QUERY_EMBEDDING_MODEL.to_string());
                let dimension = params
                    .dimension
                    .or_else(|| self.embed_rows_default_u32("dimension"))
                    .unwrap_or(DEFAULT_DIMENSION);
                let embeddings = self
                    .embeddings
                    .embed_batch(
                        &model,
                        EmbeddingTaskType::Query,
                        dimension,
                        &[text.clone()],
                    )
                    .await?;
                let vector = embeddings.into_iter().next().ok_or_else(|| {
                    PipelineError::Embedding("No embedding returned for query".to_string())
                })?;
                l2_normalize(&vector)
            }
            (QueryKind::Text, QueryInput::Vector(_)) => {
                return Err(PipelineError::Validation(
                    "query must be a string when query_type is 'text'".to_string(),
                ));
            }
            (QueryKind::Vector, QueryInput::Vector(vector)) => vector.clone(),
            (QueryKind::Vector, QueryInput::Text(_)) => {
                return Err(PipelineError::Validation(
                    "query must be a list of numbers when query_type is 'vector'".to_string(),
                ));
            }
        };

        let top_k = params.top_k.unwrap_or(DEFAULT_TOP_K);
        let filters = translate_filters(&params.restricts.unwrap_or_default());

        let neighbors = self
            .index
            .find_neighbors(
                &params.endpoint_id,
                &params.deployed_index_id,
                &query_vector,
                top_k,
                &filters,
            )
            .await?;

        let results: Vec<_> = neighbors.into_iter().map(reconstruct_result).collect();
        Ok(SearchResponse {
            query: params.query,
            query_type,
            num_recommendations: results.len(),
            results,
        })
    }

    fn embed_rows_default_str(&self, key: &str) -> Option<String> {
        self.config
            .defaults_for("embed_rows")
            .get(key)
            .and_then(|v| v.as_str().map(str::to_string))
    }

    fn embed_rows_default_u32(&self, key: &str) -> Option<u32> {
        self.config
            .defaults_for("embed_rows")
            .get(key)
            .and_then(|v| v.as_u64())
            .map(|v| v as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingProvider;
    use crate::index::MockVectorIndexClient;
    use crate::models::{CategoricalRestrict, Neighbor};
    use crate::storage::MockObjectStore;
    use crate::warehouse::MockWarehouseClient;
    use serde_json::json;

    fn test_config() -> PipelineConfig {
        PipelineConfig {
            project_id: Some("demo".to_string()),
            region: Some("us-central1".to_string()),
            ..Default::default()
        }
    }

    fn service(
        config: PipelineConfig,
        warehouse: MockWarehouseClient,
        embeddings: MockEmbeddingProvider,
        storage: MockObjectStore,
        index: MockVectorIndexClient,
    ) -> PipelineService<
        MockWarehouseClient,
        MockEmbeddingProvider,
        MockObjectStore,
        MockVectorIndexClient,
    > {
        PipelineService::new(
            Arc::new(config),
            Arc::new(warehouse),
            Arc::new(embeddings),
            Arc::new(storage),
            Arc::new(index),
        )
    }

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    fn embed_rows_request() -> EmbedRowsRequest {
        serde_json::from_value(json!({
            "bigquery_table": "p.d.items",
            "gcs_output_prefix": "gs://bucket/out",
            "restrict_columns": ["brand"],
            "dimension": 2
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn embed_rows_stages_normalized_datapoints() {
        let mut warehouse = MockWarehouseClient::new();
        warehouse
            .expect_query_rows()
            .withf(|table, where_clause, _| table == "p.d.items" && where_clause.is_none())
            .returning(|_, _, _| {
                Ok(vec![
                    row(json!({"id": "a", "title": "Red shoe", "brand": "Acme"})),
                    row(json!({"id": "b", "title": "Blue shoe", "brand": "Bolt"})),
                ])
            });

        let mut embeddings = MockEmbeddingProvider::new();
        embeddings
            .expect_embed_batch()
            .withf(|model, task, dimension, texts| {
                model == "gemini-embedding-001"
                    && *task == EmbeddingTaskType::Document
                    && *dimension == 2
                    && texts == ["Red shoe\nAcme", "Blue shoe\nBolt"]
            })
            .returning(|_, _, _, _| Ok(vec![vec![3.0, 4.0], vec![1.0, 0.0]]));

        let mut storage = MockObjectStore::new();
        storage
            .expect_write_items()
            .withf(|prefix, items, filename, file_type| {
                let first: Datapoint = serde_json::from_value(items[0].clone()).unwrap();
                prefix == "gs://bucket/out"
                    && filename == "part-00000"
                    && *file_type == FileType::Json
                    && items.len() == 2
                    && first.id == "a"
                    && (first.embedding[0] - 0.6).abs() < 1e-6
                    && first.restricts[0].allow == vec!["Acme"]
            })
            .returning(|_, _, _, _| Ok("gs://bucket/out/part-00000.json".to_string()));

        let svc = service(
            test_config(),
            warehouse,
            embeddings,
            storage,
            MockVectorIndexClient::new(),
        );
        let response = svc.embed_rows(embed_rows_request()).await.unwrap();

        assert_eq!(response.status, "EMBEDDED");
        assert_eq!(response.mode, "vertex_index_datapoints");
        assert_eq!(response.row_count, 2);
        assert_eq!(response.gcs_output_file, "gs://bucket/out/part-00000.json");
    }

    #[tokio::test]
    async fn embed_rows_rejects_empty_result_before_writing() {
        let mut warehouse = MockWarehouseClient::new();
        warehouse
            .expect_query_rows()
            .returning(|_, _, _| Ok(vec![]));

        // No storage/embedding expectations: touching them would panic.
        let svc = service(
            test_config(),
            warehouse,
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.embed_rows(embed_rows_request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn embed_rows_requires_project_context() {
        let svc = service(
            PipelineConfig::default(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.embed_rows(embed_rows_request()).await.unwrap_err();
        assert!(matches!(err, PipelineError::Config(_)));
    }

    #[tokio::test]
    async fn embed_rows_rejects_bad_prefix_before_querying() {
        let request: EmbedRowsRequest = serde_json::from_value(json!({
            "bigquery_table": "p.d.items",
            "gcs_output_prefix": "bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.embed_rows(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn embed_text_skips_blank_texts() {
        let mut embeddings = MockEmbeddingProvider::new();
        embeddings
            .expect_embed_batch()
            .withf(|_, _, _, texts| texts == ["hello"])
            .returning(|_, _, _, _| Ok(vec![vec![0.0, 2.0]]));

        let mut storage = MockObjectStore::new();
        storage
            .expect_write_items()
            .withf(|_, items, _, _| items[0] == json!({"embedding": [0.0, 1.0]}))
            .returning(|_, _, _, _| Ok("gs://bucket/out/part-00000.json".to_string()));

        let request: EmbedTextRequest = serde_json::from_value(json!({
            "texts": ["  ", "hello"],
            "gcs_output_prefix": "gs://bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            embeddings,
            storage,
            MockVectorIndexClient::new(),
        );
        let response = svc.embed_text(request).await.unwrap();
        assert_eq!(response.mode, "text");
        assert_eq!(response.row_count, 1);
    }

    #[tokio::test]
    async fn embed_text_rejects_all_blank_input() {
        let request: EmbedTextRequest = serde_json::from_value(json!({
            "texts": ["  ", ""],
            "gcs_output_prefix": "gs://bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.embed_text(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn create_index_fills_lifecycle_defaults() {
        let mut index = MockVectorIndexClient::new();
        index
            .expect_create_index()
            .withf(|definition| {
                definition.shard_size == "SHARD_SIZE_SMALL"
                    && definition.distance_measure_type == "DOT_PRODUCT"
                    && definition.feature_norm_type == "UNIT_L2_NORM"
                    && definition.index_update_method == "STREAM_UPDATE"
                    && definition.approximate_neighbors_count == 150
                    && definition.leaf_node_embedding_count == 1000
                    && definition.leaf_nodes_to_search_percent == 5
                    && definition.dimensions == 128
            })
            .returning(|_| Ok("projects/demo/locations/us-central1/indexes/1".to_string()));

        let request: IndexCreateRequest = serde_json::from_value(json!({
            "display_name": "catalog",
            "dimensions": 128
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            index,
        );
        let response = svc.create_index(request).await.unwrap();
        assert_eq!(response.status, "CREATED");
        assert_eq!(response.request.get("display_name"), Some(&json!("catalog")));
    }

    #[tokio::test]
    async fn create_index_requires_dimensions() {
        let request: IndexCreateRequest =
            serde_json::from_value(json!({"display_name": "catalog"})).unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.create_index(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn endpoint_defaults_to_public() {
        let mut index = MockVectorIndexClient::new();
        index
            .expect_create_endpoint()
            .withf(|definition| definition.public_endpoint_enabled)
            .returning(|_| Ok("projects/demo/locations/us-central1/indexEndpoints/1".to_string()));

        let request: EndpointCreateRequest =
            serde_json::from_value(json!({"display_name": "serving"})).unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            index,
        );
        let response = svc.create_endpoint(request).await.unwrap();
        assert_eq!(response.status, "CREATED");
    }

    #[tokio::test]
    async fn deploy_fills_machine_defaults() {
        let mut index = MockVectorIndexClient::new();
        index
            .expect_deploy_index()
            .withf(|spec| {
                spec.machine_type == "e2-standard-2"
                    && spec.min_replica_count == 1
                    && spec.max_replica_count == 1
            })
            .returning(|_| Ok(()));

        let request: EndpointDeployRequest = serde_json::from_value(json!({
            "endpoint_id": "ep-1",
            "index_id": "idx-1",
            "deployed_index_id": "dep-1"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            index,
        );
        let response = svc.deploy_index(request).await.unwrap();
        assert_eq!(response.status, "DEPLOYED");
        assert_eq!(response.deployed_index_id, "dep-1");
    }

    #[tokio::test]
    async fn upsert_loads_staged_datapoints() {
        let mut storage = MockObjectStore::new();
        storage
            .expect_load_items()
            .withf(|prefix, file_type| {
                prefix == "gs://bucket/out" && *file_type == FileType::Json
            })
            .returning(|_, _| {
                Ok(vec![
                    json!({"id": "a", "embedding": [0.1], "restricts": [{"namespace": "brand", "allow": ["Acme"]}]}),
                    json!({"id": "b", "embedding": [0.2]}),
                ])
            });

        let mut index = MockVectorIndexClient::new();
        index
            .expect_upsert_datapoints()
            .withf(|index_id, datapoints| {
                index_id == "idx-1" && datapoints.len() == 2 && datapoints[0].id == "a"
            })
            .returning(|_, _| Ok(()));

        let request: UpsertRequest = serde_json::from_value(json!({
            "index_id": "idx-1",
            "datapoints_gcs_prefix": "gs://bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            storage,
            index,
        );
        let response = svc.upsert(request).await.unwrap();
        assert_eq!(response.upserted, 2);
        assert_eq!(response.datapoints_source, "gcs");
    }

    #[tokio::test]
    async fn upsert_rejects_unknown_source() {
        let request: UpsertRequest = serde_json::from_value(json!({
            "index_id": "idx-1",
            "datapoints_source": "s3",
            "datapoints_gcs_prefix": "gs://bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.upsert(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn upsert_rejects_empty_prefix_contents() {
        let mut storage = MockObjectStore::new();
        storage.expect_load_items().returning(|_, _| Ok(vec![]));

        let request: UpsertRequest = serde_json::from_value(json!({
            "index_id": "idx-1",
            "datapoints_gcs_prefix": "gs://bucket/out"
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            storage,
            MockVectorIndexClient::new(),
        );
        let err = svc.upsert(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::EmptyResult(_)));
    }

    #[tokio::test]
    async fn delete_rejects_empty_ids_before_calling_out() {
        let request = DeleteRequest {
            index_id: "idx-1".to_string(),
            datapoint_ids: vec![],
        };

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );
        let err = svc.delete(request).await.unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[tokio::test]
    async fn delete_counts_removed_ids() {
        let mut index = MockVectorIndexClient::new();
        index
            .expect_remove_datapoints()
            .withf(|index_id, ids| index_id == "idx-1" && ids == ["a", "b"])
            .returning(|_, _| Ok(()));

        let request = DeleteRequest {
            index_id: "idx-1".to_string(),
            datapoint_ids: vec!["a".to_string(), "b".to_string()],
        };

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            index,
        );
        let response = svc.delete(request).await.unwrap();
        assert_eq!(response.deleted, 2);
    }

    #[tokio::test]
    async fn vector_search_passes_the_query_through() {
        let mut index = MockVectorIndexClient::new();
        index
            .expect_find_neighbors()
            .withf(|endpoint, deployed, query, top_k, filters| {
                endpoint == "ep-1"
                    && deployed == "dep-1"
                    && query == [0.1, 0.2]
                    && *top_k == 10
                    && filters.len() == 1
                    && filters[0].namespace == "brand"
            })
            .returning(|_, _, _, _, _| {
                Ok(vec![Neighbor {
                    id: Some("item-1".to_string()),
                    distance: Some(0.9),
                    restricts: vec![CategoricalRestrict {
                        namespace: "brand".to_string(),
                        allow: vec!["Acme".to_string()],
                        deny: vec![],
                    }],
                    ..Default::default()
                }])
            });

        let request: SearchRequest = serde_json::from_value(json!({
            "endpoint_id": "ep-1",
            "deployed_index_id": "dep-1",
            "query": [0.1, 0.2],
            "restricts": [{"namespace": "brand", "allow": ["Acme"]}]
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            index,
        );
        let response = svc.search(request).await.unwrap();
        assert_eq!(response.num_recommendations, 1);
        assert_eq!(response.results[0].id, "item-1");
        assert_eq!(response.results[0].metadata.get("brand"), Some(&json!("Acme")));
        assert!(matches!(response.query_type, QueryKind::Vector));
    }

    #[tokio::test]
    async fn text_search_embeds_the_query() {
        let mut embeddings = MockEmbeddingProvider::new();
        embeddings
            .expect_embed_batch()
            .withf(|model, task, dimension, texts| {
                model == "text-embedding-005"
                    && *task == EmbeddingTaskType::Query
                    && *dimension == 768
                    && texts == ["red shoes"]
            })
            .returning(|_, _, _, _| Ok(vec![vec![0.0, 3.0]]));

        let mut index = MockVectorIndexClient::new();
        index
            .expect_find_neighbors()
            .withf(|_, _, query, top_k, _| query == [0.0, 1.0] && *top_k == 5)
            .returning(|_, _, _, _, _| Ok(vec![]));

        let request: SearchRequest = serde_json::from_value(json!({
            "endpoint_id": "ep-1",
            "deployed_index_id": "dep-1",
            "query": "red shoes",
            "query_type": "text",
            "top_k": 5
        }))
        .unwrap();

        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            embeddings,
            MockObjectStore::new(),
            index,
        );
        let response = svc.search(request).await.unwrap();
        assert_eq!(response.num_recommendations, 0);
    }

    #[tokio::test]
    async fn search_rejects_mismatched_query_shape() {
        let svc = service(
            test_config(),
            MockWarehouseClient::new(),
            MockEmbeddingProvider::new(),
            MockObjectStore::new(),
            MockVectorIndexClient::new(),
        );

        let text_with_vector: SearchRequest = serde_json::from_value(json!({
            "endpoint_id": "ep-1",
            "deployed_index_id": "dep-1",
            "query": [0.1],
            "query_type": "text"
        }))
        .unwrap();
        assert!(matches!(
            svc.search(text_with_vector).await.unwrap_err(),
            PipelineError::Validation(_)
        ));

        let vector_with_text: SearchRequest = serde_json::from_value(json!({
            "endpoint_id": "ep-1",
            "deployed_index_id": "dep-1",
            "query": "red shoes"
        }))
        .unwrap();
        assert!(matches!(
            svc.search(vector_with_text).await.unwrap_err(),
            PipelineError::Validation(_)
        ));
    }
}
