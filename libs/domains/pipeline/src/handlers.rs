//! REST handlers for the pipeline operations

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};
use std::sync::Arc;
use utoipa::OpenApi;
use validator::Validate;

use crate::embedding::EmbeddingProvider;
use crate::error::PipelineResult;
use crate::index::VectorIndexClient;
use crate::models::{
    CategoricalRestrict, Datapoint, FilterSpec, NumericRestrict, QueryKind, SearchResult,
};
use crate::requests::{
    DeleteRequest, DeleteResponse, EmbedResponse, EmbedRowsRequest, EmbedTextRequest,
    EndpointCreateRequest, EndpointCreateResponse, EndpointDeployRequest, EndpointDeployResponse,
    IndexCreateRequest, IndexCreateResponse, QueryInput, SearchRequest, SearchResponse,
    UpsertRequest, UpsertResponse,
};
use crate::service::PipelineService;
use crate::storage::ObjectStore;
use crate::warehouse::WarehouseClient;

type SharedService<W, E, S, I> = Arc<PipelineService<W, E, S, I>>;

/// OpenAPI documentation for the pipeline API
#[derive(OpenApi)]
#[openapi(
    paths(
        embed_rows,
        embed_text,
        create_index,
        create_endpoint,
        deploy_index,
        upsert_datapoints,
        delete_datapoints,
        search,
    ),
    components(schemas(
        EmbedRowsRequest,
        EmbedTextRequest,
        EmbedResponse,
        IndexCreateRequest,
        IndexCreateResponse,
        EndpointCreateRequest,
        EndpointCreateResponse,
        EndpointDeployRequest,
        EndpointDeployResponse,
        UpsertRequest,
        UpsertResponse,
        DeleteRequest,
        DeleteResponse,
        SearchRequest,
        SearchResponse,
        QueryInput,
        QueryKind,
        FilterSpec,
        SearchResult,
        Datapoint,
        CategoricalRestrict,
        NumericRestrict,
    )),
    tags(
        (name = "pipeline", description = "Vector pipeline operations")
    )
)]
pub struct PipelineApiDoc;

/// Embed warehouse rows into staged index datapoints
#[utoipa::path(
    post,
    path = "/v1/embed/rows",
    tag = "pipeline",
    request_body = EmbedRowsRequest,
    responses(
        (status = 200, description = "Batch embedded and staged", body = EmbedResponse),
        (status = 400, description = "Invalid request or empty row set"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn embed_rows<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<EmbedRowsRequest>,
) -> PipelineResult<Json<EmbedResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.embed_rows(request).await?))
}

/// Embed raw texts
#[utoipa::path(
    post,
    path = "/v1/embed/text",
    tag = "pipeline",
    request_body = EmbedTextRequest,
    responses(
        (status = 200, description = "Texts embedded and staged", body = EmbedResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn embed_text<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<EmbedTextRequest>,
) -> PipelineResult<Json<EmbedResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.embed_text(request).await?))
}

/// Create a vector index
#[utoipa::path(
    post,
    path = "/v1/index/create",
    tag = "pipeline",
    request_body = IndexCreateRequest,
    responses(
        (status = 200, description = "Index creation started", body = IndexCreateResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn create_index<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<IndexCreateRequest>,
) -> PipelineResult<Json<IndexCreateResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.create_index(request).await?))
}

/// Create a serving endpoint
#[utoipa::path(
    post,
    path = "/v1/endpoint/create",
    tag = "pipeline",
    request_body = EndpointCreateRequest,
    responses(
        (status = 200, description = "Endpoint creation started", body = EndpointCreateResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn create_endpoint<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<EndpointCreateRequest>,
) -> PipelineResult<Json<EndpointCreateResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.create_endpoint(request).await?))
}

/// Deploy an index onto an endpoint
#[utoipa::path(
    post,
    path = "/v1/endpoint/deploy",
    tag = "pipeline",
    request_body = EndpointDeployRequest,
    responses(
        (status = 200, description = "Deployment started", body = EndpointDeployResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn deploy_index<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<EndpointDeployRequest>,
) -> PipelineResult<Json<EndpointDeployResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.deploy_index(request).await?))
}

/// Bulk-upsert staged datapoints into an index
#[utoipa::path(
    post,
    path = "/v1/index/upsert",
    tag = "pipeline",
    request_body = UpsertRequest,
    responses(
        (status = 200, description = "Datapoints upserted", body = UpsertResponse),
        (status = 400, description = "Invalid request or empty prefix"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn upsert_datapoints<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<UpsertRequest>,
) -> PipelineResult<Json<UpsertResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.upsert(request).await?))
}

/// Bulk-delete datapoints from an index
#[utoipa::path(
    post,
    path = "/v1/index/delete",
    tag = "pipeline",
    request_body = DeleteRequest,
    responses(
        (status = 200, description = "Datapoints removed", body = DeleteResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn delete_datapoints<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<DeleteRequest>,
) -> PipelineResult<Json<DeleteResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.delete(request).await?))
}

/// Search a deployed index
#[utoipa::path(
    post,
    path = "/v1/search",
    tag = "pipeline",
    request_body = SearchRequest,
    responses(
        (status = 200, description = "Neighbors found", body = SearchResponse),
        (status = 400, description = "Invalid request"),
        (status = 500, description = "Configuration or collaborator failure")
    )
)]
pub async fn search<W, E, S, I>(
    State(service): State<SharedService<W, E, S, I>>,
    Json(request): Json<SearchRequest>,
) -> PipelineResult<Json<SearchResponse>>
where
    W: WarehouseClient,
    E: EmbeddingProvider,
    S: ObjectStore,
    I: VectorIndexClient,
{
    request.validate()?;
    Ok(Json(service.search(request).await?))
}

/// Create the pipeline router
pub fn pipeline_router<W, E, S, I>(service: PipelineService<W, E, S, I>) -> Router
where
    W: WarehouseClient + 'static,
    E: EmbeddingProvider + 'static,
    S: ObjectStore + 'static,
    I: VectorIndexClient + 'static,
{
    let shared_service = Arc::new(service);

    Router::new()
        .route("/v1/embed/rows", post(embed_rows))
        .route("/v1/embed/text", post(embed_text))
        .route("/v1/index/create", post(create_index))
        .route("/v1/index/upsert", post(upsert_datapoints))
        .route("/v1/index/delete", post(delete_datapoints))
        .route("/v1/endpoint/create", post(create_endpoint))
        .route("/v1/endpoint/deploy", post(deploy_index))
        .route("/v1/search", post(search))
        .with_state(shared_service)
}
