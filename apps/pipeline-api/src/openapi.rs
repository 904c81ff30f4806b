//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for Pipeline API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Vector Pipeline API",
        version = "0.1.0",
        description = "Embeds warehouse rows and serves the vector index lifecycle: \
                       staging, upsert/delete, and nearest-neighbor search",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/api", api = domain_pipeline::PipelineApiDoc)
    ),
    tags(
        (name = "pipeline", description = "Vector pipeline endpoints")
    )
)]
pub struct ApiDoc;
