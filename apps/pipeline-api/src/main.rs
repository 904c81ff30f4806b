//! Pipeline API - REST server for the vector pipeline

use axum_helpers::{create_app, create_router, health_router};
use core_config::tracing::{init_tracing, install_color_eyre};
use domain_pipeline::embedding::VertexEmbeddingProvider;
use domain_pipeline::handlers::pipeline_router;
use domain_pipeline::index::VertexIndexClient;
use domain_pipeline::storage::GcsStore;
use domain_pipeline::warehouse::BigQueryClient;
use domain_pipeline::{GoogleAuth, PipelineConfig, PipelineService};
use std::sync::Arc;
use tracing::{info, warn};

mod config;
mod openapi;

use config::Config;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    install_color_eyre();

    let config = Config::from_env()?;
    init_tracing(&config.environment);

    let pipeline_config = Arc::new(PipelineConfig::load()?);
    if pipeline_config.require_context().is_err() {
        warn!(
            "project_id/region not configured; operations will fail until \
             GOOGLE_CLOUD_PROJECT and GOOGLE_CLOUD_REGION are set"
        );
    }
    let project_id = pipeline_config.project_id.clone().unwrap_or_default();
    let region = pipeline_config.region.clone().unwrap_or_default();

    let auth = GoogleAuth::new();
    let warehouse = Arc::new(BigQueryClient::new(auth.clone(), project_id.clone()));
    let embeddings = Arc::new(VertexEmbeddingProvider::new(
        auth.clone(),
        project_id.clone(),
        region.clone(),
    ));
    let storage = Arc::new(GcsStore::new(auth.clone()));
    let index = Arc::new(VertexIndexClient::new(auth, project_id, region));

    let service = PipelineService::new(
        pipeline_config.clone(),
        warehouse,
        embeddings,
        storage,
        index,
    );

    let api_routes = pipeline_router(service);
    let router = create_router::<openapi::ApiDoc>(api_routes)?;
    let app = router.merge(health_router(config.app.clone()));

    info!("Starting Pipeline API on port {}", config.server.port);
    create_app(app, &config.server).await?;

    info!("Pipeline API shutdown complete");
    Ok(())
}
