//! Text embedding providers.

mod vertex;

pub use vertex::VertexEmbeddingProvider;

use async_trait::async_trait;

use crate::error::PipelineResult;

/// How the provider should treat the input text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTaskType {
    /// Corpus side: text that will be stored in the index.
    Document,
    /// Query side: text used to search the index.
    Query,
}

impl EmbeddingTaskType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EmbeddingTaskType::Document => "RETRIEVAL_DOCUMENT",
            EmbeddingTaskType::Query => "RETRIEVAL_QUERY",
        }
    }
}

/// Trait for embedding generation providers.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate one embedding per input text, preserving input order.
    async fn embed_batch(
        &self,
        model: &str,
        task_type: EmbeddingTaskType,
        dimension: u32,
        texts: &[String],
    ) -> PipelineResult<Vec<Vec<f32>>>;
}
