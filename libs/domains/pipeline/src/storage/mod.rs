//! Object storage for embedding batch files.

pub mod format;
mod gcs;

pub use format::{parse_gcs_prefix, FileType};
pub use gcs::GcsStore;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PipelineResult;

/// Trait for the object store embedding batches are staged in.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write a batch of items as one object under the prefix; returns the
    /// full URI of the written object.
    async fn write_items(
        &self,
        prefix: &str,
        items: &[Value],
        filename: &str,
        file_type: FileType,
    ) -> PipelineResult<String>;

    /// Load every matching object under the prefix and concatenate their
    /// items in listing order.
    async fn load_items(&self, prefix: &str, file_type: FileType) -> PipelineResult<Vec<Value>>;
}
