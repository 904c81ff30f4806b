//! Warehouse access for source rows.

mod bigquery;

pub use bigquery::BigQueryClient;

use async_trait::async_trait;

use crate::error::PipelineResult;
use crate::models::Row;

/// Trait for the tabular warehouse the pipeline reads source rows from.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait WarehouseClient: Send + Sync {
    /// Fetch rows from a table, optionally filtered and projected. An
    /// absent filter selects every row; an empty column list selects every
    /// column.
    async fn query_rows<'a>(
        &self,
        table: &str,
        where_clause: Option<&'a str>,
        columns: &[String],
    ) -> PipelineResult<Vec<Row>>;
}
