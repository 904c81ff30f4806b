//! BigQuery warehouse client
//!
//! Runs synchronous queries through the `jobs.query` REST endpoint and
//! converts the positional row encoding back into name-keyed rows.

use async_trait::async_trait;
use chrono::DateTime;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WarehouseClient;
use crate::auth::GoogleAuth;
use crate::error::{PipelineError, PipelineResult};
use crate::models::Row;

pub struct BigQueryClient {
    client: Client,
    auth: GoogleAuth,
    project_id: String,
}

impl BigQueryClient {
    pub fn new(auth: GoogleAuth, project_id: String) -> Self {
        Self {
            client: Client::new(),
            auth,
            project_id,
        }
    }

    fn query_url(&self) -> String {
        format!(
            "https://bigquery.googleapis.com/bigquery/v2/projects/{}/queries",
            self.project_id
        )
    }
}

/// Build the SELECT statement for a table read. Backticks keep table and
/// column names with dots or reserved words valid.
fn build_query(table: &str, where_clause: Option<&str>, columns: &[String]) -> String {
    let select = select_clause(columns);
    let filter = match where_clause {
        Some(clause) if !clause.trim().is_empty() => clause.trim(),
        _ => "TRUE",
    };
    format!("SELECT {} FROM `{}` WHERE {}", select, table, filter)
}

fn select_clause(columns: &[String]) -> String {
    let cols: Vec<String> = columns
        .iter()
        .map(|col| col.trim())
        .filter(|col| !col.is_empty())
        .map(|col| format!("`{}`", col))
        .collect();
    if cols.is_empty() {
        "*".to_string()
    } else {
        cols.join(", ")
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest {
    query: String,
    #[serde(rename = "useLegacySql")]
    use_legacy_sql: bool,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(rename = "jobComplete", default)]
    job_complete: bool,
    #[serde(default)]
    schema: Option<TableSchema>,
    #[serde(default)]
    rows: Vec<EncodedRow>,
}

#[derive(Debug, Deserialize)]
struct TableSchema {
    fields: Vec<SchemaField>,
}

#[derive(Debug, Deserialize)]
struct SchemaField {
    name: String,
    #[serde(rename = "type")]
    field_type: String,
    #[serde(default)]
    mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EncodedRow {
    f: Vec<Cell>,
}

#[derive(Debug, Deserialize)]
struct Cell {
    v: Value,
}

/// Decode one positional cell using its schema field.
///
/// The REST encoding carries every scalar as a string; numbers, booleans
/// and timestamps are converted back to typed JSON so downstream attribute
/// building sees real values. Timestamps become RFC 3339 UTC strings.
fn decode_cell(field: &SchemaField, value: Value) -> Value {
    if field.mode.as_deref() == Some("REPEATED") {
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return Value::Array(vec![]),
            other => vec![other],
        };
        return Value::Array(
            items
                .into_iter()
                .map(|item| match item {
                    Value::Object(mut cell) => {
                        let inner = cell.remove("v").unwrap_or(Value::Null);
                        decode_scalar(&field.field_type, inner)
                    }
                    other => decode_scalar(&field.field_type, other),
                })
                .collect(),
        );
    }
    decode_scalar(&field.field_type, value)
}

fn decode_scalar(field_type: &str, value: Value) -> Value {
    let text = match value {
        Value::Null => return Value::Null,
        Value::String(s) => s,
        other => return other,
    };

    match field_type {
        "INTEGER" | "INT64" => text
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or(Value::String(text)),
        "FLOAT" | "FLOAT64" | "NUMERIC" | "BIGNUMERIC" => text
            .parse::<f64>()
            .map(Value::from)
            .unwrap_or(Value::String(text)),
        "BOOLEAN" | "BOOL" => match text.as_str() {
            "true" | "TRUE" => Value::Bool(true),
            "false" | "FALSE" => Value::Bool(false),
            _ => Value::String(text),
        },
        "TIMESTAMP" => text
            .parse::<f64>()
            .ok()
            .and_then(|epoch| DateTime::from_timestamp(epoch.trunc() as i64, 0))
            .map(|dt| Value::String(dt.to_rfc3339()))
            .unwrap_or(Value::String(text)),
        _ => Value::String(text),
    }
}

fn decode_rows(response: QueryResponse) -> PipelineResult<Vec<Row>> {
    let Some(schema) = response.schema else {
        return Ok(vec![]);
    };

    let mut rows = Vec::with_capacity(response.rows.len());
    for encoded in response.rows {
        let mut row = Row::new();
        for (field, cell) in schema.fields.iter().zip(encoded.f) {
            row.insert(field.name.clone(), decode_cell(field, cell.v));
        }
        rows.push(row);
    }
    Ok(rows)
}

#[async_trait]
impl WarehouseClient for BigQueryClient {
    async fn query_rows<'a>(
        &self,
        table: &str,
        where_clause: Option<&'a str>,
        columns: &[String],
    ) -> PipelineResult<Vec<Row>> {
        let access_token = self.auth.token().await?;
        let query = build_query(table, where_clause, columns);
        tracing::debug!(query = %query, "Running warehouse query");

        let response = self
            .client
            .post(self.query_url())
            .header("Authorization", format!("Bearer {}", access_token))
            .json(&QueryRequest {
                query,
                use_legacy_sql: false,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            if status.as_u16() == 400 {
                return Err(PipelineError::Validation(format!(
                    "Invalid warehouse query: {}",
                    body
                )));
            }
            return Err(PipelineError::Warehouse(format!(
                "BigQuery API error {}: {}",
                status, body
            )));
        }

        let query_response: QueryResponse = response
            .json()
            .await
            .map_err(|e| PipelineError::Warehouse(format!("Failed to parse response: {}", e)))?;

        if !query_response.job_complete {
            return Err(PipelineError::Warehouse(
                "Query did not complete within the synchronous window".to_string(),
            ));
        }

        decode_rows(query_response)
    }
}
