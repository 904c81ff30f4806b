//! Presence-based merging of request bodies with configured defaults.

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};
use crate::models::Row;

/// Merge a request body with an operation's default-value map.
///
/// A default fills a field only when the request omitted it or sent an
/// explicit `null`. Any other value the caller sent wins, including falsy
/// ones like `0`, `""` or `false`. Keys the defaults map does not know
/// about pass through untouched.
pub fn apply_defaults(request: &Row, defaults: &Row) -> Row {
    let mut merged = request.clone();
    for (key, default) in defaults {
        let needs_default = match merged.get(key) {
            None | Some(Value::Null) => true,
            Some(_) => false,
        };
        if needs_default {
            merged.insert(key.clone(), default.clone());
        }
    }
    merged
}

/// Merge defaults into a request body and deserialize the result into a
/// resolved parameter struct. A request that still fails to deserialize
/// after defaulting is a client fault.
pub fn resolve<T: DeserializeOwned>(request: &Row, defaults: &Row) -> PipelineResult<(T, Row)> {
    let merged = apply_defaults(request, defaults);
    let resolved = serde_json::from_value(Value::Object(merged.clone()))
        .map_err(|e| PipelineError::Validation(format!("Invalid request: {}", e)))?;
    Ok((resolved, merged))
}

/// View a request body as a raw field map. Fields the caller did not send
/// must serialize as absent, not as `null`, for defaulting to see them.
pub fn to_row<T: Serialize>(request: &T) -> PipelineResult<Row> {
    match serde_json::to_value(request)? {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::Internal(format!(
            "Request body serialized to non-object JSON: {}",
            other
        ))),
    }
}
