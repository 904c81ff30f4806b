//! Assembling index datapoints from rows and their embeddings.

use serde_json::Value;

use super::attributes::{build_metadata, build_numeric_restricts, build_restricts};
use crate::models::{AttributeStyle, Datapoint, Row};

/// Which row columns feed the datapoint's filterable attributes.
#[derive(Debug, Clone, Default)]
pub struct AttributeColumns {
    pub restrict_columns: Vec<String>,
    pub numeric_restricts_columns: Vec<String>,
    pub metadata_columns: Vec<String>,
}

/// Pick a stable identifier for a row.
///
/// Precedence is `id`, then `uuid`, then `code`, each skipped when null,
/// empty or zero; a row with none of them falls back to its 1-based
/// position in the batch.
pub fn datapoint_id(row: &Row, position: usize) -> String {
    for key in ["id", "uuid", "code"] {
        if let Some(id) = usable_id(row.get(key)) {
            return id;
        }
    }
    (position + 1).to_string()
}

fn usable_id(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null | Value::Bool(false) => None,
        Value::String(s) if s.is_empty() => None,
        Value::Number(n) if n.as_f64() == Some(0.0) => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

/// Pair each row with its embedding and build the datapoint batch.
///
/// The attribute style decides what rides along with the vector: explicit
/// restrict lists, or a metadata mirror of the row.
pub fn assemble_datapoints(
    rows: &[Row],
    embeddings: Vec<Vec<f32>>,
    style: AttributeStyle,
    columns: &AttributeColumns,
) -> Vec<Datapoint> {
    rows.iter()
        .zip(embeddings)
        .enumerate()
        .map(|(position, (row, embedding))| {
            let (restricts, numeric_restricts, metadata) = match style {
                AttributeStyle::Restricts => (
                    build_restricts(row, &columns.restrict_columns),
                    build_numeric_restricts(row, &columns.numeric_restricts_columns),
                    None,
                ),
                AttributeStyle::Metadata => (
                    Vec::new(),
                    Vec::new(),
                    Some(build_metadata(row, &columns.metadata_columns)),
                ),
            };
            Datapoint {
                id: datapoint_id(row, position),
                embedding,
                restricts,
                numeric_restricts,
                metadata,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::NumericValue;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn id_precedence_and_position_fallback() {
        assert_eq!(datapoint_id(&row(json!({"id": 7, "uuid": "u"})), 0), "7");
        assert_eq!(datapoint_id(&row(json!({"id": null, "uuid": "u"})), 0), "u");
        assert_eq!(datapoint_id(&row(json!({"id": "", "code": "c"})), 0), "c");
        assert_eq!(datapoint_id(&row(json!({"id": 0})), 4), "5");
        assert_eq!(datapoint_id(&row(json!({"title": "t"})), 0), "1");
    }

    #[test]
    fn restricts_style_builds_filter_lists() {
        let rows = vec![row(json!({"id": "a", "brand": "Acme", "rank": 3}))];
        let columns = AttributeColumns {
            restrict_columns: vec!["brand".into()],
            numeric_restricts_columns: vec!["rank".into()],
            metadata_columns: Vec::new(),
        };

        let datapoints =
            assemble_datapoints(&rows, vec![vec![0.1, 0.2]], AttributeStyle::Restricts, &columns);
        let dp = &datapoints[0];
        assert_eq!(dp.id, "a");
        assert_eq!(dp.restricts[0].allow, vec!["Acme"]);
        assert_eq!(dp.numeric_restricts[0].value, NumericValue::Int(3));
        assert!(dp.metadata.is_none());
    }

    #[test]
    fn metadata_style_mirrors_the_row() {
        let rows = vec![row(json!({"id": "a", "brand": "Acme"}))];
        let datapoints = assemble_datapoints(
            &rows,
            vec![vec![0.5]],
            AttributeStyle::Metadata,
            &AttributeColumns::default(),
        );
        let dp = &datapoints[0];
        assert!(dp.restricts.is_empty());
        assert_eq!(dp.metadata.as_ref().unwrap().get("brand"), Some(&json!("Acme")));
    }

    #[test]
    fn pairs_rows_with_embeddings_in_order() {
        let rows = vec![row(json!({"id": "x"})), row(json!({"id": "y"}))];
        let datapoints = assemble_datapoints(
            &rows,
            vec![vec![1.0], vec![2.0]],
            AttributeStyle::Restricts,
            &AttributeColumns::default(),
        );
        assert_eq!(datapoints[0].embedding, vec![1.0]);
        assert_eq!(datapoints[1].embedding, vec![2.0]);
    }
}
