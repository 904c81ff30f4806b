//! Composing embeddable text from warehouse rows.

use serde_json::Value;

use crate::models::Row;

/// Identifier-like columns that never carry embeddable text.
const EXCLUDED_COLUMNS: [&str; 3] = ["id", "uuid", "code"];

/// Columns to embed when the request does not name any: every column of the
/// row except identifier columns, in row order.
pub fn default_text_columns(row: &Row) -> Vec<String> {
    row.keys()
        .filter(|key| !EXCLUDED_COLUMNS.contains(&key.as_str()))
        .cloned()
        .collect()
}

/// Join the selected column values into one newline-separated text.
///
/// Null and empty-string values are skipped; remaining values are
/// stringified and trimmed. A row with no usable text yields a single
/// space so the embedding provider still receives a non-empty input.
pub fn compose_text(row: &Row, columns: &[String]) -> String {
    let parts: Vec<String> = columns
        .iter()
        .filter_map(|column| match row.get(column) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) if s.is_empty() => None,
            Some(value) => {
                let part = stringify(value).trim().to_string();
                (!part.is_empty()).then_some(part)
            }
        })
        .collect();

    let text = parts.join("\n");
    if text.is_empty() { " ".to_string() } else { text }
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn joins_selected_columns_with_newlines() {
        let row = row(json!({"title": "Red shoe", "brand": "Acme", "price": 10}));
        let columns = vec!["title".to_string(), "brand".to_string()];
        assert_eq!(compose_text(&row, &columns), "Red shoe\nAcme");
    }

    #[test]
    fn skips_null_and_empty_values() {
        let row = row(json!({"title": "Red shoe", "brand": null, "color": "", "size": "  "}));
        let columns = ["title", "brand", "color", "size"]
            .map(String::from)
            .to_vec();
        assert_eq!(compose_text(&row, &columns), "Red shoe");
    }

    #[test]
    fn empty_row_yields_placeholder_space() {
        let row = row(json!({"title": null, "brand": ""}));
        let columns = ["title", "brand"].map(String::from).to_vec();
        assert_eq!(compose_text(&row, &columns), " ");
    }

    #[test]
    fn non_string_values_are_stringified() {
        let row = row(json!({"price": 19.5, "in_stock": true}));
        let columns = ["price", "in_stock"].map(String::from).to_vec();
        assert_eq!(compose_text(&row, &columns), "19.5\ntrue");
    }

    #[test]
    fn default_columns_exclude_identifiers() {
        let row = row(json!({"id": 1, "uuid": "u", "code": "c", "title": "t", "brand": "b"}));
        assert_eq!(default_text_columns(&row), vec!["title", "brand"]);
    }
}
