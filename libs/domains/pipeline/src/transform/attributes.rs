//! Building filterable attributes from warehouse row values.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::models::{CategoricalRestrict, NumericRestrict, NumericValue, Row};

/// Build categorical restricts from the configured columns.
///
/// Null and empty-string values contribute nothing. Array values fan out
/// into the allow list entry by entry; scalars become a single-entry allow
/// list. A restrict with an empty allow list is never emitted.
pub fn build_restricts(row: &Row, restrict_columns: &[String]) -> Vec<CategoricalRestrict> {
    let mut restricts = Vec::new();
    for column in restrict_columns {
        let value = match row.get(column) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(value) => value,
        };

        let allow: Vec<String> = match value {
            Value::Array(items) => items
                .iter()
                .filter(|item| {
                    !matches!(item, Value::Null) && !matches!(item, Value::String(s) if s.is_empty())
                })
                .map(stringify)
                .collect(),
            other => vec![stringify(other)],
        };

        if !allow.is_empty() {
            restricts.push(CategoricalRestrict {
                namespace: column.clone(),
                allow,
                deny: Vec::new(),
            });
        }
    }
    restricts
}

/// Build numeric restricts from the configured columns.
///
/// Fractional numbers keep their float value; everything else goes through
/// the epoch-second coercion chain and is kept only when it coerces.
pub fn build_numeric_restricts(
    row: &Row,
    numeric_restricts_columns: &[String],
) -> Vec<NumericRestrict> {
    let mut restricts = Vec::new();
    for column in numeric_restricts_columns {
        let value = match row.get(column) {
            None | Some(Value::Null) => continue,
            Some(Value::String(s)) if s.is_empty() => continue,
            Some(value) => value,
        };

        if let Value::Number(n) = value {
            if !n.is_i64() && !n.is_u64() {
                if let Some(f) = n.as_f64() {
                    restricts.push(NumericRestrict {
                        namespace: column.clone(),
                        value: NumericValue::Float(f),
                    });
                    continue;
                }
            }
        }

        if let Some(epoch) = to_epoch_seconds(value) {
            restricts.push(NumericRestrict {
                namespace: column.clone(),
                value: NumericValue::Int(epoch),
            });
        }
    }
    restricts
}

/// Mirror selected row fields into a metadata mapping, or the whole row
/// when no columns are named.
pub fn build_metadata(row: &Row, metadata_columns: &[String]) -> Row {
    if metadata_columns.is_empty() {
        return row.clone();
    }
    let mut metadata = Row::new();
    for column in metadata_columns {
        if let Some(value) = row.get(column) {
            metadata.insert(column.clone(), value.clone());
        }
    }
    metadata
}

/// Coerce a scalar into whole epoch seconds.
///
/// Accepts booleans, integers, floats (truncated), integer-literal strings,
/// naive timestamps in three common layouts (interpreted as UTC), and
/// RFC 3339 strings. Anything else coerces to nothing.
pub fn to_epoch_seconds(value: &Value) -> Option<i64> {
    match value {
        Value::Null => None,
        Value::Bool(b) => Some(i64::from(*b)),
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => {
            let text = s.trim();
            if text.is_empty() {
                return None;
            }
            if is_integer_literal(text) {
                return text.parse().ok();
            }
            for fmt in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"] {
                if let Ok(dt) = NaiveDateTime::parse_from_str(text, fmt) {
                    return Some(dt.and_utc().timestamp());
                }
            }
            if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
                return Some(date.and_hms_opt(0, 0, 0)?.and_utc().timestamp());
            }
            DateTime::parse_from_rfc3339(text)
                .ok()
                .map(|dt| dt.timestamp())
        }
        _ => None,
    }
}

fn is_integer_literal(text: &str) -> bool {
    let digits = text.strip_prefix('-').unwrap_or(text);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
