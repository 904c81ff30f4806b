//! Object naming and payload encoding for batch files.

use serde_json::Value;

use crate::error::{PipelineError, PipelineResult};

/// Supported batch file formats.
///
/// `Json` objects hold one JSON document per line, `Txt` objects hold one
/// plain-text item per line, and `Vec` objects hold a whole-file JSON
/// array treated as a single item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileType {
    #[default]
    Json,
    Txt,
    Vec,
}

impl FileType {
    /// Parse a user-supplied file type. Leading dots and surrounding
    /// whitespace are tolerated; an empty value means JSON.
    pub fn parse(raw: &str) -> PipelineResult<Self> {
        match raw.trim().trim_start_matches('.').to_lowercase().as_str() {
            "" | "json" => Ok(FileType::Json),
            "txt" => Ok(FileType::Txt),
            "vec" => Ok(FileType::Vec),
            other => Err(PipelineError::Validation(format!(
                "Unsupported file_type `{}`. Supported: json, txt, vec",
                other
            ))),
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            FileType::Json => "json",
            FileType::Txt => "txt",
            FileType::Vec => "vec",
        }
    }
}

/// Split a `gs://bucket/path` prefix into bucket and object path.
pub fn parse_gcs_prefix(prefix: &str, field_name: &str) -> PipelineResult<(String, String)> {
    let Some(remainder) = prefix.strip_prefix("gs://") else {
        return Err(PipelineError::Validation(format!(
            "{} must start with gs://",
            field_name
        )));
    };
    match remainder.split_once('/') {
        Some((bucket, path)) if !bucket.is_empty() && !path.is_empty() => {
            Ok((bucket.to_string(), path.to_string()))
        }
        _ => Err(PipelineError::Validation(format!(
            "{} must include bucket and folder path",
            field_name
        ))),
    }
}

/// Full object name for a batch file under a prefix path.
pub fn blob_name(path: &str, filename: &str, file_type: FileType) -> String {
    let clean = filename.trim();
    let clean = if clean.is_empty() { "part-00000" } else { clean };
    format!(
        "{}/{}.{}",
        path.trim_end_matches('/'),
        clean,
        file_type.extension()
    )
}

/// Encode items as newline-delimited JSON with non-ASCII characters
/// escaped, one document per line plus a trailing newline.
pub fn to_jsonl(items: &[Value]) -> String {
    let mut payload = String::new();
    for item in items {
        payload.push_str(&escape_non_ascii(&item.to_string()));
        payload.push('\n');
    }
    payload
}

fn escape_non_ascii(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        if c.is_ascii() {
            out.push(c);
        } else {
            let mut buf = [0u16; 2];
            for unit in c.encode_utf16(&mut buf) {
                out.push_str(&format!("\\u{:04x}", unit));
            }
        }
    }
    out
}

/// Decode one object's content into items according to its file type.
///
/// JSON objects are read line by line; a non-JSONL object falls back to a
/// whole-file parse where a top-level array contributes its elements.
pub fn parse_items(content: &str, file_type: FileType) -> PipelineResult<Vec<Value>> {
    let mut items = Vec::new();
    match file_type {
        FileType::Json => {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str(line) {
                    Ok(value) => items.push(value),
                    Err(_) => {
                        let parsed: Value = serde_json::from_str(content).map_err(|e| {
                            PipelineError::Validation(format!("Invalid JSON object content: {}", e))
                        })?;
                        match parsed {
                            Value::Array(values) => items.extend(values),
                            other => items.push(other),
                        }
                        break;
                    }
                }
            }
        }
        FileType::Txt => {
            for line in content.lines() {
                let line = line.trim();
                if !line.is_empty() {
                    items.push(Value::String(line.to_string()));
                }
            }
        }
        FileType::Vec => {
            let parsed: Value = serde_json::from_str(content).map_err(|e| {
                PipelineError::Validation(format!("Invalid vector file content: {}", e))
            })?;
            items.push(parsed);
        }
    }
    Ok(items)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn prefix_requires_scheme_bucket_and_path() {
        assert!(parse_gcs_prefix("s3://bucket/path", "gcs_output_prefix").is_err());
        assert!(parse_gcs_prefix("gs://bucket", "gcs_output_prefix").is_err());
        assert!(parse_gcs_prefix("gs:///path", "gcs_output_prefix").is_err());
        assert_eq!(
            parse_gcs_prefix("gs://bucket/a/b", "gcs_output_prefix").unwrap(),
            ("bucket".to_string(), "a/b".to_string())
        );
    }

    #[test]
    fn blob_name_joins_path_and_extension() {
        assert_eq!(
            blob_name("a/b/", "part-00000", FileType::Json),
            "a/b/part-00000.json"
        );
        assert_eq!(blob_name("a", "  ", FileType::Txt), "a/part-00000.txt");
    }

    #[test]
    fn file_type_parsing_is_lenient() {
        assert_eq!(FileType::parse(" .JSON ").unwrap(), FileType::Json);
        assert_eq!(FileType::parse("").unwrap(), FileType::Json);
        assert_eq!(FileType::parse("vec").unwrap(), FileType::Vec);
        assert!(FileType::parse("csv").is_err());
    }

    #[test]
    fn jsonl_escapes_non_ascii() {
        let payload = to_jsonl(&[json!({"title": "café"}), json!({"n": 1})]);
        assert_eq!(payload, "{\"title\":\"caf\\u00e9\"}\n{\"n\":1}\n");
    }

    #[test]
    fn jsonl_escapes_astral_chars_as_surrogate_pairs() {
        let payload = to_jsonl(&[json!("🎉")]);
        assert_eq!(payload, "\"\\ud83c\\udf89\"\n");
    }

    #[test]
    fn parses_jsonl_lines() {
        let items = parse_items("{\"a\":1}\n\n{\"a\":2}\n", FileType::Json).unwrap();
        assert_eq!(items, vec![json!({"a": 1}), json!({"a": 2})]);
    }

    #[test]
    fn falls_back_to_whole_file_array() {
        let items = parse_items("[\n  {\"a\": 1},\n  {\"a\": 2}\n]\n", FileType::Json).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn txt_yields_nonempty_lines() {
        let items = parse_items("red\n\n  blue  \n", FileType::Txt).unwrap();
        assert_eq!(items, vec![json!("red"), json!("blue")]);
    }

    #[test]
    fn vec_is_a_single_item() {
        let items = parse_items("[0.1, 0.2]", FileType::Vec).unwrap();
        assert_eq!(items, vec![json!([0.1, 0.2])]);
    }
}
