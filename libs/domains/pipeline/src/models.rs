use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// A warehouse row: ordered field name → scalar/sequence value mapping.
///
/// Rows are transient; they are read from the warehouse, transformed and
/// dropped within a single request.
pub type Row = serde_json::Map<String, serde_json::Value>;

/// A named set of string tags attached to a datapoint for exact-match
/// filtering. The attribute builder never emits a restrict with an empty
/// `allow` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CategoricalRestrict {
    pub namespace: String,
    #[serde(default, alias = "allow_list")]
    pub allow: Vec<String>,
    #[serde(default, alias = "deny_list", skip_serializing_if = "Vec::is_empty")]
    pub deny: Vec<String>,
}

/// A named numeric value used for range/exact numeric filtering.
///
/// Exactly one of integer or float is populated, enforced structurally by
/// [`NumericValue`]. Integers carry epoch-second timestamps and integral
/// quantities; floats carry continuous magnitudes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumericRestrict {
    pub namespace: String,
    #[serde(flatten)]
    pub value: NumericValue,
}

/// Tagged union for a numeric restrict value. Serializes to the index's
/// `value_int`/`value_float` wire fields.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub enum NumericValue {
    #[serde(rename = "value_int")]
    Int(i64),
    #[serde(rename = "value_float")]
    Float(f64),
}

impl NumericValue {
    pub fn as_json(&self) -> serde_json::Value {
        match self {
            NumericValue::Int(v) => serde_json::Value::from(*v),
            NumericValue::Float(v) => serde_json::Value::from(*v),
        }
    }
}

/// The unit persisted into the vector index.
///
/// Attribute content follows the deployment's [`AttributeStyle`]: either the
/// explicit restrict lists are populated, or `metadata` mirrors the source
/// row — never both for one datapoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Datapoint {
    pub id: String,
    pub embedding: Vec<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub restricts: Vec<CategoricalRestrict>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub numeric_restricts: Vec<NumericRestrict>,
    #[serde(
        default,
        alias = "embedding_metadata",
        skip_serializing_if = "Option::is_none"
    )]
    #[schema(value_type = Object)]
    pub metadata: Option<Row>,
}

/// Which attribute representation a deployment writes into its datapoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum AttributeStyle {
    /// Explicit categorical/numeric restrict lists built from configured
    /// columns.
    #[default]
    Restricts,
    /// A single free-form metadata mapping mirroring the source row
    /// (selected fields only, or the whole row if none selected).
    Metadata,
}

/// Client-supplied search-time constraint, translated 1:1 into the index's
/// native filter object.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FilterSpec {
    pub namespace: String,
    #[serde(default, alias = "allow_list")]
    pub allow: Vec<String>,
    #[serde(default, alias = "deny_list")]
    pub deny: Vec<String>,
}

/// The index's native per-namespace filter. Filters are ANDed by the index
/// service in the order given.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct NamespaceFilter {
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allow_list: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub deny_list: Vec<String>,
}

/// A raw neighbor hit as exposed by the index service: an identifier, an
/// optional distance, and the stored attributes in whichever representation
/// was indexed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Neighbor {
    pub id: Option<String>,
    pub distance: Option<f64>,
    pub restricts: Vec<CategoricalRestrict>,
    pub numeric_restricts: Vec<NumericRestrict>,
    pub metadata: Option<Row>,
}

/// Typed, human-readable search hit reconstructed from a [`Neighbor`].
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SearchResult {
    pub id: String,
    pub score: Option<f64>,
    #[schema(value_type = Object)]
    pub metadata: Row,
}

/// Whether a search request carries raw text or a pre-computed vector.
/// Accepted case-insensitively on the wire, serialized lowercase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum QueryKind {
    #[default]
    Vector,
    Text,
}

impl<'de> Deserialize<'de> for QueryKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        match raw.to_lowercase().as_str() {
            "vector" => Ok(QueryKind::Vector),
            "text" => Ok(QueryKind::Text),
            other => Err(serde::de::Error::unknown_variant(
                other,
                &["vector", "text"],
            )),
        }
    }
}
