//! Vertex AI Vector Search client
//!
//! Talks to the regional `aiplatform` REST surface for index lifecycle,
//! streaming upsert/removal, and neighbor queries.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::{DeploymentSpec, EndpointDefinition, IndexDefinition, VectorIndexClient};
use crate::auth::GoogleAuth;
use crate::error::{PipelineError, PipelineResult};
use crate::models::{
    CategoricalRestrict, Datapoint, NamespaceFilter, Neighbor, NumericRestrict, NumericValue, Row,
};

pub struct VertexIndexClient {
    client: Client,
    auth: GoogleAuth,
    project_id: String,
    location: String,
}

impl VertexIndexClient {
    pub fn new(auth: GoogleAuth, project_id: String, location: String) -> Self {
        Self {
            client: Client::new(),
            auth,
            project_id,
            location,
        }
    }

    fn base_url(&self) -> String {
        format!("https://{}-aiplatform.googleapis.com/v1", self.location)
    }

    fn parent(&self) -> String {
        format!("projects/{}/locations/{}", self.project_id, self.location)
    }

    /// Accept either a bare id or a full resource name.
    fn index_resource(&self, id: &str) -> String {
        if id.starts_with("projects/") {
            id.to_string()
        } else {
            format!("{}/indexes/{}", self.parent(), id)
        }
    }

    fn endpoint_resource(&self, id: &str) -> String {
        if id.starts_with("projects/") {
            id.to_string()
        } else {
            format!("{}/indexEndpoints/{}", self.parent(), id)
        }
    }

    async fn post_json(&self, url: &str, body: &Value) -> PipelineResult<Value> {
        let access_token = self.auth.token().await?;
        let response = self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Index(format!(
                "Vector index API error {}: {}",
                status, body
            )));
        }

        Ok(response.json().await?)
    }
}

/// Map a request-level distance name onto the API enum, defaulting to dot
/// product for unknown names.
fn distance_measure(distance: &str) -> &'static str {
    match distance {
        "COSINE" => "COSINE_DISTANCE",
        "L2_NORM" => "SQUARED_L2_DISTANCE",
        _ => "DOT_PRODUCT_DISTANCE",
    }
}

fn feature_norm(norm: &str) -> &'static str {
    match norm {
        "UNIT_L2_NORM" => "UNIT_L2_NORM",
        _ => "NONE",
    }
}

/// A create call returns a long-running operation named
/// `<resource>/operations/<id>`; the resource identifier is the part
/// before the operations segment.
fn resource_from_operation(operation_name: &str) -> String {
    match operation_name.split_once("/operations/") {
        Some((resource, _)) => resource.to_string(),
        None => operation_name.to_string(),
    }
}

// Wire types for the datapoint surface, which speaks camelCase.

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireDatapoint {
    datapoint_id: String,
    feature_vector: Vec<f32>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    restricts: Vec<NamespaceFilter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    numeric_restricts: Vec<WireNumericOut>,
    #[serde(skip_serializing_if = "Option::is_none")]
    embedding_metadata: Option<Row>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireNumericOut {
    namespace: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_int: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    value_float: Option<f64>,
}

impl From<&Datapoint> for WireDatapoint {
    fn from(dp: &Datapoint) -> Self {
        Self {
            datapoint_id: dp.id.clone(),
            feature_vector: dp.embedding.clone(),
            restricts: dp
                .restricts
                .iter()
                .map(|r| NamespaceFilter {
                    namespace: r.namespace.clone(),
                    allow_list: r.allow.clone(),
                    deny_list: r.deny.clone(),
                })
                .collect(),
            numeric_restricts: dp
                .numeric_restricts
                .iter()
                .map(|n| match n.value {
                    NumericValue::Int(v) => WireNumericOut {
                        namespace: n.namespace.clone(),
                        value_int: Some(v),
                        value_float: None,
                    },
                    NumericValue::Float(v) => WireNumericOut {
                        namespace: n.namespace.clone(),
                        value_int: None,
                        value_float: Some(v),
                    },
                })
                .collect(),
            embedding_metadata: dp.metadata.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FindNeighborsResponse {
    #[serde(default)]
    nearest_neighbors: Vec<NearestNeighbors>,
}

#[derive(Debug, Deserialize)]
struct NearestNeighbors {
    #[serde(default)]
    neighbors: Vec<WireNeighbor>,
}

#[derive(Debug, Deserialize)]
struct WireNeighbor {
    #[serde(default)]
    datapoint: Option<WireStoredDatapoint>,
    #[serde(default)]
    distance: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireStoredDatapoint {
    #[serde(default)]
    datapoint_id: Option<String>,
    #[serde(default)]
    restricts: Vec<WireRestrictIn>,
    #[serde(default)]
    numeric_restricts: Vec<WireNumericIn>,
    #[serde(default)]
    embedding_metadata: Option<Row>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRestrictIn {
    namespace: String,
    #[serde(default)]
    allow_list: Vec<String>,
    #[serde(default)]
    deny_list: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireNumericIn {
    namespace: String,
    // int64 fields arrive as JSON strings
    #[serde(default)]
    value_int: Option<Value>,
    #[serde(default)]
    value_float: Option<f64>,
    #[serde(default)]
    value_double: Option<f64>,
}

impl WireNumericIn {
    fn into_restrict(self) -> Option<NumericRestrict> {
        let value = if let Some(raw) = self.value_int {
            let parsed = match raw {
                Value::Number(n) => n.as_i64(),
                Value::String(s) => s.parse().ok(),
                _ => None,
            };
            NumericValue::Int(parsed?)
        } else if let Some(f) = self.value_float.or(self.value_double) {
            NumericValue::Float(f)
        } else {
            return None;
        };
        Some(NumericRestrict {
            namespace: self.namespace,
            value,
        })
    }
}

fn into_neighbor(wire: WireNeighbor) -> Neighbor {
    let mut neighbor = Neighbor {
        distance: wire.distance,
        ..Default::default()
    };
    if let Some(stored) = wire.datapoint {
        neighbor.id = stored.datapoint_id;
        neighbor.restricts = stored
            .restricts
            .into_iter()
            .map(|r| CategoricalRestrict {
                namespace: r.namespace,
                allow: r.allow_list,
                deny: r.deny_list,
            })
            .collect();
        neighbor.numeric_restricts = stored
            .numeric_restricts
            .into_iter()
            .filter_map(WireNumericIn::into_restrict)
            .collect();
        neighbor.metadata = stored.embedding_metadata;
    }
    neighbor
}

#[async_trait]
impl VectorIndexClient for VertexIndexClient {
    async fn create_index(&self, definition: &IndexDefinition) -> PipelineResult<String> {
        let url = format!("{}/{}/indexes", self.base_url(), self.parent());
        let mut body = json!({
            "displayName": definition.display_name,
            "indexUpdateMethod": definition.index_update_method,
            "metadata": {
                "config": {
                    "dimensions": definition.dimensions,
                    "shardSize": definition.shard_size,
                    "approximateNeighborsCount": definition.approximate_neighbors_count,
                    "distanceMeasureType": distance_measure(&definition.distance_measure_type),
                    "featureNormType": feature_norm(&definition.feature_norm_type),
                    "algorithmConfig": {
                        "treeAhConfig": {
                            "leafNodeEmbeddingCount": definition.leaf_node_embedding_count,
                            "leafNodesToSearchPercent": definition.leaf_nodes_to_search_percent,
                        }
                    }
                }
            }
        });
        if let Some(ref description) = definition.description {
            body["description"] = json!(description);
        }

        let operation = self.post_json(&url, &body).await?;
        let name = operation["name"].as_str().ok_or_else(|| {
            PipelineError::Index("Create index response had no operation name".to_string())
        })?;
        Ok(resource_from_operation(name))
    }

    async fn create_endpoint(&self, definition: &EndpointDefinition) -> PipelineResult<String> {
        let url = format!("{}/{}/indexEndpoints", self.base_url(), self.parent());
        let mut body = json!({
            "displayName": definition.display_name,
            "publicEndpointEnabled": definition.public_endpoint_enabled,
        });
        if let Some(ref description) = definition.description {
            body["description"] = json!(description);
        }

        let operation = self.post_json(&url, &body).await?;
        let name = operation["name"].as_str().ok_or_else(|| {
            PipelineError::Index("Create endpoint response had no operation name".to_string())
        })?;
        Ok(resource_from_operation(name))
    }

    async fn deploy_index(&self, spec: &DeploymentSpec) -> PipelineResult<()> {
        let url = format!(
            "{}/{}:deployIndex",
            self.base_url(),
            self.endpoint_resource(&spec.endpoint_id)
        );
        let body = json!({
            "deployedIndex": {
                "id": spec.deployed_index_id,
                "index": self.index_resource(&spec.index_id),
                "dedicatedResources": {
                    "machineSpec": {"machineType": spec.machine_type},
                    "minReplicaCount": spec.min_replica_count,
                    "maxReplicaCount": spec.max_replica_count,
                }
            }
        });
        self.post_json(&url, &body).await?;
        Ok(())
    }

    async fn upsert_datapoints(
        &self,
        index_id: &str,
        datapoints: &[Datapoint],
    ) -> PipelineResult<()> {
        let url = format!(
            "{}/{}:upsertDatapoints",
            self.base_url(),
            self.index_resource(index_id)
        );
        let wire: Vec<WireDatapoint> = datapoints.iter().map(WireDatapoint::from).collect();
        self.post_json(&url, &json!({"datapoints": wire})).await?;
        Ok(())
    }

    async fn remove_datapoints(
        &self,
        index_id: &str,
        datapoint_ids: &[String],
    ) -> PipelineResult<()> {
        let url = format!(
            "{}/{}:removeDatapoints",
            self.base_url(),
            self.index_resource(index_id)
        );
        self.post_json(&url, &json!({"datapointIds": datapoint_ids}))
            .await?;
        Ok(())
    }

    async fn find_neighbors(
        &self,
        endpoint_id: &str,
        deployed_index_id: &str,
        query: &[f32],
        top_k: u32,
        filters: &[NamespaceFilter],
    ) -> PipelineResult<Vec<Neighbor>> {
        let url = format!(
            "{}/{}:findNeighbors",
            self.base_url(),
            self.endpoint_resource(endpoint_id)
        );
        let mut datapoint = json!({"featureVector": query});
        if !filters.is_empty() {
            datapoint["restricts"] = json!(filters);
        }
        let body = json!({
            "deployedIndexId": deployed_index_id,
            "returnFullDatapoint": true,
            "queries": [{
                "datapoint": datapoint,
                "neighborCount": top_k,
            }]
        });

        let raw = self.post_json(&url, &body).await?;
        let response: FindNeighborsResponse = serde_json::from_value(raw)
            .map_err(|e| PipelineError::Index(format!("Failed to parse neighbors: {}", e)))?;

        Ok(response
            .nearest_neighbors
            .into_iter()
            .next()
            .map(|nn| nn.neighbors.into_iter().map(into_neighbor).collect())
            .unwrap_or_default())
    }
}
