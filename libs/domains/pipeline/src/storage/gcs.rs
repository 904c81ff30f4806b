//! Google Cloud Storage object store
//!
//! Uses the JSON API for listing and media upload/download.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::format::{blob_name, parse_gcs_prefix, parse_items, to_jsonl, FileType};
use super::ObjectStore;
use crate::auth::GoogleAuth;
use crate::error::{PipelineError, PipelineResult};

const STORAGE_BASE: &str = "https://storage.googleapis.com";

pub struct GcsStore {
    client: Client,
    auth: GoogleAuth,
}

impl GcsStore {
    pub fn new(auth: GoogleAuth) -> Self {
        Self {
            client: Client::new(),
            auth,
        }
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> PipelineResult<Vec<String>> {
        let access_token = self.auth.token().await?;
        let mut names = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(format!("{}/storage/v1/b/{}/o", STORAGE_BASE, bucket))
                .header("Authorization", format!("Bearer {}", access_token))
                .query(&[("prefix", prefix)]);
            if let Some(ref token) = page_token {
                request = request.query(&[("pageToken", token.as_str())]);
            }

            let response = request.send().await?;
            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(PipelineError::Storage(format!(
                    "GCS list error {}: {}",
                    status, body
                )));
            }

            #[derive(Deserialize)]
            struct ListResponse {
                #[serde(default)]
                items: Vec<ObjectEntry>,
                #[serde(rename = "nextPageToken", default)]
                next_page_token: Option<String>,
            }

            #[derive(Deserialize)]
            struct ObjectEntry {
                name: String,
            }

            let list: ListResponse = response
                .json()
                .await
                .map_err(|e| PipelineError::Storage(format!("Failed to parse listing: {}", e)))?;
            names.extend(list.items.into_iter().map(|entry| entry.name));

            match list.next_page_token {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(names)
    }

    async fn download_text(&self, bucket: &str, object: &str) -> PipelineResult<String> {
        let access_token = self.auth.token().await?;
        let response = self
            .client
            .get(format!(
                "{}/storage/v1/b/{}/o/{}",
                STORAGE_BASE,
                bucket,
                urlencoding::encode(object)
            ))
            .header("Authorization", format!("Bearer {}", access_token))
            .query(&[("alt", "media")])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Storage(format!(
                "GCS download error {} for {}: {}",
                status, object, body
            )));
        }

        Ok(response.text().await?)
    }
}

#[async_trait]
impl ObjectStore for GcsStore {
    async fn write_items(
        &self,
        prefix: &str,
        items: &[Value],
        filename: &str,
        file_type: FileType,
    ) -> PipelineResult<String> {
        let (bucket, path) = parse_gcs_prefix(prefix, "gcs_output_prefix")?;
        let object = blob_name(&path, filename, file_type);
        let payload = to_jsonl(items);

        let access_token = self.auth.token().await?;
        let response = self
            .client
            .post(format!("{}/upload/storage/v1/b/{}/o", STORAGE_BASE, bucket))
            .header("Authorization", format!("Bearer {}", access_token))
            .header("Content-Type", "application/json")
            .query(&[("uploadType", "media"), ("name", object.as_str())])
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PipelineError::Storage(format!(
                "GCS upload error {}: {}",
                status, body
            )));
        }

        Ok(format!("gs://{}/{}", bucket, object))
    }

    async fn load_items(&self, prefix: &str, file_type: FileType) -> PipelineResult<Vec<Value>> {
        let (bucket, path) = parse_gcs_prefix(prefix, "gcs_prefix")?;
        let list_prefix = format!("{}/", path.trim_end_matches('/'));

        let mut items = Vec::new();
        for object in self.list_objects(&bucket, &list_prefix).await? {
            if object.ends_with('/') {
                continue;
            }
            let extension = object.rsplit_once('.').map(|(_, ext)| ext.to_lowercase());
            if extension.as_deref() != Some(file_type.extension()) {
                continue;
            }
            let content = self.download_text(&bucket, &object).await?;
            items.extend(parse_items(&content, file_type)?);
        }
        Ok(items)
    }
}
