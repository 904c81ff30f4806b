use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::error::{PipelineError, PipelineResult};
use crate::models::{AttributeStyle, Row};

/// Process-wide pipeline configuration.
///
/// Loaded once at startup and shared read-only across requests (wrap in an
/// `Arc`); invalidated only by a process restart.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PipelineConfig {
    /// Cloud project the collaborator services live in.
    pub project_id: Option<String>,
    /// Cloud region for the embedding model and the vector index.
    pub region: Option<String>,
    /// Which attribute representation this deployment writes.
    #[serde(default)]
    pub attribute_style: AttributeStyle,
    /// Per-operation default-value maps, keyed by operation name
    /// (`embed_rows`, `embed_text`, `search`, ...).
    #[serde(default)]
    pub defaults: HashMap<String, Row>,
}

impl PipelineConfig {
    /// Read configuration from a JSON file.
    pub fn from_file(path: &Path) -> PipelineResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::Config(format!("Failed to read {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&contents).map_err(|e| {
            PipelineError::Config(format!("Failed to parse {}: {}", path.display(), e))
        })
    }

    /// Load configuration for the current process.
    ///
    /// Reads the JSON file named by `PIPELINE_CONFIG` (default
    /// `config/pipeline.json`; a missing default file yields an empty
    /// config), then lets `GOOGLE_CLOUD_PROJECT` and `GOOGLE_CLOUD_REGION`
    /// override the file's project context.
    pub fn load() -> PipelineResult<Self> {
        let mut config = match std::env::var("PIPELINE_CONFIG") {
            Ok(path) => Self::from_file(Path::new(&path))?,
            Err(_) => {
                let default_path = Path::new("config/pipeline.json");
                if default_path.exists() {
                    Self::from_file(default_path)?
                } else {
                    Self::default()
                }
            }
        };

        if let Ok(project_id) = std::env::var("GOOGLE_CLOUD_PROJECT") {
            config.project_id = Some(project_id);
        }
        if let Ok(region) = std::env::var("GOOGLE_CLOUD_REGION") {
            config.region = Some(region);
        }

        Ok(config)
    }

    /// Default-value map for one operation; empty when none is configured.
    pub fn defaults_for(&self, operation: &str) -> Row {
        self.defaults.get(operation).cloned().unwrap_or_default()
    }

    /// Project context required by every operation that calls an external
    /// service. Missing context is a server-side configuration fault.
    pub fn require_context(&self) -> PipelineResult<(&str, &str)> {
        match (self.project_id.as_deref(), self.region.as_deref()) {
            (Some(project), Some(region)) if !project.is_empty() && !region.is_empty() => {
                Ok((project, region))
            }
            _ => Err(PipelineError::Config(
                "Missing `project_id` or `region` in pipeline configuration".to_string(),
            )),
        }
    }
}
