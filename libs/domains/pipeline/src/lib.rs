//! Vector pipeline domain
//!
//! Turns warehouse rows into embedded, filterable datapoints and serves
//! the surrounding lifecycle: embedding, staging batches in object
//! storage, index and endpoint management, bulk upsert/delete, and
//! nearest-neighbor search.

pub mod auth;
pub mod config;
pub mod defaults;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod index;
pub mod models;
pub mod requests;
pub mod service;
pub mod storage;
pub mod transform;
pub mod warehouse;

pub use auth::GoogleAuth;
pub use config::PipelineConfig;
pub use error::{PipelineError, PipelineResult};
pub use handlers::{pipeline_router, PipelineApiDoc};
pub use service::PipelineService;
