//! Shared axum plumbing: error responses, health endpoint, router and
//! server builders with the project-standard middleware stack.

pub mod errors;
pub mod health;
pub mod middleware;
pub mod server;
pub mod shutdown;

pub use errors::{AppError, ErrorResponse};
pub use health::health_router;
pub use server::{create_app, create_router};
pub use shutdown::shutdown_signal;
