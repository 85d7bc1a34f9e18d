//! HTTP surface: a health probe and a single-document analysis endpoint.

mod handlers;
mod routes;
mod state;

pub use handlers::{HealthData, LlmStatus, FAILED_FIELDS_HEADER};
pub use routes::create_router;
pub use state::AppState;
