pub mod config;
mod error_response;
pub mod extractors;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{Environment, ScaffoldSettings, Settings};
pub use error_response::ErrorResponse;
pub use router::create_router;
pub use state::AppState;
