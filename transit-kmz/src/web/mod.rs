//! Web layer for the KMZ generator.
//!
//! Provides a health check and the generation endpoint.

mod dto;
mod routes;
mod state;

pub use dto::*;
pub use routes::{AppError, create_router};
pub use state::AppState;
