//! HTTP API for asset upload, listing, retrieval, and deletion.

pub mod error;
pub mod handlers;
pub mod setup;
pub mod state;

pub use state::AppState;
