//! HTTP API for the measurement bridge

pub mod buildinfo;
pub mod error;
pub mod handlers;
pub mod health;
pub mod sse;

pub use buildinfo::get_build_info;
pub use error::ApiError;
pub use health::health_routes;
pub use sse::event_stream;
