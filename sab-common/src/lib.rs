//! # SAB Common Library
//!
//! Shared code for the sound alignment bridge:
//! - Error type
//! - Settings loading (TOML file + platform defaults)
//! - Measurement kind/source vocabulary
//! - Bridge event types
//! - Timestamp and SSE utilities

pub mod config;
pub mod error;
pub mod events;
pub mod measurement;
pub mod sse;
pub mod time;

pub use error::{Error, Result};
pub use events::BridgeEvent;
pub use measurement::{MeasurementKind, MeasurementSource};
