//! Shared types for the dine workspace
//!
//! Common types used across crates: error codes and response structures,
//! table/session models, and small utilities.

pub mod error;
pub mod models;
pub mod util;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};
