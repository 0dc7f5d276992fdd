//! Shared types for the storefront order core
//!
//! Common types used across the workspace: error codes, API response
//! structures, order/payment status enums, and request payloads.

pub mod error;
pub mod models;

// Re-exports
pub use axum::{Json, body};
pub use http;
pub use serde::{Deserialize, Serialize};

pub use error::{ApiResponse, AppError, AppResult, ErrorCode};
