// File: ./src/client/mod.rs
pub mod auth;
pub mod core;
pub mod error;

pub use crate::client::core::{ApiClient, LoginResponse, ServiceInfo, VerifyResponse};
pub use crate::client::error::ApiError;
