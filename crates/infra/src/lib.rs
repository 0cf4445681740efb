//! # Courier Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - The reqwest HTTP transport
//! - JSON response decoding and service error parsing
//! - Message body hashing
//! - Configuration loading and tracing initialisation
//! - Default client wiring
//!
//! ## Architecture
//! - Implements traits defined in `courier-core`
//! - Contains all "impure" code (network, file system, environment)

pub mod config;
pub mod decoding;
pub mod errors;
pub mod hashing;
pub mod http;
pub mod observability;
pub mod services;

// Re-export commonly used items
pub use decoding::{parse_service_error, JsonDecoder};
pub use errors::InfraError;
pub use hashing::HashDigester;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
pub use services::CourierClient;
