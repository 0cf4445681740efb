//! # Courier Domain
//!
//! Data types for the Courier queue/topic client.
//!
//! This crate contains:
//! - Resource addressing (`ResourceContext`) and message types
//! - The client error type and Result definition
//! - Configuration structures
//! - Service limits and attribute keys
//!
//! ## Architecture
//! - Depends only on the `foundation` tier of `courier-common` for the error
//!   classification vocabulary
//! - Pure data structures, no I/O

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
