//! Service wiring
//!
//! Assembles the default adapters into ready-to-use queue and topic
//! services.

pub mod client;

pub use client::CourierClient;
