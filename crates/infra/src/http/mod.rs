//! HTTP transport adapter

pub mod client;

pub use client::{target_url, HttpClient, HttpClientBuilder};
