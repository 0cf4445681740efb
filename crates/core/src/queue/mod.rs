//! Queue operations

pub mod service;

pub use service::QueueService;
