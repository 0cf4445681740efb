//! # Courier Core
//!
//! Request execution and retry classification for the queue/topic client.
//!
//! This crate contains:
//! - Port interfaces (traits) for transport, decoding and hashing
//! - Parameter encoding and the request executor
//! - The service error classifier and retrying dispatcher
//! - Queue and topic services
//!
//! ## Architecture Principles
//! - Depends only on `courier-common` and `courier-domain`
//! - No HTTP or file system code
//! - All external collaborators via traits

pub mod action;
pub mod classification;
pub mod dispatch;
pub mod executor;
pub mod params;
pub mod ports;
pub mod queue;
pub mod topic;

// Re-export specific items to avoid ambiguity
pub use action::{Action, Operation};
pub use classification::{Classification, ErrorCategory, ErrorCodeTable, ServiceErrorClassifier};
pub use dispatch::Dispatcher;
pub use executor::RequestExecutor;
pub use params::Params;
pub use ports::{Digester, HttpInvoker, RawResponse, ResponseDecoder};
pub use queue::QueueService;
pub use topic::TopicService;
