//! Service error classification
//!
//! Turns a failed call into a [`RetryVerdict`](courier_common::RetryVerdict)
//! for the retry controller, based on the operation being attempted and the
//! service error code.

pub mod classifier;
pub mod table;

pub use classifier::{Classification, ServiceErrorClassifier};
pub use table::{ErrorCategory, ErrorCodeTable};
