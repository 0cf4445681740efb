//! Response body decoding
//!
//! Success bodies become a [`ResponseNode`](courier_domain::ResponseNode)
//! tree; error bodies become a [`ServiceError`](courier_domain::ServiceError).

pub mod json;

pub use json::{parse_service_error, JsonDecoder};
