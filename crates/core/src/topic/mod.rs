//! Topic operations

pub mod policy;
pub mod service;

pub use service::TopicService;
