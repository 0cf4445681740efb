//! Domain types and models

pub mod context;
pub mod message;
pub mod response;

pub use context::{ResourceContext, ResourceKind};
pub use message::{
    BatchConfirmation, Message, PublishConfirmation, ReceiveOptions, SendConfirmation,
    Subscription, SubscriptionEndpoint,
};
pub use response::ResponseNode;
