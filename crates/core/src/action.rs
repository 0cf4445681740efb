//! Service actions
//!
//! Every remote call is one [`Action`]. The action knows its wire name, the
//! key its result is wrapped in, the [`Operation`] class the error
//! classifier reasons about, and whether its designated result field may be
//! legitimately missing.

use std::fmt;

/// Operation class used for error classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Name to resource path lookup
    Lookup,
    Create,
    Delete,
    GetAttributes,
    /// Any call that changes or reads messages/settings of a resolved resource
    Mutate,
}

impl Operation {
    /// Whether a "does not exist" error means an empty result
    pub const fn tolerates_absence(self) -> bool {
        matches!(self, Self::Lookup | Self::Delete | Self::GetAttributes)
    }
}

/// Remote API actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    GetQueueUrl,
    CreateQueue,
    DeleteQueue,
    SendMessage,
    SendMessageBatch,
    ReceiveMessage,
    DeleteMessage,
    GetQueueAttributes,
    SetQueueAttributes,
    GetTopic,
    CreateTopic,
    DeleteTopic,
    GetTopicAttributes,
    Publish,
    Subscribe,
    SetSubscriptionAttributes,
}

impl Action {
    /// Wire name sent as the `Action` parameter
    pub const fn name(self) -> &'static str {
        match self {
            Self::GetQueueUrl => "GetQueueUrl",
            Self::CreateQueue => "CreateQueue",
            Self::DeleteQueue => "DeleteQueue",
            Self::SendMessage => "SendMessage",
            Self::SendMessageBatch => "SendMessageBatch",
            Self::ReceiveMessage => "ReceiveMessage",
            Self::DeleteMessage => "DeleteMessage",
            Self::GetQueueAttributes => "GetQueueAttributes",
            Self::SetQueueAttributes => "SetQueueAttributes",
            Self::GetTopic => "GetTopic",
            Self::CreateTopic => "CreateTopic",
            Self::DeleteTopic => "DeleteTopic",
            Self::GetTopicAttributes => "GetTopicAttributes",
            Self::Publish => "Publish",
            Self::Subscribe => "Subscribe",
            Self::SetSubscriptionAttributes => "SetSubscriptionAttributes",
        }
    }

    /// Key wrapping the action's result in the response tree
    pub fn result_key(self) -> String {
        format!("{}Result", self.name())
    }

    pub const fn operation(self) -> Operation {
        match self {
            Self::GetQueueUrl | Self::GetTopic => Operation::Lookup,
            Self::CreateQueue | Self::CreateTopic => Operation::Create,
            Self::DeleteQueue | Self::DeleteTopic => Operation::Delete,
            Self::GetQueueAttributes | Self::GetTopicAttributes => Operation::GetAttributes,
            Self::SendMessage
            | Self::SendMessageBatch
            | Self::ReceiveMessage
            | Self::DeleteMessage
            | Self::SetQueueAttributes
            | Self::Publish
            | Self::Subscribe
            | Self::SetSubscriptionAttributes => Operation::Mutate,
        }
    }

    /// Whether a missing result field is a normal empty outcome
    ///
    /// True for a receive that found no message and for lookups that found
    /// no resource.
    pub const fn permits_absence(self) -> bool {
        matches!(self, Self::ReceiveMessage | Self::GetQueueUrl | Self::GetTopic)
    }

    /// Whether the call addresses an existing resource path
    pub const fn is_resource_scoped(self) -> bool {
        !matches!(
            self,
            Self::GetQueueUrl | Self::CreateQueue | Self::GetTopic | Self::CreateTopic
        )
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
