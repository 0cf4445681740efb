//! Client constants
//!
//! Service limits, attribute keys and configuration defaults shared by the
//! core services and the infrastructure adapters.

// Service limits
pub const SUBJECT_MAX_CHARS: usize = 100;
pub const MAX_BATCH_ENTRIES: usize = 10;

// Retry defaults
pub const DEFAULT_MAX_ATTEMPTS: u32 = 5;
pub const DEFAULT_COOLDOWN_SECONDS: u64 = 60;
pub const DEFAULT_TRANSPORT_DELAY_MS: u64 = 1_000;

// HTTP defaults
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("courier/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_ENDPOINT: &str = "http://localhost:9324";
pub const DEFAULT_REGION: &str = "us-east-1";

// Queue attribute keys
pub const ATTR_APPROXIMATE_MESSAGES: &str = "ApproximateNumberOfMessages";
pub const ATTR_APPROXIMATE_NOT_VISIBLE: &str = "ApproximateNumberOfMessagesNotVisible";
pub const ATTR_QUEUE_ARN: &str = "QueueArn";
pub const ATTR_POLICY: &str = "Policy";

// Topic / subscription attribute keys
pub const ATTR_RAW_MESSAGE_DELIVERY: &str = "RawMessageDelivery";
