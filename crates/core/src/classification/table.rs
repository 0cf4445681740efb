//! Error code tables
//!
//! Codes are matched on their last dotted segment, so
//! `AWS.SimpleQueueService.NonExistentQueue` and `NonExistentQueue` land in
//! the same category.

use std::collections::BTreeSet;

/// Category of a recognised service error code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// The addressed resource does not exist
    NotFound,
    /// A resource with the same name exists in a conflicting state
    Conflict,
    /// The name was deleted recently and cannot be reused yet
    Cooldown,
}

/// Code suffixes per category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorCodeTable {
    not_found: BTreeSet<String>,
    conflict: BTreeSet<String>,
    cooldown: BTreeSet<String>,
}

impl Default for ErrorCodeTable {
    fn default() -> Self {
        Self {
            not_found: set(&["NonExistentQueue", "QueueDoesNotExist", "NotFound", "ResourceNotFound"]),
            conflict: set(&["QueueAlreadyExists", "QueueNameExists", "TopicAlreadyExists"]),
            cooldown: set(&["QueueDeletedRecently", "ResourceDeletedRecently"]),
        }
    }
}

impl ErrorCodeTable {
    /// Table with no codes; every service error is fatal
    pub fn empty() -> Self {
        Self { not_found: BTreeSet::new(), conflict: BTreeSet::new(), cooldown: BTreeSet::new() }
    }

    /// Add a code suffix to `category`
    #[must_use]
    pub fn with_code(mut self, category: ErrorCategory, code: impl Into<String>) -> Self {
        self.codes_mut(category).insert(code.into());
        self
    }

    /// Remove a code suffix from `category`
    #[must_use]
    pub fn without_code(mut self, category: ErrorCategory, code: &str) -> Self {
        self.codes_mut(category).remove(code);
        self
    }

    /// Category of a code suffix, if recognised
    pub fn category(&self, code_suffix: &str) -> Option<ErrorCategory> {
        [ErrorCategory::NotFound, ErrorCategory::Conflict, ErrorCategory::Cooldown]
            .into_iter()
            .find(|category| self.codes(*category).contains(code_suffix))
    }

    pub fn codes(&self, category: ErrorCategory) -> &BTreeSet<String> {
        match category {
            ErrorCategory::NotFound => &self.not_found,
            ErrorCategory::Conflict => &self.conflict,
            ErrorCategory::Cooldown => &self.cooldown,
        }
    }

    fn codes_mut(&mut self, category: ErrorCategory) -> &mut BTreeSet<String> {
        match category {
            ErrorCategory::NotFound => &mut self.not_found,
            ErrorCategory::Conflict => &mut self.conflict,
            ErrorCategory::Cooldown => &mut self.cooldown,
        }
    }
}

fn set(codes: &[&str]) -> BTreeSet<String> {
    codes.iter().map(|code| (*code).to_string()).collect()
}
