use shared::domain::UserId;
use thiserror::Error;

use crate::draft::{NestedField, Tab};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("directory unavailable: {0}")]
    TransientRemoteFailure(String),
    #[error("cached session is unreadable: {0}")]
    StructuralCorruption(String),
    #[error("directory returned user {received} while revalidating {expected}")]
    IdentityMismatch { expected: UserId, received: UserId },
}

/// The inspection store refused the record. The message is the store's own, unaltered.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SaveError {
    #[error("{0}")]
    Rejected(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DraftError {
    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("{parent:?} has no key '{key}'")]
    UnknownKey { parent: NestedField, key: String },
    #[error("the {tab:?} tab may not {action}")]
    NotPermitted { tab: Tab, action: String },
}
