use anyhow::{anyhow, Result};
use async_trait::async_trait;
use shared::{
    domain::{InspectionId, Session, UserBranding, UserId},
    inspection::{HistoryScope, InspectionDraft, SavedInspection, SavedRef},
};

pub mod app;
pub mod branding;
pub mod directory;
pub mod draft;
pub mod error;
pub mod local_store;
pub mod mode;
pub mod session_sync;

pub use app::{AppDependencies, InspectionApp};
pub use directory::HttpDirectory;
pub use draft::{ConfirmGate, DraftMachine, DraftUpdate, NestedField, SaveOutcome, ScalarField, Tab};
pub use local_store::LocalStore;
pub use mode::{Mode, ModeRouter, NavigationFragment, NavigationSignal};
pub use session_sync::{AppContext, KeepReason, RevalidateOutcome, SessionSynchronizer};

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>>;
    async fn write(&self, key: &str, value: &[u8]) -> Result<()>;
    async fn clear(&self, key: &str) -> Result<()>;
}

/// Authoritative source for user records and organization branding.
#[async_trait]
pub trait DirectoryService: Send + Sync {
    async fn fetch_user(&self, user_id: &UserId) -> Result<Session>;
    async fn fetch_branding(&self, user: &Session) -> Result<Option<UserBranding>>;
}

/// Every lookup fails, so sessions stay on their cached copy.
pub struct MissingDirectoryService;

#[async_trait]
impl DirectoryService for MissingDirectoryService {
    async fn fetch_user(&self, user_id: &UserId) -> Result<Session> {
        Err(anyhow!(
            "directory service unavailable; cannot look up user {user_id}"
        ))
    }

    async fn fetch_branding(&self, user: &Session) -> Result<Option<UserBranding>> {
        Err(anyhow!(
            "directory service unavailable; cannot look up branding for {}",
            user.organization_owner()
        ))
    }
}

/// Persistence for saved inspections.
#[async_trait]
pub trait InspectionStore: Send + Sync {
    async fn insert(&self, draft: &InspectionDraft, saved_by: &Session) -> Result<SavedRef>;
    async fn update(&self, id: &InspectionId, draft: &InspectionDraft) -> Result<()>;
    async fn list(&self, scope: &HistoryScope) -> Result<Vec<SavedInspection>>;
}

#[cfg(test)]
#[path = "tests/fakes.rs"]
mod test_fakes;
