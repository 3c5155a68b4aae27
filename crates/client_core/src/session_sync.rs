use std::sync::Arc;

use shared::domain::{Session, UserBranding, UserId};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use crate::{error::SyncError, DirectoryService, SessionStore};

pub const DEFAULT_SESSION_KEY: &str = "autocheck_session";

#[derive(Default)]
struct ContextState {
    session: Option<Session>,
    branding: Option<UserBranding>,
    generation: u64,
}

/// `generation` changes on adoption of a new identity and on logout.
#[derive(Default)]
pub struct AppContext {
    state: RwLock<ContextState>,
}

impl AppContext {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    pub async fn branding(&self) -> Option<UserBranding> {
        self.state.read().await.branding.clone()
    }

    pub async fn generation(&self) -> u64 {
        self.state.read().await.generation
    }

    async fn install(&self, session: Session) -> u64 {
        let mut state = self.state.write().await;
        let same_identity = state
            .session
            .as_ref()
            .is_some_and(|current| current.id == session.id);
        if !same_identity {
            state.generation += 1;
            state.branding = None;
        }
        state.session = Some(session);
        state.generation
    }

    async fn replace_if_current(&self, generation: u64, session: Session) -> bool {
        let mut state = self.state.write().await;
        let current = state.generation == generation
            && state
                .session
                .as_ref()
                .is_some_and(|current| current.id == session.id);
        if current {
            state.session = Some(session);
        }
        current
    }

    async fn set_branding_if_current(
        &self,
        generation: u64,
        branding: Option<UserBranding>,
    ) -> bool {
        let mut state = self.state.write().await;
        if state.generation != generation || state.session.is_none() {
            return false;
        }
        state.branding = branding;
        true
    }

    async fn clear(&self) {
        let mut state = self.state.write().await;
        state.session = None;
        state.branding = None;
        state.generation += 1;
    }

    async fn current_generation_for(&self, user_id: &UserId) -> Option<u64> {
        let state = self.state.read().await;
        match &state.session {
            Some(session) if &session.id == user_id => Some(state.generation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KeepReason {
    Remote(String),
    IdentityMismatch { expected: UserId, received: UserId },
    /// The session changed (or was logged out) while the lookup was in flight.
    Superseded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RevalidateOutcome {
    Applied(Session),
    KeptCached { session: Session, reason: KeepReason },
}

impl RevalidateOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, RevalidateOutcome::Applied(_))
    }

    pub fn session(&self) -> &Session {
        match self {
            RevalidateOutcome::Applied(session) => session,
            RevalidateOutcome::KeptCached { session, .. } => session,
        }
    }

    pub fn into_session(self) -> Session {
        match self {
            RevalidateOutcome::Applied(session) => session,
            RevalidateOutcome::KeptCached { session, .. } => session,
        }
    }
}

#[derive(Clone)]
pub struct SessionSynchronizer {
    context: Arc<AppContext>,
    store: Arc<dyn SessionStore>,
    directory: Arc<dyn DirectoryService>,
    session_key: String,
    store_lock: Arc<Mutex<()>>,
}

impl SessionSynchronizer {
    pub fn new(
        context: Arc<AppContext>,
        store: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryService>,
    ) -> Self {
        Self {
            context,
            store,
            directory,
            session_key: DEFAULT_SESSION_KEY.to_string(),
            store_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn with_session_key(mut self, session_key: impl Into<String>) -> Self {
        self.session_key = session_key.into();
        self
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    pub async fn bootstrap(&self) -> Option<Session> {
        let cached = self.load_cached().await?;
        let generation = self.context.install(cached.clone()).await;
        info!(user_id = %cached.id, "session: cached session found");

        let outcome = self.revalidate(&cached).await;
        if !outcome.is_applied() {
            // Applied outcomes refresh branding themselves.
            self.refresh_branding(generation, outcome.session()).await;
        }
        self.context.session().await
    }

    /// Never fails: any error keeps `current` as the session of record.
    pub async fn revalidate(&self, current: &Session) -> RevalidateOutcome {
        let Some(generation) = self.context.current_generation_for(&current.id).await else {
            debug!(user_id = %current.id, "session: revalidation skipped for inactive session");
            return RevalidateOutcome::KeptCached {
                session: current.clone(),
                reason: KeepReason::Superseded,
            };
        };

        let fresh = match self.directory.fetch_user(&current.id).await {
            Ok(fresh) => fresh,
            Err(err) => {
                let err = SyncError::TransientRemoteFailure(format!("{err:#}"));
                warn!(user_id = %current.id, error = %err, "session: using cached data");
                return RevalidateOutcome::KeptCached {
                    session: current.clone(),
                    reason: KeepReason::Remote(err.to_string()),
                };
            }
        };

        if fresh.id != current.id {
            let err = SyncError::IdentityMismatch {
                expected: current.id.clone(),
                received: fresh.id.clone(),
            };
            error!(error = %err, "session: rejecting directory record");
            return RevalidateOutcome::KeptCached {
                session: current.clone(),
                reason: KeepReason::IdentityMismatch {
                    expected: current.id.clone(),
                    received: fresh.id,
                },
            };
        }

        if !self.context.replace_if_current(generation, fresh.clone()).await {
            info!(user_id = %current.id, "session: discarding stale revalidation response");
            return RevalidateOutcome::KeptCached {
                session: current.clone(),
                reason: KeepReason::Superseded,
            };
        }

        self.persist(generation, &fresh).await;
        self.refresh_branding(generation, &fresh).await;
        RevalidateOutcome::Applied(fresh)
    }

    pub async fn refresh(&self) -> Option<RevalidateOutcome> {
        let current = self.context.session().await?;
        Some(self.revalidate(&current).await)
    }

    pub async fn adopt(&self, session: Session) {
        let generation = self.context.install(session.clone()).await;
        info!(user_id = %session.id, role = ?session.role, "session: adopted");
        self.persist(generation, &session).await;
        self.refresh_branding(generation, &session).await;
    }

    pub async fn logout(&self) {
        // Clearing the context first makes any in-flight persist see itself as stale.
        self.context.clear().await;
        self.clear_store().await;
        info!("session: logged out");
    }

    async fn clear_store(&self) {
        if let Err(err) = self.store.clear(&self.session_key).await {
            error!(error = %format!("{err:#}"), "session: failed to clear persisted session");
        }
    }

    async fn load_cached(&self) -> Option<Session> {
        let raw = match self.store.read(&self.session_key).await {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(err) => {
                warn!(error = %format!("{err:#}"), "session: store unreadable, starting signed out");
                return None;
            }
        };

        match decode_session(&raw) {
            Ok(session) => Some(session),
            Err(err) => {
                warn!(error = %err, "session: starting signed out");
                None
            }
        }
    }

    /// Writes `session` only while `generation` is still current. A write that lands after
    /// the session was superseded is undone.
    async fn persist(&self, generation: u64, session: &Session) {
        let encoded = match serde_json::to_vec(session) {
            Ok(encoded) => encoded,
            Err(err) => {
                warn!(user_id = %session.id, error = %err, "session: failed to encode session");
                return;
            }
        };

        let _guard = self.store_lock.lock().await;
        if !self.is_current(generation, session).await {
            debug!(user_id = %session.id, "session: skipping persist for superseded session");
            return;
        }
        if let Err(err) = self.store.write(&self.session_key, &encoded).await {
            warn!(
                user_id = %session.id,
                error = %format!("{err:#}"),
                "session: failed to persist session"
            );
            return;
        }
        if !self.is_current(generation, session).await {
            info!(user_id = %session.id, "session: superseded during persist, clearing store");
            self.clear_store().await;
        }
    }

    async fn is_current(&self, generation: u64, session: &Session) -> bool {
        self.context.current_generation_for(&session.id).await == Some(generation)
    }

    async fn refresh_branding(&self, generation: u64, session: &Session) {
        match self.directory.fetch_branding(session).await {
            Ok(branding) => {
                if !self
                    .context
                    .set_branding_if_current(generation, branding)
                    .await
                {
                    debug!(user_id = %session.id, "session: discarding stale branding response");
                }
            }
            Err(err) => {
                let err = SyncError::TransientRemoteFailure(format!("{err:#}"));
                warn!(user_id = %session.id, error = %err, "session: keeping previous branding");
            }
        }
    }
}

fn decode_session(raw: &[u8]) -> Result<Session, SyncError> {
    serde_json::from_slice(raw).map_err(|err| SyncError::StructuralCorruption(err.to_string()))
}

#[cfg(test)]
#[path = "tests/session_sync_tests.rs"]
mod tests;
