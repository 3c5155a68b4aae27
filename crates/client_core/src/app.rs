use std::sync::Arc;

use anyhow::{Context, Result};
use shared::{
    domain::{Role, Session},
    inspection::{HistoryScope, SavedInspection},
};
use tokio::sync::watch;
use tracing::info;

use crate::{
    branding::{resolve_photo_list, resolve_policy, resolve_theme, BrandingPolicy, ThemeDescriptor},
    draft::{ConfirmGate, DraftMachine, SaveOutcome, Tab},
    error::{DraftError, SaveError},
    mode::{Mode, ModeRouter, NavigationFragment},
    session_sync::{AppContext, RevalidateOutcome, SessionSynchronizer, DEFAULT_SESSION_KEY},
    DirectoryService, InspectionStore, SessionStore,
};

pub struct AppDependencies {
    pub session_store: Arc<dyn SessionStore>,
    pub directory: Arc<dyn DirectoryService>,
    pub inspections: Arc<dyn InspectionStore>,
    pub session_key: String,
}

impl AppDependencies {
    pub fn new(
        session_store: Arc<dyn SessionStore>,
        directory: Arc<dyn DirectoryService>,
        inspections: Arc<dyn InspectionStore>,
    ) -> Self {
        Self {
            session_store,
            directory,
            inspections,
            session_key: DEFAULT_SESSION_KEY.to_string(),
        }
    }
}

pub struct InspectionApp {
    context: Arc<AppContext>,
    sync: SessionSynchronizer,
    drafts: DraftMachine,
    router: ModeRouter,
    navigation: watch::Receiver<NavigationFragment>,
    inspections: Arc<dyn InspectionStore>,
}

impl InspectionApp {
    pub fn new(deps: AppDependencies, navigation: watch::Receiver<NavigationFragment>) -> Self {
        let context = AppContext::new();
        let sync = SessionSynchronizer::new(context.clone(), deps.session_store, deps.directory)
            .with_session_key(deps.session_key);
        let drafts = DraftMachine::new(context.clone(), deps.inspections.clone());
        Self {
            context,
            sync,
            drafts,
            router: ModeRouter::new(),
            navigation,
            inspections: deps.inspections,
        }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    pub fn drafts(&self) -> &DraftMachine {
        &self.drafts
    }

    pub fn drafts_mut(&mut self) -> &mut DraftMachine {
        &mut self.drafts
    }

    pub async fn start(&mut self) -> Mode {
        if self.sync.bootstrap().await.is_some() {
            self.router.on_login();
        }
        self.mode().await
    }

    pub async fn login(&mut self, session: Session) -> Mode {
        self.sync.adopt(session).await;
        self.router.on_login();
        self.drafts.reset();
        self.mode().await
    }

    pub async fn refresh_session(&self) -> Option<RevalidateOutcome> {
        self.sync.refresh().await
    }

    pub async fn logout(&mut self) {
        self.sync.logout().await;
        self.drafts.reset();
        self.router.reset();
    }

    pub async fn mode(&self) -> Mode {
        let fragment = self.navigation.borrow().clone();
        let session = self.context.session().await;
        self.router.select(&fragment, session.as_ref())
    }

    pub async fn next_mode(&mut self) -> Result<Mode> {
        self.navigation
            .changed()
            .await
            .context("navigation signal closed")?;
        Ok(self.mode().await)
    }

    pub async fn theme(&self) -> ThemeDescriptor {
        resolve_theme(self.context.branding().await.as_ref())
    }

    pub async fn active_photos(&self) -> Vec<String> {
        resolve_photo_list(self.context.branding().await.as_ref())
    }

    pub async fn policy(&self) -> BrandingPolicy {
        resolve_policy(self.context.branding().await.as_ref())
    }

    /// Admins always may edit saved records; employees only when the tenant allows it.
    pub async fn can_edit_saved(&self) -> bool {
        match self.context.session().await {
            Some(session) if session.is_elevated() => true,
            Some(_) => self.policy().await.allow_inspection_editing,
            None => false,
        }
    }

    pub async fn load_for_edit(&mut self, record: SavedInspection) -> Result<(), DraftError> {
        if !self.can_edit_saved().await {
            return Err(DraftError::NotPermitted {
                tab: Tab::History,
                action: format!("edit inspection {}", record.id),
            });
        }
        let session = self.context.session().await;
        self.drafts.load_for_edit(record);
        self.router.on_edit_entry(session.as_ref());
        Ok(())
    }

    pub fn open_draft(&mut self) {
        self.router.open_draft();
    }

    pub fn return_to_overview(&mut self) {
        self.drafts.reset();
        self.router.return_to_overview();
    }

    pub async fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        self.drafts.save().await
    }

    pub fn discard(&mut self, gate: &dyn ConfirmGate) -> bool {
        self.drafts.discard(gate)
    }

    pub async fn history(&self) -> Result<Vec<SavedInspection>> {
        let Some(session) = self.context.session().await else {
            return Ok(Vec::new());
        };
        let scope = match session.role {
            Role::Employee => HistoryScope::User(session.id.clone()),
            Role::Admin => HistoryScope::Organization(session.id.clone()),
            Role::SuperAdmin => HistoryScope::All,
        };
        info!(user_id = %session.id, scope = ?scope, "history: listing saved inspections");
        self.inspections.list(&scope).await
    }
}

#[cfg(test)]
#[path = "tests/app_tests.rs"]
mod tests;
