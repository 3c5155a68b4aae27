use std::{fs, sync::Arc, time::Duration};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use client_core::{
    AppDependencies, DirectoryService, DraftUpdate, HttpDirectory, InspectionApp, LocalStore,
    MissingDirectoryService, NavigationSignal, NestedField, ScalarField,
};
use serde_json::{Map, Value};
use shared::domain::{InspectionId, UserId};
use tracing::{info, warn};

mod config;

use config::{load_settings, prepare_database_url, Settings};

const DIRECTORY_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(about = "Offline-first vehicle inspection client")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Restore the cached session and show the resolved mode and branding.
    Status {
        /// Location fragment, e.g. `#/validate?id=abc`.
        #[arg(long, default_value = "")]
        fragment: String,
    },
    /// Look the user up in the directory and adopt it as the session.
    Login {
        #[arg(long)]
        user_id: String,
    },
    Logout,
    /// List saved inspections visible to the current session.
    History,
    /// Fill a fresh draft from a JSON object (inline, or `@path`) and save it.
    Submit { json: String },
    /// Load a saved inspection, apply a JSON patch and save it back.
    Edit { id: String, json: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let settings = load_settings();
    tracing_subscriber::fmt()
        .with_env_filter(settings.log_filter.as_str())
        .init();

    let database_url = prepare_database_url(&settings.database_url)?;
    let store = LocalStore::open(&database_url).await?;
    let directory = directory_for(&settings)?;

    let fragment = match &args.command {
        Command::Status { fragment } => fragment.as_str(),
        _ => "",
    };
    let navigation = NavigationSignal::new(fragment);
    let mut deps = AppDependencies::new(
        Arc::new(store.clone()),
        directory.clone(),
        Arc::new(store.clone()),
    );
    deps.session_key = settings.session_key.clone();
    let mut app = InspectionApp::new(deps, navigation.subscribe());
    let mode = app.start().await;

    match args.command {
        Command::Status { .. } => {
            let session = app.context().session().await;
            let theme = app.theme().await;
            let policy = app.policy().await;
            let photos = app.active_photos().await;
            match &session {
                Some(session) => println!("Session: {} ({:?})", session.username, session.role),
                None => println!("Session: none"),
            }
            println!("Mode: {mode:?}");
            println!(
                "Theme: {} primary={} dark={}",
                theme.company_label, theme.primary_color, theme.is_dark_theme
            );
            println!(
                "Policy: language={:?} checklist=\"{}\" locked={} editing={}",
                policy.language,
                policy.checklist_title,
                policy.checklist_locked,
                policy.allow_inspection_editing
            );
            println!("Photos ({}): {}", photos.len(), photos.join(", "));
        }
        Command::Login { user_id } => {
            let session = directory
                .fetch_user(&UserId::new(user_id))
                .await
                .context("login failed")?;
            let mode = app.login(session.clone()).await;
            println!("Logged in as {} ({:?}); mode {mode:?}", session.username, session.role);
        }
        Command::Logout => {
            app.logout().await;
            println!("Logged out");
        }
        Command::History => {
            for record in app.history().await? {
                println!(
                    "{}  {}  {}  by {}",
                    record.id,
                    record.date.to_rfc3339(),
                    record.data.plate,
                    record.saved_by
                );
            }
        }
        Command::Submit { json } => {
            require_session(&app).await?;
            let patch = read_patch(&json)?;
            app.open_draft();
            apply_patch(&mut app, patch)?;

            let photos = app.active_photos().await;
            let missing = app.drafts().draft().missing_photos(&photos);
            if !missing.is_empty() {
                warn!(missing = ?missing, "submit: draft is missing photos");
            }
            save(&mut app).await?;
        }
        Command::Edit { id, json } => {
            require_session(&app).await?;
            let id = InspectionId::new(id);
            let record = store
                .load(&id)
                .await?
                .ok_or_else(|| anyhow!("inspection {id} not found"))?;
            let patch = read_patch(&json)?;
            app.load_for_edit(record).await?;
            apply_patch(&mut app, patch)?;
            save(&mut app).await?;
        }
    }

    Ok(())
}

fn directory_for(settings: &Settings) -> Result<Arc<dyn DirectoryService>> {
    match &settings.directory_url {
        Some(url) => Ok(Arc::new(HttpDirectory::with_timeout(url, DIRECTORY_TIMEOUT)?)),
        None => {
            info!("no directory configured; running on the cached session");
            Ok(Arc::new(MissingDirectoryService))
        }
    }
}

async fn require_session(app: &InspectionApp) -> Result<()> {
    if app.context().session().await.is_none() {
        bail!("not logged in; run `login --user-id <id>` first");
    }
    Ok(())
}

fn read_patch(raw: &str) -> Result<Map<String, Value>> {
    let text = match raw.strip_prefix('@') {
        Some(path) => fs::read_to_string(path).with_context(|| format!("failed to read {path}"))?,
        None => raw.to_string(),
    };
    match serde_json::from_str(&text).context("draft patch is not valid JSON")? {
        Value::Object(map) => Ok(map),
        other => Err(anyhow!("draft patch must be a JSON object, got {other}")),
    }
}

/// Routes each top-level key through the draft machine: strings to scalar fields, objects
/// entry by entry to the nested maps, and `fuelLevel` as a number.
fn apply_patch(app: &mut InspectionApp, patch: Map<String, Value>) -> Result<()> {
    for (key, value) in patch {
        if let Some(field) = ScalarField::from_key(&key) {
            let Value::String(text) = value else {
                bail!("{key} must be a string");
            };
            app.drafts_mut().merge(DraftUpdate::field(field, text))?;
            continue;
        }

        match NestedField::from_key(&key) {
            Some(NestedField::FuelLevel) => {
                app.drafts_mut()
                    .merge(DraftUpdate::nested(NestedField::FuelLevel, "", value))?;
            }
            Some(parent) => {
                let Value::Object(entries) = value else {
                    bail!("{key} must be an object");
                };
                for (entry, entry_value) in entries {
                    app.drafts_mut()
                        .merge(DraftUpdate::nested(parent, entry, entry_value))?;
                }
            }
            None => warn!(key = %key, "submit: ignoring unknown draft key"),
        }
    }
    Ok(())
}

async fn save(app: &mut InspectionApp) -> Result<()> {
    let outcome = app.save().await?;
    match outcome.notice() {
        Some(notice) => println!("{notice}"),
        None => println!("Nothing saved: no session"),
    }
    Ok(())
}
