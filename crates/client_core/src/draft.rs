use std::sync::Arc;

use serde_json::Value;
use shared::{
    domain::InspectionId,
    inspection::{
        ChecklistStatus, InspectionDraft, SavedInspection, SavedRef, TireSlot, MAX_FUEL_LEVEL,
    },
};
use tracing::{debug, info, warn};

use crate::{
    error::{DraftError, SaveError},
    session_sync::AppContext,
    InspectionStore,
};

pub const DISCARD_PROMPT: &str = "Descartar dados atuais?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tab {
    #[default]
    Initial,
    Questionnaire,
    Photos,
    Save,
    History,
}

impl Tab {
    pub const ALL: [Tab; 5] = [
        Tab::Initial,
        Tab::Questionnaire,
        Tab::Photos,
        Tab::Save,
        Tab::History,
    ];

    pub fn index(self) -> usize {
        match self {
            Tab::Initial => 0,
            Tab::Questionnaire => 1,
            Tab::Photos => 2,
            Tab::Save => 3,
            Tab::History => 4,
        }
    }

    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Tab::Initial => "DADOS",
            Tab::Questionnaire => "CHECK",
            Tab::Photos => "FOTOS",
            Tab::Save => "SALVAR",
            Tab::History => "HISTÓRICO",
        }
    }

    pub fn capabilities(self) -> TabCapabilities {
        match self {
            Tab::Initial => TabCapabilities {
                scalar_fields: &[
                    ScalarField::ContractNumber,
                    ScalarField::Plate,
                    ScalarField::Inspector,
                    ScalarField::ClientName,
                    ScalarField::ClientEmail,
                    ScalarField::ClientRg,
                    ScalarField::ClientPhone,
                    ScalarField::Vehicle,
                    ScalarField::Mileage,
                    ScalarField::RemovedItems,
                    ScalarField::Observation,
                    ScalarField::CollectionObservation,
                ],
                nested_fields: &[],
                can_save: false,
                can_discard: false,
                can_edit_history: false,
            },
            Tab::Questionnaire => TabCapabilities {
                scalar_fields: &[],
                nested_fields: &[
                    NestedField::Checklist,
                    NestedField::FuelLevel,
                    NestedField::Tires,
                ],
                can_save: false,
                can_discard: false,
                can_edit_history: false,
            },
            Tab::Photos => TabCapabilities {
                scalar_fields: &[],
                nested_fields: &[
                    NestedField::Photos,
                    NestedField::PhotoComments,
                    NestedField::PhotoMetadata,
                ],
                can_save: false,
                can_discard: false,
                can_edit_history: false,
            },
            Tab::Save => TabCapabilities {
                scalar_fields: &[
                    ScalarField::ClientName,
                    ScalarField::ClientRg,
                    ScalarField::ClientPhone,
                    ScalarField::InspectorSignature,
                    ScalarField::ClientSignature,
                ],
                nested_fields: &[],
                can_save: true,
                can_discard: true,
                can_edit_history: false,
            },
            Tab::History => TabCapabilities {
                scalar_fields: &[],
                nested_fields: &[],
                can_save: false,
                can_discard: false,
                can_edit_history: true,
            },
        }
    }
}

/// What a tab's UI is allowed to ask of the draft.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TabCapabilities {
    pub scalar_fields: &'static [ScalarField],
    pub nested_fields: &'static [NestedField],
    pub can_save: bool,
    pub can_discard: bool,
    pub can_edit_history: bool,
}

impl TabCapabilities {
    pub fn permits(&self, update: &DraftUpdate) -> bool {
        match update {
            DraftUpdate::Field { field, .. } => self.scalar_fields.contains(field),
            DraftUpdate::Nested { parent, .. } => self.nested_fields.contains(parent),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarField {
    ContractNumber,
    Plate,
    Inspector,
    ClientName,
    ClientEmail,
    ClientRg,
    ClientPhone,
    Vehicle,
    Mileage,
    RemovedItems,
    Observation,
    CollectionObservation,
    InspectorSignature,
    ClientSignature,
}

impl ScalarField {
    pub const ALL: [ScalarField; 14] = [
        ScalarField::ContractNumber,
        ScalarField::Plate,
        ScalarField::Inspector,
        ScalarField::ClientName,
        ScalarField::ClientEmail,
        ScalarField::ClientRg,
        ScalarField::ClientPhone,
        ScalarField::Vehicle,
        ScalarField::Mileage,
        ScalarField::RemovedItems,
        ScalarField::Observation,
        ScalarField::CollectionObservation,
        ScalarField::InspectorSignature,
        ScalarField::ClientSignature,
    ];

    pub fn key(self) -> &'static str {
        match self {
            ScalarField::ContractNumber => "contractNumber",
            ScalarField::Plate => "plate",
            ScalarField::Inspector => "inspector",
            ScalarField::ClientName => "clientName",
            ScalarField::ClientEmail => "clientEmail",
            ScalarField::ClientRg => "clientRG",
            ScalarField::ClientPhone => "clientPhone",
            ScalarField::Vehicle => "vehicle",
            ScalarField::Mileage => "mileage",
            ScalarField::RemovedItems => "removedItems",
            ScalarField::Observation => "observation",
            ScalarField::CollectionObservation => "collectionObservation",
            ScalarField::InspectorSignature => "inspectorSignature",
            ScalarField::ClientSignature => "clientSignature",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NestedField {
    Checklist,
    Tires,
    Photos,
    PhotoComments,
    PhotoMetadata,
    /// Not a mapping: the value replaces the scalar fuel level and the key is ignored.
    FuelLevel,
}

impl NestedField {
    pub const ALL: [NestedField; 6] = [
        NestedField::Checklist,
        NestedField::Tires,
        NestedField::Photos,
        NestedField::PhotoComments,
        NestedField::PhotoMetadata,
        NestedField::FuelLevel,
    ];

    pub fn key(self) -> &'static str {
        match self {
            NestedField::Checklist => "checklist",
            NestedField::Tires => "tires",
            NestedField::Photos => "photos",
            NestedField::PhotoComments => "photoComments",
            NestedField::PhotoMetadata => "photoMetadata",
            NestedField::FuelLevel => "fuelLevel",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DraftUpdate {
    Field {
        field: ScalarField,
        value: String,
    },
    Nested {
        parent: NestedField,
        key: String,
        value: Value,
    },
}

impl DraftUpdate {
    pub fn field(field: ScalarField, value: impl Into<String>) -> Self {
        DraftUpdate::Field {
            field,
            value: value.into(),
        }
    }

    pub fn nested(parent: NestedField, key: impl Into<String>, value: impl Into<Value>) -> Self {
        DraftUpdate::Nested {
            parent,
            key: key.into(),
            value: value.into(),
        }
    }
}

pub trait ConfirmGate {
    fn confirm(&self, prompt: &str) -> bool;
}

impl<F> ConfirmGate for F
where
    F: Fn(&str) -> bool,
{
    fn confirm(&self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No authenticated session; nothing was sent.
    Skipped,
    Inserted(SavedRef),
    Updated(InspectionId),
}

impl SaveOutcome {
    pub fn notice(&self) -> Option<&'static str> {
        match self {
            SaveOutcome::Skipped => None,
            SaveOutcome::Inserted(_) => Some("Vistoria salva."),
            SaveOutcome::Updated(_) => Some("Registro atualizado."),
        }
    }
}

pub struct DraftMachine {
    context: Arc<AppContext>,
    store: Arc<dyn InspectionStore>,
    draft: InspectionDraft,
    tab: Tab,
}

impl DraftMachine {
    pub fn new(context: Arc<AppContext>, store: Arc<dyn InspectionStore>) -> Self {
        Self {
            context,
            store,
            draft: InspectionDraft::default(),
            tab: Tab::Initial,
        }
    }

    pub fn draft(&self) -> &InspectionDraft {
        &self.draft
    }

    pub fn active_tab(&self) -> Tab {
        self.tab
    }

    pub fn select_tab(&mut self, tab: Tab) {
        self.tab = tab;
    }

    pub fn update_field(&mut self, field: ScalarField, value: impl Into<String>) {
        apply_field(&mut self.draft, field, value.into());
    }

    pub fn update_nested(
        &mut self,
        parent: NestedField,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), DraftError> {
        self.merge(DraftUpdate::nested(parent, key, value))
    }

    pub fn merge(&mut self, update: DraftUpdate) -> Result<(), DraftError> {
        match update {
            DraftUpdate::Field { field, value } => {
                apply_field(&mut self.draft, field, value);
                Ok(())
            }
            DraftUpdate::Nested { parent, key, value } => {
                apply_nested(&mut self.draft, parent, key, value)
            }
        }
    }

    /// Like [`merge`](Self::merge), but only if `tab` declares the update in its capabilities.
    pub fn merge_from(&mut self, tab: Tab, update: DraftUpdate) -> Result<(), DraftError> {
        if !tab.capabilities().permits(&update) {
            let action = match &update {
                DraftUpdate::Field { field, .. } => format!("write {}", field.key()),
                DraftUpdate::Nested { parent, .. } => format!("write {}", parent.key()),
            };
            return Err(DraftError::NotPermitted { tab, action });
        }
        self.merge(update)
    }

    /// On failure the draft and the active tab are left untouched.
    pub async fn save(&mut self) -> Result<SaveOutcome, SaveError> {
        let Some(session) = self.context.session().await else {
            debug!("draft: save ignored without a session");
            return Ok(SaveOutcome::Skipped);
        };

        let outcome = match self.draft.id.clone() {
            None => self
                .store
                .insert(&self.draft, &session)
                .await
                .map(SaveOutcome::Inserted),
            Some(id) => self
                .store
                .update(&id, &self.draft)
                .await
                .map(|()| SaveOutcome::Updated(id)),
        };

        match outcome {
            Ok(outcome) => {
                info!(user_id = %session.id, outcome = ?outcome, "draft: saved");
                self.draft = InspectionDraft::default();
                self.tab = Tab::History;
                Ok(outcome)
            }
            Err(err) => {
                let reason = format!("{err:#}");
                warn!(user_id = %session.id, error = %reason, "draft: save rejected");
                Err(SaveError::Rejected(reason))
            }
        }
    }

    /// Returns whether the draft was discarded.
    pub fn discard(&mut self, gate: &dyn ConfirmGate) -> bool {
        if !gate.confirm(DISCARD_PROMPT) {
            return false;
        }
        self.reset();
        true
    }

    pub fn load_for_edit(&mut self, record: SavedInspection) {
        debug!(inspection_id = %record.id, "draft: loading saved record");
        self.draft = record.into_draft();
        self.tab = Tab::Initial;
    }

    pub fn reset(&mut self) {
        self.draft = InspectionDraft::default();
        self.tab = Tab::Initial;
    }
}

fn apply_field(draft: &mut InspectionDraft, field: ScalarField, value: String) {
    match field {
        ScalarField::ContractNumber => draft.contract_number = value,
        ScalarField::Plate => draft.plate = value,
        ScalarField::Inspector => draft.inspector = value,
        ScalarField::ClientName => draft.client_name = value,
        ScalarField::ClientEmail => draft.client_email = value,
        ScalarField::ClientRg => draft.client_rg = value,
        ScalarField::ClientPhone => draft.client_phone = value,
        ScalarField::Vehicle => draft.vehicle = value,
        ScalarField::Mileage => draft.mileage = value,
        ScalarField::RemovedItems => draft.removed_items = value,
        ScalarField::Observation => draft.observation = value,
        ScalarField::CollectionObservation => draft.collection_observation = value,
        ScalarField::InspectorSignature => draft.inspector_signature = signature(value),
        ScalarField::ClientSignature => draft.client_signature = signature(value),
    }
}

fn signature(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

fn apply_nested(
    draft: &mut InspectionDraft,
    parent: NestedField,
    key: String,
    value: Value,
) -> Result<(), DraftError> {
    match parent {
        NestedField::FuelLevel => {
            draft.fuel_level = fuel_level(&value)?;
        }
        NestedField::Checklist => {
            let status: Option<ChecklistStatus> =
                serde_json::from_value(value).map_err(|err| DraftError::InvalidValue {
                    field: parent.key(),
                    reason: err.to_string(),
                })?;
            draft.checklist.insert(key, status);
        }
        NestedField::Tires => {
            let slot = TireSlot::from_key(&key).ok_or(DraftError::UnknownKey {
                parent,
                key: key.clone(),
            })?;
            draft.tires.set(slot, text(parent, value)?);
        }
        NestedField::Photos => merge_text_entry(&mut draft.photos, parent, key, value)?,
        NestedField::PhotoComments => {
            merge_text_entry(&mut draft.photo_comments, parent, key, value)?
        }
        NestedField::PhotoMetadata => {
            merge_text_entry(&mut draft.photo_metadata, parent, key, value)?
        }
    }
    Ok(())
}

fn fuel_level(value: &Value) -> Result<u8, DraftError> {
    value
        .as_u64()
        .filter(|level| *level <= u64::from(MAX_FUEL_LEVEL))
        .and_then(|level| u8::try_from(level).ok())
        .ok_or_else(|| DraftError::InvalidValue {
            field: NestedField::FuelLevel.key(),
            reason: format!("expected an integer between 0 and {MAX_FUEL_LEVEL}, got {value}"),
        })
}

fn text(parent: NestedField, value: Value) -> Result<String, DraftError> {
    match value {
        Value::String(text) => Ok(text),
        other => Err(DraftError::InvalidValue {
            field: parent.key(),
            reason: format!("expected a string, got {other}"),
        }),
    }
}

/// Partial maps: a string sets the entry, `null` removes it.
fn merge_text_entry(
    map: &mut std::collections::BTreeMap<String, String>,
    parent: NestedField,
    key: String,
    value: Value,
) -> Result<(), DraftError> {
    if value.is_null() {
        map.remove(&key);
        return Ok(());
    }
    map.insert(key, text(parent, value)?);
    Ok(())
}

#[cfg(test)]
#[path = "tests/draft_tests.rs"]
mod tests;
