use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{InspectionId, UserId};

/// Template fuel level for a fresh draft (half tank).
pub const DEFAULT_FUEL_LEVEL: u8 = 50;
pub const MAX_FUEL_LEVEL: u8 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChecklistStatus {
    Good,
    Bad,
    Damaged,
    Na,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TireSlot {
    FrontLeft,
    FrontRight,
    RearLeft,
    RearRight,
    Spare,
}

impl TireSlot {
    pub const ALL: [TireSlot; 5] = [
        TireSlot::FrontLeft,
        TireSlot::FrontRight,
        TireSlot::RearLeft,
        TireSlot::RearRight,
        TireSlot::Spare,
    ];

    pub fn key(self) -> &'static str {
        match self {
            TireSlot::FrontLeft => "fl",
            TireSlot::FrontRight => "fr",
            TireSlot::RearLeft => "rl",
            TireSlot::RearRight => "rr",
            TireSlot::Spare => "spare",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|slot| slot.key() == key)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tires {
    pub fl: String,
    pub fr: String,
    pub rl: String,
    pub rr: String,
    pub spare: String,
}

impl Tires {
    pub fn get(&self, slot: TireSlot) -> &str {
        match slot {
            TireSlot::FrontLeft => &self.fl,
            TireSlot::FrontRight => &self.fr,
            TireSlot::RearLeft => &self.rl,
            TireSlot::RearRight => &self.rr,
            TireSlot::Spare => &self.spare,
        }
    }

    pub fn set(&mut self, slot: TireSlot, condition: impl Into<String>) {
        let condition = condition.into();
        match slot {
            TireSlot::FrontLeft => self.fl = condition,
            TireSlot::FrontRight => self.fr = condition,
            TireSlot::RearLeft => self.rl = condition,
            TireSlot::RearRight => self.rr = condition,
            TireSlot::Spare => self.spare = condition,
        }
    }
}

/// The in-progress (or loaded-for-edit) inspection. `Default` is the empty template, and
/// deserializing a partial record fills every missing field from it.
///
/// `id` and `date` are persistence metadata: they are set by the save protocol or by
/// loading a saved record, never by the JSON body itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct InspectionDraft {
    #[serde(skip)]
    pub id: Option<InspectionId>,
    #[serde(skip)]
    pub date: Option<DateTime<Utc>>,

    pub contract_number: String,
    pub plate: String,
    pub inspector: String,
    pub client_name: String,
    pub client_email: String,
    #[serde(rename = "clientRG")]
    pub client_rg: String,
    pub client_phone: String,
    pub vehicle: String,
    pub mileage: String,
    pub removed_items: String,
    pub observation: String,
    pub collection_observation: String,

    pub checklist: BTreeMap<String, Option<ChecklistStatus>>,
    pub fuel_level: u8,
    pub tires: Tires,

    pub photos: BTreeMap<String, String>,
    pub photo_comments: BTreeMap<String, String>,
    pub photo_metadata: BTreeMap<String, String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub inspector_signature: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_signature: Option<String>,
}

impl Default for InspectionDraft {
    fn default() -> Self {
        Self {
            id: None,
            date: None,
            contract_number: String::new(),
            plate: String::new(),
            inspector: String::new(),
            client_name: String::new(),
            client_email: String::new(),
            client_rg: String::new(),
            client_phone: String::new(),
            vehicle: String::new(),
            mileage: String::new(),
            removed_items: String::new(),
            observation: String::new(),
            collection_observation: String::new(),
            checklist: BTreeMap::new(),
            fuel_level: DEFAULT_FUEL_LEVEL,
            tires: Tires::default(),
            photos: BTreeMap::new(),
            photo_comments: BTreeMap::new(),
            photo_metadata: BTreeMap::new(),
            inspector_signature: None,
            client_signature: None,
        }
    }
}

impl InspectionDraft {
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Labels of `active_photos` that have not been captured yet, in list order.
    pub fn missing_photos<'a>(&self, active_photos: &'a [String]) -> Vec<&'a str> {
        active_photos
            .iter()
            .filter(|label| !self.photos.contains_key(label.as_str()))
            .map(String::as_str)
            .collect()
    }
}

/// A draft as returned by the inspection store after it has been saved at least once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInspection {
    pub id: InspectionId,
    pub date: DateTime<Utc>,
    pub saved_by: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub data: InspectionDraft,
}

impl SavedInspection {
    pub fn into_draft(self) -> InspectionDraft {
        let mut draft = self.data;
        draft.id = Some(self.id);
        draft.date = Some(self.date);
        draft
    }
}

/// Identity assigned by the store on first insert.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedRef {
    pub id: InspectionId,
    pub date: DateTime<Utc>,
}

/// Which saved records a history listing covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryScope {
    User(UserId),
    Organization(UserId),
    All,
}

#[cfg(test)]
#[path = "tests/inspection_tests.rs"]
mod tests;
