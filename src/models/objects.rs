// Room objects as returned by game/room-objects. Only type, store and
// storeCapacity are interpreted; every other field is preserved untouched.

use serde::{Deserialize, Serialize};

/// Object categories the aggregator cares about. Anything else is `Other`
/// and passes through the pipeline unmodified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectKind {
    Creep,
    Spawn,
    Extension,
    Other,
}

impl ObjectKind {
    pub fn from_type(object_type: &str) -> Self {
        match object_type {
            "creep" => Self::Creep,
            "spawn" => Self::Spawn,
            "extension" => Self::Extension,
            _ => Self::Other,
        }
    }
}

/// Resource store of an object. The API may omit `energy` entirely for an
/// empty store.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Store {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy: Option<u64>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store: Option<Store>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub store_capacity: Option<u64>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}

impl GameObject {
    pub fn kind(&self) -> ObjectKind {
        ObjectKind::from_type(&self.object_type)
    }

    /// Energy currently held, treating an absent store or field as empty.
    pub fn stored_energy(&self) -> u64 {
        self.store.as_ref().and_then(|s| s.energy).unwrap_or(0)
    }
}

/// One room's objects for one polling cycle. Discarded after aggregation,
/// except where retained inside a `StatsRecord` for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub name: String,
    pub objects: Vec<GameObject>,
}
