// Per-tick aggregate models

use serde::{Deserialize, Serialize};

use super::RoomSnapshot;

/// Flat per-tick summary of account and room metrics. Recomputed from
/// scratch every polling cycle, never mutated incrementally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsRecord {
    pub total_energy: u64,
    pub energy_capacity: u64,
    pub creep_count: u32,
    pub cpu_used: f64,
    pub cpu_limit: f64,
    pub room_count: u32,
    pub rooms: Vec<RoomSnapshot>,
}

/// Wire/broadcast envelope: the pure record plus the tick timestamp.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsSnapshot {
    pub timestamp: u64,
    pub stats: StatsRecord,
}

/// Connection indicator shown by the dashboard. Every failure degrades to
/// `Disconnected` and the next tick retries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum ConnectionStatus {
    Connected,
    Disconnected { reason: String },
}
