// Account summary from auth/me. Decoded leniently: the dashboard only
// needs CPU figures and the owned-room list, the rest rides along.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSummary {
    pub username: Option<String>,
    /// CPU limit granted to the account.
    pub cpu: Option<f64>,
    /// CPU consumed in the last tick.
    pub cpu_used: Option<f64>,
    pub rooms: Vec<String>,
    #[serde(flatten)]
    pub rest: serde_json::Map<String, serde_json::Value>,
}
