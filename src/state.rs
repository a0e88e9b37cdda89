// Shared dashboard state: latest snapshot, chart windows, connection
// status. Written only from the poller tick, read by the routes.

use serde::Serialize;

use crate::charts::ChartBook;
use crate::models::{ConnectionStatus, StatsSnapshot};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardState {
    pub latest: Option<StatsSnapshot>,
    pub charts: ChartBook,
    pub status: ConnectionStatus,
}

impl DashboardState {
    pub fn new(chart_capacity: usize) -> Self {
        Self {
            latest: None,
            charts: ChartBook::new(chart_capacity),
            status: ConnectionStatus::Disconnected {
                reason: "not yet polled".to_string(),
            },
        }
    }

    /// Applies one successful tick: chart points, latest snapshot, status.
    pub fn apply(&mut self, snapshot: StatsSnapshot) {
        self.charts.update(&snapshot);
        self.latest = Some(snapshot);
        self.status = ConnectionStatus::Connected;
    }

    pub fn mark_disconnected(&mut self, reason: impl Into<String>) {
        self.status = ConnectionStatus::Disconnected {
            reason: reason.into(),
        };
    }
}
