// Bounded per-metric chart windows and the pure render step.
// Series evict oldest-first on overflow; rendering never touches a timer
// or a display surface.

use std::collections::VecDeque;

use serde::Serialize;

use crate::models::{StatsRecord, StatsSnapshot};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

/// Sliding window of labeled values for one metric. Oldest points are
/// dropped once the window is full.
#[derive(Debug, Clone, Serialize)]
pub struct ChartSeries {
    #[serde(skip)]
    capacity: usize,
    points: VecDeque<ChartPoint>,
}

impl ChartSeries {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            points: VecDeque::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, label: impl Into<String>, value: f64) {
        if self.capacity > 0 && self.points.len() >= self.capacity {
            self.points.pop_front();
        }
        self.points.push_back(ChartPoint {
            label: label.into(),
            value,
        });
    }

    pub fn points(&self) -> impl Iterator<Item = &ChartPoint> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// One series per charted metric.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChartBook {
    pub energy: ChartSeries,
    pub creeps: ChartSeries,
    pub cpu: ChartSeries,
}

impl ChartBook {
    pub fn new(capacity: usize) -> Self {
        Self {
            energy: ChartSeries::new(capacity),
            creeps: ChartSeries::new(capacity),
            cpu: ChartSeries::new(capacity),
        }
    }

    /// Appends one labeled point per metric from a polled snapshot.
    pub fn update(&mut self, snapshot: &StatsSnapshot) {
        let label = chrono::DateTime::from_timestamp_millis(snapshot.timestamp as i64)
            .map(|dt| dt.format("%H:%M:%S").to_string())
            .unwrap_or_else(|| snapshot.timestamp.to_string());
        self.energy.push(label.clone(), snapshot.stats.total_energy as f64);
        self.creeps.push(label.clone(), snapshot.stats.creep_count as f64);
        self.cpu.push(label, snapshot.stats.cpu_used);
    }
}

/// Display-ready projection of one stats record.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewModel {
    pub energy: String,
    pub cpu: String,
    pub creep_count: u32,
    pub room_count: u32,
    pub rooms: Vec<String>,
}

pub fn render(stats: &StatsRecord) -> ViewModel {
    ViewModel {
        energy: format!("{} / {}", stats.total_energy, stats.energy_capacity),
        cpu: format!("{:.1} / {:.0}", stats.cpu_used, stats.cpu_limit),
        creep_count: stats.creep_count,
        room_count: stats.room_count,
        rooms: stats.rooms.iter().map(|r| r.name.clone()).collect(),
    }
}
