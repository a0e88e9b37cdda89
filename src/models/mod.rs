// Domain models: Screeps room objects and the derived per-tick stats

mod objects;
mod stats;
mod user;

pub use objects::{GameObject, ObjectKind, RoomSnapshot, Store};
pub use stats::{ConnectionStatus, StatsRecord, StatsSnapshot};
pub use user::UserSummary;
