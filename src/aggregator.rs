// Folds raw per-room object arrays into the flat per-tick stats record.
// Pure and side-effect-free: identical inputs yield identical records.

use crate::models::{ObjectKind, RoomSnapshot, StatsRecord, UserSummary};

/// Capacity assumed for a spawn that does not report storeCapacity.
pub const DEFAULT_SPAWN_CAPACITY: u64 = 300;

/// Capacity assumed for an extension that does not report storeCapacity.
pub const DEFAULT_EXTENSION_CAPACITY: u64 = 50;

/// CPU limit assumed when the account summary omits it.
pub const DEFAULT_CPU_LIMIT: f64 = 20.0;

pub fn aggregate(user: &UserSummary, rooms: &[RoomSnapshot]) -> StatsRecord {
    let mut total_energy: u64 = 0;
    let mut energy_capacity: u64 = 0;
    let mut creep_count: u32 = 0;

    for room in rooms {
        for object in &room.objects {
            match object.kind() {
                ObjectKind::Creep => creep_count += 1,
                ObjectKind::Spawn => {
                    total_energy += object.stored_energy();
                    energy_capacity += object.store_capacity.unwrap_or(DEFAULT_SPAWN_CAPACITY);
                }
                ObjectKind::Extension => {
                    total_energy += object.stored_energy();
                    energy_capacity += object.store_capacity.unwrap_or(DEFAULT_EXTENSION_CAPACITY);
                }
                ObjectKind::Other => {}
            }
        }
    }

    StatsRecord {
        total_energy,
        energy_capacity,
        creep_count,
        cpu_used: user.cpu_used.unwrap_or(0.0),
        cpu_limit: user.cpu.unwrap_or(DEFAULT_CPU_LIMIT),
        room_count: rooms.len() as u32,
        rooms: rooms.to_vec(),
    }
}
