// Aggregation from raw room objects to the per-tick stats record

mod common;

use common::*;
use screeps_monitor::aggregator::aggregate;
use screeps_monitor::models::UserSummary;

#[test]
fn identical_inputs_yield_identical_records() {
    let user = user_with_rooms(&["W1N1"]);
    let rooms = vec![room(
        "W1N1",
        vec![spawn_object(150), extension_object(30), creep_object()],
    )];

    let first = aggregate(&user, &rooms);
    let second = aggregate(&user, &rooms);
    assert_eq!(first, second);
}

#[test]
fn spawn_without_capacity_uses_default() {
    let user = user_with_rooms(&["W1N1"]);
    let rooms = vec![room("W1N1", vec![spawn_object(100)])];

    let stats = aggregate(&user, &rooms);
    assert_eq!(stats.total_energy, 100);
    assert_eq!(stats.energy_capacity, 300);
}

#[test]
fn extension_without_capacity_uses_default() {
    let user = user_with_rooms(&["W1N1"]);
    let rooms = vec![room("W1N1", vec![extension_object(25)])];

    let stats = aggregate(&user, &rooms);
    assert_eq!(stats.total_energy, 25);
    assert_eq!(stats.energy_capacity, 50);
}

#[test]
fn reported_capacity_wins_over_default() {
    let user = user_with_rooms(&["W1N1"]);
    let rooms = vec![room(
        "W1N1",
        vec![game_object("spawn", Some(100), Some(5000))],
    )];

    let stats = aggregate(&user, &rooms);
    assert_eq!(stats.energy_capacity, 5000);
}

#[test]
fn zero_rooms_yield_zeroed_record() {
    let user = user_with_rooms(&[]);
    let stats = aggregate(&user, &[]);

    assert_eq!(stats.total_energy, 0);
    assert_eq!(stats.energy_capacity, 0);
    assert_eq!(stats.creep_count, 0);
    assert_eq!(stats.room_count, 0);
    assert!(stats.rooms.is_empty());
}

#[test]
fn cpu_figures_fall_back_when_summary_omits_them() {
    let user = UserSummary::default();
    let stats = aggregate(&user, &[]);

    assert_eq!(stats.cpu_used, 0.0);
    assert_eq!(stats.cpu_limit, 20.0);
}

#[test]
fn mixed_rooms_sum_energy_and_count_creeps() {
    let user = user_with_rooms(&["W1N1", "W2N2"]);
    let rooms = vec![
        room(
            "W1N1",
            vec![spawn_object(250), extension_object(50), creep_object()],
        ),
        room(
            "W2N2",
            vec![
                creep_object(),
                creep_object(),
                extension_object(10),
                // Non-energy structures must not affect the totals.
                game_object("controller", None, None),
                game_object("road", None, None),
            ],
        ),
    ];

    let stats = aggregate(&user, &rooms);
    assert_eq!(stats.total_energy, 310);
    assert_eq!(stats.energy_capacity, 300 + 50 + 50);
    assert_eq!(stats.creep_count, 3);
    assert_eq!(stats.room_count, 2);
    assert_eq!(stats.cpu_used, 4.2);
    assert_eq!(stats.cpu_limit, 20.0);
}

#[test]
fn spawn_with_empty_store_counts_zero_energy() {
    let user = user_with_rooms(&["W1N1"]);
    let rooms = vec![room("W1N1", vec![game_object("spawn", None, None)])];

    let stats = aggregate(&user, &rooms);
    assert_eq!(stats.total_energy, 0);
    assert_eq!(stats.energy_capacity, 300);
}
