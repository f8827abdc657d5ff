//! Тесты детерминизма
//!
//! Одинаковый seed + одинаковый скрипт ввода/inbox → байт-в-байт
//! одинаковый поток исходящих сообщений и одинаковые тела.

use bevy::prelude::*;
use plaza_simulation::network::{UserSnapshot, WireVec3};
use plaza_simulation::*;

/// Скриптовая сессия: roster с одним remote, бег, прыжок, остановка
fn run_session(seed: u64) -> (Vec<String>, Vec<Vec3>) {
    let mut app = create_headless_app(seed);
    app.insert_resource(AnimationCatalog::uniform(1.5));

    let other = UserSnapshot {
        character_name: Some("Jane".into()),
        position: Some(WireVec3 { x: 5.0, y: 0.0, z: 5.0 }),
        ..UserSnapshot::new("other")
    };
    app.world_mut()
        .resource_mut::<NetworkInbox>()
        .push(&ServerMessage::UpdateCharactersData(vec![other]))
        .unwrap();

    let script = [
        (80, KeyboardEvent::pressed(Key::W)),
        (95, KeyboardEvent::pressed(Key::D)),
        (120, KeyboardEvent::pressed(Key::Space)),
        (121, KeyboardEvent::released(Key::Space)),
        (200, KeyboardEvent::released(Key::D)),
        (240, KeyboardEvent::released(Key::W)),
    ];

    let mut sent = Vec::new();
    let mut tick = 0;
    for (at, event) in script {
        advance_ticks(&mut app, at - tick);
        tick = at;
        sent.extend(app.world_mut().resource_mut::<NetworkOutbox>().drain_encoded());
        app.world_mut().send_event(event);
    }
    advance_ticks(&mut app, 60);
    sent.extend(app.world_mut().resource_mut::<NetworkOutbox>().drain_encoded());

    let mut bodies: Vec<Vec3> = app
        .world_mut()
        .query::<&PhysicsBody>()
        .iter(app.world())
        .map(|body| body.position)
        .collect();
    bodies.sort_by(|a, b| a.x.total_cmp(&b.x).then(a.z.total_cmp(&b.z)));

    (sent, bodies)
}

#[test]
fn test_determinism_same_seed() {
    const SEED: u64 = 12345;

    let first = run_session(SEED);
    let second = run_session(SEED);

    assert!(!first.0.is_empty());
    assert_eq!(first.1.len(), 2);
    assert_eq!(
        first, second,
        "Симуляция с одинаковым seed ({}) дала разные результаты!",
        SEED
    );
}

#[test]
fn test_determinism_multiple_runs() {
    let runs: Vec<_> = (0..3).map(|_| run_session(42)).collect();

    for (i, run) in runs.iter().enumerate().skip(1) {
        assert_eq!(runs[0], *run, "Прогон {} дал результат отличный от прогона 0", i);
    }
}

#[test]
fn test_seed_changes_user_id() {
    let first = create_headless_app(1);
    let second = create_headless_app(2);

    let first_id = &first.world().resource::<Session>().user_id;
    let second_id = &second.world().resource::<Session>().user_id;

    assert!(first_id.starts_with("user-"));
    assert_eq!(first_id.len(), "user-".len() + 16);
    assert_ne!(first_id, second_id);
}
