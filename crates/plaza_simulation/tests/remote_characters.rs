//! Remote characters integration test
//!
//! Проверяем:
//! - roster: выбор имени, один пользователь за тик, второй batch отброшен
//! - snapshot: spawn неизвестного, tween к позиции, идемпотентность
//! - settle: stop snapshot во время ожидания перезапускает задержку
//! - disconnect идемпотентен, в т.ч. для ещё не применённых roster записей
//! - snapshot'ы до применения spawn'а не теряются

use bevy::prelude::*;
use plaza_simulation::character::CharacterData;
use plaza_simulation::network::{DeferredSnapshots, UserRef, UserSnapshot, WireVec3};
use plaza_simulation::*;

fn app_with_catalog(seed: u64, catalog: Option<CharacterCatalog>) -> App {
    let mut app = create_headless_app(seed);
    app.insert_resource(AnimationCatalog::uniform(1.5));
    if let Some(catalog) = catalog {
        app.insert_resource(catalog);
    }
    app
}

fn push(app: &mut App, message: ServerMessage) {
    app.world_mut().resource_mut::<NetworkInbox>().push(&message).unwrap();
}

fn named(user_id: &str, name: &str) -> UserSnapshot {
    UserSnapshot {
        character_name: Some(name.into()),
        position: Some(WireVec3 { x: 0.0, y: 0.0, z: 0.0 }),
        ..UserSnapshot::new(user_id)
    }
}

fn joined_name(app: &mut App) -> Option<String> {
    app.world_mut()
        .resource_mut::<NetworkOutbox>()
        .drain()
        .into_iter()
        .find_map(|message| match message {
            ClientMessage::Joined(joined) => Some(joined.character_name),
            _ => None,
        })
}

fn remote_entity(app: &App, user_id: &str) -> Option<Entity> {
    app.world().resource::<CharacterRegistry>().get(user_id)
}

fn remote_body(app: &App, user_id: &str) -> PhysicsBody {
    let entity = remote_entity(app, user_id).unwrap();
    let control = app.world().get::<CharacterControl>(entity).unwrap();
    *app.world().get::<PhysicsBody>(control.body).unwrap()
}

fn remote_state(app: &App, user_id: &str) -> CharacterState {
    let entity = remote_entity(app, user_id).unwrap();
    app.world().get::<CharacterState>(entity).unwrap().clone()
}

/// App после join с одним remote пользователем `other` на (10, 0, 0)
fn app_with_remote(seed: u64) -> App {
    let mut app = app_with_catalog(seed, None);
    let mut other = named("other", "Han");
    other.position = Some(Vec3::new(10.0, 0.0, 0.0).into());
    push(&mut app, ServerMessage::UpdateCharactersData(vec![other]));
    advance_ticks(&mut app, 1);
    app
}

#[test]
fn test_empty_roster_picks_first_catalog_name() {
    let mut app = app_with_catalog(42, None);
    push(&mut app, ServerMessage::UpdateCharactersData(Vec::new()));
    advance_ticks(&mut app, 1);

    assert_eq!(joined_name(&mut app).as_deref(), Some("Jenifer"));
}

#[test]
fn test_least_represented_name_wins() {
    let catalog = CharacterCatalog::new(vec![
        CharacterData::new("A", ["a.fbx"]),
        CharacterData::new("B", ["b.fbx"]),
    ]);
    let mut app = app_with_catalog(42, Some(catalog));
    let own_id = app.world().resource::<Session>().user_id.clone();

    push(
        &mut app,
        ServerMessage::UpdateCharactersData(vec![
            named("u1", "A"),
            named("u2", "A"),
            named("u3", "B"),
            // Свой userId не считается
            named(&own_id, "B"),
        ]),
    );
    advance_ticks(&mut app, 1);

    assert_eq!(joined_name(&mut app).as_deref(), Some("B"));
}

#[test]
fn test_roster_applies_one_user_per_tick_and_drops_overlap() {
    let mut app = app_with_catalog(42, None);
    push(
        &mut app,
        ServerMessage::UpdateCharactersData(vec![named("a", "Jane"), named("b", "Han"), named("c", "Natasa")]),
    );
    advance_ticks(&mut app, 1);

    assert!(remote_entity(&app, "a").is_some());
    assert!(remote_entity(&app, "b").is_none());

    // Batch во время применения первого отбрасывается целиком
    push(&mut app, ServerMessage::UpdateCharactersData(vec![named("d", "Jane")]));
    advance_ticks(&mut app, 2);

    let registry = app.world().resource::<CharacterRegistry>();
    for user in ["a", "b", "c"] {
        assert!(registry.contains(user), "{user} missing");
    }
    assert!(!registry.contains("d"));
    // 3 remote + локальный
    assert_eq!(registry.len(), 4);

    // Guard снят: следующий batch принимается
    push(&mut app, ServerMessage::UpdateCharactersData(vec![named("d", "Jane")]));
    advance_ticks(&mut app, 1);
    assert!(remote_entity(&app, "d").is_some());
}

#[test]
fn test_unknown_character_name_is_skipped() {
    let mut app = app_with_catalog(42, None);
    push(&mut app, ServerMessage::UpdateCharactersData(Vec::new()));
    push(
        &mut app,
        ServerMessage::UpdateCharacterData(named("ghost", "Nobody")),
    );
    push(&mut app, ServerMessage::UpdateCharacterData(UserSnapshot::new("nameless")));
    app.world_mut().resource_mut::<NetworkInbox>().push_raw("{ broken");
    advance_ticks(&mut app, 2);

    assert!(remote_entity(&app, "ghost").is_none());
    assert!(remote_entity(&app, "nameless").is_none());
    assert_eq!(app.world().resource::<CharacterRegistry>().len(), 1);
}

#[test]
fn test_own_snapshot_is_ignored() {
    let mut app = app_with_remote(42);
    let own_id = app.world().resource::<Session>().user_id.clone();
    let local = app.world().resource::<CharacterRegistry>().local().unwrap();

    push(&mut app, ServerMessage::UpdateCharacterData(named(&own_id, "Han")));
    advance_ticks(&mut app, 1);

    let registry = app.world().resource::<CharacterRegistry>();
    assert_eq!(registry.get(&own_id), Some(local));
    assert_eq!(registry.len(), 2);
}

#[test]
fn test_position_snapshot_tweens_remote_body() {
    let mut app = app_with_remote(42);
    advance_ticks(&mut app, 100);

    let start = remote_body(&app, "other");
    assert!((start.position.x - 10.0).abs() < 1e-4);

    let mut snapshot = UserSnapshot::new("other");
    snapshot.position = Some(Vec3::new(30.0, 1.8, -20.0).into());
    push(&mut app, ServerMessage::UpdateCharacterData(snapshot));

    advance_ticks(&mut app, 45);
    let halfway = remote_body(&app, "other");
    // Cubic ease-out: к середине пройдено больше половины пути
    assert!(halfway.position.x > 20.0 && halfway.position.x < 30.0);

    advance_ticks(&mut app, 45);
    let done = remote_body(&app, "other");
    assert!((done.position.x - 30.0).abs() < 1e-4);
    assert!((done.position.z + 20.0).abs() < 1e-4);

    // Модель догоняет тело
    advance_ticks(&mut app, 30);
    let control = app
        .world()
        .get::<CharacterControl>(remote_entity(&app, "other").unwrap())
        .unwrap();
    let model = app.world().get::<Transform>(control.model).unwrap();
    assert!((model.translation.x - 30.0).abs() < 0.01);
}

fn stop_snapshot() -> UserSnapshot {
    UserSnapshot {
        position: Some(Vec3::new(12.0, 1.8, 3.0).into()),
        velocity: Some(Vec3::ZERO.into()),
        quaternion: Some(Quat::from_rotation_y(0.5).into()),
        state: Some(CharacterState::default()),
        ..UserSnapshot::new("other")
    }
}

fn run_with_snapshot_copies(copies: usize) -> (PhysicsBody, CharacterState) {
    let mut app = app_with_remote(42);
    advance_ticks(&mut app, 1);

    for _ in 0..copies {
        push(&mut app, ServerMessage::UpdateCharacterData(stop_snapshot()));
    }
    advance_ticks(&mut app, 200);

    (remote_body(&app, "other"), remote_state(&app, "other"))
}

#[test]
fn test_duplicate_snapshot_is_idempotent() {
    let (body_once, state_once) = run_with_snapshot_copies(1);
    let (body_twice, state_twice) = run_with_snapshot_copies(2);

    assert_eq!(body_once.position, body_twice.position);
    assert_eq!(state_once, state_twice);
    assert!((body_once.position.x - 12.0).abs() < 1e-4);
}

#[test]
fn test_stop_snapshot_restarts_settle_delay() {
    let mut app = app_with_remote(42);

    let mut moving = UserSnapshot::new("other");
    moving.state = Some(CharacterState {
        is_moving: true,
        ..default()
    });
    push(&mut app, ServerMessage::UpdateCharacterData(moving));
    advance_ticks(&mut app, 1);
    assert!(remote_state(&app, "other").is_moving);

    push(&mut app, ServerMessage::UpdateCharacterData(stop_snapshot()));
    advance_ticks(&mut app, 30);
    push(&mut app, ServerMessage::UpdateCharacterData(stop_snapshot()));
    advance_ticks(&mut app, 30);

    // Первый settle (50 тиков) перезапущен вторым snapshot'ом
    assert!(remote_state(&app, "other").is_moving);

    advance_ticks(&mut app, 30);
    assert!(!remote_state(&app, "other").is_moving);
}

#[test]
fn test_disconnect_is_idempotent() {
    let mut app = app_with_remote(42);
    let entity = remote_entity(&app, "other").unwrap();
    let control = app.world().get::<CharacterControl>(entity).unwrap().clone();

    let disconnect = || {
        ServerMessage::CharacterDisconnected(UserRef {
            user_id: "other".into(),
        })
    };
    push(&mut app, disconnect());
    push(&mut app, disconnect());
    advance_ticks(&mut app, 1);

    assert!(remote_entity(&app, "other").is_none());
    assert!(app.world().get_entity(entity).is_err());
    assert!(app.world().get_entity(control.body).is_err());
    assert!(app.world().get_entity(control.model).is_err());

    push(&mut app, disconnect());
    advance_ticks(&mut app, 1);
    assert_eq!(app.world().resource::<CharacterRegistry>().len(), 1);
}

#[test]
fn test_disconnect_of_queued_roster_user() {
    let mut app = app_with_catalog(42, None);
    push(
        &mut app,
        ServerMessage::UpdateCharactersData(vec![named("a", "Jane"), named("b", "Han"), named("c", "Natasa")]),
    );
    advance_ticks(&mut app, 1);
    assert!(remote_entity(&app, "c").is_none());

    // c ещё ждёт в очереди roster'а
    push(
        &mut app,
        ServerMessage::CharacterDisconnected(UserRef { user_id: "c".into() }),
    );
    advance_ticks(&mut app, 10);

    let registry = app.world().resource::<CharacterRegistry>();
    assert!(registry.contains("a"));
    assert!(registry.contains("b"));
    assert!(!registry.contains("c"));
    assert!(!app.world().resource::<plaza_simulation::network::RosterSync>().is_in_progress());
}

fn moving_to(user_id: &str, x: f32) -> UserSnapshot {
    UserSnapshot {
        position: Some(Vec3::new(x, 1.8, 0.0).into()),
        state: Some(CharacterState {
            is_moving: true,
            ..default()
        }),
        ..UserSnapshot::new(user_id)
    }
}

#[test]
fn test_second_snapshot_before_spawn_is_applied() {
    let mut app = app_with_catalog(42, None);
    push(&mut app, ServerMessage::UpdateCharacterData(named("x", "Jane")));
    push(&mut app, ServerMessage::UpdateCharacterData(moving_to("x", 40.0)));
    advance_ticks(&mut app, 1);

    assert!(remote_entity(&app, "x").is_some());
    assert_eq!(app.world().resource::<DeferredSnapshots>().len(), 1);

    advance_ticks(&mut app, 100);

    assert!(app.world().resource::<DeferredSnapshots>().is_empty());
    assert!((remote_body(&app, "x").position.x - 40.0).abs() < 1e-4);
    assert!(remote_state(&app, "x").is_moving);
    assert_eq!(app.world().resource::<CharacterRegistry>().len(), 1);
}

#[test]
fn test_snapshot_for_queued_roster_user_is_merged() {
    let mut app = app_with_catalog(42, None);
    push(
        &mut app,
        ServerMessage::UpdateCharactersData(vec![named("a", "Jane"), named("y", "Han")]),
    );
    push(&mut app, ServerMessage::UpdateCharacterData(moving_to("y", 40.0)));
    advance_ticks(&mut app, 2);

    // y заспавнен сразу с новой позицией и state
    assert!((remote_body(&app, "y").position.x - 40.0).abs() < 1e-4);
    assert!(remote_state(&app, "y").is_moving);
}
