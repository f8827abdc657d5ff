//! Network Reconciler (outbound): `character-updated` throttling
//!
//! AttributeFeed на локальном персонаже:
//! - key transition активирует подписку
//! - первая отправка сразу (с position), дальше heartbeat без position
//! - отпустили все клавиши движения → ровно один финальный update
//! - jump start гасит подписку; jump end / landing / жест шлют по update
//!
//! Все события с position кроме heartbeat'а.

use bevy::prelude::*;

use crate::character::{CharacterControl, CharacterState, JumpEnded, JumpStarted, Landed, Player};
use crate::clock::{SimClock, Tick};
use crate::config::CharacterConfig;
use crate::input::{GestureSelected, InputTracker, KeyTransition};
use crate::physics::PhysicsBody;

use super::session::Session;
use super::transport::NetworkOutbox;
use super::wire::{CharacterAttributes, CharacterUpdated, ClientMessage};

#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AttributeFeed {
    /// Подписка на heartbeat активна
    pub active: bool,
    /// Следующий heartbeat; `None`: первая отправка ещё не сделана
    pub heartbeat_at: Option<Tick>,
    /// Нужно отправить начальный полный update
    pub announce: bool,
}

impl AttributeFeed {
    pub fn announcing() -> Self {
        Self {
            announce: true,
            ..default()
        }
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.heartbeat_at = None;
    }
}

/// Snapshot для отправки: velocity тела, rotation модели, state
pub fn character_attributes(
    body: &PhysicsBody,
    model_rotation: Quat,
    state: &CharacterState,
    with_position: bool,
) -> CharacterAttributes {
    CharacterAttributes {
        velocity: body.velocity.into(),
        quaternion: model_rotation.into(),
        position: with_position.then(|| body.position.into()),
        state: state.clone(),
    }
}

/// Система: события тика → `character-updated` в outbox
pub fn emit_character_updates(
    clock: Res<SimClock>,
    config: Res<CharacterConfig>,
    session: Res<Session>,
    input: Res<InputTracker>,
    mut transitions: EventReader<KeyTransition>,
    mut started: EventReader<JumpStarted>,
    mut ended: EventReader<JumpEnded>,
    mut landed: EventReader<Landed>,
    mut gestures: EventReader<GestureSelected>,
    mut locals: Query<(Entity, &CharacterControl, &CharacterState, &mut AttributeFeed), With<Player>>,
    bodies: Query<&PhysicsBody>,
    models: Query<&Transform>,
    mut outbox: ResMut<NetworkOutbox>,
) {
    let any_transition = transitions.read().count() > 0;
    let started: Vec<Entity> = started.read().map(|event| event.entity).collect();
    let ended: Vec<Entity> = ended.read().map(|event| event.entity).collect();
    let landed: Vec<Entity> = landed.read().map(|event| event.entity).collect();
    let gesture_selected = gestures.read().count() > 0;

    for (entity, control, state, mut feed) in locals.iter_mut() {
        let Ok(body) = bodies.get(control.body) else {
            continue;
        };
        let model_rotation = models
            .get(control.model)
            .map(|transform| transform.rotation)
            .unwrap_or(Quat::IDENTITY);

        let mut send = |with_position: bool| {
            outbox.send(ClientMessage::CharacterUpdated(CharacterUpdated {
                attributes: character_attributes(body, model_rotation, state, with_position),
                user_id: session.user_id.clone(),
            }));
        };
        let mut sent_full = false;

        if feed.announce {
            feed.announce = false;
            send(true);
            sent_full = true;
        }

        if any_transition {
            feed.active = true;
        }

        if started.contains(&entity) {
            feed.deactivate();
            send(true);
            sent_full = true;
        }

        if ended.contains(&entity) {
            send(true);
            sent_full = true;
            if input.has_any_movement_key_pressed() {
                feed.active = true;
            }
        }

        if landed.contains(&entity) {
            send(true);
            sent_full = true;
        }

        if gesture_selected && state.action.is_some() {
            send(true);
            sent_full = true;
        }

        if !feed.active {
            continue;
        }

        if !input.has_any_movement_key_pressed() {
            // Финальный update после остановки
            feed.deactivate();
            if !sent_full {
                send(true);
            }
            continue;
        }

        match feed.heartbeat_at {
            None => {
                if !sent_full {
                    send(true);
                }
                feed.heartbeat_at = Some(clock.deadline_after(config.heartbeat_interval));
            }
            Some(due) if clock.is_due(due) => {
                send(false);
                feed.heartbeat_at = Some(clock.deadline_after(config.heartbeat_interval));
            }
            Some(_) => {}
        }
    }
}
