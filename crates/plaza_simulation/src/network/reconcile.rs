//! Network Reconciler (inbound): snapshot → remote персонаж
//!
//! Правила для найденного персонажа:
//! - любой snapshot отменяет текущий tween, facing ставится сразу
//! - position есть: body.y сразу, x/z: cubic ease-out tween (remote_tween)
//! - position нет: dead reckoning по горизонтальной velocity snapshot'а
//! - state urgent (moving / wind-up) применяется сразу, иначе через
//!   remote_settle; новый snapshot заменяет отложенный
//!
//! Неизвестный userId → spawn remote персонажа (state из того же snapshot'а).
//! Snapshot для персонажа, чей spawn ещё в commands, откладывается на тик.

use bevy::prelude::*;

use crate::character::{
    despawn_character, spawn_character, CharacterCatalog, CharacterControl, CharacterRegistry, CharacterState,
    FacingRotation, Player, SpawnCharacter,
};
use crate::clock::{SimClock, Tick};
use crate::config::CharacterConfig;
use crate::logger;
use crate::physics::PhysicsBody;

use super::transport::{DisconnectReceived, SnapshotReceived};
use super::wire::UserSnapshot;

/// Интерполяция горизонтальной позиции тела
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionTween {
    pub from: Vec2,
    pub to: Vec2,
    pub start: Tick,
    pub end: Tick,
}

impl PositionTween {
    /// (x, z) на тике `now` и завершён ли tween
    pub fn sample(&self, now: Tick) -> (Vec2, bool) {
        if now >= self.end || self.end <= self.start {
            return (self.to, true);
        }

        let t = now.saturating_sub(self.start) as f32 / (self.end - self.start) as f32;
        (self.from.lerp(self.to, cubic_ease_out(t)), false)
    }
}

pub fn cubic_ease_out(t: f32) -> f32 {
    let inverse = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inverse * inverse * inverse
}

/// Состояние, ждущее settle задержки
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingState {
    pub state: CharacterState,
    pub apply_at: Tick,
}

/// Reconciliation данные remote персонажа
#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct RemoteSync {
    pub tween: Option<PositionTween>,
    pub pending: Option<PendingState>,
}

impl RemoteSync {
    /// Применяет snapshot к найденному персонажу.
    ///
    /// `body` = None, если тело уже удалено (stale handle): применяются
    /// только facing и state.
    pub fn apply(
        &mut self,
        snapshot: &UserSnapshot,
        clock: &SimClock,
        config: &CharacterConfig,
        state: &mut CharacterState,
        facing: &mut FacingRotation,
        body: Option<&mut PhysicsBody>,
    ) {
        self.tween = None;

        if let Some(quaternion) = snapshot.quaternion {
            facing.0 = quaternion.into();
        }

        if let Some(body) = body {
            if let Some(position) = snapshot.position {
                body.position.y = position.y;
                body.stop_horizontal();
                self.tween = Some(PositionTween {
                    from: body.position.xz(),
                    to: Vec2::new(position.x, position.z),
                    start: clock.now(),
                    end: clock.deadline_after(config.remote_tween),
                });
            } else if let Some(velocity) = snapshot.velocity {
                body.set_horizontal_velocity(velocity.x, velocity.z);
            }
        }

        let Some(incoming) = &snapshot.state else {
            return;
        };

        if incoming.is_urgent() {
            self.pending = None;
            apply_remote_state(state, incoming);
        } else {
            self.pending = Some(PendingState {
                state: incoming.clone(),
                apply_at: clock.deadline_after(config.remote_settle),
            });
        }
    }
}

impl RemoteSync {
    /// State только что заспавненного персонажа по snapshot'у, который его создал.
    ///
    /// Urgent state возвращается сразу (поверх spawned), остальной ждёт settle.
    pub fn initial_state(
        &mut self,
        snapshot: &UserSnapshot,
        clock: &SimClock,
        config: &CharacterConfig,
    ) -> Option<CharacterState> {
        let incoming = snapshot.state.as_ref()?;
        if !incoming.is_urgent() {
            self.pending = Some(PendingState {
                state: incoming.clone(),
                apply_at: clock.deadline_after(config.remote_settle),
            });
            return None;
        }

        let mut state = CharacterState::spawned();
        apply_remote_state(&mut state, incoming);
        Some(state)
    }
}

/// Заменяет state целиком; is_falling сеть может только сбросить.
pub fn apply_remote_state(current: &mut CharacterState, incoming: &CharacterState) {
    let was_falling = current.is_falling;
    *current = incoming.clone();
    current.is_falling = incoming.is_falling && was_falling;
}

/// Snapshot'ы персонажей, чей spawn ещё не применён: повторяются в
/// следующем тике раньше новых (порядок канала сохраняется).
#[derive(Resource, Debug, Default)]
pub struct DeferredSnapshots {
    queue: Vec<UserSnapshot>,
}

impl DeferredSnapshots {
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

/// Система: SnapshotReceived → apply или spawn remote персонажа
pub fn reconcile_snapshots(
    mut commands: Commands,
    mut snapshots: EventReader<SnapshotReceived>,
    mut deferred: ResMut<DeferredSnapshots>,
    mut registry: ResMut<CharacterRegistry>,
    catalog: Res<CharacterCatalog>,
    config: Res<CharacterConfig>,
    clock: Res<SimClock>,
    mut remotes: Query<
        (&CharacterControl, &mut CharacterState, &mut FacingRotation, &mut RemoteSync),
        Without<Player>,
    >,
    mut bodies: Query<&mut PhysicsBody>,
) {
    let replayed = std::mem::take(&mut deferred.queue).into_iter().map(|snapshot| (snapshot, true));
    let received = snapshots.read().map(|event| (event.snapshot.clone(), false));
    let incoming: Vec<(UserSnapshot, bool)> = replayed.chain(received).collect();

    for (snapshot, is_replay) in incoming {
        if let Some(entity) = registry.get(&snapshot.user_id) {
            if registry.local() == Some(entity) {
                continue;
            }

            // Spawn этого тика ещё не применён: повторим в следующем
            let Ok((control, mut state, mut facing, mut sync)) = remotes.get_mut(entity) else {
                logger::log(&format!("snapshot for {} deferred: character not ready", snapshot.user_id));
                deferred.queue.push(snapshot);
                continue;
            };

            let body = bodies.get_mut(control.body).ok();
            sync.apply(
                &snapshot,
                &clock,
                &config,
                &mut state,
                &mut facing,
                body.map(|body| body.into_inner()),
            );
            continue;
        }

        // Отложенный snapshot пережил disconnect: пользователя больше нет
        if is_replay {
            continue;
        }

        let Some(name) = snapshot.character_name.clone() else {
            logger::log_warning(&format!("snapshot for unknown {} without characterName", snapshot.user_id));
            continue;
        };

        let position = snapshot.position.map(Vec3::from).unwrap_or(config.spawn_position);
        let mut request = SpawnCharacter::remote(snapshot.user_id.clone(), name, position);
        if let Some(quaternion) = snapshot.quaternion {
            request.rotation = quaternion.into();
        }

        match spawn_character(&mut commands, &mut registry, &catalog, &config, &clock, request) {
            Ok(entity) => {
                let mut sync = RemoteSync::default();
                let mut entity_commands = commands.entity(entity);
                if let Some(state) = sync.initial_state(&snapshot, &clock, &config) {
                    entity_commands.insert(state);
                }
                entity_commands.insert(sync);
            }
            Err(err) => logger::log_warning(&format!("remote {} not loaded: {}", snapshot.user_id, err)),
        }
    }
}

/// Система: DisconnectReceived → destroy (повторный: no-op)
pub fn handle_disconnects(
    mut commands: Commands,
    mut disconnects: EventReader<DisconnectReceived>,
    mut registry: ResMut<CharacterRegistry>,
) {
    for DisconnectReceived { user_id } in disconnects.read() {
        despawn_character(&mut commands, &mut registry, user_id);
    }
}

/// Система: settle задержка истекла → state применяется
pub fn apply_settled_states(clock: Res<SimClock>, mut remotes: Query<(&mut RemoteSync, &mut CharacterState)>) {
    for (mut sync, mut state) in remotes.iter_mut() {
        let Some(pending) = &sync.pending else {
            continue;
        };
        if !clock.is_due(pending.apply_at) {
            continue;
        }

        if let Some(pending) = sync.pending.take() {
            apply_remote_state(&mut state, &pending.state);
        }
    }
}

/// Система: tween двигает x/z тела remote персонажа
pub fn advance_remote_tweens(
    clock: Res<SimClock>,
    mut remotes: Query<(&CharacterControl, &mut RemoteSync)>,
    mut bodies: Query<&mut PhysicsBody>,
) {
    for (control, mut sync) in remotes.iter_mut() {
        let Some(tween) = sync.tween else {
            continue;
        };
        let Ok(mut body) = bodies.get_mut(control.body) else {
            sync.tween = None;
            continue;
        };

        let (position, finished) = tween.sample(clock.now());
        body.position.x = position.x;
        body.position.z = position.y;

        if finished {
            sync.tween = None;
        }
    }
}
