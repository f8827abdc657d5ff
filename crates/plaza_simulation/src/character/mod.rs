//! Character domain: аватары игроков в plaza
//!
//! Архитектура (arena + handles):
//! - character entity: CharacterControl, CharacterState, AnimationMixer, timers
//! - body entity: PhysicsBody + rapier компоненты (CharacterControl.body)
//! - model entity: ModelNode + Transform (CharacterControl.model)
//!
//! Character хранит только Entity handles; destroy удаляет все три entity.
//! `CharacterRegistry`: индекс userId → character entity.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::SimulationSet;

pub mod catalog;
pub mod jump;
pub mod locomotion;
pub mod spawn;
pub mod state;
pub mod visual;


pub use catalog::{CharacterCatalog, CharacterData, SpawnError};
pub use jump::{JumpEnded, JumpIntent, JumpMachine, JumpPhase, JumpStarted, Landed, SpawnGrace};
pub use locomotion::{facing_offset, facing_rotation, movement_offset, walk_direction};
pub use spawn::{despawn_character, spawn_character, SpawnCharacter};
pub use state::CharacterState;

/// Долгоживущий аватар (local или remote).
#[derive(Component, Debug, Clone, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct CharacterControl {
    pub user_id: String,
    pub character_name: String,
    /// Physics body entity (PhysicsBody)
    pub body: Entity,
    /// Rendered model entity (ModelNode + Transform)
    pub model: Entity,
    pub is_my_character: bool,
}

/// Куда должна смотреть модель (модель поворачивается к нему по шагам)
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct FacingRotation(pub Quat);

impl Default for FacingRotation {
    fn default() -> Self {
        Self(Quat::IDENTITY)
    }
}

/// Marker локального персонажа (управляется input'ом этого клиента)
///
/// Input/locomotion системы используют `With<Player>`,
/// remote персонажи двигаются только сетевым состоянием.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Player;

/// Handles одного аватара в arena
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterHandles {
    pub character: Entity,
    pub body: Entity,
    pub model: Entity,
}

/// Индекс персонажей по userId.
///
/// Обновляется сразу при spawn/despawn (не ждёт apply commands),
/// поэтому повторный snapshot в том же тике не создаст дубликат.
#[derive(Resource, Debug, Default)]
pub struct CharacterRegistry {
    by_user: HashMap<String, CharacterHandles>,
    local: Option<Entity>,
}

impl CharacterRegistry {
    /// Character entity по userId
    pub fn get(&self, user_id: &str) -> Option<Entity> {
        self.by_user.get(user_id).map(|handles| handles.character)
    }

    pub fn handles(&self, user_id: &str) -> Option<CharacterHandles> {
        self.by_user.get(user_id).copied()
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.by_user.contains_key(user_id)
    }

    /// Entity персонажа этого клиента
    pub fn local(&self) -> Option<Entity> {
        self.local
    }

    pub fn len(&self) -> usize {
        self.by_user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_user.is_empty()
    }

    pub fn user_ids(&self) -> impl Iterator<Item = &str> {
        self.by_user.keys().map(String::as_str)
    }

    pub(crate) fn insert(&mut self, user_id: &str, handles: CharacterHandles, is_my_character: bool) {
        self.by_user.insert(user_id.to_string(), handles);
        if is_my_character {
            self.local = Some(handles.character);
        }
    }

    pub(crate) fn remove(&mut self, user_id: &str) -> Option<CharacterHandles> {
        let handles = self.by_user.remove(user_id)?;
        if self.local == Some(handles.character) {
            self.local = None;
        }
        Some(handles)
    }
}

/// Character Plugin
///
/// Регистрирует jump события и системы персонажей:
/// - Timers: jump intent → wind-up/airborne фазы → spawn grace landing → жесты
/// - Locomotion: local input → body velocity, facing, камера
/// - VisualSync: модели догоняют тела, stabilizer
pub struct CharacterPlugin;

impl Plugin for CharacterPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CharacterRegistry>()
            .init_resource::<CharacterCatalog>()
            .add_event::<JumpIntent>()
            .add_event::<JumpStarted>()
            .add_event::<JumpEnded>()
            .add_event::<Landed>();

        app.add_systems(
            FixedUpdate,
            (
                jump::request_jump_from_input,
                jump::start_jumps,
                jump::advance_jump_phases,
                jump::land_after_spawn_grace,
                locomotion::apply_gesture_selection,
            )
                .chain()
                .in_set(SimulationSet::Timers),
        );

        app.add_systems(
            FixedUpdate,
            locomotion::drive_local_character.in_set(SimulationSet::Locomotion),
        );

        app.add_systems(
            FixedUpdate,
            (visual::blend_models, visual::stabilize_resting_bodies)
                .chain()
                .in_set(SimulationSet::VisualSync),
        );
    }
}
