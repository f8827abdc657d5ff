//! Physics simulation module
//!
//! Physics world = все entity с `PhysicsBody` + статичный `Floor`.
//! Персонаж держит только handle (Entity) своего тела.

use bevy::prelude::*;

use crate::SimulationSet;

pub mod body;

// Re-export основных типов
pub use body::{
    spawn_character_body, step_body, Floor, FloorCollider, PhysicsBody,
};

/// Physics Plugin
///
/// Порядок выполнения (`SimulationSet::Physics`):
/// 1. step_physics_world: gravity + интеграция + контакт с полом
/// 2. sync_bodies_to_rapier: зеркалим в Transform/Velocity
pub struct PhysicsPlugin;

impl Plugin for PhysicsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Floor>()
            .add_systems(Startup, body::spawn_floor)
            .add_systems(
                FixedUpdate,
                (body::step_physics_world, body::sync_bodies_to_rapier)
                    .chain()
                    .in_set(SimulationSet::Physics),
            );
    }
}
