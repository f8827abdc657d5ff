//! Visual sync: модель догоняет тело, stabilizer остаточного дрейфа
//!
//! Работает для local и remote персонажей каждый тик.

use bevy::prelude::*;

use crate::config::CharacterConfig;
use crate::physics::PhysicsBody;
use crate::scene::{blend_model_towards, ModelNode};

use super::state::CharacterState;
use super::{CharacterControl, FacingRotation};

/// Система: model Transform → lerp к ногам тела, rotate_towards к facing
pub fn blend_models(
    config: Res<CharacterConfig>,
    characters: Query<(&CharacterControl, &FacingRotation)>,
    bodies: Query<&PhysicsBody>,
    mut models: Query<&mut Transform, With<ModelNode>>,
) {
    for (control, facing) in characters.iter() {
        let Ok(body) = bodies.get(control.body) else {
            continue;
        };
        let Ok(mut model) = models.get_mut(control.model) else {
            continue;
        };

        blend_model_towards(
            &mut model,
            body.feet(),
            facing.0,
            config.model_blend,
            config.model_turn_step,
        );
    }
}

/// Система: стоим, но тело ещё скользит → гасим горизонтальную velocity
pub fn stabilize_resting_bodies(
    config: Res<CharacterConfig>,
    characters: Query<(&CharacterControl, &CharacterState)>,
    mut bodies: Query<&mut PhysicsBody>,
) {
    for (control, state) in characters.iter() {
        if state.is_moving {
            continue;
        }
        let Ok(mut body) = bodies.get_mut(control.body) else {
            continue;
        };

        let threshold = config.rest_velocity_threshold;
        if body.velocity.x.abs() > threshold || body.velocity.z.abs() > threshold {
            body.stop_horizontal();
            body.reset_rotation();
        }
    }
}
