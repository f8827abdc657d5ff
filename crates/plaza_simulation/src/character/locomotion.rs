//! Locomotion локального персонажа
//!
//! Input (KeysPressed) + ориентация камеры → velocity тела, facing модели,
//! follow камеры. Remote персонажи сюда не попадают (With<Player>).

use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::clock::FIXED_STEP_SECS;
use crate::config::CharacterConfig;
use crate::input::{find_gesture, GestureSelected, InputTracker, KeysPressed};
use crate::logger;
use crate::physics::PhysicsBody;
use crate::scene::{follow_body, CameraRig, ModelNode};

use super::state::CharacterState;
use super::{CharacterControl, CharacterRegistry, FacingRotation, Player};

/// Поворот направления ходьбы относительно взгляда камеры (8 направлений).
///
/// Forward приоритетнее back, left приоритетнее right.
pub fn movement_offset(keys: &KeysPressed) -> f32 {
    if keys.forward {
        if keys.left {
            FRAC_PI_4
        } else if keys.right {
            -FRAC_PI_4
        } else {
            0.0
        }
    } else if keys.back {
        if keys.left {
            FRAC_PI_4 + FRAC_PI_2
        } else if keys.right {
            -FRAC_PI_4 - FRAC_PI_2
        } else {
            PI
        }
    } else if keys.left {
        FRAC_PI_2
    } else if keys.right {
        -FRAC_PI_2
    } else {
        0.0
    }
}

/// Поворот модели относительно bearing'а камера → персонаж.
///
/// Модель смотрит от камеры, поэтому таблица зеркальна movement_offset:
/// back приоритетнее forward, right приоритетнее left.
pub fn facing_offset(keys: &KeysPressed) -> f32 {
    if keys.back {
        if keys.right {
            FRAC_PI_4
        } else if keys.left {
            -FRAC_PI_4
        } else {
            0.0
        }
    } else if keys.forward {
        if keys.right {
            FRAC_PI_4 + FRAC_PI_2
        } else if keys.left {
            -FRAC_PI_4 - FRAC_PI_2
        } else {
            PI
        }
    } else if keys.right {
        FRAC_PI_2
    } else if keys.left {
        -FRAC_PI_2
    } else {
        0.0
    }
}

/// Горизонтальное направление ходьбы (единичный вектор или ZERO).
pub fn walk_direction(camera_forward: Vec3, keys: &KeysPressed) -> Vec3 {
    let flat = Vec3::new(camera_forward.x, 0.0, camera_forward.z).normalize_or_zero();
    Quat::from_rotation_y(movement_offset(keys)) * flat
}

/// Facing модели: bearing от модели к камере + 8-way offset.
pub fn facing_rotation(camera_position: Vec3, model_position: Vec3, keys: &KeysPressed) -> Quat {
    let bearing = (camera_position.x - model_position.x).atan2(camera_position.z - model_position.z);
    Quat::from_rotation_y(bearing + facing_offset(keys))
}

/// Система: input → velocity/facing локального персонажа + follow камеры
///
/// - движение (не wind-up, не falling): velocity = direction × speed × delta
/// - wind-up/falling с зажатыми клавишами: горизонтальная velocity = 0
/// - без клавиш: velocity = 0, rotation тела = identity, is_moving = false
pub fn drive_local_character(
    config: Res<CharacterConfig>,
    input: Res<InputTracker>,
    mut camera: ResMut<CameraRig>,
    mut locals: Query<(&CharacterControl, &mut CharacterState, &mut FacingRotation), With<Player>>,
    mut bodies: Query<&mut PhysicsBody>,
    models: Query<&Transform, With<ModelNode>>,
) {
    let keys = input.keys_pressed();

    for (control, mut state, mut facing) in locals.iter_mut() {
        let Ok(mut body) = bodies.get_mut(control.body) else {
            continue;
        };
        let Ok(model) = models.get(control.model) else {
            continue;
        };

        if keys.has_any_movement_key_pressed() {
            state.is_moving = true;
            state.clear_action();

            if !state.is_start_jumping && !state.is_falling {
                let direction = walk_direction(camera.forward(), keys);
                facing.0 = facing_rotation(camera.position, model.translation, keys);

                let speed = config.moving_speed * FIXED_STEP_SECS;
                body.set_horizontal_velocity(direction.x * speed, direction.z * speed);
            } else {
                body.stop_horizontal();
            }
        } else {
            body.stop_horizontal();
            body.reset_rotation();
            state.is_moving = false;
        }

        follow_body(
            &mut camera,
            body.feet(),
            model.translation,
            config.camera_target_height,
            config.camera_blend,
        );
    }
}

/// Система: выбор жеста в меню → state.action локального персонажа
pub fn apply_gesture_selection(
    mut selected: EventReader<GestureSelected>,
    registry: Res<CharacterRegistry>,
    mut states: Query<&mut CharacterState, With<Player>>,
) {
    for event in selected.read() {
        if find_gesture(&event.action).is_none() {
            logger::log_warning(&format!("unknown gesture `{}`", event.action));
            continue;
        }

        let Some(entity) = registry.local() else {
            continue;
        };
        if let Ok(mut state) = states.get_mut(entity) {
            state.action = Some(event.action.clone());
        }
    }
}
