//! Сглаживание модели и камеры к authoritative physics body

use bevy::prelude::*;

/// Поворачивает `from` к `to` не больше чем на `max_angle` радиан.
pub fn rotate_towards(from: Quat, to: Quat, max_angle: f32) -> Quat {
    let angle = from.angle_between(to);
    if angle <= f32::EPSILON || angle <= max_angle {
        return to;
    }
    from.slerp(to, max_angle / angle)
}

/// Модель догоняет тело: позиция lerp к ногам тела, поворот к facing.
///
/// Применяется каждый тик для local и remote персонажей.
pub fn blend_model_towards(
    model: &mut Transform,
    body_feet: Vec3,
    facing: Quat,
    blend: f32,
    turn_step: f32,
) {
    model.translation = model.translation.lerp(body_feet, blend);
    model.rotation = rotate_towards(model.rotation, facing, turn_step);
}

/// Камера следует за телом.
///
/// Position сдвигается на тот же вектор, на который модель отстаёт от тела
/// (lerp, не snap); target: к точке над ногами тела.
pub fn follow_body(
    camera: &mut super::CameraRig,
    body_feet: Vec3,
    model_position: Vec3,
    target_height: f32,
    blend: f32,
) {
    let lag = body_feet - model_position;
    camera.position = camera.position.lerp(camera.position + lag, blend);
    camera.target = camera
        .target
        .lerp(body_feet + Vec3::Y * target_height, blend);
}
