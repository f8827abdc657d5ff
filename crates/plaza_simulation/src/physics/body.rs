//! Character physics body + fixed-step integrator
//!
//! Архитектура:
//! - Rapier компоненты (RigidBody, Collider, Damping, mass): формы и массы
//! - Velocity интегрируем сами: gravity → position → floor contact
//! - sync_bodies_to_rapier зеркалит PhysicsBody в Transform/Velocity
//!
//! Детерминизм: один шаг = FIXED_STEP_SECS, порядок систем фиксирован.

use bevy::prelude::*;
use bevy_rapier3d::prelude::*;

use crate::clock::FIXED_STEP_SECS;
use crate::config::CharacterConfig;

/// Authoritative состояние тела персонажа.
///
/// Модель (scene node) только догоняет это состояние, никогда наоборот.
#[derive(Component, Debug, Clone, Copy, PartialEq, Reflect)]
#[reflect(Component)]
pub struct PhysicsBody {
    /// Центр сферы (world space)
    pub position: Vec3,
    pub velocity: Vec3,
    pub rotation: Quat,
    pub radius: f32,
}

impl PhysicsBody {
    pub fn new(position: Vec3, radius: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            radius,
        }
    }

    /// Горизонтальная скорость; Y (гравитация/прыжок) не трогаем
    pub fn set_horizontal_velocity(&mut self, x: f32, z: f32) {
        self.velocity.x = x;
        self.velocity.z = z;
    }

    pub fn stop_horizontal(&mut self) {
        self.set_horizontal_velocity(0.0, 0.0);
    }

    pub fn reset_rotation(&mut self) {
        self.rotation = Quat::IDENTITY;
    }

    /// Точка, где стоят ноги модели
    pub fn feet(&self) -> Vec3 {
        self.position - Vec3::Y * self.radius
    }
}

/// Статичный пол (плоскость y = height)
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Floor {
    pub height: f32,
}

impl Default for Floor {
    fn default() -> Self {
        Self { height: 0.0 }
    }
}

/// Marker для floor collider entity
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct FloorCollider;

/// Один шаг интеграции тела (чистая функция, используется системой и тестами)
pub fn step_body(body: &mut PhysicsBody, gravity: f32, floor: f32, delta: f32) {
    body.velocity.y += gravity * delta;
    body.position += body.velocity * delta;

    let lowest = floor + body.radius;
    if body.position.y < lowest {
        body.position.y = lowest;
        // Контакт с полом гасит падение, но не прыжок вверх
        body.velocity.y = body.velocity.y.max(0.0);
    }
}

/// Система: physics step для всех тел (FixedUpdate, 50Hz)
pub fn step_physics_world(
    mut bodies: Query<&mut PhysicsBody>,
    config: Res<CharacterConfig>,
    floor: Res<Floor>,
) {
    for mut body in bodies.iter_mut() {
        step_body(&mut body, config.gravity, floor.height, FIXED_STEP_SECS);
    }
}

/// Система: PhysicsBody → Transform + Rapier Velocity
pub fn sync_bodies_to_rapier(mut query: Query<(&PhysicsBody, &mut Transform, &mut Velocity)>) {
    for (body, mut transform, mut rapier_velocity) in query.iter_mut() {
        transform.translation = body.position;
        transform.rotation = body.rotation;
        rapier_velocity.linvel = body.velocity;
    }
}

/// Добавляет тело персонажа в physics world.
///
/// `feet`: где должна стоять модель; центр сферы на radius выше.
pub fn spawn_character_body(commands: &mut Commands, feet: Vec3, config: &CharacterConfig) -> Entity {
    let body = PhysicsBody::new(feet + Vec3::Y * config.body_radius, config.body_radius);

    commands
        .spawn((
            Transform::from_translation(body.position),
            body,
            // Rapier physics
            RigidBody::Dynamic,
            Collider::ball(config.body_radius),
            AdditionalMassProperties::Mass(config.body_mass),
            Damping {
                linear_damping: 0.0,
                angular_damping: config.angular_damping,
            },
            Velocity::zero(),
        ))
        .id()
}

/// Пол: fixed cuboid с верхней гранью на floor.height
pub fn spawn_floor(mut commands: Commands, floor: Res<Floor>) {
    const HALF_EXTENT: f32 = 500.0;
    const HALF_THICKNESS: f32 = 0.1;

    commands.spawn((
        FloorCollider,
        Transform::from_xyz(0.0, floor.height - HALF_THICKNESS, 0.0),
        RigidBody::Fixed,
        Collider::cuboid(HALF_EXTENT, HALF_THICKNESS, HALF_EXTENT),
    ));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gravity_pulls_body_down() {
        let mut body = PhysicsBody::new(Vec3::new(0.0, 50.0, 0.0), 1.8);
        step_body(&mut body, -60.0, 0.0, 0.02);

        // v = -60 * 0.02 = -1.2; y = 50 - 1.2 * 0.02
        assert!((body.velocity.y + 1.2).abs() < 1e-5);
        assert!((body.position.y - 49.976).abs() < 1e-4);
    }

    #[test]
    fn test_floor_stops_falling_body() {
        let mut body = PhysicsBody::new(Vec3::new(0.0, 1.85, 0.0), 1.8);
        body.velocity.y = -20.0;

        step_body(&mut body, -60.0, 0.0, 0.02);

        assert_eq!(body.position.y, 1.8);
        assert_eq!(body.velocity.y, 0.0);
        assert_eq!(body.feet().y, 0.0);
    }

    #[test]
    fn test_jump_impulse_leaves_floor() {
        let mut body = PhysicsBody::new(Vec3::new(0.0, 1.8, 0.0), 1.8);
        body.velocity.y = 15.0;

        step_body(&mut body, -60.0, 0.0, 0.02);

        assert!(body.position.y > 1.8);
        assert!(body.velocity.y > 0.0);
    }

    #[test]
    fn test_horizontal_velocity_integrates() {
        let mut body = PhysicsBody::new(Vec3::new(0.0, 1.8, 0.0), 1.8);
        body.set_horizontal_velocity(8.0, -4.0);

        step_body(&mut body, -60.0, 0.0, 0.02);

        assert!((body.position.x - 0.16).abs() < 1e-5);
        assert!((body.position.z + 0.08).abs() < 1e-5);

        body.stop_horizontal();
        assert_eq!(body.velocity.x, 0.0);
        assert_eq!(body.velocity.z, 0.0);
    }
}
