//! Character tunables
//!
//! Один resource со всеми константами локомоции, прыжка, анимации и сети.
//! Значения по умолчанию совпадают с поведением live клиента;
//! деплой может подменить их JSON'ом (`CharacterConfig::from_json`).

use bevy::prelude::*;
use serde::Deserialize;
use std::time::Duration;

#[derive(Resource, Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterConfig {
    /// Множитель скорости: velocity = direction × moving_speed × delta
    pub moving_speed: f32,
    /// Радиус сферы physics body (модель стоит на body.y − radius)
    pub body_radius: f32,
    pub body_mass: f32,
    pub angular_damping: f32,
    /// Гравитация мира (м/с²)
    pub gravity: f32,

    /// Lerp фактор модели к body за тик (позиция)
    pub model_blend: f32,
    /// Максимальный угол поворота модели за тик (радианы)
    pub model_turn_step: f32,
    /// Lerp фактор камеры (позиция и target)
    pub camera_blend: f32,
    /// Высота camera target над ногами персонажа
    pub camera_target_height: f32,

    /// Вертикальный импульс в конце wind-up
    pub jump_impulse: f32,
    #[serde(with = "millis")]
    pub jump_windup: Duration,
    #[serde(with = "millis")]
    pub jump_airborne: Duration,
    /// Grace период падения после спавна
    #[serde(with = "millis")]
    pub landing_grace: Duration,

    /// Cross-fade длительность (fade out старой + fade in новой)
    pub fade_seconds: f32,
    /// Возврат к default анимации на столько раньше конца jump клипа
    pub jump_return_lead_seconds: f32,

    /// Порог остаточной горизонтальной скорости в покое
    pub rest_velocity_threshold: f32,

    #[serde(with = "millis")]
    pub heartbeat_interval: Duration,
    #[serde(with = "millis")]
    pub remote_tween: Duration,
    #[serde(with = "millis")]
    pub remote_settle: Duration,

    /// Точка спавна локального персонажа (высоко: падает на пол)
    #[serde(with = "vec3")]
    pub spawn_position: Vec3,
}

impl Default for CharacterConfig {
    fn default() -> Self {
        Self {
            moving_speed: 400.0,
            body_radius: 1.8,
            body_mass: 100.0,
            angular_damping: 0.5,
            gravity: -60.0,

            model_blend: 0.3,
            model_turn_step: 0.3,
            camera_blend: 0.3,
            camera_target_height: 2.5,

            jump_impulse: 15.0,
            jump_windup: Duration::from_millis(200),
            jump_airborne: Duration::from_millis(800),
            landing_grace: Duration::from_millis(1500),

            fade_seconds: 0.5,
            jump_return_lead_seconds: 0.5,

            rest_velocity_threshold: 0.02,

            heartbeat_interval: Duration::from_millis(400),
            remote_tween: Duration::from_millis(1800),
            remote_settle: Duration::from_millis(1000),

            spawn_position: Vec3::new(0.0, 50.0, 30.0),
        }
    }
}

impl CharacterConfig {
    /// Частичный JSON: отсутствующие поля берутся из `Default`.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Duration <-> integer milliseconds
mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Vec3 <-> `[x, y, z]` (glam serde feature не включён)
mod vec3 {
    use bevy::math::Vec3;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec3, D::Error>
    where
        D: Deserializer<'de>,
    {
        <[f32; 3]>::deserialize(deserializer).map(Vec3::from_array)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = CharacterConfig::default();
        assert_eq!(config.moving_speed, 400.0);
        assert_eq!(config.body_radius, 1.8);
        assert_eq!(config.jump_windup, Duration::from_millis(200));
        assert_eq!(config.jump_airborne, Duration::from_millis(800));
        assert_eq!(config.heartbeat_interval, Duration::from_millis(400));
        assert_eq!(config.remote_tween, Duration::from_millis(1800));
        assert_eq!(config.remote_settle, Duration::from_millis(1000));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config =
            CharacterConfig::from_json(r#"{ "movingSpeed": 250.0, "heartbeatInterval": 250, "spawnPosition": [1.0, 20.0, 3.0] }"#)
                .unwrap();

        assert_eq!(config.moving_speed, 250.0);
        assert_eq!(config.heartbeat_interval, Duration::from_millis(250));
        assert_eq!(config.gravity, -60.0);
        assert_eq!(config.spawn_position, Vec3::new(1.0, 20.0, 3.0));
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(CharacterConfig::from_json("{ movingSpeed: }").is_err());
    }
}
