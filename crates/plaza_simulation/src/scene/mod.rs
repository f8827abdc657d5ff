//! Scene graph интерфейс: rendered model nodes + orbit camera rig
//!
//! Рендер внешний. Симуляция владеет только Transform'ами нод модели
//! и позицией/target'ом камеры; рендерер их читает.

use bevy::prelude::*;

pub mod blend;

pub use blend::{blend_model_towards, follow_body, rotate_towards};

/// Renderable нода модели персонажа (scene graph entry)
#[derive(Component, Debug, Clone, PartialEq, Eq, Reflect)]
#[reflect(Component)]
pub struct ModelNode {
    /// `character-<userId>`
    pub name: String,
    /// Путь модели выбранного look'а в каталоге
    pub source: String,
}

/// Orbit камера локального клиента.
///
/// Orbit controls (мышь) внешние; locomotion только подтягивает
/// position/target за персонажем.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct CameraRig {
    pub position: Vec3,
    pub target: Vec3,
}

impl Default for CameraRig {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 1.0),
            target: Vec3::ZERO,
        }
    }
}

impl CameraRig {
    /// Куда смотрит камера (world direction)
    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }
}

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<CameraRig>();
    }
}
