//! Animation Catalog: semantic key → clip
//!
//! Заполняется один раз внешним loader'ом (FBX/glTF), симуляция только
//! читает через `get`.

use bevy::prelude::*;
use std::collections::HashMap;

use crate::input::GESTURES;

pub const IDLE: &str = "idle";
pub const RUN: &str = "run";
pub const JUMP: &str = "jump";
pub const RUNNING_JUMP: &str = "running-jump";
pub const FALL: &str = "fall";

/// Базовые клипы локомоции (без жестов)
pub const LOCOMOTION_CLIPS: &[&str] = &[IDLE, RUN, JUMP, RUNNING_JUMP, FALL];

/// Данные клипа, нужные симуляции (кости/кривые остаются у рендерера)
#[derive(Debug, Clone, PartialEq, Reflect)]
pub struct AnimationClip {
    pub key: String,
    /// Длительность клипа (секунды)
    pub duration: f32,
}

impl AnimationClip {
    pub fn new(key: impl Into<String>, duration: f32) -> Self {
        Self {
            key: key.into(),
            duration,
        }
    }
}

#[derive(Resource, Debug, Clone, Default)]
pub struct AnimationCatalog {
    clips: HashMap<String, AnimationClip>,
}

impl AnimationCatalog {
    pub fn new(clips: impl IntoIterator<Item = AnimationClip>) -> Self {
        Self {
            clips: clips.into_iter().map(|clip| (clip.key.clone(), clip)).collect(),
        }
    }

    pub fn insert(&mut self, clip: AnimationClip) {
        self.clips.insert(clip.key.clone(), clip);
    }

    pub fn get(&self, key: &str) -> Option<&AnimationClip> {
        self.clips.get(key)
    }

    pub fn len(&self) -> usize {
        self.clips.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clips.is_empty()
    }

    /// Каталог со всеми locomotion клипами и жестами, все длины = `duration`.
    ///
    /// Для headless прогонов, где реальные клипы не грузятся.
    pub fn uniform(duration: f32) -> Self {
        let keys = LOCOMOTION_CLIPS
            .iter()
            .copied()
            .chain(GESTURES.iter().map(|gesture| gesture.key));

        Self::new(keys.map(|key| AnimationClip::new(key, duration)))
    }
}
