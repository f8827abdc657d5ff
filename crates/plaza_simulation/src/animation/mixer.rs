//! Animation mixer с cross-fade
//!
//! Инвариант: ровно один active клип; остальные actions только затухают.
//! Повторный `play` активного клипа: no-op (не перезапускает).

use bevy::prelude::*;

use super::catalog::AnimationClip;

#[derive(Debug, Clone, Copy, PartialEq)]
struct Fade {
    from: f32,
    to: f32,
    /// Время mixer'а, с которого идёт fade
    start: f32,
    duration: f32,
}

impl Fade {
    fn weight_at(&self, time: f32) -> f32 {
        if self.duration <= 0.0 {
            return self.to;
        }
        let t = ((time - self.start) / self.duration).clamp(0.0, 1.0);
        self.from + (self.to - self.from) * t
    }

    fn finished_at(&self, time: f32) -> bool {
        time - self.start >= self.duration
    }
}

/// Проигрываемый клип и его вес в blend'е
#[derive(Debug, Clone, PartialEq)]
pub struct MixerAction {
    pub clip: String,
    pub duration: f32,
    /// Play head внутри клипа (зациклен)
    pub time: f32,
    pub weight: f32,
    fade: Option<Fade>,
}

impl MixerAction {
    pub fn is_fading(&self) -> bool {
        self.fade.is_some()
    }
}

#[derive(Component, Debug, Clone, Default, PartialEq)]
pub struct AnimationMixer {
    time: f32,
    active: Option<String>,
    actions: Vec<MixerAction>,
}

impl AnimationMixer {
    pub fn active_clip(&self) -> Option<&str> {
        self.active.as_deref()
    }

    pub fn actions(&self) -> &[MixerAction] {
        &self.actions
    }

    pub fn weight_of(&self, clip: &str) -> f32 {
        self.actions
            .iter()
            .find(|action| action.clip == clip)
            .map(|action| action.weight)
            .unwrap_or(0.0)
    }

    /// Переключает на `clip` с cross-fade `fade` секунд.
    ///
    /// Возвращает `false`, если клип уже active (ничего не меняется).
    pub fn play(&mut self, clip: &AnimationClip, fade: f32) -> bool {
        if self.active.as_deref() == Some(clip.key.as_str()) {
            return false;
        }

        let now = self.time;

        if let Some(previous) = self.active.take() {
            if let Some(action) = self.actions.iter_mut().find(|a| a.clip == previous) {
                action.fade = Some(Fade {
                    from: action.weight,
                    to: 0.0,
                    start: now,
                    duration: fade,
                });
            }
        }

        match self.actions.iter_mut().find(|a| a.clip == clip.key) {
            // Клип ещё затухает: разворачиваем fade обратно с текущего веса
            Some(action) => {
                action.time = 0.0;
                action.fade = Some(Fade {
                    from: action.weight,
                    to: 1.0,
                    start: now,
                    duration: fade,
                });
            }
            None => self.actions.push(MixerAction {
                clip: clip.key.clone(),
                duration: clip.duration,
                time: 0.0,
                weight: 0.0,
                fade: Some(Fade {
                    from: 0.0,
                    to: 1.0,
                    start: now,
                    duration: fade,
                }),
            }),
        }

        self.active = Some(clip.key.clone());
        true
    }

    /// Двигает play head'ы и fade'ы на `delta` секунд.
    pub fn advance(&mut self, delta: f32) {
        self.time += delta;
        let now = self.time;

        for action in self.actions.iter_mut() {
            if action.duration > 0.0 {
                action.time = (action.time + delta) % action.duration;
            }

            if let Some(fade) = action.fade {
                action.weight = fade.weight_at(now);
                if fade.finished_at(now) {
                    action.fade = None;
                }
            }
        }

        let active = self.active.clone();
        self.actions
            .retain(|action| action.weight > 0.0 || action.fade.is_some() || Some(&action.clip) == active.as_ref());
    }
}
