//! Animation domain: catalog, cross-fade mixer, state → clip selection
//!
//! Содержит:
//! - AnimationCatalog (resource, заполняется loader'ом)
//! - AnimationMixer (component на каждом персонаже)
//! - select_animation (чистая функция CharacterState → клип)
//! - JumpAnimationReturn (возврат к idle/run после running-jump клипа)

use bevy::prelude::*;

use crate::character::{CharacterControl, CharacterState};
use crate::clock::{SimClock, Tick, FIXED_STEP_SECS};
use crate::config::CharacterConfig;
use crate::logger;
use crate::SimulationSet;

pub mod catalog;
pub mod mixer;
pub mod selector;

pub use catalog::{AnimationCatalog, AnimationClip, FALL, IDLE, JUMP, LOCOMOTION_CLIPS, RUN, RUNNING_JUMP};
pub use mixer::{AnimationMixer, MixerAction};
pub use selector::{default_clip, select_animation, AnimationChoice};

/// Когда вернуться к default клипу после running-jump.
///
/// `None`: возврат не запланирован. Новый jump клип перезаписывает срок.
#[derive(Component, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JumpAnimationReturn(pub Option<Tick>);

/// Animation Plugin
///
/// Система `animate_characters` в `SimulationSet::Animation`,
/// для local и remote персонажей.
pub struct AnimationPlugin;

impl Plugin for AnimationPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<AnimationCatalog>();

        app.add_systems(FixedUpdate, animate_characters.in_set(SimulationSet::Animation));
    }
}

/// Система: jump return → mixer.advance → select_animation → play
pub fn animate_characters(
    clock: Res<SimClock>,
    catalog: Res<AnimationCatalog>,
    config: Res<CharacterConfig>,
    mut characters: Query<(
        &CharacterControl,
        &mut CharacterState,
        &mut AnimationMixer,
        &mut JumpAnimationReturn,
    )>,
) {
    for (control, mut state, mut mixer, mut jump_return) in characters.iter_mut() {
        if let Some(due) = jump_return.0 {
            if clock.is_due(due) {
                jump_return.0 = None;

                // Remote персонаж не получает JumpEnded локально: флаги чистит возврат
                if !control.is_my_character {
                    state.is_start_jumping = false;
                    state.is_jumping = false;
                }

                if let Some(clip) = catalog.get(default_clip(&state)) {
                    mixer.play(clip, config.fade_seconds);
                }
            }
        }

        mixer.advance(FIXED_STEP_SECS);

        let AnimationChoice::Play(key) = select_animation(&state) else {
            continue;
        };

        // Missing clip: оставляем текущий
        let Some(clip) = catalog.get(&key) else {
            continue;
        };

        if mixer.play(clip, config.fade_seconds) && key == RUNNING_JUMP {
            // Битая длительность клипа (inf/NaN) → возврат сразу
            let lead = (clip.duration - config.jump_return_lead_seconds).max(0.0);
            let lead = std::time::Duration::try_from_secs_f32(lead).unwrap_or_default();
            jump_return.0 = Some(clock.deadline_after(lead));

            logger::log(&format!(
                "{}: running-jump, return to default at tick {:?}",
                control.user_id, jump_return.0
            ));
        }
    }
}
