//! Input domain: keyboard state и edge события
//!
//! Содержит:
//! - Key / KeysPressed (pressed-set)
//! - InputTracker (resource) + track_keyboard_input
//! - ActionPressed, KeyTransition, ModifierPressed/Released (edge events)
//! - GestureMenu + GestureSelected

use bevy::prelude::*;

use crate::SimulationSet;

pub mod gesture;
pub mod keys;
pub mod tracker;

pub use gesture::{find_gesture, Gesture, GestureMenu, GestureSelected, GESTURES};
pub use keys::{Key, KeyState, KeysPressed, MoveDirection};
pub use tracker::{
    ActionPressed, InputTracker, KeyTransition, KeyboardEvent, ModifierPressed, ModifierReleased,
};

/// Input Plugin
///
/// Регистрирует input события и системы в `SimulationSet::Input`.
/// Порядок выполнения:
/// 1. track_keyboard_input: raw → KeysPressed + edge events
/// 2. toggle_gesture_menu: modifier edges → GestureMenu
pub struct InputPlugin;

impl Plugin for InputPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<InputTracker>()
            .init_resource::<GestureMenu>()
            .add_event::<KeyboardEvent>()
            .add_event::<ActionPressed>()
            .add_event::<KeyTransition>()
            .add_event::<ModifierPressed>()
            .add_event::<ModifierReleased>()
            .add_event::<GestureSelected>();

        app.add_systems(
            FixedUpdate,
            (tracker::track_keyboard_input, gesture::toggle_gesture_menu)
                .chain()
                .in_set(SimulationSet::Input),
        );
    }
}
