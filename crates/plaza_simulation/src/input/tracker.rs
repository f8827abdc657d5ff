//! Input State Tracker
//!
//! Поток: KeyboardEvent (platform) → track_keyboard_input → KeysPressed
//!                                                        ↓
//!        ActionPressed / KeyTransition / ModifierPressed / ModifierReleased
//!
//! Edge события заменяют callback-регистрацию: подписчик = система с
//! EventReader, порядок гарантирован SystemSet'ами внутри тика.

use bevy::prelude::*;

use super::keys::{Key, KeyState, KeysPressed};

/// Raw событие клавиатуры от платформенного слоя
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardEvent {
    pub key: Key,
    pub state: KeyState,
}

impl KeyboardEvent {
    pub fn pressed(key: Key) -> Self {
        Self { key, state: KeyState::Pressed }
    }

    pub fn released(key: Key) -> Self {
        Self { key, state: KeyState::Released }
    }
}

/// Action клавиша нажата (один раз на нажатие, не пока удерживается)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionPressed;

/// Любой keydown/keyup (включая auto-repeat и неизвестные клавиши).
///
/// Используется сетевым throttling'ом для подписки на атрибуты.
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    pub key: Key,
    pub state: KeyState,
}

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierPressed;

#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModifierReleased;

/// Edge'и, порождённые одним raw событием
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputEdges {
    pub action_pressed: bool,
    pub modifier_pressed: bool,
    pub modifier_released: bool,
}

/// Единственный на клиент трекер нажатых клавиш
#[derive(Resource, Debug, Default, Clone)]
pub struct InputTracker {
    keys: KeysPressed,
    modifier_held: bool,
}

impl InputTracker {
    pub fn keys_pressed(&self) -> &KeysPressed {
        &self.keys
    }

    pub fn has_any_movement_key_pressed(&self) -> bool {
        self.keys.has_any_movement_key_pressed()
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier_held
    }

    /// Применяет raw событие, возвращает порождённые edge'и.
    pub fn apply(&mut self, event: &KeyboardEvent) -> InputEdges {
        let pressed = event.state.is_pressed();
        let mut edges = InputEdges::default();

        if let Some(direction) = event.key.direction() {
            self.keys.set(direction, pressed);
            return edges;
        }

        match event.key {
            Key::Space => {
                // Auto-repeat keydown не считается новым нажатием
                edges.action_pressed = pressed && !self.keys.action;
                self.keys.action = pressed;
            }
            Key::Shift => {
                edges.modifier_pressed = pressed && !self.modifier_held;
                edges.modifier_released = !pressed && self.modifier_held;
                self.modifier_held = pressed;
            }
            _ => {}
        }

        edges
    }
}

/// Система: raw keyboard → KeysPressed + edge события
pub fn track_keyboard_input(
    mut raw_events: EventReader<KeyboardEvent>,
    mut tracker: ResMut<InputTracker>,
    mut action_events: EventWriter<ActionPressed>,
    mut transition_events: EventWriter<KeyTransition>,
    mut modifier_pressed: EventWriter<ModifierPressed>,
    mut modifier_released: EventWriter<ModifierReleased>,
) {
    for event in raw_events.read() {
        let edges = tracker.apply(event);

        if edges.action_pressed {
            action_events.write(ActionPressed);
        }
        if edges.modifier_pressed {
            modifier_pressed.write(ModifierPressed);
        }
        if edges.modifier_released {
            modifier_released.write(ModifierReleased);
        }

        transition_events.write(KeyTransition {
            key: event.key,
            state: event.state,
        });
    }
}
