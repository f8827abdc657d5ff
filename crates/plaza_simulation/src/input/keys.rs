//! Keyboard keys и pressed-set

use bevy::prelude::*;

/// Клавиши, которые интересуют симуляцию.
///
/// Платформенный слой маппит свои коды в `Key` (или через `Key::from_dom_key`
/// для браузерных `KeyboardEvent.key` строк).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Reflect)]
pub enum Key {
    W,
    S,
    A,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    /// Action (прыжок)
    Space,
    /// Modifier (gesture menu)
    Shift,
    Other,
}

/// Направление движения (4 флага KeysPressed)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveDirection {
    Forward,
    Back,
    Left,
    Right,
}

impl Key {
    /// DOM `KeyboardEvent.key` → Key (регистр не важен)
    pub fn from_dom_key(name: &str) -> Self {
        match name.to_ascii_lowercase().as_str() {
            "w" => Key::W,
            "s" => Key::S,
            "a" => Key::A,
            "d" => Key::D,
            "arrowup" => Key::ArrowUp,
            "arrowdown" => Key::ArrowDown,
            "arrowleft" => Key::ArrowLeft,
            "arrowright" => Key::ArrowRight,
            " " | "space" => Key::Space,
            "shift" => Key::Shift,
            _ => Key::Other,
        }
    }

    /// Буква и стрелка: алиасы одного направления
    pub fn direction(self) -> Option<MoveDirection> {
        match self {
            Key::W | Key::ArrowUp => Some(MoveDirection::Forward),
            Key::S | Key::ArrowDown => Some(MoveDirection::Back),
            Key::A | Key::ArrowLeft => Some(MoveDirection::Left),
            Key::D | Key::ArrowRight => Some(MoveDirection::Right),
            _ => None,
        }
    }
}

/// Pressed/released состояние
#[derive(Debug, Clone, Copy, PartialEq, Eq, Reflect)]
pub enum KeyState {
    Pressed,
    Released,
}

impl KeyState {
    pub fn is_pressed(self) -> bool {
        matches!(self, KeyState::Pressed)
    }
}

/// Четыре флага направления + action.
///
/// Мутирует только `InputTracker`; locomotion и camera-direction читают.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Reflect)]
pub struct KeysPressed {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
    pub action: bool,
}

impl KeysPressed {
    pub fn set(&mut self, direction: MoveDirection, pressed: bool) {
        match direction {
            MoveDirection::Forward => self.forward = pressed,
            MoveDirection::Back => self.back = pressed,
            MoveDirection::Left => self.left = pressed,
            MoveDirection::Right => self.right = pressed,
        }
    }

    pub fn has_any_movement_key_pressed(&self) -> bool {
        self.forward || self.back || self.left || self.right
    }

    /// Строит набор из списка направлений (удобно для тестов/реплеев)
    pub fn from_directions(directions: &[MoveDirection]) -> Self {
        let mut keys = Self::default();
        for direction in directions {
            keys.set(*direction, true);
        }
        keys
    }
}
