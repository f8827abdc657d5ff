//! Gesture menu (удерживаемый modifier показывает список жестов)

use bevy::prelude::*;

use super::tracker::{ModifierPressed, ModifierReleased};

/// Жест: ключ анимации + название для меню
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Gesture {
    pub key: &'static str,
    pub name: &'static str,
}

pub const GESTURES: &[Gesture] = &[
    Gesture { key: "clap", name: "Hand Clap" },
    Gesture { key: "kneeling-pointing", name: "Kneeling Down" },
    Gesture { key: "angry", name: "Angry" },
    Gesture { key: "ninja", name: "Ninja" },
    Gesture { key: "boxing", name: "Boxing" },
    Gesture { key: "victory", name: "Victory" },
    Gesture { key: "flair", name: "Break Dance" },
    Gesture { key: "snake-dance", name: "Snake Dance" },
];

pub fn find_gesture(key: &str) -> Option<&'static Gesture> {
    GESTURES.iter().find(|gesture| gesture.key == key)
}

/// Видимость меню (UI читает, симуляция пишет)
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct GestureMenu {
    pub visible: bool,
}

/// UI выбрал жест для локального персонажа
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct GestureSelected {
    pub action: String,
}

/// Система: modifier press/release → показать/скрыть меню
pub fn toggle_gesture_menu(
    mut pressed: EventReader<ModifierPressed>,
    mut released: EventReader<ModifierReleased>,
    mut menu: ResMut<GestureMenu>,
) {
    if pressed.read().count() > 0 {
        menu.visible = true;
    }
    if released.read().count() > 0 {
        menu.visible = false;
    }
}
