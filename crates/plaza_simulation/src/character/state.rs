//! CharacterState: в каком animation/physics режиме персонаж

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

/// Статус персонажа; сериализуется в сетевой snapshot как есть.
///
/// Инварианты:
/// - не больше одного из {is_start_jumping, is_jumping, is_falling}
/// - is_falling true только в spawn grace периоде, сбрасывается один раз
#[derive(Component, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Reflect)]
#[reflect(Component)]
#[serde(default, rename_all = "camelCase")]
pub struct CharacterState {
    pub is_moving: bool,
    pub is_start_jumping: bool,
    pub is_jumping: bool,
    pub is_falling: bool,
    /// Активный жест (ключ анимации)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

impl CharacterState {
    /// Состояние сразу после спавна: падаем на пол
    pub fn spawned() -> Self {
        Self {
            is_falling: true,
            ..default()
        }
    }

    /// Wind-up или в воздухе
    pub fn is_mid_jump(&self) -> bool {
        self.is_start_jumping || self.is_jumping
    }

    /// Удалённое состояние, которое надо применить без settle задержки
    pub fn is_urgent(&self) -> bool {
        self.is_moving || self.is_start_jumping
    }

    pub fn clear_action(&mut self) {
        self.action = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spawned_state_is_falling_only() {
        let state = CharacterState::spawned();
        assert!(state.is_falling);
        assert!(!state.is_mid_jump());
        assert!(!state.is_moving);
    }

    #[test]
    fn test_wire_format_is_camel_case() {
        let state = CharacterState {
            is_moving: true,
            ..default()
        };
        let json = serde_json::to_value(&state).unwrap();

        assert_eq!(json["isMoving"], true);
        assert_eq!(json["isStartJumping"], false);
        assert!(json.get("action").is_none());
    }

    #[test]
    fn test_partial_state_fills_defaults() {
        let state: CharacterState =
            serde_json::from_str(r#"{ "isStartJumping": true, "action": "clap" }"#).unwrap();

        assert!(state.is_start_jumping);
        assert!(!state.is_falling);
        assert_eq!(state.action.as_deref(), Some("clap"));
        assert!(state.is_urgent());
    }
}
