//! Animation Selector: CharacterState → какой клип играть

use crate::character::CharacterState;

use super::catalog::{FALL, IDLE, RUN, RUNNING_JUMP};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnimationChoice {
    /// В воздухе: оставить то, что играет
    Hold,
    Play(String),
}

/// Приоритет: jumping (sticky) → falling → жест → wind-up → idle/run.
pub fn select_animation(state: &CharacterState) -> AnimationChoice {
    if state.is_jumping {
        return AnimationChoice::Hold;
    }

    let key = if state.is_falling {
        FALL.to_string()
    } else if let Some(action) = &state.action {
        action.clone()
    } else if state.is_start_jumping {
        RUNNING_JUMP.to_string()
    } else {
        default_clip(state).to_string()
    };

    AnimationChoice::Play(key)
}

/// Idle на месте, run в движении
pub fn default_clip(state: &CharacterState) -> &'static str {
    if state.is_moving {
        RUN
    } else {
        IDLE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn play(key: &str) -> AnimationChoice {
        AnimationChoice::Play(key.to_string())
    }

    #[test]
    fn test_jumping_is_sticky() {
        let state = CharacterState {
            is_jumping: true,
            is_falling: true,
            action: Some("clap".into()),
            ..Default::default()
        };
        assert_eq!(select_animation(&state), AnimationChoice::Hold);
    }

    #[test]
    fn test_priority_order() {
        let mut state = CharacterState {
            is_falling: true,
            is_start_jumping: true,
            is_moving: true,
            action: Some("boxing".into()),
            ..Default::default()
        };
        assert_eq!(select_animation(&state), play(FALL));

        state.is_falling = false;
        assert_eq!(select_animation(&state), play("boxing"));

        state.action = None;
        assert_eq!(select_animation(&state), play(RUNNING_JUMP));

        state.is_start_jumping = false;
        assert_eq!(select_animation(&state), play(RUN));

        state.is_moving = false;
        assert_eq!(select_animation(&state), play(IDLE));
    }
}
