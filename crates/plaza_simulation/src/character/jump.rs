//! Jump state machine
//!
//! `Grounded → StartJumping (wind-up) → Jumping (airborne) → Grounded`,
//! плюс one-shot spawn переход `Falling → Grounded` (SpawnGrace).
//!
//! Фазы хранят tick deadline'ы (SimClock), без wall-clock таймеров.
//! Despawned персонаж просто исчезает из query: pending переходы no-op.

use bevy::prelude::*;

use crate::clock::{SimClock, Tick};
use crate::config::CharacterConfig;
use crate::input::ActionPressed;
use crate::logger;
use crate::physics::PhysicsBody;

use super::state::CharacterState;
use super::{CharacterControl, CharacterRegistry, Player};

/// Event: намерение прыгнуть
///
/// Генерируется:
/// - request_jump_from_input (action key edge)
///
/// Обрабатывается:
/// - start_jumps: Grounded → StartJumping (иначе игнорируется)
#[derive(Event, Debug, Clone)]
pub struct JumpIntent {
    pub entity: Entity,
}

/// Hook: wind-up начался (onStartJumping)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpStarted {
    pub entity: Entity,
}

/// Hook: airborne окно закончилось (onEndJumping)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct JumpEnded {
    pub entity: Entity,
}

/// Hook: spawn grace истёк, персонаж приземлился (onLanding)
#[derive(Event, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Landed {
    pub entity: Entity,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JumpPhase {
    #[default]
    Grounded,
    /// Wind-up: импульс на `ends_at`
    StartJumping { ends_at: Tick },
    /// В воздухе до `ends_at`
    Jumping { ends_at: Tick },
}

/// Переход, случившийся на этом тике
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JumpTransition {
    Takeoff,
    Touchdown,
}

/// Jump машина локального персонажа.
///
/// Флаги `is_start_jumping` / `is_jumping` в CharacterState: зеркало фазы.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct JumpMachine {
    phase: JumpPhase,
}

impl JumpMachine {
    pub fn phase(&self) -> JumpPhase {
        self.phase
    }

    /// Grounded + action edge → StartJumping.
    ///
    /// `false` если уже прыгаем или ещё падаем после спавна.
    pub fn try_start(&mut self, state: &mut CharacterState, clock: &SimClock, windup: std::time::Duration) -> bool {
        if self.phase != JumpPhase::Grounded || state.is_mid_jump() || state.is_falling {
            return false;
        }

        self.phase = JumpPhase::StartJumping {
            ends_at: clock.deadline_after(windup),
        };
        state.clear_action();
        state.is_start_jumping = true;
        true
    }

    /// Двигает фазу, если её deadline наступил.
    pub fn tick(
        &mut self,
        state: &mut CharacterState,
        clock: &SimClock,
        airborne: std::time::Duration,
    ) -> Option<JumpTransition> {
        match self.phase {
            JumpPhase::StartJumping { ends_at } if clock.is_due(ends_at) => {
                self.phase = JumpPhase::Jumping {
                    ends_at: clock.deadline_after(airborne),
                };
                state.is_start_jumping = false;
                state.is_jumping = true;
                Some(JumpTransition::Takeoff)
            }
            JumpPhase::Jumping { ends_at } if clock.is_due(ends_at) => {
                self.phase = JumpPhase::Grounded;
                state.is_jumping = false;
                Some(JumpTransition::Touchdown)
            }
            _ => None,
        }
    }
}

/// Один раз за жизнь персонажа: falling → landed
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnGrace {
    pub lands_at: Option<Tick>,
}

/// Система: action edge → JumpIntent для локального персонажа
pub fn request_jump_from_input(
    mut actions: EventReader<ActionPressed>,
    registry: Res<CharacterRegistry>,
    mut intents: EventWriter<JumpIntent>,
) {
    for _ in actions.read() {
        if let Some(entity) = registry.local() {
            intents.write(JumpIntent { entity });
        }
    }
}

/// Система: JumpIntent → wind-up (onStartJumping)
pub fn start_jumps(
    mut intents: EventReader<JumpIntent>,
    clock: Res<SimClock>,
    config: Res<CharacterConfig>,
    mut jumpers: Query<(&mut JumpMachine, &mut CharacterState), With<Player>>,
    mut started: EventWriter<JumpStarted>,
) {
    for intent in intents.read() {
        let Ok((mut machine, mut state)) = jumpers.get_mut(intent.entity) else {
            continue;
        };

        if machine.try_start(&mut state, &clock, config.jump_windup) {
            logger::log(&format!("jump wind-up started at tick {}", clock.now()));
            started.write(JumpStarted { entity: intent.entity });
        }
    }
}

/// Система: wind-up → импульс вверх → airborne → Grounded (onEndJumping)
pub fn advance_jump_phases(
    clock: Res<SimClock>,
    config: Res<CharacterConfig>,
    mut jumpers: Query<(Entity, &CharacterControl, &mut JumpMachine, &mut CharacterState)>,
    mut bodies: Query<&mut PhysicsBody>,
    mut ended: EventWriter<JumpEnded>,
) {
    for (entity, control, mut machine, mut state) in jumpers.iter_mut() {
        match machine.tick(&mut state, &clock, config.jump_airborne) {
            Some(JumpTransition::Takeoff) => {
                if let Ok(mut body) = bodies.get_mut(control.body) {
                    body.velocity.y = config.jump_impulse;
                }
            }
            Some(JumpTransition::Touchdown) => {
                logger::log(&format!("jump ended at tick {}", clock.now()));
                ended.write(JumpEnded { entity });
            }
            None => {}
        }
    }
}

/// Система: spawn grace истёк → is_falling = false, onLanding (ровно один раз)
pub fn land_after_spawn_grace(
    clock: Res<SimClock>,
    mut characters: Query<(Entity, &CharacterControl, &mut SpawnGrace, &mut CharacterState)>,
    mut landed: EventWriter<Landed>,
) {
    for (entity, control, mut grace, mut state) in characters.iter_mut() {
        let Some(lands_at) = grace.lands_at else {
            continue;
        };
        if !clock.is_due(lands_at) {
            continue;
        }

        grace.lands_at = None;
        state.is_falling = false;

        logger::log(&format!("{} landed", control.user_id));
        landed.write(Landed { entity });
    }
}
