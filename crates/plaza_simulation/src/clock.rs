//! Logical simulation clock
//!
//! Все задержки (jump фазы, heartbeat, settle, tween) считаются в тиках
//! FixedUpdate, а не в wall-clock. Один тик = `FIXED_STEP`.
//! Тесты двигают время детерминированно через `advance_ticks`.

use bevy::prelude::*;
use std::time::Duration;

/// Частота физики и логики персонажей (Hz)
pub const FIXED_HZ: u32 = 50;

/// Длительность одного тика (1/50 s)
pub const FIXED_STEP: Duration = Duration::from_millis(1000 / FIXED_HZ as u64);

/// Шаг в секундах (для интеграции velocity/mixer)
pub const FIXED_STEP_SECS: f32 = 1.0 / FIXED_HZ as f32;

/// Номер тика симуляции
pub type Tick = u64;

/// Счётчик тиков. Единственный источник времени для gameplay логики.
#[derive(Resource, Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SimClock {
    tick: Tick,
}

impl SimClock {
    pub fn now(&self) -> Tick {
        self.tick
    }

    pub fn elapsed(&self) -> Duration {
        FIXED_STEP * self.tick as u32
    }

    /// Тик, на котором истекает задержка `delay`, отсчитанная от текущего.
    ///
    /// Округление вверх: задержка никогда не срабатывает раньше срока.
    pub fn deadline_after(&self, delay: Duration) -> Tick {
        self.tick + ticks_for(delay)
    }

    pub fn is_due(&self, deadline: Tick) -> bool {
        self.tick >= deadline
    }

    pub(crate) fn advance(&mut self) {
        self.tick += 1;
    }
}

/// Количество целых тиков, покрывающих `delay` (ceil).
pub fn ticks_for(delay: Duration) -> Tick {
    let step = FIXED_STEP.as_nanos();
    delay.as_nanos().div_ceil(step) as Tick
}

/// Система: +1 тик в начале каждого FixedUpdate
pub fn advance_clock(mut clock: ResMut<SimClock>) {
    clock.advance();
}
