//! Plaza Simulation Core
//!
//! ECS-симуляция аватаров multiplayer plaza на Bevy 0.16 (headless).
//!
//! Архитектура:
//! - вся gameplay логика в FixedUpdate (50Hz), порядок: SimulationSet
//! - время = тики SimClock (никаких wall-clock таймеров)
//! - рендер, socket, загрузка ассетов: внешние; симуляция общается с ними
//!   через resources (NetworkInbox/Outbox, CameraRig, ModelNode Transform'ы)

use bevy::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

// Публичные модули
pub mod animation;
pub mod character;
pub mod clock;
pub mod config;
pub mod input;
pub mod logger;
pub mod network;
pub mod physics;
pub mod scene;

// Re-export для удобства
pub use animation::{AnimationCatalog, AnimationClip, AnimationMixer, AnimationPlugin};
pub use character::{
    CharacterCatalog, CharacterControl, CharacterPlugin, CharacterRegistry, CharacterState, JumpEnded, JumpIntent,
    JumpStarted, Landed, Player,
};
pub use clock::{SimClock, Tick, FIXED_HZ, FIXED_STEP, FIXED_STEP_SECS};
pub use config::CharacterConfig;
pub use input::{GestureSelected, InputPlugin, InputTracker, Key, KeyboardEvent};
pub use logger::init_logger;
pub use network::{ClientMessage, NetworkInbox, NetworkOutbox, NetworkPlugin, ServerMessage, Session};
pub use physics::{PhysicsBody, PhysicsPlugin};
pub use scene::{CameraRig, ModelNode, ScenePlugin};

/// Порядок фаз одного тика (chain)
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimulationSet {
    /// +1 тик SimClock
    Clock,
    /// Raw keyboard → KeysPressed, edge events
    Input,
    /// Inbox → roster/snapshots/disconnects, join
    NetworkInbound,
    /// Jump фазы, spawn grace, settle задержки
    Timers,
    /// Fixed-step интеграция тел
    Physics,
    /// Mixer + выбор клипа
    Animation,
    /// Local input → body velocity, камера
    Locomotion,
    /// Модели догоняют тела, tween'ы, stabilizer
    VisualSync,
    /// character-updated → outbox
    NetworkOutbound,
}

/// Главный plugin симуляции (объединяет все подсистемы)
pub struct SimulationPlugin;

impl Plugin for SimulationPlugin {
    fn build(&self, app: &mut App) {
        // Seed мог задать create_headless_app
        if !app.world().contains_resource::<DeterministicRng>() {
            app.insert_resource(DeterministicRng::new(42));
        }

        app
            // Fixed timestep 50Hz (шаг физики персонажей)
            .insert_resource(Time::<Fixed>::from_hz(FIXED_HZ as f64))
            .init_resource::<SimClock>()
            .init_resource::<CharacterConfig>()
            .configure_sets(
                FixedUpdate,
                (
                    SimulationSet::Clock,
                    SimulationSet::Input,
                    SimulationSet::NetworkInbound,
                    SimulationSet::Timers,
                    SimulationSet::Physics,
                    SimulationSet::Animation,
                    SimulationSet::Locomotion,
                    SimulationSet::VisualSync,
                    SimulationSet::NetworkOutbound,
                )
                    .chain(),
            )
            .add_systems(FixedUpdate, clock::advance_clock.in_set(SimulationSet::Clock))
            // Подсистемы
            .add_plugins((
                InputPlugin,
                PhysicsPlugin,
                ScenePlugin,
                AnimationPlugin,
                CharacterPlugin,
                NetworkPlugin,
            ));
    }
}

/// Детерминистичный RNG resource (seeded)
#[derive(Resource)]
pub struct DeterministicRng {
    pub rng: ChaCha8Rng,
    pub seed: u64,
}

impl DeterministicRng {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            seed,
        }
    }
}

/// Создаёт minimal Bevy App для headless симуляции
///
/// Ресурсы (CharacterConfig, AnimationCatalog, CharacterCatalog) можно
/// подменить после создания, до первого тика.
pub fn create_headless_app(seed: u64) -> App {
    let mut app = App::new();
    init_logger();
    app.add_plugins(MinimalPlugins)
        .insert_resource(DeterministicRng::new(seed))
        .add_plugins(SimulationPlugin);

    // Тики гоняются через advance_ticks, Main schedule не запускается:
    // Startup (пол) прогоняем сами
    app.world_mut().run_schedule(Startup);

    app
}

/// Прогоняет `ticks` тиков FixedUpdate напрямую (без wall-clock)
///
/// First не запускается, поэтому буферы событий переключаются здесь:
/// событие живёт текущий и следующий тик, как в обычном App.
pub fn advance_ticks(app: &mut App, ticks: u32) {
    for _ in 0..ticks {
        update_simulation_events(app.world_mut());
        app.world_mut().run_schedule(FixedUpdate);
    }
}

/// Double-buffer swap всех событий симуляции
fn update_simulation_events(world: &mut World) {
    fn swap<E: Event>(world: &mut World) {
        if let Some(mut events) = world.get_resource_mut::<Events<E>>() {
            events.update();
        }
    }

    swap::<input::KeyboardEvent>(world);
    swap::<input::ActionPressed>(world);
    swap::<input::KeyTransition>(world);
    swap::<input::ModifierPressed>(world);
    swap::<input::ModifierReleased>(world);
    swap::<input::GestureSelected>(world);
    swap::<character::JumpIntent>(world);
    swap::<character::JumpStarted>(world);
    swap::<character::JumpEnded>(world);
    swap::<character::Landed>(world);
    swap::<network::SnapshotReceived>(world);
    swap::<network::DisconnectReceived>(world);
}
