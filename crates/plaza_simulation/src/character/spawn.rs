//! Character lifecycle: load (spawn) / destroy (despawn)

use bevy::prelude::*;

use crate::animation::{AnimationMixer, JumpAnimationReturn};
use crate::clock::SimClock;
use crate::config::CharacterConfig;
use crate::logger;
use crate::physics::spawn_character_body;
use crate::scene::ModelNode;

use super::catalog::{CharacterCatalog, SpawnError};
use super::jump::{JumpMachine, SpawnGrace};
use super::state::CharacterState;
use super::{CharacterControl, CharacterHandles, CharacterRegistry, FacingRotation, Player};

/// Что загрузить: имя + look из каталога, где поставить, чей персонаж
#[derive(Debug, Clone, PartialEq)]
pub struct SpawnCharacter {
    pub user_id: String,
    pub character_name: String,
    pub look: usize,
    /// Позиция ног модели (центр body на radius выше)
    pub position: Vec3,
    pub rotation: Quat,
    pub is_my_character: bool,
}

impl SpawnCharacter {
    pub fn remote(user_id: impl Into<String>, character_name: impl Into<String>, position: Vec3) -> Self {
        Self {
            user_id: user_id.into(),
            character_name: character_name.into(),
            look: 0,
            position,
            rotation: Quat::IDENTITY,
            is_my_character: false,
        }
    }

    pub fn local(user_id: impl Into<String>, character_name: impl Into<String>, position: Vec3) -> Self {
        Self {
            is_my_character: true,
            ..Self::remote(user_id, character_name, position)
        }
    }
}

/// Спавнит character + body + model и регистрирует userId.
///
/// Персонаж появляется в состоянии falling; landing через `landing_grace`.
/// Уже зарегистрированный userId возвращает существующий entity.
pub fn spawn_character(
    commands: &mut Commands,
    registry: &mut CharacterRegistry,
    catalog: &CharacterCatalog,
    config: &CharacterConfig,
    clock: &SimClock,
    request: SpawnCharacter,
) -> Result<Entity, SpawnError> {
    if let Some(existing) = registry.get(&request.user_id) {
        logger::log_warning(&format!("character {} already spawned", request.user_id));
        return Ok(existing);
    }

    let source = catalog.find_look(&request.character_name, request.look)?;

    let body = spawn_character_body(commands, request.position, config);
    let model = commands
        .spawn((
            ModelNode {
                name: format!("character-{}", request.user_id),
                source: source.to_string(),
            },
            Transform::from_translation(request.position).with_rotation(request.rotation),
        ))
        .id();

    let mut character = commands.spawn((
        CharacterControl {
            user_id: request.user_id.clone(),
            character_name: request.character_name.clone(),
            body,
            model,
            is_my_character: request.is_my_character,
        },
        CharacterState::spawned(),
        FacingRotation(request.rotation),
        AnimationMixer::default(),
        JumpAnimationReturn::default(),
        SpawnGrace {
            lands_at: Some(clock.deadline_after(config.landing_grace)),
        },
    ));

    if request.is_my_character {
        character.insert((Player, JumpMachine::default()));
    }

    let handles = CharacterHandles {
        character: character.id(),
        body,
        model,
    };
    registry.insert(&request.user_id, handles, request.is_my_character);

    logger::log_info(&format!(
        "spawned {} character {} ({}) at {:?}",
        if request.is_my_character { "local" } else { "remote" },
        request.user_id,
        request.character_name,
        request.position
    ));

    Ok(handles.character)
}

/// Удаляет персонажа, его body и model. Неизвестный userId: no-op.
///
/// Возвращает `true`, если персонаж был.
pub fn despawn_character(commands: &mut Commands, registry: &mut CharacterRegistry, user_id: &str) -> bool {
    let Some(handles) = registry.remove(user_id) else {
        return false;
    };

    commands.entity(handles.body).despawn();
    commands.entity(handles.model).despawn();
    commands.entity(handles.character).despawn();

    logger::log_info(&format!("destroyed character {}", user_id));
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::PhysicsBody;
    use bevy::ecs::system::RunSystemOnce;

    fn setup_world() -> World {
        let mut world = World::new();
        world.insert_resource(CharacterRegistry::default());
        world.insert_resource(CharacterCatalog::default_roster());
        world.insert_resource(CharacterConfig::default());
        world.insert_resource(SimClock::default());
        world
    }

    fn spawn(world: &mut World, request: SpawnCharacter) -> Result<Entity, SpawnError> {
        world
            .run_system_once(
                move |mut commands: Commands,
                      mut registry: ResMut<CharacterRegistry>,
                      catalog: Res<CharacterCatalog>,
                      config: Res<CharacterConfig>,
                      clock: Res<SimClock>| {
                    spawn_character(&mut commands, &mut registry, &catalog, &config, &clock, request.clone())
                },
            )
            .unwrap()
    }

    fn despawn(world: &mut World, user_id: &'static str) -> bool {
        world
            .run_system_once(move |mut commands: Commands, mut registry: ResMut<CharacterRegistry>| {
                despawn_character(&mut commands, &mut registry, user_id)
            })
            .unwrap()
    }

    #[test]
    fn test_spawn_creates_body_and_model() {
        let mut world = setup_world();
        let entity = spawn(&mut world, SpawnCharacter::local("me", "Jane", Vec3::new(0.0, 50.0, 30.0))).unwrap();

        let control = world.get::<CharacterControl>(entity).unwrap().clone();
        assert!(control.is_my_character);
        assert!(world.get::<Player>(entity).is_some());
        assert!(world.get::<CharacterState>(entity).unwrap().is_falling);

        let body = world.get::<PhysicsBody>(control.body).unwrap();
        assert_eq!(body.position, Vec3::new(0.0, 51.8, 30.0));

        let model = world.get::<ModelNode>(control.model).unwrap();
        assert_eq!(model.name, "character-me");

        let registry = world.resource::<CharacterRegistry>();
        assert_eq!(registry.local(), Some(entity));
        // 1500 ms = 75 тиков
        assert_eq!(world.get::<SpawnGrace>(entity).unwrap().lands_at, Some(75));
    }

    #[test]
    fn test_unknown_character_is_missing_asset() {
        let mut world = setup_world();
        let result = spawn(&mut world, SpawnCharacter::remote("other", "Nobody", Vec3::ZERO));

        assert_eq!(result, Err(SpawnError::UnknownCharacter("Nobody".into())));
        assert!(world.resource::<CharacterRegistry>().is_empty());
    }

    #[test]
    fn test_destroy_removes_everything_once() {
        let mut world = setup_world();
        let entity = spawn(&mut world, SpawnCharacter::remote("other", "Han", Vec3::ZERO)).unwrap();
        let control = world.get::<CharacterControl>(entity).unwrap().clone();

        assert!(despawn(&mut world, "other"));
        assert!(world.get_entity(entity).is_err());
        assert!(world.get_entity(control.body).is_err());
        assert!(world.get_entity(control.model).is_err());

        assert!(!despawn(&mut world, "other"));
    }
}
