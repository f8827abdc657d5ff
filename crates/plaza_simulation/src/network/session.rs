//! Session: кто мы (userId, имя персонажа) и на каком этапе join'а

use bevy::prelude::*;
use rand::Rng;

use crate::character::{spawn_character, CharacterCatalog, CharacterRegistry, SpawnCharacter};
use crate::clock::SimClock;
use crate::config::CharacterConfig;
use crate::logger;
use crate::DeterministicRng;

use super::outbound::AttributeFeed;
use super::transport::NetworkOutbox;
use super::wire::{ClientMessage, Joined, UserSnapshot};

/// `user-<16 hex>`
pub fn generate_user_id(rng: &mut impl Rng) -> String {
    format!("user-{:016x}", rng.gen::<u64>())
}

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    /// Выбирается по первому roster batch'у
    pub character_name: Option<String>,
    pub roster_requested: bool,
    pub joined: bool,
}

impl Session {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            character_name: None,
            roster_requested: false,
            joined: false,
        }
    }

    /// Наименее представленное имя среди других пользователей
    pub fn choose_character_name(&mut self, catalog: &CharacterCatalog, others: &[UserSnapshot]) {
        let occupied = others.iter().filter_map(|user| user.character_name.as_deref());

        match catalog.least_used_name(occupied) {
            Some(name) => {
                logger::log_info(&format!("{} plays as {}", self.user_id, name));
                self.character_name = Some(name.to_string());
            }
            None => logger::log_error("character catalog is empty, cannot join"),
        }
    }
}

impl FromWorld for Session {
    fn from_world(world: &mut World) -> Self {
        let mut rng = world.get_resource_or_insert_with(|| DeterministicRng::new(42));
        Self::new(generate_user_id(&mut rng.rng))
    }
}

/// Система: один `request-characters-data` за сессию
pub fn request_roster(mut session: ResMut<Session>, mut outbox: ResMut<NetworkOutbox>) {
    if session.roster_requested {
        return;
    }
    session.roster_requested = true;
    outbox.send(ClientMessage::RequestCharactersData);
}

/// Система: имя выбрано → спавн локального персонажа, затем `joined`
///
/// Первый полный `character-updated` уходит в NetworkOutbound этого же тика
/// (AttributeFeed.announce).
pub fn join_plaza(
    mut commands: Commands,
    mut session: ResMut<Session>,
    mut registry: ResMut<CharacterRegistry>,
    mut outbox: ResMut<NetworkOutbox>,
    catalog: Res<CharacterCatalog>,
    config: Res<CharacterConfig>,
    clock: Res<SimClock>,
) {
    if session.joined {
        return;
    }
    let Some(name) = session.character_name.clone() else {
        return;
    };

    session.joined = true;

    let request = SpawnCharacter::local(session.user_id.clone(), name.clone(), config.spawn_position);
    match spawn_character(&mut commands, &mut registry, &catalog, &config, &clock, request) {
        Ok(entity) => {
            commands.entity(entity).insert(AttributeFeed::announcing());
            outbox.send(ClientMessage::Joined(Joined {
                user_id: session.user_id.clone(),
                character_name: name,
            }));
        }
        // Без аватара не объявляемся; сессия продолжается
        Err(err) => logger::log_error(&format!("local character not loaded: {}", err)),
    }
}
