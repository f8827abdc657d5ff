//! Inbox/outbox между socket слоем и симуляцией
//!
//! Socket (внешний) кладёт сырые JSON строки в `NetworkInbox` и забирает
//! `ClientMessage` из `NetworkOutbox`. Всё остальное: внутри тика.

use bevy::prelude::*;
use std::collections::VecDeque;

use crate::character::CharacterCatalog;
use crate::logger;

use super::roster::RosterSync;
use super::session::Session;
use super::wire::{decode_server, encode, ClientMessage, ProtocolError, ServerMessage, UserSnapshot};

/// Входящие сообщения, ещё не разобранные
#[derive(Resource, Debug, Default)]
pub struct NetworkInbox {
    raw: VecDeque<String>,
}

impl NetworkInbox {
    pub fn push_raw(&mut self, raw: impl Into<String>) {
        self.raw.push_back(raw.into());
    }

    pub fn push(&mut self, message: &ServerMessage) -> Result<(), ProtocolError> {
        self.raw.push_back(encode(message)?);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.raw.len()
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    fn drain(&mut self) -> impl Iterator<Item = String> + '_ {
        self.raw.drain(..)
    }
}

/// Исходящие сообщения (socket слой забирает через drain)
#[derive(Resource, Debug, Default)]
pub struct NetworkOutbox {
    messages: Vec<ClientMessage>,
}

impl NetworkOutbox {
    pub fn send(&mut self, message: ClientMessage) {
        logger::log(&format!("-> {}", message.event_name()));
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ClientMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn drain(&mut self) -> Vec<ClientMessage> {
        std::mem::take(&mut self.messages)
    }

    /// Drain в JSON; сообщения, которые не сериализуются, логируются и теряются
    pub fn drain_encoded(&mut self) -> Vec<String> {
        self.drain()
            .iter()
            .filter_map(|message| match encode(message) {
                Ok(raw) => Some(raw),
                Err(err) => {
                    logger::log_error(&format!("dropping {}: {}", message.event_name(), err));
                    None
                }
            })
            .collect()
    }
}

/// Event: snapshot удалённого пользователя (из roster или одиночный)
#[derive(Event, Debug, Clone, PartialEq)]
pub struct SnapshotReceived {
    pub snapshot: UserSnapshot,
}

/// Event: сервер сообщил об отключении пользователя
#[derive(Event, Debug, Clone, PartialEq, Eq)]
pub struct DisconnectReceived {
    pub user_id: String,
}

/// Система: raw JSON → typed события / roster batch
///
/// Malformed сообщения логируются и отбрасываются.
pub fn dispatch_inbound(
    mut inbox: ResMut<NetworkInbox>,
    mut session: ResMut<Session>,
    mut roster: ResMut<RosterSync>,
    catalog: Res<CharacterCatalog>,
    mut snapshots: EventWriter<SnapshotReceived>,
    mut disconnects: EventWriter<DisconnectReceived>,
) {
    for raw in inbox.drain() {
        let message = match decode_server(&raw) {
            Ok(message) => message,
            Err(err) => {
                logger::log_warning(&format!("ignoring inbound message: {}", err));
                continue;
            }
        };

        match message {
            ServerMessage::UpdateCharactersData(users) => {
                if roster.is_in_progress() {
                    logger::log(&format!("roster batch of {} dropped: previous still applying", users.len()));
                    continue;
                }

                let others: Vec<UserSnapshot> = users
                    .into_iter()
                    .filter(|user| user.user_id != session.user_id)
                    .collect();

                if session.character_name.is_none() {
                    session.choose_character_name(&catalog, &others);
                }

                roster.begin(others);
            }
            ServerMessage::UpdateCharacterData(snapshot) => {
                if snapshot.user_id == session.user_id {
                    continue;
                }
                // Пользователь ещё в очереди roster'а: применится вместе с ней
                if let Some(snapshot) = roster.absorb(snapshot) {
                    snapshots.write(SnapshotReceived { snapshot });
                }
            }
            ServerMessage::CharacterDisconnected(user) => {
                if user.user_id == session.user_id {
                    logger::log_warning("server reported own disconnect; keeping local character");
                    continue;
                }
                // Ещё в очереди roster'а: не спавним вовсе
                if roster.forget(&user.user_id) {
                    logger::log(&format!("{} left before roster applied them", user.user_id));
                }
                disconnects.write(DisconnectReceived { user_id: user.user_id });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::CharacterState;
    use crate::network::wire::{CharacterAttributes, CharacterUpdated};

    #[test]
    fn test_outbox_drain_empties() {
        let mut outbox = NetworkOutbox::default();
        outbox.send(ClientMessage::RequestCharactersData);
        outbox.send(ClientMessage::CharacterUpdated(CharacterUpdated {
            attributes: CharacterAttributes {
                velocity: Default::default(),
                quaternion: Default::default(),
                position: Some(Vec3::new(0.0, 1.8, 0.0).into()),
                state: CharacterState::default(),
            },
            user_id: "me".into(),
        }));

        let encoded = outbox.drain_encoded();
        assert_eq!(encoded.len(), 2);
        assert_eq!(encoded[0], r#"{"event":"request-characters-data"}"#);
        assert!(encoded[1].contains(r#""position":{"x":0.0,"y":1.8,"z":0.0}"#));
        assert!(outbox.is_empty());
    }

    #[test]
    fn test_inbox_push_encodes() {
        let mut inbox = NetworkInbox::default();
        inbox.push(&ServerMessage::UpdateCharactersData(Vec::new())).unwrap();
        inbox.push_raw("garbage");
        assert_eq!(inbox.len(), 2);
        assert_eq!(
            inbox.drain().next().as_deref(),
            Some(r#"{"event":"update-characters-data","data":[]}"#)
        );
    }
}
