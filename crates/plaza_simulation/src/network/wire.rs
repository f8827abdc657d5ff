//! Wire format: JSON события `{ "event": "...", "data": ... }`
//!
//! Имена событий kebab-case, поля camelCase. Все поля snapshot'а,
//! кроме userId, опциональны: отсутствующее поле = "без изменений".

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::character::CharacterState;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("encode error: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("malformed message: {0}")]
    Decode(#[source] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WireVec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Vec3> for WireVec3 {
    fn from(value: Vec3) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
        }
    }
}

impl From<WireVec3> for Vec3 {
    fn from(value: WireVec3) -> Self {
        Vec3::new(value.x, value.y, value.z)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireQuat {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub w: f32,
}

impl Default for WireQuat {
    fn default() -> Self {
        Quat::IDENTITY.into()
    }
}

impl From<Quat> for WireQuat {
    fn from(value: Quat) -> Self {
        Self {
            x: value.x,
            y: value.y,
            z: value.z,
            w: value.w,
        }
    }
}

impl From<WireQuat> for Quat {
    fn from(value: WireQuat) -> Self {
        let quat = Quat::from_xyzw(value.x, value.y, value.z, value.w);
        // Нулевой кватернион от кривого клиента
        if quat.length_squared() > f32::EPSILON {
            quat.normalize()
        } else {
            Quat::IDENTITY
        }
    }
}

/// Snapshot локального персонажа для `character-updated`.
///
/// `position` опускается в heartbeat'ах во время движения.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterAttributes {
    pub velocity: WireVec3,
    pub quaternion: WireQuat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WireVec3>,
    pub state: CharacterState,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CharacterUpdated {
    #[serde(flatten)]
    pub attributes: CharacterAttributes,
    pub user_id: String,
}

/// Состояние одного пользователя от сервера
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub character_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quaternion: Option<WireQuat>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub velocity: Option<WireVec3>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<CharacterState>,
}

impl UserSnapshot {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Joined {
    pub user_id: String,
    pub character_name: String,
}

/// Server → client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Полный roster (при join и периодически)
    UpdateCharactersData(Vec<UserSnapshot>),
    /// Один пользователь
    UpdateCharacterData(UserSnapshot),
    CharacterDisconnected(UserRef),
}

/// Client → server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "kebab-case")]
pub enum ClientMessage {
    Joined(Joined),
    RequestCharactersData,
    CharacterUpdated(CharacterUpdated),
}

impl ClientMessage {
    pub fn event_name(&self) -> &'static str {
        match self {
            ClientMessage::Joined(_) => "joined",
            ClientMessage::RequestCharactersData => "request-characters-data",
            ClientMessage::CharacterUpdated(_) => "character-updated",
        }
    }
}

pub fn encode<T: Serialize>(message: &T) -> Result<String, ProtocolError> {
    serde_json::to_string(message).map_err(ProtocolError::Encode)
}

pub fn decode_server(raw: &str) -> Result<ServerMessage, ProtocolError> {
    serde_json::from_str(raw).map_err(ProtocolError::Decode)
}

pub fn decode_client(raw: &str) -> Result<ClientMessage, ProtocolError> {
    serde_json::from_str(raw).map_err(ProtocolError::Decode)
}
