//! Network domain: сессия, JSON wire протокол, reconciliation
//!
//! Содержит:
//! - wire: ServerMessage / ClientMessage, encode/decode
//! - transport: NetworkInbox / NetworkOutbox, dispatch_inbound
//! - session: userId, выбор имени, request roster, join
//! - roster: RosterSync (по одному пользователю за тик)
//! - reconcile: snapshot → remote персонаж (tween, settle, dead reckoning)
//! - outbound: AttributeFeed, heartbeat throttling
//!
//! Socket слой внешний: он пишет в inbox и читает outbox между тиками.

use bevy::prelude::*;

use crate::character::visual::blend_models;
use crate::SimulationSet;

pub mod outbound;
pub mod reconcile;
pub mod roster;
pub mod session;
pub mod transport;
pub mod wire;

pub use outbound::{character_attributes, AttributeFeed};
pub use reconcile::{
    apply_remote_state, cubic_ease_out, DeferredSnapshots, PendingState, PositionTween, RemoteSync,
};
pub use roster::RosterSync;
pub use session::{generate_user_id, Session};
pub use transport::{DisconnectReceived, NetworkInbox, NetworkOutbox, SnapshotReceived};
pub use wire::{
    decode_client, decode_server, encode, CharacterAttributes, CharacterUpdated, ClientMessage, Joined,
    ProtocolError, ServerMessage, UserRef, UserSnapshot, WireQuat, WireVec3,
};

/// Network Plugin
///
/// Порядок выполнения:
/// - NetworkInbound: request roster → dispatch → roster queue → snapshots →
///   disconnects → join
/// - Timers: settle задержки remote state
/// - VisualSync: tween'ы remote тел (до blend моделей)
/// - NetworkOutbound: character-updated
pub struct NetworkPlugin;

impl Plugin for NetworkPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Session>()
            .init_resource::<NetworkInbox>()
            .init_resource::<NetworkOutbox>()
            .init_resource::<RosterSync>()
            .init_resource::<reconcile::DeferredSnapshots>()
            .add_event::<SnapshotReceived>()
            .add_event::<DisconnectReceived>();

        app.add_systems(
            FixedUpdate,
            (
                session::request_roster,
                transport::dispatch_inbound,
                roster::apply_roster_queue,
                reconcile::reconcile_snapshots,
                reconcile::handle_disconnects,
                session::join_plaza,
            )
                .chain()
                .in_set(SimulationSet::NetworkInbound),
        );

        app.add_systems(
            FixedUpdate,
            reconcile::apply_settled_states.in_set(SimulationSet::Timers),
        );

        app.add_systems(
            FixedUpdate,
            reconcile::advance_remote_tweens
                .before(blend_models)
                .in_set(SimulationSet::VisualSync),
        );

        app.add_systems(
            FixedUpdate,
            outbound::emit_character_updates.in_set(SimulationSet::NetworkOutbound),
        );
    }
}
