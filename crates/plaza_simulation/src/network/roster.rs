//! Roster sync: `update-characters-data` применяется по одному
//! пользователю за тик. Пока batch применяется, следующий отбрасывается.

use bevy::prelude::*;
use std::collections::VecDeque;

use super::transport::SnapshotReceived;
use super::wire::UserSnapshot;

#[derive(Resource, Debug, Default)]
pub struct RosterSync {
    in_progress: bool,
    queue: VecDeque<UserSnapshot>,
}

impl RosterSync {
    pub fn is_in_progress(&self) -> bool {
        self.in_progress
    }

    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Начинает batch; `false` если предыдущий ещё в процессе (batch отброшен)
    pub fn begin(&mut self, users: Vec<UserSnapshot>) -> bool {
        if self.in_progress {
            return false;
        }
        if users.is_empty() {
            return true;
        }

        self.queue = users.into();
        self.in_progress = true;
        true
    }

    /// Убирает ещё не применённого пользователя (disconnect во время batch'а).
    /// `true`, если он был в очереди.
    pub fn forget(&mut self, user_id: &str) -> bool {
        let before = self.queue.len();
        self.queue.retain(|user| user.user_id != user_id);
        if self.queue.is_empty() {
            self.in_progress = false;
        }
        self.queue.len() != before
    }

    /// Snapshot пользователя, который ещё ждёт в очереди, сливается с его
    /// roster записью (новые поля поверх старых). Иначе возвращается обратно.
    pub fn absorb(&mut self, snapshot: UserSnapshot) -> Option<UserSnapshot> {
        let Some(queued) = self.queue.iter_mut().find(|user| user.user_id == snapshot.user_id) else {
            return Some(snapshot);
        };

        queued.character_name = snapshot.character_name.or(queued.character_name.take());
        queued.position = snapshot.position.or(queued.position);
        queued.quaternion = snapshot.quaternion.or(queued.quaternion);
        queued.velocity = snapshot.velocity.or(queued.velocity);
        queued.state = snapshot.state.or(queued.state.take());
        None
    }

    /// Следующий пользователь batch'а. Guard снимается вместе с последним.
    pub fn next_user(&mut self) -> Option<UserSnapshot> {
        let user = self.queue.pop_front();
        if self.queue.is_empty() {
            self.in_progress = false;
        }
        user
    }
}

/// Система: один пользователь roster'а → SnapshotReceived
pub fn apply_roster_queue(mut roster: ResMut<RosterSync>, mut snapshots: EventWriter<SnapshotReceived>) {
    if !roster.is_in_progress() {
        return;
    }

    if let Some(snapshot) = roster.next_user() {
        snapshots.write(SnapshotReceived { snapshot });
    }
}
