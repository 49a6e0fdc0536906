//! Room registry: logical broadcast groups for live chat connections.
//!
//! A room is a `broadcast` channel keyed by [`RoomId`]. Connections join
//! rooms on connect and hold the receivers for the lifetime of the
//! transport session; dropping the receivers is the only cleanup. Nothing
//! here is persisted -- membership is rebuilt on every reconnect.

use std::fmt;

use dashmap::DashMap;
use tokio::sync::broadcast;
use tracing::debug;
use tripdesk_types::chat::ChatEvent;
use uuid::Uuid;

/// Default buffer size for room broadcast channels.
const DEFAULT_ROOM_BUFFER: usize = 256;

/// Identifier of a logical broadcast group.
///
/// Every user owns a private room; administrators additionally share one
/// pool-wide room. Messages are fanned out by room, never per-recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomId {
    /// A user's private room, shared by all of that user's devices.
    User(Uuid),
    /// The shared administrators' room.
    Admins,
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoomId::User(id) => write!(f, "user:{id}"),
            RoomId::Admins => write!(f, "admins"),
        }
    }
}

/// Registry of live broadcast rooms.
///
/// User rooms are created on first join or emit; the admins' room channel
/// is created once at construction so its existence never depends on
/// request-time check-and-create.
pub struct RoomRegistry {
    rooms: DashMap<RoomId, broadcast::Sender<ChatEvent>>,
    buffer: usize,
}

impl RoomRegistry {
    /// Create a registry with the given per-room buffer capacity.
    pub fn new(buffer: usize) -> Self {
        let rooms = DashMap::new();
        let (admin_tx, _) = broadcast::channel(buffer);
        rooms.insert(RoomId::Admins, admin_tx);
        Self { rooms, buffer }
    }

    /// Join a room, creating its channel if it does not exist.
    ///
    /// The returned receiver is the caller's membership; dropping it
    /// leaves the room.
    pub fn join(&self, room: RoomId) -> broadcast::Receiver<ChatEvent> {
        let entry = self.rooms.entry(room).or_insert_with(|| {
            let (tx, _) = broadcast::channel(self.buffer);
            tx
        });
        entry.subscribe()
    }

    /// Emit an event to every current member of a room.
    ///
    /// Returns the number of receivers the event reached. A room with no
    /// live members swallows the event -- delivery is best-effort and
    /// nothing is queued for redelivery.
    pub fn emit(&self, room: RoomId, event: ChatEvent) -> usize {
        match self.rooms.get(&room) {
            Some(sender) => match sender.send(event) {
                Ok(count) => {
                    debug!(room = %room, count, "emitted chat event");
                    count
                }
                Err(_) => {
                    debug!(room = %room, "no live members in room, event dropped");
                    0
                }
            },
            None => {
                debug!(room = %room, "room does not exist, event dropped");
                0
            }
        }
    }

    /// Number of live members in a room.
    pub fn member_count(&self, room: RoomId) -> usize {
        self.rooms
            .get(&room)
            .map(|sender| sender.receiver_count())
            .unwrap_or(0)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(DEFAULT_ROOM_BUFFER)
    }
}

impl fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("rooms", &self.rooms.len())
            .field("buffer", &self.buffer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tripdesk_types::chat::ChatEvent;

    fn read_event(session_id: Uuid) -> ChatEvent {
        ChatEvent::MessagesRead { session_id }
    }

    #[tokio::test]
    async fn admins_room_exists_at_construction() {
        let registry = RoomRegistry::default();
        // Emitting into the empty admins room is a drop, not a missing room.
        assert_eq!(registry.member_count(RoomId::Admins), 0);
        assert_eq!(registry.emit(RoomId::Admins, read_event(Uuid::now_v7())), 0);
    }

    #[tokio::test]
    async fn join_then_emit_delivers() {
        let registry = RoomRegistry::default();
        let user_id = Uuid::now_v7();
        let mut rx = registry.join(RoomId::User(user_id));

        let session_id = Uuid::now_v7();
        let count = registry.emit(RoomId::User(user_id), read_event(session_id));
        assert_eq!(count, 1);

        let event = rx.recv().await.unwrap();
        assert_eq!(event, read_event(session_id));
    }

    #[tokio::test]
    async fn multiple_members_each_receive() {
        let registry = RoomRegistry::default();
        let mut rx1 = registry.join(RoomId::Admins);
        let mut rx2 = registry.join(RoomId::Admins);

        let session_id = Uuid::now_v7();
        assert_eq!(registry.emit(RoomId::Admins, read_event(session_id)), 2);
        assert_eq!(rx1.recv().await.unwrap(), read_event(session_id));
        assert_eq!(rx2.recv().await.unwrap(), read_event(session_id));
    }

    #[tokio::test]
    async fn emit_to_unknown_user_room_drops() {
        let registry = RoomRegistry::default();
        assert_eq!(
            registry.emit(RoomId::User(Uuid::now_v7()), read_event(Uuid::now_v7())),
            0
        );
    }

    #[tokio::test]
    async fn dropping_receiver_leaves_room() {
        let registry = RoomRegistry::default();
        let user_id = Uuid::now_v7();
        let rx = registry.join(RoomId::User(user_id));
        assert_eq!(registry.member_count(RoomId::User(user_id)), 1);
        drop(rx);
        assert_eq!(registry.member_count(RoomId::User(user_id)), 0);
    }
}
