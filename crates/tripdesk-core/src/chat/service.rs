//! Chat service orchestrating session lifecycle, message routing, and
//! read tracking.
//!
//! ChatService coordinates the ChatRepository, the user directory, and the
//! RoomRegistry: it finds-or-creates the one active session per user,
//! persists each message, bumps session activity, and fans the payload out
//! to the echo and notify rooms.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use tripdesk_types::chat::{
    ChatEvent, ChatMessage, ChatRole, ChatSession, MessagePayload, SessionOverview,
};
use tripdesk_types::error::ChatError;
use tripdesk_types::user::User;
use uuid::Uuid;

use crate::chat::repository::ChatRepository;
use crate::chat::room::{RoomId, RoomRegistry};
use crate::user::repository::UserRepository;

/// How a caller names the session it wants to mark read: directly by
/// session id, or via the owning user's active session.
#[derive(Debug, Clone, Copy)]
pub enum SessionRef {
    Id(Uuid),
    User(Uuid),
}

/// The broadcast room a principal's own devices listen on.
fn home_room(user: &User) -> RoomId {
    if user.is_admin {
        RoomId::Admins
    } else {
        RoomId::User(user.id)
    }
}

/// Orchestrates chat sessions, message routing, and read tracking.
///
/// Generic over `ChatRepository` and `UserRepository` to maintain clean
/// architecture (tripdesk-core never depends on tripdesk-infra).
pub struct ChatService<C: ChatRepository, U: UserRepository> {
    chat_repo: C,
    user_repo: U,
    rooms: Arc<RoomRegistry>,
}

impl<C: ChatRepository, U: UserRepository> ChatService<C, U> {
    /// Create a new chat service with the given repositories and registry.
    pub fn new(chat_repo: C, user_repo: U, rooms: Arc<RoomRegistry>) -> Self {
        Self {
            chat_repo,
            user_repo,
            rooms,
        }
    }

    /// Access the chat repository.
    pub fn chat_repo(&self) -> &C {
        &self.chat_repo
    }

    /// Access the room registry.
    pub fn rooms(&self) -> &Arc<RoomRegistry> {
        &self.rooms
    }

    // --- Session manager ---

    /// Return the user's active session, creating and persisting one when
    /// absent.
    ///
    /// Called on first message and when either side opens the thread, so a
    /// session row exists before any message does. Callers validate the
    /// user id first; the repository's unique constraint makes concurrent
    /// calls converge on a single row.
    pub async fn get_or_create_session(&self, user_id: &Uuid) -> Result<ChatSession, ChatError> {
        let session = self
            .chat_repo
            .find_or_create_active_session(user_id, Utc::now())
            .await?;
        Ok(session)
    }

    // --- Message router ---

    /// Route one inbound message: persist it and fan it out.
    ///
    /// `target_user_id` names the user side of the thread and is required
    /// from admin senders; a non-admin sender always targets itself and any
    /// supplied target is ignored. Whitespace-only content is a silent
    /// no-op returning `Ok(None)`: no row, no broadcast.
    pub async fn route_message(
        &self,
        sender: &User,
        target_user_id: Option<Uuid>,
        content: &str,
    ) -> Result<Option<MessagePayload>, ChatError> {
        let trimmed = content.trim();
        if trimmed.is_empty() {
            debug!(sender = %sender.id, "dropping empty chat message");
            return Ok(None);
        }

        // Resolve the user side of the conversation. Admin sends to an
        // unknown user are refused rather than creating an orphan session.
        let target = if sender.is_admin {
            let target_id = target_user_id.ok_or(ChatError::TargetRequired)?;
            self.user_repo
                .get_user(&target_id)
                .await
                .map_err(|e| ChatError::StorageError(e.to_string()))?
                .ok_or(ChatError::UserNotFound)?
        } else {
            sender.clone()
        };

        let now = Utc::now();
        let session = self
            .chat_repo
            .find_or_create_active_session(&target.id, now)
            .await?;

        let message = ChatMessage {
            id: Uuid::now_v7(),
            session_id: session.id,
            is_admin_message: sender.is_admin,
            content: trimmed.to_string(),
            created_at: now,
            is_read: false,
        };
        self.chat_repo.save_message(&message).await?;
        self.chat_repo.touch_session(&session.id, now).await?;

        let echo = home_room(sender);
        let notify = if sender.is_admin {
            home_room(&target)
        } else {
            RoomId::Admins
        };

        let payload = MessagePayload::from_message(&message, sender.display_name());
        self.rooms
            .emit(echo, ChatEvent::ReceiveMessage(payload.clone()));
        if notify != echo {
            self.rooms
                .emit(notify, ChatEvent::ReceiveMessage(payload.clone()));
        }

        info!(
            session_id = %session.id,
            is_admin = sender.is_admin,
            "chat message routed"
        );
        Ok(Some(payload))
    }

    // --- Read tracker ---

    /// Mark every counterpart-authored message in a session as read.
    ///
    /// Resolves the session by id or by the owning user's active session.
    /// A session that cannot be resolved is a no-op returning `Ok(None)`,
    /// not an error. On success the counterpart's room is told so its UI
    /// can clear unread indicators; returns the number of flipped rows.
    pub async fn mark_read(
        &self,
        viewer: ChatRole,
        session: SessionRef,
    ) -> Result<Option<u64>, ChatError> {
        let resolved = match session {
            SessionRef::Id(id) => self.chat_repo.get_session(&id).await?,
            SessionRef::User(user_id) => {
                self.chat_repo.get_active_session_for_user(&user_id).await?
            }
        };

        let Some(session) = resolved else {
            warn!("mark_read: session could not be resolved, ignoring");
            return Ok(None);
        };

        let flipped = self
            .chat_repo
            .mark_counterpart_read(&session.id, viewer)
            .await?;

        let counterpart_room = match viewer {
            ChatRole::Admin => RoomId::User(session.user_id),
            ChatRole::User => RoomId::Admins,
        };
        self.rooms.emit(
            counterpart_room,
            ChatEvent::MessagesRead {
                session_id: session.id,
            },
        );

        debug!(session_id = %session.id, flipped, viewer = %viewer, "messages marked read");
        Ok(Some(flipped))
    }

    // --- Dashboard reads ---

    /// Active sessions ordered by last activity, with admin-facing unread
    /// counts.
    pub async fn list_active_sessions(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<SessionOverview>, ChatError> {
        Ok(self.chat_repo.list_active_sessions(limit, offset).await?)
    }

    /// Unread count in a session for the given viewing role.
    pub async fn unread_count(
        &self,
        session_id: &Uuid,
        viewer: ChatRole,
    ) -> Result<u32, ChatError> {
        Ok(self.chat_repo.unread_count(session_id, viewer).await?)
    }

    /// Unread count for a user's own thread (0 when no session exists yet).
    pub async fn unread_for_user(&self, user_id: &Uuid) -> Result<u32, ChatError> {
        match self.chat_repo.get_active_session_for_user(user_id).await? {
            Some(session) => Ok(self
                .chat_repo
                .unread_count(&session.id, ChatRole::User)
                .await?),
            None => Ok(0),
        }
    }

    /// Thread history, ordered by creation time.
    pub async fn get_messages(
        &self,
        session_id: &Uuid,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<ChatMessage>, ChatError> {
        Ok(self.chat_repo.get_messages(session_id, limit, offset).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use tokio::sync::broadcast::error::TryRecvError;
    use tripdesk_types::error::RepositoryError;

    /// In-memory ChatRepository mirroring the SQLite semantics.
    #[derive(Default)]
    struct MemChatRepo {
        sessions: Mutex<Vec<ChatSession>>,
        messages: Mutex<Vec<ChatMessage>>,
    }

    impl ChatRepository for MemChatRepo {
        async fn find_or_create_active_session(
            &self,
            user_id: &Uuid,
            now: chrono::DateTime<Utc>,
        ) -> Result<ChatSession, RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions
                .iter()
                .find(|s| s.user_id == *user_id && s.is_active)
            {
                return Ok(existing.clone());
            }
            let session = ChatSession {
                id: Uuid::now_v7(),
                user_id: *user_id,
                is_active: true,
                created_at: now,
                last_activity_at: now,
            };
            sessions.push(session.clone());
            Ok(session)
        }

        async fn get_session(
            &self,
            session_id: &Uuid,
        ) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.id == *session_id)
                .cloned())
        }

        async fn get_active_session_for_user(
            &self,
            user_id: &Uuid,
        ) -> Result<Option<ChatSession>, RepositoryError> {
            Ok(self
                .sessions
                .lock()
                .unwrap()
                .iter()
                .find(|s| s.user_id == *user_id && s.is_active)
                .cloned())
        }

        async fn touch_session(
            &self,
            session_id: &Uuid,
            at: chrono::DateTime<Utc>,
        ) -> Result<(), RepositoryError> {
            let mut sessions = self.sessions.lock().unwrap();
            let session = sessions
                .iter_mut()
                .find(|s| s.id == *session_id)
                .ok_or(RepositoryError::NotFound)?;
            session.last_activity_at = at;
            Ok(())
        }

        async fn list_active_sessions(
            &self,
            _limit: Option<i64>,
            _offset: Option<i64>,
        ) -> Result<Vec<SessionOverview>, RepositoryError> {
            let sessions = self.sessions.lock().unwrap();
            let messages = self.messages.lock().unwrap();
            let mut overviews: Vec<SessionOverview> = sessions
                .iter()
                .filter(|s| s.is_active)
                .map(|s| SessionOverview {
                    session: s.clone(),
                    unread: messages
                        .iter()
                        .filter(|m| m.session_id == s.id && !m.is_read && !m.is_admin_message)
                        .count() as u32,
                })
                .collect();
            overviews.sort_by(|a, b| b.session.last_activity_at.cmp(&a.session.last_activity_at));
            Ok(overviews)
        }

        async fn delete_session(&self, session_id: &Uuid) -> Result<(), RepositoryError> {
            self.sessions.lock().unwrap().retain(|s| s.id != *session_id);
            self.messages
                .lock()
                .unwrap()
                .retain(|m| m.session_id != *session_id);
            Ok(())
        }

        async fn save_message(&self, message: &ChatMessage) -> Result<(), RepositoryError> {
            self.messages.lock().unwrap().push(message.clone());
            Ok(())
        }

        async fn get_messages(
            &self,
            session_id: &Uuid,
            _limit: Option<i64>,
            _offset: Option<i64>,
        ) -> Result<Vec<ChatMessage>, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == *session_id)
                .cloned()
                .collect())
        }

        async fn mark_counterpart_read(
            &self,
            session_id: &Uuid,
            viewer: ChatRole,
        ) -> Result<u64, RepositoryError> {
            let mut messages = self.messages.lock().unwrap();
            let mut flipped = 0;
            for message in messages.iter_mut().filter(|m| {
                m.session_id == *session_id
                    && !m.is_read
                    && m.is_admin_message == viewer.counterpart().is_admin()
            }) {
                message.is_read = true;
                flipped += 1;
            }
            Ok(flipped)
        }

        async fn unread_count(
            &self,
            session_id: &Uuid,
            viewer: ChatRole,
        ) -> Result<u32, RepositoryError> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| {
                    m.session_id == *session_id
                        && !m.is_read
                        && m.is_admin_message == viewer.counterpart().is_admin()
                })
                .count() as u32)
        }
    }

    #[derive(Default)]
    struct MemUserRepo {
        users: Mutex<Vec<User>>,
    }

    impl UserRepository for MemUserRepo {
        async fn create_user(&self, user: &User) -> Result<User, RepositoryError> {
            self.users.lock().unwrap().push(user.clone());
            Ok(user.clone())
        }

        async fn get_user(&self, user_id: &Uuid) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.id == *user_id)
                .cloned())
        }

        async fn get_user_by_username(
            &self,
            username: &str,
        ) -> Result<Option<User>, RepositoryError> {
            Ok(self
                .users
                .lock()
                .unwrap()
                .iter()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn count_users(&self) -> Result<u64, RepositoryError> {
            Ok(self.users.lock().unwrap().len() as u64)
        }
    }

    fn make_user(username: &str, is_admin: bool) -> User {
        User {
            id: Uuid::now_v7(),
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "$argon2id$stub".to_string(),
            full_name: None,
            is_admin,
            created_at: Utc::now(),
        }
    }

    async fn make_service(
        users: &[User],
    ) -> ChatService<MemChatRepo, MemUserRepo> {
        let user_repo = MemUserRepo::default();
        for user in users {
            user_repo.create_user(user).await.unwrap();
        }
        ChatService::new(MemChatRepo::default(), user_repo, Arc::new(RoomRegistry::default()))
    }

    #[tokio::test]
    async fn whitespace_only_content_is_a_silent_no_op() {
        let user = make_user("u1", false);
        let service = make_service(&[user.clone()]).await;
        let mut admins = service.rooms().join(RoomId::Admins);

        let result = service.route_message(&user, None, "   ").await.unwrap();
        assert!(result.is_none());

        // No session, no row, no broadcast.
        assert!(service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .is_none());
        assert!(matches!(admins.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn first_user_message_creates_session_and_reaches_both_rooms() {
        let user = make_user("u1", false);
        let service = make_service(&[user.clone()]).await;
        let mut admins = service.rooms().join(RoomId::Admins);
        let mut own = service.rooms().join(RoomId::User(user.id));
        let mut stranger = service.rooms().join(RoomId::User(Uuid::now_v7()));

        let payload = service
            .route_message(&user, None, "Hello")
            .await
            .unwrap()
            .unwrap();

        let session = service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .expect("session created lazily on first message");
        assert_eq!(payload.session_id, session.id);
        assert!(!payload.is_admin);
        assert!(!payload.is_read);
        assert_eq!(payload.content, "Hello");

        let messages = service
            .chat_repo()
            .get_messages(&session.id, None, None)
            .await
            .unwrap();
        assert_eq!(messages.len(), 1);
        assert!(!messages[0].is_admin_message);
        assert!(!messages[0].is_read);

        // Echo to the sender's private room, notify to the admins' room.
        assert_eq!(own.recv().await.unwrap(), ChatEvent::ReceiveMessage(payload.clone()));
        assert_eq!(
            admins.recv().await.unwrap(),
            ChatEvent::ReceiveMessage(payload)
        );
        assert!(matches!(stranger.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn admin_reply_reuses_session_and_notifies_user_room() {
        let user = make_user("u1", false);
        let admin = make_user("support", true);
        let service = make_service(&[user.clone(), admin.clone()]).await;

        service.route_message(&user, None, "Hello").await.unwrap();
        let session = service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .unwrap();

        let mut admins = service.rooms().join(RoomId::Admins);
        let mut user_room = service.rooms().join(RoomId::User(user.id));

        let payload = service
            .route_message(&admin, Some(user.id), "Hi there")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(payload.session_id, session.id, "reuses U1's session");
        assert!(payload.is_admin);

        // Echo = admins' room, notify = U1's private room; both fire once.
        assert_eq!(
            admins.recv().await.unwrap(),
            ChatEvent::ReceiveMessage(payload.clone())
        );
        assert!(matches!(admins.try_recv(), Err(TryRecvError::Empty)));
        assert_eq!(
            user_room.recv().await.unwrap(),
            ChatEvent::ReceiveMessage(payload)
        );
    }

    #[tokio::test]
    async fn echo_suppressed_when_both_destinations_are_the_admin_room() {
        // An admin targeting an admin account's thread resolves both the
        // echo and notify destinations to the shared admins' room.
        let admin = make_user("support", true);
        let other_admin = make_user("manager", true);
        let service = make_service(&[admin.clone(), other_admin.clone()]).await;
        let mut admins = service.rooms().join(RoomId::Admins);

        service
            .route_message(&admin, Some(other_admin.id), "shift notes")
            .await
            .unwrap()
            .unwrap();

        // Exactly one broadcast, not two.
        assert!(matches!(
            admins.recv().await.unwrap(),
            ChatEvent::ReceiveMessage(_)
        ));
        assert!(matches!(admins.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn admin_send_to_unknown_user_is_refused_without_a_session() {
        let admin = make_user("support", true);
        let service = make_service(&[admin.clone()]).await;
        let ghost = Uuid::now_v7();

        let result = service.route_message(&admin, Some(ghost), "hello?").await;
        assert!(matches!(result, Err(ChatError::UserNotFound)));
        assert!(service
            .chat_repo()
            .get_active_session_for_user(&ghost)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn admin_send_without_target_is_refused() {
        let admin = make_user("support", true);
        let service = make_service(&[admin.clone()]).await;
        let result = service.route_message(&admin, None, "to whom?").await;
        assert!(matches!(result, Err(ChatError::TargetRequired)));
    }

    #[tokio::test]
    async fn unread_counts_are_per_viewing_role_and_never_reversed() {
        let user = make_user("u1", false);
        let admin = make_user("support", true);
        let service = make_service(&[user.clone(), admin.clone()]).await;

        // 3 user-authored, 2 admin-authored, all unread.
        for content in ["a", "b", "c"] {
            service.route_message(&user, None, content).await.unwrap();
        }
        for content in ["x", "y"] {
            service
                .route_message(&admin, Some(user.id), content)
                .await
                .unwrap();
        }
        let session = service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(
            service.unread_count(&session.id, ChatRole::Admin).await.unwrap(),
            3,
            "admin-facing count = user-authored unread"
        );
        assert_eq!(
            service.unread_count(&session.id, ChatRole::User).await.unwrap(),
            2,
            "user-facing count = admin-authored unread"
        );
        assert_eq!(service.unread_for_user(&user.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn mark_read_flips_counterpart_messages_and_notifies_their_room() {
        let user = make_user("u1", false);
        let admin = make_user("support", true);
        let service = make_service(&[user.clone(), admin.clone()]).await;

        service.route_message(&user, None, "one").await.unwrap();
        service.route_message(&user, None, "two").await.unwrap();
        service
            .route_message(&admin, Some(user.id), "reply")
            .await
            .unwrap();
        let session = service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .unwrap();

        let mut user_room = service.rooms().join(RoomId::User(user.id));

        let flipped = service
            .mark_read(ChatRole::Admin, SessionRef::User(user.id))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(flipped, 2, "only the user-authored messages flip");
        assert_eq!(
            service.unread_count(&session.id, ChatRole::Admin).await.unwrap(),
            0
        );
        // Admin-authored message untouched.
        assert_eq!(
            service.unread_count(&session.id, ChatRole::User).await.unwrap(),
            1
        );

        assert_eq!(
            user_room.recv().await.unwrap(),
            ChatEvent::MessagesRead {
                session_id: session.id
            }
        );
    }

    #[tokio::test]
    async fn read_flags_are_monotonic_across_later_traffic() {
        let user = make_user("u1", false);
        let admin = make_user("support", true);
        let service = make_service(&[user.clone(), admin.clone()]).await;

        service.route_message(&user, None, "first").await.unwrap();
        service
            .mark_read(ChatRole::Admin, SessionRef::User(user.id))
            .await
            .unwrap();
        service.route_message(&user, None, "second").await.unwrap();

        let session = service
            .chat_repo()
            .get_active_session_for_user(&user.id)
            .await
            .unwrap()
            .unwrap();
        let messages = service.get_messages(&session.id, None, None).await.unwrap();
        assert!(messages[0].is_read, "earlier message stays read");
        assert!(!messages[1].is_read, "new message starts unread");
    }

    #[tokio::test]
    async fn mark_read_on_unresolvable_session_is_a_no_op() {
        let service = make_service(&[]).await;
        let mut admins = service.rooms().join(RoomId::Admins);

        let by_id = service
            .mark_read(ChatRole::Admin, SessionRef::Id(Uuid::now_v7()))
            .await
            .unwrap();
        assert!(by_id.is_none());
        let by_user = service
            .mark_read(ChatRole::Admin, SessionRef::User(Uuid::now_v7()))
            .await
            .unwrap();
        assert!(by_user.is_none());
        assert!(matches!(admins.try_recv(), Err(TryRecvError::Empty)));
    }

    #[tokio::test]
    async fn open_thread_creates_session_before_any_message() {
        let user = make_user("u1", false);
        let service = make_service(&[user.clone()]).await;

        let session = service.get_or_create_session(&user.id).await.unwrap();
        assert!(session.is_active);
        let again = service.get_or_create_session(&user.id).await.unwrap();
        assert_eq!(session.id, again.id, "single active session per user");

        let listed = service.list_active_sessions(None, None).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].unread, 0);
    }

    #[tokio::test]
    async fn dashboard_lists_sessions_by_recent_activity_with_unread() {
        let u1 = make_user("u1", false);
        let u2 = make_user("u2", false);
        let service = make_service(&[u1.clone(), u2.clone()]).await;

        service.route_message(&u1, None, "older").await.unwrap();
        service.route_message(&u2, None, "newer").await.unwrap();
        service.route_message(&u2, None, "again").await.unwrap();

        let listed = service.list_active_sessions(None, None).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].session.user_id, u2.id, "most recent first");
        assert_eq!(listed[0].unread, 2);
        assert_eq!(listed[1].unread, 1);
    }
}
