//! Application state wiring all services together.
//!
//! AppState holds the concrete service instances used by both CLI and the
//! HTTP/WebSocket layer. Services are generic over repository traits, but
//! AppState pins them to the concrete infra implementations.

use std::path::PathBuf;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tripdesk_core::chat::room::RoomRegistry;
use tripdesk_core::chat::service::ChatService;
use tripdesk_infra::config::{database_url, load_config, resolve_data_dir};
use tripdesk_infra::sqlite::chat::SqliteChatRepository;
use tripdesk_infra::sqlite::pool::DatabasePool;
use tripdesk_infra::sqlite::user::SqliteUserRepository;
use tripdesk_types::config::AppConfig;

/// Concrete type alias for the service generics pinned to infra implementations.
pub type ConcreteChatService = ChatService<SqliteChatRepository, SqliteUserRepository>;

/// Shared application state holding all services.
///
/// Used by both CLI commands and HTTP/WebSocket handlers.
#[derive(Clone)]
pub struct AppState {
    pub chat_service: Arc<ConcreteChatService>,
    pub user_repo: Arc<SqliteUserRepository>,
    pub rooms: Arc<RoomRegistry>,
    pub config: AppConfig,
    pub data_dir: PathBuf,
    pub db_pool: DatabasePool,
    /// Cancelled on graceful shutdown; live WebSocket loops watch it.
    pub shutdown: CancellationToken,
}

impl AppState {
    /// Initialize the application state: connect to DB, wire services.
    pub async fn init() -> anyhow::Result<Self> {
        let data_dir = resolve_data_dir();

        // Ensure data directory exists
        tokio::fs::create_dir_all(&data_dir).await?;

        let config = load_config(&data_dir).await;

        let db_pool = DatabasePool::new(&database_url(&data_dir)).await?;

        // The admins' room channel is created inside the registry once,
        // here at startup, never check-and-created per request.
        let rooms = Arc::new(RoomRegistry::new(config.room_buffer));

        // Wire chat service with its repositories; handlers get a separate
        // user repository instance for directory lookups.
        let chat_service = ChatService::new(
            SqliteChatRepository::new(db_pool.clone()),
            SqliteUserRepository::new(db_pool.clone()),
            Arc::clone(&rooms),
        );
        let user_repo = SqliteUserRepository::new(db_pool.clone());

        Ok(Self {
            chat_service: Arc::new(chat_service),
            user_repo: Arc::new(user_repo),
            rooms,
            config,
            data_dir,
            db_pool,
            shutdown: CancellationToken::new(),
        })
    }
}
