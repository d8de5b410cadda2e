/**
 * Application State Management
 *
 * This module defines the application state structure and implements
 * the necessary `FromRef` traits for Axum state extraction.
 *
 * # Architecture
 *
 * The `AppState` struct serves as the central state container for the
 * application, holding:
 * - the account, story, comment, conversation and setting stores
 *   (PostgreSQL or in-memory)
 * - the message gateway built on top of them
 * - the session keys used to sign and verify tokens
 * - the privileged account handle shared by the gateway and registration
 *
 * # State Extraction
 *
 * The `FromRef` implementations allow Axum handlers to extract specific
 * parts of the state without needing the entire `AppState`.
 *
 * ```rust
 * use axum::extract::State;
 * use imnovel::backend::messaging::MessageGateway;
 *
 * async fn handler(State(gateway): State<MessageGateway>) {
 *     // Use the gateway
 * }
 * ```
 */

use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::PgPool;

use crate::backend::auth::sessions::SessionKeys;
use crate::backend::auth::users::{MemoryUserStore, PgUserStore, UserStore};
use crate::backend::comments::db::{CommentStore, MemoryCommentStore, PgCommentStore};
use crate::backend::messaging::clock::Clock;
use crate::backend::messaging::db::{
    ConversationStore, MemoryConversationStore, PgConversationStore,
};
use crate::backend::messaging::gateway::MessageGateway;
use crate::backend::messaging::privileged::PrivilegedAccount;
use crate::backend::server::config::ServerConfig;
use crate::backend::settings::db::{MemorySettingStore, PgSettingStore, SettingStore};
use crate::backend::stories::db::{MemoryStoryStore, PgStoryStore, StoryStore};

/// Application state shared by every handler
#[derive(Clone)]
pub struct AppState {
    /// User accounts
    pub users: Arc<dyn UserStore>,

    /// Story catalog
    pub stories: Arc<dyn StoryStore>,

    /// Story comments
    pub comments: Arc<dyn CommentStore>,

    /// Site settings
    pub settings: Arc<dyn SettingStore>,

    /// Direct-message operations
    pub gateway: MessageGateway,

    /// Token signing and verification
    pub sessions: SessionKeys,

    /// Admin who receives every standard user's messages
    pub privileged: PrivilegedAccount,

    /// bcrypt work factor for new password hashes
    pub bcrypt_cost: u32,
}

impl AppState {
    /// Assemble state around the given stores
    pub fn new(
        users: Arc<dyn UserStore>,
        stories: Arc<dyn StoryStore>,
        comments: Arc<dyn CommentStore>,
        conversations: Arc<dyn ConversationStore>,
        settings: Arc<dyn SettingStore>,
        privileged: PrivilegedAccount,
        config: &ServerConfig,
    ) -> Self {
        let gateway = MessageGateway::new(
            conversations,
            users.clone(),
            privileged.clone(),
            config.quota_policy(),
        );

        Self {
            users,
            stories,
            comments,
            settings,
            gateway,
            sessions: SessionKeys::new(&config.jwt_secret, config.jwt_ttl_days),
            privileged,
            bcrypt_cost: config.bcrypt_cost,
        }
    }

    /// State backed by in-process stores
    pub fn in_memory(config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(MemoryUserStore::new()),
            Arc::new(MemoryStoryStore::new()),
            Arc::new(MemoryCommentStore::new()),
            Arc::new(MemoryConversationStore::new()),
            Arc::new(MemorySettingStore::new()),
            PrivilegedAccount::new(config.privileged_account),
            config,
        )
    }

    /// State backed by PostgreSQL
    pub fn postgres(pool: PgPool, config: &ServerConfig) -> Self {
        Self::new(
            Arc::new(PgUserStore::new(pool.clone())),
            Arc::new(PgStoryStore::new(pool.clone())),
            Arc::new(PgCommentStore::new(pool.clone())),
            Arc::new(PgConversationStore::new(pool.clone())),
            Arc::new(PgSettingStore::new(pool)),
            PrivilegedAccount::new(config.privileged_account),
            config,
        )
    }

    /// Replace the gateway's time source
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.gateway = self.gateway.with_clock(clock);
        self
    }
}

impl FromRef<AppState> for Arc<dyn UserStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.users.clone()
    }
}

impl FromRef<AppState> for Arc<dyn StoryStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.stories.clone()
    }
}

impl FromRef<AppState> for Arc<dyn CommentStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.comments.clone()
    }
}

impl FromRef<AppState> for Arc<dyn SettingStore> {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.settings.clone()
    }
}

impl FromRef<AppState> for MessageGateway {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.gateway.clone()
    }
}

impl FromRef<AppState> for SessionKeys {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.sessions.clone()
    }
}

impl FromRef<AppState> for PrivilegedAccount {
    fn from_ref(app_state: &AppState) -> Self {
        app_state.privileged.clone()
    }
}
