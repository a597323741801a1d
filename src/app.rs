use crate::api::{ApiError, ChatApi, HttpChatApi};
use crate::catalog::{PurchaseLedger, Tier};
use crate::chat::{ChatController, ChatView};
use crate::config::AppConfig;
use crate::identity::IdentityResolver;
use crate::router::Router;
use crate::session::SessionCache;
use crate::storage::KeyValueStore;
use std::sync::Arc;

/// Everything the screens show that is not persisted.
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub router: Router,
    pub chat: ChatView,
    /// Section and tier whose assistant list is on screen.
    pub selection: Option<(&'static str, Tier)>,
}

/// Long-lived services shared by all commands.
#[derive(Clone)]
pub struct App {
    pub ledger: PurchaseLedger,
    pub chat: ChatController,
}

impl App {
    pub fn new(
        store: Arc<dyn KeyValueStore>,
        api: Arc<dyn ChatApi>,
        identity: IdentityResolver,
    ) -> Self {
        Self {
            ledger: PurchaseLedger::new(store.clone()),
            chat: ChatController::new(api, SessionCache::new(store), identity),
        }
    }

    pub fn from_config(store: Arc<dyn KeyValueStore>, config: &AppConfig) -> Result<Self, ApiError> {
        let api = HttpChatApi::new(&config.api())?;
        tracing::debug!(base_url = api.base_url(), "backend configured");
        Ok(Self::new(store, Arc::new(api), config.identity()))
    }

    pub fn sessions(&self) -> &SessionCache {
        self.chat.sessions()
    }
}
