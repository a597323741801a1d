use crate::api::{ApiError, ChatApi};
use crate::identity::{IdentityError, IdentityResolver};
use crate::storage::{session_key, KeyValueStore, StorageError, SESSION_KEY_PREFIX};
use std::sync::Arc;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Identity(#[from] IdentityError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Assistant slug → backend session id, persisted in local storage.
///
/// Creation is not guarded: two processes opening the same assistant at once
/// may both create a session and the last write wins.
#[derive(Clone)]
pub struct SessionCache {
    store: Arc<dyn KeyValueStore>,
}

impl SessionCache {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn cached(&self, assistant_slug: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .store
            .get(&session_key(assistant_slug))?
            .filter(|id| !id.is_empty()))
    }

    pub async fn ensure_session(
        &self,
        api: &dyn ChatApi,
        identity: &IdentityResolver,
        assistant_slug: &str,
    ) -> Result<String, SessionError> {
        if let Some(session_id) = self.cached(assistant_slug)? {
            tracing::debug!(assistant = assistant_slug, session = %session_id, "reusing cached session");
            return Ok(session_id);
        }

        let telegram_id = identity.resolve()?;
        let session_id = api.create_session(assistant_slug, &telegram_id).await?;
        self.store.set(&session_key(assistant_slug), &session_id)?;
        tracing::info!(assistant = assistant_slug, session = %session_id, "chat session created");
        Ok(session_id)
    }

    pub fn forget(&self, assistant_slug: &str) -> Result<(), StorageError> {
        self.store.remove(&session_key(assistant_slug))
    }

    /// Cached `(assistant_slug, session_id)` pairs.
    pub fn list(&self) -> Result<Vec<(String, String)>, StorageError> {
        let mut sessions = Vec::new();
        for key in self.store.keys_with_prefix(SESSION_KEY_PREFIX)? {
            if let Some(id) = self.store.get(&key)? {
                let slug = key[SESSION_KEY_PREFIX.len()..].to_string();
                sessions.push((slug, id));
            }
        }
        Ok(sessions)
    }

    pub fn forget_all(&self) -> Result<usize, StorageError> {
        let keys = self.store.keys_with_prefix(SESSION_KEY_PREFIX)?;
        for key in &keys {
            self.store.remove(key)?;
        }
        Ok(keys.len())
    }
}
