use super::state::{ChatAction, ChatPhase, ChatView, NO_SESSION_STATUS};
use crate::api::ChatApi;
use crate::catalog::Assistant;
use crate::identity::IdentityResolver;
use crate::session::SessionCache;
use std::sync::Arc;
use uuid::Uuid;

/// Runs the effects of the chat flow and feeds their results through the
/// reducer. Every intermediate view is reported to `on_update`.
#[derive(Clone)]
pub struct ChatController {
    api: Arc<dyn ChatApi>,
    sessions: SessionCache,
    identity: IdentityResolver,
}

impl ChatController {
    pub fn new(api: Arc<dyn ChatApi>, sessions: SessionCache, identity: IdentityResolver) -> Self {
        Self {
            api,
            sessions,
            identity,
        }
    }

    pub fn sessions(&self) -> &SessionCache {
        &self.sessions
    }

    pub async fn open(
        &self,
        view: ChatView,
        assistant: &Assistant,
        on_update: impl Fn(&ChatView),
    ) -> ChatView {
        let view = view.apply(ChatAction::Open {
            assistant_slug: assistant.slug.to_string(),
            title: assistant.title.to_string(),
        });
        on_update(&view);

        let session_id = match self
            .sessions
            .ensure_session(self.api.as_ref(), &self.identity, assistant.slug)
            .await
        {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(assistant = assistant.slug, error = %e, "could not start session");
                return view.apply(ChatAction::SessionFailed {
                    reason: e.to_string(),
                });
            }
        };
        let view = view.apply(ChatAction::SessionReady {
            session_id: session_id.clone(),
        });

        self.sync_history(view, &session_id).await
    }

    /// Replaces the rendered entries with the server's history.
    pub async fn refresh(&self, view: ChatView) -> ChatView {
        match view.session_id.clone() {
            Some(session_id) if view.phase == ChatPhase::Ready => {
                self.sync_history(view, &session_id).await
            }
            _ => view,
        }
    }

    async fn sync_history(&self, view: ChatView, session_id: &str) -> ChatView {
        match self.api.fetch_history(session_id).await {
            Ok(messages) => {
                tracing::debug!(session = session_id, count = messages.len(), "history loaded");
                view.apply(ChatAction::HistoryLoaded { messages })
            }
            Err(e) => {
                tracing::warn!(session = session_id, error = %e, "history fetch failed");
                view.apply(ChatAction::HistoryFailed {
                    reason: e.to_string(),
                })
            }
        }
    }

    pub async fn send(&self, view: ChatView, text: &str, on_update: impl Fn(&ChatView)) -> ChatView {
        let text = text.trim();
        if text.is_empty() {
            return view;
        }

        let (session_id, assistant_slug) = match (&view.session_id, &view.assistant_slug) {
            (Some(session), Some(slug)) => (session.clone(), slug.clone()),
            _ => {
                return ChatView {
                    status: Some(NO_SESSION_STATUS.to_string()),
                    ..view
                }
            }
        };

        if view.phase != ChatPhase::Ready {
            return view.apply(ChatAction::SendStarted {
                id: Uuid::new_v4(),
                text: text.to_string(),
            });
        }

        let id = Uuid::new_v4();
        let view = view.apply(ChatAction::SendStarted {
            id,
            text: text.to_string(),
        });
        on_update(&view);

        match self.api.send_message(&session_id, &assistant_slug, text).await {
            Ok(outcome) => view.apply(ChatAction::SendConfirmed { id, outcome }),
            Err(e) => {
                tracing::warn!(session = %session_id, error = %e, "send failed");
                view.apply(ChatAction::SendFailed {
                    id,
                    reason: e.to_string(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{status_error, FakeApi};
    use crate::api::SendOutcome;
    use crate::catalog;
    use crate::chat::state::{Delivery, GREETING, THINKING_STATUS};
    use crate::models::{Message, Role};
    use crate::storage::MemoryStore;
    use std::sync::Mutex;

    fn controller(api: Arc<FakeApi>) -> ChatController {
        ChatController::new(
            api,
            SessionCache::new(Arc::new(MemoryStore::new())),
            IdentityResolver {
                allow_debug: true,
                ..Default::default()
            },
        )
    }

    fn care() -> &'static Assistant {
        catalog::assistant("care_basics").unwrap()
    }

    #[tokio::test]
    async fn test_open_walks_connecting_then_ready() {
        let api = Arc::new(FakeApi::new());
        let chat = controller(api.clone());
        let phases = Mutex::new(Vec::new());

        let view = chat
            .open(ChatView::default(), care(), |v| {
                phases.lock().unwrap().push(v.phase)
            })
            .await;

        assert_eq!(*phases.lock().unwrap(), vec![ChatPhase::Connecting]);
        assert_eq!(view.phase, ChatPhase::Ready);
        assert_eq!(view.session_id.as_deref(), Some("sess-1"));
        assert_eq!(view.entries.len(), 1);
        assert_eq!(view.entries[0].text, GREETING);
        assert_eq!(*api.history_calls.lock().unwrap(), vec!["sess-1".to_string()]);
    }

    #[tokio::test]
    async fn test_reopen_reuses_session() {
        let api = Arc::new(FakeApi::new().with_history(
            "sess-1",
            vec![
                Message::new(Role::User, "hello"),
                Message::new(Role::Assistant, "hi"),
            ],
        ));
        let chat = controller(api.clone());

        let view = chat.open(ChatView::default(), care(), |_| {}).await;
        let view = chat.open(view, care(), |_| {}).await;

        assert_eq!(api.create_count(), 1);
        assert_eq!(view.entries.len(), 2);
        assert_eq!(view.entries[1].text, "hi");
    }

    #[tokio::test]
    async fn test_send_shows_thinking_then_reconciles() {
        let api = Arc::new(FakeApi::new());
        api.push_send_result(Ok(SendOutcome::Transcript(vec![
            Message::new(Role::System, "prompt"),
            Message::new(Role::User, "cannot sleep"),
            Message::new(Role::Assistant, "let's look at the evening"),
        ])));
        let chat = controller(api.clone());
        let view = chat.open(ChatView::default(), care(), |_| {}).await;

        let seen = Mutex::new(Vec::new());
        let view = chat
            .send(view, "  cannot sleep ", |v| {
                seen.lock().unwrap().push((v.phase, v.status.clone()))
            })
            .await;

        assert_eq!(
            *seen.lock().unwrap(),
            vec![(ChatPhase::Sending, Some(THINKING_STATUS.to_string()))]
        );
        assert_eq!(
            api.send_calls.lock().unwrap()[0],
            (
                "sess-1".to_string(),
                "care_basics".to_string(),
                "cannot sleep".to_string()
            )
        );
        let rendered: Vec<&str> = view.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(rendered, vec!["cannot sleep", "let's look at the evening"]);
        assert_eq!(view.phase, ChatPhase::Ready);
    }

    #[tokio::test]
    async fn test_send_failure_surfaces_reason() {
        let api = Arc::new(FakeApi::new().with_history(
            "sess-1",
            vec![Message::new(Role::Assistant, "welcome back")],
        ));
        api.push_send_result(Err(status_error(500, "OpenAI error: timeout")));
        let chat = controller(api);
        let opened = chat.open(ChatView::default(), care(), |_| {}).await;

        let view = chat.send(opened.clone(), "hello", |_| {}).await;

        assert_eq!(view.phase, ChatPhase::Ready);
        assert!(view
            .status
            .as_deref()
            .unwrap()
            .contains("OpenAI error: timeout"));
        assert_eq!(view.entries[0], opened.entries[0]);
        assert_eq!(view.entries[1].delivery, Delivery::Failed);
    }

    #[tokio::test]
    async fn test_blank_and_sessionless_sends_make_no_call() {
        let api = Arc::new(FakeApi::new());
        let chat = controller(api.clone());

        let view = chat.send(ChatView::default(), "hello", |_| {}).await;
        assert_eq!(view.status.as_deref(), Some(NO_SESSION_STATUS));

        let opened = chat.open(ChatView::default(), care(), |_| {}).await;
        let view = chat.send(opened.clone(), "   ", |_| {}).await;
        assert_eq!(view, opened);
        assert!(api.send_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_session_failure_leaves_idle_view() {
        let api = Arc::new(FakeApi::new());
        api.fail_create(status_error(404, "Assistant not found"));
        let chat = controller(api.clone());

        let view = chat.open(ChatView::default(), care(), |_| {}).await;

        assert_eq!(view.phase, ChatPhase::Idle);
        assert!(view.status.unwrap().contains("Assistant not found"));
        assert!(api.history_calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_pulls_server_truth() {
        let api = Arc::new(FakeApi::new());
        let chat = controller(api.clone());
        let view = chat.open(ChatView::default(), care(), |_| {}).await;
        api.fail_history(status_error(404, "Session not found"));

        let view = chat.refresh(view).await;
        assert!(view.status.unwrap().contains("Session not found"));
        assert_eq!(api.history_calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_rendered_history() {
        let api = Arc::new(FakeApi::new().with_history(
            "sess-1",
            vec![
                Message::new(Role::User, "hello"),
                Message::new(Role::Assistant, "hi"),
            ],
        ));
        let chat = controller(api.clone());
        let opened = chat.open(ChatView::default(), care(), |_| {}).await;
        api.fail_history(status_error(503, "HTTP 503"));

        let view = chat.refresh(opened.clone()).await;

        assert_eq!(view.entries, opened.entries);
        let rendered: Vec<&str> = view.entries.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(rendered, vec!["hello", "hi"]);
        assert_eq!(view.phase, ChatPhase::Ready);
        assert!(view.status.unwrap().contains("HTTP 503"));
    }
}
