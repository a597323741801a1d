use crate::app::{App, AppState};
use crate::catalog;
use crate::chat::{ChatPhase, ChatView};
use crate::router::Screen;

/// Opens (or resumes) the chat with an assistant the user has unlocked.
pub async fn open_chat(
    app: &App,
    state: &mut AppState,
    assistant_slug: &str,
    on_update: impl Fn(&ChatView),
) -> Result<(), String> {
    let assistant = catalog::assistant(assistant_slug)
        .ok_or_else(|| format!("Unknown assistant: {assistant_slug}"))?;
    if !app.ledger.is_unlocked(assistant).map_err(|e| e.to_string())? {
        let requirement = assistant
            .requires
            .map(|r| format!("the {} tier of \"{}\"", r.tier, r.section))
            .unwrap_or_else(|| "it".to_string());
        return Err(format!("{} is locked; unlock {requirement} first", assistant.title));
    }

    state.router.set_chat_available(true);
    state
        .router
        .navigate(Screen::Chat)
        .map_err(|e| e.to_string())?;

    let view = std::mem::take(&mut state.chat);
    state.chat = app.chat.open(view, assistant, on_update).await;

    if state.chat.phase == ChatPhase::Idle {
        // No session: the chat tab is unusable, go back to the list.
        state.router.set_chat_available(false);
        state
            .router
            .navigate(Screen::Assistants)
            .map_err(|e| e.to_string())?;
        return Err(state
            .chat
            .status
            .clone()
            .unwrap_or_else(|| "Could not start the conversation".to_string()));
    }
    Ok(())
}

pub async fn send_message(
    app: &App,
    state: &mut AppState,
    text: &str,
    on_update: impl Fn(&ChatView),
) -> Result<(), String> {
    let view = std::mem::take(&mut state.chat);
    state.chat = app.chat.send(view, text, on_update).await;
    Ok(())
}

pub async fn refresh_history(app: &App, state: &mut AppState) -> Result<(), String> {
    if !state.chat.is_open() {
        return Err("No conversation is open".to_string());
    }
    let view = std::mem::take(&mut state.chat);
    state.chat = app.chat.refresh(view).await;
    Ok(())
}

pub fn list_sessions(app: &App) -> Result<Vec<(String, String)>, String> {
    app.sessions().list().map_err(|e| e.to_string())
}

/// Drops cached session ids so the next open creates a fresh backend session.
pub fn clear_sessions(app: &App, assistant_slug: Option<&str>) -> Result<usize, String> {
    match assistant_slug {
        Some(slug) => {
            let existed = app
                .sessions()
                .cached(slug)
                .map_err(|e| e.to_string())?
                .is_some();
            app.sessions().forget(slug).map_err(|e| e.to_string())?;
            Ok(usize::from(existed))
        }
        None => app.sessions().forget_all().map_err(|e| e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::fake::{status_error, FakeApi};
    use crate::api::SendOutcome;
    use crate::catalog::Tier;
    use crate::identity::IdentityResolver;
    use crate::storage::MemoryStore;
    use std::sync::Arc;

    fn app(api: Arc<FakeApi>) -> App {
        App::new(
            Arc::new(MemoryStore::new()),
            api,
            IdentityResolver {
                allow_debug: true,
                ..Default::default()
            },
        )
    }

    #[tokio::test]
    async fn test_locked_assistant_is_refused() {
        let api = Arc::new(FakeApi::new());
        let app = app(api.clone());
        let mut state = AppState::default();

        let err = open_chat(&app, &mut state, "pregnancy_family", |_| {})
            .await
            .unwrap_err();

        assert!(err.contains("Pro"));
        assert_eq!(api.create_count(), 0);
        assert_eq!(state.router.active(), Screen::Home);
        assert!(!state.router.chat_available());
    }

    #[tokio::test]
    async fn test_full_flow_buy_open_send() {
        let api = Arc::new(FakeApi::new());
        api.push_send_result(Ok(SendOutcome::Reply("a warm bath helps".into())));
        let app = app(api.clone());
        let mut state = AppState::default();

        app.ledger.activate("newborn", Tier::Pro).unwrap();
        open_chat(&app, &mut state, "care_basics", |_| {})
            .await
            .unwrap();
        assert_eq!(state.router.active(), Screen::Chat);
        assert!(state.chat.is_open());

        send_message(&app, &mut state, "bath time?", |_| {})
            .await
            .unwrap();
        let last = state.chat.entries.last().unwrap();
        assert_eq!(last.text, "a warm bath helps");

        assert_eq!(list_sessions(&app).unwrap().len(), 1);
        assert_eq!(clear_sessions(&app, Some("care_basics")).unwrap(), 1);
        assert_eq!(clear_sessions(&app, None).unwrap(), 0);
    }

    #[tokio::test]
    async fn test_session_failure_returns_to_assistants() {
        let api = Arc::new(FakeApi::new());
        api.fail_create(status_error(503, "HTTP 503"));
        let app = app(api);
        let mut state = AppState::default();
        app.ledger.activate("pregnancy", Tier::Basic).unwrap();

        let err = open_chat(&app, &mut state, "pregnancy_calm", |_| {})
            .await
            .unwrap_err();

        assert!(err.contains("HTTP 503"));
        assert_eq!(state.router.active(), Screen::Assistants);
        assert!(!state.router.chat_available());
    }

    #[tokio::test]
    async fn test_refresh_requires_open_chat() {
        let app = app(Arc::new(FakeApi::new()));
        let mut state = AppState::default();
        assert!(refresh_history(&app, &mut state).await.is_err());
    }
}
