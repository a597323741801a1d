use std::sync::{Arc, Mutex};

use mamino_lib::api::{ApiConfig, ApiError, ChatApi, HttpChatApi, SendOutcome};
use mamino_lib::models::{Message, Role};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Clone)]
struct RecordedRequest {
    request_line: String,
    headers: Vec<(String, String)>,
    body: Value,
}

impl RecordedRequest {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

#[derive(Clone)]
struct ScriptedResponse {
    status: u16,
    body: String,
    /// Advertised `content-length`; defaults to the real body length.
    declared_len: Option<usize>,
}

fn respond(status: u16, body: &str) -> ScriptedResponse {
    ScriptedResponse {
        status,
        body: body.to_string(),
        declared_len: None,
    }
}

/// Promises `declared_len` bytes, sends `body`, then hangs up.
fn truncated(status: u16, body: &str, declared_len: usize) -> ScriptedResponse {
    ScriptedResponse {
        declared_len: Some(declared_len),
        ..respond(status, body)
    }
}

struct ScriptedServer {
    base_url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl ScriptedServer {
    async fn new(scripts: Vec<ScriptedResponse>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("local TCP listener should bind");
        let addr = listener.local_addr().expect("listener address");
        let requests = Arc::new(Mutex::new(Vec::new()));

        let handle = tokio::spawn({
            let requests = Arc::clone(&requests);
            async move {
                for script in scripts {
                    let (socket, _) = match listener.accept().await {
                        Ok(pair) => pair,
                        Err(_) => break,
                    };
                    serve_one(socket, script, &requests).await;
                }
            }
        });

        Self {
            base_url: format!("http://{addr}/api"),
            requests,
            handle,
        }
    }

    fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn client(&self, init_data: Option<&str>) -> HttpChatApi {
        HttpChatApi::new(&ApiConfig {
            base_url: self.base_url.clone(),
            init_data: init_data.map(str::to_string),
            timeout: Some(std::time::Duration::from_secs(5)),
        })
        .expect("client")
    }
}

impl Drop for ScriptedServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn serve_one(
    mut socket: TcpStream,
    script: ScriptedResponse,
    requests: &Mutex<Vec<RecordedRequest>>,
) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 4096];
    let header_end = loop {
        let n = socket.read(&mut chunk).await.expect("read request");
        if n == 0 {
            return;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let request_line = lines.next().unwrap_or_default().to_string();
    let headers: Vec<(String, String)> = lines
        .filter_map(|line| line.split_once(':'))
        .map(|(k, v)| (k.trim().to_string(), v.trim().to_string()))
        .collect();
    let content_length = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = socket.read(&mut chunk).await.expect("read body");
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = serde_json::from_slice(&buf[header_end..header_end + content_length])
        .unwrap_or(Value::Null);

    requests.lock().unwrap().push(RecordedRequest {
        request_line,
        headers,
        body,
    });

    let response = format!(
        "HTTP/1.1 {} Scripted\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        script.status,
        script.declared_len.unwrap_or(script.body.len()),
        script.body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

#[tokio::test]
async fn create_session_posts_slug_and_identity() {
    let server = ScriptedServer::new(vec![respond(
        200,
        r#"{"session_id":"7f1c2a4e-0000-4000-8000-000000000001"}"#,
    )])
    .await;
    let api = server.client(Some("query_id=AAE&hash=ff"));

    let session = api
        .create_session("newborn_sleep", "279058397")
        .await
        .expect("session");

    assert_eq!(session, "7f1c2a4e-0000-4000-8000-000000000001");
    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].request_line, "POST /api/chat/session HTTP/1.1");
    assert_eq!(
        requests[0].body,
        json!({"assistant_slug": "newborn_sleep", "telegram_id": "279058397"})
    );
    assert_eq!(
        requests[0].header("x-telegram-init-data"),
        Some("query_id=AAE&hash=ff")
    );
    assert!(requests[0]
        .header("content-type")
        .unwrap_or_default()
        .starts_with("application/json"));
}

#[tokio::test]
async fn send_returns_full_transcript() {
    let server = ScriptedServer::new(vec![respond(
        200,
        r#"{"reply":"Try dimming the lights.","messages":[
            {"role":"user","content":"She won't sleep","created_at":"2025-01-01T20:00:00"},
            {"role":"assistant","content":"Try dimming the lights.","created_at":"2025-01-01T20:00:05"}
        ]}"#,
    )])
    .await;
    let api = server.client(None);

    let outcome = api
        .send_message("s-1", "newborn_sleep", "She won't sleep")
        .await
        .expect("send");

    match outcome {
        SendOutcome::Transcript(messages) => {
            assert_eq!(messages.len(), 2);
            assert_eq!(messages[1].role, Role::Assistant);
            assert_eq!(messages[1].content, "Try dimming the lights.");
        }
        other => panic!("expected transcript, got {other:?}"),
    }
    let requests = server.requests();
    assert_eq!(requests[0].request_line, "POST /api/chat/send HTTP/1.1");
    assert_eq!(
        requests[0].body,
        json!({"session_id": "s-1", "assistant_slug": "newborn_sleep", "message": "She won't sleep"})
    );
    assert!(requests[0].header("x-telegram-init-data").is_none());
}

#[tokio::test]
async fn history_returns_messages() {
    let server = ScriptedServer::new(vec![respond(
        200,
        r#"{"messages":[{"role":"user","content":"hi"},{"role":"assistant","content":"hello"}]}"#,
    )])
    .await;
    let api = server.client(None);

    let history = api.fetch_history("s-1").await.expect("history");

    assert_eq!(
        history,
        vec![
            Message::new(Role::User, "hi"),
            Message::new(Role::Assistant, "hello"),
        ]
    );
    assert_eq!(server.requests()[0].body, json!({"session_id": "s-1"}));
}

#[tokio::test]
async fn error_detail_is_surfaced_without_retry() {
    let server = ScriptedServer::new(vec![
        respond(404, r#"{"detail":"Session not found"}"#),
        respond(200, r#"{"messages":[]}"#),
    ])
    .await;
    let api = server.client(None);

    let err = api.fetch_history("gone").await.expect_err("404");

    assert_eq!(err.status(), Some(404));
    assert_eq!(err.to_string(), "Session not found");
    assert_eq!(server.requests().len(), 1);
}

#[tokio::test]
async fn bare_status_when_body_has_no_detail() {
    let server = ScriptedServer::new(vec![respond(500, "Internal Server Error")]).await;
    let api = server.client(None);

    let err = api
        .send_message("s-1", "care_basics", "hello")
        .await
        .expect_err("500");

    assert_eq!(err.to_string(), "HTTP 500");
}

#[tokio::test]
async fn unparsable_success_body_is_malformed() {
    let server = ScriptedServer::new(vec![respond(200, "<html>proxy login</html>")]).await;
    let api = server.client(None);

    let err = api
        .create_session("care_basics", "1")
        .await
        .expect_err("malformed");

    assert!(matches!(err, ApiError::Malformed(_)));
}

#[tokio::test]
async fn connection_lost_mid_body_is_a_transport_error() {
    let server = ScriptedServer::new(vec![truncated(200, r#"{"messages":["#, 200)]).await;
    let api = server.client(None);

    let err = api.fetch_history("s-1").await.expect_err("truncated body");

    assert!(matches!(err, ApiError::Http(_)), "got {err:?}");
}
