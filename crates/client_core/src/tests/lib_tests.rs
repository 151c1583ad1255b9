use super::*;
use std::time::Duration;

use axum::{http::StatusCode, routing::post, Json, Router};
use serde_json::{json, Value};
use shared::domain::Sender;
use tokio::{
    net::TcpListener,
    sync::{oneshot, Mutex},
};
use url::Url;

use crate::quick_actions::DUO_BYPASS_QUERY;

#[derive(Clone)]
struct HelpDeskState {
    seen: Arc<Mutex<Vec<(String, String)>>>,
    fail_rag: bool,
    rag_gate: Arc<Mutex<Option<oneshot::Receiver<()>>>>,
}

async fn answer(state: &HelpDeskState, route: &str, body: Value) -> (StatusCode, Json<Value>) {
    let question = body
        .get("question")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    state.seen.lock().await.push((route.to_string(), question));
    if route == "rag" {
        let gate = state.rag_gate.lock().await.take();
        if let Some(gate) = gate {
            let _ = gate.await;
        }
        if state.fail_rag {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to generate embedding" })),
            );
        }
        return (
            StatusCode::OK,
            Json(json!({ "answer": "Try restarting the printer." })),
        );
    }
    (
        StatusCode::OK,
        Json(json!({ "answer": "1. Go to trueyou.nebraska.edu" })),
    )
}

async fn spawn_help_desk(state: HelpDeskState) -> Result<Url, Box<dyn std::error::Error>> {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let addr = listener.local_addr()?;

    let rag_state = state.clone();
    let duo_state = state.clone();
    let app = Router::new()
        .route(
            "/api/rag",
            post(move |Json(body): Json<Value>| {
                let state = rag_state.clone();
                async move { answer(&state, "rag", body).await }
            }),
        )
        .route(
            "/api/duo",
            post(move |Json(body): Json<Value>| {
                let state = duo_state.clone();
                async move { answer(&state, "duo", body).await }
            }),
        );
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Ok(Url::parse(&format!("http://{addr}"))?)
}

fn help_desk_state(fail_rag: bool) -> HelpDeskState {
    HelpDeskState {
        seen: Arc::new(Mutex::new(Vec::new())),
        fail_rag,
        rag_gate: Arc::new(Mutex::new(None)),
    }
}

fn http_session(base_url: Url) -> ChatSession {
    let service = HttpAnswerService::new(ServiceConfig::new(base_url)).expect("service");
    ChatSession::new(RequestController::new(Arc::new(service)).with_timeout(Duration::from_secs(5)))
}

fn transcript(session: &ChatSession) -> Vec<(Sender, String)> {
    session
        .state()
        .messages()
        .iter()
        .map(|message| (message.sender(), message.text().to_string()))
        .collect()
}

fn type_line(session: &mut ChatSession, line: &str) -> Option<MessageId> {
    for ch in line.chars() {
        assert_eq!(session.handle_key(Key::Char(ch)), None);
    }
    session.handle_key(Key::Enter)
}

#[tokio::test]
async fn typed_question_round_trip() {
    let state = help_desk_state(false);
    let (gate_tx, gate_rx) = oneshot::channel();
    *state.rag_gate.lock().await = Some(gate_rx);
    let base_url = spawn_help_desk(state.clone()).await.expect("server");
    let mut session = http_session(base_url);

    assert_eq!(session.state().phase(), Phase::Greeting);
    type_line(&mut session, "printer not working").expect("accepted");

    assert_eq!(
        transcript(&session),
        [(Sender::User, "printer not working".to_string())]
    );
    assert!(session.state().is_pending());
    assert_eq!(session.state().draft(), "");
    assert_eq!(session.state().phase(), Phase::Conversing);

    gate_tx.send(()).expect("open gate");
    session.next_reply().await.expect("reply");

    assert_eq!(
        transcript(&session),
        [
            (Sender::User, "printer not working".to_string()),
            (Sender::Assistant, "Try restarting the printer.".to_string()),
        ]
    );
    assert!(!session.state().is_pending());
    assert_eq!(
        *state.seen.lock().await,
        [("rag".to_string(), "printer not working".to_string())]
    );
}

#[tokio::test]
async fn failed_question_shows_apology() {
    let base_url = spawn_help_desk(help_desk_state(true))
        .await
        .expect("server");
    let mut session = http_session(base_url);

    session.set_draft("printer not working");
    session.submit_draft().expect("accepted");
    session.settle_all().await;

    let messages = session.state().messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].sender(), Sender::Assistant);
    assert_eq!(messages[1].text(), APOLOGY_TEXT);
    assert!(!session.state().is_pending());
    assert_eq!(session.state().phase(), Phase::Conversing);
}

#[tokio::test]
async fn duo_button_uses_dedicated_endpoint() {
    let state = help_desk_state(false);
    let base_url = spawn_help_desk(state.clone()).await.expect("server");
    let mut session = http_session(base_url);

    session.press(QuickAction::Duo).expect("wired action");
    assert!(session.state().started());
    session.settle_all().await;

    assert_eq!(
        transcript(&session),
        [
            (Sender::User, DUO_BYPASS_QUERY.to_string()),
            (
                Sender::Assistant,
                "1. Go to trueyou.nebraska.edu".to_string()
            ),
        ]
    );
    assert_eq!(
        *state.seen.lock().await,
        [("duo".to_string(), DUO_BYPASS_QUERY.to_string())]
    );
}

#[tokio::test]
async fn duo_button_keeps_typed_draft() {
    let base_url = spawn_help_desk(help_desk_state(false))
        .await
        .expect("server");
    let mut session = http_session(base_url);

    session.set_draft("half a question");
    session.press(QuickAction::Duo).expect("wired action");
    session.settle_all().await;
    assert_eq!(session.state().draft(), "half a question");
}

#[tokio::test]
async fn placeholder_buttons_do_nothing() {
    let service: Arc<dyn AnswerService> = Arc::new(
        HttpAnswerService::new(ServiceConfig::new(
            Url::parse(transport::DEFAULT_BASE_URL).expect("url"),
        ))
        .expect("service"),
    );
    let mut session = ChatSession::with_service(service);
    let len_rx = session.subscribe_len();

    for action in QuickAction::ALL {
        if action == QuickAction::Duo {
            continue;
        }
        assert_eq!(session.press(action), None, "{action} must be inert");
    }

    assert!(session.state().messages().is_empty());
    assert!(!session.state().started());
    assert!(!session.state().is_pending());
    assert!(!len_rx.has_changed().expect("sender alive"));
    assert_eq!(session.next_reply().await, None);
}

#[tokio::test]
async fn blank_commit_is_ignored() {
    let base_url = spawn_help_desk(help_desk_state(false))
        .await
        .expect("server");
    let mut session = http_session(base_url);

    assert_eq!(type_line(&mut session, "   "), None);
    assert_eq!(session.state().draft(), "   ");
    assert!(session.state().messages().is_empty());
    assert_eq!(session.state().phase(), Phase::Greeting);
}

#[tokio::test]
async fn conversation_never_returns_to_greeting() {
    let base_url = spawn_help_desk(help_desk_state(true))
        .await
        .expect("server");
    let mut session = http_session(base_url);
    let mut len_rx = session.subscribe_len();

    session.ask(Endpoint::Rag, "first").expect("accepted");
    session.ask(Endpoint::Duo, "second").expect("accepted");
    assert!(session.state().is_pending());
    assert_eq!(session.state().pending_requests().count(), 2);

    session.settle_all().await;
    assert!(!session.state().is_pending());
    assert_eq!(session.state().phase(), Phase::Conversing);
    assert_eq!(session.state().messages().len(), 4);
    assert!(len_rx.has_changed().expect("sender alive"));
    assert_eq!(*len_rx.borrow_and_update(), 4);

    session.press(QuickAction::More);
    assert_eq!(session.state().phase(), Phase::Conversing);
    assert_eq!(session.state().messages().len(), 4);
}
