//! HTTP and WebSocket surface.
//!
//! - `GET /remote` - WebSocket speaking the remote-control line protocol
//! - `GET /events` - WebSocket streaming JSON notices
//! - `GET /state` - timer snapshot
//! - `POST /command` - run one JSON command
//! - `GET /dialogs`, `POST /dialogs/{id}`, `DELETE /dialogs/{id}` - pending prompts
//! - `GET /health`

use crate::dialogs::{AnswerError, PendingDialogs};
use crate::notice::{Notice, NoticeBus};
use crate::service::TimerHandle;
use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use serde_json::json;
use splitcore::Command;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub timer: TimerHandle,
    pub notices: NoticeBus,
    pub dialogs: Arc<PendingDialogs>,
    pub start_time: Instant,
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/remote", get(remote_ws))
        .route("/events", get(events_ws))
        .route("/state", get(get_state))
        .route("/command", post(post_command))
        .route("/dialogs", get(list_dialogs))
        .route("/dialogs/{id}", post(answer_dialog).delete(dismiss_dialog))
        .route("/health", get(health))
        .with_state(state)
}

async fn health(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "version": env!("CARGO_PKG_VERSION"),
        "pending_dialogs": state.dialogs.pending_count(),
    }))
}

fn service_unavailable(error: anyhow::Error) -> Response {
    warn!("timer service unavailable: {}", error);
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": error.to_string()})),
    )
        .into_response()
}

async fn get_state(State(state): State<AppState>) -> Response {
    match state.timer.snapshot().await {
        Ok(snapshot) => Json(snapshot).into_response(),
        Err(e) => service_unavailable(e),
    }
}

#[tracing::instrument(name = "http.command", skip(state))]
async fn post_command(State(state): State<AppState>, Json(command): Json<Command>) -> Response {
    match state.timer.execute(command).await {
        Ok(Ok(event)) => (StatusCode::OK, Json(json!({"event": event}))).into_response(),
        Ok(Err(error)) => (
            StatusCode::CONFLICT,
            Json(json!({
                "error": error,
                "message": error.to_string(),
                "retryable": error.is_retryable(),
            })),
        )
            .into_response(),
        Err(e) => service_unavailable(e),
    }
}

async fn list_dialogs(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.dialogs.list())
}

#[derive(Debug, Deserialize)]
struct DialogAnswer {
    choice: usize,
}

async fn answer_dialog(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(answer): Json<DialogAnswer>,
) -> Response {
    match state.dialogs.answer(id, answer.choice) {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e @ AnswerError::NotFound(_)) => {
            (StatusCode::NOT_FOUND, Json(json!({"error": e.to_string()}))).into_response()
        }
        Err(e @ AnswerError::ChoiceOutOfRange { .. }) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

async fn dismiss_dialog(State(state): State<AppState>, Path(id): Path<Uuid>) -> StatusCode {
    if state.dialogs.dismiss(id) {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

async fn remote_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_remote(socket, state.timer))
}

/// One frame in, at most one frame out.
async fn handle_remote(socket: WebSocket, timer: TimerHandle) {
    let (mut sender, mut receiver) = socket.split();
    info!("remote control peer connected");

    while let Some(Ok(msg)) = receiver.next().await {
        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            _ => continue,
        };
        match timer.frame(text.as_str()).await {
            Ok(Some(reply)) => {
                if sender.send(Message::Text(reply.into())).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => {
                warn!("dropping remote peer: {}", e);
                break;
            }
        }
    }

    info!("remote control peer disconnected");
}

async fn events_ws(State(state): State<AppState>, ws: WebSocketUpgrade) -> impl IntoResponse {
    // Subscribe before the upgrade so nothing between handshake and loop is lost
    let notices = state.notices.subscribe();
    ws.on_upgrade(move |socket| handle_events(socket, notices))
}

async fn handle_events(socket: WebSocket, mut notices: broadcast::Receiver<Notice>) {
    let (mut sender, mut receiver) = socket.split();

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(notice) => {
                    let json = match serde_json::to_string(&notice) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!("failed to serialize notice: {}", e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json.into())).await.is_err() {
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "event subscriber lagged");
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    debug!("event subscriber disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serve::build_state;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use splitconf::BootstrapConfig;
    use tower::ServiceExt;

    fn app() -> (Router, AppState) {
        let mut bootstrap = BootstrapConfig::default();
        bootstrap.run.segments = vec!["Forest".to_string(), "Castle".to_string()];
        let state = build_state(&bootstrap).unwrap();
        (router(state.clone()), state)
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "healthy");
        assert_eq!(json["pending_dialogs"], 0);
    }

    #[tokio::test]
    async fn test_command_then_state() {
        let (app, _) = app();

        let response = app
            .clone()
            .oneshot(post_json("/command", json!({"command": "start"})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await, json!({"event": "Started"}));

        let response = app
            .oneshot(Request::builder().uri("/state").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["phase"], "Running");
        assert_eq!(json["current_split_index"], 0);
        assert_eq!(json["run"]["segments"][1]["name"], "Castle");
    }

    #[tokio::test]
    async fn test_refused_command_is_conflict() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json("/command", json!({"command": "split"})))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let json = body_json(response).await;
        assert_eq!(json["error"], "NoRunInProgress");
        assert_eq!(json["retryable"], false);
    }

    #[tokio::test]
    async fn test_unknown_command_is_rejected() {
        let (app, _) = app();
        let response = app
            .oneshot(post_json("/command", json!({"command": "explode"})))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_answering_unknown_dialog() {
        let (app, _) = app();
        let uri = format!("/dialogs/{}", Uuid::new_v4());

        let response = app
            .clone()
            .oneshot(post_json(&uri, json!({"choice": 0})))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(
                Request::builder()
                    .method("DELETE")
                    .uri(&uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_no_dialogs_listed_initially() {
        let (app, _) = app();
        let response = app
            .oneshot(Request::builder().uri("/dialogs").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(body_json(response).await, json!([]));
    }
}
