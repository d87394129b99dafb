//! Integration tests for the daemon's reset prompt over HTTP

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use splitconf::{BootstrapConfig, ResetPolicy};
use splitd::{build_state, router, AppState, NoticeKind};
use std::time::Duration;
use tower::ServiceExt;
use uuid::Uuid;

fn daemon(policy: ResetPolicy) -> (Router, AppState) {
    let mut bootstrap = BootstrapConfig::default();
    bootstrap.run.segments = vec!["Forest".to_string(), "Castle".to_string()];
    bootstrap.reset.on_new_best_times = policy;
    let state = build_state(&bootstrap).unwrap();
    (router(state.clone()), state)
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let request = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => request
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn command(app: &Router, name: &str) -> (StatusCode, Value) {
    send(app, "POST", "/command", Some(json!({"command": name}))).await
}

/// Start and split once so the attempt holds a new best segment.
async fn attempt_with_best_times(app: &Router) {
    assert_eq!(command(app, "start").await.0, StatusCode::OK);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(command(app, "split").await.1, json!({"event": "Splitted"}));
}

#[tokio::test]
async fn test_reset_prompt_answered_over_http() {
    let (app, state) = daemon(ResetPolicy::Ask);
    let mut notices = state.notices.subscribe();
    attempt_with_best_times(&app).await;

    let resetting = {
        let app = app.clone();
        tokio::spawn(async move { command(&app, "reset").await })
    };

    let id: Uuid = loop {
        if let NoticeKind::DialogOpened { id, request } = notices.recv().await.unwrap().kind {
            assert_eq!(request.buttons, vec!["Yes", "No", "Don't Reset"]);
            break id;
        }
    };

    let (status, listed) = send(&app, "GET", "/dialogs", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed[0]["id"], id.to_string());
    assert_eq!(listed[0]["title"], "Save Best Times?");

    // Everything else is refused while the runner decides
    let (status, body) = command(&app, "split").await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "Busy");
    assert_eq!(body["retryable"], true);
    assert_eq!(state.timer.frame("undo").await.unwrap(), None);
    assert_eq!(
        state.timer.frame("getcurrenttimerphase").await.unwrap(),
        Some("Running".to_string())
    );

    let (status, _) = send(&app, "POST", &format!("/dialogs/{id}"), Some(json!({"choice": 0}))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    assert_eq!(resetting.await.unwrap(), (StatusCode::OK, json!({"event": "Reset"})));
    let (_, snapshot) = send(&app, "GET", "/state", None).await;
    assert_eq!(snapshot["phase"], "NotRunning");
    assert!(snapshot["run"]["segments"][0]["best_segment_time"]["real_time"].is_number());
    assert_eq!(snapshot["run"]["attempt_count"], 1);
}

#[tokio::test]
async fn test_dismissed_prompt_keeps_attempt() {
    let (app, state) = daemon(ResetPolicy::Ask);
    let mut notices = state.notices.subscribe();
    attempt_with_best_times(&app).await;

    let resetting = {
        let app = app.clone();
        tokio::spawn(async move { command(&app, "reset").await })
    };
    let id = loop {
        if let NoticeKind::DialogOpened { id, .. } = notices.recv().await.unwrap().kind {
            break id;
        }
    };

    let (status, _) = send(&app, "DELETE", &format!("/dialogs/{id}"), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = resetting.await.unwrap();
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "RunnerDecidedAgainstReset");
    assert_eq!(body["retryable"], false);
    assert_eq!(command(&app, "split").await.1, json!({"event": "Finished"}));
}

#[tokio::test]
async fn test_remote_reset_does_not_block_queries() {
    let (app, state) = daemon(ResetPolicy::Ask);
    let mut notices = state.notices.subscribe();
    attempt_with_best_times(&app).await;

    assert_eq!(state.timer.frame("reset").await.unwrap(), None);
    let id = loop {
        if let NoticeKind::DialogOpened { id, .. } = notices.recv().await.unwrap().kind {
            break id;
        }
    };
    assert_eq!(
        state.timer.frame("getcurrenttimerphase").await.unwrap(),
        Some("Running".to_string())
    );

    state.dialogs.answer(id, 1).unwrap();
    loop {
        if let NoticeKind::Event { event } = notices.recv().await.unwrap().kind {
            assert_eq!(event, splitcore::Event::Reset);
            break;
        }
    }
    assert_eq!(
        state.timer.frame("getcurrenttimerphase").await.unwrap(),
        Some("NotRunning".to_string())
    );
}

#[tokio::test]
async fn test_fixed_policy_never_prompts() {
    let (app, state) = daemon(ResetPolicy::Discard);
    attempt_with_best_times(&app).await;

    assert_eq!(command(&app, "reset").await.1, json!({"event": "Reset"}));
    assert_eq!(state.dialogs.pending_count(), 0);
    let (_, snapshot) = send(&app, "GET", "/state", None).await;
    assert_eq!(
        snapshot["run"]["segments"][0]["best_segment_time"]["real_time"],
        Value::Null
    );
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_prompting_reset_refuses_frames_queued_behind_it() {
    for _ in 0..25 {
        let (app, state) = daemon(ResetPolicy::Ask);
        attempt_with_best_times(&app).await;

        assert_eq!(state.timer.frame("reset").await.unwrap(), None);
        assert_eq!(state.timer.frame("split").await.unwrap(), None);

        let snapshot = state.timer.snapshot().await.unwrap();
        assert_eq!(snapshot.phase, splitcore::TimerPhase::Running);
        assert_eq!(snapshot.current_split_index, Some(1));
    }
}

#[tokio::test]
async fn test_extreme_remote_times_leave_service_running() {
    let (_app, state) = daemon(ResetPolicy::Save);
    for frame in [
        "start",
        "initgametime",
        "setloadingtimes 9000000000",
        "split",
        "setgametime 9000000000",
        "split",
        "reset",
    ] {
        assert_eq!(state.timer.frame(frame).await.unwrap(), None);
    }

    let snapshot = state.timer.snapshot().await.unwrap();
    assert_eq!(snapshot.phase, splitcore::TimerPhase::NotRunning);
    assert_eq!(snapshot.run.attempt_count, 1);
}
