use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use coach_core::{
    CancelDialog, CancelOutcome, CoachingController, HttpCoachingApi, NextTransition, Settings,
};
use serde_json::{json, Value};
use shared::domain::{CancellationReason, InjuryArea, RoutineId};
use tokio::{net::TcpListener, sync::Mutex};

#[derive(Clone, Default)]
struct Backend {
    next_calls: Arc<Mutex<u32>>,
    cancel_bodies: Arc<Mutex<Vec<Value>>>,
}

async fn recommend(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body, json!({"total_time_min": 30}));
    Json(json!([
        {"ai_routine_id": "41", "strategy": "efficiency_based",
         "total_time_min": 29.5, "total_calories": 210.0, "score": 90.0,
         "exercises": [
            {"exercise_id": "7", "name": "Plank", "sets": 3, "reps": 0,
             "rest_sec": 30, "duration_sec": 45, "est_calories": 15.0,
             "name_ko": "Plank", "category_ko": "core"},
            {"exercise_id": "8", "name": "Crunch", "sets": 3, "reps": 15,
             "rest_sec": 30, "duration_sec": 0, "est_calories": 18.0,
             "name_ko": "Crunch", "category_ko": "core"}
         ]},
        {"ai_routine_id": "42", "strategy": "time_based",
         "total_time_min": 29.0, "total_calories": 190.0, "score": 85.0,
         "exercises": []}
    ]))
}

async fn start(Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body, json!({"ai_routine_id": "41"}));
    Json(json!({
        "coaching_session_id": "s1",
        "tts_text": "Plank for forty-five seconds",
        "tts_audio": "SUQz",
        "current_index": 0
    }))
}

async fn next(State(backend): State<Backend>, Json(body): Json<Value>) -> Json<Value> {
    assert_eq!(body, json!({"coaching_session_id": "s1"}));
    let mut calls = backend.next_calls.lock().await;
    *calls += 1;
    if *calls == 1 {
        Json(json!({
            "coaching_session_id": "s1",
            "tts_text": "Now crunches",
            "tts_audio": "SUQz",
            "current_index": 1
        }))
    } else {
        Json(json!({
            "status": "FINISHED",
            "tts_text": "Workout finished, great effort",
            "tts_audio": "SUQz",
            "current_index": 1
        }))
    }
}

async fn cancel(State(backend): State<Backend>, Json(body): Json<Value>) -> StatusCode {
    backend.cancel_bodies.lock().await.push(body);
    StatusCode::INTERNAL_SERVER_ERROR
}

async fn spawn_backend() -> (String, Backend) {
    std::env::set_var("NO_PROXY", "127.0.0.1,localhost");
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    let backend = Backend::default();
    let app = Router::new()
        .route("/api/v1/routines/recommend", post(recommend))
        .route("/api/v1/coaching/start", post(start))
        .route("/api/v1/coaching/next", post(next))
        .route("/api/v1/coaching/cancel", post(cancel))
        .with_state(backend.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}"), backend)
}

fn controller_for(server_url: String) -> CoachingController {
    let settings = Settings {
        api_url: server_url,
        auth_token: Some("token".into()),
        request_timeout_secs: Some(10),
    };
    let api = HttpCoachingApi::from_settings(&settings).expect("api client");
    CoachingController::new(Arc::new(api))
}

#[tokio::test]
async fn routine_runs_from_duration_to_finish() {
    let (server_url, _backend) = spawn_backend().await;
    let controller = controller_for(server_url);

    assert_eq!(controller.choose_duration(30).await.expect("candidates"), 2);
    assert_eq!(controller.snapshot().await.cards.len(), 2);

    controller
        .select_candidate(RoutineId::new("41"))
        .await
        .expect("start")
        .expect("session");
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase_name(), "active");
    assert_eq!(snapshot.current_index(), Some(0));

    assert_eq!(
        controller.next().await.expect("advance"),
        NextTransition::Advanced { current_index: 1 }
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase_name(), "active");
    assert_eq!(snapshot.current_index(), Some(1));
    assert_eq!(
        snapshot.guidance().map(|g| g.text.clone()),
        Some("Now crunches".to_string())
    );

    assert_eq!(
        controller.next().await.expect("finish"),
        NextTransition::Finished
    );
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase_name(), "finished");
    assert_eq!(
        snapshot.closing().map(|g| g.text.as_str()),
        Some("Workout finished, great effort")
    );
}

#[tokio::test]
async fn injury_cancel_returns_to_idle_despite_server_error() {
    let (server_url, backend) = spawn_backend().await;
    let controller = controller_for(server_url);

    controller.choose_duration(30).await.expect("candidates");
    controller
        .select_candidate(RoutineId::new("41"))
        .await
        .expect("start");

    let mut dialog = CancelDialog::default();
    dialog.open();
    dialog.set_reason(CancellationReason::Injury);
    dialog.set_injury_area(InjuryArea::Knee);
    let outcome = dialog.confirm(&controller).await.expect("local cancel");

    assert!(matches!(outcome, CancelOutcome::NotAcknowledged(_)));
    assert!(!dialog.is_open());
    let snapshot = controller.snapshot().await;
    assert_eq!(snapshot.phase_name(), "idle");
    assert!(snapshot.selected().is_none());
    assert!(snapshot.guidance().is_none());

    let bodies = backend.cancel_bodies.lock().await.clone();
    assert_eq!(
        bodies,
        vec![json!({
            "coaching_session_id": "s1",
            "cancellation_reason": "INJURY",
            "injury_area": "KNEE"
        })]
    );
}
