//! Router-level tests against an in-memory store and a hand-driven clock.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use race::{
    checkpoint::CheckpointType,
    clock::ManualClock,
    create_router,
    live::LiveEngine,
    models::{Athlete, Checkpoint, PredictedDurations, RaceTemplate, RecordedTime},
    poller::Poller,
    route::{RouteDrawing, RoutePoint},
    snapshot::RaceSnapshot,
    store::{MemoryStore, RaceStore},
};
use serde_json::{Value, json};
use time::{Duration, OffsetDateTime, macros::datetime};
use tower::ServiceExt;
use uuid::Uuid;

const GUN: OffsetDateTime = datetime!(2026-06-01 07:00:00 UTC);

fn race_id() -> Uuid {
    Uuid::from_u128(7)
}

fn checkpoint_id(t: CheckpointType) -> Uuid {
    Uuid::from_u128(700 + t as u128)
}

fn athlete_id(n: u128) -> Uuid {
    Uuid::from_u128(7000 + n)
}

fn square() -> RouteDrawing {
    RouteDrawing {
        points: vec![
            RoutePoint::new(0.0, 0.0),
            RoutePoint::new(100.0, 0.0),
            RoutePoint::new(100.0, 100.0),
            RoutePoint::new(0.0, 100.0),
            RoutePoint::new(0.0, 0.0),
        ],
        lap_count: 1,
    }
}

fn race() -> RaceSnapshot {
    let template = RaceTemplate {
        id: race_id(),
        name: "Harbour Sprint".into(),
        swim_distance_km: 0.75,
        bike_distance_km: 20.0,
        run_distance_km: 5.0,
        swim_route: square(),
        bike_route: RouteDrawing {
            lap_count: 2,
            ..square()
        },
        run_route: square(),
    };
    let checkpoints = [
        CheckpointType::SwimStart,
        CheckpointType::SwimEnd,
        CheckpointType::T1End,
        CheckpointType::T2End,
        CheckpointType::Finish,
    ]
    .into_iter()
    .enumerate()
    .map(|(i, t)| Checkpoint {
        id: checkpoint_id(t),
        template_id: race_id(),
        checkpoint_type: t,
        order_index: i as i32,
        distance_km: None,
    })
    .collect();
    let athlete = |n: u128, name: &str, swim: &str| Athlete {
        id: athlete_id(n),
        template_id: race_id(),
        name: name.into(),
        predicted: PredictedDurations {
            swim: Some(swim.into()),
            bike: Some("0:40:00".into()),
            run: Some("0:25:00".into()),
        },
    };
    let start = |n| RecordedTime {
        athlete_id: athlete_id(n),
        checkpoint_id: checkpoint_id(CheckpointType::SwimStart),
        actual_timestamp: GUN,
    };
    RaceSnapshot::new(
        template,
        checkpoints,
        vec![
            athlete(1, "Ada", "0:15:00"),
            athlete(2, "Ben", "0:10:00"),
            athlete(3, "Cy", "0:12:00"),
        ],
        vec![start(1), start(2)],
    )
}

async fn setup() -> (Router, Arc<MemoryStore>, Arc<ManualClock>) {
    let store = Arc::new(MemoryStore::new());
    store.insert_race(race()).await;
    let clock = Arc::new(ManualClock::new(GUN + Duration::minutes(5)));
    let router = create_router(store.clone(), clock.clone(), LiveEngine::default(), None);
    (router, store, clock)
}

async fn send(router: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn get(uri: &str) -> Request<Body> {
    Request::get(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::put(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_returns_ok() {
    let (router, _, _) = setup().await;
    let response = router.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_live_view_ranks_faster_swimmer_first() {
    let (router, _, _) = setup().await;
    let (status, body) = send(&router, get(&format!("/races/{}/live", race_id()))).await;
    assert_eq!(status, StatusCode::OK);

    let leaderboard = body["leaderboard"].as_array().unwrap();
    assert_eq!(leaderboard[0]["name"], "Ben");
    assert_eq!(leaderboard[0]["rank"], 1);
    assert_eq!(leaderboard[0]["status"], "swim");
    assert_eq!(leaderboard[1]["name"], "Ada");
    assert_eq!(leaderboard[2]["name"], "Cy");
    assert_eq!(leaderboard[2]["rank"], 0);
    assert_eq!(leaderboard[2]["status"], "waiting");

    let swim = &body["segments"][0];
    assert_eq!(swim["discipline"], "swim");
    assert_eq!(swim["dots"].as_array().unwrap().len(), 2);
    assert_eq!(swim["waiting"][0], athlete_id(3).to_string());
    assert_eq!(body["generated_at"], "2026-06-01T07:05:00Z");
}

#[tokio::test]
async fn test_live_view_at_explicit_instant() {
    let (router, _, _) = setup().await;
    let uri = format!("/races/{}/live?at=2026-06-01T07:10:00Z", race_id());
    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    // Ben's predicted 10 minute swim is over: he sits on the swim finish.
    let ben = &body["segments"][0]["dots"][0];
    assert_eq!(ben["name"], "Ben");
    assert_eq!(ben["status"], "finished");
    assert_eq!(ben["distance_covered"], 750.0);
}

#[tokio::test]
async fn test_live_view_rejects_bad_instant() {
    let (router, _, _) = setup().await;
    let uri = format!("/races/{}/live?at=yesterday", race_id());
    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("yesterday"));
}

#[tokio::test]
async fn test_unknown_race_is_not_found() {
    let (router, _, _) = setup().await;
    let (status, body) = send(&router, get(&format!("/races/{}/live", Uuid::nil()))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}

#[tokio::test]
async fn test_leaderboard_follows_clock() {
    let (router, _, clock) = setup().await;
    let uri = format!("/races/{}/leaderboard", race_id());

    let (_, before) = send(&router, get(&uri)).await;
    let ben_before = before[0]["distance_covered"].as_f64().unwrap();

    clock.advance(Duration::minutes(2));
    let (_, after) = send(&router, get(&uri)).await;
    let ben_after = after[0]["distance_covered"].as_f64().unwrap();
    assert!(ben_after > ben_before);
}

#[tokio::test]
async fn test_record_then_correct_crossing() {
    let (router, store, _) = setup().await;
    let uri = format!("/races/{}/recorded-times", race_id());
    let body = |timestamp: &str| {
        json!({
            "athlete_id": athlete_id(2),
            "checkpoint_id": checkpoint_id(CheckpointType::SwimEnd),
            "timestamp": timestamp,
        })
    };

    let (status, created) = send(&router, put_json(&uri, body("07:09:30"))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["outcome"], "inserted");
    assert_eq!(created["recorded"]["actual_timestamp"], "2026-06-01T07:09:30Z");

    let (status, corrected) = send(&router, put_json(&uri, body("2026-06-01T07:09:41Z"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corrected["outcome"], "corrected");

    let snapshot = store.load_snapshot(race_id()).await.unwrap();
    assert_eq!(
        snapshot.time_at(athlete_id(2), CheckpointType::SwimEnd),
        Some(datetime!(2026-06-01 07:09:41 UTC))
    );
}

#[tokio::test]
async fn test_record_rejects_bad_input() {
    let (router, _, _) = setup().await;
    let uri = format!("/races/{}/recorded-times", race_id());

    let bad_time = json!({
        "athlete_id": athlete_id(1),
        "checkpoint_id": checkpoint_id(CheckpointType::SwimEnd),
        "timestamp": "7h09",
    });
    let (status, _) = send(&router, put_json(&uri, bad_time)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let foreign_checkpoint = json!({
        "athlete_id": athlete_id(1),
        "checkpoint_id": Uuid::nil(),
        "timestamp": "07:09:30",
    });
    let (status, body) = send(&router, put_json(&uri, foreign_checkpoint)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("does not belong"));

    let unknown_athlete = json!({
        "athlete_id": Uuid::nil(),
        "checkpoint_id": checkpoint_id(CheckpointType::SwimEnd),
        "timestamp": "07:09:30",
    });
    let (status, _) = send(&router, put_json(&uri, unknown_athlete)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delete_crossing() {
    let (router, _, _) = setup().await;
    let uri = format!(
        "/races/{}/recorded-times/{}/{}",
        race_id(),
        athlete_id(1),
        checkpoint_id(CheckpointType::SwimStart)
    );
    let delete = || Request::delete(&uri).body(Body::empty()).unwrap();

    let (status, _) = send(&router, delete()).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&router, delete()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    // Ada is back to waiting.
    let (_, leaderboard) = send(&router, get(&format!("/races/{}/leaderboard", race_id()))).await;
    let ada = leaderboard
        .as_array()
        .unwrap()
        .iter()
        .find(|e| e["name"] == "Ada")
        .unwrap();
    assert_eq!(ada["rank"], 0);
}

#[tokio::test]
async fn test_deviations_after_swim() {
    let (router, store, _) = setup().await;
    store
        .upsert_recorded_time(
            race_id(),
            RecordedTime {
                athlete_id: athlete_id(1),
                checkpoint_id: checkpoint_id(CheckpointType::SwimEnd),
                actual_timestamp: GUN + Duration::minutes(16),
            },
        )
        .await
        .unwrap();

    let uri = format!("/races/{}/athletes/{}/deviations", race_id(), athlete_id(1));
    let (status, report) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(report["rows"][0]["difference_formatted"], "+00:01:00");
    assert_eq!(report["rows"][0]["direction"], "slower");
    assert_eq!(report["rows"][1]["actual"], "--:--:--");
    assert_eq!(report["original_predicted_total"], "01:20:00");
    assert_eq!(report["adjustment"], "+00:01:00");

    let missing = format!("/races/{}/athletes/{}/deviations", race_id(), Uuid::nil());
    let (status, _) = send(&router, get(&missing)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_openapi_document_lists_routes() {
    let (router, _, _) = setup().await;
    let (status, doc) = send(&router, get("/openapi.json")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(doc["paths"]["/races/{id}/live"].is_object());
    assert!(doc["paths"]["/races/{id}/recorded-times"].is_object());
}

#[tokio::test]
async fn test_live_view_served_from_poller() {
    let store = Arc::new(MemoryStore::new());
    store.insert_race(race()).await;
    let clock = Arc::new(ManualClock::new(GUN + Duration::minutes(5)));
    let poller = Poller::new(store.clone(), clock.clone(), LiveEngine::default(), race_id());
    let router = create_router(
        store.clone(),
        clock.clone(),
        LiveEngine::default(),
        Some(poller.feed()),
    );
    let uri = format!("/races/{}/live", race_id());

    // Nothing published yet: computed on demand.
    let (_, body) = send(&router, get(&uri)).await;
    assert_eq!(body["generated_at"], "2026-06-01T07:05:00Z");

    poller.tick().await.unwrap();
    clock.advance(Duration::minutes(3));

    let (status, body) = send(&router, get(&uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["generated_at"], "2026-06-01T07:05:00Z");

    // An explicit instant always recomputes.
    let (_, body) = send(&router, get(&format!("{uri}?at=2026-06-01T07:08:00Z"))).await;
    assert_eq!(body["generated_at"], "2026-06-01T07:08:00Z");
}
