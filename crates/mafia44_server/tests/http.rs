//! JSON API tests, driven through the router without a socket.

use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode};
use http_body_util::BodyExt;
use mafia44_server::{GameService, ManualClock, MemoryStore, PLAYER_HEADER, router};
use serde_json::{Value, json};
use tower::ServiceExt;

fn app() -> Router {
    router(GameService::new(MemoryStore::new(), ManualClock::default(), 5).shared())
}

fn post(path: &str, player: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header("content-type", "application/json");
    if let Some(player) = player {
        builder = builder.header(PLAYER_HEADER, player);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(path: &str, player: &str) -> Request<Body> {
    Request::builder()
        .uri(path)
        .header(PLAYER_HEADER, player)
        .body(Body::empty())
        .unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

async fn create_room(app: &Router) -> i64 {
    let (status, body) = send(
        app,
        post("/create_room", Some("alice"), json!({ "room_name": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_i64().unwrap()
}

#[tokio::test]
async fn test_missing_identity_is_unauthorized() {
    let app = app();
    let (status, body) = send(&app, post("/create_room", None, json!({ "room_name": "t" }))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["detail"], "Authentication required");
}

#[tokio::test]
async fn test_create_and_list_rooms() {
    let app = app();
    let room_id = create_room(&app).await;

    let (status, body) = send(&app, get("/rooms", "bob")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rooms"][0]["id"], room_id);
    assert_eq!(body["rooms"][0]["players"], json!(["alice"]));
    assert_eq!(body["rooms"][0]["is_game_started"], false);

    let (status, body) = send(
        &app,
        post("/create_room", Some("bob"), json!({ "room_name": "table" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["detail"], "Room already exists");
}

#[tokio::test]
async fn test_join_start_and_poll() {
    let app = app();
    let room_id = create_room(&app).await;

    for player in ["bob", "carol", "dave"] {
        let (status, body) =
            send(&app, post("/join_room", Some(player), json!({ "room_id": room_id }))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(body["players"].as_array().unwrap().contains(&json!(player)));
    }

    let (status, body) =
        send(&app, post("/join_room", Some("erin"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "Room is full");

    let (status, body) =
        send(&app, post("/start_game", Some("bob"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["detail"], "User is not the creator of the room");

    let (status, _) =
        send(&app, post("/start_game", Some("alice"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) =
        send(&app, post("/game_stage", Some("carol"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["game_stage"], 0);

    let (status, body) = send(
        &app,
        get(&format!("/game_history?room_id={}", room_id), "carol"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "in_progress");
}

#[tokio::test]
async fn test_game_calls_before_start() {
    let app = app();
    let room_id = create_room(&app).await;

    let (status, body) =
        send(&app, post("/game_stage", Some("alice"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Game has not started");

    let (status, body) = send(
        &app,
        post("/shoot_card", Some("alice"), json!({ "room_id": 999, "card_position": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["detail"], "Room not found");
}

#[tokio::test]
async fn test_delete_room() {
    let app = app();
    let room_id = create_room(&app).await;

    let (status, _) =
        send(&app, post("/delete_room", Some("bob"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) =
        send(&app, post("/delete_room", Some("alice"), json!({ "room_id": room_id }))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["detail"], "Room deleted");

    let (_, body) = send(&app, get("/rooms", "alice")).await;
    assert_eq!(body["rooms"], json!([]));
}
