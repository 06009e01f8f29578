//! JSON API over the game service.
//!
//! The caller's identity arrives in the `x-player-id` header, set by the
//! authentication layer in front of this server. Storage is synchronous, so
//! every handler runs the service call on the blocking pool.

use crate::clock::Clock;
use crate::error::GameError;
use crate::room::{PlayerId, RoomId};
use crate::service::GameService;
use crate::store::GameStore;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, instrument, warn};

/// Header carrying the authenticated player id.
pub const PLAYER_HEADER: &str = "x-player-id";

/// An error rendered as `{"detail": ...}`.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, detail: impl Into<String>) -> Self {
        Self {
            status,
            detail: detail.into(),
        }
    }
}

impl From<GameError> for ApiError {
    fn from(err: GameError) -> Self {
        let status = err.status_code();
        if status.is_server_error() {
            error!(error = %err, "Request failed");
            // Storage details stay in the log.
            return Self::new(status, "Internal server error");
        }
        Self::new(status, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({ "detail": self.detail }))).into_response()
    }
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct Player(pub PlayerId);

impl<St: Send + Sync> FromRequestParts<St> for Player {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(PLAYER_HEADER)
            .and_then(|value| value.to_str().ok())
            .filter(|value| !value.is_empty())
            .map(|value| Player(value.to_string()))
            .ok_or_else(|| {
                warn!("Request without player id");
                ApiError::new(StatusCode::UNAUTHORIZED, "Authentication required")
            })
    }
}

/// Body of `POST /create_room`.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Unique room name.
    pub room_name: String,
    /// Seconds between the last stage read and advancing.
    #[serde(default)]
    pub min_move_time: Option<i64>,
}

/// Body of the requests that only name a room.
#[derive(Debug, Deserialize)]
pub struct RoomRequest {
    /// Target room.
    pub room_id: RoomId,
}

/// Body of `POST /submit_action`.
#[derive(Debug, Deserialize)]
pub struct SubmitActionRequest {
    /// Target room.
    pub room_id: RoomId,
    /// Selected card positions.
    #[serde(default)]
    pub selected_cards: Vec<usize>,
}

/// Body of `POST /shoot_card`.
#[derive(Debug, Deserialize)]
pub struct ShootCardRequest {
    /// Target room.
    pub room_id: RoomId,
    /// Accused card position.
    pub card_position: usize,
}

type Shared<S, C> = Arc<GameService<S, C>>;

/// Runs a service call on the blocking pool.
async fn blocking<T, F>(f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, GameError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| {
            error!(error = %e, "Service task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
        })?
        .map_err(ApiError::from)
}

fn detail(message: &str) -> Json<serde_json::Value> {
    Json(json!({ "detail": message }))
}

/// Builds the API router.
pub fn router<S, C>(service: Shared<S, C>) -> Router
where
    S: GameStore + 'static,
    C: Clock + 'static,
{
    Router::new()
        .route("/rooms", get(list_rooms::<S, C>))
        .route("/create_room", post(create_room::<S, C>))
        .route("/delete_room", post(delete_room::<S, C>))
        .route("/join_room", post(join_room::<S, C>))
        .route("/leave_room", post(leave_room::<S, C>))
        .route("/start_game", post(start_game::<S, C>))
        .route("/game_stage", post(game_stage::<S, C>))
        .route("/game_history", get(game_history::<S, C>))
        .route("/submit_action", post(submit_action::<S, C>))
        .route("/shoot_card", post(shoot_card::<S, C>))
        .with_state(service)
}

#[instrument(skip(service))]
async fn list_rooms<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
) -> Result<Response, ApiError> {
    let rooms = blocking(move || service.list_rooms()).await?;
    Ok(Json(json!({ "rooms": rooms })).into_response())
}

#[instrument(skip(service))]
async fn create_room<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Response, ApiError> {
    let room = blocking(move || service.create_room(&player, &req.room_name, req.min_move_time))
        .await?;
    Ok((StatusCode::CREATED, Json(room)).into_response())
}

#[instrument(skip(service))]
async fn delete_room<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<RoomRequest>,
) -> Result<Response, ApiError> {
    blocking(move || service.delete_room(&player, req.room_id)).await?;
    Ok(detail("Room deleted").into_response())
}

#[instrument(skip(service))]
async fn join_room<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<RoomRequest>,
) -> Result<Response, ApiError> {
    let room = blocking(move || service.join_room(&player, req.room_id)).await?;
    Ok((StatusCode::CREATED, Json(room)).into_response())
}

#[instrument(skip(service))]
async fn leave_room<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<RoomRequest>,
) -> Result<Response, ApiError> {
    blocking(move || service.leave_room(&player, req.room_id)).await?;
    Ok(detail("Left room").into_response())
}

#[instrument(skip(service))]
async fn start_game<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<RoomRequest>,
) -> Result<Response, ApiError> {
    blocking(move || service.start_game(&player, req.room_id)).await?;
    Ok(detail("Game started").into_response())
}

#[instrument(skip(service))]
async fn game_stage<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<RoomRequest>,
) -> Result<Response, ApiError> {
    let stage = blocking(move || service.get_game_stage(&player, req.room_id)).await?;
    Ok(Json(json!({ "game_stage": stage })).into_response())
}

#[instrument(skip(service))]
async fn game_history<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Query(req): Query<RoomRequest>,
) -> Result<Response, ApiError> {
    let history = blocking(move || service.get_history(&player, req.room_id)).await?;
    Ok(Json(history).into_response())
}

#[instrument(skip(service))]
async fn submit_action<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<SubmitActionRequest>,
) -> Result<Response, ApiError> {
    blocking(move || service.submit_action(&player, req.room_id, &req.selected_cards)).await?;
    Ok(detail("Action recorded").into_response())
}

#[instrument(skip(service))]
async fn shoot_card<S: GameStore + 'static, C: Clock + 'static>(
    State(service): State<Shared<S, C>>,
    Player(player): Player,
    Json(req): Json<ShootCardRequest>,
) -> Result<Response, ApiError> {
    blocking(move || service.shoot_card(&player, req.room_id, req.card_position)).await?;
    Ok(detail("Shot recorded").into_response())
}
