//! Room lobby endpoints: create, join, leave, rejoin

use crate::error::ApiError;
use crate::state::ServerState;
use axum::{extract::State, http::StatusCode, Json};
use serde_json::{json, Value};
use std::sync::Arc;
use uttt_core::{GameState, Player};
use uttt_sync::{
    CreateRoomRequest, CreateRoomResponse, JoinRoomRequest, RoomId, SeatRequest, StoreError,
};

/// Create a room; the creator plays X
pub async fn create_room(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<CreateRoomResponse>, ApiError> {
    let password = req.password.unwrap_or_default();
    let room_id = state.store.create(&password, GameState::new())?;
    tracing::info!(room = %room_id, locked = !password.is_empty(), "room created");
    Ok(Json(CreateRoomResponse { room_id }))
}

/// Take the O seat
pub async fn join_room(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<JoinRoomRequest>,
) -> Result<Json<Value>, ApiError> {
    let room = state.store.room(&req.room_id)?;
    if !room.check_password(req.password.as_deref()) {
        tracing::warn!(room = %req.room_id, "join with wrong password");
        return Err(ApiError::invalid_password(StatusCode::UNAUTHORIZED));
    }

    state.store.update_room(&req.room_id, &mut |room| room.join())?;
    tracing::info!(room = %req.room_id, "player O joined");

    Ok(Json(json!({
        "success": true,
        "roomId": req.room_id,
        "player": Player::O,
    })))
}

/// Room and seat named by a leave/rejoin request; both are required
fn seat(req: &SeatRequest) -> Result<(RoomId, Player), ApiError> {
    match (req.room_id.as_deref(), req.player) {
        (Some(room_id), Some(player)) if !room_id.is_empty() => Ok((room_id.to_string(), player)),
        _ => Err(ApiError::bad_request("Missing roomId or player")),
    }
}

/// Mark a player as gone. A room that no longer exists counts as success.
pub async fn leave_room(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<Value>, ApiError> {
    let (room_id, player) = seat(&req)?;

    match state.store.update_room(&room_id, &mut |room| room.leave(player)) {
        Ok(_) => {
            tracing::info!(room = %room_id, %player, "player left");
            Ok(Json(json!({ "success": true })))
        }
        Err(StoreError::NotFound(_)) => Ok(Json(json!({
            "success": true,
            "message": "Room already gone",
        }))),
        Err(err) => Err(err.into()),
    }
}

/// Reclaim a seat after a disconnect
pub async fn rejoin_room(
    State(state): State<Arc<ServerState>>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<Value>, ApiError> {
    let (room_id, player) = seat(&req)?;

    let room = state.store.room(&room_id)?;
    if !room.check_password(req.password.as_deref()) {
        tracing::warn!(room = %room_id, "rejoin with wrong password");
        return Err(ApiError::invalid_password(StatusCode::FORBIDDEN));
    }

    let room = state
        .store
        .update_room(&room_id, &mut |room| room.rejoin(player))?;
    tracing::info!(room = %room_id, %player, "player rejoined");

    Ok(Json(json!({
        "success": true,
        "room": room.snapshot(),
    })))
}
