//! Game endpoints: snapshot, move submission, rematch

use crate::error::ApiError;
use crate::state::ServerState;
use axum::{
    extract::{Path, State},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use uttt_core::GameState;
use uttt_sync::{MoveAccepted, RoomSnapshot, SeatRequest, SubmitMoveRequest};

/// Current room snapshot
pub async fn get_game(
    State(state): State<Arc<ServerState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomSnapshot>, ApiError> {
    Ok(Json(state.store.get(&room_id)?))
}

/// Validate and apply a move against the expected version
pub async fn submit_move(
    State(state): State<Arc<ServerState>>,
    Path(room_id): Path<String>,
    Json(req): Json<SubmitMoveRequest>,
) -> Result<Json<MoveAccepted>, ApiError> {
    match state
        .store
        .apply_validated_move(&room_id, req.mv, req.expected_version)
    {
        Ok(accepted) => {
            tracing::info!(room = %room_id, mv = %req.mv, version = accepted.version, "move applied");
            Ok(Json(accepted))
        }
        Err(rejection) => {
            tracing::warn!(
                room = %room_id,
                mv = %req.mv,
                expected = req.expected_version,
                kind = rejection.kind(),
                "move rejected"
            );
            Err(rejection.into())
        }
    }
}

/// Flag a rematch request; once both players asked, start a fresh game
pub async fn request_rematch(
    State(state): State<Arc<ServerState>>,
    Path(room_id): Path<String>,
    Json(req): Json<SeatRequest>,
) -> Result<Json<Value>, ApiError> {
    let player = req.player.ok_or_else(|| ApiError::bad_request("Missing player"))?;

    let mut both_ready = false;
    let room = state.store.update_room(&room_id, &mut |room| {
        both_ready = room.request_rematch(player);
    })?;

    if !both_ready {
        return Ok(Json(json!({
            "success": true,
            "reset": false,
            "version": room.version,
        })));
    }

    let version = state.store.update_raw(&room_id, GameState::new())?;
    tracing::info!(room = %room_id, version, "rematch started");

    Ok(Json(json!({
        "success": true,
        "reset": true,
        "version": version,
    })))
}
