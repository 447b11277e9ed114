//! Per-user Kanban board endpoints
//!
//! Boards are keyed by an opaque owner string. Every write that shifts
//! positions runs in one transaction so lanes stay dense.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::Deserialize;
use stagedirect_common::db::KanbanCard;
use stagedirect_common::kanban::{next_position, plan_move};
use tracing::{debug, info};

use super::companies::reference_error;
use crate::db::kanban;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    #[serde(alias = "column")]
    pub lane: String,
    pub title: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub company_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MoveCardRequest {
    #[serde(alias = "column")]
    pub lane: String,
    pub position: usize,
}

/// GET /api/kanban/:owner
pub async fn get_board(
    State(state): State<AppState>,
    Path(owner): Path<String>,
) -> ApiResult<Json<Vec<KanbanCard>>> {
    Ok(Json(kanban::list_board(&state.db, &owner).await?))
}

/// POST /api/kanban/:owner/cards (appends to the end of the lane)
pub async fn create_card(
    State(state): State<AppState>,
    Path(owner): Path<String>,
    payload: Result<Json<CreateCardRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<KanbanCard>)> {
    let Json(request) = payload?;
    let lane = request.lane.trim();
    if lane.is_empty() || request.title.trim().is_empty() {
        return Err(ApiError::BadRequest("card lane and title are required".to_string()));
    }

    let mut tx = state.db.begin().await?;
    let board = kanban::list_board(&mut *tx, &owner).await?;
    let position = next_position(&board, lane);
    let id = kanban::insert_card(
        &mut *tx,
        &owner,
        lane,
        position,
        request.title.trim(),
        request.notes.as_deref(),
        request.company_id,
    )
    .await
    .map_err(|e| reference_error(e, "company"))?;
    let card = kanban::load_card(&mut *tx, &owner, id)
        .await?
        .ok_or_else(|| ApiError::Internal(format!("kanban card {} vanished after insert", id)))?;
    tx.commit().await?;

    info!(owner = %owner, id, lane, "Kanban card created");
    Ok((StatusCode::CREATED, Json(card)))
}

/// POST /api/kanban/:owner/cards/:id/move; returns the whole board
pub async fn move_card(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, i64)>,
    payload: Result<Json<MoveCardRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<KanbanCard>>> {
    let Json(request) = payload?;

    let mut tx = state.db.begin().await?;
    let board = kanban::list_board(&mut *tx, &owner).await?;
    let plan = plan_move(&board, id, &request.lane, request.position)?;
    kanban::apply_placements(&mut tx, &plan).await?;
    let board = kanban::list_board(&mut *tx, &owner).await?;
    tx.commit().await?;

    debug!(owner = %owner, id, lane = %request.lane, changed = plan.len(), "Kanban card moved");
    Ok(Json(board))
}

/// DELETE /api/kanban/:owner/cards/:id
pub async fn delete_card(
    State(state): State<AppState>,
    Path((owner, id)): Path<(String, i64)>,
) -> ApiResult<StatusCode> {
    let mut tx = state.db.begin().await?;
    let deleted = kanban::delete_card(&mut tx, &owner, id).await?;
    tx.commit().await?;

    if !deleted {
        return Err(ApiError::NotFound(format!("kanban card {}", id)));
    }
    Ok(StatusCode::NO_CONTENT)
}

pub fn kanban_routes() -> Router<AppState> {
    Router::new()
        .route("/api/kanban/:owner", get(get_board))
        .route("/api/kanban/:owner/cards", post(create_card))
        .route("/api/kanban/:owner/cards/:id", delete(delete_card))
        .route("/api/kanban/:owner/cards/:id/move", post(move_card))
}
