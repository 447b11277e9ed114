//! Sector endpoints

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stagedirect_common::db::Sector;

use crate::db::sectors;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Deserialize)]
pub struct CreateSectorRequest {
    pub label: String,
}

pub async fn list_sectors(State(state): State<AppState>) -> ApiResult<Json<Vec<Sector>>> {
    Ok(Json(sectors::list_sectors(&state.db).await?))
}

/// POST /api/sectors; a duplicate label is a 409
pub async fn create_sector(
    State(state): State<AppState>,
    payload: Result<Json<CreateSectorRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Sector>)> {
    let Json(request) = payload?;
    let label = request.label.trim();
    if label.is_empty() {
        return Err(ApiError::BadRequest("sector label is required".to_string()));
    }

    let sector = sectors::insert_sector(&state.db, label).await?;
    Ok((StatusCode::CREATED, Json(sector)))
}

pub fn sector_routes() -> Router<AppState> {
    Router::new().route("/api/sectors", get(list_sectors).post(create_sector))
}
