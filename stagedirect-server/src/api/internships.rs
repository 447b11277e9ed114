//! Internship endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use stagedirect_common::db::{Internship, InternshipFields};
use tracing::info;

use super::companies::reference_error;
use crate::db::internships;
use crate::{ApiError, ApiResult, AppState};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternshipQuery {
    pub company_id: Option<i64>,
}

async fn require_internship(state: &AppState, id: i64) -> ApiResult<Internship> {
    internships::load_internship(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("internship {}", id)))
}

/// GET /api/internships[?companyId=n]
pub async fn list_internships(
    State(state): State<AppState>,
    query: Result<Query<InternshipQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Internship>>> {
    let Query(query) = query?;
    Ok(Json(internships::list_internships(&state.db, query.company_id).await?))
}

pub async fn create_internship(
    State(state): State<AppState>,
    payload: Result<Json<InternshipFields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Internship>)> {
    let Json(fields) = payload?;
    fields.validate()?;

    let id = internships::insert_internship(&state.db, &fields)
        .await
        .map_err(|e| reference_error(e, "company or contact"))?;
    info!(id, company_id = fields.company_id, "Internship created");

    Ok((StatusCode::CREATED, Json(require_internship(&state, id).await?)))
}

pub async fn get_internship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Internship>> {
    Ok(Json(require_internship(&state, id).await?))
}

pub async fn update_internship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<InternshipFields>, JsonRejection>,
) -> ApiResult<Json<Internship>> {
    let Json(fields) = payload?;
    fields.validate()?;

    let updated = internships::update_internship(&state.db, id, &fields)
        .await
        .map_err(|e| reference_error(e, "company or contact"))?;
    if !updated {
        return Err(ApiError::NotFound(format!("internship {}", id)));
    }

    Ok(Json(require_internship(&state, id).await?))
}

pub async fn delete_internship(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !internships::delete_internship(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("internship {}", id)));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn internship_routes() -> Router<AppState> {
    Router::new()
        .route("/api/internships", get(list_internships).post(create_internship))
        .route(
            "/api/internships/:id",
            get(get_internship)
                .put(update_internship)
                .delete(delete_internship),
        )
}
