//! Contact directory endpoints

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use stagedirect_common::db::{Contact, ContactFields};
use tracing::info;

use crate::db::contacts;
use crate::{ApiError, ApiResult, AppState};

fn check_fields(fields: &ContactFields) -> ApiResult<()> {
    if fields.name.trim().is_empty() {
        return Err(ApiError::BadRequest("contact name is required".to_string()));
    }
    Ok(())
}

async fn require_contact(state: &AppState, id: i64) -> ApiResult<Contact> {
    contacts::load_contact(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("contact {}", id)))
}

pub async fn list_contacts(State(state): State<AppState>) -> ApiResult<Json<Vec<Contact>>> {
    Ok(Json(contacts::list_contacts(&state.db).await?))
}

pub async fn create_contact(
    State(state): State<AppState>,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Contact>)> {
    let Json(fields) = payload?;
    check_fields(&fields)?;

    let id = contacts::insert_contact(&state.db, &fields).await?;
    info!(id, "Contact created");

    Ok((StatusCode::CREATED, Json(require_contact(&state, id).await?)))
}

pub async fn get_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Contact>> {
    Ok(Json(require_contact(&state, id).await?))
}

pub async fn update_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<ContactFields>, JsonRejection>,
) -> ApiResult<Json<Contact>> {
    let Json(fields) = payload?;
    check_fields(&fields)?;

    if !contacts::update_contact(&state.db, id, &fields).await? {
        return Err(ApiError::NotFound(format!("contact {}", id)));
    }

    Ok(Json(require_contact(&state, id).await?))
}

/// DELETE /api/contacts/:id
///
/// Links cascade; companies and internships naming the contact fall back to none.
pub async fn delete_contact(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    if !contacts::delete_contact(&state.db, id).await? {
        return Err(ApiError::NotFound(format!("contact {}", id)));
    }

    info!(id, "Contact deleted");
    Ok(StatusCode::NO_CONTENT)
}

pub fn contact_routes() -> Router<AppState> {
    Router::new()
        .route("/api/contacts", get(list_contacts).post(create_contact))
        .route(
            "/api/contacts/:id",
            get(get_contact).put(update_contact).delete(delete_contact),
        )
}
