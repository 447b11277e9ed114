//! Company directory endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Path, Query, State,
    },
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use stagedirect_common::db::{Company, CompanyFields, Contact};
use tracing::info;

use crate::db::companies::{self, CompanyFilter};
use crate::db::contacts;
use crate::{ApiError, ApiResult, AppState};

/// Writes that reference a sector or contact report a bad id as 400, not 409
pub(crate) fn reference_error(err: stagedirect_common::Error, what: &str) -> ApiError {
    if err.is_foreign_key_violation() {
        ApiError::BadRequest(format!("unknown {}", what))
    } else {
        err.into()
    }
}

async fn require_company(state: &AppState, id: i64) -> ApiResult<Company> {
    companies::load_company(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("company {}", id)))
}

/// GET /api/companies[?validated=bool&sectorId=n&city=s]
pub async fn list_companies(
    State(state): State<AppState>,
    filter: Result<Query<CompanyFilter>, QueryRejection>,
) -> ApiResult<Json<Vec<Company>>> {
    let Query(filter) = filter?;
    Ok(Json(companies::list_companies(&state.db, &filter).await?))
}

/// POST /api/companies
///
/// New companies start unvalidated whatever the body says.
pub async fn create_company(
    State(state): State<AppState>,
    payload: Result<Json<CompanyFields>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Company>)> {
    let Json(mut fields) = payload?;
    fields.validate()?;
    fields.validated = false;

    let id = companies::insert_company(&state.db, &fields)
        .await
        .map_err(|e| reference_error(e, "sector or contact"))?;
    info!(id, name = %fields.name, "Company created");

    Ok((StatusCode::CREATED, Json(require_company(&state, id).await?)))
}

pub async fn get_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Company>> {
    Ok(Json(require_company(&state, id).await?))
}

/// PUT /api/companies/:id (full replacement)
pub async fn update_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<CompanyFields>, JsonRejection>,
) -> ApiResult<Json<Company>> {
    let Json(fields) = payload?;
    fields.validate()?;

    let updated = companies::update_company(&state.db, id, &fields)
        .await
        .map_err(|e| reference_error(e, "sector or contact"))?;
    if !updated {
        return Err(ApiError::NotFound(format!("company {}", id)));
    }

    Ok(Json(require_company(&state, id).await?))
}

/// DELETE /api/companies/:id
///
/// 409 while internships still reference the company.
pub async fn delete_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<StatusCode> {
    let deleted = companies::delete_company(&state.db, id).await.map_err(|e| {
        if e.is_foreign_key_violation() {
            ApiError::Conflict(format!("company {} still hosts internships", id))
        } else {
            e.into()
        }
    })?;
    if !deleted {
        return Err(ApiError::NotFound(format!("company {}", id)));
    }

    info!(id, "Company deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/companies/:id/validate
pub async fn validate_company(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Company>> {
    if !companies::set_validated(&state.db, id, true).await? {
        return Err(ApiError::NotFound(format!("company {}", id)));
    }

    info!(id, "Company validated");
    Ok(Json(require_company(&state, id).await?))
}

/// GET /api/companies/:id/contacts
pub async fn list_company_contacts(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> ApiResult<Json<Vec<Contact>>> {
    require_company(&state, id).await?;
    Ok(Json(contacts::list_company_contacts(&state.db, id).await?))
}

/// PUT /api/companies/:id/contacts/:contact_id
pub async fn link_contact(
    State(state): State<AppState>,
    Path((id, contact_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    require_company(&state, id).await?;
    if contacts::load_contact(&state.db, contact_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("contact {}", contact_id)));
    }

    contacts::link_contact(&state.db, id, contact_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/companies/:id/contacts/:contact_id
pub async fn unlink_contact(
    State(state): State<AppState>,
    Path((id, contact_id)): Path<(i64, i64)>,
) -> ApiResult<StatusCode> {
    if !contacts::unlink_contact(&state.db, id, contact_id).await? {
        return Err(ApiError::NotFound(format!(
            "link between company {} and contact {}",
            id, contact_id
        )));
    }

    Ok(StatusCode::NO_CONTENT)
}

pub fn company_routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies", get(list_companies).post(create_company))
        .route(
            "/api/companies/:id",
            get(get_company).put(update_company).delete(delete_company),
        )
        .route("/api/companies/:id/validate", post(validate_company))
        .route("/api/companies/:id/contacts", get(list_company_contacts))
        .route(
            "/api/companies/:id/contacts/:contact_id",
            put(link_contact).delete(unlink_contact),
        )
}
