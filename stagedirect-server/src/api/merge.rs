//! Duplicate lookup and merge endpoints
//!
//! - GET  /api/companies/duplicates?searchTerm=...
//! - POST /api/merge-entreprise  `{"primaryId": 1, "secondaryId": 2}`
//! - POST /api/merge-contacts    `{"contactId1": 1, "contactId2": 2}`

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Query, State,
    },
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use stagedirect_common::db::{Company, Contact};
use tracing::info;

use crate::services::merge::validate_pair;
use crate::{ApiResult, AppState};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DuplicatesQuery {
    #[serde(default)]
    pub search_term: String,
}

/// Ids are optional here so a missing one is reported as a validation error
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeCompaniesRequest {
    pub primary_id: Option<i64>,
    pub secondary_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct MergeContactsRequest {
    #[serde(rename = "contactId1")]
    pub contact_id1: Option<i64>,
    #[serde(rename = "contactId2")]
    pub contact_id2: Option<i64>,
}

/// GET /api/companies/duplicates
///
/// An absent search term behaves like an empty one.
pub async fn find_duplicates(
    State(state): State<AppState>,
    query: Result<Query<DuplicatesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<Company>>> {
    let Query(query) = query?;
    let matches = state.merge.find_duplicates(&query.search_term).await?;
    Ok(Json(matches))
}

/// POST /api/merge-entreprise
///
/// **Errors:**
/// - 400 ids missing, non-positive or equal
/// - 404 either company absent
/// - 500 `MERGE_ABORTED` write failed, rolled back
/// - 504 timeout, rolled back
pub async fn merge_companies(
    State(state): State<AppState>,
    payload: Result<Json<MergeCompaniesRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Company>>> {
    let Json(request) = payload?;
    let (primary_id, secondary_id) = validate_pair(
        request.primary_id,
        request.secondary_id,
        "primaryId",
        "secondaryId",
    )?;

    info!(primary_id, secondary_id, "Company merge requested");
    let companies = state.merge.merge_companies(primary_id, secondary_id).await?;
    Ok(Json(companies))
}

/// POST /api/merge-contacts
pub async fn merge_contacts(
    State(state): State<AppState>,
    payload: Result<Json<MergeContactsRequest>, JsonRejection>,
) -> ApiResult<Json<Vec<Contact>>> {
    let Json(request) = payload?;
    let (first_id, second_id) = validate_pair(
        request.contact_id1,
        request.contact_id2,
        "contactId1",
        "contactId2",
    )?;

    info!(first_id, second_id, "Contact merge requested");
    let contacts = state.merge.merge_contacts(first_id, second_id).await?;
    Ok(Json(contacts))
}

pub fn merge_routes() -> Router<AppState> {
    Router::new()
        .route("/api/companies/duplicates", get(find_duplicates))
        .route("/api/merge-entreprise", post(merge_companies))
        .route("/api/merge-contacts", post(merge_contacts))
}
