//! stagedirect-server library
//!
//! HTTP service for the internship company directory: CRUD over companies,
//! contacts, sectors and internships, duplicate detection and merging, and
//! per-user Kanban boards.

use axum::Router;
use sqlx::SqlitePool;
use stagedirect_common::config::MergeConfig;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub mod api;
pub mod db;
pub mod error;
pub mod services;

pub use error::{ApiError, ApiResult};

use services::MergeService;

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Serialised merge workflow (shares the pool)
    pub merge: MergeService,
}

impl AppState {
    /// Create new application state
    pub fn new(db: SqlitePool, merge_config: &MergeConfig) -> Self {
        let merge = MergeService::new(db.clone(), merge_config);
        Self { db, merge }
    }
}

/// Build application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(api::health_routes())
        .merge(api::buildinfo_routes())
        .merge(api::merge_routes())
        .merge(api::company_routes())
        .merge(api::contact_routes())
        .merge(api::sector_routes())
        .merge(api::internship_routes())
        .merge(api::kanban_routes())
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
