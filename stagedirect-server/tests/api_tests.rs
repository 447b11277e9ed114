//! Integration tests for stagedirect-server API endpoints
//!
//! Every test drives the full router against a fresh in-memory database.

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use sqlx::SqlitePool;
use stagedirect_common::config::MergeConfig;
use stagedirect_common::db::init_in_memory;
use stagedirect_server::{build_router, AppState};
use tower::util::ServiceExt; // for `oneshot` method

/// Test helper: in-memory database with two sectors
async fn setup_test_db() -> SqlitePool {
    let pool = init_in_memory().await.expect("in-memory database");
    sqlx::query("INSERT INTO sectors (id, label) VALUES (1, 'Informatique'), (2, 'Conseil')")
        .execute(&pool)
        .await
        .unwrap();
    pool
}

fn setup_app(db: SqlitePool) -> Router {
    build_router(AppState::new(db, &MergeConfig::default()))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: Extract JSON body from response
async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("Should parse JSON")
    };
    (status, body)
}

async fn create_company(app: &Router, body: Value) -> i64 {
    let (status, company) = send(app, json_request("POST", "/api/companies", body)).await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {}", company);
    company["id"].as_i64().unwrap()
}

// =============================================================================
// Health / build info
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app(setup_test_db().await);

    let response = app.oneshot(test_request("GET", "/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = extract_json(response.into_body()).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "stagedirect-server");
    assert_eq!(body["database"], "ok");
    assert!(body["version"].is_string());
}

#[tokio::test]
async fn test_health_reports_unreachable_database() {
    let db = setup_test_db().await;
    let app = setup_app(db.clone());
    db.close().await;

    let (status, body) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["database"], "unavailable");
}

#[tokio::test]
async fn test_buildinfo_endpoint() {
    let app = setup_app(setup_test_db().await);

    let (status, body) = send(&app, test_request("GET", "/api/buildinfo")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["module"], "stagedirect-server");
    assert!(body["gitHash"].is_string());
    assert!(body["buildTimestamp"].is_string());
    assert!(body["buildProfile"].is_string());
}

// =============================================================================
// Company directory
// =============================================================================

#[tokio::test]
async fn test_company_crud_round_trip() {
    let app = setup_app(setup_test_db().await);

    let id = create_company(
        &app,
        json!({"name": "TechCo", "city": "Paris", "sectorId": 1, "validated": true}),
    )
    .await;

    let (status, company) = send(&app, test_request("GET", &format!("/api/companies/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(company["name"], "TechCo");
    assert_eq!(company["country"], "France");
    assert_eq!(company["validated"], false);

    let (status, _) = send(&app, test_request("POST", &format!("/api/companies/{}/validate", id))).await;
    assert_eq!(status, StatusCode::OK);
    let (_, listed) = send(&app, test_request("GET", "/api/companies?validated=true")).await;
    assert_eq!(listed.as_array().unwrap().len(), 1);

    let (status, updated) = send(
        &app,
        json_request(
            "PUT",
            &format!("/api/companies/{}", id),
            json!({"name": "TechCo SAS", "city": "Lyon", "sectorId": 2}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["city"], "Lyon");

    let (status, _) = send(&app, test_request("DELETE", &format!("/api/companies/{}", id))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, body) = send(&app, test_request("GET", &format!("/api/companies/{}", id))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_company_validation_errors() {
    let app = setup_app(setup_test_db().await);

    let (status, body) = send(
        &app,
        json_request("POST", "/api/companies", json!({"name": "  ", "city": "Paris", "sectorId": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "BAD_REQUEST");

    let (status, _) = send(
        &app,
        json_request("POST", "/api/companies", json!({"name": "Ghost", "city": "Paris", "sectorId": 42})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, json_request("POST", "/api/companies", json!({"name": "NoCity"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_delete_company_with_internship_conflicts() {
    let app = setup_app(setup_test_db().await);
    let id = create_company(&app, json!({"name": "Host", "city": "Paris", "sectorId": 1})).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/internships",
            json!({"studentName": "Léa", "companyId": id, "startDate": "2025-04-01", "endDate": "2025-06-30"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, test_request("DELETE", &format!("/api/companies/{}", id))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
}

#[tokio::test]
async fn test_company_contact_links() {
    let app = setup_app(setup_test_db().await);
    let company = create_company(&app, json!({"name": "TechCo", "city": "Paris", "sectorId": 1})).await;
    let (status, contact) = send(&app, json_request("POST", "/api/contacts", json!({"name": "Martin"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    let contact_id = contact["id"].as_i64().unwrap();

    let link = format!("/api/companies/{}/contacts/{}", company, contact_id);
    let (status, _) = send(&app, test_request("PUT", &link)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, contacts) = send(&app, test_request("GET", &format!("/api/companies/{}/contacts", company))).await;
    assert_eq!(contacts[0]["name"], "Martin");

    let (status, _) = send(&app, test_request("DELETE", &link)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = send(&app, test_request("DELETE", &link)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sectors() {
    let app = setup_app(setup_test_db().await);

    let (status, sector) = send(&app, json_request("POST", "/api/sectors", json!({"label": "Santé"}))).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(sector["label"], "Santé");

    let (status, _) = send(&app, json_request("POST", "/api/sectors", json!({"label": "Santé"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (_, sectors) = send(&app, test_request("GET", "/api/sectors")).await;
    assert_eq!(sectors.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_internship_dates_validated() {
    let app = setup_app(setup_test_db().await);
    let id = create_company(&app, json!({"name": "Host", "city": "Paris", "sectorId": 1})).await;

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/internships",
            json!({"studentName": "Léa", "companyId": id, "startDate": "2025-06-01", "endDate": "2025-04-01"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/internships", json!({"studentName": "Léa", "companyId": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

// =============================================================================
// Duplicates and merge
// =============================================================================

#[tokio::test]
async fn test_duplicates_lookup() {
    let app = setup_app(setup_test_db().await);
    create_company(&app, json!({"name": "Lycée Saint-Exupéry", "city": "Lyon", "sectorId": 1})).await;
    create_company(&app, json!({"name": "LYCEE ST EXUPERY", "city": "Lyon", "sectorId": 1})).await;
    create_company(&app, json!({"name": "Lycée Ampère", "city": "Lyon", "sectorId": 1})).await;

    let (status, matches) = send(
        &app,
        test_request("GET", "/api/companies/duplicates?searchTerm=lycee%20saint%20exupery"),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = matches
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["LYCEE ST EXUPERY", "Lycée Saint-Exupéry"]);

    let (status, none) = send(&app, test_request("GET", "/api/companies/duplicates?searchTerm=inconnu")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_merge_companies_end_to_end() {
    let app = setup_app(setup_test_db().await);
    let primary = create_company(&app, json!({"name": "TechCo", "city": "Paris", "sectorId": 1})).await;
    let secondary = create_company(
        &app,
        json!({"name": "TechCo Inc", "city": "Paris", "sectorId": 2, "phone": "01 02 03 04 05"}),
    )
    .await;

    let (status, list) = send(
        &app,
        json_request(
            "POST",
            "/api/merge-entreprise",
            json!({"primaryId": primary, "secondaryId": secondary}),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0]["id"], primary);
    assert_eq!(list[0]["name"], "TechCo");
    assert_eq!(list[0]["phone"], "01 02 03 04 05");

    let (status, _) = send(&app, test_request("GET", &format!("/api/companies/{}", secondary))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_merge_request_validation() {
    let app = setup_app(setup_test_db().await);

    for body in [
        json!({"primaryId": 1}),
        json!({"primaryId": 1, "secondaryId": 1}),
        json!({"primaryId": 0, "secondaryId": 2}),
        json!({"primaryId": "one", "secondaryId": 2}),
    ] {
        let (status, error) = send(&app, json_request("POST", "/api/merge-entreprise", body)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(error["error"]["code"], "BAD_REQUEST");
    }
}

#[tokio::test]
async fn test_merge_missing_company_is_404_and_changes_nothing() {
    let app = setup_app(setup_test_db().await);
    let primary = create_company(&app, json!({"name": "TechCo", "city": "Paris", "sectorId": 1})).await;
    let (_, before) = send(&app, test_request("GET", &format!("/api/companies/{}", primary))).await;

    let (status, body) = send(
        &app,
        json_request("POST", "/api/merge-entreprise", json!({"primaryId": primary, "secondaryId": 999})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");

    let (_, after) = send(&app, test_request("GET", &format!("/api/companies/{}", primary))).await;
    assert_eq!(before, after);
}

#[tokio::test]
async fn test_merge_contacts() {
    let app = setup_app(setup_test_db().await);
    let company = create_company(&app, json!({"name": "TechCo", "city": "Paris", "sectorId": 1})).await;
    let (_, keep) = send(&app, json_request("POST", "/api/contacts", json!({"name": "Martin"}))).await;
    let (_, dup) = send(&app, json_request("POST", "/api/contacts", json!({"name": "M. Martin"}))).await;
    let (keep, dup) = (keep["id"].as_i64().unwrap(), dup["id"].as_i64().unwrap());
    send(&app, test_request("PUT", &format!("/api/companies/{}/contacts/{}", company, dup))).await;

    let (status, list) = send(
        &app,
        json_request("POST", "/api/merge-contacts", json!({"contactId1": keep, "contactId2": dup})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(list.as_array().unwrap().len(), 1);

    let (_, linked) = send(&app, test_request("GET", &format!("/api/companies/{}/contacts", company))).await;
    assert_eq!(linked[0]["id"], keep);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/merge-contacts", json!({"contactId1": keep, "contactId2": dup})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Kanban
// =============================================================================

#[tokio::test]
async fn test_kanban_board_flow() {
    let app = setup_app(setup_test_db().await);

    let mut ids = Vec::new();
    for title in ["Relancer TechCo", "Envoyer convention"] {
        let (status, card) = send(
            &app,
            json_request("POST", "/api/kanban/camille/cards", json!({"column": "todo", "title": title})),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        ids.push(card["id"].as_i64().unwrap());
    }

    let (status, board) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/kanban/camille/cards/{}/move", ids[1]),
            json!({"column": "done", "position": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let moved = board
        .as_array()
        .unwrap()
        .iter()
        .find(|c| c["id"] == ids[1])
        .unwrap();
    assert_eq!(moved["lane"], "done");
    assert_eq!(moved["position"], 0);

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            &format!("/api/kanban/hugo/cards/{}/move", ids[0]),
            json!({"lane": "done", "position": 0}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, test_request("DELETE", &format!("/api/kanban/camille/cards/{}", ids[0]))).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (_, board) = send(&app, test_request("GET", "/api/kanban/camille")).await;
    assert_eq!(board.as_array().unwrap().len(), 1);
}
