mod common;

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use fabtrack::app::build_router;
use fabtrack::config::AppState;
use fabtrack::db::FabricationStore;
use fabtrack::models::job::JobStatus;
use fabtrack::models::project::ProjectStatus;
use serde_json::{json, Value};
use tower::util::ServiceExt;

use common::Fixture;

fn app(fx: &Fixture) -> Router {
    let store: Arc<dyn FabricationStore> = fx.store.clone();
    build_router(AppState::with_store(store))
}

async fn send(app: Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

#[tokio::test]
async fn health_check_answers_ok() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let response = app(&fx)
        .oneshot(Request::builder().uri("/api/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn elements_endpoint_returns_derived_bundle() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let element = fx.add_element("A/1", "intumescent", 12).await;
    fx.add_job(&element, "Surface Preparation", JobStatus::Completed, 10.0).await;
    fx.add_job(&element, "Primer", JobStatus::Pending, 20.0).await;
    fx.add_element("B/2", "board", 8).await;

    let (status, body) = send(
        app(&fx),
        Method::GET,
        &format!("/api/projects/{}/elements", fx.project.id),
        None,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let rows = body.as_array().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["status"], "active");
    assert_eq!(rows[0]["completionPercentage"], 50);
    assert_eq!(rows[0]["currentPendingJob"], "Primer");
    assert_eq!(rows[0]["gridLocation"], "A/1");
    assert_eq!(rows[1]["status"], "no jobs");
    assert_eq!(rows[1]["currentPendingJob"], "No jobs");
}

#[tokio::test]
async fn unknown_project_is_404() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let (status, body) = send(
        app(&fx),
        Method::GET,
        &format!("/api/projects/{}", uuid::Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn blank_custom_job_title_is_400() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let element = fx.add_element("A/1", "intumescent", 12).await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        &format!("/api/elements/{}/jobs", element.id),
        Some(json!({ "title": "  " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["title"].is_array());
    assert_eq!(fx.store.job_count().await, 0);
}

#[tokio::test]
async fn custom_job_is_created_at_requested_position() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let element = fx.add_element("A/1", "intumescent", 12).await;
    fx.add_job(&element, "Surface Preparation", JobStatus::Pending, 10.0).await;
    fx.add_job(&element, "Top Coat", JobStatus::Pending, 20.0).await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        &format!("/api/elements/{}/jobs", element.id),
        Some(json!({ "title": "Primer", "position": 1 })),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["result"]["orderIndex"], 15.0);
    assert_eq!(body["elementProgress"]["totalJobs"], 3);
}

#[tokio::test]
async fn bulk_assignment_returns_partial_report() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let a = fx.add_element("A/1", "cementitious", 10).await;
    let b = fx.add_element("A/2", "cementitious", 10).await;
    fx.store.fail_job_creation_for(b.id).await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        &format!("/api/projects/{}/workflows/bulk", fx.project.id),
        Some(json!({ "elementIds": [a.id, b.id], "workflowKey": "cementitious" })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"].as_array().unwrap().len(), 1);
    assert_eq!(body["failed"][0]["elementId"], b.id.to_string());
}

#[tokio::test]
async fn unknown_workflow_is_404() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let element = fx.add_element("A/1", "intumescent", 12).await;

    let (status, _) = send(
        app(&fx),
        Method::POST,
        &format!("/api/elements/{}/workflow", element.id),
        Some(json!({ "workflowKey": "spray-foam" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn completed_project_with_open_work_is_corrected() {
    let fx = Fixture::new(ProjectStatus::Completed).await;
    let done = fx.add_element("A/1", "intumescent", 10).await;
    fx.add_job(&done, "Primer", JobStatus::Completed, 10.0).await;
    let open = fx.add_element("A/2", "intumescent", 10).await;
    fx.add_job(&open, "Primer", JobStatus::Pending, 10.0).await;
    let app = app(&fx);

    let (_, report) = send(
        app.clone(),
        Method::GET,
        &format!("/api/projects/{}/status", fx.project.id),
        None,
    )
    .await;
    assert_eq!(report["stored"], "completed");
    assert_eq!(report["derived"], "in_progress");
    assert_eq!(report["needsCorrection"], true);

    let (status, corrected) = send(
        app.clone(),
        Method::POST,
        &format!("/api/projects/{}/status/correct", fx.project.id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(corrected["stored"], "in_progress");
    assert_eq!(corrected["needsCorrection"], false);

    // Idempotente
    let (_, again) = send(
        app,
        Method::POST,
        &format!("/api/projects/{}/status/correct", fx.project.id),
        None,
    )
    .await;
    assert_eq!(again["stored"], "in_progress");
}

#[tokio::test]
async fn worklist_groups_with_filters_and_expansion() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let a = fx.add_element("A/1", "intumescent", 10).await;
    fx.add_job(&a, "Primer", JobStatus::Pending, 10.0).await;
    fx.add_job(&a, "Top Coat", JobStatus::Pending, 20.0).await;
    let b = fx.add_element("B/2", "board", 4).await;
    fx.add_job(&b, "Board Installation", JobStatus::Completed, 10.0).await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        &format!("/api/projects/{}/views/worklist/groups", fx.project.id),
        Some(json!({
            "groupBy": ["gridLocation"],
            "columnFilters": { "fireproofingType": ["intumescent", "board"] },
            "expanded": [["A/1"]]
        })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"]["jobCount"], 3);
    assert_eq!(body["total"]["elementCount"], 2);
    assert_eq!(body["groups"][0]["path"], json!(["A/1"]));
    assert_eq!(body["groups"][0]["metrics"]["pendingJobs"], 2);
    let records = body["expanded"][0]["records"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["title"], "Primer");
}

#[tokio::test]
async fn admin_group_expansion_returns_one_group() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    fx.add_element("A/1", "intumescent", 10).await;
    fx.add_element("A/1", "board", 5).await;
    fx.add_element("C/3", "board", 5).await;

    let (status, body) = send(
        app(&fx),
        Method::POST,
        &format!("/api/projects/{}/views/admin/groups/expand", fx.project.id),
        Some(json!({ "view": { "search": "board" }, "path": ["A/1"] })),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let records = body["records"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["fireproofingType"], "board");
}

#[tokio::test]
async fn unknown_filter_field_is_rejected() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let (status, _) = send(
        app(&fx),
        Method::POST,
        &format!("/api/projects/{}/views/admin/groups", fx.project.id),
        Some(json!({ "columnFilters": { "colour": ["red"] } })),
    )
    .await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn blank_patch_title_is_400() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let element = fx.add_element("A/1", "intumescent", 12).await;
    let job = fx.add_job(&element, "Primer", JobStatus::Pending, 10.0).await;

    let (status, body) = send(
        app(&fx),
        Method::PATCH,
        &format!("/api/jobs/{}", job.id),
        Some(json!({ "title": "   " })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"]["title"].is_array());
}

#[tokio::test]
async fn views_of_unknown_project_are_404() {
    let fx = Fixture::new(ProjectStatus::Pending).await;
    let missing = uuid::Uuid::new_v4();
    let app = app(&fx);

    let (status, _) = send(
        app.clone(),
        Method::POST,
        &format!("/api/projects/{missing}/views/admin/groups"),
        Some(json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        app,
        Method::POST,
        &format!("/api/projects/{missing}/views/worklist/groups/expand"),
        Some(json!({ "path": ["A/1"] })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn openapi_documents_view_payloads() {
    use fabtrack::docs::ApiDoc;
    use utoipa::OpenApi;

    let doc = serde_json::to_value(ApiDoc::openapi()).unwrap();
    let schemas = &doc["components"]["schemas"];
    for name in ["ViewState", "ColumnFilter", "NumericRange", "ExpandGroupPayload"] {
        assert!(schemas[name].is_object(), "schema {name} ausente");
    }
    assert!(doc["paths"]["/api/projects/{project_id}/views/{view}/groups"]["post"]["requestBody"].is_object());
}
