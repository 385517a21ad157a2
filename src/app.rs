// src/app.rs

use axum::{
    routing::{get, patch, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{config::AppState, docs::ApiDoc, handlers};

pub fn build_router(state: AppState) -> Router {
    let project_routes = Router::new()
        .route("/{project_id}", get(handlers::projects::get_overview))
        .route("/{project_id}/elements", get(handlers::projects::list_elements))
        .route("/{project_id}/status", get(handlers::projects::get_status))
        .route("/{project_id}/status/correct", post(handlers::projects::correct_status))
        .route("/{project_id}/workflows/bulk", post(handlers::projects::bulk_assign_workflow))
        .route("/{project_id}/views/{view}/groups", post(handlers::views::grouped_view))
        .route("/{project_id}/views/{view}/groups/expand", post(handlers::views::expand_group));

    let element_routes = Router::new()
        .route(
            "/{element_id}/jobs",
            get(handlers::jobs::list_element_jobs).post(handlers::jobs::insert_custom_job),
        )
        .route("/{element_id}/workflow", post(handlers::jobs::assign_workflow))
        .route("/{element_id}/jobs/renormalize", post(handlers::jobs::renormalize_element));

    let job_routes = Router::new()
        .route(
            "/{job_id}",
            patch(handlers::jobs::update_job).delete(handlers::jobs::delete_job),
        )
        .route("/{job_id}/move", post(handlers::jobs::move_job));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/workflows", get(handlers::jobs::list_workflows))
        .nest("/api/projects", project_routes)
        .nest("/api/elements", element_routes)
        .nest("/api/jobs", job_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(state)
}
