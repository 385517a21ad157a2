// src/handlers/projects.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        element::ElementRow,
        project::{ProjectOverview, ProjectStatusReport},
        workflow::{BulkAssignReport, BulkAssignRequest},
    },
};

// =============================================================================
//  1. VISÃO GERAL E ELEMENTOS
// =============================================================================

// GET /api/projects/{project_id}
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}",
    tag = "Projects",
    responses(
        (status = 200, description = "Resumo do projeto com status derivado", body = ProjectOverview),
        (status = 404, description = "Projeto não encontrado")
    ),
    params(("project_id" = Uuid, Path, description = "ID do Projeto"))
)]
pub async fn get_overview(
    State(app_state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let overview = app_state.project_service.overview(project_id).await?;
    Ok(Json(overview))
}

// GET /api/projects/{project_id}/elements
#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/elements",
    tag = "Projects",
    responses(
        (status = 200, description = "Elementos com status, progresso e job atual", body = Vec<ElementRow>)
    ),
    params(("project_id" = Uuid, Path, description = "ID do Projeto"))
)]
pub async fn list_elements(
    State(app_state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let rows = app_state.project_service.list_element_rows(project_id).await?;
    Ok(Json(rows))
}

// =============================================================================
//  2. STATUS DO PROJETO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/projects/{project_id}/status",
    tag = "Projects",
    responses(
        (status = 200, description = "Status gravado x derivado", body = ProjectStatusReport)
    ),
    params(("project_id" = Uuid, Path, description = "ID do Projeto"))
)]
pub async fn get_status(
    State(app_state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.project_service.status_report(project_id).await?;
    Ok(Json(report))
}

#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/status/correct",
    tag = "Projects",
    responses(
        (status = 200, description = "Status corrigido (ou já consistente)", body = ProjectStatusReport)
    ),
    params(("project_id" = Uuid, Path, description = "ID do Projeto"))
)]
pub async fn correct_status(
    State(app_state): State<AppState>,
    Path(project_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state.project_service.correct_status(project_id).await?;
    Ok(Json(report))
}

// =============================================================================
//  3. ATRIBUIÇÃO EM LOTE
// =============================================================================

// Falhas por elemento voltam no corpo (200); só template desconhecido vira 404
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/workflows/bulk",
    tag = "Workflows",
    request_body = BulkAssignRequest,
    responses(
        (status = 200, description = "Relatório por elemento", body = BulkAssignReport),
        (status = 404, description = "Workflow não encontrado")
    ),
    params(("project_id" = Uuid, Path, description = "ID do Projeto"))
)]
pub async fn bulk_assign_workflow(
    State(app_state): State<AppState>,
    Path(project_id): Path<Uuid>,
    Json(payload): Json<BulkAssignRequest>,
) -> Result<impl IntoResponse, AppError> {
    let report = app_state
        .workflow_service
        .bulk_assign_workflow(project_id, payload)
        .await?;
    Ok(Json(report))
}
