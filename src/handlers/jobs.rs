// src/handlers/jobs.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    config::AppState,
    models::{
        job::{Job, JobPatch},
        workflow::{AssignWorkflowRequest, CustomJobRequest, MoveJobRequest, WorkflowTemplate},
    },
};

// GET /api/workflows
#[utoipa::path(
    get,
    path = "/api/workflows",
    tag = "Workflows",
    responses(
        (status = 200, description = "Templates de workflow disponíveis", body = Vec<WorkflowTemplate>)
    )
)]
pub async fn list_workflows(State(app_state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let templates: Vec<WorkflowTemplate> = app_state
        .workflow_service
        .templates()
        .await?
        .into_iter()
        .map(|(workflow_key, job_titles)| WorkflowTemplate { workflow_key, job_titles })
        .collect();
    Ok(Json(templates))
}

// =============================================================================
//  1. JOBS DE UM ELEMENTO
// =============================================================================

#[utoipa::path(
    get,
    path = "/api/elements/{element_id}/jobs",
    tag = "Jobs",
    responses(
        (status = 200, description = "Jobs do elemento na ordem efetiva", body = Vec<Job>),
        (status = 404, description = "Elemento não encontrado")
    ),
    params(("element_id" = Uuid, Path, description = "ID do Elemento"))
)]
pub async fn list_element_jobs(
    State(app_state): State<AppState>,
    Path(element_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let jobs = app_state.workflow_service.list_element_jobs(element_id).await?;
    Ok(Json(jobs))
}

// POST /api/elements/{element_id}/jobs
#[utoipa::path(
    post,
    path = "/api/elements/{element_id}/jobs",
    tag = "Jobs",
    request_body = CustomJobRequest,
    responses(
        (status = 201, description = "Job criado; retorna o job e o progresso do elemento"),
        (status = 400, description = "Título vazio"),
        (status = 404, description = "Elemento não encontrado")
    ),
    params(("element_id" = Uuid, Path, description = "ID do Elemento"))
)]
pub async fn insert_custom_job(
    State(app_state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Json(payload): Json<CustomJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = app_state
        .workflow_service
        .insert_custom_job(element_id, payload)
        .await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

// POST /api/elements/{element_id}/workflow
#[utoipa::path(
    post,
    path = "/api/elements/{element_id}/workflow",
    tag = "Workflows",
    request_body = AssignWorkflowRequest,
    responses(
        (status = 201, description = "Jobs do template criados"),
        (status = 404, description = "Elemento ou workflow não encontrado")
    ),
    params(("element_id" = Uuid, Path, description = "ID do Elemento"))
)]
pub async fn assign_workflow(
    State(app_state): State<AppState>,
    Path(element_id): Path<Uuid>,
    Json(payload): Json<AssignWorkflowRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let mutation = app_state
        .workflow_service
        .instantiate_predefined_workflow(element_id, &payload.workflow_key)
        .await?;
    Ok((StatusCode::CREATED, Json(mutation)))
}

// POST /api/elements/{element_id}/jobs/renormalize
#[utoipa::path(
    post,
    path = "/api/elements/{element_id}/jobs/renormalize",
    tag = "Jobs",
    responses(
        (status = 200, description = "Chaves reatribuídas com passo 10")
    ),
    params(("element_id" = Uuid, Path, description = "ID do Elemento"))
)]
pub async fn renormalize_element(
    State(app_state): State<AppState>,
    Path(element_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = app_state.workflow_service.renormalize_element(element_id).await?;
    Ok(Json(mutation))
}

// =============================================================================
//  2. JOB INDIVIDUAL
// =============================================================================

#[utoipa::path(
    patch,
    path = "/api/jobs/{job_id}",
    tag = "Jobs",
    request_body = JobPatch,
    responses(
        (status = 200, description = "Job atualizado; retorna o progresso recalculado"),
        (status = 400, description = "Dados inválidos"),
        (status = 404, description = "Job não encontrado")
    ),
    params(("job_id" = Uuid, Path, description = "ID do Job"))
)]
pub async fn update_job(
    State(app_state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<JobPatch>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = app_state.workflow_service.update_job(job_id, payload).await?;
    Ok(Json(mutation))
}

#[utoipa::path(
    delete,
    path = "/api/jobs/{job_id}",
    tag = "Jobs",
    responses(
        (status = 200, description = "Job removido"),
        (status = 404, description = "Job não encontrado")
    ),
    params(("job_id" = Uuid, Path, description = "ID do Job"))
)]
pub async fn delete_job(
    State(app_state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = app_state.workflow_service.delete_job(job_id).await?;
    Ok(Json(mutation))
}

#[utoipa::path(
    post,
    path = "/api/jobs/{job_id}/move",
    tag = "Jobs",
    request_body = MoveJobRequest,
    responses(
        (status = 200, description = "Job reposicionado"),
        (status = 404, description = "Job não encontrado")
    ),
    params(("job_id" = Uuid, Path, description = "ID do Job"))
)]
pub async fn move_job(
    State(app_state): State<AppState>,
    Path(job_id): Path<Uuid>,
    Json(payload): Json<MoveJobRequest>,
) -> Result<impl IntoResponse, AppError> {
    let mutation = app_state
        .workflow_service
        .move_job(job_id, payload.position)
        .await?;
    Ok(Json(mutation))
}
