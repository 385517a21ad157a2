// src/handlers/views.rs

use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    models::view::{GroupPath, ViewKind, ViewState},
};

#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ExpandGroupPayload {
    pub view: ViewState,
    #[schema(value_type = Vec<String>, example = json!(["A/3"]))]
    pub path: GroupPath,
}

// POST /api/projects/{project_id}/views/{view}/groups
// O corpo é o ViewState serializado (busca, filtros, agrupamento, grupos abertos)
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/views/{view}/groups",
    tag = "Views",
    request_body = ViewState,
    responses(
        (status = 200, description = "Contagens por grupo + registros dos grupos abertos"),
        (status = 404, description = "Projeto não encontrado")
    ),
    params(
        ("project_id" = Uuid, Path, description = "ID do Projeto"),
        ("view" = String, Path, description = "admin | worklist")
    )
)]
pub async fn grouped_view(
    State(app_state): State<AppState>,
    Path((project_id, view)): Path<(Uuid, ViewKind)>,
    Json(state): Json<ViewState>,
) -> Result<Response, AppError> {
    let grouping = &app_state.grouping_service;
    let response = match view {
        ViewKind::AdminTable => Json(grouping.admin_view(project_id, &state).await?).into_response(),
        ViewKind::EngineerWorklist => Json(grouping.worklist_view(project_id, &state).await?).into_response(),
    };
    Ok(response)
}

// POST /api/projects/{project_id}/views/{view}/groups/expand
#[utoipa::path(
    post,
    path = "/api/projects/{project_id}/views/{view}/groups/expand",
    tag = "Views",
    request_body = ExpandGroupPayload,
    responses(
        (status = 200, description = "Registros de um único grupo"),
        (status = 404, description = "Projeto não encontrado")
    ),
    params(
        ("project_id" = Uuid, Path, description = "ID do Projeto"),
        ("view" = String, Path, description = "admin | worklist")
    )
)]
pub async fn expand_group(
    State(app_state): State<AppState>,
    Path((project_id, view)): Path<(Uuid, ViewKind)>,
    Json(payload): Json<ExpandGroupPayload>,
) -> Result<Response, AppError> {
    let grouping = &app_state.grouping_service;
    let response = match view {
        ViewKind::AdminTable => Json(
            grouping
                .expand_admin_group(project_id, &payload.view, payload.path)
                .await?,
        )
        .into_response(),
        ViewKind::EngineerWorklist => Json(
            grouping
                .expand_worklist_group(project_id, &payload.view, payload.path)
                .await?,
        )
        .into_response(),
    };
    Ok(response)
}
