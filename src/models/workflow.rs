// src/models/workflow.rs

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::element::ElementProgress;
use crate::models::job::{validate_not_blank, Job, JobStatus};

/// workflowTypeKey -> títulos dos jobs, na ordem.
pub type WorkflowTemplates = BTreeMap<String, Vec<String>>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTemplate {
    #[schema(example = "intumescent")]
    pub workflow_key: String,
    #[schema(example = json!(["Surface Preparation", "Primer", "Intumescent Coat", "Inspection"]))]
    pub job_titles: Vec<String>,
}

// Onde inserir um job: "start", "end" ou um índice (0 = início).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InsertPosition {
    Start,
    End,
    #[serde(untagged)]
    Index(usize),
}

// ---
// Payload: inserir job customizado
// ---
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustomJobRequest {
    #[validate(custom(function = "validate_not_blank"))]
    #[schema(example = "Touch-up Coat")]
    pub title: String,
    pub description: Option<String>,
    // None = append
    #[schema(value_type = Option<String>, example = "start")]
    pub position: Option<InsertPosition>,
    pub job_type: Option<String>,
    pub initial_status: Option<JobStatus>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveJobRequest {
    #[schema(value_type = String, example = "end")]
    pub position: InsertPosition,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignWorkflowRequest {
    #[validate(length(min = 1, message = "O tipo de workflow é obrigatório."))]
    #[schema(example = "intumescent")]
    pub workflow_key: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignRequest {
    #[validate(length(min = 1, message = "Selecione ao menos um elemento."))]
    pub element_ids: Vec<Uuid>,
    #[validate(length(min = 1, message = "O tipo de workflow é obrigatório."))]
    #[schema(example = "cementitious")]
    pub workflow_key: String,
}

// --- Respostas ---

// Resultado de uma mutação: o(s) job(s) afetados + o progresso recalculado do elemento
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMutation<T> {
    pub element_id: Uuid,
    pub result: T,
    pub element_progress: ElementProgress,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignSuccess {
    pub element_id: Uuid,
    pub jobs: Vec<Job>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignFailure {
    pub element_id: Uuid,
    pub reason: String,
}

// Falha parcial é retornada, nunca lançada.
#[derive(Debug, Clone, Default, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BulkAssignReport {
    pub workflow_key: String,
    pub succeeded: Vec<BulkAssignSuccess>,
    pub failed: Vec<BulkAssignFailure>,
}

impl BulkAssignReport {
    pub fn succeeded_ids(&self) -> Vec<Uuid> {
        self.succeeded.iter().map(|s| s.element_id).collect()
    }

    pub fn is_partial(&self) -> bool {
        !self.failed.is_empty() && !self.succeeded.is_empty()
    }
}
