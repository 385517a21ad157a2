// src/db/store.rs

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{
        element::StructuralElement,
        job::{Job, JobPatch, NewJob},
        project::{Project, ProjectPatch},
        workflow::WorkflowTemplates,
    },
};

/// O colaborador de acesso a dados. Os services só falam com este contrato;
/// qualquer erro daqui é propagado sem retry.
#[async_trait]
pub trait FabricationStore: Send + Sync {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError>;

    async fn update_project(&self, project_id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError>;

    async fn list_elements(&self, project_id: Uuid) -> Result<Vec<StructuralElement>, AppError>;

    async fn get_element(&self, element_id: Uuid) -> Result<Option<StructuralElement>, AppError>;

    // Busca em lote: o chamador junta jobs e elementos via `job.element_id`
    async fn list_jobs(&self, project_id: Uuid) -> Result<Vec<Job>, AppError>;

    async fn list_element_jobs(&self, element_id: Uuid) -> Result<Vec<Job>, AppError>;

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError>;

    async fn create_job(&self, job: &NewJob) -> Result<Job, AppError>;

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<Job, AppError>;

    async fn delete_job(&self, job_id: Uuid) -> Result<(), AppError>;

    async fn list_workflow_templates(&self) -> Result<WorkflowTemplates, AppError>;
}
