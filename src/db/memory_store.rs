// src/db/memory_store.rs

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::FabricationStore,
    models::{
        element::StructuralElement,
        job::{Job, JobPatch, NewJob},
        project::{Project, ProjectPatch},
        workflow::WorkflowTemplates,
    },
};

#[derive(Default)]
struct Inner {
    projects: HashMap<Uuid, Project>,
    // Vec para manter a ordem de inserção (listagens determinísticas)
    elements: Vec<StructuralElement>,
    jobs: Vec<Job>,
    templates: WorkflowTemplates,
    failing_elements: HashSet<Uuid>,
}

/// Implementação em memória do FabricationStore (testes e desenvolvimento local).
/// Permite simular falhas de escrita para elementos específicos.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_templates(templates: WorkflowTemplates) -> Self {
        Self {
            inner: RwLock::new(Inner {
                templates,
                ..Inner::default()
            }),
        }
    }

    pub async fn insert_project(&self, project: Project) {
        self.inner.write().await.projects.insert(project.id, project);
    }

    pub async fn insert_element(&self, element: StructuralElement) {
        self.inner.write().await.elements.push(element);
    }

    pub async fn insert_job(&self, job: Job) {
        self.inner.write().await.jobs.push(job);
    }

    pub async fn set_template(&self, key: &str, titles: Vec<String>) {
        self.inner.write().await.templates.insert(key.to_string(), titles);
    }

    /// A partir daqui, `create_job` falha para este elemento.
    pub async fn fail_job_creation_for(&self, element_id: Uuid) {
        self.inner.write().await.failing_elements.insert(element_id);
    }

    pub async fn job_count(&self) -> usize {
        self.inner.read().await.jobs.len()
    }
}

#[async_trait]
impl FabricationStore for MemoryStore {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        Ok(self.inner.read().await.projects.get(&project_id).cloned())
    }

    async fn update_project(&self, project_id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        let mut inner = self.inner.write().await;
        let project = inner
            .projects
            .get_mut(&project_id)
            .ok_or(AppError::ProjectNotFound(project_id))?;
        patch.apply_to(project);
        project.updated_at = Utc::now();
        Ok(project.clone())
    }

    async fn list_elements(&self, project_id: Uuid) -> Result<Vec<StructuralElement>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .elements
            .iter()
            .filter(|e| e.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn get_element(&self, element_id: Uuid) -> Result<Option<StructuralElement>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.elements.iter().find(|e| e.id == element_id).cloned())
    }

    async fn list_jobs(&self, project_id: Uuid) -> Result<Vec<Job>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.project_id == project_id)
            .cloned()
            .collect())
    }

    async fn list_element_jobs(&self, element_id: Uuid) -> Result<Vec<Job>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner
            .jobs
            .iter()
            .filter(|j| j.element_id == element_id)
            .cloned()
            .collect())
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let inner = self.inner.read().await;
        Ok(inner.jobs.iter().find(|j| j.id == job_id).cloned())
    }

    async fn create_job(&self, job: &NewJob) -> Result<Job, AppError> {
        let mut inner = self.inner.write().await;
        if inner.failing_elements.contains(&job.element_id) {
            return Err(AppError::StoreError(format!(
                "falha simulada ao criar job para o elemento {}",
                job.element_id
            )));
        }

        let now = Utc::now();
        let created = Job {
            id: Uuid::new_v4(),
            element_id: job.element_id,
            project_id: job.project_id,
            title: job.title.clone(),
            description: job.description.clone(),
            job_type: job.job_type.clone(),
            status: job.status,
            progress_percentage: job.progress_percentage,
            order_index: job.order_index,
            step_number: job.step_number,
            total_steps: job.total_steps,
            created_at: now,
            updated_at: now,
        };
        inner.jobs.push(created.clone());
        Ok(created)
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<Job, AppError> {
        let mut inner = self.inner.write().await;
        let job = inner
            .jobs
            .iter_mut()
            .find(|j| j.id == job_id)
            .ok_or(AppError::JobNotFound(job_id))?;
        patch.apply_to(job);
        job.updated_at = Utc::now();
        Ok(job.clone())
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.write().await;
        let before = inner.jobs.len();
        inner.jobs.retain(|j| j.id != job_id);
        if inner.jobs.len() == before {
            return Err(AppError::JobNotFound(job_id));
        }
        Ok(())
    }

    async fn list_workflow_templates(&self) -> Result<WorkflowTemplates, AppError> {
        Ok(self.inner.read().await.templates.clone())
    }
}
