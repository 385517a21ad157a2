// src/services/workflow_service.rs

use std::collections::HashSet;
use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::AppError,
    db::FabricationStore,
    models::{
        element::{ElementProgress, StructuralElement},
        job::{sort_jobs, Job, JobPatch, JobStatus, NewJob, CUSTOM_JOB_TYPE},
        workflow::{
            BulkAssignFailure, BulkAssignReport, BulkAssignRequest, BulkAssignSuccess,
            CustomJobRequest, InsertPosition, JobMutation, WorkflowTemplates,
        },
    },
    services::{
        grouping_service::GroupingService,
        order_index::{self, KEY_STRIDE, RENORMALIZE_EPSILON},
        status_service,
    },
};

#[derive(Clone)]
pub struct WorkflowService {
    store: Arc<dyn FabricationStore>,
    groups: GroupingService,
}

impl WorkflowService {
    pub fn new(store: Arc<dyn FabricationStore>, groups: GroupingService) -> Self {
        Self { store, groups }
    }

    pub async fn templates(&self) -> Result<WorkflowTemplates, AppError> {
        self.store.list_workflow_templates().await
    }

    /// Jobs do elemento, na ordem efetiva.
    pub async fn list_element_jobs(&self, element_id: Uuid) -> Result<Vec<Job>, AppError> {
        self.require_element(element_id).await?;
        let mut jobs = self.store.list_element_jobs(element_id).await?;
        sort_jobs(&mut jobs);
        Ok(jobs)
    }

    // =========================================================================
    //  WORKFLOWS PRÉ-DEFINIDOS
    // =========================================================================

    /// Um job por título do template, stepNumber 1..N. Chamar duas vezes
    /// duplica os jobs.
    pub async fn instantiate_predefined_workflow(
        &self,
        element_id: Uuid,
        workflow_key: &str,
    ) -> Result<JobMutation<Vec<Job>>, AppError> {
        let titles = self.template_titles(workflow_key).await?;
        let element = self.require_element(element_id).await?;

        let jobs = self.create_workflow_jobs(&element, workflow_key, &titles).await?;
        tracing::info!(
            %element_id,
            workflow_key,
            created = jobs.len(),
            "Workflow instanciado"
        );

        self.mutation(element.project_id, element_id, jobs).await
    }

    /// Atribui o mesmo workflow a vários elementos. Cada elemento é
    /// independente: falhas entram no relatório e o lote continua.
    pub async fn bulk_assign_workflow(
        &self,
        project_id: Uuid,
        request: BulkAssignRequest,
    ) -> Result<BulkAssignReport, AppError> {
        request.validate()?;
        // Template desconhecido falha o lote inteiro antes de qualquer escrita
        let titles = self.template_titles(&request.workflow_key).await?;

        let mut report = BulkAssignReport {
            workflow_key: request.workflow_key.clone(),
            ..BulkAssignReport::default()
        };

        let mut seen = HashSet::new();
        for element_id in request.element_ids {
            if !seen.insert(element_id) {
                continue;
            }

            match self.assign_one(project_id, element_id, &request.workflow_key, &titles).await {
                Ok(jobs) => report.succeeded.push(BulkAssignSuccess { element_id, jobs }),
                Err(e) => {
                    tracing::warn!(%project_id, %element_id, error = %e, "Falha ao atribuir workflow ao elemento");
                    report.failed.push(BulkAssignFailure {
                        element_id,
                        reason: e.public_reason(),
                    });
                }
            }
        }

        if !report.succeeded.is_empty() {
            self.groups.invalidate(project_id).await;
        }

        tracing::info!(
            %project_id,
            workflow_key = %report.workflow_key,
            succeeded = report.succeeded.len(),
            failed = report.failed.len(),
            "Atribuição em lote concluída"
        );

        Ok(report)
    }

    async fn assign_one(
        &self,
        project_id: Uuid,
        element_id: Uuid,
        workflow_key: &str,
        titles: &[String],
    ) -> Result<Vec<Job>, AppError> {
        let element = self.require_element(element_id).await?;
        if element.project_id != project_id {
            return Err(AppError::ElementNotFound(element_id));
        }
        self.create_workflow_jobs(&element, workflow_key, titles).await
    }

    // Se um job falhar, os já criados nesta chamada são removidos
    async fn create_workflow_jobs(
        &self,
        element: &StructuralElement,
        workflow_key: &str,
        titles: &[String],
    ) -> Result<Vec<Job>, AppError> {
        let existing = self.store.list_element_jobs(element.id).await?;
        let base = existing
            .iter()
            .map(Job::effective_order_key)
            .max_by(f64::total_cmp)
            .unwrap_or(0.0);
        let total_steps = titles.len() as i32;

        let mut created = Vec::with_capacity(titles.len());
        for (i, title) in titles.iter().enumerate() {
            let step = i as i32 + 1;
            let new_job = NewJob {
                element_id: element.id,
                project_id: element.project_id,
                title: title.clone(),
                description: None,
                job_type: workflow_key.to_string(),
                status: JobStatus::Pending,
                progress_percentage: 0,
                order_index: Some(base + KEY_STRIDE * f64::from(step)),
                step_number: Some(step),
                total_steps: Some(total_steps),
            };

            match self.store.create_job(&new_job).await {
                Ok(job) => created.push(job),
                Err(e) => {
                    self.rollback_jobs(element.id, &created).await;
                    return Err(e);
                }
            }
        }

        Ok(created)
    }

    async fn rollback_jobs(&self, element_id: Uuid, created: &[Job]) {
        for job in created {
            if let Err(e) = self.store.delete_job(job.id).await {
                tracing::error!(%element_id, job_id = %job.id, error = %e, "Falha ao desfazer job parcial");
            }
        }
        if !created.is_empty() {
            tracing::warn!(%element_id, removed = created.len(), "Workflow parcial desfeito");
        }
    }

    // =========================================================================
    //  JOBS CUSTOMIZADOS
    // =========================================================================

    pub async fn insert_custom_job(
        &self,
        element_id: Uuid,
        request: CustomJobRequest,
    ) -> Result<JobMutation<Job>, AppError> {
        request.validate()?;
        let element = self.require_element(element_id).await?;
        let position = request.position.unwrap_or(InsertPosition::End);

        let mut keys = order_index::sorted_keys(&self.store.list_element_jobs(element_id).await?);
        if order_index::gap_at(&keys, position).is_some_and(|gap| gap < RENORMALIZE_EPSILON) {
            self.apply_renormalization(element_id).await?;
            keys = order_index::sorted_keys(&self.store.list_element_jobs(element_id).await?);
        }
        let key = order_index::compute_insertion_key(&keys, position);

        let status = request.initial_status.unwrap_or(JobStatus::Pending);
        let new_job = NewJob {
            element_id,
            project_id: element.project_id,
            title: request.title.trim().to_string(),
            description: request.description,
            job_type: request
                .job_type
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| CUSTOM_JOB_TYPE.to_string()),
            status,
            progress_percentage: if status == JobStatus::Completed { 100 } else { 0 },
            order_index: Some(key),
            step_number: None,
            total_steps: None,
        };

        let job = self.store.create_job(&new_job).await?;
        tracing::info!(%element_id, job_id = %job.id, order_index = key, "Job customizado inserido");

        self.mutation(element.project_id, element_id, job).await
    }

    // =========================================================================
    //  EDIÇÃO / REMOÇÃO / REORDENAÇÃO
    // =========================================================================

    pub async fn update_job(&self, job_id: Uuid, patch: JobPatch) -> Result<JobMutation<Job>, AppError> {
        patch.validate()?;
        // Posição só muda via move_job
        let patch = JobPatch {
            order_index: None,
            ..patch
        };
        let job = self.store.update_job(job_id, &patch).await?;
        tracing::info!(%job_id, status = job.status.as_str(), "Job atualizado");

        self.mutation(job.project_id, job.element_id, job).await
    }

    pub async fn delete_job(&self, job_id: Uuid) -> Result<JobMutation<Uuid>, AppError> {
        let job = self.require_job(job_id).await?;
        self.store.delete_job(job_id).await?;
        tracing::info!(%job_id, element_id = %job.element_id, "Job removido");

        self.mutation(job.project_id, job.element_id, job_id).await
    }

    /// Move o job para `position` entre os irmãos; só a chave dele muda.
    pub async fn move_job(&self, job_id: Uuid, position: InsertPosition) -> Result<JobMutation<Job>, AppError> {
        let job = self.require_job(job_id).await?;
        let siblings: Vec<Job> = self
            .store
            .list_element_jobs(job.element_id)
            .await?
            .into_iter()
            .filter(|j| j.id != job_id)
            .collect();

        let keys = order_index::sorted_keys(&siblings);
        let key = order_index::compute_insertion_key(&keys, position);
        let moved = self.store.update_job(job_id, &JobPatch::reorder(key)).await?;
        tracing::info!(%job_id, order_index = key, "Job reposicionado");

        self.mutation(moved.project_id, moved.element_id, moved).await
    }

    pub async fn renormalize_element(&self, element_id: Uuid) -> Result<JobMutation<Vec<Job>>, AppError> {
        let element = self.require_element(element_id).await?;
        self.apply_renormalization(element_id).await?;

        let mut jobs = self.store.list_element_jobs(element_id).await?;
        sort_jobs(&mut jobs);
        self.mutation(element.project_id, element_id, jobs).await
    }

    async fn apply_renormalization(&self, element_id: Uuid) -> Result<usize, AppError> {
        let jobs = self.store.list_element_jobs(element_id).await?;
        let changes = order_index::renormalize(&jobs);
        for (job_id, key) in &changes {
            self.store.update_job(*job_id, &JobPatch::reorder(*key)).await?;
        }
        tracing::info!(%element_id, changed = changes.len(), "Chaves de ordem renormalizadas");
        Ok(changes.len())
    }

    // =========================================================================
    //  AUXILIARES
    // =========================================================================

    async fn template_titles(&self, workflow_key: &str) -> Result<Vec<String>, AppError> {
        let mut templates = self.store.list_workflow_templates().await?;
        templates
            .remove(workflow_key)
            .ok_or_else(|| AppError::WorkflowNotFound(workflow_key.to_string()))
    }

    async fn require_element(&self, element_id: Uuid) -> Result<StructuralElement, AppError> {
        self.store
            .get_element(element_id)
            .await?
            .ok_or(AppError::ElementNotFound(element_id))
    }

    async fn require_job(&self, job_id: Uuid) -> Result<Job, AppError> {
        self.store
            .get_job(job_id)
            .await?
            .ok_or(AppError::JobNotFound(job_id))
    }

    pub async fn element_progress(&self, element_id: Uuid) -> Result<ElementProgress, AppError> {
        let jobs = self.store.list_element_jobs(element_id).await?;
        Ok(status_service::derive_status(&jobs))
    }

    // Recalcula o progresso do elemento e invalida os grupos do projeto
    async fn mutation<T>(&self, project_id: Uuid, element_id: Uuid, result: T) -> Result<JobMutation<T>, AppError> {
        self.groups.invalidate(project_id).await;
        Ok(JobMutation {
            element_id,
            element_progress: self.element_progress(element_id).await?,
            result,
        })
    }
}
