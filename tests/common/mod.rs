#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use fabtrack::common::error::AppError;
use fabtrack::db::{FabricationStore, MemoryStore};
use fabtrack::models::element::StructuralElement;
use fabtrack::models::job::{Job, JobPatch, JobStatus, NewJob};
use fabtrack::models::project::{Project, ProjectPatch, ProjectPriority, ProjectStatus};
use fabtrack::models::workflow::WorkflowTemplates;
use rust_decimal::Decimal;
use tokio::sync::Notify;
use uuid::Uuid;

pub fn templates() -> fabtrack::models::workflow::WorkflowTemplates {
    let mut templates = fabtrack::models::workflow::WorkflowTemplates::new();
    templates.insert(
        "intumescent".to_string(),
        vec![
            "Surface Preparation".to_string(),
            "Primer".to_string(),
            "Top Coat".to_string(),
        ],
    );
    templates.insert(
        "cementitious".to_string(),
        vec!["Bonding Agent".to_string(), "Cementitious Spray".to_string()],
    );
    templates
}

pub fn project(status: ProjectStatus) -> Project {
    let now = Utc::now();
    Project {
        id: Uuid::new_v4(),
        title: "Torre Norte".to_string(),
        description: None,
        status,
        priority: ProjectPriority::Medium,
        location: None,
        created_at: now,
        updated_at: now,
    }
}

pub fn element(project_id: Uuid, grid: &str, fireproofing: &str, sqm: i64) -> StructuralElement {
    let now = Utc::now();
    StructuralElement {
        id: Uuid::new_v4(),
        project_id,
        structure_number: Some(format!("B-{grid}")),
        grid_location: Some(grid.to_string()),
        level: Some("Level 1".to_string()),
        member_type: Some("Beam".to_string()),
        section_size: None,
        fireproofing_type: Some(fireproofing.to_string()),
        surface_area_sqm: Decimal::from(sqm),
        created_at: now,
        updated_at: now,
    }
}

pub fn job(element: &StructuralElement, title: &str, status: JobStatus, order_index: Option<f64>) -> Job {
    // Datas distintas para desempates determinísticos
    let created = Utc::now() + Duration::milliseconds(order_index.unwrap_or(0.0) as i64);
    Job {
        id: Uuid::new_v4(),
        element_id: element.id,
        project_id: element.project_id,
        title: title.to_string(),
        description: None,
        job_type: "custom".to_string(),
        status,
        progress_percentage: if status == JobStatus::Completed { 100 } else { 0 },
        order_index,
        step_number: None,
        total_steps: None,
        created_at: created,
        updated_at: created,
    }
}

pub struct Fixture {
    pub store: Arc<MemoryStore>,
    pub project: Project,
}

impl Fixture {
    pub async fn new(status: ProjectStatus) -> Self {
        let store = Arc::new(MemoryStore::with_templates(templates()));
        let project = project(status);
        store.insert_project(project.clone()).await;
        Self { store, project }
    }

    pub async fn add_element(&self, grid: &str, fireproofing: &str, sqm: i64) -> StructuralElement {
        let element = element(self.project.id, grid, fireproofing, sqm);
        self.store.insert_element(element.clone()).await;
        element
    }

    pub async fn add_job(&self, element: &StructuralElement, title: &str, status: JobStatus, key: f64) -> Job {
        let job = job(element, title, status, Some(key));
        self.store.insert_job(job.clone()).await;
        job
    }
}

// Envolve o MemoryStore contando leituras de projeto e, quando armado,
// segura `list_jobs` depois de ler os jobs (simula uma leitura lenta).
pub struct ObservedStore {
    pub inner: Arc<MemoryStore>,
    pub project_reads: AtomicUsize,
    armed: AtomicBool,
    pub entered: Notify,
    pub release: Notify,
}

impl ObservedStore {
    pub fn new(inner: Arc<MemoryStore>) -> Self {
        Self {
            inner,
            project_reads: AtomicUsize::new(0),
            armed: AtomicBool::new(false),
            entered: Notify::new(),
            release: Notify::new(),
        }
    }

    pub fn hold_next_job_listing(&self) {
        self.armed.store(true, Ordering::SeqCst);
    }

    pub fn project_reads(&self) -> usize {
        self.project_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl FabricationStore for ObservedStore {
    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        self.project_reads.fetch_add(1, Ordering::SeqCst);
        self.inner.get_project(project_id).await
    }

    async fn update_project(&self, project_id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        self.inner.update_project(project_id, patch).await
    }

    async fn list_elements(&self, project_id: Uuid) -> Result<Vec<StructuralElement>, AppError> {
        self.inner.list_elements(project_id).await
    }

    async fn get_element(&self, element_id: Uuid) -> Result<Option<StructuralElement>, AppError> {
        self.inner.get_element(element_id).await
    }

    async fn list_jobs(&self, project_id: Uuid) -> Result<Vec<Job>, AppError> {
        let jobs = self.inner.list_jobs(project_id).await?;
        if self.armed.swap(false, Ordering::SeqCst) {
            self.entered.notify_one();
            self.release.notified().await;
        }
        Ok(jobs)
    }

    async fn list_element_jobs(&self, element_id: Uuid) -> Result<Vec<Job>, AppError> {
        self.inner.list_element_jobs(element_id).await
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        self.inner.get_job(job_id).await
    }

    async fn create_job(&self, job: &NewJob) -> Result<Job, AppError> {
        self.inner.create_job(job).await
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<Job, AppError> {
        self.inner.update_job(job_id, patch).await
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), AppError> {
        self.inner.delete_job(job_id).await
    }

    async fn list_workflow_templates(&self) -> Result<WorkflowTemplates, AppError> {
        self.inner.list_workflow_templates().await
    }
}
