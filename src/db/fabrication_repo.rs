// src/db/fabrication_repo.rs

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::store::FabricationStore,
    models::{
        element::StructuralElement,
        job::{Job, JobPatch, NewJob},
        project::{Project, ProjectPatch},
        workflow::{WorkflowTemplate, WorkflowTemplates},
    },
};

const JOB_COLUMNS: &str = r#"
    id, element_id, project_id, title, description, job_type, status,
    progress_percentage, order_index, step_number, total_steps,
    created_at, updated_at
"#;

const ELEMENT_COLUMNS: &str = r#"
    id, project_id, structure_number, grid_location, level, member_type,
    section_size, fireproofing_type, surface_area_sqm, created_at, updated_at
"#;

// Implementação PostgreSQL do FabricationStore
#[derive(Clone)]
pub struct PgFabricationStore {
    pool: PgPool,
}

impl PgFabricationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FabricationStore for PgFabricationStore {
    // =========================================================================
    //  PROJETOS
    // =========================================================================

    async fn get_project(&self, project_id: Uuid) -> Result<Option<Project>, AppError> {
        let project = sqlx::query_as::<_, Project>(
            r#"
            SELECT id, title, description, status, priority, location, created_at, updated_at
            FROM projects
            WHERE id = $1
            "#,
        )
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(project)
    }

    async fn update_project(&self, project_id: Uuid, patch: &ProjectPatch) -> Result<Project, AppError> {
        // COALESCE: campos ausentes no patch mantêm o valor atual
        let project = sqlx::query_as::<_, Project>(
            r#"
            UPDATE projects
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                priority = COALESCE($5, priority),
                location = COALESCE($6, location),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, status, priority, location, created_at, updated_at
            "#,
        )
            .bind(project_id)
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(patch.status)
            .bind(patch.priority)
            .bind(patch.location.as_deref())
            .fetch_optional(&self.pool)
            .await?;

        project.ok_or(AppError::ProjectNotFound(project_id))
    }

    // =========================================================================
    //  ELEMENTOS
    // =========================================================================

    async fn list_elements(&self, project_id: Uuid) -> Result<Vec<StructuralElement>, AppError> {
        let sql = format!(
            "SELECT {ELEMENT_COLUMNS} FROM structural_elements WHERE project_id = $1 ORDER BY created_at ASC, id ASC"
        );
        let elements = sqlx::query_as::<_, StructuralElement>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(elements)
    }

    async fn get_element(&self, element_id: Uuid) -> Result<Option<StructuralElement>, AppError> {
        let sql = format!("SELECT {ELEMENT_COLUMNS} FROM structural_elements WHERE id = $1");
        let element = sqlx::query_as::<_, StructuralElement>(&sql)
            .bind(element_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(element)
    }

    // =========================================================================
    //  JOBS
    // =========================================================================

    async fn list_jobs(&self, project_id: Uuid) -> Result<Vec<Job>, AppError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS} FROM jobs WHERE project_id = $1 ORDER BY element_id, created_at ASC"
        );
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn list_element_jobs(&self, element_id: Uuid) -> Result<Vec<Job>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE element_id = $1 ORDER BY created_at ASC");
        let jobs = sqlx::query_as::<_, Job>(&sql)
            .bind(element_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(jobs)
    }

    async fn get_job(&self, job_id: Uuid) -> Result<Option<Job>, AppError> {
        let sql = format!("SELECT {JOB_COLUMNS} FROM jobs WHERE id = $1");
        let job = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(job)
    }

    async fn create_job(&self, job: &NewJob) -> Result<Job, AppError> {
        let sql = format!(
            r#"
            INSERT INTO jobs (
                element_id, project_id, title, description, job_type, status,
                progress_percentage, order_index, step_number, total_steps
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {JOB_COLUMNS}
            "#
        );
        let created = sqlx::query_as::<_, Job>(&sql)
            .bind(job.element_id)
            .bind(job.project_id)
            .bind(&job.title)
            .bind(job.description.as_deref())
            .bind(&job.job_type)
            .bind(job.status)
            .bind(job.progress_percentage)
            .bind(job.order_index)
            .bind(job.step_number)
            .bind(job.total_steps)
            .fetch_one(&self.pool)
            .await?;

        Ok(created)
    }

    async fn update_job(&self, job_id: Uuid, patch: &JobPatch) -> Result<Job, AppError> {
        let sql = format!(
            r#"
            UPDATE jobs
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                status = COALESCE($4, status),
                progress_percentage = COALESCE($5, progress_percentage),
                order_index = COALESCE($6, order_index),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {JOB_COLUMNS}
            "#
        );
        let updated = sqlx::query_as::<_, Job>(&sql)
            .bind(job_id)
            .bind(patch.title.as_deref())
            .bind(patch.description.as_deref())
            .bind(patch.status)
            .bind(patch.progress_percentage)
            .bind(patch.order_index)
            .fetch_optional(&self.pool)
            .await?;

        updated.ok_or(AppError::JobNotFound(job_id))
    }

    async fn delete_job(&self, job_id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::JobNotFound(job_id));
        }
        Ok(())
    }

    // =========================================================================
    //  TEMPLATES DE WORKFLOW
    // =========================================================================

    async fn list_workflow_templates(&self) -> Result<WorkflowTemplates, AppError> {
        let rows = sqlx::query_as::<_, WorkflowTemplate>(
            "SELECT workflow_key, job_titles FROM workflow_templates ORDER BY workflow_key",
        )
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|t| (t.workflow_key, t.job_titles))
            .collect())
    }
}
