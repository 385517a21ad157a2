// src/services/project_service.rs

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FabricationStore,
    models::{
        element::{ElementRow, ElementStatus},
        project::{
            DerivedProjectStatus, Project, ProjectOverview, ProjectPatch, ProjectStatus,
            ProjectStatusReport,
        },
    },
    services::status_service,
};

#[derive(Clone)]
pub struct ProjectService {
    store: Arc<dyn FabricationStore>,
}

impl ProjectService {
    pub fn new(store: Arc<dyn FabricationStore>) -> Self {
        Self { store }
    }

    async fn require_project(&self, project_id: Uuid) -> Result<Project, AppError> {
        self.store
            .get_project(project_id)
            .await?
            .ok_or(AppError::ProjectNotFound(project_id))
    }

    // Chamador já confirmou que o projeto existe.
    async fn load_rows(&self, project_id: Uuid) -> Result<Vec<ElementRow>, AppError> {
        let elements = self.store.list_elements(project_id).await?;
        let jobs = self.store.list_jobs(project_id).await?;
        Ok(status_service::annotate_elements(elements, jobs))
    }

    /// Elementos do projeto com status/progresso derivados dos jobs.
    pub async fn list_element_rows(&self, project_id: Uuid) -> Result<Vec<ElementRow>, AppError> {
        self.require_project(project_id).await?;
        self.load_rows(project_id).await
    }

    pub async fn overview(&self, project_id: Uuid) -> Result<ProjectOverview, AppError> {
        let project = self.require_project(project_id).await?;
        let rows = self.load_rows(project_id).await?;
        let progress: Vec<_> = rows.iter().map(|r| r.progress.clone()).collect();

        let total_sqm: Decimal = rows.iter().map(|r| r.element.surface_area_sqm).sum();
        let completed_sqm: Decimal = rows
            .iter()
            .filter(|r| r.progress.status == ElementStatus::Complete)
            .map(|r| r.element.surface_area_sqm)
            .sum();
        let overall_completion = if rows.is_empty() {
            0.0
        } else {
            rows.iter()
                .map(|r| f64::from(r.progress.completion_or_zero()))
                .sum::<f64>()
                / rows.len() as f64
        };

        Ok(ProjectOverview {
            derived_status: status_service::corrected_project_status(&progress),
            element_count: rows.len(),
            job_count: rows.iter().map(|r| r.progress.total_jobs).sum(),
            total_sqm,
            completed_sqm,
            overall_completion,
            project,
        })
    }

    pub async fn status_report(&self, project_id: Uuid) -> Result<ProjectStatusReport, AppError> {
        let project = self.require_project(project_id).await?;
        let rows = self.load_rows(project_id).await?;
        let progress: Vec<_> = rows.into_iter().map(|r| r.progress).collect();
        let derived = status_service::corrected_project_status(&progress);

        Ok(ProjectStatusReport {
            project_id,
            stored: project.status,
            needs_correction: needs_correction(project.status, derived),
            derived,
        })
    }

    /// Projeto marcado `completed` que não está completo volta para `in_progress`.
    /// Idempotente: só grava quando há divergência.
    pub async fn correct_status(&self, project_id: Uuid) -> Result<ProjectStatusReport, AppError> {
        let report = self.status_report(project_id).await?;
        if !report.needs_correction {
            return Ok(report);
        }

        let patch = ProjectPatch {
            status: Some(ProjectStatus::InProgress),
            ..ProjectPatch::default()
        };
        let updated = self.store.update_project(project_id, &patch).await?;
        tracing::warn!(
            %project_id,
            derived = ?report.derived,
            "Status do projeto corrigido de completed para in_progress"
        );

        Ok(ProjectStatusReport {
            stored: updated.status,
            needs_correction: needs_correction(updated.status, report.derived),
            ..report
        })
    }
}

pub fn needs_correction(stored: ProjectStatus, derived: DerivedProjectStatus) -> bool {
    stored == ProjectStatus::Completed && derived != DerivedProjectStatus::Complete
}
