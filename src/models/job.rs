// src/models/job.rs

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Tipo usado para jobs criados manualmente (fora de um template).
pub const CUSTOM_JOB_TYPE: &str = "custom";

// Jobs legados sem stepNumber vão para o fim da lista
pub const LEGACY_STEP_SENTINEL: i32 = 9999;

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "job_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Completed,
    NotApplicable,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Completed => "completed",
            JobStatus::NotApplicable => "not_applicable",
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub element_id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "Surface Preparation")]
    pub title: String,
    pub description: Option<String>,
    #[schema(example = "intumescent")]
    pub job_type: String,
    pub status: JobStatus,
    #[schema(example = 40)]
    pub progress_percentage: i32,
    #[schema(example = 15.0)]
    pub order_index: Option<f64>,
    pub step_number: Option<i32>,
    pub total_steps: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Job {
    /// Chave de ordenação efetiva. `order_index` ausente (ou NaN) vira
    /// `step_number * 10`; sem `step_number` usa o sentinela legado.
    pub fn effective_order_key(&self) -> f64 {
        effective_order_key(self.order_index, self.step_number)
    }

    pub fn is_pending_like(&self) -> bool {
        match self.status {
            JobStatus::Pending | JobStatus::NotApplicable => true,
            JobStatus::Completed => false,
        }
    }
}

pub fn effective_order_key(order_index: Option<f64>, step_number: Option<i32>) -> f64 {
    match order_index {
        Some(key) if key.is_finite() => key,
        _ => f64::from(step_number.unwrap_or(LEGACY_STEP_SENTINEL)) * 10.0,
    }
}

/// Ordem total dos jobs de um elemento: chave efetiva, depois stepNumber,
/// depois data de criação.
pub fn compare_jobs(a: &Job, b: &Job) -> Ordering {
    a.effective_order_key()
        .total_cmp(&b.effective_order_key())
        .then_with(|| {
            let sa = a.step_number.unwrap_or(LEGACY_STEP_SENTINEL);
            let sb = b.step_number.unwrap_or(LEGACY_STEP_SENTINEL);
            sa.cmp(&sb)
        })
        .then_with(|| a.created_at.cmp(&b.created_at))
}

/// Ordenação estável (`sort_by` preserva a ordem de entrada nos empates).
pub fn sort_jobs(jobs: &mut [Job]) {
    jobs.sort_by(compare_jobs);
}

// Registro a ser persistido (ainda sem id/timestamps)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewJob {
    pub element_id: Uuid,
    pub project_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub job_type: String,
    pub status: JobStatus,
    pub progress_percentage: i32,
    pub order_index: Option<f64>,
    pub step_number: Option<i32>,
    pub total_steps: Option<i32>,
}

/// Rejeita títulos vazios ou só com espaços.
pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some("O título do job é obrigatório.".into());
        return Err(err);
    }
    Ok(())
}

// Atualização parcial (PATCH). Campos `None` não são alterados.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobPatch {
    #[validate(custom(function = "validate_not_blank"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<JobStatus>,
    #[validate(range(min = 0, max = 100, message = "O progresso deve estar entre 0 e 100."))]
    pub progress_percentage: Option<i32>,
    #[serde(skip)]
    pub order_index: Option<f64>,
}

impl JobPatch {
    pub fn reorder(order_index: f64) -> Self {
        Self {
            order_index: Some(order_index),
            ..Self::default()
        }
    }

    pub fn apply_to(&self, job: &mut Job) {
        if let Some(title) = &self.title {
            job.title = title.clone();
        }
        if let Some(description) = &self.description {
            job.description = Some(description.clone());
        }
        if let Some(status) = self.status {
            job.status = status;
        }
        if let Some(progress) = self.progress_percentage {
            job.progress_percentage = progress;
        }
        if let Some(order_index) = self.order_index {
            job.order_index = Some(order_index);
        }
    }
}
