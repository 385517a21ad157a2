// src/models/element.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums ---

// Status derivado: nunca é persistido, sempre recalculado a partir dos jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum ElementStatus {
    #[serde(rename = "no jobs")]
    NoJobs,
    #[serde(rename = "non clearance")]
    NonClearance,
    #[serde(rename = "active")]
    Active,
    #[serde(rename = "complete")]
    Complete,
}

impl ElementStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ElementStatus::NoJobs => "no jobs",
            ElementStatus::NonClearance => "non clearance",
            ElementStatus::Active => "active",
            ElementStatus::Complete => "complete",
        }
    }
}

// --- Structs ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StructuralElement {
    pub id: Uuid,
    pub project_id: Uuid,
    #[schema(example = "B-101")]
    pub structure_number: Option<String>,
    #[schema(example = "A/3")]
    pub grid_location: Option<String>,
    #[schema(example = "Level 2")]
    pub level: Option<String>,
    #[schema(example = "Beam")]
    pub member_type: Option<String>,
    #[schema(example = "UB 305x165x40")]
    pub section_size: Option<String>,
    #[schema(example = "intumescent")]
    pub fireproofing_type: Option<String>,
    #[schema(example = "12.50")]
    pub surface_area_sqm: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// O pacote derivado {status, jobsCompleted, totalJobs, completionPercentage, avgProgress}
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementProgress {
    pub status: ElementStatus,
    pub jobs_completed: usize,
    pub total_jobs: usize,
    pub pending_jobs: usize,
    // Ausente quando não há jobs (conta como 0 nas agregações)
    pub completion_percentage: Option<u32>,
    pub avg_progress: f64,
}

impl ElementProgress {
    pub fn completion_or_zero(&self) -> u32 {
        self.completion_percentage.unwrap_or(0)
    }
}

// Linha da tabela do admin: elemento + pacote derivado + job atual.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ElementRow {
    #[serde(flatten)]
    pub element: StructuralElement,
    #[serde(flatten)]
    pub progress: ElementProgress,
    #[schema(example = "Surface Preparation")]
    pub current_pending_job: String,
}
