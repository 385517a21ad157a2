// src/models/view.rs

use std::collections::{BTreeMap, BTreeSet};

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::element::{ElementRow, ElementStatus};
use crate::models::job::Job;

// =========================================================================
//  CAMPOS FILTRÁVEIS / AGRUPÁVEIS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum RecordField {
    // Elemento
    StructureNumber,
    GridLocation,
    Level,
    MemberType,
    SectionSize,
    FireproofingType,
    SurfaceAreaSqm,
    Status,
    JobsCompleted,
    TotalJobs,
    CompletionPercentage,
    AvgProgress,
    CurrentPendingJob,
    // Job
    Title,
    Description,
    JobType,
    JobStatus,
    ProgressPercentage,
    StepNumber,
}

impl RecordField {
    pub const ALL: [RecordField; 19] = [
        RecordField::StructureNumber,
        RecordField::GridLocation,
        RecordField::Level,
        RecordField::MemberType,
        RecordField::SectionSize,
        RecordField::FireproofingType,
        RecordField::SurfaceAreaSqm,
        RecordField::Status,
        RecordField::JobsCompleted,
        RecordField::TotalJobs,
        RecordField::CompletionPercentage,
        RecordField::AvgProgress,
        RecordField::CurrentPendingJob,
        RecordField::Title,
        RecordField::Description,
        RecordField::JobType,
        RecordField::JobStatus,
        RecordField::ProgressPercentage,
        RecordField::StepNumber,
    ];
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    Number(f64),
    Empty,
}

impl FieldValue {
    fn text(value: &Option<String>) -> Self {
        match value {
            Some(v) if !v.is_empty() => FieldValue::Text(v.clone()),
            _ => FieldValue::Empty,
        }
    }

    fn decimal(value: Decimal) -> Self {
        value.to_f64().map(FieldValue::Number).unwrap_or(FieldValue::Empty)
    }

    fn count(value: usize) -> Self {
        FieldValue::Number(value as f64)
    }

    /// Valor "stringificado" usado pela busca textual e pelos multi-selects.
    pub fn as_text(&self) -> Option<String> {
        match self {
            FieldValue::Text(s) => Some(s.clone()),
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Empty => None,
        }
    }

    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            FieldValue::Text(s) => s.trim().parse::<f64>().ok(),
            FieldValue::Empty => None,
        }
    }
}

/// Qualquer registro que a FilterEngine/GroupingEngine sabe ler.
pub trait Record {
    fn field(&self, field: RecordField) -> FieldValue;
}

// =========================================================================
//  LINHA DO WORKLIST (job + atributos do elemento)
// =========================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct JobRow {
    #[serde(flatten)]
    pub job: Job,
    pub structure_number: Option<String>,
    pub grid_location: Option<String>,
    pub level: Option<String>,
    pub member_type: Option<String>,
    pub section_size: Option<String>,
    pub fireproofing_type: Option<String>,
    pub surface_area_sqm: Decimal,
    pub element_status: ElementStatus,
}

impl Record for JobRow {
    fn field(&self, field: RecordField) -> FieldValue {
        match field {
            RecordField::StructureNumber => FieldValue::text(&self.structure_number),
            RecordField::GridLocation => FieldValue::text(&self.grid_location),
            RecordField::Level => FieldValue::text(&self.level),
            RecordField::MemberType => FieldValue::text(&self.member_type),
            RecordField::SectionSize => FieldValue::text(&self.section_size),
            RecordField::FireproofingType => FieldValue::text(&self.fireproofing_type),
            RecordField::SurfaceAreaSqm => FieldValue::decimal(self.surface_area_sqm),
            RecordField::Status => FieldValue::Text(self.element_status.as_str().to_string()),
            // Campos agregados do elemento não existem numa linha de job
            RecordField::JobsCompleted
            | RecordField::TotalJobs
            | RecordField::CompletionPercentage
            | RecordField::AvgProgress
            | RecordField::CurrentPendingJob => FieldValue::Empty,
            RecordField::Title => FieldValue::Text(self.job.title.clone()),
            RecordField::Description => FieldValue::text(&self.job.description),
            RecordField::JobType => FieldValue::Text(self.job.job_type.clone()),
            RecordField::JobStatus => FieldValue::Text(self.job.status.as_str().to_string()),
            RecordField::ProgressPercentage => {
                FieldValue::Number(f64::from(self.job.progress_percentage))
            }
            RecordField::StepNumber => self
                .job
                .step_number
                .map(|s| FieldValue::Number(f64::from(s)))
                .unwrap_or(FieldValue::Empty),
        }
    }
}

impl Record for ElementRow {
    fn field(&self, field: RecordField) -> FieldValue {
        let element = &self.element;
        let progress = &self.progress;
        match field {
            RecordField::StructureNumber => FieldValue::text(&element.structure_number),
            RecordField::GridLocation => FieldValue::text(&element.grid_location),
            RecordField::Level => FieldValue::text(&element.level),
            RecordField::MemberType => FieldValue::text(&element.member_type),
            RecordField::SectionSize => FieldValue::text(&element.section_size),
            RecordField::FireproofingType => FieldValue::text(&element.fireproofing_type),
            RecordField::SurfaceAreaSqm => FieldValue::decimal(element.surface_area_sqm),
            RecordField::Status => FieldValue::Text(progress.status.as_str().to_string()),
            RecordField::JobsCompleted => FieldValue::count(progress.jobs_completed),
            RecordField::TotalJobs => FieldValue::count(progress.total_jobs),
            RecordField::CompletionPercentage => {
                FieldValue::Number(f64::from(progress.completion_or_zero()))
            }
            RecordField::AvgProgress => FieldValue::Number(progress.avg_progress),
            RecordField::CurrentPendingJob => FieldValue::Text(self.current_pending_job.clone()),
            // Campos de job não existem numa linha de elemento
            RecordField::Title
            | RecordField::Description
            | RecordField::JobType
            | RecordField::JobStatus
            | RecordField::ProgressPercentage
            | RecordField::StepNumber => FieldValue::Empty,
        }
    }
}

// =========================================================================
//  FILTROS E ESTADO DA VIEW
// =========================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct NumericRange {
    #[serde(default)]
    pub min: Option<f64>,
    #[serde(default)]
    pub max: Option<f64>,
}

impl NumericRange {
    pub fn is_unbounded(&self) -> bool {
        self.min.is_none() && self.max.is_none()
    }

    pub fn contains(&self, value: f64) -> bool {
        let min = self.min.unwrap_or(f64::NEG_INFINITY);
        let max = self.max.unwrap_or(f64::INFINITY);
        value >= min && value <= max
    }
}

// JSON: ["A", "B"] para multi-select ou {"min": 0, "max": 50} para faixa numérica
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum ColumnFilter {
    Values(BTreeSet<String>),
    Range(NumericRange),
}

pub type ColumnFilters = BTreeMap<RecordField, ColumnFilter>;

/// Caminho de um grupo a partir da raiz (uma chave por nível).
pub type GroupPath = Vec<String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ViewKind {
    // Tabela do admin: uma linha por elemento
    #[serde(rename = "admin")]
    AdminTable,
    // Worklist do engenheiro: uma linha por job
    #[serde(rename = "worklist")]
    EngineerWorklist,
}

impl ViewKind {
    pub fn default_group_by(&self) -> Vec<RecordField> {
        match self {
            ViewKind::AdminTable => vec![RecordField::GridLocation],
            ViewKind::EngineerWorklist => vec![
                RecordField::GridLocation,
                RecordField::FireproofingType,
                RecordField::Title,
                RecordField::JobStatus,
            ],
        }
    }
}

// Estado serializável de uma view. A UI é dona da persistência entre renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    #[schema(example = "beam")]
    pub search: String,
    // Chave = RecordField em camelCase
    #[schema(value_type = BTreeMap<String, ColumnFilter>)]
    pub column_filters: ColumnFilters,
    pub group_by: Vec<RecordField>,
    #[schema(value_type = Vec<Vec<String>>)]
    pub expanded: BTreeSet<GroupPath>,
}

impl ViewState {
    pub fn group_chain(&self, kind: ViewKind) -> Vec<RecordField> {
        if self.group_by.is_empty() {
            kind.default_group_by()
        } else {
            self.group_by.clone()
        }
    }
}

// =========================================================================
//  ÁRVORE DE GRUPOS
// =========================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupMetrics {
    pub element_count: usize,
    pub job_count: usize,
    pub pending_jobs: usize,
    // Soma sobre elementos distintos
    pub sqm: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind", content = "items")]
pub enum GroupChildren<R> {
    Groups(Vec<GroupNode<R>>),
    Records(Vec<R>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupNode<R> {
    pub key: String,
    pub field: RecordField,
    pub metrics: GroupMetrics,
    pub children: GroupChildren<R>,
}

// Só as métricas, sem materializar os registros
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GroupSummary {
    pub path: GroupPath,
    pub field: RecordField,
    pub metrics: GroupMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpandedGroup<R> {
    pub path: GroupPath,
    pub records: Vec<R>,
}

// Resposta de uma view: contagens do primeiro nível (e dos níveis abertos)
// mais os registros dos grupos expandidos.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GroupedView<R> {
    pub project_id: Uuid,
    pub total: GroupMetrics,
    pub groups: Vec<GroupSummary>,
    pub expanded: Vec<ExpandedGroup<R>>,
}
