// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Projects ---
        handlers::projects::get_overview,
        handlers::projects::list_elements,
        handlers::projects::get_status,
        handlers::projects::correct_status,

        // --- Workflows ---
        handlers::jobs::list_workflows,
        handlers::jobs::assign_workflow,
        handlers::projects::bulk_assign_workflow,

        // --- Jobs ---
        handlers::jobs::list_element_jobs,
        handlers::jobs::insert_custom_job,
        handlers::jobs::renormalize_element,
        handlers::jobs::update_job,
        handlers::jobs::delete_job,
        handlers::jobs::move_job,

        // --- Views ---
        handlers::views::grouped_view,
        handlers::views::expand_group,
    ),
    components(
        schemas(
            // --- Projects ---
            models::project::ProjectStatus,
            models::project::ProjectPriority,
            models::project::DerivedProjectStatus,
            models::project::Project,
            models::project::ProjectOverview,
            models::project::ProjectStatusReport,

            // --- Elements ---
            models::element::ElementStatus,
            models::element::StructuralElement,
            models::element::ElementProgress,
            models::element::ElementRow,

            // --- Jobs ---
            models::job::JobStatus,
            models::job::Job,
            models::job::JobPatch,

            // --- Workflows ---
            models::workflow::WorkflowTemplate,
            models::workflow::CustomJobRequest,
            models::workflow::MoveJobRequest,
            models::workflow::AssignWorkflowRequest,
            models::workflow::BulkAssignRequest,
            models::workflow::BulkAssignSuccess,
            models::workflow::BulkAssignFailure,
            models::workflow::BulkAssignReport,

            // --- Views ---
            models::view::RecordField,
            models::view::JobRow,
            models::view::GroupMetrics,
            models::view::GroupSummary,
            models::view::NumericRange,
            models::view::ColumnFilter,
            models::view::ViewState,
            handlers::views::ExpandGroupPayload,
        )
    ),
    tags(
        (name = "Projects", description = "Projetos, elementos e correção de status"),
        (name = "Workflows", description = "Templates e atribuição de workflows"),
        (name = "Jobs", description = "Inserção, edição e ordenação de jobs"),
        (name = "Views", description = "Tabela do admin e worklist agrupadas")
    )
)]
pub struct ApiDoc;
