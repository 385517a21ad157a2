// src/services/status_service.rs
//
// O status do elemento é função pura dos seus jobs. Qualquer status gravado
// no banco é só cache: a derivação abaixo sempre vence.

use std::collections::HashMap;

use uuid::Uuid;

use crate::models::{
    element::{ElementProgress, ElementRow, ElementStatus, StructuralElement},
    job::{sort_jobs, Job, JobStatus},
    project::DerivedProjectStatus,
    view::JobRow,
};

pub const NO_JOBS_LABEL: &str = "No jobs";
pub const ALL_JOBS_COMPLETE_LABEL: &str = "All jobs complete";

/// Deriva {status, concluídos, total, %, progresso médio} de uma lista de jobs.
/// Precedência (primeira regra que casa): sem jobs -> algum N/A -> 100% -> iniciado -> sem jobs.
pub fn derive_status(jobs: &[Job]) -> ElementProgress {
    let total_jobs = jobs.len();
    if total_jobs == 0 {
        return ElementProgress {
            status: ElementStatus::NoJobs,
            jobs_completed: 0,
            total_jobs: 0,
            pending_jobs: 0,
            completion_percentage: None,
            avg_progress: 0.0,
        };
    }

    let mut jobs_completed = 0;
    let mut pending_jobs = 0;
    let mut any_not_applicable = false;
    let mut progress_sum = 0.0;

    for job in jobs {
        match job.status {
            JobStatus::Completed => jobs_completed += 1,
            JobStatus::Pending => pending_jobs += 1,
            JobStatus::NotApplicable => any_not_applicable = true,
        }
        progress_sum += f64::from(job.progress_percentage);
    }

    let avg_progress = progress_sum / total_jobs as f64;
    let completion_percentage =
        (100.0 * jobs_completed as f64 / total_jobs as f64).round() as u32;

    let status = if any_not_applicable {
        ElementStatus::NonClearance
    } else if jobs_completed == total_jobs {
        ElementStatus::Complete
    } else if jobs_completed > 0 || avg_progress > 0.0 {
        ElementStatus::Active
    } else {
        ElementStatus::NoJobs
    };

    ElementProgress {
        status,
        jobs_completed,
        total_jobs,
        pending_jobs,
        completion_percentage: Some(completion_percentage),
        avg_progress,
    }
}

/// Título do primeiro job ainda não concluído (N/A conta como pendente).
pub fn current_pending_job(jobs: &[Job]) -> String {
    if jobs.is_empty() {
        return NO_JOBS_LABEL.to_string();
    }
    let mut ordered = jobs.to_vec();
    sort_jobs(&mut ordered);
    ordered
        .iter()
        .find(|job| job.is_pending_like())
        .map(|job| job.title.clone())
        .unwrap_or_else(|| ALL_JOBS_COMPLETE_LABEL.to_string())
}

/// complete: todos os elementos completos (e ao menos um);
/// in_progress: algum completo; pending: o resto.
pub fn corrected_project_status(elements: &[ElementProgress]) -> DerivedProjectStatus {
    let complete = elements
        .iter()
        .filter(|p| p.status == ElementStatus::Complete)
        .count();

    if !elements.is_empty() && complete == elements.len() {
        DerivedProjectStatus::Complete
    } else if complete > 0 {
        DerivedProjectStatus::InProgress
    } else {
        DerivedProjectStatus::Pending
    }
}

/// Agrupa os jobs por elemento (cada lista já ordenada).
pub fn jobs_by_element(jobs: Vec<Job>) -> HashMap<Uuid, Vec<Job>> {
    let mut grouped: HashMap<Uuid, Vec<Job>> = HashMap::new();
    for job in jobs {
        grouped.entry(job.element_id).or_default().push(job);
    }
    for list in grouped.values_mut() {
        sort_jobs(list);
    }
    grouped
}

pub fn element_row(element: StructuralElement, jobs: &[Job]) -> ElementRow {
    ElementRow {
        progress: derive_status(jobs),
        current_pending_job: current_pending_job(jobs),
        element,
    }
}

/// Anota cada elemento com o pacote derivado. Mantém a ordem dos elementos.
pub fn annotate_elements(elements: Vec<StructuralElement>, jobs: Vec<Job>) -> Vec<ElementRow> {
    let grouped = jobs_by_element(jobs);
    elements
        .into_iter()
        .map(|element| {
            let jobs = grouped.get(&element.id).map(Vec::as_slice).unwrap_or(&[]);
            element_row(element, jobs)
        })
        .collect()
}

/// Linhas do worklist: um registro por job, com os atributos do elemento.
/// Jobs órfãos (sem elemento no projeto) ficam de fora.
pub fn build_job_rows(elements: &[StructuralElement], jobs: Vec<Job>) -> Vec<JobRow> {
    let grouped = jobs_by_element(jobs);
    let mut rows = Vec::new();

    for element in elements {
        let Some(element_jobs) = grouped.get(&element.id) else {
            continue;
        };
        let element_status = derive_status(element_jobs).status;
        for job in element_jobs {
            rows.push(JobRow {
                job: job.clone(),
                structure_number: element.structure_number.clone(),
                grid_location: element.grid_location.clone(),
                level: element.level.clone(),
                member_type: element.member_type.clone(),
                section_size: element.section_size.clone(),
                fireproofing_type: element.fireproofing_type.clone(),
                surface_area_sqm: element.surface_area_sqm,
                element_status,
            });
        }
    }

    let orphans = grouped
        .keys()
        .filter(|id| !elements.iter().any(|e| e.id == **id))
        .count();
    if orphans > 0 {
        tracing::warn!(orphans, "Jobs sem elemento correspondente ignorados");
    }

    rows
}
