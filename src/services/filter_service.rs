// src/services/filter_service.rs

use crate::models::view::{ColumnFilter, ColumnFilters, Record, RecordField};

/// Busca textual: substring sem diferenciar maiúsculas, em qualquer campo (OU).
pub fn matches_text<R: Record>(record: &R, text_filter: &str) -> bool {
    let needle = text_filter.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }

    RecordField::ALL.iter().any(|field| {
        record
            .field(*field)
            .as_text()
            .is_some_and(|value| value.to_lowercase().contains(&needle))
    })
}

pub fn matches_column<R: Record>(record: &R, field: RecordField, filter: &ColumnFilter) -> bool {
    match filter {
        // Conjunto vazio = sem filtro nesta coluna
        ColumnFilter::Values(allowed) if allowed.is_empty() => true,
        ColumnFilter::Values(allowed) => record
            .field(field)
            .as_text()
            .is_some_and(|value| allowed.contains(&value)),
        ColumnFilter::Range(range) if range.is_unbounded() => true,
        ColumnFilter::Range(range) => record
            .field(field)
            .as_number()
            .is_some_and(|value| range.contains(value)),
    }
}

/// Colunas em E; valores de uma mesma coluna em OU.
pub fn matches_columns<R: Record>(record: &R, column_filters: &ColumnFilters) -> bool {
    column_filters
        .iter()
        .all(|(field, filter)| matches_column(record, *field, filter))
}

pub fn apply_filters<R: Record + Clone>(
    records: &[R],
    text_filter: &str,
    column_filters: &ColumnFilters,
) -> Vec<R> {
    records
        .iter()
        .filter(|record| matches_text(*record, text_filter) && matches_columns(*record, column_filters))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::element::{ElementProgress, ElementRow, ElementStatus, StructuralElement};
    use crate::models::view::NumericRange;
    use chrono::Utc;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use std::collections::{BTreeMap, BTreeSet};
    use uuid::Uuid;

    fn row(grid: &str, member: &str, sqm: i64, status: ElementStatus, pending: &str) -> ElementRow {
        let now = Utc::now();
        ElementRow {
            element: StructuralElement {
                id: Uuid::new_v4(),
                project_id: Uuid::nil(),
                structure_number: Some(format!("{member}-{grid}")),
                grid_location: Some(grid.to_string()),
                level: Some("L1".to_string()),
                member_type: Some(member.to_string()),
                section_size: None,
                fireproofing_type: Some("intumescent".to_string()),
                surface_area_sqm: Decimal::from(sqm),
                created_at: now,
                updated_at: now,
            },
            progress: ElementProgress {
                status,
                jobs_completed: 0,
                total_jobs: 2,
                pending_jobs: 2,
                completion_percentage: Some(0),
                avg_progress: 0.0,
            },
            current_pending_job: pending.to_string(),
        }
    }

    fn values(items: &[&str]) -> ColumnFilter {
        ColumnFilter::Values(items.iter().map(|s| s.to_string()).collect())
    }

    fn sample() -> Vec<ElementRow> {
        vec![
            row("A/1", "Beam", 10, ElementStatus::Active, "Primer"),
            row("A/2", "Column", 20, ElementStatus::Complete, "All jobs complete"),
            row("B/1", "Beam", 30, ElementStatus::NoJobs, "No jobs"),
        ]
    }

    #[test]
    fn text_filter_is_case_insensitive_across_fields() {
        let rows = sample();
        let found = apply_filters(&rows, "bEaM", &BTreeMap::new());
        assert_eq!(found.len(), 2);
        let by_status = apply_filters(&rows, "COMPLETE", &BTreeMap::new());
        assert_eq!(by_status.len(), 1);
        assert!(apply_filters(&rows, "   ", &BTreeMap::new()).len() == 3);
    }

    #[test]
    fn multi_select_is_or_within_column() {
        let rows = sample();
        let mut filters = BTreeMap::new();
        filters.insert(RecordField::GridLocation, values(&["A/1", "B/1"]));
        assert_eq!(apply_filters(&rows, "", &filters).len(), 2);
    }

    #[test]
    fn empty_set_does_not_filter() {
        let rows = sample();
        let mut filters = BTreeMap::new();
        filters.insert(RecordField::MemberType, ColumnFilter::Values(BTreeSet::new()));
        assert_eq!(apply_filters(&rows, "", &filters).len(), 3);
    }

    #[test]
    fn numeric_range_with_open_bounds() {
        let rows = sample();
        let mut filters = BTreeMap::new();
        filters.insert(
            RecordField::SurfaceAreaSqm,
            ColumnFilter::Range(NumericRange { min: Some(15.0), max: None }),
        );
        assert_eq!(apply_filters(&rows, "", &filters).len(), 2);

        filters.insert(
            RecordField::SurfaceAreaSqm,
            ColumnFilter::Range(NumericRange { min: None, max: Some(20.0) }),
        );
        assert_eq!(apply_filters(&rows, "", &filters).len(), 2);
    }

    #[test]
    fn current_pending_job_filters_on_sentinels() {
        let rows = sample();
        let mut filters = BTreeMap::new();
        filters.insert(RecordField::CurrentPendingJob, values(&["No jobs", "All jobs complete"]));
        let found = apply_filters(&rows, "", &filters);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|r| r.current_pending_job != "Primer"));
    }

    #[test]
    fn column_filters_deserialize_from_json() {
        let json = r#"{"gridLocation": ["A/1"], "surfaceAreaSqm": {"min": 5}}"#;
        let filters: ColumnFilters = serde_json::from_str(json).unwrap();
        assert_eq!(filters.get(&RecordField::GridLocation), Some(&values(&["A/1"])));
        assert_eq!(
            filters.get(&RecordField::SurfaceAreaSqm),
            Some(&ColumnFilter::Range(NumericRange { min: Some(5.0), max: None }))
        );
    }

    proptest! {
        #[test]
        fn column_filters_are_conjunctive(
            grids in prop::collection::btree_set(prop_oneof![Just("A/1"), Just("A/2"), Just("B/1")], 0..3),
            members in prop::collection::btree_set(prop_oneof![Just("Beam"), Just("Column")], 0..2),
        ) {
            let rows = sample();
            let a = values(&grids.iter().copied().collect::<Vec<_>>());
            let b = values(&members.iter().copied().collect::<Vec<_>>());

            let mut both = BTreeMap::new();
            both.insert(RecordField::GridLocation, a.clone());
            both.insert(RecordField::MemberType, b.clone());
            let mut only_a = BTreeMap::new();
            only_a.insert(RecordField::GridLocation, a);
            let mut only_b = BTreeMap::new();
            only_b.insert(RecordField::MemberType, b);

            let combined: Vec<Uuid> = apply_filters(&rows, "", &both).iter().map(|r| r.element.id).collect();
            let from_b: Vec<Uuid> = apply_filters(&rows, "", &only_b).iter().map(|r| r.element.id).collect();
            let intersection: Vec<Uuid> = apply_filters(&rows, "", &only_a)
                .iter()
                .map(|r| r.element.id)
                .filter(|id| from_b.contains(id))
                .collect();

            prop_assert_eq!(combined, intersection);
        }
    }
}
