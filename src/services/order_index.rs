// src/services/order_index.rs
//
// Chaves de ordem fracionárias: um job novo recebe uma chave entre os vizinhos,
// sem renumerar os outros jobs do elemento.

use uuid::Uuid;

use crate::models::{
    job::{sort_jobs, Job},
    workflow::InsertPosition,
};

/// Chave do primeiro job de um elemento vazio.
pub const SEED_KEY: f64 = 100.0;
/// Distância usada no início/fim e na renormalização.
pub const KEY_STRIDE: f64 = 10.0;
// Abaixo deste gap a média vira `anterior + 0.1`
const MIN_COMFORTABLE_GAP: f64 = 1.0;
const FALLBACK_NUDGE: f64 = 0.1;
/// Gap a partir do qual vale renormalizar as chaves do elemento.
pub const RENORMALIZE_EPSILON: f64 = 1e-6;

/// Calcula a chave para que o novo item ocupe exatamente `position` em
/// `existing_keys` (já ordenadas). Nenhuma chave existente muda.
pub fn compute_insertion_key(existing_keys: &[f64], position: InsertPosition) -> f64 {
    let len = existing_keys.len();
    if len == 0 {
        return SEED_KEY;
    }

    let index = match position {
        InsertPosition::Start => 0,
        InsertPosition::End => len,
        InsertPosition::Index(i) => i.min(len),
    };

    if index == 0 {
        return existing_keys[0] - KEY_STRIDE;
    }
    if index == len {
        return existing_keys[len - 1] + KEY_STRIDE;
    }

    let before = existing_keys[index - 1];
    let after = existing_keys[index];
    let gap = after - before;
    let midpoint = (before + after) / 2.0;

    if gap < RENORMALIZE_EPSILON || midpoint <= before || midpoint >= after {
        tracing::warn!(
            before,
            after,
            gap,
            "Gap de ordenação degenerado; renormalização recomendada"
        );
    }

    if gap < MIN_COMFORTABLE_GAP {
        let nudged = before + FALLBACK_NUDGE;
        // Só usa o empurrão se ele continuar antes do próximo vizinho
        if nudged < after {
            return nudged;
        }
        return midpoint;
    }

    midpoint
}

/// Menor distância entre chaves vizinhas ao redor da posição pedida.
pub fn gap_at(existing_keys: &[f64], position: InsertPosition) -> Option<f64> {
    let len = existing_keys.len();
    let index = match position {
        InsertPosition::Start | InsertPosition::End => return None,
        InsertPosition::Index(i) => i,
    };
    if index == 0 || index >= len {
        return None;
    }
    Some(existing_keys[index] - existing_keys[index - 1])
}

pub fn needs_renormalization(existing_keys: &[f64]) -> bool {
    existing_keys
        .windows(2)
        .any(|pair| pair[1] - pair[0] < RENORMALIZE_EPSILON)
}

/// Reatribui as chaves com passo fixo (10, 20, 30...) na ordem atual.
/// Retorna só os jobs cuja chave de fato muda.
pub fn renormalize(jobs: &[Job]) -> Vec<(Uuid, f64)> {
    let mut ordered = jobs.to_vec();
    sort_jobs(&mut ordered);

    ordered
        .iter()
        .enumerate()
        .filter_map(|(i, job)| {
            let key = (i as f64 + 1.0) * KEY_STRIDE;
            if job.order_index == Some(key) {
                None
            } else {
                Some((job.id, key))
            }
        })
        .collect()
}

/// Chaves efetivas já ordenadas, na ordem dos jobs.
pub fn sorted_keys(jobs: &[Job]) -> Vec<f64> {
    let mut ordered = jobs.to_vec();
    sort_jobs(&mut ordered);
    ordered.iter().map(Job::effective_order_key).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::job::JobStatus;
    use chrono::Utc;

    fn job(order_index: Option<f64>, step_number: Option<i32>) -> Job {
        let now = Utc::now();
        Job {
            id: Uuid::new_v4(),
            element_id: Uuid::nil(),
            project_id: Uuid::nil(),
            title: "Primer".to_string(),
            description: None,
            job_type: "custom".to_string(),
            status: JobStatus::Pending,
            progress_percentage: 0,
            order_index,
            step_number,
            total_steps: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn empty_list_gets_seed_key() {
        assert_eq!(compute_insertion_key(&[], InsertPosition::Index(0)), 100.0);
        assert_eq!(compute_insertion_key(&[], InsertPosition::End), 100.0);
    }

    #[test]
    fn inserts_between_two_jobs_at_midpoint() {
        let key = compute_insertion_key(&[10.0, 20.0], InsertPosition::Index(1));
        assert_eq!(key, 15.0);
    }

    #[test]
    fn start_and_end_step_by_ten() {
        let keys = [10.0, 20.0, 30.0];
        assert_eq!(compute_insertion_key(&keys, InsertPosition::Start), 0.0);
        assert_eq!(compute_insertion_key(&keys, InsertPosition::End), 40.0);
        assert_eq!(compute_insertion_key(&keys, InsertPosition::Index(99)), 40.0);
    }

    #[test]
    fn narrow_gap_falls_back_to_nudge() {
        let key = compute_insertion_key(&[10.0, 10.5], InsertPosition::Index(1));
        assert!((key - 10.1).abs() < 1e-12);
    }

    #[test]
    fn very_narrow_gap_keeps_strict_order() {
        let key = compute_insertion_key(&[10.0, 10.05], InsertPosition::Index(1));
        assert!(key > 10.0 && key < 10.05);
    }

    #[test]
    fn legacy_jobs_without_keys_sort_last() {
        let ordered = job(Some(20.0), Some(1));
        let by_step = job(None, Some(3));
        let legacy = job(None, None);
        let keys = sorted_keys(&[legacy.clone(), by_step.clone(), ordered.clone()]);
        assert_eq!(keys, vec![20.0, 30.0, 99_990.0]);
    }

    #[test]
    fn nan_key_is_treated_as_missing() {
        let broken = job(Some(f64::NAN), Some(2));
        assert_eq!(broken.effective_order_key(), 20.0);
    }

    #[test]
    fn renormalize_reassigns_stride_and_skips_unchanged() {
        let a = job(Some(10.0), None);
        let b = job(Some(10.000_000_1), None);
        let c = job(Some(10.000_000_2), None);
        let changes = renormalize(&[c.clone(), a.clone(), b.clone()]);
        assert_eq!(changes, vec![(b.id, 20.0), (c.id, 30.0)]);
        assert!(needs_renormalization(&[10.0, 10.000_000_1]));
        assert!(!needs_renormalization(&[10.0, 20.0]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    // Sequências estritamente crescentes (uma sequência saudável)
    fn sorted_keys_strategy() -> impl Strategy<Value = Vec<f64>> {
        (-1000.0_f64..1000.0_f64, prop::collection::vec(0.01_f64..50.0_f64, 0..20)).prop_map(
            |(start, gaps)| {
                let mut keys = Vec::with_capacity(gaps.len());
                let mut current = start;
                for gap in gaps {
                    current += gap;
                    keys.push(current);
                }
                keys
            },
        )
    }

    proptest! {
        #[test]
        fn inserted_key_lands_at_requested_index(keys in sorted_keys_strategy(), raw_pos in 0usize..25) {
            let position = raw_pos.min(keys.len());
            let key = compute_insertion_key(&keys, InsertPosition::Index(position));

            let mut merged = keys.clone();
            merged.push(key);
            merged.sort_by(f64::total_cmp);

            let landed = merged.iter().position(|k| *k == key).unwrap();
            prop_assert_eq!(landed, position);
            // Chaves existentes não mudam e continuam distintas da nova
            prop_assert!(!keys.contains(&key));
        }

        #[test]
        fn start_and_end_are_outside_the_range(keys in sorted_keys_strategy()) {
            let start = compute_insertion_key(&keys, InsertPosition::Start);
            let end = compute_insertion_key(&keys, InsertPosition::End);
            if let (Some(first), Some(last)) = (keys.first(), keys.last()) {
                prop_assert!(start < *first);
                prop_assert!(end > *last);
            } else {
                prop_assert_eq!(start, SEED_KEY);
                prop_assert_eq!(end, SEED_KEY);
            }
        }
    }
}
