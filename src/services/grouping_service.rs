// src/services/grouping_service.rs
//
// Agrupamento hierárquico (grid -> tipo de proteção -> job -> status, ou qualquer
// cadeia de campos) com métricas por grupo. As contagens saem sem materializar
// os registros; a lista completa de um grupo só é montada quando ele é aberto.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;

use rust_decimal::Decimal;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::FabricationStore,
    models::{
        element::ElementRow,
        job::JobStatus,
        view::{
            ExpandedGroup, GroupChildren, GroupMetrics, GroupNode, GroupPath, GroupSummary,
            GroupedView, JobRow, Record, RecordField, ViewKind, ViewState,
        },
    },
    services::{filter_service::apply_filters, status_service},
};

/// Chave usada quando o campo de agrupamento está vazio.
pub const UNASSIGNED_GROUP: &str = "Unassigned";

// =========================================================================
//  REGISTROS AGRUPÁVEIS
// =========================================================================

pub trait GroupRecord: Record {
    fn element_id(&self) -> Uuid;
    fn job_count(&self) -> usize;
    // Métrica de "trabalho pendente" usada na ordenação dos grupos
    fn pending_jobs(&self) -> usize;
    fn surface_area_sqm(&self) -> Decimal;
    fn leaf_order_key(&self) -> Option<f64> {
        None
    }
}

impl GroupRecord for ElementRow {
    fn element_id(&self) -> Uuid {
        self.element.id
    }

    fn job_count(&self) -> usize {
        self.progress.total_jobs
    }

    fn pending_jobs(&self) -> usize {
        self.progress.pending_jobs
    }

    fn surface_area_sqm(&self) -> Decimal {
        self.element.surface_area_sqm
    }
}

impl GroupRecord for JobRow {
    fn element_id(&self) -> Uuid {
        self.job.element_id
    }

    fn job_count(&self) -> usize {
        1
    }

    fn pending_jobs(&self) -> usize {
        match self.job.status {
            JobStatus::Pending => 1,
            JobStatus::Completed | JobStatus::NotApplicable => 0,
        }
    }

    fn surface_area_sqm(&self) -> Decimal {
        self.surface_area_sqm
    }

    fn leaf_order_key(&self) -> Option<f64> {
        Some(self.job.effective_order_key())
    }
}

pub fn group_key<R: Record>(record: &R, field: RecordField) -> String {
    record
        .field(field)
        .as_text()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| UNASSIGNED_GROUP.to_string())
}

// =========================================================================
//  MÉTRICAS
// =========================================================================

#[derive(Default)]
struct MetricsAccumulator {
    elements: HashSet<Uuid>,
    metrics: GroupMetrics,
}

impl MetricsAccumulator {
    fn add<R: GroupRecord>(&mut self, record: &R) {
        self.metrics.job_count += record.job_count();
        self.metrics.pending_jobs += record.pending_jobs();
        // m² conta uma vez por elemento, mesmo com vários jobs no grupo
        if self.elements.insert(record.element_id()) {
            self.metrics.element_count += 1;
            self.metrics.sqm += record.surface_area_sqm();
        }
    }
}

pub fn compute_metrics<'a, R, I>(records: I) -> GroupMetrics
where
    R: GroupRecord + 'a,
    I: IntoIterator<Item = &'a R>,
{
    let mut acc = MetricsAccumulator::default();
    for record in records {
        acc.add(record);
    }
    acc.metrics
}

// Mais trabalho pendente primeiro; empate pela chave em ordem crescente
fn display_order(a: &(String, GroupMetrics), b: &(String, GroupMetrics)) -> std::cmp::Ordering {
    b.1.pending_jobs
        .cmp(&a.1.pending_jobs)
        .then_with(|| a.0.cmp(&b.0))
}

fn sort_leaf<R: GroupRecord + Clone>(records: &[&R]) -> Vec<R> {
    let mut leaf: Vec<R> = records.iter().map(|r| (*r).clone()).collect();
    if leaf.iter().all(|r| r.leaf_order_key().is_some()) {
        leaf.sort_by(|a, b| {
            let ka = a.leaf_order_key().unwrap_or(f64::INFINITY);
            let kb = b.leaf_order_key().unwrap_or(f64::INFINITY);
            ka.total_cmp(&kb)
        });
    }
    leaf
}

// =========================================================================
//  ÁRVORE COMPLETA
// =========================================================================

/// Monta a árvore inteira. Cadeia vazia devolve só os registros (folha).
pub fn build_group_tree<R: GroupRecord + Clone>(records: &[R], key_chain: &[RecordField]) -> GroupChildren<R> {
    let refs: Vec<&R> = records.iter().collect();
    build_level(&refs, key_chain)
}

fn build_level<R: GroupRecord + Clone>(records: &[&R], key_chain: &[RecordField]) -> GroupChildren<R> {
    let Some((field, rest)) = key_chain.split_first() else {
        return GroupChildren::Records(sort_leaf(records));
    };

    // Preserva a ordem de entrada dentro de cada bucket
    let mut buckets: HashMap<String, Vec<&R>> = HashMap::new();
    for record in records {
        buckets.entry(group_key(*record, *field)).or_default().push(*record);
    }

    let mut keyed: Vec<(String, GroupMetrics)> = buckets
        .iter()
        .map(|(key, members)| (key.clone(), compute_metrics(members.iter().copied())))
        .collect();
    keyed.sort_by(display_order);

    let nodes = keyed
        .into_iter()
        .map(|(key, metrics)| {
            let members = buckets.get(&key).map(Vec::as_slice).unwrap_or(&[]);
            GroupNode {
                children: build_level(members, rest),
                field: *field,
                metrics,
                key,
            }
        })
        .collect();

    GroupChildren::Groups(nodes)
}

// =========================================================================
//  MATERIALIZAÇÃO PREGUIÇOSA
// =========================================================================

pub fn matches_path<R: Record>(record: &R, key_chain: &[RecordField], path: &[String]) -> bool {
    path.len() <= key_chain.len()
        && path
            .iter()
            .zip(key_chain)
            .all(|(key, field)| group_key(record, *field) == *key)
}

/// Métricas dos filhos de `path` (nível `path.len()`), sem montar listas.
pub fn summarize_groups<R: GroupRecord>(
    records: &[R],
    key_chain: &[RecordField],
    path: &[String],
) -> Vec<GroupSummary> {
    let Some(field) = key_chain.get(path.len()) else {
        return Vec::new();
    };

    let mut accumulators: HashMap<String, MetricsAccumulator> = HashMap::new();
    for record in records.iter().filter(|r| matches_path(*r, key_chain, path)) {
        accumulators
            .entry(group_key(record, *field))
            .or_default()
            .add(record);
    }

    let mut keyed: Vec<(String, GroupMetrics)> = accumulators
        .into_iter()
        .map(|(key, acc)| (key, acc.metrics))
        .collect();
    keyed.sort_by(display_order);

    keyed
        .into_iter()
        .map(|(key, metrics)| {
            let mut child_path = path.to_vec();
            child_path.push(key);
            GroupSummary {
                path: child_path,
                field: *field,
                metrics,
            }
        })
        .collect()
}

/// Todos os registros dentro do grupo `path`.
pub fn materialize_group<R: GroupRecord + Clone>(
    records: &[R],
    key_chain: &[RecordField],
    path: &[String],
) -> Vec<R> {
    let members: Vec<&R> = records
        .iter()
        .filter(|r| matches_path(*r, key_chain, path))
        .collect();
    sort_leaf(&members)
}

// =========================================================================
//  CACHE POR GRUPO
// =========================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupCacheKey {
    pub project_id: Uuid,
    pub view: ViewKind,
    // Busca + filtros + cadeia de agrupamento serializados
    pub fingerprint: String,
    pub path: GroupPath,
}

/// Limite de grupos materializados guardados por projeto.
pub const MAX_CACHED_GROUPS_PER_PROJECT: usize = 64;

struct CachedGroup<R> {
    records: Arc<Vec<R>>,
    generation: u64,
    // Ordem de inserção, para despejar o mais antigo
    seq: u64,
}

struct CacheState<R> {
    entries: HashMap<GroupCacheKey, CachedGroup<R>>,
    // Incrementada a cada invalidação; entradas de gerações antigas não valem
    generations: HashMap<Uuid, u64>,
    next_seq: u64,
}

impl<R> CacheState<R> {
    fn generation(&self, project_id: Uuid) -> u64 {
        self.generations.get(&project_id).copied().unwrap_or(0)
    }

    fn evict_oldest(&mut self, project_id: Uuid, capacity: usize) {
        while self.entries.keys().filter(|k| k.project_id == project_id).count() >= capacity {
            let oldest = self
                .entries
                .iter()
                .filter(|(k, _)| k.project_id == project_id)
                .min_by_key(|(_, entry)| entry.seq)
                .map(|(k, _)| k.clone());
            match oldest {
                Some(key) => {
                    self.entries.remove(&key);
                }
                None => break,
            }
        }
    }
}

/// Cada entrada só é escrita pela expansão do próprio grupo.
pub struct GroupCache<R> {
    state: RwLock<CacheState<R>>,
    capacity: usize,
}

impl<R> Default for GroupCache<R> {
    fn default() -> Self {
        Self::with_capacity(MAX_CACHED_GROUPS_PER_PROJECT)
    }
}

impl<R> GroupCache<R> {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            state: RwLock::new(CacheState {
                entries: HashMap::new(),
                generations: HashMap::new(),
                next_seq: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    pub async fn get(&self, key: &GroupCacheKey) -> Option<Arc<Vec<R>>> {
        let state = self.state.read().await;
        let current = state.generation(key.project_id);
        state
            .entries
            .get(key)
            .filter(|entry| entry.generation == current)
            .map(|entry| entry.records.clone())
    }

    pub async fn get_or_load<F, Fut>(&self, key: GroupCacheKey, load: F) -> Result<Arc<Vec<R>>, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Vec<R>, AppError>>,
    {
        let started_at = {
            let state = self.state.read().await;
            let current = state.generation(key.project_id);
            if let Some(entry) = state.entries.get(&key).filter(|e| e.generation == current) {
                return Ok(entry.records.clone());
            }
            current
        };

        // O lock não fica preso durante o carregamento
        let loaded = Arc::new(load().await?);

        let mut state = self.state.write().await;
        if state.generation(key.project_id) != started_at {
            // Houve mutação durante a carga: devolve sem guardar
            return Ok(loaded);
        }
        if let Some(entry) = state.entries.get(&key) {
            return Ok(entry.records.clone());
        }

        state.evict_oldest(key.project_id, self.capacity);
        let seq = state.next_seq;
        state.next_seq += 1;
        state.entries.insert(
            key,
            CachedGroup {
                records: loaded.clone(),
                generation: started_at,
                seq,
            },
        );
        Ok(loaded)
    }

    pub async fn invalidate_project(&self, project_id: Uuid) {
        let mut state = self.state.write().await;
        *state.generations.entry(project_id).or_insert(0) += 1;
        state.entries.retain(|key, _| key.project_id != project_id);
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn project_len(&self, project_id: Uuid) -> usize {
        self.state
            .read()
            .await
            .entries
            .keys()
            .filter(|k| k.project_id == project_id)
            .count()
    }
}

// =========================================================================
//  SERVICE
// =========================================================================

#[derive(Clone)]
pub struct GroupingService {
    store: Arc<dyn FabricationStore>,
    element_groups: Arc<GroupCache<ElementRow>>,
    job_groups: Arc<GroupCache<JobRow>>,
}

impl GroupingService {
    pub fn new(store: Arc<dyn FabricationStore>) -> Self {
        Self {
            store,
            element_groups: Arc::new(GroupCache::default()),
            job_groups: Arc::new(GroupCache::default()),
        }
    }

    async fn require_project(&self, project_id: Uuid) -> Result<(), AppError> {
        self.store
            .get_project(project_id)
            .await?
            .map(|_| ())
            .ok_or(AppError::ProjectNotFound(project_id))
    }

    pub async fn load_element_rows(&self, project_id: Uuid) -> Result<Vec<ElementRow>, AppError> {
        let elements = self.store.list_elements(project_id).await?;
        let jobs = self.store.list_jobs(project_id).await?;
        Ok(status_service::annotate_elements(elements, jobs))
    }

    pub async fn load_job_rows(&self, project_id: Uuid) -> Result<Vec<JobRow>, AppError> {
        let elements = self.store.list_elements(project_id).await?;
        let jobs = self.store.list_jobs(project_id).await?;
        Ok(status_service::build_job_rows(&elements, jobs))
    }

    /// Tabela do admin: contagens + registros dos grupos abertos.
    pub async fn admin_view(&self, project_id: Uuid, state: &ViewState) -> Result<GroupedView<ElementRow>, AppError> {
        self.require_project(project_id).await?;
        let rows = self.load_element_rows(project_id).await?;
        grouped_view(&self.element_groups, project_id, ViewKind::AdminTable, state, rows).await
    }

    /// Worklist do engenheiro.
    pub async fn worklist_view(&self, project_id: Uuid, state: &ViewState) -> Result<GroupedView<JobRow>, AppError> {
        self.require_project(project_id).await?;
        let rows = self.load_job_rows(project_id).await?;
        grouped_view(&self.job_groups, project_id, ViewKind::EngineerWorklist, state, rows).await
    }

    pub async fn expand_admin_group(
        &self,
        project_id: Uuid,
        state: &ViewState,
        path: GroupPath,
    ) -> Result<ExpandedGroup<ElementRow>, AppError> {
        self.require_project(project_id).await?;
        let chain = state.group_chain(ViewKind::AdminTable);
        let key = cache_key(project_id, ViewKind::AdminTable, state, &chain, path.clone())?;
        let records = self
            .element_groups
            .get_or_load(key, || async {
                let rows = self.load_element_rows(project_id).await?;
                let filtered = apply_filters(&rows, &state.search, &state.column_filters);
                Ok(materialize_group(&filtered, &chain, &path))
            })
            .await?;

        Ok(ExpandedGroup {
            records: records.as_ref().clone(),
            path,
        })
    }

    pub async fn expand_worklist_group(
        &self,
        project_id: Uuid,
        state: &ViewState,
        path: GroupPath,
    ) -> Result<ExpandedGroup<JobRow>, AppError> {
        self.require_project(project_id).await?;
        let chain = state.group_chain(ViewKind::EngineerWorklist);
        let key = cache_key(project_id, ViewKind::EngineerWorklist, state, &chain, path.clone())?;
        let records = self
            .job_groups
            .get_or_load(key, || async {
                let rows = self.load_job_rows(project_id).await?;
                let filtered = apply_filters(&rows, &state.search, &state.column_filters);
                Ok(materialize_group(&filtered, &chain, &path))
            })
            .await?;

        Ok(ExpandedGroup {
            records: records.as_ref().clone(),
            path,
        })
    }

    /// Chamado depois de qualquer mutação de job no projeto.
    pub async fn invalidate(&self, project_id: Uuid) {
        self.element_groups.invalidate_project(project_id).await;
        self.job_groups.invalidate_project(project_id).await;
        tracing::debug!(%project_id, "Cache de grupos invalidado");
    }
}

fn cache_key(
    project_id: Uuid,
    view: ViewKind,
    state: &ViewState,
    chain: &[RecordField],
    path: GroupPath,
) -> Result<GroupCacheKey, AppError> {
    let fingerprint = serde_json::to_string(&(&state.search, &state.column_filters, chain))
        .map_err(|e| AppError::InternalServerError(e.into()))?;
    Ok(GroupCacheKey {
        project_id,
        view,
        fingerprint,
        path,
    })
}

async fn grouped_view<R: GroupRecord + Clone>(
    cache: &GroupCache<R>,
    project_id: Uuid,
    view: ViewKind,
    state: &ViewState,
    rows: Vec<R>,
) -> Result<GroupedView<R>, AppError> {
    let chain = state.group_chain(view);
    let filtered = apply_filters(&rows, &state.search, &state.column_filters);

    let mut groups = summarize_groups(&filtered, &chain, &[]);
    let mut expanded = Vec::new();

    for path in &state.expanded {
        if path.is_empty() || path.len() > chain.len() {
            continue;
        }
        if path.len() < chain.len() {
            // Grupo intermediário aberto: mostra as contagens do próximo nível
            groups.extend(summarize_groups(&filtered, &chain, path));
        } else {
            let key = cache_key(project_id, view, state, &chain, path.clone())?;
            let records = cache
                .get_or_load(key, || async { Ok(materialize_group(&filtered, &chain, path)) })
                .await?;
            expanded.push(ExpandedGroup {
                path: path.clone(),
                records: records.as_ref().clone(),
            });
        }
    }

    tracing::debug!(
        %project_id,
        ?view,
        records = filtered.len(),
        groups = groups.len(),
        expanded = expanded.len(),
        "View agrupada montada"
    );

    Ok(GroupedView {
        project_id,
        total: compute_metrics(filtered.iter()),
        groups,
        expanded,
    })
}
