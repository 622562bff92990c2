//! In-memory run store for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::traits::store::RunStore;
use crate::types::run::{NewRun, PipelineRun, RunStatus};

/// In-memory storage for pipeline runs.
///
/// Enforces the run state machine: transitions out of a terminal state
/// are rejected, so an `Extracted` run can never be flipped to
/// `Failed` (or vice versa). Not suitable for production as data is
/// lost on restart.
pub struct MemoryRunStore {
    runs: RwLock<HashMap<Uuid, PipelineRun>>,
}

impl Default for MemoryRunStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryRunStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            runs: RwLock::new(HashMap::new()),
        }
    }

    /// Number of stored runs.
    pub fn run_count(&self) -> usize {
        self.runs.read().unwrap().len()
    }

    /// Fetch a run by id (test/diagnostic helper).
    pub fn get_run(&self, id: Uuid) -> Option<PipelineRun> {
        self.runs.read().unwrap().get(&id).cloned()
    }

    /// Snapshot of every stored run, oldest first (test/diagnostic
    /// helper).
    pub fn all_runs(&self) -> Vec<PipelineRun> {
        let mut runs: Vec<_> = self.runs.read().unwrap().values().cloned().collect();
        runs.sort_by_key(|r| r.created_at);
        runs
    }

    /// Clear all stored runs.
    pub fn clear(&self) {
        self.runs.write().unwrap().clear();
    }

    fn transition(
        &self,
        id: Uuid,
        next: RunStatus,
        apply: impl FnOnce(&mut PipelineRun),
    ) -> StoreResult<()> {
        let mut runs = self.runs.write().unwrap();
        let run = runs.get_mut(&id).ok_or(StoreError::RunNotFound(id))?;

        if !run.status.can_transition_to(next) {
            return Err(StoreError::InvalidTransition(format!(
                "{:?} -> {:?}",
                run.status, next
            )));
        }

        run.status = next;
        apply(run);
        Ok(())
    }
}

#[async_trait]
impl RunStore for MemoryRunStore {
    async fn create_run(&self, params: NewRun) -> StoreResult<Uuid> {
        let id = Uuid::new_v4();
        let run = params.into_run(id);
        self.runs.write().unwrap().insert(id, run);
        Ok(id)
    }

    async fn update_run_cleaned(&self, id: Uuid, cleaned_content: &str) -> StoreResult<()> {
        self.transition(id, RunStatus::Cleaned, |run| {
            run.cleaned_content = cleaned_content.to_string();
        })
    }

    async fn update_run_extracted(
        &self,
        id: Uuid,
        extracted_data: &serde_json::Value,
    ) -> StoreResult<()> {
        self.transition(id, RunStatus::Extracted, |run| {
            run.extracted_data = Some(extracted_data.clone());
        })
    }

    async fn update_run_failed(&self, id: Uuid, error: &str) -> StoreResult<()> {
        self.transition(id, RunStatus::Failed, |run| {
            run.error = Some(error.to_string());
        })
    }

    async fn find_latest_run_for_job(&self, job_id: Uuid) -> StoreResult<Option<PipelineRun>> {
        let runs = self.runs.read().unwrap();
        Ok(runs
            .values()
            .filter(|r| r.job_id == Some(job_id))
            .max_by_key(|r| r.created_at)
            .cloned())
    }
}
