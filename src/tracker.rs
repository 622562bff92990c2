//! Best-effort run tracking.
//!
//! Tracking is advisory: the user-facing extraction result is
//! authoritative, and a failure to write tracking data must never
//! abort or alter it. Run creation is awaited (the id is needed for
//! later updates) but its failure is swallowed; status updates are
//! fire-and-forget tasks whose errors are caught, logged at debug, and
//! discarded.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::debug;
use uuid::Uuid;

use crate::traits::store::RunStore;
use crate::types::run::NewRun;

/// Records each processing attempt against a [`RunStore`], without
/// ever letting a tracking failure reach the caller.
pub struct RunTracker<S> {
    store: Arc<S>,
}

impl<S> Clone for RunTracker<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S: RunStore + 'static> RunTracker<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Access the underlying store (reprocess lookups go through it
    /// directly, since those are not best-effort).
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Create a `Pending` run. Returns `None` — and the pipeline
    /// carries on untracked — if the store rejects the write.
    pub async fn begin(&self, params: NewRun) -> Option<Uuid> {
        match self.store.create_run(params).await {
            Ok(id) => Some(id),
            Err(e) => {
                debug!(error = %e, "run creation failed, continuing untracked");
                None
            }
        }
    }

    /// Record cleaned content, detached from the response path.
    ///
    /// The returned handle is passed to the terminal write so the two
    /// detached tasks cannot reach the store out of order.
    pub fn record_cleaned(&self, run_id: Option<Uuid>, cleaned: &str) -> Option<JoinHandle<()>> {
        let id = run_id?;
        let store = Arc::clone(&self.store);
        let cleaned = cleaned.to_string();
        Some(tokio::spawn(async move {
            if let Err(e) = store.update_run_cleaned(id, &cleaned).await {
                debug!(run_id = %id, error = %e, "cleaned update dropped");
            }
        }))
    }

    /// Record the structured result, detached from the response path,
    /// sequenced after `after` if given.
    pub fn record_extracted(
        &self,
        run_id: Option<Uuid>,
        data: &serde_json::Value,
        after: Option<JoinHandle<()>>,
    ) -> Option<JoinHandle<()>> {
        let id = run_id?;
        let store = Arc::clone(&self.store);
        let data = data.clone();
        Some(tokio::spawn(async move {
            if let Some(prior) = after {
                let _ = prior.await;
            }
            if let Err(e) = store.update_run_extracted(id, &data).await {
                debug!(run_id = %id, error = %e, "extracted update dropped");
            }
        }))
    }

    /// Record a terminal failure, detached from the response path,
    /// sequenced after `after` if given.
    pub fn record_failed(
        &self,
        run_id: Option<Uuid>,
        error: &str,
        after: Option<JoinHandle<()>>,
    ) -> Option<JoinHandle<()>> {
        let id = run_id?;
        let store = Arc::clone(&self.store);
        let error = error.to_string();
        Some(tokio::spawn(async move {
            if let Some(prior) = after {
                let _ = prior.await;
            }
            if let Err(e) = store.update_run_failed(id, &error).await {
                debug!(run_id = %id, error = %e, "failed update dropped");
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{StoreError, StoreResult};
    use crate::stores::MemoryRunStore;
    use crate::types::config::{CleaningMethod, ModelSelection, PipelineConfig, Provider};
    use crate::types::run::{PipelineRun, RunStatus};
    use async_trait::async_trait;

    fn params() -> NewRun {
        let config = PipelineConfig::for_request(
            CleaningMethod::HtmlStrip,
            &ModelSelection::new(Provider::Ollama, "llama3.2"),
        );
        NewRun::new("raw", &config)
    }

    /// A store where every operation fails.
    struct BrokenStore;

    #[async_trait]
    impl RunStore for BrokenStore {
        async fn create_run(&self, _params: NewRun) -> StoreResult<Uuid> {
            Err(StoreError::Backend("disk on fire".into()))
        }
        async fn update_run_cleaned(&self, _id: Uuid, _c: &str) -> StoreResult<()> {
            Err(StoreError::Backend("disk on fire".into()))
        }
        async fn update_run_extracted(&self, _id: Uuid, _d: &serde_json::Value) -> StoreResult<()> {
            Err(StoreError::Backend("disk on fire".into()))
        }
        async fn update_run_failed(&self, _id: Uuid, _e: &str) -> StoreResult<()> {
            Err(StoreError::Backend("disk on fire".into()))
        }
        async fn find_latest_run_for_job(&self, _job_id: Uuid) -> StoreResult<Option<PipelineRun>> {
            Err(StoreError::Backend("disk on fire".into()))
        }
    }

    #[tokio::test]
    async fn broken_store_never_propagates() {
        let tracker = RunTracker::new(Arc::new(BrokenStore));

        let run_id = tracker.begin(params()).await;
        assert!(run_id.is_none());

        // Updates against a missing run are silently dropped too.
        let fake = Some(Uuid::new_v4());
        for handle in [
            tracker.record_cleaned(fake, "text"),
            tracker.record_extracted(fake, &serde_json::json!({}), None),
            tracker.record_failed(fake, "err", None),
        ]
        .into_iter()
        .flatten()
        {
            handle.await.unwrap();
        }
    }

    #[tokio::test]
    async fn updates_land_in_the_store() {
        let store = Arc::new(MemoryRunStore::new());
        let tracker = RunTracker::new(Arc::clone(&store));

        let run_id = tracker.begin(params()).await;
        assert!(run_id.is_some());

        let cleaned_write = tracker.record_cleaned(run_id, "cleaned");
        tracker
            .record_extracted(run_id, &serde_json::json!({"title": "x"}), cleaned_write)
            .unwrap()
            .await
            .unwrap();

        let run = store.get_run(run_id.unwrap()).unwrap();
        assert_eq!(run.status, RunStatus::Extracted);
        assert_eq!(run.cleaned_content, "cleaned");
    }

    #[tokio::test]
    async fn terminal_write_waits_for_the_cleaned_write() {
        let store = Arc::new(MemoryRunStore::new());
        let tracker = RunTracker::new(Arc::clone(&store));

        let run_id = tracker.begin(params()).await;
        let cleaned_write = tracker.record_cleaned(run_id, "cleaned");
        tracker
            .record_failed(run_id, "model error", cleaned_write)
            .unwrap()
            .await
            .unwrap();

        // Both writes landed, in order.
        let run = store.get_run(run_id.unwrap()).unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.cleaned_content, "cleaned");
    }

    #[tokio::test]
    async fn untracked_runs_are_a_no_op() {
        let tracker = RunTracker::new(Arc::new(MemoryRunStore::new()));
        assert!(tracker.record_cleaned(None, "text").is_none());
        assert!(tracker.record_failed(None, "err", None).is_none());
    }
}
