//! RunStore trait: the persistence collaborator the pipeline drives.
//!
//! The pipeline owns the run lifecycle but not its storage. Raw and
//! cleaned content and extracted data are opaque blobs to the store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::StoreResult;
use crate::types::run::{NewRun, PipelineRun};

/// Persistence collaborator for pipeline runs.
///
/// Implementations must enforce the run state machine: updates against
/// a run in a terminal state (`Extracted`/`Failed`) are rejected with
/// [`crate::error::StoreError::InvalidTransition`]. Reprocessing never
/// rewrites a run; it creates a new one.
#[async_trait]
pub trait RunStore: Send + Sync {
    /// Create a `Pending` run and return its id.
    async fn create_run(&self, params: NewRun) -> StoreResult<Uuid>;

    /// Record cleaned content; moves the run to `Cleaned`.
    async fn update_run_cleaned(&self, id: Uuid, cleaned_content: &str) -> StoreResult<()>;

    /// Record the structured result; moves the run to `Extracted`.
    async fn update_run_extracted(
        &self,
        id: Uuid,
        extracted_data: &serde_json::Value,
    ) -> StoreResult<()>;

    /// Record a terminal failure; moves the run to `Failed`.
    async fn update_run_failed(&self, id: Uuid, error: &str) -> StoreResult<()>;

    /// Most recent run for a job, if any. Used by reprocessing to
    /// re-derive structured data without re-fetching.
    async fn find_latest_run_for_job(&self, job_id: Uuid) -> StoreResult<Option<PipelineRun>>;
}
