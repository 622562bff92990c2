//! Pipeline run records: the append-only audit log of processing
//! attempts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::config::PipelineConfig;

/// Lifecycle state of a pipeline run.
///
/// `Pending → Cleaned → Extracted` on success; `Pending → Failed` or
/// `Cleaned → Failed` on error. `Extracted` and `Failed` are terminal:
/// a run is never mutated after reaching either, and reprocessing
/// always creates a new run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Pending,
    Cleaned,
    Extracted,
    Failed,
}

impl RunStatus {
    /// Whether a run in this state may never change state again.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Extracted | Self::Failed)
    }

    /// Whether the state machine permits moving to `next`.
    pub fn can_transition_to(&self, next: RunStatus) -> bool {
        match (self, next) {
            (Self::Pending, Self::Cleaned) => true,
            (Self::Pending, Self::Failed) => true,
            (Self::Cleaned, Self::Extracted) => true,
            (Self::Cleaned, Self::Failed) => true,
            _ => false,
        }
    }
}

/// One processing attempt: raw content, cleaned content, result or
/// failure, and the configuration fingerprint it ran under.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineRun {
    pub id: Uuid,

    /// Job this run belongs to, if any. At most one of `job_id` and
    /// `resume_id` is set; both absent for ad-hoc extraction.
    pub job_id: Option<Uuid>,
    pub resume_id: Option<Uuid>,

    /// URL the raw content was fetched from, if it was fetched.
    pub source_url: Option<String>,

    /// Content exactly as obtained (fetched HTML or pasted text).
    pub raw_content: String,

    /// Content after cleaning and truncation; empty until the run
    /// reaches `Cleaned`.
    pub cleaned_content: String,

    /// Fingerprint of the configuration this run executed under.
    pub config_hash: String,

    /// Canonical JSON of the full configuration, for auditability.
    pub config_json: String,

    /// Structured result, present once `Extracted`.
    pub extracted_data: Option<serde_json::Value>,

    /// Failure message, present once `Failed`.
    pub error: Option<String>,

    pub status: RunStatus,
    pub created_at: DateTime<Utc>,
}

/// Parameters for creating a run. The run starts `Pending` the moment
/// raw content is available, before cleaning.
#[derive(Debug, Clone)]
pub struct NewRun {
    pub job_id: Option<Uuid>,
    pub resume_id: Option<Uuid>,
    pub source_url: Option<String>,
    pub raw_content: String,
    pub config_hash: String,
    pub config_json: String,
}

impl NewRun {
    /// Build run parameters from raw content and the active config.
    pub fn new(raw_content: impl Into<String>, config: &PipelineConfig) -> Self {
        Self {
            job_id: None,
            resume_id: None,
            source_url: None,
            raw_content: raw_content.into(),
            config_hash: config.fingerprint(),
            config_json: config.serialized(),
        }
    }

    /// Attach the job this run belongs to. Clears any resume link; a
    /// run belongs to at most one of the two.
    pub fn for_job(mut self, job_id: Uuid) -> Self {
        self.job_id = Some(job_id);
        self.resume_id = None;
        self
    }

    /// Attach the resume this run belongs to. Clears any job link.
    pub fn for_resume(mut self, resume_id: Uuid) -> Self {
        self.resume_id = Some(resume_id);
        self.job_id = None;
        self
    }

    /// Attach the source URL the content was fetched from.
    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }

    /// Materialize the `Pending` run entity.
    pub fn into_run(self, id: Uuid) -> PipelineRun {
        PipelineRun {
            id,
            job_id: self.job_id,
            resume_id: self.resume_id,
            source_url: self.source_url,
            raw_content: self.raw_content,
            cleaned_content: String::new(),
            config_hash: self.config_hash,
            config_json: self.config_json,
            extracted_data: None,
            error: None,
            status: RunStatus::Pending,
            created_at: Utc::now(),
        }
    }
}
