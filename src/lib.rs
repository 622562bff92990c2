//! Job-Posting Extraction Pipeline
//!
//! Turns an arbitrary job-posting web page (or pasted text) into
//! structured job data via a multi-stage pipeline:
//! fetch → clean → truncate → extract (LLM call) → persist run state.
//!
//! # Design Philosophy
//!
//! - Reproducible and auditable: every attempt is an append-only run
//!   with a content-addressed configuration fingerprint
//! - Best-effort tracking: bookkeeping never alters the result
//! - One fallback, no retries: a single standard→rendered escalation
//! - Typed errors all the way to the caller, never raw exceptions
//!
//! # Usage
//!
//! ```rust,ignore
//! use jobextract::{JobPipeline, MemoryRunStore, Providers, WebFetcher};
//! use jobextract::{ModelSelection, PipelineSettings, Provider};
//! use std::sync::Arc;
//!
//! let pipeline = JobPipeline::new(
//!     WebFetcher::new(),
//!     Providers::from_env(),
//!     Arc::new(MemoryRunStore::new()),
//! );
//!
//! let selection = ModelSelection::new(Provider::Ollama, "llama3.2");
//! let job = pipeline
//!     .extract_from_url("https://example.com/careers/123", &selection, &PipelineSettings::default())
//!     .await?;
//! println!("{} at {}", job.title, job.company);
//! ```
//!
//! # Modules
//!
//! - [`traits`] - Core trait abstractions (PageFetcher, ChatModel, RunStore)
//! - [`types`] - Pipeline data types (config, job, run)
//! - [`clean`] - Content cleaning strategies
//! - [`fetch`] - Standard and rendered page fetching
//! - [`ai`] - Prompts, extraction invoker, and model providers
//! - [`pipeline`] - The orchestrator
//! - [`stores`] - Storage implementations (MemoryRunStore)
//! - [`tracker`] - Best-effort run tracking
//! - [`testing`] - Mock implementations for testing

pub mod ai;
pub mod clean;
pub mod error;
pub mod fetch;
pub mod pipeline;
pub mod stores;
pub mod testing;
pub mod tracker;
pub mod traits;
pub mod types;

// Re-export core types at crate root
pub use error::{
    ContentOrigin, FetchError, ModelError, PipelineError, Result, StoreError,
};
pub use traits::{
    fetcher::{FetchedPage, PageFetcher},
    model::{ChatModel, ModelRegistry, StructuredRequest},
    store::RunStore,
};
pub use types::{
    config::{
        input_char_budget, CleaningMethod, FetchMethod, ModelSelection, PipelineConfig,
        PipelineSettings, Provider,
    },
    job::{ExtractedJob, JobType, WorkArrangement},
    run::{NewRun, PipelineRun, RunStatus},
};

// Re-export the orchestrator
pub use pipeline::JobPipeline;

// Re-export cleaning entry points
pub use clean::{clean, looks_corrupted, metadata, TextMetadata};

// Re-export fetch and AI implementations
pub use ai::{JobExtractor, OllamaModel, OpenAiModel, Providers, SecretString};
pub use fetch::WebFetcher;

// Re-export stores and tracking
pub use stores::MemoryRunStore;
pub use tracker::RunTracker;
