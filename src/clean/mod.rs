//! Content cleaning: raw HTML (or pasted text) to normalized,
//! LLM-ready plain text.
//!
//! Two interchangeable strategies, dispatched through
//! [`CleaningMethod`]:
//!
//! - [`CleaningMethod::HtmlStrip`] — tag surgery with structured-data
//!   preservation; right for fragments and pasted content.
//! - [`CleaningMethod::Readability`] — main-content extraction with a
//!   whole-document strip fallback and salary-token repair.
//!
//! Cleaning never fails: internal errors degrade to the simpler
//! strategy, and the output is always a single string.

pub mod readable;
pub mod strip;

use url::Url;

use crate::types::config::CleaningMethod;

pub use strip::{looks_corrupted, metadata, normalize_whitespace, TextMetadata};

/// Clean `html` with the selected strategy.
///
/// `base_url` is only consulted by the readability strategy, which
/// needs it to resolve relative links in the parsed document.
pub fn clean(html: &str, method: CleaningMethod, base_url: Option<&Url>) -> String {
    match method {
        CleaningMethod::HtmlStrip => strip::clean_html(html),
        CleaningMethod::Readability => readable::clean_readable(html, base_url),
    }
}
