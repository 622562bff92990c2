//! Pipeline configuration types and the configuration fingerprint.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Content-cleaning strategy.
///
/// Dispatched through [`crate::clean::clean`]; adding a strategy means
/// adding a variant, not touching call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CleaningMethod {
    /// DOM main-content heuristic with html-strip fallback.
    Readability,
    /// Tag surgery only; suitable for fragments and pasted content.
    HtmlStrip,
}

/// How a URL is fetched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FetchMethod {
    /// Plain HTTP GET only; a soft-block or thin content is terminal.
    Standard,
    /// Plain GET first, one headless-browser retry on soft-block or
    /// thin content.
    StandardWithFallback,
    /// Headless browser only.
    #[serde(rename = "always-playwright")]
    AlwaysRendered,
}

/// Caller-supplied pipeline policy. Not persisted server-side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineSettings {
    pub cleaning_method: CleaningMethod,
    pub fetch_method: FetchMethod,
}

impl Default for PipelineSettings {
    fn default() -> Self {
        Self {
            cleaning_method: CleaningMethod::Readability,
            fetch_method: FetchMethod::StandardWithFallback,
        }
    }
}

/// Model provider kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    OpenAi,
    DeepSeek,
    Ollama,
}

impl Provider {
    /// Name used in logs and user-facing provider errors.
    pub fn name(&self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::DeepSeek => "deepseek",
            Self::Ollama => "ollama",
        }
    }

    /// Whether this provider is a local, self-hosted service that
    /// needs an explicit reachability check before use.
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Ollama)
    }
}

impl std::fmt::Display for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// The caller's model choice for one request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelSelection {
    pub provider: Provider,
    /// Model name; empty means "use the default".
    #[serde(default)]
    pub model: String,
    /// Context window in tokens (local providers only).
    #[serde(default)]
    pub num_ctx: Option<u32>,
}

impl ModelSelection {
    pub const DEFAULT_MODEL: &'static str = "llama3.2";
    pub const DEFAULT_NUM_CTX: u32 = 8192;

    pub fn new(provider: Provider, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            num_ctx: None,
        }
    }

    /// Set the context window size.
    pub fn with_num_ctx(mut self, num_ctx: u32) -> Self {
        self.num_ctx = Some(num_ctx);
        self
    }

    /// Model name with the default applied.
    pub fn model_name(&self) -> &str {
        if self.model.is_empty() {
            Self::DEFAULT_MODEL
        } else {
            &self.model
        }
    }

    /// Context window with the default applied.
    pub fn context_window(&self) -> u32 {
        self.num_ctx.unwrap_or(Self::DEFAULT_NUM_CTX)
    }
}

/// Rough chars-per-token ratio used to derive the input budget from a
/// context window.
const CHARS_PER_TOKEN: u32 = 3;
/// Tokens reserved for the system/user prompt scaffolding and output.
const PROMPT_RESERVE_TOKENS: u32 = 1024;
/// Floor for the derived budget so tiny windows still fit the gates.
const MIN_INPUT_CHARS: usize = 2000;
/// Flat budget for remote HTTP providers.
const REMOTE_INPUT_CHARS: usize = 50_000;

/// Maximum cleaned-text length (chars) to send to the model.
///
/// Local models are bounded by their configured context window; remote
/// providers get a flat budget.
pub fn input_char_budget(provider: Provider, num_ctx: u32) -> usize {
    match provider {
        Provider::Ollama => {
            let usable = num_ctx.saturating_sub(PROMPT_RESERVE_TOKENS) * CHARS_PER_TOKEN;
            (usable as usize).max(MIN_INPUT_CHARS)
        }
        Provider::OpenAi | Provider::DeepSeek => REMOTE_INPUT_CHARS,
    }
}

/// Immutable snapshot of everything that affects an extraction's
/// output. Used only to compute a deterministic fingerprint; the
/// fingerprint, not the struct, is the identity for "has this config
/// changed" comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineConfig {
    pub cleaner: CleaningMethod,
    pub model: String,
    pub provider: Provider,
    pub num_ctx: u32,
    pub temperature: f32,
    pub max_input_chars: usize,
}

impl PipelineConfig {
    /// Temperature used for all extraction calls. Fixed low for
    /// determinism.
    pub const EXTRACTION_TEMPERATURE: f32 = 0.1;

    /// Build the config for one request from the caller's model
    /// selection and cleaning method.
    pub fn for_request(cleaner: CleaningMethod, selection: &ModelSelection) -> Self {
        let num_ctx = selection.context_window();
        Self {
            cleaner,
            model: selection.model_name().to_string(),
            provider: selection.provider,
            num_ctx,
            temperature: Self::EXTRACTION_TEMPERATURE,
            max_input_chars: input_char_budget(selection.provider, num_ctx),
        }
    }

    /// Canonical key-sorted JSON encoding of this config.
    ///
    /// `serde_json::Value` objects iterate in key order, so two configs
    /// with identical field values serialize identically regardless of
    /// how they were constructed.
    pub fn serialized(&self) -> String {
        let value = serde_json::to_value(self).unwrap_or(serde_json::Value::Null);
        value.to_string()
    }

    /// Deterministic SHA-256 fingerprint over the canonical encoding.
    /// Stable across processes and restarts.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.serialized().as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PipelineConfig {
        PipelineConfig::for_request(
            CleaningMethod::Readability,
            &ModelSelection::new(Provider::Ollama, "llama3.2").with_num_ctx(8192),
        )
    }

    #[test]
    fn fingerprint_is_stable_across_constructions() {
        let a = config();
        let b = PipelineConfig {
            max_input_chars: a.max_input_chars,
            temperature: a.temperature,
            num_ctx: 8192,
            provider: Provider::Ollama,
            model: "llama3.2".to_string(),
            cleaner: CleaningMethod::Readability,
        };
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.fingerprint().len(), 64); // SHA-256 hex
    }

    #[test]
    fn fingerprint_changes_with_any_field() {
        let base = config();

        let mut other = base.clone();
        other.temperature = 0.100001;
        assert_ne!(base.fingerprint(), other.fingerprint());

        let mut other = base.clone();
        other.cleaner = CleaningMethod::HtmlStrip;
        assert_ne!(base.fingerprint(), other.fingerprint());

        let mut other = base.clone();
        other.model = "mistral".to_string();
        assert_ne!(base.fingerprint(), other.fingerprint());
    }

    #[test]
    fn serialized_config_is_key_sorted() {
        let json = config().serialized();
        let cleaner_pos = json.find("\"cleaner\"").unwrap();
        let model_pos = json.find("\"model\"").unwrap();
        let temp_pos = json.find("\"temperature\"").unwrap();
        assert!(cleaner_pos < model_pos && model_pos < temp_pos);
    }

    #[test]
    fn ollama_budget_scales_with_context_window() {
        let small = input_char_budget(Provider::Ollama, 2048);
        let large = input_char_budget(Provider::Ollama, 32_768);
        assert!(small < large);
        assert!(small >= 2000);
        assert_eq!(input_char_budget(Provider::OpenAi, 8192), 50_000);
    }

    #[test]
    fn settings_default_to_readability_with_fallback() {
        let settings = PipelineSettings::default();
        assert_eq!(settings.cleaning_method, CleaningMethod::Readability);
        assert_eq!(settings.fetch_method, FetchMethod::StandardWithFallback);
    }

    #[test]
    fn wire_names_match_the_settings_strings() {
        let json = serde_json::to_string(&PipelineSettings::default()).unwrap();
        assert!(json.contains("readability"));
        assert!(json.contains("standard-with-fallback"));

        let rendered = serde_json::to_string(&FetchMethod::AlwaysRendered).unwrap();
        assert_eq!(rendered, "\"always-playwright\"");
        let strip = serde_json::to_string(&CleaningMethod::HtmlStrip).unwrap();
        assert_eq!(strip, "\"html-strip\"");
    }
}
