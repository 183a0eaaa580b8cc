//! Configuration types for question extraction and answering.
//!
//! All pipeline behaviour is controlled through [`ExtractionConfig`], built
//! via its [`ExtractionConfigBuilder`]. Keeping every knob in one struct makes
//! it trivial to share configs across threads, log them, and diff two runs to
//! understand why their outputs differ.
//!
//! The template-specific pattern tables live in [`Lexicon`](crate::Lexicon)
//! and ride along as one field, so swapping the document template never means
//! rebuilding the rest of the configuration.

use crate::error::Pdf2KravError;
use crate::lexicon::Lexicon;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::sync::Arc;

/// Configuration for one extraction (and optional answering) run.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdf2krav::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .concurrency(4)
///     .answer_limit(6)
///     .model("gpt-4.1-nano")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Pattern tables for the document template. Default: the Swedish
    /// procurement template ([`Lexicon::swedish_procurement`]).
    pub lexicon: Lexicon,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,

    /// Download timeout for URL inputs in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// LLM model identifier, e.g. "gpt-4.1-nano", "mistral-small-latest".
    /// If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "mistral", "ollama").
    /// If None along with `provider`, uses `ProviderFactory::from_env()`.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for answer completions. Default: 0.01.
    ///
    /// Answers must restate what the company profile actually says, not
    /// improvise around it, so the default sits as close to deterministic as
    /// the APIs accept.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate per answer. Default: 1024.
    ///
    /// The system prompt asks for concise answers; 1024 leaves room for the
    /// occasional enumeration without letting a runaway completion bill for
    /// pages of filler.
    pub max_tokens: usize,

    /// Maximum retry attempts on a transient LLM API failure. Default: 3.
    ///
    /// Most 5xx and timeout errors are transient. Permanent errors surface as
    /// [`crate::error::AnswerError`] on the affected question after the
    /// retries are spent; other questions continue unaffected.
    pub max_retries: u32,

    /// Initial retry delay in milliseconds (exponential backoff). Default: 500.
    ///
    /// Doubles after each attempt: 500 ms → 1 s → 2 s.
    pub retry_backoff_ms: u64,

    /// Number of concurrent answer calls. Default: 4.
    ///
    /// Questions are independent, so answering is network-bound fan-out.
    /// Tender questionnaires rarely exceed a few dozen questions; 4 in
    /// flight keeps well under free-tier rate limits while still collapsing
    /// the wall-clock time.
    pub concurrency: usize,

    /// Answer only the first N questions, in document order. Default: None
    /// (answer all).
    ///
    /// Useful as a cost guard when trialling a new document template.
    pub answer_limit: Option<usize>,

    /// Replace the built-in company-representative system prompt scaffold
    /// entirely. The company profile is then ignored.
    pub system_prompt: Option<String>,

    /// Per-LLM-call timeout in seconds. Default: 60.
    pub api_timeout_secs: u64,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            lexicon: Lexicon::default(),
            password: None,
            download_timeout_secs: 120,
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.01,
            max_tokens: 1024,
            max_retries: 3,
            retry_backoff_ms: 500,
            concurrency: 4,
            answer_limit: None,
            system_prompt: None,
            api_timeout_secs: 60,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("lexicon", &self.lexicon)
            .field("password", &self.password.as_ref().map(|_| "<set>"))
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_ms", &self.retry_backoff_ms)
            .field("concurrency", &self.concurrency)
            .field("answer_limit", &self.answer_limit)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn lexicon(mut self, lexicon: Lexicon) -> Self {
        self.config.lexicon = lexicon;
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn max_retries(mut self, n: u32) -> Self {
        self.config.max_retries = n;
        self
    }

    pub fn retry_backoff_ms(mut self, ms: u64) -> Self {
        self.config.retry_backoff_ms = ms;
        self
    }

    pub fn concurrency(mut self, n: usize) -> Self {
        self.config.concurrency = n.max(1);
        self
    }

    pub fn answer_limit(mut self, n: usize) -> Self {
        self.config.answer_limit = Some(n);
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, Pdf2KravError> {
        let c = &self.config;
        if c.concurrency == 0 {
            return Err(Pdf2KravError::InvalidConfig(
                "Concurrency must be ≥ 1".into(),
            ));
        }
        if c.lexicon.gap_width < 2 {
            return Err(Pdf2KravError::InvalidConfig(format!(
                "Gap width must be ≥ 2 (collapsing runs of {} space would mangle all spacing)",
                c.lexicon.gap_width
            )));
        }
        Ok(self.config)
    }
}
