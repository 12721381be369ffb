//! LLM client abstraction and paper summarization.
//!
//! [`LlmProvider`] is the raw completion interface; [`Summarizer`] is what the
//! paper services call. [`LlmSummarizer`] adapts any provider into a
//! summarizer using the prompts in [`prompts`].

mod openai;
pub mod prompts;

pub use openai::OpenAiClient;

use crate::models::{Paper, SimilarityResult};
use crate::{Error, Result};
use std::time::Duration;

/// Trait for LLM providers.
pub trait LlmProvider: Send + Sync {
    /// The provider name.
    fn name(&self) -> &'static str;

    /// Generates a completion for the given prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    fn complete(&self, prompt: &str) -> Result<String>;

    /// Generates a completion with a system prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the completion fails.
    ///
    /// Default implementation concatenates system and user prompts.
    /// Providers should override this to use native system prompt support.
    fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
        let combined = format!("{system}\n\n---\n\nUser message:\n{user}");
        self.complete(&combined)
    }
}

/// Produces paper summaries and analyses.
///
/// Failures surface as [`Error::SummarizationFailure`]; implementations do
/// not retry.
pub trait Summarizer: Send + Sync {
    /// Summarizes free text, typically an abstract.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummarizationFailure`] if the model call fails.
    fn summarize(&self, context: &str) -> Result<String>;

    /// Summarizes `text` and relates it to previously stored papers.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummarizationFailure`] if the model call fails.
    fn summarize_with_related(&self, text: &str, related: &[SimilarityResult]) -> Result<String>;

    /// Describes key terms, research areas, audience, complexity, and applications.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SummarizationFailure`] if the model call fails.
    fn analyze_paper(&self, paper: &Paper) -> Result<String> {
        self.summarize(&prompts::analysis_prompt(paper))
    }
}

/// [`Summarizer`] backed by an [`LlmProvider`].
pub struct LlmSummarizer<P: LlmProvider> {
    provider: P,
}

impl<P: LlmProvider> LlmSummarizer<P> {
    /// Wraps a provider.
    #[must_use]
    pub const fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Returns the wrapped provider.
    #[must_use]
    pub const fn provider(&self) -> &P {
        &self.provider
    }

    fn complete(&self, system: &str, user: &str) -> Result<String> {
        let completion = self
            .provider
            .complete_with_system(system, user)
            .map_err(|e| match e {
                Error::SummarizationFailure(_) => e,
                other => Error::SummarizationFailure(other.to_string()),
            })?;

        let trimmed = completion.trim();
        if trimmed.is_empty() {
            return Err(Error::SummarizationFailure(format!(
                "{} returned an empty completion",
                self.provider.name()
            )));
        }
        Ok(trimmed.to_string())
    }
}

impl<P: LlmProvider> Summarizer for LlmSummarizer<P> {
    fn summarize(&self, context: &str) -> Result<String> {
        self.complete(prompts::SUMMARY_SYSTEM_PROMPT, &prompts::summary_prompt(context))
    }

    fn summarize_with_related(&self, text: &str, related: &[SimilarityResult]) -> Result<String> {
        self.complete(
            prompts::REFINED_SYSTEM_PROMPT,
            &prompts::refined_summary_prompt(text, related),
        )
    }
}

/// HTTP client configuration for LLM providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LlmHttpConfig {
    /// Request timeout in milliseconds (0 to disable).
    pub timeout_ms: u64,
    /// Connect timeout in milliseconds (0 to disable).
    pub connect_timeout_ms: u64,
}

impl Default for LlmHttpConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30_000,
            connect_timeout_ms: 3_000,
        }
    }
}

impl LlmHttpConfig {
    /// Loads HTTP configuration from config file settings.
    #[must_use]
    pub fn from_config(config: &crate::config::LlmConfig) -> Self {
        let mut settings = Self::default();
        if let Some(timeout_ms) = config.timeout_ms {
            settings.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) = config.connect_timeout_ms {
            settings.connect_timeout_ms = connect_timeout_ms;
        }
        settings
    }

    /// Applies environment variable overrides.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides from `PAPERLENS_LLM_TIMEOUT_MS` and
    /// `PAPERLENS_LLM_CONNECT_TIMEOUT_MS` as resolved by `lookup`.
    #[must_use]
    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(timeout_ms) =
            lookup("PAPERLENS_LLM_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok())
        {
            self.timeout_ms = timeout_ms;
        }
        if let Some(connect_timeout_ms) =
            lookup("PAPERLENS_LLM_CONNECT_TIMEOUT_MS").and_then(|v| v.parse::<u64>().ok())
        {
            self.connect_timeout_ms = connect_timeout_ms;
        }
        self
    }
}

/// Builds a blocking HTTP client for LLM requests with configured timeouts.
#[must_use]
pub fn build_http_client(config: LlmHttpConfig) -> reqwest::blocking::Client {
    let mut builder = reqwest::blocking::Client::builder();
    if config.timeout_ms > 0 {
        builder = builder.timeout(Duration::from_millis(config.timeout_ms));
    }
    if config.connect_timeout_ms > 0 {
        builder = builder.connect_timeout(Duration::from_millis(config.connect_timeout_ms));
    }

    builder.build().unwrap_or_else(|err| {
        tracing::warn!("Failed to build LLM HTTP client: {err}");
        reqwest::blocking::Client::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LlmConfig;
    use crate::models::RecordId;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records prompts and replies with a canned completion.
    struct MockProvider {
        reply: Result<String>,
        calls: Mutex<Vec<(String, String)>>,
    }

    impl MockProvider {
        fn replying(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing(error: Error) -> Self {
            Self {
                reply: Err(error),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for MockProvider {
        fn name(&self) -> &'static str {
            "mock"
        }

        fn complete(&self, prompt: &str) -> Result<String> {
            self.complete_with_system("", prompt)
        }

        fn complete_with_system(&self, system: &str, user: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((system.to_string(), user.to_string()));
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(Error::OperationFailed { operation, cause }) => Err(Error::OperationFailed {
                    operation: operation.clone(),
                    cause: cause.clone(),
                }),
                Err(e) => Err(Error::SummarizationFailure(e.to_string())),
            }
        }
    }

    #[test]
    fn test_summarize_uses_summary_prompts() {
        let summarizer = LlmSummarizer::new(MockProvider::replying("  Short summary.  "));
        assert_eq!(summarizer.summarize("An abstract.").unwrap(), "Short summary.");

        let calls = summarizer.provider().calls.lock().unwrap();
        assert_eq!(calls[0].0, prompts::SUMMARY_SYSTEM_PROMPT);
        assert!(calls[0].1.ends_with("Context: An abstract."));
    }

    #[test]
    fn test_summarize_with_related_includes_context() {
        let summarizer = LlmSummarizer::new(MockProvider::replying("Refined."));
        let related = vec![SimilarityResult {
            id: RecordId::new("r"),
            title: "Related Work".to_string(),
            generated_summary: Some("It did things.".to_string()),
            original_summary: String::new(),
            score: 0.8,
            authors: Vec::new(),
            published: None,
            pdf_url: None,
            categories: Vec::new(),
        }];

        assert_eq!(
            summarizer.summarize_with_related("New paper.", &related).unwrap(),
            "Refined."
        );
        let calls = summarizer.provider().calls.lock().unwrap();
        assert_eq!(calls[0].0, prompts::REFINED_SYSTEM_PROMPT);
        assert!(calls[0].1.contains("Related Paper: Related Work\nSummary: It did things."));
    }

    #[test]
    fn test_analyze_paper_goes_through_summary() {
        let summarizer = LlmSummarizer::new(MockProvider::replying("Analysis."));
        let paper = Paper::new("Title", "Abstract.", Utc::now());
        assert_eq!(summarizer.analyze_paper(&paper).unwrap(), "Analysis.");

        let calls = summarizer.provider().calls.lock().unwrap();
        assert!(calls[0].1.contains("Key technical terms and concepts"));
    }

    #[test]
    fn test_provider_errors_become_summarization_failures() {
        let summarizer = LlmSummarizer::new(MockProvider::failing(Error::OperationFailed {
            operation: "http".to_string(),
            cause: "connection refused".to_string(),
        }));
        let err = summarizer.summarize("text").unwrap_err();
        assert!(matches!(err, Error::SummarizationFailure(ref cause) if cause.contains("connection refused")));
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_empty_completion_is_failure() {
        let summarizer = LlmSummarizer::new(MockProvider::replying("   "));
        assert!(matches!(
            summarizer.summarize("text"),
            Err(Error::SummarizationFailure(_))
        ));
    }

    #[test]
    fn test_http_config_default() {
        let config = LlmHttpConfig::default();
        assert_eq!(config.timeout_ms, 30_000);
        assert_eq!(config.connect_timeout_ms, 3_000);
    }

    #[test]
    fn test_http_config_from_config_and_overrides() {
        let llm = LlmConfig {
            timeout_ms: Some(10_000),
            ..LlmConfig::default()
        };
        let vars: HashMap<&str, &str> = HashMap::from([("PAPERLENS_LLM_CONNECT_TIMEOUT_MS", "500")]);
        let config = LlmHttpConfig::from_config(&llm)
            .with_overrides_from(|key| vars.get(key).map(ToString::to_string));

        assert_eq!(config.timeout_ms, 10_000);
        assert_eq!(config.connect_timeout_ms, 500);
    }
}
