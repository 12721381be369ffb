//! Summary workflow: summarize a paper, optionally with related-paper context.

use super::PaperStore;
use super::paper_store::DEFAULT_SIMILAR_PAPERS;
use crate::Result;
use crate::llm::Summarizer;
use crate::models::{Paper, PaperStats, SimilarityResult};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;

/// How a summary is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SummaryMode {
    /// Summarize the abstract alone and store the result.
    #[default]
    Basic,
    /// Summarize with context from similar stored papers.
    Enhanced,
}

/// Result of summarizing a paper.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryOutcome {
    /// The mode that was requested.
    pub mode: SummaryMode,
    /// The generated summary.
    pub summary: String,
    /// Related papers used as context (enhanced mode only).
    pub related: Vec<SimilarityResult>,
    /// Whether the paper and summary were written to the store.
    pub stored: bool,
}

/// LLM analysis of a paper plus quick statistics.
#[derive(Debug, Clone, Serialize)]
pub struct PaperAnalysis {
    /// Paper title.
    pub title: String,
    /// Free-text analysis from the summarizer.
    pub analysis: String,
    /// Author, category, and length statistics.
    pub stats: PaperStats,
}

/// Orchestrates summarization against the paper store.
pub struct SummaryService {
    store: Arc<PaperStore>,
    summarizer: Arc<dyn Summarizer>,
}

impl SummaryService {
    /// Creates a summary service.
    #[must_use]
    pub fn new(store: Arc<PaperStore>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self { store, summarizer }
    }

    /// Summarizes a paper.
    ///
    /// Basic mode summarizes the abstract and stores the pair. Enhanced mode
    /// looks up similar stored papers for the abstract; with none it falls back
    /// to a basic summary, otherwise it asks for a summary relating the paper
    /// to them. Enhanced summaries are not stored.
    ///
    /// A recoverable storage failure in basic mode is logged and reported as
    /// `stored: false`; the summary is still returned.
    ///
    /// # Errors
    ///
    /// - [`crate::Error::SummarizationFailure`] if the summarizer fails
    /// - errors from the similarity search in enhanced mode
    /// - non-recoverable storage errors in basic mode
    #[instrument(skip(self, paper), fields(title = %paper.title))]
    pub fn summarize_paper(&self, paper: &Paper, mode: SummaryMode) -> Result<SummaryOutcome> {
        match mode {
            SummaryMode::Basic => {
                let summary = self.summarizer.summarize(&paper.abstract_text)?;
                let stored = match self.store.add_paper_with_summary(paper, &summary) {
                    Ok(stored) => stored,
                    Err(e) if e.is_recoverable() => {
                        tracing::warn!(error = %e, "Summary generated but not stored");
                        false
                    },
                    Err(e) => return Err(e),
                };
                Ok(SummaryOutcome {
                    mode,
                    summary,
                    related: Vec::new(),
                    stored,
                })
            },
            SummaryMode::Enhanced => {
                let related = self
                    .store
                    .get_similar_papers(&paper.abstract_text, DEFAULT_SIMILAR_PAPERS)?;
                let summary = if related.is_empty() {
                    tracing::info!("No similar papers stored, generating basic summary");
                    self.summarizer.summarize(&paper.abstract_text)?
                } else {
                    self.summarizer
                        .summarize_with_related(&paper.abstract_text, &related)?
                };
                Ok(SummaryOutcome {
                    mode,
                    summary,
                    related,
                    stored: false,
                })
            },
        }
    }

    /// Analyzes a paper and computes its statistics.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::SummarizationFailure`] if the summarizer fails.
    #[instrument(skip(self, paper), fields(title = %paper.title))]
    pub fn analyze(&self, paper: &Paper) -> Result<PaperAnalysis> {
        Ok(PaperAnalysis {
            title: paper.title.clone(),
            analysis: self.summarizer.analyze_paper(paper)?,
            stats: PaperStats::from_paper(paper),
        })
    }
}
