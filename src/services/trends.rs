//! Research trend aggregation over similarity results.

use crate::models::{KeyFinding, SimilarityResult, TrendSummary};

/// Number of similar papers a trend summary is built from.
pub const TREND_SAMPLE_SIZE: usize = 10;

/// Maximum characters of a generated summary kept as a key finding.
pub const KEY_FINDING_EXCERPT_CHARS: usize = 200;

/// Methodology tags and the phrases that signal them.
///
/// Matched case-insensitively against generated summaries and abstracts.
pub const METHODOLOGY_TERMS: &[(&str, &[&str])] = &[
    ("transformer", &["transformer"]),
    ("attention", &["attention mechanism", "self-attention", "attention"]),
    ("deep learning", &["deep learning", "deep neural network"]),
    ("convolutional network", &["convolutional neural network", "convolutional network"]),
    ("recurrent network", &["recurrent neural network", "lstm"]),
    ("graph neural network", &["graph neural network", "graph convolution"]),
    ("reinforcement learning", &["reinforcement learning"]),
    ("generative adversarial network", &["generative adversarial", "adversarial network"]),
    ("diffusion model", &["diffusion model", "denoising diffusion"]),
    ("contrastive learning", &["contrastive learning", "contrastive loss"]),
    ("self-supervised learning", &["self-supervised"]),
    ("transfer learning", &["transfer learning", "fine-tuning", "fine tuning"]),
    ("federated learning", &["federated learning"]),
    ("bayesian inference", &["bayesian"]),
    ("optimization", &["gradient descent", "optimization"]),
    ("benchmark evaluation", &["benchmark"]),
    ("ablation study", &["ablation"]),
    ("simulation", &["simulation"]),
    ("survey", &["survey", "literature review"]),
];

/// Extracts the year from a stored `published` value.
///
/// The year is the prefix before the first `-` and must be four ASCII digits.
#[must_use]
pub fn parse_year(published: &str) -> Option<&str> {
    let prefix = published.trim().split('-').next()?;
    (prefix.len() == 4 && prefix.bytes().all(|b| b.is_ascii_digit())).then_some(prefix)
}

/// Returns at most `max_chars` leading characters of `text`.
#[must_use]
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    text.char_indices()
        .nth(max_chars)
        .map_or(text, |(end, _)| &text[..end])
}

/// Returns the methodology tags found in `text`.
pub fn detect_methodologies(text: &str) -> impl Iterator<Item = &'static str> {
    let lowered = text.to_lowercase();
    METHODOLOGY_TERMS
        .iter()
        .filter(move |(_, phrases)| phrases.iter().any(|p| lowered.contains(p)))
        .map(|(tag, _)| *tag)
}

/// Aggregates similarity results into a trend summary.
///
/// Results are consumed in similarity order, which is the order of key findings.
#[must_use]
pub fn summarize_trends(topic: &str, results: &[SimilarityResult]) -> TrendSummary {
    let mut summary = TrendSummary::empty(topic);
    summary.analyzed = results.len();

    for result in results {
        if let Some(year) = result.published.as_deref().and_then(parse_year) {
            *summary.years.entry(year.to_string()).or_default() += 1;
        }
        for author in &result.authors {
            *summary.authors.entry(author.clone()).or_default() += 1;
        }
        for category in &result.categories {
            *summary.categories.entry(category.clone()).or_default() += 1;
        }

        let generated = result.generated_summary.as_deref().unwrap_or_default();
        let text = format!("{generated}\n{}", result.original_summary);
        summary
            .methodologies
            .extend(detect_methodologies(&text).map(ToString::to_string));

        if !generated.trim().is_empty() {
            summary.key_findings.push(KeyFinding {
                title: result.title.clone(),
                finding: excerpt(generated, KEY_FINDING_EXCERPT_CHARS).to_string(),
            });
        }
    }

    summary
}
