//! Prompt templates for paper summarization and analysis.

use crate::models::{Paper, SimilarityResult};

/// System prompt for plain summaries.
pub const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an expert at summarizing academic papers. Provide clear and concise summaries.";

/// System prompt for summaries informed by related papers.
pub const REFINED_SYSTEM_PROMPT: &str = "You are an expert at analyzing academic papers and providing insights.\n\
Use the context from similar papers to provide a more informed summary.";

/// User prompt asking for a brief summary of `context`.
#[must_use]
pub fn summary_prompt(context: &str) -> String {
    format!("Summarize the key points of this paper briefly:\n\nContext: {context}")
}

/// Renders related papers as `Related Paper: ...` / `Summary: ...` blocks.
#[must_use]
pub fn related_context(related: &[SimilarityResult]) -> String {
    related
        .iter()
        .map(|paper| {
            format!(
                "Related Paper: {}\nSummary: {}",
                paper.title,
                paper.summary_or_unavailable()
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// User prompt relating `text` to similar research.
#[must_use]
pub fn refined_summary_prompt(text: &str, related: &[SimilarityResult]) -> String {
    format!(
        "Summarize this paper and relate it to similar research:\n\n\
         Paper to Summarize:\n{text}\n\n\
         Similar Research Context:\n{}\n\n\
         Provide:\n\
         1. Main points of the current paper\n\
         2. How it relates to similar research\n\
         3. Key differences or advancements",
        related_context(related)
    )
}

/// Prompt asking for key terms, research areas, audience, complexity, and applications.
#[must_use]
pub fn analysis_prompt(paper: &Paper) -> String {
    format!(
        "Analyze this paper and provide:\n\
         1. Key technical terms and concepts (max 5)\n\
         2. Main research areas/categories\n\
         3. Target audience\n\
         4. Technical complexity level (Beginner/Intermediate/Advanced)\n\
         5. Practical applications\n\n\
         Paper Title: {}\n\
         Abstract: {}",
        paper.title, paper.abstract_text
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RecordId;
    use chrono::Utc;

    fn related(title: &str, summary: Option<&str>) -> SimilarityResult {
        SimilarityResult {
            id: RecordId::new(title),
            title: title.to_string(),
            generated_summary: summary.map(ToString::to_string),
            original_summary: String::new(),
            score: 0.9,
            authors: Vec::new(),
            published: None,
            pdf_url: None,
            categories: Vec::new(),
        }
    }

    #[test]
    fn test_summary_prompt() {
        assert_eq!(
            summary_prompt("abc"),
            "Summarize the key points of this paper briefly:\n\nContext: abc"
        );
    }

    #[test]
    fn test_related_context_joins_blocks() {
        let context = related_context(&[related("One", Some("First.")), related("Two", None)]);
        assert_eq!(
            context,
            "Related Paper: One\nSummary: First.\n\nRelated Paper: Two\nSummary: No summary available"
        );
    }

    #[test]
    fn test_refined_prompt_contains_sections() {
        let prompt = refined_summary_prompt("Paper text.", &[related("One", Some("First."))]);
        assert!(prompt.contains("Paper to Summarize:\nPaper text."));
        assert!(prompt.contains("Similar Research Context:\nRelated Paper: One"));
        assert!(prompt.ends_with("3. Key differences or advancements"));
    }

    #[test]
    fn test_analysis_prompt_names_paper() {
        let paper = Paper::new("Title X", "Abstract Y.", Utc::now());
        let prompt = analysis_prompt(&paper);
        assert!(prompt.starts_with("Analyze this paper and provide:\n1. Key technical terms"));
        assert!(prompt.contains("Paper Title: Title X\nAbstract: Abstract Y."));
    }
}
