//! Paper sources.
//!
//! A [`PaperSource`] finds candidate papers for a query. The bundled
//! [`JsonFileSource`] reads a local catalog export.

use crate::models::Paper;
use crate::{Error, Result};
use std::path::{Path, PathBuf};

/// Default number of papers returned by a search.
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// Trait for paper catalogs.
pub trait PaperSource: Send + Sync {
    /// Returns up to `max_results` papers matching `query`.
    ///
    /// Result order is whatever the catalog provides.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog cannot be read.
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>>;
}

/// Paper source backed by a JSON file.
///
/// The file holds either a JSON array of papers or one paper per line
/// (JSON Lines). A paper matches when every whitespace-separated query term
/// occurs, case-insensitively, in its title or abstract. An empty query
/// matches every paper. Matches are returned in file order.
#[derive(Debug, Clone)]
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Creates a source for a catalog file.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the catalog path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Loads every paper in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`Error::OperationFailed`] if the file cannot be read or a
    /// paper cannot be parsed.
    pub fn load_all(&self) -> Result<Vec<Paper>> {
        let contents = std::fs::read_to_string(&self.path).map_err(|e| Error::OperationFailed {
            operation: "read_paper_source".to_string(),
            cause: format!("{}: {e}", self.path.display()),
        })?;
        parse_papers(&contents)
    }
}

impl PaperSource for JsonFileSource {
    fn search(&self, query: &str, max_results: usize) -> Result<Vec<Paper>> {
        let terms: Vec<String> = query.split_whitespace().map(str::to_lowercase).collect();
        let papers = self.load_all()?;
        let matches: Vec<Paper> = papers
            .into_iter()
            .filter(|paper| matches_terms(paper, &terms))
            .take(max_results)
            .collect();

        tracing::debug!(
            source = %self.path.display(),
            query,
            results = matches.len(),
            "Searched paper source"
        );
        Ok(matches)
    }
}

fn matches_terms(paper: &Paper, terms: &[String]) -> bool {
    if terms.is_empty() {
        return true;
    }
    let haystack = format!("{}\n{}", paper.title, paper.abstract_text).to_lowercase();
    terms.iter().all(|term| haystack.contains(term.as_str()))
}

/// Parses a JSON array or JSON Lines document of papers.
///
/// # Errors
///
/// Returns [`Error::OperationFailed`] naming the offending line for JSON Lines input.
pub fn parse_papers(contents: &str) -> Result<Vec<Paper>> {
    let trimmed = contents.trim_start();
    if trimmed.starts_with('[') {
        return serde_json::from_str(trimmed).map_err(|e| Error::OperationFailed {
            operation: "parse_paper_source".to_string(),
            cause: e.to_string(),
        });
    }

    contents
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line).map_err(|e| Error::OperationFailed {
                operation: "parse_paper_source".to_string(),
                cause: format!("line {}: {e}", number + 1),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const JSONL: &str = r#"{"title": "Attention Is All You Need", "authors": ["Ashish Vaswani"], "summary": "The dominant sequence transduction models are based on recurrent networks.", "pdf_url": "http://arxiv.org/pdf/1706.03762v7", "published": "2017-06-12T17:57:34Z", "categories": ["cs.CL", "cs.LG"]}

{"title": "Deep Residual Learning", "authors": ["Kaiming He"], "abstract": "Deeper neural networks are more difficult to train.", "published": "2015-12-10T19:51:55Z"}
{"title": "Attention Over Graphs", "abstract": "Graph attention networks.", "published": "2017-10-30T00:00:00Z"}
"#;

    fn source(contents: &str) -> (NamedTempFile, JsonFileSource) {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        let source = JsonFileSource::new(file.path());
        (file, source)
    }

    #[test]
    fn test_parse_jsonl_with_summary_alias() {
        let papers = parse_papers(JSONL).unwrap();
        assert_eq!(papers.len(), 3);
        assert!(papers[0].abstract_text.starts_with("The dominant sequence"));
        assert_eq!(papers[0].categories.len(), 2);
        assert!(papers[1].pdf_url.is_empty());
    }

    #[test]
    fn test_parse_json_array() {
        let array = r#"[{"title": "A", "abstract": "B", "published": "2020-01-01T00:00:00Z"}]"#;
        let papers = parse_papers(array).unwrap();
        assert_eq!(papers[0].title, "A");
        assert!(papers[0].authors.is_empty());
    }

    #[test]
    fn test_parse_reports_line() {
        let err = parse_papers("{\"title\": \"ok\", \"abstract\": \"x\", \"published\": \"2020-01-01T00:00:00Z\"}\nnot json")
            .unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_search_matches_all_terms_in_file_order() {
        let (_file, source) = source(JSONL);
        let titles: Vec<_> = source
            .search("ATTENTION", 10)
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["Attention Is All You Need", "Attention Over Graphs"]);

        assert_eq!(source.search("attention graph", 10).unwrap().len(), 1);
        assert!(source.search("quantum", 10).unwrap().is_empty());
    }

    #[test]
    fn test_search_limits_results() {
        let (_file, source) = source(JSONL);
        assert_eq!(source.search("", 2).unwrap().len(), 2);
        assert_eq!(source.search("", DEFAULT_MAX_RESULTS).unwrap().len(), 3);
    }

    #[test]
    fn test_missing_file() {
        let source = JsonFileSource::new("/nonexistent/papers.jsonl");
        assert!(matches!(
            source.search("x", 1),
            Err(Error::OperationFailed { .. })
        ));
    }
}
