//! Paper types and record identifiers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeSet;
use std::fmt;

/// Reading speed used for [`PaperStats::reading_minutes`].
pub const WORDS_PER_MINUTE: usize = 200;

/// Unique identifier for a stored paper record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new record ID.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Derives the record ID for a paper using the given strategy.
    #[must_use]
    pub fn for_paper(paper: &Paper, strategy: IdStrategy) -> Self {
        match strategy {
            IdStrategy::Title => Self(paper.title.clone()),
            IdStrategy::TitlePublished => {
                let normalized = paper
                    .title
                    .split_whitespace()
                    .collect::<Vec<_>>()
                    .join(" ")
                    .to_lowercase();
                let mut hasher = Sha256::new();
                hasher.update(normalized.as_bytes());
                hasher.update(b"\n");
                hasher.update(paper.published_string().as_bytes());
                Self(hex::encode(hasher.finalize()))
            },
        }
    }

    /// Returns the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// How record identifiers are derived from papers.
///
/// Titles are not guaranteed unique across a catalog, so distinct papers
/// that share a title collide under [`IdStrategy::Title`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IdStrategy {
    /// The raw title is the identifier.
    #[default]
    Title,
    /// SHA-256 of the normalized title and publication timestamp.
    TitlePublished,
}

impl IdStrategy {
    /// Parses a strategy string, returning `None` for unknown values.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "title" => Some(Self::Title),
            "title-published" | "title_published" => Some(Self::TitlePublished),
            _ => None,
        }
    }

    /// Returns the strategy as a string slice.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::TitlePublished => "title-published",
        }
    }
}

/// An academic paper as returned by a paper source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paper {
    /// Paper title.
    pub title: String,
    /// Ordered author names.
    #[serde(default)]
    pub authors: Vec<String>,
    /// Original abstract.
    #[serde(rename = "abstract", alias = "summary")]
    pub abstract_text: String,
    /// Link to the PDF.
    #[serde(default)]
    pub pdf_url: String,
    /// Publication timestamp.
    pub published: DateTime<Utc>,
    /// Category tags such as `cs.LG`.
    #[serde(default)]
    pub categories: BTreeSet<String>,
}

impl Paper {
    /// Creates a paper with no authors, PDF link, or categories.
    #[must_use]
    pub fn new(
        title: impl Into<String>,
        abstract_text: impl Into<String>,
        published: DateTime<Utc>,
    ) -> Self {
        Self {
            title: title.into(),
            authors: Vec::new(),
            abstract_text: abstract_text.into(),
            pdf_url: String::new(),
            published,
            categories: BTreeSet::new(),
        }
    }

    /// Sets the authors.
    #[must_use]
    pub fn with_authors<I, S>(mut self, authors: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the PDF link.
    #[must_use]
    pub fn with_pdf_url(mut self, url: impl Into<String>) -> Self {
        self.pdf_url = url.into();
        self
    }

    /// Sets the category tags.
    #[must_use]
    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// The text that is embedded for this paper.
    #[must_use]
    pub fn composite_text(&self, generated_summary: &str) -> String {
        format!("{} {} {}", self.title, self.abstract_text, generated_summary)
    }

    /// Publication timestamp as stored in record metadata.
    #[must_use]
    pub fn published_string(&self) -> String {
        self.published.to_rfc3339()
    }
}

/// Quick statistics shown alongside a paper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PaperStats {
    /// Number of authors.
    pub author_count: usize,
    /// Number of category tags.
    pub category_count: usize,
    /// Whitespace-separated words in the abstract.
    pub abstract_words: usize,
    /// Estimated reading time of the abstract in whole minutes.
    pub reading_minutes: usize,
}

impl PaperStats {
    /// Computes statistics for a paper.
    #[must_use]
    pub fn from_paper(paper: &Paper) -> Self {
        let abstract_words = paper.abstract_text.split_whitespace().count();
        Self {
            author_count: paper.authors.len(),
            category_count: paper.categories.len(),
            abstract_words,
            reading_minutes: abstract_words / WORDS_PER_MINUTE,
        }
    }
}
