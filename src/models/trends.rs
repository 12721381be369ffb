//! Research trend summaries.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A short excerpt of a related paper's generated summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyFinding {
    /// Paper title.
    pub title: String,
    /// Leading excerpt of the generated summary.
    pub finding: String,
}

/// Aggregate statistics over the papers most similar to a topic.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct TrendSummary {
    /// The topic that was analyzed.
    pub topic: String,
    /// Number of similar papers the summary was built from.
    pub analyzed: usize,
    /// Paper count per publication year.
    pub years: BTreeMap<String, usize>,
    /// Paper count per author.
    pub authors: BTreeMap<String, usize>,
    /// Paper count per category tag.
    pub categories: BTreeMap<String, usize>,
    /// Methodology tags observed in summaries and abstracts.
    pub methodologies: BTreeSet<String>,
    /// Key findings in similarity order.
    pub key_findings: Vec<KeyFinding>,
}

impl TrendSummary {
    /// Creates an empty summary for a topic.
    #[must_use]
    pub fn empty(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Returns true if no papers contributed.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.analyzed == 0
    }
}
