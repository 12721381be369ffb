//! Interest-based paper recommendations.

use super::PaperStore;
use crate::models::{Paper, SimilarityResult};
use crate::Result;
use std::sync::Arc;
use tracing::instrument;

/// Default number of recommendations.
pub const DEFAULT_RECOMMENDATIONS: usize = 5;

/// Recommends stored papers for a reader's interests and recent reading.
///
/// Ranking is delegated entirely to [`PaperStore::get_similar_papers`].
pub struct RecommenderEngine {
    store: Arc<PaperStore>,
}

impl RecommenderEngine {
    /// Creates an engine over a paper store.
    #[must_use]
    pub const fn new(store: Arc<PaperStore>) -> Self {
        Self { store }
    }

    /// Builds the query text for a set of interests and recent papers.
    ///
    /// Interests are joined by single spaces; each recent paper appends
    /// `" {title} {abstract}"`.
    #[must_use]
    pub fn recommendation_query(user_interests: &[String], recent_papers: &[Paper]) -> String {
        let mut query = user_interests.join(" ");
        for paper in recent_papers {
            query.push(' ');
            query.push_str(&paper.title);
            query.push(' ');
            query.push_str(&paper.abstract_text);
        }
        query
    }

    /// Returns up to `k` stored papers matching the interests and recent papers.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::EmbeddingFailure`] if the combined query has no
    /// indexable terms, or any error from the similarity search.
    #[instrument(skip(self, user_interests, recent_papers), fields(
        interests = user_interests.len(),
        recent = recent_papers.len()
    ))]
    pub fn get_recommendations(
        &self,
        user_interests: &[String],
        recent_papers: &[Paper],
        k: usize,
    ) -> Result<Vec<SimilarityResult>> {
        let query = Self::recommendation_query(user_interests, recent_papers);
        self.store.get_similar_papers(&query, k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageSettings;
    use crate::embedding::TermWeightEmbedder;
    use crate::Error;
    use chrono::{TimeZone, Utc};

    fn paper(title: &str, abstract_text: &str) -> Paper {
        Paper::new(
            title,
            abstract_text,
            Utc.with_ymd_and_hms(2022, 1, 1, 0, 0, 0).unwrap(),
        )
    }

    fn engine() -> (Arc<PaperStore>, RecommenderEngine) {
        let embedder = Arc::new(TermWeightEmbedder::uniform(512).unwrap());
        let store = Arc::new(PaperStore::in_memory(embedder, StorageSettings::default()));
        (Arc::clone(&store), RecommenderEngine::new(store))
    }

    #[test]
    fn test_recommendation_query_composition() {
        let interests = vec!["graph learning".to_string(), "robotics".to_string()];
        let recent = vec![paper("Paper One", "First abstract."), paper("Paper Two", "Second.")];
        assert_eq!(
            RecommenderEngine::recommendation_query(&interests, &recent),
            "graph learning robotics Paper One First abstract. Paper Two Second."
        );
    }

    #[test]
    fn test_recommendation_query_without_interests() {
        let recent = vec![paper("Only", "Abstract.")];
        assert_eq!(
            RecommenderEngine::recommendation_query(&[], &recent),
            " Only Abstract."
        );
    }

    #[test]
    fn test_recommendations_follow_interests() {
        let (store, engine) = engine();
        store
            .add_paper_with_summary(
                &paper("Robot Grasping", "Robotic manipulation with tactile sensors."),
                "Robots learn to grasp objects.",
            )
            .unwrap();
        store
            .add_paper_with_summary(
                &paper("Protein Folding", "Predicting protein structure from sequence."),
                "Structure prediction for biology.",
            )
            .unwrap();

        let results = engine
            .get_recommendations(&["robotic manipulation".to_string()], &[], DEFAULT_RECOMMENDATIONS)
            .unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].title, "Robot Grasping");
    }

    #[test]
    fn test_empty_inputs_fail_to_embed() {
        let (_, engine) = engine();
        assert!(matches!(
            engine.get_recommendations(&[], &[], 5),
            Err(Error::EmbeddingFailure(_))
        ));
    }
}
