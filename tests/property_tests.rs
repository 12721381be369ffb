//! Property-based tests for embedding and similarity search.
//!
//! Uses proptest to verify invariants across random inputs:
//! - Embeddings are deterministic and unit length
//! - Query results are ordered by non-increasing score
//! - The index count equals the number of distinct ids inserted
//! - A stored document is its own best match

// Property tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use paperlens::embedding::{Embedder, TermWeightEmbedder};
use paperlens::models::VectorRecord;
use paperlens::storage::{MemoryVectorIndex, VectorIndex};
use proptest::prelude::*;
use std::collections::HashSet;

const DIMENSIONS: usize = 128;

fn embedder() -> TermWeightEmbedder {
    TermWeightEmbedder::uniform(DIMENSIONS).unwrap()
}

fn document() -> impl Strategy<Value = String> {
    prop::collection::vec("z[a-z]{3,9}", 1..12).prop_map(|words| words.join(" "))
}

proptest! {
    /// Property: embedding the same text twice is bit-identical.
    #[test]
    fn prop_embedding_is_deterministic(text in document()) {
        let embedder = embedder();
        let first = embedder.embed(&text).unwrap();
        let second = embedder.embed(&text).unwrap();
        prop_assert_eq!(first.len(), DIMENSIONS);
        prop_assert_eq!(first, second);
    }

    /// Property: embeddings of indexable text are unit length.
    #[test]
    fn prop_embedding_is_normalized(text in document()) {
        let vector = embedder().embed(&text).unwrap();
        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        prop_assert!((norm - 1.0).abs() < 1e-4);
    }

    /// Property: query scores never increase down the result list.
    #[test]
    fn prop_query_scores_non_increasing(
        documents in prop::collection::vec(document(), 1..20),
        query in document(),
        k in 1usize..25,
    ) {
        let embedder = embedder();
        let index = MemoryVectorIndex::new(DIMENSIONS);
        for (i, doc) in documents.iter().enumerate() {
            let record = VectorRecord::new(format!("doc-{i}"), embedder.embed(doc).unwrap(), doc.as_str());
            index.insert(record).unwrap();
        }

        let hits = index.query(&embedder.embed(&query).unwrap(), k).unwrap();
        prop_assert_eq!(hits.len(), k.min(documents.len()));
        for pair in hits.windows(2) {
            prop_assert!(pair[0].score >= pair[1].score);
        }
        for hit in &hits {
            prop_assert!((-1.0..=1.0).contains(&hit.score));
        }
    }

    /// Property: count equals the number of distinct ids, upserts included.
    #[test]
    fn prop_count_matches_distinct_ids(ids in prop::collection::vec(0u8..30, 0..60)) {
        let index = MemoryVectorIndex::new(4);
        for id in &ids {
            let record = VectorRecord::new(format!("id-{id}"), vec![1.0, 0.0, 0.0, f32::from(*id)], "doc");
            index.insert(record).unwrap();
        }
        let distinct: HashSet<_> = ids.iter().collect();
        prop_assert_eq!(index.count().unwrap(), distinct.len());
    }

    /// Property: a stored document queried with its own text scores about 1.0.
    #[test]
    fn prop_self_query_scores_one(documents in prop::collection::vec(document(), 1..10)) {
        let embedder = embedder();
        let index = MemoryVectorIndex::new(DIMENSIONS);
        for (i, doc) in documents.iter().enumerate() {
            index
                .insert(VectorRecord::new(format!("doc-{i}"), embedder.embed(doc).unwrap(), doc.as_str()))
                .unwrap();
        }

        let target = &documents[0];
        let hits = index.query(&embedder.embed(target).unwrap(), 1).unwrap();
        prop_assert!((hits[0].score - 1.0).abs() < 1e-4);
    }
}
