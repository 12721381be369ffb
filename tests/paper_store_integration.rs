//! Integration tests for the persistent paper store.
//!
//! Each test opens a `SQLite`-backed store in its own temporary data
//! directory with uniform term weights.

// Integration tests use expect/unwrap for simplicity - panics are acceptable in tests
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use paperlens::config::{EmbeddingChangePolicy, PaperlensConfig, StorageSettings};
use paperlens::embedding::TermWeights;
use paperlens::embedding::TERM_WEIGHTS_FILE;
use paperlens::{Error, Paper, PaperStore, RecommenderEngine, RecordId};
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

fn config(dir: &TempDir) -> PaperlensConfig {
    PaperlensConfig::default().with_data_dir(dir.path())
}

fn paper(title: &str, abstract_text: &str, year: i32) -> Paper {
    Paper::new(
        title,
        abstract_text,
        Utc.with_ymd_and_hms(year, 3, 15, 12, 0, 0).unwrap(),
    )
    .with_authors(["Ada Lovelace", "Alan Turing"])
    .with_categories(["cs.LG"])
}

fn seed(store: &PaperStore) {
    store
        .add_paper_with_summary(
            &paper(
                "Transformer attention",
                "We study self-attention in transformer models.",
                2021,
            ),
            "Attention layers scale with sequence length.",
        )
        .unwrap();
    store
        .add_paper_with_summary(
            &paper(
                "Gradient descent optimization",
                "Convergence of stochastic gradient descent for convex losses.",
                2021,
            ),
            "Learning rate schedules matter.",
        )
        .unwrap();
    store
        .add_paper_with_summary(
            &paper(
                "Transformer attention variants",
                "Sparse and linear attention for long transformer inputs.",
                2022,
            ),
            "Linear attention trades accuracy for speed.",
        )
        .unwrap();
}

#[test]
fn test_store_persists_across_reopen() {
    let dir = TempDir::new().unwrap();
    {
        let store = PaperStore::open(&config(&dir)).unwrap();
        seed(&store);
        assert_eq!(store.paper_count().unwrap(), 3);
    }

    assert!(dir.path().join(TERM_WEIGHTS_FILE).exists());

    let store = PaperStore::open(&config(&dir)).unwrap();
    assert_eq!(store.paper_count().unwrap(), 3);
    let results = store.get_similar_papers("attention mechanisms", 3).unwrap();
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].authors, vec!["Ada Lovelace", "Alan Turing"]);
}

#[test]
fn test_similar_papers_rank_related_work_first() {
    let dir = TempDir::new().unwrap();
    let store = PaperStore::open(&config(&dir)).unwrap();
    seed(&store);

    let results = store.get_similar_papers("attention mechanisms", 3).unwrap();
    let mut top_two: Vec<&str> = results[..2].iter().map(|r| r.title.as_str()).collect();
    top_two.sort_unstable();
    assert_eq!(
        top_two,
        vec!["Transformer attention", "Transformer attention variants"]
    );
    assert_eq!(results[2].title, "Gradient descent optimization");
    assert!(results[0].score >= results[1].score);
    assert!(results[1].score > results[2].score);
}

#[test]
fn test_research_trends_count_years() {
    let dir = TempDir::new().unwrap();
    let store = PaperStore::open(&config(&dir)).unwrap();
    seed(&store);

    let trends = store.analyze_research_trends("transformer attention").unwrap();
    assert_eq!(trends.analyzed, 3);
    assert_eq!(trends.years.get("2021"), Some(&2));
    assert_eq!(trends.years.get("2022"), Some(&1));
    assert_eq!(trends.authors.get("Ada Lovelace"), Some(&3));
    assert_eq!(trends.categories.get("cs.LG"), Some(&3));
    assert_eq!(trends.key_findings.len(), 3);
}

#[test]
fn test_empty_store_returns_nothing() {
    let dir = TempDir::new().unwrap();
    let store = PaperStore::open(&config(&dir)).unwrap();

    assert!(store.get_similar_papers("anything at all", 5).unwrap().is_empty());
    let trends = store.analyze_research_trends("anything").unwrap();
    assert_eq!(trends.analyzed, 0);
    assert!(trends.years.is_empty());
}

#[test]
fn test_readding_a_paper_replaces_it() {
    let dir = TempDir::new().unwrap();
    let store = PaperStore::open(&config(&dir)).unwrap();
    let original = paper("Transformer attention", "Self-attention study.", 2021);

    assert!(store.add_paper_with_summary(&original, "First summary.").unwrap());
    assert!(store.add_paper_with_summary(&original, "Second summary.").unwrap());
    assert_eq!(store.paper_count().unwrap(), 1);

    let results = store.get_similar_papers("self-attention", 1).unwrap();
    assert_eq!(results[0].generated_summary.as_deref(), Some("Second summary."));
}

#[test]
fn test_duplicates_skipped_without_upsert() {
    let dir = TempDir::new().unwrap();
    let storage = StorageSettings {
        allow_upsert: false,
        ..StorageSettings::default()
    };
    let store = PaperStore::open(&config(&dir).with_storage(storage)).unwrap();
    let original = paper("Transformer attention", "Self-attention study.", 2021);

    assert!(store.add_paper_with_summary(&original, "First summary.").unwrap());
    assert!(!store.add_paper_with_summary(&original, "Second summary.").unwrap());

    let results = store.get_similar_papers("self-attention", 1).unwrap();
    assert_eq!(results[0].generated_summary.as_deref(), Some("First summary."));
}

#[test]
fn test_changed_embedder_rejected_then_reembedded() {
    let dir = TempDir::new().unwrap();
    {
        let store = PaperStore::open(&config(&dir).with_dimensions(64)).unwrap();
        seed(&store);
    }

    let wider = config(&dir).with_dimensions(128);
    assert!(matches!(
        PaperStore::open(&wider),
        Err(Error::DimensionMismatch {
            expected: 64,
            actual: 128
        })
    ));

    let storage = StorageSettings {
        on_embedding_change: EmbeddingChangePolicy::Reembed,
        ..StorageSettings::default()
    };
    let store = PaperStore::open(&wider.clone().with_storage(storage)).unwrap();
    assert_eq!(store.paper_count().unwrap(), 3);
    assert_eq!(store.embedder().dimensions(), 128);
    drop(store);

    // The collection now belongs to the wider embedder.
    let store = PaperStore::open(&wider).unwrap();
    assert_eq!(store.get_similar_papers("attention", 3).unwrap().len(), 3);
}

#[test]
fn test_reindex_reembeds_every_record() {
    let dir = TempDir::new().unwrap();
    {
        let store = PaperStore::open(&config(&dir)).unwrap();
        seed(&store);
    }

    let (store, reembedded) = PaperStore::reindex(&config(&dir)).unwrap();
    assert_eq!(reembedded, 3);
    assert_eq!(store.paper_count().unwrap(), 3);
}

fn with_corpus(dir: &TempDir) -> PaperlensConfig {
    let corpus = dir.path().join("corpus.txt");
    fs::write(
        &corpus,
        "transformer attention models\nstochastic gradient descent\ngraph neural networks\n",
    )
    .unwrap();
    let mut config = config(dir);
    config.embedding.bootstrap_corpus = Some(corpus);
    config
}

#[test]
fn test_refit_replaces_weights_after_reembedding() {
    let dir = TempDir::new().unwrap();
    let before = {
        let store = PaperStore::open(&config(&dir)).unwrap();
        seed(&store);
        store.fingerprint()
    };

    let (store, reembedded) = PaperStore::refit(&with_corpus(&dir)).unwrap();
    assert_eq!(reembedded, 3);
    assert_ne!(store.fingerprint(), before);
    let after = store.fingerprint();
    drop(store);

    let weights = TermWeights::load(&dir.path().join(TERM_WEIGHTS_FILE)).unwrap();
    assert_eq!(weights.documents(), 3);
    assert!(!dir.path().join("term_weights.json.tmp").exists());

    let store = PaperStore::open(&config(&dir)).unwrap();
    assert_eq!(store.fingerprint(), after);
    assert_eq!(store.paper_count().unwrap(), 3);
}

#[test]
fn test_failed_refit_keeps_weights_file() {
    let dir = TempDir::new().unwrap();
    {
        let store = PaperStore::open(&config(&dir)).unwrap();
        seed(&store);
    }
    let weights_path = dir.path().join(TERM_WEIGHTS_FILE);
    let original = fs::read(&weights_path).unwrap();

    let database = config(&dir).database_path();
    for suffix in ["-wal", "-shm"] {
        let _ = fs::remove_file(format!("{}{suffix}", database.display()));
    }
    fs::write(&database, "not a sqlite database ".repeat(200)).unwrap();

    assert!(PaperStore::refit(&with_corpus(&dir)).is_err());
    assert_eq!(fs::read(&weights_path).unwrap(), original);
}

#[test]
fn test_remove_paper() {
    let dir = TempDir::new().unwrap();
    let store = PaperStore::open(&config(&dir)).unwrap();
    seed(&store);

    assert!(store.remove_paper(&RecordId::new("Transformer attention")).unwrap());
    assert!(!store.remove_paper(&RecordId::new("Transformer attention")).unwrap());
    assert_eq!(store.paper_count().unwrap(), 2);
}

#[test]
fn test_recommendations_from_persistent_store() {
    let dir = TempDir::new().unwrap();
    let store = Arc::new(PaperStore::open(&config(&dir)).unwrap());
    seed(&store);

    let engine = RecommenderEngine::new(Arc::clone(&store));
    let recent = [paper("Convex losses", "Stochastic gradient methods.", 2020)];
    let results = engine
        .get_recommendations(&["optimization".to_string()], &recent, 1)
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Gradient descent optimization");
}
