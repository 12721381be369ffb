//! Benchmarks for similarity search.
//!
//! Measures top-k queries over in-memory and `SQLite`-backed indexes of
//! increasing size, plus the full `PaperStore` path including query embedding.

// Criterion macros generate items without docs - this is expected for benchmarks
// Benchmarks use expect/unwrap for simplicity - panics are acceptable in benchmarks
#![allow(missing_docs)]
#![allow(clippy::expect_used, clippy::unwrap_used)]

use chrono::{TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use paperlens::config::StorageSettings;
use paperlens::embedding::{Embedder, TermWeightEmbedder};
use paperlens::models::VectorRecord;
use paperlens::storage::{CollectionSpec, MemoryVectorIndex, SqliteVectorIndex, VectorIndex};
use paperlens::{Paper, PaperStore};
use std::hint::black_box;
use std::sync::Arc;
use tempfile::TempDir;

const DIMENSIONS: usize = 512;

const TOPICS: &[&str] = &[
    "transformer attention",
    "convolutional networks",
    "reinforcement learning",
    "graph neural networks",
    "diffusion models",
    "federated optimization",
    "protein structure prediction",
    "speech recognition",
];

fn document(i: usize) -> String {
    format!(
        "{} study {i} with {} baselines",
        TOPICS[i % TOPICS.len()],
        TOPICS[(i * 7 + 3) % TOPICS.len()]
    )
}

fn fill(index: &dyn VectorIndex, embedder: &TermWeightEmbedder, size: usize) {
    for i in 0..size {
        let doc = document(i);
        let record = VectorRecord::new(format!("paper-{i}"), embedder.embed(&doc).unwrap(), doc);
        index.insert(record).unwrap();
    }
}

fn bench_memory_query(c: &mut Criterion) {
    let embedder = TermWeightEmbedder::uniform(DIMENSIONS).unwrap();
    let query = embedder.embed("attention mechanisms").unwrap();
    let mut group = c.benchmark_group("memory_query");

    for size in [100usize, 1_000, 10_000] {
        let index = MemoryVectorIndex::new(DIMENSIONS);
        fill(&index, &embedder, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| index.query(black_box(&query), 10).unwrap());
        });
    }

    group.finish();
}

fn bench_sqlite_query(c: &mut Criterion) {
    let embedder = TermWeightEmbedder::uniform(DIMENSIONS).unwrap();
    let query = embedder.embed("attention mechanisms").unwrap();
    let dir = TempDir::new().unwrap();
    let mut group = c.benchmark_group("sqlite_query");

    for size in [100usize, 1_000] {
        let spec = CollectionSpec::for_embedder(format!("bench-{size}"), &embedder);
        let index = SqliteVectorIndex::open(&dir.path().join("bench.db"), spec).unwrap();
        fill(&index, &embedder, size);
        group.bench_with_input(BenchmarkId::from_parameter(size), &index, |b, index| {
            b.iter(|| index.query(black_box(&query), 10).unwrap());
        });
    }

    group.finish();
}

fn bench_similar_papers(c: &mut Criterion) {
    let embedder = Arc::new(TermWeightEmbedder::uniform(DIMENSIONS).unwrap());
    let store = PaperStore::in_memory(embedder, StorageSettings::default());
    let published = Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap();
    for i in 0..1_000 {
        let paper = Paper::new(format!("Paper {i}"), document(i), published);
        store.add_paper_with_summary(&paper, "A generated summary.").unwrap();
    }

    c.bench_function("get_similar_papers_1000", |b| {
        b.iter(|| store.get_similar_papers(black_box("attention mechanisms"), 3).unwrap());
    });
}

criterion_group!(
    benches,
    bench_memory_query,
    bench_sqlite_query,
    bench_similar_papers
);
criterion_main!(benches);
