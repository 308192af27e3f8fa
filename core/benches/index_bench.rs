use bm25_core::corpus::{parse_corpus, RECORD_DELIMITER};
use bm25_core::stats::CorpusStats;
use bm25_core::tokenizer::{normalize, Analyzer};
use bm25_core::{build_index, Bm25Params, QueryEngine};
use criterion::{criterion_group, criterion_main, Criterion};

fn synthetic_corpus(docs: usize) -> String {
    let words = ["library", "catalogue", "retrieval", "online", "university", "indexing", "children's", "co-operative", "automation", "reading"];
    (0..docs)
        .map(|i| {
            let body: Vec<&str> = (0..60).map(|j| words[(i * 7 + j * 3) % words.len()]).collect();
            format!("Document {i}\n{}.\n", body.join(" "))
        })
        .collect::<Vec<_>>()
        .join(RECORD_DELIMITER)
}

fn bench_index(c: &mut Criterion) {
    let text = synthetic_corpus(500);
    let docs = parse_corpus(&text).expect("corpus");
    let analyzer = Analyzer::default();

    c.bench_function("normalize_corpus", |b| b.iter(|| normalize(&text)));
    c.bench_function("accumulate_and_build", |b| {
        b.iter(|| {
            let stats = CorpusStats::accumulate(&docs, &analyzer).expect("stats");
            build_index(&stats, &Bm25Params::default()).expect("index")
        })
    });

    let stats = CorpusStats::accumulate(&docs, &analyzer).expect("stats");
    let engine = QueryEngine::new(Analyzer::default(), build_index(&stats, &Bm25Params::default()).expect("index"));
    c.bench_function("search_top_50", |b| b.iter(|| engine.search("online library catalogue", Some(50))));
}

criterion_group!(benches, bench_index);
criterion_main!(benches);
