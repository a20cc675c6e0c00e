//! Structural guarantees of built indexes: posting order, determinism
//! across rebuilds, ranking tie-breaks, and the build/query state machine.

use std::sync::{Arc, Barrier};
use std::thread;
use ricerca::index::index_writer::IndexWriter;
use ricerca::index::inverted::InvertedIndex;
use ricerca::{Config, DocId, Document, FieldConfig, Query, RawDocument, SearchOptions, Searcher};

fn config() -> Config {
    Config::default()
        .with_field("title", FieldConfig::whitespace().with_lowercase(true))
        .with_field("content", FieldConfig::standard().with_stopwords(["the", "of", "a"]))
}

fn raw_corpus() -> Vec<RawDocument> {
    vec![
        RawDocument::new("The Art of Search", "Inverted indexes map terms to the documents holding them."),
        RawDocument::new("Ranking", "BM25 saturates term frequency; TF-IDF does not saturate."),
        RawDocument::new("Phrase queries", "A phrase query needs the terms at consecutive positions."),
        RawDocument::new("Search engines", "Search engines rank documents. Documents, documents, documents."),
    ]
}

fn build(docs: Vec<RawDocument>) -> InvertedIndex {
    let mut writer = IndexWriter::new(config()).unwrap();
    writer.add_documents(docs);
    writer.commit().unwrap().0
}

#[test]
fn test_postings_sorted_without_duplicates() {
    let index = build(raw_corpus());
    index.validate().unwrap();

    for field in index.field_names() {
        for term in index.terms(field) {
            let list = index.postings(field, term);
            assert!(list.postings.windows(2).all(|w| w[0].doc_id < w[1].doc_id), "{}:{}", field, term);
            for posting in list.iter() {
                assert!(posting.positions.windows(2).all(|w| w[0] < w[1]));
                assert_eq!(posting.term_freq as usize, posting.positions.len());
            }
        }
    }
}

#[test]
fn test_field_lengths_sum_to_indexed_tokens() {
    let index = build(raw_corpus());
    for field in index.field_names() {
        let stats = index.field_stats(field);
        let lengths: u64 = stats.field_lengths.iter().map(|&l| l as u64).sum();
        let tokens: u64 = index.terms(field).iter().map(|t| index.postings(field, t).total_freq()).sum();
        assert_eq!(lengths, stats.sum_total_term_freq);
        assert_eq!(tokens, stats.sum_total_term_freq);
    }
}

#[test]
fn test_rebuild_is_idempotent() {
    let first = build(raw_corpus());
    let second = build(raw_corpus());

    assert_eq!(first.field_names(), second.field_names());
    for field in first.field_names() {
        assert_eq!(first.terms(field), second.terms(field));
        assert_eq!(first.field_stats(field), second.field_stats(field));
        for term in first.terms(field) {
            assert_eq!(first.postings(field, term), second.postings(field, term));
        }
    }
}

#[test]
fn test_positions_skip_removed_stop_words() {
    let index = build(raw_corpus());
    // "Inverted indexes map terms to the documents": "the" is removed, so
    // "to" and "documents" are adjacent
    let to = index.postings("content", "to");
    let documents = index.postings("content", "documents");
    let to_position = to.get(DocId(0)).unwrap().positions[0];
    assert!(documents.get(DocId(0)).unwrap().has_position(to_position + 1));
}

#[test]
fn test_equal_scores_break_ties_by_doc_id() {
    let searcher = Searcher::new(config()).unwrap();
    let same = RawDocument::new("copy", "identical text");
    searcher.build(vec![same.clone(), same.clone(), same.clone(), same]).unwrap();

    let results = searcher.search_with(&Query::term("content", "identical"), &SearchOptions::new(3)).unwrap();
    assert_eq!(results.total_hits, 4);
    assert_eq!(results.doc_ids(), vec![DocId(0), DocId(1), DocId(2)]);
    assert!(results.hits.windows(2).all(|w| w[0].score == w[1].score));
}

#[test]
fn test_top_k_respects_configured_default() {
    let mut config = config();
    config.top_k = 2;
    let searcher = Searcher::new(config).unwrap();
    searcher.build(raw_corpus()).unwrap();

    let results = searcher.search_query(&Query::MatchAll).unwrap();
    assert_eq!(results.total_hits, 4);
    assert_eq!(results.len(), 2);
}

#[test]
fn test_empty_build_is_queryable() {
    let searcher = Searcher::new(config()).unwrap();
    let report = searcher.build(Vec::<Document>::new()).unwrap();
    assert_eq!(report.documents_indexed, 0);
    assert!(searcher.search_query(&Query::MatchAll).unwrap().is_empty());
    assert!(searcher.search("content", "anything").unwrap().is_empty());
}

#[test]
fn test_only_must_not_matches_nothing() {
    let searcher = Searcher::new(config()).unwrap();
    searcher.build(raw_corpus()).unwrap();
    assert!(searcher.search("content", "-documents").unwrap().is_empty());
    assert!(searcher.search("content", "NOT documents").unwrap().is_empty());
    assert_eq!(searcher.search("content", "search -documents").unwrap().len(), 0);
    assert_eq!(searcher.search("content", "phrase -documents").unwrap().doc_ids(), vec![DocId(2)]);
}

#[test]
fn test_state_machine_transitions() {
    let searcher = Searcher::new(config()).unwrap();
    assert!(searcher.search("content", "search").unwrap_err().is_empty_index());

    searcher.build(raw_corpus()).unwrap();
    assert!(!searcher.search("content", "search").unwrap().is_empty());

    searcher.clear();
    assert!(searcher.search("content", "search").unwrap_err().is_empty_index());
    assert!(searcher.snapshot().unwrap_err().is_empty_index());
}

#[test]
fn test_readers_see_whole_snapshots_during_rebuild() {
    let searcher = Arc::new(Searcher::new(config()).unwrap());
    let small = vec![RawDocument::new("one", "alpha")];
    let large = vec![
        RawDocument::new("one", "alpha"),
        RawDocument::new("two", "alpha beta"),
        RawDocument::new("three", "alpha beta gamma"),
    ];
    searcher.build(small.clone()).unwrap();

    let barrier = Arc::new(Barrier::new(5));
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let searcher = Arc::clone(&searcher);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                barrier.wait();
                for _ in 0..200 {
                    let index = searcher.snapshot().unwrap();
                    let hits = index.postings("content", "alpha").doc_freq();
                    // Every snapshot is one complete build, never a mixture
                    assert!(hits == 1 || hits == 3, "saw {} hits", hits);
                    assert_eq!(hits, index.max_doc());
                }
            })
        })
        .collect();

    barrier.wait();
    for round in 0..20 {
        let docs = if round % 2 == 0 { large.clone() } else { small.clone() };
        searcher.build(docs).unwrap();
    }

    for reader in readers {
        reader.join().unwrap();
    }
}
