pub mod core;
pub mod analysis;
pub mod schema;
pub mod index;
pub mod parallel;
pub mod query;
pub mod scoring;
pub mod search;

pub use crate::core::config::{AnalyzerKind, Config, FieldConfig, SimilarityKind};
pub use crate::core::error::{AnalysisWarning, Error, ErrorKind, Result};
pub use crate::core::stats::{BuildReport, CollectionStatistics, FieldStats};
pub use crate::core::types::{DocId, Document, RawDocument};
pub use crate::query::ast::{BoolQuery, Occur, Query};
pub use crate::scoring::explanation::Explanation;
pub use crate::scoring::scorer::Similarity;
pub use crate::search::results::{QueryResult, SearchResults};
pub use crate::search::searcher::{QueryRequest, SearchOptions, Searcher};

/*
┌──────────────────────────────────────────────────────────────────────────────┐
│                            RICERCA ARCHITECTURE                              │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── BUILD PATH ──────────────────────────────────┐
│                                                                              │
│  Searcher::build(docs)                                                       │
│     │                                                                        │
│     └──> IndexWriter ──resolves──> Schema (field -> FieldId -> Analyzer)     │
│              │                                                               │
│              ├──> ParallelIndexer (rayon)  one AnalyzedDoc per document      │
│              │                                                               │
│              └──> sequential merge ──> InvertedIndex (immutable)             │
│                                          • FieldIndex: term -> PostingList   │
│                                          • FieldStats: lengths, doc_count    │
│                                          • stored fields by DocId            │
│                                                                              │
│  IndexState: Uninitialized ──build──> Built(Arc<InvertedIndex>)              │
│              Built ──build──> Built(new snapshot)   Built ──clear──> Uninit  │
└──────────────────────────────────────────────────────────────────────────────┘

┌──────────────────────────────── QUERY PATH ──────────────────────────────────┐
│                                                                              │
│  "(field, expression)" ──> QueryParser (nom) ──> Query tree                  │
│                                                    │                         │
│  Evaluator ──walks postings──> DocId -> MatchFeatures                        │
│      │                                                                       │
│      └──> Scorer { TfIdf | Bm25 { k1, b } | LmJelinekMercer { lambda } }     │
│               │                                                              │
│               └──> TopKCollector (bounded heap) ──> Vec<QueryResult>         │
│                                                       • explanation (opt.)   │
└──────────────────────────────────────────────────────────────────────────────┘
*/
