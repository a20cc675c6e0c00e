use std::sync::Arc;
use std::time::Instant;
use parking_lot::RwLock;
use serde::{Serialize, Deserialize};
use crate::core::config::Config;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{BuildReport, CollectionStatistics};
use crate::core::types::Document;
use crate::index::index_writer::IndexWriter;
use crate::index::inverted::InvertedIndex;
use crate::query::ast::{Query, MAX_QUERY_DEPTH};
use crate::query::matcher::Evaluator;
use crate::query::parser::QueryParser;
use crate::scoring::scorer::{Scorer, Similarity};
use crate::search::results::{QueryResult, ScoredDocument, SearchResults, TopKCollector};

/// Lifecycle of the searchable index
#[derive(Clone)]
pub enum IndexState {
    Uninitialized,
    Built(Arc<InvertedIndex>),
}

/// A query as supplied by the caller: raw text for one field, or a tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum QueryRequest {
    Parse { field: String, expression: String },
    Tree(Query),
}

/// Per-search knobs; `similarity` overrides the configured one
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOptions {
    pub top_k: usize,
    pub explain: bool,
    pub similarity: Option<Similarity>,
}

impl SearchOptions {
    pub fn new(top_k: usize) -> Self {
        SearchOptions {
            top_k,
            explain: false,
            similarity: None,
        }
    }

    pub fn with_explain(mut self, explain: bool) -> Self {
        self.explain = explain;
        self
    }

    pub fn with_similarity(mut self, similarity: Similarity) -> Self {
        self.similarity = Some(similarity);
        self
    }
}

/// Entry point: builds an index from documents and serves queries over it.
///
/// A build produces a fresh immutable index and swaps it in; searches that
/// started against the previous snapshot finish against it undisturbed.
pub struct Searcher {
    config: Config,
    state: RwLock<IndexState>,
}

impl Searcher {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        Ok(Searcher {
            config,
            state: RwLock::new(IndexState::Uninitialized),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Index `documents` (in order) and replace the current index.
    /// Ids restart at zero on every build.
    pub fn build<I>(&self, documents: I) -> Result<BuildReport>
    where
        I: IntoIterator,
        I::Item: Into<Document>,
    {
        let mut writer = IndexWriter::new(self.config.clone())?;
        writer.add_documents(documents);
        let (index, report) = writer.commit()?;

        *self.state.write() = IndexState::Built(Arc::new(index));
        Ok(report)
    }

    /// Discard the current index; searches fail until the next build
    pub fn clear(&self) {
        *self.state.write() = IndexState::Uninitialized;
        tracing::debug!("index cleared");
    }

    pub fn is_built(&self) -> bool {
        matches!(*self.state.read(), IndexState::Built(_))
    }

    /// The index currently being served
    pub fn snapshot(&self) -> Result<Arc<InvertedIndex>> {
        match &*self.state.read() {
            IndexState::Built(index) => Ok(Arc::clone(index)),
            IndexState::Uninitialized => Err(Error::empty_index()),
        }
    }

    pub fn default_options(&self) -> SearchOptions {
        SearchOptions::new(self.config.top_k)
    }

    /// Parse `expression` against `field` without running it
    pub fn parse(&self, field: &str, expression: &str) -> Result<Query> {
        let index = self.snapshot()?;
        QueryParser::new(field, &index.schema).parse(expression)
    }

    pub fn search(&self, field: &str, expression: &str) -> Result<SearchResults> {
        let index = self.snapshot()?;
        let query = QueryParser::new(field, &index.schema).parse(expression)?;
        execute(&index, &query, &self.default_options(), self.config.similarity())
    }

    /// Parse `expression` once per weighted field and search the union
    pub fn search_multi(&self, fields: &[(&str, f32)], expression: &str) -> Result<SearchResults> {
        let index = self.snapshot()?;
        let default_field = fields.first().map(|(name, _)| *name).unwrap_or_default();
        let query = QueryParser::new(default_field, &index.schema).parse_multi_field(fields, expression)?;
        execute(&index, &query, &self.default_options(), self.config.similarity())
    }

    pub fn search_query(&self, query: &Query) -> Result<SearchResults> {
        self.search_with(query, &self.default_options())
    }

    pub fn search_request(&self, request: &QueryRequest, options: &SearchOptions) -> Result<SearchResults> {
        let index = self.snapshot()?;
        let parsed;
        let query = match request {
            QueryRequest::Parse { field, expression } => {
                parsed = QueryParser::new(field, &index.schema).parse(expression)?;
                &parsed
            }
            QueryRequest::Tree(query) => query,
        };
        let similarity = options.similarity.unwrap_or_else(|| self.config.similarity());
        execute(&index, query, options, similarity)
    }

    pub fn search_with(&self, query: &Query, options: &SearchOptions) -> Result<SearchResults> {
        let index = self.snapshot()?;
        let similarity = options.similarity.unwrap_or_else(|| self.config.similarity());
        execute(&index, query, options, similarity)
    }

    pub fn collection_statistics(&self, field: &str) -> Result<CollectionStatistics> {
        Ok(self.snapshot()?.collection_statistics(field))
    }
}

fn execute(index: &InvertedIndex, query: &Query, options: &SearchOptions, similarity: Similarity) -> Result<SearchResults> {
    let depth = query.depth();
    if depth > MAX_QUERY_DEPTH {
        return Err(Error::new(
            ErrorKind::InvalidArgument,
            format!("query tree is {} levels deep, at most {} are supported", depth, MAX_QUERY_DEPTH),
        ));
    }

    let start = Instant::now();
    let matches = Evaluator::new(index).evaluate(query);
    let scorer = Scorer::new(index, similarity);

    let mut collector = TopKCollector::new(options.top_k);
    for (&doc_id, features) in &matches {
        collector.collect(ScoredDocument {
            doc_id,
            score: scorer.score(doc_id, features),
        });
    }
    let total_hits = collector.total_collected;

    // Explanations are only built for hits that survive the cut
    let hits: Vec<QueryResult> = collector
        .into_sorted_vec()
        .into_iter()
        .map(|scored| QueryResult {
            doc_id: scored.doc_id,
            stored_fields: index.stored_fields(scored.doc_id).cloned().unwrap_or_default(),
            score: scored.score,
            explanation: options.explain.then(|| scorer.explain(scored.doc_id, &matches[&scored.doc_id])),
        })
        .collect();

    let results = SearchResults {
        max_score: hits.first().map(|hit| hit.score).unwrap_or(0.0),
        total_hits,
        took_ms: start.elapsed().as_millis() as u64,
        hits,
    };
    tracing::debug!(
        query = %query,
        similarity = similarity.name(),
        total_hits = results.total_hits,
        returned = results.hits.len(),
        took_ms = results.took_ms,
        "search executed"
    );
    Ok(results)
}
