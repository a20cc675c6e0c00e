use std::collections::{BTreeMap, HashMap};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::stats::{CollectionStatistics, FieldStats, IndexStats, TermStats};
use crate::core::types::{DocId, FieldId};
use crate::index::posting::{Posting, PostingList};
use crate::schema::schema::Schema;

static EMPTY_POSTINGS: PostingList = PostingList::new();

/// Term dictionary and statistics for one field
#[derive(Debug, Default)]
pub struct FieldIndex {
    pub postings: HashMap<String, PostingList>,
    pub stats: FieldStats,
}

/// Inverted index structure.
///
/// Produced by `IndexWriter::commit` and never mutated afterwards; share it
/// behind an `Arc` for concurrent readers.
pub struct InvertedIndex {
    pub schema: Schema,
    pub fields: Vec<FieldIndex>,           // Indexed by FieldId
    pub stored: Vec<BTreeMap<String, String>>,  // Stored fields, indexed by DocId
    pub doc_count: u32,
}

impl std::fmt::Debug for InvertedIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InvertedIndex")
            .field("fields", &self.fields)
            .field("stored", &self.stored)
            .field("doc_count", &self.doc_count)
            .finish_non_exhaustive()
    }
}

impl InvertedIndex {
    pub fn new(schema: Schema) -> Self {
        let fields = (0..schema.len()).map(|_| FieldIndex::default()).collect();
        InvertedIndex {
            schema,
            fields,
            stored: Vec::new(),
            doc_count: 0,
        }
    }

    /// Append one analyzed field instance of `doc_id`.
    /// `positions` maps each term to its ascending positions within the field.
    pub(crate) fn add_field_postings(&mut self, doc_id: DocId, field: FieldId, length: u32, positions: Vec<(String, Vec<u32>)>) {
        while self.fields.len() <= field.index() {
            self.fields.push(FieldIndex::default());
        }
        let field_index = &mut self.fields[field.index()];

        for (term, term_positions) in positions {
            let list = field_index.postings.entry(term).or_default();
            let new_doc = list.get(doc_id).is_none();
            list.add_posting(Posting::new(doc_id, term_positions));
            if new_doc {
                field_index.stats.sum_doc_freq += 1;
            }
        }
        field_index.stats.record(doc_id, length);
    }

    pub(crate) fn add_stored(&mut self, doc_id: DocId, fields: BTreeMap<String, String>) {
        debug_assert_eq!(doc_id.0 as usize, self.stored.len());
        self.stored.push(fields);
        self.doc_count = self.stored.len() as u32;
    }

    /// Pad per-field length tables so every field covers every document
    pub(crate) fn finish(&mut self) {
        let max_doc = self.doc_count as usize;
        for field in &mut self.fields {
            field.stats.field_lengths.resize(max_doc, 0);
        }
    }

    pub fn field_index(&self, field: FieldId) -> Option<&FieldIndex> {
        self.fields.get(field.index())
    }

    pub fn field_id(&self, field: &str) -> Option<FieldId> {
        self.schema.resolve(field)
    }

    /// Postings for (field, term); empty when either is unknown
    pub fn postings(&self, field: &str, term: &str) -> &PostingList {
        self.field_id(field)
            .map(|id| self.postings_by_id(id, term))
            .unwrap_or(&EMPTY_POSTINGS)
    }

    pub fn postings_by_id(&self, field: FieldId, term: &str) -> &PostingList {
        self.field_index(field)
            .and_then(|f| f.postings.get(term))
            .unwrap_or(&EMPTY_POSTINGS)
    }

    pub fn term_stats(&self, field: FieldId, term: &str) -> TermStats {
        let list = self.postings_by_id(field, term);
        TermStats {
            doc_freq: list.doc_freq(),
            total_term_freq: list.total_freq(),
        }
    }

    /// Statistics for a field; all-zero when the field is unknown
    pub fn field_stats(&self, field: &str) -> FieldStats {
        self.field_id(field)
            .and_then(|id| self.field_index(id))
            .map(|f| f.stats.clone())
            .unwrap_or_else(|| FieldStats::new(self.doc_count as usize))
    }

    pub fn field_stats_by_id(&self, field: FieldId) -> Option<&FieldStats> {
        self.field_index(field).map(|f| &f.stats)
    }

    pub fn collection_statistics(&self, field: &str) -> CollectionStatistics {
        let stats = self.field_stats(field);
        CollectionStatistics {
            field: field.to_string(),
            max_doc: self.doc_count,
            doc_count: stats.doc_count,
            sum_total_term_freq: stats.sum_total_term_freq,
            sum_doc_freq: stats.sum_doc_freq,
        }
    }

    pub fn stored_fields(&self, doc_id: DocId) -> Option<&BTreeMap<String, String>> {
        self.stored.get(doc_id.0 as usize)
    }

    /// Terms of a field in lexicographic order
    pub fn terms(&self, field: &str) -> Vec<&str> {
        let mut terms: Vec<&str> = self.field_id(field)
            .and_then(|id| self.field_index(id))
            .map(|f| f.postings.keys().map(String::as_str).collect())
            .unwrap_or_default();
        terms.sort_unstable();
        terms
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.schema.fields().map(|f| f.name.as_str()).collect()
    }

    pub fn max_doc(&self) -> u32 {
        self.doc_count
    }

    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }

    pub fn stats(&self) -> IndexStats {
        IndexStats {
            documents: self.doc_count,
            fields: self.schema.len(),
            terms: self.fields.iter().map(|f| f.postings.len()).sum(),
            postings: self.fields.iter()
                .flat_map(|f| f.postings.values())
                .map(PostingList::len)
                .sum(),
        }
    }

    /// Verify posting and statistics invariants across the whole index
    pub fn validate(&self) -> Result<()> {
        for entry in self.schema.fields() {
            let Some(field_index) = self.field_index(entry.id) else {
                continue;
            };
            for (term, list) in &field_index.postings {
                if let Some(problem) = list.check_invariants() {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("postings for {}:{} violate invariants: {}", entry.name, term, problem),
                    ));
                }
                if list.postings.last().is_some_and(|p| p.doc_id.0 >= self.doc_count) {
                    return Err(Error::new(
                        ErrorKind::Internal,
                        format!("postings for {}:{} reference a document beyond max_doc {}", entry.name, term, self.doc_count),
                    ));
                }
            }
            let stats = &field_index.stats;
            let tokens: u64 = field_index.postings.values().map(PostingList::total_freq).sum();
            let lengths: u64 = stats.field_lengths.iter().map(|&l| l as u64).sum();
            if tokens != stats.sum_total_term_freq || lengths != stats.sum_total_term_freq {
                return Err(Error::new(
                    ErrorKind::Internal,
                    format!(
                        "field {} length statistics disagree: postings {}, lengths {}, recorded {}",
                        entry.name, tokens, lengths, stats.sum_total_term_freq
                    ),
                ));
            }
        }
        Ok(())
    }
}
