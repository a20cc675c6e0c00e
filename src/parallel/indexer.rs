use rayon::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::types::FieldId;
use crate::schema::schema::Schema;

/// A document whose fields have been resolved against the schema
pub struct PreparedDoc<'a> {
    pub ordinal: usize,
    pub fields: Vec<(FieldId, &'a str)>,
}

/// Analysis output for one field instance
pub struct AnalyzedField {
    pub field: FieldId,
    pub length: u32,
    pub terms: Vec<(String, Vec<u32>)>,  // term -> ascending positions
}

/// Private per-document posting fragment, merged later by the writer
pub struct AnalyzedDoc {
    pub ordinal: usize,
    pub fields: Vec<AnalyzedField>,
}

/// Parallel document analyzer.
///
/// Each document is analyzed in isolation; no state is shared between
/// workers apart from the read-only schema and a progress counter.
pub struct ParallelIndexer {
    pub workers: usize,
    pub progress: Arc<AtomicUsize>,
}

impl ParallelIndexer {
    pub fn new(workers: usize) -> Self {
        ParallelIndexer {
            workers: workers.max(1),
            progress: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Get current progress
    pub fn get_progress(&self) -> usize {
        self.progress.load(Ordering::Relaxed)
    }

    /// Analyze documents in parallel; output order matches input order
    pub fn analyze_batch(&self, documents: &[PreparedDoc<'_>], schema: &Schema) -> Result<Vec<AnalyzedDoc>> {
        self.progress.store(0, Ordering::Relaxed);
        let total_docs = documents.len();

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.workers)
            .build()
            .map_err(|e| Error::new(ErrorKind::Internal, format!("failed to start analysis workers: {}", e)))?;

        let analyzed = pool.install(|| {
            documents
                .par_iter()
                .map(|doc| {
                    let result = analyze_document(doc, schema);
                    let current = self.progress.fetch_add(1, Ordering::Relaxed) + 1;
                    if current % 1000 == 0 {
                        tracing::debug!(analyzed = current, total = total_docs, "analysis progress");
                    }
                    result
                })
                .collect()
        });

        Ok(analyzed)
    }
}

fn analyze_document(doc: &PreparedDoc<'_>, schema: &Schema) -> AnalyzedDoc {
    let fields = doc.fields
        .iter()
        .map(|&(field, text)| {
            let tokens = schema.analyzer(field).analyze(text);
            let length = tokens.len() as u32;

            // Group positions by term; positions arrive in ascending order
            let mut order: Vec<String> = Vec::new();
            let mut term_positions: HashMap<String, Vec<u32>> = HashMap::new();
            for token in tokens {
                let positions = term_positions.entry(token.text).or_insert_with_key(|term| {
                    order.push(term.clone());
                    Vec::new()
                });
                positions.push(token.position);
            }

            let terms = order
                .into_iter()
                .map(|term| {
                    let positions = term_positions.remove(&term).unwrap_or_default();
                    (term, positions)
                })
                .collect();

            tracing::trace!(ordinal = doc.ordinal, field = schema.field_name(field), tokens = length, "analyzed field");
            AnalyzedField { field, length, terms }
        })
        .collect();

    AnalyzedDoc {
        ordinal: doc.ordinal,
        fields,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, FieldConfig};

    #[test]
    fn fragments_preserve_input_order_and_positions() {
        let config = Config::default().with_field("titolo", FieldConfig::whitespace());
        let schema = Schema::from_config(&config);
        let titolo = schema.resolve("titolo").unwrap();

        let texts = ["a b a", "c", "b b b b"];
        let docs: Vec<PreparedDoc<'_>> = texts
            .iter()
            .enumerate()
            .map(|(ordinal, text)| PreparedDoc { ordinal, fields: vec![(titolo, *text)] })
            .collect();

        let indexer = ParallelIndexer::new(3);
        let analyzed = indexer.analyze_batch(&docs, &schema).unwrap();

        assert_eq!(indexer.get_progress(), 3);
        assert_eq!(analyzed.iter().map(|d| d.ordinal).collect::<Vec<_>>(), vec![0, 1, 2]);
        let first = &analyzed[0].fields[0];
        assert_eq!(first.length, 3);
        assert_eq!(first.terms, vec![("a".to_string(), vec![0, 2]), ("b".to_string(), vec![1])]);
        assert_eq!(analyzed[2].fields[0].terms, vec![("b".to_string(), vec![0, 1, 2, 3])]);
    }
}
