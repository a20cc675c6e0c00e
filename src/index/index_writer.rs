use std::collections::BTreeMap;
use std::mem;
use std::time::Instant;
use crate::core::config::Config;
use crate::core::error::{AnalysisWarning, Result};
use crate::core::stats::BuildReport;
use crate::core::types::{DocId, Document, FieldId};
use crate::index::inverted::InvertedIndex;
use crate::parallel::indexer::{ParallelIndexer, PreparedDoc};
use crate::schema::schema::Schema;

/// IndexWriter handles inverted index building.
///
/// Documents are buffered by `add_document`; `commit` runs the parallel
/// analyze phase, merges the per-document fragments sequentially in input
/// order and hands back an immutable `InvertedIndex`. The writer is consumed
/// by `commit`, which is the only way to obtain an index.
pub struct IndexWriter {
    pub config: Config,
    pub parallel_indexer: ParallelIndexer,
    pending: Vec<Document>,
}

impl IndexWriter {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let parallel_indexer = ParallelIndexer::new(config.workers);
        Ok(IndexWriter {
            config,
            parallel_indexer,
            pending: Vec::new(),
        })
    }

    pub fn add_document(&mut self, doc: Document) {
        self.pending.push(doc);
    }

    pub fn add_documents<I>(&mut self, docs: I)
    where
        I: IntoIterator,
        I::Item: Into<Document>,
    {
        self.pending.extend(docs.into_iter().map(Into::into));
    }

    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Drop everything buffered so far
    pub fn delete_all(&mut self) {
        self.pending.clear();
    }

    pub fn commit(mut self) -> Result<(InvertedIndex, BuildReport)> {
        let start = Instant::now();
        let documents = mem::take(&mut self.pending);
        let mut schema = Schema::from_config(&self.config);
        let mut warnings = Vec::new();

        // Structural checks and field resolution run sequentially so that
        // field ids are assigned in a deterministic order.
        let mut prepared = Vec::with_capacity(documents.len());
        for (ordinal, doc) in documents.iter().enumerate() {
            match check_document(ordinal, doc).and_then(|()| resolve_fields(&mut schema, ordinal, doc)) {
                Ok(fields) => prepared.push(PreparedDoc { ordinal, fields }),
                Err(warning) => {
                    tracing::warn!(ordinal = warning.ordinal, field = ?warning.field, reason = %warning.reason, "skipping document");
                    warnings.push(warning);
                }
            }
        }

        let analyzed = self.parallel_indexer.analyze_batch(&prepared, &schema)?;
        drop(prepared);

        let mut index = InvertedIndex::new(schema);
        for (next_id, doc) in analyzed.into_iter().enumerate() {
            let doc_id = DocId(next_id as u32);
            for field in doc.fields {
                index.add_field_postings(doc_id, field.field, field.length, field.terms);
            }
            let stored = stored_fields(&index.schema, &documents[doc.ordinal]);
            index.add_stored(doc_id, stored);
        }
        index.finish();
        debug_assert!(index.validate().is_ok());

        let stats = index.stats();
        let elapsed = start.elapsed();
        tracing::info!(
            documents = stats.documents,
            skipped = warnings.len(),
            fields = stats.fields,
            terms = stats.terms,
            elapsed_ms = elapsed.as_millis() as u64,
            "index committed"
        );

        let report = BuildReport {
            documents_indexed: stats.documents,
            warnings,
            stats,
            elapsed,
        };
        Ok((index, report))
    }
}

fn check_document(ordinal: usize, doc: &Document) -> std::result::Result<(), AnalysisWarning> {
    if doc.fields.is_empty() {
        return Err(AnalysisWarning {
            ordinal,
            field: None,
            reason: "document has no fields".to_string(),
        });
    }
    for (name, text) in &doc.fields {
        if name.is_empty() {
            return Err(AnalysisWarning {
                ordinal,
                field: None,
                reason: "empty field name".to_string(),
            });
        }
        if text.contains('\0') {
            return Err(AnalysisWarning {
                ordinal,
                field: Some(name.clone()),
                reason: "field text contains a NUL byte".to_string(),
            });
        }
    }
    Ok(())
}

fn resolve_fields<'d>(
    schema: &mut Schema,
    ordinal: usize,
    doc: &'d Document,
) -> std::result::Result<Vec<(FieldId, &'d str)>, AnalysisWarning> {
    doc.fields
        .iter()
        .map(|(name, text)| match schema.resolve_or_insert(name) {
            Some(id) => Ok((id, text.as_str())),
            None => Err(AnalysisWarning {
                ordinal,
                field: Some(name.clone()),
                reason: "too many distinct fields".to_string(),
            }),
        })
        .collect()
}

fn stored_fields(schema: &Schema, doc: &Document) -> BTreeMap<String, String> {
    doc.fields
        .iter()
        .filter(|(name, _)| {
            schema.resolve(name)
                .map(|id| schema.field(id).config.stored)
                .unwrap_or(false)
        })
        .map(|(name, text)| (name.clone(), text.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::FieldConfig;

    fn writer() -> IndexWriter {
        let config = Config::default()
            .with_field("titolo", FieldConfig::whitespace())
            .with_field("note", FieldConfig::standard().with_stored(false));
        IndexWriter::new(config).unwrap()
    }

    #[test]
    fn malformed_documents_are_skipped_with_warnings() {
        let mut writer = writer();
        writer.add_document(Document::new().with_field("titolo", "Primo"));
        writer.add_document(Document::new());
        writer.add_document(Document::new().with_field("", "senza nome"));
        writer.add_document(Document::new().with_field("titolo", "rotto\0"));
        writer.add_document(Document::new().with_field("titolo", "Ultimo"));

        let (index, report) = writer.commit().unwrap();
        assert_eq!(report.documents_indexed, 2);
        assert_eq!(report.documents_skipped(), 3);
        assert_eq!(report.warnings.iter().map(|w| w.ordinal).collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(report.warnings[2].field.as_deref(), Some("titolo"));

        // Surviving documents get dense ids in input order
        assert_eq!(index.postings("titolo", "Ultimo").postings[0].doc_id, DocId(1));
        assert!(index.validate().is_ok());
    }

    #[test]
    fn every_distinct_field_gets_its_own_id() {
        let mut doc = Document::new();
        for i in 0..=65_536u32 {
            doc.fields.insert(format!("f{:06}", i), format!("w{}", i));
        }
        let mut writer = writer();
        writer.add_document(doc);

        let (index, report) = writer.commit().unwrap();
        assert!(report.warnings.is_empty());
        let first = index.schema.resolve("f000000").unwrap();
        let last = index.schema.resolve("f065536").unwrap();
        assert_ne!(first, last);
        assert_eq!(index.schema.field_name(last), "f065536");

        assert_eq!(index.postings("f065536", "w65536").doc_freq(), 1);
        assert!(index.postings("f000000", "w65536").is_empty());
        assert_eq!(index.postings("f000000", "w0").doc_freq(), 1);
    }

    #[test]
    fn empty_build_yields_empty_index() {
        let (index, report) = writer().commit().unwrap();
        assert!(index.is_empty());
        assert_eq!(report.documents_indexed, 0);
        assert!(index.postings("titolo", "anything").is_empty());
        assert!(index.validate().is_ok());
    }

    #[test]
    fn unstored_fields_are_indexed_but_not_returned() {
        let mut writer = writer();
        writer.add_document(Document::new().with_field("titolo", "Curriculum").with_field("note", "riservato"));
        let (index, _) = writer.commit().unwrap();

        let stored = index.stored_fields(DocId(0)).unwrap();
        assert_eq!(stored.get("titolo").map(String::as_str), Some("Curriculum"));
        assert!(!stored.contains_key("note"));
        assert_eq!(index.postings("note", "riservato").doc_freq(), 1);
    }

    #[test]
    fn delete_all_discards_pending_documents() {
        let mut writer = writer();
        writer.add_documents(vec![Document::new().with_field("titolo", "uno")]);
        assert_eq!(writer.pending(), 1);
        writer.delete_all();
        assert_eq!(writer.pending(), 0);
        let (index, _) = writer.commit().unwrap();
        assert_eq!(index.max_doc(), 0);
    }
}
