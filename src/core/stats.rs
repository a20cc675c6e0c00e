use std::time::Duration;
use serde::{Serialize, Deserialize};
use crate::core::error::AnalysisWarning;
use crate::core::types::DocId;

/// Per-field length statistics used by the length-aware similarities
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldStats {
    pub doc_count: u32,             // Documents with at least one token in the field
    pub sum_total_term_freq: u64,   // Tokens indexed across all documents
    pub sum_doc_freq: u64,          // Sum over terms of their document frequency
    pub field_lengths: Vec<u32>,    // Token count per document, indexed by DocId
}

impl FieldStats {
    pub fn new(max_doc: usize) -> Self {
        FieldStats {
            field_lengths: vec![0; max_doc],
            ..FieldStats::default()
        }
    }

    pub fn record(&mut self, doc_id: DocId, length: u32) {
        let slot = doc_id.0 as usize;
        if slot >= self.field_lengths.len() {
            self.field_lengths.resize(slot + 1, 0);
        }
        if length > 0 && self.field_lengths[slot] == 0 {
            self.doc_count += 1;
        }
        self.field_lengths[slot] += length;
        self.sum_total_term_freq += length as u64;
    }

    pub fn field_length(&self, doc_id: DocId) -> u32 {
        self.field_lengths.get(doc_id.0 as usize).copied().unwrap_or(0)
    }

    pub fn avg_field_length(&self) -> f32 {
        if self.doc_count == 0 {
            0.0
        } else {
            self.sum_total_term_freq as f32 / self.doc_count as f32
        }
    }
}

/// Term-level statistics read by the scorer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TermStats {
    pub doc_freq: u32,
    pub total_term_freq: u64,
}

/// Collection-level view of one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollectionStatistics {
    pub field: String,
    pub max_doc: u32,
    pub doc_count: u32,
    pub sum_total_term_freq: u64,
    pub sum_doc_freq: u64,
}

/// Whole-index summary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexStats {
    pub documents: u32,
    pub fields: usize,
    pub terms: usize,
    pub postings: usize,
}

/// Outcome of one build: what was indexed and what was skipped
#[derive(Debug, Clone, Serialize)]
pub struct BuildReport {
    pub documents_indexed: u32,
    pub warnings: Vec<AnalysisWarning>,
    pub stats: IndexStats,
    pub elapsed: Duration,
}

impl BuildReport {
    pub fn documents_skipped(&self) -> usize {
        self.warnings.len()
    }
}
