use std::cmp::Ordering;
use std::collections::{BTreeMap, BinaryHeap};
use std::fmt;
use serde::Serialize;
use crate::core::types::DocId;
use crate::scoring::explanation::Explanation;

/// One ranked hit handed back to the caller
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryResult {
    pub doc_id: DocId,
    pub stored_fields: BTreeMap<String, String>,
    pub score: f32,
    pub explanation: Option<Explanation>,
}

impl fmt::Display for QueryResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} score={:.4}", self.doc_id, self.score)?;
        for (name, text) in &self.stored_fields {
            writeln!(f, "  {}: {}", name, text)?;
        }
        if let Some(explanation) = &self.explanation {
            write!(f, "{}", explanation)?;
        }
        Ok(())
    }
}

/// Search results container
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchResults {
    pub hits: Vec<QueryResult>,
    pub total_hits: usize,   // Matches before the top-k cut
    pub max_score: f32,
    pub took_ms: u64,
}

impl SearchResults {
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &QueryResult> {
        self.hits.iter()
    }

    pub fn doc_ids(&self) -> Vec<DocId> {
        self.hits.iter().map(|hit| hit.doc_id).collect()
    }
}

impl fmt::Display for SearchResults {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{} hit(s), showing {} ({} ms)", self.total_hits, self.hits.len(), self.took_ms)?;
        for hit in &self.hits {
            write!(f, "{}", hit)?;
        }
        Ok(())
    }
}

/// Document with relevance score.
///
/// Ordered so that the *worse* hit compares greater: lower score first, then
/// higher doc id on equal scores. A `BinaryHeap` of these keeps the weakest
/// retained hit on top, and sorting ascending yields the final ranking.
#[derive(Debug, Clone, Copy)]
pub struct ScoredDocument {
    pub doc_id: DocId,
    pub score: f32,
}

impl PartialEq for ScoredDocument {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ScoredDocument {}

impl PartialOrd for ScoredDocument {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ScoredDocument {
    fn cmp(&self, other: &Self) -> Ordering {
        other.score
            .total_cmp(&self.score)
            .then_with(|| self.doc_id.cmp(&other.doc_id))
    }
}

/// Top-K collector for efficient result collection
pub struct TopKCollector {
    pub heap: BinaryHeap<ScoredDocument>,
    pub k: usize,
    pub total_collected: usize,  // Track total documents processed
}

impl TopKCollector {
    pub fn new(k: usize) -> Self {
        TopKCollector {
            heap: BinaryHeap::with_capacity(k.saturating_add(1).min(1024)),
            k,
            total_collected: 0,
        }
    }

    pub fn collect(&mut self, scored_doc: ScoredDocument) {
        self.total_collected += 1;
        if self.k == 0 {
            return;
        }

        if self.heap.len() < self.k {
            self.heap.push(scored_doc);
        } else if let Some(mut weakest) = self.heap.peek_mut() {
            if scored_doc < *weakest {
                *weakest = scored_doc;
            }
        }
    }

    /// Best hit first
    pub fn into_sorted_vec(self) -> Vec<ScoredDocument> {
        self.heap.into_sorted_vec()
    }

    /// Score of the best retained hit, 0.0 when nothing was kept
    pub fn max_score(&self) -> f32 {
        self.heap.iter().min().map(|doc| doc.score).unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(doc: u32, score: f32) -> ScoredDocument {
        ScoredDocument { doc_id: DocId(doc), score }
    }

    fn ranking(collector: TopKCollector) -> Vec<u32> {
        collector.into_sorted_vec().iter().map(|d| d.doc_id.0).collect()
    }

    #[test]
    fn keeps_best_k_in_descending_order() {
        let mut collector = TopKCollector::new(3);
        for (doc, score) in [(0, 0.5), (1, 2.0), (2, 1.0), (3, 3.0), (4, 0.1)] {
            collector.collect(scored(doc, score));
        }
        assert_eq!(collector.total_collected, 5);
        assert_eq!(collector.max_score(), 3.0);
        assert_eq!(ranking(collector), vec![3, 1, 2]);
    }

    #[test]
    fn equal_scores_rank_by_ascending_doc_id() {
        let mut collector = TopKCollector::new(2);
        for doc in [4, 2, 7, 1] {
            collector.collect(scored(doc, 1.0));
        }
        assert_eq!(ranking(collector), vec![1, 2]);
    }

    #[test]
    fn zero_k_collects_nothing() {
        let mut collector = TopKCollector::new(0);
        collector.collect(scored(0, 1.0));
        assert_eq!(collector.total_collected, 1);
        assert_eq!(collector.max_score(), 0.0);
        assert!(collector.into_sorted_vec().is_empty());
    }

    #[test]
    fn max_score_with_only_negative_scores() {
        let mut collector = TopKCollector::new(2);
        for (doc, score) in [(0, -2.0), (1, -0.5), (2, -1.25)] {
            collector.collect(scored(doc, score));
        }
        assert_eq!(collector.max_score(), -0.5);
        assert_eq!(ranking(collector), vec![1, 2]);
    }
}
