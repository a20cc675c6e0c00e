use serde::{Serialize, Deserialize};
use crate::core::types::DocId;

/// One document's occurrences of one term in one field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub term_freq: u32,       // Term frequency in document
    pub positions: Vec<u32>,  // Token positions for phrase queries, ascending
}

impl Posting {
    pub fn new(doc_id: DocId, positions: Vec<u32>) -> Self {
        Posting {
            doc_id,
            term_freq: positions.len() as u32,
            positions,
        }
    }

    pub fn has_position(&self, position: u32) -> bool {
        self.positions.binary_search(&position).is_ok()
    }
}

/// Posting list for a term
/// Note: Sorted by doc_id, no duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostingList {
    pub postings: Vec<Posting>,  // Sorted by doc_id
    total_term_freq: u64,
}

impl PostingList {
    pub const fn new() -> Self {
        PostingList {
            postings: Vec::new(),
            total_term_freq: 0,
        }
    }

    /// Merge a posting, keeping the list sorted by doc_id.
    /// Appending in ascending doc order (the build path) never shifts elements.
    pub fn add_posting(&mut self, posting: Posting) {
        self.total_term_freq += posting.term_freq as u64;

        if self.postings.last().is_none_or(|last| last.doc_id < posting.doc_id) {
            self.postings.push(posting);
            return;
        }

        match self.postings.binary_search_by_key(&posting.doc_id, |p| p.doc_id) {
            Ok(pos) => {
                // Same document seen again: fold occurrences into one posting
                let existing = &mut self.postings[pos];
                existing.positions.extend(posting.positions);
                existing.positions.sort_unstable();
                existing.positions.dedup();
                self.total_term_freq -= posting.term_freq as u64;
                self.total_term_freq -= existing.term_freq as u64;
                existing.term_freq = existing.positions.len() as u32;
                self.total_term_freq += existing.term_freq as u64;
            }
            Err(pos) => {
                self.postings.insert(pos, posting);
            }
        }
    }

    pub fn get(&self, doc_id: DocId) -> Option<&Posting> {
        self.postings
            .binary_search_by_key(&doc_id, |p| p.doc_id)
            .ok()
            .map(|pos| &self.postings[pos])
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting> {
        self.postings.iter()
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    pub fn doc_freq(&self) -> u32 {
        self.postings.len() as u32
    }

    pub fn total_freq(&self) -> u64 {
        self.total_term_freq
    }

    /// Check ordering invariants; returns a description of the first violation
    pub fn check_invariants(&self) -> Option<String> {
        for window in self.postings.windows(2) {
            if window[0].doc_id >= window[1].doc_id {
                return Some(format!("doc ids not strictly increasing: {} then {}", window[0].doc_id, window[1].doc_id));
            }
        }
        for posting in &self.postings {
            if posting.term_freq as usize != posting.positions.len() {
                return Some(format!("{}: term_freq {} but {} positions", posting.doc_id, posting.term_freq, posting.positions.len()));
            }
            if posting.positions.windows(2).any(|w| w[0] >= w[1]) {
                return Some(format!("{}: positions not strictly increasing", posting.doc_id));
            }
        }
        let total: u64 = self.postings.iter().map(|p| p.term_freq as u64).sum();
        if total != self.total_term_freq {
            return Some(format!("total term freq {} but postings sum to {}", self.total_term_freq, total));
        }
        None
    }
}
