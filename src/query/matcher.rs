use std::collections::BTreeMap;
use roaring::RoaringBitmap;
use crate::core::types::{DocId, FieldId};
use crate::index::inverted::InvertedIndex;
use crate::index::posting::Posting;
use crate::query::ast::{BoolQuery, Occur, PhraseQuery, Query, TermQuery};

/// What a single leaf query contributed to a matching document
#[derive(Debug, Clone, PartialEq)]
pub enum Feature {
    Term {
        field: FieldId,
        term: String,
        freq: u32,
        positions: Vec<u32>,
        boost: f32,
    },
    Phrase {
        field: FieldId,
        terms: Vec<String>,
        freq: u32,             // Number of matching runs
        positions: Vec<u32>,   // Start position of each run
        boost: f32,
    },
    Constant {
        boost: f32,
    },
}

/// Every feature that matched one document, in clause order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MatchFeatures {
    pub features: Vec<Feature>,
}

/// Matching documents in ascending id order
pub type Matches = BTreeMap<DocId, MatchFeatures>;

/// Walks posting lists to find the documents matching a query.
/// Read-only over the index; scoring happens elsewhere.
pub struct Evaluator<'a> {
    index: &'a InvertedIndex,
}

impl<'a> Evaluator<'a> {
    pub fn new(index: &'a InvertedIndex) -> Self {
        Evaluator { index }
    }

    pub fn evaluate(&self, query: &Query) -> Matches {
        self.evaluate_boosted(query, 1.0)
    }

    fn evaluate_boosted(&self, query: &Query, parent_boost: f32) -> Matches {
        let boost = parent_boost * query.boost();
        match query {
            Query::MatchAll => self.match_all(boost),
            Query::Term(term_query) => self.match_term(term_query, boost),
            Query::Phrase(phrase_query) => self.match_phrase(phrase_query, boost),
            Query::Bool(bool_query) => self.match_bool(bool_query, boost),
        }
    }

    fn match_all(&self, boost: f32) -> Matches {
        (0..self.index.max_doc())
            .map(|id| (DocId(id), MatchFeatures { features: vec![Feature::Constant { boost }] }))
            .collect()
    }

    fn match_term(&self, query: &TermQuery, boost: f32) -> Matches {
        let Some(field) = self.index.field_id(&query.field) else {
            return Matches::new();
        };

        self.index
            .postings_by_id(field, &query.value)
            .iter()
            .map(|posting| {
                let feature = Feature::Term {
                    field,
                    term: query.value.clone(),
                    freq: posting.term_freq,
                    positions: posting.positions.clone(),
                    boost,
                };
                (posting.doc_id, MatchFeatures { features: vec![feature] })
            })
            .collect()
    }

    fn match_phrase(&self, query: &PhraseQuery, boost: f32) -> Matches {
        let Some(field) = self.index.field_id(&query.field) else {
            return Matches::new();
        };
        if query.phrase.is_empty() {
            return Matches::new();
        }

        let lists: Vec<_> = query.phrase
            .iter()
            .map(|term| self.index.postings_by_id(field, term))
            .collect();
        if lists.iter().any(|list| list.is_empty()) {
            return Matches::new();
        }

        let mut matches = Matches::new();
        'candidates: for first in lists[0].iter() {
            // Intersect by doc id
            let mut postings: Vec<&Posting> = Vec::with_capacity(lists.len());
            postings.push(first);
            for list in &lists[1..] {
                match list.get(first.doc_id) {
                    Some(posting) => postings.push(posting),
                    None => continue 'candidates,
                }
            }

            let starts = phrase_starts(&postings);
            if starts.is_empty() {
                continue;
            }
            let feature = Feature::Phrase {
                field,
                terms: query.phrase.clone(),
                freq: starts.len() as u32,
                positions: starts,
                boost,
            };
            matches.insert(first.doc_id, MatchFeatures { features: vec![feature] });
        }

        matches
    }

    fn match_bool(&self, query: &BoolQuery, boost: f32) -> Matches {
        if !query.has_positive_clause() {
            return Matches::new();
        }

        let evaluated: Vec<(Occur, Matches)> = query.clauses
            .iter()
            .map(|clause| (clause.occur, self.evaluate_boosted(&clause.query, boost)))
            .collect();

        let mut required: Option<RoaringBitmap> = None;
        let mut excluded = RoaringBitmap::new();
        for (occur, matches) in &evaluated {
            let ids: RoaringBitmap = matches.keys().map(|id| id.0).collect();
            match occur {
                Occur::Must => {
                    required = Some(match required.take() {
                        Some(mut acc) => {
                            acc &= &ids;
                            acc
                        }
                        None => ids,
                    });
                }
                Occur::MustNot => excluded |= &ids,
                Occur::Should => {}
            }
        }

        let mut result = Matches::new();
        for (occur, matches) in evaluated {
            if occur == Occur::MustNot {
                continue;
            }
            for (doc_id, features) in matches {
                let allowed = required.as_ref().is_none_or(|ids| ids.contains(doc_id.0));
                if allowed && !excluded.contains(doc_id.0) {
                    result.entry(doc_id).or_default().features.extend(features.features);
                }
            }
        }

        result
    }
}

/// Start positions where every term follows its predecessor at distance one
fn phrase_starts(postings: &[&Posting]) -> Vec<u32> {
    postings[0].positions
        .iter()
        .copied()
        .filter(|&start| {
            postings[1..].iter().enumerate().all(|(offset, posting)| {
                start
                    .checked_add(offset as u32 + 1)
                    .is_some_and(|position| posting.has_position(position))
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, FieldConfig};
    use crate::core::types::Document;
    use crate::index::index_writer::IndexWriter;

    fn index(texts: &[&str]) -> InvertedIndex {
        let config = Config::default().with_field("f", FieldConfig::whitespace());
        let mut writer = IndexWriter::new(config).unwrap();
        for text in texts {
            writer.add_document(Document::new().with_field("f", *text));
        }
        writer.commit().unwrap().0
    }

    fn ids(matches: &Matches) -> Vec<u32> {
        matches.keys().map(|id| id.0).collect()
    }

    #[test]
    fn term_features_carry_frequency_and_positions() {
        let index = index(&["a b a", "b"]);
        let matches = Evaluator::new(&index).evaluate(&Query::term("f", "a"));
        assert_eq!(ids(&matches), vec![0]);
        match &matches[&DocId(0)].features[0] {
            Feature::Term { freq, positions, .. } => {
                assert_eq!(*freq, 2);
                assert_eq!(positions, &vec![0, 2]);
            }
            other => panic!("unexpected feature {:?}", other),
        }
    }

    #[test]
    fn phrase_requires_consecutive_order() {
        let index = index(&["x data scientist", "scientist data", "data x scientist"]);
        let evaluator = Evaluator::new(&index);

        let forward = evaluator.evaluate(&Query::phrase("f", ["data", "scientist"]));
        assert_eq!(ids(&forward), vec![0]);

        let backward = evaluator.evaluate(&Query::phrase("f", ["scientist", "data"]));
        assert_eq!(ids(&backward), vec![1]);
    }

    #[test]
    fn phrase_counts_every_run() {
        let index = index(&["a b a b a"]);
        let matches = Evaluator::new(&index).evaluate(&Query::phrase("f", ["a", "b"]));
        match &matches[&DocId(0)].features[0] {
            Feature::Phrase { freq, positions, .. } => {
                assert_eq!(*freq, 2);
                assert_eq!(positions, &vec![0, 2]);
            }
            other => panic!("unexpected feature {:?}", other),
        }
    }

    #[test]
    fn repeated_phrase_terms_need_distinct_positions() {
        let index = index(&["a a", "a b a"]);
        let matches = Evaluator::new(&index).evaluate(&Query::phrase("f", ["a", "a"]));
        assert_eq!(ids(&matches), vec![0]);
    }

    #[test]
    fn boolean_combines_must_should_and_must_not() {
        let index = index(&["a b", "a c", "b c", "a b c"]);
        let evaluator = Evaluator::new(&index);

        let must_a_should_b: Query = BoolQuery::new()
            .with_must(Query::term("f", "a"))
            .with_should(Query::term("f", "b"))
            .into();
        let matches = evaluator.evaluate(&must_a_should_b);
        assert_eq!(ids(&matches), vec![0, 1, 3]);
        assert_eq!(matches[&DocId(0)].features.len(), 2);
        assert_eq!(matches[&DocId(1)].features.len(), 1);

        let should_without_c: Query = BoolQuery::new()
            .with_should(Query::term("f", "a"))
            .with_should(Query::term("f", "b"))
            .with_must_not(Query::term("f", "c"))
            .into();
        assert_eq!(ids(&evaluator.evaluate(&should_without_c)), vec![0]);

        let two_musts: Query = BoolQuery::new()
            .with_must(Query::term("f", "b"))
            .with_must(Query::term("f", "c"))
            .into();
        assert_eq!(ids(&evaluator.evaluate(&two_musts)), vec![2, 3]);
    }

    #[test]
    fn only_must_not_matches_nothing() {
        let index = index(&["a", "b"]);
        let evaluator = Evaluator::new(&index);
        let query: Query = BoolQuery::new().with_must_not(Query::term("f", "a")).into();
        assert!(evaluator.evaluate(&query).is_empty());
        assert!(evaluator.evaluate(&BoolQuery::new().into()).is_empty());
    }

    #[test]
    fn match_all_and_unknown_fields() {
        let index = index(&["a", "b"]);
        let evaluator = Evaluator::new(&index);
        assert_eq!(ids(&evaluator.evaluate(&Query::MatchAll)), vec![0, 1]);
        assert!(evaluator.evaluate(&Query::term("missing", "a")).is_empty());
        assert!(evaluator.evaluate(&Query::phrase("f", Vec::<String>::new())).is_empty());
    }

    #[test]
    fn boosts_propagate_to_leaves() {
        let index = index(&["a"]);
        let query: Query = BoolQuery::new()
            .with_should(Query::term("f", "a").boosted(3.0))
            .into();
        let query = query.boosted(2.0);
        let matches = Evaluator::new(&index).evaluate(&query);
        match &matches[&DocId(0)].features[0] {
            Feature::Term { boost, .. } => assert_eq!(*boost, 6.0),
            other => panic!("unexpected feature {:?}", other),
        }
    }
}
