use serde::{Serialize, Deserialize};
use crate::core::stats::{FieldStats, TermStats};
use crate::core::types::{DocId, FieldId};
use crate::index::inverted::InvertedIndex;
use crate::query::matcher::{Feature, MatchFeatures};
use crate::scoring::explanation::Explanation;

/// Similarity function used to turn match features into a score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Similarity {
    TfIdf,
    Bm25 {
        k1: f32,  // Term frequency saturation
        b: f32,   // Length normalization strength
    },
    LmJelinekMercer {
        lambda: f32,  // Weight of the collection model
    },
}

impl Similarity {
    pub fn name(&self) -> &'static str {
        match self {
            Similarity::TfIdf => "tfidf",
            Similarity::Bm25 { .. } => "bm25",
            Similarity::LmJelinekMercer { .. } => "lm-jelinek-mercer",
        }
    }
}

impl Default for Similarity {
    fn default() -> Self {
        Similarity::Bm25 { k1: 1.2, b: 0.75 }
    }
}

/// Scores evaluator output against one index.
///
/// Corpus statistics are per field: `N` is the number of documents with at
/// least one token in the field, the average length is taken over those
/// documents. Phrases contribute the sum of their terms' weights, computed
/// with the phrase frequency in place of the term frequency.
pub struct Scorer<'a> {
    index: &'a InvertedIndex,
    pub similarity: Similarity,
}

impl<'a> Scorer<'a> {
    pub fn new(index: &'a InvertedIndex, similarity: Similarity) -> Self {
        Scorer { index, similarity }
    }

    pub fn score(&self, doc_id: DocId, features: &MatchFeatures) -> f32 {
        self.weigh(doc_id, features, false).0
    }

    /// Same arithmetic as `score`, with every factor recorded
    pub fn explain(&self, doc_id: DocId, features: &MatchFeatures) -> Explanation {
        let (total, details) = self.weigh(doc_id, features, true);
        Explanation {
            value: total,
            description: format!("sum of ({}):", self.similarity.name()),
            details,
        }
    }

    fn weigh(&self, doc_id: DocId, features: &MatchFeatures, explain: bool) -> (f32, Vec<Explanation>) {
        let mut total = 0.0f32;
        let mut details = Vec::new();

        for feature in &features.features {
            let (value, explanation) = match feature {
                Feature::Term { field, term, freq, boost, .. } => {
                    self.term_weight(doc_id, *field, term, *freq, *boost, explain)
                }
                Feature::Phrase { field, terms, freq, boost, .. } => {
                    let mut subtotal = 0.0f32;
                    let mut parts = Vec::new();
                    for term in terms {
                        let (value, part) = self.term_weight(doc_id, *field, term, *freq, *boost, explain);
                        subtotal += value;
                        parts.extend(part);
                    }
                    let explanation = explain.then(|| Explanation {
                        value: subtotal,
                        description: format!(
                            "phrase {}:\"{}\" in {}, {} occurrence(s), sum of:",
                            self.index.schema.field_name(*field),
                            terms.join(" "),
                            doc_id,
                            freq
                        ),
                        details: parts,
                    });
                    (subtotal, explanation)
                }
                Feature::Constant { boost } => {
                    (*boost, explain.then(|| Explanation::new(*boost, "match all, constant score (boost)")))
                }
            };
            total += value;
            details.extend(explanation);
        }

        (total, details)
    }

    fn term_weight(&self, doc_id: DocId, field: FieldId, term: &str, freq: u32, boost: f32, explain: bool) -> (f32, Option<Explanation>) {
        let empty = FieldStats::default();
        let field_stats = self.index.field_stats_by_id(field).unwrap_or(&empty);
        let term_stats = self.index.term_stats(field, term);
        let doc_len = field_stats.field_length(doc_id);
        let tf = freq as f32;

        let (value, factors) = match self.similarity {
            Similarity::TfIdf => tf_idf(tf, doc_len, field_stats, term_stats, explain),
            Similarity::Bm25 { k1, b } => bm25(tf, doc_len, field_stats, term_stats, k1, b, explain),
            Similarity::LmJelinekMercer { lambda } => lm_jelinek_mercer(tf, doc_len, field_stats, term_stats, lambda, explain),
        };
        let value = value * boost;

        let explanation = explain.then(|| {
            let mut explanation = Explanation {
                value,
                description: format!(
                    "weight({}:{} in {}) [{}], product of:",
                    self.index.schema.field_name(field),
                    term,
                    doc_id,
                    self.similarity.name()
                ),
                details: factors,
            };
            explanation.add_detail(Explanation::new(boost, "boost"));
            explanation
        });
        (value, explanation)
    }
}

fn total_docs(field_stats: &FieldStats) -> f32 {
    field_stats.doc_count.max(1) as f32
}

fn tf_idf(tf: f32, doc_len: u32, field_stats: &FieldStats, term_stats: TermStats, explain: bool) -> (f32, Vec<Explanation>) {
    let n = total_docs(field_stats);
    let df = term_stats.doc_freq as f32;

    let tf_factor = tf.sqrt();
    let idf = 1.0 + (n / (df + 1.0)).ln();
    let norm = 1.0 / (doc_len.max(1) as f32).sqrt();
    let value = tf_factor * idf * norm;

    let mut factors = Vec::new();
    if explain {
        factors.push(
            Explanation::new(tf_factor, "tf, sqrt of freq")
                .with_detail(Explanation::new(tf, "freq")),
        );
        factors.push(
            Explanation::new(idf, "idf, 1 + ln(N / (df + 1)) from:")
                .with_detail(Explanation::new(df, "df, number of documents containing term"))
                .with_detail(Explanation::new(n, "N, number of documents with field")),
        );
        factors.push(
            Explanation::new(norm, "fieldNorm, 1 / sqrt(dl)")
                .with_detail(Explanation::new(doc_len as f32, "dl, length of field")),
        );
    }
    (value, factors)
}

fn bm25(tf: f32, doc_len: u32, field_stats: &FieldStats, term_stats: TermStats, k1: f32, b: f32, explain: bool) -> (f32, Vec<Explanation>) {
    let n = total_docs(field_stats);
    let df = term_stats.doc_freq as f32;
    let dl = doc_len as f32;
    let avgdl = match field_stats.avg_field_length() {
        avg if avg > 0.0 => avg,
        _ => 1.0,
    };

    let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();
    let length_norm = k1 * (1.0 - b + b * dl / avgdl);
    let tf_norm = tf * (k1 + 1.0) / (tf + length_norm);
    let value = idf * tf_norm;

    let mut factors = Vec::new();
    if explain {
        factors.push(
            Explanation::new(idf, "idf, ln(1 + (N - df + 0.5) / (df + 0.5)) from:")
                .with_detail(Explanation::new(df, "df, number of documents containing term"))
                .with_detail(Explanation::new(n, "N, number of documents with field")),
        );
        factors.push(
            Explanation::new(tf_norm, "tf, freq * (k1 + 1) / (freq + k1 * (1 - b + b * dl / avgdl)) from:")
                .with_detail(Explanation::new(tf, "freq, occurrences of term within document"))
                .with_detail(Explanation::new(k1, "k1, term saturation parameter"))
                .with_detail(Explanation::new(b, "b, length normalization parameter"))
                .with_detail(Explanation::new(dl, "dl, length of field"))
                .with_detail(Explanation::new(avgdl, "avgdl, average length of field")),
        );
    }
    (value, factors)
}

fn lm_jelinek_mercer(tf: f32, doc_len: u32, field_stats: &FieldStats, term_stats: TermStats, lambda: f32, explain: bool) -> (f32, Vec<Explanation>) {
    let dl = doc_len.max(1) as f32;
    let doc_prob = tf / dl;
    let collection_prob = (term_stats.total_term_freq as f32 + 1.0) / (field_stats.sum_total_term_freq as f32 + 1.0);
    let value = (1.0 + ((1.0 - lambda) * doc_prob) / (lambda * collection_prob)).ln();

    let mut factors = Vec::new();
    if explain {
        factors.push(
            Explanation::new(value, "ln(1 + ((1 - lambda) * freq / dl) / (lambda * P(term|collection))) from:")
                .with_detail(Explanation::new(lambda, "lambda, collection model weight"))
                .with_detail(Explanation::new(tf, "freq, occurrences of term within document"))
                .with_detail(Explanation::new(dl, "dl, length of field"))
                .with_detail(Explanation::new(collection_prob, "P(term|collection), (ttf + 1) / (total tokens + 1)")),
        );
    }
    (value, factors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::{Config, FieldConfig};
    use crate::core::types::Document;
    use crate::index::index_writer::IndexWriter;
    use crate::query::ast::{BoolQuery, Query};
    use crate::query::matcher::Evaluator;

    const SIMILARITIES: [Similarity; 3] = [
        Similarity::TfIdf,
        Similarity::Bm25 { k1: 1.2, b: 0.75 },
        Similarity::LmJelinekMercer { lambda: 0.7 },
    ];

    fn index(texts: &[&str]) -> InvertedIndex {
        let config = Config::default().with_field("f", FieldConfig::whitespace());
        let mut writer = IndexWriter::new(config).unwrap();
        for text in texts {
            writer.add_document(Document::new().with_field("f", *text));
        }
        writer.commit().unwrap().0
    }

    fn term_score(index: &InvertedIndex, similarity: Similarity, term: &str, doc: u32) -> f32 {
        let matches = Evaluator::new(index).evaluate(&Query::term("f", term));
        Scorer::new(index, similarity).score(DocId(doc), &matches[&DocId(doc)])
    }

    #[test]
    fn tf_idf_matches_hand_computation() {
        let index = index(&["a a b c", "b", "c"]);
        // N = 3, df = 1, tf = 2, dl = 4
        let expected = 2.0f32.sqrt() * (1.0 + (3.0f32 / 2.0).ln()) * 0.5;
        let score = term_score(&index, Similarity::TfIdf, "a", 0);
        assert!((score - expected).abs() < 1e-6);
    }

    #[test]
    fn bm25_matches_hand_computation() {
        let index = index(&["a a b c", "b", "c"]);
        // N = 3, df = 1, tf = 2, dl = 4, avgdl = 2
        let idf = (1.0f32 + 2.5 / 1.5).ln();
        let tf_norm = 2.0 * 2.2 / (2.0 + 1.2 * (0.25 + 0.75 * 2.0));
        let score = term_score(&index, Similarity::Bm25 { k1: 1.2, b: 0.75 }, "a", 0);
        assert!((score - idf * tf_norm).abs() < 1e-6);
    }

    #[test]
    fn lm_matches_hand_computation() {
        let index = index(&["a a b c", "b", "c"]);
        // tf / dl = 0.5, (ttf + 1) / (total + 1) = 3 / 7
        let expected = (1.0f32 + (0.3 * 0.5) / (0.7 * 3.0 / 7.0)).ln();
        let score = term_score(&index, Similarity::LmJelinekMercer { lambda: 0.7 }, "a", 0);
        assert!((score - expected).abs() < 1e-6);
    }

    #[test]
    fn bm25_is_monotonic_in_term_frequency_and_k1() {
        // Every document has the same length, so dl = avgdl
        let index = index(&["a x x x", "a a x x", "a a a x", "y y y y"]);
        let similarity = Similarity::Bm25 { k1: 1.2, b: 0.75 };
        let by_tf: Vec<f32> = (0..3).map(|doc| term_score(&index, similarity, "a", doc)).collect();
        assert!(by_tf.windows(2).all(|w| w[0] <= w[1]));

        let mut previous = 0.0;
        for k1 in [0.5, 1.0, 1.2, 2.0, 4.0] {
            let score = term_score(&index, Similarity::Bm25 { k1, b: 0.75 }, "a", 1);
            assert!(score >= previous, "k1 {} lowered the score", k1);
            previous = score;
        }
    }

    #[test]
    fn explain_reproduces_score_for_every_similarity() {
        let index = index(&["data scientist data", "scientist", "data data scientist x"]);
        let query: Query = BoolQuery::new()
            .with_should(Query::term("f", "data").boosted(2.0))
            .with_should(Query::phrase("f", ["data", "scientist"]))
            .with_should(Query::MatchAll)
            .into();
        let matches = Evaluator::new(&index).evaluate(&query);

        for similarity in SIMILARITIES {
            let scorer = Scorer::new(&index, similarity);
            for (doc_id, features) in &matches {
                let score = scorer.score(*doc_id, features);
                let explanation = scorer.explain(*doc_id, features);
                assert_eq!(score, explanation.value);
                assert_eq!(explanation.details.len(), features.features.len());
            }
        }
    }

    #[test]
    fn boost_scales_contribution() {
        let index = index(&["a b", "b"]);
        let matches = Evaluator::new(&index).evaluate(&Query::term("f", "a").boosted(3.0));
        let boosted = Scorer::new(&index, Similarity::TfIdf).score(DocId(0), &matches[&DocId(0)]);
        let plain = term_score(&index, Similarity::TfIdf, "a", 0);
        assert!((boosted - 3.0 * plain).abs() < 1e-6);
    }
}
