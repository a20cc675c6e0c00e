use std::fmt;
use serde::{Serialize, Deserialize};

/// Deepest query tree the evaluator accepts; a leaf has depth 1
pub const MAX_QUERY_DEPTH: usize = 256;

/// Main query enum representing all query types
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Query {
    Term(TermQuery),         // Single term search
    Phrase(PhraseQuery),     // Exact phrase match
    Bool(BoolQuery),         // Boolean combinations
    MatchAll,                // Match all documents
}

/// Single term query. The term is matched verbatim, without analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermQuery {
    pub field: String,
    pub value: String,
    pub boost: Option<f32>,
}

/// Phrase query: terms must occur at consecutive positions, in order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhraseQuery {
    pub field: String,
    pub phrase: Vec<String>,
    pub boost: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Occur {
    Must,     // Required, contributes to score
    Should,   // Optional, contributes to score
    MustNot,  // Forbidden
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BooleanClause {
    pub query: Query,
    pub occur: Occur,
}

/// Boolean query over ordered clauses.
///
/// A query with no MUST and no SHOULD clause matches nothing, even when it
/// has MUST_NOT clauses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoolQuery {
    pub clauses: Vec<BooleanClause>,
    pub boost: Option<f32>,
}

impl Query {
    pub fn term(field: &str, value: &str) -> Self {
        Query::Term(TermQuery {
            field: field.to_string(),
            value: value.to_string(),
            boost: None,
        })
    }

    pub fn phrase<I, S>(field: &str, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Query::Phrase(PhraseQuery {
            field: field.to_string(),
            phrase: terms.into_iter().map(Into::into).collect(),
            boost: None,
        })
    }

    /// Multiply this node's boost by `factor`
    pub fn boosted(self, factor: f32) -> Self {
        fn combine(boost: Option<f32>, factor: f32) -> Option<f32> {
            Some(boost.unwrap_or(1.0) * factor)
        }
        match self {
            Query::Term(mut q) => {
                q.boost = combine(q.boost, factor);
                Query::Term(q)
            }
            Query::Phrase(mut q) => {
                q.boost = combine(q.boost, factor);
                Query::Phrase(q)
            }
            Query::Bool(mut q) => {
                q.boost = combine(q.boost, factor);
                Query::Bool(q)
            }
            // Match-all scores a constant; boost it through a wrapper
            Query::MatchAll => Query::Bool(BoolQuery {
                clauses: vec![BooleanClause { query: Query::MatchAll, occur: Occur::Must }],
                boost: Some(factor),
            }),
        }
    }

    /// Number of nodes on the longest root-to-leaf path.
    /// Walks the tree with an explicit stack so any depth can be measured.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut pending = vec![(self, 1usize)];
        while let Some((query, level)) = pending.pop() {
            deepest = deepest.max(level);
            if let Query::Bool(q) = query {
                pending.extend(q.clauses.iter().map(|c| (&c.query, level + 1)));
            }
        }
        deepest
    }

    pub fn boost(&self) -> f32 {
        match self {
            Query::Term(q) => q.boost.unwrap_or(1.0),
            Query::Phrase(q) => q.boost.unwrap_or(1.0),
            Query::Bool(q) => q.boost.unwrap_or(1.0),
            Query::MatchAll => 1.0,
        }
    }
}

impl BoolQuery {
    pub fn new() -> Self {
        BoolQuery {
            clauses: Vec::new(),
            boost: None,
        }
    }

    pub fn add(&mut self, query: Query, occur: Occur) {
        self.clauses.push(BooleanClause { query, occur });
    }

    pub fn with_must(mut self, query: Query) -> Self {
        self.add(query, Occur::Must);
        self
    }

    pub fn with_should(mut self, query: Query) -> Self {
        self.add(query, Occur::Should);
        self
    }

    pub fn with_must_not(mut self, query: Query) -> Self {
        self.add(query, Occur::MustNot);
        self
    }

    pub fn clauses(&self, occur: Occur) -> impl Iterator<Item = &Query> {
        self.clauses
            .iter()
            .filter(move |c| c.occur == occur)
            .map(|c| &c.query)
    }

    pub fn has_positive_clause(&self) -> bool {
        self.clauses.iter().any(|c| c.occur != Occur::MustNot)
    }
}

impl Default for BoolQuery {
    fn default() -> Self {
        Self::new()
    }
}

impl From<BoolQuery> for Query {
    fn from(query: BoolQuery) -> Self {
        Query::Bool(query)
    }
}

fn write_boost(f: &mut fmt::Formatter, boost: Option<f32>) -> fmt::Result {
    match boost {
        Some(b) if b != 1.0 => write!(f, "^{}", b),
        _ => Ok(()),
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Query::Term(q) => {
                write!(f, "{}:{}", q.field, q.value)?;
                write_boost(f, q.boost)
            }
            Query::Phrase(q) => {
                write!(f, "{}:\"{}\"", q.field, q.phrase.join(" "))?;
                write_boost(f, q.boost)
            }
            Query::Bool(q) => {
                let nested = q.boost.is_some();
                if nested {
                    write!(f, "(")?;
                }
                for (i, clause) in q.clauses.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    match clause.occur {
                        Occur::Must => write!(f, "+")?,
                        Occur::MustNot => write!(f, "-")?,
                        Occur::Should => {}
                    }
                    match &clause.query {
                        Query::Bool(inner) if inner.boost.is_none() => write!(f, "({})", clause.query)?,
                        other => write!(f, "{}", other)?,
                    }
                }
                if nested {
                    write!(f, ")")?;
                }
                write_boost(f, q.boost)
            }
            Query::MatchAll => write!(f, "*:*"),
        }
    }
}
