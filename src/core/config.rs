use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use serde::{Serialize, Deserialize};
use crate::core::error::{Error, ErrorKind, Result};
use crate::scoring::scorer::Similarity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SimilarityKind {
    TfIdf,
    Bm25,
    Lm,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Bm25Params {
    pub k1: f32,  // Term frequency saturation
    pub b: f32,   // Length normalization strength
}

impl Default for Bm25Params {
    fn default() -> Self {
        Bm25Params { k1: 1.2, b: 0.75 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LmParams {
    pub lambda: f32,  // Weight of the collection model
}

impl Default for LmParams {
    fn default() -> Self {
        LmParams { lambda: 0.7 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalyzerKind {
    WhitespaceOnly,
    StandardWithStopwords,
    Keyword,
}

/// Per-field analysis and storage options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldConfig {
    pub analyzer: AnalyzerKind,
    pub stopwords: BTreeSet<String>,
    pub lowercase: bool,          // WhitespaceOnly only; StandardWithStopwords always lowercases
    pub max_token_length: usize,  // Longer tokens are dropped; Keyword fields keep the whole value
    pub stored: bool,
}

impl Default for FieldConfig {
    fn default() -> Self {
        FieldConfig::standard()
    }
}

impl FieldConfig {
    pub fn standard() -> Self {
        FieldConfig {
            analyzer: AnalyzerKind::StandardWithStopwords,
            stopwords: BTreeSet::new(),
            lowercase: false,
            max_token_length: 255,
            stored: true,
        }
    }

    pub fn whitespace() -> Self {
        FieldConfig {
            analyzer: AnalyzerKind::WhitespaceOnly,
            ..FieldConfig::standard()
        }
    }

    pub fn keyword() -> Self {
        FieldConfig {
            analyzer: AnalyzerKind::Keyword,
            ..FieldConfig::standard()
        }
    }

    pub fn with_stopwords<I, S>(mut self, words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stopwords = words.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_lowercase(mut self, lowercase: bool) -> Self {
        self.lowercase = lowercase;
        self
    }

    pub fn with_stored(mut self, stored: bool) -> Self {
        self.stored = stored;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub similarity: SimilarityKind,
    pub bm25: Bm25Params,
    pub lm: LmParams,
    pub fields: BTreeMap<String, FieldConfig>,
    pub default_field: FieldConfig,  // Used for fields not listed in `fields`
    pub top_k: usize,
    pub workers: usize,              // Threads for the analyze phase
}

impl Default for Config {
    fn default() -> Self {
        Config {
            similarity: SimilarityKind::Bm25,
            bm25: Bm25Params::default(),
            lm: LmParams::default(),
            fields: BTreeMap::new(),
            default_field: FieldConfig::standard(),
            top_k: 10,
            workers: num_cpus::get(),
        }
    }
}

impl Config {
    pub fn with_field(mut self, name: &str, field: FieldConfig) -> Self {
        self.fields.insert(name.to_string(), field);
        self
    }

    pub fn with_similarity(mut self, similarity: SimilarityKind) -> Self {
        self.similarity = similarity;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Config = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.bm25.k1 >= 0.0) {
            return Err(invalid(format!("bm25.k1 must be >= 0, got {}", self.bm25.k1)));
        }
        if !(0.0..=1.0).contains(&self.bm25.b) {
            return Err(invalid(format!("bm25.b must be in [0, 1], got {}", self.bm25.b)));
        }
        if !(self.lm.lambda > 0.0 && self.lm.lambda <= 1.0) {
            return Err(invalid(format!("lm.lambda must be in (0, 1], got {}", self.lm.lambda)));
        }
        if self.top_k == 0 {
            return Err(invalid("top_k must be at least 1".to_string()));
        }
        if self.workers == 0 {
            return Err(invalid("workers must be at least 1".to_string()));
        }
        for (name, field) in self.fields.iter().map(|(n, f)| (n.as_str(), f))
            .chain(std::iter::once(("<default>", &self.default_field)))
        {
            if name.is_empty() {
                return Err(invalid("field names must not be empty".to_string()));
            }
            if field.max_token_length == 0 {
                return Err(invalid(format!("field '{}': max_token_length must be at least 1", name)));
            }
        }
        Ok(())
    }

    /// Resolve the configured similarity into its scoring variant
    pub fn similarity(&self) -> Similarity {
        match self.similarity {
            SimilarityKind::TfIdf => Similarity::TfIdf,
            SimilarityKind::Bm25 => Similarity::Bm25 { k1: self.bm25.k1, b: self.bm25.b },
            SimilarityKind::Lm => Similarity::LmJelinekMercer { lambda: self.lm.lambda },
        }
    }

    pub fn field_config(&self, name: &str) -> &FieldConfig {
        self.fields.get(name).unwrap_or(&self.default_field)
    }
}

fn invalid(context: String) -> Error {
    Error::new(ErrorKind::InvalidArgument, context)
}
