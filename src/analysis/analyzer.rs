use std::collections::BTreeSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::filters::lowercase::LowercaseFilter;
use crate::analysis::filters::stopword::StopWordFilter;
use crate::analysis::token::Token;
use crate::analysis::tokenizer::{KeywordTokenizer, StandardTokenizer, Tokenizer, WhitespaceTokenizer};
use crate::core::config::{AnalyzerKind, FieldConfig};

/// Text analysis pipeline
///
/// Positions in the output are dense over the tokens that survive every
/// filter: a removed stop word leaves no gap. Phrase adjacency is therefore
/// measured in surviving-token space, so `"ingegneria dei dati"` with `dei`
/// as a stop word indexes `ingegneria` and `dati` as adjacent.
pub struct Analyzer {
    pub tokenizer: Box<dyn Tokenizer>,
    pub filters: Vec<Box<dyn TokenFilter>>,
    pub name: String,
}

impl Analyzer {
    pub fn new(name: String, tokenizer: Box<dyn Tokenizer>) -> Self {
        Analyzer {
            tokenizer,
            filters: Vec::new(),
            name,
        }
    }

    pub fn add_filter(mut self, filter: Box<dyn TokenFilter>) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = self.tokenizer.tokenize(text);

        for filter in &self.filters {
            tokens = filter.filter(tokens);
        }

        for (position, token) in tokens.iter_mut().enumerate() {
            token.position = position as u32;
        }

        tokens
    }

    /// Token texts only, in order
    pub fn terms(&self, text: &str) -> Vec<String> {
        self.analyze(text).into_iter().map(|t| t.text).collect()
    }

    /// Whitespace splitting; case preserved unless `lowercase` is set
    pub fn whitespace(lowercase: bool, max_token_length: usize) -> Self {
        let tokenizer = WhitespaceTokenizer { max_token_length };
        let analyzer = Analyzer::new("whitespace".to_string(), Box::new(tokenizer));
        if lowercase {
            analyzer.add_filter(Box::new(LowercaseFilter))
        } else {
            analyzer
        }
    }

    /// Unicode word boundaries, lowercased, optional stop words
    pub fn standard(stop_words: &BTreeSet<String>, max_token_length: usize) -> Self {
        let tokenizer = StandardTokenizer {
            lowercase: true,
            max_token_length,
        };
        let analyzer = Analyzer::new("standard".to_string(), Box::new(tokenizer));
        let filter = StopWordFilter::new(stop_words);
        if filter.is_empty() {
            analyzer
        } else {
            analyzer.add_filter(Box::new(filter))
        }
    }

    pub fn keyword() -> Self {
        Analyzer::new("keyword".to_string(), Box::new(KeywordTokenizer))
    }

    pub fn from_config(config: &FieldConfig) -> Self {
        match config.analyzer {
            AnalyzerKind::WhitespaceOnly => {
                let analyzer = Analyzer::whitespace(config.lowercase, config.max_token_length);
                if config.stopwords.is_empty() {
                    analyzer
                } else {
                    analyzer.add_filter(Box::new(StopWordFilter::new(&config.stopwords)))
                }
            }
            AnalyzerKind::StandardWithStopwords => {
                Analyzer::standard(&config.stopwords, config.max_token_length)
            }
            AnalyzerKind::Keyword => Analyzer::keyword(),
        }
    }
}
