use std::collections::HashSet;
use crate::analysis::filter::TokenFilter;
use crate::analysis::token::Token;

/// Removes stop words. Matching ignores case, so the filter can run before
/// or after lowercasing.
pub struct StopWordFilter {
    pub stop_words: HashSet<String>,
}

impl StopWordFilter {
    pub fn new<I, S>(stop_words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        StopWordFilter {
            stop_words: stop_words.into_iter().map(|w| w.as_ref().to_lowercase()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.stop_words.is_empty()
    }
}

impl TokenFilter for StopWordFilter {
    fn filter(&self, tokens: Vec<Token>) -> Vec<Token> {
        tokens.into_iter()
            .filter(|token| !self.stop_words.contains(&token.text.to_lowercase()))
            .collect()
    }

    fn name(&self) -> &str {
        "stop_words"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_listed_words_ignoring_case() {
        let filter = StopWordFilter::new(["in", "DEI", "di"]);
        let tokens = vec![
            Token::new("Ingegneria".to_string(), 0, 0),
            Token::new("dei".to_string(), 1, 11),
            Token::new("Dati".to_string(), 2, 15),
        ];
        let kept: Vec<String> = filter.filter(tokens).into_iter().map(|t| t.text).collect();
        assert_eq!(kept, vec!["Ingegneria", "Dati"]);
    }
}
