use once_cell::sync::Lazy;
use std::collections::HashSet;

/// Words that never make useful search terms for a venue query.
static STOP_WORDS: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["the", "and", "near", "me", "open", "now"]));

pub fn is_stop_word(word: &str) -> bool {
    STOP_WORDS.contains(word)
}

/// A character filter receives the original text and can transform it by adding,
/// removing, or changing characters before tokenization.
pub trait CharacterFilter: Send + Sync {
    fn filter(&self, text: String) -> String;
}

pub struct LowerCaseFilter;

impl CharacterFilter for LowerCaseFilter {
    fn filter(&self, text: String) -> String {
        text.to_lowercase()
    }
}

/// Replaces everything that is not an ASCII letter, digit or whitespace with a space.
/// Runs after lower-casing, so only `[a-z0-9]` survives.
pub struct NonAlphanumericFilter;

impl CharacterFilter for NonAlphanumericFilter {
    fn filter(&self, text: String) -> String {
        text.chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c.is_whitespace() {
                    c
                } else {
                    ' '
                }
            })
            .collect()
    }
}

/// A tokenizer breaks a stream of characters into individual tokens.
pub trait Tokenizer: Send + Sync {
    fn tokenize(&self, text: String) -> Vec<String>;
}

pub struct WhiteSpaceTokenizer;

impl Tokenizer for WhiteSpaceTokenizer {
    fn tokenize(&self, text: String) -> Vec<String> {
        text.split_whitespace()
            .map(|w| w.to_string())
            .collect::<Vec<String>>()
    }
}

/// A token filter receives the token stream and may add, remove, or change tokens.
pub trait TokenFilter: Send + Sync {
    fn filter(&self, tokens: Vec<TextToken>) -> Vec<TextToken>;
}

pub struct StopWordTokenFilter;

impl TokenFilter for StopWordTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens.retain(|t| !is_stop_word(&t.term));
        tokens
    }
}

/// Drops tokens whose length is not strictly greater than `min_exclusive`.
pub struct ShortTokenFilter {
    min_exclusive: usize,
}

impl Default for ShortTokenFilter {
    fn default() -> Self {
        Self { min_exclusive: 2 }
    }
}

impl TokenFilter for ShortTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens.retain(|t| t.term.chars().count() > self.min_exclusive);
        tokens
    }
}

/// Keeps the first `limit` tokens.
pub struct TruncateTokenFilter {
    limit: usize,
}

impl TruncateTokenFilter {
    pub fn new(limit: usize) -> Self {
        Self { limit }
    }
}

impl TokenFilter for TruncateTokenFilter {
    fn filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        tokens.truncate(self.limit);
        tokens
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextToken {
    pub term: String,
    pub pos: usize,
}

impl std::ops::Deref for TextToken {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.term
    }
}

/// Pure text analysis pipeline: character filters, then a tokenizer, then token filters.
pub struct TextAnalyzer {
    char_filters: Vec<Box<dyn CharacterFilter>>,
    tokenizer: Box<dyn Tokenizer>,
    token_filters: Vec<Box<dyn TokenFilter>>,
}

impl TextAnalyzer {
    pub fn new(
        char_filters: Vec<Box<dyn CharacterFilter>>,
        tokenizer: Box<dyn Tokenizer>,
        token_filters: Vec<Box<dyn TokenFilter>>,
    ) -> Self {
        Self {
            char_filters,
            tokenizer,
            token_filters,
        }
    }

    /// The chain used for query keywords: lower-case, strip punctuation, split,
    /// drop stop-words and short tokens, keep at most `max_terms`.
    pub fn query_terms(max_terms: usize) -> Self {
        Self::new(
            vec![Box::new(LowerCaseFilter), Box::new(NonAlphanumericFilter)],
            Box::new(WhiteSpaceTokenizer),
            vec![
                Box::new(ShortTokenFilter::default()),
                Box::new(StopWordTokenFilter),
                Box::new(TruncateTokenFilter::new(max_terms)),
            ],
        )
    }

    pub fn char_filter(&self, mut content: String) -> String {
        for filter in self.char_filters.iter() {
            content = filter.filter(content);
        }
        content
    }

    pub fn tokenize(&self, content: String) -> Vec<TextToken> {
        self.tokenizer
            .tokenize(content)
            .into_iter()
            .enumerate()
            .map(|(pos, term)| TextToken { term, pos })
            .collect()
    }

    pub fn token_filter(&self, mut tokens: Vec<TextToken>) -> Vec<TextToken> {
        for filter in self.token_filters.iter() {
            tokens = filter.filter(tokens);
        }
        tokens
    }

    pub fn analyze(&self, raw_content: &str) -> Vec<TextToken> {
        let content = self.char_filter(raw_content.to_string());
        let tokens = self.tokenize(content);
        self.token_filter(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mk_tokens(terms: &[&str]) -> Vec<TextToken> {
        terms
            .iter()
            .enumerate()
            .map(|(pos, term)| TextToken {
                term: (*term).to_string(),
                pos,
            })
            .collect()
    }

    fn terms(tokens: Vec<TextToken>) -> Vec<String> {
        tokens.into_iter().map(|t| t.term).collect()
    }

    #[test]
    fn test_non_alphanumeric_filter() {
        let out = NonAlphanumericFilter.filter("café's best-pho! #1".to_string());
        assert_eq!(out, "caf  s best pho   1");
    }

    #[test]
    fn test_short_token_filter_drops_len_two_and_below() {
        let tokens = mk_tokens(&["a", "ab", "abc", "abcd"]);
        assert_eq!(terms(ShortTokenFilter::default().filter(tokens)), vec!["abc", "abcd"]);
    }

    #[test]
    fn test_stop_word_filter() {
        let tokens = mk_tokens(&["the", "best", "ramen", "near", "me", "open", "now", "and"]);
        assert_eq!(terms(StopWordTokenFilter.filter(tokens)), vec!["best", "ramen"]);
    }

    #[test]
    fn test_query_terms_chain_keeps_positions_from_tokenizer() {
        let analyzer = TextAnalyzer::query_terms(5);
        let tokens = analyzer.analyze("The Spicy ramen, near me");
        assert_eq!(
            tokens,
            vec![
                TextToken {
                    term: "spicy".into(),
                    pos: 1
                },
                TextToken {
                    term: "ramen".into(),
                    pos: 2
                },
            ]
        );
    }

    #[test]
    fn test_query_terms_chain_truncates() {
        let analyzer = TextAnalyzer::query_terms(5);
        let tokens = analyzer.analyze("one two three four five six seven eight");
        assert_eq!(terms(tokens), vec!["one", "two", "three", "four", "five"]);
    }
}
