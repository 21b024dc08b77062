use serde::Serialize;

use crate::analyzer::{
    CharacterFilter, LowerCaseFilter, NonAlphanumericFilter, TextAnalyzer, Tokenizer,
    WhiteSpaceTokenizer,
};

pub const MAX_INTENT_TERMS: usize = 5;

/// Heuristic signals derived from the free-text query. Never persisted.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct IntentSignals {
    pub vegan: bool,
    pub vegetarian: bool,
    pub open_now: bool,
    pub terms: Vec<String>,
}

impl IntentSignals {
    pub fn is_empty(&self) -> bool {
        !self.vegan && !self.vegetarian && !self.open_now && self.terms.is_empty()
    }
}

pub struct IntentExtractor {
    terms: TextAnalyzer,
}

impl Default for IntentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl IntentExtractor {
    pub fn new() -> Self {
        Self {
            terms: TextAnalyzer::query_terms(MAX_INTENT_TERMS),
        }
    }

    pub fn extract(&self, text: Option<&str>) -> IntentSignals {
        let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
            return IntentSignals::default();
        };

        // Flags look at word boundaries on the lower-cased text, so "vegan-friendly"
        // still counts as "vegan".
        let lowered = NonAlphanumericFilter.filter(LowerCaseFilter.filter(text.to_string()));
        let words = WhiteSpaceTokenizer.tokenize(lowered);

        IntentSignals {
            vegan: words.iter().any(|w| w == "vegan"),
            vegetarian: words
                .iter()
                .any(|w| w.starts_with("vegetarian") || w.ends_with("veggie")),
            open_now: words.iter().any(|w| w.ends_with("open")),
            terms: self
                .terms
                .analyze(text)
                .into_iter()
                .map(|t| t.term)
                .collect(),
        }
    }
}
