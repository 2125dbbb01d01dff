use crate::stopwords::StopwordSet;
use rust_stemmers::{Algorithm, Stemmer};
use unicode_normalization::UnicodeNormalization;

/// Characters that mark a token as leftover markup or punctuation.
const NOISE_CHARS: &[char] = &[
    '<', '>', '=', '-', '.', ';', ':', '(', ')', '/', '[', ']', ',', '|', '\'', '"', '{', '}',
];

/// Pluggable stemmer. Must be deterministic and stateless.
pub trait Stem: Send + Sync {
    fn stem(&self, token: &str) -> String;
}

/// Snowball English (Porter2) stemmer.
pub struct SnowballStemmer {
    inner: Stemmer,
}

impl SnowballStemmer {
    pub fn english() -> Self {
        Self { inner: Stemmer::create(Algorithm::English) }
    }
}

impl Default for SnowballStemmer {
    fn default() -> Self {
        Self::english()
    }
}

impl Stem for SnowballStemmer {
    fn stem(&self, token: &str) -> String {
        self.inner.stem(token).into_owned()
    }
}

/// Outcome of normalizing one raw token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Normalized {
    Term(String),
    Noise,
    Stopword,
}

impl Normalized {
    pub fn term(&self) -> Option<&str> {
        match self {
            Normalized::Term(t) => Some(t),
            _ => None,
        }
    }
}

/// NFKC normalization followed by a full lower-case fold.
pub fn fold(token: &str) -> String {
    token.nfkc().collect::<String>().to_lowercase()
}

pub fn is_structural_noise(token: &str) -> bool {
    token.contains(NOISE_CHARS)
}

/// Split raw text into whitespace-delimited tokens.
pub fn tokenize(text: &str) -> impl Iterator<Item = &str> {
    text.split_whitespace()
}

/// Maps raw tokens to index terms: fold, drop noise, drop stop words, stem.
pub struct Normalizer<S: Stem = SnowballStemmer> {
    stopwords: StopwordSet,
    stemmer: S,
}

impl Normalizer<SnowballStemmer> {
    pub fn english(stopwords: StopwordSet) -> Self {
        Self::new(stopwords, SnowballStemmer::english())
    }
}

impl<S: Stem> Normalizer<S> {
    pub fn new(stopwords: StopwordSet, stemmer: S) -> Self {
        Self { stopwords, stemmer }
    }

    pub fn stopwords(&self) -> &StopwordSet {
        &self.stopwords
    }

    pub fn normalize(&self, raw: &str) -> Normalized {
        let folded = fold(raw);
        if folded.is_empty() || is_structural_noise(&folded) {
            return Normalized::Noise;
        }
        if self.stopwords.contains_folded(&folded) {
            return Normalized::Stopword;
        }
        let stem = self.stemmer.stem(&folded);
        // a stem can collapse onto a stop word ("others" -> "other")
        if stem.is_empty() || self.stopwords.contains_folded(&stem) {
            return Normalized::Stopword;
        }
        Normalized::Term(stem)
    }

    /// Accepted terms of `text`, in order of occurrence.
    pub fn terms<'a>(&'a self, text: &'a str) -> impl Iterator<Item = String> + 'a {
        tokenize(text).filter_map(move |raw| match self.normalize(raw) {
            Normalized::Term(t) => Some(t),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::english(StopwordSet::english())
    }

    #[test]
    fn stems_and_folds() {
        let n = normalizer();
        assert_eq!(n.normalize("Cats"), Normalized::Term("cat".into()));
        assert_eq!(n.normalize("RUNNING"), Normalized::Term("run".into()));
    }

    #[test]
    fn rejects_markup_fragments() {
        let n = normalizer();
        let fragments =
            ["<page>", "animals.", "[[link]]", "a|b", "x=y", "{{cite", "it's", "\"quoted\""];
        for raw in fragments {
            assert_eq!(n.normalize(raw), Normalized::Noise, "{raw}");
        }
    }

    #[test]
    fn rejects_stop_words_in_any_case() {
        let n = normalizer();
        assert_eq!(n.normalize("The"), Normalized::Stopword);
        assert_eq!(n.normalize("ARE"), Normalized::Stopword);
    }

    #[test]
    fn rejects_stems_that_are_stop_words() {
        let n = Normalizer::english(StopwordSet::from_words(["cat"]));
        assert_eq!(n.normalize("cats"), Normalized::Stopword);
    }

    #[test]
    fn terms_skip_rejected_tokens() {
        let n = normalizer();
        let terms: Vec<String> = n.terms("Cats are animals. Cats run.").collect();
        assert_eq!(terms, vec!["cat", "cat"]);
    }
}
