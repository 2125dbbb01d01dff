use crate::error::Result;
use crate::tokenizer::fold;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// Token that terminates a stop-word resource. Anything after it is ignored.
pub const SENTINEL: &str = "__END__";

const BUNDLED_ENGLISH: &str = include_str!("../resources/stopwords.txt");

/// Folded, sorted word list read up to [`SENTINEL`]; membership is a binary search.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StopwordSet {
    // sorted, deduplicated
    words: Vec<String>,
}

impl StopwordSet {
    /// The English list compiled into the crate.
    pub fn english() -> Self {
        Self::parse(BUNDLED_ENGLISH)
    }

    /// Parse a resource: whitespace-delimited tokens up to [`SENTINEL`].
    pub fn parse(text: &str) -> Self {
        Self::from_words(text.split_whitespace().take_while(|t| *t != SENTINEL))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut text = String::new();
        BufReader::new(reader).read_to_string(&mut text)?;
        Ok(Self::parse(&text))
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let f = File::open(path.as_ref())?;
        let set = Self::from_reader(f)?;
        tracing::debug!(path = %path.as_ref().display(), words = set.len(), "loaded stop words");
        Ok(set)
    }

    pub fn from_words<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut words: Vec<String> = words.into_iter().map(|w| fold(w.as_ref())).collect();
        words.sort_unstable();
        words.dedup();
        Self { words }
    }

    /// Exact, case-insensitive membership.
    pub fn contains(&self, token: &str) -> bool {
        self.contains_folded(&fold(token))
    }

    /// Membership for a token that is already folded.
    pub fn contains_folded(&self, folded: &str) -> bool {
        self.words
            .binary_search_by(|w| w.as_str().cmp(folded))
            .is_ok()
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.words.iter().map(String::as_str)
    }
}
