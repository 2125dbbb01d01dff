use crate::error::{IndexError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

pub type TermId = u32;
pub type DocId = u32;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub id: DocId,
    pub title: String,
    pub author: String,
    pub timestamp: String,
}

/// Occurrences of one term in one document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Posting {
    pub doc_id: DocId,
    pub occurrences: u32,
}

/// Postings of a single term, one entry per document in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PostingList {
    postings: Vec<Posting>,
    slots: HashMap<DocId, usize>,
}

impl PostingList {
    pub(crate) fn from_postings(postings: Vec<Posting>) -> Self {
        let slots = postings.iter().enumerate().map(|(i, p)| (p.doc_id, i)).collect();
        Self { postings, slots }
    }

    fn record(&mut self, doc_id: DocId) {
        match self.slots.get(&doc_id) {
            Some(&slot) => self.postings[slot].occurrences += 1,
            None => {
                self.slots.insert(doc_id, self.postings.len());
                self.postings.push(Posting { doc_id, occurrences: 1 });
            }
        }
    }

    pub fn postings(&self) -> &[Posting] {
        &self.postings
    }

    pub fn occurrences(&self, doc_id: DocId) -> u32 {
        self.slots.get(&doc_id).map_or(0, |&slot| self.postings[slot].occurrences)
    }

    pub fn len(&self) -> usize {
        self.postings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }
}

/// The index contract: documents and postings are appended while building,
/// then the whole state can be persisted or replaced from a file.
pub trait Index {
    /// Register a document and return its dense id.
    fn add_document(&mut self, title: &str, author: &str, timestamp: &str) -> DocId;

    /// Record one occurrence of `term` in document `id`.
    /// Fails without touching postings when `id` was never assigned.
    fn add_word_for_document(&mut self, id: DocId, term: &str) -> Result<()>;

    /// Titles of every document containing `term`, once per document.
    fn documents_for_word(&self, term: &str) -> Vec<&str>;

    /// `true` when `a` ranks strictly before `b` for `query`.
    fn sort_comparator(&self, a: DocId, b: DocId, query: &[&str]) -> bool;

    fn write_to_file(&self, path: &Path) -> Result<()>;

    /// Replace the in-memory state with the index stored at `path`.
    fn read_from_file(&mut self, path: &Path) -> Result<()>;

    fn num_words(&self) -> usize;

    fn num_docs(&self) -> usize;

    /// `(author, timestamp)` of the first document titled `title`.
    fn author_and_time_for_doc_named(&self, title: &str) -> Option<(&str, &str)>;
}

#[derive(Debug, Default)]
pub struct InvertedIndex {
    docs: Vec<Document>,
    titles: HashMap<String, DocId>,
    dictionary: HashMap<String, TermId>,
    terms: Vec<String>,
    postings: Vec<PostingList>,
}

impl InvertedIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild an index from its stored parts, checking the id invariants.
    pub(crate) fn from_parts(
        docs: Vec<Document>,
        terms: Vec<(String, Vec<Posting>)>,
    ) -> Result<Self> {
        let mut index = InvertedIndex::new();
        for (pos, doc) in docs.into_iter().enumerate() {
            if doc.id as usize != pos {
                return Err(IndexError::Corrupt(format!(
                    "document {} stored at position {pos}",
                    doc.id
                )));
            }
            index.titles.entry(doc.title.clone()).or_insert(doc.id);
            index.docs.push(doc);
        }
        let num_docs = index.docs.len();
        for (term, plist) in terms {
            if plist.is_empty() {
                return Err(IndexError::Corrupt(format!("term {term:?} has no postings")));
            }
            let invalid =
                plist.iter().find(|p| p.doc_id as usize >= num_docs || p.occurrences == 0);
            if let Some(p) = invalid {
                return Err(IndexError::Corrupt(format!(
                    "term {term:?} has invalid posting {p:?}"
                )));
            }
            let tid = index.terms.len() as TermId;
            if index.dictionary.insert(term.clone(), tid).is_some() {
                return Err(IndexError::Corrupt(format!("term {term:?} stored twice")));
            }
            index.terms.push(term);
            index.postings.push(PostingList::from_postings(plist));
        }
        Ok(index)
    }

    pub fn document(&self, id: DocId) -> Option<&Document> {
        self.docs.get(id as usize)
    }

    pub fn documents(&self) -> &[Document] {
        &self.docs
    }

    /// Terms with their postings, in first-seen order.
    pub fn terms(&self) -> impl Iterator<Item = (&str, &PostingList)> + '_ {
        self.terms.iter().map(String::as_str).zip(self.postings.iter())
    }

    pub fn postings_for(&self, term: &str) -> Option<&PostingList> {
        self.dictionary.get(term).map(|&tid| &self.postings[tid as usize])
    }

    pub fn term_frequency(&self, term: &str, id: DocId) -> u32 {
        self.postings_for(term).map_or(0, |p| p.occurrences(id))
    }

    pub fn document_named(&self, title: &str) -> Option<&Document> {
        self.titles.get(title).and_then(|&id| self.document(id))
    }
}

impl Index for InvertedIndex {
    fn add_document(&mut self, title: &str, author: &str, timestamp: &str) -> DocId {
        let id = self.docs.len() as DocId;
        self.titles.entry(title.to_string()).or_insert(id);
        self.docs.push(Document {
            id,
            title: title.to_string(),
            author: author.to_string(),
            timestamp: timestamp.to_string(),
        });
        id
    }

    fn add_word_for_document(&mut self, id: DocId, term: &str) -> Result<()> {
        if id as usize >= self.docs.len() {
            return Err(IndexError::UnknownDocument(id));
        }
        let tid = match self.dictionary.get(term) {
            Some(&tid) => tid,
            None => {
                let tid = self.terms.len() as TermId;
                self.dictionary.insert(term.to_string(), tid);
                self.terms.push(term.to_string());
                self.postings.push(PostingList::default());
                tid
            }
        };
        self.postings[tid as usize].record(id);
        Ok(())
    }

    fn documents_for_word(&self, term: &str) -> Vec<&str> {
        self.postings_for(term)
            .map(|plist| {
                plist
                    .postings()
                    .iter()
                    .filter_map(|p| self.document(p.doc_id))
                    .map(|d| d.title.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn sort_comparator(&self, a: DocId, b: DocId, query: &[&str]) -> bool {
        self.compare_relevance(a, b, query).is_lt()
    }

    fn write_to_file(&self, path: &Path) -> Result<()> {
        crate::persist::save_index(path, self)
    }

    fn read_from_file(&mut self, path: &Path) -> Result<()> {
        *self = crate::persist::load_index(path)?;
        Ok(())
    }

    fn num_words(&self) -> usize {
        self.terms.len()
    }

    fn num_docs(&self) -> usize {
        self.docs.len()
    }

    fn author_and_time_for_doc_named(&self, title: &str) -> Option<(&str, &str)> {
        self.document_named(title).map(|d| (d.author.as_str(), d.timestamp.as_str()))
    }
}
