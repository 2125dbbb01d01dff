use crate::index::{DocId, InvertedIndex};
use std::cmp::Ordering;
use std::collections::HashMap;

impl InvertedIndex {
    /// Sum over the query terms of their occurrences in document `id`.
    pub fn relevance(&self, id: DocId, query: &[&str]) -> u64 {
        query.iter().map(|t| self.term_frequency(t, id) as u64).sum()
    }

    /// `Less` when `a` ranks before `b`.
    pub fn compare_relevance(&self, a: DocId, b: DocId, query: &[&str]) -> Ordering {
        by_score_then_id((a, self.relevance(a, query)), (b, self.relevance(b, query)))
    }

    /// Every document containing at least one query term, best first.
    pub fn rank(&self, query: &[&str]) -> Vec<DocId> {
        let mut scores: HashMap<DocId, u64> = HashMap::new();
        // repeated query terms count once per repetition, as in `relevance`
        for term in query {
            if let Some(plist) = self.postings_for(term) {
                for p in plist.postings() {
                    *scores.entry(p.doc_id).or_insert(0) += p.occurrences as u64;
                }
            }
        }
        let mut scored: Vec<(DocId, u64)> = scores.into_iter().collect();
        scored.sort_by(|a, b| by_score_then_id(*a, *b));
        scored.into_iter().map(|(id, _)| id).collect()
    }
}

fn by_score_then_id(a: (DocId, u64), b: (DocId, u64)) -> Ordering {
    b.1.cmp(&a.1).then(a.0.cmp(&b.0))
}
