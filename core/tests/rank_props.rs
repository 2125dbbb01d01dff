use proptest::collection::vec as prop_vec;
use proptest::prelude::*;
use wikidex_core::{Index, InvertedIndex};

const TERMS: [&str; 4] = ["alpha", "beta", "gamma", "delta"];

fn build(postings: &[(u32, usize)], docs: u32) -> InvertedIndex {
    let mut idx = InvertedIndex::new();
    for i in 0..docs {
        idx.add_document(&format!("doc{i}"), "a", "t");
    }
    for &(doc, term) in postings {
        idx.add_word_for_document(doc % docs, TERMS[term]).unwrap();
    }
    idx
}

fn index_strategy() -> impl Strategy<Value = (InvertedIndex, Vec<&'static str>)> {
    let postings = prop_vec((0u32..64, 0usize..4), 0..80);
    (1u32..12, postings, prop_vec(0usize..4, 1..4)).prop_map(|(docs, postings, query)| {
        (build(&postings, docs), query.into_iter().map(|t| TERMS[t]).collect())
    })
}

proptest! {
    #![proptest_config(ProptestConfig { cases: 64, .. ProptestConfig::default() })]

    #[test]
    fn comparator_is_a_strict_weak_order((idx, query) in index_strategy()) {
        let n = idx.num_docs() as u32;
        for a in 0..n {
            prop_assert!(!idx.sort_comparator(a, a, &query));
            for b in 0..n {
                let ab = idx.sort_comparator(a, b, &query);
                let ba = idx.sort_comparator(b, a, &query);
                prop_assert!(!(ab && ba));
                if a != b {
                    // ids break ties, so distinct documents are always ordered
                    prop_assert!(ab || ba);
                }
                for c in 0..n {
                    if ab && idx.sort_comparator(b, c, &query) {
                        prop_assert!(idx.sort_comparator(a, c, &query));
                    }
                }
            }
        }
    }

    #[test]
    fn sorting_is_reproducible((idx, query) in index_strategy()) {
        let n = idx.num_docs() as u32;
        let mut forward: Vec<u32> = (0..n).collect();
        let mut backward: Vec<u32> = (0..n).rev().collect();
        forward.sort_by(|a, b| idx.compare_relevance(*a, *b, &query));
        backward.sort_by(|a, b| idx.compare_relevance(*a, *b, &query));
        prop_assert_eq!(&forward, &backward);

        let ranked = idx.rank(&query);
        let matching: Vec<u32> =
            forward.into_iter().filter(|&d| idx.relevance(d, &query) > 0).collect();
        prop_assert_eq!(ranked, matching);
    }
}
