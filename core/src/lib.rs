//! Inverted index over a MediaWiki-style XML dump.

pub mod audit;
pub mod corpus;
pub mod error;
pub mod index;
pub mod ingest;
pub mod persist;
pub mod rank;
pub mod stopwords;
pub mod tokenizer;

pub use error::{IndexError, Result};
pub use index::*;
