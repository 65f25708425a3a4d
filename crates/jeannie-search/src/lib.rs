//! Indexing and query engine for the jeannie content catalog.
//!
//! A loaded catalog becomes an immutable [`Generation`]: the items plus
//! token, attribute, genre and strum indices built in one pass. Queries
//! compose attribute [`Filters`] by set intersection, then rank candidates
//! by exact tokens, fuzzy edit distance, or genre suitability blended with
//! quality. [`SearchEngine`] owns the active generation and replaces it
//! atomically on reload.

#![deny(unsafe_code)]
#![warn(missing_debug_implementations)]

pub mod config;
pub mod engine;
pub mod filter;
pub mod generation;
pub mod index;
pub mod query;
pub mod ranking;

pub use config::Config;
pub use engine::{CatalogSource, EngineStatus, LoadState, LoadSummary, SearchEngine};
pub use filter::{apply_filters, Filters, DEFAULT_MIN_GENRE_SCORE};
pub use generation::{EngineStats, Generation, ListPage, Page, SearchPage, DEFAULT_LIST_LIMIT};
pub use index::Indices;
pub use query::{fuzzy_search, similarity, token_search, ScoredItem, DEFAULT_FUZZY_THRESHOLD};
pub use ranking::{find_instruments_for_genre, search_by_genre, GenreHit, InstrumentQuery};

pub use jeannie_core::{tokenize, Catalog, ContentItem, Error, ItemId, PlayingMode, Result};
