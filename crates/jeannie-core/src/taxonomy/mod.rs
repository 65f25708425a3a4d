pub mod genre;
pub mod vocabulary;

pub use genre::{normalize_label, BUILTIN_GENRES, BUILTIN_VIBES};
pub use vocabulary::{Taxonomy, MAX_GENRE_SCORE};
