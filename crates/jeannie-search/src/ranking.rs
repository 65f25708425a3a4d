//! Genre-oriented ranking.
//!
//! Blends curated genre suitability with either quality ratings
//! ([`find_instruments_for_genre`]) or a text match ([`search_by_genre`]).

use serde::Serialize;
use std::cmp::Ordering;

use jeannie_core::taxonomy::normalize_label;
use jeannie_core::{tokenize, ContentItem, PlayingMode};

use crate::filter::Filters;
use crate::generation::Generation;
use crate::query::{by_score_then_name, token_score};

/// Weight of the genre score when blended with quality.
const GENRE_WEIGHT: f64 = 0.7;
/// Weight of the quality average when blended with genre.
const QUALITY_WEIGHT: f64 = 0.3;
/// Text and genre weigh the same in [`search_by_genre`].
const TEXT_WEIGHT: f64 = 0.5;

/// Options for [`find_instruments_for_genre`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentQuery {
    pub min_score: u8,
    pub vibe: Option<String>,
    pub playing_mode: Option<PlayingMode>,
    pub limit: usize,
}

impl Default for InstrumentQuery {
    fn default() -> Self {
        Self {
            min_score: 70,
            vibe: None,
            playing_mode: None,
            limit: 20,
        }
    }
}

/// An item ranked for a genre.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenreHit {
    #[serde(flatten)]
    pub item: ContentItem,
    /// Combined relevance in 0.0-1.0.
    pub score: f64,
    /// The raw 0-100 suitability for the genre.
    pub genre_score: u8,
    /// Proportion of query tokens matched, when a query was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_score: Option<f64>,
}

/// Best-fitting instruments for `genre`, optionally narrowed by vibe and
/// playing mode, highest score first and at most `options.limit` long.
#[must_use]
pub fn find_instruments_for_genre(
    generation: &Generation,
    genre: &str,
    options: &InstrumentQuery,
) -> Vec<GenreHit> {
    let genre = &normalize_label(genre);
    let filters = Filters {
        genre: Some(genre.to_string()),
        min_genre_score: Some(options.min_score),
        vibe: options.vibe.clone(),
        playing_mode: options.playing_mode,
        ..Filters::default()
    };
    let candidates = generation.apply_filters(&filters);

    let mut hits: Vec<GenreHit> = generation
        .resolve(&candidates)
        .map(|item| {
            let genre_score = genre_score(generation, genre, item);
            let base = f64::from(genre_score) / 100.0;
            let score = item.quality.as_ref().map_or(base, |quality| {
                base * GENRE_WEIGHT + quality.average() * QUALITY_WEIGHT
            });
            GenreHit {
                item: item.clone(),
                score,
                genre_score,
                text_score: None,
            }
        })
        .collect();

    hits.sort_by(by_score);
    hits.truncate(options.limit);
    hits
}

/// Items qualified for `genre` at `min_score`, optionally matched against a
/// free-text query.
///
/// With a query, only items matching at least one query token are kept and
/// text and genre score weigh equally. A query without any token counts as
/// no query.
#[must_use]
pub fn search_by_genre(
    generation: &Generation,
    genre: &str,
    query: Option<&str>,
    min_score: u8,
) -> Vec<GenreHit> {
    let genre = &normalize_label(genre);
    let filters = Filters::default().with_genre(genre, Some(min_score));
    let candidates = generation.apply_filters(&filters);
    let tokens = query.map(tokenize).unwrap_or_default();

    let mut hits: Vec<GenreHit> = generation
        .resolve(&candidates)
        .filter_map(|item| {
            let genre_score = genre_score(generation, genre, item);
            let genre_part = f64::from(genre_score) / 100.0;
            if tokens.is_empty() {
                return Some(GenreHit {
                    item: item.clone(),
                    score: genre_part,
                    genre_score,
                    text_score: None,
                });
            }

            let text_score = token_score(item, &tokens);
            (text_score > 0.0).then(|| GenreHit {
                item: item.clone(),
                score: text_score * TEXT_WEIGHT + genre_part * (1.0 - TEXT_WEIGHT),
                genre_score,
                text_score: Some(text_score),
            })
        })
        .collect();

    hits.sort_by(by_score);
    hits
}

fn genre_score(generation: &Generation, genre: &str, item: &ContentItem) -> u8 {
    generation
        .indices()
        .genre_score(genre, item.id)
        .unwrap_or(0)
}

fn by_score(a: &GenreHit, b: &GenreHit) -> Ordering {
    by_score_then_name(a.score, &a.item, b.score, &b.item)
}
