//! Attribute filters, composed by set intersection.
//!
//! Each present filter yields its own full match set; the candidate set is
//! the intersection of all of them. Intersection is associative and
//! commutative, so the order filters are applied in never changes the
//! result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use jeannie_core::taxonomy::normalize_label;
use jeannie_core::{ItemId, PlayingMode};

use crate::generation::Generation;

/// Minimum genre score used when a genre filter gives none.
pub const DEFAULT_MIN_GENRE_SCORE: u8 = 50;

/// Attribute filters for search and listing. `None` means "not filtered".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filters {
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub genre: Option<String>,
    /// Only meaningful with `genre`. Defaults to [`DEFAULT_MIN_GENRE_SCORE`].
    #[serde(default)]
    pub min_genre_score: Option<u8>,
    #[serde(default)]
    pub vibe: Option<String>,
    #[serde(default)]
    pub playing_mode: Option<PlayingMode>,
    /// `Some(true)` keeps items with strum behavior, `Some(false)` keeps
    /// items without it.
    #[serde(default)]
    pub has_strum_behavior: Option<bool>,
}

impl Filters {
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    #[must_use]
    pub fn with_creator(mut self, creator: impl Into<String>) -> Self {
        self.creator = Some(creator.into());
        self
    }

    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    #[must_use]
    pub fn with_plugin(mut self, plugin: impl Into<String>) -> Self {
        self.plugin = Some(plugin.into());
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>, min_score: Option<u8>) -> Self {
        self.genre = Some(genre.into());
        self.min_genre_score = min_score;
        self
    }

    #[must_use]
    pub fn with_vibe(mut self, vibe: impl Into<String>) -> Self {
        self.vibe = Some(vibe.into());
        self
    }

    #[must_use]
    pub fn with_playing_mode(mut self, mode: PlayingMode) -> Self {
        self.playing_mode = Some(mode);
        self
    }

    #[must_use]
    pub fn with_strum_behavior(mut self, has_strum: bool) -> Self {
        self.has_strum_behavior = Some(has_strum);
        self
    }

    /// Whether no filter is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content_type.is_none()
            && self.creator.is_none()
            && self.category.is_none()
            && self.plugin.is_none()
            && self.genre.is_none()
            && self.vibe.is_none()
            && self.playing_mode.is_none()
            && self.has_strum_behavior.is_none()
    }
}

/// Compute the candidate ids matching every filter in `filters`.
///
/// With no filters the candidates are all items of the generation. Genre
/// and vibe labels match regardless of case and surrounding whitespace.
#[must_use]
pub fn apply_filters(generation: &Generation, filters: &Filters) -> BTreeSet<ItemId> {
    if filters.is_empty() {
        return generation.all_ids();
    }
    let indices = generation.indices();
    let mut candidates: Option<BTreeSet<ItemId>> = None;

    if let Some(content_type) = &filters.content_type {
        narrow(&mut candidates, bucket(indices.content_types.get(content_type)));
    }
    if let Some(creator) = &filters.creator {
        narrow(&mut candidates, bucket(indices.creators.get(creator)));
    }
    if let Some(category) = &filters.category {
        narrow(&mut candidates, bucket(indices.categories.get(category)));
    }
    if let Some(plugin) = &filters.plugin {
        let matches = generation
            .catalog()
            .items()
            .filter(|item| item.plugin.as_ref() == Some(plugin))
            .map(|item| item.id)
            .collect();
        narrow(&mut candidates, matches);
    }
    if let Some(genre) = &filters.genre {
        let min_score = filters.min_genre_score.unwrap_or(DEFAULT_MIN_GENRE_SCORE);
        narrow(
            &mut candidates,
            indices.genre_matches(&normalize_label(genre), min_score),
        );
    }
    if let Some(vibe) = &filters.vibe {
        narrow(&mut candidates, bucket(indices.vibes.get(&normalize_label(vibe))));
    }
    if let Some(mode) = &filters.playing_mode {
        narrow(&mut candidates, bucket(indices.playing_modes.get(mode)));
    }
    if let Some(has_strum) = filters.has_strum_behavior {
        let strum: BTreeSet<ItemId> = indices.strum.iter().copied().collect();
        let matches = if has_strum {
            strum
        } else {
            generation.all_ids().difference(&strum).copied().collect()
        };
        narrow(&mut candidates, matches);
    }

    candidates.unwrap_or_else(|| generation.all_ids())
}

/// Seed the running candidate set, or intersect it with `matches`.
fn narrow(candidates: &mut Option<BTreeSet<ItemId>>, matches: BTreeSet<ItemId>) {
    *candidates = Some(match candidates.take() {
        None => matches,
        Some(current) => current.intersection(&matches).copied().collect(),
    });
}

fn bucket(ids: Option<&Vec<ItemId>>) -> BTreeSet<ItemId> {
    ids.map(|ids| ids.iter().copied().collect()).unwrap_or_default()
}
