//! One immutable catalog snapshot together with its indices.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use jeannie_core::{Catalog, ContentItem, ItemId, PlayingMode};

use crate::filter::{apply_filters, Filters};
use crate::index::{keys, Indices};
use crate::query::{self, ScoredItem};
use crate::ranking::{self, GenreHit, InstrumentQuery};

/// Default page size for [`Generation::list`].
pub const DEFAULT_LIST_LIMIT: usize = 1000;

/// Pagination window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            limit: DEFAULT_LIST_LIMIT,
            offset: 0,
        }
    }
}

/// One page of a name-sorted listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListPage {
    /// Number of items matching the filters, before pagination.
    pub total: usize,
    pub limit: usize,
    pub offset: usize,
    pub results: Vec<ContentItem>,
}

/// Ranked search results truncated to a limit.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub query: String,
    pub fuzzy: bool,
    /// Number of matches before truncation.
    pub total: usize,
    pub results: Vec<ScoredItem>,
}

/// Counts and scan metadata of a generation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStats {
    pub generation: u64,
    pub total_items: usize,
    pub distinct_tokens: usize,
    pub by_content_type: BTreeMap<String, usize>,
    pub by_genre: BTreeMap<String, usize>,
    pub by_vibe: BTreeMap<String, usize>,
    pub by_playing_mode: BTreeMap<PlayingMode, usize>,
    pub creators: usize,
    pub categories: usize,
    pub with_strum_behavior: usize,
    pub version: Option<String>,
    pub scan_date: Option<DateTime<Utc>>,
    pub bitwig_version: Option<String>,
    pub scan_duration_ms: Option<u64>,
    /// Totals as declared by the scanner.
    pub declared_totals: BTreeMap<String, u64>,
}

/// A fully built, read-only catalog generation.
///
/// Everything a query needs lives here, so a caller holding one
/// `Generation` sees a consistent catalog for as long as it keeps it.
#[derive(Debug)]
pub struct Generation {
    number: u64,
    loaded_at: DateTime<Utc>,
    catalog: Catalog,
    indices: Indices,
}

impl Generation {
    /// Index `catalog` and wrap both into generation `number`.
    #[must_use]
    pub fn build(catalog: Catalog, number: u64) -> Self {
        let indices = Indices::build(&catalog);
        Self {
            number,
            loaded_at: Utc::now(),
            catalog,
            indices,
        }
    }

    #[must_use]
    pub const fn number(&self) -> u64 {
        self.number
    }

    #[must_use]
    pub const fn loaded_at(&self) -> DateTime<Utc> {
        self.loaded_at
    }

    #[must_use]
    pub const fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[must_use]
    pub const fn indices(&self) -> &Indices {
        &self.indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&ContentItem> {
        self.indices
            .position(id)
            .and_then(|position| self.catalog.content.get(position))
    }

    /// Every item id of this generation.
    #[must_use]
    pub fn all_ids(&self) -> BTreeSet<ItemId> {
        self.catalog.items().map(|item| item.id).collect()
    }

    /// Resolve ids to items, skipping any the catalog does not hold.
    pub fn resolve<'a>(
        &'a self,
        ids: impl IntoIterator<Item = &'a ItemId> + 'a,
    ) -> impl Iterator<Item = &'a ContentItem> + 'a {
        ids.into_iter().filter_map(move |&id| self.get(id))
    }

    #[must_use]
    pub fn apply_filters(&self, filters: &Filters) -> BTreeSet<ItemId> {
        apply_filters(self, filters)
    }

    /// Filter, then rank by exact tokens or by edit distance.
    #[must_use]
    pub fn search(
        &self,
        query: &str,
        filters: &Filters,
        fuzzy: bool,
        fuzzy_threshold: f64,
    ) -> Vec<ScoredItem> {
        let candidates = self.apply_filters(filters);
        log::debug!(
            "Searching {} candidates for '{}' ({})",
            candidates.len(),
            query,
            if fuzzy { "fuzzy" } else { "exact" }
        );
        if fuzzy {
            query::fuzzy_search(self, query, &candidates, fuzzy_threshold)
        } else {
            let tokens = jeannie_core::tokenize(query);
            query::token_search(self, &tokens, &candidates)
        }
    }

    /// Filtered items sorted by name, one page at a time.
    #[must_use]
    pub fn list(&self, filters: &Filters, page: Page) -> ListPage {
        let candidates = self.apply_filters(filters);
        let mut items: Vec<&ContentItem> = self.resolve(&candidates).collect();
        items.sort_by(|a, b| {
            a.display_name()
                .cmp(b.display_name())
                .then_with(|| a.id.cmp(&b.id))
        });

        ListPage {
            total: items.len(),
            limit: page.limit,
            offset: page.offset,
            results: items
                .into_iter()
                .skip(page.offset)
                .take(page.limit)
                .cloned()
                .collect(),
        }
    }

    #[must_use]
    pub fn search_by_genre(&self, genre: &str, query: Option<&str>, min_score: u8) -> Vec<GenreHit> {
        ranking::search_by_genre(self, genre, query, min_score)
    }

    #[must_use]
    pub fn find_instruments_for_genre(&self, genre: &str, options: &InstrumentQuery) -> Vec<GenreHit> {
        ranking::find_instruments_for_genre(self, genre, options)
    }

    #[must_use]
    pub fn content_types(&self) -> Vec<String> {
        keys(&self.indices.content_types)
    }

    #[must_use]
    pub fn creators(&self) -> Vec<String> {
        keys(&self.indices.creators)
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        keys(&self.indices.categories)
    }

    #[must_use]
    pub fn genres(&self) -> Vec<String> {
        self.indices.genres.keys().cloned().collect()
    }

    #[must_use]
    pub fn vibes(&self) -> Vec<String> {
        keys(&self.indices.vibes)
    }

    #[must_use]
    pub fn playing_modes(&self) -> Vec<PlayingMode> {
        keys(&self.indices.playing_modes)
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        let indices = &self.indices;
        let bucket_sizes = |index: &BTreeMap<String, Vec<ItemId>>| {
            index
                .iter()
                .map(|(key, ids)| (key.clone(), ids.len()))
                .collect::<BTreeMap<_, _>>()
        };

        EngineStats {
            generation: self.number,
            total_items: self.catalog.len(),
            distinct_tokens: indices.tokens.len(),
            by_content_type: bucket_sizes(&indices.content_types),
            by_genre: indices
                .genres
                .iter()
                .map(|(genre, scores)| (genre.clone(), scores.len()))
                .collect(),
            by_vibe: bucket_sizes(&indices.vibes),
            by_playing_mode: indices
                .playing_modes
                .iter()
                .map(|(mode, ids)| (*mode, ids.len()))
                .collect(),
            creators: indices.creators.len(),
            categories: indices.categories.len(),
            with_strum_behavior: indices.strum.len(),
            version: self.catalog.version.clone(),
            scan_date: self.catalog.scan_date,
            bitwig_version: self.catalog.bitwig_version.clone(),
            scan_duration_ms: self.catalog.scan_duration_ms,
            declared_totals: self.catalog.totals.clone(),
        }
    }
}
