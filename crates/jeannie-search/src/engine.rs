//! The search engine facade.
//!
//! [`SearchEngine`] owns the active catalog [`Generation`] and swaps it
//! whole. A load parses, validates, enriches and indexes a complete new
//! generation off to the side, then publishes it with a single pointer swap.
//! Readers take an `Arc` snapshot and never wait on a rebuild, and a failed
//! load leaves the active generation exactly as it was.

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use jeannie_core::{Catalog, ContentItem, Enrichment, Error, ItemId, PlayingMode, Result, Taxonomy};

use crate::config::Config;
use crate::filter::{Filters, DEFAULT_MIN_GENRE_SCORE};
use crate::generation::{EngineStats, Generation, ListPage, Page, SearchPage, DEFAULT_LIST_LIMIT};
use crate::query::{ScoredItem, DEFAULT_FUZZY_THRESHOLD};
use crate::ranking::{GenreHit, InstrumentQuery};

/// Where a catalog is read from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogSource {
    /// A scanner output file.
    File(PathBuf),
    /// A catalog document held in memory.
    Inline(String),
}

impl CatalogSource {
    fn read_catalog(&self) -> Result<Catalog> {
        match self {
            Self::File(path) => Catalog::load(path),
            Self::Inline(text) => Catalog::from_json(text),
        }
    }
}

impl fmt::Display for CatalogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Inline(text) => write!(f, "<inline, {} bytes>", text.len()),
        }
    }
}

/// Lifecycle state of the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadState {
    Unloaded,
    Loading,
    Loaded,
}

/// Read-only view of the engine lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineStatus {
    pub state: LoadState,
    pub source: Option<String>,
    /// Number of the active generation, 0 before the first load.
    pub generation: u64,
    pub loaded_at: Option<DateTime<Utc>>,
    pub item_count: usize,
    /// Error of the most recent load, cleared by a successful one.
    pub last_error: Option<String>,
}

/// Outcome of a successful load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadSummary {
    pub generation: u64,
    pub item_count: usize,
    pub enriched: usize,
    pub elapsed_ms: u64,
}

#[derive(Debug)]
struct Lifecycle {
    state: LoadState,
    source: Option<CatalogSource>,
    last_error: Option<String>,
    published: u64,
}

/// Owns the current catalog generation and answers queries against it.
///
/// All methods take `&self`; the engine is `Send + Sync` and meant to be
/// shared behind an `Arc`. Locks are taken in the order `rebuild`,
/// `lifecycle`, `current`.
#[derive(Debug)]
pub struct SearchEngine {
    current: RwLock<Option<Arc<Generation>>>,
    lifecycle: Mutex<Lifecycle>,
    /// Serializes loads so their state transitions never interleave.
    rebuild: Mutex<()>,
    taxonomy: Taxonomy,
    enrichment_path: Option<PathBuf>,
    fuzzy_threshold: f64,
    list_limit: usize,
}

impl Default for SearchEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchEngine {
    /// An unloaded engine with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            current: RwLock::new(None),
            lifecycle: Mutex::new(Lifecycle {
                state: LoadState::Unloaded,
                source: None,
                last_error: None,
                published: 0,
            }),
            rebuild: Mutex::new(()),
            taxonomy: Taxonomy::builtin(),
            enrichment_path: None,
            fuzzy_threshold: DEFAULT_FUZZY_THRESHOLD,
            list_limit: DEFAULT_LIST_LIMIT,
        }
    }

    /// An unloaded engine bound to the configured catalog, enrichment and
    /// taxonomy. Call [`SearchEngine::reload`] to load it.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured taxonomy file cannot be loaded.
    pub fn from_config(config: &Config) -> Result<Self> {
        let mut engine = Self::new()
            .with_fuzzy_threshold(config.fuzzy_threshold)
            .with_list_limit(config.list_limit);
        if let Some(path) = &config.taxonomy_path {
            engine.taxonomy = Taxonomy::load(path)?;
        }
        engine.enrichment_path.clone_from(&config.enrichment_path);
        engine.lifecycle.get_mut().source = Some(CatalogSource::File(config.catalog_path.clone()));
        Ok(engine)
    }

    #[must_use]
    pub fn with_fuzzy_threshold(mut self, threshold: f64) -> Self {
        self.fuzzy_threshold = threshold;
        self
    }

    #[must_use]
    pub fn with_list_limit(mut self, limit: usize) -> Self {
        self.list_limit = limit;
        self
    }

    #[must_use]
    pub fn with_taxonomy(mut self, taxonomy: Taxonomy) -> Self {
        self.taxonomy = taxonomy;
        self
    }

    /// Merge the enrichment file at `path` into every loaded catalog.
    #[must_use]
    pub fn with_enrichment(mut self, path: impl Into<PathBuf>) -> Self {
        self.enrichment_path = Some(path.into());
        self
    }

    /// Load a catalog and publish it as the next generation.
    ///
    /// The source is remembered for [`SearchEngine::reload`] once it loads.
    /// A failed source is remembered only while no generation is active.
    ///
    /// # Errors
    ///
    /// Returns the read, parse, schema or enrichment error. The previously
    /// active generation, if any, stays active and the error is recorded in
    /// [`EngineStatus::last_error`].
    pub fn load(&self, source: CatalogSource) -> Result<LoadSummary> {
        let _rebuild = self.rebuild.lock();
        let number = {
            let mut lifecycle = self.lifecycle.lock();
            lifecycle.state = LoadState::Loading;
            lifecycle.published + 1
        };

        log::info!("Loading catalog from {}", source);
        let started = Instant::now();

        match self.build_generation(&source, number) {
            Ok((generation, enriched)) => {
                if generation.is_empty() {
                    log::warn!("Catalog from {} has no content items", source);
                }
                let summary = LoadSummary {
                    generation: number,
                    item_count: generation.len(),
                    enriched,
                    elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
                };

                // The swap happens under the lifecycle lock so status never
                // pairs a new generation with a stale lifecycle.
                let mut lifecycle = self.lifecycle.lock();
                *self.current.write() = Some(Arc::new(generation));
                lifecycle.state = LoadState::Loaded;
                lifecycle.published = number;
                lifecycle.last_error = None;
                lifecycle.source = Some(source);
                log::info!(
                    "Published generation {} with {} items in {}ms",
                    number,
                    summary.item_count,
                    summary.elapsed_ms
                );
                Ok(summary)
            }
            Err(e) => {
                let mut lifecycle = self.lifecycle.lock();
                let has_generation = self.current.read().is_some();
                if has_generation {
                    lifecycle.state = LoadState::Loaded;
                } else {
                    lifecycle.state = LoadState::Unloaded;
                    lifecycle.source = Some(source.clone());
                }
                lifecycle.last_error = Some(e.to_string());
                log::warn!(
                    "Failed to load catalog from {}: {} (keeping generation {})",
                    source,
                    e,
                    lifecycle.published
                );
                Err(e)
            }
        }
    }

    /// Load the catalog file at `path`.
    ///
    /// # Errors
    ///
    /// See [`SearchEngine::load`].
    pub fn load_file(&self, path: impl Into<PathBuf>) -> Result<LoadSummary> {
        self.load(CatalogSource::File(path.into()))
    }

    /// Re-read the most recently loaded source.
    ///
    /// # Errors
    ///
    /// `Error::InvalidData` if nothing was ever loaded, otherwise see
    /// [`SearchEngine::load`].
    pub fn reload(&self) -> Result<LoadSummary> {
        let source = self
            .lifecycle
            .lock()
            .source
            .clone()
            .ok_or_else(|| Error::InvalidData("no catalog source to reload".into()))?;
        self.load(source)
    }

    fn build_generation(&self, source: &CatalogSource, number: u64) -> Result<(Generation, usize)> {
        let mut catalog = source.read_catalog()?;
        let enriched = match &self.enrichment_path {
            Some(path) => {
                let overlays = Enrichment::load_set(path)?;
                let enriched = catalog.enrich(overlays, &self.taxonomy);
                log::debug!("Enriched {} items from {}", enriched, path.display());
                enriched
            }
            None => 0,
        };
        Ok((Generation::build(catalog, number), enriched))
    }

    /// Snapshot of the active generation.
    ///
    /// The snapshot stays valid and unchanged across later reloads.
    #[must_use]
    pub fn generation(&self) -> Option<Arc<Generation>> {
        self.current.read().as_ref().map(Arc::clone)
    }

    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.current.read().is_some()
    }

    #[must_use]
    pub fn search(&self, query: &str, filters: &Filters, fuzzy: bool) -> Vec<ScoredItem> {
        self.generation()
            .map(|generation| generation.search(query, filters, fuzzy, self.fuzzy_threshold))
            .unwrap_or_default()
    }

    /// Ranked results truncated to `limit`, with the untruncated total.
    #[must_use]
    pub fn search_page(
        &self,
        query: &str,
        filters: &Filters,
        fuzzy: bool,
        limit: usize,
    ) -> SearchPage {
        let mut results = self.search(query, filters, fuzzy);
        let total = results.len();
        results.truncate(limit);
        SearchPage {
            query: query.to_string(),
            fuzzy,
            total,
            results,
        }
    }

    /// Filtered items sorted by name. `limit` defaults to the configured
    /// list limit.
    #[must_use]
    pub fn list(&self, filters: &Filters, limit: Option<usize>, offset: usize) -> ListPage {
        let page = Page {
            limit: limit.unwrap_or(self.list_limit),
            offset,
        };
        match self.generation() {
            Some(generation) => generation.list(filters, page),
            None => ListPage {
                total: 0,
                limit: page.limit,
                offset: page.offset,
                results: Vec::new(),
            },
        }
    }

    /// Genre-qualified items, optionally text matched. `min_score` defaults
    /// to 50.
    #[must_use]
    pub fn search_by_genre(
        &self,
        genre: &str,
        query: Option<&str>,
        min_score: Option<u8>,
    ) -> Vec<GenreHit> {
        let min_score = min_score.unwrap_or(DEFAULT_MIN_GENRE_SCORE);
        self.generation()
            .map(|generation| generation.search_by_genre(genre, query, min_score))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn find_instruments_for_genre(&self, genre: &str, options: &InstrumentQuery) -> Vec<GenreHit> {
        self.generation()
            .map(|generation| generation.find_instruments_for_genre(genre, options))
            .unwrap_or_default()
    }

    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<ContentItem> {
        self.generation()
            .and_then(|generation| generation.get(id).cloned())
    }

    /// Ids of items with `token` among their name tokens, ascending.
    #[must_use]
    pub fn items_with_token(&self, token: &str) -> Vec<ItemId> {
        let token = token.trim().to_lowercase();
        self.generation()
            .and_then(|generation| {
                generation
                    .indices()
                    .items_with_token(&token)
                    .map(|ids| ids.iter().copied().collect())
            })
            .unwrap_or_default()
    }

    #[must_use]
    pub fn content_types(&self) -> Vec<String> {
        self.generation()
            .map(|generation| generation.content_types())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn creators(&self) -> Vec<String> {
        self.generation()
            .map(|generation| generation.creators())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn categories(&self) -> Vec<String> {
        self.generation()
            .map(|generation| generation.categories())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn genres(&self) -> Vec<String> {
        self.generation()
            .map(|generation| generation.genres())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn vibes(&self) -> Vec<String> {
        self.generation()
            .map(|generation| generation.vibes())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn playing_modes(&self) -> Vec<PlayingMode> {
        self.generation()
            .map(|generation| generation.playing_modes())
            .unwrap_or_default()
    }

    /// Counts and scan metadata, `None` until a catalog is loaded.
    #[must_use]
    pub fn stats(&self) -> Option<EngineStats> {
        self.generation().map(|generation| generation.stats())
    }

    #[must_use]
    pub fn state(&self) -> LoadState {
        self.lifecycle.lock().state
    }

    #[must_use]
    pub fn status(&self) -> EngineStatus {
        let lifecycle = self.lifecycle.lock();
        let generation = self.generation();
        EngineStatus {
            state: lifecycle.state,
            source: lifecycle.source.as_ref().map(ToString::to_string),
            generation: generation.as_ref().map_or(0, |g| g.number()),
            loaded_at: generation.as_ref().map(|g| g.loaded_at()),
            item_count: generation.as_ref().map_or(0, |g| g.len()),
            last_error: lifecycle.last_error.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "version": "2",
        "content": [
            {"id": 0, "name": "Misfit Banjo", "contentType": "Preset", "creator": "8DIO",
             "genres": {"country": 90}},
            {"id": 1, "name": "Tape Echo", "contentType": "Device", "creator": "Bitwig"}
        ]
    }"#;

    fn loaded() -> SearchEngine {
        let engine = SearchEngine::new();
        engine.load(CatalogSource::Inline(CATALOG.into())).unwrap();
        engine
    }

    #[test]
    fn test_engine_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<SearchEngine>();
    }

    #[test]
    fn test_unloaded_engine_answers_empty() {
        let engine = SearchEngine::new();
        assert_eq!(engine.state(), LoadState::Unloaded);
        assert!(engine.search("banjo", &Filters::default(), false).is_empty());
        assert!(engine.list(&Filters::default(), None, 0).results.is_empty());
        assert!(engine.content_types().is_empty());
        assert!(engine.stats().is_none());
        assert!(engine.get(ItemId::new(0)).is_none());
    }

    #[test]
    fn test_load_publishes_generation() {
        let engine = SearchEngine::new();
        let summary = engine.load(CatalogSource::Inline(CATALOG.into())).unwrap();
        assert_eq!(summary.generation, 1);
        assert_eq!(summary.item_count, 2);
        assert_eq!(summary.enriched, 0);

        let status = engine.status();
        assert_eq!(status.state, LoadState::Loaded);
        assert_eq!(status.generation, 1);
        assert_eq!(status.item_count, 2);
        assert!(status.loaded_at.is_some());
        assert!(status.last_error.is_none());
    }

    #[test]
    fn test_failed_first_load_stays_unloaded() {
        let engine = SearchEngine::new();
        let err = engine
            .load(CatalogSource::Inline("{\"content\": 3}".into()))
            .unwrap_err();
        assert!(matches!(err, Error::Schema(_)));

        let status = engine.status();
        assert_eq!(status.state, LoadState::Unloaded);
        assert_eq!(status.generation, 0);
        assert!(status.last_error.is_some());
    }

    #[test]
    fn test_failed_load_keeps_previous_generation() {
        let engine = loaded();
        let before = engine.search("banjo", &Filters::default(), false);

        assert!(engine.load(CatalogSource::Inline("not json".into())).is_err());
        assert_eq!(engine.state(), LoadState::Loaded);
        assert_eq!(engine.status().generation, 1);
        assert_eq!(engine.search("banjo", &Filters::default(), false), before);
    }

    #[test]
    fn test_failed_load_keeps_loaded_source() {
        let dir = tempfile::TempDir::new().unwrap();
        let good = dir.path().join("content.json");
        std::fs::write(&good, CATALOG).unwrap();
        let engine = SearchEngine::new();
        engine.load_file(&good).unwrap();

        let broken = dir.path().join("broken.json");
        std::fs::write(&broken, "{\"content\": [").unwrap();
        assert!(engine.load_file(&broken).is_err());
        assert_eq!(engine.status().source, Some(good.display().to_string()));

        let summary = engine.reload().unwrap();
        assert_eq!(summary.generation, 2);
        assert_eq!(summary.item_count, 2);
        assert!(engine.status().last_error.is_none());
    }

    #[test]
    fn test_failed_first_load_is_retried_by_reload() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        let engine = SearchEngine::new();
        assert!(engine.load_file(&path).unwrap_err().is_not_found());
        assert_eq!(engine.status().source, Some(path.display().to_string()));

        std::fs::write(&path, CATALOG).unwrap();
        assert_eq!(engine.reload().unwrap().generation, 1);
        assert_eq!(engine.state(), LoadState::Loaded);
    }

    #[test]
    fn test_empty_catalog_loads() {
        let engine = SearchEngine::new();
        let summary = engine
            .load(CatalogSource::Inline(r#"{"content": []}"#.into()))
            .unwrap();
        assert_eq!(summary.item_count, 0);
        assert_eq!(engine.state(), LoadState::Loaded);
        assert!(engine.generation().unwrap().is_empty());
    }

    #[test]
    fn test_reload_without_source() {
        let err = SearchEngine::new().reload().unwrap_err();
        assert!(matches!(err, Error::InvalidData(_)));
    }

    #[test]
    fn test_reload_bumps_generation() {
        let engine = loaded();
        let snapshot = engine.generation().unwrap();
        let summary = engine.reload().unwrap();
        assert_eq!(summary.generation, 2);
        assert_eq!(snapshot.number(), 1);
        assert_eq!(engine.status().generation, 2);
    }

    #[test]
    fn test_query_delegates() {
        let engine = loaded();
        assert_eq!(engine.content_types(), vec!["Device", "Preset"]);
        assert_eq!(engine.creators(), vec!["8DIO", "Bitwig"]);
        assert_eq!(engine.genres(), vec!["country"]);
        assert_eq!(engine.items_with_token(" Banjo "), vec![ItemId::new(0)]);
        assert_eq!(
            engine.get(ItemId::new(1)).map(|item| item.display_name().to_string()),
            Some("Tape Echo".to_string())
        );
        assert_eq!(engine.search_by_genre("country", None, None).len(), 1);
        assert!(engine.search_by_genre("country", None, Some(95)).is_empty());

        let page = engine.search_page("tape echo", &Filters::default(), false, 1);
        assert_eq!(page.total, 1);
        assert_eq!(page.results.len(), 1);
    }

    #[test]
    fn test_list_uses_configured_limit() {
        let engine = SearchEngine::new().with_list_limit(1);
        engine.load(CatalogSource::Inline(CATALOG.into())).unwrap();
        let page = engine.list(&Filters::default(), None, 0);
        assert_eq!(page.limit, 1);
        assert_eq!(page.total, 2);
        assert_eq!(page.results[0].display_name(), "Misfit Banjo");
    }

    #[test]
    fn test_load_applies_enrichment() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("enrichment.json");
        std::fs::write(
            &path,
            r#"{"1": {"vibe": ["Warm", "glittery"], "genres": {"reggae": 85}}}"#,
        )
        .unwrap();

        let engine = SearchEngine::new().with_enrichment(&path);
        let summary = engine.load(CatalogSource::Inline(CATALOG.into())).unwrap();
        assert_eq!(summary.enriched, 1);
        assert_eq!(engine.vibes(), vec!["warm"]);
        assert_eq!(engine.genres(), vec!["country", "reggae"]);
    }

    #[test]
    fn test_missing_enrichment_fails_load() {
        let dir = tempfile::TempDir::new().unwrap();
        let engine = SearchEngine::new().with_enrichment(dir.path().join("absent.json"));
        let err = engine
            .load(CatalogSource::Inline(CATALOG.into()))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(engine.state(), LoadState::Unloaded);
    }

    #[test]
    fn test_from_config_binds_catalog_path() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, CATALOG).unwrap();

        let config = Config {
            catalog_path: path.clone(),
            fuzzy_threshold: 0.5,
            ..Config::default()
        };
        let engine = SearchEngine::from_config(&config).unwrap();
        assert_eq!(engine.state(), LoadState::Unloaded);
        assert_eq!(engine.status().source, Some(path.display().to_string()));

        engine.reload().unwrap();
        assert_eq!(engine.stats().map(|s| s.total_items), Some(2));
    }

    #[test]
    fn test_source_display() {
        assert_eq!(CatalogSource::Inline("{}".into()).to_string(), "<inline, 2 bytes>");
    }
}
