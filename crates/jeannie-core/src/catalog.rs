//! The scanned content catalog: items plus scan metadata.
//!
//! A catalog is produced by the external scanner as a single JSON document
//! and is immutable once parsed. Parsing is split in two steps so callers
//! can tell a broken file (`Error::Parse`) from a well-formed document that
//! is not a catalog (`Error::Schema`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use crate::enrichment::EnrichmentSet;
use crate::error::{Error, Result};
use crate::model::ContentItem;
use crate::repair;
use crate::taxonomy::Taxonomy;

/// Per-attribute breakdowns computed by the scanner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    #[serde(default)]
    pub by_content_type: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_genre: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_vibe: BTreeMap<String, u64>,
    #[serde(default)]
    pub by_playing_mode: BTreeMap<String, u64>,
}

/// One complete catalog snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Catalog {
    /// Catalog format version tag.
    #[serde(default)]
    pub version: Option<String>,

    #[serde(default)]
    pub scan_date: Option<DateTime<Utc>>,

    /// Version of the DAW whose content was scanned.
    #[serde(default)]
    pub bitwig_version: Option<String>,

    #[serde(default)]
    pub scan_duration_ms: Option<u64>,

    /// Content types the scanner declared, e.g. `["Device", "Preset"]`.
    #[serde(default)]
    pub content_types: Vec<String>,

    /// Aggregate counts keyed by content type, plus `total`.
    #[serde(default)]
    pub totals: BTreeMap<String, u64>,

    pub content: Vec<ContentItem>,

    #[serde(default)]
    pub stats: CatalogStats,
}

impl Catalog {
    /// Build a catalog directly from items (no scan metadata).
    ///
    /// # Errors
    ///
    /// Returns `Error::Schema` if two items share an id.
    pub fn from_items(items: Vec<ContentItem>) -> Result<Self> {
        let mut catalog = Self {
            version: None,
            scan_date: None,
            bitwig_version: None,
            scan_duration_ms: None,
            content_types: Vec::new(),
            totals: BTreeMap::new(),
            content: items,
            stats: CatalogStats::default(),
        };
        catalog.normalize()?;
        Ok(catalog)
    }

    /// Read and parse a catalog file.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when the file does not exist, `Error::Io` for other
    /// read failures, and the errors of [`Catalog::from_json`].
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    entity: "catalog",
                    id: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Self::from_json(&content)
    }

    /// Parse and validate a catalog document.
    ///
    /// Only the `content` array and each item's `id` are required. Other
    /// fields that fail to parse are dropped with a warning, so one bad
    /// value never costs the whole catalog.
    ///
    /// # Errors
    ///
    /// `Error::Parse` if the text is not JSON; `Error::Schema` if the
    /// document lacks a `content` array, an item has no valid id, or an
    /// item id repeats.
    pub fn from_json(text: &str) -> Result<Self> {
        let mut value: Value = serde_json::from_str(text)?;
        let Value::Object(document) = &mut value else {
            return Err(Error::Schema("catalog must be a JSON object".into()));
        };

        match document.get_mut("content") {
            Some(Value::Array(items)) => {
                for (position, item) in items.iter_mut().enumerate() {
                    repair::repair_item(position, item)?;
                }
            }
            Some(_) => {
                return Err(Error::Schema("`content` must be an array of items".into()));
            }
            None => return Err(Error::Schema("missing `content` item sequence".into())),
        }
        repair::repair_catalog(document);

        let mut catalog: Self =
            serde_json::from_value(value).map_err(|e| Error::Schema(e.to_string()))?;
        catalog.normalize()?;
        Ok(catalog)
    }

    /// Reject duplicate ids, normalize genre and vibe labels, and fill in
    /// name tokens the scanner omitted.
    fn normalize(&mut self) -> Result<()> {
        let mut seen = HashSet::with_capacity(self.content.len());
        for item in &mut self.content {
            if !seen.insert(item.id) {
                return Err(Error::Schema(format!("duplicate item id {}", item.id)));
            }
            item.normalize_labels();
            item.ensure_name_tokens();
        }
        Ok(())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = &ContentItem> {
        self.content.iter()
    }

    /// Merge curated enrichment into the matching items.
    ///
    /// Each overlay is sanitized against `taxonomy` first. Empty overlays
    /// and overlays for ids the catalog does not contain are skipped.
    /// Returns the number of items enriched.
    pub fn enrich(&mut self, mut overlays: EnrichmentSet, taxonomy: &Taxonomy) -> usize {
        let mut applied = 0;
        for item in &mut self.content {
            if let Some(enrichment) = overlays.remove(&item.id) {
                let enrichment = taxonomy.sanitize(enrichment);
                if enrichment.is_empty() {
                    log::debug!("Empty enrichment for item {}", item.id);
                    continue;
                }
                enrichment.apply_to(item);
                applied += 1;
            }
        }
        for id in overlays.keys() {
            log::warn!("Skipping enrichment for unknown item {}", id);
        }
        applied
    }
}
