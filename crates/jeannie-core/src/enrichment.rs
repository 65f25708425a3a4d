//! Curated enrichment applied to scanned items.
//!
//! The enrichment step attaches musical metadata to an item. Only the
//! attributes enumerated on [`Enrichment`] can be merged; documents with any
//! other field are rejected at deserialization time.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{Error, Result};
use crate::model::{ContentItem, ItemId, MidiSpec, PlayingModes, Quality, StrumBehavior};

/// Enrichment keyed by the id of the item it belongs to.
pub type EnrichmentSet = BTreeMap<ItemId, Enrichment>;

/// A set of curated attributes for one item. Absent fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Enrichment {
    #[serde(default)]
    pub quality: Option<Quality>,
    #[serde(default)]
    pub vibe: Option<Vec<String>>,
    #[serde(default)]
    pub genres: Option<BTreeMap<String, u8>>,
    #[serde(default)]
    pub midi_spec: Option<MidiSpec>,
    #[serde(default)]
    pub playing_modes: Option<PlayingModes>,
    #[serde(default)]
    pub strum_behavior: Option<StrumBehavior>,
}

impl Enrichment {
    /// Read an enrichment file: a JSON object from item id to enrichment.
    ///
    /// # Errors
    ///
    /// `Error::NotFound` when the file does not exist, `Error::Io` for other
    /// read failures, and `Error::Parse` for malformed documents.
    pub fn load_set(path: &Path) -> Result<EnrichmentSet> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::NotFound {
                    entity: "enrichment",
                    id: path.display().to_string(),
                }
            } else {
                Error::Io(e)
            }
        })?;
        Ok(serde_json::from_str(&content)?)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.quality.is_none()
            && self.vibe.is_none()
            && self.genres.is_none()
            && self.midi_spec.is_none()
            && self.playing_modes.is_none()
            && self.strum_behavior.is_none()
    }

    /// Merge into `item`, field by field. A present field replaces the
    /// item's current value.
    pub fn apply_to(self, item: &mut ContentItem) {
        if let Some(quality) = self.quality {
            item.quality = Some(quality);
        }
        if let Some(vibe) = self.vibe {
            item.vibe = vibe;
        }
        if let Some(genres) = self.genres {
            item.genres = genres;
        }
        if let Some(midi_spec) = self.midi_spec {
            item.midi_spec = Some(midi_spec);
        }
        if let Some(playing_modes) = self.playing_modes {
            item.playing_modes = Some(playing_modes);
        }
        if let Some(strum_behavior) = self.strum_behavior {
            item.strum_behavior = Some(strum_behavior);
        }
    }
}
