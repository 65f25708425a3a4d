use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::model::attributes::{MidiSpec, PlayingModes, Quality, StrumBehavior};
use crate::model::ids::ItemId;
use crate::taxonomy::{normalize_label, MAX_GENRE_SCORE};
use crate::text::tokenize;

/// One catalog entry: an installed device, a preset, or a sample library.
///
/// Every field except `id` may be missing in scanner output. A missing field
/// only keeps the item out of the index built from that field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentItem {
    pub id: ItemId,

    /// Display name.
    #[serde(default)]
    pub name: Option<String>,

    /// Broad classification, e.g. "Device" or "Preset".
    #[serde(default)]
    pub content_type: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub file_type: Option<String>,

    #[serde(default)]
    pub creator: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub plugin: Option<String>,
    #[serde(default)]
    pub library: Option<String>,
    #[serde(default)]
    pub collection: Option<String>,
    #[serde(default)]
    pub path: Option<String>,

    // --- Curated enrichment ---
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub quality: Option<Quality>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vibe: Vec<String>,

    /// Genre name to 0-100 suitability. Absent genres score 0.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub genres: BTreeMap<String, u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub midi_spec: Option<MidiSpec>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playing_modes: Option<PlayingModes>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strum_behavior: Option<StrumBehavior>,

    /// Normalized tokens of `name`, the unit of exact-match search.
    #[serde(default)]
    pub name_tokens: Vec<String>,
}

impl ContentItem {
    #[must_use]
    pub fn new(id: impl Into<ItemId>, name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            id: id.into(),
            name_tokens: tokenize(&name),
            name: Some(name),
            content_type: None,
            device_type: None,
            file_type: None,
            creator: None,
            category: None,
            plugin: None,
            library: None,
            collection: None,
            path: None,
            quality: None,
            vibe: Vec::new(),
            genres: BTreeMap::new(),
            midi_spec: None,
            playing_modes: None,
            strum_behavior: None,
        }
    }

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
    pub fn with_library(mut self, library: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self
    }

    #[must_use]
    pub fn with_genre(mut self, genre: impl Into<String>, score: u8) -> Self {
        self.genres.insert(genre.into(), score);
        self
    }

    #[must_use]
    pub fn with_vibe(mut self, vibe: impl Into<String>) -> Self {
        self.vibe.push(vibe.into());
        self
    }

    #[must_use]
    pub fn with_quality(mut self, quality: Quality) -> Self {
        self.quality = Some(quality);
        self
    }

    #[must_use]
    pub fn with_playing_modes(mut self, modes: PlayingModes) -> Self {
        self.playing_modes = Some(modes);
        self
    }

    #[must_use]
    pub fn with_strum_behavior(mut self, strum: StrumBehavior) -> Self {
        self.strum_behavior = Some(strum);
        self
    }

    /// Display name, or the empty string when the scanner produced none.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or_default()
    }

    /// Suitability score for `genre`, 0 when not rated.
    #[must_use]
    pub fn genre_score(&self, genre: &str) -> u8 {
        self.genres.get(genre).copied().unwrap_or(0)
    }

    #[must_use]
    pub const fn has_strum_behavior(&self) -> bool {
        self.strum_behavior.is_some()
    }

    /// Auxiliary text fields that take part in token and fuzzy matching,
    /// in addition to the name.
    pub fn auxiliary_fields(&self) -> impl Iterator<Item = &str> {
        [
            &self.creator,
            &self.category,
            &self.collection,
            &self.library,
            &self.plugin,
        ]
        .into_iter()
        .filter_map(|field| field.as_deref())
    }

    /// Derive `name_tokens` from the name when the scanner left them out.
    pub fn ensure_name_tokens(&mut self) {
        if self.name_tokens.is_empty() {
            if let Some(name) = &self.name {
                self.name_tokens = tokenize(name);
            }
        }
    }

    /// Normalize genre and vibe labels.
    ///
    /// Genre scores above [`MAX_GENRE_SCORE`] are dropped. Labels that
    /// collapse onto the same key keep the highest score; repeated vibes
    /// keep their first position.
    pub fn normalize_labels(&mut self) {
        for (genre, score) in std::mem::take(&mut self.genres) {
            let label = normalize_label(&genre);
            if score > MAX_GENRE_SCORE {
                log::warn!(
                    "Dropping out-of-range score {} for genre '{}' on item {}",
                    score,
                    genre,
                    self.id
                );
                continue;
            }
            if label.is_empty() {
                continue;
            }
            let entry = self.genres.entry(label).or_insert(score);
            *entry = (*entry).max(score);
        }

        for vibe in std::mem::take(&mut self.vibe) {
            let label = normalize_label(&vibe);
            if !label.is_empty() && !self.vibe.contains(&label) {
                self.vibe.push(label);
            }
        }
    }
}
