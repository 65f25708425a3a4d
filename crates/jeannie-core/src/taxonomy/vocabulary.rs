//! Controlled vocabulary for genre and vibe labels.
//!
//! Enrichment data is curated by hand, so it drifts: misspelled genres,
//! one-off vibe tags, scores outside 0-100. A [`Taxonomy`] fixes the set of
//! labels the indices may contain. It ships with a built-in vocabulary and
//! can be replaced by a TOML file:
//!
//! ```toml
//! genres = ["country", "folk", "rock"]
//! vibes = ["warm", "vintage"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use crate::enrichment::Enrichment;
use crate::error::Result;
use crate::taxonomy::genre::{normalize_label, BUILTIN_GENRES, BUILTIN_VIBES};

/// Highest valid genre suitability score.
pub const MAX_GENRE_SCORE: u8 = 100;

/// The allowed genre and vibe labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Taxonomy {
    #[serde(default)]
    pub genres: BTreeSet<String>,

    #[serde(default)]
    pub vibes: BTreeSet<String>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        Self::builtin()
    }
}

impl Taxonomy {
    /// The vocabulary compiled into the crate.
    #[must_use]
    pub fn builtin() -> Self {
        Self {
            genres: BUILTIN_GENRES.iter().map(|g| (*g).to_string()).collect(),
            vibes: BUILTIN_VIBES.iter().map(|v| (*v).to_string()).collect(),
        }
    }

    /// Load a vocabulary from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Parse a vocabulary from TOML text. Labels are normalized.
    ///
    /// # Errors
    ///
    /// Returns `Error::Toml` if the text is not a valid vocabulary.
    pub fn from_toml(text: &str) -> Result<Self> {
        let raw: Self = toml::from_str(text)?;
        Ok(Self {
            genres: raw.genres.iter().map(|g| normalize_label(g)).collect(),
            vibes: raw.vibes.iter().map(|v| normalize_label(v)).collect(),
        })
    }

    #[must_use]
    pub fn is_known_genre(&self, genre: &str) -> bool {
        self.genres.contains(&normalize_label(genre))
    }

    #[must_use]
    pub fn is_known_vibe(&self, vibe: &str) -> bool {
        self.vibes.contains(&normalize_label(vibe))
    }

    /// Normalize genre and vibe labels and drop the ones outside the
    /// vocabulary, along with out-of-range genre scores.
    #[must_use]
    pub fn sanitize(&self, mut enrichment: Enrichment) -> Enrichment {
        if let Some(genres) = enrichment.genres.take() {
            let mut kept = BTreeMap::new();
            for (genre, score) in genres {
                if !self.is_known_genre(&genre) {
                    log::warn!("Dropping unknown genre '{}'", genre);
                } else if score > MAX_GENRE_SCORE {
                    log::warn!("Dropping out-of-range score {} for genre '{}'", score, genre);
                } else {
                    kept.insert(normalize_label(&genre), score);
                }
            }
            enrichment.genres = Some(kept);
        }

        if let Some(vibes) = enrichment.vibe.take() {
            let mut kept: Vec<String> = Vec::with_capacity(vibes.len());
            for vibe in vibes {
                if !self.is_known_vibe(&vibe) {
                    log::warn!("Dropping unknown vibe '{}'", vibe);
                    continue;
                }
                let label = normalize_label(&vibe);
                if !kept.contains(&label) {
                    kept.push(label);
                }
            }
            enrichment.vibe = Some(kept);
        }

        enrichment
    }
}
