//! Curated musical attributes attached to content items by enrichment.

use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Curated quality ratings, each on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quality {
    pub trustworthiness: u8,
    pub professionalism: u8,
    pub general_appeal: u8,
}

impl Quality {
    #[must_use]
    pub const fn new(trustworthiness: u8, professionalism: u8, general_appeal: u8) -> Self {
        Self {
            trustworthiness,
            professionalism,
            general_appeal,
        }
    }

    /// Mean of the three ratings, scaled to 0.0-1.0.
    #[must_use]
    pub fn average(&self) -> f64 {
        let sum = f64::from(self.trustworthiness)
            + f64::from(self.professionalism)
            + f64::from(self.general_appeal);
        sum / 3.0 / 100.0
    }
}

/// An inclusive range of MIDI note numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteRange {
    pub low: u8,
    pub high: u8,
}

/// Keyswitch zone and the articulation selected by each keyswitch note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyswitches {
    pub range: NoteRange,
    #[serde(default)]
    pub articulations: BTreeMap<u8, String>,
}

/// MIDI behaviour of an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MidiSpec {
    pub playable_range: NoteRange,
    #[serde(default)]
    pub keyswitches: Option<Keyswitches>,
    /// CC number to controlled parameter.
    #[serde(default)]
    pub cc_mappings: BTreeMap<u8, String>,
}

/// How an instrument responds to simultaneous notes.
///
/// Deserializes case-insensitively through [`FromStr`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayingMode {
    Legato,
    Mono,
    Poly,
}

impl PlayingMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Legato => "legato",
            Self::Mono => "mono",
            Self::Poly => "poly",
        }
    }
}

impl fmt::Display for PlayingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlayingMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "legato" => Ok(Self::Legato),
            "mono" => Ok(Self::Mono),
            "poly" => Ok(Self::Poly),
            other => Err(Error::InvalidData(format!("unknown playing mode: {other}"))),
        }
    }
}

impl<'de> Deserialize<'de> for PlayingMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(de::Error::custom)
    }
}

/// Playing modes an instrument offers and how to switch between them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayingModes {
    #[serde(default)]
    pub available: Vec<PlayingMode>,
    #[serde(default)]
    pub default: Option<PlayingMode>,
    #[serde(default)]
    pub switch_method: Option<String>,
    #[serde(default)]
    pub switch_trigger: Option<String>,
}

/// Built-in rhythmic or pattern generation (auto-strum, phrase playback).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StrumBehavior {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub description: String,
}
